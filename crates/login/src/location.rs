//! Return-to location capture.

use thiserror::Error;
use url::Url;

/// Path suffixes of non-navigational requests (stylesheets, scripts, images, fonts).
const STATIC_SUFFIXES: [&str; 11] = [
    ".css", ".js", ".png", ".jpg", ".jpeg", ".gif", ".svg", ".ico", ".map", ".woff", ".woff2",
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LocationError {
    #[error("request target contains control characters")]
    ControlCharacters,

    #[error("request target is not a valid URI: {0}")]
    Invalid(#[from] url::ParseError),
}

/// Reduce a request target to a same-origin `path?query`, or `None` when it points
/// at a static asset.
///
/// Absolute targets lose their origin, and a normalised path that would read as
/// protocol-relative (`//host`, `/\host`) is collapsed to a single leading slash, so
/// a saved location can never send the caller to another host.
pub fn navigational_target(target: &str) -> Result<Option<String>, LocationError> {
    if target.chars().any(char::is_control) {
        return Err(LocationError::ControlCharacters);
    }

    let base = Url::parse("http://localhost/")?;
    let url = base.join(target)?;

    if is_static_asset(url.path()) {
        return Ok(None);
    }

    let path = local_path(url.path());
    Ok(Some(match url.query() {
        Some(query) => format!("{path}?{query}"),
        None => path,
    }))
}

fn local_path(path: &str) -> String {
    format!("/{}", path.trim_start_matches(['/', '\\']))
}

pub fn is_static_asset(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    STATIC_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
}
