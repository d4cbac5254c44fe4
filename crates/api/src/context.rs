use axum::http::{header, HeaderMap, Method, Uri};

use warden_auth::AccessObject;
use warden_core::Symbol;
use warden_login::{RequestContext, LOGIN_OBJECT};

use crate::account::UserAccount;

/// Cookie carrying the session id.
pub const SESSION_COOKIE: &str = "warden_session";

/// Query parameter requesting the login bypass.
pub const BYPASS_PARAM: &str = "bypass";

/// Object named by requests to `/`.
pub const HOME_OBJECT: Symbol = Symbol::from_static("home");

/// Identity resolved for the current request (`None` for anonymous callers that
/// were let through).
#[derive(Debug, Clone, Default)]
pub struct CurrentAccount(pub Option<UserAccount>);

/// Action named by an HTTP method. Methods outside the table stay unclassified.
pub fn action_for(method: &Method) -> Option<Symbol> {
    let name = if method == Method::GET || method == Method::HEAD {
        "view"
    } else if method == Method::POST {
        "create"
    } else if method == Method::PUT || method == Method::PATCH {
        "update"
    } else if method == Method::DELETE {
        "delete"
    } else {
        return None;
    };
    Some(Symbol::from_static(name))
}

/// Object named by a path: the first segment is the kind, the second (if any) the
/// instance id. The login path always maps to the login object.
pub fn object_for(path: &str, login_url: &str) -> Option<AccessObject> {
    if path == login_url {
        return Some(AccessObject::new(LOGIN_OBJECT));
    }

    let mut segments = path.split('/').filter(|s| !s.is_empty());
    let Some(kind) = segments.next() else {
        return Some(AccessObject::new(HOME_OBJECT));
    };
    let kind = Symbol::parse(kind.to_string()).ok()?;

    Some(match segments.next() {
        Some(id) => AccessObject::new(kind).with_id(id),
        None => AccessObject::new(kind),
    })
}

pub fn bypass_requested(uri: &Uri) -> bool {
    let Some(query) = uri.query() else {
        return false;
    };
    url::form_urlencoded::parse(query.as_bytes())
        .filter(|(key, _)| *key == BYPASS_PARAM)
        .any(|(_, value)| !matches!(value.as_ref(), "0" | "false"))
}

/// Build the login state machine's view of an incoming request.
pub fn request_context(method: &Method, uri: &Uri, login_url: &str) -> RequestContext<UserAccount> {
    let path = uri.path();
    let mut ctx = RequestContext::new(path).with_bypass(bypass_requested(uri));

    if let Some(target) = uri.path_and_query() {
        ctx = ctx.with_request_uri(target.as_str());
    }
    if let Some(action) = action_for(method) {
        ctx = ctx.with_action(action);
    }
    if let Some(object) = object_for(path, login_url) {
        ctx = ctx.with_object(object);
    }
    ctx
}

pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
