pub mod login;
pub mod reports;
pub mod system;
