//! Data models shared by the auth client, session manager and UI.
//!
//! - `User`: cached profile of the logged-in account
//! - `Credentials`: transient login form values
//! - `LoginResponse`: payload returned by every auth service call

pub mod credentials;
pub mod login;
pub mod user;

pub use credentials::Credentials;
pub use login::LoginResponse;
pub use user::User;
