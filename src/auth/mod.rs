//! Authentication module
//!
//! Token issuance and verification, password hashing, session cookies,
//! the request gate and the owner check applied before mutations.

pub mod cookies;
pub mod gate;
pub mod handlers;
pub mod ownership;
pub mod password;
pub mod token;

mod service;

pub use cookies::CookieOptions;
pub use gate::AuthenticatedUser;
pub use ownership::{assert_owner, Owned};
pub use service::{AuthService, ChangePasswordRequest, LoginRequest, RegisterRequest, Session};
pub use token::{AccessClaims, RefreshClaims, TokenPair, TokenService};
