//! Centroid Bridge Adapters
//!
//! HTTP implementations of the session and positions ports.
//!
//! - **auth**: JSON login, client code and broker user resolution
//! - **positions**: positions query with forwarded client/user headers

pub mod auth;
pub mod messages;
pub mod positions;

pub use auth::HttpSessionAuthenticator;
pub use messages::{LoginRequest, LoginResponse, LoginUser};
pub use positions::HttpPositionsClient;
