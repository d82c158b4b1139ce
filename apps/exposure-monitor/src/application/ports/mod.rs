//! Port Interfaces
//!
//! Outbound (driven) ports for the two bridge endpoints. Infrastructure
//! adapters implement them over HTTP; tests implement them in memory.
//!
//! - `SessionPort`: exchanges credentials for a bearer token and client code
//! - `PositionsPort`: runs one positions query

mod positions_port;
mod session_port;

pub use positions_port::{FetchQueryBody, PositionsPort, TransportFault};
pub use session_port::{LoginError, Session, SessionPort};
