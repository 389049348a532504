//! TestGate client library backing the `testgate` command

pub mod client;
pub mod error;
pub mod session;

pub use client::{ApiClient, NewTestRequest, Profile, Registration, TokenPair};
pub use error::ClientError;
pub use session::{Session, SessionFile};
