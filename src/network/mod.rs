//! Network Module
//!
//! Hub connection handling.
//!
//! ## Model
//! - One TCP connection per invocation
//! - One logical command per connection (1-3 request/reply round-trips)
//! - `Q` is written exactly once when the session ends, on every exit path

mod session;

pub use session::{HubSession, Session};
