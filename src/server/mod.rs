//! Server module - the transport boundary
//!
//! TCP listener, the JSON wire protocol, and the dispatch loop that bridges
//! connections to the rules engine.

pub mod dispatch;
pub mod net;
pub mod protocol;

// Re-export the pieces main.rs wires together
pub use dispatch::{run_dispatch, Broadcaster};
pub use net::{run_server, InboundEvent, Outbound, ServerConfig};
