//! Peer session for two-player rollback Pong.
//!
//! A [`Session`] owns one peer's frame history and drives the simulation,
//! the rollback controller and the scoring handshake from a single
//! [`Session::tick`] per frame. The transport, input and latency estimate
//! are supplied by the host.

pub mod convert;
pub mod error;
pub mod loopback;
pub mod peer;
pub mod session;

pub use error::*;
pub use loopback::*;
pub use peer::*;
pub use session::*;
