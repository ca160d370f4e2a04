//! Builders wiring configuration into a running session.

pub mod session_builder;

pub use session_builder::{build_gate, build_session};
