//! Shared utilities.

pub mod address;
pub mod clock;
pub mod telemetry;

pub use address::handler_address;
pub use clock::now_ms;
pub use telemetry::init_tracing;
