//! Configuration models for bus addresses, admission policy and timeouts.

pub mod gate;

pub use gate::GateConfig;
