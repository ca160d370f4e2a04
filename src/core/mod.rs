//! Admission decisions, attempt accounting and the registration handshake.

pub mod counter;
pub mod error;
pub mod gate;
pub mod session;

pub use counter::AttemptCounterStore;
pub use error::{AppResult, GateError};
pub use gate::{AdmissionGate, Decision, DEFAULT_REASON, DEFAULT_THRESHOLD, UNNAMED_TASK};
pub use session::{RegistrationRecord, RegistrationSession};
