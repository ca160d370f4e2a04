//! Runtime adapters and wire payload models.

pub mod api;
pub mod tokio_spawner;

pub use api::{AdmissionQuery, AdmissionReply, LifecycleSignal, QueueItem, RegistrationCommand, StatusReply, TaskRef};
pub use tokio_spawner::{Spawn, TokioSpawner};
