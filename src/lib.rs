//! # Queue Gate
//!
//! An admission gate that plugs into a CI scheduler's queue dispatcher over an
//! addressed message bus.
//!
//! The scheduler asks "can this queued job run now?" and the gate answers with a
//! boolean decision plus a reason. Decisions are driven by a per-task attempt
//! counter: every task is held back for its first few attempts and admitted from
//! then on. A registration session announces the gate's reply address to the
//! scheduler on startup (and whenever the scheduler reports it has started) and
//! withdraws it on shutdown.
//!
//! ## Components
//!
//! - **`AttemptCounterStore`**: per-task attempt counts, created lazily, never reset
//! - **`AdmissionGate`**: answers `canRun` queries, exactly one reply per query
//! - **`RegistrationSession`**: register/unregister handshake with the dispatcher
//! - **`MessageBus`**: the transport seam; `InMemoryBus` ships for tests and local runs
//! - **`SchedulerSimulator`**: plays the scheduler side of the protocol in-process
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use queue_gate::builders::build_session;
//! use queue_gate::config::GateConfig;
//! use queue_gate::infra::{InMemoryBus, SchedulerSimulator};
//! use queue_gate::runtime::TokioSpawner;
//! use queue_gate::runtime::api::{QueueItem, TaskRef};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     queue_gate::util::init_tracing();
//!
//!     let cfg = GateConfig::default();
//!     let bus = InMemoryBus::new();
//!     let spawner = TokioSpawner::new(tokio::runtime::Handle::current());
//!
//!     let scheduler = Arc::new(SchedulerSimulator::new(bus.clone(), cfg.clone(), spawner.clone()));
//!     scheduler.start();
//!
//!     let session = build_session(&cfg, bus, spawner)?;
//!     session.start();
//!     tokio::time::sleep(Duration::from_millis(50)).await;
//!
//!     let item = QueueItem::for_task(TaskRef::named("build-A"));
//!     let blockage = scheduler.can_run(&item).await;
//!     println!("blocked: {:?}", blockage);
//!
//!     session.shutdown();
//!     Ok(())
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Admission decisions, attempt accounting and the registration handshake.
pub mod core;
/// Configuration for addresses, policy and timeouts.
pub mod config;
/// Builders wiring configuration into a running session.
pub mod builders;
/// Transport adapters and the scheduler simulator.
pub mod infra;
/// Runtime adapters and wire payload models.
pub mod runtime;
/// Shared utilities.
pub mod util;
