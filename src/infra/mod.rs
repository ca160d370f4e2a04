//! Transport adapters and the scheduler simulator.

pub mod bus;
pub mod scheduler;

pub use bus::{InMemoryBus, Message, MessageBus, PendingReply, Subscription, SubscriptionId};
pub use scheduler::{Blockage, SchedulerSimulator};
