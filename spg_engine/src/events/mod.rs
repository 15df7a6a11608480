//! Event hooks.
//!
//! The engine publishes an event whenever an order reaches a terminal state. Hooks (user notifications, for example)
//! subscribe to these events and run outside the request that caused them.
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::*;
pub use hooks::{EventHandlers, EventHooks, EventProducers};
