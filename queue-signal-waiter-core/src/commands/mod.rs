//! Commands module - service layer for Queue Signal Waiter operations

mod signal;
pub(crate) mod service;
mod wait;

pub use service::{QueueSignalWaiterService, ServiceOptions};
