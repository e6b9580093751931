//! Notification dispatcher: a sink trait decoupling a
//! deal status change from whatever consumes it.

pub mod event;
pub mod sink;

pub use event::DealStatusChanged;
pub use sink::{LoggingSink, NotificationSink, QueueSink};
