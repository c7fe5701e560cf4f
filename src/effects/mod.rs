//! Side effects of parts failing, reported as notifications

pub mod dispatch;
pub mod notification;

pub use dispatch::{aftermath, dispatch_effects, settle, Dispatch};
pub use notification::{Notification, Sense};
