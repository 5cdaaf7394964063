//! Document-grounded chat threads.

pub mod controller;
pub mod model;

pub use controller::{ChatThreadController, ThreadEvent};
pub use model::{ChatId, Message, MessageId, MessageLog, Sender};
