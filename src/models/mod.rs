//! Domain models.

mod detection;
mod message;

pub use detection::{ImageCategory, ImageDetection};
pub use message::RawMessage;
