mod pointer;
mod script;

pub use pointer::PointerTracker;
pub use script::{Gesture, GestureParseError};
