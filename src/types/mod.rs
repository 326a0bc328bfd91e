//! Core conversation types.

pub mod attachment;
pub mod message;
pub mod thread;
pub mod usage;

pub use attachment::*;
pub use message::*;
pub use thread::*;
pub use usage::*;
