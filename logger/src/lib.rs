pub mod appender;
pub mod archive;
pub mod header;
pub mod itoa;
pub mod logger;
pub mod slot;

pub use crate::appender::{Appender, DEFAULT_THRESHOLD};
pub use crate::logger::{init, Config};
pub use crate::slot::{Level, Slot};
