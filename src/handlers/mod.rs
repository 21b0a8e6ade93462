//! Handler implementations

pub mod console;
pub mod file;
pub mod memory;
pub mod rotating_file;
pub mod store;

pub use console::{ConsoleHandler, ConsoleTarget};
pub use file::FileHandler;
pub use memory::SequenceHandler;
pub use rotating_file::{RotatingFileHandler, RotationConfig, RotationFile};
pub use store::{LogListener, LogPresentable, LogStore, StoreConfig, Subscription};
