mod client;
pub mod codec;
pub mod codes;
mod diff;
mod error;
mod logger;
pub mod protocol;
pub mod tree;
mod types;

pub use client::{DaikinClient, DaikinClientBuilder, DEFAULT_SCAN_INTERVAL};
pub use error::{Error, Result};
pub use logger::MessageLogMode;
pub use protocol::Attribute;
pub use types::*;
