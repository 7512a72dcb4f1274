//! `ostinato-core` — constants and the logging boundary shared by the
//! scheduling crates.

pub mod config;
pub mod logger;

pub use logger::{JobLogger, TracingLogger};
