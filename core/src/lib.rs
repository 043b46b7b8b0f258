pub mod action;
pub mod bench;
pub mod config;
pub mod language;
pub mod progress;
pub mod serdable;
pub mod storage;
pub mod str_interp;
pub mod style;
pub mod testing;

pub use crate::config::Config;
