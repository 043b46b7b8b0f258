pub mod command;
pub mod result;
pub mod runner;
pub mod source;
pub mod testcase;
pub mod verifier;

pub use command::*;
pub use result::*;
pub use runner::*;
pub use source::*;
pub use testcase::*;
pub use verifier::{verify, verify_files, Excerpt, Mismatch, Verification};
