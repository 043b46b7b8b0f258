pub mod problems_root;
pub use problems_root::*;

pub mod scratch;
pub use scratch::*;
