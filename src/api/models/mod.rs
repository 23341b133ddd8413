pub mod common;
pub mod books;

pub use common::*;
pub use books::*;
