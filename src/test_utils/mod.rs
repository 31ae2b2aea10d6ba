//! the test_utils folder here will share utils or test components between
//! unit tests of the watch bridge, the store and the RPC facade
mod common;
mod fake_source;

pub use common::*;
pub use fake_source::*;
