//! Common test utilities for torrent-rss integration tests

#[allow(dead_code)]
pub mod doubles;
#[allow(dead_code)]
pub mod fixtures;

#[allow(unused_imports)]
pub use doubles::*;
#[allow(unused_imports)]
pub use fixtures::*;
