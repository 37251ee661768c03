//! Provider implementations.
//!
//! Each module provides a struct implementing [`crate::engine::SearchEngineTrait`].

pub mod duckduckgo;
pub mod google;

pub use duckduckgo::DuckDuckGoEngine;
pub use google::GoogleEngine;
