//! Core modules: feed access, caching and data processing.

pub mod cache;
pub mod error;
pub mod fetcher;
pub mod model;
pub mod monitor;
pub mod presence;
pub mod processor;
pub mod report;
pub mod schedule;
pub mod search;
pub mod source;

#[cfg(test)]
pub mod test_support;
