#![forbid(unsafe_code)]

pub mod analysis;
pub mod config;
pub mod consolidation;
pub mod datamodel;
pub mod exporters;
pub mod storage;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
