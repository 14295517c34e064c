// themescope: thematic analysis for mobile-banking app reviews
//
// This is the library root. Each module corresponds to a stage of the
// review-analytics pipeline: text -> keywords -> themes -> reports.

pub mod config;
pub mod output;
pub mod pipeline;
pub mod records;
pub mod themes;

#[cfg(feature = "sqlite")]
pub mod db;
