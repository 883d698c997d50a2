pub mod config;
pub mod dataset;
pub mod distribution;
pub mod drift;
pub mod error;
pub mod logging;
pub mod models;
pub mod monitor;
pub mod performance;
pub mod report;
pub mod stats;
pub mod store;
