pub mod aggregate;
pub mod cache;
pub mod clean;
pub mod coerce;
pub mod config;
pub mod filter;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod parse;
pub mod report;
