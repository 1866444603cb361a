pub mod aggregate;
pub mod config;
pub mod error;
pub mod metric;
pub mod plot;
pub mod sample;
pub mod table;
pub mod util;
pub mod workload;
