pub mod cli;
pub mod config;
pub mod embed;
pub mod ingest;
mod metrics;
pub mod searcher;
pub mod store;
pub mod utils;

pub use config::Opts;
pub use searcher::{QueryRequest, QueryResult, Searcher};
