pub mod apis;
pub mod builder;
pub mod config;
pub mod constants;
pub mod dedup;
pub mod error;
pub mod extract;
pub mod logging;
pub mod normalize;
pub mod parser;
pub mod pipeline;
pub mod storage;
pub mod types;
