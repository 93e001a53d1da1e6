pub mod cli;
pub mod config;
pub mod detector;
pub mod error;
pub mod pipeline;
pub mod policy;
pub mod preview;
pub mod quality;
pub mod report;
pub mod server;
pub mod storage;
pub mod util;
