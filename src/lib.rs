pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod qr;
pub mod receipt;
pub mod service;

pub use config::AppConfig;
pub use db::create_pool;
pub use service::{ReceiptPipeline, ScanService};
