pub mod export;
pub mod pipeline;
pub mod scans;

pub use pipeline::ReceiptPipeline;
pub use scans::ScanService;
