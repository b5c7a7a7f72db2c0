pub mod receipt;
pub mod scan;

pub use receipt::{LineItem, RawScanInput, ReceiptMeta, ScanExtraction};
pub use scan::{SavedScan, ScanDetail, ScanItemRecord, ScanRecord};
