//! NFC-e 小票抓取核心: 链接识别、页面抓取、商品与元数据提取、巴西本地化数值解析。
//!
//! 除抓取外全部是纯函数, 输入 `FetchedDocument`, 输出结构化结果, 不依赖数据库。

pub mod classify;
pub mod document;
pub mod fetch;
pub mod items;
pub mod locale;
pub mod meta;

pub use classify::{looks_like_receipt_url, receipt_url};
pub use document::FetchedDocument;
pub use fetch::PageFetcher;
pub use items::extract_items;
pub use locale::{parse_datetime, parse_decimal};
pub use meta::extract_meta;

use crate::models::ScanExtraction;

/// 对同一份文档分别提取商品和元数据
pub fn extract(doc: &FetchedDocument) -> ScanExtraction {
    ScanExtraction {
        items: extract_items(doc),
        meta: extract_meta(doc),
    }
}
