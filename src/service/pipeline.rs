use crate::models::ScanExtraction;
use crate::receipt::{self, looks_like_receipt_url, receipt_url, PageFetcher};

/// 小票提取流水线: 识别 -> 抓取 (最多一次) -> 商品/元数据提取
///
/// 任何阶段失败都退化为空结果, 不返回错误。
#[derive(Debug, Clone)]
pub struct ReceiptPipeline {
    fetcher: PageFetcher,
}

impl ReceiptPipeline {
    pub fn new(fetcher: PageFetcher) -> Self {
        Self { fetcher }
    }

    pub async fn process(&self, raw_text: &str) -> ScanExtraction {
        let text = raw_text.trim();
        if !looks_like_receipt_url(text) {
            tracing::debug!("scan text is not an NFC-e link, skipping extraction");
            return ScanExtraction::default();
        }

        let Some(url) = receipt_url(text) else {
            return ScanExtraction::default();
        };

        let Some(doc) = self.fetcher.fetch_page(url).await else {
            return ScanExtraction::default();
        };

        let extraction = receipt::extract(&doc);
        tracing::info!(
            "receipt {}: {} items, cnpj={:?}, store={:?}, date={:?}",
            url,
            extraction.items.len(),
            extraction.meta.cnpj,
            extraction.meta.store_name,
            extraction.meta.purchase_date
        );
        extraction
    }
}
