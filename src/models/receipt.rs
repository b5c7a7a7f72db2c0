use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

const DEFAULT_SOURCE: &str = "pwa";

/// 扫码原始输入 (解码后的文本 + 来源标签)
#[derive(Debug, Clone, Deserialize)]
pub struct RawScanInput {
    pub text: String,
    #[serde(default)]
    pub source: Option<String>,
}

impl RawScanInput {
    /// 来源标签, 缺省或为空时为 "pwa"
    pub fn source(&self) -> &str {
        self.source
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SOURCE)
    }
}

/// 小票商品行
///
/// 名称非空, 且单价/总价至少有一个; 只能通过 `LineItem::new` 构造。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineItem {
    pub name: String,
    pub quantity: Option<BigDecimal>,
    pub unit_price: Option<BigDecimal>,
    pub total_price: Option<BigDecimal>,
}

impl LineItem {
    pub fn new(
        name: &str,
        quantity: Option<BigDecimal>,
        unit_price: Option<BigDecimal>,
        total_price: Option<BigDecimal>,
    ) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() || (unit_price.is_none() && total_price.is_none()) {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            quantity,
            unit_price,
            total_price,
        })
    }
}

/// 小票元数据, 各字段独立可空
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReceiptMeta {
    pub cnpj: Option<String>,
    pub store_name: Option<String>,
    pub purchase_date: Option<NaiveDateTime>,
}

impl ReceiptMeta {
    pub fn is_empty(&self) -> bool {
        self.cnpj.is_none() && self.store_name.is_none() && self.purchase_date.is_none()
    }
}

/// 一次扫码的提取结果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScanExtraction {
    pub items: Vec<LineItem>,
    pub meta: ReceiptMeta,
}

impl ScanExtraction {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.meta.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn line_item_requires_name_and_a_price() {
        let price = BigDecimal::from_str("1.50").ok();
        assert!(LineItem::new("  ", None, price.clone(), None).is_none());
        assert!(LineItem::new("Agua", BigDecimal::from_str("1").ok(), None, None).is_none());

        let item = LineItem::new(" Agua 500ml ", None, None, price).unwrap();
        assert_eq!(item.name, "Agua 500ml");
    }

    #[test]
    fn raw_input_source_defaults_to_pwa() {
        let input: RawScanInput = serde_json::from_str(r#"{"text":"abc"}"#).unwrap();
        assert_eq!(input.source(), "pwa");

        let input: RawScanInput =
            serde_json::from_str(r#"{"text":"abc","source":null}"#).unwrap();
        assert_eq!(input.source(), "pwa");

        let input: RawScanInput =
            serde_json::from_str(r#"{"text":"abc","source":"camera"}"#).unwrap();
        assert_eq!(input.source(), "camera");
    }
}
