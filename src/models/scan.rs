use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

/// 扫码记录表 (scans)
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ScanRecord {
    pub id: i32,
    pub timestamp: NaiveDateTime,
    pub source: Option<String>,
    pub data_raw: String,
    pub cnpj: Option<String>,
    pub store_name: Option<String>,
    pub purchase_date: Option<NaiveDateTime>,
}

/// 小票商品明细表 (scan_items)
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ScanItemRecord {
    pub id: i32,
    pub scan_id: i32,
    pub name: String,
    pub quantity: Option<BigDecimal>,
    pub unit_price: Option<BigDecimal>,
    pub total_price: Option<BigDecimal>,
}

/// 扫码记录 + 明细
#[derive(Debug, Clone, Serialize)]
pub struct ScanDetail {
    #[serde(flatten)]
    pub scan: ScanRecord,
    pub items: Vec<ScanItemRecord>,
}

/// 单条扫码保存结果
#[derive(Debug, Clone, Serialize)]
pub struct SavedScan {
    pub id: i32,
    pub text: String,
    pub items_found: usize,
}
