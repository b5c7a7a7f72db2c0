use crate::db::queries;
use crate::models::{ScanItemRecord, ScanRecord};
use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use futures::channel::mpsc;
use futures::stream::BoxStream;
use futures::{SinkExt, StreamExt};
use sqlx::PgPool;
use std::io;

pub const SCAN_HEADER: [&str; 7] = [
    "id",
    "timestamp",
    "source",
    "data_raw",
    "cnpj",
    "store_name",
    "purchase_date",
];

pub const ITEM_HEADER: [&str; 6] = ["id", "scan_id", "name", "quantity", "unit_price", "total_price"];

/// 导出用的数据块流 (每块为一行 CSV)
pub type CsvChunks = mpsc::Receiver<Result<Vec<u8>, io::Error>>;

/// 流式导出扫码记录 (分号分隔)
pub fn scans_csv(pool: PgPool) -> CsvChunks {
    csv_stream(pool, &SCAN_HEADER, queries::stream_scans, scan_fields)
}

/// 流式导出商品明细 (分号分隔)
pub fn items_csv(pool: PgPool) -> CsvChunks {
    csv_stream(pool, &ITEM_HEADER, queries::stream_items, item_fields)
}

fn csv_stream<T: Send + 'static>(
    pool: PgPool,
    header: &'static [&'static str],
    rows: fn(&PgPool) -> BoxStream<'_, Result<T, sqlx::Error>>,
    fields: fn(&T) -> Vec<String>,
) -> CsvChunks {
    let (mut tx, rx) = mpsc::channel(32);

    tokio::spawn(async move {
        if tx.send(encode_row(header)).await.is_err() {
            return;
        }

        let mut exported = 0usize;
        let mut stream = rows(&pool);
        while let Some(row) = stream.next().await {
            let chunk = row
                .map_err(io::Error::other)
                .and_then(|record| encode_row(&fields(&record)));
            let failed = chunk.is_err();
            if let Err(e) = &chunk {
                tracing::error!("CSV export aborted after {} rows: {}", exported, e);
            }
            // 客户端断开时 send 失败, 直接结束
            if tx.send(chunk).await.is_err() || failed {
                return;
            }
            exported += 1;
        }
        tracing::info!("CSV export finished, {} rows", exported);
    });

    rx
}

/// 将一行编码为分号分隔的 CSV
pub fn encode_row<S: AsRef<[u8]>>(fields: &[S]) -> Result<Vec<u8>, io::Error> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(fields).map_err(io::Error::other)?;
    writer.into_inner().map_err(|e| e.into_error())
}

fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
}

/// 将 Option<BigDecimal> 转换为 CSV 字符串
fn option_to_csv(val: &Option<BigDecimal>) -> String {
    val.as_ref().map(|v| v.to_string()).unwrap_or_default()
}

pub fn scan_fields(scan: &ScanRecord) -> Vec<String> {
    vec![
        scan.id.to_string(),
        format_timestamp(&scan.timestamp),
        scan.source.clone().unwrap_or_default(),
        scan.data_raw.replace(['\n', '\r'], " "),
        scan.cnpj.clone().unwrap_or_default(),
        scan.store_name.clone().unwrap_or_default(),
        scan.purchase_date.as_ref().map(format_timestamp).unwrap_or_default(),
    ]
}

pub fn item_fields(item: &ScanItemRecord) -> Vec<String> {
    vec![
        item.id.to_string(),
        item.scan_id.to_string(),
        item.name.clone(),
        option_to_csv(&item.quantity),
        option_to_csv(&item.unit_price),
        option_to_csv(&item.total_price),
    ]
}
