use crate::models::{ScanExtraction, ScanItemRecord, ScanRecord};
use futures::stream::BoxStream;
use sqlx::{PgPool, Postgres, QueryBuilder};

const SCAN_COLUMNS: &str = "id, timestamp, source, data_raw, cnpj, store_name, purchase_date";
const ITEM_COLUMNS: &str = "id, scan_id, name, quantity, unit_price, total_price";

/// 连通性检查
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// 插入扫码原文, 返回新记录ID
pub async fn insert_scan(pool: &PgPool, source: &str, data_raw: &str) -> Result<i32, sqlx::Error> {
    sqlx::query_scalar::<_, i32>(
        r#"
        INSERT INTO scans (source, data_raw)
        VALUES ($1, $2)
        RETURNING id
        "#
    )
    .bind(source)
    .bind(data_raw)
    .fetch_one(pool)
    .await
}

/// 保存小票提取结果: 更新元数据 + 批量插入商品明细 (同一事务)
pub async fn save_extraction(
    pool: &PgPool,
    scan_id: i32,
    extraction: &ScanExtraction,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    let meta = &extraction.meta;
    sqlx::query(
        r#"
        UPDATE scans
        SET cnpj = $2, store_name = $3, purchase_date = $4
        WHERE id = $1
        "#
    )
    .bind(scan_id)
    .bind(&meta.cnpj)
    .bind(&meta.store_name)
    .bind(meta.purchase_date)
    .execute(&mut *tx)
    .await?;

    if !extraction.items.is_empty() {
        let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO scan_items (scan_id, name, quantity, unit_price, total_price) "
        );
        query_builder.push_values(&extraction.items, |mut b, item| {
            b.push_bind(scan_id)
                .push_bind(&item.name)
                .push_bind(item.quantity.clone())
                .push_bind(item.unit_price.clone())
                .push_bind(item.total_price.clone());
        });

        let result = query_builder.build().execute(&mut *tx).await?;
        tracing::debug!("scan {}: inserted {} items", scan_id, result.rows_affected());
    }

    tx.commit().await
}

/// 扫码列表 (id 倒序), 可按子串过滤原文/商户/CNPJ
pub async fn list_scans(
    pool: &PgPool,
    limit: i64,
    q: Option<&str>,
) -> Result<Vec<ScanRecord>, sqlx::Error> {
    let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT ");
    query_builder.push(SCAN_COLUMNS).push(" FROM scans");

    if let Some(q) = q {
        let pattern = format!("%{}%", q);
        query_builder
            .push(" WHERE data_raw ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR store_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR cnpj ILIKE ")
            .push_bind(pattern);
    }

    query_builder.push(" ORDER BY id DESC LIMIT ").push_bind(limit);

    query_builder
        .build_query_as::<ScanRecord>()
        .fetch_all(pool)
        .await
}

/// 按ID查询扫码记录
pub async fn get_scan(pool: &PgPool, scan_id: i32) -> Result<Option<ScanRecord>, sqlx::Error> {
    sqlx::query_as::<_, ScanRecord>(&format!("SELECT {} FROM scans WHERE id = $1", SCAN_COLUMNS))
        .bind(scan_id)
        .fetch_optional(pool)
        .await
}

/// 商品明细列表, 可按扫码ID过滤
pub async fn list_items(
    pool: &PgPool,
    scan_id: Option<i32>,
    limit: i64,
) -> Result<Vec<ScanItemRecord>, sqlx::Error> {
    let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT ");
    query_builder.push(ITEM_COLUMNS).push(" FROM scan_items");

    if let Some(scan_id) = scan_id {
        query_builder.push(" WHERE scan_id = ").push_bind(scan_id);
    }

    query_builder.push(" ORDER BY id DESC LIMIT ").push_bind(limit);

    query_builder
        .build_query_as::<ScanItemRecord>()
        .fetch_all(pool)
        .await
}

/// 单次扫码的全部明细 (按插入顺序)
pub async fn items_for_scan(pool: &PgPool, scan_id: i32) -> Result<Vec<ScanItemRecord>, sqlx::Error> {
    sqlx::query_as::<_, ScanItemRecord>(&format!(
        "SELECT {} FROM scan_items WHERE scan_id = $1 ORDER BY id ASC",
        ITEM_COLUMNS
    ))
    .bind(scan_id)
    .fetch_all(pool)
    .await
}

/// 流式读取全部扫码记录 (CSV 导出用, id 升序)
pub fn stream_scans(pool: &PgPool) -> BoxStream<'_, Result<ScanRecord, sqlx::Error>> {
    sqlx::query_as::<_, ScanRecord>(
        "SELECT id, timestamp, source, data_raw, cnpj, store_name, purchase_date FROM scans ORDER BY id ASC"
    )
    .fetch(pool)
}

/// 流式读取全部商品明细 (CSV 导出用, id 升序)
pub fn stream_items(pool: &PgPool) -> BoxStream<'_, Result<ScanItemRecord, sqlx::Error>> {
    sqlx::query_as::<_, ScanItemRecord>(
        "SELECT id, scan_id, name, quantity, unit_price, total_price FROM scan_items ORDER BY id ASC"
    )
    .fetch(pool)
}
