use sqlx::PgPool;

/// 建表语句 (幂等, 启动时执行)
const SCHEMA: [&str; 9] = [
    r#"
    CREATE TABLE IF NOT EXISTS scans (
        id SERIAL PRIMARY KEY,
        timestamp TIMESTAMP NOT NULL DEFAULT NOW(),
        source TEXT,
        data_raw TEXT NOT NULL
    )
    "#,
    "ALTER TABLE scans ADD COLUMN IF NOT EXISTS cnpj TEXT",
    "ALTER TABLE scans ADD COLUMN IF NOT EXISTS store_name TEXT",
    "ALTER TABLE scans ADD COLUMN IF NOT EXISTS purchase_date TIMESTAMP",
    r#"
    CREATE TABLE IF NOT EXISTS scan_items (
        id SERIAL PRIMARY KEY,
        scan_id INTEGER NOT NULL REFERENCES scans(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        quantity NUMERIC,
        unit_price NUMERIC,
        total_price NUMERIC
    )
    "#,
    // 旧库的定长 NUMERIC 列放宽, 超长金额不再导致写入失败
    "ALTER TABLE scan_items ALTER COLUMN quantity TYPE NUMERIC",
    "ALTER TABLE scan_items ALTER COLUMN unit_price TYPE NUMERIC",
    "ALTER TABLE scan_items ALTER COLUMN total_price TYPE NUMERIC",
    "CREATE INDEX IF NOT EXISTS idx_scan_items_scan_id ON scan_items (scan_id)",
];

/// 初始化表结构
pub async fn init_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    for statement in SCHEMA {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    tx.commit().await?;
    tracing::info!("Database schema ready");
    Ok(())
}
