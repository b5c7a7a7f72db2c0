use nfce_scan::receipt::PageFetcher;
use nfce_scan::{api, create_pool, db, AppConfig, ReceiptPipeline, ScanService};
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志 - 使用本地时间格式
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .with_level(true)
        .init();

    // 加载配置
    let config = AppConfig::load()?;
    info!("Starting server with config: {:?}", config);

    // 创建数据库连接池并建表
    let pool = create_pool(&config.database).await?;
    db::init_schema(&pool).await?;
    info!("Database pool created");

    // 小票抓取流水线 + 扫码服务
    let pipeline = ReceiptPipeline::new(PageFetcher::new(&config.fetch)?);
    let service = Arc::new(ScanService::new(pool, pipeline));

    let app = api::create_router(service, Path::new(&config.static_dir));

    // 启动服务器
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  POST /save_text        - save scanned text (extracts NFC-e receipts)");
    info!("  POST /scan             - decode QR codes from an uploaded image");
    info!("  GET  /list, /scans/:id, /items");
    info!("  GET  /download, /download_items - CSV export");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
