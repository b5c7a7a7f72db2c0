use crate::api::ApiError;
use crate::models::{RawScanInput, ScanDetail, ScanItemRecord, ScanRecord};
use crate::service::{export, ScanService};
use axum::{
    body::Body,
    extract::{Json, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DEFAULT_LIST_LIMIT: i64 = 100;
const MAX_LIST_LIMIT: i64 = 1000;
const DEFAULT_UPLOAD_SOURCE: &str = "upload";

/// 列表查询参数
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub q: Option<String>,
}

/// 明细查询参数
#[derive(Debug, Deserialize)]
pub struct ItemsQuery {
    pub scan_id: Option<i32>,
    pub limit: Option<i64>,
}

/// 图片上传参数
#[derive(Debug, Deserialize)]
pub struct ScanQuery {
    pub source: Option<String>,
}

/// 健康检查响应
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 文本保存响应
#[derive(Debug, Serialize)]
pub struct SaveTextResponse {
    pub ok: bool,
    pub id: i32,
    pub items_found: usize,
}

/// 图片扫码响应
#[derive(Debug, Serialize)]
pub struct ScanImageResponse {
    pub found: usize,
    pub items: Vec<String>,
}

/// 列表响应
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub count: usize,
    pub items: Vec<T>,
}

impl<T> From<Vec<T>> for ListResponse<T> {
    fn from(items: Vec<T>) -> Self {
        Self {
            count: items.len(),
            items,
        }
    }
}

/// 上传来源, 未指定或为空时为 "upload"
fn upload_source(source: Option<String>) -> String {
    source
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_UPLOAD_SOURCE.to_string())
}

fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT)
}

/// 健康检查 (数据库不可用时仍返回 200, ok=false)
pub async fn health_check(State(service): State<Arc<ScanService>>) -> Json<HealthResponse> {
    match service.health().await {
        Ok(()) => Json(HealthResponse { ok: true, error: None }),
        Err(e) => Json(HealthResponse {
            ok: false,
            error: Some(e.to_string()),
        }),
    }
}

/// 保存扫码文本
pub async fn save_text(
    State(service): State<Arc<ScanService>>,
    Json(payload): Json<RawScanInput>,
) -> Result<Json<SaveTextResponse>, ApiError> {
    if payload.text.trim().is_empty() {
        return Err(ApiError::BadRequest("Texto vazio.".to_string()));
    }

    let saved = service.record(payload.source(), &payload.text).await?;

    Ok(Json(SaveTextResponse {
        ok: true,
        id: saved.id,
        items_found: saved.items_found,
    }))
}

/// 上传图片并解码二维码
pub async fn scan_image(
    State(service): State<Arc<ScanService>>,
    Query(query): Query<ScanQuery>,
    mut multipart: Multipart,
) -> Result<Json<ScanImageResponse>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let is_image = field.content_type().is_some_and(|ct| ct.contains("image"));
        if !is_image {
            return Err(ApiError::BadRequest(
                "Envie uma imagem (content-type image/*).".to_string(),
            ));
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        upload = Some(bytes);
        break;
    }

    let Some(bytes) = upload else {
        return Err(ApiError::BadRequest("Campo 'file' ausente.".to_string()));
    };

    let source = upload_source(query.source);
    let saved = service.record_image(&source, bytes.to_vec()).await?;
    let items: Vec<String> = saved.into_iter().map(|s| s.text).collect();

    Ok(Json(ScanImageResponse {
        found: items.len(),
        items,
    }))
}

/// 扫码列表
pub async fn list_scans(
    State(service): State<Arc<ScanService>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse<ScanRecord>>, ApiError> {
    let q = query.q.as_deref().filter(|q| !q.is_empty());
    let scans = service.list(clamp_limit(query.limit), q).await?;
    Ok(Json(scans.into()))
}

/// 扫码详情 (含商品明细)
pub async fn get_scan(
    State(service): State<Arc<ScanService>>,
    Path(scan_id): Path<i32>,
) -> Result<Json<ScanDetail>, ApiError> {
    service
        .detail(scan_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Scan {} not found", scan_id)))
}

/// 商品明细列表
pub async fn list_items(
    State(service): State<Arc<ScanService>>,
    Query(query): Query<ItemsQuery>,
) -> Result<Json<ListResponse<ScanItemRecord>>, ApiError> {
    let items = service.items(query.scan_id, clamp_limit(query.limit)).await?;
    Ok(Json(items.into()))
}

/// 导出扫码记录 CSV
pub async fn download_scans(State(service): State<Arc<ScanService>>) -> Response {
    csv_response("scans.csv", export::scans_csv(service.pool().clone()))
}

/// 导出商品明细 CSV
pub async fn download_items(State(service): State<Arc<ScanService>>) -> Response {
    csv_response("items.csv", export::items_csv(service.pool().clone()))
}

fn csv_response(file_name: &str, chunks: export::CsvChunks) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        Body::from_stream(chunks),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_limit_is_clamped() {
        assert_eq!(clamp_limit(None), 100);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(50)), 50);
        assert_eq!(clamp_limit(Some(1_000_000)), 1000);
    }

    #[test]
    fn upload_source_defaults_to_upload() {
        assert_eq!(upload_source(None), "upload");
        assert_eq!(upload_source(Some("  ".to_string())), "upload");
        assert_eq!(upload_source(Some("camera".to_string())), "camera");
    }

    #[test]
    fn health_response_omits_missing_error() {
        let body = serde_json::to_string(&HealthResponse { ok: true, error: None }).unwrap();
        assert_eq!(body, r#"{"ok":true}"#);
    }
}
