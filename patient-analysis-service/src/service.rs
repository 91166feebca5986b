use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart, Path, State, multipart::MultipartError},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use diagnosis_flow::{
    AnalysisPipeline, AnalysisResult, AnthropicClient, CompletionClient, DocumentFormat,
    InMemoryResultStore, ResultStore, StoredAnalysis,
};

use crate::config::ServiceConfig;
use crate::models::AnalyzeResponse;
use crate::upload::ScratchUpload;

/// Upload size cap for the analyze endpoint.
const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<Value>)>;
type ApiError = (StatusCode, Json<Value>);

fn bad_request_error(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

fn not_found_error(message: &str, id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": message,
            "analysis_id": id
        })),
    )
}

fn internal_error(message: &str, details: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": message,
            "details": details
        })),
    )
}

/// Multipart read failures carry their own status: bodies over the size cap
/// are 413, malformed bodies are 400.
fn multipart_error(message: &str, error: MultipartError) -> ApiError {
    (
        error.status(),
        Json(json!({ "error": format!("{message}: {error}") })),
    )
}

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AnalysisPipeline>,
    pub result_store: Arc<dyn ResultStore>,
    pub upload_dir: PathBuf,
}

pub fn create_app(config: ServiceConfig) -> Router {
    let client = Arc::new(AnthropicClient::new(config.completion.clone()));
    if !client.is_configured() {
        warn!("no Anthropic credential configured, analyses will use the offline mock fallback");
    }

    let state = AppState {
        pipeline: Arc::new(AnalysisPipeline::new(client)),
        result_store: Arc::new(InMemoryResultStore::new(config.result_ttl)),
        upload_dir: config.upload_dir,
    };
    build_router(state)
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/analyze", post(analyze))
        .route("/results/{analysis_id}", get(get_results))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "Patient Analysis Service",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Uploads patient documents and returns structured diagnosis and medication suggestions",
        "endpoints": {
            "POST /analyze": "Upload a patient document (txt, pdf, docx) for analysis",
            "GET /results/{analysis_id}": "Fetch a previously produced analysis",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<AnalyzeResponse> {
    let (filename, bytes) = read_file_field(&mut multipart).await?;

    info!(
        filename = %filename,
        size_bytes = bytes.len(),
        "received document for analysis"
    );

    validate_filename(&filename)?;

    let scratch = ScratchUpload::save(&state.upload_dir, &filename, &bytes)
        .await
        .map_err(|e| {
            error!(error = %e, "failed to store upload");
            internal_error("Failed to store uploaded file", &e.to_string())
        })?;

    let result = state.pipeline.analyze_file(scratch.path()).await;
    // Scratch storage goes away here, whatever the analysis said.
    drop(scratch);

    let analysis_id = store_result(&state, &result).await?;

    Ok(Json(AnalyzeResponse {
        success: true,
        analysis_id,
        result,
    }))
}

/// Pull the `file` field out of the multipart body.
async fn read_file_field(multipart: &mut Multipart) -> Result<(String, Vec<u8>), ApiError> {
    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error("Invalid multipart body", e))?;
        let Some(field) = field else {
            return Err(bad_request_error("No file part"));
        };
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| multipart_error("Failed to read uploaded file", e))?;
        return Ok((filename, bytes.to_vec()));
    }
}

fn validate_filename(filename: &str) -> Result<(), ApiError> {
    if filename.is_empty() {
        return Err(bad_request_error("No selected file"));
    }
    let extension = std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    if DocumentFormat::from_extension(extension).is_none() {
        return Err(bad_request_error(&format!(
            "File type not allowed. Allowed types are: {}",
            DocumentFormat::EXTENSIONS.join(", ")
        )));
    }
    Ok(())
}

async fn store_result(state: &AppState, result: &AnalysisResult) -> Result<String, ApiError> {
    let payload = serde_json::to_string(result)
        .map_err(|e| internal_error("Failed to serialize analysis result", &e.to_string()))?;
    let entry = StoredAnalysis::new(payload);
    let analysis_id = entry.id.clone();

    state.result_store.save(entry).await.map_err(|e| {
        error!(error = %e, "failed to persist analysis result");
        internal_error("Failed to store analysis result", &e.to_string())
    })?;

    info!(analysis_id = %analysis_id, failed = result.is_failure(), "analysis stored");
    Ok(analysis_id)
}

async fn get_results(
    State(state): State<AppState>,
    Path(analysis_id): Path<String>,
) -> ApiResult<Value> {
    info!(analysis_id = %analysis_id, "results requested");

    let stored = state
        .result_store
        .get(&analysis_id)
        .await
        .map_err(|e| internal_error("Failed to load analysis result", &e.to_string()))?;

    let Some(entry) = stored else {
        return Err(not_found_error(
            "No analysis results found. Please upload a file first.",
            &analysis_id,
        ));
    };

    let result: AnalysisResult = serde_json::from_str(&entry.payload).map_err(|e| {
        error!(analysis_id = %analysis_id, error = %e, "stored analysis payload failed to parse");
        internal_error(
            "Invalid result format. The analysis produced malformed data.",
            &e.to_string(),
        )
    })?;

    // Failed analyses render as an error view, not as a result.
    if let Some(error) = &result.error {
        return Ok(Json(json!({
            "success": false,
            "error": error,
            "additional_info": result.disclaimer
        })));
    }

    Ok(Json(json!({
        "success": true,
        "result": result
    })))
}
