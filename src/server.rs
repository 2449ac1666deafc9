use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Multipart, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use crate::assets::bundle::AssetBundle;
use crate::compose::request::RenderRequestBody;
use crate::config::Settings;
use crate::foundation::error::{ArtError, ArtResult};
use crate::publish::collaborators::{
    ContentUploader, LogNotifier, MemoryContract, MemoryUploader, MintingContract, Notifier,
    UploadFile, ZineRequest, submit_zine,
};
use crate::render::backend::{AssetSource, BackendKind, RenderBackend, create_backend};

/// HTTP-facing wrapper around [`ArtError`].
#[derive(Debug)]
pub struct AppError(pub ArtError);

impl From<ArtError> for AppError {
    fn from(err: ArtError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rej: JsonRejection) -> Self {
        Self(ArtError::validation(rej.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rej: QueryRejection) -> Self {
        Self(ArtError::validation(rej.body_text()))
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rej: MultipartRejection) -> Self {
        Self(ArtError::validation(rej.body_text()))
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            ArtError::Validation(_) => StatusCode::BAD_REQUEST,
            ArtError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match self.0 {
            ArtError::Validation(_) => "Invalid request",
            ArtError::Timeout(_) => "Artwork generation timed out",
            ArtError::Collaborator(_) => "Upstream service failed",
            _ => "Failed to generate artwork",
        };
        let body = Json(json!({
            "error": error,
            "details": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, AppError>;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub native: Arc<dyn RenderBackend>,
    pub headless: Arc<dyn RenderBackend>,
    pub notifier: Arc<dyn Notifier>,
    pub contract: Arc<dyn MintingContract>,
    pub uploader: Arc<dyn ContentUploader>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("native", &self.native.kind())
            .field("headless", &self.headless.kind())
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(
        native: Arc<dyn RenderBackend>,
        headless: Arc<dyn RenderBackend>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            native,
            headless,
            notifier,
            contract: Arc::new(MemoryContract::new()),
            uploader: Arc::new(MemoryUploader::new()),
        }
    }

    /// Swap the in-memory minting contract and content store for real ones.
    pub fn with_collaborators(
        mut self,
        contract: Arc<dyn MintingContract>,
        uploader: Arc<dyn ContentUploader>,
    ) -> Self {
        self.contract = contract;
        self.uploader = uploader;
        self
    }

    /// Load assets once for the native backend and start the headless page pool.
    ///
    /// Headless pages read their own copy of the assets.
    pub fn from_settings(settings: &Settings) -> ArtResult<Self> {
        let backend = settings.backend_settings();
        let bundle = AssetBundle::load_in_background(
            settings.assets_root.clone(),
            settings.manifest.clone(),
        )
        .wait(backend.headless_timeout)?;

        let native = create_backend(BackendKind::Native, AssetSource::Shared(bundle), &backend)?;
        let headless = create_backend(
            BackendKind::Headless,
            AssetSource::Directory {
                root: settings.assets_root.clone(),
                manifest: settings.manifest.clone(),
            },
            &backend,
        )?;
        Ok(Self::new(
            Arc::from(native),
            Arc::from(headless),
            Arc::new(LogNotifier),
        ))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/generate-artwork", post(generate_artwork))
        .route("/api/generate-artwork-headless", post(generate_artwork_headless))
        .route("/api/zine-submission", post(zine_submission))
        .route("/api/check-token-uri", get(check_token_uri))
        .route("/api/get-token-metadata", get(get_token_metadata))
        .route("/api/update-token-uri", post(update_token_uri))
        .route("/api/pinata-upload", post(upload_file))
        .with_state(state)
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn generate_artwork(
    State(state): State<AppState>,
    body: Result<Json<RenderRequestBody>, JsonRejection>,
) -> ApiResult<Response> {
    render_png(state.native, body).await
}

pub async fn generate_artwork_headless(
    State(state): State<AppState>,
    body: Result<Json<RenderRequestBody>, JsonRejection>,
) -> ApiResult<Response> {
    render_png(state.headless, body).await
}

async fn render_png(
    backend: Arc<dyn RenderBackend>,
    body: Result<Json<RenderRequestBody>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(body) = body?;
    let request = body.into_request()?;

    let art = tokio::task::spawn_blocking(move || backend.render(&request))
        .await
        .map_err(|e| ArtError::render(format!("render task failed: {e}")))??;

    let len = art.png.len();
    Ok((
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (header::CONTENT_LENGTH, len.to_string()),
        ],
        art.png,
    )
        .into_response())
}

pub async fn zine_submission(
    State(state): State<AppState>,
    body: Result<Json<ZineRequest>, JsonRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    let Json(request) = body?;
    let notifier = state.notifier.clone();
    run_blocking("zine", move || submit_zine(notifier.as_ref(), &request)).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Zine request submitted",
    })))
}

async fn run_blocking<T: Send + 'static>(
    what: &'static str,
    f: impl FnOnce() -> ArtResult<T> + Send + 'static,
) -> ApiResult<T> {
    let out = tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ArtError::render(format!("{what} task failed: {e}")))??;
    Ok(out)
}

#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenQuery {
    #[serde(default)]
    pub token_id: Option<u64>,
}

impl TokenQuery {
    fn token_id(&self) -> ArtResult<u64> {
        self.token_id
            .filter(|&id| id > 0)
            .ok_or_else(|| ArtError::validation("missing tokenId"))
    }
}

/// Owner, current token URI and signing record of one token.
pub async fn check_token_uri(
    State(state): State<AppState>,
    query: Result<Query<TokenQuery>, QueryRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    let Query(query) = query?;
    let token_id = query.token_id()?;
    let contract = state.contract.clone();
    let (owner, token_uri, meta) = run_blocking("token lookup", move || {
        Ok((
            contract.owner_of(token_id)?,
            contract.token_uri(token_id)?,
            contract.signature_metadata(token_id)?,
        ))
    })
    .await?;
    Ok(Json(json!({
        "success": true,
        "data": {
            "tokenId": token_id,
            "owner": owner,
            "tokenURI": token_uri,
            "metadata": {
                "signer": meta.signer,
                "timestamp": meta.timestamp,
            },
        },
    })))
}

pub async fn get_token_metadata(
    State(state): State<AppState>,
    query: Result<Query<TokenQuery>, QueryRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    let Query(query) = query?;
    let token_id = query.token_id()?;
    let contract = state.contract.clone();
    let meta = run_blocking("token metadata", move || contract.signature_metadata(token_id)).await?;
    Ok(Json(json!({
        "success": true,
        "data": {
            "timestamp": meta.timestamp,
            "signer": meta.signer,
        },
    })))
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTokenUriRequest {
    #[serde(default)]
    pub token_id: Option<u64>,
    #[serde(default)]
    pub metadata_url: Option<String>,
}

/// Point a token at its uploaded metadata document.
pub async fn update_token_uri(
    State(state): State<AppState>,
    body: Result<Json<UpdateTokenUriRequest>, JsonRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    let Json(body) = body?;
    let (Some(token_id), Some(url)) = (
        body.token_id.filter(|&id| id > 0),
        body.metadata_url.filter(|u| !u.trim().is_empty()),
    ) else {
        return Err(ArtError::validation("missing tokenId or metadataUrl").into());
    };
    tracing::info!(token_id, url = %url, "updating token uri");
    let contract = state.contract.clone();
    run_blocking("token uri update", move || contract.set_token_uri(token_id, &url)).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Token URI updated successfully",
    })))
}

/// Store the `file` field of a multipart form and return its content id.
pub async fn upload_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    let mut multipart = multipart?;
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ArtError::validation(format!("malformed form data: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let name = field
            .file_name()
            .and_then(|n| n.rsplit(['/', '\\']).next())
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or("upload.png")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ArtError::validation(format!("malformed form data: {e}")))?;
        upload = Some(UploadFile {
            content_type: content_type_for(&name),
            name,
            bytes: bytes.to_vec(),
        });
        break;
    }
    let upload = upload
        .filter(|u| !u.bytes.is_empty())
        .ok_or_else(|| ArtError::validation("no file uploaded"))?;

    let size = upload.bytes.len();
    let uploader = state.uploader.clone();
    let cid = run_blocking("upload", move || uploader.upload_directory(&[upload])).await?;
    tracing::info!(cid = %cid, bytes = size, "file uploaded");
    Ok(Json(json!({
        "IpfsHash": cid,
        "PinSize": size,
    })))
}

fn content_type_for(name: &str) -> &'static str {
    match std::path::Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

/// Bind `settings.bind` and serve until Ctrl-C.
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    let bind = settings.bind.clone();
    let state = tokio::task::spawn_blocking(move || AppState::from_settings(&settings)).await??;
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(addr = %listener.local_addr()?, "maverick-art listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown requested");
        })
        .await?;
    Ok(())
}

#[cfg(test)]
#[path = "../tests/unit/server/handlers.rs"]
mod tests;
