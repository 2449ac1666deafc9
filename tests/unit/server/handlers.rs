use super::*;
use std::time::Duration;

use crate::assets::decode::PreparedImage;
use crate::assets::text::{FontSet, PreparedFont};
use crate::render::backend::AssetLoader;
use crate::render::headless::HeadlessBackend;
use crate::render::native::NativeBackend;
use crate::seed::noise::NoiseFidelity;

fn bundle(fonts: FontSet) -> Arc<AssetBundle> {
    let img = PreparedImage::solid(4, 4, [230, 220, 200, 255]).unwrap();
    Arc::new(AssetBundle::from_parts(img.clone(), img.clone(), vec![img; 71], fonts).unwrap())
}

fn state_with(fonts: FontSet, headless_timeout: Duration) -> AppState {
    let b = bundle(fonts);
    let native = Arc::new(NativeBackend::new(b.clone(), NoiseFidelity::Coherent));
    let headless = Arc::new(
        HeadlessBackend::new(
            AssetSource::Shared(b),
            NoiseFidelity::Coherent,
            1,
            headless_timeout,
        )
        .unwrap(),
    );
    AppState::new(native, headless, Arc::new(LogNotifier))
}

fn body(signature: Option<&str>) -> RenderRequestBody {
    RenderRequestBody {
        name: Some("Test User".to_string()),
        date: Some("January 1, 2025".to_string()),
        signature: signature.map(str::to_string),
        signer_number: Some(42),
        is_mobile: Some(true),
        white_background: None,
    }
}

async fn json_body(resp: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let Json(v) = health().await;
    assert_eq!(v["status"], "ok");
}

#[tokio::test]
async fn missing_signature_is_a_bad_request() {
    let state = state_with(FontSet::empty(), Duration::from_secs(5));
    let err = generate_artwork(State(state), Ok(Json(body(None))))
        .await
        .unwrap_err();
    let resp = err.into_response();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let v = json_body(resp).await;
    assert_eq!(v["error"], "Invalid request");
    assert!(v["details"].as_str().unwrap().contains("signature"));
}

#[tokio::test]
async fn asset_failures_are_internal_errors() {
    let state = state_with(FontSet::empty(), Duration::from_secs(30));
    let err = generate_artwork(State(state), Ok(Json(body(Some("0xabc123")))))
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let v = json_body(err.into_response()).await;
    assert_eq!(v["error"], "Failed to generate artwork");
}

#[tokio::test]
async fn headless_timeouts_map_to_gateway_timeout() {
    let loader: AssetLoader = Arc::new(|| {
        std::thread::sleep(Duration::from_millis(300));
        Ok(bundle(FontSet::empty()))
    });
    let headless = Arc::new(
        HeadlessBackend::new(
            AssetSource::Loader(loader),
            NoiseFidelity::Coherent,
            1,
            Duration::from_millis(30),
        )
        .unwrap(),
    );
    let mut state = state_with(FontSet::empty(), Duration::from_secs(5));
    state.headless = headless;
    let err = generate_artwork_headless(State(state), Ok(Json(body(Some("0xabc123")))))
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn renders_png_with_content_length() {
    let Some(font) = PreparedFont::system_fallback() else {
        return;
    };
    let state = state_with(FontSet::uniform(font), Duration::from_secs(120));
    for resp in [
        generate_artwork(State(state.clone()), Ok(Json(body(Some("0xabc123")))))
            .await
            .unwrap(),
        generate_artwork_headless(State(state), Ok(Json(body(Some("0xabc123")))))
            .await
            .unwrap(),
    ] {
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "image/png");
        let len: usize = resp.headers()[header::CONTENT_LENGTH]
            .to_str()
            .unwrap()
            .parse()
            .unwrap();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(bytes.len(), len);
        let frame = crate::render::frame::decode_png(&bytes).unwrap();
        assert_eq!((frame.width, frame.height), (850, 1100));
    }
}

#[tokio::test]
async fn zine_submission_validates_and_acknowledges() {
    let state = state_with(FontSet::empty(), Duration::from_secs(5));
    let ok = ZineRequest {
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
        address1: "1 Main St".to_string(),
        address2: None,
        city: "Springfield".to_string(),
        state: "IL".to_string(),
        zip: "62701".to_string(),
    };
    let Json(v) = zine_submission(State(state.clone()), Ok(Json(ok)))
        .await
        .unwrap();
    assert_eq!(v["success"], true);

    let err = zine_submission(State(state), Ok(Json(ZineRequest::default())))
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn router_builds_with_all_routes() {
    let _ = router(state_with(FontSet::empty(), Duration::from_secs(1)));
}

const WALLET: &str = "0x1234567890abcdef1234567890abcdef12345678";

fn state_with_token() -> (AppState, Arc<MemoryContract>, Arc<MemoryUploader>, u64) {
    let contract = Arc::new(MemoryContract::new());
    let token_id = contract.mint(WALLET, 1_735_689_600).unwrap();
    let uploader = Arc::new(MemoryUploader::new());
    let state = state_with(FontSet::empty(), Duration::from_secs(5))
        .with_collaborators(contract.clone(), uploader.clone());
    (state, contract, uploader, token_id)
}

fn token_query(token_id: Option<u64>) -> Result<Query<TokenQuery>, QueryRejection> {
    Ok(Query(TokenQuery { token_id }))
}

#[tokio::test]
async fn token_lookup_reports_owner_uri_and_signing_record() {
    let (state, contract, _, id) = state_with_token();
    contract.set_token_uri(id, "ipfs://bafyabc/metadata.json").unwrap();

    let Json(v) = check_token_uri(State(state.clone()), token_query(Some(id)))
        .await
        .unwrap();
    assert_eq!(v["success"], true);
    assert_eq!(v["data"]["tokenId"], id);
    assert_eq!(v["data"]["owner"], WALLET);
    assert_eq!(v["data"]["tokenURI"], "ipfs://bafyabc/metadata.json");
    assert_eq!(v["data"]["metadata"]["timestamp"], 1_735_689_600);

    let Json(v) = get_token_metadata(State(state), token_query(Some(id)))
        .await
        .unwrap();
    assert_eq!(v["data"]["signer"], WALLET);
    assert_eq!(v["data"]["timestamp"], 1_735_689_600);
}

#[tokio::test]
async fn token_routes_need_a_token_id() {
    let (state, ..) = state_with_token();
    for err in [
        check_token_uri(State(state.clone()), token_query(None))
            .await
            .unwrap_err(),
        get_token_metadata(State(state), token_query(Some(0)))
            .await
            .unwrap_err(),
    ] {
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn unknown_tokens_are_upstream_failures() {
    let (state, ..) = state_with_token();
    let err = check_token_uri(State(state), token_query(Some(99)))
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let v = json_body(err.into_response()).await;
    assert_eq!(v["error"], "Upstream service failed");
    assert!(v["details"].as_str().unwrap().contains("99"));
}

#[tokio::test]
async fn update_token_uri_sets_the_uri() {
    let (state, contract, _, id) = state_with_token();
    let Json(v) = update_token_uri(
        State(state.clone()),
        Ok(Json(UpdateTokenUriRequest {
            token_id: Some(id),
            metadata_url: Some("ipfs://bafymeta/metadata.json".to_string()),
        })),
    )
    .await
    .unwrap();
    assert_eq!(v["success"], true);
    assert_eq!(contract.token_uri(id).unwrap(), "ipfs://bafymeta/metadata.json");

    let err = update_token_uri(
        State(state),
        Ok(Json(UpdateTokenUriRequest {
            token_id: Some(id),
            metadata_url: Some("  ".to_string()),
        })),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
}

async fn form(body: &'static str) -> Result<Multipart, MultipartRejection> {
    use axum::extract::FromRequest;
    let req = axum::http::Request::builder()
        .header(header::CONTENT_TYPE, "multipart/form-data; boundary=XBOUNDARY")
        .body(axum::body::Body::from(body))
        .unwrap();
    Multipart::from_request(req, &()).await
}

#[tokio::test]
async fn upload_stores_the_file_field() {
    let (state, _, uploader, _) = state_with_token();
    let body = "--XBOUNDARY\r\n\
        Content-Disposition: form-data; name=\"note\"\r\n\r\n\
        ignored\r\n\
        --XBOUNDARY\r\n\
        Content-Disposition: form-data; name=\"file\"; filename=\"art.png\"\r\n\
        Content-Type: image/png\r\n\r\n\
        PNGDATA\r\n\
        --XBOUNDARY--\r\n";
    let Json(v) = upload_file(State(state), form(body).await).await.unwrap();
    let cid = v["IpfsHash"].as_str().unwrap();
    assert_eq!(v["PinSize"], 7);
    assert_eq!(uploader.get(cid, "art.png").as_deref(), Some(&b"PNGDATA"[..]));
}

#[tokio::test]
async fn upload_without_a_file_is_a_bad_request() {
    let (state, _, uploader, _) = state_with_token();
    let body = "--XBOUNDARY\r\n\
        Content-Disposition: form-data; name=\"note\"\r\n\r\n\
        hello\r\n\
        --XBOUNDARY--\r\n";
    let err = upload_file(State(state), form(body).await).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    assert_eq!(uploader.directory_count(), 0);
}

#[test]
fn upload_content_types_follow_the_extension() {
    assert_eq!(content_type_for("artwork.PNG"), "image/png");
    assert_eq!(content_type_for("metadata.json"), "application/json");
    assert_eq!(content_type_for("blob"), "application/octet-stream");
}
