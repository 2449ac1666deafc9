use super::*;

fn body() -> RenderRequestBody {
    serde_json::from_str(
        r#"{"name":"Test User","date":"January 1, 2025","signature":"0xabc123","signerNumber":42}"#,
    )
    .unwrap()
}

#[test]
fn wire_body_maps_to_request_with_defaults() {
    let req = body().into_request().unwrap();
    assert_eq!(req.display_name, "Test User");
    assert_eq!(req.signer_ordinal, 42);
    assert_eq!(req.background, Background::Paper);
    assert_eq!(req.viewport, Viewport::Desktop);
}

#[test]
fn flags_select_white_background_and_mobile() {
    let mut b = body();
    b.is_mobile = Some(true);
    b.white_background = Some(true);
    let req = b.into_request().unwrap();
    assert_eq!(req.background, Background::White);
    assert_eq!(req.viewport, Viewport::Mobile);
}

#[test]
fn missing_signature_is_a_validation_error() {
    let mut b = body();
    b.signature = None;
    let err = b.into_request().unwrap_err();
    assert!(matches!(err, ArtError::Validation(_)));
    assert!(err.to_string().contains("signature"));
}

#[test]
fn blank_fields_and_zero_signer_are_rejected() {
    let mut b = body();
    b.name = Some("   ".to_string());
    b.signer_number = Some(0);
    let msg = b.into_request().unwrap_err().to_string();
    assert!(msg.contains("name"));
    assert!(msg.contains("signerNumber"));
}

#[test]
fn oversized_signer_number_is_rejected() {
    let mut b = body();
    b.signer_number = Some(u64::from(u32::MAX) + 1);
    assert!(b.into_request().is_err());
}

#[test]
fn with_background_keeps_other_fields() {
    let req = body().into_request().unwrap();
    let white = req.with_background(Background::White);
    assert_eq!(white.signature_text, req.signature_text);
    assert_eq!(white.background, Background::White);
}
