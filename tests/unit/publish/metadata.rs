use super::*;

#[test]
fn metadata_document_has_expected_shape() {
    let m = TokenMetadata::for_artwork(42, "Test User", "January 1, 2025", "bafyimg", "0xdead");
    assert_eq!(m.name, "Digital Maverick Manifesto #42");
    assert_eq!(
        m.description,
        "Your unique generative manifesto artwork, signed by Test User on January 1, 2025."
    );
    assert_eq!(m.image, "ipfs://bafyimg/artwork.png");
    assert_eq!(m.attribute("Token ID"), Some("42"));
    assert_eq!(m.attribute("Transaction Hash"), Some("0xdead"));

    let json: serde_json::Value = serde_json::from_slice(&m.to_json_bytes().unwrap()).unwrap();
    assert_eq!(json["attributes"][0]["trait_type"], "Signer");
    assert_eq!(json["attributes"][0]["value"], "Test User");
}

#[test]
fn display_name_prefers_name_then_short_address() {
    let wallet = "0x1234567890abcdef1234567890abcdef12345678";
    assert_eq!(display_name(Some("Ada"), wallet), "Ada");
    assert_eq!(display_name(Some("   "), wallet), "0x123...45678");
    assert_eq!(display_name(None, wallet), "0x123...45678");
    assert_eq!(shorten_address("0xabc"), "0xabc");
}

#[test]
fn signing_dates_are_formatted_in_utc() {
    assert_eq!(format_signing_date(1_735_689_600).unwrap(), "January 1, 2025");
    assert_eq!(format_signing_date(0).unwrap(), "January 1, 1970");
    assert!(format_signing_date(i64::MAX).is_err());
}
