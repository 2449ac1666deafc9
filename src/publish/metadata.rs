use crate::foundation::error::{ArtError, ArtResult};

pub const COLLECTION_NAME: &str = "Digital Maverick Manifesto";

/// One `{trait_type, value}` entry of a token metadata document.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Attribute {
    pub trait_type: String,
    pub value: String,
}

impl Attribute {
    pub fn new(trait_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            trait_type: trait_type.into(),
            value: value.into(),
        }
    }
}

/// JSON metadata document published next to the artwork.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub description: String,
    pub image: String,
    pub attributes: Vec<Attribute>,
}

impl TokenMetadata {
    pub fn for_artwork(
        token_id: u64,
        signer: &str,
        date: &str,
        image_cid: &str,
        tx_hash: &str,
    ) -> Self {
        Self {
            name: format!("{COLLECTION_NAME} #{token_id}"),
            description: format!(
                "Your unique generative manifesto artwork, signed by {signer} on {date}."
            ),
            image: format!("ipfs://{image_cid}/artwork.png"),
            attributes: vec![
                Attribute::new("Signer", signer),
                Attribute::new("Date", date),
                Attribute::new("Token ID", token_id.to_string()),
                Attribute::new("Transaction Hash", tx_hash),
            ],
        }
    }

    pub fn to_json_bytes(&self) -> ArtResult<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    pub fn attribute(&self, trait_type: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.trait_type == trait_type)
            .map(|a| a.value.as_str())
    }
}

/// Name shown on the artwork: the given name, else the shortened wallet address.
pub fn display_name(name: Option<&str>, wallet: &str) -> String {
    if let Some(n) = name.map(str::trim).filter(|n| !n.is_empty()) {
        return n.to_string();
    }
    shorten_address(wallet)
}

/// `0x{3 chars}...{last 5}`. Short inputs are returned unchanged.
pub fn shorten_address(addr: &str) -> String {
    let chars: Vec<char> = addr.trim().chars().collect();
    if chars.len() <= 10 {
        return chars.into_iter().collect();
    }
    let head: String = chars[2..5].iter().collect();
    let tail: String = chars[chars.len() - 5..].iter().collect();
    format!("0x{head}...{tail}")
}

/// Render a unix timestamp as e.g. "January 1, 2025" (UTC).
pub fn format_signing_date(unix_secs: i64) -> ArtResult<String> {
    let at = chrono::DateTime::from_timestamp(unix_secs, 0)
        .ok_or_else(|| ArtError::validation(format!("timestamp {unix_secs} is out of range")))?;
    Ok(at.format("%B %-d, %Y").to_string())
}

#[cfg(test)]
#[path = "../../tests/unit/publish/metadata.rs"]
mod tests;
