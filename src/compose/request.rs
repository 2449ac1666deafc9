use crate::foundation::core::{Background, Viewport};
use crate::foundation::error::{ArtError, ArtResult};

/// Immutable input to one render.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RenderRequest {
    pub display_name: String,
    pub date_label: String,
    pub signature_text: String,
    /// 1-based mint order.
    pub signer_ordinal: u32,
    pub background: Background,
    pub viewport: Viewport,
}

impl RenderRequest {
    /// Reject missing or malformed parameters. Called before any drawing.
    pub fn validate(&self) -> ArtResult<()> {
        let mut missing = Vec::new();
        if self.display_name.trim().is_empty() {
            missing.push("name");
        }
        if self.date_label.trim().is_empty() {
            missing.push("date");
        }
        if self.signature_text.trim().is_empty() {
            missing.push("signature");
        }
        if self.signer_ordinal == 0 {
            missing.push("signerNumber");
        }
        if !missing.is_empty() {
            return Err(ArtError::validation(format!(
                "missing required parameters: {}",
                missing.join(", ")
            )));
        }
        Ok(())
    }

    pub fn with_background(&self, background: Background) -> Self {
        Self {
            background,
            ..self.clone()
        }
    }
}

/// Wire shape of a render request as posted by clients.
///
/// Every field is optional at the serde level so that absent fields surface as
/// validation errors rather than deserialization failures.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequestBody {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub signer_number: Option<u64>,
    #[serde(default)]
    pub is_mobile: Option<bool>,
    #[serde(default)]
    pub white_background: Option<bool>,
}

impl RenderRequestBody {
    pub fn into_request(self) -> ArtResult<RenderRequest> {
        let signer_ordinal = match self.signer_number {
            None | Some(0) => 0,
            Some(n) => u32::try_from(n).map_err(|_| {
                ArtError::validation(format!("signerNumber {n} exceeds the supported range"))
            })?,
        };
        let req = RenderRequest {
            display_name: self.name.unwrap_or_default(),
            date_label: self.date.unwrap_or_default(),
            signature_text: self.signature.unwrap_or_default(),
            signer_ordinal,
            background: Background::from_white_flag(self.white_background.unwrap_or(false)),
            viewport: Viewport::from_is_mobile(self.is_mobile.unwrap_or(false)),
        };
        req.validate()?;
        Ok(req)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/request.rs"]
mod tests;
