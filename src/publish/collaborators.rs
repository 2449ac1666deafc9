//! Boundaries to the systems that run after an artwork is revealed: content
//! storage, the minting contract and the notification service.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use crate::foundation::error::{ArtError, ArtResult};
use crate::publish::guard::PublishGuard;
use crate::publish::metadata::{TokenMetadata, format_signing_date};

/// One file of a directory upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

pub trait ContentUploader: Send + Sync {
    /// Upload `files` as one directory and return its content id.
    fn upload_directory(&self, files: &[UploadFile]) -> ArtResult<String>;
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SignatureMetadata {
    /// Unix seconds.
    pub timestamp: i64,
    pub signer: String,
}

pub trait MintingContract: Send + Sync {
    fn token_uri(&self, token_id: u64) -> ArtResult<String>;
    fn owner_of(&self, token_id: u64) -> ArtResult<String>;
    fn signature_metadata(&self, token_id: u64) -> ArtResult<SignatureMetadata>;
    /// Owner-only on chain.
    fn set_token_uri(&self, token_id: u64, uri: &str) -> ArtResult<()>;
}

pub trait Notifier: Send + Sync {
    fn send(&self, params: &BTreeMap<String, String>) -> ArtResult<()>;
}

/// Notifier that only logs.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, params: &BTreeMap<String, String>) -> ArtResult<()> {
        tracing::info!(
            fields = params.len(),
            from = params.get("from_name").map(String::as_str).unwrap_or(""),
            "notification sent"
        );
        Ok(())
    }
}

/// Content-addressed in-memory store.
#[derive(Debug, Default)]
pub struct MemoryUploader {
    dirs: Mutex<HashMap<String, Vec<UploadFile>>>,
}

impl MemoryUploader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, cid: &str, name: &str) -> Option<Vec<u8>> {
        let dirs = self.dirs.lock().ok()?;
        dirs.get(cid)?
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.bytes.clone())
    }

    pub fn directory_count(&self) -> usize {
        self.dirs.lock().map(|d| d.len()).unwrap_or(0)
    }
}

impl ContentUploader for MemoryUploader {
    fn upload_directory(&self, files: &[UploadFile]) -> ArtResult<String> {
        if files.is_empty() {
            return Err(ArtError::collaborator("cannot upload an empty directory"));
        }
        let cid = content_id(files);
        self.dirs
            .lock()
            .map_err(|_| ArtError::collaborator("upload store poisoned"))?
            .insert(cid.clone(), files.to_vec());
        Ok(cid)
    }
}

// FNV-1a over names and contents.
fn content_id(files: &[UploadFile]) -> String {
    let mut h: u64 = 0xcbf2_9ce4_8422_2325;
    for f in files {
        for b in f.name.bytes().chain(f.bytes.iter().copied()) {
            h ^= u64::from(b);
            h = h.wrapping_mul(0x0100_0000_01b3);
        }
    }
    format!("bafy{h:016x}")
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct TokenRecord {
    owner: String,
    uri: String,
    meta: SignatureMetadata,
}

/// In-memory minting contract.
#[derive(Debug, Default)]
pub struct MemoryContract {
    tokens: Mutex<Vec<TokenRecord>>,
}

impl MemoryContract {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint the next token to `wallet`. Token ids start at 1.
    pub fn mint(&self, wallet: &str, timestamp: i64) -> ArtResult<u64> {
        let mut tokens = self
            .tokens
            .lock()
            .map_err(|_| ArtError::collaborator("contract state poisoned"))?;
        tokens.push(TokenRecord {
            owner: wallet.to_string(),
            uri: String::new(),
            meta: SignatureMetadata {
                timestamp,
                signer: wallet.to_string(),
            },
        });
        Ok(tokens.len() as u64)
    }

    fn with_token<T>(&self, token_id: u64, f: impl FnOnce(&mut TokenRecord) -> T) -> ArtResult<T> {
        let mut tokens = self
            .tokens
            .lock()
            .map_err(|_| ArtError::collaborator("contract state poisoned"))?;
        let idx = usize::try_from(token_id)
            .ok()
            .and_then(|i| i.checked_sub(1))
            .filter(|i| *i < tokens.len())
            .ok_or_else(|| ArtError::collaborator(format!("token {token_id} does not exist")))?;
        Ok(f(&mut tokens[idx]))
    }
}

impl MintingContract for MemoryContract {
    fn token_uri(&self, token_id: u64) -> ArtResult<String> {
        self.with_token(token_id, |t| t.uri.clone())
    }

    fn owner_of(&self, token_id: u64) -> ArtResult<String> {
        self.with_token(token_id, |t| t.owner.clone())
    }

    fn signature_metadata(&self, token_id: u64) -> ArtResult<SignatureMetadata> {
        self.with_token(token_id, |t| t.meta.clone())
    }

    fn set_token_uri(&self, token_id: u64, uri: &str) -> ArtResult<()> {
        if uri.trim().is_empty() {
            return Err(ArtError::collaborator("token uri must not be empty"));
        }
        self.with_token(token_id, |t| t.uri = uri.to_string())
    }
}

/// Inputs for publishing one revealed artwork.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishJob {
    pub token_id: u64,
    pub signer_name: String,
    pub date: String,
    pub tx_hash: String,
    pub png: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PublishOutcome {
    Published {
        image_cid: String,
        metadata_cid: String,
        token_uri: String,
    },
    /// Another publish for this artwork is in flight or already done.
    Skipped,
}

/// Uploads the artwork and its metadata, then points the token at them.
#[derive(Clone)]
pub struct Publisher {
    uploader: Arc<dyn ContentUploader>,
    contract: Arc<dyn MintingContract>,
}

impl std::fmt::Debug for Publisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher").finish_non_exhaustive()
    }
}

impl Publisher {
    pub fn new(uploader: Arc<dyn ContentUploader>, contract: Arc<dyn MintingContract>) -> Self {
        Self { uploader, contract }
    }

    /// Date label and signer address recorded on chain for `token_id`.
    pub fn signing_details(&self, token_id: u64) -> ArtResult<(String, String)> {
        let meta = self.contract.signature_metadata(token_id)?;
        Ok((format_signing_date(meta.timestamp)?, meta.signer))
    }

    /// Run the publish sequence once per `guard`.
    ///
    /// Failures are logged and returned as collaborator errors; the guard goes
    /// back to idle so a later attempt can retry.
    #[tracing::instrument(skip_all, fields(token_id = job.token_id))]
    pub fn publish(&self, guard: &PublishGuard, job: &PublishJob) -> ArtResult<PublishOutcome> {
        let Some(ticket) = guard.try_begin() else {
            tracing::debug!("publish already in flight or done");
            return Ok(PublishOutcome::Skipped);
        };
        match self.run(job) {
            Ok(outcome) => {
                ticket.complete();
                tracing::info!("artwork published");
                Ok(outcome)
            }
            Err(e) => {
                tracing::warn!(error = %e, "artwork publish failed");
                Err(match e {
                    ArtError::Collaborator(_) => e,
                    other => ArtError::collaborator(other.to_string()),
                })
            }
        }
    }

    fn run(&self, job: &PublishJob) -> ArtResult<PublishOutcome> {
        if job.png.is_empty() {
            return Err(ArtError::collaborator("no artwork bytes to publish"));
        }
        let image_cid = self.uploader.upload_directory(&[UploadFile {
            name: "artwork.png".to_string(),
            content_type: "image/png",
            bytes: job.png.clone(),
        }])?;

        let metadata = TokenMetadata::for_artwork(
            job.token_id,
            &job.signer_name,
            &job.date,
            &image_cid,
            &job.tx_hash,
        );
        let metadata_cid = self.uploader.upload_directory(&[UploadFile {
            name: "metadata.json".to_string(),
            content_type: "application/json",
            bytes: metadata.to_json_bytes()?,
        }])?;

        let token_uri = format!("ipfs://{metadata_cid}/metadata.json");
        self.contract.set_token_uri(job.token_id, &token_uri)?;
        Ok(PublishOutcome::Published {
            image_cid,
            metadata_cid,
            token_uri,
        })
    }
}

/// Print-edition mail-in request.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ZineRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address1: String,
    #[serde(default)]
    pub address2: Option<String>,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip: String,
}

impl ZineRequest {
    pub fn validate(&self) -> ArtResult<()> {
        let required = [
            ("name", &self.name),
            ("email", &self.email),
            ("address1", &self.address1),
            ("city", &self.city),
            ("state", &self.state),
            ("zip", &self.zip),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, v)| v.trim().is_empty())
            .map(|(k, _)| *k)
            .collect();
        if !missing.is_empty() {
            return Err(ArtError::validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }
        if !self.email.contains('@') {
            return Err(ArtError::validation("email address is malformed"));
        }
        Ok(())
    }

    /// Template parameters handed to the notifier.
    pub fn template_params(&self) -> BTreeMap<String, String> {
        let address2 = self.address2.as_deref().unwrap_or("").trim();
        let mut address = self.address1.trim().to_string();
        if !address2.is_empty() {
            address.push_str(", ");
            address.push_str(address2);
        }
        BTreeMap::from([
            ("from_name".to_string(), self.name.trim().to_string()),
            ("from_email".to_string(), self.email.trim().to_string()),
            ("address".to_string(), address),
            ("city".to_string(), self.city.trim().to_string()),
            ("state".to_string(), self.state.trim().to_string()),
            ("zip".to_string(), self.zip.trim().to_string()),
        ])
    }
}

/// Validate and forward a zine request.
pub fn submit_zine(notifier: &dyn Notifier, request: &ZineRequest) -> ArtResult<()> {
    request.validate()?;
    notifier.send(&request.template_params()).inspect_err(|e| {
        tracing::warn!(error = %e, "zine notification failed");
    })
}

#[cfg(test)]
#[path = "../../tests/unit/publish/collaborators.rs"]
mod tests;
