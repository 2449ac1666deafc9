use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;

use crate::assets::bundle::AssetManifest;
use crate::foundation::error::ArtResult;
use crate::render::backend::BackendSettings;
use crate::seed::noise::NoiseFidelity;

/// Service and render settings.
///
/// Resolution order: defaults, then the optional JSON file, then `MAVERICK_*`
/// environment variables. CLI flags are applied last by the binary.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub assets_root: PathBuf,
    pub bind: String,
    pub headless_pages: usize,
    pub headless_timeout_ms: u64,
    pub noise: NoiseFidelity,
    pub interactive_fps: u32,
    pub manifest: AssetManifest,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            assets_root: PathBuf::from("public/generative-art"),
            bind: "127.0.0.1:3000".to_string(),
            headless_pages: 2,
            headless_timeout_ms: 30_000,
            noise: NoiseFidelity::Coherent,
            interactive_fps: 60,
            manifest: AssetManifest::default(),
        }
    }
}

impl Settings {
    /// Defaults overlaid with `path` (if given) and the process environment.
    pub fn load(path: Option<&Path>) -> ArtResult<Self> {
        let mut settings = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        settings.apply_env_from(std::env::vars());
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> ArtResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read settings file {}", path.display()))?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Apply `MAVERICK_*` overrides from `vars`. Invalid or non-positive values are ignored.
    pub fn apply_env_from<I, K, V>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (k, v) in vars {
            let v = v.as_ref().trim();
            match k.as_ref() {
                "MAVERICK_ASSETS_ROOT" if !v.is_empty() => self.assets_root = PathBuf::from(v),
                "MAVERICK_BIND" if !v.is_empty() => self.bind = v.to_string(),
                "MAVERICK_HEADLESS_PAGES" => {
                    if let Some(n) = v.parse::<usize>().ok().filter(|&n| n > 0) {
                        self.headless_pages = n;
                    }
                }
                "MAVERICK_HEADLESS_TIMEOUT_MS" => {
                    if let Some(n) = v.parse::<u64>().ok().filter(|&n| n > 0) {
                        self.headless_timeout_ms = n;
                    }
                }
                "MAVERICK_NOISE" => match v.parse::<NoiseFidelity>() {
                    Ok(n) => self.noise = n,
                    Err(e) => tracing::warn!(error = %e, "ignoring MAVERICK_NOISE"),
                },
                _ => {}
            }
        }
    }

    pub fn backend_settings(&self) -> BackendSettings {
        BackendSettings {
            fidelity: self.noise,
            headless_pages: self.headless_pages.max(1),
            headless_timeout: Duration::from_millis(self.headless_timeout_ms.max(1)),
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/config/settings.rs"]
mod tests;
