use std::path::{Path, PathBuf};
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use rayon::prelude::*;

use crate::assets::decode::{PreparedImage, decode_image_asset};
use crate::assets::text::{FontSet, PreparedFont};
use crate::foundation::core::FontFace;
use crate::foundation::error::{ArtError, ArtResult};

const NAMED_ICONS: [&str; 25] = [
    "smileyface",
    "starburst",
    "globe",
    "lightningbolt",
    "prism",
    "hurricane",
    "atom",
    "circle",
    "starburstsolid",
    "ring",
    "squiggle",
    "football",
    "wave",
    "spiral",
    "mushroom",
    "glitchsmiley",
    "pill",
    "striped",
    "shades",
    "disc",
    "planet",
    "headphones",
    "headphones2",
    "cd",
    "bottle",
];
const NUMBERED_ICONS: usize = 46;

/// Relative paths of every asset a render needs.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AssetManifest {
    pub manifesto: String,
    pub paper: String,
    /// Icon deck; a placement's `icon_index` indexes this list.
    pub icons: Vec<String>,
    pub font_regular: String,
    pub font_light: String,
    pub font_italic: String,
    pub font_display: String,
}

impl Default for AssetManifest {
    fn default() -> Self {
        let icons = NAMED_ICONS
            .iter()
            .map(|n| format!("images/{n}.png"))
            .chain((1..=NUMBERED_ICONS).map(|i| format!("images/{i}.png")))
            .collect();
        Self {
            manifesto: "images/manifesto-text.png".to_string(),
            paper: "images/paperbackground.jpg".to_string(),
            icons,
            font_regular: "fonts/VideoCond-Regular.ttf".to_string(),
            font_light: "fonts/VideoCond-Light.ttf".to_string(),
            font_italic: "fonts/ArgentPixelCF-Italic.ttf".to_string(),
            font_display: "fonts/Professor-Regular.ttf".to_string(),
        }
    }
}

impl AssetManifest {
    pub fn font_path(&self, face: FontFace) -> &str {
        match face {
            FontFace::Regular => &self.font_regular,
            FontFace::Light => &self.font_light,
            FontFace::Italic => &self.font_italic,
            FontFace::Display => &self.font_display,
        }
    }
}

/// Normalize a manifest-relative path: forward slashes, no absolute paths, no `..`.
pub fn normalize_rel_path(source: &str) -> ArtResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(ArtError::validation("asset paths must be relative"));
    }
    if s.is_empty() {
        return Err(ArtError::validation("asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(ArtError::validation("asset paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(ArtError::validation("asset path must contain a file name"));
    }

    Ok(out.join("/"))
}

/// Every decoded image and font a render draws with. Immutable once built.
#[derive(Clone, Debug)]
pub struct AssetBundle {
    pub manifesto: PreparedImage,
    pub paper: PreparedImage,
    pub icons: Vec<PreparedImage>,
    pub fonts: FontSet,
}

impl AssetBundle {
    /// Read and decode every asset under `root`. The first failure aborts the load.
    #[tracing::instrument(skip(manifest), fields(icons = manifest.icons.len()))]
    pub fn load(root: &Path, manifest: &AssetManifest) -> ArtResult<Self> {
        let started = Instant::now();
        let read = |rel: &str| -> ArtResult<(String, Vec<u8>)> {
            let norm = normalize_rel_path(rel)?;
            let p = root.join(Path::new(&norm));
            let bytes = std::fs::read(&p).map_err(|e| {
                ArtError::asset(format!("failed to read asset '{}': {e}", p.display()))
            })?;
            Ok((norm, bytes))
        };
        let decode = |rel: &str| -> ArtResult<PreparedImage> {
            let (norm, bytes) = read(rel)?;
            decode_image_asset(&norm, &bytes)
        };

        let manifesto = decode(&manifest.manifesto)?;
        let paper = decode(&manifest.paper)?;
        let icons = manifest
            .icons
            .par_iter()
            .map(|rel| decode(rel))
            .collect::<ArtResult<Vec<_>>>()?;

        let mut fonts = FontSet::empty();
        for face in FontFace::ALL {
            let (_, bytes) = read(manifest.font_path(face))?;
            fonts = fonts.with_face(face, PreparedFont::new(bytes)?);
        }

        tracing::info!(
            root = %root.display(),
            icons = icons.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "asset bundle loaded"
        );
        Self::from_parts(manifesto, paper, icons, fonts)
    }

    /// Start [`AssetBundle::load`] on a background thread.
    pub fn load_in_background(root: impl Into<PathBuf>, manifest: AssetManifest) -> PendingBundle {
        let root = root.into();
        let (tx, rx) = mpsc::sync_channel(1);
        std::thread::Builder::new()
            .name("maverick-asset-load".to_string())
            .spawn(move || {
                let res = Self::load(&root, &manifest).map(Arc::new);
                let _ = tx.send(res);
            })
            .map_or_else(
                |e| PendingBundle {
                    rx: Err(ArtError::asset(format!("spawn asset loader: {e}"))),
                },
                |_| PendingBundle { rx: Ok(rx) },
            )
    }

    /// Assemble a bundle from already-decoded parts.
    pub fn from_parts(
        manifesto: PreparedImage,
        paper: PreparedImage,
        icons: Vec<PreparedImage>,
        fonts: FontSet,
    ) -> ArtResult<Self> {
        for (what, img) in [("manifesto", &manifesto), ("paper", &paper)] {
            if img.width == 0 || img.height == 0 {
                return Err(ArtError::asset(format!("{what} image is empty")));
            }
        }
        if let Some(i) = icons.iter().position(|i| i.width == 0 || i.height == 0) {
            return Err(ArtError::asset(format!("icon {i} is empty")));
        }
        Ok(Self {
            manifesto,
            paper,
            icons,
            fonts,
        })
    }

    pub fn icon_count(&self) -> usize {
        self.icons.len()
    }
}

/// Asset load running in the background. Resolves exactly once.
#[derive(Debug)]
pub struct PendingBundle {
    rx: ArtResult<mpsc::Receiver<ArtResult<Arc<AssetBundle>>>>,
}

impl PendingBundle {
    /// Block until the load finishes or `timeout` elapses.
    pub fn wait(self, timeout: Duration) -> ArtResult<Arc<AssetBundle>> {
        let rx = self.rx?;
        match rx.recv_timeout(timeout) {
            Ok(res) => res,
            Err(mpsc::RecvTimeoutError::Timeout) => Err(ArtError::timeout(format!(
                "asset bundle not loaded within {} ms",
                timeout.as_millis()
            ))),
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(ArtError::asset("asset loader exited without a result"))
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/bundle.rs"]
mod tests;
