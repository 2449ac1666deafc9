use std::f64::consts::PI;

use crate::seed::derive::SignatureSeed;
use crate::seed::random::{Lcg, RandomSource, SeededRandom, SineRandom};

/// Deterministic 3-D noise in `[0, 1]`.
pub trait NoiseSource: Send + Sync {
    fn noise(&self, x: f64, y: f64, z: f64) -> f64;
}

const PERLIN_SIZE: usize = 4095;
const YWRAPB: u32 = 4;
const YWRAP: i64 = 1 << YWRAPB;
const ZWRAPB: u32 = 8;
const ZWRAP: i64 = 1 << ZWRAPB;
const OCTAVES: usize = 4;
const AMP_FALLOFF: f64 = 0.5;

fn scaled_cosine(t: f64) -> f64 {
    0.5 * (1.0 - (t * PI).cos())
}

/// Multi-octave value-lattice noise with cosine interpolation.
///
/// The 4096-entry lattice is filled from an [`Lcg`] seeded with the signature
/// seed, so two instances with the same seed are interchangeable.
#[derive(Clone)]
pub struct PerlinNoise {
    table: Box<[f64]>,
}

impl std::fmt::Debug for PerlinNoise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerlinNoise")
            .field("table_len", &self.table.len())
            .finish()
    }
}

impl PerlinNoise {
    pub fn new(seed: SignatureSeed) -> Self {
        let mut lcg = Lcg::new(seed);
        let table = (0..=PERLIN_SIZE)
            .map(|_| lcg.next_f64())
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self { table }
    }

    fn at(&self, offset: i64) -> f64 {
        self.table[(offset & PERLIN_SIZE as i64) as usize]
    }
}

impl NoiseSource for PerlinNoise {
    fn noise(&self, x: f64, y: f64, z: f64) -> f64 {
        let (x, y, z) = (x.abs(), y.abs(), z.abs());

        let mut xi = x.floor() as i64;
        let mut yi = y.floor() as i64;
        let mut zi = z.floor() as i64;
        let mut xf = x - x.floor();
        let mut yf = y - y.floor();
        let mut zf = z - z.floor();

        let mut r = 0.0;
        let mut ampl = 0.5;

        for _ in 0..OCTAVES {
            let mut of = xi
                .wrapping_add(yi.wrapping_shl(YWRAPB))
                .wrapping_add(zi.wrapping_shl(ZWRAPB));

            let rxf = scaled_cosine(xf);
            let ryf = scaled_cosine(yf);

            let mut n1 = self.at(of);
            n1 += rxf * (self.at(of + 1) - n1);
            let mut n2 = self.at(of + YWRAP);
            n2 += rxf * (self.at(of + YWRAP + 1) - n2);
            n1 += ryf * (n2 - n1);

            of += ZWRAP;
            n2 = self.at(of);
            n2 += rxf * (self.at(of + 1) - n2);
            let mut n3 = self.at(of + YWRAP);
            n3 += rxf * (self.at(of + YWRAP + 1) - n3);
            n2 += ryf * (n3 - n2);

            n1 += scaled_cosine(zf) * (n2 - n1);

            r += n1 * ampl;
            ampl *= AMP_FALLOFF;

            xi = xi.wrapping_shl(1);
            xf *= 2.0;
            yi = yi.wrapping_shl(1);
            yf *= 2.0;
            zi = zi.wrapping_shl(1);
            zf *= 2.0;

            if xf >= 1.0 {
                xi += 1;
                xf -= 1.0;
            }
            if yf >= 1.0 {
                yi += 1;
                yf -= 1.0;
            }
            if zf >= 1.0 {
                zi += 1;
                zf -= 1.0;
            }
        }

        r.clamp(0.0, 1.0)
    }
}

/// Stateless trigonometric hash; cheap, deterministic, not spatially coherent.
#[derive(Clone, Copy, Debug, Default)]
pub struct HashNoise;

impl NoiseSource for HashNoise {
    fn noise(&self, x: f64, y: f64, z: f64) -> f64 {
        let h = (x * 12.9898 + y * 78.233 + z * 37.719) % 1.0;
        ((h * PI).sin() * 0.5 + 0.5).clamp(0.0, 1.0)
    }
}

/// Noise selected at runtime by [`NoiseFidelity`].
#[derive(Clone, Debug)]
pub enum SeededNoise {
    Perlin(PerlinNoise),
    Hash(HashNoise),
}

impl NoiseSource for SeededNoise {
    fn noise(&self, x: f64, y: f64, z: f64) -> f64 {
        match self {
            Self::Perlin(n) => n.noise(x, y, z),
            Self::Hash(n) => n.noise(x, y, z),
        }
    }
}

/// Which generator pair drives a render.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum NoiseFidelity {
    /// [`Lcg`] + [`PerlinNoise`]. Smooth fields; identical across all backends.
    #[default]
    Coherent,
    /// [`SineRandom`] + [`HashNoise`]. Cheaper, structurally equivalent.
    Fast,
}

impl NoiseFidelity {
    pub fn random(self, seed: SignatureSeed) -> SeededRandom {
        match self {
            Self::Coherent => SeededRandom::Lcg(Lcg::new(seed)),
            Self::Fast => SeededRandom::Sine(SineRandom::new(seed)),
        }
    }

    pub fn noise(self, seed: SignatureSeed) -> SeededNoise {
        match self {
            Self::Coherent => SeededNoise::Perlin(PerlinNoise::new(seed)),
            Self::Fast => SeededNoise::Hash(HashNoise),
        }
    }
}

impl std::str::FromStr for NoiseFidelity {
    type Err = crate::foundation::error::ArtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "coherent" => Ok(Self::Coherent),
            "fast" => Ok(Self::Fast),
            other => Err(crate::foundation::error::ArtError::validation(format!(
                "unknown noise fidelity '{other}' (expected 'coherent' or 'fast')"
            ))),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/seed/noise.rs"]
mod tests;
