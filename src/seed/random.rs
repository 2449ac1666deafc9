use crate::seed::derive::SignatureSeed;

/// Deterministic uniform generator driven by a [`SignatureSeed`].
///
/// Two instances built from the same seed and driven by the same call sequence
/// produce the same stream.
pub trait RandomSource {
    /// Uniform sample in `[0, 1)`.
    fn next_f64(&mut self) -> f64;

    /// Uniform sample in `[min, max)`; bounds are swapped when `min > max`.
    fn range(&mut self, min: f64, max: f64) -> f64 {
        let (lo, hi) = if min > max { (max, min) } else { (min, max) };
        self.next_f64() * (hi - lo) + lo
    }

    /// In-place Fisher-Yates walking down from the end, index `floor(rand * i)`.
    fn shuffle<T>(&mut self, items: &mut [T])
    where
        Self: Sized,
    {
        let mut idx = items.len();
        while idx > 1 {
            let rnd = (self.range(0.0, 1.0) * idx as f64) as usize;
            idx -= 1;
            items.swap(idx, rnd.min(idx));
        }
    }
}

/// 32-bit linear congruential generator (`m = 2^32`, `a = 1664525`, `c = 1013904223`).
#[derive(Clone, Debug)]
pub struct Lcg {
    state: u32,
}

impl Lcg {
    const A: u32 = 1_664_525;
    const C: u32 = 1_013_904_223;
    const M: f64 = 4_294_967_296.0;

    pub fn new(seed: SignatureSeed) -> Self {
        Self::from_state(seed.value())
    }

    pub fn from_state(state: u32) -> Self {
        Self { state }
    }
}

impl RandomSource for Lcg {
    fn next_f64(&mut self) -> f64 {
        self.state = self.state.wrapping_mul(Self::A).wrapping_add(Self::C);
        f64::from(self.state) / Self::M
    }
}

/// Cheap sine-hash generator: `x = sin(x) * 10000`, output `fract(x)`.
#[derive(Clone, Debug)]
pub struct SineRandom {
    x: f64,
}

impl SineRandom {
    pub fn new(seed: SignatureSeed) -> Self {
        Self {
            x: seed.as_f64().sin() * 10_000.0,
        }
    }
}

impl RandomSource for SineRandom {
    fn next_f64(&mut self) -> f64 {
        self.x = self.x.sin() * 10_000.0;
        let v = self.x - self.x.floor();
        // `x - floor(x)` can round up to exactly 1.0 for tiny negative x.
        if v >= 1.0 { 0.0 } else { v }
    }
}

/// Generator selected at runtime by [`crate::seed::noise::NoiseFidelity`].
#[derive(Clone, Debug)]
pub enum SeededRandom {
    Lcg(Lcg),
    Sine(SineRandom),
}

impl RandomSource for SeededRandom {
    fn next_f64(&mut self) -> f64 {
        match self {
            Self::Lcg(r) => r.next_f64(),
            Self::Sine(r) => r.next_f64(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/seed/random.rs"]
mod tests;
