/// Non-negative 32-bit seed derived from a signature string.
///
/// Every backend derives the same value for the same string, bit for bit.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct SignatureSeed(pub u32);

impl SignatureSeed {
    /// `hash = hash * 31 + code_unit` with two's-complement wrap after every step, then `|hash|`.
    ///
    /// Characters are iterated as UTF-16 code units so non-BMP input hashes the
    /// same way a browser `charCodeAt` loop does.
    pub fn derive(signature: &str) -> Self {
        let mut hash: i32 = 0;
        for unit in signature.encode_utf16() {
            hash = hash.wrapping_mul(31).wrapping_add(i32::from(unit));
        }
        // i32::MIN has no positive i32 counterpart; u32 holds it.
        Self(hash.unsigned_abs())
    }

    pub fn value(self) -> u32 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.0)
    }
}

impl From<&str> for SignatureSeed {
    fn from(signature: &str) -> Self {
        Self::derive(signature)
    }
}

impl std::fmt::Display for SignatureSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Free-function form of [`SignatureSeed::derive`].
pub fn derive_seed(signature: &str) -> SignatureSeed {
    SignatureSeed::derive(signature)
}

#[cfg(test)]
#[path = "../../tests/unit/seed/derive.rs"]
mod tests;
