//! Currency with minor-unit precision
//!
//! Monetary results are rounded to the minor-unit precision of their
//! currency (2 decimals for EUR/USD, 0 for JPY, 3 for KWD). Equality and
//! hashing are by code only; the precision is derived from the code at
//! construction time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Minor-unit precision for an ISO 4217 code.
///
/// Unknown codes fall back to 2 decimals, which covers the vast majority
/// of currencies in circulation.
fn decimals_for(code: &str) -> u32 {
    match code {
        // Zero-decimal currencies
        "JPY" | "KRW" | "VND" | "CLP" | "ISK" => 0,
        // Three-decimal currencies
        "KWD" | "BHD" | "OMR" | "TND" | "JOD" => 3,
        _ => 2,
    }
}

/// A currency code plus its minor-unit precision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Currency {
    code: String,
    decimals: u32,
}

impl Currency {
    /// Create a currency from an ISO 4217 code (case-insensitive)
    pub fn from_code(code: &str) -> Self {
        let code = code.to_uppercase();
        let decimals = decimals_for(&code);
        Self { code, decimals }
    }

    pub fn eur() -> Self {
        Self::from_code("EUR")
    }

    pub fn usd() -> Self {
        Self::from_code("USD")
    }

    pub fn gbp() -> Self {
        Self::from_code("GBP")
    }

    pub fn jpy() -> Self {
        Self::from_code("JPY")
    }

    pub fn kwd() -> Self {
        Self::from_code("KWD")
    }

    /// The ISO 4217 code (always uppercase)
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Minor-unit precision (number of decimal places)
    pub fn decimals(&self) -> u32 {
        self.decimals
    }
}

impl PartialEq for Currency {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for Currency {}

impl Hash for Currency {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code.hash(state);
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}
