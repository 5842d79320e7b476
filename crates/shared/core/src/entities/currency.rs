use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const UNKNOWN: &str = "UNKNOWN";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid currency pair: {0:?}")]
pub struct PairParseError(pub String);

/// A base/quote currency pair such as BTC/USDT
///
/// Currency codes are stored upper-cased. The canonical text form is
/// `BASE_QUOTE` (e.g. `BTC_USDT`); exchanges render it with their own
/// separator and case via [`CurrencyPair::to_symbol`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrencyPair {
    pub base: String,
    pub quote: String,
}

impl CurrencyPair {
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        CurrencyPair {
            base: base.into().to_uppercase(),
            quote: quote.into().to_uppercase(),
        }
    }

    /// Placeholder for pairs that could not be recovered from a frame
    pub fn unknown() -> Self {
        CurrencyPair::new(UNKNOWN, UNKNOWN)
    }

    pub fn is_unknown(&self) -> bool {
        self.base == UNKNOWN && self.quote == UNKNOWN
    }

    /// Parse a symbol split by `separator`, e.g. `("BTC-USD", "-")`
    pub fn from_symbol(symbol: &str, separator: &str) -> Result<Self, PairParseError> {
        let mut parts = symbol.split(separator);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(base), Some(quote), None) if !base.is_empty() && !quote.is_empty() => {
                Ok(CurrencyPair::new(base, quote))
            }
            _ => Err(PairParseError(symbol.to_string())),
        }
    }

    /// Recover a pair from a concatenated exchange symbol (`btcusdt`) by
    /// matching the first quote currency in `quotes` that is a suffix.
    ///
    /// Quotes are tried in the given order, so longer codes that share a
    /// suffix with shorter ones (`husd` vs `usd`) must come first.
    pub fn split_by_quote(symbol: &str, quotes: &[&str]) -> Option<Self> {
        let lower = symbol.to_lowercase();
        quotes.iter().find_map(|quote| {
            let quote = quote.to_lowercase();
            lower
                .strip_suffix(quote.as_str())
                .filter(|base| !base.is_empty())
                .map(|base| CurrencyPair::new(base, quote.as_str()))
        })
    }

    /// Render as `BASE{separator}QUOTE`
    pub fn to_symbol(&self, separator: &str) -> String {
        format!("{}{}{}", self.base, separator, self.quote)
    }

    /// Render as `base{separator}quote`
    pub fn to_lower_symbol(&self, separator: &str) -> String {
        self.to_symbol(separator).to_lowercase()
    }

    /// Map a USDT quote to USD (coin-margined contracts are quoted in USD)
    pub fn usdt_to_usd(&self) -> Self {
        if self.quote == "USDT" {
            CurrencyPair::new(self.base.as_str(), "USD")
        } else {
            self.clone()
        }
    }

    /// Map a USD quote to USDT
    pub fn usd_to_usdt(&self) -> Self {
        if self.quote == "USD" {
            CurrencyPair::new(self.base.as_str(), "USDT")
        } else {
            self.clone()
        }
    }
}

impl Default for CurrencyPair {
    fn default() -> Self {
        CurrencyPair::unknown()
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.base, self.quote)
    }
}

impl FromStr for CurrencyPair {
    type Err = PairParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CurrencyPair::from_symbol(s, "_")
    }
}
