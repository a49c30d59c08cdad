use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// An instrument family on one exchange
///
/// # Canonical name
/// `EXCHANGE.code`, e.g. `SHFE.rb`. The exchange is upper-case by
/// convention, the product code is whatever the venue uses (usually
/// lower-case for futures).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Product {
    /// Exchange code, e.g. `SHFE`
    pub exchange: String,
    /// Product code, e.g. `rb`
    pub code: String,
}

impl Product {
    pub fn new(exchange: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            exchange: exchange.into(),
            code: code.into(),
        }
    }

    /// Canonical name, e.g. `SHFE.rb`
    pub fn name(&self) -> String {
        format!("{}.{}", self.exchange, self.code)
    }
}

impl FromStr for Product {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        let (exchange, code) = s
            .split_once('.')
            .ok_or_else(|| Error::Parse(format!("Product name missing '.': {}", s)))?;
        if exchange.is_empty() || code.is_empty() {
            return Err(Error::Parse(format!("Invalid product name: {}", s)));
        }
        Ok(Product::new(exchange, code))
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.exchange, self.code)
    }
}

/// A single tradable contract: product plus expiry code
///
/// # Canonical name
/// `EXCHANGE.code<expiry>`, e.g. `SHFE.rb2110`. The expiry code is the
/// trailing digit run of the contract name.
///
/// # Ordering
/// Tickers order by (product, expiry code). Within one product the expiry
/// code is treated as a proxy for expiry distance: `rb2105 < rb2110 <
/// rb2201`. This holds for `YYMM`-style codes and is assumed, not derived
/// from a date field; a venue that wraps or resets its code scheme would
/// break the assumption.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticker {
    pub product: Product,
    /// Expiry code, e.g. `2110`
    pub expiry: String,
}

impl Ticker {
    pub fn new(product: Product, expiry: impl Into<String>) -> Self {
        Self {
            product,
            expiry: expiry.into(),
        }
    }

    /// Canonical name, e.g. `SHFE.rb2110`
    pub fn name(&self) -> String {
        format!(
            "{}.{}{}",
            self.product.exchange, self.product.code, self.expiry
        )
    }

    pub fn exchange(&self) -> &str {
        &self.product.exchange
    }
}

impl FromStr for Ticker {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        let (exchange, contract) = s
            .split_once('.')
            .ok_or_else(|| Error::Parse(format!("Ticker name missing '.': {}", s)))?;
        let digit_at = contract
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| Error::Parse(format!("Ticker name has no expiry code: {}", s)))?;
        let (code, expiry) = contract.split_at(digit_at);
        if exchange.is_empty() || code.is_empty() {
            return Err(Error::Parse(format!("Invalid ticker name: {}", s)));
        }
        Ok(Ticker::new(Product::new(exchange, code), expiry))
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}{}",
            self.product.exchange, self.product.code, self.expiry
        )
    }
}

/// A lookup subject: one concrete contract, a whole product, or everything
/// on an exchange
///
/// Callers dispatch on the variant instead of inspecting runtime types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolRef {
    Ticker(Ticker),
    Product(Product),
    Exchange(String),
}

impl SymbolRef {
    /// Exchange the holiday calendar is keyed on for this symbol
    pub fn exchange(&self) -> &str {
        match self {
            SymbolRef::Ticker(t) => t.exchange(),
            SymbolRef::Product(p) => &p.exchange,
            SymbolRef::Exchange(e) => e,
        }
    }
}

impl Serialize for Product {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name())
    }
}

impl<'de> Deserialize<'de> for Product {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(|e: Error| D::Error::custom(e.to_string()))
    }
}

impl Serialize for Ticker {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name())
    }
}

impl<'de> Deserialize<'de> for Ticker {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(|e: Error| D::Error::custom(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticker_parse_roundtrip() {
        let ticker: Ticker = "SHFE.rb2110".parse().unwrap();
        assert_eq!(ticker.product.exchange, "SHFE");
        assert_eq!(ticker.product.code, "rb");
        assert_eq!(ticker.expiry, "2110");
        assert_eq!(ticker.name(), "SHFE.rb2110");
    }

    #[test]
    fn test_ticker_parse_rejects_garbage() {
        assert!("rb2110".parse::<Ticker>().is_err());
        assert!("SHFE.".parse::<Ticker>().is_err());
        assert!("SHFE.rb".parse::<Ticker>().is_err());
        assert!("SHFE.2110".parse::<Ticker>().is_err());
    }

    #[test]
    fn test_ticker_ordering_tracks_expiry() {
        let near: Ticker = "SHFE.rb2105".parse().unwrap();
        let far: Ticker = "SHFE.rb2110".parse().unwrap();
        let next_year: Ticker = "SHFE.rb2201".parse().unwrap();
        assert!(near < far);
        assert!(far < next_year);
    }

    #[test]
    fn test_product_parse() {
        let product: Product = "DCE.i".parse().unwrap();
        assert_eq!(product.exchange, "DCE");
        assert_eq!(product.code, "i");
        assert!("DCE".parse::<Product>().is_err());
    }

    #[test]
    fn test_symbol_ref_exchange() {
        let ticker: Ticker = "SHFE.cu2203".parse().unwrap();
        assert_eq!(SymbolRef::Ticker(ticker).exchange(), "SHFE");
        assert_eq!(
            SymbolRef::Product(Product::new("DCE", "i")).exchange(),
            "DCE"
        );
        assert_eq!(SymbolRef::Exchange("CZCE".to_string()).exchange(), "CZCE");
    }
}
