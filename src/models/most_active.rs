use chrono::NaiveDate;
use serde::Serialize;

use super::{Product, Ticker};

/// The contract judged most liquid for a product on one date
///
/// Natural key is `(product, date)`: after reconciliation at most one record
/// exists per key. Records are created by a periodic external download and
/// only ever change through the reconciliation run, never by silent
/// overwrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MostActiveRecord {
    pub product: Product,
    pub date: NaiveDate,
    pub ticker: Ticker,
}

impl MostActiveRecord {
    pub fn new(product: Product, date: NaiveDate, ticker: Ticker) -> Self {
        Self {
            product,
            date,
            ticker,
        }
    }

    /// Natural key of the record
    pub fn key(&self) -> (Product, NaiveDate) {
        (self.product.clone(), self.date)
    }
}
