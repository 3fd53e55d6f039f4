//! The memory tier: in-process historical rate cache.

use std::collections::HashMap;

use chrono::NaiveDate;
use parking_lot::Mutex;
use ratebank_common::Currency;
use rust_decimal::Decimal;
use tracing::debug;

use crate::RateTable;

/// Thread-safe in-memory mapping from quote currency to its rate table.
///
/// All access goes through one exclusive lock over the whole structure; the
/// lock is only ever held for the duration of a map operation, never across
/// store or provider I/O. Entries are merged in and never evicted — daily FX
/// rates are a small, slowly growing key space, so no expiry or size bound
/// is needed within a process lifetime.
#[derive(Debug, Default)]
pub struct HistoricalRateCache {
    tables: Mutex<HashMap<Currency, RateTable>>,
}

impl HistoricalRateCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the cached rate for a currency on a date, if present.
    ///
    /// Never performs I/O.
    pub fn get(&self, currency: &Currency, date: NaiveDate) -> Option<Decimal> {
        let tables = self.tables.lock();
        let rate = tables.get(currency).and_then(|table| table.get(&date)).copied();

        match rate {
            Some(_) => debug!(currency = %currency, %date, "memory tier hit"),
            None => debug!(currency = %currency, %date, "memory tier miss"),
        }

        rate
    }

    /// Union the given date → rate entries into the currency's table.
    ///
    /// Existing entries for the same date are overwritten.
    pub fn merge(&self, currency: &Currency, rates: &RateTable) {
        if rates.is_empty() {
            return;
        }

        let mut tables = self.tables.lock();
        tables
            .entry(currency.clone())
            .or_default()
            .extend(rates.iter().map(|(date, rate)| (*date, *rate)));
    }

    /// Drop all cached rates. Used on reconfiguration.
    pub fn clear(&self) {
        self.tables.lock().clear();
    }

    /// Number of currencies with at least one cached rate.
    pub fn len(&self) -> usize {
        self.tables.lock().len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.tables.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_get_absent() {
        let cache = HistoricalRateCache::new();
        assert!(cache.get(&Currency::usd(), date(2015, 9, 10)).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_merge_and_get() {
        let cache = HistoricalRateCache::new();
        let table: RateTable = [(date(2015, 9, 10), dec!(1.1234))].into_iter().collect();

        cache.merge(&Currency::usd(), &table);

        assert_eq!(cache.get(&Currency::usd(), date(2015, 9, 10)), Some(dec!(1.1234)));
        assert!(cache.get(&Currency::usd(), date(2015, 9, 11)).is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_merge_overwrites_on_date_collision() {
        let cache = HistoricalRateCache::new();
        let first: RateTable = [(date(2015, 9, 10), dec!(1.0))].into_iter().collect();
        let second: RateTable = [
            (date(2015, 9, 10), dec!(2.0)),
            (date(2015, 9, 11), dec!(3.0)),
        ]
        .into_iter()
        .collect();

        cache.merge(&Currency::usd(), &first);
        cache.merge(&Currency::usd(), &second);

        assert_eq!(cache.get(&Currency::usd(), date(2015, 9, 10)), Some(dec!(2.0)));
        assert_eq!(cache.get(&Currency::usd(), date(2015, 9, 11)), Some(dec!(3.0)));
    }

    #[test]
    fn test_clear() {
        let cache = HistoricalRateCache::new();
        let table: RateTable = [(date(2015, 9, 10), dec!(1.1))].into_iter().collect();
        cache.merge(&Currency::usd(), &table);

        cache.clear();

        assert!(cache.is_empty());
    }
}
