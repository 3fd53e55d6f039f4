//! The shared store tier: durable, namespaced rate persistence.
//!
//! Rates live in Redis hashes, one per `(namespace, base, quote)` key, with
//! ISO date fields and canonical decimal-string values. The wire format is
//! shared with other readers of the same store and must not drift.

use std::collections::HashMap;

use redis::Commands;
use rust_decimal::Decimal;
use tracing::debug;

use ratebank_common::{format_date, parse_date, Currency};

use crate::config::StoreConfig;
use crate::error::{FxError, FxResult};
use crate::{RateMap, RateTable};

/// Durable rate storage relative to a fixed base currency.
///
/// `get_rates` returns an empty table (not an error) when no data exists for
/// the currency; transport problems surface as
/// [`FxError::StoreRequestFailed`].
pub trait RateStore: Send + Sync {
    /// Persist the given quote currency → date → rate mapping as one
    /// batched submission.
    fn add_rates(&self, rates: &RateMap) -> FxResult<()>;

    /// Fetch everything stored for one quote currency.
    fn get_rates(&self, currency: &Currency) -> FxResult<RateTable>;
}

/// Reject any mapping that files a rate other than exactly 1 under the base
/// currency's own code. Runs before any write is issued.
pub fn validate_base_rates(base: &Currency, rates: &RateMap) -> FxResult<()> {
    if let Some(table) = rates.get(base) {
        for (date, rate) in table {
            if *rate != Decimal::ONE {
                return Err(FxError::InvalidBaseRate {
                    base: base.clone(),
                    date: *date,
                    rate: *rate,
                });
            }
        }
    }
    Ok(())
}

/// Decode a canonical decimal string, accepting plain and scientific forms.
pub(crate) fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str_exact(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

/// Redis-backed [`RateStore`].
pub struct RedisRateStore {
    client: redis::Client,
    namespace: String,
    base: Currency,
}

impl RedisRateStore {
    /// Create a store for the given connection target and base currency.
    pub fn new(config: &StoreConfig, base: Currency) -> FxResult<Self> {
        let client = redis::Client::open(config.url.as_str()).map_err(|e| {
            FxError::StoreRequestFailed {
                operation: format!("CONNECT {}", config.url),
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            client,
            namespace: config.namespace.clone(),
            base,
        })
    }

    /// The store key addressing one quote currency's rate table.
    ///
    /// External systems read these keys directly; the scheme is fixed.
    pub fn key(&self, quote: &Currency) -> String {
        format!("{}:{}:{}", self.namespace, self.base.code(), quote.code())
    }

    fn connection(&self, operation: &str) -> FxResult<redis::Connection> {
        self.client
            .get_connection()
            .map_err(|e| FxError::StoreRequestFailed {
                operation: operation.to_string(),
                reason: e.to_string(),
            })
    }
}

impl RateStore for RedisRateStore {
    fn add_rates(&self, rates: &RateMap) -> FxResult<()> {
        validate_base_rates(&self.base, rates)?;

        let mut pipe = redis::pipe();
        let mut keys = Vec::new();
        for (currency, table) in rates {
            if table.is_empty() {
                continue;
            }
            let key = self.key(currency);
            let fields: Vec<(String, String)> = table
                .iter()
                .map(|(date, rate)| (format_date(*date), rate.to_string()))
                .collect();
            pipe.hset_multiple(&key, &fields).ignore();
            keys.push(key);
        }

        if keys.is_empty() {
            return Ok(());
        }

        let operation = format!("HSET {}", keys.join(" "));
        let mut conn = self.connection(&operation)?;
        pipe.query::<()>(&mut conn)
            .map_err(|e| FxError::StoreRequestFailed {
                operation: operation.clone(),
                reason: e.to_string(),
            })?;

        debug!(keys = %keys.join(" "), "persisted rate tables");
        Ok(())
    }

    fn get_rates(&self, currency: &Currency) -> FxResult<RateTable> {
        let key = self.key(currency);
        let operation = format!("HGETALL {key}");

        let mut conn = self.connection(&operation)?;
        let raw: HashMap<String, String> =
            conn.hgetall(&key).map_err(|e| FxError::StoreRequestFailed {
                operation: operation.clone(),
                reason: e.to_string(),
            })?;

        let mut table = RateTable::new();
        for (field, value) in raw {
            let date = parse_date(&field).map_err(|e| FxError::StoreRequestFailed {
                operation: operation.clone(),
                reason: format!("bad date field {field:?}: {e}"),
            })?;
            let rate = parse_decimal(&value).ok_or_else(|| FxError::StoreRequestFailed {
                operation: operation.clone(),
                reason: format!("bad rate value {value:?} for field {field:?}"),
            })?;
            table.insert(date, rate);
        }

        Ok(table)
    }
}

/// In-memory [`RateStore`] double that mirrors the Redis string encoding, so
/// tests exercise the same encode/decode path as the real store.
#[cfg(any(test, feature = "test-utils"))]
pub struct MemoryRateStore {
    base: Currency,
    tables: parking_lot::Mutex<HashMap<Currency, std::collections::BTreeMap<String, String>>>,
    get_calls: std::sync::atomic::AtomicUsize,
}

#[cfg(any(test, feature = "test-utils"))]
impl MemoryRateStore {
    /// Create an empty store for the given base currency.
    pub fn new(base: Currency) -> Self {
        Self {
            base,
            tables: parking_lot::Mutex::new(HashMap::new()),
            get_calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Number of `get_rates` calls made against this store.
    pub fn get_calls(&self) -> usize {
        self.get_calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl RateStore for MemoryRateStore {
    fn add_rates(&self, rates: &RateMap) -> FxResult<()> {
        validate_base_rates(&self.base, rates)?;

        let mut tables = self.tables.lock();
        for (currency, table) in rates {
            let entry = tables.entry(currency.clone()).or_default();
            for (date, rate) in table {
                entry.insert(format_date(*date), rate.to_string());
            }
        }
        Ok(())
    }

    fn get_rates(&self, currency: &Currency) -> FxResult<RateTable> {
        self.get_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        let tables = self.tables.lock();
        let Some(raw) = tables.get(currency) else {
            return Ok(RateTable::new());
        };

        let mut table = RateTable::new();
        for (field, value) in raw {
            let date = parse_date(field).map_err(|e| FxError::StoreRequestFailed {
                operation: format!("GET {currency}"),
                reason: format!("bad date field {field:?}: {e}"),
            })?;
            let rate = parse_decimal(value).ok_or_else(|| FxError::StoreRequestFailed {
                operation: format!("GET {currency}"),
                reason: format!("bad rate value {value:?}"),
            })?;
            table.insert(date, rate);
        }
        Ok(table)
    }
}

/// Store double that panics if touched; proves a code path performs no
/// store I/O.
#[cfg(any(test, feature = "test-utils"))]
pub struct ExplodingStore;

#[cfg(any(test, feature = "test-utils"))]
impl RateStore for ExplodingStore {
    fn add_rates(&self, _rates: &RateMap) -> FxResult<()> {
        panic!("store must not be written on this path");
    }

    fn get_rates(&self, _currency: &Currency) -> FxResult<RateTable> {
        panic!("store must not be consulted on this path");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn single(currency: Currency, d: NaiveDate, rate: Decimal) -> RateMap {
        let mut map = RateMap::new();
        map.insert(currency, [(d, rate)].into_iter().collect());
        map
    }

    #[test]
    fn test_parse_decimal_plain_and_scientific() {
        assert_eq!(parse_decimal("0.11111"), Some(dec!(0.11111)));
        assert_eq!(parse_decimal("272.511002"), Some(dec!(272.511002)));
        assert_eq!(parse_decimal("0.272511002E3"), Some(dec!(272.511002)));
        assert_eq!(parse_decimal("not-a-rate"), None);
    }

    #[test]
    fn test_base_rate_of_one_is_accepted() {
        let store = MemoryRateStore::new(Currency::eur());
        let rates = single(Currency::eur(), date(2015, 9, 10), Decimal::ONE);
        assert!(store.add_rates(&rates).is_ok());
    }

    #[test]
    fn test_base_rate_other_than_one_is_rejected() {
        let store = MemoryRateStore::new(Currency::eur());
        let rates = single(Currency::eur(), date(2015, 9, 10), dec!(0.5));

        let err = store.add_rates(&rates).unwrap_err();
        assert!(matches!(err, FxError::InvalidBaseRate { .. }));
        assert_eq!(err.kind(), crate::ErrorKind::Validation);
    }

    #[test]
    fn test_non_base_rate_is_unrestricted() {
        let store = MemoryRateStore::new(Currency::eur());
        let rates = single(Currency::usd(), date(2015, 9, 10), dec!(0.0001));
        assert!(store.add_rates(&rates).is_ok());
    }

    #[test]
    fn test_round_trip_through_string_encoding() {
        let store = MemoryRateStore::new(Currency::eur());
        let mut rates = RateMap::new();
        rates.insert(
            Currency::usd(),
            [
                (date(2015, 9, 10), dec!(1.1234)),
                (date(2015, 9, 11), dec!(1.1300)),
            ]
            .into_iter()
            .collect(),
        );
        rates.insert(
            Currency::gbp(),
            [(date(2015, 9, 10), dec!(0.44444))].into_iter().collect(),
        );

        store.add_rates(&rates).unwrap();

        for (currency, table) in &rates {
            assert_eq!(&store.get_rates(currency).unwrap(), table);
        }
    }

    #[test]
    fn test_get_rates_absent_currency_is_empty_not_error() {
        let store = MemoryRateStore::new(Currency::eur());
        assert!(store.get_rates(&Currency::jpy()).unwrap().is_empty());
    }

    #[test]
    fn test_redis_key_scheme() {
        let store = RedisRateStore::new(&StoreConfig::default(), Currency::eur()).unwrap();
        assert_eq!(store.key(&Currency::usd()), "currency:EUR:USD");
    }

    #[test]
    fn test_redis_validates_before_any_io() {
        // Port 1 is never a live Redis; validation must fail first, without
        // a connection attempt.
        let config = StoreConfig {
            url: "redis://127.0.0.1:1/".to_string(),
            ..Default::default()
        };
        let store = RedisRateStore::new(&config, Currency::eur()).unwrap();

        let rates = single(Currency::eur(), date(2015, 9, 10), dec!(0.5));
        let err = store.add_rates(&rates).unwrap_err();
        assert!(matches!(err, FxError::InvalidBaseRate { .. }));
    }
}
