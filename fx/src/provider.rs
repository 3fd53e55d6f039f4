//! The provider tier: Open Exchange Rates historical data client.
//!
//! The upstream API returns `date -> currency -> rate`; this module
//! transposes to `currency -> date -> rate` before returning, matching the
//! store's orientation — lookups are always "everything for one currency".

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use ratebank_common::{format_date, month_window, parse_date, yesterday_utc, Currency};
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::ProviderConfig;
use crate::error::{FxError, FxResult};
use crate::store::parse_decimal;
use crate::{RateMap, RateTable};

/// The provider's floor: no historical data exists before this date.
pub fn min_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1999, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Validate that a date is fetchable: between the provider floor and the
/// most recent fully-closed UTC day. Runs before any network call.
pub fn check_date_range(date: NaiveDate) -> FxResult<()> {
    let min = min_date();
    let max = yesterday_utc();
    if date < min || date > max {
        return Err(FxError::DateOutOfRange { date, min, max });
    }
    Ok(())
}

/// Provider account tier; selects the fetch strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccountTier {
    Free,
    Developer,
    #[default]
    Enterprise,
    Unlimited,
}

impl AccountTier {
    /// Whether this tier may use the month-range time-series endpoint.
    pub fn supports_time_series(&self) -> bool {
        matches!(self, AccountTier::Enterprise | AccountTier::Unlimited)
    }
}

/// Source of historical rates relative to a configured base currency.
///
/// Implementations return the unified `currency -> date -> rate` shape
/// whatever fetch strategy they use; callers must not assume how many dates
/// one call covers.
pub trait HistoricalRates: Send + Sync {
    /// Fetch rates applicable to `date` for all quote currencies.
    fn fetch_rates(&self, date: NaiveDate) -> FxResult<RateMap>;
}

#[derive(Debug, Deserialize)]
struct HistoricalResponse {
    rates: HashMap<String, serde_json::Number>,
}

#[derive(Debug, Deserialize)]
struct TimeSeriesResponse {
    rates: BTreeMap<String, HashMap<String, serde_json::Number>>,
}

fn decode_rate(code: &str, raw: &serde_json::Number, start: NaiveDate, end: NaiveDate) -> FxResult<rust_decimal::Decimal> {
    parse_decimal(&raw.to_string()).ok_or_else(|| FxError::ProviderRequestFailed {
        start,
        end,
        reason: format!("unparseable rate {raw} for {code}"),
    })
}

fn day_rates(date: NaiveDate, response: HistoricalResponse) -> FxResult<RateMap> {
    let mut map = RateMap::with_capacity(response.rates.len());
    for (code, raw) in &response.rates {
        let rate = decode_rate(code, raw, date, date)?;
        let table: RateTable = [(date, rate)].into_iter().collect();
        map.insert(Currency::new(code.as_str()), table);
    }
    Ok(map)
}

fn transpose_series(
    response: TimeSeriesResponse,
    start: NaiveDate,
    end: NaiveDate,
) -> FxResult<RateMap> {
    let mut map = RateMap::new();
    for (date_str, by_currency) in &response.rates {
        let date = parse_date(date_str).map_err(|e| FxError::ProviderRequestFailed {
            start,
            end,
            reason: format!("unparseable date {date_str:?}: {e}"),
        })?;
        for (code, raw) in by_currency {
            let rate = decode_rate(code, raw, start, end)?;
            map.entry(Currency::new(code.as_str()))
                .or_default()
                .insert(date, rate);
        }
    }
    Ok(map)
}

/// Blocking HTTP client for the Open Exchange Rates historical API.
pub struct OpenExchangeRatesClient {
    http: reqwest::blocking::Client,
    app_id: String,
    base: Currency,
    tier: AccountTier,
    api_url: String,
}

impl OpenExchangeRatesClient {
    /// Create a client for the given configuration and base currency.
    pub fn new(config: &ProviderConfig, base: Currency) -> FxResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FxError::InvalidConfig(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            app_id: config.app_id.clone(),
            base,
            tier: config.tier,
            api_url: config.api_url.clone(),
        })
    }

    fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        start: NaiveDate,
        end: NaiveDate,
    ) -> FxResult<T> {
        let failed = |reason: String| FxError::ProviderRequestFailed { start, end, reason };

        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(failed(format!("{status}: {body}")));
        }

        response.json().map_err(|e| failed(format!("decode: {e}")))
    }

    fn fetch_day(&self, date: NaiveDate) -> FxResult<RateMap> {
        let url = format!("{}/historical/{}.json", self.api_url, format_date(date));
        debug!(%date, "fetching single-day rates");

        let response: HistoricalResponse = self.get_json(
            &url,
            &[("app_id", self.app_id.as_str()), ("base", self.base.code())],
            date,
            date,
        )?;

        let rates = day_rates(date, response)?;
        info!(%date, currencies = rates.len(), "fetched single-day rates");
        Ok(rates)
    }

    fn fetch_month(&self, date: NaiveDate) -> FxResult<RateMap> {
        let (start, end) = month_window(date, yesterday_utc());
        let url = format!("{}/time-series.json", self.api_url);
        debug!(%start, %end, "fetching month-range rates");

        let response: TimeSeriesResponse = self.get_json(
            &url,
            &[
                ("app_id", self.app_id.as_str()),
                ("base", self.base.code()),
                ("start", &format_date(start)),
                ("end", &format_date(end)),
            ],
            start,
            end,
        )?;

        let rates = transpose_series(response, start, end)?;
        info!(%start, %end, currencies = rates.len(), "fetched month-range rates");
        Ok(rates)
    }
}

impl HistoricalRates for OpenExchangeRatesClient {
    fn fetch_rates(&self, date: NaiveDate) -> FxResult<RateMap> {
        check_date_range(date)?;

        if self.tier.supports_time_series() {
            self.fetch_month(date)
        } else {
            self.fetch_day(date)
        }
    }
}

/// In-memory [`HistoricalRates`] double preloaded with a rate map.
///
/// Returns the whole preloaded map on every fetch (like the month-range
/// tier) and counts calls.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockRateProvider {
    rates: parking_lot::Mutex<RateMap>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockRateProvider {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self {
            rates: parking_lot::Mutex::new(RateMap::new()),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Preload rates for one currency.
    pub fn set_rates(&self, currency: Currency, table: RateTable) {
        self.rates.lock().insert(currency, table);
    }

    /// Number of `fetch_rates` calls made against this provider.
    pub fn fetch_calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Default for MockRateProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl HistoricalRates for MockRateProvider {
    fn fetch_rates(&self, date: NaiveDate) -> FxResult<RateMap> {
        check_date_range(date)?;
        self.calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(self.rates.lock().clone())
    }
}

/// Provider double that panics if touched; proves a code path performs no
/// provider I/O.
#[cfg(any(test, feature = "test-utils"))]
pub struct ExplodingRates;

#[cfg(any(test, feature = "test-utils"))]
impl HistoricalRates for ExplodingRates {
    fn fetch_rates(&self, _date: NaiveDate) -> FxResult<RateMap> {
        panic!("provider must not be consulted on this path");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_date_floor() {
        assert!(check_date_range(date(1998, 12, 31)).is_err());
        assert!(check_date_range(min_date()).is_ok());
    }

    #[test]
    fn test_date_ceiling_is_yesterday_utc() {
        let yesterday = yesterday_utc();
        assert!(check_date_range(yesterday).is_ok());

        let err = check_date_range(yesterday + Days::new(1)).unwrap_err();
        assert!(matches!(err, FxError::DateOutOfRange { .. }));
        assert_eq!(err.kind(), crate::ErrorKind::Validation);
    }

    #[test]
    fn test_tier_strategy_selection() {
        assert!(!AccountTier::Free.supports_time_series());
        assert!(!AccountTier::Developer.supports_time_series());
        assert!(AccountTier::Enterprise.supports_time_series());
        assert!(AccountTier::Unlimited.supports_time_series());
    }

    #[test]
    fn test_day_response_reshaped_to_unified_form() {
        let response: HistoricalResponse =
            serde_json::from_str(r#"{"base":"EUR","rates":{"USD":1.1234,"GBP":0.44444}}"#)
                .unwrap();

        let d = date(2015, 9, 10);
        let map = day_rates(d, response).unwrap();

        let usd: RateTable = [(d, dec!(1.1234))].into_iter().collect();
        let gbp: RateTable = [(d, dec!(0.44444))].into_iter().collect();
        assert_eq!(map[&Currency::usd()], usd);
        assert_eq!(map[&Currency::gbp()], gbp);
    }

    #[test]
    fn test_series_response_transposed() {
        let body = r#"{
            "start_date": "2015-09-10",
            "end_date": "2015-09-11",
            "base": "EUR",
            "rates": {
                "2015-09-10": {"USD": 1.1234, "GBP": 0.73},
                "2015-09-11": {"USD": 1.1300}
            }
        }"#;
        let response: TimeSeriesResponse = serde_json::from_str(body).unwrap();

        let map = transpose_series(response, date(2015, 9, 1), date(2015, 9, 30)).unwrap();

        let usd = &map[&Currency::usd()];
        assert_eq!(usd.get(&date(2015, 9, 10)), Some(&dec!(1.1234)));
        assert_eq!(usd.get(&date(2015, 9, 11)), Some(&dec!(1.1300)));
        assert_eq!(map[&Currency::gbp()].len(), 1);
    }

    #[test]
    fn test_rates_decode_without_float_round_trip() {
        let response: HistoricalResponse =
            serde_json::from_str(r#"{"rates":{"IDR":16243.881022}}"#).unwrap();
        let map = day_rates(date(2015, 9, 10), response).unwrap();

        assert_eq!(
            map[&Currency::new("IDR")][&date(2015, 9, 10)],
            dec!(16243.881022)
        );
    }

    #[test]
    fn test_mock_provider_counts_calls() {
        let provider = MockRateProvider::new();
        provider.set_rates(
            Currency::usd(),
            [(date(2015, 9, 10), dec!(1.1))].into_iter().collect(),
        );

        provider.fetch_rates(date(2015, 9, 10)).unwrap();
        provider.fetch_rates(date(2015, 9, 10)).unwrap();

        assert_eq!(provider.fetch_calls(), 2);
    }
}
