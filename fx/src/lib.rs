//! RateBank FX Engine
//!
//! Historical currency-exchange-rate lookup with a two-tier cache (process
//! memory, then a shared Redis store) in front of a rate-limited external
//! HTTP data provider.
//!
//! Every stored rate is expressed relative to a single configured base
//! currency; cross rates between two non-base currencies are triangulated
//! through the base. Lookups fall through memory → store → provider, and
//! every fallback hit back-fills the faster tiers.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ratebank_common::{Currency, Money};
//! use ratebank_fx::{
//!     ExchangeEngine, OpenExchangeRatesClient, RateBankConfig, RateResolver, RedisRateStore,
//! };
//!
//! let config = RateBankConfig::new("my-app-id");
//! let store = RedisRateStore::new(&config.store, config.base_currency.clone())?;
//! let provider = OpenExchangeRatesClient::new(&config.provider, config.base_currency.clone())?;
//! let resolver = Arc::new(RateResolver::new(
//!     config.base_currency,
//!     Arc::new(store),
//!     Arc::new(provider),
//! ));
//!
//! let engine = ExchangeEngine::new(resolver);
//! let usd = Money::from_str("100.00", Currency::usd())?;
//! let gbp = engine.exchange_latest(&usd, "GBP")?;
//! ```

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod provider;
pub mod registry;
pub mod resolver;
pub mod store;

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use ratebank_common::Currency;
use rust_decimal::Decimal;

/// Date → rate entries for one quote currency, ordered by date.
pub type RateTable = BTreeMap<NaiveDate, Decimal>;

/// Quote currency → date → rate, all relative to the configured base.
pub type RateMap = HashMap<Currency, RateTable>;

pub use cache::HistoricalRateCache;
pub use config::{ProviderConfig, RateBankConfig, StoreConfig};
pub use engine::ExchangeEngine;
pub use error::{ErrorKind, FxError, FxResult};
pub use provider::{check_date_range, min_date, AccountTier, HistoricalRates, OpenExchangeRatesClient};
pub use resolver::RateResolver;
pub use store::{RateStore, RedisRateStore};
