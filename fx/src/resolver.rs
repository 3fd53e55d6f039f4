//! The orchestrator: three-tier rate resolution and triangulation.

use std::sync::Arc;

use chrono::NaiveDate;
use ratebank_common::{yesterday_utc, Currency, CurrencyPair, RateDate};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::cache::HistoricalRateCache;
use crate::error::{FxError, FxResult};
use crate::provider::HistoricalRates;
use crate::store::RateStore;
use crate::{RateMap, RateTable};

/// Resolves historical exchange rates through memory, shared store, and
/// provider, in that order, back-filling faster tiers on every miss.
///
/// All rates are expressed relative to a single base currency; a cross rate
/// between two non-base currencies is triangulated through their base
/// rates. Safe to share across threads behind an `Arc`; the memory tier's
/// lock is never held across store or provider I/O, so two threads may
/// redundantly fetch the same data — both tiers overwrite idempotently, so
/// the race is wasteful but never incorrect.
pub struct RateResolver {
    base: Currency,
    cache: HistoricalRateCache,
    store: Arc<dyn RateStore>,
    provider: Arc<dyn HistoricalRates>,
}

impl RateResolver {
    /// Create a resolver over the given tiers.
    pub fn new(
        base: impl Into<Currency>,
        store: Arc<dyn RateStore>,
        provider: Arc<dyn HistoricalRates>,
    ) -> Self {
        Self {
            base: base.into(),
            cache: HistoricalRateCache::new(),
            store,
            provider,
        }
    }

    /// The currency all stored rates are expressed against.
    pub fn base_currency(&self) -> &Currency {
        &self.base
    }

    /// Resolve the rate converting 1 unit of `from` into `to` on `date`.
    pub fn get_rate(
        &self,
        from: impl Into<Currency>,
        to: impl Into<Currency>,
        date: impl Into<RateDate>,
    ) -> FxResult<Decimal> {
        let from = from.into();
        let to = to.into();
        let date = date.into().date();

        if from == to {
            return Ok(Decimal::ONE);
        }

        let to_rate = self.base_rate(&to, date)?;
        let from_rate = self.base_rate(&from, date)?;

        // Triangulation through the base currency.
        to_rate
            .checked_div(from_rate)
            .ok_or_else(|| FxError::UnknownRate {
                pair: CurrencyPair::new(from, to),
                date,
            })
    }

    /// Resolve the rate for the most recent fully-closed UTC day.
    pub fn latest_rate(
        &self,
        from: impl Into<Currency>,
        to: impl Into<Currency>,
    ) -> FxResult<Decimal> {
        self.get_rate(from, to, yesterday_utc())
    }

    /// Persist a quote currency → date → rate mapping to the shared store.
    ///
    /// The memory tier is deliberately untouched: it fills lazily on read,
    /// so rates that are never queried never occupy memory.
    pub fn add_rates(&self, rates: &RateMap) -> FxResult<()> {
        self.store.add_rates(rates)
    }

    /// Persist a single rate for a pair involving the base currency.
    ///
    /// Exactly one side must be the base. A `base -> quote` rate is stored
    /// as given; a `quote -> base` rate is inverted first, since stored
    /// rates are always base-relative.
    pub fn add_rate(
        &self,
        from: impl Into<Currency>,
        to: impl Into<Currency>,
        rate: Decimal,
        date: impl Into<RateDate>,
    ) -> FxResult<()> {
        let from = from.into();
        let to = to.into();
        let date = date.into().date();

        let (quote, stored) = if from == self.base && to != self.base {
            (to, rate)
        } else if to == self.base && from != self.base {
            let inverted =
                Decimal::ONE
                    .checked_div(rate)
                    .ok_or_else(|| FxError::NonInvertibleRate {
                        from: from.clone(),
                        to: to.clone(),
                        rate,
                    })?;
            (from, inverted)
        } else {
            return Err(FxError::BasePairRequired {
                from,
                to,
                base: self.base.clone(),
            });
        };

        let mut rates = RateMap::new();
        rates.insert(quote, [(date, stored)].into_iter().collect());
        self.add_rates(&rates)
    }

    /// [`RateResolver::add_rate`] for the most recent fully-closed UTC day.
    pub fn add_latest_rate(
        &self,
        from: impl Into<Currency>,
        to: impl Into<Currency>,
        rate: Decimal,
    ) -> FxResult<()> {
        self.add_rate(from, to, rate, yesterday_utc())
    }

    /// Value of 1 unit of the base currency in `currency` on `date`,
    /// resolved through the tiers in strict order.
    fn base_rate(&self, currency: &Currency, date: NaiveDate) -> FxResult<Decimal> {
        if currency == &self.base {
            return Ok(Decimal::ONE);
        }

        if let Some(rate) = self.cache.get(currency, date) {
            return Ok(rate);
        }

        // Store tier: merge the whole table, not just the requested date,
        // so one round trip amortizes across later lookups.
        let stored = self.store.get_rates(currency)?;
        if !stored.is_empty() {
            self.cache.merge(currency, &stored);
            if let Some(rate) = stored.get(&date) {
                debug!(currency = %currency, %date, "store tier hit");
                return Ok(*rate);
            }
        }

        let fetched = self.provider.fetch_rates(date)?;
        debug!(currency = %currency, %date, currencies = fetched.len(), "provider tier consulted");

        // Persist the whole batch before updating memory; a store failure
        // still surfaces after memory has absorbed what the provider did
        // supply, so the two tiers never disagree about fetched data.
        let persisted = self.store.add_rates(&fetched);
        if let Some(table) = fetched.get(currency) {
            self.cache.merge(currency, table);
        }
        if let Err(e) = persisted {
            warn!(currency = %currency, %date, error = %e, "store write for provider batch failed");
            return Err(e);
        }

        fetched
            .get(currency)
            .and_then(|table: &RateTable| table.get(&date))
            .copied()
            .ok_or_else(|| FxError::UnknownRate {
                pair: CurrencyPair::new(self.base.clone(), currency.clone()),
                date,
            })
    }
}
