//! Monetary conversion on top of resolved rates.

use std::sync::Arc;

use ratebank_common::{Currency, Money, RateDate};
use tracing::debug;

use crate::error::FxResult;
use crate::resolver::RateResolver;

/// Applies a resolved rate to convert a monetary amount between currencies.
///
/// Rate resolution (including the same-currency and base-currency
/// short-circuits) lives in the resolver; this type only multiplies and
/// rounds to the target currency's standard decimal places.
pub struct ExchangeEngine {
    resolver: Arc<RateResolver>,
}

impl ExchangeEngine {
    /// Create an engine over the given resolver.
    pub fn new(resolver: Arc<RateResolver>) -> Self {
        Self { resolver }
    }

    /// The resolver this engine converts through.
    pub fn resolver(&self) -> &Arc<RateResolver> {
        &self.resolver
    }

    /// Convert `amount` into `to` using the rate applicable on `date`.
    pub fn exchange(
        &self,
        amount: &Money,
        to: impl Into<Currency>,
        date: impl Into<RateDate>,
    ) -> FxResult<Money> {
        let to = to.into();
        let date = date.into();

        let rate = self
            .resolver
            .get_rate(amount.currency.clone(), to.clone(), date)?;
        let converted = Money::new(amount.value * rate, to).round();

        debug!(
            from = %amount,
            to = %converted,
            %rate,
            %date,
            "exchanged amount"
        );

        Ok(converted)
    }

    /// Convert at the rate of the most recent fully-closed UTC day.
    pub fn exchange_latest(&self, amount: &Money, to: impl Into<Currency>) -> FxResult<Money> {
        self.exchange(amount, to, ratebank_common::yesterday_utc())
    }
}
