//! RateBank configuration.

use std::time::Duration;

use ratebank_common::Currency;

use crate::provider::AccountTier;

/// Shared key-value store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Redis connection URL.
    pub url: String,
    /// Key namespace prefix; all rate keys are `{namespace}:{base}:{quote}`.
    pub namespace: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1/".to_string(),
            namespace: "currency".to_string(),
        }
    }
}

/// External rate provider configuration.
///
/// The app credential is required, so there is no `Default`; construct with
/// [`ProviderConfig::new`] and adjust fields as needed.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Provider app credential.
    pub app_id: String,
    /// Provider API root.
    pub api_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Account tier; selects single-day or month-range fetches.
    pub tier: AccountTier,
}

impl ProviderConfig {
    /// Create a provider configuration with the given credential and
    /// default endpoint, timeout, and tier.
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            api_url: "https://openexchangerates.org/api".to_string(),
            timeout: Duration::from_secs(15),
            tier: AccountTier::default(),
        }
    }
}

/// Top-level configuration for a resolver and its tiers.
#[derive(Debug, Clone)]
pub struct RateBankConfig {
    /// The single currency all stored rates are expressed against.
    ///
    /// Changing this requires pointing at a fresh store namespace; data
    /// written under another base is never reinterpreted.
    pub base_currency: Currency,
    /// Store tier configuration.
    pub store: StoreConfig,
    /// Provider tier configuration.
    pub provider: ProviderConfig,
}

impl RateBankConfig {
    /// Create a configuration with the given provider credential and
    /// defaults everywhere else (EUR base, local Redis, enterprise tier).
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            base_currency: Currency::eur(),
            store: StoreConfig::default(),
            provider: ProviderConfig::new(app_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RateBankConfig::new("test-app-id");

        assert_eq!(config.base_currency, Currency::eur());
        assert_eq!(config.store.namespace, "currency");
        assert_eq!(config.provider.timeout, Duration::from_secs(15));
        assert_eq!(config.provider.tier, AccountTier::Enterprise);
        assert_eq!(config.provider.app_id, "test-app-id");
    }
}
