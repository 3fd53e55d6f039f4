//! Process-wide default resolver registry.
//!
//! Applications own their resolver at the composition root and inject it
//! explicitly; this module is only the thin "configured default resolver"
//! convenience, with an explicit install/reset lifecycle and no implicit
//! initialization.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::resolver::RateResolver;

static DEFAULT_RESOLVER: RwLock<Option<Arc<RateResolver>>> = RwLock::new(None);

/// Install the process-wide default resolver, replacing any previous one.
pub fn install(resolver: Arc<RateResolver>) {
    *DEFAULT_RESOLVER.write() = Some(resolver);
}

/// Get the installed default resolver, if any.
pub fn current() -> Option<Arc<RateResolver>> {
    DEFAULT_RESOLVER.read().clone()
}

/// Remove the installed default resolver.
pub fn reset() {
    *DEFAULT_RESOLVER.write() = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ExplodingRates;
    use crate::store::ExplodingStore;
    use ratebank_common::Currency;

    #[test]
    fn test_install_current_reset() {
        // One test owns the whole lifecycle; the slot is process-global.
        assert!(current().is_none());

        let resolver = Arc::new(RateResolver::new(
            Currency::eur(),
            Arc::new(ExplodingStore),
            Arc::new(ExplodingRates),
        ));
        install(resolver.clone());

        let found = current().expect("resolver was installed");
        assert_eq!(found.base_currency(), &Currency::eur());

        reset();
        assert!(current().is_none());
    }
}
