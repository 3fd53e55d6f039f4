//! FX engine error types.
//!
//! Three categories matter to callers: validation errors (rejected before
//! any I/O), request failures (store or provider transport), and the
//! unknown-rate outcome after all tiers are exhausted. [`FxError::kind`]
//! exposes the category so callers can branch without matching variants.

use chrono::NaiveDate;
use ratebank_common::{Currency, CurrencyPair};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur in the FX engine.
#[derive(Debug, Error)]
pub enum FxError {
    /// The base currency's own rate must always be exactly 1.
    #[error("Refusing to store rate {rate} for base currency {base} on {date}; the base rate is always 1")]
    InvalidBaseRate {
        base: Currency,
        date: NaiveDate,
        rate: Decimal,
    },

    /// `add_rate` requires exactly one side of the pair to be the base currency.
    #[error("Exactly one of {from} and {to} must be the base currency {base}")]
    BasePairRequired {
        from: Currency,
        to: Currency,
        base: Currency,
    },

    /// A zero rate cannot be inverted for storage.
    #[error("Cannot invert rate {rate} for {from}->{to}")]
    NonInvertibleRate {
        from: Currency,
        to: Currency,
        rate: Decimal,
    },

    /// Requested date is outside the provider's supported range.
    #[error("Date {date} is outside the supported range {min} to {max}")]
    DateOutOfRange {
        date: NaiveDate,
        min: NaiveDate,
        max: NaiveDate,
    },

    /// A tier could not be constructed from its configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The key-value store rejected or failed a request.
    #[error("Store request failed ({operation}): {reason}")]
    StoreRequestFailed { operation: String, reason: String },

    /// The rate provider rejected or failed a request.
    #[error("Provider request failed for {start} to {end}: {reason}")]
    ProviderRequestFailed {
        start: NaiveDate,
        end: NaiveDate,
        reason: String,
    },

    /// All tiers exhausted with no rate for the pair on the date.
    #[error("No rate known for {pair} on {date}")]
    UnknownRate { pair: CurrencyPair, date: NaiveDate },
}

/// Coarse error category for branching callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Argument rejected before any I/O was attempted.
    Validation,
    /// Store or provider transport failure.
    RequestFailed,
    /// All tiers exhausted with no data.
    UnknownRate,
}

impl FxError {
    /// Get the error's category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FxError::InvalidBaseRate { .. }
            | FxError::BasePairRequired { .. }
            | FxError::NonInvertibleRate { .. }
            | FxError::DateOutOfRange { .. }
            | FxError::InvalidConfig(_) => ErrorKind::Validation,
            FxError::StoreRequestFailed { .. } | FxError::ProviderRequestFailed { .. } => {
                ErrorKind::RequestFailed
            }
            FxError::UnknownRate { .. } => ErrorKind::UnknownRate,
        }
    }
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_kinds() {
        let date = NaiveDate::from_ymd_opt(2015, 9, 10).unwrap();

        let validation = FxError::InvalidBaseRate {
            base: Currency::eur(),
            date,
            rate: dec!(0.5),
        };
        assert_eq!(validation.kind(), ErrorKind::Validation);

        let transport = FxError::StoreRequestFailed {
            operation: "HGETALL currency:EUR:USD".to_string(),
            reason: "connection refused".to_string(),
        };
        assert_eq!(transport.kind(), ErrorKind::RequestFailed);

        let unknown = FxError::UnknownRate {
            pair: CurrencyPair::new(Currency::usd(), Currency::gbp()),
            date,
        };
        assert_eq!(unknown.kind(), ErrorKind::UnknownRate);
    }

    #[test]
    fn test_messages_name_the_pair_and_date() {
        let date = NaiveDate::from_ymd_opt(2015, 9, 10).unwrap();
        let err = FxError::UnknownRate {
            pair: CurrencyPair::new(Currency::usd(), Currency::gbp()),
            date,
        };
        let msg = err.to_string();
        assert!(msg.contains("USD/GBP"));
        assert!(msg.contains("2015-09-10"));
    }
}
