//! Boundary validation for loan input.

use chrono::NaiveDate;
use prestamos_shared::{CreditorId, Currency};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::LoanTerms;

/// Largest principal accepted.
pub const MAX_PRINCIPAL: Decimal = dec!(400000);
/// Largest annual rate accepted, percent.
pub const MAX_ANNUAL_RATE: Decimal = dec!(116);
/// Largest installment count accepted.
pub const MAX_INSTALLMENTS: i64 = 36;
/// Longest label accepted, in characters.
pub const MAX_LABEL_CHARS: usize = 100;

/// Validation errors for loan input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoanValidationError {
    /// Principal outside (0, 400 000].
    #[error("principal must be greater than 0 and at most 400000, got {0}")]
    PrincipalOutOfRange(Decimal),

    /// Principal with more than two decimals.
    #[error("principal must have at most 2 decimals, got {0}")]
    PrincipalPrecision(Decimal),

    /// Rate outside [0, 116].
    #[error("annual rate must be between 0 and 116, got {0}")]
    RateOutOfRange(Decimal),

    /// Rate with more than two decimals.
    #[error("annual rate must have at most 2 decimals, got {0}")]
    RatePrecision(Decimal),

    /// Count outside [1, 36].
    #[error("installment count must be between 1 and 36, got {0}")]
    CountOutOfRange(i64),

    /// Empty label.
    #[error("label is required")]
    EmptyLabel,

    /// Label too long.
    #[error("label must be at most 100 characters")]
    LabelTooLong,
}

/// Loan fields as submitted by the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanInput {
    /// Optional creditor.
    pub creditor_id: Option<CreditorId>,
    /// Short label.
    pub label: String,
    /// Optional description.
    pub description: Option<String>,
    /// Principal.
    pub principal: Decimal,
    /// Annual nominal rate, percent.
    pub annual_rate: Decimal,
    /// Number of monthly installments.
    pub installment_count: i64,
    /// Start date.
    pub start_date: NaiveDate,
    /// Loan currency.
    #[serde(default)]
    pub currency: Currency,
    /// Display currency.
    #[serde(default)]
    pub display_currency: Currency,
}

/// Fields editable even after payments exist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanDescriptiveEdit {
    /// Optional creditor.
    pub creditor_id: Option<CreditorId>,
    /// Short label.
    pub label: String,
    /// Optional description.
    pub description: Option<String>,
    /// New display currency, if it changes.
    #[serde(default)]
    pub display_currency: Option<Currency>,
}

/// Trims and checks a label.
///
/// # Errors
///
/// Returns an error for empty or overlong labels.
pub fn validate_label(label: &str) -> Result<String, LoanValidationError> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        return Err(LoanValidationError::EmptyLabel);
    }
    if trimmed.chars().count() > MAX_LABEL_CHARS {
        return Err(LoanValidationError::LabelTooLong);
    }
    Ok(trimmed.to_string())
}

impl LoanInput {
    /// Checks every bound and returns the structural terms.
    ///
    /// # Errors
    ///
    /// Returns the first violated bound.
    pub fn validate(&self) -> Result<LoanTerms, LoanValidationError> {
        validate_label(&self.label)?;

        if self.principal <= Decimal::ZERO || self.principal > MAX_PRINCIPAL {
            return Err(LoanValidationError::PrincipalOutOfRange(self.principal));
        }
        if self.principal.normalize().scale() > 2 {
            return Err(LoanValidationError::PrincipalPrecision(self.principal));
        }
        if self.annual_rate < Decimal::ZERO || self.annual_rate > MAX_ANNUAL_RATE {
            return Err(LoanValidationError::RateOutOfRange(self.annual_rate));
        }
        if self.annual_rate.normalize().scale() > 2 {
            return Err(LoanValidationError::RatePrecision(self.annual_rate));
        }

        let installment_count = u32::try_from(self.installment_count)
            .ok()
            .filter(|n| (1..=MAX_INSTALLMENTS).contains(&i64::from(*n)))
            .ok_or(LoanValidationError::CountOutOfRange(self.installment_count))?;

        Ok(LoanTerms {
            principal: self.principal,
            annual_rate: self.annual_rate,
            installment_count,
            start_date: self.start_date,
            currency: self.currency,
        })
    }

    /// The descriptive part of the input.
    #[must_use]
    pub fn descriptive(&self) -> LoanDescriptiveEdit {
        LoanDescriptiveEdit {
            creditor_id: self.creditor_id,
            label: self.label.clone(),
            description: self.description.clone(),
            display_currency: Some(self.display_currency),
        }
    }
}
