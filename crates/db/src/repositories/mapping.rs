//! Conversions between database models and core domain types.

use chrono::Utc;
use prestamos_core::alerts::{Alert, AlertStatus};
use prestamos_core::currency::ExchangeRate;
use prestamos_core::loan::{
    Creditor, CreditorKind, HistoryAction, HistoryEntry, Installment, InstallmentStatus, Loan,
    LoanTerms, PaymentSnapshot, Profile,
};
use prestamos_shared::{
    AlertId, CreditorId, Currency, HistoryId, InstallmentId, LoanId, PersonaId,
};

use crate::entities::{
    alerts, creditors, exchange_rates, history, installments, loans, personas,
    sea_orm_active_enums::{
        AlertStatus as DbAlertStatus, CreditorKind as DbCreditorKind,
        InstallmentStatus as DbInstallmentStatus,
    },
};

/// A row that does not map onto a valid domain value.
pub(crate) type MappingResult<T> = Result<T, String>;

pub(crate) fn parse_currency(code: &str) -> MappingResult<Currency> {
    code.parse()
}

fn parse_optional_currency(code: Option<&str>) -> MappingResult<Option<Currency>> {
    code.map(parse_currency).transpose()
}

pub(crate) fn count_to_db(count: u32) -> MappingResult<i32> {
    i32::try_from(count).map_err(|_| format!("count {count} out of range"))
}

fn count_from_db(count: i32) -> MappingResult<u32> {
    u32::try_from(count).map_err(|_| format!("negative count {count} in database"))
}

pub(crate) fn to_db_creditor_kind(kind: CreditorKind) -> DbCreditorKind {
    match kind {
        CreditorKind::Individual => DbCreditorKind::Individual,
        CreditorKind::Business => DbCreditorKind::Business,
    }
}

pub(crate) fn to_db_alert_status(status: AlertStatus) -> DbAlertStatus {
    match status {
        AlertStatus::Pending => DbAlertStatus::Pending,
        AlertStatus::Sent => DbAlertStatus::Sent,
        AlertStatus::Cancelled => DbAlertStatus::Cancelled,
    }
}

pub(crate) fn profile_to_domain(model: personas::Model) -> MappingResult<Profile> {
    Ok(Profile {
        id: PersonaId::from_uuid(model.id),
        preferred_currency: parse_optional_currency(model.preferred_currency.as_deref())?,
        first_name: model.first_name,
        last_name: model.last_name,
        email: model.email,
        phone: model.phone,
        notify_email: model.notify_email,
        notify_sms: model.notify_sms,
        lead_days: model.lead_days,
    })
}

pub(crate) fn creditor_to_domain(model: creditors::Model) -> Creditor {
    Creditor {
        id: CreditorId::from_uuid(model.id),
        owner_id: PersonaId::from_uuid(model.persona_id),
        name: model.name,
        kind: match model.kind {
            DbCreditorKind::Individual => CreditorKind::Individual,
            DbCreditorKind::Business => CreditorKind::Business,
        },
        identification: model.identification,
        bank_name: model.bank_name,
        account_number: model.account_number,
    }
}

pub(crate) fn loan_to_domain(model: loans::Model) -> MappingResult<Loan> {
    Ok(Loan {
        id: LoanId::from_uuid(model.id),
        owner_id: PersonaId::from_uuid(model.persona_id),
        creditor_id: model.creditor_id.map(CreditorId::from_uuid),
        terms: LoanTerms {
            principal: model.principal,
            annual_rate: model.annual_rate,
            installment_count: count_from_db(model.installment_count)?,
            start_date: model.start_date,
            currency: parse_currency(&model.currency)?,
        },
        display_currency: parse_currency(&model.display_currency)?,
        label: model.label,
        description: model.description,
        created_at: model.created_at.with_timezone(&Utc),
    })
}

pub(crate) fn installment_to_domain(model: installments::Model) -> MappingResult<Installment> {
    let snapshot = match (
        model.origin_currency.as_deref(),
        model.destination_currency.as_deref(),
        model.exchange_rate,
        model.origin_amount,
        model.converted_amount,
    ) {
        (Some(origin), Some(destination), Some(rate), Some(origin_amount), Some(converted)) => {
            Some(PaymentSnapshot {
                origin_currency: parse_currency(origin)?,
                destination_currency: parse_currency(destination)?,
                rate,
                origin_amount,
                converted_amount: converted,
            })
        }
        _ => None,
    };

    Ok(Installment {
        id: InstallmentId::from_uuid(model.id),
        loan_id: LoanId::from_uuid(model.loan_id),
        sequence_no: count_from_db(model.sequence_no)?,
        amount: model.amount,
        due_date: model.due_date,
        status: match model.status {
            DbInstallmentStatus::Pending => InstallmentStatus::Pending,
            DbInstallmentStatus::Paid => InstallmentStatus::Paid,
        },
        paid_date: model.paid_date,
        snapshot,
    })
}

pub(crate) fn alert_to_domain(model: alerts::Model) -> Alert {
    Alert {
        id: AlertId::from_uuid(model.id),
        installment_id: InstallmentId::from_uuid(model.installment_id),
        alert_date: model.alert_date,
        message: model.message,
        status: match model.status {
            DbAlertStatus::Pending => AlertStatus::Pending,
            DbAlertStatus::Sent => AlertStatus::Sent,
            DbAlertStatus::Cancelled => AlertStatus::Cancelled,
        },
    }
}

pub(crate) fn rate_to_domain(model: exchange_rates::Model) -> MappingResult<ExchangeRate> {
    Ok(ExchangeRate {
        base: parse_currency(&model.base_currency)?,
        quote: parse_currency(&model.quote_currency)?,
        rate: model.rate,
        rate_date: model.rate_date,
        fetched_at: model.fetched_at.with_timezone(&Utc),
    })
}

pub(crate) fn history_to_domain(model: history::Model) -> MappingResult<HistoryEntry> {
    Ok(HistoryEntry {
        id: HistoryId::from_uuid(model.id),
        persona_id: PersonaId::from_uuid(model.persona_id),
        action: HistoryAction::from_code(&model.action)
            .ok_or_else(|| format!("unknown history action '{}'", model.action))?,
        detail: model.detail,
        created_at: model.created_at.with_timezone(&Utc),
    })
}
