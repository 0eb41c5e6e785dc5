//! In-memory fakes shared by the service tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::NaiveDate;
use prestamos_shared::{
    AlertId, CreditorId, Currency, InstallmentId, LoanId, PersonaId, SmsOutcome,
};
use rust_decimal::Decimal;

use crate::alerts::{
    Alert, AlertRepository, AlertStatus, DueInstallment, Mailer, NewAlert, NotifyError, SmsSender,
};
use crate::currency::{ExchangeRates, RateError};
use crate::loan::{
    Creditor, CreditorKind, Installment, InstallmentStatus, Loan, LoanError, LoanRepository,
    NewHistoryEntry, NewInstallment, PaymentSnapshot, Profile,
};

#[derive(Default)]
struct State {
    profiles: Vec<Profile>,
    creditors: HashMap<CreditorId, Creditor>,
    loans: HashMap<LoanId, Loan>,
    installments: HashMap<InstallmentId, Installment>,
    alerts: Vec<Alert>,
    history: Vec<NewHistoryEntry>,
    broken_profiles: HashSet<PersonaId>,
    history_down: bool,
}

/// Loan and alert store backed by hash maps.
#[derive(Default)]
pub(crate) struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub(crate) fn add_profile(&self, profile: Profile) {
        self.state.lock().unwrap().profiles.push(profile);
    }

    pub(crate) fn add_creditor(&self, owner_id: PersonaId, name: &str) -> CreditorId {
        let creditor = Creditor {
            id: CreditorId::new(),
            owner_id,
            name: name.to_string(),
            kind: CreditorKind::Business,
            identification: None,
            bank_name: None,
            account_number: None,
        };
        let id = creditor.id;
        self.state.lock().unwrap().creditors.insert(id, creditor);
        id
    }

    /// Makes every alert query for this profile fail.
    pub(crate) fn break_profile(&self, persona_id: PersonaId) {
        self.state.lock().unwrap().broken_profiles.insert(persona_id);
    }

    /// Makes every history append fail.
    pub(crate) fn break_history(&self) {
        self.state.lock().unwrap().history_down = true;
    }

    pub(crate) fn insert_raw_loan(&self, loan: Loan) {
        self.state.lock().unwrap().loans.insert(loan.id, loan);
    }

    pub(crate) fn installments_of(&self, loan_id: LoanId) -> Vec<Installment> {
        let mut rows: Vec<Installment> = self
            .state
            .lock()
            .unwrap()
            .installments
            .values()
            .filter(|i| i.loan_id == loan_id)
            .cloned()
            .collect();
        rows.sort_by_key(|i| i.sequence_no);
        rows
    }

    pub(crate) fn history(&self) -> Vec<NewHistoryEntry> {
        self.state.lock().unwrap().history.clone()
    }

    pub(crate) fn alerts(&self) -> Vec<Alert> {
        self.state.lock().unwrap().alerts.clone()
    }

    fn due_rows(
        &self,
        owner_id: PersonaId,
        keep: impl Fn(&Installment) -> bool,
    ) -> Result<Vec<DueInstallment>, NotifyError> {
        let state = self.state.lock().unwrap();
        if state.broken_profiles.contains(&owner_id) {
            return Err(NotifyError::repository("connection reset"));
        }

        let mut rows: Vec<DueInstallment> = state
            .installments
            .values()
            .filter(|i| i.status == InstallmentStatus::Pending && keep(i))
            .filter_map(|i| {
                let loan = state.loans.get(&i.loan_id)?;
                (loan.owner_id == owner_id).then(|| DueInstallment {
                    installment: i.clone(),
                    loan: loan.clone(),
                    creditor_name: loan
                        .creditor_id
                        .and_then(|c| state.creditors.get(&c))
                        .map(|c| c.name.clone()),
                })
            })
            .collect();
        rows.sort_by_key(|r| (r.installment.due_date, r.installment.sequence_no));
        Ok(rows)
    }
}

impl LoanRepository for InMemoryStore {
    async fn find_loan(&self, owner_id: PersonaId, loan_id: LoanId) -> Result<Option<Loan>, LoanError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .loans
            .get(&loan_id)
            .filter(|l| l.owner_id == owner_id)
            .cloned())
    }

    async fn insert_loan(&self, loan: &Loan) -> Result<(), LoanError> {
        self.state.lock().unwrap().loans.insert(loan.id, loan.clone());
        Ok(())
    }

    async fn update_loan(&self, loan: &Loan) -> Result<(), LoanError> {
        self.state.lock().unwrap().loans.insert(loan.id, loan.clone());
        Ok(())
    }

    async fn delete_loan(&self, owner_id: PersonaId, loan_id: LoanId) -> Result<bool, LoanError> {
        let mut state = self.state.lock().unwrap();
        if state.loans.get(&loan_id).is_none_or(|l| l.owner_id != owner_id) {
            return Ok(false);
        }
        state.loans.remove(&loan_id);
        state.installments.retain(|_, i| i.loan_id != loan_id);
        Ok(true)
    }

    async fn list_loans_without_installments(&self) -> Result<Vec<Loan>, LoanError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .loans
            .values()
            .filter(|l| !state.installments.values().any(|i| i.loan_id == l.id))
            .cloned()
            .collect())
    }

    async fn list_installments(&self, loan_id: LoanId) -> Result<Vec<Installment>, LoanError> {
        Ok(self.installments_of(loan_id))
    }

    async fn count_installments(&self, loan_id: LoanId) -> Result<u64, LoanError> {
        Ok(self.installments_of(loan_id).len() as u64)
    }

    async fn count_paid_installments(&self, loan_id: LoanId) -> Result<u64, LoanError> {
        Ok(self
            .installments_of(loan_id)
            .iter()
            .filter(|i| i.is_paid())
            .count() as u64)
    }

    async fn insert_installments(
        &self,
        installments: Vec<NewInstallment>,
    ) -> Result<Vec<Installment>, LoanError> {
        let mut state = self.state.lock().unwrap();
        let mut created = Vec::with_capacity(installments.len());
        for row in installments {
            let duplicate = state
                .installments
                .values()
                .any(|i| i.loan_id == row.loan_id && i.sequence_no == row.sequence_no);
            if duplicate {
                return Err(LoanError::repository("duplicate (loan_id, sequence_no)"));
            }
            let installment = Installment {
                id: InstallmentId::new(),
                loan_id: row.loan_id,
                sequence_no: row.sequence_no,
                amount: row.amount,
                due_date: row.due_date,
                status: InstallmentStatus::Pending,
                paid_date: None,
                snapshot: None,
            };
            state.installments.insert(installment.id, installment.clone());
            created.push(installment);
        }
        Ok(created)
    }

    async fn delete_installments(&self, loan_id: LoanId) -> Result<u64, LoanError> {
        let mut state = self.state.lock().unwrap();
        let before = state.installments.len();
        state.installments.retain(|_, i| i.loan_id != loan_id);
        Ok((before - state.installments.len()) as u64)
    }

    async fn find_installment(
        &self,
        owner_id: PersonaId,
        installment_id: InstallmentId,
    ) -> Result<Option<(Installment, Loan)>, LoanError> {
        let state = self.state.lock().unwrap();
        Ok(state.installments.get(&installment_id).and_then(|i| {
            state
                .loans
                .get(&i.loan_id)
                .filter(|l| l.owner_id == owner_id)
                .map(|l| (i.clone(), l.clone()))
        }))
    }

    async fn record_payment(
        &self,
        installment_id: InstallmentId,
        paid_date: NaiveDate,
        snapshot: Option<PaymentSnapshot>,
    ) -> Result<bool, LoanError> {
        let mut state = self.state.lock().unwrap();
        match state.installments.get_mut(&installment_id) {
            Some(i) if i.status == InstallmentStatus::Pending => {
                i.status = InstallmentStatus::Paid;
                i.paid_date = Some(paid_date);
                i.snapshot = snapshot;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_creditor(
        &self,
        owner_id: PersonaId,
        creditor_id: CreditorId,
    ) -> Result<Option<Creditor>, LoanError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .creditors
            .get(&creditor_id)
            .filter(|c| c.owner_id == owner_id)
            .cloned())
    }

    async fn count_loans_for_creditor(&self, creditor_id: CreditorId) -> Result<u64, LoanError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .loans
            .values()
            .filter(|l| l.creditor_id == Some(creditor_id))
            .count() as u64)
    }

    async fn delete_creditor(
        &self,
        owner_id: PersonaId,
        creditor_id: CreditorId,
    ) -> Result<bool, LoanError> {
        let mut state = self.state.lock().unwrap();
        if state
            .creditors
            .get(&creditor_id)
            .is_none_or(|c| c.owner_id != owner_id)
        {
            return Ok(false);
        }
        state.creditors.remove(&creditor_id);
        Ok(true)
    }

    async fn append_history(&self, entry: NewHistoryEntry) -> Result<(), LoanError> {
        let mut state = self.state.lock().unwrap();
        if state.history_down {
            return Err(LoanError::repository("history down"));
        }
        state.history.push(entry);
        Ok(())
    }
}

impl AlertRepository for InMemoryStore {
    async fn list_profiles(&self) -> Result<Vec<Profile>, NotifyError> {
        Ok(self.state.lock().unwrap().profiles.clone())
    }

    async fn find_profile(&self, persona_id: PersonaId) -> Result<Option<Profile>, NotifyError> {
        let state = self.state.lock().unwrap();
        if state.broken_profiles.contains(&persona_id) {
            return Err(NotifyError::repository("connection reset"));
        }
        Ok(state.profiles.iter().find(|p| p.id == persona_id).cloned())
    }

    async fn pending_due_on(
        &self,
        owner_id: PersonaId,
        dates: &[NaiveDate],
    ) -> Result<Vec<DueInstallment>, NotifyError> {
        self.due_rows(owner_id, |i| dates.contains(&i.due_date))
    }

    async fn pending_overdue(
        &self,
        owner_id: PersonaId,
        today: NaiveDate,
    ) -> Result<Vec<DueInstallment>, NotifyError> {
        self.due_rows(owner_id, |i| i.due_date < today)
    }

    async fn record_alert(&self, alert: NewAlert) -> Result<Alert, NotifyError> {
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state
            .alerts
            .iter()
            .find(|a| a.installment_id == alert.installment_id && a.alert_date == alert.alert_date)
        {
            return Ok(existing.clone());
        }
        let stored = Alert {
            id: AlertId::new(),
            installment_id: alert.installment_id,
            alert_date: alert.alert_date,
            message: alert.message,
            status: AlertStatus::Pending,
        };
        state.alerts.push(stored.clone());
        Ok(stored)
    }

    async fn set_alert_status(&self, alert_id: AlertId, status: AlertStatus) -> Result<(), NotifyError> {
        let mut state = self.state.lock().unwrap();
        if let Some(alert) = state.alerts.iter_mut().find(|a| a.id == alert_id) {
            alert.status = status;
        }
        Ok(())
    }
}

/// Rates from a fixed table; anything else fails.
#[derive(Default)]
pub(crate) struct FixedRates {
    rates: HashMap<(Currency, Currency), Decimal>,
    lookups: AtomicUsize,
}

impl FixedRates {
    pub(crate) fn with(mut self, base: Currency, quote: Currency, rate: Decimal) -> Self {
        self.rates.insert((base, quote), rate);
        self
    }

    pub(crate) fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl ExchangeRates for FixedRates {
    async fn get_rate(
        &self,
        base: Currency,
        quote: Currency,
        date: NaiveDate,
    ) -> Result<Decimal, RateError> {
        if base == quote {
            return Ok(Decimal::ONE);
        }
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.rates
            .get(&(base, quote))
            .copied()
            .ok_or(RateError::NoRateAvailable { base, quote, date })
    }
}

/// Mailer that records what it was asked to send.
#[derive(Default)]
pub(crate) struct RecordingMailer {
    pub(crate) sent: Mutex<Vec<(String, String, String)>>,
    pub(crate) fail: bool,
}

impl Mailer for RecordingMailer {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError::Mail("connection refused".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), body.to_string()));
        Ok(())
    }
}

/// SMS sender that records messages and answers with a fixed outcome.
#[derive(Default)]
pub(crate) struct RecordingSms {
    pub(crate) sent: Mutex<Vec<(String, String)>>,
    pub(crate) reject: bool,
}

impl SmsSender for RecordingSms {
    async fn send_sms(&self, to: &str, body: &str) -> SmsOutcome {
        if self.reject {
            return SmsOutcome {
                ok: false,
                detail: "Invalid destination".to_string(),
            };
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), body.to_string()));
        SmsOutcome {
            ok: true,
            detail: "SMS sent".to_string(),
        }
    }
}

pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub(crate) fn profile(first_name: &str) -> Profile {
    Profile {
        id: PersonaId::new(),
        first_name: first_name.to_string(),
        last_name: "Quispe".to_string(),
        email: Some(format!("{}@example.com", first_name.to_lowercase())),
        phone: Some("904929929".to_string()),
        notify_email: true,
        notify_sms: false,
        lead_days: None,
        preferred_currency: None,
    }
}
