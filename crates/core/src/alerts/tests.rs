use std::sync::Arc;

use chrono::NaiveDate;
use prestamos_shared::{CreditorId, Currency, PersonaId};
use rust_decimal_macros::dec;

use super::*;
use crate::loan::{LifecycleService, LoanInput, LoanWithSchedule, Profile};
use crate::testing::{FixedRates, InMemoryStore, RecordingMailer, RecordingSms, date, profile};

type Scheduler = AlertScheduler<InMemoryStore, FixedRates, RecordingMailer, RecordingSms>;

struct Fixture {
    store: Arc<InMemoryStore>,
    mailer: Arc<RecordingMailer>,
    sms: Arc<RecordingSms>,
    scheduler: Scheduler,
    lifecycle: LifecycleService<InMemoryStore, FixedRates>,
}

fn fixture_with(mailer: RecordingMailer, sms: RecordingSms) -> Fixture {
    let store = Arc::new(InMemoryStore::default());
    let rates = Arc::new(FixedRates::default().with(Currency::Pen, Currency::Usd, dec!(0.27)));
    let mailer = Arc::new(mailer);
    let sms = Arc::new(sms);
    let scheduler = AlertScheduler::new(store.clone(), rates.clone(), mailer.clone(), sms.clone());
    let lifecycle = LifecycleService::new(store.clone(), rates);
    Fixture {
        store,
        mailer,
        sms,
        scheduler,
        lifecycle,
    }
}

fn fixture() -> Fixture {
    fixture_with(RecordingMailer::default(), RecordingSms::default())
}

fn opts(today: NaiveDate) -> RunOptions {
    RunOptions {
        today,
        default_lead_days: 3,
        dry_run: false,
    }
}

/// 1000 PEN at 12% over 12 months from 2025-01-15: 88.56 due on the 15th.
async fn loan_for(f: &Fixture, owner: PersonaId, creditor_id: Option<CreditorId>) -> LoanWithSchedule {
    f.lifecycle
        .create_loan(
            owner,
            LoanInput {
                creditor_id,
                label: "Car loan".to_string(),
                description: None,
                principal: dec!(1000),
                annual_rate: dec!(12),
                installment_count: 12,
                start_date: date(2025, 1, 15),
                currency: Currency::Pen,
                display_currency: Currency::Pen,
            },
        )
        .await
        .unwrap()
}

async fn borrower(f: &Fixture, profile: Profile) -> (PersonaId, LoanWithSchedule) {
    let owner = profile.id;
    f.store.add_profile(profile);
    let creditor = f.store.add_creditor(owner, "BCP");
    let loan = loan_for(f, owner, Some(creditor)).await;
    (owner, loan)
}

fn subjects(mailer: &RecordingMailer) -> Vec<String> {
    mailer
        .sent
        .lock()
        .unwrap()
        .iter()
        .map(|(_, subject, _)| subject.clone())
        .collect()
}

#[tokio::test]
async fn test_run_sends_upcoming_and_overdue() {
    let f = fixture();
    borrower(&f, profile("Ana")).await;

    let summary = f.scheduler.run(opts(date(2025, 4, 12))).await.unwrap();

    assert_eq!(
        summary,
        AlertSummary {
            created: 3,
            sent: 3,
            overdue: 2,
            failed_profiles: 0,
        }
    );
    assert_eq!(
        subjects(&f.mailer),
        vec![
            "[Reminder] Installment 3",
            "[Overdue] Installment 1",
            "[Overdue] Installment 2",
        ]
    );
    let alerts = f.store.alerts();
    assert_eq!(alerts.len(), 3);
    assert!(alerts.iter().all(|a| a.status == AlertStatus::Sent));
    assert!(alerts.iter().all(|a| a.alert_date == date(2025, 4, 12)));
}

#[tokio::test]
async fn test_rerun_same_day_keeps_one_alert_per_installment() {
    let f = fixture();
    borrower(&f, profile("Ana")).await;

    f.scheduler.run(opts(date(2025, 4, 12))).await.unwrap();
    let second = f.scheduler.run(opts(date(2025, 4, 12))).await.unwrap();

    assert_eq!(second.created, 3);
    assert_eq!(f.store.alerts().len(), 3);

    f.scheduler.run(opts(date(2025, 4, 13))).await.unwrap();
    // Only the two overdue installments are picked up on the 13th.
    assert_eq!(f.store.alerts().len(), 5);
}

#[tokio::test]
async fn test_dry_run_records_without_sending() {
    let f = fixture();
    borrower(&f, profile("Ana")).await;

    let summary = f
        .scheduler
        .run(RunOptions {
            dry_run: true,
            ..opts(date(2025, 4, 12))
        })
        .await
        .unwrap();

    assert_eq!(summary.created, 3);
    assert_eq!(summary.sent, 0);
    assert!(f.mailer.sent.lock().unwrap().is_empty());
    let alerts = f.store.alerts();
    assert_eq!(alerts.len(), 3);
    assert!(alerts.iter().all(|a| a.status == AlertStatus::Pending));
}

#[tokio::test]
async fn test_due_today_is_not_overdue() {
    let f = fixture();
    borrower(
        &f,
        Profile {
            lead_days: Some("0".to_string()),
            ..profile("Ana")
        },
    )
    .await;

    let summary = f.scheduler.run(opts(date(2025, 3, 15))).await.unwrap();

    assert_eq!(summary.created, 2);
    assert_eq!(summary.overdue, 1);
    assert_eq!(
        subjects(&f.mailer),
        vec!["[Reminder] Installment 2", "[Overdue] Installment 1"]
    );
}

#[tokio::test]
async fn test_profile_lead_days_override_default() {
    let f = fixture();
    borrower(
        &f,
        Profile {
            lead_days: Some("7,1".to_string()),
            ..profile("Ana")
        },
    )
    .await;

    // Due 2025-02-15 is seven days out; nothing is overdue yet.
    let summary = f.scheduler.run(opts(date(2025, 2, 8))).await.unwrap();
    assert_eq!(summary.created, 1);
    assert_eq!(summary.overdue, 0);

    // The default of three days no longer applies.
    let summary = f.scheduler.run(opts(date(2025, 2, 12))).await.unwrap();
    assert_eq!(summary.created, 0);
}

#[tokio::test]
async fn test_paid_installments_are_skipped() {
    let f = fixture();
    let (owner, loan) = borrower(&f, profile("Ana")).await;
    for installment in &loan.installments[..2] {
        f.lifecycle
            .mark_paid(owner, installment.id, date(2025, 4, 1), None)
            .await
            .unwrap();
    }

    let summary = f.scheduler.run(opts(date(2025, 4, 12))).await.unwrap();

    assert_eq!(summary.created, 1);
    assert_eq!(summary.overdue, 0);
}

#[tokio::test]
async fn test_amount_converted_to_preferred_currency() {
    let f = fixture();
    borrower(
        &f,
        Profile {
            preferred_currency: Some(Currency::Usd),
            ..profile("Ana")
        },
    )
    .await;

    f.scheduler.run(opts(date(2025, 4, 12))).await.unwrap();

    let sent = f.mailer.sent.lock().unwrap();
    assert!(sent[0].2.contains("Amount due (in USD): 23.91."));
    assert!(f.store.alerts()[0].message.contains("USD"));
}

#[tokio::test]
async fn test_amount_unconverted_when_rate_missing() {
    let f = fixture();
    borrower(
        &f,
        Profile {
            preferred_currency: Some(Currency::Eur),
            ..profile("Ana")
        },
    )
    .await;

    let summary = f.scheduler.run(opts(date(2025, 4, 12))).await.unwrap();

    assert_eq!(summary.sent, 3);
    let sent = f.mailer.sent.lock().unwrap();
    assert!(sent[0].2.contains("Amount due (in PEN): 88.56."));
}

#[tokio::test]
async fn test_scheduler_default_currency() {
    let store = Arc::new(InMemoryStore::default());
    let rates = Arc::new(FixedRates::default().with(Currency::Pen, Currency::Usd, dec!(0.27)));
    let mailer = Arc::new(RecordingMailer::default());
    let scheduler = AlertScheduler::new(
        store.clone(),
        rates.clone(),
        mailer.clone(),
        Arc::new(RecordingSms::default()),
    )
    .with_default_currency(Currency::Usd);
    let lifecycle = LifecycleService::new(store.clone(), rates);

    let ana = profile("Ana");
    let owner = ana.id;
    store.add_profile(ana);
    lifecycle
        .create_loan(
            owner,
            LoanInput {
                creditor_id: None,
                label: "Car loan".to_string(),
                description: None,
                principal: dec!(1000),
                annual_rate: dec!(12),
                installment_count: 12,
                start_date: date(2025, 1, 15),
                currency: Currency::Pen,
                display_currency: Currency::Pen,
            },
        )
        .await
        .unwrap();

    scheduler.run(opts(date(2025, 2, 12))).await.unwrap();

    let sent = mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].2.contains("your loan with Car loan."));
    assert!(sent[0].2.contains("(in USD): 23.91."));
}

#[tokio::test]
async fn test_sms_channel() {
    let f = fixture();
    borrower(
        &f,
        Profile {
            notify_email: false,
            notify_sms: true,
            ..profile("Ana")
        },
    )
    .await;

    let summary = f.scheduler.run(opts(date(2025, 4, 12))).await.unwrap();

    assert_eq!(summary.sent, 3);
    assert!(f.mailer.sent.lock().unwrap().is_empty());
    let texts = f.sms.sent.lock().unwrap();
    assert_eq!(texts[0].0, "904929929");
    assert_eq!(
        texts[0].1,
        "Installment 3 BCP due 2025-04-15. Amount: 88.56 PEN"
    );
    assert_eq!(
        texts[1].1,
        "[Overdue] Installment 1 BCP due 2025-02-15. Amount: 88.56 PEN"
    );
}

#[tokio::test]
async fn test_missing_contact_records_alert_only() {
    let f = fixture();
    borrower(
        &f,
        Profile {
            email: None,
            phone: Some("  ".to_string()),
            notify_sms: true,
            ..profile("Ana")
        },
    )
    .await;

    let summary = f.scheduler.run(opts(date(2025, 4, 12))).await.unwrap();

    assert_eq!(summary.created, 3);
    assert_eq!(summary.sent, 0);
    assert!(f.sms.sent.lock().unwrap().is_empty());
    assert!(f.store.alerts().iter().all(|a| a.status == AlertStatus::Pending));
}

#[tokio::test]
async fn test_mail_failure_does_not_abort_run() {
    let f = fixture_with(
        RecordingMailer {
            fail: true,
            ..RecordingMailer::default()
        },
        RecordingSms::default(),
    );
    borrower(
        &f,
        Profile {
            notify_sms: true,
            ..profile("Ana")
        },
    )
    .await;

    let summary = f.scheduler.run(opts(date(2025, 4, 12))).await.unwrap();

    assert_eq!(summary.created, 3);
    assert_eq!(summary.sent, 3);
    assert_eq!(f.sms.sent.lock().unwrap().len(), 3);
    assert!(f.store.alerts().iter().all(|a| a.status == AlertStatus::Sent));
}

#[tokio::test]
async fn test_rejected_sms_leaves_alert_pending() {
    let f = fixture_with(
        RecordingMailer::default(),
        RecordingSms {
            reject: true,
            ..RecordingSms::default()
        },
    );
    borrower(
        &f,
        Profile {
            notify_email: false,
            notify_sms: true,
            ..profile("Ana")
        },
    )
    .await;

    let summary = f.scheduler.run(opts(date(2025, 4, 12))).await.unwrap();

    assert_eq!(summary.sent, 0);
    assert!(f.store.alerts().iter().all(|a| a.status == AlertStatus::Pending));
}

#[tokio::test]
async fn test_failing_profile_does_not_stop_others() {
    let f = fixture();
    let (broken, _) = borrower(&f, profile("Ana")).await;
    borrower(&f, profile("Luis")).await;
    f.store.break_profile(broken);

    let summary = f.scheduler.run(opts(date(2025, 4, 12))).await.unwrap();

    assert_eq!(summary.failed_profiles, 1);
    assert_eq!(summary.created, 3);
    let recipients: Vec<String> = f
        .mailer
        .sent
        .lock()
        .unwrap()
        .iter()
        .map(|(to, _, _)| to.clone())
        .collect();
    assert!(recipients.iter().all(|to| to == "luis@example.com"));
}

#[tokio::test]
async fn test_notify_immediately_limits_to_due_installments() {
    let f = fixture();
    let ana = profile("Ana");
    let owner = ana.id;
    f.store.add_profile(ana.clone());
    let created = loan_for(&f, owner, None).await;

    let summary = f
        .scheduler
        .notify_immediately(
            &ana,
            &created.loan,
            &created.installments,
            Some("BCP"),
            date(2025, 3, 15),
        )
        .await
        .unwrap();

    assert_eq!(summary.created, 2);
    assert_eq!(summary.overdue, 1);
    assert_eq!(summary.sent, 2);
    assert_eq!(
        subjects(&f.mailer),
        vec!["[Overdue] Installment 1", "[Reminder] Installment 2"]
    );
    assert_eq!(f.store.alerts().len(), 2);
}

#[tokio::test]
async fn test_notify_immediately_future_schedule_sends_nothing() {
    let f = fixture();
    let ana = profile("Ana");
    let created = loan_for(&f, ana.id, None).await;

    let summary = f
        .scheduler
        .notify_immediately(&ana, &created.loan, &created.installments, None, date(2025, 1, 15))
        .await
        .unwrap();

    assert_eq!(summary, AlertSummary::default());
    assert!(f.store.alerts().is_empty());
}
