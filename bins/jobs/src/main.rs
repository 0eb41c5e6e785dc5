//! Scheduled jobs for Prestamos.
//!
//! Usage:
//!   prestamos-jobs send-alerts [--days N] [--dry-run]
//!   prestamos-jobs refresh-rate [--base USD] [--to PEN] [--date YYYY-MM-DD]
//!   prestamos-jobs backfill-schedules
//!
//! Meant to be run from cron. Configuration is read the same way as every
//! other binary: `config/*.toml` plus `PRESTAMOS__*` environment variables.

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use sea_orm::DatabaseConnection;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use prestamos_core::alerts::{AlertScheduler, RunOptions};
use prestamos_core::currency::{ExchangeRates, RateService};
use prestamos_core::loan::LifecycleService;
use prestamos_db::{AlertRepository, ExchangeRateRepository, LoanRepository, connect_with};
use prestamos_shared::{AppConfig, Currency, EmailService, HttpRateProvider, SmsService};

type Rates = RateService<ExchangeRateRepository, HttpRateProvider>;

#[derive(Debug, Parser)]
#[command(name = "prestamos-jobs", version, about = "Scheduled jobs for Prestamos")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Send reminders for upcoming and overdue installments.
    SendAlerts {
        /// Lead days for profiles without a preference.
        #[arg(long)]
        days: Option<u32>,
        /// Record alerts without sending anything.
        #[arg(long)]
        dry_run: bool,
        /// Run as if today were this date.
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Fetch and cache the exchange rate for a currency pair.
    RefreshRate {
        /// Base currency.
        #[arg(long, default_value = "USD")]
        base: Currency,
        /// Quote currency.
        #[arg(long = "to", default_value = "PEN")]
        quote: Currency,
        /// Rate date, defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Generate schedules for loans that have no installments.
    BackfillSchedules,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "prestamos=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load().context("failed to load configuration")?;

    let db = connect_with(&config.database)
        .await
        .context("failed to connect to database")?;
    info!("Connected to database");

    let today = local_today(&config.alerts.timezone)?;
    let rates = Arc::new(rate_service(&db, &config)?);

    match cli.command {
        Command::SendAlerts {
            days,
            dry_run,
            today: as_of,
        } => send_alerts(db, &config, rates, days, dry_run, as_of.unwrap_or(today)).await,
        Command::RefreshRate { base, quote, date } => {
            refresh_rate(&rates, base, quote, date.unwrap_or(today)).await
        }
        Command::BackfillSchedules => backfill_schedules(db, rates).await,
    }
}

/// Today's date in the configured timezone.
fn local_today(timezone: &str) -> Result<NaiveDate> {
    let tz: Tz = timezone
        .parse()
        .map_err(|e| anyhow!("invalid timezone '{timezone}': {e}"))?;
    Ok(Utc::now().with_timezone(&tz).date_naive())
}

fn rate_service(db: &DatabaseConnection, config: &AppConfig) -> Result<Rates> {
    let providers =
        HttpRateProvider::from_config(&config.rates).context("failed to build rate providers")?;
    Ok(RateService::new(
        Arc::new(ExchangeRateRepository::new(db.clone())),
        providers,
    ))
}

async fn send_alerts(
    db: DatabaseConnection,
    config: &AppConfig,
    rates: Arc<Rates>,
    days: Option<u32>,
    dry_run: bool,
    today: NaiveDate,
) -> Result<()> {
    let mailer = Arc::new(EmailService::new(config.email.clone()));
    let sms = Arc::new(SmsService::new(config.sms.clone()).context("failed to build SMS client")?);
    let scheduler = AlertScheduler::new(Arc::new(AlertRepository::new(db)), rates, mailer, sms)
        .with_default_currency(config.alerts.default_currency);

    let summary = scheduler
        .run(RunOptions {
            today,
            default_lead_days: days.unwrap_or(config.alerts.default_lead_days),
            dry_run,
        })
        .await?;

    println!(
        "Alerts: created={} sent={} overdue={}",
        summary.created, summary.sent, summary.overdue
    );
    if summary.failed_profiles > 0 {
        println!("Profiles skipped after errors: {}", summary.failed_profiles);
    }
    Ok(())
}

async fn refresh_rate(rates: &Rates, base: Currency, quote: Currency, date: NaiveDate) -> Result<()> {
    let rate = rates.get_rate(base, quote, date).await?;
    println!("{date} 1 {base} = {rate} {quote}");
    Ok(())
}

async fn backfill_schedules(db: DatabaseConnection, rates: Arc<Rates>) -> Result<()> {
    let service = LifecycleService::new(Arc::new(LoanRepository::new(db)), rates);
    let created = service.backfill_schedules().await?;
    println!("Installments created: {created}");
    Ok(())
}
