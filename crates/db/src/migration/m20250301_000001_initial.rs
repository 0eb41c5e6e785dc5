//! Initial schema: profiles, creditors, loans, installments, rate cache,
//! alerts and activity history.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(INITIAL_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_SQL).await?;
        Ok(())
    }
}

const INITIAL_SQL: &str = r"
CREATE TYPE creditor_kind AS ENUM ('individual', 'business');
CREATE TYPE installment_status AS ENUM ('pending', 'paid');
CREATE TYPE alert_status AS ENUM ('pending', 'sent', 'cancelled');

CREATE TABLE personas (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    first_name VARCHAR(100) NOT NULL,
    last_name VARCHAR(100) NOT NULL DEFAULT '',
    email VARCHAR(254),
    phone VARCHAR(32),
    notify_email BOOLEAN NOT NULL DEFAULT TRUE,
    notify_sms BOOLEAN NOT NULL DEFAULT FALSE,
    lead_days VARCHAR(50),
    preferred_currency VARCHAR(3),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_personas_currency CHECK (preferred_currency IN ('PEN', 'USD', 'EUR'))
);

CREATE TABLE creditors (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    persona_id UUID NOT NULL REFERENCES personas(id) ON DELETE CASCADE,
    name VARCHAR(150) NOT NULL,
    kind creditor_kind NOT NULL DEFAULT 'business',
    identification VARCHAR(20),
    bank_name VARCHAR(100),
    account_number VARCHAR(50),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_creditors_persona ON creditors(persona_id);

CREATE TABLE loans (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    persona_id UUID NOT NULL REFERENCES personas(id) ON DELETE CASCADE,
    creditor_id UUID REFERENCES creditors(id) ON DELETE RESTRICT,
    label VARCHAR(100) NOT NULL,
    description TEXT,
    principal NUMERIC(12, 2) NOT NULL,
    annual_rate NUMERIC(6, 2) NOT NULL,
    installment_count INTEGER NOT NULL,
    start_date DATE NOT NULL,
    currency VARCHAR(3) NOT NULL DEFAULT 'PEN',
    display_currency VARCHAR(3) NOT NULL DEFAULT 'PEN',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_loans_principal CHECK (principal > 0 AND principal <= 400000),
    CONSTRAINT chk_loans_rate CHECK (annual_rate >= 0 AND annual_rate <= 116),
    CONSTRAINT chk_loans_count CHECK (installment_count BETWEEN 1 AND 36),
    CONSTRAINT chk_loans_label CHECK (length(trim(label)) > 0),
    CONSTRAINT chk_loans_currency CHECK (currency IN ('PEN', 'USD', 'EUR')),
    CONSTRAINT chk_loans_display_currency CHECK (display_currency IN ('PEN', 'USD', 'EUR'))
);

CREATE INDEX idx_loans_persona ON loans(persona_id, created_at DESC);
CREATE INDEX idx_loans_creditor ON loans(creditor_id) WHERE creditor_id IS NOT NULL;

CREATE TABLE installments (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    loan_id UUID NOT NULL REFERENCES loans(id) ON DELETE CASCADE,
    sequence_no INTEGER NOT NULL,
    amount NUMERIC(12, 2) NOT NULL,
    due_date DATE NOT NULL,
    status installment_status NOT NULL DEFAULT 'pending',
    paid_date DATE,
    origin_currency VARCHAR(3),
    destination_currency VARCHAR(3),
    exchange_rate NUMERIC(18, 8),
    origin_amount NUMERIC(12, 2),
    converted_amount NUMERIC(12, 2),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_installments_loan_sequence UNIQUE (loan_id, sequence_no),
    CONSTRAINT chk_installments_sequence CHECK (sequence_no >= 1),
    CONSTRAINT chk_installments_amount CHECK (amount >= 0),
    CONSTRAINT chk_installments_paid CHECK ((status = 'paid') = (paid_date IS NOT NULL))
);

-- Alert scans: pending installments by due date
CREATE INDEX idx_installments_pending_due ON installments(due_date) WHERE status = 'pending';

CREATE TABLE exchange_rates (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    rate_date DATE NOT NULL,
    base_currency VARCHAR(3) NOT NULL,
    quote_currency VARCHAR(3) NOT NULL,
    rate NUMERIC(18, 8) NOT NULL,
    fetched_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_exchange_rates_key UNIQUE (rate_date, base_currency, quote_currency),
    CONSTRAINT chk_exchange_rates_positive CHECK (rate > 0)
);

CREATE TABLE alerts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    installment_id UUID NOT NULL REFERENCES installments(id) ON DELETE CASCADE,
    alert_date DATE NOT NULL,
    message TEXT NOT NULL,
    status alert_status NOT NULL DEFAULT 'pending',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_alerts_installment_date UNIQUE (installment_id, alert_date)
);

CREATE TABLE history (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    persona_id UUID NOT NULL REFERENCES personas(id) ON DELETE CASCADE,
    action VARCHAR(32) NOT NULL,
    detail TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_history_persona ON history(persona_id, created_at DESC);
";

const DROP_SQL: &str = r"
DROP TABLE IF EXISTS history CASCADE;
DROP TABLE IF EXISTS alerts CASCADE;
DROP TABLE IF EXISTS exchange_rates CASCADE;
DROP TABLE IF EXISTS installments CASCADE;
DROP TABLE IF EXISTS loans CASCADE;
DROP TABLE IF EXISTS creditors CASCADE;
DROP TABLE IF EXISTS personas CASCADE;
DROP TYPE IF EXISTS alert_status;
DROP TYPE IF EXISTS installment_status;
DROP TYPE IF EXISTS creditor_kind;
";
