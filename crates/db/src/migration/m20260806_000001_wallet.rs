//! Wallet migration: balances, journal transactions, subscriptions.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(WALLET_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TABLE IF EXISTS subscriptions CASCADE;
             DROP TABLE IF EXISTS transactions CASCADE;
             DROP TABLE IF EXISTS balances CASCADE;
             DROP TYPE IF EXISTS subscription_status;
             DROP TYPE IF EXISTS transaction_status;
             DROP TYPE IF EXISTS transaction_type;",
        )
        .await?;
        Ok(())
    }
}

const WALLET_SQL: &str = r"
-- Enum types
CREATE TYPE transaction_type AS ENUM (
    'topup', 'withdrawal', 'transfer_out', 'transfer_in', 'purchase', 'subscription_charge'
);
CREATE TYPE transaction_status AS ENUM ('pending', 'completed', 'failed');
CREATE TYPE subscription_status AS ENUM ('active', 'expired', 'inactive');

-- Balances: one row per (user, currency), created lazily on first credit.
-- The CHECK backs up the repository invariant: no committed negative amounts.
CREATE TABLE balances (
    user_id UUID NOT NULL,
    currency VARCHAR(3) NOT NULL,
    amount NUMERIC(20, 4) NOT NULL DEFAULT 0 CHECK (amount >= 0),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    PRIMARY KEY (user_id, currency)
);

-- Journal: append-only record of every balance-affecting event.
CREATE TABLE transactions (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL,
    tx_type transaction_type NOT NULL,
    amount NUMERIC(20, 4) NOT NULL CHECK (amount > 0),
    currency VARCHAR(3) NOT NULL,
    status transaction_status NOT NULL DEFAULT 'pending',
    gateway VARCHAR(32),
    gateway_reference TEXT,
    idempotency_key TEXT,
    fee NUMERIC(20, 4),
    counterparty_id UUID,
    correlation_id UUID,
    failure_reason TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- One journal row per logical gateway operation: replays are detected here
-- even when two retries race past the application-level lookup.
CREATE UNIQUE INDEX idx_transactions_idempotency
    ON transactions(tx_type, idempotency_key)
    WHERE idempotency_key IS NOT NULL;

-- User statement listing
CREATE INDEX idx_transactions_user ON transactions(user_id, created_at DESC);

-- Reconciliation scan over stuck gateway transactions
CREATE INDEX idx_transactions_stale_pending
    ON transactions(created_at)
    WHERE status = 'pending' AND gateway IS NOT NULL;

-- Transfer leg pairing
CREATE INDEX idx_transactions_correlation
    ON transactions(correlation_id)
    WHERE correlation_id IS NOT NULL;

-- Subscriptions: each backed by a completed subscription_charge row.
CREATE TABLE subscriptions (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL,
    plan VARCHAR(64) NOT NULL,
    status subscription_status NOT NULL,
    amount NUMERIC(20, 4) NOT NULL CHECK (amount > 0),
    currency VARCHAR(3) NOT NULL,
    started_at TIMESTAMPTZ NOT NULL,
    expires_at TIMESTAMPTZ NOT NULL,
    charge_transaction_id UUID NOT NULL REFERENCES transactions(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_expires_after_start CHECK (expires_at > started_at)
);

-- At most one active subscription per user at any instant
CREATE UNIQUE INDEX idx_subscriptions_one_active
    ON subscriptions(user_id)
    WHERE status = 'active';

CREATE INDEX idx_subscriptions_user ON subscriptions(user_id, created_at DESC);
";
