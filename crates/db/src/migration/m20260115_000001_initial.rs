//! Initial database migration.
//!
//! Creates the core tables: households, users, categories, receipts, and
//! budgets, plus the enum types and indexes they need.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: TENANCY
        // ============================================================
        db.execute_unprepared(HOUSEHOLDS_SQL).await?;
        db.execute_unprepared(USERS_SQL).await?;

        // ============================================================
        // PART 3: CATEGORIES
        // ============================================================
        db.execute_unprepared(CATEGORIES_SQL).await?;

        // ============================================================
        // PART 4: RECEIPTS
        // ============================================================
        db.execute_unprepared(RECEIPTS_SQL).await?;

        // ============================================================
        // PART 5: BUDGETS
        // ============================================================
        db.execute_unprepared(BUDGETS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_SQL).await?;
        Ok(())
    }
}

const ENUMS_SQL: &str = r"
CREATE TYPE expense_type AS ENUM ('personal', 'household');
";

const HOUSEHOLDS_SQL: &str = r"
CREATE TABLE households (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const USERS_SQL: &str = r"
CREATE TABLE users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    email TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    household_id UUID REFERENCES households(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_users_household ON users(household_id);
";

const CATEGORIES_SQL: &str = r"
CREATE TABLE categories (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    household_id UUID NOT NULL REFERENCES households(id),
    name TEXT NOT NULL,
    slug TEXT NOT NULL,
    icon TEXT,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    sort_order INTEGER NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    -- Slug stays unique among active AND inactive categories.
    CONSTRAINT categories_household_slug_key UNIQUE (household_id, slug)
);

CREATE INDEX idx_categories_household ON categories(household_id);
";

const RECEIPTS_SQL: &str = r"
CREATE TABLE receipts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL REFERENCES users(id),
    household_id UUID NOT NULL REFERENCES households(id),
    image_key TEXT,
    merchant_name TEXT,
    transaction_date TIMESTAMPTZ,
    subtotal NUMERIC(10, 2),
    tax NUMERIC(10, 2),
    tip NUMERIC(10, 2),
    grand_total NUMERIC(10, 2) NOT NULL,
    payment_method TEXT,
    category_id UUID REFERENCES categories(id),
    category_confidence DOUBLE PRECISION NOT NULL DEFAULT 0,
    category_overridden BOOLEAN NOT NULL DEFAULT FALSE,
    expense_type expense_type NOT NULL DEFAULT 'personal',
    raw_extraction JSONB NOT NULL DEFAULT '{}'::jsonb,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT receipts_confidence_range
        CHECK (category_confidence >= 0 AND category_confidence <= 1)
);

CREATE INDEX idx_receipts_user ON receipts(user_id);
CREATE INDEX idx_receipts_household ON receipts(household_id);
CREATE INDEX idx_receipts_category ON receipts(category_id);
-- List and dashboard queries order and filter by the effective date.
CREATE INDEX idx_receipts_effective_date
    ON receipts ((COALESCE(transaction_date, created_at)));
";

const BUDGETS_SQL: &str = r"
CREATE TABLE budgets (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    household_id UUID NOT NULL REFERENCES households(id),
    category_id UUID NOT NULL REFERENCES categories(id),
    monthly_limit NUMERIC(10, 2) NOT NULL,
    effective_from TIMESTAMPTZ NOT NULL,
    effective_to TIMESTAMPTZ,

    CONSTRAINT budgets_interval_valid
        CHECK (effective_to IS NULL OR effective_to >= effective_from)
);

CREATE INDEX idx_budgets_household_category ON budgets(household_id, category_id);
CREATE INDEX idx_budgets_effective_from ON budgets(effective_from);
";

const DROP_SQL: &str = r"
DROP TABLE IF EXISTS budgets;
DROP TABLE IF EXISTS receipts;
DROP TABLE IF EXISTS categories;
DROP TABLE IF EXISTS users;
DROP TABLE IF EXISTS households;
DROP TYPE IF EXISTS expense_type;
";
