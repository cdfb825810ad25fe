//! SQL schema for the maintenance SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Snapshot of fleet-management vehicles; the engine only reads these.
CREATE TABLE IF NOT EXISTS vehicles (
    vehicle_id   TEXT PRIMARY KEY,
    tenant_id    TEXT NOT NULL,
    plate        TEXT NOT NULL,
    odometer_km  INTEGER NOT NULL CHECK (odometer_km >= 0),
    status       TEXT NOT NULL,   -- 'active' | 'in_maintenance' | 'out_of_service' | 'retired'
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS maintenance_types (
    type_id                TEXT PRIMARY KEY,
    tenant_id              TEXT NOT NULL,
    name                   TEXT NOT NULL,
    category               TEXT NOT NULL,
    class                  TEXT NOT NULL,   -- 'preventive' | 'corrective'
    interval_kind          TEXT NOT NULL,   -- 'km' | 'months' | 'both'
    default_km_interval    INTEGER,
    default_month_interval INTEGER,
    alert_before_km        INTEGER NOT NULL DEFAULT 0,
    alert_before_days      INTEGER NOT NULL DEFAULT 0,
    mandatory              INTEGER NOT NULL DEFAULT 0,
    active                 INTEGER NOT NULL DEFAULT 1,
    created_at             TEXT NOT NULL
);

-- At most one plan per (vehicle, type).
CREATE TABLE IF NOT EXISTS vehicle_maintenance_plans (
    plan_id               TEXT PRIMARY KEY,
    tenant_id             TEXT NOT NULL,
    vehicle_id            TEXT NOT NULL REFERENCES vehicles(vehicle_id),
    type_id               TEXT NOT NULL REFERENCES maintenance_types(type_id),
    enabled               INTEGER NOT NULL DEFAULT 1,
    custom_km_interval    INTEGER,
    custom_month_interval INTEGER,
    created_at            TEXT NOT NULL,
    UNIQUE (tenant_id, vehicle_id, type_id)
);

CREATE TABLE IF NOT EXISTS maintenance_records (
    record_id                 TEXT PRIMARY KEY,
    tenant_id                 TEXT NOT NULL,
    vehicle_id                TEXT NOT NULL REFERENCES vehicles(vehicle_id),
    type_id                   TEXT REFERENCES maintenance_types(type_id),
    class                     TEXT NOT NULL,
    status                    TEXT NOT NULL,   -- 'scheduled' | 'completed' | 'overdue' | 'cancelled'
    scheduled_date            TEXT,            -- YYYY-MM-DD
    executed_date             TEXT,            -- YYYY-MM-DD
    vehicle_km_at_maintenance INTEGER,
    next_maintenance_km       INTEGER,
    next_maintenance_date     TEXT,
    notes                     TEXT,
    cost_cents                INTEGER,
    created_at                TEXT NOT NULL,
    updated_at                TEXT NOT NULL,
    version                   INTEGER NOT NULL
);

-- First observation of a pair without service history; never updated.
CREATE TABLE IF NOT EXISTS pair_baselines (
    tenant_id    TEXT NOT NULL,
    vehicle_id   TEXT NOT NULL REFERENCES vehicles(vehicle_id),
    type_id      TEXT NOT NULL REFERENCES maintenance_types(type_id),
    odometer_km  INTEGER NOT NULL,
    observed_on  TEXT NOT NULL,   -- YYYY-MM-DD
    created_at   TEXT NOT NULL,
    PRIMARY KEY (tenant_id, vehicle_id, type_id)
);

-- Alerts are never deleted. The single-active-alert-per-pair rule is kept by
-- the engine under its per-pair lock, not by an index.
CREATE TABLE IF NOT EXISTS maintenance_alerts (
    alert_id          TEXT PRIMARY KEY,
    tenant_id         TEXT NOT NULL,
    vehicle_id        TEXT NOT NULL REFERENCES vehicles(vehicle_id),
    type_id           TEXT NOT NULL REFERENCES maintenance_types(type_id),
    alert_type        TEXT NOT NULL,   -- 'km' | 'date' | 'overdue'
    severity          TEXT NOT NULL,   -- 'info' | 'warning' | 'critical'
    due_km            INTEGER,
    due_date          TEXT,
    km_remaining      INTEGER,
    days_remaining    INTEGER,
    dismissed_by_kind TEXT,            -- NULL while active; 'user' | 'system'
    dismissed_by      TEXT,
    dismissed_at      TEXT,
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL,
    version           INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS vehicles_tenant_idx ON vehicles(tenant_id, status);
CREATE INDEX IF NOT EXISTS types_tenant_idx    ON maintenance_types(tenant_id);
CREATE INDEX IF NOT EXISTS records_pair_idx    ON maintenance_records(tenant_id, vehicle_id, type_id, status);
CREATE INDEX IF NOT EXISTS alerts_pair_idx     ON maintenance_alerts(tenant_id, vehicle_id, type_id);

PRAGMA user_version = 1;
";
