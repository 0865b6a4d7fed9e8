//! SQLite schema definition.

/// Complete database schema for petclinic.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Staff (nurse roster lives here)
-- ============================================================================

CREATE TABLE IF NOT EXISTS staff (
    staff_id TEXT PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    first_name TEXT,
    last_name TEXT,
    role TEXT NOT NULL CHECK (role IN ('nurse', 'veterinarian', 'receptionist')),
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_staff_role ON staff(role);

-- ============================================================================
-- Pets
-- ============================================================================

CREATE TABLE IF NOT EXISTS pets (
    pet_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    identification_number TEXT NOT NULL,
    health_status TEXT,
    birthdate TEXT,
    owner_name TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_pets_name ON pets(name);

-- ============================================================================
-- Visits
-- ============================================================================

-- visit_start / visit_end are fixed-width ISO-8601 strings, so lexical
-- comparison matches chronological order.
CREATE TABLE IF NOT EXISTS visits (
    visit_id TEXT PRIMARY KEY,
    visit_number TEXT NOT NULL UNIQUE,
    pet_id TEXT REFERENCES pets(pet_id),
    visit_type TEXT NOT NULL,
    visit_start TEXT NOT NULL,
    visit_end TEXT NOT NULL,
    description TEXT,
    treatment_status TEXT NOT NULL DEFAULT 'upcoming',
    assigned_nurse_id TEXT REFERENCES staff(staff_id),
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_visits_interval ON visits(visit_start, visit_end);
CREATE INDEX IF NOT EXISTS idx_visits_nurse ON visits(assigned_nurse_id);

-- Visit numbers never change once written
CREATE TRIGGER IF NOT EXISTS visits_number_immutable BEFORE UPDATE OF visit_number ON visits
WHEN old.visit_number IS NOT new.visit_number
BEGIN
    SELECT RAISE(ABORT, 'visit_number is immutable');
END;

-- ============================================================================
-- Named Sequences (shared monotonic counters)
-- ============================================================================

CREATE TABLE IF NOT EXISTS sequences (
    name TEXT PRIMARY KEY,
    value INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Change Event Outbox (written in the same transaction as the change)
-- ============================================================================

CREATE TABLE IF NOT EXISTS change_events (
    event_id INTEGER PRIMARY KEY AUTOINCREMENT,
    entity TEXT NOT NULL,
    entity_id TEXT NOT NULL,
    change_type TEXT NOT NULL CHECK (change_type IN ('created', 'updated', 'deleted')),
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    delivered_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_change_events_pending ON change_events(delivered_at, event_id);
"#;
