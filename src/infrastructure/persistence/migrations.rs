use rusqlite::Connection;

/// Ordered schema steps; `PRAGMA user_version` records how many have run.
const MIGRATIONS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS equipment (
        id              TEXT    PRIMARY KEY,
        name            TEXT    NOT NULL,
        category        TEXT    NOT NULL,
        model           TEXT    NOT NULL,
        manufacturer    TEXT    NOT NULL,
        serial_number   TEXT    NOT NULL,
        purchase_date   TEXT,
        install_date    TEXT,
        location        TEXT    NOT NULL,
        status          TEXT    NOT NULL,
        operating_hours REAL    NOT NULL,
        created_at      TEXT    NOT NULL
    );

    CREATE TABLE IF NOT EXISTS readings (
        seq          INTEGER PRIMARY KEY AUTOINCREMENT,
        id           TEXT    NOT NULL UNIQUE,
        equipment_id TEXT    NOT NULL,
        sensor       TEXT    NOT NULL,
        value        REAL    NOT NULL,
        recorded_at  TEXT    NOT NULL,
        is_anomaly   INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS health_scores (
        equipment_id  TEXT PRIMARY KEY,
        overall_score REAL NOT NULL,
        risk_level    TEXT NOT NULL,
        updated_at    TEXT NOT NULL,
        data          TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS alerts (
        seq          INTEGER PRIMARY KEY AUTOINCREMENT,
        id           TEXT    NOT NULL UNIQUE,
        equipment_id TEXT    NOT NULL,
        alert_type   TEXT    NOT NULL,
        severity     TEXT    NOT NULL,
        state        TEXT    NOT NULL,
        created_at   TEXT    NOT NULL,
        data         TEXT    NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_readings_equipment ON readings(equipment_id, sensor, seq);
    CREATE INDEX IF NOT EXISTS idx_readings_recorded_at ON readings(recorded_at);
    CREATE INDEX IF NOT EXISTS idx_alerts_equipment ON alerts(equipment_id, state);
    CREATE INDEX IF NOT EXISTS idx_alerts_created_at ON alerts(created_at);",
];

/// Bring the schema up to the latest version.
///
/// # Errors
/// Returns `rusqlite::Error` if any SQL statement fails.
pub fn initialize_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    let applied: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    let applied = usize::try_from(applied).unwrap_or(0);
    for (index, step) in MIGRATIONS.iter().enumerate().skip(applied) {
        conn.execute_batch(step)?;
        let version = i64::try_from(index + 1).unwrap_or(i64::MAX);
        conn.pragma_update(None, "user_version", version)?;
        tracing::debug!("Applied schema migration {version}");
    }
    Ok(())
}

#[must_use]
pub const fn latest_version() -> usize {
    MIGRATIONS.len()
}
