use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::entities::alert::MaintenanceAlert;
use crate::domain::entities::equipment::{Equipment, EquipmentStatus};
use crate::domain::entities::health::HealthScore;
use crate::domain::entities::reading::SensorReading;
use crate::domain::ports::store::{
    AlertQuery, AlertStore, EquipmentStore, HealthStore, ReadingStore, StoreError,
};
use crate::domain::value_objects::sensor::SensorKind;

use super::migrations;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite-backed persistent store for equipment, telemetry, scores and alerts.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Create a new `SQLite` store at the given path.
    ///
    /// Expands `~`, creates parent directories, opens connection,
    /// sets WAL mode and pragmas, and migrates the schema.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::WriteFailed` if the database cannot be opened or initialized.
    pub fn new(path: &str) -> Result<Self, StoreError> {
        let expanded = shellexpand::tilde(path);
        let db_path = PathBuf::from(expanded.as_ref());

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        }

        let conn =
            Connection::open(&db_path).map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        conn.pragma_update(None, "synchronous", "NORMAL")
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        conn.pragma_update(None, "busy_timeout", 5000)
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        migrations::initialize_schema(&conn).map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        tracing::debug!("SQLite store opened at {}", db_path.display());

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

// Fixed-width UTC timestamps keep lexical and chronological order identical.
fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion_error(column: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, message.into())
}

fn parse_timestamp(column: usize, raw: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn parse_date(column: usize, raw: Option<String>) -> Result<Option<NaiveDate>, rusqlite::Error> {
    raw.map(|value| {
        NaiveDate::parse_from_str(&value, DATE_FORMAT).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
        })
    })
    .transpose()
}

fn parse_json<T: serde::de::DeserializeOwned>(column: usize, raw: &str) -> Result<T, rusqlite::Error> {
    serde_json::from_str(raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
    })
}

const EQUIPMENT_COLUMNS: &str = "id, name, category, model, manufacturer, serial_number, \
     purchase_date, install_date, location, status, operating_hours, created_at";

fn parse_equipment_row(row: &rusqlite::Row<'_>) -> Result<Equipment, rusqlite::Error> {
    let category: String = row.get(2)?;
    let status: String = row.get(9)?;
    let created_at: String = row.get(11)?;
    Ok(Equipment {
        id: row.get(0)?,
        name: row.get(1)?,
        category: category.parse().map_err(|e| conversion_error(2, e))?,
        model: row.get(3)?,
        manufacturer: row.get(4)?,
        serial_number: row.get(5)?,
        purchase_date: parse_date(6, row.get(6)?)?,
        install_date: parse_date(7, row.get(7)?)?,
        location: row.get(8)?,
        status: status.parse().map_err(|e| conversion_error(9, e))?,
        operating_hours: row.get(10)?,
        created_at: parse_timestamp(11, &created_at)?,
    })
}

fn parse_reading_row(row: &rusqlite::Row<'_>) -> Result<SensorReading, rusqlite::Error> {
    let sensor: String = row.get(2)?;
    let recorded_at: String = row.get(4)?;
    Ok(SensorReading {
        id: row.get(0)?,
        equipment_id: row.get(1)?,
        sensor: sensor.parse().map_err(|e| conversion_error(2, e))?,
        value: row.get(3)?,
        timestamp: parse_timestamp(4, &recorded_at)?,
        is_anomaly: row.get(5)?,
    })
}

#[async_trait]
impl EquipmentStore for SqliteStore {
    async fn insert_equipment(&self, equipment: &Equipment) -> Result<(), StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::WriteFailed("lock poisoned".into()))?;

        let exists = conn
            .query_row(
                "SELECT 1 FROM equipment WHERE id = ?1",
                params![equipment.id],
                |_| Ok(()),
            )
            .optional()
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?
            .is_some();
        if exists {
            return Err(StoreError::Duplicate(equipment.id.clone()));
        }

        conn.execute(
            &format!(
                "INSERT INTO equipment ({EQUIPMENT_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
            ),
            params![
                equipment.id,
                equipment.name,
                equipment.category.as_str(),
                equipment.model,
                equipment.manufacturer,
                equipment.serial_number,
                equipment
                    .purchase_date
                    .map(|d| d.format(DATE_FORMAT).to_string()),
                equipment
                    .install_date
                    .map(|d| d.format(DATE_FORMAT).to_string()),
                equipment.location,
                equipment.status.as_str(),
                equipment.operating_hours,
                timestamp(&equipment.created_at),
            ],
        )
        .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        drop(conn);
        Ok(())
    }

    async fn get_equipment(&self, id: &str) -> Result<Option<Equipment>, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::ReadFailed("lock poisoned".into()))?;

        let equipment = conn
            .query_row(
                &format!("SELECT {EQUIPMENT_COLUMNS} FROM equipment WHERE id = ?1"),
                params![id],
                parse_equipment_row,
            )
            .optional()
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

        drop(conn);
        Ok(equipment)
    }

    async fn list_equipment(
        &self,
        status: Option<EquipmentStatus>,
    ) -> Result<Vec<Equipment>, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::ReadFailed("lock poisoned".into()))?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {EQUIPMENT_COLUMNS} FROM equipment \
                 WHERE ?1 IS NULL OR status = ?1 ORDER BY rowid"
            ))
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

        let equipment = stmt
            .query_map(params![status.map(|s| s.as_str())], parse_equipment_row)
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

        drop(stmt);
        drop(conn);
        Ok(equipment)
    }

    async fn update_equipment_status(
        &self,
        id: &str,
        status: EquipmentStatus,
    ) -> Result<(), StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::WriteFailed("lock poisoned".into()))?;

        let changed = conn
            .execute(
                "UPDATE equipment SET status = ?1 WHERE id = ?2",
                params![status.as_str(), id],
            )
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        drop(conn);
        if changed == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ReadingStore for SqliteStore {
    async fn append_reading(&self, reading: &SensorReading) -> Result<(), StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::WriteFailed("lock poisoned".into()))?;

        conn.execute(
            "INSERT INTO readings (id, equipment_id, sensor, value, recorded_at, is_anomaly) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                reading.id,
                reading.equipment_id,
                reading.sensor.as_str(),
                reading.value,
                timestamp(&reading.timestamp),
                reading.is_anomaly,
            ],
        )
        .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        drop(conn);
        Ok(())
    }

    async fn recent_readings(
        &self,
        equipment_id: &str,
        sensor: Option<SensorKind>,
        limit: usize,
    ) -> Result<Vec<SensorReading>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::ReadFailed("lock poisoned".into()))?;

        let mut stmt = conn
            .prepare(
                "SELECT id, equipment_id, sensor, value, recorded_at, is_anomaly \
                 FROM readings WHERE equipment_id = ?1 AND (?2 IS NULL OR sensor = ?2) \
                 ORDER BY seq DESC LIMIT ?3",
            )
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

        let readings = stmt
            .query_map(
                params![equipment_id, sensor.map(|s| s.as_str()), limit],
                parse_reading_row,
            )
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

        drop(stmt);
        drop(conn);
        Ok(readings)
    }

    async fn purge_readings_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::WriteFailed("lock poisoned".into()))?;

        let removed = conn
            .execute(
                "DELETE FROM readings WHERE recorded_at < ?1",
                params![timestamp(&cutoff)],
            )
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        drop(conn);
        Ok(removed)
    }
}

#[async_trait]
impl HealthStore for SqliteStore {
    async fn upsert_health(&self, score: &HealthScore) -> Result<(), StoreError> {
        let data =
            serde_json::to_string(score).map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::WriteFailed("lock poisoned".into()))?;

        conn.execute(
            "INSERT INTO health_scores (equipment_id, overall_score, risk_level, updated_at, data) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             ON CONFLICT(equipment_id) DO UPDATE SET \
                overall_score = excluded.overall_score, \
                risk_level = excluded.risk_level, \
                updated_at = excluded.updated_at, \
                data = excluded.data",
            params![
                score.equipment_id,
                score.overall_score,
                score.risk_level.as_str(),
                timestamp(&score.updated_at),
                data,
            ],
        )
        .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        drop(conn);
        Ok(())
    }

    async fn get_health(&self, equipment_id: &str) -> Result<Option<HealthScore>, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::ReadFailed("lock poisoned".into()))?;

        let score = conn
            .query_row(
                "SELECT data FROM health_scores WHERE equipment_id = ?1",
                params![equipment_id],
                |row| parse_json::<HealthScore>(0, &row.get::<_, String>(0)?),
            )
            .optional()
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

        drop(conn);
        Ok(score)
    }

    async fn list_health(&self) -> Result<Vec<HealthScore>, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::ReadFailed("lock poisoned".into()))?;

        let mut stmt = conn
            .prepare("SELECT data FROM health_scores ORDER BY equipment_id")
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

        let scores = stmt
            .query_map([], |row| parse_json::<HealthScore>(0, &row.get::<_, String>(0)?))
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

        drop(stmt);
        drop(conn);
        Ok(scores)
    }
}

#[async_trait]
impl AlertStore for SqliteStore {
    async fn insert_alert(&self, alert: &MaintenanceAlert) -> Result<(), StoreError> {
        let data =
            serde_json::to_string(alert).map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::WriteFailed("lock poisoned".into()))?;

        conn.execute(
            "INSERT INTO alerts (id, equipment_id, alert_type, severity, state, created_at, data) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                alert.id,
                alert.equipment_id,
                alert.alert_type.as_str(),
                alert.severity.as_str(),
                alert.state.as_str(),
                timestamp(&alert.created_at),
                data,
            ],
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(code, _)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StoreError::Duplicate(alert.id.clone())
            }
            other => StoreError::WriteFailed(other.to_string()),
        })?;

        drop(conn);
        Ok(())
    }

    async fn update_alert(&self, alert: &MaintenanceAlert) -> Result<(), StoreError> {
        let data =
            serde_json::to_string(alert).map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::WriteFailed("lock poisoned".into()))?;

        let changed = conn
            .execute(
                "UPDATE alerts SET severity = ?1, state = ?2, data = ?3 WHERE id = ?4",
                params![alert.severity.as_str(), alert.state.as_str(), data, alert.id],
            )
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        drop(conn);
        if changed == 0 {
            return Err(StoreError::NotFound(alert.id.clone()));
        }
        Ok(())
    }

    async fn get_alert(&self, id: &str) -> Result<Option<MaintenanceAlert>, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::ReadFailed("lock poisoned".into()))?;

        let alert = conn
            .query_row(
                "SELECT data FROM alerts WHERE id = ?1",
                params![id],
                |row| parse_json::<MaintenanceAlert>(0, &row.get::<_, String>(0)?),
            )
            .optional()
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

        drop(conn);
        Ok(alert)
    }

    async fn find_alerts(&self, query: &AlertQuery) -> Result<Vec<MaintenanceAlert>, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::ReadFailed("lock poisoned".into()))?;

        // Narrow by indexed columns in SQL; the remaining filters run on decoded rows.
        let mut stmt = conn
            .prepare(
                "SELECT data FROM alerts \
                 WHERE (?1 IS NULL OR equipment_id = ?1) AND (?2 IS NULL OR alert_type = ?2) \
                 ORDER BY seq DESC",
            )
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

        let rows = stmt
            .query_map(
                params![
                    query.equipment_id.as_deref(),
                    query.alert_type.map(|t| t.as_str())
                ],
                |row| parse_json::<MaintenanceAlert>(0, &row.get::<_, String>(0)?),
            )
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

        let mut alerts = Vec::new();
        for row in rows {
            let alert = row.map_err(|e| StoreError::ReadFailed(e.to_string()))?;
            if query.limit.is_some_and(|limit| alerts.len() >= limit) {
                break;
            }
            if query.matches(&alert) {
                alerts.push(alert);
            }
        }

        drop(stmt);
        drop(conn);
        Ok(alerts)
    }
}
