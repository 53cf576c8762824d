#![allow(clippy::expect_used)]

use std::sync::Arc;

use fleetguard::application::error::MonitorError;
use fleetguard::application::services::alerts::AlertManager;
use fleetguard::application::services::monitor::{MonitorService, MonitorSettings};
use fleetguard::domain::analysis::anomaly::StatisticalDetector;
use fleetguard::domain::analysis::scoring::WindowHealthScorer;
use fleetguard::domain::entities::equipment::{
    Equipment, EquipmentCategory, EquipmentStatus, NewEquipment,
};
use fleetguard::domain::entities::reading::NewReading;
use fleetguard::domain::ports::telemetry::{TelemetryError, TelemetrySource};
use fleetguard::domain::value_objects::alert_lifecycle::{AlertState, ResolutionOutcome};
use fleetguard::domain::value_objects::sensor::SensorKind;
use fleetguard::infrastructure::persistence::sqlite_store::SqliteStore;

struct Silent;

impl TelemetrySource for Silent {
    fn poll(&self, _equipment: &Equipment) -> Result<Vec<NewReading>, TelemetryError> {
        Ok(Vec::new())
    }
}

fn open(path: &str) -> Arc<MonitorService> {
    let store = Arc::new(SqliteStore::new(path).expect("open database"));
    let settings = MonitorSettings::default();
    Arc::new(MonitorService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        Arc::new(StatisticalDetector::default()),
        Arc::new(WindowHealthScorer::default()),
        AlertManager::new(store, settings.store_timeout),
        Arc::new(Silent),
        settings,
    ))
}

fn db_path(dir: &tempfile::TempDir) -> String {
    dir.path().join("fleet.db").to_string_lossy().into_owned()
}

#[tokio::test]
async fn pipeline_state_survives_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = db_path(&dir);

    let alert_id = {
        let service = open(&path);
        service
            .add_equipment(NewEquipment {
                id: Some("EQ1".into()),
                name: "Komatsu PC210".into(),
                category: Some(EquipmentCategory::Excavator),
                serial_number: "KMT-0042".into(),
                location: "Quarry 3".into(),
                operating_hours: 1250.0,
                ..NewEquipment::default()
            })
            .await
            .expect("add");
        for _ in 0..6 {
            service
                .ingest(NewReading::new("EQ1", SensorKind::Temperature, 85.0))
                .await
                .expect("normal");
        }
        let hot = service
            .ingest(NewReading::new("EQ1", SensorKind::Temperature, 500.0))
            .await
            .expect("hot");
        assert!(hot.is_anomaly);

        let alerts = service.get_critical_alerts().await.expect("alerts");
        assert_eq!(alerts.len(), 1);
        service
            .acknowledge_alert(&alerts[0].id)
            .await
            .expect("ack");
        alerts[0].id.clone()
    };

    let service = open(&path);
    let equipment = service.get_equipment("EQ1").await.expect("equipment");
    assert_eq!(equipment.name, "Komatsu PC210");
    assert_eq!(equipment.status, EquipmentStatus::Active);
    assert!((equipment.operating_hours - 1250.0).abs() < f64::EPSILON);

    let readings = service
        .readings("EQ1", Some(SensorKind::Temperature), 10)
        .await
        .expect("readings");
    assert_eq!(readings.len(), 7);
    assert!((readings[0].value - 500.0).abs() < f64::EPSILON);
    assert!(readings[0].is_anomaly);
    assert!(readings[1..].iter().all(|r| !r.is_anomaly));

    let score = service.get_health("EQ1").await.expect("score");
    assert_eq!(score.readings_considered, 7);
    assert!(score.is_consistent());
    assert!(score.overall_score < 1.0);

    assert!(service
        .get_active_alerts(Some("EQ1"))
        .await
        .expect("active")
        .is_empty());
    let open_alerts = service.get_critical_alerts().await.expect("open");
    let alert = open_alerts
        .iter()
        .find(|a| a.id == alert_id)
        .expect("persisted alert");
    assert_eq!(alert.state, AlertState::Acknowledged);
    assert!(alert.acknowledged_at.is_some());

    let resolved = service
        .resolve_alert(&alert_id, ResolutionOutcome::Resolved)
        .await
        .expect("resolve");
    assert_eq!(resolved.state, AlertState::Resolved);
    assert!(service
        .get_critical_alerts()
        .await
        .expect("open")
        .is_empty());
}

#[tokio::test]
async fn duplicate_registration_rejected_across_sessions() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = db_path(&dir);
    let request = NewEquipment {
        id: Some("GEN-7".into()),
        name: "Standby generator".into(),
        category: Some(EquipmentCategory::Generator),
        serial_number: "CAT-77".into(),
        ..NewEquipment::default()
    };

    open(&path)
        .add_equipment(request.clone())
        .await
        .expect("first");
    let err = open(&path)
        .add_equipment(request)
        .await
        .expect_err("duplicate");
    assert!(matches!(err, MonitorError::Validation(_)));
}

#[tokio::test]
async fn retired_status_persists_and_blocks_ingest() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = db_path(&dir);
    {
        let service = open(&path);
        service
            .add_equipment(NewEquipment {
                id: Some("CR-1".into()),
                name: "Tower crane".into(),
                category: Some(EquipmentCategory::Crane),
                serial_number: "LBH-1".into(),
                ..NewEquipment::default()
            })
            .await
            .expect("add");
        service
            .set_equipment_status("CR-1", EquipmentStatus::Retired)
            .await
            .expect("retire");
    }

    let service = open(&path);
    let listed = service
        .equipment_list(Some(EquipmentStatus::Retired))
        .await
        .expect("list");
    assert_eq!(listed.len(), 1);
    let err = service
        .ingest(NewReading::new("CR-1", SensorKind::Load, 40.0))
        .await
        .expect_err("retired");
    assert!(matches!(err, MonitorError::StateConflict(_)));
}
