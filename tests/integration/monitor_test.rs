#![allow(clippy::expect_used)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use fleetguard::application::error::MonitorError;
use fleetguard::application::services::alerts::AlertManager;
use fleetguard::application::services::monitor::{MonitorService, MonitorSettings};
use fleetguard::domain::analysis::anomaly::StatisticalDetector;
use fleetguard::domain::analysis::scoring::WindowHealthScorer;
use fleetguard::domain::entities::equipment::{
    Equipment, EquipmentCategory, EquipmentStatus, NewEquipment,
};
use fleetguard::domain::entities::event::AlertEventKind;
use fleetguard::domain::entities::health::HealthScore;
use fleetguard::domain::entities::reading::{NewReading, SensorReading};
use fleetguard::domain::ports::store::{HealthStore, ReadingStore, StoreError};
use fleetguard::domain::ports::telemetry::{TelemetryError, TelemetrySource};
use fleetguard::domain::value_objects::alert_lifecycle::{AlertState, AlertType};
use fleetguard::domain::value_objects::health::RiskLevel;
use fleetguard::domain::value_objects::sensor::SensorKind;
use fleetguard::domain::value_objects::severity::Severity;
use fleetguard::infrastructure::persistence::in_memory_store::InMemoryStore;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Nominal readings for every sensor on every poll.
struct NominalSource;

impl TelemetrySource for NominalSource {
    fn poll(&self, equipment: &Equipment) -> Result<Vec<NewReading>, TelemetryError> {
        Ok(SensorKind::ALL
            .into_iter()
            .map(|kind| NewReading::new(equipment.id.clone(), kind, kind.nominal()))
            .collect())
    }
}

/// Delegates to an in-memory store, but appends take `delay`, either for
/// every machine or only for `only`. Tracks how many appends overlap per machine.
struct SlowReadings {
    inner: InMemoryStore,
    delay: Duration,
    only: Option<&'static str>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl SlowReadings {
    fn new(delay: Duration) -> Self {
        Self {
            inner: InMemoryStore::new(),
            delay,
            only: None,
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    fn only(mut self, equipment_id: &'static str) -> Self {
        self.only = Some(equipment_id);
        self
    }
}

#[async_trait]
impl ReadingStore for SlowReadings {
    async fn append_reading(&self, reading: &SensorReading) -> Result<(), StoreError> {
        if self.only.is_some_and(|id| id != reading.equipment_id) {
            return self.inner.append_reading(reading).await;
        }
        let overlapping = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(overlapping, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        let result = self.inner.append_reading(reading).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn recent_readings(
        &self,
        equipment_id: &str,
        sensor: Option<SensorKind>,
        limit: usize,
    ) -> Result<Vec<SensorReading>, StoreError> {
        self.inner.recent_readings(equipment_id, sensor, limit).await
    }

    async fn purge_readings_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        self.inner.purge_readings_before(cutoff).await
    }
}

/// Records `readings_considered` of every score written, in write order.
#[derive(Default)]
struct RecordingHealth {
    inner: InMemoryStore,
    considered: Mutex<Vec<usize>>,
}

#[async_trait]
impl HealthStore for RecordingHealth {
    async fn upsert_health(&self, score: &HealthScore) -> Result<(), StoreError> {
        self.considered
            .lock()
            .expect("lock")
            .push(score.readings_considered);
        self.inner.upsert_health(score).await
    }

    async fn get_health(&self, equipment_id: &str) -> Result<Option<HealthScore>, StoreError> {
        self.inner.get_health(equipment_id).await
    }

    async fn list_health(&self) -> Result<Vec<HealthScore>, StoreError> {
        self.inner.list_health().await
    }
}

fn build(
    readings: Option<Arc<dyn ReadingStore>>,
    source: Arc<dyn TelemetrySource>,
    settings: MonitorSettings,
) -> Arc<MonitorService> {
    build_with(readings, None, source, settings)
}

fn build_with(
    readings: Option<Arc<dyn ReadingStore>>,
    health: Option<Arc<dyn HealthStore>>,
    source: Arc<dyn TelemetrySource>,
    settings: MonitorSettings,
) -> Arc<MonitorService> {
    let store = Arc::new(InMemoryStore::new());
    let readings = readings.unwrap_or_else(|| store.clone());
    let health = health.unwrap_or_else(|| store.clone());
    Arc::new(MonitorService::new(
        store.clone(),
        readings,
        health,
        Arc::new(StatisticalDetector::default()),
        Arc::new(WindowHealthScorer::default()),
        AlertManager::new(store, settings.store_timeout),
        source,
        settings,
    ))
}

fn monitor() -> Arc<MonitorService> {
    build(None, Arc::new(NominalSource), MonitorSettings::default())
}

fn machine(id: &str, category: EquipmentCategory) -> NewEquipment {
    NewEquipment {
        id: Some(id.into()),
        name: format!("Machine {id}"),
        category: Some(category),
        serial_number: format!("SN-{id}"),
        location: "North pit".into(),
        ..NewEquipment::default()
    }
}

fn predictive(alerts: &[fleetguard::domain::entities::alert::MaintenanceAlert]) -> usize {
    alerts
        .iter()
        .filter(|a| a.alert_type == AlertType::Predictive)
        .count()
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn overheating_excavator_raises_critical_alert() {
    let service = monitor();
    let mut events = service.subscribe();
    service
        .add_equipment(machine("EQ1", EquipmentCategory::Excavator))
        .await
        .expect("add");

    let stored = service
        .ingest(NewReading::new("EQ1", SensorKind::Temperature, 500.0))
        .await
        .expect("ingest");
    assert!(stored.is_anomaly);

    let critical = service.get_critical_alerts().await.expect("critical");
    assert_eq!(critical.len(), 1);
    let alert = &critical[0];
    assert_eq!(alert.equipment_id, "EQ1");
    assert_eq!(alert.severity, Severity::Critical);
    assert_eq!(alert.alert_type, AlertType::Predictive);
    assert_eq!(alert.state, AlertState::Active);
    assert_eq!(alert.sensor, Some(SensorKind::Temperature));
    assert!(alert.predicted_failure_date.is_some());

    let active = service.get_active_alerts(Some("EQ1")).await.expect("active");
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, alert.id);

    let event = events.try_recv().expect("created event");
    assert_eq!(event.kind, AlertEventKind::Created);
    assert_eq!(event.alert_id, alert.id);
}

#[tokio::test]
async fn steady_generator_scores_healthy() {
    let service = monitor();
    service
        .add_equipment(machine("EQ2", EquipmentCategory::Generator))
        .await
        .expect("add");

    for i in 0..100u32 {
        let sensor = SensorKind::ALL[(i as usize) % SensorKind::ALL.len()];
        let wobble = 1.0 + 0.01 * f64::from(i).sin();
        service
            .ingest(NewReading::new("EQ2", sensor, sensor.nominal() * wobble))
            .await
            .expect("ingest");
    }

    let score = service.get_health("EQ2").await.expect("score");
    assert!(score.overall_score >= 0.95, "score {}", score.overall_score);
    assert_eq!(score.risk_level, RiskLevel::Low);
    assert!(score.is_consistent());
    assert_eq!(score.readings_considered, 100);
}

#[tokio::test]
async fn repeated_anomalies_raise_one_predictive_alert() {
    let service = monitor();
    service
        .add_equipment(machine("EQ3", EquipmentCategory::Crane))
        .await
        .expect("add");

    for _ in 0..10 {
        let stored = service
            .ingest(NewReading::new("EQ3", SensorKind::Vibration, 75.0))
            .await
            .expect("ingest");
        assert!(stored.is_anomaly);
    }

    let alerts = service.get_active_alerts(Some("EQ3")).await.expect("alerts");
    assert_eq!(predictive(&alerts), 1);
}

#[tokio::test]
async fn second_acknowledge_is_a_state_conflict() {
    let service = monitor();
    service
        .add_equipment(machine("EQ4", EquipmentCategory::Loader))
        .await
        .expect("add");
    service
        .ingest(NewReading::new("EQ4", SensorKind::Pressure, 420.0))
        .await
        .expect("ingest");
    let alert = service
        .get_active_alerts(Some("EQ4"))
        .await
        .expect("alerts")
        .into_iter()
        .next()
        .expect("one alert");

    let acked = service.acknowledge_alert(&alert.id).await.expect("first");
    assert_eq!(acked.state, AlertState::Acknowledged);
    let err = service
        .acknowledge_alert(&alert.id)
        .await
        .expect_err("second");
    assert!(matches!(err, MonitorError::StateConflict(_)));

    let stored = service
        .get_alerts_since(Utc::now() - chrono::TimeDelta::hours(1))
        .await
        .expect("since")
        .into_iter()
        .find(|a| a.id == alert.id)
        .expect("stored");
    assert_eq!(stored.state, AlertState::Acknowledged);
    assert_eq!(stored.acknowledged_at, acked.acknowledged_at);
}

#[tokio::test]
async fn out_of_bounds_readings_are_critical_even_when_cold() {
    let service = monitor();
    service
        .add_equipment(machine("EQ5", EquipmentCategory::DumpTruck))
        .await
        .expect("add");

    let first = service
        .ingest(NewReading::new("EQ5", SensorKind::FuelLevel, -5.0))
        .await
        .expect("ingest");
    assert!(first.is_anomaly);
    let critical = service.get_critical_alerts().await.expect("critical");
    assert_eq!(critical.len(), 1);
    assert_eq!(critical[0].sensor, Some(SensorKind::FuelLevel));

    // a second implausible value on another sensor is still flagged
    let second = service
        .ingest(NewReading::new("EQ5", SensorKind::OilLevel, 140.0))
        .await
        .expect("ingest");
    assert!(second.is_anomaly);
    let alerts = service.get_active_alerts(Some("EQ5")).await.expect("alerts");
    assert_eq!(predictive(&alerts), 1);
}

#[tokio::test]
async fn in_bound_readings_are_normal_during_cold_start() {
    let service = monitor();
    service
        .add_equipment(machine("EQ6", EquipmentCategory::Compressor))
        .await
        .expect("add");
    for value in [20.0, 140.0, -30.0] {
        let stored = service
            .ingest(NewReading::new("EQ6", SensorKind::Temperature, value))
            .await
            .expect("ingest");
        assert!(!stored.is_anomaly, "{value} flagged during cold start");
    }
}

#[tokio::test]
async fn slow_store_surfaces_as_transient_failure() {
    let settings = MonitorSettings {
        store_timeout: Duration::from_millis(20),
        ..MonitorSettings::default()
    };
    let slow = Arc::new(SlowReadings::new(Duration::from_millis(200)));
    let service = build(Some(slow), Arc::new(NominalSource), settings);
    service
        .add_equipment(machine("EQ7", EquipmentCategory::Bulldozer))
        .await
        .expect("add");

    let err = service
        .ingest(NewReading::new("EQ7", SensorKind::Rpm, 1800.0))
        .await
        .expect_err("timeout");
    assert!(matches!(err, MonitorError::TransientStore(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn scores_stay_consistent_while_stopping() {
    let settings = MonitorSettings {
        ingest_interval: Duration::from_millis(5),
        sweep_interval: Duration::from_millis(7),
        ..MonitorSettings::default()
    };
    let service = build(None, Arc::new(NominalSource), settings);
    for id in ["EQ10", "EQ11", "EQ12"] {
        service
            .add_equipment(machine(id, EquipmentCategory::Excavator))
            .await
            .expect("add");
    }

    service.start().await.expect("start");
    let done = Arc::new(AtomicBool::new(false));
    let reader = {
        let service = Arc::clone(&service);
        let done = Arc::clone(&done);
        tokio::spawn(async move {
            let mut observed = 0usize;
            while !done.load(Ordering::SeqCst) {
                for score in service.get_all_health().await.expect("scores") {
                    assert!(score.is_consistent(), "inconsistent score {score:?}");
                    observed += 1;
                }
                tokio::task::yield_now().await;
            }
            observed
        })
    };

    tokio::time::sleep(Duration::from_millis(60)).await;
    service.stop().await;
    assert!(!service.is_running().await);
    done.store(true, Ordering::SeqCst);
    let observed = reader.await.expect("reader");
    assert!(observed > 0);

    let scores = service.get_all_health().await.expect("scores");
    assert_eq!(scores.len(), 3);
    assert!(scores.iter().all(|s| s.is_consistent()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_ingests_for_one_machine_run_in_order() {
    const READINGS: usize = 8;
    let slow = Arc::new(SlowReadings::new(Duration::from_millis(15)));
    let health = Arc::new(RecordingHealth::default());
    let service = build_with(
        Some(slow.clone()),
        Some(health.clone()),
        Arc::new(NominalSource),
        MonitorSettings::default(),
    );
    service
        .add_equipment(machine("EQ20", EquipmentCategory::Loader))
        .await
        .expect("add");

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..READINGS {
        let service = Arc::clone(&service);
        tasks.spawn(async move {
            #[allow(clippy::cast_precision_loss)]
            let value = 50.0 + i as f64;
            service
                .ingest(NewReading::new("EQ20", SensorKind::Load, value))
                .await
        });
    }
    while let Some(joined) = tasks.join_next().await {
        joined.expect("task").expect("ingest");
    }

    assert_eq!(slow.peak_in_flight.load(Ordering::SeqCst), 1);

    let stored = service
        .readings("EQ20", Some(SensorKind::Load), READINGS * 2)
        .await
        .expect("readings");
    assert_eq!(stored.len(), READINGS);
    assert!(stored
        .windows(2)
        .all(|pair| pair[0].timestamp >= pair[1].timestamp));

    let considered = health.considered.lock().expect("lock").clone();
    assert_eq!(considered, (1..=READINGS).collect::<Vec<_>>());
}

#[tokio::test]
async fn slow_machine_does_not_block_another() {
    let slow = Arc::new(SlowReadings::new(Duration::from_millis(400)).only("SLOW"));
    let service = build(Some(slow), Arc::new(NominalSource), MonitorSettings::default());
    for id in ["SLOW", "FAST"] {
        service
            .add_equipment(machine(id, EquipmentCategory::Compressor))
            .await
            .expect("add");
    }

    let stalled = {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            service
                .ingest(NewReading::new("SLOW", SensorKind::Pressure, 180.0))
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    let fast = tokio::time::timeout(
        Duration::from_millis(200),
        service.ingest(NewReading::new("FAST", SensorKind::Pressure, 180.0)),
    )
    .await
    .expect("FAST waited on SLOW")
    .expect("ingest");
    assert_eq!(fast.equipment_id, "FAST");
    assert!(!stalled.is_finished());

    stalled.await.expect("task").expect("slow ingest");
    assert_eq!(service.get_all_health().await.expect("scores").len(), 2);
}

#[tokio::test]
async fn retirement_during_ingest_refuses_queued_readings() {
    let slow = Arc::new(SlowReadings::new(Duration::from_millis(150)));
    let service = build(Some(slow), Arc::new(NominalSource), MonitorSettings::default());
    service
        .add_equipment(machine("EQ30", EquipmentCategory::Crane))
        .await
        .expect("add");

    let first = {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            service
                .ingest(NewReading::new("EQ30", SensorKind::Load, 40.0))
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;

    let retire = {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            service
                .set_equipment_status("EQ30", EquipmentStatus::Retired)
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;

    let queued = {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            service
                .ingest(NewReading::new("EQ30", SensorKind::Load, 41.0))
                .await
        })
    };

    first.await.expect("task").expect("first ingest");
    retire.await.expect("task").expect("retire");
    let err = queued.await.expect("task").expect_err("retired");
    assert!(matches!(err, MonitorError::StateConflict(_)));

    let stored = service
        .readings("EQ30", None, 10)
        .await
        .expect("readings");
    assert_eq!(stored.len(), 1);
}
