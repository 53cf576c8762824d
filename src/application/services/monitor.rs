use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::{JoinHandle, JoinSet};

use super::alerts::AlertManager;
use super::events::EventBus;
use super::reporting::{Dashboard, TrendReport, RECENT_ALERTS};
use crate::application::error::{bounded, MonitorError};
use crate::domain::analysis::anomaly::AnomalyDetector;
use crate::domain::analysis::scoring::HealthScorer;
use crate::domain::entities::alert::MaintenanceAlert;
use crate::domain::entities::equipment::{Equipment, EquipmentStatus, NewEquipment};
use crate::domain::entities::event::{AlertEvent, AlertEventKind};
use crate::domain::entities::health::HealthScore;
use crate::domain::entities::reading::{NewReading, SensorReading};
use crate::domain::ports::store::{EquipmentStore, HealthStore, ReadingStore, StoreError};
use crate::domain::ports::telemetry::TelemetrySource;
use crate::domain::value_objects::alert_lifecycle::ResolutionOutcome;
use crate::domain::value_objects::sensor::SensorKind;

/// Timing and window parameters of the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSettings {
    pub ingest_interval: Duration,
    pub sweep_interval: Duration,
    pub store_timeout: Duration,
    /// Same-sensor readings fetched as detector history.
    pub history_window: usize,
    /// Readings fetched for a score recomputation.
    pub scoring_window: usize,
    pub event_capacity: usize,
    /// Readings older than this are purged on every sweep. `None` keeps everything.
    pub retention: Option<TimeDelta>,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            ingest_interval: Duration::from_secs(30),
            sweep_interval: Duration::from_secs(300),
            store_timeout: Duration::from_secs(2),
            history_window: 100,
            scoring_window: 100,
            event_capacity: 256,
            retention: None,
        }
    }
}

/// Outcome of one ingestion tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub equipment_polled: usize,
    pub readings_ingested: usize,
    pub anomalies: usize,
    pub failures: usize,
    /// The tick stopped early because shutdown was requested.
    pub interrupted: bool,
}

/// Outcome of one score sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub scored: usize,
    pub failed: usize,
    pub purged_readings: usize,
}

/// One async mutex per equipment id, created on first use.
#[derive(Default)]
struct EquipmentLocks {
    inner: std::sync::Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl EquipmentLocks {
    fn get(&self, equipment_id: &str) -> Arc<Mutex<()>> {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(map.entry(equipment_id.to_string()).or_default())
    }
}

enum RunState {
    Stopped,
    Running {
        shutdown: watch::Sender<bool>,
        tasks: Vec<JoinHandle<()>>,
    },
}

/// Orchestrates the pipeline: telemetry → detection → storage → alerting → scoring.
///
/// Work on one equipment is serialized behind that equipment's lock; different
/// equipment proceed concurrently.
pub struct MonitorService {
    equipment: Arc<dyn EquipmentStore>,
    readings: Arc<dyn ReadingStore>,
    health: Arc<dyn HealthStore>,
    detector: Arc<dyn AnomalyDetector>,
    scorer: Arc<dyn HealthScorer>,
    alerts: AlertManager,
    source: Arc<dyn TelemetrySource>,
    settings: MonitorSettings,
    events: EventBus,
    locks: EquipmentLocks,
    run_state: Mutex<RunState>,
}

impl MonitorService {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        equipment: Arc<dyn EquipmentStore>,
        readings: Arc<dyn ReadingStore>,
        health: Arc<dyn HealthStore>,
        detector: Arc<dyn AnomalyDetector>,
        scorer: Arc<dyn HealthScorer>,
        alerts: AlertManager,
        source: Arc<dyn TelemetrySource>,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            equipment,
            readings,
            health,
            detector,
            scorer,
            alerts,
            source,
            events: EventBus::new(settings.event_capacity),
            settings,
            locks: EquipmentLocks::default(),
            run_state: Mutex::new(RunState::Stopped),
        }
    }

    #[must_use]
    pub const fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AlertEvent> {
        self.events.subscribe()
    }

    pub async fn is_running(&self) -> bool {
        matches!(*self.run_state.lock().await, RunState::Running { .. })
    }

    /// Spawn the ingestion and sweep loops. Starting a running service only warns.
    ///
    /// # Errors
    ///
    /// Returns `MonitorError::TransientStore` if the equipment store cannot be
    /// reached; the service then stays stopped.
    pub async fn start(self: &Arc<Self>) -> Result<(), MonitorError> {
        let mut state = self.run_state.lock().await;
        if matches!(*state, RunState::Running { .. }) {
            tracing::warn!("Monitor already running, start ignored");
            return Ok(());
        }

        let active = self
            .store_call(self.equipment.list_equipment(Some(EquipmentStatus::Active)))
            .await?;

        let (shutdown, rx) = watch::channel(false);
        let tasks = vec![
            tokio::spawn(Arc::clone(self).ingest_loop(rx.clone())),
            tokio::spawn(Arc::clone(self).sweep_loop(rx)),
        ];
        *state = RunState::Running { shutdown, tasks };
        tracing::info!(
            "Monitor started: {} active equipment, ingest every {}s, sweep every {}s",
            active.len(),
            self.settings.ingest_interval.as_secs(),
            self.settings.sweep_interval.as_secs()
        );
        Ok(())
    }

    /// Signal both loops and wait for them to drain. Stopping a stopped service only warns.
    pub async fn stop(&self) {
        let mut state = self.run_state.lock().await;
        match std::mem::replace(&mut *state, RunState::Stopped) {
            RunState::Stopped => tracing::warn!("Monitor not running, stop ignored"),
            RunState::Running { shutdown, tasks } => {
                if shutdown.send(true).is_err() {
                    tracing::debug!("Monitor loops already exited");
                }
                for task in tasks {
                    if let Err(e) = task.await {
                        tracing::error!("Monitor loop terminated abnormally: {e}");
                    }
                }
                tracing::info!("Monitor stopped");
            }
        }
    }

    async fn ingest_loop(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.settings.ingest_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // the first tick completes immediately
        interval.tick().await;
        let stop = shutdown.clone();

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.run_ingest_tick(Some(&stop)).await {
                        Ok(report) => tracing::debug!(
                            "Ingest tick: {} equipment, {} reading(s), {} anomal(ies), {} failure(s)",
                            report.equipment_polled,
                            report.readings_ingested,
                            report.anomalies,
                            report.failures
                        ),
                        Err(e) => tracing::warn!("Ingest tick failed: {e}"),
                    }
                }
                _ = shutdown.changed() => break,
            }
        }
        tracing::debug!("Ingest loop exited");
    }

    async fn sweep_loop(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.settings.sweep_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.sweep().await {
                        Ok(report) => tracing::info!(
                            "Sweep finished: {} scored, {} failed, {} reading(s) purged",
                            report.scored,
                            report.failed,
                            report.purged_readings
                        ),
                        Err(e) => tracing::warn!("Sweep failed: {e}"),
                    }
                }
                _ = shutdown.changed() => break,
            }
        }
        tracing::debug!("Sweep loop exited");
    }

    /// Poll the telemetry source once for every active machine and ingest
    /// whatever arrived. Per-equipment failures are counted, not returned.
    ///
    /// # Errors
    ///
    /// Returns `MonitorError::TransientStore` if the equipment list cannot be read.
    pub async fn ingest_tick(&self) -> Result<IngestReport, MonitorError> {
        self.run_ingest_tick(None).await
    }

    async fn run_ingest_tick(
        &self,
        stop: Option<&watch::Receiver<bool>>,
    ) -> Result<IngestReport, MonitorError> {
        let active = self
            .store_call(self.equipment.list_equipment(Some(EquipmentStatus::Active)))
            .await?;
        let mut report = IngestReport::default();

        for equipment in &active {
            if stop.is_some_and(|rx| *rx.borrow()) {
                tracing::debug!("Shutdown requested, ingest tick ends before {}", equipment.id);
                report.interrupted = true;
                break;
            }
            let batch = match self.source.poll(equipment) {
                Ok(batch) => batch,
                Err(e) => {
                    tracing::warn!("Telemetry poll failed for {}: {e}", equipment.id);
                    report.failures += 1;
                    continue;
                }
            };
            report.equipment_polled += 1;
            for reading in batch {
                match self.ingest(reading).await {
                    Ok(stored) => {
                        report.readings_ingested += 1;
                        if stored.is_anomaly {
                            report.anomalies += 1;
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Reading for {} rejected: {e}", equipment.id);
                        report.failures += 1;
                    }
                }
            }
        }
        Ok(report)
    }

    /// Run one reading through detection, storage, alerting and scoring.
    ///
    /// # Errors
    ///
    /// - `MonitorError::Validation` for a non-finite value or blank id
    /// - `MonitorError::NotFound` for an unknown machine
    /// - `MonitorError::StateConflict` for a retired machine
    /// - `MonitorError::TransientStore` if a store call fails or times out
    pub async fn ingest(&self, reading: NewReading) -> Result<SensorReading, MonitorError> {
        reading.validate().map_err(MonitorError::Validation)?;
        let lock = self.locks.get(&reading.equipment_id);
        let _guard = lock.lock().await;

        // status is read under the lock so a concurrent retirement is seen
        let equipment = self.find_equipment(&reading.equipment_id).await?;
        if equipment.status == EquipmentStatus::Retired {
            return Err(MonitorError::StateConflict(format!(
                "equipment {} is retired",
                equipment.id
            )));
        }

        let mut reading = reading.into_reading(Utc::now());
        let history = self
            .store_call(self.readings.recent_readings(
                &equipment.id,
                Some(reading.sensor),
                self.settings.history_window,
            ))
            .await?;
        let assessment = self.detector.assess(&reading, &history);
        reading.is_anomaly = assessment.is_anomaly;
        self.store_call(self.readings.append_reading(&reading))
            .await?;

        if assessment.is_anomaly {
            tracing::warn!(
                "Anomaly on {}: {} = {:.2} {} ({}, {} sample(s))",
                equipment.id,
                reading.sensor,
                reading.value,
                reading.unit(),
                assessment.severity,
                assessment.samples
            );
            if let Some(alert) = self.alerts.evaluate(&reading, assessment.severity).await? {
                self.publish(AlertEventKind::Created, &alert);
            }
        }

        self.recompute_locked(&equipment.id).await?;
        Ok(reading)
    }

    /// Recompute one machine's health score under its lock.
    ///
    /// Returns `None` only when scoring failed and no earlier score exists.
    ///
    /// # Errors
    ///
    /// Returns `MonitorError::NotFound` for an unknown machine, or
    /// `MonitorError::TransientStore` if a store call fails.
    pub async fn recompute(&self, equipment_id: &str) -> Result<Option<HealthScore>, MonitorError> {
        let equipment = self.find_equipment(equipment_id).await?;
        let lock = self.locks.get(&equipment.id);
        let _guard = lock.lock().await;
        self.recompute_locked(&equipment.id).await
    }

    async fn recompute_locked(&self, equipment_id: &str) -> Result<Option<HealthScore>, MonitorError> {
        let window = self
            .store_call(
                self.readings
                    .recent_readings(equipment_id, None, self.settings.scoring_window),
            )
            .await?;
        let previous = self.store_call(self.health.get_health(equipment_id)).await?;

        let score = match self
            .scorer
            .recompute(equipment_id, &window, previous.as_ref(), Utc::now())
        {
            Ok(score) => score,
            Err(e) => {
                tracing::warn!("Health score for {equipment_id} not updated: {e}");
                return Ok(previous);
            }
        };

        self.store_call(self.health.upsert_health(&score)).await?;
        if previous
            .as_ref()
            .is_none_or(|p| p.risk_level != score.risk_level)
        {
            tracing::info!(
                "{equipment_id} health {:.2} ({} risk, {})",
                score.overall_score,
                score.risk_level,
                score.trend
            );
        }
        if let Some(alert) = self.alerts.evaluate_health(&score).await? {
            self.publish(AlertEventKind::Created, &alert);
        }
        Ok(Some(score))
    }

    /// Recompute every active machine in parallel, then apply reading retention.
    ///
    /// # Errors
    ///
    /// Returns `MonitorError::TransientStore` if the equipment list cannot be read.
    pub async fn sweep(self: &Arc<Self>) -> Result<SweepReport, MonitorError> {
        let active = self
            .store_call(self.equipment.list_equipment(Some(EquipmentStatus::Active)))
            .await?;

        let mut set = JoinSet::new();
        for equipment in active {
            let service = Arc::clone(self);
            set.spawn(async move {
                let result = service.recompute(&equipment.id).await;
                (equipment.id, result)
            });
        }

        let mut report = SweepReport::default();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((_, Ok(Some(_)))) => report.scored += 1,
                Ok((id, Ok(None))) => {
                    tracing::debug!("No score available for {id}");
                    report.failed += 1;
                }
                Ok((id, Err(e))) => {
                    tracing::warn!("Sweep of {id} failed: {e}");
                    report.failed += 1;
                }
                Err(e) => {
                    tracing::error!("Sweep task aborted: {e}");
                    report.failed += 1;
                }
            }
        }

        if let Some(cutoff) = self
            .settings
            .retention
            .and_then(|retention| Utc::now().checked_sub_signed(retention))
        {
            match self
                .store_call(self.readings.purge_readings_before(cutoff))
                .await
            {
                Ok(purged) => report.purged_readings = purged,
                Err(e) => tracing::warn!("Reading retention failed: {e}"),
            }
        }
        Ok(report)
    }

    /// Register a machine. New machines start `active`.
    ///
    /// # Errors
    ///
    /// Returns `MonitorError::Validation` for missing fields or a taken id, or
    /// `MonitorError::TransientStore` if the store fails.
    pub async fn add_equipment(&self, request: NewEquipment) -> Result<Equipment, MonitorError> {
        let equipment = request
            .into_equipment(Utc::now())
            .map_err(MonitorError::Validation)?;
        self.store_call(self.equipment.insert_equipment(&equipment))
            .await?;
        tracing::info!(
            "Equipment {} registered ({}, {})",
            equipment.id,
            equipment.name,
            equipment.category
        );
        Ok(equipment)
    }

    /// # Errors
    ///
    /// Returns `MonitorError::TransientStore` if the store fails.
    pub async fn equipment_list(
        &self,
        status: Option<EquipmentStatus>,
    ) -> Result<Vec<Equipment>, MonitorError> {
        self.store_call(self.equipment.list_equipment(status)).await
    }

    /// # Errors
    ///
    /// Returns `MonitorError::NotFound` for an unknown machine.
    pub async fn get_equipment(&self, equipment_id: &str) -> Result<Equipment, MonitorError> {
        self.find_equipment(equipment_id).await
    }

    /// Change a machine's lifecycle status. Only `active` machines are polled
    /// and swept.
    ///
    /// # Errors
    ///
    /// Returns `MonitorError::NotFound` for an unknown machine,
    /// `MonitorError::StateConflict` when leaving `retired`, or
    /// `MonitorError::TransientStore` if the store fails.
    pub async fn set_equipment_status(
        &self,
        equipment_id: &str,
        status: EquipmentStatus,
    ) -> Result<Equipment, MonitorError> {
        let lock = self.locks.get(equipment_id);
        let _guard = lock.lock().await;

        let mut equipment = self.find_equipment(equipment_id).await?;
        if !equipment.status.can_transition_to(status) {
            return Err(MonitorError::StateConflict(format!(
                "equipment {equipment_id} cannot move from {} to {status}",
                equipment.status
            )));
        }
        self.store_call(self.equipment.update_equipment_status(equipment_id, status))
            .await?;
        tracing::info!("Equipment {equipment_id}: {} -> {status}", equipment.status);
        equipment.status = status;
        Ok(equipment)
    }

    /// Most recent readings of one machine, newest first.
    ///
    /// # Errors
    ///
    /// Returns `MonitorError::NotFound` for an unknown machine, or
    /// `MonitorError::TransientStore` if the store fails.
    pub async fn readings(
        &self,
        equipment_id: &str,
        sensor: Option<SensorKind>,
        limit: usize,
    ) -> Result<Vec<SensorReading>, MonitorError> {
        self.find_equipment(equipment_id).await?;
        self.store_call(self.readings.recent_readings(equipment_id, sensor, limit))
            .await
    }

    /// # Errors
    ///
    /// Returns `MonitorError::NotFound` when no score has been computed yet.
    pub async fn get_health(&self, equipment_id: &str) -> Result<HealthScore, MonitorError> {
        self.store_call(self.health.get_health(equipment_id))
            .await?
            .ok_or_else(|| MonitorError::not_found("health score", equipment_id))
    }

    /// # Errors
    ///
    /// Returns `MonitorError::TransientStore` if the store fails.
    pub async fn get_all_health(&self) -> Result<Vec<HealthScore>, MonitorError> {
        self.store_call(self.health.list_health()).await
    }

    /// # Errors
    ///
    /// Returns `MonitorError::TransientStore` if the store fails.
    pub async fn get_active_alerts(
        &self,
        equipment_id: Option<&str>,
    ) -> Result<Vec<MaintenanceAlert>, MonitorError> {
        self.alerts.active_alerts(equipment_id).await
    }

    /// # Errors
    ///
    /// Returns `MonitorError::TransientStore` if the store fails.
    pub async fn get_critical_alerts(&self) -> Result<Vec<MaintenanceAlert>, MonitorError> {
        self.alerts.critical_alerts().await
    }

    /// # Errors
    ///
    /// Returns `MonitorError::TransientStore` if the store fails.
    pub async fn get_alerts_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<MaintenanceAlert>, MonitorError> {
        self.alerts.alerts_since(since).await
    }

    /// # Errors
    ///
    /// Returns `MonitorError::NotFound`, `MonitorError::StateConflict` or
    /// `MonitorError::TransientStore` as described on [`AlertManager::acknowledge`].
    pub async fn acknowledge_alert(&self, alert_id: &str) -> Result<MaintenanceAlert, MonitorError> {
        let alert = self.alerts.acknowledge(alert_id).await?;
        self.publish(AlertEventKind::Acknowledged, &alert);
        Ok(alert)
    }

    /// # Errors
    ///
    /// Returns `MonitorError::NotFound`, `MonitorError::StateConflict` or
    /// `MonitorError::TransientStore` as described on [`AlertManager::resolve`].
    pub async fn resolve_alert(
        &self,
        alert_id: &str,
        outcome: ResolutionOutcome,
    ) -> Result<MaintenanceAlert, MonitorError> {
        let alert = self.alerts.resolve(alert_id, outcome).await?;
        self.publish(AlertEventKind::Resolved, &alert);
        Ok(alert)
    }

    /// # Errors
    ///
    /// Returns `MonitorError::TransientStore` if any store read fails.
    pub async fn get_dashboard(&self) -> Result<Dashboard, MonitorError> {
        let equipment = self.store_call(self.equipment.list_equipment(None)).await?;
        let scores = self.store_call(self.health.list_health()).await?;
        let open = self.alerts.open_alerts().await?;
        let recent = self.alerts.recent_alerts(RECENT_ALERTS).await?;
        Ok(Dashboard::build(&equipment, &scores, &open, recent, Utc::now()))
    }

    /// # Errors
    ///
    /// Returns `MonitorError::Validation` for a zero-day window, or
    /// `MonitorError::TransientStore` if the store fails.
    pub async fn get_trends(&self, days: u32) -> Result<TrendReport, MonitorError> {
        if days == 0 {
            return Err(MonitorError::Validation(
                "trend window must be at least one day".to_string(),
            ));
        }
        let scores = self.store_call(self.health.list_health()).await?;
        Ok(TrendReport::build(&scores, days, Utc::now()))
    }

    fn publish(&self, kind: AlertEventKind, alert: &MaintenanceAlert) {
        self.events
            .publish(AlertEvent::from_alert(kind, alert, Utc::now()));
    }

    async fn find_equipment(&self, equipment_id: &str) -> Result<Equipment, MonitorError> {
        self.store_call(self.equipment.get_equipment(equipment_id))
            .await?
            .ok_or_else(|| MonitorError::not_found("equipment", equipment_id))
    }

    async fn store_call<T, F>(&self, call: F) -> Result<T, MonitorError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        bounded(self.settings.store_timeout, call).await
    }
}
