pub mod alerts;
pub mod daemon;
pub mod equipment;
pub mod health;
pub mod ingest;
pub mod status;
pub mod trends;

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;
    use std::time::Duration;

    use crate::application::services::alerts::AlertManager;
    use crate::application::services::monitor::{MonitorService, MonitorSettings};
    use crate::domain::analysis::anomaly::StatisticalDetector;
    use crate::domain::analysis::scoring::WindowHealthScorer;
    use crate::domain::entities::equipment::{EquipmentCategory, NewEquipment};
    use crate::infrastructure::persistence::in_memory_store::InMemoryStore;
    use crate::infrastructure::telemetry::simulator::{SimulatedTelemetry, SimulatorSettings};

    /// Service over an in-memory store with a silent simulator.
    pub fn service() -> Arc<MonitorService> {
        let store = Arc::new(InMemoryStore::new());
        let settings = MonitorSettings {
            ingest_interval: Duration::from_secs(3600),
            sweep_interval: Duration::from_secs(3600),
            ..MonitorSettings::default()
        };
        Arc::new(MonitorService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            Arc::new(StatisticalDetector::default()),
            Arc::new(WindowHealthScorer::default()),
            AlertManager::new(store, settings.store_timeout),
            Arc::new(SimulatedTelemetry::new(&SimulatorSettings {
                seed: Some(1),
                arrival_probability: 0.0,
                ..SimulatorSettings::default()
            })),
            settings,
        ))
    }

    pub fn generator(id: &str) -> NewEquipment {
        NewEquipment {
            id: Some(id.into()),
            name: format!("Generator {id}"),
            category: Some(EquipmentCategory::Generator),
            serial_number: format!("GEN-{id}"),
            location: "Yard B".into(),
            ..NewEquipment::default()
        }
    }
}
