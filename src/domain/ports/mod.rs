pub mod notifier;
pub mod store;
pub mod telemetry;

pub use notifier::{NotificationError, Notifier};
pub use store::{AlertQuery, AlertStore, EquipmentStore, HealthStore, ReadingStore, StoreError};
pub use telemetry::{TelemetryError, TelemetrySource};
