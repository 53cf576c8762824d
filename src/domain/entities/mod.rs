pub mod alert;
pub mod equipment;
pub mod event;
pub mod health;
pub mod reading;

pub use alert::MaintenanceAlert;
pub use equipment::{Equipment, EquipmentCategory, EquipmentStatus, NewEquipment};
pub use event::{AlertEvent, AlertEventKind};
pub use health::{ComponentScores, HealthScore};
pub use reading::{NewReading, SensorReading};
