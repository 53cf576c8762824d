pub mod alerts;
pub mod events;
pub mod monitor;
pub mod reporting;

pub use alerts::AlertManager;
pub use events::{spawn_event_relay, EventBus, EventRelay};
pub use monitor::{IngestReport, MonitorService, MonitorSettings, SweepReport};
pub use reporting::{Dashboard, TrendReport};
