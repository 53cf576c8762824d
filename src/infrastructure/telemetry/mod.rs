pub mod simulator;

pub use simulator::{SimulatedTelemetry, SimulatorSettings};
