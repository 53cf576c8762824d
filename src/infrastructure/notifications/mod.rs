pub mod composite;
pub mod log_file;
pub mod terminal;

pub use composite::CompositeNotifier;
pub use log_file::LogFileNotifier;
pub use terminal::TerminalNotifier;
