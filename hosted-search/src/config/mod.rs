//! Configuration for the hosted search runner.

mod logging;
mod settings;

pub use logging::LogFormat;
pub use settings::Settings;
