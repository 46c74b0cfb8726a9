// Motor actuation control core
//
// Provides:
// - Shared target/config record guarded by one lock
// - Command intake for any number of concurrent transports
// - Staleness watchdog
// - Slew-limited ramp with kickstart and steering assist window
// - Current -> dual-direction duty mapping
// - Config update path (validate, persist, install)

pub mod actuator;
mod intake;
pub mod ramp;
mod settings;
mod state;
mod watchdog;

pub use intake::{CommandIntake, CommandSource};
pub use ramp::{AxisPhase, RampEngine, RampState};
pub use settings::ConfigService;
pub use state::{ControlSnapshot, SharedControl};
pub use watchdog::{SafetyWatchdog, WatchdogVerdict};
