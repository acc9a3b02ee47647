//! Host-side link to a G-code driven robotic arm.
//!
//! The arm's microcontroller takes one ASCII command per line and answers
//! each with a single `OK` line. [`ArmLink`] hides whether that exchange
//! happens over a real serial port or is only simulated, so the same caller
//! code runs on a development machine and on the robot.
//!
//! ```no_run
//! use cu_gcode_arm::{ArmConfig, ArmLink, Mode};
//!
//! let config = ArmConfig::default().with_mode(Mode::Production);
//! let mut arm = ArmLink::from_config(&config)?;
//! if !arm.send("G28") {
//!     eprintln!("homing was not acknowledged");
//! }
//! # Ok::<(), cu_gcode_arm::ArmError>(())
//! ```
//!
//! The library only emits through the `log` facade; binaries install a
//! logger once with [`logging::init`].

pub mod config;
pub mod error;
pub mod link;
pub mod logging;

pub use config::{ArmConfig, Mode};
pub use error::{ArmError, ArmResult};
pub use link::{ACK, ArmLink, LinkState, SerialConnection, available_ports};
