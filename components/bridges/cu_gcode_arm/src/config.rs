//! Link configuration.
//!
//! The defaults match the arm firmware: an Arduino-class board enumerating
//! as `/dev/ttyACM0`, talking at 115200 baud, which resets when the port is
//! opened and needs about two seconds before it accepts commands.
//!
//! A config can be kept as JSON next to the application:
//!
//! ```json
//! {
//!   "mode": "production",
//!   "port": "/dev/ttyACM0",
//!   "baud_rate": 115200,
//!   "read_timeout_ms": 1000,
//!   "settle_delay_ms": 2000
//! }
//! ```
//! Missing keys take their default.

use crate::error::{ArmError, ArmResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_PORT: &str = "/dev/ttyACM0";
pub const DEFAULT_BAUD_RATE: u32 = 115_200;
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 1_000;
/// Time given to the microcontroller to finish its boot-time reset.
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 2_000;

/// Operating mode of a link, fixed for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// No hardware: every command is logged and accepted.
    #[default]
    #[serde(alias = "development")]
    Simulated,
    /// Real serial link with the OK handshake.
    Production,
}

impl Mode {
    /// Lenient selector: only the exact string `"production"` selects
    /// [`Mode::Production`], anything else falls back to [`Mode::Simulated`].
    ///
    /// Use [`str::parse`] instead when a typo should be an error.
    pub fn from_selector(selector: &str) -> Self {
        if selector == "production" {
            Self::Production
        } else {
            Self::Simulated
        }
    }
}

impl FromStr for Mode {
    type Err = ArmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "production" => Ok(Self::Production),
            "simulated" | "development" => Ok(Self::Simulated),
            other => Err(ArmError::UnknownMode(other.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simulated => f.write_str("simulated"),
            Self::Production => f.write_str("production"),
        }
    }
}

/// Serial endpoint settings and operating mode for an [`crate::ArmLink`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmConfig {
    pub mode: Mode,
    pub port: String,
    pub baud_rate: u32,
    pub read_timeout_ms: u64,
    pub settle_delay_ms: u64,
}

impl Default for ArmConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            port: DEFAULT_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
        }
    }
}

impl ArmConfig {
    pub fn load(path: &Path) -> ArmResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ArmError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ArmError::ConfigFormat {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> ArmResult<()> {
        let json = serde_json::to_string_pretty(self).map_err(|source| ArmError::ConfigFormat {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(|source| ArmError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_port(mut self, port: impl Into<String>) -> Self {
        self.port = port.into();
        self
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}
