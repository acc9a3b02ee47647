//! The arm link: command framing and the `OK` acknowledgement handshake.
//!
//! Wire protocol, one command at a time:
//!
//! ```text
//! host -> arm : <command>\n
//! arm  -> host: OK\n          (anything else means "not confirmed")
//! ```
//!
//! A link is either simulated (no port at all, every command is accepted)
//! or production (a serial port opened once at construction). A production
//! link whose port failed to open can still be kept around in a degraded
//! state through [`ArmLink::new_or_degraded`]; it then behaves like a
//! simulated one.

use crate::config::{ArmConfig, Mode};
use crate::error::{ArmError, ArmResult};
use log::{debug, error, info, warn};
use serialport::SerialPort;
use std::io::{self, BufRead, BufReader, Read, Write};

/// Acknowledgement token sent back by the firmware after each command.
pub const ACK: &str = "OK";

/// Port type used by links opened on a real serial device.
pub type SerialConnection = Box<dyn SerialPort>;

/// Observable state of a link. It never changes after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Simulated link, no port.
    Unopened,
    /// Production link with a live port.
    Open,
    /// Production link whose port could not be opened.
    Degraded,
}

/// Exclusive owner of the connection to one arm.
pub struct ArmLink<P = SerialConnection> {
    mode: Mode,
    connection: Option<BufReader<P>>,
}

impl ArmLink<SerialConnection> {
    /// Builds a link in `mode`.
    ///
    /// In production mode this opens `config.port`, then blocks for
    /// `config.settle_delay_ms` while the board reboots. A port that cannot
    /// be opened is logged and returned as [`ArmError::ConnectionFailed`].
    pub fn new(mode: Mode, config: &ArmConfig) -> ArmResult<Self> {
        match mode {
            Mode::Simulated => Ok(Self::simulated()),
            Mode::Production => {
                let port = open_port(config)?;
                Ok(Self::with_port(port))
            }
        }
    }

    /// Same as [`ArmLink::new`] with the mode taken from `config`.
    pub fn from_config(config: &ArmConfig) -> ArmResult<Self> {
        Self::new(config.mode, config)
    }

    /// Like [`ArmLink::new`], but a production link whose port fails to open
    /// is returned in [`LinkState::Degraded`] instead of as an error.
    pub fn new_or_degraded(mode: Mode, config: &ArmConfig) -> Self {
        match Self::new(mode, config) {
            Ok(link) => link,
            Err(_) => {
                warn!(
                    "Continuing without arm on {}: commands will not reach hardware",
                    config.port
                );
                Self {
                    mode: Mode::Production,
                    connection: None,
                }
            }
        }
    }

    pub fn simulated() -> Self {
        warn!("Simulated mode: arm commands are logged, not sent");
        Self {
            mode: Mode::Simulated,
            connection: None,
        }
    }
}

impl<P: Read + Write> ArmLink<P> {
    /// Production link over an already opened transport. No settle delay is
    /// applied.
    pub fn with_port(port: P) -> Self {
        Self {
            mode: Mode::Production,
            connection: Some(BufReader::new(port)),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn state(&self) -> LinkState {
        match (self.mode, &self.connection) {
            (Mode::Simulated, _) => LinkState::Unopened,
            (Mode::Production, Some(_)) => LinkState::Open,
            (Mode::Production, None) => LinkState::Degraded,
        }
    }

    /// The underlying transport, if the link owns one.
    pub fn port(&self) -> Option<&P> {
        self.connection.as_ref().map(BufReader::get_ref)
    }

    /// Sends one command and reports whether it was confirmed.
    ///
    /// With a live port, `command` is written with a trailing `\n` and the
    /// reply line is checked against [`ACK`]. Without one (simulated or
    /// degraded), the command is only logged and the call returns `true`.
    pub fn send(&mut self, command: &str) -> bool {
        let Some(connection) = self.connection.as_mut() else {
            debug!("[SIM] {command}");
            return true;
        };

        debug!("[TX] {command}");
        if let Err(e) = write_line(connection.get_mut(), command) {
            error!("Arm communication error: {e}");
            return false;
        }
        self.await_ack()
    }

    /// Reads one reply line and checks it against [`ACK`].
    ///
    /// Read errors are logged and reported as `false`. A timeout keeps
    /// whatever arrived before it, so a silent arm reads as an empty line.
    fn await_ack(&mut self) -> bool {
        let Some(connection) = self.connection.as_mut() else {
            return false;
        };

        let mut line = Vec::new();
        match connection.read_until(b'\n', &mut line) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::TimedOut => {}
            Err(e) => {
                error!("Arm communication error: {e}");
                return false;
            }
        }

        match std::str::from_utf8(&line) {
            Ok(reply) => reply.trim() == ACK,
            Err(_) => false,
        }
    }
}

fn open_port(config: &ArmConfig) -> ArmResult<SerialConnection> {
    let port = serialport::new(config.port.as_str(), config.baud_rate)
        .timeout(config.read_timeout())
        .open()
        .map_err(|source| {
            error!("Arm connection failed on {}: {source}", config.port);
            ArmError::ConnectionFailed {
                port: config.port.clone(),
                source,
            }
        })?;

    std::thread::sleep(config.settle_delay());
    info!("Connected to arm on {}", config.port);
    Ok(port)
}

fn write_line<W: Write>(port: &mut W, command: &str) -> io::Result<()> {
    let frame = format!("{command}\n");
    port.write_all(frame.as_bytes())?;
    port.flush()
}

/// Names of the serial devices currently visible on this host.
pub fn available_ports() -> ArmResult<Vec<String>> {
    let ports = serialport::available_ports().map_err(ArmError::PortDiscovery)?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}
