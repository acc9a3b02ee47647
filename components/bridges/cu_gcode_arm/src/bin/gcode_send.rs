//! Sends G-code commands to the arm and waits for each acknowledgement.
//!
//! ```sh
//! gcode-send G28 "G1 X10 Y20"                     # simulated, nothing is opened
//! gcode-send --mode production -v G28             # real arm on /dev/ttyACM0
//! gcode-send --mode production --port /dev/ttyACM1 --retries 2 < pick.gcode
//! gcode-send --list-ports
//! ```
//!
//! Without positional commands, commands are read from stdin one per line.
//! Blank lines and `;` comments are skipped. The exit status is non-zero if
//! any command went unconfirmed.

use anyhow::Context;
use clap::{ArgAction, Parser};
use cu_gcode_arm::{ArmConfig, ArmLink, Mode, available_ports, logging};
use log::{error, info, warn};
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "gcode-send", about = "Send G-code commands to a serial robotic arm")]
struct Cli {
    /// JSON link configuration; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// `simulated` (or `development`) or `production`.
    #[arg(long)]
    mode: Option<Mode>,

    /// Serial device of the arm.
    #[arg(long)]
    port: Option<String>,

    #[arg(long)]
    baud: Option<u32>,

    /// Extra attempts for a command that is not acknowledged.
    #[arg(long, default_value_t = 0)]
    retries: u32,

    /// Print the serial devices found on this host and exit.
    #[arg(long)]
    list_ports: bool,

    /// -v for info, -vv for every command sent.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Commands to send. Read from stdin when empty.
    commands: Vec<String>,
}

impl Cli {
    fn link_config(&self) -> anyhow::Result<ArmConfig> {
        let mut config = match &self.config {
            Some(path) => ArmConfig::load(path)?,
            None => ArmConfig::default(),
        };
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(port) = &self.port {
            config.port = port.clone();
        }
        if let Some(baud) = self.baud {
            config.baud_rate = baud;
        }
        Ok(config)
    }
}

/// Keeps the command part of each line, dropping `;` comments and blanks.
fn script_commands(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.split(';').next().unwrap_or_default().trim())
        .filter(|command| !command.is_empty())
        .map(str::to_string)
        .collect()
}

fn send_with_retries<P: io::Read + io::Write>(
    arm: &mut ArmLink<P>,
    command: &str,
    retries: u32,
) -> bool {
    for attempt in 0..=retries {
        if attempt > 0 {
            warn!("Retrying '{command}' ({attempt}/{retries})");
        }
        if arm.send(command) {
            return true;
        }
    }
    false
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    logging::init(logging::level_for_verbosity(cli.verbose)).context("logger setup")?;

    if cli.list_ports {
        for port in available_ports()? {
            println!("{port}");
        }
        return Ok(ExitCode::SUCCESS);
    }

    let config = cli.link_config()?;
    let mut arm = ArmLink::from_config(&config)
        .with_context(|| format!("cannot start {} link", config.mode))?;

    let commands = if cli.commands.is_empty() {
        let mut text = String::new();
        for line in io::stdin().lock().lines() {
            text.push_str(&line.context("reading commands from stdin")?);
            text.push('\n');
        }
        script_commands(&text)
    } else {
        cli.commands.clone()
    };

    let mut unconfirmed = 0usize;
    for command in &commands {
        if send_with_retries(&mut arm, command, cli.retries) {
            info!("{command}: OK");
        } else {
            error!("{command}: not acknowledged");
            unconfirmed += 1;
        }
    }

    if unconfirmed > 0 {
        error!("{unconfirmed} of {} commands were not acknowledged", commands.len());
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
