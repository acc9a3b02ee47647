//! Example application for the `cu_gcode_arm` link.
//!
//! Homes the arm, runs a small pick-and-place style sequence and parks it.
//! Without arguments everything is simulated; pass `production` to drive the
//! arm on `/dev/ttyACM0`.
//!
//! ```sh
//! cargo run -p cu-gcode-arm-demo
//! cargo run -p cu-gcode-arm-demo -- production
//! ```

use cu_gcode_arm::{ArmConfig, ArmError, ArmLink, Mode, logging};
use log::{LevelFilter, debug, info, warn};

const SEQUENCE: &[&str] = &[
    "G28", // home all axes
    "G90", // absolute positioning
    "G1 X120 Y40 F3000",
    "G1 Z10 F1200",
    "M3", // close gripper
    "G1 Z60 F1200",
    "G1 X-80 Y90 F3000",
    "M5", // open gripper
    "G28",
];

fn main() {
    if let Err(e) = logging::init(LevelFilter::Debug) {
        eprintln!("Logger already set: {e}");
    }

    let selector = std::env::args().nth(1).unwrap_or_else(|| "development".to_string());
    let mode = Mode::from_selector(&selector);
    let config = ArmConfig::default().with_mode(mode);

    let mut arm = ArmLink::from_config(&config).unwrap_or_else(|e| {
        print_setup_help(&e);
        std::process::exit(1);
    });

    debug!("Starting {mode} sequence ({} commands).", SEQUENCE.len());
    let mut missed = 0;
    for command in SEQUENCE {
        if arm.send(command) {
            info!("{command} -> OK");
        } else {
            warn!("{command} -> not acknowledged");
            missed += 1;
        }
    }

    if missed > 0 {
        warn!("{missed} command(s) were not acknowledged.");
        std::process::exit(1);
    }
    info!("Sequence complete.");
}

fn print_setup_help(e: &ArmError) {
    eprintln!("ERROR: {}\n", e);
    eprintln!("Check: arm USB cable plugged in? Device path /dev/ttyACM0 correct?");
    eprintln!("       Permission? Try: sudo usermod -aG dialout $USER");
}
