use cu_gcode_arm::{ArmConfig, ArmError, ArmLink, LinkState, Mode};
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::sync::{Mutex, Once};
use tempfile::TempDir;

/// Records every log line so tests can count what the link emitted.
struct CaptureLogger {
    lines: Mutex<Vec<(Level, String)>>,
}

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        self.lines
            .lock()
            .unwrap()
            .push((record.level(), record.args().to_string()));
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger {
    lines: Mutex::new(Vec::new()),
};
static INIT: Once = Once::new();

fn capture_logs() {
    INIT.call_once(|| {
        log::set_logger(&LOGGER).unwrap();
        log::set_max_level(LevelFilter::Trace);
    });
}

/// Log lines at `level` mentioning `needle`.
fn logged(level: Level, needle: &str) -> usize {
    LOGGER
        .lines
        .lock()
        .unwrap()
        .iter()
        .filter(|(l, line)| *l == level && line.contains(needle))
        .count()
}

fn missing_device(dir: &TempDir) -> ArmConfig {
    let port = dir.path().join("ttyACM-missing");
    ArmConfig::default()
        .with_mode(Mode::Production)
        .with_port(port.to_string_lossy())
}

#[test]
fn development_mode_simulates_g28() {
    capture_logs();
    let mode = Mode::from_selector("development");
    let mut arm = ArmLink::new(mode, &ArmConfig::default()).unwrap();

    assert_eq!(arm.state(), LinkState::Unopened);
    assert!(arm.send("G28 ; development scenario"));
    assert!(arm.port().is_none());
    assert_eq!(logged(Level::Debug, "G28 ; development scenario"), 1);
}

#[test]
fn unknown_selectors_behave_as_simulated() {
    for selector in ["", "dev", "PRODUCTION", "production "] {
        let mut arm = ArmLink::new(Mode::from_selector(selector), &ArmConfig::default()).unwrap();
        assert_eq!(arm.mode(), Mode::Simulated);
        assert!(arm.send("G1 X10"));
        assert!(arm.port().is_none());
    }
}

#[test]
fn missing_device_fails_construction_and_logs_once() {
    capture_logs();
    let dir = TempDir::new().unwrap();
    let config = missing_device(&dir);

    match ArmLink::new(Mode::Production, &config) {
        Err(ArmError::ConnectionFailed { port, .. }) => assert_eq!(port, config.port),
        Err(other) => panic!("expected ConnectionFailed, got {other}"),
        Ok(_) => panic!("a missing device must not produce a link"),
    }
    assert_eq!(logged(Level::Error, &config.port), 1);
}

#[test]
fn swallowed_connection_failure_degrades() {
    let dir = TempDir::new().unwrap();
    let config = missing_device(&dir);

    let mut arm = ArmLink::new_or_degraded(Mode::Production, &config);
    assert_eq!(arm.mode(), Mode::Production);
    assert_eq!(arm.state(), LinkState::Degraded);
    assert!(arm.port().is_none());
    assert!(arm.send("G1 X10"));
}

#[test]
fn config_file_drives_the_link() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("arm.json");
    let config = missing_device(&dir);
    config.save(&path).unwrap();

    let loaded = ArmConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
    assert!(matches!(
        ArmLink::from_config(&loaded),
        Err(ArmError::ConnectionFailed { .. })
    ));
}

#[test]
fn bad_config_files_are_reported() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.json");
    assert!(matches!(ArmConfig::load(&missing), Err(ArmError::Config { .. })));

    let garbled = dir.path().join("garbled.json");
    std::fs::write(&garbled, r#"{ "mode": "turbo" }"#).unwrap();
    assert!(matches!(
        ArmConfig::load(&garbled),
        Err(ArmError::ConfigFormat { .. })
    ));
}

/// Reads from the host side of a pty until a full line has arrived.
#[cfg(unix)]
fn read_wire_line(master: &mut serialport::TTYPort) -> String {
    use std::io::Read;

    let mut wire = Vec::new();
    let mut buf = [0u8; 64];
    while !wire.ends_with(b"\n") {
        let n = master.read(&mut buf).unwrap();
        wire.extend_from_slice(&buf[..n]);
    }
    String::from_utf8(wire).unwrap()
}

#[cfg(unix)]
#[test]
fn production_link_opens_settles_and_handshakes() {
    use serialport::{SerialPort, TTYPort};
    use std::io::Write;
    use std::time::{Duration, Instant};

    capture_logs();
    let (mut master, slave) = TTYPort::pair().unwrap();
    let device = slave.name().unwrap();
    drop(slave);
    master.set_timeout(Duration::from_secs(2)).unwrap();

    let mut config = ArmConfig::default()
        .with_mode(Mode::Production)
        .with_port(device.clone());
    config.settle_delay_ms = 300;
    config.read_timeout_ms = 200;

    let started = Instant::now();
    let mut arm = ArmLink::from_config(&config).unwrap();
    assert!(started.elapsed() >= config.settle_delay());
    assert_eq!(arm.state(), LinkState::Open);
    assert_eq!(logged(Level::Info, &format!("Connected to arm on {device}")), 1);

    master.write_all(b"OK\r\n").unwrap();
    assert!(arm.send("G1 X10"));
    assert_eq!(read_wire_line(&mut master), "G1 X10\n");

    let started = Instant::now();
    assert!(!arm.send("G28"));
    assert!(started.elapsed() >= Duration::from_millis(150));
    assert_eq!(read_wire_line(&mut master), "G28\n");

    assert_eq!(logged(Level::Error, &device), 0);
    assert_eq!(logged(Level::Error, "Arm communication error"), 0);
}
