use async_trait::async_trait;
use ejp_knx::config::{Config, EjpConfig, KnxConfig, Zone};
use ejp_knx::ejp::EjpSignals;
use ejp_knx::error::{EjpError, Result};
use ejp_knx::knx::{BusConnector, GroupBus, GroupEvent};
use ejp_knx::runner::{self, StatusSource};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::NamedTempFile;

#[derive(Default)]
struct RecordingBus {
    sent: Vec<GroupEvent>,
    attempts: usize,
    fail_on_attempt: Option<usize>,
    fail_close: bool,
    closed: usize,
}

#[async_trait]
impl GroupBus for RecordingBus {
    async fn send(&mut self, event: GroupEvent) -> Result<()> {
        self.attempts += 1;
        if self.fail_on_attempt == Some(self.attempts) {
            return Err(EjpError::transport("write rejected"));
        }
        self.sent.push(event);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.closed += 1;
        if self.fail_close {
            return Err(EjpError::transport("close failed"));
        }
        Ok(())
    }
}

struct FixedStatus(Result<EjpSignals>);

#[async_trait]
impl StatusSource for FixedStatus {
    async fn get_status(&self) -> Result<EjpSignals> {
        match &self.0 {
            Ok(s) => Ok(*s),
            Err(e) => Err(EjpError::network(e.to_string())),
        }
    }
}

fn config() -> Config {
    Config {
        version: 1,
        ejp: EjpConfig {
            url: "http://127.0.0.1:9/ejp".to_string(),
            date_param: "Date_a_remonter".to_string(),
            user_agent: "test".to_string(),
            zone: Zone::EjpOuest,
        },
        knx: KnxConfig {
            ip: "127.0.0.1".to_string(),
            port: 3671,
            preavis_group: "1/2/3".to_string(),
            asserv_group: "1/2/4".to_string(),
        },
    }
}

fn ok(preavis: bool, asserv: bool) -> FixedStatus {
    FixedStatus(Ok(EjpSignals { preavis, asserv }))
}

#[tokio::test]
async fn writes_preavis_then_asserv_and_closes() {
    let mut bus = RecordingBus::default();
    runner::run(&config(), &mut bus, &ok(true, false))
        .await
        .unwrap();

    assert_eq!(bus.sent.len(), 2);
    assert_eq!(bus.sent[0].destination.to_string(), "1/2/3");
    assert_eq!(bus.sent[0].data, vec![0x01]);
    assert_eq!(bus.sent[1].destination.to_string(), "1/2/4");
    assert_eq!(bus.sent[1].data, vec![0x00]);
    assert_eq!(bus.closed, 1);
}

#[tokio::test]
async fn first_send_failure_skips_second() {
    let mut bus = RecordingBus {
        fail_on_attempt: Some(1),
        ..Default::default()
    };
    let err = runner::run(&config(), &mut bus, &ok(true, true))
        .await
        .unwrap_err();

    assert!(matches!(err, EjpError::Transport { .. }));
    assert_eq!(err.to_string(), "Transport error: write rejected");
    assert_eq!(bus.attempts, 1);
    assert!(bus.sent.is_empty());
    assert_eq!(bus.closed, 1);
}

#[tokio::test]
async fn second_send_failure_is_reported() {
    let mut bus = RecordingBus {
        fail_on_attempt: Some(2),
        ..Default::default()
    };
    let err = runner::run(&config(), &mut bus, &ok(false, true))
        .await
        .unwrap_err();

    assert!(matches!(err, EjpError::Transport { .. }));
    assert_eq!(bus.sent.len(), 1);
    assert_eq!(bus.closed, 1);
}

#[tokio::test]
async fn status_failure_sends_nothing_but_closes() {
    let mut bus = RecordingBus::default();
    let source = FixedStatus(Err(EjpError::network("timed out")));
    let err = runner::run(&config(), &mut bus, &source)
        .await
        .unwrap_err();

    assert!(matches!(err, EjpError::Network { .. }));
    assert_eq!(bus.attempts, 0);
    assert_eq!(bus.closed, 1);
}

#[tokio::test]
async fn bad_preavis_address_stops_before_any_write() {
    let mut cfg = config();
    cfg.knx.preavis_group = "preavis".to_string();
    let mut bus = RecordingBus::default();
    let err = runner::run(&cfg, &mut bus, &ok(true, true))
        .await
        .unwrap_err();

    assert!(matches!(err, EjpError::AddressFormat { .. }));
    assert_eq!(bus.attempts, 0);
    assert_eq!(bus.closed, 1);
}

#[tokio::test]
async fn step_error_wins_over_close_error() {
    let mut bus = RecordingBus {
        fail_on_attempt: Some(1),
        fail_close: true,
        ..Default::default()
    };
    let err = runner::run(&config(), &mut bus, &ok(true, true))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Transport error: write rejected");

    let mut bus = RecordingBus {
        fail_close: true,
        ..Default::default()
    };
    let err = runner::run(&config(), &mut bus, &ok(true, true))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Transport error: close failed");
    assert_eq!(bus.sent.len(), 2);
}

/// Connector handing out recording buses and counting connections
#[derive(Default)]
struct CountingConnector {
    connects: AtomicUsize,
    fail: bool,
}

#[async_trait]
impl BusConnector for CountingConnector {
    type Bus = RecordingBus;

    async fn connect(&self, _config: &KnxConfig) -> Result<RecordingBus> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(EjpError::transport("router unreachable"));
        }
        Ok(RecordingBus::default())
    }
}

/// Status source counting how often it is queried
struct CountingStatus<'a> {
    queries: &'a AtomicUsize,
}

#[async_trait]
impl StatusSource for CountingStatus<'_> {
    async fn get_status(&self) -> Result<EjpSignals> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(EjpSignals {
            preavis: true,
            asserv: false,
        })
    }
}

const CONFIG_WITHOUT_ZONE: &str = r#"
version: 1
ejp:
  url: https://example.org/searchTempoStore
  userAgent: ejp-knx-test
knx:
  ip: 127.0.0.1
  port: 3671
  preavisGroup: 1/2/3
  asservGroup: 1/2/4
"#;

#[tokio::test]
async fn config_without_zone_stops_before_network_and_bus() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(CONFIG_WITHOUT_ZONE.as_bytes()).unwrap();
    let path = file.path().to_path_buf();

    let connector = CountingConnector::default();
    let built = AtomicUsize::new(0);
    let queries = AtomicUsize::new(0);

    let err = runner::run_with(
        || Config::from_file(&path),
        &connector,
        |_: &EjpConfig| {
            built.fetch_add(1, Ordering::SeqCst);
            Ok(CountingStatus { queries: &queries })
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, EjpError::Parse { .. }), "got {:?}", err);
    assert!(err.to_string().contains("zone"));
    assert_eq!(built.load(Ordering::SeqCst), 0);
    assert_eq!(connector.connects.load(Ordering::SeqCst), 0);
    assert_eq!(queries.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn source_build_failure_skips_bus_connect() {
    let connector = CountingConnector::default();
    let err = runner::run_with(
        || Ok(config()),
        &connector,
        |_: &EjpConfig| -> Result<FixedStatus> { Err(EjpError::network("no TLS backend")) },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, EjpError::Network { .. }));
    assert_eq!(connector.connects.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn connect_failure_skips_status_query() {
    let connector = CountingConnector {
        fail: true,
        ..Default::default()
    };
    let queries = AtomicUsize::new(0);
    let err = runner::run_with(
        || Ok(config()),
        &connector,
        |_: &EjpConfig| Ok(CountingStatus { queries: &queries }),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, EjpError::Transport { .. }));
    assert_eq!(connector.connects.load(Ordering::SeqCst), 1);
    assert_eq!(queries.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn full_run_connects_once_and_queries_once() {
    let connector = CountingConnector::default();
    let queries = AtomicUsize::new(0);
    runner::run_with(
        || Ok(config()),
        &connector,
        |ejp: &EjpConfig| {
            assert_eq!(ejp.zone, Zone::EjpOuest);
            Ok(CountingStatus { queries: &queries })
        },
    )
    .await
    .unwrap();

    assert_eq!(connector.connects.load(Ordering::SeqCst), 1);
    assert_eq!(queries.load(Ordering::SeqCst), 1);
}
