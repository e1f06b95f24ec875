//! Startup sequencing and process lifecycle tests.

use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;

use ddns_agent::config::loader::load_config;
use ddns_agent::config::password::{hash_password, verify_password};
use ddns_agent::config::validation::parse_listen_address;
use ddns_agent::config::{Cli, DdnsConfig, ProcessConfig};
use ddns_agent::http::WebServer;
use ddns_agent::lifecycle::{
    drive, launch_with, prepare, Bootstrap, Exit, Prepared, ServiceState, Shutdown, WebSupervisor,
};
use ddns_agent::net::ConnectivityGate;
use ddns_agent::observability::{Lang, LogBuffer};
use ddns_agent::scheduler::UpdateScheduler;

mod common;

fn process_with(config_file: &std::path::Path) -> ProcessConfig {
    ProcessConfig {
        config_file: Some(config_file.to_path_buf()),
        listen_address: "127.0.0.1:0".into(),
        ..ProcessConfig::default()
    }
}

fn expect_exit(prepared: Prepared) -> Exit {
    match prepared {
        Prepared::Exit(exit) => exit,
        Prepared::Ready(_) => panic!("expected startup to stop"),
    }
}

#[test]
fn test_invalid_listen_address_stops_before_config_is_touched() {
    let (_dir, path) = common::temp_config_path();
    for bad in ["no-port", ":notaport", "127.0.0.1:99999"] {
        let process = ProcessConfig {
            listen_address: bad.into(),
            ..process_with(&path)
        };
        let exit = expect_exit(prepare(&process, &mut Vec::new()));
        assert_eq!(exit, Exit::Failure(1), "{bad}");
    }
    assert!(!path.exists());
}

#[test]
fn test_version_writes_only_version() {
    let (_dir, path) = common::temp_config_path();
    let process = ProcessConfig {
        print_version: true,
        version: "v1.2.3".into(),
        ..process_with(&path)
    };
    let mut out = Vec::new();
    assert_eq!(expect_exit(prepare(&process, &mut out)), Exit::Success);
    assert_eq!(out, b"v1.2.3\n");
    assert!(!path.exists());
}

#[test]
fn test_reset_password_with_config() {
    let config = DdnsConfig {
        username: "admin".into(),
        password: hash_password("old-secret"),
        ..DdnsConfig::default()
    };
    let (_dir, path) = common::write_temp_config(&toml::to_string(&config).unwrap());

    let process = ProcessConfig {
        reset_password: Some("new-secret".into()),
        ..process_with(&path)
    };
    assert_eq!(expect_exit(prepare(&process, &mut Vec::new())), Exit::Success);

    let saved = load_config(&path).unwrap();
    assert_eq!(saved.username, "admin");
    assert!(verify_password("new-secret", &saved.password));
    assert!(!verify_password("old-secret", &saved.password));
}

#[test]
fn test_reset_password_without_config_creates_nothing() {
    let (_dir, path) = common::temp_config_path();
    let process = ProcessConfig {
        reset_password: Some("whatever".into()),
        ..process_with(&path)
    };
    assert_eq!(expect_exit(prepare(&process, &mut Vec::new())), Exit::Success);
    assert!(!path.exists());
}

#[test]
fn test_unparsable_config_is_fatal() {
    let (_dir, path) = common::write_temp_config("dns = [[[ not toml");
    let exit = expect_exit(prepare(&process_with(&path), &mut Vec::new()));
    assert_eq!(exit, Exit::Failure(1));
}

#[test]
fn test_invalid_custom_dns_is_fatal() {
    let (_dir, path) = common::temp_config_path();
    let process = ProcessConfig {
        custom_dns: Some("not-a-dns-server".into()),
        ..process_with(&path)
    };
    assert_eq!(expect_exit(prepare(&process, &mut Vec::new())), Exit::Failure(1));
}

#[test]
fn test_prepare_migrates_legacy_config() {
    let legacy = r#"
lang = "zh-CN"
dns_provider = "callback"

[ipv4]
enable = true
url = "https://ip.example.com"
domains = "a.example.com,b.example.com"
"#;
    let (_dir, path) = common::write_temp_config(legacy);
    let process = ProcessConfig {
        web_enabled: false,
        ..process_with(&path)
    };

    let boot = match prepare(&process, &mut Vec::new()) {
        Prepared::Ready(boot) => boot,
        Prepared::Exit(exit) => panic!("unexpected exit {exit:?}"),
    };
    assert_eq!(boot.lang, Lang::Zh);
    assert!(!boot.web_enabled);
    assert_eq!(boot.interval, Duration::from_secs(300));

    let saved = load_config(&path).unwrap();
    assert!(saved.ipv4.is_none());
    assert_eq!(saved.lang, "zh");
    assert_eq!(saved.dns.len(), 1);
    assert_eq!(
        saved.dns[0].ipv4.domains,
        vec!["a.example.com".to_string(), "b.example.com".to_string()]
    );
}

#[test]
fn test_missing_config_is_not_created_by_startup() {
    let (_dir, path) = common::temp_config_path();
    assert!(matches!(
        prepare(&process_with(&path), &mut Vec::new()),
        Prepared::Ready(_)
    ));
    assert!(!path.exists());
}

#[tokio::test(start_paused = true)]
async fn test_gate_blocks_first_cycle_until_network_is_up() {
    let probe = common::FlakyProbe::new(3);
    let probes = probe.probes.clone();
    let cycle = common::CountingCycle::new(probes.clone());

    let gate = ConnectivityGate::new(probe, ["a:443", "b:443"]);
    let scheduler = UpdateScheduler::new(Duration::from_secs(60), cycle.clone());

    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(120)).await;
        trigger.trigger(1);
    });

    let exit = drive(gate, scheduler, signal).await;

    assert_eq!(exit, Exit::Failure(1));
    assert_eq!(probes.load(Ordering::SeqCst), 4);
    assert_eq!(cycle.probes_at_first_run.load(Ordering::SeqCst), 4);
    assert!(cycle.runs() >= 2);
}

#[tokio::test(start_paused = true)]
async fn test_bind_failure_exits_after_grace_period_while_updates_continue() {
    let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = occupied.local_addr().unwrap();
    let (_dir, path) = common::temp_config_path();
    let state = common::test_state(path, None);

    let shutdown = Shutdown::new();
    let supervisor = WebSupervisor::new(addr, state)
        .with_grace(Duration::from_secs(2))
        .without_first_run_hint();
    let mut status = supervisor.status();
    supervisor.spawn(shutdown.clone());

    let probe = common::FlakyProbe::new(0);
    let cycle = common::CountingCycle::new(probe.probes.clone());
    let gate = ConnectivityGate::new(probe, ["a:443"]);
    let scheduler = UpdateScheduler::new(Duration::from_millis(500), cycle.clone());

    let started = tokio::time::Instant::now();
    let exit = drive(gate, scheduler, shutdown.subscribe()).await;

    assert_eq!(exit, Exit::Failure(1));
    assert!(started.elapsed() >= Duration::from_secs(2));
    assert!(cycle.runs() >= 4, "cycles kept running during the grace period");
    assert_eq!(*status.borrow_and_update(), ServiceState::Failed);
    drop(occupied);
}

#[tokio::test]
async fn test_supervisor_serves_login_page() {
    let (_dir, path) = common::temp_config_path();
    let state = common::test_state(path, None);

    let shutdown = Shutdown::new();
    let supervisor = WebSupervisor::new("127.0.0.1:0".parse().unwrap(), state)
        .without_first_run_hint();
    let mut status = supervisor.status();
    let handle = supervisor.spawn(shutdown.clone());

    let listening = status
        .wait_for(|s| matches!(s, ServiceState::Listening(_)))
        .await
        .map(|s| *s)
        .unwrap();
    let ServiceState::Listening(addr) = listening else {
        unreachable!()
    };

    let response = common::test_client()
        .get(format!("http://{addr}/login"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert!(response.text().await.unwrap().contains("loginFunc"));
    assert_eq!(shutdown.requested(), None);

    handle.abort();
}

/// An address nothing listens on right now.
fn free_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

fn ready(prepared: Prepared) -> Bootstrap {
    match prepared {
        Prepared::Ready(boot) => boot,
        Prepared::Exit(exit) => panic!("unexpected exit {exit:?}"),
    }
}

/// Waits for a few update cycles, records whether `addr` accepted a
/// connection, then ends the run.
async fn observe_listener(
    addr: SocketAddr,
    cycle: Arc<common::CountingCycle>,
    shutdown: Shutdown,
) -> (bool, bool) {
    let counted = cycle.as_ref();
    let cycles_ran = common::eventually(Duration::from_secs(5), || async move {
        counted.runs() >= 3
    })
    .await;
    let reachable = common::eventually(Duration::from_millis(500), || async move {
        TcpStream::connect(addr).await.is_ok()
    })
    .await;
    shutdown.trigger(1);
    (cycles_ran, reachable)
}

#[tokio::test]
async fn test_noweb_never_listens_while_updates_run() {
    let cli = Cli::try_parse_args(["ddns-agent", "-noweb"]).unwrap();
    let (_dir, path) = common::temp_config_path();
    let addr = free_addr();
    let process = ProcessConfig {
        config_file: Some(path.clone()),
        listen_address: addr.to_string(),
        ..ProcessConfig::from(cli)
    };

    let mut boot = ready(prepare(&process, &mut Vec::new()));
    assert!(!boot.web_enabled);
    boot.interval = Duration::from_millis(50);
    let resolver = boot.resolver.clone();

    let probe = common::FlakyProbe::new(0);
    let cycle = common::CountingCycle::new(probe.probes.clone());
    let shutdown = Shutdown::new();

    let (exit, (cycles_ran, reachable)) = tokio::join!(
        launch_with(
            boot,
            LogBuffer::default(),
            common::test_client(),
            probe,
            cycle.clone(),
            shutdown.clone(),
        ),
        observe_listener(addr, cycle.clone(), shutdown.clone()),
    );

    assert!(cycles_ran, "scheduler kept running without the web service");
    assert!(!reachable, "nothing may listen on {addr}");
    assert_eq!(exit, Exit::Failure(1));
    assert!(resolver.backup_servers().is_some());
    assert!(!path.exists());
}

#[tokio::test]
async fn test_web_service_listens_alongside_updates() {
    let (_dir, path) = common::write_temp_config(&toml::to_string(&DdnsConfig::default()).unwrap());
    let addr = free_addr();
    let process = ProcessConfig {
        listen_address: addr.to_string(),
        ..process_with(&path)
    };

    let mut boot = ready(prepare(&process, &mut Vec::new()));
    assert!(boot.web_enabled);
    boot.interval = Duration::from_millis(50);

    let probe = common::FlakyProbe::new(0);
    let cycle = common::CountingCycle::new(probe.probes.clone());
    let shutdown = Shutdown::new();

    let (exit, (cycles_ran, reachable)) = tokio::join!(
        launch_with(
            boot,
            LogBuffer::default(),
            common::test_client(),
            probe,
            cycle.clone(),
            shutdown.clone(),
        ),
        observe_listener(addr, cycle.clone(), shutdown.clone()),
    );

    assert!(cycles_ran);
    assert!(reachable, "web service should listen on {addr}");
    assert_eq!(exit, Exit::Failure(1));
}

#[tokio::test]
async fn test_port_only_listen_address_accepts_ipv4_clients() {
    let listen = parse_listen_address(":0").unwrap();
    assert!(listen.is_ipv6());

    let listener = WebServer::bind(listen).await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let accepted = tokio::spawn(async move { listener.accept().await.map(|(_, peer)| peer) });

    TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    let peer = accepted.await.unwrap().unwrap();
    assert!(ddns_agent::http::auth::is_lan(peer.ip()));
}
