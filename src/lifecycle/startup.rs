//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate process settings and build the runtime context
//! - Handle the one-shot modes (version, password reset)
//! - Load and migrate the cached configuration
//! - Start the web supervisor, wait for the network, run the update loop
//!
//! # Design Decisions
//! - Fail fast: invalid settings end the process before any task exists
//! - `prepare` is synchronous and touches no network
//! - `launch_with` and `drive` are generic over probe and cycle
//! - The process only ends through [`Shutdown`]
//! - Web failures reach `main` through [`Shutdown`], never `process::exit`

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use crate::config::validation::parse_listen_address;
use crate::config::{ConfigStore, ProcessConfig, RuntimeContext};
use crate::ddns::DnsSync;
use crate::http::AppState;
use crate::lifecycle::shutdown::{Shutdown, ShutdownSignal};
use crate::lifecycle::supervisor::WebSupervisor;
use crate::net::{build_client, ConnectivityGate, HostResolver, Probe, TcpProbe, DEFAULT_PROBE_TARGETS};
use crate::observability::{tr, Lang, LogBuffer, Message};
use crate::scheduler::{UpdateCycle, UpdateScheduler};

/// How the process ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Success,
    Failure(u8),
}

impl Exit {
    pub fn from_code(code: u8) -> Self {
        if code == 0 {
            Exit::Success
        } else {
            Exit::Failure(code)
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Exit::Success => 0,
            Exit::Failure(code) => code,
        }
    }
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        ExitCode::from(exit.code())
    }
}

/// Everything the long-running phase needs.
pub struct Bootstrap {
    pub context: Arc<RuntimeContext>,
    pub store: Arc<ConfigStore>,
    pub resolver: HostResolver,
    pub lang: Lang,
    pub web_enabled: bool,
    pub interval: Duration,
}

/// Result of [`prepare`].
pub enum Prepared {
    /// Nothing to run; leave with this status.
    Exit(Exit),
    Ready(Bootstrap),
}

/// Synchronous part of startup.
///
/// `out` receives the version string when it was requested.
pub fn prepare(process: &ProcessConfig, out: &mut impl Write) -> Prepared {
    if process.print_version {
        return match writeln!(out, "{}", process.version) {
            Ok(()) => Prepared::Exit(Exit::Success),
            Err(_) => Prepared::Exit(Exit::Failure(1)),
        };
    }

    // The configured locale is unknown until the file was read.
    let lang = Lang::default();

    let listen = match parse_listen_address(&process.listen_address) {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!(
                address = %process.listen_address,
                error = %e,
                "{}",
                tr(lang, Message::InvalidListenAddress)
            );
            return Prepared::Exit(Exit::Failure(1));
        }
    };

    let context = match RuntimeContext::resolve(process, listen) {
        Ok(context) => Arc::new(context),
        Err(e) => {
            tracing::error!(error = %e, "{}", tr(lang, Message::ConfigUnreadable));
            return Prepared::Exit(Exit::Failure(1));
        }
    };
    let store = Arc::new(ConfigStore::new(context.config_path.clone()));

    if let Some(password) = &process.reset_password {
        return Prepared::Exit(reset_password(&store, password));
    }

    let resolver = match HostResolver::new(context.custom_dns.as_deref()) {
        Ok(resolver) => resolver,
        Err(e) => {
            tracing::error!(
                dns = context.custom_dns.as_deref().unwrap_or_default(),
                error = %e,
                "{}",
                tr(lang, Message::InvalidCustomDns)
            );
            return Prepared::Exit(Exit::Failure(1));
        }
    };

    if context.skip_verify {
        tracing::warn!("{}", tr(lang, Message::SkipVerifyEnabled));
    }

    if let Err(e) = store.cached_or_default() {
        tracing::error!(
            path = %store.path().display(),
            error = %e,
            "{}",
            tr(lang, Message::ConfigUnreadable)
        );
        return Prepared::Exit(Exit::Failure(1));
    }
    match store.migrate() {
        Ok(true) => tracing::info!(path = %store.path().display(), "Configuration migrated"),
        Ok(false) => {}
        Err(e) => tracing::warn!(error = %e, "Failed to save migrated configuration"),
    }

    let lang = Lang::from_code(&store.current().lang);
    tracing::info!(
        version = %context.version,
        config = %store.path().display(),
        "Starting ddns-agent"
    );

    Prepared::Ready(Bootstrap {
        context,
        store,
        resolver,
        lang,
        web_enabled: process.web_enabled,
        interval: process.update_interval(),
    })
}

fn reset_password(store: &ConfigStore, password: &str) -> Exit {
    let config = match store.cached() {
        Ok(config) => config,
        Err(e) if e.is_not_found() => {
            tracing::info!(
                path = %store.path().display(),
                "{}",
                tr(Lang::default(), Message::ConfigNotFoundForReset)
            );
            return Exit::Success;
        }
        Err(e) => {
            tracing::error!(error = %e, "{}", tr(Lang::default(), Message::ConfigUnreadable));
            return Exit::Failure(1);
        }
    };

    let lang = Lang::from_code(&config.lang);
    match store.reset_password(password) {
        Ok(()) => {
            tracing::info!(path = %store.path().display(), "{}", tr(lang, Message::PasswordReset));
            Exit::Success
        }
        Err(e) => {
            tracing::error!(error = %e, "{}", tr(lang, Message::PasswordResetFailed));
            Exit::Failure(1)
        }
    }
}

/// Build the real collaborators and run until the process should end.
pub async fn launch(boot: Bootstrap, logs: LogBuffer) -> Exit {
    let client = match build_client(&boot.context, &boot.resolver) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build HTTP client");
            return Exit::Failure(1);
        }
    };

    let probe = TcpProbe::new(boot.resolver.clone());
    let cycle = Arc::new(DnsSync::new(
        Arc::clone(&boot.store),
        client.clone(),
        boot.context.cache_times,
    ));

    launch_with(boot, logs, client, probe, cycle, Shutdown::new()).await
}

/// Start the web supervisor when enabled, then hand over to [`drive`].
///
/// Returns once `shutdown` is triggered.
pub async fn launch_with<P, C>(
    boot: Bootstrap,
    logs: LogBuffer,
    client: reqwest::Client,
    probe: P,
    cycle: Arc<C>,
    shutdown: Shutdown,
) -> Exit
where
    P: Probe,
    C: UpdateCycle,
{
    let signal = shutdown.subscribe();

    if boot.web_enabled {
        let state = AppState::new(
            Arc::clone(&boot.context),
            Arc::clone(&boot.store),
            logs,
            client,
            boot.lang,
        );
        WebSupervisor::new(boot.context.listen, state).spawn(shutdown);
    } else {
        tracing::info!("Web service disabled");
    }

    boot.resolver.init_backup(boot.lang);

    let gate = ConnectivityGate::new(probe, DEFAULT_PROBE_TARGETS.iter().copied())
        .with_lang(boot.lang);
    let scheduler = UpdateScheduler::new(boot.interval, cycle);

    drive(gate, scheduler, signal).await
}

/// Wait for the network, then run the update loop until shutdown is requested.
pub async fn drive<P, C>(
    gate: ConnectivityGate<P>,
    scheduler: UpdateScheduler<C>,
    mut shutdown: ShutdownSignal,
) -> Exit
where
    P: Probe,
    C: UpdateCycle,
{
    let updates = async {
        gate.wait().await;
        scheduler.run().await;
    };

    tokio::select! {
        code = shutdown.recv() => Exit::from_code(code),
        () = updates => {
            tracing::error!("Update loop stopped unexpectedly");
            Exit::Failure(1)
        }
    }
}
