use std::process::ExitCode;

use ddns_agent::config::{Cli, ProcessConfig};
use ddns_agent::lifecycle::{launch, prepare, Prepared};
use ddns_agent::observability::{init_logging, LogBuffer};

#[tokio::main]
async fn main() -> ExitCode {
    let process = ProcessConfig::from(Cli::parse_args());

    let logs = LogBuffer::default();
    if let Err(e) = init_logging(&logs) {
        eprintln!("failed to initialize logging: {e}");
    }

    let exit = match prepare(&process, &mut std::io::stdout()) {
        Prepared::Exit(exit) => exit,
        Prepared::Ready(boot) => launch(boot, logs).await,
    };
    exit.into()
}
