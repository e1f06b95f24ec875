//! Command line flags.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;

use crate::config::process::{ProcessConfig, DEFAULT_LISTEN_ADDRESS};

/// Long flags that historically take a single dash (`-noweb`, `-cacheTimes 3`).
const SINGLE_DASH_LONG: &[&str] = &["cacheTimes", "noweb", "skipVerify", "dns", "resetPassword"];

/// Dynamic DNS update agent
#[derive(Parser, Debug)]
#[command(name = "ddns-agent")]
#[command(about = "Keeps DNS records pointed at this host's public IP", long_about = None)]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// Print version and exit
    #[arg(short = 'v')]
    pub version: bool,

    /// Listen address
    #[arg(short = 'l', default_value = DEFAULT_LISTEN_ADDRESS)]
    pub listen: String,

    /// Update frequency (seconds)
    #[arg(short = 'f', default_value_t = 300, value_parser = clap::value_parser!(u64).range(1..))]
    pub every: u64,

    /// Cache times
    #[arg(long = "cacheTimes", default_value_t = 5)]
    pub cache_times: u32,

    /// Custom configuration file path
    #[arg(short = 'c')]
    pub config: Option<PathBuf>,

    /// No web service
    #[arg(long = "noweb")]
    pub no_web: bool,

    /// Skip certificate verification
    #[arg(long = "skipVerify")]
    pub skip_verify: bool,

    /// Custom DNS server address, example: 8.8.8.8
    #[arg(long = "dns")]
    pub dns: Option<String>,

    /// Reset password to the one entered
    #[arg(long = "resetPassword")]
    pub reset_password: Option<String>,
}

impl Cli {
    /// Parse the process arguments.
    pub fn parse_args() -> Self {
        Self::parse_from(normalize_args(std::env::args_os()))
    }

    /// Parse an explicit argument list (first element is the program name).
    pub fn try_parse_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::try_parse_from(normalize_args(args))
    }
}

/// Rewrite `-name` / `-name=value` into `--name` for the known long flags.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            let Some(text) = arg.to_str() else {
                return arg;
            };
            let Some(rest) = text.strip_prefix('-') else {
                return arg;
            };
            if rest.starts_with('-') {
                return arg;
            }
            let name = rest.split_once('=').map_or(rest, |(name, _)| name);
            if SINGLE_DASH_LONG.contains(&name) {
                OsString::from(format!("-{}", text))
            } else {
                arg
            }
        })
        .collect()
}

impl From<Cli> for ProcessConfig {
    fn from(cli: Cli) -> Self {
        ProcessConfig {
            print_version: cli.version,
            listen_address: cli.listen,
            update_interval_secs: cli.every,
            cache_times: cli.cache_times,
            config_file: cli.config.filter(|p| !p.as_os_str().is_empty()),
            web_enabled: !cli.no_web,
            skip_verify: cli.skip_verify,
            custom_dns: cli.dns.filter(|d| !d.is_empty()),
            reset_password: cli.reset_password.filter(|p| !p.is_empty()),
            version: crate::VERSION.to_string(),
        }
    }
}
