//! Init/sidecar container entrypoint.
//!
//! Run with `--init` to make a single pass and exit, otherwise loop forever.
use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use clap::Parser;
use http::{HeaderName, HeaderValue, Uri};
use tracing_subscriber::EnvFilter;

use kube_bootstrap::{
    config::{InClusterResolver, Namespace, ServiceAccount, SERVICE_ACCOUNT_DIR},
    controller::{ExecutionMode, PollingController},
    notifier::{HttpNotifier, NotifyTarget},
};

#[derive(clap::Parser, Debug)]
#[command(version, about)]
struct App {
    /// Make a single pass and exit, as an init container
    #[arg(long, env = "BOOTSTRAP_INIT")]
    init: bool,
    /// Seconds to sleep between passes when not in init mode
    #[arg(long, env = "BOOTSTRAP_INTERVAL", default_value = "10", value_parser = parse_interval)]
    interval: Duration,
    /// Directory of the mounted service account
    #[arg(long, env = "BOOTSTRAP_SERVICE_ACCOUNT_DIR", default_value = SERVICE_ACCOUNT_DIR)]
    service_account_dir: PathBuf,
    /// Read the namespace from this file instead of the service account
    #[arg(long, env = "BOOTSTRAP_NAMESPACE_FILE")]
    namespace_file: Option<PathBuf>,
    /// Endpoint to GET on every pass
    #[arg(long, env = "BOOTSTRAP_NOTIFY_URL", default_value = "https://api.weather.gov/")]
    notify_url: Uri,
    /// Extra NAME=VALUE header for the GET, on top of `Accept: application/json`
    #[arg(
        long = "notify-header",
        env = "BOOTSTRAP_NOTIFY_HEADERS",
        value_delimiter = ',',
        value_parser = parse_header
    )]
    notify_headers: Vec<(HeaderName, HeaderValue)>,
}

fn parse_interval(s: &str) -> Result<Duration, String> {
    match s.parse::<u64>() {
        Ok(0) => Err("interval must be at least one second".into()),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(e) => Err(e.to_string()),
    }
}

fn parse_header(s: &str) -> Result<(HeaderName, HeaderValue), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got {s:?}"))?;
    let name = HeaderName::try_from(name.trim()).map_err(|e| e.to_string())?;
    let value = HeaderValue::try_from(value.trim()).map_err(|e| e.to_string())?;
    Ok((name, value))
}

impl App {
    fn mode(&self) -> ExecutionMode {
        ExecutionMode::from_init_flag(self.init)
    }

    fn resolver(&self) -> InClusterResolver {
        let resolver = InClusterResolver::new(ServiceAccount::new(&self.service_account_dir));
        match &self.namespace_file {
            Some(path) => resolver.namespace_file(path),
            None => resolver,
        }
    }

    fn target(&self) -> NotifyTarget {
        let mut target = NotifyTarget::new(self.notify_url.clone());
        for (name, value) in &self.notify_headers {
            target.headers.insert(name.clone(), value.clone());
        }
        target
    }
}

// Pod names go to stdout one per line, logs go to stderr
fn print_pods(_namespace: &Namespace, pods: &[String]) {
    if !pods.is_empty() {
        println!("{}", pods.join("\n"));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let app = App::parse();
    tracing::info!("starting in {:?} mode", app.mode());

    PollingController::new(app.mode(), app.resolver(), HttpNotifier::new(), app.target())
        .interval(app.interval)
        .on_pods(print_pods)
        .run()
        .await?;
    Ok(())
}
