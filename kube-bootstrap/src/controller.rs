//! The polling loop driving each bootstrap iteration
//!
//! Every iteration resolves a fresh client and namespace, lists the pods in
//! that namespace and makes one outbound call. In [`ExecutionMode::OneShot`]
//! the loop stops after the first pass; in [`ExecutionMode::Repeating`] it
//! sleeps for the configured interval and goes again. Any error ends the loop.
use std::{fmt, time::Duration};

use crate::{
    config::{Namespace, Resolve},
    lister,
    notifier::{Notification, Notify, NotifyTarget},
    Result,
};

/// Pause between iterations in [`ExecutionMode::Repeating`]
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

/// Whether to run once or forever
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Single iteration, as an init container
    OneShot,
    /// Iterate until something fails, as a sidecar
    #[default]
    Repeating,
}

impl ExecutionMode {
    /// Mode selected by the `--init` flag
    pub fn from_init_flag(init: bool) -> Self {
        if init {
            Self::OneShot
        } else {
            Self::Repeating
        }
    }
}

/// Everything observed during one iteration
#[derive(Debug, Clone)]
pub struct Iteration {
    /// Namespace that was listed
    pub namespace: Namespace,
    /// Pod names in api order
    pub pods: Vec<String>,
    /// Response to the outbound call
    pub notification: Notification,
}

type PodSink = Box<dyn Fn(&Namespace, &[String]) + Send + Sync>;

/// Runs resolver, lister and notifier in sequence according to an [`ExecutionMode`]
pub struct PollingController<R, N> {
    mode: ExecutionMode,
    interval: Duration,
    resolver: R,
    notifier: N,
    target: NotifyTarget,
    on_pods: PodSink,
}

impl<R, N> fmt::Debug for PollingController<R, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollingController")
            .field("mode", &self.mode)
            .field("interval", &self.interval)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl<R, N> PollingController<R, N>
where
    R: Resolve,
    N: Notify,
{
    /// Controller calling `target` through `notifier` every iteration
    pub fn new(mode: ExecutionMode, resolver: R, notifier: N, target: NotifyTarget) -> Self {
        Self {
            mode,
            interval: DEFAULT_INTERVAL,
            resolver,
            notifier,
            target,
            on_pods: Box::new(|_, _| {}),
        }
    }

    /// Hand every listed set of pod names to `f`
    ///
    /// Called once per iteration, right after listing and before the
    /// outbound call, so the names are delivered even when that call fails.
    #[must_use]
    pub fn on_pods<F>(mut self, f: F) -> Self
    where
        F: Fn(&Namespace, &[String]) + Send + Sync + 'static,
    {
        self.on_pods = Box::new(f);
        self
    }

    /// Change the pause between iterations
    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// The mode fixed at construction
    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// A single pass: resolve, list, notify
    pub async fn iterate(&self) -> Result<Iteration> {
        let client = self.resolver.client()?;
        let namespace = self.resolver.namespace()?;

        let pods = lister::list_pods(client, namespace.as_str()).await?;
        tracing::info!("found {} pods in {}", pods.len(), namespace);
        (self.on_pods)(&namespace, &pods);

        let notification = self.notifier.notify(&self.target).await?;
        tracing::info!("Response status : {}", notification.status);
        tracing::info!("Response Body is : {}", notification.body);

        Ok(Iteration {
            namespace,
            pods,
            notification,
        })
    }

    /// Iterate until done
    ///
    /// Returns `Ok` after the first iteration in [`ExecutionMode::OneShot`].
    /// In [`ExecutionMode::Repeating`] this only returns on the first error,
    /// which is passed up unlogged for the caller to report.
    pub async fn run(&self) -> Result<()> {
        let mut iterations: u64 = 0;
        loop {
            iterations += 1;
            tracing::debug!("starting iteration {iterations}");
            self.iterate().await?;

            match self.mode {
                ExecutionMode::OneShot => {
                    tracing::info!("init mode, done after {iterations} iteration");
                    return Ok(());
                }
                ExecutionMode::Repeating => tokio::time::sleep(self.interval).await,
            }
        }
    }
}
