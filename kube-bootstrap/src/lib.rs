//! Bootstrap helper for init and sidecar containers.
//!
//! Each iteration authenticates against the cluster with the pod's mounted
//! service account, lists the pods of the pod's own namespace, and makes one
//! outbound HTTP GET, logging the results:
//!
//! ```rust,no_run
//! use kube_bootstrap::{
//!     config::InClusterResolver,
//!     controller::{ExecutionMode, PollingController},
//!     notifier::{HttpNotifier, NotifyTarget},
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let target = NotifyTarget::new("https://api.weather.gov/".parse()?);
//!     PollingController::new(
//!         ExecutionMode::OneShot,
//!         InClusterResolver::default(),
//!         HttpNotifier::new(),
//!         target,
//!     )
//!     .run()
//!     .await?;
//!     Ok(())
//! }
//! ```
//!
//! Nothing is retried. The first error ends [`PollingController::run`] and is
//! expected to end the process, leaving restarts to the kubelet.
//!
//! [`PollingController::run`]: controller::PollingController::run

pub mod config;
pub mod controller;
pub mod error;
pub mod lister;
pub mod notifier;


#[doc(inline)] pub use error::{Error, Result};
