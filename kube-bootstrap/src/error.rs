//! Error handling in [`kube-bootstrap`][crate]
use std::path::PathBuf;

use thiserror::Error;

/// Possible errors from one bootstrap iteration
///
/// Every variant is fatal: nothing in this crate retries. The variants fall
/// into three groups, see [`Error::is_config_error`], [`Error::is_list_error`]
/// and [`Error::is_network_error`].
#[derive(Error, Debug)]
pub enum Error {
    /// The service env variables injected into every pod are not set
    #[error("unable to load in-cluster configuration, {hostenv} and {portenv} must be defined")]
    MissingInClusterVariables {
        /// Name of the host variable
        hostenv: &'static str,
        /// Name of the port variable
        portenv: &'static str,
    },

    /// Failed to read the service account token
    #[error("failed to read the service account token {path:?}: {source}")]
    ReadToken {
        /// Token file location
        path: PathBuf,
        /// Underlying io error
        #[source]
        source: std::io::Error,
    },

    /// The service account token file was empty
    #[error("service account token {0:?} is empty")]
    EmptyToken(PathBuf),

    /// Failed to parse the cluster url from the service env variables
    #[error("failed to parse cluster url: {0}")]
    ParseClusterUrl(#[source] http::uri::InvalidUri),

    /// Failed to read the namespace file
    #[error("failed to read namespace file {path:?}: {source}")]
    ReadNamespace {
        /// Namespace file location
        path: PathBuf,
        /// Underlying io error
        #[source]
        source: std::io::Error,
    },

    /// The namespace file held nothing but whitespace
    #[error("content of {0:?} can not be empty")]
    EmptyNamespace(PathBuf),

    /// Failed to build a kube client from the in-cluster credential
    #[error("failed to build kube client: {0}")]
    BuildClient(#[source] kube::Error),

    /// Listing pods failed
    #[error("getting pods: {0}")]
    ListPods(#[source] kube::Error),

    /// The notify request could not be constructed
    #[error("failed to build notify request: {0}")]
    BuildNotifyRequest(#[source] http::Error),

    /// Sending the notify request failed
    #[error("errored when sending request to {url}: {source}")]
    Notify {
        /// Target url
        url: String,
        /// Transport error
        #[source]
        source: hyper_util::client::legacy::Error,
    },

    /// Reading the notify response body failed
    #[error("failed to read response body from {url}: {source}")]
    ReadNotifyBody {
        /// Target url
        url: String,
        /// Body error
        #[source]
        source: hyper::Error,
    },
}

/// Convenient alias for `Result<T, Error>`
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Credentials or namespace could not be resolved
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::MissingInClusterVariables { .. }
                | Self::ReadToken { .. }
                | Self::EmptyToken(_)
                | Self::ParseClusterUrl(_)
                | Self::ReadNamespace { .. }
                | Self::EmptyNamespace(_)
                | Self::BuildClient(_)
        )
    }

    /// The cluster api refused or failed the list call
    pub fn is_list_error(&self) -> bool {
        matches!(self, Self::ListPods(_))
    }

    /// The outbound notify call failed
    pub fn is_network_error(&self) -> bool {
        matches!(
            self,
            Self::BuildNotifyRequest(_) | Self::Notify { .. } | Self::ReadNotifyBody { .. }
        )
    }
}
