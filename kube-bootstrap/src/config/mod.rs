//! In-cluster credentials and namespace discovery from the [service account mount](https://kubernetes.io/docs/tasks/run-application/access-api-from-pod/).
//!
//! Nothing here is cached. Every iteration of the
//! [`PollingController`](crate::controller::PollingController) re-reads the
//! mounted files, so a rotated token or a changed namespace is picked up on
//! the next cycle.
mod incluster_config;

use std::{
    fmt,
    path::{Path, PathBuf},
};

use kube::{Client, Config};
use secrecy::{ExposeSecret, SecretString};

use crate::{Error, Result};
pub use incluster_config::{ServiceAccount, SERVICE_ACCOUNT_DIR, SERVICE_HOSTENV, SERVICE_PORTENV};

/// Bearer token, cluster url and CA material of the pod's service account
#[derive(Clone)]
pub struct ClusterCredential {
    cluster_url: http::Uri,
    token: SecretString,
    root_cert: Option<Vec<Vec<u8>>>,
}

impl fmt::Debug for ClusterCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterCredential")
            .field("cluster_url", &self.cluster_url)
            .field("token", &"[REDACTED]")
            .field("root_cert", &self.root_cert.as_ref().map(Vec::len))
            .finish()
    }
}

impl ClusterCredential {
    /// Load the credential from the process env and the mounted service account
    ///
    /// Fails when not running inside a pod.
    pub fn resolve(service_account: &ServiceAccount) -> Result<Self> {
        Self::from_parts(
            incluster_config::kube_host(),
            incluster_config::kube_port(),
            service_account,
        )
    }

    fn from_parts(host: Option<String>, port: Option<String>, sa: &ServiceAccount) -> Result<Self> {
        let (Some(host), Some(port)) = (host.filter(|h| !h.is_empty()), port.filter(|p| !p.is_empty()))
        else {
            return Err(Error::MissingInClusterVariables {
                hostenv: SERVICE_HOSTENV,
                portenv: SERVICE_PORTENV,
            });
        };
        let cluster_url = incluster_config::kube_server(&host, &port)
            .parse::<http::Uri>()
            .map_err(Error::ParseClusterUrl)?;

        let token_file = sa.token_file();
        let token = std::fs::read_to_string(&token_file).map_err(|source| Error::ReadToken {
            path: token_file.clone(),
            source,
        })?;
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::EmptyToken(token_file));
        }
        tracing::debug!("loaded bearer token from {}", token_file.display());

        Ok(Self {
            cluster_url,
            token: SecretString::from(token.to_owned()),
            root_cert: load_cert(&sa.cert_file()),
        })
    }

    /// The api server address
    pub fn cluster_url(&self) -> &http::Uri {
        &self.cluster_url
    }

    /// The bearer token
    pub fn token(&self) -> &SecretString {
        &self.token
    }

    /// DER encoded CA certificates, `None` when the bundle was unusable
    pub fn root_cert(&self) -> Option<&[Vec<u8>]> {
        self.root_cert.as_deref()
    }

    /// Build a kube [`Config`] authenticating with this credential
    pub fn to_config(&self) -> Config {
        let mut config = Config::new(self.cluster_url.clone());
        config.root_cert = self.root_cert.clone();
        config.auth_info.token = Some(SecretString::from(self.token.expose_secret().to_owned()));
        config
    }

    /// Build an authenticated [`Client`]
    pub fn client(&self) -> Result<Client> {
        Client::try_from(self.to_config()).map_err(Error::BuildClient)
    }
}

// A missing or broken CA bundle is not fatal: the client falls back to the default roots.
fn load_cert(path: &Path) -> Option<Vec<Vec<u8>>> {
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(err) => {
            tracing::warn!("expected to load root CA config from {}, but got err: {}", path.display(), err);
            return None;
        }
    };
    match pem::parse_many(&data) {
        Ok(pems) => {
            let certs = pems
                .into_iter()
                .filter(|p| p.tag() == "CERTIFICATE")
                .map(pem::Pem::into_contents)
                .collect::<Vec<_>>();
            if certs.is_empty() {
                tracing::warn!("no certificates found in {}", path.display());
                None
            } else {
                Some(certs)
            }
        }
        Err(err) => {
            tracing::warn!("failed to parse root CA bundle {}: {}", path.display(), err);
            None
        }
    }
}

/// A non-empty, whitespace-trimmed namespace name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace(String);

impl Namespace {
    /// Read the namespace from `path`
    ///
    /// The content is trimmed; an unreadable file or one with nothing but
    /// whitespace is an error.
    pub fn resolve(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|source| Error::ReadNamespace {
            path: path.to_owned(),
            source,
        })?;
        let namespace = data.trim();
        if namespace.is_empty() {
            return Err(Error::EmptyNamespace(path.to_owned()));
        }
        Ok(Self(namespace.to_owned()))
    }

    /// The namespace name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Namespace {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Source of the per-iteration client and namespace
pub trait Resolve {
    /// Authenticated client for the cluster api
    fn client(&self) -> Result<Client>;

    /// Namespace to list pods in
    fn namespace(&self) -> Result<Namespace>;
}

/// Resolves everything from the pod's own service account mount
#[derive(Debug, Clone, Default)]
pub struct InClusterResolver {
    service_account: ServiceAccount,
    namespace_file: Option<PathBuf>,
}

impl InClusterResolver {
    /// Resolver reading credentials from `service_account`
    pub fn new(service_account: ServiceAccount) -> Self {
        Self {
            service_account,
            namespace_file: None,
        }
    }

    /// Read the namespace from `path` rather than from the service account mount
    #[must_use]
    pub fn namespace_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.namespace_file = Some(path.into());
        self
    }

    fn namespace_path(&self) -> PathBuf {
        self.namespace_file
            .clone()
            .unwrap_or_else(|| self.service_account.namespace_file())
    }
}

impl Resolve for InClusterResolver {
    fn client(&self) -> Result<Client> {
        ClusterCredential::resolve(&self.service_account)?.client()
    }

    fn namespace(&self) -> Result<Namespace> {
        Namespace::resolve(&self.namespace_path())
    }
}
