use std::{env, path::PathBuf};

/// Api server host, injected into every pod by the kubelet
pub const SERVICE_HOSTENV: &str = "KUBERNETES_SERVICE_HOST";
/// Api server port, injected into every pod by the kubelet
pub const SERVICE_PORTENV: &str = "KUBERNETES_SERVICE_PORT";

/// Default mount point of the service account volume
pub const SERVICE_ACCOUNT_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";

// Mounted credential files
const SERVICE_TOKENFILE: &str = "token";
const SERVICE_CERTFILE: &str = "ca.crt";
const SERVICE_DEFAULT_NS: &str = "namespace";

/// Location of the projected service account volume
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceAccount {
    dir: PathBuf,
}

impl Default for ServiceAccount {
    fn default() -> Self {
        Self::new(SERVICE_ACCOUNT_DIR)
    }
}

impl ServiceAccount {
    /// Service account mounted at `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Bearer token file
    pub fn token_file(&self) -> PathBuf {
        self.dir.join(SERVICE_TOKENFILE)
    }

    /// PEM bundle of the cluster CA
    pub fn cert_file(&self) -> PathBuf {
        self.dir.join(SERVICE_CERTFILE)
    }

    /// File holding the pod's own namespace
    pub fn namespace_file(&self) -> PathBuf {
        self.dir.join(SERVICE_DEFAULT_NS)
    }
}

pub fn kube_host() -> Option<String> {
    env::var(SERVICE_HOSTENV).ok()
}

pub fn kube_port() -> Option<String> {
    env::var(SERVICE_PORTENV).ok()
}

/// Cluster address from host and port, bracketing IPv6 hosts
pub fn kube_server(host: &str, port: &str) -> String {
    if host.contains(':') {
        format!("https://[{host}]:{port}")
    } else {
        format!("https://{host}:{port}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kube_server() {
        assert_eq!(kube_server("fake.io", "8080"), "https://fake.io:8080");
        assert_eq!(kube_server("10.96.0.1", "443"), "https://10.96.0.1:443");
        assert_eq!(kube_server("fd00::1", "443"), "https://[fd00::1]:443");
    }

    #[test]
    fn default_paths_point_at_the_projected_volume() {
        let sa = ServiceAccount::default();
        assert_eq!(
            sa.namespace_file(),
            PathBuf::from("/var/run/secrets/kubernetes.io/serviceaccount/namespace")
        );
        assert_eq!(
            sa.token_file(),
            PathBuf::from("/var/run/secrets/kubernetes.io/serviceaccount/token")
        );
        assert_eq!(
            sa.cert_file(),
            PathBuf::from("/var/run/secrets/kubernetes.io/serviceaccount/ca.crt")
        );
    }
}
