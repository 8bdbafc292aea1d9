//! Namespace scoped pod listing
use k8s_openapi::api::core::v1::Pod;
use kube::{
    api::{Api, ListParams},
    Client, ResourceExt,
};

use crate::{Error, Result};

/// Pod api for `namespace`, where an empty string means all namespaces
pub fn pods(client: Client, namespace: &str) -> Api<Pod> {
    if namespace.is_empty() {
        Api::all(client)
    } else {
        Api::namespaced(client, namespace)
    }
}

/// Names of the pods visible in `namespace`, in the order the api server returned them
///
/// An empty `namespace` lists across all namespaces. A single list call is
/// issued without a page limit.
pub async fn list_pods(client: Client, namespace: &str) -> Result<Vec<String>> {
    let list = pods(client, namespace)
        .list(&ListParams::default())
        .await
        .map_err(Error::ListPods)?;
    Ok(list.into_iter().map(|p| p.name_any()).collect())
}

#[cfg(test)]
mod tests {
    use super::list_pods;
    use crate::mock_tests::{pod, testcontext};

    #[tokio::test]
    async fn no_pods() {
        let (client, fakeserver) = testcontext(vec![]);
        let mocksrv = fakeserver.run();
        assert!(list_pods(client, "").await.unwrap().is_empty());
        mocksrv.finish(1).await;
    }

    #[tokio::test]
    async fn all_namespaces() {
        let (client, fakeserver) = testcontext(vec![
            pod("correct-namespace", "poda"),
            pod("wrong-namespace", "podb"),
        ]);
        let mocksrv = fakeserver.run();
        assert_eq!(list_pods(client, "").await.unwrap(), ["poda", "podb"]);
        let requests = mocksrv.finish(1).await;
        assert_eq!(requests, ["/api/v1/pods"]);
    }

    #[tokio::test]
    async fn filter_namespace() {
        let (client, fakeserver) = testcontext(vec![
            pod("correct-namespace", "poda"),
            pod("wrong-namespace", "podb"),
        ]);
        let mocksrv = fakeserver.run();
        assert_eq!(list_pods(client, "correct-namespace").await.unwrap(), ["poda"]);
        let requests = mocksrv.finish(1).await;
        assert_eq!(requests, ["/api/v1/namespaces/correct-namespace/pods"]);
    }

    #[tokio::test]
    async fn wrong_namespace() {
        let (client, fakeserver) = testcontext(vec![pod("wrong-namespace", "poda")]);
        let mocksrv = fakeserver.run();
        assert!(list_pods(client, "correct-namespace").await.unwrap().is_empty());
        mocksrv.finish(1).await;
    }

    #[tokio::test]
    async fn order_and_duplicates_are_preserved() {
        let (client, fakeserver) = testcontext(vec![
            pod("ns", "zeta"),
            pod("other", "skipped"),
            pod("ns", "alpha"),
            pod("ns", "zeta"),
        ]);
        let mocksrv = fakeserver.run();
        assert_eq!(list_pods(client, "ns").await.unwrap(), ["zeta", "alpha", "zeta"]);
        mocksrv.finish(1).await;
    }

    #[tokio::test]
    async fn api_errors_are_list_errors() {
        let (client, fakeserver) = testcontext(vec![pod("ns", "a")]);
        let mocksrv = fakeserver.failing_from(1).run();
        let err = list_pods(client, "ns").await.unwrap_err();
        assert!(err.is_list_error());
        assert!(err.to_string().starts_with("getting pods: "), "{err}");
        mocksrv.finish(1).await;
    }
}
