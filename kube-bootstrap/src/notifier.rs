//! The outbound call made once per iteration
use std::future::Future;

use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode, Uri};
use http_body_util::{BodyExt, Empty};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::{Error, Result};

/// Where and how to call out each iteration
#[derive(Debug, Clone)]
pub struct NotifyTarget {
    /// Endpoint receiving the GET
    pub url: Uri,
    /// Headers sent with the request
    pub headers: HeaderMap,
}

impl NotifyTarget {
    /// Target `url`, asking for json
    pub fn new(url: Uri) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        Self { url, headers }
    }
}

/// Outcome of a completed call
///
/// Any status counts as completed; only transport failures are errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Response status
    pub status: StatusCode,
    /// Response body, lossily decoded as UTF-8
    pub body: String,
}

/// Capability to perform the per-iteration outbound call
pub trait Notify {
    /// GET `target` and wait for the full response
    fn notify(&self, target: &NotifyTarget) -> impl Future<Output = Result<Notification>> + Send;
}

/// [`Notify`] over hyper, speaking both http and https
#[derive(Clone, Debug)]
pub struct HttpNotifier {
    client: Client<HttpsConnector<HttpConnector>, Empty<Bytes>>,
}

impl Default for HttpNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpNotifier {
    /// Notifier trusting the webpki root certificates
    pub fn new() -> Self {
        let https = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .build();
        Self {
            client: Client::builder(TokioExecutor::new()).build(https),
        }
    }
}

impl Notify for HttpNotifier {
    async fn notify(&self, target: &NotifyTarget) -> Result<Notification> {
        let mut builder = Request::builder().method(Method::GET).uri(target.url.clone());
        for (name, value) in &target.headers {
            builder = builder.header(name, value);
        }
        let request = builder.body(Empty::new()).map_err(Error::BuildNotifyRequest)?;

        tracing::debug!("GET {}", target.url);
        let response = self.client.request(request).await.map_err(|source| Error::Notify {
            url: target.url.to_string(),
            source,
        })?;
        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|source| Error::ReadNotifyBody {
                url: target.url.to_string(),
                source,
            })?
            .to_bytes();

        Ok(Notification {
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        task::JoinHandle,
    };

    const OK_RESPONSE: &str = r#"{"status": "OK"}"#;

    // Answers a single request with `body` and hands back the raw request head
    async fn one_shot_server(body: &'static str) -> (Uri, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).await.unwrap();
                assert_ne!(n, 0, "client hung up before finishing the request");
                head.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
            String::from_utf8(head).unwrap()
        });
        let url = format!("http://{addr}/points").parse().unwrap();
        (url, server)
    }

    #[tokio::test]
    async fn sends_configured_headers() {
        let (url, server) = one_shot_server(OK_RESPONSE).await;
        let mut target = NotifyTarget::new(url);
        target
            .headers
            .insert("token", HeaderValue::from_static("23rfwe23"));

        let notification = HttpNotifier::new().notify(&target).await.unwrap();
        assert_eq!(notification.status, StatusCode::OK);
        assert_eq!(notification.body, OK_RESPONSE);

        let head = server.await.unwrap().to_ascii_lowercase();
        assert!(head.starts_with("get /points http/1.1\r\n"), "{head}");
        assert!(head.contains("\r\naccept: application/json\r\n"), "{head}");
        assert!(head.contains("\r\ntoken: 23rfwe23\r\n"), "{head}");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let target = NotifyTarget::new(format!("http://{addr}/").parse().unwrap());
        let err = HttpNotifier::new().notify(&target).await.unwrap_err();
        assert!(err.is_network_error(), "{err:?}");
        assert!(matches!(err, Error::Notify { .. }));
    }

    #[test]
    fn target_asks_for_json() {
        let target = NotifyTarget::new(Uri::from_static("https://api.weather.gov/"));
        assert_eq!(target.headers.len(), 1);
        assert_eq!(target.headers[header::ACCEPT], "application/json");
    }
}
