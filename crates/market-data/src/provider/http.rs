//! Shared HTTP plumbing for the JSON providers.

use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use crate::errors::FetchError;

/// Timeout applied to every provider HTTP client.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 Kabufolio";

/// Builds a client with a bounded timeout.
pub(crate) fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Performs a GET and returns the body of a 2xx response.
///
/// Non-2xx statuses become `Upstream` (with the status and a short body
/// excerpt); transport failures are classified by
/// [`FetchError::from_transport`].
pub(crate) async fn get_text(
    client: &Client,
    provider: &str,
    url: &str,
    params: &[(&str, &str)],
) -> Result<String, FetchError> {
    debug!("{} request: {} with {} params", provider, url, params.len());

    let response = client
        .get(url)
        .query(params)
        .send()
        .await
        .map_err(|e| FetchError::from_transport(provider, &e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let excerpt: String = body.chars().take(200).collect();
        return Err(FetchError::upstream(
            provider,
            format!("HTTP {} - {}", status, excerpt),
        ));
    }

    response
        .text()
        .await
        .map_err(|e| FetchError::from_transport(provider, &e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Market;
    use crate::provider::backend::BackendQuoteProvider;
    use crate::provider::QuoteProvider;
    use rust_decimal_macros::dec;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answers one connection on a loopback port with a raw HTTP response.
    async fn serve_once(status_line: &str, body: &str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut request = [0u8; 2048];
                let _ = socket.read(&mut request).await;
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{}", addr)
    }

    fn client() -> Client {
        build_client(Duration::from_millis(500))
    }

    #[tokio::test]
    async fn test_success_returns_body() {
        let base = serve_once("200 OK", r#"{"price":1}"#).await;
        let body = get_text(&client(), "TEST", &base, &[("symbol", "AAPL")])
            .await
            .unwrap();
        assert_eq!(body, r#"{"price":1}"#);
    }

    #[tokio::test]
    async fn test_error_status_is_upstream() {
        let base = serve_once("503 Service Unavailable", "maintenance").await;
        let err = get_text(&client(), "TEST", &base, &[]).await.unwrap_err();
        match err {
            FetchError::Upstream { provider, message } => {
                assert_eq!(provider, "TEST");
                assert!(message.contains("503"));
                assert!(message.contains("maintenance"));
            }
            other => panic!("expected Upstream, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_refused_connection_is_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = get_text(&client(), "TEST", &format!("http://{}", addr), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Unreachable { .. }));
    }

    #[tokio::test]
    async fn test_silent_server_times_out_as_unreachable() {
        // Bound but never accepted: the connect succeeds, no response follows.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        let err = get_text(&build_client(Duration::from_millis(200)), "TEST", &base, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Unreachable { .. }));
        drop(listener);
    }

    #[tokio::test]
    async fn test_backend_round_trip_over_http() {
        let base = serve_once("200 OK", r#"{"symbol":"AAPL","price":189.25}"#).await;
        let provider = BackendQuoteProvider::with_timeout(base, Duration::from_millis(500));

        let price = provider.get_price("aapl", Market::Foreign).await.unwrap();

        assert_eq!(price.symbol, "AAPL");
        assert_eq!(price.value, dec!(189.25));
    }

    #[tokio::test]
    async fn test_backend_junk_body_is_upstream() {
        let base = serve_once("200 OK", "<html>gateway</html>").await;
        let provider = BackendQuoteProvider::with_timeout(base, Duration::from_millis(500));

        let err = provider.get_price("AAPL", Market::Foreign).await.unwrap_err();
        assert!(matches!(err, FetchError::Upstream { .. }));
    }
}
