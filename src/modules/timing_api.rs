use std::future::Future;
use std::time::Duration;

use log::{info, warn};
use snafu::{ensure, ResultExt};

use crate::errors::{ClientBuildSnafu, CustomResult, FetchSnafu, HttpStatusSnafu};

/// source of timing page snapshots.
/// a failed fetch must leave the caller free to try again on the next tick.
pub trait SnapshotFetcher: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = CustomResult<String>> + Send;
}

/// fetches timing pages over http
#[derive(Clone)]
pub struct TimingClient {
    client: reqwest::Client,
}

impl TimingClient {
    /// # create a timing client
    ///
    /// ## Arguments
    /// * `timeout` - the maximum time a single request may take
    pub fn new(timeout: Duration) -> CustomResult<TimingClient> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("live_kart_ratings/", env!("CARGO_PKG_VERSION")))
            .build()
            .context(ClientBuildSnafu)?;

        Ok(TimingClient { client })
    }

    /// # get the raw text of a timing page
    ///
    /// ## Arguments
    /// * `url` - the url of the timing page
    ///
    /// ## Returns
    /// * `String` - the body of the page, any non 2xx answer is an error
    pub async fn get_page(&self, url: &str) -> CustomResult<String> {
        info!(target: "timing_api:get_page", "Getting timing page {}", url);

        let response = self.send(url).await?;
        let status = response.status();
        ensure!(
            status.is_success(),
            HttpStatusSnafu { url, status: status.as_u16() }
        );

        response.text().await.context(FetchSnafu { url })
    }

    /// # forward a page
    /// get the body of a page whatever status it was served with,
    /// only a request that gets no answer at all is an error
    ///
    /// ## Arguments
    /// * `url` - the url of the page
    ///
    /// ## Returns
    /// * `String` - the body of the answer
    pub async fn forward_page(&self, url: &str) -> CustomResult<String> {
        let response = self.send(url).await?;
        if !response.status().is_success() {
            info!(target: "timing_api:forward_page", "forwarding {} answer of {}", response.status(), url);
        }

        response.text().await.context(FetchSnafu { url })
    }

    async fn send(&self, url: &str) -> CustomResult<reqwest::Response> {
        match self.client.get(url).send().await {
            Ok(response) => Ok(response),
            Err(error) => {
                warn!(target: "timing_api:send", "request failed. (url: {}, error: {})", url, error);
                Err(error).context(FetchSnafu { url })
            }
        }
    }
}

impl SnapshotFetcher for TimingClient {
    async fn fetch(&self, url: &str) -> CustomResult<String> {
        self.get_page(url).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::TimingClient;
    use crate::errors::Error;

    /// answers every connection with a 404 page
    async fn serve_not_found(listener: TcpListener, connections: usize) {
        for _ in 0..connections {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|window| window == b"\r\n\r\n") {
                let read = socket.read(&mut buf).await.unwrap();
                if read == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..read]);
            }

            let body = "<html>no such session</html>";
            let response = format!(
                "HTTP/1.1 404 Not Found\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        }
    }

    #[tokio::test]
    async fn error_pages_fail_polling_but_are_forwarded() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/live", listener.local_addr().unwrap());
        let server = tokio::spawn(serve_not_found(listener, 2));

        let client = TimingClient::new(Duration::from_secs(5)).unwrap();

        let err = client.get_page(&url).await.unwrap_err();
        assert!(matches!(err, Error::HttpStatusError { status: 404, .. }));

        let page = client.forward_page(&url).await.unwrap();
        assert_eq!(page, "<html>no such session</html>");

        server.await.unwrap();
    }

    #[tokio::test]
    async fn unreachable_host_is_a_fetch_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/live", listener.local_addr().unwrap());
        drop(listener);

        let client = TimingClient::new(Duration::from_secs(5)).unwrap();
        let err = client.forward_page(&url).await.unwrap_err();
        assert!(matches!(err, Error::FetchError { .. }));
    }
}
