use crate::config::HttpSettings;
use crate::marketplace::TransportError;
use reqwest::{Client, Response};

pub fn build_client(settings: &HttpSettings) -> Client {
    Client::builder()
        .timeout(settings.timeout)
        .connect_timeout(settings.connect_timeout)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Turns a non-2xx response into [`TransportError::Status`], keeping the body for diagnostics.
pub async fn ensure_success(response: Response) -> Result<Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(TransportError::Status {
        status: status.as_u16(),
        body,
    })
}
