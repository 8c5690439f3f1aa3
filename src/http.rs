//! Shared `ureq` plumbing for the prediction and account clients

use std::time::Duration;

use ureq::Body;
use ureq::http::Response;

use crate::error::NetworkError;

/// Largest match image accepted by `--save-matches`
const MAX_IMAGE_BYTES: u64 = 50 * 1024 * 1024;

/// Agent that reports every status code as a normal response, so callers can read error bodies.
pub(crate) fn agent(timeout: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

pub(crate) fn unreachable(url: &str, err: ureq::Error) -> NetworkError {
    NetworkError::Unreachable {
        url: url.to_string(),
        message: err.to_string(),
    }
}

/// Status code and body text of a response
pub(crate) fn read_text(response: Response<Body>, url: &str) -> Result<(u16, String), NetworkError> {
    let status = response.status().as_u16();
    let text = response
        .into_body()
        .read_to_string()
        .map_err(|e| NetworkError::Body {
            url: url.to_string(),
            message: e.to_string(),
        })?;
    Ok((status, text))
}

pub(crate) fn read_bytes(response: Response<Body>, url: &str) -> Result<(u16, Vec<u8>), NetworkError> {
    let status = response.status().as_u16();
    let mut body = response.into_body();
    let bytes = body
        .with_config()
        .limit(MAX_IMAGE_BYTES)
        .read_to_vec()
        .map_err(|e| NetworkError::Body {
            url: url.to_string(),
            message: e.to_string(),
        })?;
    Ok((status, bytes))
}

/// Join a base URL and a path with exactly one `/` between them.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
