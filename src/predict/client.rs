use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use super::multipart::MultipartForm;
use super::types::{Prediction, parse_predict_response};
use crate::asset::ImageSource;
use crate::error::{AppError, NetworkError};
use crate::http::{agent, join_url, read_bytes, read_text, unreachable};
use crate::state::RequestState;

const PREDICT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the clothing prediction backend
pub(crate) struct PredictClient {
    agent: ureq::Agent,
    base_url: String,
}

impl PredictClient {
    pub(crate) fn new(base_url: &str) -> Self {
        Self {
            agent: agent(PREDICT_TIMEOUT),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Where a match path is served from
    pub(crate) fn match_url(&self, path: &str) -> String {
        join_url(&self.base_url, &format!("static/{}", path.trim_start_matches('/')))
    }

    /// `GET /ping`; true when the backend answers `{"ok": true}`.
    pub(crate) fn ping(&self) -> Result<bool, AppError> {
        let url = join_url(&self.base_url, "ping");
        let response = self.agent.get(&url).call().map_err(|e| unreachable(&url, e))?;
        let (status, body) = read_text(response, &url)?;
        debug!(status, "ping answered");

        let value: serde_json::Value =
            serde_json::from_str(&body).map_err(|_| NetworkError::NonJson { body })?;
        Ok((200..300).contains(&status) && value.get("ok").and_then(|v| v.as_bool()) == Some(true))
    }

    /// Upload one image as the `file` field of a multipart `POST /predict`.
    pub(crate) fn predict(
        &self,
        state: &mut RequestState,
        image: &ImageSource,
    ) -> Result<Prediction, AppError> {
        state.run(|| {
            let url = join_url(&self.base_url, "predict");
            let mut form = MultipartForm::new();
            form.add_file("file", &image.file_name, &image.bytes);
            let (content_type, body) = form.finish();

            info!(url = %url, file = %image.file_name, bytes = image.bytes.len(), "uploading image");
            let response = self
                .agent
                .post(&url)
                .header("Content-Type", content_type.as_str())
                .send(&body[..])
                .map_err(|e| unreachable(&url, e))?;
            let (status, text) = read_text(response, &url)?;
            debug!(status, "predict answered");

            let prediction = parse_predict_response(status, &text)?;
            info!(
                tags = prediction.tags.len(),
                matches = prediction.matches.len(),
                "results ready"
            );
            Ok(prediction)
        })
    }

    /// Download one match image into `dir`, keeping its file name.
    pub(crate) fn fetch_match(&self, path: &str, dir: &Path) -> Result<PathBuf, AppError> {
        let url = self.match_url(path);
        let response = self.agent.get(&url).call().map_err(|e| unreachable(&url, e))?;
        let (status, bytes) = read_bytes(response, &url)?;
        if !(200..300).contains(&status) {
            return Err(NetworkError::Service(format!("HTTP {status} fetching {url}")).into());
        }

        let file_name = Path::new(path)
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "match".into());
        let dest = dir.join(file_name);
        fs::create_dir_all(dir)
            .and_then(|()| fs::write(&dest, &bytes))
            .map_err(|source| AppError::WriteOutput {
                path: dest.clone(),
                source,
            })?;
        debug!(path = %dest.display(), bytes = bytes.len(), "match saved");
        Ok(dest)
    }
}
