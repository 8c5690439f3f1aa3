//! Signed-in state persisted between invocations

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::AppError;

const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Session {
    pub(crate) display_name: String,
    pub(crate) email: String,
    #[serde(default)]
    pub(crate) is_admin: bool,
    /// Auth token, only present for admin sessions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) access_token: Option<String>,
    pub(crate) signed_in_at: DateTime<Utc>,
}

impl Session {
    pub(crate) fn member(email: &str, display_name: String) -> Self {
        Self {
            display_name,
            email: email.to_string(),
            is_admin: false,
            access_token: None,
            signed_in_at: Utc::now(),
        }
    }

    pub(crate) fn admin(email: &str, display_name: String, access_token: Option<String>) -> Self {
        Self {
            display_name,
            email: email.to_string(),
            is_admin: true,
            access_token,
            signed_in_at: Utc::now(),
        }
    }
}

pub(crate) struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub(crate) fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(SESSION_FILE),
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// The stored session, if any. A corrupt file counts as signed out.
    pub(crate) fn load(&self) -> Option<Session> {
        let content = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&content) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring unreadable session file");
                None
            }
        }
    }

    pub(crate) fn save(&self, session: &Session) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| AppError::Session(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(session)
            .map_err(|e| AppError::Session(e.to_string()))?;
        fs::write(&self.path, json).map_err(|e| AppError::Session(e.to_string()))?;
        debug!(path = %self.path.display(), "session saved");
        Ok(())
    }

    /// Remove the stored session. Clearing an absent session is not an error.
    pub(crate) fn clear(&self) -> Result<(), AppError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Session(e.to_string())),
        }
    }
}
