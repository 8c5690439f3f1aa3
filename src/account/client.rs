//! REST client for the hosted account service
//!
//! Member rows live in a PostgREST-style table (`/rest/v1/Members`); admin
//! sign-in uses the password grant of the auth API (`/auth/v1/token`).

use std::time::Duration;

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;
use ureq::Body;
use ureq::http::Response;

use crate::consts::MEMBERS_TABLE;
use crate::error::{AppError, NetworkError};
use crate::http::{agent, join_url, read_text, unreachable};

const ACCOUNT_TIMEOUT: Duration = Duration::from_secs(10);

/// Operations the account flows need from the hosted service
pub(crate) trait AccountService {
    /// Whether a member row matches `email` (and `password`, when given)
    fn find_member(&self, email: &str, password: Option<&str>) -> Result<bool, AppError>;

    fn insert_member(&self, email: &str, password: &str) -> Result<(), AppError>;

    /// Password sign-in for administrators; returns the access token
    fn sign_in_admin(&self, email: &str, password: &str) -> Result<Option<String>, AppError>;

    fn sign_out(&self, access_token: &str) -> Result<(), AppError>;
}

pub(crate) struct AccountClient {
    agent: ureq::Agent,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

impl AccountClient {
    pub(crate) fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            agent: agent(ACCOUNT_TIMEOUT),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn table_url(&self) -> String {
        join_url(&self.base_url, &format!("rest/v1/{MEMBERS_TABLE}"))
    }

    /// Body text of a 2xx response, or the service's error message
    fn expect_success(&self, response: Response<Body>, url: &str, fallback: &str) -> Result<String, AppError> {
        let (status, text) = read_text(response, url)?;
        debug!(status, url, "account service answered");
        if (200..300).contains(&status) {
            return Ok(text);
        }
        let message = service_message(&text).unwrap_or_else(|| format!("{fallback} (HTTP {status})"));
        Err(NetworkError::Service(message).into())
    }
}

impl AccountService for AccountClient {
    fn find_member(&self, email: &str, password: Option<&str>) -> Result<bool, AppError> {
        let url = self.table_url();
        let mut request = self
            .agent
            .get(&url)
            .header("apikey", self.api_key.as_str())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
            .query("select", "email")
            .query("email", format!("eq.{email}"));
        if let Some(password) = password {
            request = request.query("password", format!("eq.{password}"));
        }
        let response = request.call().map_err(|e| unreachable(&url, e))?;
        let text = self.expect_success(response, &url, "Member lookup failed")?;

        let rows: Vec<Value> =
            serde_json::from_str(&text).map_err(|_| NetworkError::NonJson { body: text.clone() })?;
        Ok(!rows.is_empty())
    }

    fn insert_member(&self, email: &str, password: &str) -> Result<(), AppError> {
        let url = self.table_url();
        let response = self
            .agent
            .post(&url)
            .header("apikey", self.api_key.as_str())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Prefer", "return=minimal")
            .send_json(json!([{ "email": email, "password": password }]))
            .map_err(|e| unreachable(&url, e))?;
        self.expect_success(response, &url, "Account creation failed")?;
        Ok(())
    }

    fn sign_in_admin(&self, email: &str, password: &str) -> Result<Option<String>, AppError> {
        let url = join_url(&self.base_url, "auth/v1/token");
        let response = self
            .agent
            .post(&url)
            .query("grant_type", "password")
            .header("apikey", self.api_key.as_str())
            .send_json(json!({ "email": email, "password": password }))
            .map_err(|e| unreachable(&url, e))?;

        let (status, text) = read_text(response, &url)?;
        debug!(status, "auth service answered");
        if !(200..300).contains(&status) {
            let message = service_message(&text).unwrap_or_else(|| "Login failed".to_string());
            return Err(AppError::Auth(message));
        }
        let token: TokenResponse =
            serde_json::from_str(&text).map_err(|_| NetworkError::NonJson { body: text.clone() })?;
        Ok(token.access_token)
    }

    fn sign_out(&self, access_token: &str) -> Result<(), AppError> {
        let url = join_url(&self.base_url, "auth/v1/logout");
        let response = self
            .agent
            .post(&url)
            .header("apikey", self.api_key.as_str())
            .header("Authorization", format!("Bearer {access_token}"))
            .send_empty()
            .map_err(|e| unreachable(&url, e))?;
        self.expect_success(response, &url, "Sign out failed")?;
        Ok(())
    }
}

/// Human-readable message from a service error body.
///
/// Looks at `message`, `error_description`, `msg` and `error`, in that order.
pub(crate) fn service_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error_description", "msg", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
