// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod error;
pub mod page;
pub mod token;

pub use error::{BridgeError, PARSE_NOTICE};
pub use page::{AdminPage, parse_admin_page};
pub use token::{CSRF_FIELD, CSRF_HEADER, DEFAULT_CSRF_COOKIE, resolve_csrf_token};

use anyhow::{Context, bail};
use reqwest::blocking::{Client as HttpClient, Response};
use reqwest::cookie::{CookieStore, Jar};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use vitrine_app::{DeleteTarget, ProfilePayload, SaveOutcome, SaveRequest};

use crate::error::Result;

pub const LOAD_DATA_PATH: &str = "/load_data/";
pub const SAVE_DATA_PATH: &str = "/save_data/";

/// HTTP side of the admin client: one cookie jar shared by every request so
/// the anti-forgery cookie set by the admin page is sent back on mutations.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    admin_path: String,
    csrf_cookie: String,
    jar: Arc<Jar>,
    http: HttpClient,
    page_token: Option<String>,
}

impl Client {
    pub fn new(
        base_url: &str,
        admin_path: &str,
        csrf_cookie: &str,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let trimmed = base_url.trim();
        if trimmed.is_empty() {
            bail!("server.base_url must not be empty");
        }
        let base_url =
            Url::parse(trimmed).with_context(|| format!("parse server.base_url {trimmed:?}"))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            bail!(
                "server.base_url must use http or https, got {:?}",
                base_url.scheme()
            );
        }
        if !admin_path.starts_with('/') {
            bail!("server.admin_path must start with '/', got {admin_path:?}");
        }

        let jar = Arc::new(Jar::default());
        let http = HttpClient::builder()
            .timeout(timeout)
            .cookie_provider(Arc::clone(&jar))
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            admin_path: admin_path.to_owned(),
            csrf_cookie: csrf_cookie.to_owned(),
            jar,
            http,
            page_token: None,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn admin_path(&self) -> &str {
        &self.admin_path
    }

    /// Fetches the admin page, which sets the session cookies, and keeps
    /// its hidden token as the fallback for [`Client::csrf_token`].
    pub fn bootstrap(&mut self) -> Result<AdminPage> {
        let path = self.admin_path.clone();
        let url = self.endpoint(&path)?;
        tracing::debug!(method = "GET", path = %path, "fetching admin page");
        let response = self
            .http
            .get(url)
            .send()
            .map_err(|source| self.transport(source))?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(status = status.as_u16(), path = %path, "admin page request failed");
            return Err(BridgeError::Status {
                status: status.as_u16(),
                path,
            });
        }
        let html = response.text().map_err(|source| self.transport(source))?;
        let page = parse_admin_page(&html);
        self.page_token = page.csrf_token.clone();
        tracing::debug!(profiles = page.profiles.len(), "admin page loaded");
        Ok(page)
    }

    pub fn set_page_token(&mut self, token: Option<String>) {
        self.page_token = token;
    }

    pub fn csrf_token(&self) -> String {
        let header = self.jar.cookies(&self.base_url);
        let header = header.as_ref().and_then(|value| value.to_str().ok());
        resolve_csrf_token(header, &self.csrf_cookie, self.page_token.as_deref())
    }

    pub fn load_data(&self, identifiant: &str) -> Result<ProfilePayload> {
        let mut url = self.endpoint(LOAD_DATA_PATH)?;
        url.query_pairs_mut().append_pair("identifiant", identifiant);
        tracing::debug!(method = "GET", path = LOAD_DATA_PATH, identifiant, "loading profile");

        let response = self
            .http
            .get(url)
            .send()
            .map_err(|source| self.transport(source))?;
        let value = self.read_envelope(response, LOAD_DATA_PATH)?;
        serde_json::from_value(value).map_err(|error| BridgeError::Malformed {
            path: LOAD_DATA_PATH.to_owned(),
            reason: error.to_string(),
        })
    }

    pub fn save(&self, request: &SaveRequest) -> Result<SaveOutcome> {
        let url = self.endpoint(SAVE_DATA_PATH)?;
        tracing::debug!(
            method = "POST",
            path = SAVE_DATA_PATH,
            modal = %request.modal_id,
            is_new = request.is_new,
            "saving dialog"
        );

        let response = self
            .http
            .post(url)
            .header(CSRF_HEADER, self.csrf_token())
            .json(request)
            .send()
            .map_err(|source| self.transport(source))?;
        let value = self.read_envelope(response, SAVE_DATA_PATH)?;
        if value.get("success") == Some(&Value::Bool(false)) {
            return Err(BridgeError::Server(format!(
                "{} was not saved",
                request.kind().map_or("entry", |kind| kind.as_str())
            )));
        }
        serde_json::from_value(value).map_err(|error| BridgeError::Malformed {
            path: SAVE_DATA_PATH.to_owned(),
            reason: error.to_string(),
        })
    }

    pub fn delete(&self, target: &DeleteTarget) -> Result<()> {
        let path = target.path()?;
        let url = self.endpoint(&path)?;
        tracing::debug!(method = "DELETE", path = %path, "deleting row");

        let response = self
            .http
            .delete(url)
            .header(CSRF_HEADER, self.csrf_token())
            .send()
            .map_err(|source| self.transport(source))?;
        let value = self.read_envelope(response, &path)?;
        if value.get("success").and_then(Value::as_bool) != Some(true) {
            return Err(BridgeError::Server(format!(
                "{} {} was not deleted",
                target.kind.as_str(),
                target.id
            )));
        }
        Ok(())
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self
            .base_url
            .join(path)
            .with_context(|| format!("build URL for {path}"))?)
    }

    fn transport(&self, source: reqwest::Error) -> BridgeError {
        tracing::error!(url = %self.base_url, error = %source, "request failed");
        BridgeError::Transport {
            url: self.base_url.to_string(),
            source,
        }
    }

    /// Decodes a JSON envelope. `{error}` wins over the HTTP status so the
    /// server's own message reaches the user.
    fn read_envelope(&self, response: Response, path: &str) -> Result<Value> {
        let status = response.status();
        let body = response.text().map_err(|source| self.transport(source))?;
        let status_error = || BridgeError::Status {
            status: status.as_u16(),
            path: path.to_owned(),
        };

        if body.trim().is_empty() {
            tracing::error!(status = status.as_u16(), path, "empty response body");
            return Err(if status.is_success() {
                BridgeError::EmptyResponse {
                    path: path.to_owned(),
                }
            } else {
                status_error()
            });
        }

        let value: Value = match serde_json::from_str(&body) {
            Ok(value) => value,
            Err(error) => {
                tracing::error!(status = status.as_u16(), path, %error, "response is not JSON");
                return Err(if status.is_success() {
                    BridgeError::Malformed {
                        path: path.to_owned(),
                        reason: error.to_string(),
                    }
                } else {
                    status_error()
                });
            }
        };

        if let Some(message) = server_error(&value) {
            tracing::error!(path, message = %message, "server reported an error");
            return Err(BridgeError::Server(message));
        }
        if !status.is_success() {
            return Err(status_error());
        }
        Ok(value)
    }
}

/// `{error: "..."}` or `{error: {message: "..."}}`; blank errors do not count.
fn server_error(value: &Value) -> Option<String> {
    let message = match value.get("error")? {
        Value::Null | Value::Bool(false) => return None,
        Value::String(message) => message.clone(),
        Value::Object(body) => match body.get("message").and_then(Value::as_str) {
            Some(message) => message.to_owned(),
            None => Value::Object(body.clone()).to_string(),
        },
        other => other.to_string(),
    };
    (!message.trim().is_empty()).then_some(message)
}

#[cfg(test)]
mod tests {
    use super::{Client, server_error};
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn server_errors_accept_strings_and_message_objects() {
        assert_eq!(
            server_error(&json!({"error": "duplicate identifiant"})),
            Some("duplicate identifiant".to_owned())
        );
        assert_eq!(
            server_error(&json!({"error": {"message": "bad level"}})),
            Some("bad level".to_owned())
        );
        assert_eq!(server_error(&json!({"error": ""})), None);
        assert_eq!(server_error(&json!({"success": true})), None);
    }

    #[test]
    fn new_rejects_bad_urls_and_paths() {
        let timeout = Duration::from_secs(1);
        assert!(Client::new("", "/data/", "csrftoken", timeout).is_err());
        assert!(Client::new("ftp://host", "/data/", "csrftoken", timeout).is_err());
        assert!(Client::new("http://host", "data/", "csrftoken", timeout).is_err());
        assert!(Client::new("http://host:8000", "/data/", "csrftoken", timeout).is_ok());
    }

    #[test]
    fn token_falls_back_to_the_page_field() -> anyhow::Result<()> {
        let mut client = Client::new(
            "http://127.0.0.1:1",
            "/data/",
            "csrftoken",
            Duration::from_millis(50),
        )?;
        assert_eq!(client.csrf_token(), "");
        client.set_page_token(Some("frompage".to_owned()));
        assert_eq!(client.csrf_token(), "frompage");
        Ok(())
    }
}
