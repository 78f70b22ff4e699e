// Async HTTP client for the NetGate management API.
//
// Auth: `POST /auth/login` issues a bearer token that is attached to
// every subsequent request. Endpoint groups (firewall, network, dns,
// system) are implemented as inherent methods in sibling modules to keep
// this one focused on transport mechanics.

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use netgate_core::{AccessToken, ErrorResponse, LoginRequest};

use crate::error::Error;
use crate::transport::TransportConfig;

/// Async client for a NetGate server.
pub struct NetgateClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
}

impl NetgateClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a base URL and transport config.
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::from_reqwest(base_url, http)
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let mut url = Url::parse(base_url)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(Self {
            http,
            base_url: url,
            token: None,
        })
    }

    /// Reuse a previously issued bearer token.
    pub fn with_token(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn is_logged_in(&self) -> bool {
        self.token.is_some()
    }

    // ── Authentication ───────────────────────────────────────────────

    /// Exchange credentials for a bearer token and keep it for later calls.
    pub async fn login(
        &mut self,
        username: &str,
        password: &SecretString,
    ) -> Result<AccessToken, Error> {
        let url = self.url("auth/login")?;
        debug!("POST {url}");

        let body = LoginRequest {
            username: username.to_owned(),
            password: password.expose_secret().to_owned(),
        };
        let resp = self.http.post(url).json(&body).send().await?;
        let token: AccessToken = handle_response(resp).await?;

        debug!(username, "logged in");
        self.token = Some(SecretString::from(token.access_token.clone()));
        Ok(token)
    }

    /// Drop the stored token.
    pub fn logout(&mut self) {
        self.token = None;
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join a relative path (e.g. `"firewall/rules"`) onto the base URL.
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    fn request(&self, method: Method, url: Url) -> Result<reqwest::RequestBuilder, Error> {
        let token = self.token.as_ref().ok_or(Error::NotLoggedIn)?;
        Ok(self
            .http
            .request(method, url)
            .bearer_auth(token.expose_secret()))
    }

    /// Unauthenticated request (`/`, `/auth/register`).
    pub(crate) async fn send_public<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("{method} {url}");

        let mut req = self.http.request(method, url);
        if let Some(body) = body {
            req = req.json(body);
        }
        handle_response(req.send().await?).await
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url}");

        let resp = self.request(Method::GET, url)?.send().await?;
        handle_response(resp).await
    }

    pub(crate) async fn get_with_query<T: DeserializeOwned, Q: Serialize + Sync>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url}");

        let resp = self.request(Method::GET, url)?.query(query).send().await?;
        handle_response(resp).await
    }

    pub(crate) async fn send_json<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("{method} {url}");

        let resp = self.request(method, url)?.json(body).send().await?;
        handle_response(resp).await
    }

    pub(crate) async fn send_empty<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("{method} {url}");

        let resp = self.request(method, url)?.send().await?;
        handle_response(resp).await
    }
}

// ── Response handling ────────────────────────────────────────────────

async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status();
    if status.is_success() {
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    } else {
        Err(parse_error(status, resp).await)
    }
}

async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
    let raw = resp.text().await.unwrap_or_default();

    let message = match serde_json::from_str::<ErrorResponse>(&raw) {
        Ok(err) => err.detail,
        Err(_) if raw.is_empty() => status.to_string(),
        Err(_) => raw,
    };

    match status {
        reqwest::StatusCode::UNAUTHORIZED => Error::Authentication { message },
        reqwest::StatusCode::FORBIDDEN => Error::PermissionDenied { message },
        _ => Error::Api {
            status: status.as_u16(),
            message,
        },
    }
}
