// ── Shared handler state ──

use std::sync::Arc;
use std::time::Duration;

use netgate_core::{Command, CommandResult, Controller};

use crate::error::ApiError;

/// Timeout for downloading remote adblock lists.
pub const ADBLOCK_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Cheaply cloneable state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    controller: Controller,
    http: reqwest::Client,
}

impl AppState {
    pub fn new(controller: Controller) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(ADBLOCK_FETCH_TIMEOUT)
            .build()?;
        Ok(Self {
            inner: Arc::new(AppStateInner {
                controller,
                http,
            }),
        })
    }

    pub fn controller(&self) -> &Controller {
        &self.inner.controller
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }

    /// Run a command through the controller's command queue.
    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, ApiError> {
        Ok(self.inner.controller.execute(cmd).await?)
    }
}
