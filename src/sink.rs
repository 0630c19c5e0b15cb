use reqwest::{Client, StatusCode};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, trace};

use crate::config::SlackConfig;
use crate::ip_source::ip_source::{NotifierError, Protocol};

const COLOR_SUCCESS: &str = "#00d000";
const COLOR_FAILURE: &str = "#d00000";

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Error while posting to slack: {0}")]
    Request(#[from] reqwest::Error),
    #[error("slack status code: {0}")]
    Status(StatusCode),
}

/// Outcome of checking one protocol.
#[derive(Debug)]
pub enum NotifyResult {
    Success { protocol: Protocol, ip: String },
    Failure {
        protocol: Protocol,
        error: NotifierError,
    },
}

impl NotifyResult {
    pub fn is_failure(&self) -> bool {
        matches!(self, NotifyResult::Failure { .. })
    }

    fn message(&self) -> String {
        match self {
            NotifyResult::Success { ip, .. } => ip.clone(),
            NotifyResult::Failure { error, .. } => error.to_string(),
        }
    }

    fn color(&self) -> &'static str {
        match self {
            NotifyResult::Success { .. } => COLOR_SUCCESS,
            NotifyResult::Failure { .. } => COLOR_FAILURE,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct Field {
    pub title: String,
    pub value: String,
}

#[derive(Serialize, Debug)]
pub struct Attachment {
    pub fallback: String,
    pub color: &'static str,
    pub fields: Vec<Field>,
}

#[derive(Serialize, Debug)]
pub struct SlackPayload {
    pub attachments: Vec<Attachment>,
}

impl SlackPayload {
    pub fn new(result: &NotifyResult, id: &str) -> Self {
        let message = result.message();
        SlackPayload {
            attachments: vec![Attachment {
                fallback: message.clone(),
                color: result.color(),
                fields: vec![Field {
                    title: id.to_string(),
                    value: message,
                }],
            }],
        }
    }
}

/// Slack incoming webhook. Does nothing when disabled in the config.
pub struct Sink {
    client: Client,
    hook_url: Option<String>,
}

impl Sink {
    pub fn new(client: Client, config: &SlackConfig) -> Self {
        Sink {
            client,
            hook_url: config.enable.then(|| config.hook_url.clone()),
        }
    }

    /// Best effort: delivery problems are logged, never returned.
    pub async fn report(&self, result: &NotifyResult, id: &str) {
        let Some(hook_url) = &self.hook_url else {
            return;
        };
        match result {
            NotifyResult::Success { protocol, .. } => {
                debug!(%protocol, "sending result to slack")
            }
            NotifyResult::Failure { protocol, .. } => {
                debug!(%protocol, "sending error to slack")
            }
        }
        if let Err(err) = self.deliver(hook_url, &SlackPayload::new(result, id)).await {
            error!("{}", err);
        }
    }

    async fn deliver(&self, hook_url: &str, payload: &SlackPayload) -> Result<(), SinkError> {
        trace!("hook url: {}", hook_url);
        match serde_json::to_string(payload) {
            Ok(body) => trace!("hook body: {}", body),
            Err(err) => trace!("hook body not serializable: {}", err),
        }
        let response = self.client.post(hook_url).json(payload).send().await?;
        match response.status() {
            StatusCode::OK => Ok(()),
            status => Err(SinkError::Status(status)),
        }
    }
}
