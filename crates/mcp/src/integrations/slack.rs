use reqwest::blocking::Client;
use serde_json::{json, Value};

use sdlc_toolbox_core::{http_client, send, ConfigError, Environment, UpstreamError};

#[derive(Debug, Clone)]
pub struct SlackConfig {
    /// Workflow webhook; the URL itself is the credential.
    pub webhook_url: String,
    pub member_id: String,
}

impl SlackConfig {
    pub fn from_env(env: &Environment) -> Result<Self, ConfigError> {
        let mut values = env
            .require_all(&["SLACK_WORKFLOW_SECRET_URI", "MY_SLACK_MEMBER_ID"])?
            .into_iter();

        Ok(Self {
            webhook_url: values.next().unwrap_or_default(),
            member_id: values.next().unwrap_or_default(),
        })
    }
}

pub struct SlackWorkflow {
    client: Client,
    config: SlackConfig,
}

impl SlackWorkflow {
    pub fn new(config: SlackConfig) -> Result<Self, UpstreamError> {
        Ok(Self {
            client: http_client(None)?,
            config,
        })
    }

    pub fn payload(&self, content: &str) -> Value {
        json!({
            "content": content,
            "posted-by": self.config.member_id,
        })
    }

    /// Post `content` to the workflow. Only a 200 counts; workflow webhooks
    /// usually answer with an empty body, which reads as `{"ok": true}`.
    pub fn share(&self, content: &str) -> Result<Value, UpstreamError> {
        let request = self
            .client
            .post(&self.config.webhook_url)
            .json(&self.payload(content));
        let response = send(request)?;

        if response.status != 200 {
            return Err(response.status_error());
        }

        Ok(response.json().unwrap_or_else(|_| json!({ "ok": true })))
    }
}
