use reqwest::blocking::Client;
use serde_json::Value;

use sdlc_toolbox_core::{http_client, send, ConfigError, Environment, UpstreamError};

pub const APP_INSIGHTS_API: &str = "https://api.applicationinsights.io";

/// ISO-8601 duration used when a caller gives no time window: one day.
pub const DEFAULT_TIMESPAN: &str = "P1D";

#[derive(Debug, Clone)]
pub struct InsightsConfig {
    pub app_id: String,
    pub api_key: String,
    pub api_base: String,
}

impl InsightsConfig {
    pub fn from_env(env: &Environment) -> Result<Self, ConfigError> {
        let mut values = env
            .require_all(&["APPLICATION_INSIGHT_APP_ID", "APPLICATION_INSIGHT_API_KEY"])?
            .into_iter();

        Ok(Self {
            app_id: values.next().unwrap_or_default(),
            api_key: values.next().unwrap_or_default(),
            api_base: APP_INSIGHTS_API.to_string(),
        })
    }
}

pub struct InsightsClient {
    client: Client,
    config: InsightsConfig,
}

impl InsightsClient {
    pub fn new(config: InsightsConfig) -> Result<Self, UpstreamError> {
        Ok(Self {
            client: http_client(None)?,
            config,
        })
    }

    pub fn query_url(&self) -> String {
        format!(
            "{}/v1/apps/{}/query",
            self.config.api_base,
            urlencoding::encode(&self.config.app_id)
        )
    }

    /// Run a KQL query over `timespan` and return the result tables as sent.
    pub fn query(&self, kql: &str, timespan: &str) -> Result<Value, UpstreamError> {
        let request = self
            .client
            .get(self.query_url())
            .query(&[("query", kql), ("timespan", timespan)])
            .header("x-api-key", &self.config.api_key);

        send(request)?.json_if_success()
    }
}

/// KQL listing the requests made by one authenticated user.
pub fn user_activity_query(user_id: &str) -> String {
    format!(
        "requests\n\
         | where customDimensions['User.AuthenticatedUserId'] == \"{}\"\n\
         | project timestamp, name, url, resultCode, duration",
        escape_kql_string(user_id)
    )
}

fn escape_kql_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
