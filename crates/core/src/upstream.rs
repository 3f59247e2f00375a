//! The one HTTP round trip every integration makes.

use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use crate::error::UpstreamError;

pub const USER_AGENT: &str = concat!("sdlc-toolbox/", env!("CARGO_PKG_VERSION"));

/// A blocking client. `None` means no timeout at all; the blocking
/// builder's own 30s default is overridden.
pub fn http_client(timeout: Option<Duration>) -> Result<Client, UpstreamError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(UpstreamError::from)
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: String,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, UpstreamError> {
        serde_json::from_str(&self.body).map_err(|e| UpstreamError::Decode(e.to_string()))
    }

    /// Parse the body when the status is in `accepted`, otherwise turn the
    /// response into [`UpstreamError::Status`].
    pub fn json_if(&self, accepted: &[u16]) -> Result<Value, UpstreamError> {
        if !accepted.contains(&self.status) {
            return Err(self.status_error());
        }
        self.json()
    }

    /// Parse the body of any 2xx response.
    pub fn json_if_success(&self) -> Result<Value, UpstreamError> {
        if !self.is_success() {
            return Err(self.status_error());
        }
        self.json()
    }

    pub fn status_error(&self) -> UpstreamError {
        UpstreamError::Status {
            status: self.status,
            body: self.body.clone(),
        }
    }
}

/// Send `request` and read the whole response. Only transport failures are
/// errors here; callers decide what a status means.
pub fn send(request: RequestBuilder) -> Result<UpstreamResponse, UpstreamError> {
    let response = request.send()?;
    let status = response.status().as_u16();
    let body = response.text()?;

    tracing::debug!(status, bytes = body.len(), "upstream responded");

    Ok(UpstreamResponse { status, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::Method::GET;
    use httpmock::MockServer;
    use serde_json::json;

    #[test]
    fn send_reads_status_and_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/ok");
            then.status(200).json_body(json!({ "value": [1, 2] }));
        });

        let client = http_client(None).unwrap();
        let response = send(client.get(server.url("/ok"))).unwrap();

        mock.assert();
        assert!(response.is_success());
        assert_eq!(response.json_if_success().unwrap(), json!({ "value": [1, 2] }));
    }

    #[test]
    fn requested_timeout_is_enforced() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/slow");
            then.status(200).delay(Duration::from_secs(2)).body("{}");
        });

        let client = http_client(Some(Duration::from_millis(200))).unwrap();
        let err = send(client.get(server.url("/slow"))).unwrap_err();
        assert!(matches!(err, UpstreamError::Transport(_)));
    }

    #[test]
    fn no_timeout_outlasts_the_builder_default() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/long-query");
            then.status(200)
                .delay(Duration::from_secs(31))
                .json_body(json!({ "tables": [] }));
        });

        let client = http_client(None).unwrap();
        let response = send(client.get(server.url("/long-query"))).unwrap();

        mock.assert();
        assert_eq!(response.json_if_success().unwrap(), json!({ "tables": [] }));
    }

    #[test]
    fn non_success_becomes_status_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/missing");
            then.status(404).body("no such thing");
        });

        let client = http_client(None).unwrap();
        let response = send(client.get(server.url("/missing"))).unwrap();

        let err = response.json_if_success().unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.detail(), "no such thing");
    }

    #[test]
    fn json_if_honours_the_accepted_set() {
        let created = UpstreamResponse {
            status: 201,
            body: "{\"id\": 7}".into(),
        };
        assert_eq!(created.json_if(&[200, 201]).unwrap(), json!({ "id": 7 }));

        let no_content = UpstreamResponse {
            status: 204,
            body: String::new(),
        };
        assert!(no_content.json_if(&[200]).is_err());
    }

    #[test]
    fn garbage_body_is_a_decode_error() {
        let response = UpstreamResponse {
            status: 200,
            body: "<html>".into(),
        };
        assert!(matches!(
            response.json_if_success(),
            Err(UpstreamError::Decode(_))
        ));
    }
}
