use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use sdlc_toolbox_core::{http_client, send, ConfigError, Environment, UpstreamError};

pub const GITHUB_API: &str = "https://api.github.com";
const ACCEPT: &str = "application/vnd.github.v3+json";
const TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub token: String,
    pub api_base: String,
}

impl GitHubConfig {
    pub fn from_env(env: &Environment) -> Result<Self, ConfigError> {
        Ok(Self {
            token: env.require("GITHUB_TOKEN")?,
            api_base: GITHUB_API.to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct IssueQuery {
    pub owner: String,
    pub repo: String,
    pub labels: Option<String>,
    pub state: String,
}

#[derive(Debug, Deserialize)]
struct IssueItem {
    number: u64,
    title: String,
    html_url: String,
    state: String,
    user: Option<Owner>,
    body: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Owner {
    login: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueSummary {
    pub number: u64,
    pub title: String,
    pub url: String,
    pub state: String,
    pub user: Option<String>,
    pub body: Option<String>,
}

impl From<IssueItem> for IssueSummary {
    fn from(item: IssueItem) -> Self {
        Self {
            number: item.number,
            title: item.title,
            url: item.html_url,
            state: item.state,
            user: item.user.map(|u| u.login),
            body: item.body,
        }
    }
}

pub struct GitHubClient {
    client: Client,
    config: GitHubConfig,
}

impl GitHubClient {
    pub fn new(config: GitHubConfig) -> Result<Self, UpstreamError> {
        Ok(Self {
            client: http_client(Some(TIMEOUT))?,
            config,
        })
    }

    fn get(&self, url: &str) -> reqwest::blocking::RequestBuilder {
        self.client
            .get(url)
            .header("Accept", ACCEPT)
            .bearer_auth(&self.config.token)
    }

    pub fn issues_url(&self, owner: &str, repo: &str) -> String {
        format!(
            "{}/repos/{}/{}/issues",
            self.config.api_base,
            urlencoding::encode(owner),
            urlencoding::encode(repo)
        )
    }

    pub fn list_issues(&self, query: &IssueQuery) -> Result<Vec<IssueSummary>, UpstreamError> {
        let mut params = vec![("state", query.state.as_str())];
        if let Some(labels) = query.labels.as_deref().filter(|l| !l.is_empty()) {
            params.push(("labels", labels));
        }

        let request = self
            .get(&self.issues_url(&query.owner, &query.repo))
            .query(&params);
        let response = send(request)?;

        if !response.is_success() {
            return Err(response.status_error());
        }

        let items: Vec<IssueItem> = response.json()?;
        Ok(items.into_iter().map(IssueSummary::from).collect())
    }

    /// The public profile of `username`, exactly as GitHub returns it.
    pub fn get_user(&self, username: &str) -> Result<Value, UpstreamError> {
        let url = format!(
            "{}/users/{}",
            self.config.api_base,
            urlencoding::encode(username)
        );
        send(self.get(&url))?.json_if_success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::Method::GET;
    use httpmock::MockServer;
    use serde_json::json;

    fn client(server: &MockServer) -> GitHubClient {
        GitHubClient::new(GitHubConfig {
            token: "ghp_test".into(),
            api_base: server.base_url(),
        })
        .unwrap()
    }

    #[test]
    fn list_issues_sends_filters_and_reshapes() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/repos/Bouvet-AI-Sandbox/mcp-bug-triage/issues")
                .query_param("labels", "bug")
                .query_param("state", "all")
                .header("authorization", "Bearer ghp_test");
            then.status(200).json_body(json!([{
                "number": 12,
                "title": "Login fails",
                "html_url": "https://github.com/Bouvet-AI-Sandbox/mcp-bug-triage/issues/12",
                "state": "open",
                "user": { "login": "kjarisk" },
                "body": "Steps to reproduce"
            }]));
        });

        let issues = client(&server)
            .list_issues(&IssueQuery {
                owner: "Bouvet-AI-Sandbox".into(),
                repo: "mcp-bug-triage".into(),
                labels: Some("bug".into()),
                state: "all".into(),
            })
            .unwrap();

        mock.assert();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].title, "Login fails");
        assert_eq!(issues[0].user.as_deref(), Some("kjarisk"));
        assert!(issues[0].url.ends_with("/issues/12"));
    }

    #[test]
    fn list_issues_surfaces_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/repos/o/r/issues");
            then.status(401).body("Bad credentials");
        });

        let err = client(&server)
            .list_issues(&IssueQuery {
                owner: "o".into(),
                repo: "r".into(),
                labels: None,
                state: "open".into(),
            })
            .unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.detail(), "Bad credentials");
    }

    #[test]
    fn get_user_returns_body_verbatim() {
        let server = MockServer::start();
        let body = json!({ "login": "kjarisk", "public_repos": 7 });
        server.mock(|when, then| {
            when.method(GET)
                .path("/users/kjarisk")
                .header("accept", ACCEPT);
            then.status(200).json_body(body.clone());
        });

        assert_eq!(client(&server).get_user("kjarisk").unwrap(), body);
    }

    #[test]
    fn config_requires_token() {
        let err = GitHubConfig::from_env(&Environment::default()).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Missing {
                names: vec!["GITHUB_TOKEN".into()]
            }
        );
    }
}
