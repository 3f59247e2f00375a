//! The six tool servers. Each one is a [`ToolRegistry`] wrapping one
//! integration client.

pub mod datetime;
pub mod devops;
pub mod github;
pub mod insights;
pub mod slack;
pub mod templates;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use clap::ValueEnum;
use thiserror::Error;

use sdlc_toolbox_core::{ConfigError, Environment, RegistrationError, ToolRegistry, UpstreamError};

use crate::integrations::{
    DevOpsClient, DevOpsConfig, GitHubClient, GitHubConfig, InsightsClient, InsightsConfig,
    SlackConfig, SlackWorkflow, TemplateStore,
};

pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ServerKind {
    /// Issues and user profiles from GitHub
    Github,
    /// Telemetry queries against Application Insights
    Insights,
    /// User stories, teams and projects in Azure DevOps
    Devops,
    /// Share a message with the team through a Slack workflow
    Slack,
    /// SDLC document templates
    Templates,
    /// Current date and time
    Datetime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TransportKind {
    Stdio,
    Sse,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransportKind::Stdio => "stdio",
            TransportKind::Sse => "sse",
        })
    }
}

impl ServerKind {
    /// The name announced in `serverInfo`.
    pub fn server_name(self) -> &'static str {
        match self {
            ServerKind::Github => "GitHubIssues",
            ServerKind::Insights => "AppInsights",
            ServerKind::Devops => "AzureDevOps",
            ServerKind::Slack => "SlackShare",
            ServerKind::Templates => "SDLCTemplates",
            ServerKind::Datetime => "datetime-server",
        }
    }

    pub fn default_transport(self) -> TransportKind {
        match self {
            ServerKind::Insights | ServerKind::Devops => TransportKind::Sse,
            _ => TransportKind::Stdio,
        }
    }

    pub fn default_port(self) -> u16 {
        match self {
            ServerKind::Devops => 8081,
            _ => DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub templates_dir: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not register tool: {0}")]
    Registration(#[from] RegistrationError),
    #[error("could not create HTTP client: {0}")]
    Upstream(#[from] UpstreamError),
}

/// Read the server's configuration from `env` and register its tools.
/// Missing configuration fails here, before anything is served.
pub fn build_registry(
    kind: ServerKind,
    env: &Environment,
    options: &BuildOptions,
) -> Result<ToolRegistry, BuildError> {
    let mut registry = ToolRegistry::new(kind.server_name(), env!("CARGO_PKG_VERSION"));

    match kind {
        ServerKind::Github => {
            let client = GitHubClient::new(GitHubConfig::from_env(env)?)?;
            github::register(&mut registry, Arc::new(client))?;
        }
        ServerKind::Insights => {
            let client = InsightsClient::new(InsightsConfig::from_env(env)?)?;
            insights::register(&mut registry, Arc::new(client))?;
        }
        ServerKind::Devops => {
            let client = DevOpsClient::new(DevOpsConfig::from_env(env)?)?;
            devops::register(&mut registry, Arc::new(client))?;
        }
        ServerKind::Slack => {
            let workflow = SlackWorkflow::new(SlackConfig::from_env(env)?)?;
            slack::register(&mut registry, Arc::new(workflow))?;
        }
        ServerKind::Templates => {
            let store = TemplateStore::from_env(env, options.templates_dir.as_deref());
            tracing::debug!(location = %store.location(), "template source");
            templates::register(&mut registry, Arc::new(store))?;
        }
        ServerKind::Datetime => datetime::register(&mut registry)?,
    }

    tracing::info!(
        server = registry.name(),
        tools = registry.len(),
        "registry ready"
    );
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(registry: &ToolRegistry) -> Vec<&str> {
        registry.descriptors().map(|d| d.name.as_str()).collect()
    }

    #[test]
    fn missing_credentials_fail_the_build() {
        let err = build_registry(
            ServerKind::Devops,
            &Environment::from_pairs([("AZURE_DEVOPS_ORG", "bouvet")]),
            &BuildOptions::default(),
        )
        .unwrap_err();

        assert!(matches!(err, BuildError::Config(ConfigError::Missing { .. })));
        assert_eq!(
            err.to_string(),
            "AZURE_DEVOPS_PAT must be set in the environment or .env file"
        );
    }

    #[test]
    fn each_server_registers_its_tools() {
        let env = Environment::from_pairs([
            ("GITHUB_TOKEN", "t"),
            ("APPLICATION_INSIGHT_APP_ID", "a"),
            ("APPLICATION_INSIGHT_API_KEY", "k"),
            ("AZURE_DEVOPS_ORG", "o"),
            ("AZURE_DEVOPS_PAT", "p"),
            ("SLACK_WORKFLOW_SECRET_URI", "https://hooks.slack.com/triggers/x"),
            ("MY_SLACK_MEMBER_ID", "U1"),
        ]);
        let build = |kind| build_registry(kind, &env, &BuildOptions::default()).unwrap();

        assert_eq!(names(&build(ServerKind::Github)), ["list_issues", "get_user"]);
        assert_eq!(
            names(&build(ServerKind::Insights)),
            ["query_app_insights", "get_user_activity"]
        );
        assert_eq!(
            names(&build(ServerKind::Devops)),
            [
                "get_user_stories",
                "get_teams",
                "get_team_projects",
                "create_user_story"
            ]
        );
        assert_eq!(names(&build(ServerKind::Slack)), ["share_with_team_slack"]);
        assert_eq!(
            names(&build(ServerKind::Templates)),
            [
                "get_template_decision_log",
                "get_template_incident_report",
                "get_template_user_story"
            ]
        );
        assert_eq!(names(&build(ServerKind::Datetime)), ["get_current_datetime"]);
    }

    #[test]
    fn transport_defaults() {
        assert_eq!(ServerKind::Github.default_transport(), TransportKind::Stdio);
        assert_eq!(ServerKind::Insights.default_transport(), TransportKind::Sse);
        assert_eq!(ServerKind::Devops.default_port(), 8081);
        assert_eq!(ServerKind::Insights.default_port(), 8080);
    }
}
