use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use serde_json::{json, Value};
use std::io;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use sdlc_toolbox_core::{Environment, UpstreamError};
use sdlc_toolbox_mcp::integrations::{
    user_activity_query, GitHubClient, GitHubConfig, InsightsClient, InsightsConfig, IssueQuery,
    IssueSummary, DEFAULT_TIMESPAN,
};

#[derive(Parser)]
#[command(name = "sdlc-toolbox")]
#[command(version)]
#[command(about = "Query GitHub and Application Insights from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List issues in a repository
    Issues {
        #[arg(short, long, env = "GITHUB_OWNER", help = "Repository owner")]
        owner: String,
        #[arg(short, long, env = "GITHUB_REPO", help = "Repository name")]
        repo: String,
        #[arg(short, long, help = "Only issues with this label (e.g. bug)")]
        label: Option<String>,
        #[arg(short, long, default_value = "all", help = "open, closed or all")]
        state: String,
        #[arg(short, long, help = "Print author, state and body as well")]
        detailed: bool,
    },
    /// Show a GitHub user's public profile
    User {
        #[arg(help = "GitHub login")]
        username: String,
    },
    /// Requests made by one authenticated user, from Application Insights
    Activity {
        #[arg(help = "Authenticated user id, usually an email address")]
        user_id: String,
        #[arg(
            short,
            long,
            default_value = DEFAULT_TIMESPAN,
            help = "ISO-8601 duration to look back over"
        )]
        timespan: String,
    },
    /// Generate shell completions
    Completions {
        #[arg(help = "Shell to generate for (bash, zsh, fish, powershell)")]
        shell: Shell,
    },
}

fn main() -> Result<ExitCode> {
    let env = Environment::from_process();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Issues {
            owner,
            repo,
            label,
            state,
            detailed,
        } => cmd_issues(
            &env,
            IssueQuery {
                owner,
                repo,
                labels: label,
                state,
            },
            detailed,
        ),
        Commands::User { username } => cmd_user(&env, &username),
        Commands::Activity { user_id, timespan } => cmd_activity(&env, &user_id, &timespan),
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "sdlc-toolbox", &mut io::stdout());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn github(env: &Environment) -> Result<GitHubClient> {
    let config = GitHubConfig::from_env(env)?;
    GitHubClient::new(config).context("cannot create GitHub client")
}

fn cmd_issues(env: &Environment, query: IssueQuery, detailed: bool) -> Result<ExitCode> {
    tracing::debug!(
        owner = %query.owner,
        repo = %query.repo,
        state = %query.state,
        "listing issues"
    );
    let issues = match github(env)?.list_issues(&query) {
        Ok(issues) => issues,
        Err(err) => return Ok(report_failure(&err)),
    };

    if issues.is_empty() {
        eprintln!("No issues found in {}/{}", query.owner, query.repo);
    }
    for issue in &issues {
        if detailed {
            println!("{}", format_detailed(issue));
        } else {
            println!("{}", format_line(issue));
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn cmd_user(env: &Environment, username: &str) -> Result<ExitCode> {
    match github(env)?.get_user(username) {
        Ok(user) => {
            println!("{}", serde_json::to_string_pretty(&user)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            println!("{}", user_error(&err));
            Ok(ExitCode::FAILURE)
        }
    }
}

fn cmd_activity(env: &Environment, user_id: &str, timespan: &str) -> Result<ExitCode> {
    tracing::debug!(user_id, timespan, "querying user activity");
    let client = InsightsClient::new(InsightsConfig::from_env(env)?)
        .context("cannot create Application Insights client")?;

    match client.query(&user_activity_query(user_id), timespan) {
        Ok(tables) => {
            println!("{}", serde_json::to_string_pretty(&tables)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => Ok(report_failure(&err)),
    }
}

fn format_line(issue: &IssueSummary) -> String {
    format!("{}: {}", issue.title, issue.url)
}

fn format_detailed(issue: &IssueSummary) -> String {
    format!(
        "Title: {}\nURL: {}\nAuthor: {}\nState: {}\n\n{}\n{}",
        issue.title,
        issue.url,
        issue.user.as_deref().unwrap_or("unknown"),
        issue.state,
        issue.body.as_deref().unwrap_or("(no description)").trim(),
        "-".repeat(40)
    )
}

fn failure_message(err: &UpstreamError) -> String {
    match err.status() {
        Some(status) => format!("Error: {} - {}", status, err.detail()),
        None => format!("Error: {}", err),
    }
}

fn user_error(err: &UpstreamError) -> Value {
    match err.status() {
        Some(status) => json!({ "error": format!("Error: {}", status) }),
        None => json!({ "error": format!("Error: {}", err) }),
    }
}

fn report_failure(err: &UpstreamError) -> ExitCode {
    eprintln!("{}", failure_message(err));
    ExitCode::FAILURE
}
