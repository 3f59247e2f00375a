use std::sync::Arc;

use serde_json::json;

use sdlc_toolbox_core::{
    ErrorEnvelope, ParamDescriptor, ParamType, RegistrationError, Tool, ToolDescriptor,
    ToolOutcome, ToolRegistry,
};

use crate::integrations::{GitHubClient, IssueQuery};

pub fn register(
    registry: &mut ToolRegistry,
    client: Arc<GitHubClient>,
) -> Result<(), RegistrationError> {
    let issues = client.clone();
    registry.register(Tool::new(
        ToolDescriptor::new(
            "list_issues",
            "List issues in a GitHub repository, optionally filtered by label and state. \
             Returns number, title, url, state, author and body for each issue.",
        )
        .param(ParamDescriptor::required(
            "owner",
            ParamType::String,
            "Repository owner (user or organization)",
        ))
        .param(ParamDescriptor::required("repo", ParamType::String, "Repository name"))
        .param(ParamDescriptor::optional(
            "labels",
            ParamType::String,
            "Comma-separated label names, e.g. 'bug'",
        ))
        .param(
            ParamDescriptor::required("state", ParamType::String, "open, closed or all")
                .with_default("open"),
        ),
        move |args, ctx| {
            let query = IssueQuery {
                owner: args.str("owner").to_string(),
                repo: args.str("repo").to_string(),
                labels: args.opt_str("labels").map(str::to_string),
                state: args.str("state").to_string(),
            };
            ctx.debug(format!(
                "Listing {} issues in {}/{}",
                query.state, query.owner, query.repo
            ));

            match issues.list_issues(&query) {
                Ok(found) => {
                    ctx.info(format!("Found {} issues", found.len()));
                    ToolOutcome::Json(json!(found))
                }
                Err(err) => {
                    ctx.error(format!("Error listing issues: {}", err));
                    ErrorEnvelope::upstream("Failed to list issues", &err).into()
                }
            }
        },
    ))?;

    registry.register(Tool::new(
        ToolDescriptor::new("get_user", "Get the public GitHub profile of a user.")
            .param(ParamDescriptor::required("username", ParamType::String, "GitHub login")),
        move |args, ctx| {
            let username = args.str("username");
            ctx.debug(format!("Fetching GitHub user {}", username));

            match client.get_user(username) {
                Ok(user) => ToolOutcome::Json(user),
                Err(err) => {
                    ctx.error(format!("Error fetching user: {}", err));
                    let status = err
                        .status()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| err.detail().to_string());
                    ToolOutcome::failure(format!("Error: {}", status))
                }
            }
        },
    ))?;

    Ok(())
}
