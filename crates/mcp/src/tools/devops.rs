use std::sync::Arc;

use serde_json::json;

use sdlc_toolbox_core::{
    ErrorEnvelope, ParamDescriptor, ParamType, RegistrationError, Tool, ToolDescriptor,
    ToolOutcome, ToolRegistry,
};

use crate::integrations::{
    story_patch_document, user_stories_wiql, DevOpsClient, StoryError, StoryFilter,
};

const DEFAULT_TOP: i64 = 100;

pub fn register(
    registry: &mut ToolRegistry,
    client: Arc<DevOpsClient>,
) -> Result<(), RegistrationError> {
    let stories = client.clone();
    registry.register(Tool::new(
        ToolDescriptor::new(
            "get_user_stories",
            "Get user stories from Azure DevOps for a specific team project. \
             Returns a list of user stories with details like ID, title, state, and assigned to.",
        )
        .param(ParamDescriptor::required(
            "team_project",
            ParamType::String,
            "The team project name",
        ))
        .param(ParamDescriptor::optional(
            "team",
            ParamType::String,
            "The team name (optional)",
        ))
        .param(ParamDescriptor::optional(
            "state",
            ParamType::String,
            "Filter by state (e.g., 'New', 'Active', 'Closed')",
        ))
        .param(ParamDescriptor::optional(
            "assigned_to",
            ParamType::String,
            "Filter by assigned user email",
        ))
        .param(
            ParamDescriptor::required("top", ParamType::Integer, "Number of work items to return")
                .with_default(DEFAULT_TOP),
        ),
        move |args, ctx| {
            let filter = StoryFilter {
                team_project: args.str("team_project").to_string(),
                state: args.opt_str("state").map(str::to_string),
                assigned_to: args.opt_str("assigned_to").map(str::to_string),
                top: usize::try_from(args.int("top").unwrap_or(DEFAULT_TOP)).unwrap_or(0),
            };
            if let Some(team) = args.opt_str("team") {
                ctx.warning(format!("Team '{}' given; stories are not filtered by team", team));
            }
            ctx.debug(format!(
                "WIQL Query: {}",
                user_stories_wiql(
                    Some(filter.team_project.as_str()),
                    filter.state.as_deref(),
                    filter.assigned_to.as_deref(),
                )
            ));

            match stories.get_user_stories(&filter) {
                Ok(found) => ToolOutcome::Json(json!({ "user_stories": found })),
                Err(StoryError::Query(err)) => {
                    ctx.error(format!("Error in WIQL query: {}", err));
                    ErrorEnvelope::upstream("Failed to query work items", &err).into()
                }
                Err(StoryError::Fetch(err)) => {
                    ctx.error(format!("Error fetching work items: {}", err));
                    ErrorEnvelope::upstream("Failed to fetch work items", &err).into()
                }
            }
        },
    ))?;

    let teams = client.clone();
    registry.register(Tool::new(
        ToolDescriptor::new(
            "get_teams",
            "Get teams from Azure DevOps. If team_project is provided, returns teams for that \
             project. Otherwise, returns all teams in the organization.",
        )
        .param(ParamDescriptor::optional(
            "team_project",
            ParamType::String,
            "The team project name (optional)",
        )),
        move |args, ctx| {
            let project = args.opt_str("team_project");
            ctx.debug(format!(
                "Fetching teams in {}",
                project.unwrap_or(teams.organization())
            ));

            match teams.get_teams(project) {
                Ok(found) => ToolOutcome::Json(json!({ "teams": found })),
                Err(err) => {
                    ctx.error(format!("Error fetching teams: {}", err));
                    ErrorEnvelope::upstream("Failed to fetch teams", &err).into()
                }
            }
        },
    ))?;

    let projects = client.clone();
    registry.register(Tool::new(
        ToolDescriptor::new(
            "get_team_projects",
            "Get team projects from Azure DevOps. Returns a list of all team projects in the \
             organization.",
        ),
        move |_args, ctx| {
            ctx.debug(format!("Fetching projects in {}", projects.organization()));

            match projects.get_team_projects() {
                Ok(found) => ToolOutcome::Json(json!({ "projects": found })),
                Err(err) => {
                    ctx.error(format!("Error fetching projects: {}", err));
                    ErrorEnvelope::upstream("Failed to fetch projects", &err).into()
                }
            }
        },
    ))?;

    registry.register(Tool::new(
        ToolDescriptor::new(
            "create_user_story",
            "Create a new user story in Azure DevOps. Returns the created user story details.",
        )
        .param(ParamDescriptor::required(
            "team_project",
            ParamType::String,
            "The team project name",
        ))
        .param(ParamDescriptor::required(
            "title",
            ParamType::String,
            "Title of the user story",
        ))
        .param(ParamDescriptor::optional(
            "description",
            ParamType::String,
            "Description of the user story",
        ))
        .param(ParamDescriptor::optional(
            "assigned_to",
            ParamType::String,
            "Email of the user to assign the story to",
        )),
        move |args, ctx| {
            let document = story_patch_document(
                args.str("title"),
                args.opt_str("description"),
                args.opt_str("assigned_to"),
            );
            ctx.debug(format!("Creating user story: {}", json!(document)));

            match client.create_user_story(args.str("team_project"), &document) {
                Ok(story) => ToolOutcome::Json(json!({ "user_story": story })),
                Err(err) => {
                    ctx.error(format!("Error creating user story: {}", err));
                    ErrorEnvelope::upstream("Failed to create user story", &err).into()
                }
            }
        },
    ))?;

    Ok(())
}
