//! Clients for the upstream systems the tool servers wrap.
//!
//! Each client owns an explicit config built from the [`Environment`] at
//! startup and makes blocking requests; none of them retries.
//!
//! [`Environment`]: sdlc_toolbox_core::Environment

pub mod datetime;
pub mod devops;
pub mod github;
pub mod insights;
pub mod slack;
pub mod templates;

pub use datetime::{current_datetime, DateFormat, DateTimeError, DateTimeReport};
pub use devops::{
    story_patch_document, user_stories_wiql, DevOpsClient, DevOpsConfig, PatchOperation,
    StoryError, StoryFilter, Team, TeamProject, UserStory,
};
pub use github::{GitHubClient, GitHubConfig, IssueQuery, IssueSummary};
pub use insights::{user_activity_query, InsightsClient, InsightsConfig, DEFAULT_TIMESPAN};
pub use slack::{SlackConfig, SlackWorkflow};
pub use templates::{TemplateError, TemplateStore, TEMPLATE_FILES};
