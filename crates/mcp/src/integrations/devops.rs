use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::blocking::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use sdlc_toolbox_core::{http_client, send, ConfigError, Environment, UpstreamError};

pub const AZURE_DEVOPS_HOST: &str = "https://dev.azure.com";
const API_VERSION: &str = "6.0";

const STORY_FIELDS: &str = "SELECT [System.Id], [System.Title], [System.State], \
    [System.AssignedTo], [System.CreatedDate], [System.Description] \
    FROM WorkItems \
    WHERE [System.WorkItemType] = 'User Story' ";

#[derive(Debug, Clone)]
pub struct DevOpsConfig {
    pub organization: String,
    pub pat: String,
    /// Organization URL, `https://dev.azure.com/{org}` unless overridden.
    pub base_url: String,
}

impl DevOpsConfig {
    pub fn from_env(env: &Environment) -> Result<Self, ConfigError> {
        let mut values = env
            .require_all(&["AZURE_DEVOPS_ORG", "AZURE_DEVOPS_PAT"])?
            .into_iter();
        let organization = values.next().unwrap_or_default();
        let pat = values.next().unwrap_or_default();

        Ok(Self {
            base_url: format!("{}/{}", AZURE_DEVOPS_HOST, organization),
            organization,
            pat,
        })
    }

    fn auth_header(&self) -> String {
        format!("Basic {}", STANDARD.encode(format!(":{}", self.pat)))
    }
}

#[derive(Debug, Clone, Default)]
pub struct StoryFilter {
    pub team_project: String,
    pub state: Option<String>,
    pub assigned_to: Option<String>,
    pub top: usize,
}

/// One operation of a JSON-patch document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOperation {
    pub op: String,
    pub path: String,
    pub value: Value,
}

impl PatchOperation {
    fn add_field(field: &str, value: &str) -> Self {
        Self {
            op: "add".to_string(),
            path: format!("/fields/{}", field),
            value: json!(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStory {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub state: Option<String>,
    pub assigned_to: Option<String>,
    pub created_date: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub project_name: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamProject {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub state: Option<String>,
    pub visibility: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WiqlResult {
    #[serde(default, rename = "workItems")]
    work_items: Vec<WorkItemRef>,
}

#[derive(Debug, Deserialize)]
struct WorkItemRef {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct ValueList<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct WorkItem {
    id: Option<i64>,
    #[serde(default)]
    fields: WorkItemFields,
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WorkItemFields {
    #[serde(rename = "System.Title")]
    title: Option<String>,
    #[serde(rename = "System.State")]
    state: Option<String>,
    #[serde(rename = "System.AssignedTo")]
    assigned_to: Option<Identity>,
    #[serde(rename = "System.CreatedDate")]
    created_date: Option<String>,
    #[serde(rename = "System.Description")]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Identity {
    #[serde(rename = "displayName")]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TeamItem {
    id: Option<String>,
    name: Option<String>,
    description: Option<String>,
    #[serde(rename = "projectName")]
    project_name: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProjectItem {
    id: Option<String>,
    name: Option<String>,
    description: Option<String>,
    url: Option<String>,
    state: Option<String>,
    visibility: Option<String>,
}

impl From<WorkItem> for UserStory {
    fn from(item: WorkItem) -> Self {
        Self {
            id: item.id,
            title: item.fields.title,
            state: item.fields.state,
            assigned_to: item.fields.assigned_to.and_then(|a| a.display_name),
            created_date: item.fields.created_date,
            description: item.fields.description,
            url: item.url,
        }
    }
}

impl From<TeamItem> for Team {
    fn from(item: TeamItem) -> Self {
        Self {
            id: item.id,
            name: item.name,
            description: item.description,
            project_name: item.project_name,
            url: item.url,
        }
    }
}

impl From<ProjectItem> for TeamProject {
    fn from(item: ProjectItem) -> Self {
        Self {
            id: item.id,
            name: item.name,
            description: item.description,
            url: item.url,
            state: item.state,
            visibility: item.visibility,
        }
    }
}

fn wiql_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// WIQL selecting user stories, newest first, narrowed by whichever of the
/// filters are present.
pub fn user_stories_wiql(
    team_project: Option<&str>,
    state: Option<&str>,
    assigned_to: Option<&str>,
) -> String {
    let conditions: Vec<String> = [
        ("System.TeamProject", team_project),
        ("System.State", state),
        ("System.AssignedTo", assigned_to),
    ]
    .into_iter()
    .filter_map(|(field, value)| {
        value
            .filter(|v| !v.is_empty())
            .map(|v| format!("[{}] = '{}'", field, wiql_literal(v)))
    })
    .collect();

    let mut query = STORY_FIELDS.to_string();
    if !conditions.is_empty() {
        query.push_str("AND ");
        query.push_str(&conditions.join(" AND "));
    }
    query.push_str(" ORDER BY [System.CreatedDate] DESC");
    query
}

/// JSON-patch document creating a user story. The title is always set;
/// description and assignee only when given.
pub fn story_patch_document(
    title: &str,
    description: Option<&str>,
    assigned_to: Option<&str>,
) -> Vec<PatchOperation> {
    let mut document = vec![PatchOperation::add_field("System.Title", title)];
    if let Some(description) = description.filter(|d| !d.is_empty()) {
        document.push(PatchOperation::add_field("System.Description", description));
    }
    if let Some(assigned_to) = assigned_to.filter(|a| !a.is_empty()) {
        document.push(PatchOperation::add_field("System.AssignedTo", assigned_to));
    }
    document
}

pub struct DevOpsClient {
    client: Client,
    config: DevOpsConfig,
}

impl DevOpsClient {
    pub fn new(config: DevOpsConfig) -> Result<Self, UpstreamError> {
        Ok(Self {
            client: http_client(None)?,
            config,
        })
    }

    pub fn organization(&self) -> &str {
        &self.config.organization
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("Authorization", self.config.auth_header())
    }

    fn api_url(&self, path: &str) -> String {
        format!(
            "{}/{}?api-version={}",
            self.config.base_url, path, API_VERSION
        )
    }

    pub fn query_work_item_ids(&self, wiql: &str) -> Result<Vec<i64>, UpstreamError> {
        let request = self
            .authorized(self.client.post(self.api_url("_apis/wit/wiql")))
            .json(&json!({ "query": wiql }));
        let response = send(request)?;
        if response.status != 200 {
            return Err(response.status_error());
        }

        let result: WiqlResult = response.json()?;
        Ok(result.work_items.into_iter().map(|w| w.id).collect())
    }

    pub fn get_work_items(&self, ids: &[i64]) -> Result<Vec<UserStory>, UpstreamError> {
        let ids = ids
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let url = format!(
            "{}/_apis/wit/workitems?ids={}&api-version={}&$expand=all",
            self.config.base_url, ids, API_VERSION
        );

        let response = send(self.authorized(self.client.get(url)))?;
        if response.status != 200 {
            return Err(response.status_error());
        }

        let items: ValueList<WorkItem> = response.json()?;
        Ok(items.value.into_iter().map(UserStory::from).collect())
    }

    /// Run the story query and fetch details for at most `top` of the hits.
    /// No ids means no second request.
    pub fn get_user_stories(&self, filter: &StoryFilter) -> Result<Vec<UserStory>, StoryError> {
        let wiql = user_stories_wiql(
            Some(filter.team_project.as_str()),
            filter.state.as_deref(),
            filter.assigned_to.as_deref(),
        );

        let mut ids = self.query_work_item_ids(&wiql).map_err(StoryError::Query)?;
        ids.truncate(filter.top);
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        self.get_work_items(&ids).map_err(StoryError::Fetch)
    }

    pub fn get_teams(&self, team_project: Option<&str>) -> Result<Vec<Team>, UpstreamError> {
        let path = match team_project.filter(|p| !p.is_empty()) {
            Some(project) => format!("_apis/projects/{}/teams", urlencoding::encode(project)),
            None => "_apis/teams".to_string(),
        };

        let response = send(self.authorized(self.client.get(self.api_url(&path))))?;
        if response.status != 200 {
            return Err(response.status_error());
        }

        let teams: ValueList<TeamItem> = response.json()?;
        Ok(teams.value.into_iter().map(Team::from).collect())
    }

    pub fn get_team_projects(&self) -> Result<Vec<TeamProject>, UpstreamError> {
        let response = send(self.authorized(self.client.get(self.api_url("_apis/projects"))))?;
        if response.status != 200 {
            return Err(response.status_error());
        }

        let projects: ValueList<ProjectItem> = response.json()?;
        Ok(projects.value.into_iter().map(TeamProject::from).collect())
    }

    pub fn create_user_story(
        &self,
        team_project: &str,
        document: &[PatchOperation],
    ) -> Result<UserStory, UpstreamError> {
        let path = format!(
            "{}/_apis/wit/workitems/$User%20Story",
            urlencoding::encode(team_project)
        );
        let body =
            serde_json::to_string(document).map_err(|e| UpstreamError::Decode(e.to_string()))?;
        let request = self
            .authorized(self.client.post(self.api_url(&path)))
            .header("Content-Type", "application/json-patch+json")
            .body(body);

        let created = send(request)?.json_if(&[200, 201])?;
        let item: WorkItem =
            serde_json::from_value(created).map_err(|e| UpstreamError::Decode(e.to_string()))?;
        Ok(UserStory::from(item))
    }
}

/// Which of the two story requests failed.
#[derive(Debug, thiserror::Error)]
pub enum StoryError {
    #[error("query work items: {0}")]
    Query(#[source] UpstreamError),
    #[error("fetch work items: {0}")]
    Fetch(#[source] UpstreamError),
}
