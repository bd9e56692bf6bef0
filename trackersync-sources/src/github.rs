//! GitHub issues over the REST v3 API.
//!
//! GitHub is the primary tracker by default: it assigns issue numbers. Its
//! open-issue listing never includes closed issues, because that list only
//! grows; closed issues are reached one at a time through `get_issue`.

use serde::{Deserialize, Serialize};
use trackersync_core::{
    Issue, IssueField, IssueFields, IssueState, SettingsError, SourceError, SourceSettings,
    TrackerConfig, TrackerSource,
};

use crate::http::{Auth, HttpClient};

const NAME: &str = "GitHub";
const PAGE_SIZE: usize = 100;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Keys of a `type: github` tracker entry.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubOptions {
    pub user_name: String,
    /// Personal access token; `GITHUB_TOKEN` is used when absent or empty.
    #[serde(default)]
    pub token: Option<String>,
    pub repo: String,
    /// Repository owner, when it differs from `user_name`.
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

const DEFAULTS: SourceSettings = SourceSettings {
    is_primary: true,
    list_includes_closed: false,
};

/// Registry constructor for `type: github`.
pub fn create(config: &TrackerConfig) -> Result<Box<dyn TrackerSource>, SettingsError> {
    let options: GitHubOptions = config.options()?;
    let settings = config.source_settings(DEFAULTS);
    if settings.list_includes_closed {
        return Err(config.invalid(
            "listing closed issues is unsupported for GitHub because that list grows indefinitely",
        ));
    }
    if options.user_name.is_empty() {
        return Err(config.invalid("missing user_name"));
    }
    if options.repo.is_empty() {
        return Err(config.invalid("missing repo"));
    }
    let token = options
        .token
        .clone()
        .filter(|t| !t.is_empty())
        .or_else(|| std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty()))
        .ok_or_else(|| config.invalid("missing token (set `token` or GITHUB_TOKEN)"))?;

    Ok(Box::new(GitHubSource::new(options, token, settings)))
}

// ---------------------------------------------------------------------------
// Wire payloads
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct User {
    login: String,
}

#[derive(Deserialize)]
struct IssuePayload {
    number: u64,
    title: String,
    #[serde(default)]
    body: Option<String>,
    state: String,
    /// Present when the "issue" is a pull request.
    #[serde(default)]
    pull_request: Option<serde_json::Value>,
}

impl IssuePayload {
    fn into_issue(self) -> Issue {
        let state = if self.state == "open" {
            IssueState::Open
        } else {
            IssueState::Closed
        };
        Issue {
            id: self.number.to_string(),
            description: self.title,
            details: self.body.filter(|b| !b.is_empty()),
            state,
            original: None,
        }
    }
}

#[derive(Serialize)]
struct NewIssue<'a> {
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a str>,
}

#[derive(Serialize, Default)]
struct IssuePatch<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<&'static str>,
}

impl IssuePatch<'_> {
    fn is_empty(&self) -> bool {
        self.title.is_none() && self.body.is_none() && self.state.is_none()
    }
}

fn state_name(state: IssueState) -> &'static str {
    match state {
        IssueState::Open => "open",
        IssueState::Closed => "closed",
    }
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

pub struct GitHubSource {
    settings: SourceSettings,
    http: HttpClient,
    user_name: String,
    /// `/repos/{owner}/{repo}`
    repo_path: String,
}

impl GitHubSource {
    pub fn new(options: GitHubOptions, token: String, settings: SourceSettings) -> Self {
        let owner = options.owner.unwrap_or_else(|| options.user_name.clone());
        Self {
            settings,
            http: HttpClient::new(NAME, &options.api_url, Auth::Bearer(token)),
            repo_path: format!("/repos/{}/{}", owner, options.repo),
            user_name: options.user_name,
        }
    }

    fn issue_path(&self, id: &str) -> String {
        format!("{}/issues/{}", self.repo_path, id)
    }

    fn patch(&self, id: &str, patch: &IssuePatch<'_>) -> Result<(), SourceError> {
        self.http
            .send("PATCH", &self.issue_path(id), &[], Some(patch))?;
        Ok(())
    }
}

impl TrackerSource for GitHubSource {
    fn name(&self) -> &str {
        NAME
    }

    fn settings(&self) -> &SourceSettings {
        &self.settings
    }

    /// Checks that the token belongs to the configured user.
    fn connect(&mut self) -> Result<(), SourceError> {
        let user: User = self.http.decode(self.http.get("/user", &[])?)?;
        if user.login != self.user_name {
            return Err(SourceError::config(
                NAME,
                format!(
                    "user name retrieved from source ('{}') != login name ('{}')",
                    user.login, self.user_name
                ),
            ));
        }
        Ok(())
    }

    fn list_issues(&mut self) -> Result<Vec<Issue>, SourceError> {
        let path = format!("{}/issues", self.repo_path);
        let per_page = PAGE_SIZE.to_string();
        let mut issues = Vec::new();

        for page in 1.. {
            let page_no = page.to_string();
            let query = [
                ("state", "open"),
                ("per_page", per_page.as_str()),
                ("page", page_no.as_str()),
            ];
            let batch: Vec<IssuePayload> = self.http.decode(self.http.get(&path, &query)?)?;
            let short_page = batch.len() < PAGE_SIZE;
            issues.extend(
                batch
                    .into_iter()
                    .filter(|p| p.pull_request.is_none())
                    .map(IssuePayload::into_issue),
            );
            if short_page {
                break;
            }
        }

        tracing::debug!(count = issues.len(), "github issues listed");
        Ok(issues)
    }

    fn get_issue(&mut self, id: &str) -> Result<Option<Issue>, SourceError> {
        let payload: Option<IssuePayload> = self.http.get_optional(&self.issue_path(id), &[])?;
        Ok(payload.map(IssuePayload::into_issue))
    }

    fn add_issue(&mut self, issue: &mut Issue) -> Result<(), SourceError> {
        let body = NewIssue {
            title: &issue.description,
            body: issue.details.as_deref().filter(|d| !d.is_empty()),
        };
        let path = format!("{}/issues", self.repo_path);
        let created: IssuePayload = self
            .http
            .decode(self.http.send("POST", &path, &[], Some(&body))?)?;
        tracing::info!(number = created.number, "github issue created");
        issue.id = created.number.to_string();
        Ok(())
    }

    /// `ID` cannot be changed: GitHub assigns issue numbers itself.
    fn update_issue(&mut self, issue: &Issue, fields: IssueFields) -> Result<(), SourceError> {
        let mut patch = IssuePatch::default();
        for field in fields.iter() {
            match field {
                IssueField::Id => return Err(SourceError::unsupported(NAME, field)),
                IssueField::Description => patch.title = Some(&issue.description),
                IssueField::Details => patch.body = Some(issue.details_text()),
                IssueField::State => patch.state = Some(state_name(issue.state)),
            }
        }
        if patch.is_empty() {
            return Ok(());
        }
        self.patch(&issue.id, &patch)
    }

    fn close_issue(&mut self, issue: &Issue) -> Result<(), SourceError> {
        let patch = IssuePatch {
            state: Some(state_name(IssueState::Closed)),
            ..IssuePatch::default()
        };
        self.patch(&issue.id, &patch)
    }
}
