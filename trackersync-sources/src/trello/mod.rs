//! Trello cards over the REST v1 API.
//!
//! A board stands for the issue database. Cards in the configured open lists
//! are open issues; cards in the configured closed lists are closed ones.
//! Card titles carry the primary tracker's id; see [`TrelloNormalizer`].

mod normalizer;

pub use normalizer::TrelloNormalizer;

use std::collections::HashMap;

use serde::Deserialize;
use trackersync_core::{
    Issue, IssueField, IssueFields, IssueState, SettingsError, SourceError, SourceSettings,
    TrackerConfig, TrackerSource,
};

use crate::http::{Auth, HttpClient};

const NAME: &str = "Trello";

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Keys of a `type: trello` tracker entry.
#[derive(Debug, Clone, Deserialize)]
pub struct TrelloOptions {
    pub user_name: String,
    pub dev_key: String,
    pub member_token: String,
    pub board_name: String,
    pub open_card_lists: Vec<String>,
    /// The first list receives cards closed by a sync.
    pub closed_card_lists: Vec<String>,
    pub new_card_list: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

fn default_api_url() -> String {
    "https://api.trello.com".to_string()
}

impl TrelloOptions {
    fn validate(&self, config: &TrackerConfig) -> Result<(), SettingsError> {
        let missing = if self.user_name.is_empty() {
            "missing user_name"
        } else if self.dev_key.is_empty() {
            "missing Trello dev_key"
        } else if self.member_token.is_empty() {
            "missing member_token"
        } else if self.board_name.is_empty() {
            "missing board_name"
        } else if self.open_card_lists.is_empty() {
            "missing a definition of open_card_lists"
        } else if self.closed_card_lists.is_empty() {
            "missing a definition of closed_card_lists"
        } else if self.new_card_list.is_empty() {
            "missing new_card_list"
        } else {
            return Ok(());
        };
        Err(config.invalid(missing))
    }
}

const DEFAULTS: SourceSettings = SourceSettings {
    is_primary: false,
    list_includes_closed: true,
};

/// Registry constructor for `type: trello`: the card source wrapped in its
/// id normalizer.
pub fn create(config: &TrackerConfig) -> Result<Box<dyn TrackerSource>, SettingsError> {
    let options: TrelloOptions = config.options()?;
    options.validate(config)?;
    let source = TrelloSource::new(options, config.source_settings(DEFAULTS));
    Ok(Box::new(TrelloNormalizer::new(Box::new(source))))
}

// ---------------------------------------------------------------------------
// Wire payloads
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct Named {
    id: String,
    name: String,
}

#[derive(Deserialize)]
struct Card {
    id: String,
    name: String,
    #[serde(default)]
    desc: String,
    #[serde(default, rename = "idList")]
    id_list: Option<String>,
}

#[derive(Deserialize)]
struct ListWithCards {
    id: String,
    #[serde(default)]
    cards: Vec<Card>,
}

#[derive(Deserialize)]
struct Created {
    id: String,
}

impl Card {
    fn into_issue(self, state: IssueState) -> Issue {
        Issue {
            id: self.id,
            description: self.name,
            details: Some(self.desc).filter(|d| !d.is_empty()),
            state,
            original: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// Board and list ids resolved by `connect`.
#[derive(Debug, Clone)]
struct Board {
    id: String,
    open_lists: Vec<String>,
    closed_lists: Vec<String>,
    new_card_list: String,
}

impl Board {
    fn state_of(&self, list_id: &str) -> Option<IssueState> {
        if self.open_lists.iter().any(|l| l == list_id) {
            Some(IssueState::Open)
        } else if self.closed_lists.iter().any(|l| l == list_id) {
            Some(IssueState::Closed)
        } else {
            None
        }
    }
}

pub struct TrelloSource {
    settings: SourceSettings,
    options: TrelloOptions,
    http: HttpClient,
    board: Option<Board>,
}

impl TrelloSource {
    pub fn new(options: TrelloOptions, settings: SourceSettings) -> Self {
        let auth = Auth::KeyToken {
            key: options.dev_key.clone(),
            token: options.member_token.clone(),
        };
        Self {
            settings,
            http: HttpClient::new(NAME, &options.api_url, auth),
            options,
            board: None,
        }
    }

    fn board(&self) -> Result<&Board, SourceError> {
        self.board
            .as_ref()
            .ok_or_else(|| SourceError::config(NAME, "board is not resolved; connect first"))
    }

    fn resolve_board_id(&self) -> Result<String, SourceError> {
        let path = format!("/1/members/{}/boards", self.options.user_name);
        let boards: Vec<Named> = self
            .http
            .decode(self.http.get(&path, &[("filter", "open"), ("fields", "name")])?)?;
        boards
            .into_iter()
            .find(|b| b.name.eq_ignore_ascii_case(&self.options.board_name))
            .map(|b| b.id)
            .ok_or_else(|| {
                SourceError::config(
                    NAME,
                    format!(
                        "board '{}' for user '{}' was not found",
                        self.options.board_name, self.options.user_name
                    ),
                )
            })
    }

    fn resolve_lists(&self, board_id: String) -> Result<Board, SourceError> {
        let path = format!("/1/boards/{board_id}/lists");
        let lists: Vec<Named> = self.http.decode(self.http.get(
            &path,
            &[("cards", "none"), ("filter", "open"), ("fields", "name")],
        )?)?;
        let ids: HashMap<String, String> = lists.into_iter().map(|l| (l.name, l.id)).collect();

        let lookup = |name: &str| -> Result<String, SourceError> {
            ids.get(name).cloned().ok_or_else(|| {
                SourceError::config(
                    NAME,
                    format!(
                        "unable to find list '{}' on board '{}/{}'",
                        name, self.options.user_name, self.options.board_name
                    ),
                )
            })
        };
        let is_new_card_list = |name: &str| name.eq_ignore_ascii_case(&self.options.new_card_list);

        let mut new_card_list = None;
        let mut open_lists = Vec::with_capacity(self.options.open_card_lists.len() + 1);
        for name in &self.options.open_card_lists {
            let id = lookup(name)?;
            if is_new_card_list(name) {
                new_card_list = Some(id.clone());
            }
            open_lists.push(id);
        }

        let mut closed_lists = Vec::with_capacity(self.options.closed_card_lists.len());
        for name in &self.options.closed_card_lists {
            if is_new_card_list(name) {
                return Err(SourceError::config(
                    NAME,
                    format!("list '{name}' assigned to new items appears in closed issues list"),
                ));
            }
            closed_lists.push(lookup(name)?);
        }

        // A new-card list outside the open lists still holds open cards.
        let new_card_list = match new_card_list {
            Some(id) => id,
            None => {
                let id = lookup(&self.options.new_card_list)?;
                open_lists.push(id.clone());
                id
            }
        };

        Ok(Board {
            id: board_id,
            open_lists,
            closed_lists,
            new_card_list,
        })
    }

    fn put_card(&self, card_id: &str, query: &[(&str, &str)]) -> Result<(), SourceError> {
        self.http
            .send::<()>("PUT", &format!("/1/cards/{card_id}"), query, None)?;
        Ok(())
    }
}

impl TrackerSource for TrelloSource {
    fn name(&self) -> &str {
        NAME
    }

    fn settings(&self) -> &SourceSettings {
        &self.settings
    }

    /// Resolves the board and list ids used by every later call.
    fn connect(&mut self) -> Result<(), SourceError> {
        let board_id = self.resolve_board_id()?;
        let board = self.resolve_lists(board_id)?;
        tracing::debug!(
            board = %board.id,
            open = board.open_lists.len(),
            closed = board.closed_lists.len(),
            "trello board resolved"
        );
        self.board = Some(board);
        Ok(())
    }

    fn list_issues(&mut self) -> Result<Vec<Issue>, SourceError> {
        let board = self.board()?;
        let path = format!("/1/boards/{}/lists", board.id);
        let lists: Vec<ListWithCards> = self.http.decode(self.http.get(
            &path,
            &[("cards", "open"), ("card_fields", "name,desc")],
        )?)?;

        let include_closed = self.settings.list_includes_closed;
        let mut issues = Vec::new();
        for list in lists {
            let state = match board.state_of(&list.id) {
                Some(IssueState::Closed) if !include_closed => continue,
                Some(state) => state,
                None => continue,
            };
            issues.extend(list.cards.into_iter().map(|c| c.into_issue(state)));
        }
        Ok(issues)
    }

    fn get_issue(&mut self, id: &str) -> Result<Option<Issue>, SourceError> {
        let board = self.board()?;
        let card: Option<Card> = self
            .http
            .get_optional(&format!("/1/cards/{id}"), &[("fields", "name,desc,idList")])?;
        let Some(card) = card else {
            return Ok(None);
        };
        let list_id = card.id_list.clone().unwrap_or_default();
        let state = board.state_of(&list_id).ok_or_else(|| {
            SourceError::decode(
                NAME,
                format!("unable to determine state of card '{id}' in list '{list_id}'"),
            )
        })?;
        Ok(Some(card.into_issue(state)))
    }

    /// Creates the card in the new-card list and stores the card id.
    fn add_issue(&mut self, issue: &mut Issue) -> Result<(), SourceError> {
        let board = self.board()?;
        let mut query = vec![
            ("name", issue.description.as_str()),
            ("idList", board.new_card_list.as_str()),
        ];
        if let Some(details) = issue.details.as_deref().filter(|d| !d.is_empty()) {
            query.push(("desc", details));
        }
        let created: Created = self
            .http
            .decode(self.http.send::<()>("POST", "/1/cards", &query, None)?)?;
        issue.id = created.id;
        Ok(())
    }

    /// Only the card title and description can change.
    fn update_issue(&mut self, issue: &Issue, fields: IssueFields) -> Result<(), SourceError> {
        let mut query = Vec::new();
        for field in fields.iter() {
            match field {
                IssueField::Description => query.push(("name", issue.description.as_str())),
                IssueField::Details => query.push(("desc", issue.details_text())),
                IssueField::Id | IssueField::State => {
                    return Err(SourceError::unsupported(NAME, field))
                }
            }
        }
        if query.is_empty() {
            return Ok(());
        }
        self.put_card(&issue.id, &query)
    }

    /// Moves the card to the first closed list.
    fn close_issue(&mut self, issue: &Issue) -> Result<(), SourceError> {
        let board = self.board()?;
        let target = board
            .closed_lists
            .first()
            .ok_or_else(|| SourceError::config(NAME, "no closed list configured"))?;
        self.put_card(&issue.id, &[("idList", target.as_str())])
    }
}
