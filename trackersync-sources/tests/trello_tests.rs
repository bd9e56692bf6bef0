//! Trello adapter against a mock REST server, behind its normalizer and bare.

use mockito::{Matcher, Mock, Server};
use rstest::rstest;
use serde_json::json;
use trackersync_core::{
    Issue, IssueFields, IssueState, SourceError, SourceSettings, TrackerConfig, TrackerSource,
};
use trackersync_sources::builtin_registry;
use trackersync_sources::trello::{TrelloOptions, TrelloSource};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const BOARD: &str = "b1";

fn config(server: &Server, new_card_list: &str, closed: &str) -> TrackerConfig {
    let yaml = format!(
        "type: trello
user_name: octocat
dev_key: k
member_token: t
board_name: issues
open_card_lists: [Doing]
closed_card_lists: [{closed}]
new_card_list: {new_card_list}
api_url: {}
",
        server.url()
    );
    serde_yaml::from_str(&yaml).expect("tracker yaml")
}

fn auth(extra: Vec<Matcher>) -> Matcher {
    let mut all = vec![
        Matcher::UrlEncoded("key".into(), "k".into()),
        Matcher::UrlEncoded("token".into(), "t".into()),
    ];
    all.extend(extra);
    Matcher::AllOf(all)
}

/// Board "Issues" with lists To Do (l-todo), Doing (l-doing), Done (l-done)
/// and Archive (l-archive).
fn mock_board(server: &mut Server) -> (Mock, Mock) {
    let boards = server
        .mock("GET", "/1/members/octocat/boards")
        .match_query(auth(vec![]))
        .with_body(
            json!([{ "id": "other", "name": "Personal" }, { "id": BOARD, "name": "Issues" }])
                .to_string(),
        )
        .create();
    let lists = server
        .mock("GET", "/1/boards/b1/lists")
        .match_query(auth(vec![Matcher::UrlEncoded("cards".into(), "none".into())]))
        .with_body(
            json!([
                { "id": "l-todo", "name": "To Do" },
                { "id": "l-doing", "name": "Doing" },
                { "id": "l-done", "name": "Done" },
                { "id": "l-archive", "name": "Archive" }
            ])
            .to_string(),
        )
        .create();
    (boards, lists)
}

fn connected(server: &mut Server) -> Box<dyn TrackerSource> {
    let _mocks = mock_board(server);
    let mut source = builtin_registry()
        .create(&config(server, "To Do", "Done"))
        .expect("create trello source");
    source.connect().expect("connect");
    source
}

// ---------------------------------------------------------------------------
// 1. Connect
// ---------------------------------------------------------------------------

#[test]
fn defaults_to_secondary_with_closed_listing() {
    let server = Server::new();
    let source = builtin_registry()
        .create(&config(&server, "To Do", "Done"))
        .expect("create");
    assert_eq!(source.name(), "Trello");
    assert!(!source.settings().is_primary);
    assert!(source.settings().list_includes_closed);
}

#[test]
fn missing_board_is_config_error() {
    let mut server = Server::new();
    let _boards = server
        .mock("GET", "/1/members/octocat/boards")
        .match_query(Matcher::Any)
        .with_body(json!([{ "id": "other", "name": "Personal" }]).to_string())
        .create();

    let mut source = builtin_registry()
        .create(&config(&server, "To Do", "Done"))
        .expect("create");
    let err = source.connect().unwrap_err();
    assert!(matches!(err, SourceError::Config { .. }), "got: {err}");
    assert!(err.to_string().contains("issues"));
}

#[test]
fn new_card_list_among_closed_lists_is_rejected() {
    let mut server = Server::new();
    let _mocks = mock_board(&mut server);

    let mut source = builtin_registry()
        .create(&config(&server, "Done", "Done"))
        .expect("create");
    let err = source.connect().unwrap_err();
    assert!(err.to_string().contains("closed issues list"), "got: {err}");
}

#[test]
fn unknown_list_name_is_rejected() {
    let mut server = Server::new();
    let _mocks = mock_board(&mut server);

    let mut source = builtin_registry()
        .create(&config(&server, "To Do", "Shipped"))
        .expect("create");
    let err = source.connect().unwrap_err();
    assert!(err.to_string().contains("Shipped"), "got: {err}");
}

// ---------------------------------------------------------------------------
// 2. Reads
// ---------------------------------------------------------------------------

#[test]
fn list_maps_lists_to_states_and_normalizes_titles() {
    let mut server = Server::new();
    let mut source = connected(&mut server);
    let _cards = server
        .mock("GET", "/1/boards/b1/lists")
        .match_query(auth(vec![Matcher::UrlEncoded("cards".into(), "open".into())]))
        .with_body(
            json!([
                { "id": "l-todo", "cards": [{ "id": "c1", "name": "Unsynced", "desc": "" }] },
                { "id": "l-doing", "cards": [{ "id": "c2", "name": "S5: Fix crash", "desc": "trace" }] },
                { "id": "l-done", "cards": [{ "id": "c3", "name": "S6: Old", "desc": "" }] },
                { "id": "l-archive", "cards": [{ "id": "c4", "name": "S7: Ignored", "desc": "" }] }
            ])
            .to_string(),
        )
        .create();

    let issues = source.list_issues().expect("list");

    assert_eq!(
        issues,
        vec![
            Issue::new("", "Unsynced", IssueState::Open),
            Issue::new("5", "Fix crash", IssueState::Open).with_details("trace"),
            Issue::new("6", "Old", IssueState::Closed),
        ]
    );
    assert_eq!(issues[1].original.as_deref().map(|o| o.id.as_str()), Some("c2"));
}

#[test]
fn get_is_answered_without_a_request() {
    let mut server = Server::new();
    let mut source = connected(&mut server);
    let card = server.mock("GET", Matcher::Regex("^/1/cards".into())).expect(0).create();

    assert!(source.get_issue("5").expect("get").is_none());
    card.assert();
}

// ---------------------------------------------------------------------------
// 3. Writes
// ---------------------------------------------------------------------------

#[test]
fn add_then_id_update_renames_the_new_card() {
    let mut server = Server::new();
    let mut source = connected(&mut server);
    let post = server
        .mock("POST", "/1/cards")
        .match_query(auth(vec![
            Matcher::UrlEncoded("name".into(), "Fix crash".into()),
            Matcher::UrlEncoded("idList".into(), "l-todo".into()),
        ]))
        .with_body(json!({ "id": "c-new" }).to_string())
        .create();
    let put = server
        .mock("PUT", "/1/cards/c-new")
        .match_query(auth(vec![Matcher::UrlEncoded("name".into(), "S31: Fix crash".into())]))
        .with_body("{}")
        .create();

    // A primary-side issue without an id yet: the card title has no prefix.
    let mut issue = Issue::new("", "Fix crash", IssueState::Open);
    source.add_issue(&mut issue).expect("add");
    issue.id = "31".into();
    source.update_issue(&issue, IssueFields::ID).expect("update");

    post.assert();
    put.assert();
}

#[test]
fn add_with_id_writes_prefixed_title_and_details() {
    let mut server = Server::new();
    let mut source = connected(&mut server);
    let post = server
        .mock("POST", "/1/cards")
        .match_query(auth(vec![
            Matcher::UrlEncoded("name".into(), "S12: Fix crash".into()),
            Matcher::UrlEncoded("desc".into(), "trace".into()),
        ]))
        .with_body(json!({ "id": "c-new" }).to_string())
        .create();

    let mut issue = Issue::new("12", "Fix crash", IssueState::Open).with_details("trace");
    source.add_issue(&mut issue).expect("add");

    post.assert();
    assert_eq!(issue.id, "12", "normalized id is kept");
}

#[test]
fn close_moves_card_to_first_closed_list() {
    let mut server = Server::new();
    let mut source = connected(&mut server);
    let _cards = server
        .mock("GET", "/1/boards/b1/lists")
        .match_query(auth(vec![Matcher::UrlEncoded("cards".into(), "open".into())]))
        .with_body(
            json!([{ "id": "l-doing", "cards": [{ "id": "c2", "name": "S5: Fix crash" }] }])
                .to_string(),
        )
        .create();
    let put = server
        .mock("PUT", "/1/cards/c2")
        .match_query(auth(vec![Matcher::UrlEncoded("idList".into(), "l-done".into())]))
        .with_body("{}")
        .create();

    let issue = source.list_issues().expect("list").remove(0);
    source.close_issue(&issue).expect("close");
    put.assert();
}

#[test]
fn state_update_is_unsupported() {
    let mut server = Server::new();
    let mut source = connected(&mut server);

    let issue = Issue::new("5", "x", IssueState::Closed);
    let err = source
        .update_issue(&issue, IssueFields::STATE)
        .unwrap_err();
    assert!(matches!(err, SourceError::UnsupportedField { .. }), "got: {err}");
}

// ---------------------------------------------------------------------------
// 4. Bare card source
// ---------------------------------------------------------------------------

/// The card source without the normalizer: raw card ids and titles, closed
/// lists left out of listings.
fn bare_connected(server: &mut Server) -> TrelloSource {
    let _mocks = mock_board(server);
    let yaml = format!(
        "user_name: octocat
dev_key: k
member_token: t
board_name: issues
open_card_lists: [Doing]
closed_card_lists: [Done]
new_card_list: To Do
api_url: {}
",
        server.url()
    );
    let options: TrelloOptions = serde_yaml::from_str(&yaml).expect("options yaml");
    let mut source = TrelloSource::new(
        options,
        SourceSettings {
            is_primary: false,
            list_includes_closed: false,
        },
    );
    source.connect().expect("connect");
    source
}

fn mock_card(server: &mut Server, id: &str, body: serde_json::Value) -> Mock {
    server
        .mock("GET", format!("/1/cards/{id}").as_str())
        .match_query(auth(vec![Matcher::UrlEncoded(
            "fields".into(),
            "name,desc,idList".into(),
        )]))
        .with_body(body.to_string())
        .create()
}

#[test]
fn list_without_closed_skips_cards_in_closed_lists() {
    let mut server = Server::new();
    let mut source = bare_connected(&mut server);
    let _cards = server
        .mock("GET", "/1/boards/b1/lists")
        .match_query(auth(vec![Matcher::UrlEncoded("cards".into(), "open".into())]))
        .with_body(
            json!([
                { "id": "l-doing", "cards": [{ "id": "c1", "name": "S5: Fix crash", "desc": "" }] },
                { "id": "l-done", "cards": [{ "id": "c2", "name": "S6: Old", "desc": "" }] }
            ])
            .to_string(),
        )
        .create();

    let listed: Vec<(String, IssueState)> = source
        .list_issues()
        .expect("list")
        .into_iter()
        .map(|issue| (issue.id, issue.state))
        .collect();
    assert_eq!(listed, vec![("c1".to_string(), IssueState::Open)]);
}

#[rstest]
#[case::open_list("l-doing", IssueState::Open)]
#[case::new_card_list("l-todo", IssueState::Open)]
#[case::closed_list("l-done", IssueState::Closed)]
fn get_takes_state_from_card_list(#[case] list_id: &str, #[case] expected: IssueState) {
    let mut server = Server::new();
    let mut source = bare_connected(&mut server);
    let card = mock_card(
        &mut server,
        "c1",
        json!({ "id": "c1", "name": "S5: Fix crash", "desc": "trace", "idList": list_id }),
    );

    let issue = source.get_issue("c1").expect("get").expect("card exists");

    card.assert();
    assert_eq!(
        issue,
        Issue::new("c1", "S5: Fix crash", expected).with_details("trace")
    );
}

#[test]
fn get_of_missing_card_is_none() {
    let mut server = Server::new();
    let mut source = bare_connected(&mut server);
    let card = server
        .mock("GET", "/1/cards/gone")
        .match_query(Matcher::Any)
        .with_status(404)
        .create();

    assert!(source.get_issue("gone").expect("get").is_none());
    card.assert();
}

#[test]
fn get_of_card_in_unmapped_list_is_decode_error() {
    let mut server = Server::new();
    let mut source = bare_connected(&mut server);
    let _card = mock_card(
        &mut server,
        "c3",
        json!({ "id": "c3", "name": "S7: Stray", "idList": "l-x" }),
    );

    let err = source.get_issue("c3").unwrap_err();
    assert!(matches!(err, SourceError::Decode { .. }), "got: {err}");
    assert!(
        err.to_string()
            .contains("unable to determine state of card 'c3' in list 'l-x'"),
        "got: {err}"
    );
}
