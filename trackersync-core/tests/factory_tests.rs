//! Source registry lookup and decorator stacking.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use rstest::rstest;
use trackersync_core::memory::MemorySource;
use trackersync_core::{
    Issue, IssueFields, IssueState, LogLevel, SettingsError, SourceFactory, SourceRegistry,
    SyncSettings, TrackerConfig, TrackerSource,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn memory(config: &TrackerConfig) -> Result<Box<dyn TrackerSource>, SettingsError> {
    let source = MemorySource::new("Mem", config.primary.unwrap_or(false))
        .with_issue(Issue::new("1", "Existing", IssueState::Open))
        .with_next_ids(["42"]);
    Ok(Box::new(source))
}

fn registry() -> SourceRegistry {
    let mut registry = SourceRegistry::new();
    registry.register("memory", memory);
    registry
}

fn tracker(yaml: &str) -> TrackerConfig {
    serde_yaml::from_str(yaml).expect("tracker yaml")
}

#[derive(Clone, Default)]
struct Captured(Rc<RefCell<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).unwrap()
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn factory_with_capture(
    registry: &SourceRegistry,
    level: LogLevel,
    no_updates: bool,
) -> (SourceFactory<'_>, Captured) {
    let captured = Captured::default();
    let sink = captured.clone();
    let factory = SourceFactory::new(registry, level, no_updates)
        .with_log_sink(Box::new(move || -> Box<dyn Write> { Box::new(sink.clone()) }));
    (factory, captured)
}

// ---------------------------------------------------------------------------
// 1. Registry
// ---------------------------------------------------------------------------

#[test]
fn unknown_kind_is_rejected() {
    let err = registry()
        .create(&tracker("type: jira\n"))
        .err()
        .expect("unknown kind must fail");
    assert!(
        matches!(err, SettingsError::UnknownKind { ref kind, .. } if kind == "jira"),
        "got: {err}"
    );
    assert!(err.to_string().ends_with("(known: memory)"), "got: {err}");
}

#[test]
fn kind_lookup_ignores_case() {
    let source = registry()
        .create(&tracker("type: Memory\nprimary: true\n"))
        .expect("create");
    assert!(source.settings().is_primary);
}

// ---------------------------------------------------------------------------
// 2. Decorator stacking
// ---------------------------------------------------------------------------

#[rstest]
#[case::plain(LogLevel::None, false, "42", "")]
#[case::read_only(LogLevel::None, true, "", "")]
#[case::actions(LogLevel::Actions, false, "42", "Mem--ADD\n")]
#[case::status(LogLevel::Actions, true, "", "Mem--ADD\n")]
fn add_through_factory(
    #[case] level: LogLevel,
    #[case] no_updates: bool,
    #[case] expected_id: &str,
    #[case] expected_log_prefix: &str,
) {
    let registry = registry();
    let (factory, captured) = factory_with_capture(&registry, level, no_updates);
    let mut source = factory.create(&tracker("type: memory\n")).expect("create");

    let mut issue = Issue::new("", "New", IssueState::Open);
    source.add_issue(&mut issue).expect("add");

    assert_eq!(issue.id, expected_id);
    assert!(captured.text().starts_with(expected_log_prefix), "log: {}", captured.text());
}

#[rstest]
#[case::actions_skips_reads(LogLevel::Actions, false)]
#[case::verbose_records_reads(LogLevel::Verbose, true)]
fn reads_logged_only_when_verbose(#[case] level: LogLevel, #[case] logged: bool) {
    let registry = registry();
    let (factory, captured) = factory_with_capture(&registry, level, false);
    let mut source = factory.create(&tracker("type: memory\n")).expect("create");

    source.list_issues().expect("list");

    assert_eq!(captured.text().contains("Mem--GET_LIST[0]"), logged);
}

#[test]
fn update_is_logged_even_when_read_only() {
    let registry = registry();
    let (factory, captured) = factory_with_capture(&registry, LogLevel::Actions, true);
    let mut source = factory.create(&tracker("type: memory\n")).expect("create");

    let issue = Issue::new("1", "Existing", IssueState::Open);
    source.update_issue(&issue, IssueFields::ID).expect("update");

    assert!(captured.text().contains("Mem--UPDATE( ID )"));
}

#[test]
fn create_pair_requires_two_trackers() {
    let registry = registry();
    let settings: SyncSettings =
        serde_yaml::from_str("trackers:\n  - type: memory\n").expect("yaml");
    let factory = SourceFactory::from_settings(&registry, &settings);

    let err = factory.create_pair(&settings).err().expect("must fail");
    assert!(matches!(err, SettingsError::TrackerCount(1)), "got: {err}");
}
