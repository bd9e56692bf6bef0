//! Tracker backends for trackersync.
//!
//! - [`github`]: GitHub issues (primary by default)
//! - [`trello`]: Trello cards behind the id normalizer (secondary by default)
//!
//! [`builtin_registry`] maps the config `type:` names to their constructors.

mod http;

pub mod github;
pub mod trello;

use trackersync_core::SourceRegistry;

/// Registry with every built-in tracker kind.
pub fn builtin_registry() -> SourceRegistry {
    let mut registry = SourceRegistry::new();
    registry
        .register("github", github::create)
        .register("trello", trello::create);
    registry
}
