//! Turning configured trackers into decorated [`TrackerSource`]s.
//!
//! A [`SourceRegistry`] maps each `type:` string to a constructor. The
//! [`SourceFactory`] builds the base source and then layers decorators in a
//! fixed order: read-only when updates are disabled, then traffic logging
//! when the log level is above `none`.

use std::collections::BTreeMap;
use std::io::Write;

use crate::error::SettingsError;
use crate::logging::{LoggingConfig, LoggingSource};
use crate::read_only::ReadOnlySource;
use crate::settings::{LogLevel, SyncSettings, TrackerConfig};
use crate::source::TrackerSource;

/// Builds an undecorated source from its tracker entry.
pub type SourceConstructor = fn(&TrackerConfig) -> Result<Box<dyn TrackerSource>, SettingsError>;

/// Produces the writer each logging decorator records into.
pub type LogSink = Box<dyn Fn() -> Box<dyn Write>>;

#[derive(Default)]
pub struct SourceRegistry {
    constructors: BTreeMap<String, SourceConstructor>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `kind`, matched case-insensitively. A later registration of
    /// the same kind replaces the earlier one.
    pub fn register(&mut self, kind: &str, constructor: SourceConstructor) -> &mut Self {
        self.constructors.insert(kind.to_ascii_lowercase(), constructor);
        self
    }

    /// Registered kinds, sorted.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    pub fn create(&self, config: &TrackerConfig) -> Result<Box<dyn TrackerSource>, SettingsError> {
        let constructor = self
            .constructors
            .get(&config.kind.to_ascii_lowercase())
            .ok_or_else(|| SettingsError::UnknownKind {
                kind: config.kind.clone(),
                known: self.kinds().collect::<Vec<_>>().join(", "),
            })?;
        constructor(config)
    }
}

pub struct SourceFactory<'r> {
    registry: &'r SourceRegistry,
    log_level: LogLevel,
    no_updates: bool,
    sink: LogSink,
}

impl<'r> SourceFactory<'r> {
    /// Factory logging to stdout.
    pub fn new(registry: &'r SourceRegistry, log_level: LogLevel, no_updates: bool) -> Self {
        Self {
            registry,
            log_level,
            no_updates,
            sink: Box::new(|| -> Box<dyn Write> { Box::new(std::io::stdout()) }),
        }
    }

    pub fn from_settings(registry: &'r SourceRegistry, settings: &SyncSettings) -> Self {
        Self::new(registry, settings.log_level, settings.no_updates)
    }

    pub fn with_log_sink(mut self, sink: LogSink) -> Self {
        self.sink = sink;
        self
    }

    pub fn create(&self, config: &TrackerConfig) -> Result<Box<dyn TrackerSource>, SettingsError> {
        let mut source = self.registry.create(config)?;

        if self.no_updates {
            source = Box::new(ReadOnlySource::new(source));
        }

        if self.log_level != LogLevel::None {
            let logging = LoggingConfig {
                log_input: self.log_level >= LogLevel::Verbose,
                log_output: self.log_level >= LogLevel::Actions,
            };
            source = Box::new(LoggingSource::new(source, (self.sink)(), logging));
        }

        tracing::debug!(
            kind = %config.kind,
            name = source.name(),
            read_only = self.no_updates,
            log_level = ?self.log_level,
            "source created"
        );
        Ok(source)
    }

    /// Both configured sources, in file order.
    pub fn create_pair(
        &self,
        settings: &SyncSettings,
    ) -> Result<(Box<dyn TrackerSource>, Box<dyn TrackerSource>), SettingsError> {
        match settings.trackers.as_slice() {
            [a, b] => Ok((self.create(a)?, self.create(b)?)),
            other => Err(SettingsError::TrackerCount(other.len())),
        }
    }
}
