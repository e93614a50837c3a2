// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Directive filters, as in `RUST_LOG`, for choosing which records reach the per-thread files.

use std::borrow::Cow;
use std::str::FromStr;

use log::LevelFilter;
use log::Metadata;
use log::Record;

use crate::Error;
use crate::filter::FilterResult;

/// The variable [`EnvFilter::from_default_env_or`] reads.
pub const DEFAULT_FILTER_ENV: &str = "RUST_LOG";

/// Comma-separated `target=level` directives evaluated before a record is handed to the
/// appenders of a dispatch.
///
/// A rejected record never reaches a [`ThreadFile`](crate::append::ThreadFile), so it does not
/// create a file for its thread either. The syntax is the one of
/// [`env_logger`](https://docs.rs/env_logger/#enabling-logging).
///
/// # Examples
///
/// Keep a chatty module out of every worker's file:
///
/// ```
/// use logforth_thread_file::append::ThreadFileBuilder;
/// use logforth_thread_file::filter::EnvFilter;
///
/// let dir = tempfile::tempdir().unwrap();
/// let appender = ThreadFileBuilder::new(dir.path().join("worker")).build().unwrap();
///
/// let filter: EnvFilter = "info,my_app::poller=warn".parse().unwrap();
/// let logger = logforth_thread_file::builder()
///     .dispatch(|d| d.filter(filter).append(appender))
///     .build();
/// ```
#[derive(Debug)]
pub struct EnvFilter(env_filter::Filter);

impl EnvFilter {
    /// Finish `builder` into a filter.
    pub fn new(mut builder: EnvFilterBuilder) -> Self {
        EnvFilter(builder.0.build())
    }

    /// Read directives from `RUST_LOG`, or use `default` when it is unset.
    ///
    /// Invalid directives are skipped.
    pub fn from_default_env_or<'a, V>(default: V) -> Self
    where
        V: Into<Cow<'a, str>>,
    {
        EnvFilter::from_env_or(DEFAULT_FILTER_ENV, default)
    }

    /// Read directives from the variable `name`, or use `default` when it is unset.
    pub fn from_env_or<'a, 'b, E, V>(name: E, default: V) -> Self
    where
        E: Into<Cow<'a, str>>,
        V: Into<Cow<'b, str>>,
    {
        let name = name.into();
        let default = default.into();

        let builder = EnvFilterBuilder::new();
        match std::env::var(&*name) {
            Ok(s) => EnvFilter::new(builder.parse(&s)),
            Err(_) => EnvFilter::new(builder.parse(&default)),
        }
    }

    pub(crate) fn enabled(&self, metadata: &Metadata) -> FilterResult {
        if self.0.enabled(metadata) {
            FilterResult::Neutral
        } else {
            FilterResult::Reject
        }
    }

    pub(crate) fn matches(&self, record: &Record) -> FilterResult {
        if self.0.matches(record) {
            FilterResult::Neutral
        } else {
            FilterResult::Reject
        }
    }
}

impl From<LevelFilter> for EnvFilter {
    fn from(filter: LevelFilter) -> Self {
        EnvFilter::new(EnvFilterBuilder::new().filter_level(filter))
    }
}

impl<'a> From<&'a str> for EnvFilter {
    fn from(filter: &'a str) -> Self {
        EnvFilter::new(EnvFilterBuilder::new().parse(filter))
    }
}

impl FromStr for EnvFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EnvFilterBuilder::new().try_parse(s).map(EnvFilter::new)
    }
}

/// A builder for an [`EnvFilter`].
#[derive(Default, Debug)]
pub struct EnvFilterBuilder(env_filter::Builder);

impl EnvFilterBuilder {
    /// Create a builder without directives.
    pub fn new() -> Self {
        EnvFilterBuilder(env_filter::Builder::new())
    }

    /// Set the level of records whose target starts with `module`.
    pub fn filter_module(mut self, module: &str, level: LevelFilter) -> Self {
        self.0.filter_module(module, level);
        self
    }

    /// Set the level of records no module directive matches.
    pub fn filter_level(mut self, level: LevelFilter) -> Self {
        self.0.filter_level(level);
        self
    }

    /// Add the directives in `filters`.
    ///
    /// # Errors
    ///
    /// Return an [`ErrorKind::Configuration`](crate::ErrorKind::Configuration) error if a
    /// directive is malformed.
    pub fn try_parse(mut self, filters: &str) -> Result<Self, Error> {
        self.0.try_parse(filters).map_err(|err| {
            Error::configuration("invalid filter directives")
                .with_context("directives", filters)
                .with_source(err)
        })?;
        Ok(self)
    }

    /// Add the directives in `filters`, skipping malformed ones.
    pub fn parse(mut self, filters: &str) -> Self {
        self.0.parse(filters);
        self
    }
}

#[cfg(test)]
mod tests {
    use log::Level;

    use super::*;
    use crate::ErrorKind;

    fn metadata(target: &str, level: Level) -> Metadata<'_> {
        Metadata::builder().target(target).level(level).build()
    }

    #[test]
    fn test_module_directive_overrides_default_level() {
        let filter = EnvFilter::new(
            EnvFilterBuilder::new()
                .filter_level(LevelFilter::Info)
                .filter_module("app::poller", LevelFilter::Warn),
        );

        assert_eq!(filter.enabled(&metadata("app", Level::Info)), FilterResult::Neutral);
        assert_eq!(
            filter.enabled(&metadata("app::poller", Level::Info)),
            FilterResult::Reject
        );
        assert_eq!(
            filter.enabled(&metadata("app::poller", Level::Warn)),
            FilterResult::Neutral
        );
    }

    #[test]
    fn test_malformed_directive_is_configuration_error() {
        let err = EnvFilter::from_str("app=loud").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}
