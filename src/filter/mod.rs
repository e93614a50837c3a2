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

//! Filters for log records.

use std::str::FromStr;

use log::LevelFilter;
use log::Metadata;
use log::Record;

pub use self::env_filter::EnvFilter;
pub use self::env_filter::EnvFilterBuilder;
use crate::Error;

pub mod env_filter;

/// The result of a filter check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterResult {
    /// The record will be processed without further filtering.
    Accept,
    /// The record should not be processed.
    Reject,
    /// No decision could be made, further filtering should occur.
    Neutral,
}

/// Represents a filter that can be applied to log records.
#[derive(Debug)]
pub enum Filter {
    /// Reject records less severe than the level.
    Level(LevelFilter),
    /// An env_logger filter.
    Env(EnvFilter),
}

impl Filter {
    pub(crate) fn enabled(&self, metadata: &Metadata) -> FilterResult {
        match self {
            Filter::Level(level) => check_level(metadata.level(), *level),
            Filter::Env(filter) => filter.enabled(metadata),
        }
    }

    pub(crate) fn matches(&self, record: &Record) -> FilterResult {
        match self {
            Filter::Level(level) => check_level(record.level(), *level),
            Filter::Env(filter) => filter.matches(record),
        }
    }
}

fn check_level(level: log::Level, filter: LevelFilter) -> FilterResult {
    if level <= filter {
        FilterResult::Neutral
    } else {
        FilterResult::Reject
    }
}

impl From<LevelFilter> for Filter {
    fn from(filter: LevelFilter) -> Self {
        Filter::Level(filter)
    }
}

impl From<EnvFilter> for Filter {
    fn from(filter: EnvFilter) -> Self {
        Filter::Env(filter)
    }
}

impl<'a> From<&'a str> for Filter {
    fn from(filter: &'a str) -> Self {
        EnvFilter::from(filter).into()
    }
}

impl FromStr for Filter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EnvFilter::from_str(s).map(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use log::Level;

    use super::*;

    fn metadata(level: Level, target: &str) -> Metadata<'_> {
        Metadata::builder().level(level).target(target).build()
    }

    #[test]
    fn test_level_filter() {
        let filter = Filter::from(LevelFilter::Info);
        assert_eq!(
            filter.enabled(&metadata(Level::Warn, "app")),
            FilterResult::Neutral
        );
        assert_eq!(
            filter.enabled(&metadata(Level::Info, "app")),
            FilterResult::Neutral
        );
        assert_eq!(
            filter.enabled(&metadata(Level::Debug, "app")),
            FilterResult::Reject
        );
    }

    #[test]
    fn test_env_directives() {
        let filter = Filter::from_str("warn,app::db=trace").unwrap();
        assert_eq!(
            filter.enabled(&metadata(Level::Trace, "app::db")),
            FilterResult::Neutral
        );
        assert_eq!(
            filter.enabled(&metadata(Level::Info, "app::web")),
            FilterResult::Reject
        );
        assert_eq!(
            filter.enabled(&metadata(Level::Warn, "app::web")),
            FilterResult::Neutral
        );
    }

    #[test]
    fn test_invalid_directives() {
        let err = Filter::from_str("app=loud").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Configuration);
    }
}
