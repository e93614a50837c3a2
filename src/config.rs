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

//! Declarative configuration of a [`ThreadFile`] appender.
//!
//! A [`ThreadFileConfig`] can be read from log4j-style properties:
//!
//! ```
//! use logforth_thread_file::config::ThreadFileConfig;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let properties = format!(
//!     r#"
//! ## one file per worker thread
//! fileBase = {}/worker
//! delegateKind = org.apache.log4j.RollingFileAppender
//! maxFileSize = 10MB
//! maxBackupIndex = 3
//! layout = plain
//! "#,
//!     dir.path().display()
//! );
//!
//! let config = properties.parse::<ThreadFileConfig>().unwrap();
//! let appender = config.build().unwrap();
//! ```
//!
//! | Key | Value |
//! |---|---|
//! | `fileBase` | base path, required |
//! | `delegateKind` (or `subAppender`, `appenderImplementationClass`) | see [`DelegateKind`] |
//! | `datePattern` | see [`DatePattern`](crate::delegate::DatePattern) |
//! | `maxFileSize` | see [`FileSize`](crate::delegate::FileSize) |
//! | `maxBackupIndex` | non-negative integer |
//! | `append` | `true` or `false` |
//! | `immediateFlush` | `true` or `false` |
//! | `threshold` | a level, `all` or `off` |
//! | `layout` | `plain` or `json`, required |
//!
//! Keys are matched case-insensitively.

use std::path::PathBuf;
use std::str::FromStr;

use log::LevelFilter;

use crate::Error;
use crate::append::ThreadFile;
use crate::append::ThreadFileBuilder;
use crate::delegate::DelegateKind;
use crate::layout::PlainTextLayout;

/// The layouts a [`ThreadFileConfig`] can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LayoutKind {
    /// [`PlainTextLayout`].
    Plain,
    /// [`JsonLayout`](crate::layout::JsonLayout), available with the `layout-json` feature.
    Json,
}

impl FromStr for LayoutKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        let name = name.strip_prefix("org.apache.log4j.").unwrap_or(name);
        match name.to_ascii_lowercase().as_str() {
            "plain" | "text" | "patternlayout" | "simplelayout" => Ok(LayoutKind::Plain),
            "json" | "jsonlayout" => Ok(LayoutKind::Json),
            _ => Err(Error::configuration("unknown layout").with_context("layout", s)),
        }
    }
}

/// The options of a [`ThreadFile`] appender.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", deny_unknown_fields))]
pub struct ThreadFileConfig {
    /// The base path; files are named `{file_base}-{caller}.log`.
    pub file_base: PathBuf,
    /// The kind of file sink each caller writes to.
    #[cfg_attr(
        feature = "serde",
        serde(
            default,
            alias = "subAppender",
            alias = "appenderImplementationClass",
            deserialize_with = "de::from_str"
        )
    )]
    pub delegate_kind: DelegateKind,
    /// The date pattern of date-based sinks.
    #[cfg_attr(feature = "serde", serde(default))]
    pub date_pattern: Option<String>,
    /// The size at which size-based sinks roll over.
    #[cfg_attr(feature = "serde", serde(default))]
    pub max_file_size: Option<String>,
    /// The number of backups size-based sinks keep.
    #[cfg_attr(feature = "serde", serde(default))]
    pub max_backup_index: Option<usize>,
    /// Whether existing files are appended to.
    #[cfg_attr(feature = "serde", serde(default = "de::default_true"))]
    pub append: bool,
    /// Whether every record is flushed to disk.
    #[cfg_attr(feature = "serde", serde(default = "de::default_true"))]
    pub immediate_flush: bool,
    /// Records less severe than this are dropped.
    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "de::option_level")
    )]
    pub threshold: Option<LevelFilter>,
    /// The layout records are formatted with. The appender requires one.
    #[cfg_attr(feature = "serde", serde(default))]
    pub layout: Option<LayoutKind>,
}

impl Default for ThreadFileConfig {
    fn default() -> Self {
        ThreadFileConfig {
            file_base: PathBuf::new(),
            delegate_kind: DelegateKind::default(),
            date_pattern: None,
            max_file_size: None,
            max_backup_index: None,
            append: true,
            immediate_flush: true,
            threshold: None,
            layout: None,
        }
    }
}

impl ThreadFileConfig {
    /// Read a configuration from `(key, value)` pairs.
    ///
    /// # Errors
    ///
    /// Return an [`ErrorKind::Configuration`](crate::ErrorKind::Configuration) error for unknown
    /// keys, unknown delegate kinds or layouts and malformed values.
    pub fn from_properties<I, K, V>(properties: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = ThreadFileConfig::default();
        for (key, value) in properties {
            let key = key.as_ref().trim();
            let value = value.as_ref().trim();
            config.set(key, value)?;
        }
        Ok(config)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), Error> {
        let invalid = |err: Error| err.with_context("key", key);
        match key.to_ascii_lowercase().as_str() {
            "filebase" => self.file_base = PathBuf::from(value),
            "delegatekind" | "subappender" | "appenderimplementationclass" => {
                self.delegate_kind = DelegateKind::from_str(value).map_err(invalid)?;
            }
            "datepattern" => self.date_pattern = Some(value.to_string()),
            "maxfilesize" => self.max_file_size = Some(value.to_string()),
            "maxbackupindex" => {
                let n = value.parse::<usize>().map_err(|err| {
                    invalid(Error::configuration("invalid integer").with_source(err))
                        .with_context("value", value)
                })?;
                self.max_backup_index = Some(n);
            }
            "append" => self.append = parse_bool(value).map_err(invalid)?,
            "immediateflush" => self.immediate_flush = parse_bool(value).map_err(invalid)?,
            "threshold" => self.threshold = Some(parse_level(value).map_err(invalid)?),
            "layout" => self.layout = Some(LayoutKind::from_str(value).map_err(invalid)?),
            _ => {
                let err = Error::configuration("unknown configuration key");
                return Err(err.with_context("key", key));
            }
        }
        Ok(())
    }

    /// Turn this configuration into a [`ThreadFileBuilder`].
    ///
    /// # Errors
    ///
    /// Return an [`ErrorKind::Configuration`](crate::ErrorKind::Configuration) error if no layout
    /// is configured, or the layout is not available.
    pub fn builder(&self) -> Result<ThreadFileBuilder, Error> {
        let mut builder = ThreadFileBuilder::new(self.file_base.clone())
            .delegate_kind(self.delegate_kind)
            .append(self.append)
            .immediate_flush(self.immediate_flush);

        builder = match self.layout {
            None => {
                return Err(Error::configuration("the appender requires a layout")
                    .with_context("file_base", self.file_base.display()));
            }
            Some(LayoutKind::Plain) => builder.layout(PlainTextLayout::default()),
            #[cfg(feature = "layout-json")]
            Some(LayoutKind::Json) => builder.layout(crate::layout::JsonLayout::default()),
            #[cfg(not(feature = "layout-json"))]
            Some(LayoutKind::Json) => {
                return Err(Error::configuration(
                    "the json layout requires the `layout-json` feature",
                ));
            }
        };

        if let Some(pattern) = &self.date_pattern {
            builder = builder.date_pattern(pattern);
        }
        if let Some(size) = &self.max_file_size {
            builder = builder.max_file_size(size);
        }
        if let Some(n) = self.max_backup_index {
            builder = builder.max_backup_index(n);
        }
        if let Some(threshold) = self.threshold {
            builder = builder.threshold(threshold);
        }
        Ok(builder)
    }

    /// Build the [`ThreadFile`] appender this configuration describes.
    pub fn build(&self) -> Result<ThreadFile, Error> {
        self.builder()?.build()
    }
}

impl FromStr for ThreadFileConfig {
    type Err = Error;

    /// Parse properties text: one `key = value` (or `key: value`) per line, with `#` and `!`
    /// starting comment lines.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut properties = vec![];
        for (i, line) in s.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let Some(pos) = line.find(['=', ':']) else {
                return Err(Error::configuration("malformed properties line")
                    .with_context("line", i + 1));
            };
            properties.push((&line[..pos], &line[pos + 1..]));
        }
        ThreadFileConfig::from_properties(properties)
    }
}

fn parse_bool(value: &str) -> Result<bool, Error> {
    match value.to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(Error::configuration("invalid boolean").with_context("value", value)),
    }
}

fn parse_level(value: &str) -> Result<LevelFilter, Error> {
    match value.to_ascii_lowercase().as_str() {
        "all" => Ok(LevelFilter::Trace),
        "fatal" => Ok(LevelFilter::Error),
        _ => LevelFilter::from_str(value).map_err(|err| {
            Error::configuration("invalid level")
                .with_context("value", value)
                .with_source(err)
        }),
    }
}

#[cfg(feature = "serde")]
mod de {
    use std::fmt::Display;
    use std::str::FromStr;

    use log::LevelFilter;
    use serde::Deserialize;
    use serde::Deserializer;

    pub(super) fn default_true() -> bool {
        true
    }

    pub(super) fn from_str<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: FromStr,
        T::Err: Display,
    {
        let s = String::deserialize(deserializer)?;
        T::from_str(&s).map_err(serde::de::Error::custom)
    }

    pub(super) fn option_level<'de, D>(deserializer: D) -> Result<Option<LevelFilter>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(s) => super::parse_level(&s)
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_from_properties() {
        let config = ThreadFileConfig::from_properties([
            ("fileBase", "logs/worker"),
            ("appenderImplementationClass", "org.apache.log4j.DailyRollingFileAppender"),
            ("DatePattern", "'.'yyyy-MM-dd-HH"),
            ("threshold", "WARN"),
            ("append", "false"),
            ("layout", "org.apache.log4j.PatternLayout"),
        ])
        .unwrap();

        assert_eq!(
            config,
            ThreadFileConfig {
                file_base: PathBuf::from("logs/worker"),
                delegate_kind: DelegateKind::DailyRollingFile,
                date_pattern: Some("'.'yyyy-MM-dd-HH".to_string()),
                max_file_size: None,
                max_backup_index: None,
                append: false,
                immediate_flush: true,
                threshold: Some(LevelFilter::Warn),
                layout: Some(LayoutKind::Plain),
            }
        );
    }

    #[test]
    fn test_parse_properties_text() {
        let config = r#"
            # size based
            fileBase = logs/worker
            subAppender: rolling
            maxFileSize = 1KB
            maxBackupIndex = 2
            ! plain text
            layout = plain
        "#
        .parse::<ThreadFileConfig>()
        .unwrap();

        assert_eq!(config.delegate_kind, DelegateKind::RollingFile);
        assert_eq!(config.max_file_size.as_deref(), Some("1KB"));
        assert_eq!(config.max_backup_index, Some(2));

        let appender = config.build().unwrap();
        assert_eq!(appender.delegate_kind(), DelegateKind::RollingFile);
    }

    #[test]
    fn test_reject_bad_properties() {
        let cases: &[&[(&str, &str)]] = &[
            &[("delegateKind", "com.example.NoSuchAppender")],
            &[("maxBackupIndex", "-1")],
            &[("append", "yes")],
            &[("threshold", "loud")],
            &[("layout", "xml")],
            &[("colour", "blue")],
        ];
        for properties in cases {
            let err = ThreadFileConfig::from_properties(properties.iter().copied()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Configuration, "{properties:?}");
        }

        let err = "fileBase logs/worker".parse::<ThreadFileConfig>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_layout_is_required() {
        let config = ThreadFileConfig::from_properties([("fileBase", "logs/worker")]).unwrap();
        let err = config.build().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_log4j_levels() {
        assert_eq!(parse_level("ALL").unwrap(), LevelFilter::Trace);
        assert_eq!(parse_level("fatal").unwrap(), LevelFilter::Error);
        assert_eq!(parse_level("off").unwrap(), LevelFilter::Off);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize() {
        let config: ThreadFileConfig = serde_json::from_str(
            r#"{
                "fileBase": "logs/worker",
                "subAppender": "org.apache.log4j.RollingFileAppender",
                "maxFileSize": "1KB",
                "threshold": "info",
                "layout": "plain"
            }"#,
        )
        .unwrap();

        assert_eq!(config.delegate_kind, DelegateKind::RollingFile);
        assert_eq!(config.threshold, Some(LevelFilter::Info));
        assert!(config.append);
    }
}
