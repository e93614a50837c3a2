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

//! File sinks that a [`ThreadFile`](crate::append::ThreadFile) appender delegates writes to.
//!
//! A sink is created by [`DelegateKind::instantiate`], pointed at its file with
//! [`FileSink::set_file`], handed every option through [`FileSink::configure`] and finally opened
//! with [`FileSink::activate`]. Each variant picks the options it understands and ignores the
//! rest:
//!
//! | Option | [`File`] | [`RollingFile`] | [`DailyRollingFile`] |
//! |---|---|---|---|
//! | `append` | yes | yes | yes |
//! | `immediate_flush` | yes | yes | yes |
//! | `max_file_size` | - | yes | - |
//! | `max_backup_index` | - | yes | - |
//! | `date_pattern` | - | - | yes |
//! | `clock` | - | - | yes |
//!
//! # Examples
//!
//! ```
//! use logforth_thread_file::delegate::DelegateKind;
//! use logforth_thread_file::delegate::DelegateOptions;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let options = DelegateOptions::default().max_file_size("1KB").max_backup_index(2);
//!
//! let mut sink = DelegateKind::RollingFile.instantiate();
//! sink.set_file(dir.path().join("app.log"));
//! sink.configure(&options).unwrap();
//! sink.activate().unwrap();
//! sink.write(b"hello\n").unwrap();
//! sink.close().unwrap();
//! ```

use std::fmt;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

pub use self::clock::Clock;
pub use self::clock::ManualClock;
pub use self::daily::DailyRollingFile;
pub use self::date_pattern::DatePattern;
pub use self::date_pattern::Period;
pub use self::file::File;
pub use self::rolling::RollingFile;
pub use self::size::FileSize;
pub(crate) use self::writer::with_suffix;
use crate::Error;
use crate::trap::DefaultTrap;
use crate::trap::Trap;

mod clock;
mod daily;
mod date_pattern;
mod file;
mod rolling;
mod size;
mod writer;

/// A file-backed sink for formatted log records.
pub trait FileSink: fmt::Debug + Send + 'static {
    /// Set the path of the file to write.
    fn set_file(&mut self, path: PathBuf);

    /// The path of the file to write, if set.
    fn file(&self) -> Option<&Path>;

    /// Apply the options this sink understands, ignoring the others.
    ///
    /// # Errors
    ///
    /// Return an [`ErrorKind::Configuration`](crate::ErrorKind::Configuration) error if an option
    /// this sink understands is malformed.
    fn configure(&mut self, options: &DelegateOptions) -> Result<(), Error>;

    /// Open the file for writing.
    ///
    /// # Errors
    ///
    /// Return an [`ErrorKind::Io`](crate::ErrorKind::Io) error if the file cannot be opened, or
    /// an [`ErrorKind::Configuration`](crate::ErrorKind::Configuration) error if the sink is not
    /// fully configured.
    fn activate(&mut self) -> Result<(), Error>;

    /// Write one formatted record.
    fn write(&mut self, bytes: &[u8]) -> Result<(), Error>;

    /// Flush buffered bytes.
    fn flush(&mut self) -> Result<(), Error>;

    /// Flush and release the file handle. Writing after close fails until re-activated.
    fn close(&mut self) -> Result<(), Error>;
}

/// The closed set of sinks a [`ThreadFile`](crate::append::ThreadFile) can delegate to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DelegateKind {
    /// Plain file, see [`File`].
    #[default]
    File,
    /// Size-based rolling file, see [`RollingFile`].
    RollingFile,
    /// Date-based rolling file, see [`DailyRollingFile`].
    DailyRollingFile,
}

impl DelegateKind {
    /// Create an unconfigured sink of this kind.
    pub fn instantiate(&self) -> Box<dyn FileSink> {
        match self {
            DelegateKind::File => Box::new(File::default()),
            DelegateKind::RollingFile => Box::new(RollingFile::default()),
            DelegateKind::DailyRollingFile => Box::new(DailyRollingFile::default()),
        }
    }

    /// The short name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            DelegateKind::File => "file",
            DelegateKind::RollingFile => "rolling",
            DelegateKind::DailyRollingFile => "daily",
        }
    }
}

impl fmt::Display for DelegateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DelegateKind {
    type Err = Error;

    /// Accept the short names `file`, `rolling` and `daily` (case-insensitive), the variant names
    /// and the log4j appender class names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        let name = name.strip_prefix("org.apache.log4j.").unwrap_or(name);
        match name.to_ascii_lowercase().as_str() {
            "file" | "fileappender" => Ok(DelegateKind::File),
            "rolling" | "rollingfile" | "rollingfileappender" => Ok(DelegateKind::RollingFile),
            "daily" | "dailyrollingfile" | "dailyrollingfileappender" => {
                Ok(DelegateKind::DailyRollingFile)
            }
            _ => Err(Error::configuration("unknown delegate kind").with_context("kind", s)),
        }
    }
}

/// Options handed to every sink through [`FileSink::configure`].
///
/// Size and date options are kept in their textual form; only the sink that understands them
/// parses them, so a malformed `max_file_size` does not matter to a [`DailyRollingFile`].
#[derive(Debug, Clone)]
pub struct DelegateOptions {
    append: bool,
    immediate_flush: bool,
    max_file_size: Option<String>,
    max_backup_index: Option<usize>,
    date_pattern: Option<String>,
    clock: Clock,
    trap: Arc<dyn Trap>,
}

impl Default for DelegateOptions {
    fn default() -> Self {
        DelegateOptions {
            append: true,
            immediate_flush: true,
            max_file_size: None,
            max_backup_index: None,
            date_pattern: None,
            clock: Clock::default(),
            trap: Arc::new(DefaultTrap::default()),
        }
    }
}

impl DelegateOptions {
    /// Whether to keep the content of an existing file. Default to `true`.
    pub fn append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    /// Whether to flush after every record. Default to `true`.
    pub fn immediate_flush(mut self, immediate_flush: bool) -> Self {
        self.immediate_flush = immediate_flush;
        self
    }

    /// The size expression at which a [`RollingFile`] rolls over, e.g. `"10MB"`.
    pub fn max_file_size(mut self, size: impl Into<String>) -> Self {
        self.max_file_size = Some(size.into());
        self
    }

    /// The number of backups a [`RollingFile`] keeps.
    pub fn max_backup_index(mut self, n: usize) -> Self {
        self.max_backup_index = Some(n);
        self
    }

    /// The [`DatePattern`] a [`DailyRollingFile`] rolls over by, e.g. `"'.'yyyy-MM-dd"`.
    pub fn date_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.date_pattern = Some(pattern.into());
        self
    }

    /// The clock a [`DailyRollingFile`] reads the time from.
    pub fn clock(mut self, clock: impl Into<Clock>) -> Self {
        self.clock = clock.into();
        self
    }

    /// The trap for errors raised while rolling over.
    pub fn trap(mut self, trap: impl Trap) -> Self {
        self.trap = Arc::new(trap);
        self
    }

    pub(crate) fn shared_trap(&self) -> Arc<dyn Trap> {
        self.trap.clone()
    }
}

fn not_activated(path: Option<&Path>) -> Error {
    let err = Error::io("log file is not open");
    match path {
        Some(path) => err.with_context("file", path.display()),
        None => err,
    }
}

fn require_file(path: Option<&Path>) -> Result<&Path, Error> {
    path.ok_or_else(|| Error::configuration("no file is set for the sink"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_parse_delegate_kind() {
        let cases = [
            ("file", DelegateKind::File),
            ("File", DelegateKind::File),
            ("org.apache.log4j.FileAppender", DelegateKind::File),
            ("rolling", DelegateKind::RollingFile),
            ("RollingFile", DelegateKind::RollingFile),
            ("org.apache.log4j.RollingFileAppender", DelegateKind::RollingFile),
            ("daily", DelegateKind::DailyRollingFile),
            (
                "org.apache.log4j.DailyRollingFileAppender",
                DelegateKind::DailyRollingFile,
            ),
        ];
        for (name, kind) in cases {
            assert_eq!(DelegateKind::from_str(name).unwrap(), kind, "{name}");
        }
    }

    #[test]
    fn test_reject_unknown_delegate_kind() {
        for name in ["", "org.apache.log4j.ConsoleAppender", "com.example.Missing"] {
            let err = DelegateKind::from_str(name).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Configuration, "{name}");
        }
    }

    #[test]
    fn test_activate_without_file_is_configuration_error() {
        for kind in [
            DelegateKind::File,
            DelegateKind::RollingFile,
            DelegateKind::DailyRollingFile,
        ] {
            let mut sink = kind.instantiate();
            sink.configure(&DelegateOptions::default()).unwrap();
            let err = sink.activate().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Configuration, "{kind}");
        }
    }

    #[test]
    fn test_write_before_activate_fails() {
        let mut sink = DelegateKind::File.instantiate();
        let err = sink.write(b"early").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
