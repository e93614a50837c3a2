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

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use jiff::Timestamp;
use jiff::Zoned;

use crate::Error;
use crate::delegate::Clock;
use crate::delegate::DatePattern;
use crate::delegate::DelegateOptions;
use crate::delegate::FileSink;
use crate::delegate::Period;
use crate::delegate::not_activated;
use crate::delegate::require_file;
use crate::delegate::writer::LogFile;
use crate::delegate::writer::with_suffix;
use crate::trap::DefaultTrap;
use crate::trap::Trap;

/// A sink that rolls its file over at the boundaries of a [`DatePattern`]'s period.
///
/// The first record written at or after a boundary moves the file to `file` followed by the
/// pattern formatted for the period the file covered, e.g. `app-main.log.2024-08-10`, and starts
/// a fresh file. An existing archive of the same name is replaced.
#[derive(Debug)]
pub struct DailyRollingFile {
    path: Option<PathBuf>,
    append: bool,
    immediate_flush: bool,
    pattern: DatePattern,
    clock: Clock,
    trap: Arc<dyn Trap>,
    state: Option<State>,
}

#[derive(Debug)]
struct State {
    file: Option<LogFile>,
    period: Period,
    // suffix of the archive the current file becomes
    scheduled: String,
    // `None` checks on the next write
    next_check: Option<Zoned>,
}

impl Default for DailyRollingFile {
    fn default() -> Self {
        DailyRollingFile {
            path: None,
            append: true,
            immediate_flush: true,
            pattern: DatePattern::default(),
            clock: Clock::default(),
            trap: Arc::new(DefaultTrap::default()),
            state: None,
        }
    }
}

impl DailyRollingFile {
    /// The pattern rolled-over files are named by.
    pub fn date_pattern(&self) -> &DatePattern {
        &self.pattern
    }

    fn rollover(&mut self, now: &Zoned) {
        let Some(path) = self.path.clone() else {
            return;
        };
        let Some(state) = self.state.as_mut() else {
            return;
        };

        let dated = match self.pattern.format(now) {
            Ok(dated) => dated,
            Err(err) => {
                self.trap.trap(&err);
                return;
            }
        };
        if dated == state.scheduled {
            return;
        }

        if let Some(file) = state.file.take() {
            if let Err(err) = file.close() {
                self.trap.trap(&err);
            }
        }

        let archive = with_suffix(&path, &state.scheduled);
        if let Err(err) = archive_file(&path, &archive) {
            self.trap.trap(&err);
        }

        // a file that could not be archived keeps growing
        match LogFile::open(&path, true, self.immediate_flush) {
            Ok(file) => state.file = Some(file),
            Err(err) => self.trap.trap(&err),
        }
        state.scheduled = dated;
    }
}

fn archive_file(path: &Path, archive: &Path) -> Result<(), Error> {
    if fs::exists(archive).is_ok_and(|ok| ok) {
        fs::remove_file(archive).map_err(|err| {
            Error::io("failed to remove existing archive")
                .with_context("file", archive.display())
                .with_source(err)
        })?;
    }

    fs::rename(path, archive).map_err(|err| {
        Error::io("failed to archive log file")
            .with_context("file", path.display())
            .with_context("archive", archive.display())
            .with_source(err)
    })
}

impl FileSink for DailyRollingFile {
    fn set_file(&mut self, path: PathBuf) {
        self.path = Some(path);
    }

    fn file(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn configure(&mut self, options: &DelegateOptions) -> Result<(), Error> {
        self.append = options.append;
        self.immediate_flush = options.immediate_flush;
        if let Some(pattern) = options.date_pattern.as_deref() {
            self.pattern = DatePattern::from_str(pattern)?;
        }
        self.clock = options.clock.clone();
        self.trap = options.shared_trap();
        Ok(())
    }

    fn activate(&mut self) -> Result<(), Error> {
        let path = require_file(self.file())?;
        let Some(period) = self.pattern.period() else {
            return Err(
                Error::configuration("date pattern names no rollover period")
                    .with_context("pattern", self.pattern.as_str()),
            );
        };

        let now = self.clock.now();
        let existed = fs::exists(path).is_ok_and(|ok| ok);
        let file = LogFile::open(path, self.append, self.immediate_flush)?;

        // an appended file covers the period it was last written in
        let covered = if existed && self.append {
            file.modified()
                .and_then(|mtime| Timestamp::try_from(mtime).ok())
                .map(|ts| ts.to_zoned(now.time_zone().clone()))
                .unwrap_or_else(|| now.clone())
        } else {
            now
        };
        let scheduled = self.pattern.format(&covered)?;

        self.state = Some(State {
            file: Some(file),
            period,
            scheduled,
            next_check: None,
        });
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let Some(state) = self.state.as_mut() else {
            return Err(not_activated(self.path.as_deref()));
        };

        let now = self.clock.now();
        if state.next_check.as_ref().is_none_or(|next| &now >= next) {
            match state.period.next_boundary(&now) {
                Ok(next) => state.next_check = Some(next),
                Err(err) => self.trap.trap(&err),
            }
            self.rollover(&now);
        }

        match self.state.as_mut().and_then(|state| state.file.as_mut()) {
            Some(file) => file.write_all(bytes),
            None => Err(not_activated(self.path.as_deref())),
        }
    }

    fn flush(&mut self) -> Result<(), Error> {
        match self.state.as_mut().and_then(|state| state.file.as_mut()) {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }

    fn close(&mut self) -> Result<(), Error> {
        match self.state.take().and_then(|state| state.file) {
            Some(file) => file.close(),
            None => Ok(()),
        }
    }
}
