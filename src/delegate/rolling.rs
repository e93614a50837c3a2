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

use crate::Error;
use crate::delegate::DelegateOptions;
use crate::delegate::FileSink;
use crate::delegate::FileSize;
use crate::delegate::not_activated;
use crate::delegate::require_file;
use crate::delegate::writer::LogFile;
use crate::delegate::writer::with_suffix;
use crate::trap::DefaultTrap;
use crate::trap::Trap;

/// A sink that rolls its file over once it reaches a size.
///
/// On rollover `file.{n-1}` becomes `file.{n}` down to `file` becoming `file.1`, and the oldest
/// backup beyond `max_backup_index` is deleted. With a `max_backup_index` of `0` the file is
/// truncated instead.
#[derive(Debug)]
pub struct RollingFile {
    path: Option<PathBuf>,
    append: bool,
    immediate_flush: bool,
    max_file_size: FileSize,
    max_backup_index: usize,
    trap: Arc<dyn Trap>,
    file: Option<LogFile>,
}

impl Default for RollingFile {
    fn default() -> Self {
        RollingFile {
            path: None,
            append: true,
            immediate_flush: true,
            max_file_size: FileSize::DEFAULT,
            max_backup_index: 1,
            trap: Arc::new(DefaultTrap::default()),
            file: None,
        }
    }
}

impl RollingFile {
    /// The size at which the file rolls over.
    pub fn max_file_size(&self) -> FileSize {
        self.max_file_size
    }

    /// The number of backups kept.
    pub fn max_backup_index(&self) -> usize {
        self.max_backup_index
    }

    fn should_rollover_on_size(&self) -> bool {
        self.file
            .as_ref()
            .is_some_and(|file| file.len() >= self.max_file_size.bytes())
    }

    fn rollover(&mut self) {
        let Some(path) = self.path.clone() else {
            return;
        };

        // release the handle before renaming
        if let Some(file) = self.file.take() {
            if let Err(err) = file.close() {
                self.trap.trap(&err);
            }
        }

        let renamed = if self.max_backup_index > 0 {
            match self.shift_backups(&path) {
                Ok(()) => true,
                Err(err) => {
                    self.trap.trap(&err);
                    false
                }
            }
        } else {
            false
        };

        // keep appending to the current file if it could not be archived
        let append = self.max_backup_index > 0 && !renamed;
        match LogFile::open(&path, append, self.immediate_flush) {
            Ok(file) => self.file = Some(file),
            Err(err) => self.trap.trap(&err),
        }
    }

    fn shift_backups(&self, path: &Path) -> Result<(), Error> {
        let n = self.max_backup_index;

        let oldest = with_suffix(path, &format!(".{n}"));
        if fs::exists(&oldest).is_ok_and(|ok| ok) {
            fs::remove_file(&oldest).map_err(|err| {
                Error::io("failed to remove oldest backup")
                    .with_context("file", oldest.display())
                    .with_source(err)
            })?;
        }

        for i in (1..n).rev() {
            let from = with_suffix(path, &format!(".{i}"));
            if !fs::exists(&from).is_ok_and(|ok| ok) {
                continue;
            }
            let to = with_suffix(path, &format!(".{}", i + 1));
            fs::rename(&from, &to).map_err(|err| {
                Error::io("failed to shift backup")
                    .with_context("file", from.display())
                    .with_source(err)
            })?;
        }

        let archive = with_suffix(path, ".1");
        fs::rename(path, &archive).map_err(|err| {
            Error::io("failed to archive log file")
                .with_context("file", path.display())
                .with_source(err)
        })
    }
}

impl FileSink for RollingFile {
    fn set_file(&mut self, path: PathBuf) {
        self.path = Some(path);
    }

    fn file(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn configure(&mut self, options: &DelegateOptions) -> Result<(), Error> {
        self.append = options.append;
        self.immediate_flush = options.immediate_flush;
        if let Some(size) = options.max_file_size.as_deref() {
            self.max_file_size = FileSize::from_str(size)?;
        }
        if let Some(n) = options.max_backup_index {
            self.max_backup_index = n;
        }
        self.trap = options.shared_trap();
        Ok(())
    }

    fn activate(&mut self) -> Result<(), Error> {
        let path = require_file(self.file())?;
        let file = LogFile::open(path, self.append, self.immediate_flush)?;
        self.file = Some(file);
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), Error> {
        match self.file.as_mut() {
            Some(file) => file.write_all(bytes)?,
            None => return Err(not_activated(self.path.as_deref())),
        }

        if self.should_rollover_on_size() {
            self.rollover();
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Error> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }

    fn close(&mut self) -> Result<(), Error> {
        match self.file.take() {
            Some(file) => file.close(),
            None => Ok(()),
        }
    }
}
