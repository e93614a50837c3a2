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

use std::path::Path;
use std::path::PathBuf;

use crate::Error;
use crate::delegate::DelegateOptions;
use crate::delegate::FileSink;
use crate::delegate::not_activated;
use crate::delegate::require_file;
use crate::delegate::writer::LogFile;

/// A sink that writes every record to a single file, without rollover.
#[derive(Debug)]
pub struct File {
    path: Option<PathBuf>,
    append: bool,
    immediate_flush: bool,
    file: Option<LogFile>,
}

impl Default for File {
    fn default() -> Self {
        File {
            path: None,
            append: true,
            immediate_flush: true,
            file: None,
        }
    }
}

impl FileSink for File {
    fn set_file(&mut self, path: PathBuf) {
        self.path = Some(path);
    }

    fn file(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn configure(&mut self, options: &DelegateOptions) -> Result<(), Error> {
        self.append = options.append;
        self.immediate_flush = options.immediate_flush;
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
            Some(file) => file.write_all(bytes),
            None => Err(not_activated(self.path.as_deref())),
        }
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
