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
use std::fs::OpenOptions;
use std::io;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::time::SystemTime;

use crate::Error;

/// An open log file that counts the bytes it holds.
#[derive(Debug)]
pub(crate) struct LogFile {
    path: PathBuf,
    writer: BufWriter<fs::File>,
    len: u64,
    immediate_flush: bool,
}

impl LogFile {
    /// Open `path` for writing, creating missing parent directories.
    ///
    /// With `append`, existing content is kept and counted; otherwise the file is truncated.
    pub(crate) fn open(path: &Path, append: bool, immediate_flush: bool) -> Result<LogFile, Error> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| {
                Error::io("failed to create log directory")
                    .with_context("dir", parent.display())
                    .with_source(err)
            })?;
        }

        let mut options = OpenOptions::new();
        options.create(true);
        if append {
            options.append(true);
        } else {
            options.write(true).truncate(true);
        }

        let file = options.open(path).map_err(|err| {
            Error::io("failed to open log file")
                .with_context("file", path.display())
                .with_source(err)
        })?;
        let len = if append {
            file.metadata().map(|m| m.len()).unwrap_or_default()
        } else {
            0
        };

        Ok(LogFile {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            len,
            immediate_flush,
        })
    }

    pub(crate) fn len(&self) -> u64 {
        self.len
    }

    /// The last modification time of the file on disk, if known.
    pub(crate) fn modified(&self) -> Option<SystemTime> {
        self.writer.get_ref().metadata().ok()?.modified().ok()
    }

    pub(crate) fn write_all(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.writer
            .write_all(bytes)
            .map_err(|err| self.io_error("failed to write log file", err))?;
        self.len += bytes.len() as u64;
        if self.immediate_flush {
            self.flush()?;
        }
        Ok(())
    }

    pub(crate) fn flush(&mut self) -> Result<(), Error> {
        self.writer
            .flush()
            .map_err(|err| self.io_error("failed to flush log file", err))
    }

    /// Flush buffered bytes and release the file handle.
    pub(crate) fn close(mut self) -> Result<(), Error> {
        self.flush()
    }

    fn io_error(&self, message: &'static str, err: io::Error) -> Error {
        Error::io(message)
            .with_context("file", self.path.display())
            .with_source(err)
    }
}

/// Return `path` with `suffix` appended to its last component.
pub(crate) fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(suffix);
    PathBuf::from(s)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_open_creates_parent_dirs_and_counts_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("app-main.log");

        let mut file = LogFile::open(&path, true, true).unwrap();
        file.write_all(b"hello\n").unwrap();
        assert_eq!(file.len(), 6);
        file.close().unwrap();

        let file = LogFile::open(&path, true, true).unwrap();
        assert_eq!(file.len(), 6);
        drop(file);

        let file = LogFile::open(&path, false, true).unwrap();
        assert_eq!(file.len(), 0);
        drop(file);
        assert_eq!(fs::read(&path).unwrap(), b"");
    }

    #[test]
    fn test_with_suffix() {
        assert_eq!(
            with_suffix(Path::new("logs/app-main.log"), ".1"),
            PathBuf::from("logs/app-main.log.1")
        );
    }
}
