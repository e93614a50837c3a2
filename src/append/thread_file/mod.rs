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

//! Appender that writes each calling thread's records to a file of its own.
//!
//! The first record a thread logs creates a delegate [`FileSink`] bound to
//! `{file_base}-{caller}.log`; later records from that thread reuse it.
//!
//! # Examples
//!
//! ```
//! use logforth_thread_file::append::ThreadFileBuilder;
//! use logforth_thread_file::delegate::DelegateKind;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let appender = ThreadFileBuilder::new(dir.path().join("app"))
//!     .delegate_kind(DelegateKind::RollingFile)
//!     .max_file_size("10MB")
//!     .max_backup_index(3)
//!     .build()
//!     .unwrap();
//!
//! logforth_thread_file::builder()
//!     .dispatch(|d| d.filter(log::LevelFilter::Info).append(appender))
//!     .apply();
//! ```

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use dashmap::DashMap;
use log::LevelFilter;
use log::Record;

use crate::Append;
use crate::Error;
use crate::Layout;
use crate::delegate::Clock;
use crate::delegate::DelegateKind;
use crate::delegate::DelegateOptions;
use crate::delegate::FileSink;
use crate::delegate::with_suffix;
use crate::layout::PlainTextLayout;
use crate::trap::Trap;

mod caller;
mod exit;

pub use self::caller::Caller;
use self::exit::close_on_thread_exit;

type Delegates = DashMap<Caller, Arc<Mutex<Delegate>>>;

/// A builder to configure and create a [`ThreadFile`] appender.
#[derive(Debug)]
pub struct ThreadFileBuilder {
    file_base: PathBuf,
    kind: DelegateKind,
    layout: Box<dyn Layout>,
    threshold: Option<LevelFilter>,
    options: DelegateOptions,
}

impl ThreadFileBuilder {
    /// Create a new builder. Files are named `{file_base}-{caller}.log`.
    #[must_use]
    pub fn new(file_base: impl Into<PathBuf>) -> Self {
        ThreadFileBuilder {
            file_base: file_base.into(),
            kind: DelegateKind::default(),
            layout: Box::new(PlainTextLayout::default()),
            threshold: None,
            options: DelegateOptions::default(),
        }
    }

    /// Set the kind of file sink each caller writes to.
    ///
    /// Default to [`DelegateKind::File`].
    #[must_use]
    pub fn delegate_kind(mut self, kind: DelegateKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the layout records are formatted with.
    ///
    /// Default to [`PlainTextLayout`].
    #[must_use]
    pub fn layout(mut self, layout: impl Into<Box<dyn Layout>>) -> Self {
        self.layout = layout.into();
        self
    }

    /// Drop records less severe than `threshold`.
    #[must_use]
    pub fn threshold(mut self, threshold: LevelFilter) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Set the date pattern of [`DelegateKind::DailyRollingFile`] sinks.
    #[must_use]
    pub fn date_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.options = self.options.date_pattern(pattern);
        self
    }

    /// Set the size expression at which [`DelegateKind::RollingFile`] sinks roll over.
    #[must_use]
    pub fn max_file_size(mut self, size: impl Into<String>) -> Self {
        self.options = self.options.max_file_size(size);
        self
    }

    /// Set the number of backups [`DelegateKind::RollingFile`] sinks keep.
    #[must_use]
    pub fn max_backup_index(mut self, n: usize) -> Self {
        self.options = self.options.max_backup_index(n);
        self
    }

    /// Whether an existing file is appended to. Default to `true`.
    #[must_use]
    pub fn append(mut self, append: bool) -> Self {
        self.options = self.options.append(append);
        self
    }

    /// Whether every record is flushed to disk. Default to `true`.
    #[must_use]
    pub fn immediate_flush(mut self, immediate_flush: bool) -> Self {
        self.options = self.options.immediate_flush(immediate_flush);
        self
    }

    /// Set the clock date-based sinks read the time from.
    #[must_use]
    pub fn clock(mut self, clock: impl Into<Clock>) -> Self {
        self.options = self.options.clock(clock);
        self
    }

    /// Set the trap for errors that cannot be returned to the caller.
    #[must_use]
    pub fn trap(mut self, trap: impl Trap) -> Self {
        self.options = self.options.trap(trap);
        self
    }

    /// Build the [`ThreadFile`] appender.
    ///
    /// # Errors
    ///
    /// Return an error if `file_base` is empty. Options a sink cannot use are reported by the
    /// first record that creates such a sink.
    pub fn build(self) -> Result<ThreadFile, Error> {
        let ThreadFileBuilder {
            file_base,
            kind,
            layout,
            threshold,
            options,
        } = self;

        if file_base.as_os_str().is_empty() {
            return Err(Error::configuration("file base must not be empty"));
        }

        let trap = options.shared_trap();
        Ok(ThreadFile {
            file_base,
            kind,
            layout,
            threshold,
            options,
            trap,
            delegates: Arc::new(DashMap::new()),
        })
    }
}

#[derive(Debug)]
struct Delegate {
    sink: Box<dyn FileSink>,
    closed: bool,
}

impl Delegate {
    fn close(&mut self) -> Result<(), Error> {
        self.closed = true;
        self.sink.close()
    }
}

/// An appender that writes the records of each caller to `{file_base}-{caller}.log`.
///
/// Delegates are created lazily and live until their thread exits, [`close`](Append::close) is
/// called from their thread, [`close_all`](ThreadFile::close_all) is called, or the appender is
/// dropped. Delegates created through [`append_as`](ThreadFile::append_as) are not bound to a
/// thread and stay open until closed explicitly.
#[derive(Debug)]
pub struct ThreadFile {
    file_base: PathBuf,
    kind: DelegateKind,
    layout: Box<dyn Layout>,
    threshold: Option<LevelFilter>,
    options: DelegateOptions,
    trap: Arc<dyn Trap>,
    delegates: Arc<Delegates>,
}

impl ThreadFile {
    /// The base path the caller files are named from.
    pub fn file_base(&self) -> &Path {
        &self.file_base
    }

    /// The kind of file sink each caller writes to.
    pub fn delegate_kind(&self) -> DelegateKind {
        self.kind
    }

    /// The file `caller` writes to.
    pub fn file_for(&self, caller: &Caller) -> PathBuf {
        with_suffix(&self.file_base, &format!("-{}.log", caller.name()))
    }

    /// The callers that currently hold an open delegate, sorted by name.
    pub fn callers(&self) -> Vec<Caller> {
        let mut callers = self
            .delegates
            .iter()
            .map(|entry| entry.key().clone())
            .collect::<Vec<_>>();
        callers.sort();
        callers
    }

    /// Append `record` on behalf of `caller` rather than the current thread.
    pub fn append_as(&self, caller: &Caller, record: &Record) -> Result<(), Error> {
        self.write(caller, record, false)
    }

    fn write(&self, caller: &Caller, record: &Record, current_thread: bool) -> Result<(), Error> {
        if self.threshold.is_some_and(|threshold| record.level() > threshold) {
            return Ok(());
        }

        let mut bytes = self.layout.format(record)?;
        bytes.push(b'\n');

        // a delegate closed between lookup and lock is replaced by a fresh one
        for _ in 0..2 {
            let (entry, created) = self.delegate(caller)?;
            if created && current_thread {
                close_on_thread_exit(&self.delegates, caller, &entry, &self.trap);
            }
            let mut delegate = entry.lock().unwrap_or_else(|e| e.into_inner());
            if delegate.closed {
                continue;
            }
            return delegate
                .sink
                .write(&bytes)
                .map_err(|err| err.with_context("caller", caller.name()));
        }

        Err(Error::io("delegate closed concurrently").with_context("caller", caller.name()))
    }

    /// Close the delegate of `caller` and forget it.
    ///
    /// A later record from `caller` reopens the file.
    pub fn close_as(&self, caller: &Caller) -> Result<(), Error> {
        match self.delegates.remove(caller) {
            Some((_, entry)) => {
                let mut delegate = entry.lock().unwrap_or_else(|e| e.into_inner());
                delegate.close()
            }
            None => Ok(()),
        }
    }

    /// Close the delegates of every caller.
    ///
    /// All delegates are closed even if some fail; the first error is returned.
    pub fn close_all(&self) -> Result<(), Error> {
        let callers = self
            .delegates
            .iter()
            .map(|entry| entry.key().clone())
            .collect::<Vec<_>>();

        let mut result = Ok(());
        for (caller, entry) in callers
            .into_iter()
            .filter_map(|caller| self.delegates.remove(&caller))
        {
            let mut delegate = entry.lock().unwrap_or_else(|e| e.into_inner());
            if let Err(err) = delegate.close() {
                let err = err.with_context("caller", caller.name());
                if result.is_ok() {
                    result = Err(err);
                } else {
                    self.trap.trap(&err);
                }
            }
        }
        result
    }

    /// Return the delegate of `caller` and whether this call created it.
    ///
    /// Construction happens under the lock of the caller's shard, so concurrent first records of
    /// one caller create a single delegate. Nothing is stored when construction fails.
    fn delegate(&self, caller: &Caller) -> Result<(Arc<Mutex<Delegate>>, bool), Error> {
        if let Some(entry) = self.delegates.get(caller) {
            return Ok((entry.value().clone(), false));
        }

        let mut created = false;
        let entry = self
            .delegates
            .entry(caller.clone())
            .or_try_insert_with(|| {
                created = true;
                self.create_delegate(caller).map(|delegate| Arc::new(Mutex::new(delegate)))
            })
            .map(|entry| entry.value().clone())
            .map_err(|err| err.with_context("caller", caller.name()))?;
        Ok((entry, created))
    }

    fn create_delegate(&self, caller: &Caller) -> Result<Delegate, Error> {
        let mut sink = self.kind.instantiate();
        sink.set_file(self.file_for(caller));
        sink.configure(&self.options)?;
        sink.activate()?;
        Ok(Delegate {
            sink,
            closed: false,
        })
    }
}

impl Append for ThreadFile {
    fn append(&self, record: &Record) -> Result<(), Error> {
        self.write(&Caller::current(), record, true)
    }

    fn flush(&self) -> Result<(), Error> {
        let entries = self
            .delegates
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect::<Vec<_>>();

        let mut result = Ok(());
        for (caller, entry) in entries {
            let mut delegate = entry.lock().unwrap_or_else(|e| e.into_inner());
            if delegate.closed {
                continue;
            }
            if let Err(err) = delegate.sink.flush() {
                let err = err.with_context("caller", caller.name());
                if result.is_ok() {
                    result = Err(err);
                } else {
                    self.trap.trap(&err);
                }
            }
        }
        result
    }

    /// Close the delegate of the current thread only.
    fn close(&self) -> Result<(), Error> {
        self.close_as(&Caller::current())
    }

    fn requires_layout(&self) -> bool {
        true
    }
}

impl Drop for ThreadFile {
    fn drop(&mut self) {
        if let Err(err) = self.close_all() {
            let err = Error::io("failed to close delegates on dropped").with_source(err);
            self.trap.trap(&err);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Barrier;
    use std::thread;

    use tempfile::TempDir;

    use super::*;
    use crate::ErrorKind;
    use crate::layout::CustomLayout;

    fn message_layout() -> CustomLayout {
        CustomLayout::new(|record: &Record| Ok(record.args().to_string().into_bytes()))
    }

    #[test]
    fn test_file_for_caller() {
        let appender = ThreadFileBuilder::new("logs/app").build().unwrap();
        assert_eq!(
            appender.file_for(&Caller::new("worker-1")),
            PathBuf::from("logs/app-worker-1.log")
        );
    }

    #[test]
    fn test_empty_file_base_is_rejected() {
        let err = ThreadFileBuilder::new("").build().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_append_as_explicit_callers() {
        let temp_dir = TempDir::new().unwrap();
        let appender = ThreadFileBuilder::new(temp_dir.path().join("app"))
            .layout(message_layout())
            .build()
            .unwrap();

        for caller in ["job-1", "job-2", "job-1"] {
            let caller = Caller::new(caller);
            appender
                .append_as(&caller, &Record::builder().args(format_args!("hello")).build())
                .unwrap();
        }
        assert_eq!(
            appender.callers(),
            vec![Caller::new("job-1"), Caller::new("job-2")]
        );

        let job1 = fs::read_to_string(temp_dir.path().join("app-job-1.log")).unwrap();
        let job2 = fs::read_to_string(temp_dir.path().join("app-job-2.log")).unwrap();
        assert_eq!(job1, "hello\nhello\n");
        assert_eq!(job2, "hello\n");
    }

    #[test]
    fn test_close_as_only_closes_own_delegate() {
        let temp_dir = TempDir::new().unwrap();
        let appender = ThreadFileBuilder::new(temp_dir.path().join("app"))
            .layout(message_layout())
            .build()
            .unwrap();

        let a = Caller::new("a");
        let b = Caller::new("b");
        let append = |caller: &Caller| {
            appender.append_as(caller, &Record::builder().args(format_args!("x")).build())
        };
        append(&a).unwrap();
        append(&b).unwrap();

        appender.close_as(&a).unwrap();
        assert_eq!(appender.callers(), vec![b.clone()]);

        // closing twice is a no-op
        appender.close_as(&a).unwrap();

        // reopened in append mode
        append(&a).unwrap();
        let content = fs::read_to_string(appender.file_for(&a)).unwrap();
        assert_eq!(content, "x\nx\n");

        appender.close_all().unwrap();
        assert!(appender.callers().is_empty());
    }

    #[test]
    fn test_failed_delegate_is_retried() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();

        let appender = ThreadFileBuilder::new(blocker.join("app"))
            .layout(message_layout())
            .build()
            .unwrap();
        let caller = Caller::new("main");
        let append = || {
            appender.append_as(&caller, &Record::builder().args(format_args!("x")).build())
        };

        let err = append().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(appender.callers().is_empty());

        fs::remove_file(&blocker).unwrap();
        append().unwrap();
        assert_eq!(appender.callers(), vec![caller]);
    }

    #[test]
    fn test_concurrent_first_records_create_one_delegate() {
        const THREADS: usize = 8;

        let temp_dir = TempDir::new().unwrap();
        // a second delegate would truncate the lines of the first
        let appender = Arc::new(
            ThreadFileBuilder::new(temp_dir.path().join("app"))
                .layout(message_layout())
                .append(false)
                .build()
                .unwrap(),
        );
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles = (0..THREADS)
            .map(|i| {
                let appender = appender.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    appender
                        .append_as(
                            &Caller::new("shared"),
                            &Record::builder().args(format_args!("line {i}")).build(),
                        )
                        .unwrap();
                })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            handle.join().unwrap();
        }

        let shared = Caller::new("shared");
        assert_eq!(appender.callers(), vec![shared.clone()]);
        let content = fs::read_to_string(appender.file_for(&shared)).unwrap();
        let mut lines = content.lines().collect::<Vec<_>>();
        lines.sort();
        let mut expected = (0..THREADS).map(|i| format!("line {i}")).collect::<Vec<_>>();
        expected.sort();
        assert_eq!(lines, expected);
    }

    #[test]
    fn test_thread_exit_closes_own_delegate_only() {
        let temp_dir = TempDir::new().unwrap();
        let appender = Arc::new(
            ThreadFileBuilder::new(temp_dir.path().join("app"))
                .layout(message_layout())
                .build()
                .unwrap(),
        );
        let pinned = Caller::new("pinned");
        appender
            .append_as(&pinned, &Record::builder().args(format_args!("kept")).build())
            .unwrap();

        let cloned = appender.clone();
        let caller = thread::spawn(move || {
            cloned
                .append(&Record::builder().args(format_args!("short-lived")).build())
                .unwrap();
            assert_eq!(cloned.callers().len(), 2);
            Caller::current()
        })
        .join()
        .unwrap();

        assert_eq!(appender.callers(), vec![pinned]);
        let content = fs::read_to_string(appender.file_for(&caller)).unwrap();
        assert_eq!(content, "short-lived\n");
    }

    #[test]
    fn test_requires_layout() {
        let appender = ThreadFileBuilder::new("app").build().unwrap();
        assert!(appender.requires_layout());
    }
}
