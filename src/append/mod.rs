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

//! Dispatch log records to various targets.

use std::fmt;
use std::sync::Arc;

use log::Record;

use crate::Error;

pub mod thread_file;

pub use self::thread_file::Caller;
pub use self::thread_file::ThreadFile;
pub use self::thread_file::ThreadFileBuilder;

/// An appender that can process log records.
pub trait Append: fmt::Debug + Send + Sync + 'static {
    /// Dispatch a log record to the append target.
    fn append(&self, record: &Record) -> Result<(), Error>;

    /// Flush any buffered records.
    ///
    /// Default to a no-op.
    fn flush(&self) -> Result<(), Error> {
        Ok(())
    }

    /// Release the resources held on behalf of the calling context.
    ///
    /// Default to [`flush`](Append::flush).
    fn close(&self) -> Result<(), Error> {
        self.flush()
    }

    /// Whether the appender formats records with a configured [`Layout`](crate::Layout).
    ///
    /// Configuration readers reject a configuration that sets no layout for an appender that
    /// returns `true`.
    fn requires_layout(&self) -> bool {
        false
    }
}

impl<T: Append> From<T> for Box<dyn Append> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}

impl<T: Append> Append for Arc<T> {
    fn append(&self, record: &Record) -> Result<(), Error> {
        (**self).append(record)
    }

    fn flush(&self) -> Result<(), Error> {
        (**self).flush()
    }

    fn close(&self) -> Result<(), Error> {
        (**self).close()
    }

    fn requires_layout(&self) -> bool {
        (**self).requires_layout()
    }
}
