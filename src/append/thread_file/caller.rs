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

use std::fmt;
use std::sync::Arc;
use std::thread;
use std::thread::Thread;

/// The identity of a logging caller.
///
/// A caller is identified by name: two threads carrying the same name share one delegate and one
/// file. Path separators in the name are replaced by `_` so that the name always stays inside
/// the log directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Caller {
    name: Arc<str>,
}

impl Caller {
    /// Create a caller with an explicit name.
    pub fn new(name: impl AsRef<str>) -> Caller {
        let name = name.as_ref().replace(['/', '\\'], "_");
        Caller { name: name.into() }
    }

    /// The caller for the current thread.
    ///
    /// Named threads use their name. Unnamed threads are named `thread-{n}`, where `n` is the
    /// numeric id of the thread.
    pub fn current() -> Caller {
        thread_local! {
            static CURRENT: Caller = Caller::from_thread(&thread::current());
        }

        CURRENT
            .try_with(Caller::clone)
            .unwrap_or_else(|_| Caller::from_thread(&thread::current()))
    }

    /// The caller for `thread`.
    pub fn from_thread(thread: &Thread) -> Caller {
        match thread.name() {
            Some(name) if !name.is_empty() => Caller::new(name),
            _ => {
                let id = format!("{:?}", thread.id());
                let n = id
                    .chars()
                    .filter(|c| c.is_ascii_digit())
                    .collect::<String>();
                Caller::new(format!("thread-{n}"))
            }
        }
    }

    /// The name used in the caller's file name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<&str> for Caller {
    fn from(name: &str) -> Self {
        Caller::new(name)
    }
}

impl From<String> for Caller {
    fn from(name: String) -> Self {
        Caller::new(name)
    }
}
