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

use std::sync::Arc;
use std::sync::Mutex;

use jiff::Span;
use jiff::Zoned;

/// The source of "now" for date-based rollover.
#[derive(Debug, Clone, Default)]
pub enum Clock {
    /// The system clock in the system timezone.
    #[default]
    DefaultClock,
    /// A clock that only moves when told to.
    ManualClock(ManualClock),
}

impl Clock {
    /// Read the current time.
    pub fn now(&self) -> Zoned {
        match self {
            Clock::DefaultClock => Zoned::now(),
            Clock::ManualClock(clock) => clock.now(),
        }
    }
}

/// A clock whose time is set explicitly.
///
/// Clones share the same time, so a handle kept outside an appender can move the time seen by
/// every delegate the appender creates.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
///
/// use jiff::Span;
/// use jiff::Zoned;
/// use logforth_thread_file::delegate::ManualClock;
///
/// let clock = ManualClock::new(Zoned::from_str("2024-08-10T23:59:00[UTC]").unwrap());
/// clock.advance(Span::new().minutes(2));
/// assert_eq!(clock.now().day(), 11);
/// ```
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Zoned>>,
}

impl ManualClock {
    /// Create a clock stopped at `now`.
    pub fn new(now: Zoned) -> ManualClock {
        ManualClock {
            now: Arc::new(Mutex::new(now)),
        }
    }

    /// Read the current time.
    pub fn now(&self) -> Zoned {
        self.now.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Reset the current time.
    pub fn set_now(&self, now: Zoned) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    /// Move the current time forward by `span`.
    ///
    /// # Panics
    ///
    /// Panic if the result overflows the supported datetime range.
    pub fn advance(&self, span: Span) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now = &*now + span;
    }
}

impl From<ManualClock> for Clock {
    fn from(clock: ManualClock) -> Self {
        Clock::ManualClock(clock)
    }
}
