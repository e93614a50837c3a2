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

use jiff::Zoned;
use jiff::tz::TimeZone;
use log::Record;

use crate::Error;
use crate::layout::KvDisplay;
use crate::layout::Layout;

/// A layout that formats log record as plain text.
///
/// Output format:
///
/// ```text
/// 2024-08-11T22:44:57.172105+08:00 ERROR worker: src/main.rs:51 Hello error!
/// 2024-08-11T22:44:57.172219+08:00  WARN worker: src/main.rs:52 Hello warn!
/// 2024-08-11T22:44:57.172276+08:00  INFO worker: src/main.rs:53 Hello info! job=7
/// ```
///
/// # Examples
///
/// ```
/// use jiff::tz::TimeZone;
/// use logforth_thread_file::layout::PlainTextLayout;
///
/// let layout = PlainTextLayout::default().timezone(TimeZone::UTC);
/// ```
#[derive(Default, Debug, Clone)]
pub struct PlainTextLayout {
    tz: Option<TimeZone>,
}

impl PlainTextLayout {
    /// Set the timezone for timestamps. Default to the system timezone.
    pub fn timezone(mut self, tz: TimeZone) -> Self {
        self.tz = Some(tz);
        self
    }
}

impl Layout for PlainTextLayout {
    fn format(&self, record: &Record) -> Result<Vec<u8>, Error> {
        let time = match self.tz.clone() {
            Some(tz) => Zoned::now().with_time_zone(tz),
            None => Zoned::now(),
        }
        .strftime("%Y-%m-%dT%H:%M:%S.%6f%:z");
        let level = record.level();
        let target = record.target();
        let file = record.file().unwrap_or_default();
        let line = record.line().unwrap_or_default();
        let message = record.args();
        let kvs = KvDisplay::new(record.key_values());

        let text = format!("{time} {level:>5} {target}: {file}:{line} {message}{kvs}");
        Ok(text.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use log::Level;

    use super::*;

    #[test]
    fn test_format_includes_level_target_and_kvs() {
        let kvs = [("job", 7)];
        let record = Record::builder()
            .args(format_args!("hello"))
            .level(Level::Warn)
            .target("worker")
            .file(Some("src/main.rs"))
            .line(Some(12))
            .key_values(&kvs)
            .build();

        let bytes = PlainTextLayout::default()
            .timezone(TimeZone::UTC)
            .format(&record)
            .unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.ends_with("  WARN worker: src/main.rs:12 hello job=7"), "{text}");
        assert!(text.contains("+00:00"), "{text}");
    }
}
