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

use jiff::Timestamp;
use jiff::TimestampDisplayWithOffset;
use jiff::tz::TimeZone;
use log::Record;
use log::kv::Key;
use log::kv::Value;
use log::kv::VisitSource;
use serde::Serialize;
use serde_json::Map;

use crate::Error;
use crate::ErrorKind;
use crate::layout::Layout;

/// A JSON layout for formatting log records.
///
/// Output format:
///
/// ```json
/// {"timestamp":"2024-08-11T22:44:57.172051+08:00","level":"ERROR","target":"worker","file":"src/main.rs","line":51,"message":"Hello error!"}
/// {"timestamp":"2024-08-11T22:44:57.172187+08:00","level":"INFO","target":"worker","file":"src/main.rs","line":53,"message":"Hello info!","kvs":{"job":7}}
/// ```
///
/// # Examples
///
/// ```
/// use logforth_thread_file::layout::JsonLayout;
///
/// let json_layout = JsonLayout::default();
/// ```
#[derive(Default, Debug, Clone)]
pub struct JsonLayout {
    tz: Option<TimeZone>,
}

impl JsonLayout {
    /// Set the timezone for timestamps.
    pub fn timezone(mut self, tz: TimeZone) -> Self {
        self.tz = Some(tz);
        self
    }
}

struct KvCollector<'a> {
    kvs: &'a mut Map<String, serde_json::Value>,
}

impl<'kvs> VisitSource<'kvs> for KvCollector<'_> {
    fn visit_pair(&mut self, key: Key<'kvs>, value: Value<'kvs>) -> Result<(), log::kv::Error> {
        let key = key.to_string();
        let value = if let Some(v) = value.to_bool() {
            serde_json::Value::from(v)
        } else if let Some(v) = value.to_i64() {
            serde_json::Value::from(v)
        } else if let Some(v) = value.to_u64() {
            serde_json::Value::from(v)
        } else if let Some(v) = value.to_f64() {
            serde_json::Value::from(v)
        } else {
            serde_json::Value::from(value.to_string())
        };
        self.kvs.insert(key, value);
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
struct RecordLine<'a> {
    #[serde(serialize_with = "serialize_timestamp")]
    timestamp: TimestampDisplayWithOffset,
    level: &'a str,
    target: &'a str,
    file: &'a str,
    line: u32,
    message: String,
    #[serde(skip_serializing_if = "Map::is_empty")]
    kvs: Map<String, serde_json::Value>,
}

fn serialize_timestamp<S>(
    timestamp: &TimestampDisplayWithOffset,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_str(&format_args!("{timestamp:.6}"))
}

impl Layout for JsonLayout {
    fn format(&self, record: &Record) -> Result<Vec<u8>, Error> {
        let ts = Timestamp::now();
        let tz = self.tz.clone().unwrap_or_else(TimeZone::system);
        let offset = tz.to_offset(ts);
        let timestamp = ts.display_with_offset(offset);

        let mut kvs = Map::new();
        let mut visitor = KvCollector { kvs: &mut kvs };
        record.key_values().visit(&mut visitor).map_err(|err| {
            Error::new(ErrorKind::Unexpected, "failed to collect key-values")
                .with_context("cause", err)
        })?;

        let record_line = RecordLine {
            timestamp,
            level: record.level().as_str(),
            target: record.target(),
            file: record.file().unwrap_or_default(),
            line: record.line().unwrap_or_default(),
            message: record.args().to_string(),
            kvs,
        };

        serde_json::to_vec(&record_line).map_err(|err| {
            Error::new(ErrorKind::Unexpected, "failed to serialize record").with_source(err)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_json_line() {
        let kvs = [("job", 7)];
        let record = Record::builder()
            .args(format_args!("hello"))
            .level(log::Level::Info)
            .target("worker")
            .key_values(&kvs)
            .build();

        let bytes = JsonLayout::default()
            .timezone(TimeZone::UTC)
            .format(&record)
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["level"], "INFO");
        assert_eq!(value["target"], "worker");
        assert_eq!(value["message"], "hello");
        assert_eq!(value["kvs"]["job"], 7);
    }
}
