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

use log::kv::Key;
use log::kv::Source;
use log::kv::Value;
use log::kv::VisitSource;

/// A helper struct to display a record's key-value pairs as ` key=value` pieces.
pub struct KvDisplay<'kvs> {
    kv: &'kvs dyn Source,
}

impl<'kvs> KvDisplay<'kvs> {
    /// Wrap the key-value source of a record.
    pub fn new(kv: &'kvs dyn Source) -> Self {
        Self { kv }
    }
}

impl fmt::Display for KvDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut visitor = KvWriter { writer: f };
        self.kv.visit(&mut visitor).ok();
        Ok(())
    }
}

struct KvWriter<'a, 'b> {
    writer: &'b mut fmt::Formatter<'a>,
}

impl<'kvs> VisitSource<'kvs> for KvWriter<'_, '_> {
    fn visit_pair(&mut self, key: Key<'kvs>, value: Value<'kvs>) -> Result<(), log::kv::Error> {
        write!(self.writer, " {key}={value}")?;
        Ok(())
    }
}
