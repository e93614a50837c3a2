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
use std::str::FromStr;

use crate::Error;

const KB: u64 = 1024;
const MB: u64 = 1024 * KB;
const GB: u64 = 1024 * MB;

/// A file size parsed from a size expression such as `"512"`, `"1KB"`, `"10MB"` or `"2GB"`.
///
/// Units are powers of 1024 and case-insensitive. Whitespace between the number and the unit is
/// allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileSize(u64);

impl FileSize {
    /// The size used when none is configured: 10MB.
    pub const DEFAULT: FileSize = FileSize(10 * MB);

    /// Create a size of `bytes` bytes.
    pub const fn from_bytes(bytes: u64) -> FileSize {
        FileSize(bytes)
    }

    /// The size in bytes.
    pub const fn bytes(&self) -> u64 {
        self.0
    }
}

impl Default for FileSize {
    fn default() -> Self {
        FileSize::DEFAULT
    }
}

impl fmt::Display for FileSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.0;
        if n != 0 && n % GB == 0 {
            write!(f, "{}GB", n / GB)
        } else if n != 0 && n % MB == 0 {
            write!(f, "{}MB", n / MB)
        } else if n != 0 && n % KB == 0 {
            write!(f, "{}KB", n / KB)
        } else {
            write!(f, "{n}")
        }
    }
}

impl FromStr for FileSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let expr = s.trim();
        let upper = expr.to_ascii_uppercase();
        let (number, multiplier) = if let Some(n) = upper.strip_suffix("KB") {
            (n, KB)
        } else if let Some(n) = upper.strip_suffix("MB") {
            (n, MB)
        } else if let Some(n) = upper.strip_suffix("GB") {
            (n, GB)
        } else {
            (upper.as_str(), 1)
        };

        let invalid = || Error::configuration("invalid file size").with_context("size", s);
        let number = number
            .trim()
            .parse::<u64>()
            .map_err(|err| invalid().with_source(err))?;
        let bytes = number.checked_mul(multiplier).ok_or_else(invalid)?;
        if bytes == 0 {
            return Err(Error::configuration("file size must be positive").with_context("size", s));
        }
        Ok(FileSize(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_parse_size_expressions() {
        assert_eq!("512".parse::<FileSize>().unwrap().bytes(), 512);
        assert_eq!("1KB".parse::<FileSize>().unwrap().bytes(), 1024);
        assert_eq!("1kb".parse::<FileSize>().unwrap().bytes(), 1024);
        assert_eq!("10MB".parse::<FileSize>().unwrap(), FileSize::DEFAULT);
        assert_eq!(" 2 GB ".parse::<FileSize>().unwrap().bytes(), 2 * GB);
    }

    #[test]
    fn test_reject_malformed_sizes() {
        for expr in ["", "MB", "ten", "-1KB", "1TB", "0", "99999999999999999999GB"] {
            let err = expr.parse::<FileSize>().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Configuration, "{expr}");
        }
    }

    #[test]
    fn test_display_uses_largest_unit() {
        assert_eq!(FileSize::from_bytes(1024).to_string(), "1KB");
        assert_eq!(FileSize::DEFAULT.to_string(), "10MB");
        assert_eq!(FileSize::from_bytes(1500).to_string(), "1500");
    }
}
