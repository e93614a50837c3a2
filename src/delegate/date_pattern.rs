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

use jiff::Span;
use jiff::Zoned;
use jiff::fmt::strtime;

use crate::Error;
use crate::ErrorKind;

/// Defines a fixed period for rolling of a log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Period {
    /// Roll at the top of every minute.
    Minutely,
    /// Roll at the top of every hour.
    Hourly,
    /// Roll at midnight and midday.
    HalfDaily,
    /// Roll at midnight.
    Daily,
    /// Roll at midnight starting a Monday.
    Weekly,
    /// Roll at midnight starting the first day of a month.
    Monthly,
}

impl Period {
    /// Compute the first period boundary strictly after `now`.
    pub fn next_boundary(&self, now: &Zoned) -> Result<Zoned, Error> {
        let next = match *self {
            Period::Minutely => now
                .with()
                .second(0)
                .subsec_nanosecond(0)
                .build()
                .and_then(|t| t.checked_add(Span::new().minutes(1))),
            Period::Hourly => now
                .with()
                .minute(0)
                .second(0)
                .subsec_nanosecond(0)
                .build()
                .and_then(|t| t.checked_add(Span::new().hours(1))),
            Period::HalfDaily => now
                .start_of_day()
                .and_then(|t| t.checked_add(Span::new().hours(12)))
                .and_then(|noon| {
                    if now < &noon {
                        Ok(noon)
                    } else {
                        now.tomorrow().and_then(|t| t.start_of_day())
                    }
                }),
            Period::Daily => now.tomorrow().and_then(|t| t.start_of_day()),
            Period::Weekly => {
                let days = 7 - i64::from(now.weekday().to_monday_zero_offset());
                now.start_of_day()
                    .and_then(|t| t.checked_add(Span::new().days(days)))
                    .and_then(|t| t.start_of_day())
            }
            Period::Monthly => now
                .first_of_month()
                .and_then(|t| t.start_of_day())
                .and_then(|t| t.checked_add(Span::new().months(1))),
        };

        next.map_err(|err| {
            Error::new(ErrorKind::Unexpected, "failed to compute next rollover time")
                .with_context("period", format!("{self:?}"))
                .with_source(err)
        })
    }
}

/// A date pattern in the `SimpleDateFormat` syntax used to name rolled-over files.
///
/// Letters are pattern fields and text in single quotes is copied verbatim; `''` is a literal
/// quote. The finest field in the pattern decides the rollover [`Period`].
///
/// | Letter | Field | Examples |
/// |---|---|---|
/// | `y` | year | `yyyy` → 2024, `yy` → 24 |
/// | `M` | month | `MM` → 08, `MMM` → Aug, `MMMM` → August |
/// | `w` | ISO week of year | `ww` → 32 |
/// | `D` | day of year | `DDD` → 223 |
/// | `d` | day of month | `dd` → 09 |
/// | `E` | day of week | `EEE` → Sat, `EEEE` → Saturday |
/// | `a` | AM/PM marker | `a` → PM |
/// | `H` | hour (0-23) | `HH` → 17 |
/// | `h` | hour (1-12) | `hh` → 05 |
/// | `m` | minute | `mm` → 07 |
/// | `s` | second | `ss` → 52 |
/// | `Z` | timezone offset | `Z` → +0800 |
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
///
/// use jiff::Zoned;
/// use logforth_thread_file::delegate::DatePattern;
/// use logforth_thread_file::delegate::Period;
///
/// let pattern = DatePattern::from_str("'.'yyyy-MM-dd").unwrap();
/// assert_eq!(pattern.period(), Some(Period::Daily));
///
/// let now = Zoned::from_str("2024-08-10T17:12:52[UTC]").unwrap();
/// assert_eq!(pattern.format(&now).unwrap(), ".2024-08-10");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatePattern {
    pattern: String,
    strftime: String,
    period: Option<Period>,
}

impl DatePattern {
    /// The pattern used when none is configured.
    pub const DEFAULT: &'static str = "'.'yyyy-MM-dd";

    /// The pattern as it was written.
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// The rollover period of this pattern, or `None` if it names no field finer than a year.
    pub fn period(&self) -> Option<Period> {
        self.period
    }

    /// Format `time` with this pattern.
    pub fn format(&self, time: &Zoned) -> Result<String, Error> {
        strtime::format(&self.strftime, time).map_err(|err| {
            Error::new(ErrorKind::Unexpected, "failed to format date pattern")
                .with_context("pattern", &self.pattern)
                .with_source(err)
        })
    }
}

impl Default for DatePattern {
    fn default() -> Self {
        // SAFETY: the default pattern is known to be valid.
        DatePattern::from_str(DatePattern::DEFAULT).unwrap()
    }
}

impl fmt::Display for DatePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

impl FromStr for DatePattern {
    type Err = Error;

    fn from_str(pattern: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| {
            Error::configuration(format!("invalid date pattern: {reason}"))
                .with_context("pattern", pattern)
        };

        let mut strftime = String::new();
        let mut period: Option<Period> = None;
        let mut finer = |p: Period| {
            period = Some(period.map_or(p, |current| current.min(p)));
        };

        let chars = pattern.chars().collect::<Vec<_>>();
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];

            if c == '\'' {
                if chars.get(i + 1) == Some(&'\'') {
                    strftime.push('\'');
                    i += 2;
                    continue;
                }
                i += 1;
                loop {
                    match chars.get(i) {
                        None => return Err(invalid("unterminated quote")),
                        Some('\'') if chars.get(i + 1) == Some(&'\'') => {
                            strftime.push('\'');
                            i += 2;
                        }
                        Some('\'') => {
                            i += 1;
                            break;
                        }
                        Some(&literal) => {
                            push_literal(&mut strftime, literal);
                            i += 1;
                        }
                    }
                }
                continue;
            }

            if !c.is_ascii_alphabetic() {
                push_literal(&mut strftime, c);
                i += 1;
                continue;
            }

            let count = chars[i..].iter().take_while(|&&x| x == c).count();
            i += count;

            let spec = match (c, count) {
                ('y', 2) => "%y",
                ('y', _) => "%Y",
                ('M', 1) => "%-m",
                ('M', 2) => "%m",
                ('M', 3) => "%b",
                ('M', _) => "%B",
                ('w', 1) => "%-V",
                ('w', _) => "%V",
                ('D', _) => "%j",
                ('d', 1) => "%-d",
                ('d', _) => "%d",
                ('E', 1..=3) => "%a",
                ('E', _) => "%A",
                ('a', _) => "%p",
                ('H', 1) => "%-H",
                ('H', _) => "%H",
                ('h', 1) => "%-I",
                ('h', _) => "%I",
                ('m', 1) => "%-M",
                ('m', _) => "%M",
                ('s', 1) => "%-S",
                ('s', _) => "%S",
                ('Z', _) => "%z",
                _ => return Err(invalid(&format!("unsupported pattern letter '{c}'"))),
            };
            strftime.push_str(spec);

            match c {
                'm' | 's' => finer(Period::Minutely),
                'H' | 'h' => finer(Period::Hourly),
                'a' => finer(Period::HalfDaily),
                'd' | 'D' | 'E' => finer(Period::Daily),
                'w' => finer(Period::Weekly),
                'M' => finer(Period::Monthly),
                _ => {}
            }
        }

        Ok(DatePattern {
            pattern: pattern.to_string(),
            strftime,
            period,
        })
    }
}

fn push_literal(strftime: &mut String, c: char) {
    if c == '%' {
        strftime.push_str("%%");
    } else {
        strftime.push(c);
    }
}
