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
use std::str::FromStr;
use std::sync::Arc;
use std::thread;

use jiff::Span;
use jiff::Zoned;
use log::Record;
use logforth_thread_file::Append;
use logforth_thread_file::append::Caller;
use logforth_thread_file::append::ThreadFileBuilder;
use logforth_thread_file::delegate::DelegateKind;
use logforth_thread_file::delegate::ManualClock;
use logforth_thread_file::layout::CustomLayout;
use rand::Rng;
use rand::distr::Alphanumeric;
use tempfile::TempDir;

fn message_layout() -> CustomLayout {
    CustomLayout::new(|record: &Record| Ok(record.args().to_string().into_bytes()))
}

fn generate_random_string() -> String {
    let mut rng = rand::rng();
    let len = rng.random_range(50..=100);
    std::iter::repeat(())
        .map(|()| rng.sample(Alphanumeric))
        .map(char::from)
        .take(len)
        .collect()
}

#[test]
fn test_size_rollover_per_thread() {
    let temp_dir = TempDir::new().unwrap();
    let appender = Arc::new(
        ThreadFileBuilder::new(temp_dir.path().join("app"))
            .layout(message_layout())
            .delegate_kind(DelegateKind::RollingFile)
            .max_file_size("1KB")
            .max_backup_index(2)
            .build()
            .unwrap(),
    );

    let handles = ["a", "b"]
        .into_iter()
        .map(|name| {
            let appender = appender.clone();
            thread::Builder::new()
                .name(name.to_string())
                .spawn(move || {
                    let mut written = 0;
                    while written < 10 * 1024 {
                        let line = generate_random_string();
                        written += line.len() + 1;
                        appender
                            .append(&Record::builder().args(format_args!("{line}")).build())
                            .unwrap();
                    }
                })
                .unwrap()
        })
        .collect::<Vec<_>>();
    for handle in handles {
        handle.join().unwrap();
    }
    appender.close_all().unwrap();

    let mut files = fs::read_dir(temp_dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect::<Vec<_>>();
    files.sort();
    assert_eq!(
        files,
        vec![
            "app-a.log",
            "app-a.log.1",
            "app-a.log.2",
            "app-b.log",
            "app-b.log.1",
            "app-b.log.2",
        ]
    );

    for name in files {
        let len = fs::metadata(temp_dir.path().join(&name)).unwrap().len();
        if name.ends_with(".log") {
            assert!(len < 1024, "{name} holds {len} bytes");
        } else {
            assert!(len >= 1024, "{name} holds {len} bytes");
        }
    }
}

#[test]
fn test_date_rollover_at_midnight() {
    let temp_dir = TempDir::new().unwrap();
    let clock = ManualClock::new(Zoned::from_str("2024-08-10T23:59:30[UTC]").unwrap());
    let appender = ThreadFileBuilder::new(temp_dir.path().join("app"))
        .layout(message_layout())
        .delegate_kind(DelegateKind::DailyRollingFile)
        .date_pattern("'.'yyyy-MM-dd")
        .clock(clock.clone())
        .build()
        .unwrap();

    let caller = Caller::new("main");
    appender
        .append_as(&caller, &Record::builder().args(format_args!("late")).build())
        .unwrap();
    clock.advance(Span::new().minutes(1));
    appender
        .append_as(&caller, &Record::builder().args(format_args!("early")).build())
        .unwrap();
    appender.close_all().unwrap();

    let current = temp_dir.path().join("app-main.log");
    let archive = temp_dir.path().join("app-main.log.2024-08-10");
    assert_eq!(fs::read_to_string(current).unwrap(), "early\n");
    assert_eq!(fs::read_to_string(archive).unwrap(), "late\n");
}

#[test]
fn test_date_rollover_is_per_thread() {
    let temp_dir = TempDir::new().unwrap();
    let clock = ManualClock::new(Zoned::from_str("2024-08-10T10:59:00[UTC]").unwrap());
    let appender = ThreadFileBuilder::new(temp_dir.path().join("app"))
        .layout(message_layout())
        .delegate_kind(DelegateKind::DailyRollingFile)
        .date_pattern("'.'yyyy-MM-dd-HH")
        .clock(clock.clone())
        .build()
        .unwrap();

    let a = Caller::new("a");
    let b = Caller::new("b");
    appender
        .append_as(&a, &Record::builder().args(format_args!("a1")).build())
        .unwrap();
    clock.advance(Span::new().minutes(2));

    // b starts after the boundary, so it has nothing to archive
    appender
        .append_as(&b, &Record::builder().args(format_args!("b1")).build())
        .unwrap();
    appender
        .append_as(&a, &Record::builder().args(format_args!("a2")).build())
        .unwrap();
    appender.close_all().unwrap();

    let read = |name: &str| fs::read_to_string(temp_dir.path().join(name)).unwrap();
    assert_eq!(read("app-a.log.2024-08-10-10"), "a1\n");
    assert_eq!(read("app-a.log"), "a2\n");
    assert_eq!(read("app-b.log"), "b1\n");
    assert!(!temp_dir.path().join("app-b.log.2024-08-10-10").exists());
}

#[test]
fn test_date_pattern_without_separator() {
    let temp_dir = TempDir::new().unwrap();
    let clock = ManualClock::new(Zoned::from_str("2024-12-31T23:00:00[UTC]").unwrap());
    let appender = ThreadFileBuilder::new(temp_dir.path().join("app"))
        .layout(message_layout())
        .delegate_kind(DelegateKind::DailyRollingFile)
        .date_pattern("yyyy-MM-dd")
        .clock(clock.clone())
        .build()
        .unwrap();

    let caller = Caller::new("main");
    appender
        .append_as(&caller, &Record::builder().args(format_args!("old year")).build())
        .unwrap();
    clock.advance(Span::new().hours(2));
    appender
        .append_as(&caller, &Record::builder().args(format_args!("new year")).build())
        .unwrap();
    drop(appender);

    let archive = temp_dir.path().join("app-main.log2024-12-31");
    assert_eq!(fs::read_to_string(archive).unwrap(), "old year\n");
    assert_eq!(
        fs::read_to_string(temp_dir.path().join("app-main.log")).unwrap(),
        "new year\n"
    );
}
