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

//! Runs without the test harness: the global logger can be set only once per process.

use std::fs;
use std::sync::Arc;
use std::thread;

use log::LevelFilter;
use log::Log;
use log::Record;
use logforth_thread_file::append::ThreadFileBuilder;
use logforth_thread_file::filter::EnvFilter;
use logforth_thread_file::layout::CustomLayout;

struct Thing<'a>(&'a str);

impl std::fmt::Display for Thing<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        log::info!("formatting wrapping ({})", self.0);
        f.write_str(self.0)
    }
}

fn main() {
    let temp_dir = tempfile::tempdir().unwrap();
    let appender = ThreadFileBuilder::new(temp_dir.path().join("service"))
        .layout(CustomLayout::new(|record: &Record| {
            Ok(format!("[{}] {}", record.level(), record.args()).into_bytes())
        }))
        .build()
        .unwrap();
    let appender = Arc::new(appender);

    logforth_thread_file::builder()
        .dispatch(|d| {
            d.filter(EnvFilter::from("info,global_logger::noisy=off"))
                .append(appender.clone())
        })
        .max_level(LevelFilter::Trace)
        .apply();

    let handles = (0..4)
        .map(|i| {
            thread::Builder::new()
                .name(format!("worker-{i}"))
                .spawn(move || {
                    log::info!("hello from worker {i}");
                    log::debug!("filtered out");
                    log::warn!(target: "global_logger::noisy", "silenced");
                    // the layout logs on the same thread while formatting this record
                    log::info!("wrapped {}", Thing("value"));
                })
                .unwrap()
        })
        .collect::<Vec<_>>();
    for handle in handles {
        handle.join().unwrap();
    }

    appender.close_all().unwrap();
    log::logger().flush();

    for i in 0..4 {
        let path = temp_dir.path().join(format!("service-worker-{i}.log"));
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            format!(
                "[INFO] hello from worker {i}\n\
                 [INFO] formatting wrapping (value)\n\
                 [INFO] wrapped value\n"
            ),
            "{}",
            path.display()
        );
    }

    let files = fs::read_dir(temp_dir.path()).unwrap().count();
    assert_eq!(files, 4);
}
