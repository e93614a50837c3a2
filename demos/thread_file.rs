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

use logforth_thread_file::append::ThreadFileBuilder;
use logforth_thread_file::delegate::DelegateKind;
use logforth_thread_file::filter::EnvFilter;

fn main() {
    let appender = ThreadFileBuilder::new("logs/demo")
        .delegate_kind(DelegateKind::RollingFile)
        .max_file_size("1MB")
        .max_backup_index(3)
        .build()
        .unwrap();
    let appender = Arc::new(appender);

    logforth_thread_file::builder()
        .dispatch(|d| {
            d.filter(EnvFilter::from_default_env_or("info"))
                .append(appender.clone())
        })
        .apply();

    let handles = (0..4)
        .map(|i| {
            std::thread::Builder::new()
                .name(format!("worker-{i}"))
                .spawn(move || {
                    log::error!("Hello error!");
                    log::warn!("Hello warn!");
                    log::info!(job = i; "Hello info!");
                    log::debug!("Hello debug!");
                })
                .unwrap()
        })
        .collect::<Vec<_>>();
    for handle in handles {
        handle.join().unwrap();
    }

    log::info!("written to logs/demo-main.log");
    appender.close_all().unwrap();
}
