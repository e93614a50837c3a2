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

//! A [`log`] backend whose [`ThreadFile`](append::ThreadFile) appender writes the records of each
//! thread to a file of its own.
//!
//! # Overview
//!
//! The first record a thread logs creates a delegate file sink named
//! `{file_base}-{thread_name}.log`; the thread keeps writing to it until the delegate is closed
//! or the thread exits.
//! The delegate is a plain file, a size-based rolling file or a date-based rolling file, chosen by
//! [`DelegateKind`](delegate::DelegateKind).
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use log::LevelFilter;
//! use logforth_thread_file::append::ThreadFileBuilder;
//! use logforth_thread_file::delegate::DelegateKind;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let appender = ThreadFileBuilder::new(dir.path().join("server"))
//!     .delegate_kind(DelegateKind::DailyRollingFile)
//!     .date_pattern("'.'yyyy-MM-dd")
//!     .build()
//!     .unwrap();
//! let appender = Arc::new(appender);
//!
//! logforth_thread_file::builder()
//!     .dispatch(|d| d.filter(LevelFilter::Info).append(appender.clone()))
//!     .apply();
//!
//! std::thread::Builder::new()
//!     .name("worker-1".to_string())
//!     .spawn(|| log::info!("written to server-worker-1.log"))
//!     .unwrap()
//!     .join()
//!     .unwrap();
//!
//! appender.close_all().unwrap();
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod append;
pub mod config;
pub mod delegate;
pub mod filter;
pub mod layout;
pub mod trap;

mod error;
mod logger;

pub use self::append::Append;
pub use self::error::Error;
pub use self::error::ErrorKind;
pub use self::filter::Filter;
pub use self::layout::Layout;
pub use self::logger::DispatchBuilder;
pub use self::logger::Logger;
pub use self::logger::LoggerBuilder;
pub use self::logger::builder;
pub use self::trap::Trap;
