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

use std::cell::RefCell;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::Weak;

use super::Caller;
use super::Delegate;
use super::Delegates;
use crate::Error;
use crate::trap::Trap;

thread_local! {
    static EXIT_GUARDS: RefCell<Vec<ExitGuard>> = const { RefCell::new(Vec::new()) };
}

/// Closes a delegate when the thread that created it exits.
struct ExitGuard {
    delegates: Weak<Delegates>,
    caller: Caller,
    entry: Weak<Mutex<Delegate>>,
    trap: Arc<dyn Trap>,
}

impl ExitGuard {
    fn is_live(&self) -> bool {
        self.delegates.strong_count() > 0 && self.entry.strong_count() > 0
    }
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        let (Some(delegates), Some(entry)) = (self.delegates.upgrade(), self.entry.upgrade())
        else {
            return;
        };

        // the caller may have closed and reopened its delegate since
        let removed = delegates.remove_if(&self.caller, |_, current| Arc::ptr_eq(current, &entry));
        if removed.is_none() {
            return;
        }

        let mut delegate = entry.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(err) = delegate.close() {
            let err = Error::io("failed to close delegate on thread exit")
                .with_context("caller", self.caller.name())
                .with_source(err);
            self.trap.trap(&err);
        }
    }
}

/// Close `entry` once the current thread exits, unless it is removed earlier.
///
/// A thread that is already tearing down its thread locals keeps the delegate until
/// [`close_all`](super::ThreadFile::close_all).
pub(super) fn close_on_thread_exit(
    delegates: &Arc<Delegates>,
    caller: &Caller,
    entry: &Arc<Mutex<Delegate>>,
    trap: &Arc<dyn Trap>,
) {
    let _ = EXIT_GUARDS.try_with(|guards| {
        let mut guards = guards.borrow_mut();
        guards.retain(ExitGuard::is_live);
        guards.push(ExitGuard {
            delegates: Arc::downgrade(delegates),
            caller: caller.clone(),
            entry: Arc::downgrade(entry),
            trap: trap.clone(),
        });
    });
}
