/*
 * Copyright 2024 Fluence Labs Limited
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use nonempty::NonEmpty;
use parking_lot::Mutex;

use cpu_utils::CPUEnumerator;
use cpu_utils::CPUTopologyError;
use cpu_utils::CTResult;
use itd_shared::types::LogicalCoreId;

/// Deterministic enumerator, the core set can be swapped between calls
/// to emulate hotplug.
#[derive(Debug, Default)]
pub struct FixedCPUEnumerator {
    core_ids: Mutex<Vec<LogicalCoreId>>,
    calls_count: AtomicUsize,
}

impl FixedCPUEnumerator {
    pub fn new(core_ids: impl IntoIterator<Item = LogicalCoreId>) -> Self {
        Self {
            core_ids: Mutex::new(core_ids.into_iter().collect()),
            calls_count: AtomicUsize::new(0),
        }
    }

    pub fn set_cores(&self, core_ids: impl IntoIterator<Item = LogicalCoreId>) {
        *self.core_ids.lock() = core_ids.into_iter().collect();
    }

    pub fn calls_count(&self) -> usize {
        self.calls_count.load(Ordering::SeqCst)
    }
}

impl CPUEnumerator for FixedCPUEnumerator {
    fn logical_cores(&self) -> CTResult<NonEmpty<LogicalCoreId>> {
        self.calls_count.fetch_add(1, Ordering::SeqCst);
        NonEmpty::from_vec(self.core_ids.lock().clone())
            .ok_or(CPUTopologyError::LogicalCoresNotFound)
    }
}
