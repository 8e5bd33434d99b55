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

use std::collections::HashMap;
use std::collections::HashSet;

use nix::errno::Errno;
use parking_lot::Mutex;

use itd_msr::MSRAccess;
use itd_msr::MSRError;
use itd_msr::MSRResult;
use itd_shared::types::LogicalCoreId;

/// A register write observed by [`MockMSR`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WriteRecord {
    pub core_id: LogicalCoreId,
    pub register_id: u32,
    pub value: u64,
}

#[derive(Debug, Default)]
struct MockState {
    registers: HashMap<(LogicalCoreId, u32), u64>,
    unreachable: HashSet<LogicalCoreId>,
    failing_writes: HashSet<LogicalCoreId>,
    lost_writes: HashSet<LogicalCoreId>,
    writes: Vec<WriteRecord>,
}

/// In-memory register file with per-core fault injection.
///
/// Registers never set read as zero. An unreachable core fails both reads
/// and writes like an offline `/dev/cpu/<id>/msr` would.
#[derive(Debug, Default)]
pub struct MockMSR {
    state: Mutex<MockState>,
}

impl MockMSR {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock with `register_id` preset to the given value on every listed core.
    pub fn with_register(
        register_id: u32,
        values: impl IntoIterator<Item = (LogicalCoreId, u64)>,
    ) -> Self {
        let mock = Self::new();
        for (core_id, value) in values {
            mock.set(register_id, core_id, value);
        }
        mock
    }

    pub fn set(&self, register_id: u32, core_id: LogicalCoreId, value: u64) {
        self.state
            .lock()
            .registers
            .insert((core_id, register_id), value);
    }

    pub fn get(&self, register_id: u32, core_id: LogicalCoreId) -> u64 {
        self.state
            .lock()
            .registers
            .get(&(core_id, register_id))
            .copied()
            .unwrap_or_default()
    }

    pub fn set_unreachable(&self, core_id: LogicalCoreId) {
        self.state.lock().unreachable.insert(core_id);
    }

    pub fn set_reachable(&self, core_id: LogicalCoreId) {
        self.state.lock().unreachable.remove(&core_id);
    }

    /// Reads keep working, every write on the core fails with `EIO`.
    pub fn fail_writes_on(&self, core_id: LogicalCoreId) {
        self.state.lock().failing_writes.insert(core_id);
    }

    /// Writes on the core report success but never reach the register.
    pub fn lose_writes_on(&self, core_id: LogicalCoreId) {
        self.state.lock().lost_writes.insert(core_id);
    }

    pub fn writes(&self) -> Vec<WriteRecord> {
        self.state.lock().writes.clone()
    }

    pub fn writes_count(&self) -> usize {
        self.state.lock().writes.len()
    }

    pub fn clear_writes(&self) {
        self.state.lock().writes.clear();
    }
}

impl MSRAccess for MockMSR {
    fn read(&self, register_id: u32, core_id: LogicalCoreId) -> MSRResult<u64> {
        let state = self.state.lock();
        if state.unreachable.contains(&core_id) {
            return Err(MSRError::open_for_read(
                core_id,
                offline_path(core_id),
                std::io::ErrorKind::NotFound.into(),
            ));
        }

        Ok(state
            .registers
            .get(&(core_id, register_id))
            .copied()
            .unwrap_or_default())
    }

    fn write(&self, register_id: u32, value: u64, core_id: LogicalCoreId) -> MSRResult<()> {
        let mut state = self.state.lock();
        if state.unreachable.contains(&core_id) {
            return Err(MSRError::open_for_write(
                core_id,
                offline_path(core_id),
                std::io::ErrorKind::NotFound.into(),
            ));
        }
        if state.failing_writes.contains(&core_id) {
            return Err(MSRError::write_w_no_err(
                value,
                register_id,
                core_id,
                Errno::EIO,
            ));
        }

        state.writes.push(WriteRecord {
            core_id,
            register_id,
            value,
        });
        if !state.lost_writes.contains(&core_id) {
            state.registers.insert((core_id, register_id), value);
        }
        Ok(())
    }
}

fn offline_path(core_id: LogicalCoreId) -> std::path::PathBuf {
    format!("/dev/cpu/{core_id}/msr").into()
}
