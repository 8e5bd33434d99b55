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

use std::path::Path;
use std::path::PathBuf;

use itd_shared::types::LogicalCoreId;

use super::utils;
use crate::MSRAccess;
use crate::MSRResult;
use crate::DEFAULT_MSR_DEV_DIR;

/// Register accessor backed by the Linux `msr` driver,
/// each logical core is exposed as `<dev_dir>/<core_id>/msr`.
#[derive(Clone, Debug)]
pub struct MSRDevice {
    dev_dir: PathBuf,
}

impl MSRDevice {
    pub fn new(dev_dir: impl Into<PathBuf>) -> Self {
        Self {
            dev_dir: dev_dir.into(),
        }
    }

    pub fn dev_dir(&self) -> &Path {
        &self.dev_dir
    }

    fn msr_path(&self, core_id: LogicalCoreId) -> PathBuf {
        self.dev_dir.join(core_id.to_string()).join("msr")
    }
}

impl Default for MSRDevice {
    fn default() -> Self {
        Self::new(DEFAULT_MSR_DEV_DIR)
    }
}

impl MSRAccess for MSRDevice {
    fn read(&self, register_id: u32, core_id: LogicalCoreId) -> MSRResult<u64> {
        utils::read_msr(&self.msr_path(core_id), register_id, core_id)
    }

    fn write(&self, register_id: u32, value: u64, core_id: LogicalCoreId) -> MSRResult<()> {
        utils::write_msr(&self.msr_path(core_id), register_id, value, core_id)
    }
}
