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

//! This module is a stub implementation to allow the code to compile on non-Linux or
//! non-x86_64 targets, every register access fails per core.

use std::path::Path;
use std::path::PathBuf;

use itd_shared::types::LogicalCoreId;

use crate::MSRAccess;
use crate::MSRError;
use crate::MSRResult;
use crate::DEFAULT_MSR_DEV_DIR;

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
}

impl Default for MSRDevice {
    fn default() -> Self {
        Self::new(DEFAULT_MSR_DEV_DIR)
    }
}

impl MSRAccess for MSRDevice {
    fn read(&self, register_id: u32, core_id: LogicalCoreId) -> MSRResult<u64> {
        Err(MSRError::unsupported(register_id, core_id))
    }

    fn write(&self, register_id: u32, _value: u64, core_id: LogicalCoreId) -> MSRResult<()> {
        Err(MSRError::unsupported(register_id, core_id))
    }
}
