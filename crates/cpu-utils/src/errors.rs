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

use std::path::PathBuf;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum CPUTopologyError {
    #[cfg(feature = "hwloc")]
    #[error(transparent)]
    RawHwlocError(#[from] hwlocality::errors::RawHwlocError),

    #[error("reading cpu list from '{}' failed: {io_error}", .path.display())]
    CPUListRead {
        path: PathBuf,
        io_error: std::io::Error,
    },

    #[error("cpu list '{list}' is malformed: {reason}")]
    MalformedCPUList { list: String, reason: String },

    #[error("logical core id {core_id} is too big to be represented as u32")]
    LogicalCoreIdTooBig { core_id: usize },

    #[error("no logical cores found")]
    LogicalCoresNotFound,
}

impl CPUTopologyError {
    pub fn cpu_list_read(path: PathBuf, io_error: std::io::Error) -> Self {
        Self::CPUListRead { path, io_error }
    }

    pub fn malformed_cpu_list(list: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedCPUList {
            list: list.into(),
            reason: reason.into(),
        }
    }

    pub fn logical_core_too_big(core_id: usize) -> Self {
        Self::LogicalCoreIdTooBig { core_id }
    }
}
