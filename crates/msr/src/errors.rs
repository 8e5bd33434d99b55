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

use nix::errno::Errno;
use thiserror::Error as ThisError;

use itd_shared::types::LogicalCoreId;

#[derive(ThisError, Debug)]
pub enum MSRError {
    #[error("opening MSR file '{}' for read there is an error: {io_error:?}", .path.display())]
    OpenForRead {
        core_id: LogicalCoreId,
        path: PathBuf,
        io_error: std::io::Error,
    },

    #[error("opening MSR file '{}' for write there is an error: {io_error:?}", .path.display())]
    OpenForWrite {
        core_id: LogicalCoreId,
        path: PathBuf,
        io_error: std::io::Error,
    },

    #[error(
        "reading from register_id {register_id:#X} at logical core {core_id} there is an error: {errno:?}"
    )]
    ReadWNoErr {
        register_id: u32,
        core_id: LogicalCoreId,
        errno: Errno,
    },

    #[error(
        "writing value {value:#X} for register_id {register_id:#X} at logical core {core_id} there is an error: {errno:?}"
    )]
    WriteWNoErr {
        value: u64,
        register_id: u32,
        core_id: LogicalCoreId,
        errno: Errno,
    },

    #[error(
        "reading register_id {register_id:#X} at logical core {core_id} returned {bytes_count} bytes instead of 8"
    )]
    ShortRead {
        register_id: u32,
        core_id: LogicalCoreId,
        bytes_count: usize,
    },

    #[error(
        "writing register_id {register_id:#X} at logical core {core_id} accepted {bytes_count} bytes instead of 8"
    )]
    ShortWrite {
        register_id: u32,
        core_id: LogicalCoreId,
        bytes_count: usize,
    },

    #[error(
        "register_id {register_id:#X} at logical core {core_id} reads back {actual:#X} after writing {expected:#X}"
    )]
    VerificationMismatch {
        register_id: u32,
        core_id: LogicalCoreId,
        expected: u64,
        actual: u64,
    },

    #[error("MSR access to register_id {register_id:#X} at logical core {core_id} isn't supported on this platform")]
    Unsupported {
        register_id: u32,
        core_id: LogicalCoreId,
    },
}

impl MSRError {
    pub fn open_for_read(core_id: LogicalCoreId, path: PathBuf, io_error: std::io::Error) -> Self {
        Self::OpenForRead {
            core_id,
            path,
            io_error,
        }
    }

    pub fn open_for_write(core_id: LogicalCoreId, path: PathBuf, io_error: std::io::Error) -> Self {
        Self::OpenForWrite {
            core_id,
            path,
            io_error,
        }
    }

    pub fn read_w_no_err(register_id: u32, core_id: LogicalCoreId, errno: Errno) -> Self {
        Self::ReadWNoErr {
            register_id,
            core_id,
            errno,
        }
    }

    pub fn write_w_no_err(
        value: u64,
        register_id: u32,
        core_id: LogicalCoreId,
        errno: Errno,
    ) -> Self {
        Self::WriteWNoErr {
            value,
            register_id,
            core_id,
            errno,
        }
    }

    pub fn short_read(register_id: u32, core_id: LogicalCoreId, bytes_count: usize) -> Self {
        Self::ShortRead {
            register_id,
            core_id,
            bytes_count,
        }
    }

    pub fn short_write(register_id: u32, core_id: LogicalCoreId, bytes_count: usize) -> Self {
        Self::ShortWrite {
            register_id,
            core_id,
            bytes_count,
        }
    }

    pub fn verification_mismatch(
        register_id: u32,
        core_id: LogicalCoreId,
        expected: u64,
        actual: u64,
    ) -> Self {
        Self::VerificationMismatch {
            register_id,
            core_id,
            expected,
            actual,
        }
    }

    pub fn unsupported(register_id: u32, core_id: LogicalCoreId) -> Self {
        Self::Unsupported {
            register_id,
            core_id,
        }
    }

    /// Logical core the failed access was addressed to.
    pub fn core_id(&self) -> LogicalCoreId {
        match self {
            Self::OpenForRead { core_id, .. }
            | Self::OpenForWrite { core_id, .. }
            | Self::ReadWNoErr { core_id, .. }
            | Self::WriteWNoErr { core_id, .. }
            | Self::ShortRead { core_id, .. }
            | Self::ShortWrite { core_id, .. }
            | Self::VerificationMismatch { core_id, .. }
            | Self::Unsupported { core_id, .. } => *core_id,
        }
    }
}
