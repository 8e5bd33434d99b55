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

use std::fs::File;
use std::io;
use std::path::Path;

use itd_shared::types::LogicalCoreId;

use crate::MSRError;
use crate::MSRResult;

const MSR_VALUE_SIZE: usize = std::mem::size_of::<u64>();

enum MSRFileOpMode {
    MSRRead,
    MSRWrite,
}

pub(crate) fn read_msr(path: &Path, register_id: u32, core_id: LogicalCoreId) -> MSRResult<u64> {
    use nix::sys::uio::pread;

    let file = open_msr(path, MSRFileOpMode::MSRRead)
        .map_err(|error| MSRError::open_for_read(core_id, path.to_path_buf(), error))?;

    let mut value = [0u8; MSR_VALUE_SIZE];
    let bytes_count = pread(&file, &mut value, register_id as i64)
        .map_err(|errno| MSRError::read_w_no_err(register_id, core_id, errno))?;
    if bytes_count != MSR_VALUE_SIZE {
        return Err(MSRError::short_read(register_id, core_id, bytes_count));
    }
    let result = u64::from_le_bytes(value);

    tracing::debug!("Read MSR register_id {register_id:#X} value {result:#X} at logical CPU {core_id}");

    Ok(result)
}

pub(crate) fn write_msr(
    path: &Path,
    register_id: u32,
    value: u64,
    core_id: LogicalCoreId,
) -> MSRResult<()> {
    use nix::sys::uio::pwrite;

    let file = open_msr(path, MSRFileOpMode::MSRWrite)
        .map_err(|error| MSRError::open_for_write(core_id, path.to_path_buf(), error))?;

    let value_as_bytes = value.to_le_bytes();
    let bytes_count = pwrite(&file, &value_as_bytes, register_id as i64)
        .map_err(|errno| MSRError::write_w_no_err(value, register_id, core_id, errno))?;
    if bytes_count != MSR_VALUE_SIZE {
        return Err(MSRError::short_write(register_id, core_id, bytes_count));
    }

    tracing::debug!("Write MSR register_id {register_id:#X} value {value:#X} at logical CPU {core_id}");

    Ok(())
}

fn open_msr(path: &Path, mode: MSRFileOpMode) -> io::Result<File> {
    use std::fs::OpenOptions;

    match mode {
        MSRFileOpMode::MSRRead => OpenOptions::new().read(true).open(path),
        MSRFileOpMode::MSRWrite => OpenOptions::new().write(true).open(path),
    }
}
