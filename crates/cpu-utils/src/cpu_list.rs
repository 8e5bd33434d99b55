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

use crate::errors::CPUTopologyError;
use crate::CTResult;
use crate::LogicalCoreId;

/// Far above any kernel `NR_CPUS`, bounds the memory a corrupt list can claim.
pub const MAX_CORE_ID: u32 = (1 << 20) - 1;

/// Parses the kernel cpu list format, e.g. `0-3,8,10-11`.
/// The result is sorted and free of duplicates, an empty list yields no cores.
pub fn parse_cpu_list(list: &str) -> CTResult<Vec<LogicalCoreId>> {
    let trimmed = list.trim();
    if trimmed.is_empty() {
        return Ok(vec![]);
    }

    let mut core_ids = Vec::new();
    for chunk in trimmed.split(',') {
        let chunk = chunk.trim();
        let (start, end) = match chunk.split_once('-') {
            Some((start, end)) => (parse_core_id(list, start)?, parse_core_id(list, end)?),
            None => {
                let core_id = parse_core_id(list, chunk)?;
                (core_id, core_id)
            }
        };

        if end < start {
            return Err(CPUTopologyError::malformed_cpu_list(
                list.trim(),
                format!("range {chunk} is descending"),
            ));
        }
        core_ids.extend((start..=end).map(LogicalCoreId::new));
    }

    core_ids.sort();
    core_ids.dedup();
    Ok(core_ids)
}

fn parse_core_id(list: &str, value: &str) -> CTResult<u32> {
    let core_id = value.trim().parse::<u32>().map_err(|error| {
        CPUTopologyError::malformed_cpu_list(list.trim(), format!("'{value}': {error}"))
    })?;

    if core_id > MAX_CORE_ID {
        return Err(CPUTopologyError::malformed_cpu_list(
            list.trim(),
            format!("core id {core_id} exceeds {MAX_CORE_ID}"),
        ));
    }
    Ok(core_id)
}
