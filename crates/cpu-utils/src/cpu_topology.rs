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

use nonempty::NonEmpty;

use crate::errors::CPUTopologyError;
use crate::CPUEnumerator;
use crate::CTResult;
use crate::LogicalCoreId;

/// Enumerates logical cores from the hwloc complete cpuset, which also
/// covers cores that are currently offline.
#[derive(Clone, Debug, Default)]
pub struct HwlocCPUEnumerator;

impl HwlocCPUEnumerator {
    pub fn new() -> Self {
        Self
    }
}

impl CPUEnumerator for HwlocCPUEnumerator {
    fn logical_cores(&self) -> CTResult<NonEmpty<LogicalCoreId>> {
        let topology = hwlocality::Topology::new()?;
        let complete_cpuset = topology.complete_cpuset();

        let logical_core_ids = complete_cpuset
            .into_iter()
            .map(usize::from)
            .map(|value| {
                u32::try_from(value)
                    .map(LogicalCoreId::new)
                    .map_err(|_| CPUTopologyError::logical_core_too_big(value))
            })
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!("Enumerated {} logical cores from hwloc", logical_core_ids.len());

        NonEmpty::from_vec(logical_core_ids).ok_or(CPUTopologyError::LogicalCoresNotFound)
    }
}
