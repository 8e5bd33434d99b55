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

use itd_shared::types::LogicalCoreId;

pub fn generate_core_ids(count: u32) -> Vec<LogicalCoreId> {
    (0..count).map(LogicalCoreId::new).collect()
}

/// Pairs consecutive core ids starting from zero with the given register values.
pub fn generate_register_values(values: &[u64]) -> Vec<(LogicalCoreId, u64)> {
    values
        .iter()
        .enumerate()
        .map(|(core_id, value)| (LogicalCoreId::new(core_id as u32), *value))
        .collect()
}
