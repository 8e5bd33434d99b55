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

#![warn(rust_2018_idioms)]
#![warn(rust_2021_compatibility)]
#![deny(
    dead_code,
    nonstandard_style,
    unused_imports,
    unused_mut,
    unused_variables,
    unused_unsafe,
    unreachable_patterns
)]

mod cpu_list;
#[cfg(feature = "hwloc")]
mod cpu_topology;
mod errors;
mod sysfs;

use nonempty::NonEmpty;

pub use itd_shared::types::LogicalCoreId;

pub use cpu_list::parse_cpu_list;
pub use cpu_list::MAX_CORE_ID;
#[cfg(feature = "hwloc")]
pub use cpu_topology::HwlocCPUEnumerator;
pub use errors::CPUTopologyError;
pub use sysfs::SysfsCPUEnumerator;
pub use sysfs::SysfsCPUList;

pub type CTResult<T> = Result<T, CPUTopologyError>;

/// Source of the logical cores a caller may control.
///
/// Implementations must enumerate afresh on every call, callers rely on it
/// to pick up cores that appeared or vanished since the previous call.
pub trait CPUEnumerator {
    fn logical_cores(&self) -> CTResult<NonEmpty<LogicalCoreId>>;
}

impl<T: CPUEnumerator + ?Sized> CPUEnumerator for &T {
    fn logical_cores(&self) -> CTResult<NonEmpty<LogicalCoreId>> {
        (**self).logical_cores()
    }
}

impl<T: CPUEnumerator + ?Sized> CPUEnumerator for Box<T> {
    fn logical_cores(&self) -> CTResult<NonEmpty<LogicalCoreId>> {
        (**self).logical_cores()
    }
}
