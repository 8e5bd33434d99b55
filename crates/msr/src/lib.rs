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

//! MSR access for the hardware feedback interface registers.
//! On Linux x86_64 registers are accessed through the `msr` driver,
//! for everything else every access reports [`MSRError::Unsupported`].

#[cfg(all(target_arch = "x86_64", target_os = "linux"))]
#[path = "linux_x86_64/mod.rs"]
mod msr_impl;
#[cfg(not(all(target_arch = "x86_64", target_os = "linux")))]
#[path = "other/mod.rs"]
mod msr_impl;

mod errors;
pub mod registers;
mod toggle;

use itd_shared::types::LogicalCoreId;

pub use errors::MSRError;
pub use msr_impl::MSRDevice;
pub use toggle::toggle_feedback;
pub use toggle::ToggleOutcome;

pub type MSRResult<T> = Result<T, MSRError>;

/// Where the Linux `msr` driver exposes per-core device files.
pub const DEFAULT_MSR_DEV_DIR: &str = "/dev/cpu";

/// Reads and writes a model specific register on a named logical core.
pub trait MSRAccess {
    fn read(&self, register_id: u32, core_id: LogicalCoreId) -> MSRResult<u64>;

    fn write(&self, register_id: u32, value: u64, core_id: LogicalCoreId) -> MSRResult<()>;
}

impl<T: MSRAccess + ?Sized> MSRAccess for &T {
    fn read(&self, register_id: u32, core_id: LogicalCoreId) -> MSRResult<u64> {
        (**self).read(register_id, core_id)
    }

    fn write(&self, register_id: u32, value: u64, core_id: LogicalCoreId) -> MSRResult<()> {
        (**self).write(register_id, value, core_id)
    }
}

impl<T: MSRAccess + ?Sized> MSRAccess for Box<T> {
    fn read(&self, register_id: u32, core_id: LogicalCoreId) -> MSRResult<u64> {
        (**self).read(register_id, core_id)
    }

    fn write(&self, register_id: u32, value: u64, core_id: LogicalCoreId) -> MSRResult<()> {
        (**self).write(register_id, value, core_id)
    }
}

impl<T: MSRAccess + ?Sized> MSRAccess for std::sync::Arc<T> {
    fn read(&self, register_id: u32, core_id: LogicalCoreId) -> MSRResult<u64> {
        (**self).read(register_id, core_id)
    }

    fn write(&self, register_id: u32, value: u64, core_id: LogicalCoreId) -> MSRResult<()> {
        (**self).write(register_id, value, core_id)
    }
}
