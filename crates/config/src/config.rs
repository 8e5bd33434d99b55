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

use cpu_utils::SysfsCPUList;

use crate::defaults::default_log_level;
use crate::defaults::default_msr_dev_dir;
use crate::defaults::default_sysfs_cpu_dir;
use crate::defaults::default_verify_writes;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ItdConfig {
    pub logs: Logs,
    pub msr: MSRSettings,
    pub cpus: CPUs,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Logs {
    pub log_level: tracing_subscriber::filter::LevelFilter,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MSRSettings {
    /// Directory holding `<core_id>/msr` device nodes.
    pub dev_dir: PathBuf,
    /// Read the register back after every write.
    pub verify_writes: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CPUs {
    pub source: CPUSource,
    pub sysfs_dir: PathBuf,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CPUSource {
    Sysfs(SysfsCPUList),
    /// Complete cpuset reported by hwloc, requires the `hwloc` feature.
    Hwloc,
}

impl Default for Logs {
    fn default() -> Self {
        Self {
            log_level: default_log_level().to_tracing_filter(),
        }
    }
}

impl Default for MSRSettings {
    fn default() -> Self {
        Self {
            dev_dir: default_msr_dev_dir(),
            verify_writes: default_verify_writes(),
        }
    }
}

impl Default for CPUs {
    fn default() -> Self {
        Self {
            source: CPUSource::default(),
            sysfs_dir: default_sysfs_cpu_dir(),
        }
    }
}

impl Default for CPUSource {
    fn default() -> Self {
        Self::Sysfs(SysfsCPUList::default())
    }
}
