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

use serde::Deserialize;
use serde::Serialize;

use cpu_utils::SysfsCPUList;

use super::defaults::default_cpu_source;
use super::defaults::default_log_level;
use super::defaults::default_msr_dev_dir;
use super::defaults::default_sysfs_cpu_dir;
use super::defaults::default_verify_writes;
use crate::*;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UnresolvedItdConfig {
    #[serde(default)]
    pub logs: UnresolvedLogs,
    #[serde(default)]
    pub msr: UnresolvedMSR,
    #[serde(default)]
    pub cpus: UnresolvedCPUs,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UnresolvedLogs {
    #[serde(default = "default_log_level", alias = "log_level")]
    pub log_level: LogLevel,
}

impl Default for UnresolvedLogs {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UnresolvedMSR {
    #[serde(default = "default_msr_dev_dir", alias = "dev_dir")]
    pub dev_dir: PathBuf,

    #[serde(default = "default_verify_writes", alias = "verify_writes")]
    pub verify_writes: bool,
}

impl Default for UnresolvedMSR {
    fn default() -> Self {
        Self {
            dev_dir: default_msr_dev_dir(),
            verify_writes: default_verify_writes(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UnresolvedCPUs {
    #[serde(default = "default_cpu_source")]
    pub source: UnresolvedCPUSource,

    #[serde(default = "default_sysfs_cpu_dir", alias = "sysfs_dir")]
    pub sysfs_dir: PathBuf,
}

impl Default for UnresolvedCPUs {
    fn default() -> Self {
        Self {
            source: default_cpu_source(),
            sysfs_dir: default_sysfs_cpu_dir(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedCPUSource {
    Possible,
    Present,
    Online,
    Hwloc,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl UnresolvedItdConfig {
    pub fn resolve(self) -> ItdConfig {
        ItdConfig {
            logs: self.logs.resolve(),
            msr: self.msr.resolve(),
            cpus: self.cpus.resolve(),
        }
    }
}

impl UnresolvedLogs {
    pub fn resolve(self) -> Logs {
        Logs {
            log_level: self.log_level.to_tracing_filter(),
        }
    }
}

impl UnresolvedMSR {
    pub fn resolve(self) -> MSRSettings {
        MSRSettings {
            dev_dir: self.dev_dir,
            verify_writes: self.verify_writes,
        }
    }
}

impl UnresolvedCPUs {
    pub fn resolve(self) -> CPUs {
        CPUs {
            source: self.source.resolve(),
            sysfs_dir: self.sysfs_dir,
        }
    }
}

impl UnresolvedCPUSource {
    pub fn resolve(self) -> CPUSource {
        match self {
            Self::Possible => CPUSource::Sysfs(SysfsCPUList::Possible),
            Self::Present => CPUSource::Sysfs(SysfsCPUList::Present),
            Self::Online => CPUSource::Sysfs(SysfsCPUList::Online),
            Self::Hwloc => CPUSource::Hwloc,
        }
    }
}

impl LogLevel {
    pub fn to_tracing_filter(&self) -> tracing_subscriber::filter::LevelFilter {
        use tracing_subscriber::filter::LevelFilter;

        match self {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}
