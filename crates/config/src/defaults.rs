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

use crate::unresolved_config::LogLevel;
use crate::unresolved_config::UnresolvedCPUSource;

pub(crate) fn default_log_level() -> LogLevel {
    LogLevel::Error
}

pub(crate) fn default_msr_dev_dir() -> PathBuf {
    PathBuf::from("/dev/cpu")
}

pub(crate) fn default_verify_writes() -> bool {
    true
}

pub(crate) fn default_cpu_source() -> UnresolvedCPUSource {
    UnresolvedCPUSource::Possible
}

pub(crate) fn default_sysfs_cpu_dir() -> PathBuf {
    PathBuf::from("/sys/devices/system/cpu")
}
