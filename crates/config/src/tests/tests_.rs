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
use tracing_subscriber::filter::LevelFilter;

use crate::config_loader::load_config;
use crate::CPUSource;
use crate::ItdConfig;
use crate::Logs;
use crate::MSRSettings;
use crate::CPUs;

fn fixture_path(name: &str) -> String {
    let mut manifest_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_path.push("src/tests");
    manifest_path.push(name);
    manifest_path.into_os_string().into_string().unwrap()
}

#[test]
fn parse_basic_config() {
    let actual_config = load_config(Some(fixture_path("default.toml").as_str())).unwrap();

    let expected_config = ItdConfig {
        logs: Logs {
            log_level: LevelFilter::WARN,
        },
        msr: MSRSettings {
            dev_dir: "/tmp/itd/cpu".into(),
            verify_writes: false,
        },
        cpus: CPUs {
            source: CPUSource::Sysfs(SysfsCPUList::Online),
            sysfs_dir: "/tmp/itd/sys".into(),
        },
    };

    assert_eq!(actual_config, expected_config);
}

#[test]
fn missing_sections_take_defaults() {
    let actual_config = load_config(Some(fixture_path("partial.toml").as_str())).unwrap();

    assert_eq!(actual_config.cpus.source, CPUSource::Hwloc);
    assert_eq!(actual_config.logs, Logs::default());
    assert_eq!(actual_config.msr, MSRSettings::default());
    assert!(actual_config.msr.verify_writes);
    assert_eq!(actual_config.msr.dev_dir, PathBuf::from("/dev/cpu"));
}

#[test]
fn default_config_enumerates_possible_cpus() {
    let config = ItdConfig::default();

    assert_eq!(
        config.cpus.source,
        CPUSource::Sysfs(SysfsCPUList::Possible)
    );
    assert_eq!(config.logs.log_level, LevelFilter::ERROR);
}

#[test]
fn unknown_cpu_source_is_rejected() {
    let result = load_config(Some(fixture_path("invalid.toml").as_str()));

    assert!(result.is_err());
}

#[test]
fn missing_file_is_rejected() {
    let result = load_config(Some(fixture_path("does-not-exist.toml").as_str()));

    assert!(result.is_err());
}
