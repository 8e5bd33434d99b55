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

use std::path::Path;
use std::path::PathBuf;

use nonempty::NonEmpty;
use serde::Deserialize;
use serde::Serialize;

use crate::cpu_list::parse_cpu_list;
use crate::errors::CPUTopologyError;
use crate::CPUEnumerator;
use crate::CTResult;
use crate::LogicalCoreId;

const DEFAULT_SYSFS_CPU_DIR: &str = "/sys/devices/system/cpu";

/// Which of the kernel cpu masks to enumerate.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SysfsCPUList {
    /// Every core that could ever be brought online, the widest set.
    #[default]
    Possible,
    Present,
    Online,
}

impl SysfsCPUList {
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Possible => "possible",
            Self::Present => "present",
            Self::Online => "online",
        }
    }
}

/// Enumerates logical cores from one of the cpu lists under `/sys/devices/system/cpu`.
#[derive(Clone, Debug)]
pub struct SysfsCPUEnumerator {
    sysfs_dir: PathBuf,
    list: SysfsCPUList,
}

impl SysfsCPUEnumerator {
    pub fn new(sysfs_dir: impl Into<PathBuf>, list: SysfsCPUList) -> Self {
        Self {
            sysfs_dir: sysfs_dir.into(),
            list,
        }
    }

    pub fn from_list(list: SysfsCPUList) -> Self {
        Self::new(DEFAULT_SYSFS_CPU_DIR, list)
    }

    pub fn sysfs_dir(&self) -> &Path {
        &self.sysfs_dir
    }

    pub fn list(&self) -> SysfsCPUList {
        self.list
    }
}

impl Default for SysfsCPUEnumerator {
    fn default() -> Self {
        Self::from_list(SysfsCPUList::default())
    }
}

impl CPUEnumerator for SysfsCPUEnumerator {
    fn logical_cores(&self) -> CTResult<NonEmpty<LogicalCoreId>> {
        let path = self.sysfs_dir.join(self.list.file_name());
        let content = std::fs::read_to_string(&path)
            .map_err(|error| CPUTopologyError::cpu_list_read(path.clone(), error))?;

        let core_ids = parse_cpu_list(&content)?;
        tracing::debug!(
            "Enumerated {} logical cores from {}",
            core_ids.len(),
            path.display()
        );

        NonEmpty::from_vec(core_ids).ok_or(CPUTopologyError::LogicalCoresNotFound)
    }
}

#[cfg(test)]
mod tests {
    use maplit::hashmap;

    use super::SysfsCPUEnumerator;
    use super::SysfsCPUList;
    use crate::CPUEnumerator;
    use crate::CPUTopologyError;
    use crate::LogicalCoreId;

    fn fake_sysfs() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let lists = hashmap! {
            "possible" => "0-7\n",
            "present" => "0-5\n",
            "online" => "0-1,4\n",
        };
        for (name, content) in lists {
            std::fs::write(dir.path().join(name), content).unwrap();
        }
        dir
    }

    #[test]
    fn each_list_is_read_from_its_file() {
        let dir = fake_sysfs();

        let possible = SysfsCPUEnumerator::new(dir.path(), SysfsCPUList::Possible)
            .logical_cores()
            .unwrap();
        let present = SysfsCPUEnumerator::new(dir.path(), SysfsCPUList::Present)
            .logical_cores()
            .unwrap();
        let online = SysfsCPUEnumerator::new(dir.path(), SysfsCPUList::Online)
            .logical_cores()
            .unwrap();

        assert_eq!(possible.len(), 8);
        assert_eq!(present.len(), 6);
        assert_eq!(
            online.into_iter().collect::<Vec<_>>(),
            vec![
                LogicalCoreId::new(0),
                LogicalCoreId::new(1),
                LogicalCoreId::new(4)
            ]
        );
    }

    #[test]
    fn list_is_reread_on_every_call() {
        let dir = fake_sysfs();
        let enumerator = SysfsCPUEnumerator::new(dir.path(), SysfsCPUList::Online);
        assert_eq!(enumerator.logical_cores().unwrap().len(), 3);

        std::fs::write(dir.path().join("online"), "0-3\n").unwrap();

        assert_eq!(enumerator.logical_cores().unwrap().len(), 4);
    }

    #[test]
    fn missing_file_is_an_enumeration_error() {
        let dir = tempfile::tempdir().unwrap();
        let enumerator = SysfsCPUEnumerator::new(dir.path(), SysfsCPUList::Possible);

        let error = enumerator.logical_cores().unwrap_err();
        assert!(matches!(error, CPUTopologyError::CPUListRead { .. }));
    }

    #[test]
    fn empty_list_is_an_enumeration_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("possible"), "\n").unwrap();
        let enumerator = SysfsCPUEnumerator::new(dir.path(), SysfsCPUList::Possible);

        let error = enumerator.logical_cores().unwrap_err();
        assert!(matches!(error, CPUTopologyError::LogicalCoresNotFound));
    }
}
