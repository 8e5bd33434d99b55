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

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

use itd_config::ItdConfig;
use itd_config::UnresolvedCPUSource;

#[derive(Parser, Debug)]
#[command(version, about = "Thread director hardware feedback controller")]
pub(crate) struct Args {
    /// Path to a TOML config file
    #[arg(short, long)]
    pub(crate) config_path: Option<String>,

    /// Where to take the list of logical cores from
    #[arg(long, value_enum)]
    pub(crate) cpu_source: Option<CPUSourceArg>,

    /// Don't read the register back after writing it
    #[arg(long)]
    pub(crate) no_verify: bool,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Sets the feedback bit on every logical core
    Enable,
    /// Clears the feedback bit on every logical core
    Disable,
    /// Shows the feedback state of every logical core
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Enables feedback until SIGINT, SIGTERM, SIGHUP or SIGQUIT, then disables it
    Hold,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum CPUSourceArg {
    Possible,
    Present,
    Online,
    Hwloc,
}

impl From<CPUSourceArg> for UnresolvedCPUSource {
    fn from(value: CPUSourceArg) -> Self {
        match value {
            CPUSourceArg::Possible => UnresolvedCPUSource::Possible,
            CPUSourceArg::Present => UnresolvedCPUSource::Present,
            CPUSourceArg::Online => UnresolvedCPUSource::Online,
            CPUSourceArg::Hwloc => UnresolvedCPUSource::Hwloc,
        }
    }
}

impl Args {
    /// Command line flags win over the config file and environment.
    pub(crate) fn apply_overrides(&self, config: &mut ItdConfig) {
        if let Some(source) = self.cpu_source {
            config.cpus.source = UnresolvedCPUSource::from(source).resolve();
        }
        if self.no_verify {
            config.msr.verify_writes = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use cpu_utils::SysfsCPUList;
    use itd_config::CPUSource;
    use itd_config::ItdConfig;

    use super::Args;
    use super::Command;

    #[test]
    fn flags_override_config() {
        let args = Args::parse_from(["itdctl", "--cpu-source", "online", "--no-verify", "enable"]);
        let mut config = ItdConfig::default();

        args.apply_overrides(&mut config);

        assert_eq!(config.cpus.source, CPUSource::Sysfs(SysfsCPUList::Online));
        assert!(!config.msr.verify_writes);
        assert!(matches!(args.command, Command::Enable));
    }

    #[test]
    fn config_is_kept_without_flags() {
        let args = Args::parse_from(["itdctl", "status", "--json"]);
        let mut config = ItdConfig::default();

        args.apply_overrides(&mut config);

        assert_eq!(config, ItdConfig::default());
        assert!(matches!(args.command, Command::Status { json: true }));
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Args::try_parse_from(["itdctl"]).is_err());
    }
}
