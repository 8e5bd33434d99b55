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

mod args;
mod shutdown;

use clap::Parser;
use eyre::WrapErr as _;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

use cpu_utils::CPUEnumerator;
use cpu_utils::SysfsCPUEnumerator;
use itd_config::load_config;
use itd_config::CPUSource;
use itd_config::ItdConfig;
use itd_controller::ItdController;
use itd_controller::ToggleReport;
use itd_msr::MSRAccess;
use itd_msr::MSRDevice;

use crate::args::Args;
use crate::args::Command;
use crate::shutdown::ShutdownSignals;

type Controller = ItdController<Box<dyn CPUEnumerator>, MSRDevice>;

fn main() -> eyre::Result<()> {
    let args = Args::parse();
    let mut config = load_config(args.config_path.as_deref())?;
    args.apply_overrides(&mut config);

    let filter = EnvFilter::builder()
        .with_env_var("RUST_LOG")
        .with_default_directive(Directive::from(config.logs.log_level))
        .from_env_lossy();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .wrap_err("setting global tracing subscriber failed")?;
    tracing_log::LogTracer::init()?;

    tracing::debug!("running {:?} with config {config:?}", args.command);
    let controller = build_controller(&config)?;

    match args.command {
        Command::Enable => {
            let mut controller = controller;
            let report = controller.activate().wrap_err("activation failed")?;
            print_report(&report);
        }
        Command::Disable => {
            let mut controller = controller;
            let report = controller.deactivate().wrap_err("deactivation failed")?;
            print_report(&report);
        }
        Command::Status { json } => {
            let status = controller.status().wrap_err("reading status failed")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                println!("{status}");
            }
        }
        Command::Hold => hold(controller)?,
    }

    Ok(())
}

/// Keeps feedback enabled until a shutdown signal arrives, then restores it.
fn hold<E: CPUEnumerator, M: MSRAccess>(controller: ItdController<E, M>) -> eyre::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("failed to build tokio runtime")?;

    let mut signals = {
        let _runtime_context = runtime.enter();
        ShutdownSignals::install()?
    };

    let report = hold_until_signal(controller, &runtime, &mut signals)?;
    print_report(&report);

    Ok(())
}

/// Activates, blocks on `signals` and returns the deactivation report.
/// The guard deactivates on every way out of here, including panics.
fn hold_until_signal<E: CPUEnumerator, M: MSRAccess>(
    controller: ItdController<E, M>,
    runtime: &tokio::runtime::Runtime,
    signals: &mut ShutdownSignals,
) -> eyre::Result<ToggleReport> {
    let (guard, report) = controller
        .activate_guarded()
        .wrap_err("activation failed")?;
    print_report(&report);

    tracing::info!("feedback is held enabled, waiting for SIGINT, SIGTERM, SIGHUP or SIGQUIT");
    let signal_name = runtime.block_on(signals.recv());
    tracing::info!("{signal_name} received, disabling feedback");

    let (_, report) = guard.release();
    report.wrap_err("deactivation failed")
}

fn build_controller(config: &ItdConfig) -> eyre::Result<Controller> {
    let enumerator = build_enumerator(config)?;
    let msr = MSRDevice::new(config.msr.dev_dir.clone());

    Ok(ItdController::new(enumerator, msr).with_verification(config.msr.verify_writes))
}

fn build_enumerator(config: &ItdConfig) -> eyre::Result<Box<dyn CPUEnumerator>> {
    match config.cpus.source {
        CPUSource::Sysfs(list) => Ok(Box::new(SysfsCPUEnumerator::new(
            config.cpus.sysfs_dir.clone(),
            list,
        ))),
        #[cfg(feature = "hwloc")]
        CPUSource::Hwloc => Ok(Box::new(cpu_utils::HwlocCPUEnumerator::new())),
        #[cfg(not(feature = "hwloc"))]
        CPUSource::Hwloc => {
            eyre::bail!("hwloc cpu source requires itdctl built with the hwloc feature")
        }
    }
}

fn print_report(report: &ToggleReport) {
    println!("{report}");
    for (core_id, error) in report.failures() {
        println!("  CPU #{core_id}: {error}");
    }
}
