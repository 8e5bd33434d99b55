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

#[cfg(test)]
mod tests;

use cpu_utils::CPUEnumerator;
use itd_msr::toggle_feedback;
use itd_msr::MSRAccess;

use crate::errors::ItdError;
use crate::guard::ActivationGuard;
use crate::report::CoreReport;
use crate::report::ToggleReport;
use crate::status::CoreStatus;
use crate::status::StatusReport;

pub type ItdResult<T> = Result<T, ItdError>;

/// Drives the thread director feedback bit on every logical core the
/// enumerator reports.
///
/// Both passes are best effort: a core whose register can't be accessed is
/// recorded in the report and the pass moves on to the next core. Only a
/// failed enumeration aborts a pass, since there is nothing to iterate over.
///
/// Cores that go offline in the middle of a pass fail their access and are
/// reported as failed, their bit is left in whatever state it had. Cores that
/// come online between passes are picked up because every pass enumerates
/// afresh.
///
/// Passes take `&mut self`, so one controller never runs two passes at once.
/// Serializing against other processes touching the same register is up to
/// the caller.
#[derive(Debug)]
pub struct ItdController<E, M> {
    enumerator: E,
    msr: M,
    verify_writes: bool,
}

impl<E: CPUEnumerator, M: MSRAccess> ItdController<E, M> {
    pub fn new(enumerator: E, msr: M) -> Self {
        Self {
            enumerator,
            msr,
            verify_writes: true,
        }
    }

    /// Controls whether every write is followed by a read back of the register.
    pub fn with_verification(mut self, verify_writes: bool) -> Self {
        self.verify_writes = verify_writes;
        self
    }

    pub fn verify_writes(&self) -> bool {
        self.verify_writes
    }

    pub fn msr(&self) -> &M {
        &self.msr
    }

    pub fn enumerator(&self) -> &E {
        &self.enumerator
    }

    /// Sets the feedback bit on every enumerated core.
    pub fn activate(&mut self) -> ItdResult<ToggleReport> {
        self.apply(true)
    }

    /// Clears the feedback bit on every enumerated core. Safe to call at any
    /// point, including when activation never ran or only partially succeeded.
    pub fn deactivate(&mut self) -> ItdResult<ToggleReport> {
        self.apply(false)
    }

    /// Activates and returns a guard that deactivates when dropped.
    ///
    /// If enumeration fails the error is returned and deactivation still runs
    /// before this function returns.
    pub fn activate_guarded(self) -> ItdResult<(ActivationGuard<E, M>, ToggleReport)> {
        let mut guard = ActivationGuard::new(self);
        let report = guard.controller_mut().activate()?;
        Ok((guard, report))
    }

    /// Reads the current feedback state of every enumerated core, writes nothing.
    pub fn status(&self) -> ItdResult<StatusReport> {
        let core_ids = self.enumerator.logical_cores()?;
        let cores = core_ids
            .into_iter()
            .map(|core_id| CoreStatus::read(&self.msr, core_id))
            .collect::<Vec<_>>();

        Ok(StatusReport::new(cores))
    }

    fn apply(&mut self, enable: bool) -> ItdResult<ToggleReport> {
        let core_ids = self.enumerator.logical_cores()?;
        tracing::debug!(
            "Driving feedback bit to {} on {} logical cores",
            enable as u8,
            core_ids.len()
        );

        let cores = core_ids
            .into_iter()
            .map(|core_id| {
                let outcome = toggle_feedback(&self.msr, core_id, enable, self.verify_writes);
                if let Err(error) = &outcome {
                    tracing::warn!("Feedback bit toggle at logical CPU {core_id} failed: {error}");
                }
                CoreReport { core_id, outcome }
            })
            .collect::<Vec<_>>();

        let report = ToggleReport::new(enable, cores);
        tracing::info!("{report}");

        Ok(report)
    }
}
