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

use itd_shared::types::LogicalCoreId;

use crate::registers::with_enable_bit;
use crate::registers::ThreadConfig;
use crate::registers::IA32_HW_FEEDBACK_THREAD_CONFIG;
use crate::MSRAccess;
use crate::MSRError;
use crate::MSRResult;

/// Result of a successful toggle on one logical core.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The enable bit already had the desired value, nothing was written.
    Unchanged { value: u64 },
    /// The register was rewritten with only the enable bit changed.
    Written { old_value: u64, new_value: u64 },
}

impl ToggleOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written { .. })
    }

    /// Register value after the toggle.
    pub fn value(&self) -> u64 {
        match self {
            Self::Unchanged { value } => *value,
            Self::Written { new_value, .. } => *new_value,
        }
    }
}

/// Drives the feedback enable bit of `core_id` to `enable`.
///
/// The register is read first and written only if the bit differs, so
/// calling it repeatedly with the same value writes at most once. With
/// `verify` set a written value is read back and any difference in the
/// enable bit is reported as [`MSRError::VerificationMismatch`].
pub fn toggle_feedback(
    msr: &impl MSRAccess,
    core_id: LogicalCoreId,
    enable: bool,
    verify: bool,
) -> MSRResult<ToggleOutcome> {
    let register_id = IA32_HW_FEEDBACK_THREAD_CONFIG;

    let old_value = msr.read(register_id, core_id)?;
    if ThreadConfig::from_raw(old_value).is_enabled() == enable {
        tracing::debug!(
            "Feedback bit at logical CPU {core_id} already {}, value {old_value:#X}",
            if enable { "set" } else { "cleared" }
        );
        return Ok(ToggleOutcome::Unchanged { value: old_value });
    }

    let new_value = with_enable_bit(old_value, enable);
    msr.write(register_id, new_value, core_id)?;

    if verify {
        let actual = msr.read(register_id, core_id)?;
        if ThreadConfig::from_raw(actual).is_enabled() != enable {
            return Err(MSRError::verification_mismatch(
                register_id,
                core_id,
                new_value,
                actual,
            ));
        }
    }

    Ok(ToggleOutcome::Written {
        old_value,
        new_value,
    })
}
