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

use std::fmt;

use serde::Serialize;

use itd_msr::registers::HresetEnable;
use itd_msr::registers::ThreadConfig;
use itd_msr::registers::ThreadFeedbackChar;
use itd_msr::registers::IA32_HRESET_ENABLE;
use itd_msr::registers::IA32_HW_FEEDBACK_THREAD_CONFIG;
use itd_msr::registers::IA32_THREAD_FEEDBACK_CHAR;
use itd_msr::MSRAccess;

use crate::FeedbackState;
use crate::LogicalCoreId;

/// Snapshot of the feedback related registers of one logical core.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CoreStatus {
    pub core_id: LogicalCoreId,
    pub feedback: Option<FeedbackState>,
    pub register_value: Option<u64>,
    pub hreset_enabled: Option<bool>,
    /// Classification of whatever thread ran on the core when it was read.
    pub class_id: Option<u8>,
    pub error: Option<String>,
}

impl CoreStatus {
    pub(crate) fn read(msr: &impl MSRAccess, core_id: LogicalCoreId) -> Self {
        let (feedback, register_value, error) =
            match msr.read(IA32_HW_FEEDBACK_THREAD_CONFIG, core_id) {
                Ok(value) => {
                    let state = FeedbackState::from_bit(ThreadConfig::from_raw(value).is_enabled());
                    (Some(state), Some(value), None)
                }
                Err(error) => {
                    tracing::warn!("Reading feedback config at logical CPU {core_id} failed: {error}");
                    (None, None, Some(error.to_string()))
                }
            };

        let hreset_enabled = msr
            .read(IA32_HRESET_ENABLE, core_id)
            .map(|value| HresetEnable::from_raw(value).is_enabled())
            .map_err(|error| tracing::debug!("HRESET enable isn't readable: {error}"))
            .ok();

        let class_id = msr
            .read(IA32_THREAD_FEEDBACK_CHAR, core_id)
            .map(|value| ThreadFeedbackChar::from_raw(value).class_id())
            .map_err(|error| tracing::debug!("Thread feedback char isn't readable: {error}"))
            .ok()
            .flatten();

        Self {
            core_id,
            feedback,
            register_value,
            hreset_enabled,
            class_id,
            error,
        }
    }
}

impl fmt::Display for CoreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CPU #{}: ", self.core_id)?;
        match (&self.feedback, self.register_value, &self.error) {
            (Some(feedback), Some(value), _) => write!(f, "feedback {feedback} ({value:#X})")?,
            (_, _, Some(error)) => return write!(f, "unreadable: {error}"),
            _ => write!(f, "unknown")?,
        }

        match self.hreset_enabled {
            Some(enabled) => write!(f, ", HRESET enabled: {enabled}")?,
            None => write!(f, ", HRESET enabled: unknown")?,
        }
        match self.class_id {
            Some(class_id) => write!(f, ", class ID: {class_id}"),
            None => write!(f, ", class ID: None"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    cores: Vec<CoreStatus>,
}

impl StatusReport {
    pub(crate) fn new(cores: Vec<CoreStatus>) -> Self {
        Self { cores }
    }

    pub fn cores(&self) -> &[CoreStatus] {
        &self.cores
    }

    pub fn enabled_count(&self) -> usize {
        self.cores
            .iter()
            .filter(|core| core.feedback == Some(FeedbackState::Enabled))
            .count()
    }

    pub fn unreadable_count(&self) -> usize {
        self.cores.iter().filter(|core| core.feedback.is_none()).count()
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for core in &self.cores {
            writeln!(f, "{core}")?;
        }
        write!(
            f,
            "feedback enabled on {} of {} logical cores, {} unreadable",
            self.enabled_count(),
            self.cores.len(),
            self.unreadable_count()
        )
    }
}
