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

use cpu_utils::CPUEnumerator;
use itd_msr::MSRAccess;

use crate::controller::ItdController;
use crate::controller::ItdResult;
use crate::report::ToggleReport;

/// Keeps the feedback bit enabled for its lifetime.
///
/// Dropping the guard, whether on a normal return, an early return or while
/// unwinding, runs a deactivation pass. [`ActivationGuard::release`] does the
/// same but hands back the report and the controller.
#[derive(Debug)]
pub struct ActivationGuard<E: CPUEnumerator, M: MSRAccess> {
    controller: Option<ItdController<E, M>>,
}

impl<E: CPUEnumerator, M: MSRAccess> ActivationGuard<E, M> {
    pub(crate) fn new(controller: ItdController<E, M>) -> Self {
        Self {
            controller: Some(controller),
        }
    }

    pub fn controller(&self) -> &ItdController<E, M> {
        self.controller
            .as_ref()
            .unwrap_or_else(|| unreachable!("controller is only taken on release or drop"))
    }

    pub(crate) fn controller_mut(&mut self) -> &mut ItdController<E, M> {
        self.controller
            .as_mut()
            .unwrap_or_else(|| unreachable!("controller is only taken on release or drop"))
    }

    /// Deactivates now and returns the controller together with the pass report.
    pub fn release(mut self) -> (ItdController<E, M>, ItdResult<ToggleReport>) {
        let mut controller = self
            .controller
            .take()
            .unwrap_or_else(|| unreachable!("controller is only taken on release or drop"));
        let report = controller.deactivate();
        (controller, report)
    }
}

impl<E: CPUEnumerator, M: MSRAccess> Drop for ActivationGuard<E, M> {
    fn drop(&mut self) {
        let Some(mut controller) = self.controller.take() else {
            return;
        };

        tracing::debug!("Activation guard dropped, deactivating feedback");
        if let Err(error) = controller.deactivate() {
            tracing::error!("Deactivation on guard drop failed: {error}");
        }
    }
}
