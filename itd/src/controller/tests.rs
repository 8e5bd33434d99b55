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

use itd_msr::registers::IA32_HRESET_ENABLE;
use itd_msr::registers::IA32_HW_FEEDBACK_THREAD_CONFIG;
use itd_msr::registers::IA32_THREAD_FEEDBACK_CHAR;
use itd_msr::MSRError;
use itd_msr::ToggleOutcome;
use itd_test_utils::test_values as test;
use itd_test_utils::FixedCPUEnumerator;
use itd_test_utils::MockMSR;

use super::ItdController;
use crate::FeedbackState;
use crate::ItdError;
use crate::LogicalCoreId;

const REG: u32 = IA32_HW_FEEDBACK_THREAD_CONFIG;

fn controller_with_values(values: &[u64]) -> ItdController<FixedCPUEnumerator, MockMSR> {
    let core_ids = test::generate_core_ids(values.len() as u32);
    let msr = MockMSR::with_register(REG, test::generate_register_values(values));
    ItdController::new(FixedCPUEnumerator::new(core_ids), msr)
}

fn register_values(controller: &ItdController<FixedCPUEnumerator, MockMSR>, count: u32) -> Vec<u64> {
    (0..count)
        .map(|core_id| controller.msr().get(REG, LogicalCoreId::new(core_id)))
        .collect()
}

#[test_log::test]
fn activation_then_deactivation_scenario() {
    let mut controller = controller_with_values(&[0x0, 0x2, 0x1]);

    let report = controller.activate().unwrap();
    assert_eq!(register_values(&controller, 3), vec![0x1, 0x3, 0x1]);
    assert_eq!(report.written_count(), 2);
    assert_eq!(report.unchanged_count(), 1);
    assert!(report.is_complete());

    let report = controller.deactivate().unwrap();
    assert_eq!(register_values(&controller, 3), vec![0x0, 0x2, 0x0]);
    assert_eq!(report.written_count(), 3);
    assert!(!report.enable());
}

#[test_log::test]
fn already_enabled_core_is_not_written() {
    let mut controller = controller_with_values(&[0x0, 0x2, 0x1]);

    controller.activate().unwrap();

    let written_cores = controller
        .msr()
        .writes()
        .into_iter()
        .map(|record| record.core_id)
        .collect::<Vec<_>>();
    assert_eq!(
        written_cores,
        vec![LogicalCoreId::new(0), LogicalCoreId::new(1)]
    );
}

#[test_log::test]
fn repeated_activation_writes_nothing() {
    let mut controller = controller_with_values(&[0x10, 0x20]);

    controller.activate().unwrap();
    assert_eq!(controller.msr().writes_count(), 2);

    let report = controller.activate().unwrap();
    assert_eq!(controller.msr().writes_count(), 2);
    assert_eq!(report.unchanged_count(), 2);
    assert_eq!(register_values(&controller, 2), vec![0x11, 0x21]);
}

#[test_log::test]
fn second_deactivation_writes_nothing() {
    let mut controller = controller_with_values(&[0x1, 0x3, 0x5]);

    controller.deactivate().unwrap();
    controller.msr().clear_writes();

    let report = controller.deactivate().unwrap();

    assert_eq!(controller.msr().writes_count(), 0);
    assert_eq!(report.unchanged_count(), 3);
    assert_eq!(register_values(&controller, 3), vec![0x0, 0x2, 0x4]);
}

#[test_log::test]
fn deactivation_without_activation_is_safe() {
    let mut controller = controller_with_values(&[0x0, 0xFFFF_FFFF_FFFF_FFFE]);

    let report = controller.deactivate().unwrap();

    assert!(report.is_complete());
    assert_eq!(report.written_count(), 0);
    assert_eq!(controller.msr().writes_count(), 0);
}

#[test_log::test]
fn round_trip_preserves_reserved_bits() {
    let initial = [0x0, 0xDEAD_BEE0, 0x8000_0000_0000_0000, 0xFFFF_FFFF_FFFF_FFFE];
    let mut controller = controller_with_values(&initial);

    controller.activate().unwrap();
    for (core_id, value) in register_values(&controller, 4).into_iter().enumerate() {
        assert_eq!(value & !1, initial[core_id] & !1);
        assert_eq!(value & 1, 1);
    }

    controller.deactivate().unwrap();
    assert_eq!(register_values(&controller, 4), initial.to_vec());
}

#[test_log::test]
fn unreachable_core_does_not_stop_activation() {
    let mut controller = controller_with_values(&[0x0, 0x0, 0x0]);
    controller.msr().set_unreachable(LogicalCoreId::new(1));

    let report = controller.activate().unwrap();

    assert_eq!(report.total(), 3);
    assert_eq!(report.succeeded_count(), 2);
    assert_eq!(report.failed_count(), 1);
    let (failed_core, error) = report.failures().next().unwrap();
    assert_eq!(failed_core, LogicalCoreId::new(1));
    assert!(matches!(error, MSRError::OpenForRead { .. }));

    assert_eq!(controller.msr().get(REG, LogicalCoreId::new(0)), 0x1);
    assert_eq!(controller.msr().get(REG, LogicalCoreId::new(1)), 0x0);
    assert_eq!(controller.msr().get(REG, LogicalCoreId::new(2)), 0x1);
}

#[test_log::test]
fn failed_write_is_reported_and_rest_continues() {
    let mut controller = controller_with_values(&[0x0, 0x0, 0x0]);
    controller.msr().fail_writes_on(LogicalCoreId::new(0));

    let report = controller.activate().unwrap();

    assert!(matches!(
        report.cores()[0].outcome,
        Err(MSRError::WriteWNoErr { .. })
    ));
    assert!(report.cores()[1].is_ok());
    assert!(report.cores()[2].is_ok());
    assert_eq!(register_values(&controller, 3), vec![0x0, 0x1, 0x1]);
}

#[test_log::test]
fn deactivation_after_partial_activation_restores_reachable_cores() {
    let mut controller = controller_with_values(&[0x0, 0x0, 0x0]);
    controller.msr().set_unreachable(LogicalCoreId::new(2));
    controller.activate().unwrap();

    controller.msr().set_reachable(LogicalCoreId::new(2));
    let report = controller.deactivate().unwrap();

    assert!(report.is_complete());
    assert_eq!(report.written_count(), 2);
    assert_eq!(register_values(&controller, 3), vec![0x0, 0x0, 0x0]);
}

#[test_log::test]
fn every_core_is_visited_once_per_pass() {
    let mut controller = controller_with_values(&[0x0; 8]);

    let report = controller.activate().unwrap();

    let mut visited = report.cores().iter().map(|core| core.core_id).collect::<Vec<_>>();
    visited.sort();
    visited.dedup();
    assert_eq!(visited.len(), 8);
    assert_eq!(report.total(), 8);
    assert_eq!(controller.msr().writes_count(), 8);
}

#[test_log::test]
fn cores_are_enumerated_on_every_pass() {
    let mut controller = controller_with_values(&[0x0, 0x0]);
    controller.activate().unwrap();

    // A core came online after activation.
    controller.msr().set(REG, LogicalCoreId::new(2), 0x1);
    controller
        .enumerator()
        .set_cores(test::generate_core_ids(3));
    let report = controller.deactivate().unwrap();

    assert_eq!(controller.enumerator().calls_count(), 2);
    assert_eq!(report.total(), 3);
    assert_eq!(register_values(&controller, 3), vec![0x0, 0x0, 0x0]);
}

#[test_log::test]
fn enumeration_failure_aborts_the_pass() {
    let msr = MockMSR::new();
    let mut controller = ItdController::new(FixedCPUEnumerator::new(vec![]), msr);

    let result = controller.activate();

    assert!(matches!(result, Err(ItdError::Enumeration(_))));
    assert_eq!(controller.msr().writes_count(), 0);
}

#[test_log::test]
fn lost_write_is_reported_when_verifying() {
    let mut controller = controller_with_values(&[0x0, 0x0]);
    controller.msr().lose_writes_on(LogicalCoreId::new(1));

    let report = controller.activate().unwrap();

    assert!(report.cores()[0].is_ok());
    assert!(matches!(
        report.cores()[1].outcome,
        Err(MSRError::VerificationMismatch { .. })
    ));
}

#[test_log::test]
fn lost_write_passes_without_verification() {
    let mut controller = controller_with_values(&[0x0]).with_verification(false);
    controller.msr().lose_writes_on(LogicalCoreId::new(0));

    let report = controller.activate().unwrap();

    assert!(!controller.verify_writes());
    assert!(report.is_complete());
    assert!(matches!(
        report.cores()[0].outcome,
        Ok(ToggleOutcome::Written {
            old_value: 0x0,
            new_value: 0x1
        })
    ));
}

#[test_log::test]
fn guard_deactivates_on_drop() {
    let controller = controller_with_values(&[0x0, 0x4]);

    let (guard, report) = controller.activate_guarded().unwrap();
    assert_eq!(report.written_count(), 2);
    assert_eq!(register_values(guard.controller(), 2), vec![0x1, 0x5]);

    let (controller, report) = guard.release();
    assert_eq!(report.unwrap().written_count(), 2);
    assert_eq!(register_values(&controller, 2), vec![0x0, 0x4]);
}

#[test_log::test]
fn guard_deactivates_when_scope_exits_early() {
    let msr = std::sync::Arc::new(MockMSR::with_register(
        REG,
        test::generate_register_values(&[0x0, 0x0]),
    ));

    let run = |msr: std::sync::Arc<MockMSR>| -> Result<(), &'static str> {
        let controller =
            ItdController::new(FixedCPUEnumerator::new(test::generate_core_ids(2)), msr);
        let (_guard, _) = controller.activate_guarded().map_err(|_| "activation")?;
        Err("controller failed while active")
    };

    assert!(run(msr.clone()).is_err());
    assert_eq!(msr.get(REG, LogicalCoreId::new(0)), 0x0);
    assert_eq!(msr.get(REG, LogicalCoreId::new(1)), 0x0);
    assert_eq!(msr.writes_count(), 4);
}

#[test_log::test]
fn status_reads_every_core_without_writing() {
    let controller = controller_with_values(&[0x1, 0x0, 0x3]);
    controller.msr().set_unreachable(LogicalCoreId::new(1));
    controller
        .msr()
        .set(IA32_HRESET_ENABLE, LogicalCoreId::new(0), 0x1);
    controller.msr().set(
        IA32_THREAD_FEEDBACK_CHAR,
        LogicalCoreId::new(0),
        (1 << 63) | 0x2,
    );

    let status = controller.status().unwrap();

    assert_eq!(controller.msr().writes_count(), 0);
    assert_eq!(status.enabled_count(), 2);
    assert_eq!(status.unreadable_count(), 1);

    let first = &status.cores()[0];
    assert_eq!(first.feedback, Some(FeedbackState::Enabled));
    assert_eq!(first.register_value, Some(0x1));
    assert_eq!(first.hreset_enabled, Some(true));
    assert_eq!(first.class_id, Some(2));

    let second = &status.cores()[1];
    assert_eq!(second.feedback, None);
    assert!(second.error.is_some());

    let third = &status.cores()[2];
    assert_eq!(third.class_id, None);
    assert_eq!(third.hreset_enabled, Some(false));
}

#[test]
fn status_serializes_to_json() {
    let controller = controller_with_values(&[0x1]);

    let status = controller.status().unwrap();
    let json = serde_json::to_value(&status).unwrap();

    assert_eq!(json["cores"][0]["core_id"], 0);
    assert_eq!(json["cores"][0]["feedback"], "enabled");
    assert_eq!(json["cores"][0]["register_value"], 1);
}
