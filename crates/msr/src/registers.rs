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

//! Hardware feedback interface registers used by the controller.

use bitflags::bitflags;

/// Current thread classification reported by the hardware.
pub const IA32_THREAD_FEEDBACK_CHAR: u32 = 0x17D2;

/// Per-logical-processor thread feedback enable, only bit 0 is defined.
pub const IA32_HW_FEEDBACK_THREAD_CONFIG: u32 = 0x17D4;

/// HRESET capability enables.
pub const IA32_HRESET_ENABLE: u32 = 0x17DA;

bitflags! {
    /// `IA32_HW_FEEDBACK_THREAD_CONFIG` layout, bits 1-63 are reserved and retained as read.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ThreadConfig: u64 {
        const ENABLE = 1 << 0;
    }
}

bitflags! {
    /// `IA32_HRESET_ENABLE` layout, only the thread director history bit is interpreted.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct HresetEnable: u64 {
        const ENABLE = 1 << 0;
    }
}

impl ThreadConfig {
    pub fn from_raw(value: u64) -> Self {
        Self::from_bits_retain(value)
    }

    pub fn is_enabled(&self) -> bool {
        self.contains(Self::ENABLE)
    }

    /// Returns the same register value with only the enable bit replaced.
    pub fn with_enable(self, enable: bool) -> Self {
        let mut config = self;
        config.set(Self::ENABLE, enable);
        config
    }
}

impl HresetEnable {
    pub fn from_raw(value: u64) -> Self {
        Self::from_bits_retain(value)
    }

    pub fn is_enabled(&self) -> bool {
        self.contains(Self::ENABLE)
    }
}

/// `IA32_THREAD_FEEDBACK_CHAR` layout: class id in bits 0-7, valid flag in bit 63.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ThreadFeedbackChar(u64);

impl ThreadFeedbackChar {
    const CLASS_ID_MASK: u64 = 0xFF;
    const VALID_BIT: u64 = 1 << 63;

    pub fn from_raw(value: u64) -> Self {
        Self(value)
    }

    pub fn is_valid(&self) -> bool {
        self.0 & Self::VALID_BIT != 0
    }

    pub fn class_id(&self) -> Option<u8> {
        self.is_valid().then_some((self.0 & Self::CLASS_ID_MASK) as u8)
    }
}

/// Pure read-modify-write step for the feedback enable bit.
pub fn with_enable_bit(old_value: u64, enable: bool) -> u64 {
    ThreadConfig::from_raw(old_value).with_enable(enable).bits()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enable_bit_is_set_without_touching_reserved_bits() {
        assert_eq!(with_enable_bit(0x0, true), 0x1);
        assert_eq!(with_enable_bit(0x2, true), 0x3);
        assert_eq!(with_enable_bit(0x1, true), 0x1);
        assert_eq!(
            with_enable_bit(0xFFFF_FFFF_FFFF_FFFE, true),
            0xFFFF_FFFF_FFFF_FFFF
        );
    }

    #[test]
    fn enable_bit_is_cleared_without_touching_reserved_bits() {
        assert_eq!(with_enable_bit(0x1, false), 0x0);
        assert_eq!(with_enable_bit(0x3, false), 0x2);
        assert_eq!(with_enable_bit(0x0, false), 0x0);
        assert_eq!(
            with_enable_bit(0xFFFF_FFFF_FFFF_FFFF, false),
            0xFFFF_FFFF_FFFF_FFFE
        );
        assert_eq!(
            with_enable_bit(0x8000_0000_0000_0001, false),
            0x8000_0000_0000_0000
        );
    }

    #[test]
    fn only_bit_zero_differs() {
        let values = [0x0, 0x1, 0x2, 0xDEAD_BEEF, 0x8000_0000_0000_0000, u64::MAX];
        for value in values {
            for enable in [false, true] {
                let new_value = with_enable_bit(value, enable);
                assert_eq!(new_value & !1, value & !1);
                assert_eq!(new_value & 1 == 1, enable);
            }
        }
    }

    #[test]
    fn thread_config_reports_enable_bit() {
        assert!(ThreadConfig::from_raw(0x3).is_enabled());
        assert!(!ThreadConfig::from_raw(0x2).is_enabled());
    }

    #[test]
    fn class_id_requires_valid_flag() {
        let valid = ThreadFeedbackChar::from_raw((1 << 63) | 0x102);
        assert_eq!(valid.class_id(), Some(0x02));

        let invalid = ThreadFeedbackChar::from_raw(0x3);
        assert!(!invalid.is_valid());
        assert_eq!(invalid.class_id(), None);
    }

    #[test]
    fn hreset_reports_enable_bit() {
        assert!(HresetEnable::from_raw(0x1).is_enabled());
        assert!(!HresetEnable::from_raw(0x0).is_enabled());
    }
}
