//! Controller state bridge
//!
//! The host's input layer hands us, per controller slot, a 16-bit button mask
//! and two raw analog axes. We decode the mask into a fixed structure that
//! the core reads synchronously on its next input poll. Nothing is queued:
//! a slot is overwritten in place, so hosts must call
//! [`Controllers::update`] between frame steps, never during one.
//!
//! ## Host mask layout (little-endian 16-bit)
//!
//! | bit | button | bit | button  |
//! |-----|--------|-----|---------|
//! | 0   | Up     | 7   | Z       |
//! | 1   | Down   | 8   | A       |
//! | 2   | Left   | 9   | B       |
//! | 3   | Right  | 10  | C-Left  |
//! | 4   | Start  | 11  | C-Right |
//! | 5   | R      | 12  | C-Up    |
//! | 6   | L      | 13  | C-Down  |
//!
//! The core itself wants the PIF response order, which is different; see
//! [`ControllerButtons::to_pif_word`].

use host_core::logging::{log, LogCategory, LogLevel};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of controller ports on the console
pub const MAX_CONTROLLERS: usize = 4;

pub const MASK_UP: u16 = 1 << 0;
pub const MASK_DOWN: u16 = 1 << 1;
pub const MASK_LEFT: u16 = 1 << 2;
pub const MASK_RIGHT: u16 = 1 << 3;
pub const MASK_START: u16 = 1 << 4;
pub const MASK_R: u16 = 1 << 5;
pub const MASK_L: u16 = 1 << 6;
pub const MASK_Z: u16 = 1 << 7;
pub const MASK_A: u16 = 1 << 8;
pub const MASK_B: u16 = 1 << 9;
pub const MASK_C_LEFT: u16 = 1 << 10;
pub const MASK_C_RIGHT: u16 = 1 << 11;
pub const MASK_C_UP: u16 = 1 << 12;
pub const MASK_C_DOWN: u16 = 1 << 13;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputError {
    #[error("controller slot {0} out of range (expected 0-3)")]
    SlotOutOfRange(usize),
}

/// N64 controller button flags (active-high: true = pressed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ControllerButtons {
    pub d_up: bool,
    pub d_down: bool,
    pub d_left: bool,
    pub d_right: bool,
    pub start: bool,
    pub r: bool,
    pub l: bool,
    pub z: bool,
    pub a: bool,
    pub b: bool,
    pub c_left: bool,
    pub c_right: bool,
    pub c_up: bool,
    pub c_down: bool,
}

impl ControllerButtons {
    /// Decode a host button mask. Bits 14 and 15 are ignored.
    pub fn from_mask(mask: u16) -> Self {
        Self {
            d_up: mask & MASK_UP != 0,
            d_down: mask & MASK_DOWN != 0,
            d_left: mask & MASK_LEFT != 0,
            d_right: mask & MASK_RIGHT != 0,
            start: mask & MASK_START != 0,
            r: mask & MASK_R != 0,
            l: mask & MASK_L != 0,
            z: mask & MASK_Z != 0,
            a: mask & MASK_A != 0,
            b: mask & MASK_B != 0,
            c_left: mask & MASK_C_LEFT != 0,
            c_right: mask & MASK_C_RIGHT != 0,
            c_up: mask & MASK_C_UP != 0,
            c_down: mask & MASK_C_DOWN != 0,
        }
    }

    /// Pack buttons into the 16-bit PIF controller-status word.
    ///
    /// 15: A, 14: B, 13: Z, 12: Start,
    /// 11: D-Up, 10: D-Down, 9: D-Left, 8: D-Right,
    /// 7-6: reserved, 5: L, 4: R,
    /// 3: C-Up, 2: C-Down, 1: C-Left, 0: C-Right
    pub fn to_pif_word(&self) -> u16 {
        [
            (self.a, 15),
            (self.b, 14),
            (self.z, 13),
            (self.start, 12),
            (self.d_up, 11),
            (self.d_down, 10),
            (self.d_left, 9),
            (self.d_right, 8),
            (self.l, 5),
            (self.r, 4),
            (self.c_up, 3),
            (self.c_down, 2),
            (self.c_left, 1),
            (self.c_right, 0),
        ]
        .into_iter()
        .filter(|&(pressed, _)| pressed)
        .fold(0u16, |word, (_, bit): (bool, u32)| word | (1u16 << bit))
    }

    pub fn pressed_count(&self) -> u32 {
        self.to_pif_word().count_ones()
    }
}

/// One slot's input as the core sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ControllerInput {
    pub buttons: ControllerButtons,
    /// Raw host axis values, passed through unchanged
    pub axis_x: i16,
    pub axis_y: i16,
}

/// Fixed-capacity controller array owned by the session
#[derive(Debug, Clone, Default)]
pub struct Controllers {
    slots: [ControllerInput; MAX_CONTROLLERS],
}

impl Controllers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite `slot` with the decoded mask and raw axes.
    ///
    /// An out-of-range slot is logged and rejected; no slot is touched.
    pub fn update(
        &mut self,
        slot: usize,
        button_mask: u16,
        axis_x: i16,
        axis_y: i16,
    ) -> Result<(), InputError> {
        let Some(input) = self.slots.get_mut(slot) else {
            log(LogCategory::Input, LogLevel::Error, || {
                format!("ignoring input for controller slot {}", slot)
            });
            return Err(InputError::SlotOutOfRange(slot));
        };

        *input = ControllerInput {
            buttons: ControllerButtons::from_mask(button_mask),
            axis_x,
            axis_y,
        };

        log(LogCategory::Input, LogLevel::Trace, || {
            format!(
                "slot {}: mask={:04X} axis=({}, {})",
                slot, button_mask, axis_x, axis_y
            )
        });
        Ok(())
    }

    pub fn get(&self, slot: usize) -> Option<&ControllerInput> {
        self.slots.get(slot)
    }

    /// Release every button and center every stick
    pub fn clear(&mut self) {
        self.slots = Default::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_up_only() {
        let buttons = ControllerButtons::from_mask(0x0001);
        assert_eq!(
            buttons,
            ControllerButtons {
                d_up: true,
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_decode_low_byte_and_bits_8_9() {
        let buttons = ControllerButtons::from_mask(0x030F);
        let expected = ControllerButtons {
            d_up: true,
            d_down: true,
            d_left: true,
            d_right: true,
            a: true,
            b: true,
            ..Default::default()
        };
        assert_eq!(buttons, expected);
        assert_eq!(buttons.pressed_count(), 6);
    }

    #[test]
    fn test_decode_each_bit_maps_to_one_button() {
        for bit in 0..14 {
            let buttons = ControllerButtons::from_mask(1 << bit);
            assert_eq!(buttons.pressed_count(), 1, "bit {}", bit);
        }
        assert_eq!(ControllerButtons::from_mask(0xC000).pressed_count(), 0);
    }

    #[test]
    fn test_c_buttons() {
        let buttons =
            ControllerButtons::from_mask(MASK_C_LEFT | MASK_C_RIGHT | MASK_C_UP | MASK_C_DOWN);
        assert!(buttons.c_left && buttons.c_right && buttons.c_up && buttons.c_down);
        assert!(!buttons.a && !buttons.d_up);
    }

    #[test]
    fn test_pif_word_packing() {
        let buttons = ControllerButtons::from_mask(MASK_A | MASK_START);
        assert_eq!(buttons.to_pif_word(), (1 << 15) | (1 << 12));

        let buttons = ControllerButtons::from_mask(MASK_C_RIGHT | MASK_L);
        assert_eq!(buttons.to_pif_word(), (1 << 5) | 1);
    }

    #[test]
    fn test_update_passes_axes_through() {
        let mut controllers = Controllers::new();
        controllers.update(2, MASK_Z, -32768, 1234).unwrap();

        let input = controllers.get(2).unwrap();
        assert!(input.buttons.z);
        assert_eq!(input.axis_x, -32768);
        assert_eq!(input.axis_y, 1234);
        assert_eq!(controllers.get(0).unwrap(), &ControllerInput::default());
    }

    #[test]
    fn test_update_overwrites_in_place() {
        let mut controllers = Controllers::new();
        controllers.update(0, MASK_A | MASK_B, 10, 10).unwrap();
        controllers.update(0, MASK_START, -5, 0).unwrap();

        let input = controllers.get(0).unwrap();
        assert!(input.buttons.start);
        assert!(!input.buttons.a);
        assert_eq!(input.axis_x, -5);
    }

    #[test]
    fn test_out_of_range_slot_is_rejected() {
        let mut controllers = Controllers::new();
        controllers.update(3, MASK_A, 1, 1).unwrap();

        let err = controllers.update(4, MASK_B, 99, 99).unwrap_err();
        assert_eq!(err, InputError::SlotOutOfRange(4));
        assert!(controllers.get(4).is_none());
        // Neighbouring slot is untouched
        assert!(controllers.get(3).unwrap().buttons.a);
        assert_eq!(controllers.get(3).unwrap().axis_x, 1);
    }

    #[test]
    fn test_clear() {
        let mut controllers = Controllers::new();
        controllers.update(1, 0x3FFF, 100, -100).unwrap();
        controllers.clear();
        assert_eq!(controllers.get(1).unwrap(), &ControllerInput::default());
    }
}
