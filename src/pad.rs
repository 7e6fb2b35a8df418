//! Gamepad (Joypad) functions and structures.

use crate::{consts::P1_ADDR, mmu::BusComponent, warnln};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PadKey {
    Up,
    Down,
    Left,
    Right,
    Start,
    Select,
    A,
    B,
}

/// The gamepad of the system, a 4x2 button matrix exposed
/// through the P1 register, reads are driven by the two
/// select lines written into bits 4 and 5.
pub struct Pad {
    down: bool,
    up: bool,
    left: bool,
    right: bool,
    start: bool,
    select: bool,
    b: bool,
    a: bool,

    /// If the action buttons half of the matrix is selected,
    /// the select lines are active low (set means selected).
    select_action: bool,

    /// If the direction buttons half of the matrix is selected.
    select_direction: bool,

    int_pad: bool,
}

impl Pad {
    pub fn new() -> Self {
        Self {
            down: false,
            up: false,
            left: false,
            right: false,
            start: false,
            select: false,
            b: false,
            a: false,
            select_action: false,
            select_direction: false,
            int_pad: false,
        }
    }

    pub fn reset(&mut self) {
        self.down = false;
        self.up = false;
        self.left = false;
        self.right = false;
        self.start = false;
        self.select = false;
        self.b = false;
        self.a = false;
        self.select_action = false;
        self.select_direction = false;
        self.int_pad = false;
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            P1_ADDR => {
                // pressed keys pull the matrix lines low, with both
                // halves selected the two columns are ANDed together
                let mut value = 0x0f;
                if self.select_action {
                    value &= !((self.a as u8)
                        | ((self.b as u8) << 1)
                        | ((self.select as u8) << 2)
                        | ((self.start as u8) << 3));
                }
                if self.select_direction {
                    value &= !((self.right as u8)
                        | ((self.left as u8) << 1)
                        | ((self.up as u8) << 2)
                        | ((self.down as u8) << 3));
                }
                if !self.select_direction {
                    value |= 0x10;
                }
                if !self.select_action {
                    value |= 0x20;
                }
                value | 0xc0
            }
            _ => {
                warnln!("Reading from unknown Pad location 0x{:04x}", addr);
                0xff
            }
        }
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        match addr {
            // only the two select lines are writable
            P1_ADDR => {
                self.select_direction = value & 0x10 == 0x00;
                self.select_action = value & 0x20 == 0x00;
            }
            _ => warnln!("Writing to unknown Pad location 0x{:04x}", addr),
        }
    }

    pub fn key_press(&mut self, key: PadKey) {
        match key {
            PadKey::Up => self.up = true,
            PadKey::Down => self.down = true,
            PadKey::Left => self.left = true,
            PadKey::Right => self.right = true,
            PadKey::Start => self.start = true,
            PadKey::Select => self.select = true,
            PadKey::A => self.a = true,
            PadKey::B => self.b = true,
        }

        // a high to low transition on any selected matrix line
        // requests the joypad interrupt
        let direction = matches!(key, PadKey::Up | PadKey::Down | PadKey::Left | PadKey::Right);
        if (direction && self.select_direction) || (!direction && self.select_action) {
            self.int_pad = true;
        }
    }

    pub fn key_lift(&mut self, key: PadKey) {
        match key {
            PadKey::Up => self.up = false,
            PadKey::Down => self.down = false,
            PadKey::Left => self.left = false,
            PadKey::Right => self.right = false,
            PadKey::Start => self.start = false,
            PadKey::Select => self.select = false,
            PadKey::A => self.a = false,
            PadKey::B => self.b = false,
        }
    }

    /// Replaces the complete button state with the provided mask,
    /// one bit per button with set meaning pressed, in the order
    /// A, B, Select, Start, Right, Left, Up, Down (LSB first).
    pub fn set_buttons(&mut self, state: u8) {
        for (bit, key) in [
            PadKey::A,
            PadKey::B,
            PadKey::Select,
            PadKey::Start,
            PadKey::Right,
            PadKey::Left,
            PadKey::Up,
            PadKey::Down,
        ]
        .into_iter()
        .enumerate()
        {
            if state & (1 << bit) == (1 << bit) {
                if !self.pressed(key) {
                    self.key_press(key);
                }
            } else {
                self.key_lift(key);
            }
        }
    }

    pub fn pressed(&self, key: PadKey) -> bool {
        match key {
            PadKey::Up => self.up,
            PadKey::Down => self.down,
            PadKey::Left => self.left,
            PadKey::Right => self.right,
            PadKey::Start => self.start,
            PadKey::Select => self.select,
            PadKey::A => self.a,
            PadKey::B => self.b,
        }
    }

    #[inline(always)]
    pub fn int_pad(&self) -> bool {
        self.int_pad
    }

    #[inline(always)]
    pub fn set_int_pad(&mut self, value: bool) {
        self.int_pad = value;
    }

    #[inline(always)]
    pub fn ack_pad(&mut self) {
        self.set_int_pad(false);
    }
}

impl BusComponent for Pad {
    fn read(&self, addr: u16) -> u8 {
        self.read(addr)
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.write(addr, value);
    }
}

impl Default for Pad {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use crate::consts::P1_ADDR;

    use super::{Pad, PadKey};

    #[test]
    fn test_idle_read() {
        let pad = Pad::new();
        assert_eq!(pad.read(P1_ADDR), 0xff);
    }

    #[test]
    fn test_action_selection() {
        let mut pad = Pad::new();
        pad.key_press(PadKey::A);
        pad.key_press(PadKey::Start);

        pad.write(P1_ADDR, 0x10);
        assert_eq!(pad.read(P1_ADDR), 0xd6);

        // directions half reads idle, A/Start are action keys
        pad.write(P1_ADDR, 0x20);
        assert_eq!(pad.read(P1_ADDR), 0xef);
    }

    #[test]
    fn test_both_halves_selected() {
        let mut pad = Pad::new();
        pad.key_press(PadKey::A);
        pad.key_press(PadKey::Down);

        pad.write(P1_ADDR, 0x00);
        assert_eq!(pad.read(P1_ADDR), 0xc6);
    }

    #[test]
    fn test_interrupt_on_selected_press() {
        let mut pad = Pad::new();
        pad.write(P1_ADDR, 0x10);
        pad.key_press(PadKey::Up);
        assert!(!pad.int_pad());
        pad.key_press(PadKey::B);
        assert!(pad.int_pad());
    }

    #[test]
    fn test_set_buttons_mask() {
        let mut pad = Pad::new();
        pad.set_buttons(0x81);
        assert!(pad.pressed(PadKey::A));
        assert!(pad.pressed(PadKey::Down));
        assert!(!pad.pressed(PadKey::Start));

        pad.set_buttons(0x00);
        assert!(!pad.pressed(PadKey::A));
        assert!(!pad.pressed(PadKey::Down));
    }
}
