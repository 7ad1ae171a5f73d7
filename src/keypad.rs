use bitvec::{array::BitArray, BitArr};

pub const NUM_KEYS: usize = 16;

/// Snapshot of the keys held on the 16-key hex keypad during one cycle.
#[derive(Clone)]
pub struct Keypad {
    pressed: BitArr!(for NUM_KEYS, in u16),
}

impl Keypad {
    pub fn new() -> Self {
        Keypad {
            pressed: BitArray::ZERO,
        }
    }

    /// Builds a snapshot from key codes. Codes above 0xF are dropped.
    pub fn from_keys(keys: impl IntoIterator<Item = u8>) -> Self {
        let mut keypad = Keypad::new();
        for key in keys {
            if usize::from(key) < NUM_KEYS {
                keypad.pressed.set(usize::from(key), true);
            } else {
                log::warn!("Ignoring out of range key code {key:#04X}");
            }
        }
        keypad
    }

    pub fn is_key_pressed(&self, key: u8) -> bool {
        usize::from(key) < NUM_KEYS && self.pressed[usize::from(key)]
    }

    /// Lowest-numbered pressed key, if any.
    pub fn first_pressed(&self) -> Option<u8> {
        self.pressed.first_one().map(|key| key as u8)
    }

    pub fn pressed_keys(&self) -> impl Iterator<Item = u8> + '_ {
        self.pressed.iter_ones().map(|key| key as u8)
    }

    pub fn is_empty(&self) -> bool {
        self.pressed.not_any()
    }
}

impl PartialEq for Keypad {
    fn eq(&self, other: &Self) -> bool {
        self.pressed.as_bitslice() == other.pressed.as_bitslice()
    }
}

impl Eq for Keypad {}

impl Default for Keypad {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Keypad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.pressed_keys()).finish()
    }
}
