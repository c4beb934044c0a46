//! Sixteen-key hexadecimal keypad state.

use std::sync::atomic::{AtomicBool, Ordering};

/// Number of keys on the keypad.
pub const KEY_COUNT: usize = 16;

/// Point-in-time snapshot of which keys are held.
///
/// The core only ever reads a `Keypad`; the host builds one per cycle, or
/// takes one from a [`SharedKeypad`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Keypad {
    mask: u16,
}

impl Keypad {
    /// Creates a snapshot with every key released.
    #[must_use]
    pub const fn new() -> Self {
        Self { mask: 0 }
    }

    /// Creates a snapshot from a bitmask, bit `n` set meaning key `n` is held.
    #[must_use]
    pub const fn from_mask(mask: u16) -> Self {
        Self { mask }
    }

    /// Bitmask form of this snapshot.
    #[must_use]
    pub const fn mask(self) -> u16 {
        self.mask
    }

    /// Returns whether key `key & 0xF` is held.
    #[must_use]
    pub const fn is_pressed(self, key: u8) -> bool {
        self.mask & (1 << (key & 0x0F)) != 0
    }

    /// Sets the held state of key `key & 0xF`.
    pub const fn set(&mut self, key: u8, pressed: bool) {
        let bit = 1 << (key & 0x0F);
        if pressed {
            self.mask |= bit;
        } else {
            self.mask &= !bit;
        }
    }

    /// Marks key `key & 0xF` as held.
    pub const fn press(&mut self, key: u8) {
        self.set(key, true);
    }

    /// Marks key `key & 0xF` as released.
    pub const fn release(&mut self, key: u8) {
        self.set(key, false);
    }

    /// Returns `true` when no key is held.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.mask == 0
    }

    /// Held key indices in ascending order.
    pub fn pressed(self) -> impl Iterator<Item = u8> {
        (0..KEY_COUNT)
            .filter_map(|key| u8::try_from(key).ok())
            .filter(move |key| self.is_pressed(*key))
    }

    /// Lowest key held here that was not held in `previous`.
    #[must_use]
    pub fn newly_pressed_since(self, previous: Self) -> Option<u8> {
        let fresh = self.mask & !previous.mask;
        if fresh == 0 {
            None
        } else {
            u8::try_from(fresh.trailing_zeros()).ok()
        }
    }
}

/// Lock-free keypad written by an input thread and sampled by the core.
///
/// Each key is an independent flag; [`SharedKeypad::snapshot`] gives the core
/// one consistent [`Keypad`] per cycle.
#[derive(Debug, Default)]
pub struct SharedKeypad {
    keys: [AtomicBool; KEY_COUNT],
}

impl SharedKeypad {
    /// Creates a keypad with every key released.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes the held state of key `key & 0xF`.
    pub fn set(&self, key: u8, pressed: bool) {
        self.keys[usize::from(key & 0x0F)].store(pressed, Ordering::Release);
    }

    /// Releases every key.
    pub fn release_all(&self) {
        for key in &self.keys {
            key.store(false, Ordering::Release);
        }
    }

    /// Reads all sixteen flags into a snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Keypad {
        let mut keypad = Keypad::new();
        for (index, key) in (0_u8..).zip(self.keys.iter()) {
            keypad.set(index, key.load(Ordering::Acquire));
        }
        keypad
    }
}
