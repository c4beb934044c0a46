/// Nominal timer decrement rate in hertz.
pub const TIMER_HZ: u32 = 60;

/// Delay and sound down-counters.
///
/// Both decrement by one per [`Timers::tick`] while nonzero and hold at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Timers {
    delay: u8,
    sound: u8,
}

impl Timers {
    /// Creates both timers at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self { delay: 0, sound: 0 }
    }

    /// Decrements each nonzero counter by one.
    pub const fn tick(&mut self) {
        self.delay = self.delay.saturating_sub(1);
        self.sound = self.sound.saturating_sub(1);
    }

    /// Current delay timer value.
    #[must_use]
    pub const fn delay(self) -> u8 {
        self.delay
    }

    /// Loads the delay timer.
    pub const fn set_delay(&mut self, value: u8) {
        self.delay = value;
    }

    /// Current sound timer value.
    #[must_use]
    pub const fn sound(self) -> u8 {
        self.sound
    }

    /// Loads the sound timer.
    pub const fn set_sound(&mut self, value: u8) {
        self.sound = value;
    }

    /// Returns `true` while the tone should be audible.
    #[must_use]
    pub const fn is_sound_active(self) -> bool {
        self.sound > 0
    }
}

#[cfg(test)]
mod tests {
    use super::Timers;

    #[test]
    fn delay_counts_down_to_zero_and_holds() {
        let mut timers = Timers::new();
        timers.set_delay(255);
        for _ in 0..300 {
            timers.tick();
        }
        assert_eq!(timers.delay(), 0);
        timers.tick();
        assert_eq!(timers.delay(), 0);
    }

    #[test]
    fn counters_are_independent() {
        let mut timers = Timers::new();
        timers.set_delay(3);
        timers.set_sound(1);
        assert!(timers.is_sound_active());

        timers.tick();
        assert_eq!(timers.delay(), 2);
        assert_eq!(timers.sound(), 0);
        assert!(!timers.is_sound_active());
    }
}
