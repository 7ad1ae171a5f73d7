use std::time::{Duration, Instant};

pub type Timer = u8;

pub const TIMER_FREQUENCY: u32 = 60;
pub const TICK_INTERVAL: Duration = Duration::from_nanos(1_000_000_000 / TIMER_FREQUENCY as u64);

/// The delay and sound countdown timers plus the wall-clock anchor that
/// paces them at 60 Hz independently of the instruction rate.
#[derive(Debug, Clone)]
pub struct Timers {
    pub delay: Timer,
    pub sound: Timer,
    last_tick: Instant,
}

impl Timers {
    pub fn new(now: Instant) -> Self {
        Timers {
            delay: 0,
            sound: 0,
            last_tick: now,
        }
    }

    /// Decrements both timers once if more than one tick interval has passed
    /// since the previous decrement. Missed ticks are not made up.
    pub fn update(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last_tick) <= TICK_INTERVAL {
            return false;
        }
        self.delay = self.delay.saturating_sub(1);
        self.sound = self.sound.saturating_sub(1);
        self.last_tick = now;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_tick_before_interval() {
        let start = Instant::now();
        let mut timers = Timers::new(start);
        timers.delay = 5;
        assert!(!timers.update(start + TICK_INTERVAL / 2));
        assert!(!timers.update(start + TICK_INTERVAL));
        assert_eq!(timers.delay, 5);
    }

    #[test]
    fn test_single_decrement_without_catch_up() {
        let start = Instant::now();
        let mut timers = Timers::new(start);
        timers.delay = 10;
        timers.sound = 3;
        assert!(timers.update(start + Duration::from_secs(1)));
        assert_eq!(timers.delay, 9);
        assert_eq!(timers.sound, 2);
    }

    #[test]
    fn test_anchor_resets_after_tick() {
        let start = Instant::now();
        let mut timers = Timers::new(start);
        timers.delay = 10;
        let first = start + TICK_INTERVAL * 2;
        assert!(timers.update(first));
        assert!(!timers.update(first + TICK_INTERVAL / 2));
        assert!(timers.update(first + TICK_INTERVAL * 2));
        assert_eq!(timers.delay, 8);
    }

    #[test]
    fn test_timers_floor_at_zero() {
        let start = Instant::now();
        let mut timers = Timers::new(start);
        timers.sound = 1;
        timers.update(start + TICK_INTERVAL * 2);
        timers.update(start + TICK_INTERVAL * 4);
        assert_eq!(timers.sound, 0);
        assert_eq!(timers.delay, 0);
    }
}
