//! Simulation clock: owns tick state, speed control, and pause.

use crate::types::{RunId, Tick};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimClock {
    pub run_id:       RunId,
    pub current_tick: Tick,
    pub speed:        SimSpeed,
    pub paused:       bool,
}

impl SimClock {
    pub fn new(run_id: RunId) -> Self {
        Self {
            run_id,
            current_tick: 0,
            speed: SimSpeed::Normal,
            paused: true,
        }
    }

    /// Advance one tick. Returns the new tick number.
    /// Panics if called while paused; callers must check.
    pub fn advance(&mut self) -> Tick {
        assert!(!self.paused, "advance() called on paused clock");
        self.current_tick += 1;
        self.current_tick
    }

    pub fn pause(&mut self)  { self.paused = true;  }
    pub fn resume(&mut self) { self.paused = false; }

    pub fn set_speed(&mut self, speed: SimSpeed) {
        self.speed = speed;
    }

    /// How many ticks the runner advances per real-time frame.
    pub fn ticks_per_frame(&self) -> u32 {
        match self.speed {
            SimSpeed::Normal  => 1,
            SimSpeed::Fast    => 4,
            SimSpeed::Fastest => 16,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SimSpeed {
    Normal,   // 1 tick/frame
    Fast,     // 4 ticks/frame
    Fastest,  // one full decay step (16 ticks) per frame
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_starts_paused_at_zero() {
        let clock = SimClock::new("clock-test".into());
        assert_eq!(clock.current_tick, 0);
        assert!(clock.paused);
        assert_eq!(clock.ticks_per_frame(), 1);
    }

    #[test]
    fn advance_increments_tick() {
        let mut clock = SimClock::new("clock-test".into());
        clock.resume();
        assert_eq!(clock.advance(), 1);
        assert_eq!(clock.advance(), 2);
        clock.set_speed(SimSpeed::Fastest);
        assert_eq!(clock.ticks_per_frame(), 16);
    }

    #[test]
    #[should_panic(expected = "paused clock")]
    fn advance_while_paused_panics() {
        let mut clock = SimClock::new("clock-test".into());
        clock.advance();
    }
}
