//! Time-dependent concession schedule.
//!
//! Willingness is the utility level the agent currently targets. The base
//! curve starts near the profile offset and falls off sharply close to the
//! deadline; larger stubbornness delays the drop. The randomized extras
//! (per-round jitter and an intermittent spike) keep opponents from
//! modeling the schedule exactly.

use crate::num::clamp01;
use crate::profile::StrategyProfile;
use crate::rng::AgentRng;

/// Countdown that occasionally injects a willingness bonus. When the
/// countdown expires the bonus fires and the timer reseeds to a random
/// round count in `[0, frequency]`.
#[derive(Debug, Clone)]
pub struct SpikeTimer {
    magnitude: f64,
    frequency: u32,
    countdown: u32,
}

impl SpikeTimer {
    pub fn new(magnitude: f64, frequency: u32, rng: &mut AgentRng) -> Self {
        let mut timer = Self {
            magnitude,
            frequency,
            countdown: 0,
        };
        timer.reseed(rng);
        timer
    }

    fn reseed(&mut self, rng: &mut AgentRng) {
        self.countdown = (rng.next_f64() * f64::from(self.frequency)).round() as u32;
    }

    /// Advance one round; returns the bonus for this round (usually 0).
    fn tick(&mut self, rng: &mut AgentRng) -> f64 {
        if self.countdown > 0 {
            self.countdown -= 1;
            return 0.0;
        }
        let bonus = rng.roll(self.magnitude);
        self.reseed(rng);
        bonus
    }
}

#[derive(Debug, Clone)]
pub struct ConcessionSchedule {
    stubbornness: f64,
    offset: f64,
    jitter: f64,
    minimum_utility: f64,
    spike: Option<SpikeTimer>,
}

impl ConcessionSchedule {
    pub fn new(stubbornness: f64, offset: f64) -> Self {
        Self {
            stubbornness: stubbornness.max(1.0),
            offset,
            jitter: 0.0,
            minimum_utility: 0.0,
            spike: None,
        }
    }

    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.max(0.0);
        self
    }

    pub fn with_floor(mut self, minimum_utility: f64) -> Self {
        self.minimum_utility = clamp01(minimum_utility);
        self
    }

    pub fn with_spike(mut self, magnitude: f64, frequency: u32, rng: &mut AgentRng) -> Self {
        if magnitude > 0.0 && frequency > 0 {
            self.spike = Some(SpikeTimer::new(magnitude, frequency, rng));
        }
        self
    }

    pub fn from_profile(profile: &StrategyProfile, rng: &mut AgentRng) -> Self {
        Self::new(profile.stubbornness, profile.offset)
            .with_jitter(profile.jitter)
            .with_floor(profile.minimum_utility)
            .with_spike(profile.spike_magnitude, profile.spike_frequency, rng)
    }

    /// Target utility at normalized time `t` in `[0, 1]`. Advances the
    /// spike timer, so call exactly once per round. Output is always in
    /// `[0, 1]` and never below the reservation floor.
    pub fn willingness(&mut self, t: f64, rng: &mut AgentRng) -> f64 {
        let base = self.offset - self.stubbornness.powf(clamp01(t)) / self.stubbornness;
        let jitter = if self.jitter > 0.0 {
            rng.roll(self.jitter)
        } else {
            0.0
        };
        let spike = match self.spike.as_mut() {
            Some(timer) => timer.tick(rng),
            None => 0.0,
        };
        clamp01(base + jitter + spike).max(self.minimum_utility)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_schedule(stubbornness: f64) -> ConcessionSchedule {
        ConcessionSchedule::new(stubbornness, 0.95)
    }

    #[test]
    fn willingness_stays_in_unit_interval() {
        let mut rng = AgentRng::new(9);
        let mut schedule = ConcessionSchedule::new(10_000.0, 0.90)
            .with_jitter(0.1)
            .with_spike(0.25, 50, &mut rng);
        for step in 0..=100 {
            let t = f64::from(step) / 100.0;
            let w = schedule.willingness(t, &mut rng);
            assert!((0.0..=1.0).contains(&w), "w={w} at t={t}");
        }
    }

    #[test]
    fn quiet_curve_never_rises_as_deadline_approaches() {
        let mut rng = AgentRng::new(9);
        let mut schedule = quiet_schedule(10_000.0);
        let mut previous = f64::INFINITY;
        for step in 0..=100 {
            let t = f64::from(step) / 100.0;
            let w = schedule.willingness(t, &mut rng);
            assert!(w <= previous + 1e-12, "curve rose at t={t}");
            previous = w;
        }
    }

    #[test]
    fn higher_stubbornness_holds_out_longer() {
        let mut rng = AgentRng::new(9);
        let mut soft = quiet_schedule(100.0);
        let mut hard = quiet_schedule(13_000.0);
        let t = 0.8;
        assert!(hard.willingness(t, &mut rng) > soft.willingness(t, &mut rng));
    }

    #[test]
    fn floor_is_respected_at_deadline() {
        let mut rng = AgentRng::new(9);
        let mut schedule = quiet_schedule(13_000.0).with_floor(0.4);
        assert!(schedule.willingness(1.0, &mut rng) >= 0.4);
    }

    #[test]
    fn time_is_clamped_before_the_curve() {
        let mut rng = AgentRng::new(9);
        let mut schedule = quiet_schedule(10_000.0);
        let at_deadline = schedule.willingness(1.0, &mut rng);
        let past_deadline = schedule.willingness(7.5, &mut rng);
        assert!((at_deadline - past_deadline).abs() < 1e-12);
    }

    #[test]
    fn spike_fires_within_magnitude() {
        let mut rng = AgentRng::new(11);
        let mut spiky = ConcessionSchedule::new(10_000.0, 0.5).with_spike(0.25, 3, &mut rng);
        let mut quiet = ConcessionSchedule::new(10_000.0, 0.5);
        let mut quiet_rng = AgentRng::new(11);
        // Over enough rounds at fixed t, the spiked schedule must exceed the
        // quiet one at least once and never by more than the magnitude.
        let mut fired = false;
        for _ in 0..50 {
            let with_spike = spiky.willingness(0.1, &mut rng);
            let without = quiet.willingness(0.1, &mut quiet_rng);
            let lift = with_spike - without;
            assert!(lift >= -1e-12 && lift < 0.25 + 1e-12);
            if lift > 1e-9 {
                fired = true;
            }
        }
        assert!(fired, "spike never fired in 50 rounds");
    }
}
