//! Day/night cycle and weather
//!
//! One clock is advanced once per step, before any entity acts, and is
//! read-only to every turn. Weather only reaches turns through the
//! multipliers below.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::rng::{weighted_pick, RngExt, SimRng};

pub const STEPS_PER_DAY: u64 = 24;

/// Day positions at which the weather is redrawn.
const WEATHER_REDRAW_POSITIONS: [u64; 1] = [0];

/// Daily weather distribution. Must sum to at most 1.0.
pub const WEATHER_TABLE: [(Weather, f64); 4] = [
    (Weather::Sunny, 0.45),
    (Weather::Rainy, 0.30),
    (Weather::Foggy, 0.15),
    (Weather::Stormy, 0.10),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimePhase {
    Night,
    Dawn,
    Day,
    Dusk,
}

impl TimePhase {
    /// Phase for a position within the day.
    pub fn at(day_position: u64) -> Self {
        match day_position % STEPS_PER_DAY {
            0..=4 | 20..=23 => TimePhase::Night,
            5..=6 => TimePhase::Dawn,
            7..=17 => TimePhase::Day,
            _ => TimePhase::Dusk,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimePhase::Night => "Night",
            TimePhase::Dawn => "Dawn",
            TimePhase::Day => "Day",
            TimePhase::Dusk => "Dusk",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weather {
    Sunny,
    Rainy,
    Foggy,
    Stormy,
}

impl Weather {
    pub fn label(self) -> &'static str {
        match self {
            Weather::Sunny => "Sunny",
            Weather::Rainy => "Rainy",
            Weather::Foggy => "Foggy",
            Weather::Stormy => "Storm",
        }
    }

    pub fn plant_growth_factor(self) -> f64 {
        match self {
            Weather::Sunny => 1.0,
            Weather::Rainy => 1.7,
            Weather::Foggy => 0.85,
            Weather::Stormy => 0.3,
        }
    }

    pub fn hunting_success_factor(self) -> f64 {
        match self {
            Weather::Sunny => 1.0,
            Weather::Rainy => 0.65,
            Weather::Foggy => 0.30,
            Weather::Stormy => 0.0,
        }
    }

    pub fn breeding_factor(self) -> f64 {
        match self {
            Weather::Sunny => 1.0,
            Weather::Rainy => 0.8,
            Weather::Foggy => 0.9,
            Weather::Stormy => 0.0,
        }
    }

    /// Animals shelter in place during storms.
    pub fn allows_movement(self) -> bool {
        self != Weather::Stormy
    }
}

/// How weather evolves between draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Forecast {
    /// Redraw from [`WEATHER_TABLE`] at each redraw position.
    #[default]
    Random,
    /// Hold one condition for the whole run.
    Pinned(Weather),
}

#[derive(Debug, Clone)]
pub struct Clock {
    step: u64,
    phase: TimePhase,
    weather: Weather,
    forecast: Forecast,
}

impl Clock {
    pub fn new(start_step: u64, forecast: Forecast) -> Self {
        let weather = match forecast {
            Forecast::Random => Weather::Sunny,
            Forecast::Pinned(weather) => weather,
        };
        Self {
            step: start_step,
            phase: TimePhase::at(start_step),
            weather,
            forecast,
        }
    }

    /// Move forward one step, redrawing the weather at a redraw position.
    pub fn advance(&mut self, rng: &mut SimRng) {
        self.step += 1;
        self.phase = TimePhase::at(self.day_position());
        if WEATHER_REDRAW_POSITIONS.contains(&self.day_position()) {
            if let Forecast::Random = self.forecast {
                self.weather = weighted_pick(&WEATHER_TABLE, rng.unit());
                debug!(step = self.step, weather = %self.weather, "weather redrawn");
            }
        }
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn day(&self) -> u64 {
        self.step / STEPS_PER_DAY
    }

    pub fn day_position(&self) -> u64 {
        self.step % STEPS_PER_DAY
    }

    pub fn phase(&self) -> TimePhase {
        self.phase
    }

    pub fn weather(&self) -> Weather {
        self.weather
    }

    pub fn forecast(&self) -> Forecast {
        self.forecast
    }

    pub fn is_daylight(&self) -> bool {
        self.phase != TimePhase::Night
    }

    pub fn allows_movement(&self) -> bool {
        self.weather.allows_movement()
    }

    pub fn plant_growth_factor(&self) -> f64 {
        self.weather.plant_growth_factor()
    }

    pub fn hunting_success_factor(&self) -> f64 {
        self.weather.hunting_success_factor()
    }

    pub fn breeding_factor(&self) -> f64 {
        self.weather.breeding_factor()
    }

    /// Short status line for a viewer header, e.g. `Day 3  Dusk  Rainy`.
    pub fn display_label(&self) -> String {
        format!("Day {}  {}  {}", self.day(), self.phase, self.weather)
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(0, Forecast::Random)
    }
}

impl fmt::Display for TimePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for Weather {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::seeded;

    #[test]
    fn test_weather_table_sums_to_at_most_one() {
        let total: f64 = WEATHER_TABLE.iter().map(|(_, p)| p).sum();
        assert!(total <= 1.0 + 1e-9, "weather table sums to {total}");
    }

    #[test]
    fn test_phase_cycle_order() {
        let phases: Vec<TimePhase> = (0..STEPS_PER_DAY).map(TimePhase::at).collect();
        assert_eq!(phases.iter().filter(|p| **p == TimePhase::Night).count(), 9);
        assert_eq!(phases.iter().filter(|p| **p == TimePhase::Dawn).count(), 2);
        assert_eq!(phases.iter().filter(|p| **p == TimePhase::Day).count(), 11);
        assert_eq!(phases.iter().filter(|p| **p == TimePhase::Dusk).count(), 2);

        let mut transitions = Vec::new();
        for window in phases.windows(2) {
            if window[0] != window[1] {
                transitions.push((window[0], window[1]));
            }
        }
        assert_eq!(
            transitions,
            vec![
                (TimePhase::Night, TimePhase::Dawn),
                (TimePhase::Dawn, TimePhase::Day),
                (TimePhase::Day, TimePhase::Dusk),
                (TimePhase::Dusk, TimePhase::Night),
            ]
        );
    }

    #[test]
    fn test_advance_increments_step_and_phase() {
        let mut rng = seeded(1);
        let mut clock = Clock::new(6, Forecast::Random);
        assert_eq!(clock.phase(), TimePhase::Dawn);

        clock.advance(&mut rng);
        assert_eq!(clock.step(), 7);
        assert_eq!(clock.phase(), TimePhase::Day);
        assert!(clock.is_daylight());
    }

    #[test]
    fn test_weather_only_changes_at_day_boundary() {
        let mut rng = seeded(21);
        let mut clock = Clock::new(0, Forecast::Random);
        let mut previous = clock.weather();
        for _ in 0..(STEPS_PER_DAY * 30) {
            clock.advance(&mut rng);
            if clock.day_position() != 0 {
                assert_eq!(clock.weather(), previous);
            }
            previous = clock.weather();
        }
    }

    #[test]
    fn test_pinned_weather_never_changes() {
        let mut rng = seeded(2);
        let mut clock = Clock::new(0, Forecast::Pinned(Weather::Stormy));
        for _ in 0..(STEPS_PER_DAY * 5) {
            clock.advance(&mut rng);
            assert_eq!(clock.weather(), Weather::Stormy);
            assert!(!clock.allows_movement());
            assert_eq!(clock.breeding_factor(), 0.0);
        }
    }

    #[test]
    fn test_display_label() {
        let clock = Clock::new(STEPS_PER_DAY * 2 + 19, Forecast::Pinned(Weather::Rainy));
        assert_eq!(clock.display_label(), "Day 2  Dusk  Rainy");
    }
}
