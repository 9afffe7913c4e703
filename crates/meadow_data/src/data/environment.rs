use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Season {
    #[default]
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    /// Season for a position in the yearly cycle, `phase` in `[0, 1)`.
    #[must_use]
    pub fn from_phase(phase: f64) -> Season {
        let p = phase.rem_euclid(1.0);
        if p < 0.25 {
            Season::Spring
        } else if p < 0.5 {
            Season::Summer
        } else if p < 0.75 {
            Season::Fall
        } else {
            Season::Winter
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeatherKind {
    Rain,
    Drought,
    HeatWave,
    Frost,
    Storm,
}

impl WeatherKind {
    pub const ALL: [WeatherKind; 5] = [
        WeatherKind::Rain,
        WeatherKind::Drought,
        WeatherKind::HeatWave,
        WeatherKind::Frost,
        WeatherKind::Storm,
    ];

    #[must_use]
    pub fn temperature_offset(&self) -> f32 {
        match self {
            WeatherKind::Rain => -2.0,
            WeatherKind::Drought => 4.0,
            WeatherKind::HeatWave => 10.0,
            WeatherKind::Frost => -12.0,
            WeatherKind::Storm => -4.0,
        }
    }

    #[must_use]
    pub fn humidity_offset(&self) -> f32 {
        match self {
            WeatherKind::Rain => 0.3,
            WeatherKind::Drought => -0.35,
            WeatherKind::HeatWave => -0.15,
            WeatherKind::Frost => 0.0,
            WeatherKind::Storm => 0.2,
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            WeatherKind::Rain => "rain",
            WeatherKind::Drought => "drought",
            WeatherKind::HeatWave => "heat wave",
            WeatherKind::Frost => "frost",
            WeatherKind::Storm => "storm",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherEvent {
    pub kind: WeatherKind,
    pub remaining: u32,
}

/// Global climate, identical for every cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentState {
    /// Degrees Celsius.
    pub temperature: f32,
    /// Relative humidity in `[0, 1]`.
    pub humidity: f32,
    pub season: Season,
    pub weather: Option<WeatherEvent>,
}

impl Default for EnvironmentState {
    fn default() -> Self {
        Self {
            temperature: 18.0,
            humidity: 0.5,
            season: Season::Spring,
            weather: None,
        }
    }
}

impl EnvironmentState {
    #[must_use]
    pub fn is(&self, kind: WeatherKind) -> bool {
        self.weather.is_some_and(|w| w.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_season_quarters() {
        assert_eq!(Season::from_phase(0.1), Season::Spring);
        assert_eq!(Season::from_phase(0.3), Season::Summer);
        assert_eq!(Season::from_phase(0.6), Season::Fall);
        assert_eq!(Season::from_phase(0.9), Season::Winter);
        assert_eq!(Season::from_phase(1.1), Season::Spring);
    }
}
