//! WMO weather code classification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Weather categories mapped from WMO codes.
/// See: https://open-meteo.com/en/docs#weathervariables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCategory {
    ClearSky,
    MainlyClear,
    PartlyCloudy,
    Overcast,
    Fog,
    LightDrizzle,
    Drizzle,
    HeavyDrizzle,
    FreezingDrizzle,
    LightRain,
    Rain,
    HeavyRain,
    FreezingRain,
    LightSnow,
    Snow,
    HeavySnow,
    SnowGrains,
    LightRainShowers,
    RainShowers,
    HeavyRainShowers,
    SnowShowers,
    Thunderstorm,
    ThunderstormWithHail,
    Unknown,
}

impl WeatherCategory {
    pub const ALL: [WeatherCategory; 24] = [
        Self::ClearSky,
        Self::MainlyClear,
        Self::PartlyCloudy,
        Self::Overcast,
        Self::Fog,
        Self::LightDrizzle,
        Self::Drizzle,
        Self::HeavyDrizzle,
        Self::FreezingDrizzle,
        Self::LightRain,
        Self::Rain,
        Self::HeavyRain,
        Self::FreezingRain,
        Self::LightSnow,
        Self::Snow,
        Self::HeavySnow,
        Self::SnowGrains,
        Self::LightRainShowers,
        Self::RainShowers,
        Self::HeavyRainShowers,
        Self::SnowShowers,
        Self::Thunderstorm,
        Self::ThunderstormWithHail,
        Self::Unknown,
    ];

    /// Convert a WMO weather code. Total: anything off the table is `Unknown`.
    pub fn from_wmo_code(code: i64) -> Self {
        match code {
            0 => Self::ClearSky,
            1 => Self::MainlyClear,
            2 => Self::PartlyCloudy,
            3 => Self::Overcast,
            45 | 48 => Self::Fog,
            51 => Self::LightDrizzle,
            53 => Self::Drizzle,
            55 => Self::HeavyDrizzle,
            56 | 57 => Self::FreezingDrizzle,
            61 => Self::LightRain,
            63 => Self::Rain,
            65 => Self::HeavyRain,
            66 | 67 => Self::FreezingRain,
            71 => Self::LightSnow,
            73 => Self::Snow,
            75 => Self::HeavySnow,
            77 => Self::SnowGrains,
            80 => Self::LightRainShowers,
            81 => Self::RainShowers,
            82 => Self::HeavyRainShowers,
            85 | 86 => Self::SnowShowers,
            95 => Self::Thunderstorm,
            96 | 99 => Self::ThunderstormWithHail,
            _ => Self::Unknown,
        }
    }

    /// Classify an aggregated (floating point) code, rounding half to even first.
    /// Missing or non-finite values are `Unknown`.
    pub fn from_code_value(value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_finite() => Self::from_wmo_code(v.round_ties_even() as i64),
            _ => Self::Unknown,
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Self::ClearSky => "Clear sky",
            Self::MainlyClear => "Mainly clear",
            Self::PartlyCloudy => "Partly cloudy",
            Self::Overcast => "Overcast",
            Self::Fog => "Fog",
            Self::LightDrizzle => "Light Drizzle",
            Self::Drizzle => "Drizzle",
            Self::HeavyDrizzle => "Heavy Drizzle",
            Self::FreezingDrizzle => "Freezing Drizzle",
            Self::LightRain => "Light Rain",
            Self::Rain => "Rain",
            Self::HeavyRain => "Heavy Rain",
            Self::FreezingRain => "Freezing Rain",
            Self::LightSnow => "Light Snow",
            Self::Snow => "Snow",
            Self::HeavySnow => "Heavy Snow",
            Self::SnowGrains => "Snow Grains",
            Self::LightRainShowers => "Light Rain Showers",
            Self::RainShowers => "Rain Showers",
            Self::HeavyRainShowers => "Heavy Rain Showers",
            Self::SnowShowers => "Snow Showers",
            Self::Thunderstorm => "Thunderstorm",
            Self::ThunderstormWithHail => "Thunderstorm with Hail",
            Self::Unknown => "unknown",
        }
    }

    /// Reverse of [`label`](Self::label); exact match
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.label() == label)
    }

    /// Drizzle and rain tiers counted as a rainy day in the historical data
    pub fn is_rain(&self) -> bool {
        matches!(
            self,
            Self::LightDrizzle
                | Self::Drizzle
                | Self::HeavyDrizzle
                | Self::LightRain
                | Self::Rain
                | Self::HeavyRain
        )
    }
}

impl fmt::Display for WeatherCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
