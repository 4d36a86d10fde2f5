use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse weather classification used to drive ambient presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherCategory {
    Clear,
    Rain,
    Cloudy,
    Smoke,
    Snow,
    #[default]
    Default,
}

impl WeatherCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherCategory::Clear => "clear",
            WeatherCategory::Rain => "rain",
            WeatherCategory::Cloudy => "cloudy",
            WeatherCategory::Smoke => "smoke",
            WeatherCategory::Snow => "snow",
            WeatherCategory::Default => "default",
        }
    }

    /// Parse one of the six lowercase wire names; anything else is `None`
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "clear" => Some(WeatherCategory::Clear),
            "rain" => Some(WeatherCategory::Rain),
            "cloudy" => Some(WeatherCategory::Cloudy),
            "smoke" => Some(WeatherCategory::Smoke),
            "snow" => Some(WeatherCategory::Snow),
            "default" => Some(WeatherCategory::Default),
            _ => None,
        }
    }

    /// Interpret the backend's `weather_type`; missing or unknown values become `Default`
    pub fn from_wire(value: Option<&str>) -> Self {
        value.and_then(Self::from_str).unwrap_or_default()
    }

    pub fn all() -> Vec<WeatherCategory> {
        vec![
            WeatherCategory::Clear,
            WeatherCategory::Rain,
            WeatherCategory::Cloudy,
            WeatherCategory::Smoke,
            WeatherCategory::Snow,
            WeatherCategory::Default,
        ]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            WeatherCategory::Clear => "Clear",
            WeatherCategory::Rain => "Rain",
            WeatherCategory::Cloudy => "Cloudy",
            WeatherCategory::Smoke => "Smoke / Haze",
            WeatherCategory::Snow => "Snow",
            WeatherCategory::Default => "Weather",
        }
    }
}

impl fmt::Display for WeatherCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks the category of the latest successful exchange.
///
/// Only the session mutates it, at settlement time.
#[derive(Debug, Default)]
pub struct CategoryProjector {
    current: WeatherCategory,
}

impl CategoryProjector {
    pub fn current(&self) -> WeatherCategory {
        self.current
    }

    pub(crate) fn project(&mut self, category: WeatherCategory) {
        self.current = category;
    }

    pub(crate) fn reset(&mut self) {
        self.current = WeatherCategory::Default;
    }
}
