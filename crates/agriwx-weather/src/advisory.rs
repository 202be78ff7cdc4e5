//! Agronomic advisory rules.
//!
//! Six fixed rules, each checked independently and in order. Rules 1-4 and 6
//! fire zero or one time; the six-hour rain outlook always fires exactly once.

use serde::{Deserialize, Serialize};

use crate::types::{CurrentConditions, ForecastSample};

const RAIN_RISK_POP_PCT: u8 = 60;
const HOT_TEMP_C: f64 = 35.0;
const WARM_TEMP_C: f64 = 30.0;
const HIGH_WIND_KMH: f64 = 15.0;
const CALM_WIND_KMH: f64 = 10.0;
const SPRAY_MAX_POP_PCT: u8 = 20;
const FUNGAL_HUMIDITY_PCT: u8 = 80;
const OUTLOOK_RAIN_POP_PCT: u8 = 30;
const COLD_TEMP_C: f64 = 5.0;

/// One advisory, produced by a single rule branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Advisory {
    HighRainProbability,
    HighTemperature,
    WarmConditions,
    HighWind,
    GoodSprayingWindow,
    FungalRisk,
    SafeToIrrigate,
    PostponeIrrigation,
    ColdDamageRisk,
}

impl Advisory {
    /// Text shown to growers
    pub fn text(&self) -> &'static str {
        match self {
            Self::HighRainProbability => {
                "High rain probability (>60%) — avoid irrigation and pesticide spraying today."
            }
            Self::HighTemperature => {
                "High temperature (>35°C) — increase irrigation frequency for heat-sensitive crops."
            }
            Self::WarmConditions => {
                "Warm conditions (30–35°C) — monitor soil moisture; adjust irrigation if needed."
            }
            Self::HighWind => "High wind (>15 km/h) — do NOT spray pesticides due to drift risk.",
            Self::GoodSprayingWindow => {
                "Good spraying window: wind <10 km/h and low short-term rain risk."
            }
            Self::FungalRisk => {
                "High humidity (>80%) — possible fungal infection risk; monitor and consider prophylactic measures."
            }
            Self::SafeToIrrigate => "No rain expected in next 6 hours — safe to irrigate if needed.",
            Self::PostponeIrrigation => {
                "Rain expected within next 6 hours — postpone irrigation if possible."
            }
            Self::ColdDamageRisk => "Low temperature (≤5°C) — risk of cold damage for sensitive crops.",
        }
    }
}

impl std::fmt::Display for Advisory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.text())
    }
}

/// Run every rule against the current conditions and upcoming buckets.
pub fn evaluate_rules(current: &CurrentConditions, upcoming: &[ForecastSample]) -> Vec<Advisory> {
    let mut advisories = Vec::new();
    let pop = current.precipitation_probability_pct;

    // 1. Rain risk now
    if pop.is_some_and(|p| p > RAIN_RISK_POP_PCT) {
        advisories.push(Advisory::HighRainProbability);
    }

    // 2. Heat
    if current.temperature_c >= HOT_TEMP_C {
        advisories.push(Advisory::HighTemperature);
    } else if current.temperature_c >= WARM_TEMP_C {
        advisories.push(Advisory::WarmConditions);
    }

    // 3. Wind
    if current.wind_kmh > HIGH_WIND_KMH {
        advisories.push(Advisory::HighWind);
    } else if current.wind_kmh < CALM_WIND_KMH && pop.map_or(true, |p| p < SPRAY_MAX_POP_PCT) {
        advisories.push(Advisory::GoodSprayingWindow);
    }

    // 4. Humidity
    if current.humidity_pct >= FUNGAL_HUMIDITY_PCT {
        advisories.push(Advisory::FungalRisk);
    }

    // 5. Six-hour rain outlook
    if rain_expected(upcoming) {
        advisories.push(Advisory::PostponeIrrigation);
    } else {
        advisories.push(Advisory::SafeToIrrigate);
    }

    // 6. Cold
    if current.temperature_c <= COLD_TEMP_C {
        advisories.push(Advisory::ColdDamageRisk);
    }

    advisories
}

/// Advisory texts in rule order.
pub fn derive_advisories(current: &CurrentConditions, upcoming: &[ForecastSample]) -> Vec<String> {
    evaluate_rules(current, upcoming)
        .into_iter()
        .map(|a| a.text().to_string())
        .collect()
}

fn rain_expected(upcoming: &[ForecastSample]) -> bool {
    upcoming.iter().any(|s| {
        s.precipitation_probability_pct > OUTLOOK_RAIN_POP_PCT
            || s.rain_volume_mm.is_some_and(|mm| mm > 0.0)
    })
}
