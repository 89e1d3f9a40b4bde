//! Frequency catalog: maps a session id to its healing tone.
//!
//! The builtin catalog covers the Solfeggio scale and the classic
//! brainwave-entrainment bands. Lookups never fail: unknown ids resolve to
//! the alpha-band default and are flagged so the caller can log it.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::dsp::oscillator::Waveform;
use crate::error::{EngineError, Result};

/// Frequency used for unknown session ids (alpha band).
pub const DEFAULT_FREQUENCY: f64 = 10.0;
pub const DEFAULT_DISPLAY_NAME: &str = "Alpha Waves";

/// (session id, base frequency in Hz, display name)
const BUILTIN_PRESETS: &[(&str, f64, &str)] = &[
    ("174hz-foundation", 174.0, "174 Hz Foundation"),
    ("285hz-restoration", 285.0, "285 Hz Restoration"),
    ("396hz-liberation", 396.0, "396 Hz Liberation"),
    ("417hz-change", 417.0, "417 Hz Change"),
    ("432hz-harmony", 432.0, "432 Hz Harmony"),
    ("528hz-love", 528.0, "528 Hz Love"),
    ("639hz-connection", 639.0, "639 Hz Connection"),
    ("741hz-awakening", 741.0, "741 Hz Awakening"),
    ("852hz-intuition", 852.0, "852 Hz Intuition"),
    ("963hz-unity", 963.0, "963 Hz Unity"),
    ("delta-sleep", 2.0, "Delta Sleep"),
    ("theta-meditation", 6.0, "Theta Meditation"),
    ("alpha-calm", 10.0, "Alpha Calm"),
    ("beta-focus", 18.0, "Beta Focus"),
    ("gamma-clarity", 40.0, "Gamma Clarity"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrequencyPreset {
    pub session_id: String,
    pub base_frequency: f64,
    #[serde(default)]
    pub wave_shape: Waveform,
    pub display_name: String,
}

/// Result of a catalog lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPreset {
    pub frequency: f64,
    pub wave_shape: Waveform,
    pub display_name: String,
    /// The id was unknown and the default was substituted.
    pub is_fallback: bool,
}

#[derive(Debug, Clone)]
pub struct FrequencyCatalog {
    presets: Vec<FrequencyPreset>,
}

impl FrequencyCatalog {
    pub fn builtin() -> Self {
        FrequencyCatalog {
            presets: BUILTIN_PRESETS
                .iter()
                .map(|&(id, frequency, name)| FrequencyPreset {
                    session_id: id.to_string(),
                    base_frequency: frequency,
                    wave_shape: Waveform::Sine,
                    display_name: name.to_string(),
                })
                .collect(),
        }
    }

    /// Load a custom catalog from a JSON array of presets.
    pub fn from_json(json: &str) -> Result<Self> {
        let presets: Vec<FrequencyPreset> = serde_json::from_str(json)?;
        let mut seen = HashSet::new();
        for preset in &presets {
            if !seen.insert(preset.session_id.as_str()) {
                return Err(EngineError::Config(format!(
                    "duplicate session id '{}'",
                    preset.session_id
                )));
            }
            if !(preset.base_frequency.is_finite() && preset.base_frequency > 0.0) {
                return Err(EngineError::Config(format!(
                    "session '{}' has non-positive frequency {}",
                    preset.session_id, preset.base_frequency
                )));
            }
        }
        Ok(FrequencyCatalog { presets })
    }

    pub fn get(&self, session_id: &str) -> Option<&FrequencyPreset> {
        self.presets.iter().find(|p| p.session_id == session_id)
    }

    pub fn resolve(&self, session_id: &str) -> ResolvedPreset {
        match self.get(session_id) {
            Some(p) => ResolvedPreset {
                frequency: p.base_frequency,
                wave_shape: p.wave_shape,
                display_name: p.display_name.clone(),
                is_fallback: false,
            },
            None => ResolvedPreset {
                frequency: DEFAULT_FREQUENCY,
                wave_shape: Waveform::Sine,
                display_name: DEFAULT_DISPLAY_NAME.to_string(),
                is_fallback: true,
            },
        }
    }

    pub fn presets(&self) -> &[FrequencyPreset] {
        &self.presets
    }
}

impl Default for FrequencyCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
