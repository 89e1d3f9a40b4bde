//! Engine configuration.
//!
//! Every timing and level the engine uses is a field here. The defaults are
//! the values the soundscapes were tuned with; hosts may load overrides from
//! JSON.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::layers::Modulation;

/// Lowest and highest sample rates a context accepts, in Hz.
pub const MIN_SAMPLE_RATE: f32 = 3000.0;
pub const MAX_SAMPLE_RATE: f32 = 768_000.0;

/// Shape of one kind of layer: how loud, how it wobbles, how long it lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerProfile {
    /// Base gain before intensity scaling, in [0, 1].
    pub volume: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modulation: Option<Modulation>,
    /// Seconds until the layer fades out on its own.
    pub lifetime_secs: f64,
}

impl LayerProfile {
    /// The layer started by a session.
    pub fn session() -> Self {
        LayerProfile {
            volume: 0.2,
            modulation: Some(Modulation {
                rate: 0.1,
                depth: 0.5,
            }),
            lifetime_secs: 120.0,
        }
    }

    /// Octave layers added on top of a running session.
    pub fn healing() -> Self {
        LayerProfile {
            volume: 0.1,
            modulation: Some(Modulation {
                rate: 0.1,
                depth: 0.3,
            }),
            lifetime_secs: 60.0,
        }
    }

    fn validate(&self, which: &str) -> Result<()> {
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(EngineError::Config(format!(
                "{which} volume {} is outside [0, 1]",
                self.volume
            )));
        }
        if !(self.lifetime_secs.is_finite() && self.lifetime_secs > 0.0) {
            return Err(EngineError::Config(format!(
                "{which} lifetime must be positive, got {}",
                self.lifetime_secs
            )));
        }
        if let Some(m) = &self.modulation {
            if !(m.rate.is_finite() && m.rate > 0.0) {
                return Err(EngineError::Config(format!(
                    "{which} modulation rate must be positive, got {}",
                    m.rate
                )));
            }
            if !(m.depth.is_finite() && m.depth >= 0.0) {
                return Err(EngineError::Config(format!(
                    "{which} modulation depth must be non-negative, got {}",
                    m.depth
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Sample rate the context is opened at.
    pub sample_rate: f32,
    /// Gain applied to the destination bus before soft clipping.
    pub master_gain: f64,
    /// Upper bound on live nodes in one context.
    pub node_limit: usize,
    /// Fade-in from silence when a layer starts.
    pub attack_secs: f64,
    /// Fade-out when a layer is removed, expires, or the session stops.
    pub release_secs: f64,
    /// Ramp used when intensity changes.
    pub rescale_secs: f64,
    /// Intensity before the listener touches it.
    pub default_intensity: f64,
    pub session_layer: LayerProfile,
    pub healing_layer: LayerProfile,
    /// Fixes the octave choices and layer ids for reproducible renders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            master_gain: 1.0,
            node_limit: 256,
            attack_secs: 2.0,
            release_secs: 1.0,
            rescale_secs: 0.5,
            default_intensity: 0.5,
            session_layer: LayerProfile::session(),
            healing_layer: LayerProfile::healing(),
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Parse a (possibly partial) JSON config; missing fields keep their
    /// defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&self.sample_rate) {
            return Err(EngineError::InvalidSampleRate(self.sample_rate));
        }
        if !(self.master_gain.is_finite() && self.master_gain >= 0.0) {
            return Err(EngineError::Config(format!(
                "master gain must be non-negative, got {}",
                self.master_gain
            )));
        }
        // One modulated layer needs four nodes.
        if self.node_limit < 4 {
            return Err(EngineError::Config(format!(
                "node limit {} cannot hold a single layer",
                self.node_limit
            )));
        }
        for (name, secs) in [
            ("attack", self.attack_secs),
            ("release", self.release_secs),
            ("rescale", self.rescale_secs),
        ] {
            if !(secs.is_finite() && secs >= 0.0) {
                return Err(EngineError::Config(format!(
                    "{name} time must be non-negative, got {secs}"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.default_intensity) {
            return Err(EngineError::Config(format!(
                "default intensity {} is outside [0, 1]",
                self.default_intensity
            )));
        }
        self.session_layer.validate("session layer")?;
        self.healing_layer.validate("healing layer")?;
        Ok(())
    }
}
