//! Session controller: the public face of the engine.
//!
//! Holds only layer *metadata*; every node lives behind the layer manager.
//! All operations return immediately and never fail: fades and teardown play
//! out while the host keeps pulling audio through [`SessionController::render`].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalog::FrequencyCatalog;
use crate::config::EngineConfig;
use crate::context::{ContextState, EngineContext};
use crate::dsp::oscillator::Waveform;
use crate::host::AudioHost;
use crate::layers::{LayerEvent, LayerId, LayerManager, LayerSpec, Modulation};

/// Frames rendered between timer checks.
pub const RENDER_QUANTUM: usize = 128;

/// Presentation copy of a layer for the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerMetadata {
    pub id: LayerId,
    pub frequency: f64,
    pub volume: f64,
    pub wave_shape: Waveform,
    pub modulation: Option<Modulation>,
}

impl LayerMetadata {
    fn new(id: LayerId, spec: &LayerSpec) -> Self {
        LayerMetadata {
            id,
            frequency: spec.frequency,
            volume: spec.volume,
            wave_shape: spec.wave_shape,
            modulation: spec.modulation,
        }
    }
}

/// Snapshot of everything the UI displays.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    pub is_playing: bool,
    pub current_session_id: Option<String>,
    pub intensity: f64,
    pub current_layers: Vec<LayerMetadata>,
    pub context_state: ContextState,
}

#[derive(Debug, Clone)]
struct ActiveSession {
    id: String,
    base_frequency: f64,
}

pub struct SessionController {
    config: EngineConfig,
    context: EngineContext,
    layers: LayerManager,
    catalog: FrequencyCatalog,
    rng: StdRng,
    session: Option<ActiveSession>,
    intensity: f64,
    current_layers: Vec<LayerMetadata>,
}

impl SessionController {
    pub fn new(host: impl AudioHost + 'static) -> Self {
        Self::with_config(host, EngineConfig::default())
    }

    pub fn with_config(host: impl AudioHost + 'static, config: EngineConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        SessionController {
            context: EngineContext::new(Box::new(host), config.clone()),
            layers: LayerManager::new(&config),
            catalog: FrequencyCatalog::builtin(),
            rng,
            session: None,
            intensity: config.default_intensity.clamp(0.0, 1.0),
            current_layers: Vec::new(),
            config,
        }
    }

    /// Replace the builtin frequency catalog.
    pub fn with_catalog(mut self, catalog: FrequencyCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Start a session, replacing any session already playing.
    pub fn start_session(&mut self, session_id: &str) {
        if self.session.is_some() {
            debug!(session_id, "replacing running session");
            self.stop_music();
        }

        let Some(ctx) = self.context.ensure_ready() else {
            warn!(session_id, "audio engine unavailable, session not started");
            return;
        };

        let preset = self.catalog.resolve(session_id);
        if preset.is_fallback {
            warn!(
                session_id,
                frequency = preset.frequency,
                "unknown session id, using default frequency"
            );
        }

        let spec = LayerSpec::from_profile(
            &self.config.session_layer,
            preset.frequency,
            preset.wave_shape,
        );
        let Some(id) = self.layers.create_layer(ctx, spec.clone(), self.intensity) else {
            warn!(session_id, "session layer did not start");
            return;
        };

        info!(
            session_id,
            name = %preset.display_name,
            frequency = preset.frequency,
            "session started"
        );
        self.session = Some(ActiveSession {
            id: session_id.to_string(),
            base_frequency: preset.frequency,
        });
        self.current_layers = vec![LayerMetadata::new(id, &spec)];
    }

    /// Stop the session. State flips at once; the audio fades out and layer
    /// metadata is pruned as each layer finishes its fade. A context that is
    /// not running has nothing to fade, so its layers go immediately.
    pub fn stop_music(&mut self) {
        if let Some(session) = self.session.take() {
            info!(session_id = %session.id, "session stopped");
        }
        match self.context.get_mut() {
            Ok(ctx) => {
                let events = self.layers.stop_all(ctx);
                prune_layers(&mut self.current_layers, &events);
            }
            Err(e) => {
                debug!(error = %e, "dropping layers without a context");
                self.layers.discard_all();
                self.current_layers.clear();
            }
        }
    }

    /// Set intensity, clamped to [0, 1], and ramp every playing layer to it.
    pub fn set_intensity(&mut self, value: f64) {
        if value.is_nan() {
            warn!("ignoring NaN intensity");
            return;
        }
        let clamped = value.clamp(0.0, 1.0);
        if clamped != value {
            debug!(requested = value, clamped, "intensity clamped");
        }
        self.intensity = clamped;
        debug!(intensity = clamped, "intensity set");
        if let Ok(ctx) = self.context.get_mut() {
            self.layers.rescale_all(ctx, clamped);
        }
    }

    /// Add a transient layer one octave above or below the session tone.
    pub fn add_healing_layer(&mut self) {
        let Some(session) = &self.session else {
            debug!("no active session, healing layer not added");
            return;
        };
        let factor = if self.rng.gen_bool(0.5) { 0.5 } else { 2.0 };
        let frequency = session.base_frequency * factor;

        let ctx = match self.context.get_mut() {
            Ok(ctx) => ctx,
            Err(e) => {
                warn!(session_id = %session.id, error = %e, "healing layer not added");
                return;
            }
        };
        let spec = LayerSpec::from_profile(&self.config.healing_layer, frequency, Waveform::Sine);
        match self.layers.create_layer(ctx, spec.clone(), self.intensity) {
            Some(id) => {
                debug!(session_id = %session.id, layer_id = %id, frequency, "healing layer added");
                self.current_layers.push(LayerMetadata::new(id, &spec));
            }
            None => warn!(session_id = %session.id, "healing layer did not start"),
        }
    }

    pub fn remove_layer(&mut self, id: &LayerId) {
        if let Ok(ctx) = self.context.get_mut() {
            self.layers.remove_layer(ctx, id);
        }
        self.current_layers.retain(|l| l.id != *id);
    }

    /// Render mono audio into `out`, firing layer timers as the clock moves.
    pub fn render(&mut self, out: &mut [f32]) {
        let Ok(ctx) = self.context.get_mut() else {
            out.fill(0.0);
            return;
        };
        for block in out.chunks_mut(RENDER_QUANTUM) {
            ctx.render(block);
            let events = self.layers.poll(ctx);
            prune_layers(&mut self.current_layers, &events);
        }
    }

    /// Render and discard `seconds` of audio.
    pub fn advance(&mut self, seconds: f64) {
        if !seconds.is_finite() {
            warn!(seconds, "ignoring non-finite advance");
            return;
        }
        let Some(ctx) = self.context.get() else {
            return;
        };
        let mut remaining = (seconds.max(0.0) * ctx.sample_rate() as f64).round() as usize;
        let mut scratch = [0.0_f32; RENDER_QUANTUM];
        while remaining > 0 {
            let n = remaining.min(RENDER_QUANTUM);
            self.render(&mut scratch[..n]);
            remaining -= n;
        }
    }

    pub fn suspend(&mut self) {
        self.context.suspend();
    }

    /// Resume (or create) the audio context, e.g. after a user gesture.
    pub fn resume(&mut self) {
        self.context.ensure_ready();
    }

    /// Tear everything down: stop, drop all layers and dispose the context.
    pub fn shutdown(&mut self) {
        self.session = None;
        self.layers.discard_all();
        self.current_layers.clear();
        self.context.dispose();
    }

    pub fn is_playing(&self) -> bool {
        self.session.is_some()
    }

    pub fn current_session_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.id.as_str())
    }

    pub fn intensity(&self) -> f64 {
        self.intensity
    }

    pub fn current_layers(&self) -> &[LayerMetadata] {
        &self.current_layers
    }

    pub fn context_state(&self) -> ContextState {
        self.context.state()
    }

    /// Layers still holding audio nodes, including ones fading out.
    pub fn active_layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Live audio nodes in the context.
    pub fn node_count(&self) -> usize {
        self.context.get().map_or(0, |ctx| ctx.graph().len())
    }

    /// Current output gain of a layer, if it is still sounding or fading.
    pub fn layer_gain(&self, id: &LayerId) -> Option<f64> {
        self.layers.gain_of(self.context.get()?, id)
    }

    pub fn current_time(&self) -> f64 {
        self.context.get().map_or(0.0, |ctx| ctx.current_time())
    }

    pub fn sample_rate(&self) -> f32 {
        self.context
            .get()
            .map_or(self.config.sample_rate, |ctx| ctx.sample_rate())
    }

    pub fn catalog(&self) -> &FrequencyCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn playback_state(&self) -> PlaybackState {
        PlaybackState {
            is_playing: self.is_playing(),
            current_session_id: self.current_session_id().map(str::to_string),
            intensity: self.intensity,
            current_layers: self.current_layers.clone(),
            context_state: self.context_state(),
        }
    }
}

fn prune_layers(layers: &mut Vec<LayerMetadata>, events: &[LayerEvent]) {
    for event in events {
        let (LayerEvent::Expired(id) | LayerEvent::Released(id)) = event;
        layers.retain(|l| l.id != *id);
    }
}
