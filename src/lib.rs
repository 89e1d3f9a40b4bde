pub mod catalog;
pub mod config;
pub mod context;
pub mod dsp;
pub mod error;
pub mod host;
pub mod layers;
pub mod scheduler;
pub mod session;

pub use crate::catalog::{FrequencyCatalog, FrequencyPreset};
pub use crate::config::EngineConfig;
pub use crate::context::ContextState;
pub use crate::error::{EngineError, Result};
pub use crate::host::{AudioHost, RenderHost, UnsupportedHost};
pub use crate::layers::{LayerId, Modulation};
pub use crate::session::{LayerMetadata, PlaybackState, SessionController};

use tracing::warn;
use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the soundscape-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// WASM-exposed soundscape engine. The page's AudioWorklet pulls audio
/// through `render`; UI controls call the session operations.
#[wasm_bindgen]
pub struct WebSoundscape {
    inner: SessionController,
}

#[wasm_bindgen]
impl WebSoundscape {
    #[wasm_bindgen(constructor)]
    pub fn new(sample_rate: f32) -> WebSoundscape {
        let config = EngineConfig {
            sample_rate,
            ..EngineConfig::default()
        };
        WebSoundscape {
            inner: SessionController::with_config(RenderHost::new(), config),
        }
    }

    /// Build an engine from a JSON `EngineConfig`.
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(json: &str) -> std::result::Result<WebSoundscape, JsValue> {
        let config = EngineConfig::from_json(json).map_err(|e| JsValue::from_str(&format!("{e}")))?;
        Ok(WebSoundscape {
            inner: SessionController::with_config(RenderHost::new(), config),
        })
    }

    #[wasm_bindgen(js_name = startSession)]
    pub fn start_session(&mut self, session_id: &str) {
        self.inner.start_session(session_id);
    }

    #[wasm_bindgen(js_name = stopMusic)]
    pub fn stop_music(&mut self) {
        self.inner.stop_music();
    }

    #[wasm_bindgen(js_name = setIntensity)]
    pub fn set_intensity(&mut self, value: f64) {
        self.inner.set_intensity(value);
    }

    #[wasm_bindgen(js_name = addHealingLayer)]
    pub fn add_healing_layer(&mut self) {
        self.inner.add_healing_layer();
    }

    #[wasm_bindgen(js_name = removeLayer)]
    pub fn remove_layer(&mut self, layer_id: &str) {
        match layer_id.parse::<LayerId>() {
            Ok(id) => self.inner.remove_layer(&id),
            Err(e) => warn!(layer_id, error = %e, "ignoring malformed layer id"),
        }
    }

    /// Resume audio after a user gesture.
    pub fn resume(&mut self) {
        self.inner.resume();
    }

    pub fn suspend(&mut self) {
        self.inner.suspend();
    }

    /// Render `frames` mono samples for the AudioWorklet.
    pub fn render(&mut self, frames: usize) -> Vec<f32> {
        let mut out = vec![0.0_f32; frames];
        self.inner.render(&mut out);
        out
    }

    #[wasm_bindgen(js_name = isPlaying)]
    pub fn is_playing(&self) -> bool {
        self.inner.is_playing()
    }

    pub fn intensity(&self) -> f64 {
        self.inner.intensity()
    }

    /// Snapshot of the playback state as a plain JS object.
    #[wasm_bindgen(js_name = playbackState)]
    pub fn playback_state(&self) -> std::result::Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner.playback_state())
            .map_err(|e| JsValue::from_str(&format!("{e}")))
    }

    /// The builtin frequency catalog as a JS array.
    pub fn presets(&self) -> std::result::Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.inner.catalog().presets())
            .map_err(|e| JsValue::from_str(&format!("{e}")))
    }

    pub fn shutdown(&mut self) {
        self.inner.shutdown();
    }
}
