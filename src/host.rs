//! Audio hosts: the environments a context can be opened in.

use crate::config::{EngineConfig, MAX_SAMPLE_RATE, MIN_SAMPLE_RATE};
use crate::context::AudioContext;
use crate::error::{EngineError, Result};

/// An environment that may or may not offer real-time synthesis.
pub trait AudioHost {
    fn name(&self) -> &str;

    /// Construct a context. Hosts without synthesis return
    /// [`EngineError::Unsupported`].
    fn open(&mut self, config: &EngineConfig) -> Result<AudioContext>;

    fn resume(&mut self, context: &mut AudioContext) -> Result<()> {
        context.resume()
    }
}

/// Pull-based host: the embedder drives the clock by rendering blocks, as an
/// AudioWorklet or an offline bounce does.
#[derive(Debug, Clone, Default)]
pub struct RenderHost {
    start_suspended: bool,
}

impl RenderHost {
    /// Contexts start running.
    pub fn new() -> Self {
        RenderHost {
            start_suspended: false,
        }
    }

    /// Contexts start suspended and must be resumed before they make sound.
    pub fn autoplay_blocked() -> Self {
        RenderHost {
            start_suspended: true,
        }
    }
}

impl AudioHost for RenderHost {
    fn name(&self) -> &str {
        "render"
    }

    fn open(&mut self, config: &EngineConfig) -> Result<AudioContext> {
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&config.sample_rate) {
            return Err(EngineError::InvalidSampleRate(config.sample_rate));
        }
        let mut ctx = AudioContext::new(config.sample_rate, config.node_limit, config.master_gain);
        if !self.start_suspended {
            ctx.resume()?;
        }
        Ok(ctx)
    }
}

/// An environment with no synthesis support at all.
#[derive(Debug, Clone)]
pub struct UnsupportedHost {
    name: String,
}

impl UnsupportedHost {
    pub fn new(name: impl Into<String>) -> Self {
        UnsupportedHost { name: name.into() }
    }
}

impl AudioHost for UnsupportedHost {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&mut self, _config: &EngineConfig) -> Result<AudioContext> {
        Err(EngineError::Unsupported {
            host: self.name.clone(),
        })
    }
}
