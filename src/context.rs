//! Engine context lifecycle.
//!
//! [`AudioContext`] is the live processing context: the node graph, the
//! destination mixer and the clock. [`EngineContext`] is the handle the
//! session controller holds; it creates the context lazily through an
//! [`AudioHost`], resumes it when suspended, and disposes of it on teardown.

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::dsp::graph::NodeGraph;
use crate::dsp::mixer::Mixer;
use crate::error::{EngineError, Result};
use crate::host::AudioHost;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextState {
    Uninitialized,
    /// The host cannot synthesize audio; every operation is a no-op.
    Unsupported,
    Suspended,
    Running,
    Closed,
}

/// A live audio-processing context. Time only advances while it is running
/// and being rendered.
#[derive(Debug)]
pub struct AudioContext {
    state: ContextState,
    graph: NodeGraph,
    mixer: Mixer,
    sample_rate: f32,
    frames_rendered: u64,
    frames_pulled: u64,
}

impl AudioContext {
    pub fn new(sample_rate: f32, node_limit: usize, master_gain: f64) -> Self {
        AudioContext {
            state: ContextState::Suspended,
            graph: NodeGraph::new(sample_rate as f64, node_limit),
            mixer: Mixer::new(master_gain),
            sample_rate,
            frames_rendered: 0,
            frames_pulled: 0,
        }
    }

    pub fn state(&self) -> ContextState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ContextState::Running
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Seconds of audio rendered so far.
    pub fn current_time(&self) -> f64 {
        self.frames_rendered as f64 / self.sample_rate as f64
    }

    /// Seconds the host has spent pulling blocks, running or not. Layer
    /// timers run on this clock so lifetimes keep counting while suspended.
    pub fn host_time(&self) -> f64 {
        self.frames_pulled as f64 / self.sample_rate as f64
    }

    pub fn graph(&self) -> &NodeGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> Result<&mut NodeGraph> {
        if self.state == ContextState::Closed {
            return Err(EngineError::ContextClosed);
        }
        Ok(&mut self.graph)
    }

    pub fn resume(&mut self) -> Result<()> {
        match self.state {
            ContextState::Closed => Err(EngineError::ContextClosed),
            _ => {
                self.state = ContextState::Running;
                Ok(())
            }
        }
    }

    pub fn suspend(&mut self) -> Result<()> {
        match self.state {
            ContextState::Closed => Err(EngineError::ContextClosed),
            _ => {
                self.state = ContextState::Suspended;
                Ok(())
            }
        }
    }

    /// Close the context. Every node it owned is released.
    pub fn close(&mut self) {
        self.graph.clear();
        self.state = ContextState::Closed;
    }

    /// Render mono output into `out`. A context that is not running writes
    /// silence and its audio clock stands still; host time still moves unless
    /// the context is closed.
    pub fn render(&mut self, out: &mut [f32]) {
        match self.state {
            ContextState::Running => {
                let start = self.current_time();
                let bus = self.mixer.bus(out.len());
                self.graph.render(start, bus);
                self.mixer.write_output(out);
                self.frames_rendered += out.len() as u64;
            }
            ContextState::Closed => {
                out.fill(0.0);
                return;
            }
            _ => out.fill(0.0),
        }
        self.frames_pulled += out.len() as u64;
    }
}

/// The controller's handle on its audio context.
pub struct EngineContext {
    host: Box<dyn AudioHost>,
    config: EngineConfig,
    context: Option<AudioContext>,
    unsupported: bool,
    disposed: bool,
}

impl EngineContext {
    pub fn new(host: Box<dyn AudioHost>, config: EngineConfig) -> Self {
        EngineContext {
            host,
            config,
            context: None,
            unsupported: false,
            disposed: false,
        }
    }

    pub fn state(&self) -> ContextState {
        if self.unsupported {
            return ContextState::Unsupported;
        }
        match &self.context {
            Some(ctx) => ctx.state(),
            None if self.disposed => ContextState::Closed,
            None => ContextState::Uninitialized,
        }
    }

    /// Create the context if needed and try to get it running. Returns the
    /// context when one exists, running or not; failures are logged and
    /// yield `None`.
    pub fn ensure_ready(&mut self) -> Option<&mut AudioContext> {
        if self.unsupported {
            debug!(host = self.host.name(), "synthesis unsupported, skipping");
            return None;
        }

        if self.context.is_none() {
            match self.host.open(&self.config) {
                Ok(ctx) => {
                    info!(
                        host = self.host.name(),
                        sample_rate = ctx.sample_rate(),
                        "audio context created"
                    );
                    self.context = Some(ctx);
                    self.disposed = false;
                }
                Err(e) if e.is_environmental() => {
                    warn!(host = self.host.name(), error = %e, "audio synthesis unavailable");
                    self.unsupported = true;
                    return None;
                }
                Err(e) => {
                    error!(host = self.host.name(), error = %e, "failed to create audio context");
                    return None;
                }
            }
        }

        if let Some(ctx) = self.context.as_mut() {
            if ctx.state() == ContextState::Suspended {
                match self.host.resume(ctx) {
                    Ok(()) => debug!("audio context resumed"),
                    Err(e) => warn!(error = %e, "audio context could not be resumed"),
                }
            }
        }

        self.context.as_mut()
    }

    /// The live context, if one has been created.
    pub fn get(&self) -> Option<&AudioContext> {
        self.context.as_ref()
    }

    pub fn get_mut(&mut self) -> Result<&mut AudioContext> {
        self.context.as_mut().ok_or(EngineError::ContextUnavailable)
    }

    pub fn suspend(&mut self) {
        if let Some(ctx) = self.context.as_mut() {
            if let Err(e) = ctx.suspend() {
                warn!(error = %e, "audio context could not be suspended");
            }
        }
    }

    /// Close and release the context. Safe to call any number of times.
    pub fn dispose(&mut self) {
        match self.context.take() {
            Some(mut ctx) => {
                ctx.close();
                self.disposed = true;
                info!("audio context disposed");
            }
            None => debug!("dispose called with no live context"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{RenderHost, UnsupportedHost};

    fn config() -> EngineConfig {
        EngineConfig {
            sample_rate: 8000.0,
            ..EngineConfig::default()
        }
    }

    /// Opens fine but refuses to resume, like a browser blocking autoplay.
    struct StubbornHost;

    impl AudioHost for StubbornHost {
        fn name(&self) -> &str {
            "stubborn"
        }

        fn open(&mut self, config: &EngineConfig) -> Result<AudioContext> {
            Ok(AudioContext::new(config.sample_rate, config.node_limit, config.master_gain))
        }

        fn resume(&mut self, _context: &mut AudioContext) -> Result<()> {
            Err(EngineError::ResumeFailed {
                reason: "no user gesture".into(),
            })
        }
    }

    #[test]
    fn lazily_created_and_running() {
        let mut engine = EngineContext::new(Box::new(RenderHost::new()), config());
        assert_eq!(engine.state(), ContextState::Uninitialized);
        assert!(engine.get().is_none());
        let ctx = engine.ensure_ready().unwrap();
        assert!(ctx.is_running());
        assert_eq!(engine.state(), ContextState::Running);
    }

    #[test]
    fn suspended_context_is_resumed() {
        let mut engine = EngineContext::new(Box::new(RenderHost::autoplay_blocked()), config());
        assert!(engine.ensure_ready().unwrap().is_running());
        engine.suspend();
        assert_eq!(engine.state(), ContextState::Suspended);
        engine.ensure_ready();
        assert_eq!(engine.state(), ContextState::Running);
    }

    #[test]
    fn resume_failure_is_not_fatal() {
        let mut engine = EngineContext::new(Box::new(StubbornHost), config());
        let ctx = engine.ensure_ready().expect("context exists even if suspended");
        assert_eq!(ctx.state(), ContextState::Suspended);
    }

    #[test]
    fn unsupported_host_degrades() {
        let mut engine = EngineContext::new(Box::new(UnsupportedHost::new("headless")), config());
        assert!(engine.ensure_ready().is_none());
        assert_eq!(engine.state(), ContextState::Unsupported);
        assert!(engine.ensure_ready().is_none());
        engine.suspend();
        engine.dispose();
    }

    #[test]
    fn construction_failure_leaves_no_context() {
        let bad = EngineConfig {
            sample_rate: 10.0,
            ..EngineConfig::default()
        };
        let mut engine = EngineContext::new(Box::new(RenderHost::new()), bad);
        assert!(engine.ensure_ready().is_none());
        assert_eq!(engine.state(), ContextState::Uninitialized);
    }

    #[test]
    fn dispose_twice_is_safe() {
        let mut engine = EngineContext::new(Box::new(RenderHost::new()), config());
        engine.ensure_ready();
        engine.dispose();
        engine.dispose();
        assert!(matches!(engine.get_mut(), Err(EngineError::ContextUnavailable)));
        assert_eq!(engine.state(), ContextState::Closed);
        // A later session gets a fresh context.
        assert!(engine.ensure_ready().is_some());
        assert_eq!(engine.state(), ContextState::Running);
    }

    #[test]
    fn clock_only_moves_while_running() {
        let mut ctx = AudioContext::new(8000.0, 16, 1.0);
        let mut out = vec![1.0_f32; 800];
        ctx.render(&mut out);
        assert_eq!(ctx.current_time(), 0.0);
        assert!((ctx.host_time() - 0.1).abs() < 1e-12);
        assert!(out.iter().all(|&s| s == 0.0));
        ctx.resume().unwrap();
        ctx.render(&mut out);
        assert!((ctx.current_time() - 0.1).abs() < 1e-12);
        ctx.close();
        ctx.render(&mut out);
        assert!((ctx.host_time() - 0.2).abs() < 1e-12);
        assert!(matches!(ctx.graph_mut(), Err(EngineError::ContextClosed)));
        assert!(matches!(ctx.resume(), Err(EngineError::ContextClosed)));
    }
}
