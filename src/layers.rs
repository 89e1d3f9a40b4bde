//! Layer manager: owns every layer's audio nodes.
//!
//! A layer is a carrier oscillator feeding a gain node into the destination,
//! optionally with an LFO (oscillator → depth gain) added onto the carrier's
//! frequency. Each layer fades in when created, lives for a fixed time, then
//! fades out and is torn down. All node mutation in the engine happens here.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::{EngineConfig, LayerProfile};
use crate::context::AudioContext;
use crate::dsp::graph::{Connection, NodeGraph, NodeId};
use crate::dsp::oscillator::Waveform;
use crate::error::{EngineError, Result};
use crate::scheduler::{Scheduler, TimerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(Uuid);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for LayerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s).map(LayerId)
    }
}

/// Low-frequency modulation of a carrier's frequency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Modulation {
    /// LFO rate in Hz.
    pub rate: f64,
    /// Peak frequency deviation in Hz.
    pub depth: f64,
}

/// Everything needed to build a layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSpec {
    pub frequency: f64,
    /// Gain before intensity scaling, in [0, 1].
    pub volume: f64,
    pub wave_shape: Waveform,
    pub modulation: Option<Modulation>,
    /// Seconds before the layer expires on its own.
    pub lifetime: f64,
}

impl LayerSpec {
    pub fn from_profile(profile: &LayerProfile, frequency: f64, wave_shape: Waveform) -> Self {
        LayerSpec {
            frequency,
            volume: profile.volume,
            wave_shape,
            modulation: profile.modulation,
            lifetime: profile.lifetime_secs,
        }
    }
}

/// Something the manager did on its own while time passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerEvent {
    /// The lifetime ran out; the layer has started fading.
    Expired(LayerId),
    /// The layer's nodes are gone.
    Released(LayerId),
}

#[derive(Debug, Clone, Copy)]
enum LayerTask {
    Expire(LayerId),
    Teardown(LayerId),
}

#[derive(Debug, Clone, Copy)]
struct LayerNodes {
    carrier: NodeId,
    gain: NodeId,
    lfo: Option<(NodeId, NodeId)>,
}

impl LayerNodes {
    fn ids(&self) -> Vec<NodeId> {
        let mut ids = vec![self.carrier, self.gain];
        if let Some((osc, depth)) = self.lfo {
            ids.extend([osc, depth]);
        }
        ids
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Sounding,
    Releasing,
}

#[derive(Debug)]
struct TrackedLayer {
    spec: LayerSpec,
    nodes: LayerNodes,
    /// Pending expiry while sounding, pending teardown while releasing.
    timer: TimerId,
    phase: Phase,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Timing {
    attack: f64,
    release: f64,
    rescale: f64,
}

pub struct LayerManager {
    layers: HashMap<LayerId, TrackedLayer>,
    timers: Scheduler<LayerTask>,
    timing: Timing,
    rng: StdRng,
}

impl LayerManager {
    pub fn new(config: &EngineConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_entropy(),
        };
        LayerManager {
            layers: HashMap::new(),
            timers: Scheduler::new(),
            timing: Timing {
                attack: config.attack_secs,
                release: config.release_secs,
                rescale: config.rescale_secs,
            },
            rng,
        }
    }

    fn next_id(&mut self) -> LayerId {
        let mut bytes = [0u8; 16];
        self.rng.fill_bytes(&mut bytes);
        LayerId(uuid::Builder::from_random_bytes(bytes).into_uuid())
    }

    /// Build a layer and fade it in to `volume * intensity`. Returns `None`
    /// if the context is not running or any node could not be built.
    pub fn create_layer(
        &mut self,
        ctx: &mut AudioContext,
        spec: LayerSpec,
        intensity: f64,
    ) -> Option<LayerId> {
        if !ctx.is_running() {
            debug!(state = ?ctx.state(), "context not running, layer not created");
            return None;
        }
        let now = ctx.current_time();
        let due = ctx.host_time() + spec.lifetime;
        let mut id = self.next_id();
        while self.layers.contains_key(&id) {
            id = self.next_id();
        }

        let graph = match ctx.graph_mut() {
            Ok(graph) => graph,
            Err(e) => {
                error!(error = %e, "layer not created");
                return None;
            }
        };
        let mut created = Vec::new();
        let target = spec.volume * intensity.clamp(0.0, 1.0);
        let built = build_nodes(graph, &spec, &mut created).and_then(|nodes| {
            graph
                .gain_param_mut(nodes.gain)?
                .linear_ramp_to(target, now, self.timing.attack);
            Ok(nodes)
        });
        let nodes = match built {
            Ok(nodes) => nodes,
            Err(e) => {
                error!(error = %e, frequency = spec.frequency, "layer did not start");
                for node in created {
                    let _ = graph.remove(node);
                }
                return None;
            }
        };

        let timer = self.timers.schedule(due, LayerTask::Expire(id));
        info!(
            layer_id = %id,
            frequency = spec.frequency,
            volume = spec.volume,
            lifetime = spec.lifetime,
            "layer created"
        );
        self.layers.insert(
            id,
            TrackedLayer {
                spec,
                nodes,
                timer,
                phase: Phase::Sounding,
            },
        );
        Some(id)
    }

    /// Fade a layer out and tear it down. Unknown or already fading layers
    /// are left alone. A context that is not running cannot play the fade,
    /// so the layer is torn down at once.
    pub fn remove_layer(&mut self, ctx: &mut AudioContext, id: &LayerId) {
        match self.layers.get(id) {
            Some(_) if !ctx.is_running() => {
                self.teardown(ctx, *id);
            }
            Some(layer) if layer.phase == Phase::Sounding => self.begin_release(ctx, *id),
            Some(_) => debug!(layer_id = %id, "layer already fading"),
            None => debug!(layer_id = %id, "remove of unknown layer ignored"),
        }
    }

    /// Ramp every sounding layer to `volume * intensity`.
    pub fn rescale_all(&mut self, ctx: &mut AudioContext, intensity: f64) {
        let intensity = intensity.clamp(0.0, 1.0);
        let now = ctx.current_time();
        let rescale = self.timing.rescale;
        let Ok(graph) = ctx.graph_mut() else {
            warn!("context closed, intensity change not applied");
            return;
        };
        for (id, layer) in &self.layers {
            if layer.phase != Phase::Sounding {
                continue;
            }
            match graph.gain_param_mut(layer.nodes.gain) {
                Ok(gain) => gain.linear_ramp_to(layer.spec.volume * intensity, now, rescale),
                Err(e) => warn!(layer_id = %id, error = %e, "layer gain not rescaled"),
            }
        }
        debug!(intensity, layers = self.layers.len(), "layers rescaled");
    }

    /// Fade out and tear down every layer. When the context is not running
    /// every layer, fading or not, is torn down immediately and reported as
    /// released.
    pub fn stop_all(&mut self, ctx: &mut AudioContext) -> Vec<LayerEvent> {
        if !ctx.is_running() {
            let ids: Vec<LayerId> = self.layers.keys().copied().collect();
            debug!(state = ?ctx.state(), layers = ids.len(), "context idle, skipping fades");
            return ids
                .into_iter()
                .filter(|id| self.teardown(ctx, *id))
                .map(LayerEvent::Released)
                .collect();
        }
        let sounding: Vec<LayerId> = self
            .layers
            .iter()
            .filter(|(_, l)| l.phase == Phase::Sounding)
            .map(|(id, _)| *id)
            .collect();
        for id in sounding {
            self.begin_release(ctx, id);
        }
        Vec::new()
    }

    /// Forget every layer without touching nodes. Used when the context is
    /// going away and takes the nodes with it.
    pub fn discard_all(&mut self) {
        if !self.layers.is_empty() {
            debug!(layers = self.layers.len(), "discarding layers");
        }
        self.layers.clear();
        self.timers.clear();
    }

    /// Run every timer that has come due on the host clock.
    pub fn poll(&mut self, ctx: &mut AudioContext) -> Vec<LayerEvent> {
        let mut events = Vec::new();
        for task in self.timers.take_due(ctx.host_time()) {
            match task {
                LayerTask::Expire(id) => {
                    if self.layers.get(&id).is_some_and(|l| l.phase == Phase::Sounding) {
                        info!(layer_id = %id, "layer lifetime elapsed");
                        self.begin_release(ctx, id);
                        events.push(LayerEvent::Expired(id));
                    }
                }
                LayerTask::Teardown(id) => {
                    if self.teardown(ctx, id) {
                        events.push(LayerEvent::Released(id));
                    }
                }
            }
        }
        events
    }

    fn begin_release(&mut self, ctx: &mut AudioContext, id: LayerId) {
        let now = ctx.current_time();
        let due = ctx.host_time() + self.timing.release;
        let release = self.timing.release;
        let Some(layer) = self.layers.get_mut(&id) else {
            return;
        };
        self.timers.cancel(layer.timer);
        match ctx.graph_mut().and_then(|g| g.gain_param_mut(layer.nodes.gain)) {
            Ok(gain) => {
                gain.cancel_and_hold(now);
                gain.linear_ramp_to(0.0, now, release);
            }
            Err(e) => warn!(layer_id = %id, error = %e, "fade-out not scheduled"),
        }
        layer.phase = Phase::Releasing;
        layer.timer = self.timers.schedule(due, LayerTask::Teardown(id));
        debug!(layer_id = %id, release, "layer fading out");
    }

    /// Stop and release a layer's nodes. Returns false if the layer was
    /// already gone.
    fn teardown(&mut self, ctx: &mut AudioContext, id: LayerId) -> bool {
        let Some(layer) = self.layers.remove(&id) else {
            return false;
        };
        self.timers.cancel(layer.timer);
        match ctx.graph_mut() {
            Ok(graph) => {
                for osc in [Some(layer.nodes.carrier), layer.nodes.lfo.map(|(o, _)| o)]
                    .into_iter()
                    .flatten()
                {
                    if let Err(e) = graph.stop(osc) {
                        debug!(layer_id = %id, error = %e, "oscillator already gone");
                    }
                }
                for node in layer.nodes.ids() {
                    if let Err(e) = graph.remove(node) {
                        debug!(layer_id = %id, error = %e, "node already gone");
                    }
                }
            }
            Err(e) => debug!(layer_id = %id, error = %e, "context gone before teardown"),
        }
        info!(layer_id = %id, "layer released");
        true
    }

    pub fn contains(&self, id: &LayerId) -> bool {
        self.layers.contains_key(id)
    }

    pub fn is_releasing(&self, id: &LayerId) -> bool {
        self.layers.get(id).is_some_and(|l| l.phase == Phase::Releasing)
    }

    /// Tracked layers, including ones still fading out.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Current gain of a layer's output node.
    pub fn gain_of(&self, ctx: &AudioContext, id: &LayerId) -> Option<f64> {
        let layer = self.layers.get(id)?;
        let gain = ctx.graph().gain_param(layer.nodes.gain)?;
        Some(gain.value_at(ctx.current_time()))
    }

    /// Gain a layer is heading towards once its current ramp finishes.
    pub fn target_gain_of(&self, ctx: &AudioContext, id: &LayerId) -> Option<f64> {
        let layer = self.layers.get(id)?;
        Some(ctx.graph().gain_param(layer.nodes.gain)?.target())
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }
}

fn build_nodes(
    graph: &mut NodeGraph,
    spec: &LayerSpec,
    created: &mut Vec<NodeId>,
) -> Result<LayerNodes> {
    if !(0.0..=1.0).contains(&spec.volume) {
        return Err(EngineError::InvalidParameter {
            name: "volume",
            value: spec.volume,
        });
    }

    let carrier = graph.create_oscillator(spec.wave_shape, spec.frequency)?;
    created.push(carrier);
    let gain = graph.create_gain(0.0)?;
    created.push(gain);

    let lfo = match spec.modulation {
        Some(m) => {
            let osc = graph.create_oscillator(Waveform::Sine, m.rate)?;
            created.push(osc);
            let depth = graph.create_gain(m.depth)?;
            created.push(depth);
            graph.connect(osc, Connection::Input(depth))?;
            graph.connect(depth, Connection::Frequency(carrier))?;
            Some((osc, depth))
        }
        None => None,
    };

    graph.connect(carrier, Connection::Input(gain))?;
    graph.connect(gain, Connection::Destination)?;
    graph.start(carrier)?;
    if let Some((osc, _)) = lfo {
        graph.start(osc)?;
    }
    Ok(LayerNodes { carrier, gain, lfo })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 8000.0;

    fn config() -> EngineConfig {
        EngineConfig {
            sample_rate: SR,
            seed: Some(3),
            ..EngineConfig::default()
        }
    }

    fn running_context(node_limit: usize) -> AudioContext {
        let mut ctx = AudioContext::new(SR, node_limit, 1.0);
        ctx.resume().unwrap();
        ctx
    }

    fn spec(lifetime: f64) -> LayerSpec {
        LayerSpec {
            frequency: 440.0,
            volume: 0.2,
            wave_shape: Waveform::Sine,
            modulation: Some(Modulation {
                rate: 0.1,
                depth: 0.5,
            }),
            lifetime,
        }
    }

    /// Render `seconds` of audio, polling timers every quantum.
    fn run(mgr: &mut LayerManager, ctx: &mut AudioContext, seconds: f64) -> Vec<LayerEvent> {
        let mut events = Vec::new();
        let mut remaining = (seconds * SR as f64).round() as usize;
        let mut block = [0.0_f32; 128];
        while remaining > 0 {
            let n = remaining.min(block.len());
            ctx.render(&mut block[..n]);
            events.extend(mgr.poll(ctx));
            remaining -= n;
        }
        events
    }

    #[test]
    fn create_requires_running_context() {
        let mut mgr = LayerManager::new(&config());
        let mut ctx = AudioContext::new(SR, 64, 1.0);
        assert!(mgr.create_layer(&mut ctx, spec(60.0), 0.5).is_none());
        assert!(ctx.graph().is_empty());
        assert!(mgr.is_empty());
    }

    #[test]
    fn layer_fades_in_over_attack() {
        let mut mgr = LayerManager::new(&config());
        let mut ctx = running_context(64);
        let id = mgr.create_layer(&mut ctx, spec(60.0), 0.5).unwrap();
        assert_eq!(ctx.graph().len(), 4);
        assert_eq!(mgr.gain_of(&ctx, &id), Some(0.0));
        run(&mut mgr, &mut ctx, 1.0);
        let half = mgr.gain_of(&ctx, &id).unwrap();
        assert!((half - 0.05).abs() < 1e-6, "half way through attack: {half}");
        run(&mut mgr, &mut ctx, 1.5);
        let full = mgr.gain_of(&ctx, &id).unwrap();
        assert!((full - 0.1).abs() < 1e-9, "after attack: {full}");
    }

    #[test]
    fn unmodulated_layer_uses_two_nodes() {
        let mut mgr = LayerManager::new(&config());
        let mut ctx = running_context(64);
        let plain = LayerSpec {
            modulation: None,
            ..spec(60.0)
        };
        mgr.create_layer(&mut ctx, plain, 1.0).unwrap();
        assert_eq!(ctx.graph().len(), 2);
    }

    #[test]
    fn failed_construction_leaves_no_orphans() {
        let mut mgr = LayerManager::new(&config());
        let mut ctx = running_context(3);
        assert!(mgr.create_layer(&mut ctx, spec(60.0), 0.5).is_none());
        assert!(ctx.graph().is_empty());
        assert!(mgr.is_empty());
        assert_eq!(mgr.pending_timers(), 0);

        let bad = LayerSpec {
            frequency: f64::NAN,
            ..spec(60.0)
        };
        let mut ctx = running_context(64);
        assert!(mgr.create_layer(&mut ctx, bad, 0.5).is_none());
        assert!(ctx.graph().is_empty());
    }

    #[test]
    fn remove_fades_then_releases() {
        let mut mgr = LayerManager::new(&config());
        let mut ctx = running_context(64);
        let id = mgr.create_layer(&mut ctx, spec(60.0), 1.0).unwrap();
        run(&mut mgr, &mut ctx, 3.0);
        mgr.remove_layer(&mut ctx, &id);
        assert!(mgr.is_releasing(&id));
        assert_eq!(mgr.target_gain_of(&ctx, &id), Some(0.0));
        // Expiry timer was swapped for the teardown timer.
        assert_eq!(mgr.pending_timers(), 1);

        let events = run(&mut mgr, &mut ctx, 0.5);
        assert!(events.is_empty());
        let fading = mgr.gain_of(&ctx, &id).unwrap();
        assert!(fading > 0.0 && fading < 0.2, "mid fade: {fading}");

        let events = run(&mut mgr, &mut ctx, 0.6);
        assert_eq!(events, vec![LayerEvent::Released(id)]);
        assert!(!mgr.contains(&id));
        assert!(ctx.graph().is_empty());
        assert_eq!(mgr.pending_timers(), 0);
    }

    #[test]
    fn removal_is_idempotent() {
        let mut mgr = LayerManager::new(&config());
        let mut ctx = running_context(64);
        let id = mgr.create_layer(&mut ctx, spec(60.0), 1.0).unwrap();
        mgr.remove_layer(&mut ctx, &id);
        mgr.remove_layer(&mut ctx, &id);
        assert_eq!(mgr.pending_timers(), 1);
        let events = run(&mut mgr, &mut ctx, 2.0);
        assert_eq!(events, vec![LayerEvent::Released(id)]);
        mgr.remove_layer(&mut ctx, &id);
        let unknown: LayerId = "67e55044-10b1-426f-9247-bb680e5fe0c8".parse().unwrap();
        mgr.remove_layer(&mut ctx, &unknown);
        assert!(mgr.is_empty());
    }

    #[test]
    fn lifetime_expiry_fades_and_releases_once() {
        let mut mgr = LayerManager::new(&config());
        let mut ctx = running_context(64);
        let id = mgr.create_layer(&mut ctx, spec(5.0), 1.0).unwrap();
        let events = run(&mut mgr, &mut ctx, 5.1);
        assert_eq!(events, vec![LayerEvent::Expired(id)]);
        assert!(mgr.is_releasing(&id));
        let events = run(&mut mgr, &mut ctx, 1.0);
        assert_eq!(events, vec![LayerEvent::Released(id)]);
        assert!(run(&mut mgr, &mut ctx, 10.0).is_empty());
        assert!(ctx.graph().is_empty());
    }

    #[test]
    fn rescale_ramps_every_sounding_layer() {
        let mut mgr = LayerManager::new(&config());
        let mut ctx = running_context(64);
        let early = mgr.create_layer(&mut ctx, spec(60.0), 0.5).unwrap();
        run(&mut mgr, &mut ctx, 3.0);
        let late = mgr.create_layer(&mut ctx, spec(60.0), 0.5).unwrap();
        run(&mut mgr, &mut ctx, 0.5);

        mgr.rescale_all(&mut ctx, 0.8);
        let before = mgr.gain_of(&ctx, &early).unwrap();
        assert!((before - 0.1).abs() < 1e-9, "no jump at the moment of change");
        run(&mut mgr, &mut ctx, 0.25);
        let mid = mgr.gain_of(&ctx, &early).unwrap();
        assert!(mid > 0.1 && mid < 0.16);
        run(&mut mgr, &mut ctx, 0.3);
        for id in [early, late] {
            let g = mgr.gain_of(&ctx, &id).unwrap();
            assert!((g - 0.16).abs() < 1e-9, "layer {id} at {g}");
        }
    }

    #[test]
    fn rescale_leaves_fading_layers_alone() {
        let mut mgr = LayerManager::new(&config());
        let mut ctx = running_context(64);
        let id = mgr.create_layer(&mut ctx, spec(60.0), 1.0).unwrap();
        run(&mut mgr, &mut ctx, 2.5);
        mgr.remove_layer(&mut ctx, &id);
        mgr.rescale_all(&mut ctx, 1.0);
        assert_eq!(mgr.target_gain_of(&ctx, &id), Some(0.0));
    }

    #[test]
    fn stop_all_cancels_expiry_and_clears() {
        let mut mgr = LayerManager::new(&config());
        let mut ctx = running_context(64);
        let a = mgr.create_layer(&mut ctx, spec(120.0), 0.5).unwrap();
        let b = mgr.create_layer(&mut ctx, spec(60.0), 0.5).unwrap();
        assert!(mgr.stop_all(&mut ctx).is_empty(), "fades, nothing released yet");
        mgr.stop_all(&mut ctx);
        assert!(mgr.is_releasing(&a) && mgr.is_releasing(&b));
        assert_eq!(mgr.pending_timers(), 2);
        let mut events = run(&mut mgr, &mut ctx, 1.1);
        events.sort_by_key(|e| match e {
            LayerEvent::Expired(id) | LayerEvent::Released(id) => *id,
        });
        let mut expected = vec![LayerEvent::Released(a), LayerEvent::Released(b)];
        expected.sort_by_key(|e| match e {
            LayerEvent::Expired(id) | LayerEvent::Released(id) => *id,
        });
        assert_eq!(events, expected);
        assert!(mgr.is_empty());
        assert!(ctx.graph().is_empty());
        assert_eq!(mgr.pending_timers(), 0);

        // Nothing left to stop.
        mgr.stop_all(&mut ctx);
        assert!(run(&mut mgr, &mut ctx, 1.0).is_empty());
    }

    #[test]
    fn stop_all_on_suspended_context_releases_at_once() {
        let mut mgr = LayerManager::new(&config());
        let mut ctx = running_context(64);
        let a = mgr.create_layer(&mut ctx, spec(60.0), 0.5).unwrap();
        let b = mgr.create_layer(&mut ctx, spec(60.0), 0.5).unwrap();
        mgr.remove_layer(&mut ctx, &b);
        ctx.suspend().unwrap();

        let mut events = mgr.stop_all(&mut ctx);
        events.sort_by_key(|e| match e {
            LayerEvent::Expired(id) | LayerEvent::Released(id) => *id,
        });
        let mut expected = vec![LayerEvent::Released(a), LayerEvent::Released(b)];
        expected.sort_by_key(|e| match e {
            LayerEvent::Expired(id) | LayerEvent::Released(id) => *id,
        });
        assert_eq!(events, expected);
        assert!(mgr.is_empty());
        assert!(ctx.graph().is_empty());
        assert_eq!(mgr.pending_timers(), 0);
        assert!(mgr.stop_all(&mut ctx).is_empty());
    }

    #[test]
    fn remove_on_suspended_context_skips_fade() {
        let mut mgr = LayerManager::new(&config());
        let mut ctx = running_context(64);
        let id = mgr.create_layer(&mut ctx, spec(60.0), 0.5).unwrap();
        ctx.suspend().unwrap();
        mgr.remove_layer(&mut ctx, &id);
        assert!(!mgr.contains(&id));
        assert!(ctx.graph().is_empty());
        assert_eq!(mgr.pending_timers(), 0);
    }

    #[test]
    fn lifetime_keeps_counting_while_suspended() {
        let mut mgr = LayerManager::new(&config());
        let mut ctx = running_context(64);
        let id = mgr.create_layer(&mut ctx, spec(5.0), 1.0).unwrap();
        ctx.suspend().unwrap();
        let events = run(&mut mgr, &mut ctx, 5.1);
        assert_eq!(ctx.current_time(), 0.0);
        assert_eq!(events, vec![LayerEvent::Expired(id)]);
        let events = run(&mut mgr, &mut ctx, 1.0);
        assert_eq!(events, vec![LayerEvent::Released(id)]);
        assert!(ctx.graph().is_empty());
    }

    #[test]
    fn seeded_ids_are_reproducible_and_unique() {
        let ids = |seed| {
            let mut mgr = LayerManager::new(&EngineConfig {
                seed: Some(seed),
                ..config()
            });
            let mut ctx = running_context(64);
            (0..4)
                .map(|_| mgr.create_layer(&mut ctx, spec(60.0), 0.5).unwrap())
                .collect::<Vec<_>>()
        };
        let first = ids(11);
        assert_eq!(first, ids(11));
        let mut unique = first.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 4);
    }
}
