//! Node graph: oscillators and gains wired to each other and to the output.
//!
//! Nodes live in an arena keyed by [`NodeId`]. A node's output can feed a
//! gain node's input, an oscillator's frequency parameter (additive FM), or
//! the destination bus. Rendering pulls each node once per block; a node
//! that is still being evaluated when it is reached again reads silence, so
//! accidental cycles cannot recurse forever.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::error::{EngineError, Result};

use super::oscillator::{Oscillator, Waveform};
use super::param::AudioParam;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

/// Where a node's output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connection {
    /// Summed into a gain node's input.
    Input(NodeId),
    /// Added to an oscillator's frequency, in Hz.
    Frequency(NodeId),
    Destination,
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Connection::Input(id) => write!(f, "input of {id:?}"),
            Connection::Frequency(id) => write!(f, "frequency of {id:?}"),
            Connection::Destination => write!(f, "destination"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Playback {
    Idle,
    Started,
    Stopped,
}

#[derive(Debug, Clone)]
struct OscillatorNode {
    osc: Oscillator,
    frequency: AudioParam,
    fm_inputs: Vec<NodeId>,
    playback: Playback,
}

#[derive(Debug, Clone)]
struct GainNode {
    gain: AudioParam,
    inputs: Vec<NodeId>,
}

#[derive(Debug, Clone)]
enum Node {
    Oscillator(OscillatorNode),
    Gain(GainNode),
}

#[derive(Debug, Clone)]
pub struct NodeGraph {
    nodes: BTreeMap<NodeId, Node>,
    destination: Vec<NodeId>,
    next_id: u64,
    sample_rate: f64,
    node_limit: usize,
}

fn check_finite(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(EngineError::InvalidParameter { name, value })
    }
}

impl NodeGraph {
    pub fn new(sample_rate: f64, node_limit: usize) -> Self {
        NodeGraph {
            nodes: BTreeMap::new(),
            destination: Vec::new(),
            next_id: 0,
            sample_rate,
            node_limit,
        }
    }

    fn insert(&mut self, node: Node) -> Result<NodeId> {
        if self.nodes.len() >= self.node_limit {
            return Err(EngineError::NodeLimit {
                limit: self.node_limit,
            });
        }
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, node);
        Ok(id)
    }

    /// Allocate an oscillator. It stays silent until [`NodeGraph::start`].
    pub fn create_oscillator(&mut self, waveform: Waveform, frequency: f64) -> Result<NodeId> {
        check_finite("frequency", frequency)?;
        if frequency <= 0.0 {
            return Err(EngineError::InvalidParameter {
                name: "frequency",
                value: frequency,
            });
        }
        let mut osc = Oscillator::new(waveform, self.sample_rate);
        osc.frequency = frequency;
        self.insert(Node::Oscillator(OscillatorNode {
            osc,
            frequency: AudioParam::new(frequency),
            fm_inputs: Vec::new(),
            playback: Playback::Idle,
        }))
    }

    pub fn create_gain(&mut self, gain: f64) -> Result<NodeId> {
        check_finite("gain", gain)?;
        self.insert(Node::Gain(GainNode {
            gain: AudioParam::new(gain),
            inputs: Vec::new(),
        }))
    }

    pub fn connect(&mut self, from: NodeId, to: Connection) -> Result<()> {
        if !self.nodes.contains_key(&from) {
            return Err(EngineError::UnknownNode(from));
        }
        let invalid = || EngineError::InvalidConnection {
            from,
            to: to.to_string(),
        };
        match to {
            Connection::Destination => {
                if !self.destination.contains(&from) {
                    self.destination.push(from);
                }
            }
            Connection::Input(target) if target != from => match self.nodes.get_mut(&target) {
                Some(Node::Gain(g)) => g.inputs.push(from),
                Some(Node::Oscillator(_)) => return Err(invalid()),
                None => return Err(EngineError::UnknownNode(target)),
            },
            Connection::Frequency(target) if target != from => match self.nodes.get_mut(&target) {
                Some(Node::Oscillator(o)) => o.fm_inputs.push(from),
                Some(Node::Gain(_)) => return Err(invalid()),
                None => return Err(EngineError::UnknownNode(target)),
            },
            _ => return Err(invalid()),
        }
        Ok(())
    }

    fn oscillator_mut(&mut self, id: NodeId) -> Result<&mut OscillatorNode> {
        match self.nodes.get_mut(&id) {
            Some(Node::Oscillator(o)) => Ok(o),
            Some(Node::Gain(_)) => Err(EngineError::InvalidConnection {
                from: id,
                to: "oscillator control".into(),
            }),
            None => Err(EngineError::UnknownNode(id)),
        }
    }

    pub fn start(&mut self, id: NodeId) -> Result<()> {
        let node = self.oscillator_mut(id)?;
        if node.playback == Playback::Idle {
            node.osc.reset();
            node.playback = Playback::Started;
        }
        Ok(())
    }

    /// Silence an oscillator for good. Stopping twice is harmless.
    pub fn stop(&mut self, id: NodeId) -> Result<()> {
        self.oscillator_mut(id)?.playback = Playback::Stopped;
        Ok(())
    }

    pub fn is_playing(&self, id: NodeId) -> bool {
        matches!(
            self.nodes.get(&id),
            Some(Node::Oscillator(OscillatorNode {
                playback: Playback::Started,
                ..
            }))
        )
    }

    pub fn gain_param_mut(&mut self, id: NodeId) -> Result<&mut AudioParam> {
        match self.nodes.get_mut(&id) {
            Some(Node::Gain(g)) => Ok(&mut g.gain),
            Some(Node::Oscillator(_)) => Err(EngineError::InvalidConnection {
                from: id,
                to: "gain param".into(),
            }),
            None => Err(EngineError::UnknownNode(id)),
        }
    }

    pub fn gain_param(&self, id: NodeId) -> Option<&AudioParam> {
        match self.nodes.get(&id) {
            Some(Node::Gain(g)) => Some(&g.gain),
            _ => None,
        }
    }

    /// Drop a node and every connection that touches it.
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        if self.nodes.remove(&id).is_none() {
            return Err(EngineError::UnknownNode(id));
        }
        self.destination.retain(|&n| n != id);
        for node in self.nodes.values_mut() {
            match node {
                Node::Gain(g) => g.inputs.retain(|&n| n != id),
                Node::Oscillator(o) => o.fm_inputs.retain(|&n| n != id),
            }
        }
        Ok(())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.destination.clear();
    }

    /// Render one block starting at `start_time` (seconds) into `out`,
    /// overwriting it with the destination bus.
    pub fn render(&mut self, start_time: f64, out: &mut [f64]) {
        out.fill(0.0);
        let frames = out.len();
        let mut cache: HashMap<NodeId, Vec<f64>> = HashMap::new();
        let outputs = self.destination.clone();
        for id in outputs {
            self.render_node(id, start_time, frames, &mut cache);
            if let Some(buf) = cache.get(&id) {
                for (o, s) in out.iter_mut().zip(buf) {
                    *o += s;
                }
            }
        }
    }

    fn render_node(
        &mut self,
        id: NodeId,
        start_time: f64,
        frames: usize,
        cache: &mut HashMap<NodeId, Vec<f64>>,
    ) {
        if cache.contains_key(&id) {
            return;
        }
        cache.insert(id, vec![0.0; frames]);

        let inputs = match self.nodes.get(&id) {
            Some(Node::Gain(g)) => g.inputs.clone(),
            Some(Node::Oscillator(o)) => o.fm_inputs.clone(),
            None => return,
        };
        let mut summed = vec![0.0; frames];
        for input in inputs {
            self.render_node(input, start_time, frames, cache);
            if let Some(buf) = cache.get(&input) {
                for (acc, s) in summed.iter_mut().zip(buf) {
                    *acc += s;
                }
            }
        }

        let dt = 1.0 / self.sample_rate;
        let output = match self.nodes.get_mut(&id) {
            Some(Node::Gain(g)) => summed
                .iter()
                .enumerate()
                .map(|(i, s)| g.gain.value_at(start_time + i as f64 * dt) * s)
                .collect(),
            Some(Node::Oscillator(o)) if o.playback == Playback::Started => summed
                .iter()
                .enumerate()
                .map(|(i, fm)| {
                    o.osc.frequency = o.frequency.value_at(start_time + i as f64 * dt) + fm;
                    o.osc.next_sample()
                })
                .collect(),
            _ => return,
        };
        cache.insert(id, output);
    }
}
