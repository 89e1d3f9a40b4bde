//! Mixer: master gain and soft clipping on the destination bus.

/// Holds the destination bus for one block and converts it to output samples.
#[derive(Debug, Clone)]
pub struct Mixer {
    pub master_gain: f64,
    buffer: Vec<f64>,
}

impl Mixer {
    pub fn new(master_gain: f64) -> Self {
        Mixer {
            master_gain,
            buffer: Vec::new(),
        }
    }

    /// Prepare a buffer of `num_samples` filled with zeros and hand it out for
    /// the graph to render into.
    pub fn bus(&mut self, num_samples: usize) -> &mut [f64] {
        self.buffer.clear();
        self.buffer.resize(num_samples, 0.0);
        &mut self.buffer
    }

    /// Write the bus to `out` with master gain and soft clipping applied.
    pub fn write_output(&self, out: &mut [f32]) {
        for (o, &s) in out.iter_mut().zip(&self.buffer) {
            *o = soft_clip(s * self.master_gain) as f32;
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl Default for Mixer {
    fn default() -> Self {
        Mixer::new(1.0)
    }
}

/// Soft clipper using tanh to prevent harsh digital clipping.
fn soft_clip(x: f64) -> f64 {
    x.tanh()
}
