//! DSP Engine: pure Rust synthesis for the soundscape layers.
//!
//! The same graph powers both the browser (via AudioWorklet + WASM) and the
//! CLI renderer (offline WAV export).

pub mod graph;
pub mod mixer;
pub mod oscillator;
pub mod param;
pub mod renderer;
