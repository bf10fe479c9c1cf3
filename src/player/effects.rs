//! The transition "static" burst played between tracks.
//!
//! A fixed buffer of uniform random samples is generated once at engine
//! start and reused; each transition plays a fresh voice of it. The
//! hold-then-exponential-decay envelope is baked into the samples, so a
//! voice simply plays to completion and never blocks the engine.

use rand::RngExt;
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, Sink};

use crate::config::EffectsSettings;

const SAMPLE_RATE: u32 = 44_100;
/// Flat portion at full burst gain before the decay starts.
const HOLD_MS: u64 = 60;

pub(super) struct TransitionEffect {
    samples: Vec<f32>,
}

impl TransitionEffect {
    pub(super) fn generate(settings: &EffectsSettings) -> Self {
        let mut rng = rand::rng();
        let total = (SAMPLE_RATE as u64 * settings.noise_ms / 1000) as usize;
        let hold = (SAMPLE_RATE as u64 * HOLD_MS / 1000) as usize;
        let gain = settings.gain.clamp(0.0, 1.0);

        let mut samples = Vec::with_capacity(total);
        for n in 0..total {
            let raw: f32 = rng.random_range(-1.0..1.0);
            let envelope = if n <= hold {
                1.0
            } else {
                let t = (n - hold) as f32 / (total - hold).max(1) as f32;
                (-6.0 * t).exp()
            };
            samples.push(raw * gain * envelope);
        }

        Self { samples }
    }

    /// Spin up a fresh voice for one transition. The sink plays on the shared
    /// mixer while the engine carries on; dropping it stops the burst.
    pub(super) fn voice(&self, stream: &OutputStream) -> Option<Sink> {
        if self.samples.is_empty() {
            return None;
        }
        let sink = Sink::connect_new(stream.mixer());
        sink.append(SamplesBuffer::new(1, SAMPLE_RATE, self.samples.clone()));
        sink.play();
        Some(sink)
    }

    #[cfg(test)]
    pub(super) fn samples(&self) -> &[f32] {
        &self.samples
    }
}
