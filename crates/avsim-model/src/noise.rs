//! ---
//! avsim_section: "11-simulation"
//! avsim_subsection: "02-model"
//! avsim_type: "source"
//! avsim_scope: "code"
//! avsim_description: "Injectable micro-variation sources for subsystem readings."
//! avsim_version: "v0.1.0"
//! avsim_owner: "tbd"
//! ---
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

/// Source of small bounded noise used to make readings look alive.
pub trait NoiseSource: Send + std::fmt::Debug {
    /// Return a sample in `[-amplitude, amplitude]`.
    fn sample(&mut self, amplitude: f64) -> f64;
}

/// Noise source that always returns zero. Used by tests and deterministic hosts.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoNoise;

impl NoiseSource for NoNoise {
    fn sample(&mut self, _amplitude: f64) -> f64 {
        0.0
    }
}

/// Seeded gaussian noise clipped to the requested amplitude.
#[derive(Debug)]
pub struct RandomNoise {
    rng: StdRng,
    scale: f64,
}

impl RandomNoise {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            scale: 1.0,
        }
    }

    /// Scale every requested amplitude, e.g. from configuration.
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = if scale.is_finite() { scale.max(0.0) } else { 0.0 };
        self
    }
}

impl NoiseSource for RandomNoise {
    fn sample(&mut self, amplitude: f64) -> f64 {
        let bound = amplitude.abs() * self.scale;
        if bound <= 0.0 || !bound.is_finite() {
            return 0.0;
        }
        // Three sigma fills the band; the tail is clipped.
        match Normal::new(0.0, bound / 3.0) {
            Ok(dist) => dist.sample(&mut self.rng).clamp(-bound, bound),
            Err(_) => 0.0,
        }
    }
}
