//! Simulated environmental sensor feed.
//!
//! Stands in for real hardware: most readings describe a quiet afternoon,
//! a fraction describe a loud, vibrating night-time disturbance.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vigil_core::{CapabilityResult, SensorSample, SensorSampler};

/// Share of readings that look like an intrusion.
pub const DEFAULT_INTRUSION_RATE: f64 = 0.2;

pub struct SimulatedSampler {
    rng: StdRng,
    intrusion_rate: f64,
}

impl SimulatedSampler {
    /// Deterministic feed for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    /// Feed seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng,
            intrusion_rate: DEFAULT_INTRUSION_RATE,
        }
    }

    /// Override the intrusion share, clamped to `[0, 1]`.
    pub fn with_intrusion_rate(mut self, rate: f64) -> Self {
        self.intrusion_rate = if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) };
        self
    }

    pub fn intrusion_rate(&self) -> f64 {
        self.intrusion_rate
    }
}

impl SensorSampler for SimulatedSampler {
    fn draw_sample(&mut self) -> CapabilityResult<SensorSample> {
        let sample = if self.rng.gen_bool(self.intrusion_rate) {
            SensorSample {
                motion: true,
                sound_level: f64::from(self.rng.gen_range(70u8..=90)),
                vibration: true,
                temperature: 20.5,
                hour: 23,
            }
        } else {
            SensorSample {
                motion: false,
                sound_level: f64::from(self.rng.gen_range(30u8..=50)),
                vibration: false,
                temperature: 20.5,
                hour: 14,
            }
        };
        Ok(sample)
    }
}
