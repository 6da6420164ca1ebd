//! Seeded random streams
//!
//! Terrain and pickups draw from separate streams derived from the run seed,
//! so the layouts change together with the seed without correlating.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::consts::FALLBACK_SEED;

/// Salt for the terrain shape stream (odd)
pub const TERRAIN_STREAM: u32 = 0x9E37_79B9;
/// Salt for the pickup placement stream (odd)
pub const PICKUP_STREAM: u32 = 0x85EB_CA6B;
/// Salt for decorative background layers (odd)
pub const BACKDROP_STREAM: u32 = 0xC2B2_AE35;

const MS_PER_DAY: f64 = 86_400_000.0;

/// Deterministic stream of floats in [0, 1)
#[derive(Debug, Clone)]
pub struct SeededRng {
    inner: Pcg32,
}

impl SeededRng {
    pub fn new(seed: u32) -> Self {
        Self {
            inner: Pcg32::seed_from_u64(seed as u64),
        }
    }

    /// Independent stream for `seed`, decorrelated by an odd salt
    pub fn stream(seed: u32, salt: u32) -> Self {
        Self::new(seed ^ salt)
    }

    /// Next float in [0, 1)
    pub fn next_f32(&mut self) -> f32 {
        self.inner.random::<f32>()
    }

    /// Uniform float in [lo, hi)
    pub fn range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.next_f32()
    }

    /// Uniform float in [-half, half)
    pub fn jitter(&mut self, half: f32) -> f32 {
        self.range(-half, half)
    }
}

/// Seed that rotates once per UTC day
pub fn daily_seed(unix_ms: f64) -> u32 {
    if !unix_ms.is_finite() || unix_ms < 0.0 {
        return FALLBACK_SEED;
    }
    let day = (unix_ms / MS_PER_DAY).floor() as u32;
    // Golden ratio hash, then fold the high bits down
    let h = day.wrapping_mul(2_654_435_761) ^ 0x5EED_D41E;
    h ^ (h >> 16)
}
