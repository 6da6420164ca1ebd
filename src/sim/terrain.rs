//! Procedural hill terrain
//!
//! The track is a dense polyline sampled every `TRACK_DX` units. Heights are
//! steered toward a segment-shaped target, but every step is clamped to a
//! slope cap and every change of step to a curvature cap, so the wheels never
//! meet a sharp vertex. Two smoothing passes and a flat start pad finish it.

use std::f32::consts::{PI, TAU};

use glam::Vec2;

use super::rng::{SeededRng, TERRAIN_STREAM};
use crate::consts::{TRACK_DX, TRACK_X0, TRACK_X1};
use crate::{lerp, smoothstep};

/// Terrain shaping constants
pub mod tuning {
    /// Distance over which difficulty ramps from 0 to 1
    pub const DIFFICULTY_RAMP: f32 = 160.0;

    /// Baseline height gained per unit of x (keeps the track climbing)
    pub const BASELINE_RISE: f32 = 0.01;
    /// Targets stay within this distance of the baseline
    pub const ALTITUDE_BAND: f32 = 6.0;
    /// How strongly new targets are pulled toward the baseline
    pub const TARGET_PULL: f32 = 0.35;

    /// Slope cap (rise per unit) at difficulty 0 and 1
    pub const SLOPE_EASY: f32 = 0.45;
    pub const SLOPE_HARD: f32 = 0.85;
    /// Slope cap easing near the start
    pub const EASE_START: f32 = 10.0;
    pub const EASE_LENGTH: f32 = 50.0;
    pub const EASE_MIN: f32 = 0.25;

    /// Max change of per-step delta (curvature cap) at difficulty 0 and 1
    pub const CURV_EASY: f32 = 0.010;
    pub const CURV_HARD: f32 = 0.018;

    /// High-frequency texture amplitude at difficulty 0 and 1
    pub const JITTER_EASY: f32 = 0.02;
    pub const JITTER_HARD: f32 = 0.05;

    pub const MIN_SEGMENT_LEN: f32 = 4.0;
    /// Length of one undulation in a roll segment
    pub const ROLL_PERIOD: f32 = 11.0;
    /// The first segment is always flat up to here
    pub const OPENING_FLAT_END: f32 = 14.0;

    /// Flat spawn pad and its blend margin
    pub const PAD_MIN: f32 = -4.0;
    pub const PAD_MAX: f32 = 8.0;
    pub const PAD_BLEND: f32 = 3.0;

    pub const SMOOTHING_PASSES: usize = 2;
}

use tuning::*;

/// Shape family of a terrain segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Flat,
    /// Periodic undulation
    Roll,
    /// Single bump
    Hill,
}

impl SegmentKind {
    /// Pick a kind from a uniform roll; hills get likelier with difficulty
    pub fn pick(roll: f32, difficulty: f32) -> Self {
        let flat = lerp(0.45, 0.15, difficulty);
        let roll_w = 0.40;
        let hill = lerp(0.15, 0.45, difficulty);
        let r = roll * (flat + roll_w + hill);
        if r < flat {
            SegmentKind::Flat
        } else if r < flat + roll_w {
            SegmentKind::Roll
        } else {
            SegmentKind::Hill
        }
    }

    fn length_range(self) -> (f32, f32) {
        match self {
            SegmentKind::Flat => (10.0, 22.0),
            SegmentKind::Roll => (18.0, 40.0),
            SegmentKind::Hill => (14.0, 30.0),
        }
    }

    fn amplitude_range(self) -> (f32, f32) {
        match self {
            SegmentKind::Flat => (0.0, 0.0),
            SegmentKind::Roll => (0.4, 1.2),
            SegmentKind::Hill => (1.5, 4.5),
        }
    }

    /// Largest random excursion of the segment's end height
    fn target_span(self) -> f32 {
        match self {
            SegmentKind::Flat => 0.6,
            SegmentKind::Roll => 2.0,
            SegmentKind::Hill => 3.5,
        }
    }

    fn slope_mult(self) -> f32 {
        match self {
            SegmentKind::Flat => 0.6,
            SegmentKind::Roll => 1.0,
            SegmentKind::Hill => 1.15,
        }
    }
}

/// 0 at the start, 1 once the track is fully hard
pub fn difficulty(x: f32) -> f32 {
    (x / DIFFICULTY_RAMP).clamp(0.0, 1.0)
}

fn baseline(x: f32) -> f32 {
    x.max(0.0) * BASELINE_RISE
}

/// Slope cap in rise per unit for a given x and segment kind
pub fn max_slope(x: f32, kind: SegmentKind) -> f32 {
    let ease = lerp(EASE_MIN, 1.0, smoothstep((x - EASE_START) / EASE_LENGTH));
    lerp(SLOPE_EASY, SLOPE_HARD, difficulty(x)) * ease * kind.slope_mult()
}

/// Curvature cap (max change of per-step delta) at x
pub fn max_curvature(x: f32) -> f32 {
    lerp(CURV_EASY, CURV_HARD, difficulty(x))
}

#[derive(Debug, Clone)]
struct Segment {
    kind: SegmentKind,
    x_start: f32,
    x_end: f32,
    h_start: f32,
    h_target: f32,
    amp: f32,
    cycles: f32,
}

impl Segment {
    fn opening(x_start: f32) -> Self {
        Self {
            kind: SegmentKind::Flat,
            x_start,
            x_end: OPENING_FLAT_END,
            h_start: 0.0,
            h_target: 0.0,
            amp: 0.0,
            cycles: 1.0,
        }
    }

    fn next(rng: &mut SeededRng, x_start: f32, h_start: f32) -> Self {
        let d = difficulty(x_start);
        let kind = SegmentKind::pick(rng.next_f32(), d);

        let (len_lo, len_hi) = kind.length_range();
        let len = (rng.range(len_lo, len_hi) * lerp(1.0, 0.8, d)).max(MIN_SEGMENT_LEN);
        let (amp_lo, amp_hi) = kind.amplitude_range();
        let amp = rng.range(amp_lo, amp_hi) * lerp(0.6, 1.3, d);

        let x_end = x_start + len;
        let base = baseline(x_end);
        let raw = h_start + rng.jitter(kind.target_span() * lerp(0.5, 1.0, d));
        let h_target =
            lerp(raw, base, TARGET_PULL).clamp(base - ALTITUDE_BAND, base + ALTITUDE_BAND);

        Self {
            kind,
            x_start,
            x_end,
            h_start,
            h_target,
            amp,
            cycles: (len / ROLL_PERIOD).round().max(1.0),
        }
    }

    /// Height the generator steers toward at x
    fn desired(&self, x: f32) -> f32 {
        let len = (self.x_end - self.x_start).max(MIN_SEGMENT_LEN);
        let t = ((x - self.x_start) / len).clamp(0.0, 1.0);
        let base = lerp(self.h_start, self.h_target, smoothstep(t));
        let bump = match self.kind {
            SegmentKind::Flat => 0.0,
            SegmentKind::Roll => self.amp * (TAU * self.cycles * t).sin(),
            SegmentKind::Hill => self.amp * (PI * t).sin(),
        };
        base + bump
    }
}

/// Generated terrain for one run. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub seed: u32,
    pub xs: Vec<f32>,
    pub ys: Vec<f32>,
    /// Per-sample slope cap (height per step) applied during generation
    pub step_caps: Vec<f32>,
    /// Per-sample curvature cap (change of height step) applied during generation
    pub curv_caps: Vec<f32>,
}

impl Track {
    /// Build the track for `seed`
    pub fn generate(seed: u32) -> Self {
        let count = ((TRACK_X1 - TRACK_X0) / TRACK_DX).round() as usize + 1;
        let mut xs = Vec::with_capacity(count);
        let mut ys = Vec::with_capacity(count);
        let mut step_caps = Vec::with_capacity(count);
        let mut curv_caps = Vec::with_capacity(count);

        let mut rng = SeededRng::stream(seed, TERRAIN_STREAM);
        let phase_a = rng.range(0.0, TAU);
        let phase_b = rng.range(0.0, TAU);
        let texture = |x: f32| {
            let amp = lerp(JITTER_EASY, JITTER_HARD, difficulty(x));
            amp * (0.6 * (x * 2.3 + phase_a).sin() + 0.4 * (x * 5.1 + phase_b).sin())
        };

        let mut segment = Segment::opening(TRACK_X0);
        let mut y = 0.0_f32;
        let mut step = 0.0_f32;
        let mut cap = max_slope(TRACK_X0, segment.kind) * TRACK_DX;

        xs.push(TRACK_X0);
        ys.push(y);
        step_caps.push(cap);
        curv_caps.push(max_curvature(TRACK_X0));

        for i in 1..count {
            let x = TRACK_X0 + i as f32 * TRACK_DX;
            if x > segment.x_end {
                segment = Segment::next(&mut rng, segment.x_end, y);
            }

            let curv = max_curvature(x);
            // The cap itself may only drift by `curv` per step, which keeps
            // the slope and curvature windows below always overlapping.
            cap = (max_slope(x, segment.kind) * TRACK_DX).clamp(cap - curv, cap + curv);

            let want = segment.desired(x) + texture(x) - y;
            let lo = (-cap).max(step - curv);
            let hi = cap.min(step + curv).max(lo);
            step = want.clamp(lo, hi);
            y += step;

            xs.push(x);
            ys.push(y);
            step_caps.push(cap);
            curv_caps.push(curv);
        }

        for _ in 0..SMOOTHING_PASSES {
            smooth3(&mut ys);
        }

        let mut track = Self {
            seed,
            xs,
            ys,
            step_caps,
            curv_caps,
        };
        track.blend_start_pad();

        log::info!(
            "Track generated: seed={} samples={} height range [{:.2}, {:.2}]",
            seed,
            track.len(),
            track.min_height(),
            track.max_height()
        );
        track
    }

    /// Flatten [PAD_MIN, PAD_MAX] to the height at x=0, blending over PAD_BLEND
    fn blend_start_pad(&mut self) {
        let pad_h = self.height_at(0.0);
        for (x, y) in self.xs.iter().zip(self.ys.iter_mut()) {
            let w = if *x < PAD_MIN {
                smoothstep((*x - (PAD_MIN - PAD_BLEND)) / PAD_BLEND)
            } else if *x > PAD_MAX {
                1.0 - smoothstep((*x - PAD_MAX) / PAD_BLEND)
            } else {
                1.0
            };
            if w > 0.0 {
                *y = lerp(*y, pad_h, w);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.ys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ys.is_empty()
    }

    pub fn x_min(&self) -> f32 {
        self.xs.first().copied().unwrap_or(TRACK_X0)
    }

    pub fn x_max(&self) -> f32 {
        self.xs.last().copied().unwrap_or(TRACK_X1)
    }

    /// Terrain height at world x. Clamps to the end heights outside the track.
    pub fn height_at(&self, x: f32) -> f32 {
        let n = self.ys.len();
        if n == 0 {
            return 0.0;
        }
        if n == 1 || x.is_nan() || x <= self.x_min() {
            return self.ys[0];
        }
        if x >= self.x_max() {
            return self.ys[n - 1];
        }
        let f = (x - self.x_min()) / TRACK_DX;
        let i = (f.floor() as usize).min(n - 2);
        let t = (f - i as f32).clamp(0.0, 1.0);
        lerp(self.ys[i], self.ys[i + 1], t)
    }

    /// Samples as points, in x order
    pub fn points(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.xs.iter().zip(&self.ys).map(|(&x, &y)| Vec2::new(x, y))
    }

    /// Index range of samples covering [x_lo, x_hi] (inclusive of neighbours)
    pub fn sample_range(&self, x_lo: f32, x_hi: f32) -> std::ops::Range<usize> {
        let n = self.ys.len();
        let to_index = |x: f32| ((x - self.x_min()) / TRACK_DX).max(0.0) as usize;
        let lo = to_index(x_lo).saturating_sub(1).min(n);
        let hi = (to_index(x_hi) + 2).min(n);
        lo..hi.max(lo)
    }

    pub fn min_height(&self) -> f32 {
        self.ys.iter().copied().fold(f32::INFINITY, f32::min)
    }

    pub fn max_height(&self) -> f32 {
        self.ys.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }
}

/// One pass of 3-point box smoothing; endpoints stay put
fn smooth3(ys: &mut [f32]) {
    if ys.len() < 3 {
        return;
    }
    let mut prev = ys[0];
    for i in 1..ys.len() - 1 {
        let cur = ys[i];
        ys[i] = (prev + cur + ys[i + 1]) / 3.0;
        prev = cur;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn in_pad_zone(x: f32) -> bool {
        x > PAD_MIN - PAD_BLEND - 1.0 && x < PAD_MAX + PAD_BLEND + 1.0
    }

    fn window_max(v: &[f32], center: usize, radius: usize) -> f32 {
        let lo = center.saturating_sub(radius);
        let hi = (center + radius + 1).min(v.len());
        v[lo..hi].iter().copied().fold(0.0, f32::max)
    }

    fn assert_bounded(track: &Track) {
        for i in 1..track.len() {
            if in_pad_zone(track.xs[i]) {
                continue;
            }
            let step = track.ys[i] - track.ys[i - 1];
            let cap = window_max(&track.step_caps, i, 2);
            assert!(
                step.abs() <= cap + 1e-4,
                "slope {} over cap {} at x={}",
                step,
                cap,
                track.xs[i]
            );
            if i >= 2 && !in_pad_zone(track.xs[i - 1]) {
                let prev = track.ys[i - 1] - track.ys[i - 2];
                let curv = window_max(&track.curv_caps, i, 3);
                assert!(
                    (step - prev).abs() <= curv + 1e-4,
                    "curvature {} over cap {} at x={}",
                    step - prev,
                    curv,
                    track.xs[i]
                );
            }
        }
    }

    #[test]
    fn test_determinism() {
        let a = Track::generate(1337);
        let b = Track::generate(1337);
        assert_eq!(a.len(), b.len());
        for (ya, yb) in a.ys.iter().zip(&b.ys) {
            assert_eq!(ya.to_bits(), yb.to_bits());
        }
        for (xa, xb) in a.xs.iter().zip(&b.xs) {
            assert_eq!(xa.to_bits(), xb.to_bits());
        }
    }

    #[test]
    fn test_seed_changes_shape() {
        let a = Track::generate(1);
        let b = Track::generate(2);
        assert!(a.ys.iter().zip(&b.ys).any(|(ya, yb)| (ya - yb).abs() > 0.01));
    }

    #[test]
    fn test_extent_and_spacing() {
        let track = Track::generate(9);
        assert_eq!(track.x_min(), TRACK_X0);
        assert!((track.x_max() - TRACK_X1).abs() < 1e-3);
        assert!(track.xs.windows(2).all(|w| w[1] > w[0]));
        assert!(
            track
                .xs
                .windows(2)
                .all(|w| ((w[1] - w[0]) - TRACK_DX).abs() < 1e-3)
        );
    }

    #[test]
    fn test_slope_and_curvature_bounded() {
        assert_bounded(&Track::generate(1337));
    }

    #[test]
    fn test_start_pad_flat() {
        let track = Track::generate(1337);
        let h0 = track.height_at(0.0);
        let mut x = PAD_MIN;
        while x <= PAD_MAX {
            assert!((track.height_at(x) - h0).abs() < 1e-4, "pad not flat at {}", x);
            x += 0.1;
        }
    }

    #[test]
    fn test_height_clamps_outside_track() {
        let track = Track::generate(77);
        let first = track.height_at(track.x_min());
        let last = track.height_at(track.x_max());
        assert_eq!(track.height_at(-1000.0), first);
        assert_eq!(track.height_at(TRACK_X1 + 500.0), last);
        assert_eq!(track.height_at(f32::NAN), first);
    }

    #[test]
    fn test_height_interpolates_between_samples() {
        let track = Track::generate(5);
        let i = 800;
        let mid = (track.xs[i] + track.xs[i + 1]) * 0.5;
        let expected = (track.ys[i] + track.ys[i + 1]) * 0.5;
        assert!((track.height_at(mid) - expected).abs() < 1e-4);
    }

    #[test]
    fn test_hills_appear_later() {
        // Bounded band but the far track should not be a straight line
        let track = Track::generate(2024);
        let far = track.sample_range(600.0, 900.0);
        let (lo, hi) = track.ys[far]
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &y| (lo.min(y), hi.max(y)));
        assert!(hi - lo > 1.0);
    }

    #[test]
    fn test_kind_weights_shift_to_hills() {
        let count_hills = |d: f32| {
            (0..1000)
                .filter(|i| SegmentKind::pick(*i as f32 / 1000.0, d) == SegmentKind::Hill)
                .count()
        };
        assert!(count_hills(1.0) > count_hills(0.0));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(8))]

        #[test]
        fn prop_any_seed_bounded(seed in any::<u32>()) {
            let track = Track::generate(seed);
            assert_bounded(&track);
            let h0 = track.height_at(0.0);
            prop_assert!((track.height_at(PAD_MAX) - h0).abs() < 1e-4);
        }
    }
}
