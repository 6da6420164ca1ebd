//! Coin and fuel placement along the track

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::rng::{PICKUP_STREAM, SeededRng};
use super::terrain::Track;

/// Height of pickups above the terrain surface
pub const PICKUP_LIFT: f32 = 2.05;

/// First coin group and spacing between groups
pub const COIN_START_X: f32 = 18.0;
pub const COIN_SPACING: f32 = 24.0;
pub const COIN_SPACING_JITTER: f32 = 4.0;
/// Gap between the coins of a triplet
pub const COIN_GAP: f32 = 1.6;
pub const COIN_VALUE: u32 = 1;

pub const FUEL_START_X: f32 = 55.0;
pub const FUEL_SPACING: f32 = 62.0;
pub const FUEL_SPACING_JITTER: f32 = 8.0;
/// Peak extra lift of the fuel arch
pub const FUEL_ARCH: f32 = 0.7;
pub const FUEL_VALUE: u32 = 35;

/// Nothing is placed this close to the end of the track
const END_MARGIN: f32 = 10.0;

/// Pickup types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickupKind {
    Coin,
    Fuel,
}

impl PickupKind {
    /// Collection radius; fuel is more forgiving
    pub fn radius(self) -> f32 {
        match self {
            PickupKind::Coin => 1.05,
            PickupKind::Fuel => 1.45,
        }
    }
}

/// A pickup entity. Never removed during a run, only marked taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pickup {
    pub id: u32,
    pub kind: PickupKind,
    pub pos: Vec2,
    pub value: u32,
    pub taken: bool,
}

impl Pickup {
    /// True if `point` is inside this pickup's collection radius
    pub fn reaches(&self, point: Vec2) -> bool {
        let r = self.kind.radius();
        self.pos.distance_squared(point) < r * r
    }
}

/// Scatter coins and fuel for `track` from the track seed's pickup stream
pub fn layout_pickups(track: &Track) -> Vec<Pickup> {
    let mut rng = SeededRng::stream(track.seed, PICKUP_STREAM);
    let mut pickups = Vec::new();
    let mut next_id = 1u32;
    let x_end = track.x_max() - END_MARGIN;

    let mut base = COIN_START_X;
    while base < x_end {
        for k in 0..3 {
            let x = base + k as f32 * COIN_GAP + rng.jitter(0.3);
            pickups.push(Pickup {
                id: next_id,
                kind: PickupKind::Coin,
                pos: Vec2::new(x, track.height_at(x) + PICKUP_LIFT),
                value: COIN_VALUE,
                taken: false,
            });
            next_id += 1;
        }
        base += COIN_SPACING + rng.jitter(COIN_SPACING_JITTER);
    }

    let mut x = FUEL_START_X + rng.jitter(FUEL_SPACING_JITTER);
    let mut index = 0u32;
    while x < x_end {
        let arch = FUEL_ARCH * 0.5 * (1.0 + (index as f32 * 1.3).sin());
        pickups.push(Pickup {
            id: next_id,
            kind: PickupKind::Fuel,
            pos: Vec2::new(x, track.height_at(x) + PICKUP_LIFT + arch),
            value: FUEL_VALUE,
            taken: false,
        });
        next_id += 1;
        index += 1;
        x += FUEL_SPACING + rng.jitter(FUEL_SPACING_JITTER);
    }

    log::debug!("Placed {} pickups ({} fuel)", pickups.len(), index);
    pickups
}
