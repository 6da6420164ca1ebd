//! Run state and the snapshots handed to the host
//!
//! Everything the HUD or the game-over path reads lives here. The tick
//! mutates these; the loop only ever copies them out.

use serde::{Deserialize, Serialize};

use super::pickups::PickupKind;
use crate::consts::FUEL_MAX;
use crate::wrap_angle_delta;

/// Lifecycle of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    /// Spawned, waiting for the first pedal input
    #[default]
    Idle,
    Run,
    /// Terminal until reset
    Crash,
    /// Terminal unless a fuel can is reached while coasting
    OutOfFuel,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Crash | RunStatus::OutOfFuel)
    }

    /// Whether `self -> next` is a transition the tick may make
    pub fn can_become(self, next: RunStatus) -> bool {
        use RunStatus::*;
        matches!(
            (self, next),
            (Idle, Run) | (Run, Crash) | (Run, OutOfFuel) | (OutOfFuel, Run)
        )
    }
}

/// How long a toast stays on screen
pub const TOAST_SECONDS: f32 = 1.6;

/// Short-lived HUD message
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Toast {
    pub text: String,
    /// Seconds left before it disappears
    pub remaining: f32,
    /// Bumped for every new message, so repeats are still "new"
    pub seq: u32,
}

impl Toast {
    pub fn show(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.remaining = TOAST_SECONDS;
        self.seq = self.seq.wrapping_add(1);
    }

    pub fn tick(&mut self, dt: f32) {
        if self.remaining > 0.0 {
            self.remaining = (self.remaining - dt).max(0.0);
            if self.remaining == 0.0 {
                self.text.clear();
            }
        }
    }

    pub fn visible(&self) -> bool {
        self.remaining > 0.0
    }
}

/// Score and gauges for the current run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    /// Furthest chassis x reached, never decreases
    pub distance_m: f32,
    /// All-time best supplied by the host; never written by the tick
    pub best_m: f32,
    pub coins: u32,
    /// 0..=FUEL_MAX
    pub fuel: f32,
    pub status: RunStatus,
    pub rpm01: f32,
    pub boost01: f32,
    pub speed_kmh: f32,
    /// Length of the current jump
    pub airtime_s: f32,
    pub flips: u32,
    pub toast: Toast,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            distance_m: 0.0,
            best_m: 0.0,
            coins: 0,
            fuel: FUEL_MAX,
            status: RunStatus::Idle,
            rpm01: 0.0,
            boost01: 0.0,
            speed_kmh: 0.0,
            airtime_s: 0.0,
            flips: 0,
            toast: Toast::default(),
        }
    }
}

impl RunState {
    pub fn add_fuel(&mut self, amount: f32) {
        self.fuel = (self.fuel + amount).clamp(0.0, FUEL_MAX);
    }

    pub fn add_boost(&mut self, amount: f32) {
        self.boost01 = (self.boost01 + amount).clamp(0.0, 1.0);
    }

    pub fn snapshot(&self, paused: bool) -> HudSnapshot {
        HudSnapshot {
            distance_m: self.distance_m.max(0.0).floor() as u32,
            best_m: self.best_m.max(0.0).floor() as u32,
            coins: self.coins,
            fuel: self.fuel,
            status: self.status,
            rpm01: self.rpm01,
            boost01: self.boost01,
            speed_kmh: self.speed_kmh,
            airtime_s: self.airtime_s,
            flips: self.flips,
            toast: self.toast.visible().then(|| self.toast.text.clone()),
            toast_t: self.toast.remaining,
            paused,
        }
    }
}

/// Rotation short of a whole turn that still counts as one (radians)
const FLIP_TOLERANCE: f32 = 1e-3;

/// Rotation tracking for one jump
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AirState {
    pub active: bool,
    pub elapsed: f32,
    /// Signed, unwrapped rotation since takeoff
    pub rotation: f32,
    pub last_angle: f32,
    /// Whole turns completed during this jump
    pub flips: u32,
}

impl AirState {
    /// Start tracking a jump from the chassis angle at takeoff
    pub fn take_off(&mut self, angle: f32) {
        *self = Self {
            active: true,
            last_angle: angle,
            ..Default::default()
        };
    }

    /// Accumulate one tick of rotation. Returns the number of new whole turns.
    pub fn track(&mut self, angle: f32, dt: f32) -> u32 {
        self.elapsed += dt;
        self.rotation += wrap_angle_delta(angle, self.last_angle);
        self.last_angle = angle;
        let whole = (self.rotation.abs() + FLIP_TOLERANCE) / std::f32::consts::TAU;
        let turns = whole.floor() as u32;
        let new = turns.saturating_sub(self.flips);
        self.flips = turns.max(self.flips);
        new
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Read-only HUD view, emitted by the loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HudSnapshot {
    pub distance_m: u32,
    pub best_m: u32,
    pub coins: u32,
    pub fuel: f32,
    pub status: RunStatus,
    pub rpm01: f32,
    pub boost01: f32,
    pub speed_kmh: f32,
    pub airtime_s: f32,
    pub flips: u32,
    pub toast: Option<String>,
    pub toast_t: f32,
    pub paused: bool,
}

/// Things that happened during a tick, drained by the loop
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    StatusChanged { from: RunStatus, to: RunStatus },
    PickupCollected { id: u32, kind: PickupKind, value: u32 },
    /// Combined payout for every flip of one jump
    FlipReward { flips: u32, coins: u32, fuel: f32, boost: f32 },
    Toast(String),
}
