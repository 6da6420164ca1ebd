//! Per-tick control laws
//!
//! Pure functions from pedal input and rig state to motor commands and
//! torques. The tick wires them to the world; nothing here touches it.

use super::physics::MotorCommand;
use super::state::RunStatus;
use crate::{lerp, normalize_angle, smoothstep};

/// Feel constants. Chosen by hand, not derived.
pub mod tuning {
    /// Pedal response time constant (s)
    pub const THROTTLE_TAU: f32 = 0.1;
    /// Pedal magnitude below which the input counts as neutral
    pub const DEADZONE: f32 = 0.05;

    /// Fuel burned per second: idle + throttle + speed terms
    pub const FUEL_IDLE_DRAIN: f32 = 0.55;
    pub const FUEL_THROTTLE_DRAIN: f32 = 1.6;
    pub const FUEL_SPEED_DRAIN: f32 = 0.02;
    /// Fuel needed to leave OUT_OF_FUEL after a refill
    pub const FUEL_RESUME: f32 = 1.0;

    pub const BOOST_SPEND: f32 = 0.45;
    pub const BOOST_MIN: f32 = 0.05;
    pub const BOOST_MULT: f32 = 1.55;
    pub const BOOST_AIR_CHARGE: f32 = 0.06;
    pub const BOOST_PER_FLIP: f32 = 0.25;
    pub const BOOST_PER_COIN: f32 = 0.02;
    pub const BOOST_PER_FUEL: f32 = 0.12;

    /// Rear wheel target speed at full throttle (rad/s)
    pub const WHEEL_MAX_SPEED: f32 = 42.0;
    pub const DRIVE_TORQUE: f32 = 30.0;
    /// Share of drive torque left when the wheel is at max speed
    pub const DRIVE_TAPER_FLOOR: f32 = 0.2;
    pub const AIR_TRACTION: f32 = 0.25;
    /// Pitch above which drive power is cut, and the cut at full pitch
    pub const PITCH_CUT_START: f32 = 1.05;
    pub const PITCH_CUT_FULL: f32 = 1.5;
    pub const PITCH_CUT_MIN: f32 = 0.35;

    pub const BRAKE_TORQUE: f32 = 40.0;
    /// Nose-down pitch over which braking is reduced
    pub const ENDO_START: f32 = 0.35;
    pub const ENDO_FULL: f32 = 0.9;
    pub const ENDO_CUT: f32 = 0.6;
    pub const REVERSE_SPEED: f32 = 9.0;
    pub const REVERSE_TORQUE: f32 = 14.0;
    /// Forward speed (m/s) under which the brake pedal reverses
    pub const REVERSE_BELOW: f32 = 1.5;
    pub const IDLE_TORQUE: f32 = 0.4;

    pub const STAB_P: f32 = 6.0;
    pub const STAB_D: f32 = 1.4;
    pub const STAB_ONE_WHEEL: f32 = 0.45;
    /// Throttle share that fades the assist out
    pub const STAB_THROTTLE_FADE: f32 = 0.8;
    /// Speed (m/s) at which the assist is fully faded by speed
    pub const STAB_FADE_SPEED: f32 = 16.0;
    pub const STAB_SPEED_FADE: f32 = 0.7;

    pub const ANGVEL_CAP: f32 = 7.5;
    /// Share of the excess over the cap removed each tick
    pub const ANGVEL_BLEED: f32 = 0.5;
    pub const AIR_TORQUE: f32 = 7.0;

    pub const CRASH_ANGLE: f32 = 2.2;
    pub const CRASH_CLEARANCE: f32 = 0.85;

    pub const SETTLE_LINEAR_DAMPING: f32 = 0.9;
    pub const SETTLE_ANGULAR_DAMPING: f32 = 2.5;
    pub const SETTLE_SPEED: f32 = 0.35;
    pub const SETTLE_CRASH_SECONDS: f32 = 0.6;
    pub const SETTLE_OUT_OF_FUEL_SECONDS: f32 = 2.0;

    pub const FLIP_COINS: u32 = 5;
    pub const FLIP_FUEL: f32 = 4.0;
}

use tuning::*;

/// Sanitize a raw pedal value to [-1, 1]
pub fn clamp_pedal(raw: f32) -> f32 {
    if raw.is_finite() {
        raw.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Move `current` toward `target` with a first-order response
pub fn smooth_throttle(current: f32, target: f32, dt: f32) -> f32 {
    let k = 1.0 - (-dt / THROTTLE_TAU).exp();
    current + (target - current) * k
}

/// Fuel burned per second at this pedal and speed
pub fn fuel_drain_rate(throttle: f32, speed: f32) -> f32 {
    FUEL_IDLE_DRAIN + FUEL_THROTTLE_DRAIN * throttle.abs() + FUEL_SPEED_DRAIN * speed.max(0.0)
}

/// The pedal range each status lets through
pub fn drive_value(status: RunStatus, throttle: f32) -> f32 {
    match status {
        RunStatus::Idle | RunStatus::Run => throttle,
        RunStatus::OutOfFuel => throttle.min(0.0),
        RunStatus::Crash => 0.0,
    }
}

pub fn boost_active(status: RunStatus, held: bool, boost01: f32) -> bool {
    held && status == RunStatus::Run && boost01 > BOOST_MIN
}

/// Drive power factor: 1 until the pitch gets extreme
pub fn pitch_cut(angle: f32) -> f32 {
    let t = (normalize_angle(angle).abs() - PITCH_CUT_START) / (PITCH_CUT_FULL - PITCH_CUT_START);
    lerp(1.0, PITCH_CUT_MIN, smoothstep(t))
}

/// Brake factor: reduced when the nose already points down
pub fn endo_cut(angle: f32) -> f32 {
    let nose_down = -normalize_angle(angle);
    let t = (nose_down - ENDO_START) / (ENDO_FULL - ENDO_START);
    1.0 - ENDO_CUT * smoothstep(t)
}

/// Drive torque available at this wheel speed, strongest from standstill
pub fn torque_curve(wheel_angvel: f32) -> f32 {
    let frac = (wheel_angvel.abs() / WHEEL_MAX_SPEED).clamp(0.0, 1.0);
    DRIVE_TORQUE * lerp(1.0, DRIVE_TAPER_FLOOR, frac * frac)
}

/// Rig state the motor laws look at
#[derive(Debug, Clone, Copy, Default)]
pub struct DriveContext {
    pub angle: f32,
    /// Chassis velocity along +x (m/s)
    pub forward_speed: f32,
    pub rear_angvel: f32,
    pub grounded: bool,
    pub boosting: bool,
}

/// Driven rear wheel
pub fn rear_motor(drive: f32, ctx: &DriveContext) -> MotorCommand {
    if drive > DEADZONE {
        let boost = if ctx.boosting { BOOST_MULT } else { 1.0 };
        let traction = if ctx.grounded { 1.0 } else { AIR_TRACTION };
        MotorCommand {
            // Clockwise spin drives toward +x
            speed: -WHEEL_MAX_SPEED * drive * boost,
            max_torque: torque_curve(ctx.rear_angvel) * traction * pitch_cut(ctx.angle) * boost,
        }
    } else if drive < -DEADZONE {
        brake_or_reverse(drive, ctx)
    } else {
        idle_motor()
    }
}

/// Front wheel only ever brakes
pub fn front_motor(drive: f32, ctx: &DriveContext) -> MotorCommand {
    if drive < -DEADZONE {
        MotorCommand {
            speed: 0.0,
            max_torque: BRAKE_TORQUE * -drive * endo_cut(ctx.angle),
        }
    } else {
        idle_motor()
    }
}

fn brake_or_reverse(drive: f32, ctx: &DriveContext) -> MotorCommand {
    let pedal = -drive;
    if ctx.forward_speed < REVERSE_BELOW {
        MotorCommand {
            speed: REVERSE_SPEED * pedal,
            max_torque: REVERSE_TORQUE * pedal,
        }
    } else {
        MotorCommand {
            speed: 0.0,
            max_torque: BRAKE_TORQUE * pedal * endo_cut(ctx.angle),
        }
    }
}

fn idle_motor() -> MotorCommand {
    MotorCommand {
        speed: 0.0,
        max_torque: IDLE_TORQUE,
    }
}

/// Corrective torque toward level while on the ground
pub fn stabilization_torque(
    angle: f32,
    angvel: f32,
    throttle: f32,
    speed: f32,
    grounded_wheels: u32,
) -> f32 {
    let weight = match grounded_wheels {
        0 => return 0.0,
        1 => STAB_ONE_WHEEL,
        _ => 1.0,
    };
    let throttle_fade = 1.0 - STAB_THROTTLE_FADE * throttle.abs().min(1.0);
    let speed_fade = 1.0 - STAB_SPEED_FADE * smoothstep(speed / STAB_FADE_SPEED);
    (-STAB_P * normalize_angle(angle) - STAB_D * angvel) * weight * throttle_fade * speed_fade
}

/// Bleed angular velocity above the cap; `None` when under it
pub fn soft_cap_angvel(angvel: f32) -> Option<f32> {
    let excess = angvel.abs() - ANGVEL_CAP;
    (excess > 0.0).then(|| angvel.signum() * (ANGVEL_CAP + excess * (1.0 - ANGVEL_BLEED)))
}

/// Pedal-driven tilt in the air: gas lifts the nose
pub fn air_torque(drive: f32) -> f32 {
    if drive.abs() > DEADZONE {
        AIR_TORQUE * drive
    } else {
        0.0
    }
}

/// Crash test for a running car
///
/// `head_depth` is terrain height minus head height at the head's x;
/// `clearance` is chassis height above the terrain under it.
pub fn is_crash(head_depth: f32, angle: f32, clearance: f32, wheel_grounded: bool) -> bool {
    head_depth > 0.0
        || (normalize_angle(angle).abs() > CRASH_ANGLE
            && clearance < CRASH_CLEARANCE
            && wheel_grounded)
}

/// How long the car must stay slow before it is put to sleep
pub fn settle_seconds(status: RunStatus) -> Option<f32> {
    match status {
        RunStatus::Crash => Some(SETTLE_CRASH_SECONDS),
        RunStatus::OutOfFuel => Some(SETTLE_OUT_OF_FUEL_SECONDS),
        _ => None,
    }
}
