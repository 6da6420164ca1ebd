//! Fixed timestep simulation tick
//!
//! `Session` owns everything that changes during a run. `tick` advances it
//! by exactly one step; the loop above decides how many steps a frame gets.

use glam::Vec2;

use super::control::{self, DriveContext, tuning::*};
use super::physics::{ContactSet, MotorCommand, PhysicsWorld, RigBody, Wheel};
use super::pickups::{Pickup, PickupKind, layout_pickups};
use super::rig::RapierWorld;
use super::rig::tuning::{
    CHASSIS_ANGULAR_DAMPING, CHASSIS_LINEAR_DAMPING, HEAD_OFFSET, WHEEL_ANGULAR_DAMPING,
};
use super::state::{AirState, RunState, RunStatus, SimEvent};
use super::terrain::Track;
use crate::consts::*;

/// Input commands for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInput {
    /// Pedal target, -1 (brake/reverse) to 1 (gas)
    pub throttle: f32,
    pub boost: bool,
}

impl TickInput {
    pub fn sanitized(self) -> Self {
        Self {
            throttle: control::clamp_pedal(self.throttle),
            ..self
        }
    }
}

/// All mutable state of one run
pub struct Session<W: PhysicsWorld = RapierWorld> {
    pub seed: u32,
    pub track: Track,
    pub pickups: Vec<Pickup>,
    pub world: W,
    pub run: RunState,
    pub air: AirState,
    /// Smoothed pedal
    pub throttle: f32,
    /// Contacts reported by the last physics step
    pub contacts: ContactSet,
    pub time_ticks: u64,
    /// Bodies asleep after an ended run came to rest
    pub settled: bool,
    settle_time: f32,
    settle_damped: bool,
    events: Vec<SimEvent>,
}

impl<W: PhysicsWorld> Session<W> {
    /// Build track, pickups and rig from scratch
    pub fn new(seed: u32) -> Self {
        let track = Track::generate(seed);
        let pickups = layout_pickups(&track);
        let world = W::build(&track, Self::spawn_point(&track));
        Self {
            seed,
            track,
            pickups,
            world,
            run: RunState::default(),
            air: AirState::default(),
            throttle: 0.0,
            contacts: ContactSet::default(),
            time_ticks: 0,
            settled: false,
            settle_time: 0.0,
            settle_damped: false,
            events: Vec::new(),
        }
    }

    /// Chassis position at spawn
    pub fn spawn_point(track: &Track) -> Vec2 {
        Vec2::new(0.0, track.height_at(0.0) + SPAWN_HEIGHT)
    }

    /// Driver's head in world space
    pub fn head_point(&self) -> Vec2 {
        self.world.state(RigBody::Chassis).world_point(HEAD_OFFSET)
    }

    /// Points tested against pickups: chassis, both wheels, head
    pub fn reach_points(&self) -> [Vec2; 4] {
        [
            self.world.state(RigBody::Chassis).pos,
            self.world.state(RigBody::RearWheel).pos,
            self.world.state(RigBody::FrontWheel).pos,
            self.head_point(),
        ]
    }

    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    fn set_status(&mut self, next: RunStatus) {
        let from = self.run.status;
        if from == next {
            return;
        }
        debug_assert!(from.can_become(next), "{from:?} -> {next:?}");
        log::info!(
            "Run status {:?} -> {:?} at {:.1} m",
            from,
            next,
            self.run.distance_m
        );
        self.run.status = next;
        self.events.push(SimEvent::StatusChanged { from, to: next });
        match next {
            RunStatus::Crash => self.toast("CRASH!"),
            RunStatus::OutOfFuel => self.toast("OUT OF FUEL"),
            _ => {}
        }
    }

    fn toast(&mut self, text: &str) {
        self.run.toast.show(text);
        self.events.push(SimEvent::Toast(text.to_string()));
    }

    fn wake_normal_damping(&mut self) {
        if !self.settle_damped {
            return;
        }
        self.world.set_damping(
            RigBody::Chassis,
            CHASSIS_LINEAR_DAMPING,
            CHASSIS_ANGULAR_DAMPING,
        );
        for wheel in [Wheel::Rear, Wheel::Front] {
            self.world.set_damping(wheel.body(), 0.0, WHEEL_ANGULAR_DAMPING);
        }
        self.settle_damped = false;
        self.settle_time = 0.0;
    }
}

/// Advance the session by one fixed timestep
pub fn tick<W: PhysicsWorld>(session: &mut Session<W>, input: &TickInput, dt: f32) {
    let input = input.sanitized();
    let chassis = session.world.state(RigBody::Chassis);
    let rear = session.world.state(RigBody::RearWheel);
    let speed = chassis.linvel.length();

    // 1. Pedal smoothing, first input starts the run
    let target = match session.run.status {
        RunStatus::OutOfFuel => input.throttle.min(0.0),
        RunStatus::Crash => 0.0,
        _ => input.throttle,
    };
    session.throttle = control::smooth_throttle(session.throttle, target, dt);
    if session.run.status == RunStatus::Idle && session.throttle.abs() > DEADZONE {
        session.set_status(RunStatus::Run);
    }

    // 2. Fuel
    if session.run.status == RunStatus::Run {
        let burn = control::fuel_drain_rate(session.throttle, speed) * dt;
        session.run.fuel = (session.run.fuel - burn).max(0.0);
        if session.run.fuel <= 0.0 {
            session.set_status(RunStatus::OutOfFuel);
            session.throttle = session.throttle.min(0.0);
        }
    }

    // 3. Effective drive
    let status = session.run.status;
    let drive = control::drive_value(status, session.throttle);

    // 4. Boost
    let boosting = control::boost_active(status, input.boost, session.run.boost01);
    if boosting {
        session.run.add_boost(-BOOST_SPEND * dt);
    }

    let live = matches!(status, RunStatus::Run | RunStatus::OutOfFuel);
    let grounded = session.contacts.grounded_wheels();
    if !session.settled {
        // 5. Motors
        let ctx = DriveContext {
            angle: chassis.angle,
            forward_speed: chassis.linvel.x,
            rear_angvel: rear.angvel,
            grounded: grounded > 0,
            boosting,
        };
        session
            .world
            .set_motor(Wheel::Rear, control::rear_motor(drive, &ctx));
        session
            .world
            .set_motor(Wheel::Front, control::front_motor(drive, &ctx));

        // 6. Ground assist and spin cap
        if status == RunStatus::Run && grounded > 0 {
            let torque = control::stabilization_torque(
                chassis.angle,
                chassis.angvel,
                session.throttle,
                speed,
                grounded,
            );
            session.world.apply_torque(RigBody::Chassis, torque);
        }
        if live {
            if let Some(angvel) = control::soft_cap_angvel(chassis.angvel) {
                session
                    .world
                    .set_velocity(RigBody::Chassis, chassis.linvel, angvel);
            }
        }

        // 7. Air control
        if live && grounded == 0 {
            session
                .world
                .apply_torque(RigBody::Chassis, control::air_torque(drive));
            session.run.add_boost(BOOST_AIR_CHARGE * dt);
        }
    }

    // 8. Physics
    session.contacts = session.world.step(dt);
    session.time_ticks += 1;

    // 9. Gauges
    let chassis = session.world.state(RigBody::Chassis);
    let rear = session.world.state(RigBody::RearWheel);
    session.run.distance_m = session.run.distance_m.max(chassis.pos.x);
    session.run.rpm01 = (rear.angvel.abs() / WHEEL_MAX_SPEED).clamp(0.0, 1.0);
    session.run.speed_kmh = chassis.linvel.length() * MS_TO_KMH;
    session.run.toast.tick(dt);

    // 10. Airtime and flips
    track_air(session, chassis.angle, dt);

    // 11. Pickups
    if matches!(session.run.status, RunStatus::Run | RunStatus::OutOfFuel) {
        collect_pickups(session);
    }

    // 12. Crash
    if session.run.status == RunStatus::Run {
        let head = chassis.world_point(HEAD_OFFSET);
        let head_depth = session.track.height_at(head.x) - head.y;
        let clearance = chassis.pos.y - session.track.height_at(chassis.pos.x);
        if control::is_crash(
            head_depth,
            chassis.angle,
            clearance,
            session.contacts.any_wheel(),
        ) {
            session.set_status(RunStatus::Crash);
            session.throttle = 0.0;
            session.air.clear();
            session.run.airtime_s = 0.0;
        }
    }

    // 13. Settle an ended run
    let speed = session.world.state(RigBody::Chassis).linvel.length();
    settle(session, speed, dt);
}

fn track_air<W: PhysicsWorld>(session: &mut Session<W>, angle: f32, dt: f32) {
    let live = matches!(session.run.status, RunStatus::Run | RunStatus::OutOfFuel);
    // Landing ends the jump in any status
    if session.air.active && session.contacts.both_wheels() {
        let flips = session.air.flips;
        session.air.clear();
        session.run.airtime_s = 0.0;
        if flips > 0 && live {
            pay_flips(session, flips);
        }
        return;
    }
    if !live {
        return;
    }
    if !session.air.active {
        if !session.contacts.any_wheel() {
            session.air.take_off(angle);
        }
        return;
    }

    let new_flips = session.air.track(angle, dt);
    session.run.flips += new_flips;
    session.run.airtime_s = session.air.elapsed;
}

fn pay_flips<W: PhysicsWorld>(session: &mut Session<W>, flips: u32) {
    let coins = FLIP_COINS * flips;
    // An empty tank only refills from cans
    let fuel = if session.run.status == RunStatus::Run {
        FLIP_FUEL * flips as f32
    } else {
        0.0
    };
    let boost = BOOST_PER_FLIP * flips as f32;
    session.run.coins += coins;
    session.run.add_fuel(fuel);
    session.run.add_boost(boost);
    session.events.push(SimEvent::FlipReward {
        flips,
        coins,
        fuel,
        boost,
    });
    log::debug!("Landed {flips} flip(s): +{coins} coins");
    let text = if flips == 1 {
        "FLIP!".to_string()
    } else {
        format!("{flips}x FLIP!")
    };
    session.toast(&text);
}

fn collect_pickups<W: PhysicsWorld>(session: &mut Session<W>) {
    let reach = session.reach_points();
    let reach_x = reach
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.x), hi.max(p.x))
        });
    let margin = PickupKind::Fuel.radius();

    for i in 0..session.pickups.len() {
        let pickup = &session.pickups[i];
        if pickup.taken
            || pickup.pos.x < reach_x.0 - margin
            || pickup.pos.x > reach_x.1 + margin
            || !reach.iter().any(|&p| pickup.reaches(p))
        {
            continue;
        }
        let (id, kind, value) = (pickup.id, pickup.kind, pickup.value);
        session.pickups[i].taken = true;
        session
            .events
            .push(SimEvent::PickupCollected { id, kind, value });
        log::debug!("Collected {kind:?} #{id}");

        match kind {
            PickupKind::Coin => {
                session.run.coins += value;
                session.run.add_boost(BOOST_PER_COIN);
            }
            PickupKind::Fuel => {
                let was_empty = session.run.fuel <= 0.0;
                session.run.add_fuel(value as f32);
                session.run.add_boost(BOOST_PER_FUEL);
                if session.run.status == RunStatus::OutOfFuel
                    && was_empty
                    && session.run.fuel > FUEL_RESUME
                {
                    session.set_status(RunStatus::Run);
                    session.wake_normal_damping();
                }
            }
        }
    }
}

fn settle<W: PhysicsWorld>(session: &mut Session<W>, speed: f32, dt: f32) {
    let status = session.run.status;
    let ended = status == RunStatus::Crash
        || (status == RunStatus::OutOfFuel && session.run.fuel <= 0.0);
    if !ended || session.settled {
        return;
    }
    let Some(needed) = control::settle_seconds(status) else {
        return;
    };

    if !session.settle_damped {
        for body in [RigBody::Chassis, RigBody::RearWheel, RigBody::FrontWheel] {
            session
                .world
                .set_damping(body, SETTLE_LINEAR_DAMPING, SETTLE_ANGULAR_DAMPING);
        }
        session.settle_damped = true;
    }

    if speed < SETTLE_SPEED {
        session.settle_time += dt;
    } else {
        session.settle_time = 0.0;
    }
    if session.settle_time < needed {
        return;
    }

    for body in [RigBody::Chassis, RigBody::RearWheel, RigBody::FrontWheel] {
        session.world.set_velocity(body, Vec2::ZERO, 0.0);
    }
    for wheel in [Wheel::Rear, Wheel::Front] {
        session.world.set_motor(wheel, MotorCommand::default());
    }
    session.world.sleep();
    session.settled = true;
    log::debug!("Rig settled after {:.2} s", session.settle_time);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::physics::scripted::ScriptedWorld;
    use crate::sim::physics::{RigBodies, SuspensionJoints};
    use proptest::prelude::*;
    use std::f32::consts::TAU;

    type TestSession = Session<ScriptedWorld>;

    const GAS: TickInput = TickInput {
        throttle: 1.0,
        boost: false,
    };
    const COAST: TickInput = TickInput {
        throttle: 0.0,
        boost: false,
    };

    fn running(seed: u32) -> TestSession {
        let mut s = TestSession::new(seed);
        for _ in 0..10 {
            tick(&mut s, &GAS, SIM_DT);
        }
        assert_eq!(s.run.status, RunStatus::Run);
        s.drain_events();
        s
    }

    /// Move the chassis to hover over the track at `x`
    fn hover(s: &mut TestSession, x: f32) {
        let y = s.track.height_at(x) + SPAWN_HEIGHT;
        s.world.place_chassis(Vec2::new(x, y), 0.0);
    }

    #[test]
    fn test_flat_start() {
        let s = TestSession::new(1337);
        let chassis = s.world.state(RigBody::Chassis);
        assert_eq!(s.run.status, RunStatus::Idle);
        assert_eq!(chassis.angle, 0.0);
        assert!((chassis.pos.y - (s.track.height_at(0.0) + SPAWN_HEIGHT)).abs() < 1e-5);
        assert_eq!(s.run.fuel, FUEL_MAX);
    }

    #[test]
    fn test_idle_until_pedal() {
        let mut s = TestSession::new(1337);
        for _ in 0..30 {
            tick(&mut s, &COAST, SIM_DT);
        }
        assert_eq!(s.run.status, RunStatus::Idle);
        assert_eq!(s.run.fuel, FUEL_MAX);
        tick(&mut s, &GAS, SIM_DT);
        assert_eq!(s.run.status, RunStatus::Run);
        assert!(s.drain_events().contains(&SimEvent::StatusChanged {
            from: RunStatus::Idle,
            to: RunStatus::Run,
        }));
    }

    #[test]
    fn test_fuel_exhaustion() {
        let mut s = TestSession::new(1337);
        // Slowest possible burn at full throttle is idle + throttle terms
        let bound = (FUEL_MAX / (FUEL_IDLE_DRAIN + FUEL_THROTTLE_DRAIN) / SIM_DT) as u32 + 120;
        let mut ticks = 0;
        while s.run.status != RunStatus::OutOfFuel && ticks < bound {
            tick(&mut s, &GAS, SIM_DT);
            ticks += 1;
        }
        assert_eq!(s.run.status, RunStatus::OutOfFuel);
        assert_eq!(s.run.fuel, 0.0);
        // Burn can't be faster than full throttle at rest allows
        assert!(ticks as f32 * SIM_DT > FUEL_MAX / (FUEL_IDLE_DRAIN + FUEL_THROTTLE_DRAIN) - 0.1);
        assert!(s.throttle <= 0.0);
        // Gas no longer reaches the rear wheel
        tick(&mut s, &GAS, SIM_DT);
        assert!(s.world.motor(Wheel::Rear).speed >= 0.0);
    }

    #[test]
    fn test_head_contact_crash() {
        let mut s = running(1337);
        let ground = s.track.height_at(0.0);
        s.world.place_chassis(Vec2::new(0.0, ground - 1.2), 0.0);
        s.world.set_grounded(true, true);
        tick(&mut s, &GAS, SIM_DT);
        assert_eq!(s.run.status, RunStatus::Crash);
        assert_eq!(s.throttle, 0.0);
        assert!(!s.air.active);
    }

    #[test]
    fn test_upside_down_needs_a_grounded_wheel() {
        // Head stays just above the flat pad; only the angle rule can fire
        let place = |s: &mut TestSession| {
            let ground = s.track.height_at(2.0);
            s.world.place_chassis(Vec2::new(2.0, ground + 0.8), 2.3);
            let head = s.head_point();
            assert!(head.y > s.track.height_at(head.x));
        };

        // Roof on the ground, wheels in the air
        let mut s = running(7);
        place(&mut s);
        s.world.set_grounded(false, false);
        tick(&mut s, &COAST, SIM_DT);
        assert_eq!(s.run.status, RunStatus::Run);

        let mut s = running(7);
        place(&mut s);
        s.world.set_grounded(true, false);
        tick(&mut s, &COAST, SIM_DT);
        assert_eq!(s.run.status, RunStatus::Crash);
    }

    #[test]
    fn test_crash_is_terminal() {
        let mut s = running(1337);
        let ground = s.track.height_at(0.0);
        s.world.place_chassis(Vec2::new(0.0, ground - 1.2), 0.0);
        tick(&mut s, &GAS, SIM_DT);
        assert_eq!(s.run.status, RunStatus::Crash);
        hover(&mut s, 0.0);
        for _ in 0..200 {
            tick(&mut s, &GAS, SIM_DT);
            assert_eq!(s.run.status, RunStatus::Crash);
        }
        assert_eq!(s.world.motor(Wheel::Rear).speed, 0.0);
    }

    #[test]
    fn test_crash_settles_and_sleeps() {
        let mut s = running(1337);
        let ground = s.track.height_at(0.0);
        s.world.place_chassis(Vec2::new(0.0, ground - 1.2), 0.0);
        tick(&mut s, &COAST, SIM_DT);
        assert_eq!(s.run.status, RunStatus::Crash);
        let needed = (SETTLE_CRASH_SECONDS / SIM_DT).ceil() as usize + 2;
        for _ in 0..needed {
            tick(&mut s, &COAST, SIM_DT);
        }
        assert!(s.settled);
        assert!(s.world.asleep);
        assert_eq!(s.world.damping[0], (SETTLE_LINEAR_DAMPING, SETTLE_ANGULAR_DAMPING));
    }

    #[test]
    fn test_distance_monotonic() {
        let mut s = running(1337);
        hover(&mut s, 30.0);
        tick(&mut s, &COAST, SIM_DT);
        let far = s.run.distance_m;
        assert!(far >= 30.0);
        hover(&mut s, 5.0);
        tick(&mut s, &COAST, SIM_DT);
        assert_eq!(s.run.distance_m, far);
    }

    #[test]
    fn test_pickup_idempotence() {
        let mut s = running(1337);
        let coin = s
            .pickups
            .iter()
            .find(|p| p.kind == PickupKind::Coin)
            .cloned()
            .unwrap();
        s.world.place_chassis(coin.pos, 0.0);
        tick(&mut s, &COAST, SIM_DT);
        assert!(s.pickups.iter().any(|p| p.id == coin.id && p.taken));
        let coins = s.run.coins;
        assert!(coins >= 1);
        for _ in 0..30 {
            tick(&mut s, &COAST, SIM_DT);
        }
        assert_eq!(s.run.coins, coins);
        let collected = s
            .drain_events()
            .iter()
            .filter(|e| matches!(e, SimEvent::PickupCollected { id, .. } if *id == coin.id))
            .count();
        assert_eq!(collected, 1);
    }

    #[test]
    fn test_refuel_resumes_run() {
        let mut s = running(1337);
        s.run.fuel = 0.001;
        tick(&mut s, &GAS, SIM_DT);
        assert_eq!(s.run.status, RunStatus::OutOfFuel);

        let can = s
            .pickups
            .iter()
            .find(|p| p.kind == PickupKind::Fuel)
            .cloned()
            .unwrap();
        s.world.place_chassis(can.pos, 0.0);
        s.drain_events();
        tick(&mut s, &COAST, SIM_DT);
        assert_eq!(s.run.status, RunStatus::Run);
        assert!(s.run.fuel > FUEL_RESUME);
        assert!(s.drain_events().contains(&SimEvent::StatusChanged {
            from: RunStatus::OutOfFuel,
            to: RunStatus::Run,
        }));
        assert_eq!(
            s.world.damping[0],
            (CHASSIS_LINEAR_DAMPING, CHASSIS_ANGULAR_DAMPING)
        );
    }

    #[test]
    fn test_two_flips_one_reward() {
        let mut s = running(1337);
        s.world.set_grounded(false, false);
        tick(&mut s, &COAST, SIM_DT);
        assert!(s.air.active);

        // Slightly more than 4π over the jump
        s.world.bodies[0].angvel = 2.0 * TAU / (120.0 * SIM_DT);
        for _ in 0..121 {
            tick(&mut s, &COAST, SIM_DT);
        }
        assert_eq!(s.run.flips, 2);
        assert!(s.run.airtime_s > 2.0);
        let coins_before = s.run.coins;
        let mid_air: Vec<_> = s.drain_events();
        assert!(!mid_air.iter().any(|e| matches!(e, SimEvent::FlipReward { .. })));

        s.world.bodies[0].angvel = 0.0;
        s.world.set_grounded(true, true);
        tick(&mut s, &COAST, SIM_DT);
        let rewards: Vec<_> = s
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, SimEvent::FlipReward { .. }))
            .collect();
        assert_eq!(rewards.len(), 1);
        assert!(matches!(rewards[0], SimEvent::FlipReward { flips: 2, .. }));
        assert_eq!(s.run.coins, coins_before + 2 * FLIP_COINS);
        assert_eq!(s.run.flips, 2);
        assert!(!s.air.active);
        assert_eq!(s.run.toast.text, "2x FLIP!");
    }

    #[test]
    fn test_exact_two_turns_in_the_air() {
        for ticks in [120u32, 180, 240] {
            let mut s = running(1337);
            s.world.set_grounded(false, false);
            tick(&mut s, &COAST, SIM_DT);
            assert!(s.air.active);

            s.world.bodies[0].angvel = 2.0 * TAU / (ticks as f32 * SIM_DT);
            for _ in 0..ticks {
                tick(&mut s, &COAST, SIM_DT);
            }
            assert_eq!(s.run.flips, 2, "{ticks} ticks");
        }
    }

    #[test]
    fn test_landing_out_of_fuel_ends_jump() {
        let mut s = running(1337);
        s.world.set_grounded(false, false);
        tick(&mut s, &COAST, SIM_DT);
        s.world.bodies[0].angvel = TAU / (60.0 * SIM_DT);
        for _ in 0..61 {
            tick(&mut s, &COAST, SIM_DT);
        }
        assert_eq!(s.run.flips, 1);

        s.run.fuel = 0.0001;
        tick(&mut s, &GAS, SIM_DT);
        assert_eq!(s.run.status, RunStatus::OutOfFuel);
        assert!(s.air.active);

        let coins = s.run.coins;
        s.drain_events();
        s.world.bodies[0].angvel = 0.0;
        s.world.set_grounded(true, true);
        tick(&mut s, &GAS, SIM_DT);
        assert!(!s.air.active);
        assert_eq!(s.run.airtime_s, 0.0);
        assert_eq!(s.run.coins, coins + FLIP_COINS);
        // Stunts don't refill an empty tank
        assert_eq!(s.run.fuel, 0.0);
        assert_eq!(s.run.status, RunStatus::OutOfFuel);
        assert!(s.drain_events().contains(&SimEvent::FlipReward {
            flips: 1,
            coins: FLIP_COINS,
            fuel: 0.0,
            boost: BOOST_PER_FLIP,
        }));
    }

    #[test]
    fn test_air_control_tilts_and_charges() {
        let mut s = running(1337);
        s.world.set_grounded(false, false);
        let boost = s.run.boost01;
        tick(&mut s, &COAST, SIM_DT);
        tick(&mut s, &GAS, SIM_DT);
        assert!(s.world.last_torques[0] > 0.0);
        assert!(s.run.boost01 > boost);
    }

    #[test]
    fn test_boost_spends() {
        let mut s = running(1337);
        s.run.boost01 = 0.5;
        let held = TickInput {
            throttle: 1.0,
            boost: true,
        };
        tick(&mut s, &held, SIM_DT);
        assert!(s.run.boost01 < 0.5);
        assert!(s.world.motor(Wheel::Rear).speed < -WHEEL_MAX_SPEED * 0.9);
    }

    #[test]
    fn test_nan_pedal_ignored() {
        let mut s = TestSession::new(1337);
        let bad = TickInput {
            throttle: f32::NAN,
            boost: true,
        };
        for _ in 0..20 {
            tick(&mut s, &bad, SIM_DT);
        }
        assert_eq!(s.run.status, RunStatus::Idle);
        assert!(s.throttle.is_finite());
    }

    #[derive(Debug, Clone)]
    struct Step {
        throttle: f32,
        boost: bool,
        advance: f32,
        angle: f32,
        rear: bool,
        front: bool,
    }

    fn step_strategy() -> impl Strategy<Value = Step> {
        (
            -3.0f32..3.0,
            any::<bool>(),
            0.0f32..2.0,
            -3.2f32..3.2,
            any::<bool>(),
            any::<bool>(),
        )
            .prop_map(|(throttle, boost, advance, angle, rear, front)| Step {
                throttle,
                boost,
                advance,
                angle,
                rear,
                front,
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_fuel_bounds_and_legal_transitions(
            seed in 0u32..1000,
            steps in prop::collection::vec(step_strategy(), 1..300),
        ) {
            let mut s = TestSession::new(seed);
            let mut x = 0.0f32;
            let mut seen_crash = false;
            for step in &steps {
                x += step.advance;
                let y = s.track.height_at(x) + SPAWN_HEIGHT;
                s.world.place_chassis(Vec2::new(x, y), step.angle);
                s.world.set_grounded(step.rear, step.front);
                let before = s.run.status;
                tick(&mut s, &TickInput { throttle: step.throttle, boost: step.boost }, SIM_DT);
                let after = s.run.status;

                prop_assert!((0.0..=FUEL_MAX).contains(&s.run.fuel));
                prop_assert!((0.0..=1.0).contains(&s.run.boost01));
                if seen_crash {
                    prop_assert_eq!(after, RunStatus::Crash);
                }
                seen_crash |= after == RunStatus::Crash;

                // Every change is a legal single step, chained from `before`
                let mut current = before;
                for event in s.drain_events() {
                    if let SimEvent::StatusChanged { from, to } = event {
                        prop_assert_eq!(from, current);
                        prop_assert!(from.can_become(to), "{:?} -> {:?}", from, to);
                        current = to;
                    }
                }
                prop_assert_eq!(current, after);
            }
        }
    }
}
