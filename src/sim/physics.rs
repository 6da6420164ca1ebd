//! Rigid-body capability interface
//!
//! Control logic talks to the simulation backend only through these traits,
//! in `glam` types. The rapier-backed implementation lives in `rig`.

use glam::Vec2;

use super::terrain::Track;
use crate::local_to_world;

/// Bodies of the vehicle rig
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RigBody {
    Chassis,
    RearWheel,
    FrontWheel,
}

/// Suspension joints; the rear one is the only driven wheel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wheel {
    Rear,
    Front,
}

impl Wheel {
    pub fn body(self) -> RigBody {
        match self {
            Wheel::Rear => RigBody::RearWheel,
            Wheel::Front => RigBody::FrontWheel,
        }
    }
}

/// Kinematic snapshot of one body
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BodyState {
    pub pos: Vec2,
    /// Radians, counter-clockwise; 0 is level
    pub angle: f32,
    pub linvel: Vec2,
    pub angvel: f32,
}

impl BodyState {
    /// World position of a body-local point
    pub fn world_point(&self, local: Vec2) -> Vec2 {
        local_to_world(self.pos, self.angle, local)
    }
}

/// Wheel motor target. Positive speed turns the wheel counter-clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotorCommand {
    pub speed: f32,
    pub max_torque: f32,
}

/// Wheel-ground contacts counted after a step.
///
/// A wheel can touch several ground segments at once; it is grounded while
/// its count is above zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContactSet {
    pub rear: u32,
    pub front: u32,
}

impl ContactSet {
    pub fn grounded_wheels(&self) -> u32 {
        (self.rear > 0) as u32 + (self.front > 0) as u32
    }

    pub fn any_wheel(&self) -> bool {
        self.grounded_wheels() > 0
    }

    pub fn both_wheels(&self) -> bool {
        self.grounded_wheels() == 2
    }
}

/// Per-body state and forces
pub trait RigBodies {
    fn state(&self, body: RigBody) -> BodyState;
    /// Accumulate a torque for the next step
    fn apply_torque(&mut self, body: RigBody, torque: f32);
    fn set_velocity(&mut self, body: RigBody, linvel: Vec2, angvel: f32);
    fn set_damping(&mut self, body: RigBody, linear: f32, angular: f32);
    /// Put every rig body to sleep
    fn sleep(&mut self);
}

/// Motorized spring-damper wheel joints
pub trait SuspensionJoints {
    fn set_motor(&mut self, wheel: Wheel, command: MotorCommand);
    fn motor(&self, wheel: Wheel) -> MotorCommand;
}

/// A steppable world holding the ground and one vehicle rig
pub trait PhysicsWorld: RigBodies + SuspensionJoints {
    /// Build the ground from `track` and spawn the rig with its chassis at `spawn`
    fn build(track: &Track, spawn: Vec2) -> Self
    where
        Self: Sized;

    /// Advance one fixed tick, clear accumulated forces and report contacts
    fn step(&mut self, dt: f32) -> ContactSet;
}

#[cfg(test)]
pub(crate) mod scripted {
    //! Hand-driven world for tick tests: bodies move only by their set
    //! velocities, contacts are whatever the test says.

    use super::*;

    #[derive(Debug, Clone)]
    pub struct ScriptedWorld {
        pub bodies: [BodyState; 3],
        pub motors: [MotorCommand; 2],
        pub contacts: ContactSet,
        pub torques: [f32; 3],
        pub last_torques: [f32; 3],
        pub damping: [(f32, f32); 3],
        pub asleep: bool,
        pub steps: u32,
    }

    fn index(body: RigBody) -> usize {
        match body {
            RigBody::Chassis => 0,
            RigBody::RearWheel => 1,
            RigBody::FrontWheel => 2,
        }
    }

    impl ScriptedWorld {
        pub fn place_chassis(&mut self, pos: Vec2, angle: f32) {
            let delta = pos - self.bodies[0].pos;
            for b in &mut self.bodies {
                b.pos += delta;
            }
            self.bodies[0].angle = angle;
        }

        pub fn set_grounded(&mut self, rear: bool, front: bool) {
            self.contacts.rear = rear as u32;
            self.contacts.front = front as u32;
        }
    }

    impl RigBodies for ScriptedWorld {
        fn state(&self, body: RigBody) -> BodyState {
            self.bodies[index(body)]
        }

        fn apply_torque(&mut self, body: RigBody, torque: f32) {
            self.torques[index(body)] += torque;
        }

        fn set_velocity(&mut self, body: RigBody, linvel: Vec2, angvel: f32) {
            let b = &mut self.bodies[index(body)];
            b.linvel = linvel;
            b.angvel = angvel;
        }

        fn set_damping(&mut self, body: RigBody, linear: f32, angular: f32) {
            self.damping[index(body)] = (linear, angular);
        }

        fn sleep(&mut self) {
            self.asleep = true;
        }
    }

    impl SuspensionJoints for ScriptedWorld {
        fn set_motor(&mut self, wheel: Wheel, command: MotorCommand) {
            self.motors[wheel as usize] = command;
        }

        fn motor(&self, wheel: Wheel) -> MotorCommand {
            self.motors[wheel as usize]
        }
    }

    impl PhysicsWorld for ScriptedWorld {
        fn build(_track: &Track, spawn: Vec2) -> Self {
            let at = |offset: Vec2| BodyState {
                pos: spawn + offset,
                ..Default::default()
            };
            Self {
                bodies: [
                    at(Vec2::ZERO),
                    at(Vec2::new(-0.95, -0.62)),
                    at(Vec2::new(1.0, -0.62)),
                ],
                motors: [MotorCommand::default(); 2],
                contacts: ContactSet { rear: 1, front: 1 },
                torques: [0.0; 3],
                last_torques: [0.0; 3],
                damping: [(0.0, 0.0); 3],
                asleep: false,
                steps: 0,
            }
        }

        fn step(&mut self, dt: f32) -> ContactSet {
            if !self.asleep {
                for b in &mut self.bodies {
                    b.pos += b.linvel * dt;
                }
                self.bodies[0].angle += self.bodies[0].angvel * dt;
            }
            self.last_torques = std::mem::take(&mut self.torques);
            self.steps += 1;
            self.contacts
        }
    }
}
