//! rapier2d backend: ground chain, safety floor and the car rig
//!
//! The chassis carries three boxes (main body, light raised cabin, heavy low
//! ballast) so the centre of mass sits low. Each wheel hangs off a joint that
//! locks the chassis-local x axis, springs along y and motors the rotation.

use glam::Vec2;
use rapier2d::prelude::*;

use super::physics::{
    BodyState, ContactSet, MotorCommand, PhysicsWorld, RigBodies, RigBody, SuspensionJoints,
    Wheel,
};
use super::terrain::Track;

/// Rig geometry and feel constants
pub mod tuning {
    use glam::Vec2;

    pub const GRAVITY: f32 = -10.0;

    /// (half extents, offset, density) per chassis fixture
    pub const MAIN_BOX: (Vec2, Vec2, f32) = (Vec2::new(1.35, 0.28), Vec2::new(0.0, 0.0), 1.0);
    pub const CABIN_BOX: (Vec2, Vec2, f32) =
        (Vec2::new(0.55, 0.32), Vec2::new(-0.15, 0.55), 0.35);
    pub const BALLAST_BOX: (Vec2, Vec2, f32) =
        (Vec2::new(0.9, 0.12), Vec2::new(0.0, -0.25), 3.0);
    pub const CHASSIS_FRICTION: f32 = 0.6;
    pub const CHASSIS_LINEAR_DAMPING: f32 = 0.05;
    pub const CHASSIS_ANGULAR_DAMPING: f32 = 0.6;

    /// Driver's head, in chassis space
    pub const HEAD_OFFSET: Vec2 = Vec2::new(-0.15, 0.95);

    pub const WHEEL_RADIUS: f32 = 0.48;
    pub const WHEEL_DENSITY: f32 = 0.9;
    pub const WHEEL_FRICTION: f32 = 1.25;
    pub const WHEEL_RESTITUTION: f32 = 0.05;
    pub const WHEEL_ANGULAR_DAMPING: f32 = 0.05;
    pub const REAR_WHEEL_ANCHOR: Vec2 = Vec2::new(-0.95, -0.62);
    pub const FRONT_WHEEL_ANCHOR: Vec2 = Vec2::new(1.0, -0.62);

    /// Suspension spring frequency (Hz) and damping ratio
    pub const SUSPENSION_HZ: f32 = 4.2;
    pub const SUSPENSION_DAMPING_RATIO: f32 = 0.7;
    pub const SUSPENSION_TRAVEL: f32 = 0.35;
    /// Gain used by the wheel velocity motor to reach its target
    pub const MOTOR_GAIN: f32 = 40.0;

    pub const GROUND_FRICTION: f32 = 0.8;
    /// Safety floor depth below the lowest terrain sample
    pub const FLOOR_DEPTH: f32 = 60.0;
    pub const FLOOR_HALF_THICKNESS: f32 = 2.0;
}

use tuning::*;

/// Acceleration-based spring gains (stiffness, damping) for the suspension
pub fn suspension_gains() -> (f32, f32) {
    let omega = std::f32::consts::TAU * SUSPENSION_HZ;
    (omega * omega, 2.0 * SUSPENSION_DAMPING_RATIO * omega)
}

/// rapier world holding the ground and one car
pub struct RapierWorld {
    pipeline: PhysicsPipeline,
    gravity: Vector<Real>,
    integration_params: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    ground_colliders: [ColliderHandle; 2],
    chassis: RigidBodyHandle,
    wheels: [RigidBodyHandle; 2],
    wheel_colliders: [ColliderHandle; 2],
    joints: [ImpulseJointHandle; 2],
    motors: [MotorCommand; 2],
}

impl RapierWorld {
    fn handle(&self, body: RigBody) -> RigidBodyHandle {
        match body {
            RigBody::Chassis => self.chassis,
            RigBody::RearWheel => self.wheels[0],
            RigBody::FrontWheel => self.wheels[1],
        }
    }

    /// Number of ground manifolds with live solver contacts against `collider`
    fn ground_contacts(&self, collider: ColliderHandle) -> u32 {
        self.ground_colliders
            .iter()
            .filter_map(|&ground| self.narrow_phase.contact_pair(ground, collider))
            .filter(|pair| pair.has_any_active_contact)
            .map(|pair| {
                pair.manifolds
                    .iter()
                    .filter(|m| !m.data.solver_contacts.is_empty())
                    .count() as u32
            })
            .sum()
    }

    fn build_ground(
        track: &Track,
        bodies: &mut RigidBodySet,
        colliders: &mut ColliderSet,
    ) -> [ColliderHandle; 2] {
        let ground = bodies.insert(RigidBodyBuilder::fixed().build());

        let chain: Vec<Point<Real>> = track.points().map(|p| point![p.x, p.y]).collect();
        let chain = colliders.insert_with_parent(
            ColliderBuilder::polyline(chain, None)
                .friction(GROUND_FRICTION)
                .build(),
            ground,
            bodies,
        );

        let half_width = (track.x_max() - track.x_min()) * 0.5 + FLOOR_DEPTH;
        let center_x = (track.x_max() + track.x_min()) * 0.5;
        let floor_y = track.min_height() - FLOOR_DEPTH;
        let floor = colliders.insert_with_parent(
            ColliderBuilder::cuboid(half_width, FLOOR_HALF_THICKNESS)
                .translation(vector![center_x, floor_y])
                .friction(GROUND_FRICTION)
                .build(),
            ground,
            bodies,
        );

        [chain, floor]
    }

    fn wheel_joint(anchor: Vec2) -> GenericJoint {
        let (stiffness, damping) = suspension_gains();
        GenericJointBuilder::new(JointAxesMask::LIN_X)
            .local_anchor1(point![anchor.x, anchor.y])
            .local_anchor2(point![0.0, 0.0])
            .limits(JointAxis::LinY, [-SUSPENSION_TRAVEL, SUSPENSION_TRAVEL])
            .motor_model(JointAxis::LinY, MotorModel::AccelerationBased)
            .motor_position(JointAxis::LinY, 0.0, stiffness, damping)
            .motor_model(JointAxis::AngX, MotorModel::ForceBased)
            .motor_velocity(JointAxis::AngX, 0.0, MOTOR_GAIN)
            .motor_max_force(JointAxis::AngX, 0.0)
            .contacts_enabled(false)
            .build()
    }
}

impl RigBodies for RapierWorld {
    fn state(&self, body: RigBody) -> BodyState {
        let rb = &self.rigid_body_set[self.handle(body)];
        let t = rb.translation();
        let v = rb.linvel();
        BodyState {
            pos: Vec2::new(t.x, t.y),
            angle: rb.rotation().angle(),
            linvel: Vec2::new(v.x, v.y),
            angvel: rb.angvel(),
        }
    }

    fn apply_torque(&mut self, body: RigBody, torque: f32) {
        let handle = self.handle(body);
        if let Some(rb) = self.rigid_body_set.get_mut(handle) {
            rb.add_torque(torque, true);
        }
    }

    fn set_velocity(&mut self, body: RigBody, linvel: Vec2, angvel: f32) {
        let handle = self.handle(body);
        if let Some(rb) = self.rigid_body_set.get_mut(handle) {
            rb.set_linvel(vector![linvel.x, linvel.y], true);
            rb.set_angvel(angvel, true);
        }
    }

    fn set_damping(&mut self, body: RigBody, linear: f32, angular: f32) {
        let handle = self.handle(body);
        if let Some(rb) = self.rigid_body_set.get_mut(handle) {
            rb.set_linear_damping(linear);
            rb.set_angular_damping(angular);
        }
    }

    fn sleep(&mut self) {
        for handle in [self.chassis, self.wheels[0], self.wheels[1]] {
            if let Some(rb) = self.rigid_body_set.get_mut(handle) {
                rb.reset_forces(false);
                rb.reset_torques(false);
                rb.sleep();
            }
        }
    }
}

impl SuspensionJoints for RapierWorld {
    fn set_motor(&mut self, wheel: Wheel, command: MotorCommand) {
        let i = wheel as usize;
        if self.motors[i] == command {
            return;
        }
        self.motors[i] = command;
        if let Some(joint) = self.impulse_joint_set.get_mut(self.joints[i]) {
            joint
                .data
                .set_motor_velocity(JointAxis::AngX, command.speed, MOTOR_GAIN);
            joint
                .data
                .set_motor_max_force(JointAxis::AngX, command.max_torque.max(0.0));
        }
    }

    fn motor(&self, wheel: Wheel) -> MotorCommand {
        self.motors[wheel as usize]
    }
}

impl PhysicsWorld for RapierWorld {
    fn build(track: &Track, spawn: Vec2) -> Self {
        let mut rigid_body_set = RigidBodySet::new();
        let mut collider_set = ColliderSet::new();
        let mut impulse_joint_set = ImpulseJointSet::new();

        let ground_colliders = Self::build_ground(track, &mut rigid_body_set, &mut collider_set);

        let chassis = rigid_body_set.insert(
            RigidBodyBuilder::dynamic()
                .translation(vector![spawn.x, spawn.y])
                .linear_damping(CHASSIS_LINEAR_DAMPING)
                .angular_damping(CHASSIS_ANGULAR_DAMPING)
                .ccd_enabled(true)
                .build(),
        );
        for (half, offset, density) in [MAIN_BOX, CABIN_BOX, BALLAST_BOX] {
            collider_set.insert_with_parent(
                ColliderBuilder::cuboid(half.x, half.y)
                    .translation(vector![offset.x, offset.y])
                    .density(density)
                    .friction(CHASSIS_FRICTION)
                    .build(),
                chassis,
                &mut rigid_body_set,
            );
        }

        let mut wheels = [chassis; 2];
        let mut wheel_colliders = [ColliderHandle::invalid(); 2];
        let mut joints = Vec::with_capacity(2);
        for (i, anchor) in [REAR_WHEEL_ANCHOR, FRONT_WHEEL_ANCHOR].into_iter().enumerate() {
            let at = spawn + anchor;
            let wheel = rigid_body_set.insert(
                RigidBodyBuilder::dynamic()
                    .translation(vector![at.x, at.y])
                    .angular_damping(WHEEL_ANGULAR_DAMPING)
                    .ccd_enabled(true)
                    .build(),
            );
            wheel_colliders[i] = collider_set.insert_with_parent(
                ColliderBuilder::ball(WHEEL_RADIUS)
                    .density(WHEEL_DENSITY)
                    .friction(WHEEL_FRICTION)
                    .restitution(WHEEL_RESTITUTION)
                    .build(),
                wheel,
                &mut rigid_body_set,
            );
            wheels[i] = wheel;
            joints.push(impulse_joint_set.insert(chassis, wheel, Self::wheel_joint(anchor), true));
        }

        let mut integration_params = IntegrationParameters::default();
        integration_params.dt = crate::consts::SIM_DT;

        log::info!(
            "Rig spawned at ({:.2}, {:.2}), chassis mass {:.2}",
            spawn.x,
            spawn.y,
            rigid_body_set[chassis].mass()
        );

        Self {
            pipeline: PhysicsPipeline::new(),
            gravity: vector![0.0, GRAVITY],
            integration_params,
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set,
            collider_set,
            impulse_joint_set,
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            ground_colliders,
            chassis,
            wheels,
            wheel_colliders,
            joints: [joints[0], joints[1]],
            motors: [MotorCommand::default(); 2],
        }
    }

    fn step(&mut self, dt: f32) -> ContactSet {
        self.integration_params.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );

        for handle in [self.chassis, self.wheels[0], self.wheels[1]] {
            if let Some(rb) = self.rigid_body_set.get_mut(handle) {
                rb.reset_forces(false);
                rb.reset_torques(false);
            }
        }

        ContactSet {
            rear: self.ground_contacts(self.wheel_colliders[0]),
            front: self.ground_contacts(self.wheel_colliders[1]),
        }
    }
}
