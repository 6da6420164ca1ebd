//! Frame driver
//!
//! Turns variable host frame times into fixed simulation ticks, moves the
//! camera once per frame, throttles HUD output and fires the game-over
//! event once per terminal status.

use crate::camera::Camera;
use crate::consts::{MAX_FRAME_DT, SIM_DT};
use crate::renderer::scene::{Scene, build_scene};
use crate::renderer::snapshot::{RgbaImage, SnapshotSource};
use crate::settings::Settings;
use crate::sim::physics::{PhysicsWorld, RigBody};
use crate::sim::rig::RapierWorld;
use crate::sim::state::{HudSnapshot, RunStatus, SimEvent};
use crate::sim::tick::{Session, TickInput, tick};

/// Fired once when a run enters CRASH or OUT_OF_FUEL
#[derive(Debug, Clone, PartialEq)]
pub struct GameOverEvent {
    /// `None` when capture failed
    pub snapshot: Option<RgbaImage>,
    pub distance_m: u32,
    pub status: RunStatus,
}

/// What one host frame produced
#[derive(Debug, Clone, Default)]
pub struct FrameOutput {
    pub hud: Option<HudSnapshot>,
    pub game_over: Option<GameOverEvent>,
    pub events: Vec<SimEvent>,
    /// Simulation ticks run this frame
    pub ticks: u32,
}

pub struct Game<W: PhysicsWorld = RapierWorld> {
    session: Session<W>,
    pub camera: Camera,
    settings: Settings,
    input: TickInput,
    accumulator: f32,
    paused: bool,
    /// External all-time best, survives resets
    best_m: f32,
    hud_timer: f32,
    hud_dirty: bool,
    last_status: RunStatus,
    last_toast_seq: u32,
    /// Terminal status the game-over event was already fired for
    last_end_status: Option<RunStatus>,
}

impl<W: PhysicsWorld> Game<W> {
    pub fn new(seed: u32, settings: Settings) -> Self {
        let camera = Camera::new(settings.compact_display, settings.reduced_motion);
        let mut game = Self {
            session: Session::new(seed),
            camera,
            settings,
            input: TickInput::default(),
            accumulator: 0.0,
            paused: false,
            best_m: 0.0,
            hud_timer: 0.0,
            hud_dirty: true,
            last_status: RunStatus::Idle,
            last_toast_seq: 0,
            last_end_status: None,
        };
        game.snap_camera();
        log::info!("Game ready with seed {seed}");
        game
    }

    pub fn session(&self) -> &Session<W> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session<W> {
        &mut self.session
    }

    pub fn seed(&self) -> u32 {
        self.session.seed
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn status(&self) -> RunStatus {
        self.session.run.status
    }

    pub fn set_throttle(&mut self, throttle: f32) {
        self.input.throttle = crate::sim::control::clamp_pedal(throttle);
    }

    pub fn set_boost(&mut self, held: bool) {
        self.input.boost = held;
    }

    pub fn set_paused(&mut self, paused: bool) {
        if self.paused != paused {
            self.paused = paused;
            self.hud_dirty = true;
            log::info!("{}", if paused { "Paused" } else { "Resumed" });
        }
    }

    /// Show an externally supplied best distance; never written by the sim
    pub fn set_best(&mut self, best_m: f32) {
        if best_m.is_finite() && best_m >= 0.0 {
            self.best_m = best_m;
            self.session.run.best_m = best_m;
            self.hud_dirty = true;
        }
    }

    /// Throw the run away and build a new one with the same seed
    pub fn reset(&mut self) {
        self.rebuild(self.session.seed);
    }

    /// Switch seeds. Returns whether a rebuild happened.
    pub fn set_seed(&mut self, seed: u32) -> bool {
        if seed == self.session.seed {
            return false;
        }
        self.rebuild(seed);
        true
    }

    pub fn apply_settings(&mut self, settings: Settings) {
        let position = self.camera.position;
        let aspect = self.camera.aspect;
        self.camera = Camera::new(settings.compact_display, settings.reduced_motion);
        self.camera.position = position;
        self.camera.aspect = aspect;
        self.settings = settings;
    }

    fn rebuild(&mut self, seed: u32) {
        self.session = Session::new(seed);
        self.session.run.best_m = self.best_m;
        self.input = TickInput::default();
        self.accumulator = 0.0;
        self.last_status = RunStatus::Idle;
        self.last_toast_seq = 0;
        self.last_end_status = None;
        self.hud_dirty = true;
        self.snap_camera();
        log::info!("Run rebuilt with seed {seed}");
    }

    fn snap_camera(&mut self) {
        let chassis = self.session.world.state(RigBody::Chassis);
        self.camera.snap(chassis.pos, chassis.linvel);
    }

    /// Current draw list
    pub fn scene(&self) -> Scene {
        build_scene(&self.session, &self.camera, self.settings.quality)
    }

    /// Current HUD view
    pub fn hud(&self) -> HudSnapshot {
        self.session.run.snapshot(self.paused)
    }

    /// Advance by one host frame of `real_dt` seconds
    pub fn frame(&mut self, real_dt: f32, snapshots: &mut impl SnapshotSource) -> FrameOutput {
        let dt = if real_dt.is_finite() {
            real_dt.clamp(0.0, MAX_FRAME_DT)
        } else {
            0.0
        };
        let mut out = FrameOutput::default();

        if !self.paused {
            self.accumulator += dt;
            while self.accumulator >= SIM_DT {
                tick(&mut self.session, &self.input, SIM_DT);
                self.accumulator -= SIM_DT;
                out.ticks += 1;
            }
            let chassis = self.session.world.state(RigBody::Chassis);
            self.camera.follow(chassis.pos, chassis.linvel, dt);
        }
        out.events = self.session.drain_events();

        let status = self.session.run.status;
        if status.is_terminal() {
            if self.last_end_status != Some(status) {
                self.last_end_status = Some(status);
                out.game_over = Some(self.game_over(status, snapshots));
            }
        } else {
            self.last_end_status = None;
        }

        self.hud_timer += dt;
        let toast_seq = self.session.run.toast.seq;
        let urgent = self.hud_dirty || status != self.last_status || toast_seq != self.last_toast_seq;
        let interval = self.settings.hud_interval();
        if urgent || self.hud_timer >= interval {
            out.hud = Some(self.hud());
            self.hud_timer = if urgent {
                0.0
            } else {
                (self.hud_timer - interval).min(interval)
            };
            self.hud_dirty = false;
            self.last_status = status;
            self.last_toast_seq = toast_seq;
        }

        out
    }

    fn game_over(&self, status: RunStatus, snapshots: &mut impl SnapshotSource) -> GameOverEvent {
        let snapshot = snapshots.capture(&self.scene());
        if snapshot.is_none() {
            log::warn!("Game over without snapshot");
        }
        let distance_m = self.session.run.distance_m.max(0.0).floor() as u32;
        log::info!("Game over ({status:?}) at {distance_m} m");
        GameOverEvent {
            snapshot,
            distance_m,
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::snapshot::{NoSnapshot, Rasterizer};
    use crate::sim::physics::scripted::ScriptedWorld;
    use glam::Vec2;

    type TestGame = Game<ScriptedWorld>;

    fn game() -> TestGame {
        TestGame::new(1337, Settings::default())
    }

    fn crash(g: &mut TestGame) {
        let ground = g.session().track.height_at(0.0);
        g.session_mut()
            .world
            .place_chassis(Vec2::new(0.0, ground - 1.2), 0.0);
    }

    fn start_run(g: &mut TestGame) {
        g.set_throttle(1.0);
        for _ in 0..5 {
            g.frame(SIM_DT, &mut NoSnapshot);
        }
        assert_eq!(g.status(), RunStatus::Run);
    }

    #[test]
    fn test_fixed_ticks_per_frame() {
        let mut g = game();
        let mut ticks = 0;
        for _ in 0..120 {
            ticks += g.frame(1.0 / 120.0, &mut NoSnapshot).ticks;
        }
        assert!((59..=60).contains(&ticks), "{ticks}");
    }

    #[test]
    fn test_long_frame_clamped() {
        let mut g = game();
        let out = g.frame(10.0, &mut NoSnapshot);
        let max = (MAX_FRAME_DT / SIM_DT).round() as u32;
        assert!(out.ticks <= max && out.ticks >= max - 1, "{}", out.ticks);
        assert_eq!(g.frame(f32::NAN, &mut NoSnapshot).ticks, 0);
        assert_eq!(g.frame(-1.0, &mut NoSnapshot).ticks, 0);
    }

    #[test]
    fn test_pause_freezes_sim_and_camera() {
        let mut g = game();
        g.set_throttle(1.0);
        g.set_paused(true);
        let cam = g.camera.position;
        let out = g.frame(0.1, &mut NoSnapshot);
        assert_eq!(out.ticks, 0);
        assert_eq!(g.camera.position, cam);
        assert!(out.hud.unwrap().paused);
        assert_eq!(g.session().time_ticks, 0);
        g.set_paused(false);
        assert!(g.frame(0.1, &mut NoSnapshot).ticks > 0);
    }

    #[test]
    fn test_hud_throttled() {
        let mut g = game();
        let mut emitted = 0;
        for _ in 0..240 {
            if g.frame(1.0 / 240.0, &mut NoSnapshot).hud.is_some() {
                emitted += 1;
            }
        }
        // ~30 Hz over one second, plus the first frame
        assert!((28..=32).contains(&emitted), "{emitted}");
    }

    #[test]
    fn test_hud_immediate_on_status_change() {
        let mut g = game();
        assert!(g.frame(0.0, &mut NoSnapshot).hud.is_some());
        assert!(g.frame(0.0, &mut NoSnapshot).hud.is_none());
        g.set_throttle(1.0);
        let out = g.frame(SIM_DT, &mut NoSnapshot);
        assert_eq!(out.hud.map(|h| h.status), Some(RunStatus::Run));
    }

    #[test]
    fn test_hud_immediate_on_new_toast() {
        // Slow HUD rate, so the timer can't explain an emission
        let settings = Settings {
            hud_rate_hz: 1.0,
            ..Settings::default()
        };
        let mut g = TestGame::new(1337, settings);
        start_run(&mut g);
        let quiet = g.frame(SIM_DT * 1.5, &mut NoSnapshot);
        assert!(quiet.hud.is_none());
        assert!(quiet.events.is_empty());

        // Land a pending flip; status stays RUN
        let air = &mut g.session_mut().air;
        air.active = true;
        air.flips = 1;
        let out = g.frame(SIM_DT * 1.5, &mut NoSnapshot);
        assert_eq!(g.status(), RunStatus::Run);
        let hud = out.hud.expect("hud on toast");
        assert_eq!(hud.toast.as_deref(), Some("FLIP!"));
        assert!(out.events.contains(&SimEvent::Toast("FLIP!".to_string())));
        assert!(
            out.events
                .iter()
                .any(|e| matches!(e, SimEvent::FlipReward { flips: 1, .. }))
        );
        assert!(g.frame(SIM_DT * 1.5, &mut NoSnapshot).hud.is_none());
    }

    #[test]
    fn test_apply_settings_keeps_view() {
        let mut g = game();
        g.camera.set_aspect(1600, 900);
        let position = g.camera.position;
        let settings = Settings {
            quality: crate::settings::QualityPreset::Low,
            compact_display: true,
            ..Settings::default()
        };
        g.apply_settings(settings.clone());
        assert_eq!(g.settings(), &settings);
        assert_eq!(g.camera.position, position);
        assert!(g.camera.compact);
        let medium = TestGame::new(1337, Settings::default());
        assert!(g.scene().vertices.len() < medium.scene().vertices.len());
    }

    #[test]
    fn test_game_over_fires_once() {
        let mut g = game();
        start_run(&mut g);
        crash(&mut g);
        let out = g.frame(SIM_DT, &mut NoSnapshot);
        let over = out.game_over.expect("game over");
        assert_eq!(over.status, RunStatus::Crash);
        assert!(over.snapshot.is_none());
        assert_eq!(out.hud.map(|h| h.status), Some(RunStatus::Crash));
        for _ in 0..120 {
            assert!(g.frame(SIM_DT, &mut NoSnapshot).game_over.is_none());
        }
    }

    #[test]
    fn test_game_over_carries_snapshot_and_distance() {
        let mut g = game();
        start_run(&mut g);
        let ground = g.session().track.height_at(12.5);
        g.session_mut()
            .world
            .place_chassis(Vec2::new(12.5, ground + 1.55), 0.0);
        g.frame(SIM_DT, &mut NoSnapshot);
        let ground = g.session().track.height_at(12.5);
        g.session_mut()
            .world
            .place_chassis(Vec2::new(12.5, ground - 1.2), 0.0);
        let mut raster = Rasterizer::new(64, 36);
        let over = g.frame(SIM_DT, &mut raster).game_over.unwrap();
        assert_eq!(over.distance_m, 12);
        let img = over.snapshot.unwrap();
        assert_eq!((img.width, img.height), (64, 36));
    }

    #[test]
    fn test_reset_rearms_game_over() {
        let mut g = game();
        start_run(&mut g);
        crash(&mut g);
        assert!(g.frame(SIM_DT, &mut NoSnapshot).game_over.is_some());
        g.reset();
        assert_eq!(g.status(), RunStatus::Idle);
        start_run(&mut g);
        crash(&mut g);
        assert!(g.frame(SIM_DT, &mut NoSnapshot).game_over.is_some());
    }

    #[test]
    fn test_seed_change_rebuilds() {
        let mut g = game();
        g.frame(0.1, &mut NoSnapshot);
        assert!(!g.set_seed(1337));
        assert!(g.session().time_ticks > 0);
        assert!(g.set_seed(42));
        assert_eq!(g.seed(), 42);
        assert_eq!(g.session().time_ticks, 0);
        assert_eq!(g.session().track, crate::sim::Track::generate(42));
    }

    #[test]
    fn test_best_is_external() {
        let mut g = game();
        g.set_best(321.7);
        let hud = g.frame(0.0, &mut NoSnapshot).hud.unwrap();
        assert_eq!(hud.best_m, 321);
        g.set_best(f32::NAN);
        g.reset();
        assert_eq!(g.hud().best_m, 321);
    }
}
