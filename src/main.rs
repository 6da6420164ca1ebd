//! Hill Climb entry point
//!
//! On the web: canvas, keyboard/pointer input, rAF loop and DOM HUD.
//! Natively: a headless run that prints the final HUD as JSON
//! (`hillclimb [seed] [seconds] [low|medium|high]`).

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, KeyboardEvent, PointerEvent};

    use hillclimb::consts::SIM_DT;
    use hillclimb::renderer::{Rasterizer, RenderState};
    use hillclimb::sim::{HudSnapshot, RunStatus, daily_seed};
    use hillclimb::{FrameOutput, Game, QualityPreset, Settings};

    /// Snapshot resolution for the game-over image
    const SNAPSHOT_SIZE: (u32, u32) = (480, 270);

    /// Held controls
    #[derive(Default)]
    struct Pedals {
        gas_key: bool,
        brake_key: bool,
        gas_touch: bool,
        brake_touch: bool,
        boost: bool,
    }

    impl Pedals {
        fn throttle(&self) -> f32 {
            let gas = (self.gas_key || self.gas_touch) as i32 as f32;
            let brake = (self.brake_key || self.brake_touch) as i32 as f32;
            gas - brake
        }
    }

    /// Page-side state around the game
    struct Host {
        game: Game,
        render_state: Option<RenderState>,
        snapshots: Rasterizer,
        pedals: Pedals,
        last_time: f64,
    }

    impl Host {
        fn new(seed: u32, settings: Settings) -> Self {
            Self {
                game: Game::new(seed, settings),
                render_state: None,
                snapshots: Rasterizer::new(SNAPSHOT_SIZE.0, SNAPSHOT_SIZE.1),
                pedals: Pedals::default(),
                last_time: 0.0,
            }
        }

        fn sync_input(&mut self) {
            let throttle = self.pedals.throttle();
            self.game.set_throttle(throttle);
            self.game.set_boost(self.pedals.boost);
        }

        fn resize(&mut self, width: u32, height: u32) {
            self.game.camera.set_aspect(width, height);
            if let Some(rs) = self.render_state.as_mut() {
                rs.resize(width, height);
            }
        }

        /// Step to the next quality preset and remember it
        fn cycle_quality(&mut self) {
            let mut settings = self.game.settings().clone();
            settings.quality = settings.quality.next();
            settings.save();
            log::info!("Quality set to {:?}", settings.quality);
            self.game.apply_settings(settings);
        }

        fn frame(&mut self, dt: f32) -> FrameOutput {
            self.sync_input();
            self.game.frame(dt, &mut self.snapshots)
        }

        /// Render the current frame; keeps drawing while paused
        fn render(&mut self) {
            let Some(render_state) = self.render_state.as_mut() else {
                return;
            };
            let scene = self.game.scene();
            match render_state.render(&scene) {
                Ok(_) => {}
                Err(wgpu::SurfaceError::Lost) => {
                    let (w, h) = render_state.size;
                    render_state.resize(w, h);
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    log::error!("Out of memory!");
                }
                Err(e) => log::warn!("Render error: {:?}", e),
            }
        }
    }

    /// Value of `key` in the page's query string
    fn query_param(window: &web_sys::Window, key: &str) -> Option<String> {
        let search = window.location().search().ok()?;
        search
            .trim_start_matches('?')
            .split('&')
            .filter_map(|kv| kv.split_once('='))
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
    }

    /// Seed from `?seed=N`, else today's seed
    fn initial_seed(window: &web_sys::Window) -> u32 {
        query_param(window, "seed")
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(|| daily_seed(js_sys::Date::now()))
    }

    /// Stored settings, with `?quality=` overriding and persisting the preset
    fn initial_settings(window: &web_sys::Window) -> Settings {
        let mut settings = Settings::load();
        if let Some(quality) =
            query_param(window, "quality").and_then(|v| QualityPreset::parse(&v))
        {
            settings.quality = quality;
            settings.save();
        }
        settings
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Hill Climb starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.class_list().add_1("hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        let (width, height) = fit_canvas(&window, &canvas);

        let seed = initial_seed(&window);
        let host = Rc::new(RefCell::new(Host::new(seed, initial_settings(&window))));
        host.borrow_mut().game.camera.set_aspect(width, height);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .expect("Failed to create surface");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("Failed to get adapter");

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        match RenderState::new(surface, &adapter, width, height).await {
            Ok(rs) => host.borrow_mut().render_state = Some(rs),
            Err(e) => log::error!("No render device, running without drawing: {e}"),
        }

        setup_keyboard(host.clone());
        setup_touch(&canvas, host.clone());
        setup_auto_pause(host.clone());
        setup_resize(canvas, host.clone());

        if let Some(hud) = document.get_element_by_id("hud") {
            let _ = hud.class_list().remove_1("hidden");
        }

        request_animation_frame(host);

        log::info!("Hill Climb running with seed {seed}");
    }

    /// Match the backing store to the CSS size
    fn fit_canvas(window: &web_sys::Window, canvas: &HtmlCanvasElement) -> (u32, u32) {
        let dpr = window.device_pixel_ratio();
        let width = ((canvas.client_width() as f64 * dpr) as u32).max(1);
        let height = ((canvas.client_height() as f64 * dpr) as u32).max(1);
        canvas.set_width(width);
        canvas.set_height(height);
        (width, height)
    }

    fn setup_keyboard(host: Rc<RefCell<Host>>) {
        let window = web_sys::window().unwrap();

        {
            let host = host.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut h = host.borrow_mut();
                match event.key().as_str() {
                    "ArrowRight" | "d" | "D" => h.pedals.gas_key = true,
                    "ArrowLeft" | "a" | "A" => h.pedals.brake_key = true,
                    "Shift" | " " => h.pedals.boost = true,
                    "r" | "R" if !event.repeat() => {
                        h.game.reset();
                        hide("game-over");
                    }
                    "q" | "Q" if !event.repeat() => h.cycle_quality(),
                    "p" | "P" | "Escape" if !event.repeat() => {
                        let paused = !h.game.is_paused();
                        h.game.set_paused(paused);
                    }
                    _ => return,
                }
                event.prevent_default();
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut h = host.borrow_mut();
                match event.key().as_str() {
                    "ArrowRight" | "d" | "D" => h.pedals.gas_key = false,
                    "ArrowLeft" | "a" | "A" => h.pedals.brake_key = false,
                    "Shift" | " " => h.pedals.boost = false,
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Right half of the canvas is gas, left half is brake
    fn setup_touch(canvas: &HtmlCanvasElement, host: Rc<RefCell<Host>>) {
        {
            let host = host.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                event.prevent_default();
                let rect = canvas_clone.get_bounding_client_rect();
                let x = event.client_x() as f64 - rect.left();
                let mut h = host.borrow_mut();
                if x > rect.width() * 0.5 {
                    h.pedals.gas_touch = true;
                } else {
                    h.pedals.brake_touch = true;
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        for name in ["pointerup", "pointercancel", "pointerleave"] {
            let host = host.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: PointerEvent| {
                let mut h = host.borrow_mut();
                h.pedals.gas_touch = false;
                h.pedals.brake_touch = false;
            });
            let _ = canvas.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_auto_pause(host: Rc<RefCell<Host>>) {
        let window = web_sys::window().unwrap();
        let document = window.document().unwrap();

        // Visibility change (tab switch, minimize)
        {
            let host = host.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    let mut h = host.borrow_mut();
                    h.pedals = Pedals::default();
                    h.game.set_paused(true);
                    log::info!("Auto-paused (tab hidden)");
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur (click outside)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut h = host.borrow_mut();
                h.pedals = Pedals::default();
                if h.game.status() == RunStatus::Run {
                    h.game.set_paused(true);
                    log::info!("Auto-paused (window blur)");
                }
            });
            let _ =
                window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_resize(canvas: HtmlCanvasElement, host: Rc<RefCell<Host>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            if let Some(window) = web_sys::window() {
                let (w, h) = fit_canvas(&window, &canvas);
                host.borrow_mut().resize(w, h);
            }
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(host: Rc<RefCell<Host>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |time: f64| {
            game_loop(host, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(host: Rc<RefCell<Host>>, time: f64) {
        {
            let mut h = host.borrow_mut();

            let dt = if h.last_time > 0.0 {
                ((time - h.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            h.last_time = time;

            let out = h.frame(dt);
            h.render();

            if let Some(hud) = &out.hud {
                update_hud(hud);
            }
            if let Some(over) = &out.game_over {
                log::info!(
                    "Run over: {:?} at {} m (snapshot {})",
                    over.status,
                    over.distance_m,
                    if over.snapshot.is_some() { "captured" } else { "missing" }
                );
                show_game_over(over.status, over.distance_m);
            }
        }

        request_animation_frame(host);
    }

    fn set_text(document: &web_sys::Document, selector: &str, text: &str) {
        if let Some(el) = document.query_selector(selector).ok().flatten() {
            el.set_text_content(Some(text));
        }
    }

    fn hide(id: &str) {
        if let Some(el) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(id))
        {
            let _ = el.class_list().add_1("hidden");
        }
    }

    fn set_visible(document: &web_sys::Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.class_list().toggle_with_force("hidden", !visible);
        }
    }

    /// Update HUD elements in DOM
    fn update_hud(hud: &HudSnapshot) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        set_text(&document, "#hud-distance .hud-value", &format!("{} m", hud.distance_m));
        set_text(&document, "#hud-best .hud-value", &format!("{} m", hud.best_m));
        set_text(&document, "#hud-coins .hud-value", &hud.coins.to_string());
        set_text(&document, "#hud-fuel .hud-value", &format!("{:.0}%", hud.fuel));
        set_text(&document, "#hud-speed .hud-value", &format!("{:.0} km/h", hud.speed_kmh));
        set_text(&document, "#hud-boost .hud-value", &format!("{:.0}%", hud.boost01 * 100.0));
        set_text(&document, "#hud-flips .hud-value", &hud.flips.to_string());

        match &hud.toast {
            Some(text) => {
                set_text(&document, "#toast", text);
                set_visible(&document, "toast", true);
            }
            None => set_visible(&document, "toast", false),
        }
        set_visible(&document, "pause-menu", hud.paused);
        set_visible(&document, "start-prompt", hud.status == RunStatus::Idle);
    }

    fn show_game_over(status: RunStatus, distance_m: u32) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        set_text(&document, "#final-distance", &format!("{distance_m} m"));
        let reason = match status {
            RunStatus::Crash => "Crashed",
            _ => "Out of fuel",
        };
        set_text(&document, "#final-status", reason);
        set_visible(&document, "game-over", true);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use serde::Serialize;

    use hillclimb::consts::SIM_DT;
    use hillclimb::renderer::Rasterizer;
    use hillclimb::sim::physics::RigBodies;
    use hillclimb::sim::{HudSnapshot, RigBody, RunStatus, daily_seed};
    use hillclimb::{Game, QualityPreset, Settings};

    #[derive(Serialize)]
    struct GameOverReport {
        status: RunStatus,
        distance_m: u32,
        snapshot: Option<(u32, u32)>,
        at_s: f32,
    }

    #[derive(Serialize)]
    struct RunReport {
        seed: u32,
        seconds: f32,
        ticks: u64,
        hud: HudSnapshot,
        game_over: Option<GameOverReport>,
    }

    fn now_ms() -> f64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as f64)
            .unwrap_or(f64::NAN)
    }

    /// Simple pedal pattern: gas, ease off when the nose climbs, boost on the ground
    fn autopilot(game: &mut Game) {
        let chassis = game.session().world.state(RigBody::Chassis);
        let throttle = if chassis.angle > 0.7 {
            -0.4
        } else if chassis.angle > 0.45 {
            0.3
        } else {
            1.0
        };
        game.set_throttle(throttle);
        let run = &game.session().run;
        let boost = run.boost01 > 0.4 && game.session().contacts.both_wheels();
        game.set_boost(boost);
    }

    pub fn run() {
        let mut args = std::env::args().skip(1);
        let seed = args
            .next()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| daily_seed(now_ms()));
        let seconds = args
            .next()
            .and_then(|s| s.parse::<f32>().ok())
            .filter(|s| s.is_finite() && *s > 0.0)
            .unwrap_or(30.0);
        let mut settings = Settings::load();
        if let Some(quality) = args.next().and_then(|s| QualityPreset::parse(&s)) {
            settings.quality = quality;
        }

        log::info!(
            "Headless run: seed {seed}, {seconds} s, {:?} quality",
            settings.quality
        );

        let mut game: Game = Game::new(seed, settings);
        let mut snapshots = Rasterizer::new(320, 180);
        let mut game_over = None;
        let frames = (seconds / SIM_DT).ceil() as u32;

        for frame in 0..frames {
            autopilot(&mut game);
            let out = game.frame(SIM_DT, &mut snapshots);
            if let Some(over) = out.game_over {
                log::info!("Game over: {:?} at {} m", over.status, over.distance_m);
                game_over = Some(GameOverReport {
                    status: over.status,
                    distance_m: over.distance_m,
                    snapshot: over.snapshot.map(|img| (img.width, img.height)),
                    at_s: frame as f32 * SIM_DT,
                });
            }
            if game.session().settled {
                break;
            }
        }

        let report = RunReport {
            seed,
            seconds,
            ticks: game.session().time_ticks,
            hud: game.hud(),
            game_over,
        };
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => log::error!("Failed to encode report: {e}"),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    headless::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
