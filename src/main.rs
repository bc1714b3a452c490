//! Magic Floor entry point
//!
//! Handles platform-specific initialization and runs the frame loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::HtmlCanvasElement;

    use magic_floor::camera::CameraRig;
    use magic_floor::renderer::FloorRenderState;
    use magic_floor::sim::{SimContext, Stage, TickInput, WaterKernelInputs};
    use magic_floor::Settings;

    /// App instance holding all state
    struct App {
        ctx: SimContext,
        camera: CameraRig,
        render_state: Option<FloorRenderState>,
        input: TickInput,
        settings: Settings,
        last_time: f64,
        /// Kernel inputs from the last tick, consumed by the next render
        pending_water: Option<WaterKernelInputs>,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
    }

    impl App {
        fn new(settings: Settings) -> Self {
            Self {
                ctx: SimContext::new(settings.quality),
                camera: CameraRig::new(),
                render_state: None,
                input: TickInput::default(),
                settings,
                last_time: 0.0,
                pending_water: None,
                frame_times: [0.0; 60],
                frame_index: 0,
                fps: 0,
            }
        }

        /// Run one simulation tick
        fn update(&mut self, dt: f32, time: f64) {
            let dt = dt.min(0.1);
            self.pending_water = self.ctx.tick_external_water(&self.input, dt);
            self.camera.update(&mut self.ctx.stage, dt);

            // Clear one-shot inputs after processing
            self.input.begin = false;
            self.input.exit_center = false;

            // Track frame times for FPS
            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % 60;
            let oldest = self.frame_times[self.frame_index];
            if oldest > 0.0 {
                let elapsed = time - oldest;
                if elapsed > 0.0 {
                    self.fps = (60000.0 / elapsed).round() as u32;
                }
            }
        }

        /// Render the current frame
        fn render(&mut self, time: f64) {
            let snapshot = self.ctx.player_snapshot();
            let stage = self.ctx.current_stage();
            let water = self.pending_water.take();
            if let Some(ref mut render_state) = self.render_state {
                match render_state.render(&snapshot, stage, water.as_ref(), &self.camera, time) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        render_state.resize(render_state.size.0, render_state.size.1);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
        }

        /// Step the quality tier and propagate the reallocation barrier
        fn step_quality(&mut self, up: bool) {
            if self.ctx.step_quality(up) {
                if let Some(ref mut render_state) = self.render_state {
                    render_state.set_quality(self.ctx.config());
                }
                self.settings.quality = self.ctx.quality();
                self.settings.save();
            }
        }

        /// Update HUD elements in the DOM
        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };

            if let Some(el) = document.get_element_by_id("hud-stage") {
                el.set_text_content(Some(self.ctx.current_stage().as_str()));
            }
            if let Some(el) = document.get_element_by_id("hud-quality") {
                el.set_text_content(Some(self.ctx.quality().as_str()));
            }
            if let Some(el) = document.get_element_by_id("hud-fps") {
                if self.settings.show_fps {
                    el.set_text_content(Some(&self.fps.to_string()));
                } else {
                    el.set_text_content(Some(""));
                }
            }
            // The center overlay shows only while in the center zone
            if let Some(el) = document.get_element_by_id("center-overlay") {
                let class = if self.ctx.current_stage() == Stage::Center {
                    ""
                } else {
                    "hidden"
                };
                let _ = el.set_attribute("class", class);
            }
            if let Some(el) = document.get_element_by_id("landing-overlay") {
                let class = if self.ctx.current_stage() == Stage::Landing {
                    ""
                } else {
                    "hidden"
                };
                let _ = el.set_attribute("class", class);
            }
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Magic Floor starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        let settings = Settings::load();
        let app = Rc::new(RefCell::new(App::new(settings)));

        // Canvas backbuffer size, DPR capped by the quality tier
        let max_dpr = app.borrow().ctx.config().max_pixel_ratio as f64;
        let dpr = window.device_pixel_ratio().min(max_dpr);
        let width = (canvas.client_width() as f64 * dpr) as u32;
        let height = (canvas.client_height() as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);

        // Initialize WebGPU. No adapter means no experience - this is a
        // fatal precondition, not a recoverable error.
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU,
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
            .expect("WebGPU not available");

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let quality = *app.borrow().ctx.config();
        let mut render_state =
            FloorRenderState::new(surface, &adapter, width, height, &quality).await;
        render_state.set_start_time(js_sys::Date::now());
        app.borrow_mut().render_state = Some(render_state);

        setup_keyboard(app.clone());
        setup_buttons(app.clone());

        request_animation_frame(app);

        log::info!("Magic Floor running!");
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |time: f64| {
            frame_loop(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn frame_loop(app: Rc<RefCell<App>>, time: f64) {
        {
            let mut a = app.borrow_mut();

            let dt = if a.last_time > 0.0 {
                ((time - a.last_time) / 1000.0) as f32
            } else {
                1.0 / 60.0
            };
            a.last_time = time;

            a.update(dt, time);
            a.render(time);
            a.update_hud();
        }

        request_animation_frame(app);
    }

    fn setup_keyboard(app: Rc<RefCell<App>>) {
        let window = web_sys::window().unwrap();

        // Key presses: movement intent, begin, exit, quality stepping
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                let mut a = app.borrow_mut();
                match event.code().as_str() {
                    "ArrowUp" | "KeyW" => a.input.intent.forward = true,
                    "ArrowDown" | "KeyS" => a.input.intent.backward = true,
                    "ArrowLeft" | "KeyA" => a.input.intent.left = true,
                    "ArrowRight" | "KeyD" => a.input.intent.right = true,
                    "Space" | "Enter" => a.input.begin = true,
                    "Escape" => a.input.exit_center = true,
                    "BracketRight" => a.step_quality(true),
                    "BracketLeft" => a.step_quality(false),
                    "KeyM" => {
                        a.settings.muted = !a.settings.muted;
                        a.settings.save();
                    }
                    "KeyF" => {
                        a.settings.show_fps = !a.settings.show_fps;
                        a.settings.save();
                    }
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Key releases clear movement intent
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                let mut a = app.borrow_mut();
                match event.code().as_str() {
                    "ArrowUp" | "KeyW" => a.input.intent.forward = false,
                    "ArrowDown" | "KeyS" => a.input.intent.backward = false,
                    "ArrowLeft" | "KeyA" => a.input.intent.left = false,
                    "ArrowRight" | "KeyD" => a.input.intent.right = false,
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_buttons(app: Rc<RefCell<App>>) {
        let window = web_sys::window().unwrap();
        let document = window.document().unwrap();

        // Begin button on the landing overlay
        if let Some(btn) = document.get_element_by_id("begin-btn") {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                app.borrow_mut().input.begin = true;
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Exit button shown while in the center zone
        if let Some(btn) = document.get_element_by_id("exit-center-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                app.borrow_mut().input.exit_center = true;
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_app::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use magic_floor::camera::CameraRig;
    use magic_floor::sim::{IntentFlags, SimContext, Stage, TickInput};
    use magic_floor::Settings;

    env_logger::init();
    log::info!("Magic Floor (native) starting...");
    log::info!("Native mode runs a headless smoke pass - use the web build for visuals");

    let settings = Settings::load();
    let mut ctx = SimContext::new(settings.quality);
    let mut camera = CameraRig::new();
    let dt = 1.0 / 60.0;

    // Landing -> intro via the begin action
    let begin = TickInput {
        begin: true,
        ..Default::default()
    };
    ctx.tick(&begin, dt);
    assert_eq!(ctx.current_stage(), Stage::Intro);

    // Let the camera run the intro until the experience opens up
    let idle = TickInput::default();
    while ctx.current_stage() == Stage::Intro {
        ctx.tick(&idle, dt);
        camera.update(&mut ctx.stage, dt);
    }
    log::info!("Intro complete, stage: {}", ctx.current_stage().as_str());

    // Walk toward the center for ten simulated seconds
    let walk = TickInput {
        intent: IntentFlags {
            forward: true,
            ..Default::default()
        },
        ..Default::default()
    };
    for _ in 0..600 {
        ctx.tick(&walk, dt);
        camera.update(&mut ctx.stage, dt);
    }

    let snapshot = ctx.player_snapshot();
    let energy: f32 = ctx.water.heights().iter().map(|h| h.abs()).sum();
    log::info!(
        "After walk: stage={} pos=({:.2}, {:.2}, {:.2}) speed={:.2} ripple energy={:.3}",
        ctx.current_stage().as_str(),
        snapshot.position.x,
        snapshot.position.y,
        snapshot.position.z,
        ctx.player.speed_smooth(),
        energy
    );

    println!("✓ Headless smoke pass complete");
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
