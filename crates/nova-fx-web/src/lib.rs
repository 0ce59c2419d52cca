//! `wasm-bindgen` exports for the browser host.
//!
//! The host calls `fx_init` once, forwards every server effect event to
//! `fx_trigger` as JSON, and calls `fx_frame` from its animation loop. After
//! each frame it reads the vertex buffer and the audio cue buffer straight
//! out of WASM memory through the pointer accessors.

pub mod runner;

pub use runner::FxRunner;

use std::cell::RefCell;

use nova_fx::FxConfig;
use wasm_bindgen::prelude::*;

thread_local! {
    static RUNNER: RefCell<Option<FxRunner>> = RefCell::new(None);
}

/// Run `f` against the runner. Before `fx_init` every call is a no-op
/// returning `None`.
fn with_runner<R>(f: impl FnOnce(&mut FxRunner) -> R) -> Option<R> {
    RUNNER.with(|cell| cell.borrow_mut().as_mut().map(f))
}

fn random_seed() -> u64 {
    let hi = (js_sys::Math::random() * u32::MAX as f64) as u64;
    let lo = (js_sys::Math::random() * u32::MAX as f64) as u64;
    (hi << 32) | lo
}

fn parse_config(config_json: &str) -> (FxConfig, bool) {
    if config_json.trim().is_empty() {
        return (FxConfig::default(), true);
    }
    match FxConfig::from_json(config_json) {
        Ok(config) => (config, true),
        Err(err) => {
            log::warn!("nova-fx: bad config, using defaults: {}", err);
            (FxConfig::default(), false)
        }
    }
}

fn install(config: FxConfig) {
    let runner = FxRunner::new(&config);
    RUNNER.with(|cell| {
        *cell.borrow_mut() = Some(runner);
    });
    log::info!("nova-fx: initialized ({:?} quality)", config.quality);
}

/// Initialize with a JSON config (empty string for defaults) and a fresh
/// random seed. Returns `false` if the config could not be parsed; the
/// engine still starts with defaults.
#[wasm_bindgen]
pub fn fx_init(config_json: &str) -> bool {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);

    let (config, ok) = parse_config(config_json);
    install(config.with_seed(random_seed()));
    ok
}

/// Like [`fx_init`] but keeps the seed from the config, for replays.
#[wasm_bindgen]
pub fn fx_init_seeded(config_json: &str) -> bool {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);

    let (config, ok) = parse_config(config_json);
    install(config);
    ok
}

#[wasm_bindgen]
pub fn fx_frame(now_ms: f64) {
    with_runner(|r| r.frame(now_ms));
}

#[wasm_bindgen]
pub fn fx_tick(dt: f32) {
    with_runner(|r| r.tick(dt));
}

#[wasm_bindgen]
pub fn fx_trigger(json: &str) -> bool {
    with_runner(|r| r.trigger(json)).unwrap_or(false)
}

#[wasm_bindgen]
pub fn fx_set_camera(x: f32, y: f32, width: f32, height: f32) {
    with_runner(|r| r.set_camera(x, y, width, height));
}

#[wasm_bindgen]
pub fn fx_set_shake_offset(x: f32, y: f32) {
    with_runner(|r| r.set_shake_offset(x, y));
}

#[wasm_bindgen]
pub fn fx_set_quality(name: &str) -> bool {
    with_runner(|r| r.set_quality(name)).unwrap_or(false)
}

#[wasm_bindgen]
pub fn fx_set_multiplier(multiplier: f32) {
    with_runner(|r| r.set_particle_multiplier(multiplier));
}

#[wasm_bindgen]
pub fn fx_resume() {
    with_runner(|r| r.resume());
}

#[wasm_bindgen]
pub fn fx_clear() {
    with_runner(|r| r.clear());
}

// ---- Data accessors ----

#[cfg(feature = "vectors")]
#[wasm_bindgen]
pub fn get_vertices_ptr() -> *const f32 {
    with_runner(|r| r.vertices_ptr()).unwrap_or(std::ptr::null())
}

#[cfg(feature = "vectors")]
#[wasm_bindgen]
pub fn get_vertex_count() -> u32 {
    with_runner(|r| r.vertex_count()).unwrap_or(0)
}

#[cfg(feature = "vectors")]
#[wasm_bindgen]
pub fn get_max_vertices() -> u32 {
    with_runner(|r| r.max_vertices()).unwrap_or(0)
}

#[wasm_bindgen]
pub fn get_sound_events_ptr() -> *const u32 {
    with_runner(|r| r.sound_events_ptr()).unwrap_or(std::ptr::null())
}

#[wasm_bindgen]
pub fn get_sound_events_len() -> u32 {
    with_runner(|r| r.sound_events_len()).unwrap_or(0)
}

#[wasm_bindgen]
pub fn get_screen_shake() -> f32 {
    with_runner(|r| r.screen_shake()).unwrap_or(0.0)
}

// ---- Stats ----

#[wasm_bindgen]
pub fn get_live_particles() -> u32 {
    with_runner(|r| r.stats().particles.live as u32).unwrap_or(0)
}

#[wasm_bindgen]
pub fn get_particle_capacity() -> u32 {
    with_runner(|r| r.stats().particles.capacity as u32).unwrap_or(0)
}

#[wasm_bindgen]
pub fn get_particle_evictions() -> f64 {
    with_runner(|r| r.stats().particles.evictions as f64).unwrap_or(0.0)
}

#[wasm_bindgen]
pub fn get_phased_effects() -> u32 {
    with_runner(|r| r.stats().phased_effects() as u32).unwrap_or(0)
}

#[wasm_bindgen]
pub fn get_drawn_effects() -> u32 {
    with_runner(|r| r.drawn()).unwrap_or(0)
}
