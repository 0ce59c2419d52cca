use glam::Vec2;
use nova_fx::{Camera, EffectOrchestrator, FrameClock, FxConfig, FxStats, QualityTier};
#[cfg(not(feature = "vectors"))]
use nova_fx::DrawList;
#[cfg(feature = "vectors")]
use nova_fx::VectorPainter;

/// Owns the orchestrator plus the per-frame output buffers the host reads.
///
/// `lib.rs` keeps one of these in a `thread_local!` and exports free
/// functions via `#[wasm_bindgen]`.
pub struct FxRunner {
    fx: EffectOrchestrator,
    camera: Camera,
    clock: FrameClock,
    #[cfg(feature = "vectors")]
    painter: VectorPainter,
    #[cfg(not(feature = "vectors"))]
    painter: DrawList,
    /// Flat buffer of cue ids for SharedArrayBuffer reads.
    sound_buffer: Vec<u32>,
    drawn: usize,
}

impl FxRunner {
    pub fn new(config: &FxConfig) -> Self {
        Self {
            fx: EffectOrchestrator::new(config),
            camera: Camera::default(),
            clock: FrameClock::new(),
            #[cfg(feature = "vectors")]
            painter: VectorPainter::new(),
            #[cfg(not(feature = "vectors"))]
            painter: DrawList::new(),
            sound_buffer: Vec::with_capacity(config.max_sounds),
            drawn: 0,
        }
    }

    /// Frame driven by the host timestamp (`performance.now()`).
    pub fn frame(&mut self, now_ms: f64) {
        let dt = self.clock.advance(now_ms);
        self.tick(dt);
    }

    /// Advance by `dt` seconds, repaint, and repack the cue buffer.
    pub fn tick(&mut self, dt: f32) {
        self.fx.update(dt);

        self.painter.clear();
        self.drawn = self.fx.draw(&self.camera, &mut self.painter).total();

        self.sound_buffer.clear();
        self.sound_buffer.extend(self.fx.drain_sounds().map(|s| s.0));
    }

    /// Returns `false` for unparseable or ignored events.
    pub fn trigger(&mut self, json: &str) -> bool {
        self.fx.apply_json(json)
    }

    pub fn set_camera(&mut self, x: f32, y: f32, width: f32, height: f32) {
        if x.is_finite() && y.is_finite() {
            self.camera.look_at(Vec2::new(x, y));
        }
        self.camera.resize(width, height);
    }

    /// Apply shake to the camera offset, as the host computed it.
    pub fn set_shake_offset(&mut self, x: f32, y: f32) {
        if x.is_finite() && y.is_finite() {
            self.camera.shake = Vec2::new(x, y);
        }
    }

    /// Quality by name (`low`, `medium`, `high`). Unknown names are ignored.
    pub fn set_quality(&mut self, name: &str) -> bool {
        match QualityTier::from_name(name) {
            Some(tier) => {
                self.fx.set_quality(tier);
                true
            }
            None => {
                log::warn!("nova-fx-web: unknown quality {:?}", name);
                false
            }
        }
    }

    pub fn set_particle_multiplier(&mut self, multiplier: f32) {
        self.fx.set_particle_multiplier(multiplier);
    }

    /// Tab became visible again; the next frame starts from zero dt.
    pub fn resume(&mut self) {
        self.clock.reset();
    }

    pub fn clear(&mut self) {
        self.fx.clear();
        self.painter.clear();
        self.sound_buffer.clear();
        self.drawn = 0;
    }

    // ---- Pointer accessors for SharedArrayBuffer reads ----

    #[cfg(feature = "vectors")]
    pub fn vertices_ptr(&self) -> *const f32 {
        self.painter.buffer_ptr()
    }

    #[cfg(feature = "vectors")]
    pub fn vertex_count(&self) -> u32 {
        self.painter.vertex_count() as u32
    }

    #[cfg(feature = "vectors")]
    pub fn max_vertices(&self) -> u32 {
        self.painter.max_vertices() as u32
    }

    pub fn sound_events_ptr(&self) -> *const u32 {
        self.sound_buffer.as_ptr()
    }

    pub fn sound_events_len(&self) -> u32 {
        self.sound_buffer.len() as u32
    }

    // ---- Stats ----

    pub fn stats(&self) -> FxStats {
        self.fx.stats()
    }

    pub fn drawn(&self) -> u32 {
        self.drawn as u32
    }

    pub fn screen_shake(&self) -> f32 {
        self.fx.screen_shake()
    }
}
