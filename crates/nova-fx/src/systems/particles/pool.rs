//! Fixed-capacity particle slab with FIFO eviction.
//!
//! Records are allocated once and recycled through a free list. When the
//! free list is empty a spawn steals the longest-resident live record
//! instead of failing, so a burst during heavy combat always shows up at
//! the cost of the oldest (mostly faded) particles.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::burst::BurstSpread;
use super::particle::{Particle, SpawnConfig, SpawnPriority};
use super::render::{draw_particle, visual_extent};
use super::rng::Rng;
use crate::core::math::sanitize_dt;
use crate::renderer::camera::Camera;
use crate::renderer::painter::Painter;

/// User-facing quality setting, mapped to a pool capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    Low,
    Medium,
    #[default]
    High,
}

impl QualityTier {
    pub fn capacity(self) -> usize {
        match self {
            QualityTier::Low => 150,
            QualityTier::Medium => 300,
            QualityTier::High => 500,
        }
    }

    /// Parse `"low" | "medium" | "high"`, case-insensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "low" => Some(QualityTier::Low),
            "medium" => Some(QualityTier::Medium),
            "high" => Some(QualityTier::High),
            _ => None,
        }
    }
}

/// Generation-checked reference to a pooled record. A handle whose record
/// has since been recycled resolves to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParticleHandle {
    pub index: u32,
    pub generation: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    pub capacity: usize,
    pub target_capacity: usize,
    pub live: usize,
    pub free: usize,
    /// Lifetime count of live records stolen by spawns.
    pub evictions: u64,
    /// Lifetime count of spawns.
    pub spawned: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Free,
    Live,
    /// Past the target capacity after a shrink; dropped once every slot
    /// beyond the target is retired.
    Retired,
}

pub struct ParticlePool {
    records: Vec<Particle>,
    slots: Vec<Slot>,
    free: Vec<u32>,
    /// Live indices in spawn order (front = oldest).
    live: VecDeque<u32>,
    target: usize,
    retired: usize,
    evictions: u64,
    spawned: u64,
    cull_margin: f32,
    rng: Rng,
}

impl ParticlePool {
    pub const DEFAULT_CULL_MARGIN: f32 = 50.0;

    pub fn new(tier: QualityTier, seed: u64) -> Self {
        Self::with_capacity(tier.capacity(), seed)
    }

    /// Pool with an exact capacity (minimum 1).
    pub fn with_capacity(capacity: usize, seed: u64) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: vec![Particle::default(); capacity],
            slots: vec![Slot::Free; capacity],
            // Reversed so index 0 is handed out first.
            free: (0..capacity as u32).rev().collect(),
            live: VecDeque::with_capacity(capacity),
            target: capacity,
            retired: 0,
            evictions: 0,
            spawned: 0,
            cull_margin: Self::DEFAULT_CULL_MARGIN,
            rng: Rng::new(seed),
        }
    }

    pub fn with_cull_margin(mut self, margin: f32) -> Self {
        self.set_cull_margin(margin);
        self
    }

    pub fn set_cull_margin(&mut self, margin: f32) {
        self.cull_margin = if margin.is_finite() { margin.max(0.0) } else { 0.0 };
    }

    /// Jitter source shared by bursts and presets.
    pub fn rng_mut(&mut self) -> &mut Rng {
        &mut self.rng
    }

    // -- Spawning --

    /// Populate a record from `config`. Never fails: evicts the oldest
    /// normal-priority live record when the pool is full.
    pub fn spawn(&mut self, config: &SpawnConfig) -> ParticleHandle {
        let index = self.acquire();
        let record = &mut self.records[index as usize];
        record.reset();
        record.apply(config);
        self.slots[index as usize] = Slot::Live;
        self.live.push_back(index);
        self.spawned += 1;
        ParticleHandle {
            index,
            generation: self.records[index as usize].generation(),
        }
    }

    /// Spawn and immediately integrate by `lead_dt`, for particles created
    /// after the pool has already been ticked this frame. Returns `None` if
    /// the particle expired during that first step.
    pub fn spawn_advanced(&mut self, config: &SpawnConfig, lead_dt: f32) -> Option<ParticleHandle> {
        let handle = self.spawn(config);
        let lead_dt = sanitize_dt(lead_dt);
        if lead_dt == 0.0 {
            return Some(handle);
        }
        if self.records[handle.index as usize].integrate(lead_dt) {
            Some(handle)
        } else {
            // Just pushed, so it is at the back.
            self.live.pop_back();
            self.release(handle.index);
            None
        }
    }

    /// Spawn `count` jittered copies of `config`. Returns the number spawned.
    pub fn spawn_burst(&mut self, config: &SpawnConfig, count: usize, spread: &BurstSpread) -> usize {
        self.spawn_burst_advanced(config, count, spread, 0.0)
    }

    /// [`spawn_burst`](Self::spawn_burst) with a lead step (see
    /// [`spawn_advanced`](Self::spawn_advanced)). Returns the number still
    /// live after the lead step.
    ///
    /// `count` is capped at the pool capacity: anything beyond that would
    /// only evict members of the same burst.
    pub fn spawn_burst_advanced(
        &mut self,
        config: &SpawnConfig,
        count: usize,
        spread: &BurstSpread,
        lead_dt: f32,
    ) -> usize {
        let count = count.min(self.capacity());
        let mut spawned = 0;
        for _ in 0..count {
            let member = spread.sample(config, &mut self.rng);
            if self.spawn_advanced(&member, lead_dt).is_some() {
                spawned += 1;
            }
        }
        spawned
    }

    fn acquire(&mut self) -> u32 {
        if let Some(index) = self.free.pop() {
            return index;
        }
        if let Some(index) = self.evict() {
            return index;
        }
        // Unreachable while target >= 1; keep the pool usable regardless.
        let index = self.records.len() as u32;
        self.records.push(Particle::default());
        self.slots.push(Slot::Free);
        self.target = self.target.max(self.records.len());
        index
    }

    /// Steal the oldest normal-priority live record, or the oldest overall
    /// if every live record is protected.
    fn evict(&mut self) -> Option<u32> {
        let position = self
            .live
            .iter()
            .position(|&i| self.records[i as usize].priority == SpawnPriority::Normal)
            .unwrap_or(0);
        let index = self.live.remove(position)?;
        self.evictions += 1;
        log::trace!("particle pool full, evicting record {}", index);
        Some(index)
    }

    /// Return a no-longer-live record to the free list (or retire it).
    fn release(&mut self, index: u32) {
        let i = index as usize;
        self.records[i].reset();
        if i >= self.target {
            self.slots[i] = Slot::Retired;
            self.retired += 1;
        } else {
            self.slots[i] = Slot::Free;
            self.free.push(index);
        }
    }

    // -- Simulation --

    /// Integrate every live record and recycle the expired ones in the
    /// same pass.
    pub fn tick(&mut self, dt: f32) {
        let dt = sanitize_dt(dt);
        let Self {
            records,
            slots,
            free,
            live,
            target,
            retired,
            ..
        } = self;
        live.retain(|&index| {
            let i = index as usize;
            if records[i].integrate(dt) {
                return true;
            }
            records[i].reset();
            if i >= *target {
                slots[i] = Slot::Retired;
                *retired += 1;
            } else {
                slots[i] = Slot::Free;
                free.push(index);
            }
            false
        });
        self.drop_retired();
    }

    /// Release every live record immediately.
    pub fn clear(&mut self) {
        while let Some(index) = self.live.pop_front() {
            self.release(index);
        }
        self.drop_retired();
    }

    // -- Capacity --

    pub fn set_capacity(&mut self, tier: QualityTier) {
        self.set_capacity_exact(tier.capacity());
    }

    /// Grow immediately; shrink by retiring free slots now and live slots
    /// as they expire.
    pub fn set_capacity_exact(&mut self, capacity: usize) {
        let capacity = capacity.max(1);
        if capacity == self.target {
            return;
        }
        log::debug!("particle pool capacity {} -> {}", self.target, capacity);

        if capacity > self.target {
            for i in self.target..self.records.len().min(capacity) {
                if self.slots[i] == Slot::Retired {
                    self.slots[i] = Slot::Free;
                    self.retired -= 1;
                    self.free.push(i as u32);
                }
            }
            for i in self.records.len()..capacity {
                self.records.push(Particle::default());
                self.slots.push(Slot::Free);
                self.free.push(i as u32);
            }
        } else {
            let slots = &mut self.slots;
            let retired = &mut self.retired;
            self.free.retain(|&index| {
                let i = index as usize;
                if i < capacity {
                    return true;
                }
                slots[i] = Slot::Retired;
                *retired += 1;
                false
            });
        }
        self.target = capacity;
        self.drop_retired();
    }

    /// Truncate storage once every slot past the target is retired.
    fn drop_retired(&mut self) {
        if self.retired > 0 && self.retired == self.records.len() - self.target {
            self.records.truncate(self.target);
            self.slots.truncate(self.target);
            self.retired = 0;
        }
    }

    // -- Introspection --

    /// Slots currently backing the pool (free + live). Differs from the
    /// target capacity only while a shrink is pending.
    pub fn capacity(&self) -> usize {
        self.records.len() - self.retired
    }

    pub fn target_capacity(&self) -> usize {
        self.target
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            capacity: self.capacity(),
            target_capacity: self.target,
            live: self.live.len(),
            free: self.free.len(),
            evictions: self.evictions,
            spawned: self.spawned,
        }
    }

    /// Resolve a handle; `None` once its record has been recycled.
    pub fn get(&self, handle: ParticleHandle) -> Option<&Particle> {
        let i = handle.index as usize;
        match (self.slots.get(i), self.records.get(i)) {
            (Some(Slot::Live), Some(p)) if p.generation() == handle.generation => Some(p),
            _ => None,
        }
    }

    /// Live records, oldest first.
    pub fn iter_live(&self) -> impl Iterator<Item = &Particle> + '_ {
        self.live.iter().map(move |&i| &self.records[i as usize])
    }

    // -- Drawing --

    /// Paint every live record inside the viewport grown by the cull
    /// margin. Returns the number painted.
    pub fn draw(&self, camera: &Camera, painter: &mut dyn Painter) -> usize {
        let mut drawn = 0;
        for particle in self.iter_live() {
            if particle.alpha <= 0.0 {
                continue;
            }
            if !camera.is_within(particle.position, visual_extent(particle), self.cull_margin) {
                continue;
            }
            draw_particle(particle, camera.to_view(particle.position), painter);
            drawn += 1;
        }
        drawn
    }
}

impl Default for ParticlePool {
    fn default() -> Self {
        Self::new(QualityTier::default(), 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::painter::DrawList;
    use glam::Vec2;

    fn conserved(pool: &ParticlePool) -> bool {
        pool.free_count() + pool.live_count() == pool.capacity()
    }

    #[test]
    fn tier_capacities() {
        assert_eq!(ParticlePool::new(QualityTier::Low, 1).capacity(), 150);
        assert_eq!(ParticlePool::new(QualityTier::Medium, 1).capacity(), 300);
        assert_eq!(ParticlePool::new(QualityTier::High, 1).capacity(), 500);
        assert_eq!(QualityTier::from_name("MEDIUM"), Some(QualityTier::Medium));
        assert_eq!(QualityTier::from_name("ultra"), None);
    }

    #[test]
    fn conservation_through_spawn_tick_clear() {
        let mut pool = ParticlePool::with_capacity(32, 9);
        assert!(conserved(&pool));
        for i in 0..50 {
            pool.spawn(&SpawnConfig::new().with_life(0.1 + i as f32 * 0.01));
            assert!(conserved(&pool));
        }
        for _ in 0..40 {
            pool.tick(1.0 / 60.0);
            assert!(conserved(&pool));
        }
        pool.clear();
        assert!(conserved(&pool));
        assert_eq!(pool.live_count(), 0);
        assert_eq!(pool.free_count(), 32);
    }

    #[test]
    fn no_premature_reuse() {
        let mut pool = ParticlePool::with_capacity(8, 1);
        let long = pool.spawn(&SpawnConfig::new().with_life(10.0));
        for _ in 0..7 {
            pool.spawn(&SpawnConfig::new().with_life(0.05));
        }
        for _ in 0..5 {
            pool.tick(0.02);
            for _ in 0..3 {
                pool.spawn(&SpawnConfig::new().with_life(0.05));
            }
        }
        // The long-lived record may only be recycled by eviction, never
        // while it is handed out to a fresh spawn as "free".
        if pool.evictions() == 0 {
            assert!(pool.get(long).is_some());
        }
        let mut seen = std::collections::HashSet::new();
        for i in pool.live.iter() {
            assert!(seen.insert(*i), "index {i} live twice");
            assert!(!pool.free.contains(i), "index {i} both live and free");
        }
    }

    #[test]
    fn overflow_evicts_first_spawned() {
        let mut pool = ParticlePool::with_capacity(16, 1);
        let first = pool.spawn(&SpawnConfig::new().with_life(5.0));
        let second = pool.spawn(&SpawnConfig::new().with_life(5.0));
        for _ in 0..15 {
            pool.spawn(&SpawnConfig::new().with_life(5.0));
        }
        assert_eq!(pool.live_count(), 16);
        assert_eq!(pool.evictions(), 1);
        assert!(pool.get(first).is_none());
        assert!(pool.get(second).is_some());
        assert!(conserved(&pool));
    }

    #[test]
    fn protected_records_survive_pressure() {
        let mut pool = ParticlePool::with_capacity(4, 1);
        let boss = pool.spawn(&SpawnConfig::new().with_life(5.0).protected());
        for _ in 0..20 {
            pool.spawn(&SpawnConfig::new().with_life(5.0));
        }
        assert!(pool.get(boss).is_some());
        assert_eq!(pool.evictions(), 17);
    }

    #[test]
    fn all_protected_falls_back_to_oldest() {
        let mut pool = ParticlePool::with_capacity(2, 1);
        let a = pool.spawn(&SpawnConfig::new().protected());
        let b = pool.spawn(&SpawnConfig::new().protected());
        pool.spawn(&SpawnConfig::new().protected());
        assert!(pool.get(a).is_none());
        assert!(pool.get(b).is_some());
    }

    #[test]
    fn expired_records_return_in_same_tick() {
        let mut pool = ParticlePool::with_capacity(4, 1);
        let h = pool.spawn(&SpawnConfig::new().with_life(0.01));
        pool.tick(0.02);
        assert_eq!(pool.live_count(), 0);
        assert_eq!(pool.free_count(), 4);
        assert!(pool.get(h).is_none());
    }

    #[test]
    fn nan_dt_does_not_poison_records() {
        let mut pool = ParticlePool::with_capacity(4, 1);
        let h = pool.spawn(&SpawnConfig::new().with_velocity(Vec2::X).with_life(1.0));
        pool.tick(f32::NAN);
        let p = pool.get(h).map(|p| (p.position, p.alpha));
        assert_eq!(p, Some((Vec2::ZERO, 1.0)));
    }

    #[test]
    fn shrink_is_lazy() {
        let mut pool = ParticlePool::with_capacity(10, 1);
        for _ in 0..6 {
            pool.spawn(&SpawnConfig::new().with_life(1.0));
        }
        pool.set_capacity_exact(3);
        // Free slots past the target go away now; live ones stay.
        assert_eq!(pool.live_count(), 6);
        assert_eq!(pool.target_capacity(), 3);
        assert_eq!(pool.capacity(), 6);
        assert!(conserved(&pool));

        pool.tick(2.0);
        assert_eq!(pool.live_count(), 0);
        assert_eq!(pool.capacity(), 3);
        assert_eq!(pool.records.len(), 3);
        assert!(conserved(&pool));
    }

    #[test]
    fn grow_during_pending_shrink_reclaims_slots() {
        let mut pool = ParticlePool::with_capacity(10, 1);
        for _ in 0..6 {
            pool.spawn(&SpawnConfig::new().with_life(1.0));
        }
        pool.set_capacity_exact(3);
        pool.set_capacity(QualityTier::Low);
        assert_eq!(pool.capacity(), 150);
        assert_eq!(pool.free_count(), 144);
        assert!(conserved(&pool));
    }

    #[test]
    fn spawn_advanced_applies_lead_step() {
        let mut pool = ParticlePool::with_capacity(4, 1);
        let h = pool
            .spawn_advanced(&SpawnConfig::new().with_velocity(Vec2::new(60.0, 0.0)), 0.5)
            .map(|h| pool.get(h).map(|p| p.position.x));
        assert_eq!(h, Some(Some(30.0)));

        let gone = pool.spawn_advanced(&SpawnConfig::new().with_life(0.1), 0.5);
        assert!(gone.is_none());
        assert_eq!(pool.live_count(), 1);
        assert!(conserved(&pool));
    }

    #[test]
    fn burst_end_to_end() {
        let mut pool = ParticlePool::new(QualityTier::High, 1);
        let n = pool.spawn_burst(
            &SpawnConfig::at(Vec2::new(100.0, 100.0)).with_life(0.5),
            20,
            &BurstSpread::none(),
        );
        assert_eq!(n, 20);
        for _ in 0..15 {
            pool.tick(1.0 / 60.0);
        }
        for p in pool.iter_live() {
            assert!((p.alpha - 0.5).abs() < 0.01, "alpha {}", p.alpha);
        }
        assert_eq!(pool.live_count(), 20);
        for _ in 0..21 {
            pool.tick(1.0 / 60.0);
        }
        assert_eq!(pool.live_count(), 0);
        assert_eq!(pool.free_count(), 500);
    }

    #[test]
    fn oversized_burst_is_capped_at_capacity() {
        let mut pool = ParticlePool::with_capacity(50, 3);
        pool.spawn(&SpawnConfig::new());
        let spawned = pool.spawn_burst(&SpawnConfig::new(), u32::MAX as usize, &BurstSpread::none());
        assert_eq!(spawned, 50);
        assert_eq!(pool.live_count(), pool.capacity());
        assert_eq!(pool.evictions(), 1);
        assert_eq!(pool.stats().spawned, 51);
        assert!(conserved(&pool));
    }

    #[test]
    fn draw_culls_outside_margin() {
        let mut pool = ParticlePool::with_capacity(8, 1);
        let camera = Camera::new(100.0, 100.0);
        pool.spawn(&SpawnConfig::at(Vec2::new(10.0, 10.0)));
        pool.spawn(&SpawnConfig::at(Vec2::new(90.0, 0.0)));
        pool.spawn(&SpawnConfig::at(Vec2::new(5000.0, 0.0)));
        let mut list = DrawList::new();
        assert_eq!(pool.draw(&camera, &mut list), 2);
        assert!(!list.is_empty());
    }
}
