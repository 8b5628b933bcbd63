//! Particle types: simulation state, pooled storage and GPU instance data

use crate::texture::TextureHandle;
use bytemuck::{Pod, Zeroable};
use flare_core::Point;
use std::collections::HashMap;

/// Stable handle to a slot in a `ParticleArena`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticleId(pub u32);

impl ParticleId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Frame playback state for animated textures.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AnimationState {
    /// Which configured animation this particle plays
    pub art: usize,
    pub elapsed: f32,
    pub framerate: f32,
    pub duration: f32,
}

/// Per-particle scratch state written by behaviors at init and read back
/// during update. Not cleared when a particle is recycled.
#[derive(Debug, Clone, Default)]
pub struct ParticleData {
    pub velocity: Point,
    pub speed_multiplier: f32,
    pub scale_multiplier: f32,
    pub rotation_speed: f32,
    /// Sign of the rotation speed drawn at init, for the zero clamp
    pub rotation_direction: f32,
    pub path_origin: Point,
    pub path_rotation: f32,
    pub path_movement: f32,
    pub animation: AnimationState,
    /// Free-form values for host behaviors
    pub custom: HashMap<String, f32>,
}

/// One pooled visual instance.
#[derive(Debug, Clone)]
pub struct Particle {
    id: ParticleId,
    /// Seconds lived; may briefly exceed `max_life` before recycling
    pub age: f32,
    pub max_life: f32,
    /// Eased progress through the lifetime
    pub age_percent: f32,
    pub one_over_life: f32,
    pub x: f32,
    pub y: f32,
    /// Radians
    pub rotation: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    /// Packed `0xRRGGBB`
    pub tint: u32,
    pub alpha: f32,
    pub anchor_x: f32,
    pub anchor_y: f32,
    pub texture: Option<TextureHandle>,
    pub data: ParticleData,
    pub(crate) next: Option<ParticleId>,
    pub(crate) prev: Option<ParticleId>,
    pub(crate) active: bool,
}

impl Particle {
    fn new(id: ParticleId, texture: Option<TextureHandle>) -> Self {
        Self {
            id,
            age: 0.0,
            max_life: 0.0,
            age_percent: 0.0,
            one_over_life: 0.0,
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            tint: 0xFFFFFF,
            alpha: 1.0,
            anchor_x: 0.5,
            anchor_y: 0.5,
            texture,
            data: ParticleData::default(),
            next: None,
            prev: None,
            active: false,
        }
    }

    pub fn id(&self) -> ParticleId {
        self.id
    }

    /// Whether the particle is in the active list rather than the pool.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn set_position(&mut self, p: Point) {
        self.x = p.x;
        self.y = p.y;
    }

    /// Resets transform and visual state for a fresh life of `max_life`
    /// seconds. `max_life` must be positive.
    pub fn init(&mut self, max_life: f32) {
        self.max_life = max_life;
        self.age = 0.0;
        self.age_percent = 0.0;
        self.rotation = 0.0;
        self.x = 0.0;
        self.y = 0.0;
        self.scale_x = 1.0;
        self.scale_y = 1.0;
        self.tint = 0xFFFFFF;
        self.alpha = 1.0;
        self.one_over_life = 1.0 / max_life;
    }

    /// Hides the particle and drops its list links. Safe to call twice.
    pub fn destroy(&mut self) {
        self.alpha = 0.0;
        self.next = None;
        self.prev = None;
        self.active = false;
    }
}

/// Slot storage holding the active list (doubly linked, in spawn order)
/// and the free pool (singly linked through `next`).
#[derive(Debug, Default)]
pub struct ParticleArena {
    slots: Vec<Particle>,
    first: Option<ParticleId>,
    last: Option<ParticleId>,
    pool_first: Option<ParticleId>,
    active_count: usize,
}

impl ParticleArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of particles in the active list.
    pub fn active_count(&self) -> usize {
        self.active_count
    }

    /// Number of particles waiting in the pool.
    pub fn pool_count(&self) -> usize {
        let mut count = 0;
        let mut cursor = self.pool_first;
        while let Some(id) = cursor {
            count += 1;
            cursor = self.slots[id.index()].next;
        }
        count
    }

    /// Total slots ever allocated.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn first(&self) -> Option<ParticleId> {
        self.first
    }

    pub fn last(&self) -> Option<ParticleId> {
        self.last
    }

    pub fn get(&self, id: ParticleId) -> Option<&Particle> {
        self.slots.get(id.index())
    }

    pub fn get_mut(&mut self, id: ParticleId) -> Option<&mut Particle> {
        self.slots.get_mut(id.index())
    }

    pub(crate) fn slot(&self, id: ParticleId) -> &Particle {
        &self.slots[id.index()]
    }

    pub(crate) fn slot_mut(&mut self, id: ParticleId) -> &mut Particle {
        &mut self.slots[id.index()]
    }

    /// Link following `id`, in whichever list it belongs to.
    pub fn next_of(&self, id: ParticleId) -> Option<ParticleId> {
        self.slots.get(id.index()).and_then(|p| p.next)
    }

    fn allocate(&mut self, texture: Option<TextureHandle>) -> ParticleId {
        let id = ParticleId(self.slots.len() as u32);
        self.slots.push(Particle::new(id, texture));
        id
    }

    /// Pre-allocates `count` pooled particles.
    pub fn fill_pool(&mut self, count: usize, texture: Option<TextureHandle>) {
        for _ in 0..count {
            let id = self.allocate(texture);
            self.slots[id.index()].next = self.pool_first;
            self.pool_first = Some(id);
        }
    }

    /// Pops a pooled particle, allocating a new one if the pool is empty.
    /// The particle is detached from both lists.
    pub(crate) fn take(&mut self, texture: Option<TextureHandle>) -> ParticleId {
        match self.pool_first {
            Some(id) => {
                let p = &mut self.slots[id.index()];
                self.pool_first = p.next;
                p.next = None;
                id
            }
            None => self.allocate(texture),
        }
    }

    /// Appends a detached particle to the tail of the active list.
    pub(crate) fn push_active(&mut self, id: ParticleId) {
        let prev = self.last;
        {
            let p = &mut self.slots[id.index()];
            p.prev = prev;
            p.next = None;
            p.active = true;
        }
        match prev {
            Some(last) => self.slots[last.index()].next = Some(id),
            None => self.first = Some(id),
        }
        self.last = Some(id);
        self.active_count += 1;
    }

    /// Unlinks an active particle and pushes it onto the pool. Returns
    /// false if the particle was not active.
    pub(crate) fn release(&mut self, id: ParticleId) -> bool {
        let Some(p) = self.slots.get(id.index()) else {
            return false;
        };
        if !p.active {
            return false;
        }
        let (prev, next) = (p.prev, p.next);
        if let Some(next) = next {
            self.slots[next.index()].prev = prev;
        }
        if let Some(prev) = prev {
            self.slots[prev.index()].next = next;
        }
        if self.last == Some(id) {
            self.last = prev;
        }
        if self.first == Some(id) {
            self.first = next;
        }

        let pool_first = self.pool_first;
        let p = &mut self.slots[id.index()];
        p.prev = None;
        p.next = pool_first;
        p.active = false;
        self.pool_first = Some(id);
        self.active_count -= 1;
        true
    }

    /// Destroys every slot. Active particles must be released first.
    pub(crate) fn clear(&mut self) {
        for p in &mut self.slots {
            p.destroy();
        }
        self.slots.clear();
        self.first = None;
        self.last = None;
        self.pool_first = None;
        self.active_count = 0;
    }

    /// Active particles in list order.
    pub fn iter(&self) -> ActiveParticles<'_> {
        ActiveParticles {
            arena: self,
            cursor: self.first,
        }
    }

    /// A cursor over the active list from `head` to the tail.
    pub fn wave(&mut self, head: ParticleId) -> Wave<'_> {
        Wave::new(self, Some(head))
    }
}

/// Iterator over the active list.
pub struct ActiveParticles<'a> {
    arena: &'a ParticleArena,
    cursor: Option<ParticleId>,
}

impl<'a> Iterator for ActiveParticles<'a> {
    type Item = &'a Particle;

    fn next(&mut self) -> Option<&'a Particle> {
        let id = self.cursor?;
        let p = self.arena.slot(id);
        self.cursor = p.next;
        Some(p)
    }
}

/// The particles spawned together in one slot. Behaviors walk it with
/// `while let Some(p) = wave.next_particle()`.
pub struct Wave<'a> {
    arena: &'a mut ParticleArena,
    head: Option<ParticleId>,
    cursor: Option<ParticleId>,
}

impl<'a> Wave<'a> {
    pub fn new(arena: &'a mut ParticleArena, head: Option<ParticleId>) -> Self {
        Self {
            arena,
            head,
            cursor: head,
        }
    }

    pub fn head(&self) -> Option<ParticleId> {
        self.head
    }

    pub fn next_particle(&mut self) -> Option<&mut Particle> {
        let id = self.cursor?;
        let p = self.arena.slot_mut(id);
        self.cursor = p.next;
        Some(p)
    }

    /// Moves the cursor back to the first particle of the wave.
    pub fn rewind(&mut self) {
        self.cursor = self.head;
    }
}

/// GPU instance data for one particle sprite.
/// 64 bytes, 4 rows of vec4.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ParticleInstance {
    pub position_rotation: [f32; 4], // x, y, rotation, unused
    pub scale_alpha: [f32; 4],       // scale_x, scale_y, alpha, unused
    pub tint_anchor: [f32; 4],       // tint r, g, b in [0, 1], anchor_x
    pub texture: [u32; 4],           // texture id, source id, anchor_y bits, has texture
}

impl ParticleInstance {
    pub fn from_particle(p: &Particle) -> Self {
        let r = ((p.tint >> 16) & 0xFF) as f32 / 255.0;
        let g = ((p.tint >> 8) & 0xFF) as f32 / 255.0;
        let b = (p.tint & 0xFF) as f32 / 255.0;
        let (texture_id, source, flags) = match p.texture {
            Some(t) => (t.id, t.source, 1),
            None => (0, 0, 0),
        };
        Self {
            position_rotation: [p.x, p.y, p.rotation, 0.0],
            scale_alpha: [p.scale_x, p.scale_y, p.alpha, 0.0],
            tint_anchor: [r, g, b, p.anchor_x],
            texture: [texture_id, source, p.anchor_y.to_bits(), flags],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn(arena: &mut ParticleArena) -> ParticleId {
        let id = arena.take(None);
        arena.push_active(id);
        id
    }

    #[test]
    fn init_resets_visual_state() {
        let mut arena = ParticleArena::new();
        let id = spawn(&mut arena);
        let p = arena.get_mut(id).unwrap();
        p.x = 10.0;
        p.alpha = 0.2;
        p.tint = 0x123456;
        p.init(2.0);
        assert_eq!(p.x, 0.0);
        assert_eq!(p.alpha, 1.0);
        assert_eq!(p.tint, 0xFFFFFF);
        assert_eq!(p.one_over_life, 0.5);
        assert_eq!(p.anchor_x, 0.5);
    }

    #[test]
    fn release_relinks_neighbours() {
        let mut arena = ParticleArena::new();
        let a = spawn(&mut arena);
        let b = spawn(&mut arena);
        let c = spawn(&mut arena);
        assert_eq!(arena.active_count(), 3);

        assert!(arena.release(b));
        let order: Vec<ParticleId> = arena.iter().map(|p| p.id()).collect();
        assert_eq!(order, vec![a, c]);
        assert_eq!(arena.pool_count(), 1);

        // already pooled
        assert!(!arena.release(b));

        assert!(arena.release(c));
        assert_eq!(arena.last(), Some(a));
        assert!(arena.release(a));
        assert_eq!(arena.first(), None);
        assert_eq!(arena.pool_count(), 3);
    }

    #[test]
    fn pool_is_reused_before_allocating() {
        let mut arena = ParticleArena::new();
        arena.fill_pool(2, None);
        assert_eq!(arena.capacity(), 2);
        spawn(&mut arena);
        spawn(&mut arena);
        assert_eq!(arena.capacity(), 2);
        spawn(&mut arena);
        assert_eq!(arena.capacity(), 3);
    }

    #[test]
    fn wave_walks_to_tail() {
        let mut arena = ParticleArena::new();
        spawn(&mut arena);
        let head = spawn(&mut arena);
        spawn(&mut arena);

        let mut wave = arena.wave(head);
        let mut visited = 0;
        while let Some(p) = wave.next_particle() {
            p.alpha = 0.5;
            visited += 1;
        }
        assert_eq!(visited, 2);

        wave.rewind();
        assert!(wave.next_particle().is_some());
        let alphas: Vec<f32> = arena.iter().map(|p| p.alpha).collect();
        assert_eq!(alphas, vec![1.0, 0.5, 0.5]);
    }

    #[test]
    fn destroy_is_idempotent() {
        let mut arena = ParticleArena::new();
        let id = spawn(&mut arena);
        let p = arena.get_mut(id).unwrap();
        p.destroy();
        p.destroy();
        assert!(p.next.is_none() && p.prev.is_none());
        assert_eq!(p.alpha, 0.0);
    }

    #[test]
    fn particle_instance_layout() {
        assert_eq!(std::mem::size_of::<ParticleInstance>(), 64);
        assert_eq!(std::mem::align_of::<ParticleInstance>(), 4);
    }
}
