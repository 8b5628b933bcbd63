//! Particle emitter: spawn timing, the behavior pipeline and pooling
//!
//! An emitter owns its particles outright. It pushes instance keys into a
//! borrowed render batch (`ContainerRef`) as particles spawn and removes
//! them on recycle. Call `update` once per frame with elapsed seconds, or
//! hand the emitter to a `Ticker`.

use crate::behaviors::Behavior;
use crate::config::{BehaviorEntry, EmitterConfig};
use crate::container::{ContainerRef, InstanceKey};
use crate::ease::Ease;
use crate::particle::{ActiveParticles, Particle, ParticleArena, ParticleId};
use crate::rand::ParticleRng;
use crate::registry::BehaviorRegistry;
use crate::texture::{parse_textures, TextureHandle, TextureResolver};
use flare_core::{EmitterId, FlareError, Point, Result, DEG_TO_RADS};
use serde::Serialize;
use std::fmt;
use std::rc::Rc;

/// Name reported by `behavior_types` for the built-in transform step.
pub const POSITION_PARTICLE: &str = "positionParticle";

const DEFAULT_MAX_PARTICLES: usize = 1000;

/// Lifecycle of an emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmitterState {
    /// No config applied yet
    Uninitialized,
    /// Configured, not emitting, nothing alive
    Configured,
    Emitting,
    /// Not emitting while particles drain
    Idle,
    /// Drained after emitting stopped
    Complete,
    Destroyed,
}

/// One entry of the init pipeline, in run order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PipelineStep {
    Behavior(usize),
    /// Applies emitter rotation and world offset, then catch-up age
    PositionParticle,
}

struct BehaviorSlot {
    type_name: String,
    behavior: Box<dyn Behavior>,
}

pub struct Emitter {
    id: EmitterId,
    parent: Option<ContainerRef>,
    textures: Rc<dyn TextureResolver>,
    registry: Rc<BehaviorRegistry>,
    particle_images: Vec<TextureHandle>,
    arena: ParticleArena,
    rng: ParticleRng,

    behaviors: Vec<BehaviorSlot>,
    pipeline: Vec<PipelineStep>,
    update_steps: Vec<usize>,
    recycle_steps: Vec<usize>,
    original_config: Option<EmitterConfig>,

    min_lifetime: f32,
    max_lifetime: f32,
    ease: Option<Ease>,
    particles_per_wave: u32,
    frequency: f32,
    spawn_chance: f32,
    /// Seconds of emission per `set_emit(true)`; -1 for unlimited
    emitter_lifetime: f32,
    max_particles: usize,
    add_at_back: bool,

    /// Degrees
    rotation: f32,
    owner_pos: Point,
    spawn_pos: Point,
    prev_emitter_pos: Point,
    prev_pos_valid: bool,
    pos_changed: bool,

    /// Goes negative while spawns are overdue
    spawn_timer: f32,
    emitter_life: f32,
    emit: bool,
    auto_update: bool,
    destroy_when_complete: bool,
    complete_callback: Option<Box<dyn FnOnce()>>,
    completed: bool,
    destroyed: bool,
}

impl Emitter {
    /// Creates an emitter with no behaviors. Call `init` before updating.
    pub fn new(
        parent: ContainerRef,
        textures: Rc<dyn TextureResolver>,
        registry: Rc<BehaviorRegistry>,
    ) -> Self {
        Self {
            id: EmitterId::new(),
            parent: Some(parent),
            textures,
            registry,
            particle_images: Vec::new(),
            arena: ParticleArena::new(),
            rng: ParticleRng::from_entropy(),
            behaviors: Vec::new(),
            pipeline: Vec::new(),
            update_steps: Vec::new(),
            recycle_steps: Vec::new(),
            original_config: None,
            min_lifetime: 0.0,
            max_lifetime: 0.0,
            ease: None,
            particles_per_wave: 1,
            frequency: 1.0,
            spawn_chance: 1.0,
            emitter_lifetime: -1.0,
            max_particles: DEFAULT_MAX_PARTICLES,
            add_at_back: false,
            rotation: 0.0,
            owner_pos: Point::ZERO,
            spawn_pos: Point::ZERO,
            prev_emitter_pos: Point::ZERO,
            prev_pos_valid: false,
            pos_changed: false,
            spawn_timer: 0.0,
            emitter_life: -1.0,
            emit: false,
            auto_update: false,
            destroy_when_complete: false,
            complete_callback: None,
            completed: false,
            destroyed: false,
        }
    }

    /// Creates an emitter, assigns its default particle images and applies
    /// `config`.
    pub fn with_config<S: AsRef<str>>(
        parent: ContainerRef,
        textures: Rc<dyn TextureResolver>,
        registry: Rc<BehaviorRegistry>,
        images: &[S],
        config: &EmitterConfig,
    ) -> Result<Self> {
        let mut emitter = Self::new(parent, textures, registry);
        if !images.is_empty() {
            emitter.set_particle_images(images)?;
        }
        emitter.init(config)?;
        Ok(emitter)
    }

    pub fn id(&self) -> EmitterId {
        self.id
    }

    /// Applies a config. Active particles are recycled first; the pool is
    /// kept. Unknown behavior types are skipped with a warning.
    pub fn init(&mut self, config: &EmitterConfig) -> Result<()> {
        self.cleanup();

        let lifetime = config.lifetime;
        if !(lifetime.min > 0.0 && lifetime.min <= lifetime.max) {
            return Err(FlareError::ConfigParse(format!(
                "lifetime range must satisfy 0 < min <= max, got {}..{}",
                lifetime.min, lifetime.max
            )));
        }
        let ease = config.ease.as_ref().map(Ease::from_config).transpose()?;
        let behaviors = self.build_behaviors(&config.behaviors)?;

        self.original_config = Some(config.clone());
        self.min_lifetime = lifetime.min;
        self.max_lifetime = lifetime.max;
        self.ease = ease;
        self.particles_per_wave = config.particles_per_wave.filter(|n| *n > 1).unwrap_or(1);
        self.set_frequency(config.frequency);
        self.spawn_chance = config
            .spawn_chance
            .filter(|chance| *chance > 0.0)
            .unwrap_or(1.0);
        self.emitter_lifetime = config
            .emitter_lifetime
            .filter(|life| *life > 0.0)
            .unwrap_or(-1.0);
        self.max_particles = config
            .max_particles
            .filter(|max| *max > 0)
            .unwrap_or(DEFAULT_MAX_PARTICLES);
        self.add_at_back = config.add_at_back;

        self.rotation = 0.0;
        self.owner_pos = Point::ZERO;
        self.spawn_pos = config.pos;
        self.prev_emitter_pos = config.pos;
        self.prev_pos_valid = false;
        self.pos_changed = false;

        self.spawn_timer = 0.0;
        self.completed = false;
        self.destroyed = false;
        self.set_emit(config.emit.unwrap_or(true));
        self.auto_update = config.auto_update;

        self.install_pipeline(behaviors);
        log::debug!(
            "Emitter {} pipeline: {:?}",
            self.id,
            self.behavior_types()
        );
        Ok(())
    }

    fn build_behaviors(&self, entries: &[BehaviorEntry]) -> Result<Vec<BehaviorSlot>> {
        let mut slots = Vec::with_capacity(entries.len());
        for entry in entries {
            let created =
                self.registry
                    .create(&entry.behavior_type, &entry.config, &*self.textures)?;
            match created {
                Some(behavior) => slots.push(BehaviorSlot {
                    type_name: entry.behavior_type.clone(),
                    behavior,
                }),
                None => log::warn!(
                    "Unknown behavior type '{}', skipping",
                    entry.behavior_type
                ),
            }
        }
        Ok(slots)
    }

    fn install_pipeline(&mut self, behaviors: Vec<BehaviorSlot>) {
        let mut pipeline: Vec<PipelineStep> = (0..behaviors.len())
            .map(PipelineStep::Behavior)
            .chain(std::iter::once(PipelineStep::PositionParticle))
            .collect();
        // Spawn behaviors before the transform step, everything else after
        pipeline.sort_by_key(|step| match step {
            PipelineStep::Behavior(i) => behaviors[*i].behavior.order().value() * 2,
            PipelineStep::PositionParticle => 1,
        });

        let behavior_steps = pipeline.iter().filter_map(|step| match step {
            PipelineStep::Behavior(i) => Some(*i),
            PipelineStep::PositionParticle => None,
        });
        self.update_steps = behavior_steps
            .clone()
            .filter(|i| behaviors[*i].behavior.has_update())
            .collect();
        self.recycle_steps = behavior_steps
            .filter(|i| behaviors[*i].behavior.has_recycle())
            .collect();
        self.pipeline = pipeline;
        self.behaviors = behaviors;
    }

    /// Default textures for newly allocated particles. Every image must
    /// come from one source.
    pub fn set_particle_images<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        if names.is_empty() {
            return Err(FlareError::EmptyTextureList);
        }
        self.particle_images = parse_textures(&*self.textures, names)?;
        Ok(())
    }

    pub fn particle_images(&self) -> &[TextureHandle] {
        &self.particle_images
    }

    /// Advances the simulation by `delta` seconds.
    pub fn update(&mut self, delta: f32) {
        let Some(parent) = self.parent.clone() else {
            return;
        };

        let mut cursor = self.arena.first();
        while let Some(id) = cursor {
            cursor = self.arena.next_of(id);
            if self.age_particle(id, delta) {
                self.recycle(id, false);
            }
        }

        let prev = self.prev_pos_valid.then_some(self.prev_emitter_pos);
        let cur = self.owner_pos + self.spawn_pos;

        if self.emit {
            self.spawn_timer -= delta.max(0.0);
            while self.spawn_timer <= 0.0 {
                if self.emitter_life >= 0.0 {
                    self.emitter_life -= self.frequency;
                    if self.emitter_life <= 0.0 {
                        self.spawn_timer = 0.0;
                        self.emitter_life = 0.0;
                        self.set_emit(false);
                        break;
                    }
                }
                if self.arena.active_count() >= self.max_particles {
                    self.spawn_timer += self.frequency;
                    continue;
                }

                let emit_pos = match prev {
                    Some(prev) if self.pos_changed && delta > 0.0 => {
                        let lerp = 1.0 + self.spawn_timer / delta;
                        prev + (cur - prev) * lerp
                    }
                    _ => cur,
                };

                let catch_up = -self.spawn_timer;
                let mut head = None;
                for _ in 0..self.wave_size() {
                    if self.rejects_spawn() {
                        continue;
                    }
                    let lifetime = self.roll_lifetime();
                    // would already be dead by now
                    if catch_up >= lifetime {
                        continue;
                    }
                    let id = self.spawn_particle(lifetime, &parent);
                    head.get_or_insert(id);
                }

                if let Some(head) = head {
                    self.init_wave(head, emit_pos, Some(catch_up));
                    let mut cursor = Some(head);
                    while let Some(id) = cursor {
                        cursor = self.arena.next_of(id);
                        let p = self.arena.slot_mut(id);
                        if run_updates(&mut self.behaviors, &self.update_steps, p, catch_up) {
                            self.recycle(id, false);
                        }
                    }
                }
                self.spawn_timer += self.frequency;
            }
        }

        if self.pos_changed {
            self.prev_emitter_pos = cur;
            self.prev_pos_valid = true;
            self.pos_changed = false;
        }

        if !self.emit && self.arena.active_count() == 0 {
            self.completed = true;
            if let Some(callback) = self.complete_callback.take() {
                callback();
            }
            if self.destroy_when_complete {
                self.destroy();
            }
        }
    }

    /// Spawns one wave immediately at the current position, ignoring the
    /// spawn timer and emitter lifetime.
    pub fn emit_now(&mut self) {
        let Some(parent) = self.parent.clone() else {
            return;
        };
        let emit_pos = self.owner_pos + self.spawn_pos;
        let mut head = None;
        for _ in 0..self.wave_size() {
            if self.rejects_spawn() {
                continue;
            }
            let lifetime = self.roll_lifetime();
            let id = self.spawn_particle(lifetime, &parent);
            head.get_or_insert(id);
        }
        if let Some(head) = head {
            self.init_wave(head, emit_pos, None);
        }
    }

    fn wave_size(&self) -> usize {
        let room = self.max_particles.saturating_sub(self.arena.active_count());
        (self.particles_per_wave as usize).min(room)
    }

    fn rejects_spawn(&mut self) -> bool {
        self.spawn_chance < 1.0 && self.rng.next_f32() >= self.spawn_chance
    }

    fn roll_lifetime(&mut self) -> f32 {
        if self.min_lifetime == self.max_lifetime {
            self.min_lifetime
        } else {
            self.rng.range(self.min_lifetime, self.max_lifetime)
        }
    }

    fn spawn_particle(&mut self, lifetime: f32, parent: &ContainerRef) -> ParticleId {
        let id = self.arena.take(self.particle_images.first().copied());
        self.arena.slot_mut(id).init(lifetime);
        let key = InstanceKey {
            emitter: self.id,
            particle: id,
        };
        if self.add_at_back {
            parent.borrow_mut().add_instance_at(key, 0);
        } else {
            parent.borrow_mut().add_instance(key);
        }
        self.arena.push_active(id);
        id
    }

    /// Runs the init pipeline over the wave starting at `head`. With
    /// `catch_up`, particles are aged by that many seconds as they are
    /// placed.
    fn init_wave(&mut self, head: ParticleId, emit_pos: Point, catch_up: Option<f32>) {
        for step in &self.pipeline {
            let mut wave = self.arena.wave(head);
            match *step {
                PipelineStep::Behavior(i) => {
                    self.behaviors[i]
                        .behavior
                        .init_particles(&mut wave, &mut self.rng);
                }
                PipelineStep::PositionParticle => {
                    let rotation = self.rotation * DEG_TO_RADS;
                    while let Some(p) = wave.next_particle() {
                        if rotation != 0.0 {
                            p.set_position(p.position().rotated(rotation));
                            p.rotation += rotation;
                        }
                        p.x += emit_pos.x;
                        p.y += emit_pos.y;
                        if let Some(age) = catch_up {
                            p.age += age;
                            p.age_percent = eased(self.ease.as_ref(), p.age * p.one_over_life);
                        }
                    }
                }
            }
        }
        log::trace!("Emitter {} spawned wave at {:?}", self.id, emit_pos);
    }

    /// Ages one particle and runs its update behaviors. Returns true if it
    /// should be recycled.
    fn age_particle(&mut self, id: ParticleId, delta: f32) -> bool {
        let p = self.arena.slot_mut(id);
        p.age += delta;
        if p.age > p.max_life || p.age < 0.0 {
            return true;
        }
        p.age_percent = eased(self.ease.as_ref(), p.age * p.one_over_life);
        run_updates(&mut self.behaviors, &self.update_steps, p, delta)
    }

    /// Returns a particle to the pool. `from_cleanup` marks a forced
    /// recycle rather than a natural death.
    fn recycle(&mut self, id: ParticleId, from_cleanup: bool) -> bool {
        if !self.arena.get(id).is_some_and(Particle::is_active) {
            return false;
        }
        let p = self.arena.slot_mut(id);
        for &i in &self.recycle_steps {
            self.behaviors[i]
                .behavior
                .recycle_particle(p, !from_cleanup);
        }
        self.arena.release(id);
        self.arena.slot_mut(id).alpha = 0.0;
        if let Some(parent) = &self.parent {
            parent.borrow_mut().remove_instance(InstanceKey {
                emitter: self.id,
                particle: id,
            });
        }
        true
    }

    /// Recycles a live particle early. Returns false if it was not active.
    pub fn kill(&mut self, id: ParticleId) -> bool {
        self.recycle(id, false)
    }

    /// Recycles every active particle.
    pub fn cleanup(&mut self) {
        while let Some(id) = self.arena.first() {
            if !self.recycle(id, true) {
                break;
            }
        }
    }

    /// Tears the emitter down. It stays inert until re-parented and
    /// re-initialized.
    pub fn destroy(&mut self) {
        self.auto_update = false;
        self.cleanup();
        self.arena.clear();
        self.parent = None;
        self.ease = None;
        self.complete_callback = None;
        self.behaviors.clear();
        self.pipeline.clear();
        self.update_steps.clear();
        self.recycle_steps.clear();
        self.destroyed = true;
        log::debug!("Emitter {} destroyed", self.id);
    }

    /// True once the emitter has no render batch or no pipeline.
    pub fn is_destroyed(&self) -> bool {
        self.parent.is_none() || self.pipeline.is_empty()
    }

    pub fn state(&self) -> EmitterState {
        if self.destroyed {
            EmitterState::Destroyed
        } else if self.original_config.is_none() {
            EmitterState::Uninitialized
        } else if self.emit {
            EmitterState::Emitting
        } else if self.arena.active_count() > 0 {
            EmitterState::Idle
        } else if self.completed {
            EmitterState::Complete
        } else {
            EmitterState::Configured
        }
    }

    pub fn emit(&self) -> bool {
        self.emit
    }

    /// Starts or stops emission. Either way the emitter lifetime countdown
    /// restarts.
    pub fn set_emit(&mut self, emit: bool) {
        self.emit = emit;
        self.emitter_life = self.emitter_lifetime;
        if emit {
            self.completed = false;
        }
    }

    pub fn auto_update(&self) -> bool {
        self.auto_update
    }

    pub fn set_auto_update(&mut self, auto_update: bool) {
        self.auto_update = auto_update;
    }

    /// Emits until the emitter lifetime runs out and every particle has
    /// died, then calls `callback`. The callback must not borrow this
    /// emitter.
    pub fn play_once(&mut self, callback: Option<Box<dyn FnOnce()>>) {
        self.set_emit(true);
        self.complete_callback = callback;
    }

    /// Like `play_once`, but ticks automatically and destroys the emitter
    /// when complete.
    pub fn play_once_and_destroy(&mut self, callback: Option<Box<dyn FnOnce()>>) {
        self.auto_update = true;
        self.set_emit(true);
        self.destroy_when_complete = true;
        self.complete_callback = callback;
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Seconds between waves. Non-positive values fall back to 1.
    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = if frequency > 0.0 { frequency } else { 1.0 };
    }

    /// Emitter rotation in degrees.
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Sets the emitter rotation in degrees, rotating the spawn offset with
    /// it.
    pub fn rotate(&mut self, new_rotation: f32) {
        if self.rotation == new_rotation {
            return;
        }
        let diff = new_rotation - self.rotation;
        self.rotation = new_rotation;
        self.spawn_pos = self.spawn_pos.rotated(diff * DEG_TO_RADS);
        self.pos_changed = true;
    }

    pub fn spawn_pos(&self) -> Point {
        self.spawn_pos
    }

    pub fn owner_pos(&self) -> Point {
        self.owner_pos
    }

    pub fn update_spawn_pos(&mut self, x: f32, y: f32) {
        self.pos_changed = true;
        self.spawn_pos = Point::new(x, y);
    }

    pub fn update_owner_pos(&mut self, x: f32, y: f32) {
        self.pos_changed = true;
        self.owner_pos = Point::new(x, y);
    }

    /// Stops the next spawn from interpolating from the last position, for
    /// teleports.
    pub fn reset_position_tracking(&mut self) {
        self.prev_pos_valid = false;
    }

    /// Pre-allocates `count` pooled particles.
    pub fn fill_pool(&mut self, count: usize) {
        self.arena
            .fill_pool(count, self.particle_images.first().copied());
    }

    /// The first behavior registered under `type_name`.
    pub fn get_behavior(&self, type_name: &str) -> Option<&dyn Behavior> {
        self.behaviors
            .iter()
            .find(|slot| slot.type_name == type_name)
            .map(|slot| slot.behavior.as_ref())
    }

    /// The first behavior of concrete type `T`.
    pub fn behavior<T: Behavior>(&self) -> Option<&T> {
        self.behaviors
            .iter()
            .find_map(|slot| slot.behavior.as_any().downcast_ref::<T>())
    }

    /// Type names of the init pipeline in run order.
    pub fn behavior_types(&self) -> Vec<&str> {
        self.pipeline
            .iter()
            .map(|step| match step {
                PipelineStep::Behavior(i) => self.behaviors[*i].type_name.as_str(),
                PipelineStep::PositionParticle => POSITION_PARTICLE,
            })
            .collect()
    }

    pub fn parent(&self) -> Option<&ContainerRef> {
        self.parent.as_ref()
    }

    /// Moves the emitter to another render batch. Live particles are
    /// recycled first.
    pub fn set_parent(&mut self, parent: Option<ContainerRef>) {
        self.cleanup();
        self.parent = parent;
    }

    /// The config last passed to `init`.
    pub fn original_config(&self) -> Option<&EmitterConfig> {
        self.original_config.as_ref()
    }

    /// Replaces the lifetime ease, overriding the config's.
    pub fn set_custom_ease(&mut self, ease: Option<Ease>) {
        self.ease = ease;
    }

    pub fn set_seed(&mut self, seed: u64) {
        self.rng.reseed(seed);
    }

    pub fn particle_count(&self) -> usize {
        self.arena.active_count()
    }

    pub fn max_particles(&self) -> usize {
        self.max_particles
    }

    /// Pooled plus active particle slots.
    pub fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// Active particles, oldest first.
    pub fn particles(&self) -> ActiveParticles<'_> {
        self.arena.iter()
    }

    /// An active particle by id.
    pub fn particle(&self, id: ParticleId) -> Option<&Particle> {
        self.arena.get(id).filter(|p| p.is_active())
    }
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("particles", &self.arena.active_count())
            .field("pipeline", &self.behavior_types())
            .finish()
    }
}

fn eased(ease: Option<&Ease>, t: f32) -> f32 {
    match ease {
        Some(ease) => ease.apply(t),
        None => t,
    }
}

/// Runs update behaviors in order, stopping at the first that reports the
/// particle dead.
fn run_updates(
    behaviors: &mut [BehaviorSlot],
    steps: &[usize],
    particle: &mut Particle,
    delta: f32,
) -> bool {
    for &i in steps {
        if behaviors[i].behavior.update_particle(particle, delta) {
            return true;
        }
    }
    false
}
