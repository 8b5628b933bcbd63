//! Render batch boundary
//!
//! Emitters push and remove instance keys; the batch decides draw order.
//! Keys rather than particle references cross this boundary, so the emitter
//! keeps sole ownership of particle state.

use crate::emitter::Emitter;
use crate::particle::{ParticleId, ParticleInstance};
use flare_core::EmitterId;
use std::cell::RefCell;
use std::rc::Rc;

/// Identifies one particle instance inside a render batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceKey {
    pub emitter: EmitterId,
    pub particle: ParticleId,
}

/// A display batch that particles are appended to and removed from.
pub trait ParticleContainer {
    /// Appends at the top of the draw order.
    fn add_instance(&mut self, key: InstanceKey);
    /// Inserts at `index`; 0 is the back of the draw order.
    fn add_instance_at(&mut self, key: InstanceKey, index: usize);
    fn remove_instance(&mut self, key: InstanceKey);
}

/// Shared handle to a container. Emitters borrow it and never own it.
pub type ContainerRef = Rc<RefCell<dyn ParticleContainer>>;

/// Ordered batch of instance keys, drawn back to front.
#[derive(Debug, Default, Clone)]
pub struct ParticleBatch {
    instances: Vec<InstanceKey>,
}

impl ParticleBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a new batch in a `ContainerRef`-compatible handle.
    pub fn shared() -> Rc<RefCell<ParticleBatch>> {
        Rc::new(RefCell::new(Self::new()))
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn keys(&self) -> &[InstanceKey] {
        &self.instances
    }

    pub fn contains(&self, key: InstanceKey) -> bool {
        self.instances.contains(&key)
    }

    /// Writes one instance record per key owned by `emitter`, in draw
    /// order. Returns how many were written.
    pub fn pack_instances(&self, emitter: &Emitter, out: &mut Vec<ParticleInstance>) -> usize {
        let before = out.len();
        out.extend(
            self.instances
                .iter()
                .filter(|key| key.emitter == emitter.id())
                .filter_map(|key| emitter.particle(key.particle))
                .map(ParticleInstance::from_particle),
        );
        out.len() - before
    }
}

impl ParticleContainer for ParticleBatch {
    fn add_instance(&mut self, key: InstanceKey) {
        self.instances.push(key);
    }

    fn add_instance_at(&mut self, key: InstanceKey, index: usize) {
        let index = index.min(self.instances.len());
        self.instances.insert(index, key);
    }

    fn remove_instance(&mut self, key: InstanceKey) {
        if let Some(pos) = self.instances.iter().position(|k| *k == key) {
            self.instances.remove(pos);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(n: u32) -> InstanceKey {
        InstanceKey {
            emitter: EmitterId::from_raw(1),
            particle: ParticleId(n),
        }
    }

    #[test]
    fn batch_orders_front_and_back() {
        let mut batch = ParticleBatch::new();
        batch.add_instance(key(0));
        batch.add_instance(key(1));
        batch.add_instance_at(key(2), 0);
        assert_eq!(batch.keys(), &[key(2), key(0), key(1)]);

        batch.remove_instance(key(0));
        assert_eq!(batch.keys(), &[key(2), key(1)]);

        // removing a missing key is a no-op
        batch.remove_instance(key(9));
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn insert_past_end_appends() {
        let mut batch = ParticleBatch::new();
        batch.add_instance_at(key(0), 10);
        assert!(batch.contains(key(0)));
    }
}
