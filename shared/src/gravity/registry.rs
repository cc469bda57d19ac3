use std::sync::Arc;

use parking_lot::RwLock;

use super::{GravityError, GravityField, GravitySource, SourceId};
use crate::types::Vec3;

/// The set of currently active gravity sources.
///
/// Owned by the simulation context and passed by reference to whatever needs gravity.
/// Insertion order is evaluation order; the sum does not depend on it.
/// The registry holds `Arc`s so a source's owner keeps its own handle while registered.
#[derive(Default)]
pub struct GravityRegistry {
    sources: Vec<(SourceId, Arc<dyn GravitySource>)>,
}

impl GravityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Activate a source.
    ///
    /// Registering an id or a source object that is already present is a programming error:
    /// it is logged and rejected with the existing id, and the registry is left untouched.
    pub fn register(
        &mut self,
        id: SourceId,
        source: Arc<dyn GravitySource>,
    ) -> Result<(), GravityError> {
        if self.contains(id) {
            log::error!("Duplicate registration of {id}");
            return Err(GravityError::DuplicateSource(id));
        }
        if let Some(existing) = self.id_of(&source) {
            log::error!("Source already registered as {existing}, rejected as {id}");
            return Err(GravityError::DuplicateSource(existing));
        }
        log::debug!("Registered {id} ({} active)", self.sources.len() + 1);
        self.sources.push((id, source));
        Ok(())
    }

    /// Deactivate a source, handing back the registry's reference.
    pub fn unregister(&mut self, id: SourceId) -> Result<Arc<dyn GravitySource>, GravityError> {
        let Some(idx) = self.sources.iter().position(|(sid, _)| *sid == id) else {
            log::error!("Unregistration of unknown {id}");
            return Err(GravityError::UnknownSource(id));
        };
        // Preserve evaluation order of the remaining sources.
        let (_, source) = self.sources.remove(idx);
        log::debug!("Unregistered {id} ({} active)", self.sources.len());
        Ok(source)
    }

    pub fn contains(&self, id: SourceId) -> bool {
        self.sources.iter().any(|(sid, _)| *sid == id)
    }

    /// Id under which this exact source object is registered.
    pub fn id_of(&self, source: &Arc<dyn GravitySource>) -> Option<SourceId> {
        self.sources
            .iter()
            .find(|(_, s)| std::ptr::addr_eq(Arc::as_ptr(s), Arc::as_ptr(source)))
            .map(|(id, _)| *id)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = SourceId> + '_ {
        self.sources.iter().map(|(id, _)| *id)
    }
}

impl GravityField for GravityRegistry {
    fn gravity_at(&self, position: &Vec3) -> Vec3 {
        self.sources
            .iter()
            .fold(Vec3::zeros(), |acc, (_, s)| acc + s.gravity_at(position))
    }
}

/// Registry handle for hosts that step controllers from several threads.
///
/// Mutation takes the write lock; queries hold the read lock only while summing.
#[derive(Clone, Default)]
pub struct SharedGravityRegistry(Arc<RwLock<GravityRegistry>>);

impl SharedGravityRegistry {
    pub fn new(registry: GravityRegistry) -> Self {
        Self(Arc::new(RwLock::new(registry)))
    }

    pub fn register(
        &self,
        id: SourceId,
        source: Arc<dyn GravitySource>,
    ) -> Result<(), GravityError> {
        self.0.write().register(id, source)
    }

    pub fn unregister(&self, id: SourceId) -> Result<Arc<dyn GravitySource>, GravityError> {
        self.0.write().unregister(id)
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }
}

impl GravityField for SharedGravityRegistry {
    fn gravity_at(&self, position: &Vec3) -> Vec3 {
        self.0.read().gravity_at(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gravity::{PointGravity, UniformGravity};

    fn uniform(x: f32, y: f32, z: f32) -> Arc<dyn GravitySource> {
        Arc::new(UniformGravity::new(Vec3::new(x, y, z)))
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = GravityRegistry::new();
        registry.register(SourceId(1), uniform(0.0, -9.81, 0.0)).unwrap();
        assert_eq!(
            registry.register(SourceId(1), uniform(1.0, 0.0, 0.0)),
            Err(GravityError::DuplicateSource(SourceId(1)))
        );
        assert_eq!(registry.len(), 1);
        assert!((registry.gravity_at(&Vec3::zeros()).y + 9.81).abs() < 1.0e-6);
    }

    #[test]
    fn same_source_under_a_new_id_is_rejected() {
        let mut registry = GravityRegistry::new();
        let earth: Arc<dyn GravitySource> = Arc::new(UniformGravity::earth());
        registry.register(SourceId(1), earth.clone()).unwrap();
        assert_eq!(
            registry.register(SourceId(2), earth.clone()),
            Err(GravityError::DuplicateSource(SourceId(1)))
        );
        assert_eq!(registry.len(), 1);
        assert!(!registry.contains(SourceId(2)));
        assert!((registry.gravity_at(&Vec3::zeros()).y + 9.81).abs() < 1.0e-5);

        // An equal but distinct source object is a separate registration.
        registry.register(SourceId(2), Arc::new(UniformGravity::earth())).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn unregistering_unknown_source_fails() {
        let mut registry = GravityRegistry::new();
        assert!(matches!(
            registry.unregister(SourceId(7)),
            Err(GravityError::UnknownSource(SourceId(7)))
        ));
    }

    #[test]
    fn summation_does_not_depend_on_registration_order() {
        let sources = [
            (SourceId(1), uniform(0.0, -9.81, 0.0)),
            (SourceId(2), uniform(2.0, 0.0, 0.5)),
            (
                SourceId(3),
                Arc::new(PointGravity::new(Vec3::new(0.0, 0.0, 10.0), 4.0, 20.0, 30.0)) as _,
            ),
        ];
        let probe = Vec3::new(1.0, 2.0, 3.0);

        let mut forward = GravityRegistry::new();
        for (id, s) in sources.iter() {
            forward.register(*id, s.clone()).unwrap();
        }
        let mut backward = GravityRegistry::new();
        for (id, s) in sources.iter().rev() {
            backward.register(*id, s.clone()).unwrap();
        }

        let expected = sources
            .iter()
            .fold(Vec3::zeros(), |acc, (_, s)| acc + s.gravity_at(&probe));
        assert!((forward.gravity_at(&probe) - expected).norm() < 1.0e-5);
        assert!((backward.gravity_at(&probe) - expected).norm() < 1.0e-5);
    }

    #[test]
    fn unregister_removes_contribution() {
        let mut registry = GravityRegistry::new();
        registry.register(SourceId(1), uniform(0.0, -10.0, 0.0)).unwrap();
        registry.register(SourceId(2), uniform(0.0, -5.0, 0.0)).unwrap();
        registry.unregister(SourceId(1)).unwrap();
        assert!(!registry.contains(SourceId(1)));
        assert!((registry.gravity_at(&Vec3::zeros()).y + 5.0).abs() < 1.0e-6);
    }

    #[test]
    fn cancelling_sources_yield_no_up_axis() {
        let mut registry = GravityRegistry::new();
        registry.register(SourceId(1), uniform(0.0, -9.81, 0.0)).unwrap();
        registry.register(SourceId(2), uniform(0.0, 9.81, 0.0)).unwrap();
        let (gravity, up) = registry.gravity_and_up_at(&Vec3::zeros());
        assert_eq!(gravity, Vec3::zeros());
        assert!(up.is_none());
    }

    #[test]
    fn up_axis_opposes_summed_gravity() {
        let mut registry = GravityRegistry::new();
        registry.register(SourceId(1), uniform(0.0, -3.0, 0.0)).unwrap();
        registry.register(SourceId(2), uniform(-4.0, 0.0, 0.0)).unwrap();
        let up = registry.up_axis_at(&Vec3::zeros()).unwrap();
        assert!((up - Vec3::new(0.8, 0.6, 0.0)).norm() < 1.0e-5);
    }

    #[test]
    fn shared_registry_serves_queries_across_threads() {
        let shared = SharedGravityRegistry::default();
        shared.register(SourceId(1), uniform(0.0, -9.81, 0.0)).unwrap();

        let reader = shared.clone();
        let handle = std::thread::spawn(move || reader.gravity_at(&Vec3::zeros()));
        let g = handle.join().unwrap();
        assert!((g.y + 9.81).abs() < 1.0e-6);

        shared.unregister(SourceId(1)).unwrap();
        assert!(shared.is_empty());
    }
}
