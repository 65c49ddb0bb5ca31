//! Scene-level BVH over actor world bounds.

use prism_core::{Actor, ActorId, Bvh, Scene};
use prism_math::Ray;

use crate::hit::Intersection;

/// BVH over the visible actors of one scene snapshot.
///
/// Remembers the scene version it was built from; a BVH is stale once the
/// scene's version moves on and must be rebuilt before the next query.
#[derive(Debug, Clone, Default)]
pub struct SceneBvh {
    bvh: Bvh,
    actors: Vec<ActorId>,
    version: u64,
}

impl SceneBvh {
    /// Build over the scene's visible actors.
    pub fn build(scene: &Scene) -> Self {
        let (actors, bounds): (Vec<ActorId>, Vec<_>) = scene
            .iter_actors()
            .filter(|(_, actor)| actor.is_visible())
            .map(|(id, actor)| (id, actor.world_bounds()))
            .unzip();

        let bvh = Bvh::build(&bounds);
        log::info!(
            "Built scene BVH: {} actors, {} materials, {} nodes (scene version {})",
            actors.len(),
            scene.materials().len(),
            bvh.node_count(),
            scene.version()
        );

        Self {
            bvh,
            actors,
            version: scene.version(),
        }
    }

    /// Scene version this BVH was built from.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_stale(&self, scene: &Scene) -> bool {
        self.version != scene.version()
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    pub fn node_count(&self) -> usize {
        self.bvh.node_count()
    }

    /// Nearest hit along the ray inside its `[t_min, t_max]`.
    pub fn nearest(&self, scene: &Scene, ray: &Ray) -> Option<Intersection> {
        debug_assert!(!self.is_stale(scene), "querying a stale scene BVH");

        let mut triangle = None;
        let (index, distance) = self.bvh.nearest(ray, |primitive, best| {
            let hit = self.actor(scene, primitive)?.intersect(ray, best)?;
            triangle = hit.triangle;
            Some(hit.distance)
        })?;

        let id = self.actors[index];
        let actor = scene.actor(id)?;
        let point = ray.at(distance);
        Some(Intersection {
            distance,
            actor: id,
            triangle,
            point,
            normal: actor.normal_at(point, triangle),
        })
    }

    /// True if some actor accepted by `blocks` is hit inside the ray's range.
    pub fn occluded<F>(&self, scene: &Scene, ray: &Ray, blocks: F) -> bool
    where
        F: Fn(&Actor) -> bool,
    {
        debug_assert!(!self.is_stale(scene), "querying a stale scene BVH");

        self.bvh.any(ray, |primitive, t_max| {
            self.actor(scene, primitive)
                .filter(|actor| blocks(actor))
                .is_some_and(|actor| actor.intersect(ray, t_max).is_some())
        })
    }

    fn actor<'s>(&self, scene: &'s Scene, primitive: usize) -> Option<&'s Actor> {
        scene.actor(self.actors[primitive])
    }
}
