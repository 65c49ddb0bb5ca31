//! Scene container: actors, lights, background and ambient colour.
//!
//! The scene carries a version counter bumped by every change that can
//! affect the acceleration structure, so a renderer can tell whether the
//! BVH it holds was built from the current state.

use std::sync::Arc;

use prism_math::Aabb;

use crate::actor::Actor;
use crate::light::Light;
use crate::material::{Color, Material};

/// Index of an actor within its scene.
///
/// Ids are positions in the actor list, so removing an actor shifts the ids
/// of every actor after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(pub usize);

impl ActorId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A complete scene ready for rendering.
#[derive(Debug)]
pub struct Scene {
    pub name: String,
    actors: Vec<Actor>,
    lights: Vec<Light>,
    background: Color,
    ambient: Color,
    version: u64,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new("scene")
    }
}

impl Scene {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actors: Vec::new(),
            lights: Vec::new(),
            background: Color::new(0.1, 0.1, 0.1),
            ambient: Color::splat(0.2),
            version: 0,
        }
    }

    /// Monotonic change counter for actor membership and state.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn add_actor(&mut self, actor: Actor) -> ActorId {
        let id = ActorId(self.actors.len());
        self.actors.push(actor);
        self.touch();
        id
    }

    /// Remove an actor. Later ids shift down by one.
    pub fn remove_actor(&mut self, id: ActorId) -> Option<Actor> {
        if id.0 >= self.actors.len() {
            return None;
        }
        let actor = self.actors.remove(id.0);
        self.touch();
        Some(actor)
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(id.0)
    }

    /// Mutable access; assumes the actor changes and bumps the version.
    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        if id.0 < self.actors.len() {
            self.touch();
        }
        self.actors.get_mut(id.0)
    }

    pub fn set_visible(&mut self, id: ActorId, visible: bool) {
        if let Some(actor) = self.actors.get_mut(id.0) {
            if actor.is_visible() != visible {
                actor.set_visible(visible);
                self.version += 1;
            }
        }
    }

    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    /// Actors with their ids.
    pub fn iter_actors(&self) -> impl Iterator<Item = (ActorId, &Actor)> {
        self.actors.iter().enumerate().map(|(i, a)| (ActorId(i), a))
    }

    pub fn find_actor(&self, name: &str) -> Option<ActorId> {
        self.actors.iter().position(|a| a.name() == name).map(ActorId)
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    pub fn add_light(&mut self, light: Light) -> usize {
        self.lights.push(light);
        self.lights.len() - 1
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// Lights don't affect the acceleration structure, so this doesn't bump the version.
    pub fn lights_mut(&mut self) -> &mut [Light] {
        &mut self.lights
    }

    pub fn find_light(&self, name: &str) -> Option<&Light> {
        self.lights.iter().find(|l| l.name == name)
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn set_background(&mut self, color: Color) {
        self.background = color;
    }

    pub fn ambient(&self) -> Color {
        self.ambient
    }

    pub fn set_ambient(&mut self, color: Color) {
        self.ambient = color;
    }

    /// Distinct materials in use, in first-use order.
    pub fn materials(&self) -> Vec<Arc<Material>> {
        let mut materials: Vec<Arc<Material>> = Vec::new();
        for actor in &self.actors {
            if !materials.iter().any(|m| Arc::ptr_eq(m, actor.material())) {
                materials.push(Arc::clone(actor.material()));
            }
        }
        materials
    }

    /// Bounds of all visible actors.
    pub fn world_bounds(&self) -> Aabb {
        self.actors
            .iter()
            .filter(|a| a.is_visible())
            .fold(Aabb::EMPTY, |acc, a| Aabb::surrounding(&acc, &a.world_bounds()))
    }

    pub fn clear(&mut self) {
        self.actors.clear();
        self.lights.clear();
        self.touch();
    }

    fn touch(&mut self) {
        self.version += 1;
    }
}
