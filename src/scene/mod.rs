//! # Scene Host Interface
//!
//! The session never owns renderable objects; the embedding engine does. This
//! module defines the narrow surface the session needs from that engine —
//! instantiate a model, destroy it, mutate its transform — plus an in-memory
//! implementation used by the tests and the scripted demo.

use std::collections::HashMap;
use std::fmt;

use cgmath::{Quaternion, Vector3};

/// Position, orientation, and scale of a placed object.
///
/// The session keeps this mirror of the host object's transform so gestures
/// like drag-rotate can compose onto the current orientation without a
/// read-back channel from the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Transform {
    /// Transform at a pose with unit scale.
    pub fn new(position: Vector3<f32>, rotation: Quaternion<f32>) -> Self {
        Self {
            position,
            rotation,
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

/// Host-issued handle to an instantiated object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectHandle(pub u64);

/// Tagged selection of a spawnable model variant.
///
/// The embedding application owns the key-to-asset mapping and registers it
/// with its scene host; the session resolves the key exactly once at
/// construction and fails fast if it is unknown.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct ModelKey(pub u32);

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "model#{}", self.0)
    }
}

/// What the session requires from the embedding engine's scene graph.
pub trait SceneHost {
    /// Whether `model` is registered and spawnable.
    fn has_model(&self, model: ModelKey) -> bool;

    /// Creates an instance of `model` at the given pose and returns its handle.
    fn instantiate(
        &mut self,
        model: ModelKey,
        position: Vector3<f32>,
        rotation: Quaternion<f32>,
    ) -> ObjectHandle;

    /// Removes a previously instantiated object.
    fn destroy(&mut self, object: ObjectHandle);

    fn set_position(&mut self, object: ObjectHandle, position: Vector3<f32>);
    fn set_rotation(&mut self, object: ObjectHandle, rotation: Quaternion<f32>);
    fn set_scale(&mut self, object: ObjectHandle, scale: Vector3<f32>);
}

/// Minimal scene host backed by a hash map.
///
/// Stands in for a real engine in unit tests and the scripted demo; also a
/// reference for what an adapter over an actual scene graph must do.
#[derive(Default)]
pub struct MemoryScene {
    models: Vec<ModelKey>,
    objects: HashMap<ObjectHandle, (ModelKey, Transform)>,
    next_handle: u64,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a spawnable model key.
    pub fn register_model(&mut self, model: ModelKey) {
        self.models.push(model);
    }

    /// Transform of a live object, if the handle is valid.
    pub fn transform(&self, object: ObjectHandle) -> Option<&Transform> {
        self.objects.get(&object).map(|(_, transform)| transform)
    }

    /// Number of live objects.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }
}

impl SceneHost for MemoryScene {
    fn has_model(&self, model: ModelKey) -> bool {
        self.models.contains(&model)
    }

    fn instantiate(
        &mut self,
        model: ModelKey,
        position: Vector3<f32>,
        rotation: Quaternion<f32>,
    ) -> ObjectHandle {
        let handle = ObjectHandle(self.next_handle);
        self.next_handle += 1;
        self.objects
            .insert(handle, (model, Transform::new(position, rotation)));
        handle
    }

    fn destroy(&mut self, object: ObjectHandle) {
        self.objects.remove(&object);
    }

    fn set_position(&mut self, object: ObjectHandle, position: Vector3<f32>) {
        if let Some((_, transform)) = self.objects.get_mut(&object) {
            transform.position = position;
        }
    }

    fn set_rotation(&mut self, object: ObjectHandle, rotation: Quaternion<f32>) {
        if let Some((_, transform)) = self.objects.get_mut(&object) {
            transform.rotation = rotation;
        }
    }

    fn set_scale(&mut self, object: ObjectHandle, scale: Vector3<f32>) {
        if let Some((_, transform)) = self.objects.get_mut(&object) {
            transform.scale = scale;
        }
    }
}
