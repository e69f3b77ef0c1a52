//! # Session Controller
//!
//! Owns one placement session end to end: runs the gesture interpreter every
//! frame, polls the marker settle machine, and applies the resulting intents
//! and commits to the scene host. The host keeps ownership of the spawned
//! objects; the session only holds handles and a transform mirror.

use std::collections::HashMap;
use std::time::Duration;

use cgmath::Vector3;
use log::{debug, info, warn};

use crate::error::SessionError;
use crate::gesture::{FrameInput, GestureInterpreter, Intent, PlacementHit, PlacementMode};
use crate::input::TouchSample;
use crate::marker::{Commit, ImageEvent, MarkerId, SettleMachine};
use crate::math::apply_yaw;
use crate::scene::{ObjectHandle, SceneHost, Transform};
use crate::session::SessionConfig;

#[derive(Debug, Clone, Copy)]
struct PlacedObject {
    handle: ObjectHandle,
    transform: Transform,
}

/// A running placement session over a host-owned scene graph.
///
/// Drive it with [`frame`](Self::frame) once per render frame and, in marker
/// mode, with [`on_images_changed`](Self::on_images_changed) whenever the
/// image tracker reports. `now` is the offset since session start and must
/// not decrease across calls.
pub struct Session<H: SceneHost> {
    config: SessionConfig,
    host: H,
    interpreter: GestureInterpreter,
    settle: SettleMachine,
    /// Plane mode: the single tap-placed object.
    plane_object: Option<PlacedObject>,
    /// Marker mode: one object per spawned marker.
    marker_objects: HashMap<MarkerId, PlacedObject>,
    /// Marker whose object currently receives gestures (most recent commit).
    active_marker: Option<MarkerId>,
}

impl<H: SceneHost> Session<H> {
    /// Builds a session, failing fast on bad configuration or an unknown
    /// model key. The model is resolved here, once, and never re-looked-up
    /// per spawn.
    pub fn new(config: SessionConfig, host: H) -> Result<Self, SessionError> {
        config.validate()?;
        if !host.has_model(config.model) {
            return Err(SessionError::UnknownModel(config.model));
        }

        info!(
            "session started: {:?} mode, {}",
            config.mode, config.model
        );

        Ok(Self {
            interpreter: GestureInterpreter::new(
                config.mode,
                config.rotate_sensitivity,
                config.min_finger_distance,
                config.min_scale,
            ),
            settle: SettleMachine::new(config.settle_delay, config.destroy_on_loss),
            config,
            host,
            plane_object: None,
            marker_objects: HashMap::new(),
            active_marker: None,
        })
    }

    /// Runs one frame: fires elapsed settle deadlines (marker mode), then
    /// interprets this frame's touches and applies the resulting intents.
    pub fn frame(
        &mut self,
        touches: &[TouchSample],
        hit: Option<PlacementHit>,
        camera_position: Vector3<f32>,
        now: Duration,
    ) {
        if self.config.mode == PlacementMode::Marker {
            for (marker, commit) in self.settle.poll(now, camera_position) {
                self.apply_commit(marker, commit);
            }
        }

        let input = FrameInput {
            touches,
            hit,
            camera_position,
            object_scale: self.gesture_target().map(|object| object.transform.scale),
        };
        for intent in self.interpreter.update(&input) {
            self.apply_intent(intent);
        }
    }

    /// Forwards image-tracker reports to the settle machine.
    pub fn on_images_changed(&mut self, events: &[ImageEvent], now: Duration) {
        if self.config.mode != PlacementMode::Marker {
            warn!("image events received in plane mode, ignoring");
            return;
        }
        for event in events {
            self.settle.on_image_event(event, now);
        }
    }

    /// Destroys every live object and returns the session to its initial
    /// state, ready to place again.
    pub fn reset(&mut self) {
        if let Some(object) = self.plane_object.take() {
            self.host.destroy(object.handle);
        }
        for (_, object) in self.marker_objects.drain() {
            self.host.destroy(object.handle);
        }
        self.active_marker = None;
        self.interpreter.reset();
        self.settle.reset();
        info!("session reset");
    }

    /// Whether any object is currently placed.
    pub fn is_placed(&self) -> bool {
        self.interpreter.is_placed()
    }

    /// Transform mirror of the object gestures currently target.
    pub fn placed_transform(&self) -> Option<&Transform> {
        self.gesture_target().map(|object| &object.transform)
    }

    /// Transform mirror of a specific marker's object.
    pub fn marker_transform(&self, marker: MarkerId) -> Option<&Transform> {
        self.marker_objects
            .get(&marker)
            .map(|object| &object.transform)
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    fn gesture_target(&self) -> Option<&PlacedObject> {
        match self.config.mode {
            PlacementMode::Plane => self.plane_object.as_ref(),
            PlacementMode::Marker => self
                .active_marker
                .and_then(|marker| self.marker_objects.get(&marker)),
        }
    }

    fn gesture_target_mut(&mut self) -> Option<&mut PlacedObject> {
        match self.config.mode {
            PlacementMode::Plane => self.plane_object.as_mut(),
            PlacementMode::Marker => {
                let marker = self.active_marker?;
                self.marker_objects.get_mut(&marker)
            }
        }
    }

    fn apply_intent(&mut self, intent: Intent) {
        match intent {
            Intent::Place { position, rotation } => {
                let handle = self.host.instantiate(self.config.model, position, rotation);
                self.plane_object = Some(PlacedObject {
                    handle,
                    transform: Transform::new(position, rotation),
                });
                info!("placed {} at {position:?}", self.config.model);
            }
            Intent::Move { position, rotation } => {
                let Some(object) = self.gesture_target_mut() else {
                    debug_assert!(false, "move intent with no placed object");
                    warn!("move intent with no placed object, ignoring");
                    return;
                };
                object.transform.position = position;
                object.transform.rotation = rotation;
                let handle = object.handle;
                self.host.set_position(handle, position);
                self.host.set_rotation(handle, rotation);
            }
            Intent::Rotate { delta_yaw } => {
                let Some(object) = self.gesture_target_mut() else {
                    debug_assert!(false, "rotate intent with no placed object");
                    warn!("rotate intent with no placed object, ignoring");
                    return;
                };
                object.transform.rotation = apply_yaw(object.transform.rotation, delta_yaw);
                let (handle, rotation) = (object.handle, object.transform.rotation);
                self.host.set_rotation(handle, rotation);
            }
            Intent::Scale { scale } => {
                let Some(object) = self.gesture_target_mut() else {
                    debug_assert!(false, "scale intent with no placed object");
                    warn!("scale intent with no placed object, ignoring");
                    return;
                };
                object.transform.scale = scale;
                let handle = object.handle;
                self.host.set_scale(handle, scale);
                if let Some(marker) = self.active_marker {
                    // Repositions after the pinch must keep this scale.
                    self.settle.note_scale(marker, scale);
                }
            }
        }
    }

    fn apply_commit(&mut self, marker: MarkerId, commit: Commit) {
        match commit {
            Commit::Spawn { position, rotation } => {
                let handle = self.host.instantiate(self.config.model, position, rotation);
                self.marker_objects.insert(
                    marker,
                    PlacedObject {
                        handle,
                        transform: Transform::new(position, rotation),
                    },
                );
                self.active_marker = Some(marker);
                self.interpreter.notify_placed();
            }
            Commit::Reposition { position, scale } => {
                let Some(object) = self.marker_objects.get_mut(&marker) else {
                    warn!("reposition commit for unspawned {marker}, ignoring");
                    return;
                };
                object.transform.position = position;
                object.transform.scale = scale;
                let handle = object.handle;
                self.host.set_position(handle, position);
                self.host.set_scale(handle, scale);
                self.active_marker = Some(marker);
                debug!("{marker} repositioned to {position:?}");
            }
            Commit::Despawn => {
                if let Some(object) = self.marker_objects.remove(&marker) {
                    self.host.destroy(object.handle);
                }
                if self.active_marker == Some(marker) {
                    // Hand gestures to any remaining marker object, or none.
                    self.active_marker = self.marker_objects.keys().next().copied();
                }
                if self.marker_objects.is_empty() {
                    self.interpreter.notify_removed();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::TouchPhase;
    use crate::marker::TrackingState;
    use crate::math::{facing_rotation, forward, Pose};
    use crate::scene::{MemoryScene, ModelKey};
    use cgmath::Vector2;

    const CAMERA: Vector3<f32> = Vector3::new(0.0, 1.0, 0.0);

    fn scene() -> MemoryScene {
        let mut scene = MemoryScene::new();
        scene.register_model(ModelKey(0));
        scene
    }

    fn touch(phase: TouchPhase, x: f32, y: f32) -> TouchSample {
        TouchSample::new(0, Vector2::new(x, y), phase)
    }

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn unknown_model_fails_fast() {
        let result = Session::new(SessionConfig::plane(ModelKey(9)), scene());
        assert_eq!(
            result.err(),
            Some(SessionError::UnknownModel(ModelKey(9)))
        );
    }

    #[test]
    fn invalid_config_fails_fast() {
        let mut config = SessionConfig::plane(ModelKey(0));
        config.rotate_sensitivity = -1.0;
        assert!(matches!(
            Session::new(config, scene()),
            Err(SessionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn plane_place_then_lock_then_no_move() {
        let mut session = Session::new(SessionConfig::plane(ModelKey(0)), scene()).unwrap();
        let hit = PlacementHit::new(Vector3::new(1.0, 0.0, 2.0));

        session.frame(&[touch(TouchPhase::Began, 10.0, 10.0)], Some(hit), CAMERA, secs(0));
        assert!(session.is_placed());
        assert_eq!(session.host().object_count(), 1);

        let placed = *session.placed_transform().unwrap();
        assert_eq!(placed.position, Vector3::new(1.0, 0.0, 2.0));
        assert_eq!(placed.rotation, facing_rotation(CAMERA, placed.position));

        session.frame(&[touch(TouchPhase::Ended, 10.0, 10.0)], Some(hit), CAMERA, secs(0));

        // Movement is locked: a valid hit elsewhere must not move the object.
        let elsewhere = PlacementHit::new(Vector3::new(5.0, 0.0, 5.0));
        session.frame(
            &[touch(TouchPhase::Moved, 20.0, 10.0)],
            Some(elsewhere),
            CAMERA,
            secs(1),
        );
        assert_eq!(
            session.placed_transform().unwrap().position,
            Vector3::new(1.0, 0.0, 2.0)
        );
    }

    #[test]
    fn plane_drag_moves_until_first_release() {
        let mut session = Session::new(SessionConfig::plane(ModelKey(0)), scene()).unwrap();

        session.frame(
            &[touch(TouchPhase::Began, 10.0, 10.0)],
            Some(PlacementHit::new(Vector3::new(0.0, 0.0, 1.0))),
            CAMERA,
            secs(0),
        );

        let target = Vector3::new(0.5, 0.0, 1.5);
        session.frame(
            &[touch(TouchPhase::Moved, 12.0, 10.0)],
            Some(PlacementHit::new(target)),
            CAMERA,
            secs(0),
        );
        assert_eq!(session.placed_transform().unwrap().position, target);
    }

    #[test]
    fn marker_spawn_settles_then_gestures_apply() {
        let mut session = Session::new(SessionConfig::marker(ModelKey(0)), scene()).unwrap();
        let marker = MarkerId(7);

        session.on_images_changed(
            &[ImageEvent {
                marker,
                tracking: TrackingState::Tracking,
                pose: Pose::at(Vector3::new(0.0, 0.0, 2.0)),
            }],
            secs(0),
        );

        // Before the settle delay elapses nothing exists.
        session.frame(&[], None, CAMERA, Duration::from_millis(500));
        assert!(!session.is_placed());

        session.frame(&[], None, CAMERA, secs(1));
        assert!(session.is_placed());
        assert_eq!(session.host().object_count(), 1);

        // Pinch the spawned object up to double scale.
        session.frame(
            &[
                TouchSample::new(0, Vector2::new(100.0, 100.0), TouchPhase::Began),
                TouchSample::new(1, Vector2::new(200.0, 100.0), TouchPhase::Began),
            ],
            None,
            CAMERA,
            secs(2),
        );
        session.frame(
            &[
                TouchSample::new(0, Vector2::new(100.0, 100.0), TouchPhase::Moved),
                TouchSample::new(1, Vector2::new(300.0, 100.0), TouchPhase::Moved),
            ],
            None,
            CAMERA,
            secs(2),
        );
        assert_eq!(
            session.marker_transform(marker).unwrap().scale,
            Vector3::new(2.0, 2.0, 2.0)
        );

        // Marker drifts; the reposition keeps the pinched scale.
        session.on_images_changed(
            &[ImageEvent {
                marker,
                tracking: TrackingState::Limited,
                pose: Pose::at(Vector3::new(1.0, 0.0, 2.0)),
            }],
            secs(3),
        );
        session.frame(&[], None, CAMERA, secs(4));

        let transform = session.marker_transform(marker).unwrap();
        assert_eq!(transform.position, Vector3::new(1.0, 0.0, 2.0));
        assert_eq!(transform.scale, Vector3::new(2.0, 2.0, 2.0));
    }

    #[test]
    fn marker_drag_spins_spawned_object() {
        let mut session = Session::new(SessionConfig::marker(ModelKey(0)), scene()).unwrap();

        session.on_images_changed(
            &[ImageEvent {
                marker: MarkerId(1),
                tracking: TrackingState::Tracking,
                pose: Pose::at(Vector3::new(0.0, 0.0, 2.0)),
            }],
            secs(0),
        );
        session.frame(&[], None, CAMERA, secs(1));
        let before = forward(session.placed_transform().unwrap().rotation);

        session.frame(&[touch(TouchPhase::Began, 100.0, 100.0)], None, CAMERA, secs(2));
        session.frame(&[touch(TouchPhase::Moved, 180.0, 100.0)], None, CAMERA, secs(2));

        let after = forward(session.placed_transform().unwrap().rotation);
        assert!((before - after).x.abs() > 1e-3 || (before - after).z.abs() > 1e-3);
    }

    #[test]
    fn despawn_on_loss_removes_host_object() {
        let mut config = SessionConfig::marker(ModelKey(0));
        config.destroy_on_loss = true;
        let mut session = Session::new(config, scene()).unwrap();
        let marker = MarkerId(1);

        session.on_images_changed(
            &[ImageEvent {
                marker,
                tracking: TrackingState::Tracking,
                pose: Pose::at(Vector3::new(0.0, 0.0, 2.0)),
            }],
            secs(0),
        );
        session.frame(&[], None, CAMERA, secs(1));
        assert_eq!(session.host().object_count(), 1);

        session.on_images_changed(
            &[ImageEvent {
                marker,
                tracking: TrackingState::None,
                pose: Pose::at(Vector3::new(0.0, 0.0, 2.0)),
            }],
            secs(2),
        );
        session.frame(&[], None, CAMERA, secs(2));

        assert_eq!(session.host().object_count(), 0);
        assert!(!session.is_placed());
    }

    #[test]
    fn image_events_ignored_in_plane_mode() {
        let mut session = Session::new(SessionConfig::plane(ModelKey(0)), scene()).unwrap();

        session.on_images_changed(
            &[ImageEvent {
                marker: MarkerId(1),
                tracking: TrackingState::Tracking,
                pose: Pose::at(Vector3::new(0.0, 0.0, 2.0)),
            }],
            secs(0),
        );
        session.frame(&[], None, CAMERA, secs(5));
        assert_eq!(session.host().object_count(), 0);
    }

    #[test]
    fn reset_destroys_objects_and_allows_replacement() {
        let mut session = Session::new(SessionConfig::plane(ModelKey(0)), scene()).unwrap();
        let hit = PlacementHit::new(Vector3::new(1.0, 0.0, 2.0));

        session.frame(&[touch(TouchPhase::Began, 10.0, 10.0)], Some(hit), CAMERA, secs(0));
        session.frame(&[touch(TouchPhase::Ended, 10.0, 10.0)], Some(hit), CAMERA, secs(0));
        assert_eq!(session.host().object_count(), 1);

        session.reset();
        assert_eq!(session.host().object_count(), 0);
        assert!(!session.is_placed());

        session.frame(&[touch(TouchPhase::Began, 10.0, 10.0)], Some(hit), CAMERA, secs(1));
        assert_eq!(session.host().object_count(), 1);
    }
}
