//! # Marker Settle State Machine
//!
//! Image trackers report noisy poses in the first moments after detecting a
//! marker; committing a spawn on the first raw sample puts the model visibly
//! off target. This machine debounces each marker behind a fixed settle
//! delay: the first stable `Tracking` report arms a deadline, and only when
//! the deadline elapses (with tracking still alive) does a spawn or
//! reposition commit fire.
//!
//! Time is a caller-supplied offset from session start. Deadlines are plain
//! values checked by [`SettleMachine::poll`] on the frame thread, so a
//! deadline obsoleted by a tracking loss simply never fires — there is no
//! separate timer thread to cancel.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use cgmath::{Quaternion, Vector3};
use log::{debug, info, trace};

use crate::math::{facing_rotation, Pose};

/// Identifier the image tracker assigns to a reference marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub u32);

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "marker#{}", self.0)
    }
}

/// Tracking quality reported by the image tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingState {
    /// Marker not visible.
    None,
    /// Marker detected with reduced confidence.
    Limited,
    /// Marker tracked with full confidence.
    Tracking,
}

/// Latch preventing a marker from re-triggering its settle timer while one
/// is already pending or recently fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnGate {
    /// Ready to accept the next full-confidence report.
    Armed,
    /// A settle deadline is pending or has fired; ignore further `Tracking`
    /// reports until the marker is lost.
    Cooling,
}

/// One entry of the tracker's `imagesChanged` stream.
#[derive(Debug, Clone, Copy)]
pub struct ImageEvent {
    pub marker: MarkerId,
    pub tracking: TrackingState,
    pub pose: Pose,
}

/// Transform commitment produced when a settle deadline elapses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Commit {
    /// First commit for a marker: spawn the model facing the camera.
    Spawn {
        position: Vector3<f32>,
        rotation: Quaternion<f32>,
    },
    /// Later commits: move the existing model, keeping its gesture scale.
    Reposition {
        position: Vector3<f32>,
        scale: Vector3<f32>,
    },
    /// Marker lost with destroy-on-loss enabled: remove the model.
    Despawn,
}

#[derive(Debug, Clone, Copy)]
struct PendingSettle {
    deadline: Duration,
    pose: Pose,
    low_confidence: bool,
}

#[derive(Debug, Clone, Copy)]
struct MarkerRecord {
    tracking: TrackingState,
    gate: SpawnGate,
    spawned: bool,
    last_committed_scale: Vector3<f32>,
    pending: Option<PendingSettle>,
    despawn_requested: bool,
}

impl MarkerRecord {
    fn new() -> Self {
        Self {
            tracking: TrackingState::None,
            gate: SpawnGate::Armed,
            spawned: false,
            last_committed_scale: Vector3::new(1.0, 1.0, 1.0),
            pending: None,
            despawn_requested: false,
        }
    }
}

/// Per-marker settle debouncing, keyed by marker identity.
///
/// Records are fully independent: a deadline firing for one marker never
/// touches another marker's gate or spawn state.
pub struct SettleMachine {
    settle_delay: Duration,
    destroy_on_loss: bool,
    markers: HashMap<MarkerId, MarkerRecord>,
}

impl SettleMachine {
    pub fn new(settle_delay: Duration, destroy_on_loss: bool) -> Self {
        Self {
            settle_delay,
            destroy_on_loss,
            markers: HashMap::new(),
        }
    }

    /// Feeds one tracker report into the machine.
    ///
    /// `now` is the time offset since session start and must not decrease
    /// across calls.
    pub fn on_image_event(&mut self, event: &ImageEvent, now: Duration) {
        let record = self
            .markers
            .entry(event.marker)
            .or_insert_with(MarkerRecord::new);
        record.tracking = event.tracking;

        match event.tracking {
            TrackingState::Tracking => match record.gate {
                SpawnGate::Cooling => {
                    trace!("{}: tracking report ignored, gate cooling", event.marker);
                }
                SpawnGate::Armed => {
                    record.gate = SpawnGate::Cooling;
                    record.pending = Some(PendingSettle {
                        deadline: now + self.settle_delay,
                        pose: event.pose,
                        low_confidence: false,
                    });
                    debug!(
                        "{}: settle timer armed, commit in {:?}",
                        event.marker, self.settle_delay
                    );
                }
            },
            TrackingState::Limited => {
                // Keep following the marker at reduced confidence: restart
                // the deadline with the fresh pose but leave the gate alone.
                record.pending = Some(PendingSettle {
                    deadline: now + self.settle_delay,
                    pose: event.pose,
                    low_confidence: true,
                });
            }
            TrackingState::None => {
                record.gate = SpawnGate::Armed;
                record.pending = None;
                if self.destroy_on_loss && record.spawned {
                    record.despawn_requested = true;
                }
                debug!("{}: tracking lost, gate re-armed", event.marker);
            }
        }
    }

    /// Fires elapsed settle deadlines and drains despawn requests.
    ///
    /// `camera_position` feeds the facing rule for spawn rotations, evaluated
    /// at fire time rather than detection time.
    pub fn poll(&mut self, now: Duration, camera_position: Vector3<f32>) -> Vec<(MarkerId, Commit)> {
        let mut commits = Vec::new();

        for (&marker, record) in self.markers.iter_mut() {
            if record.despawn_requested {
                record.despawn_requested = false;
                record.spawned = false;
                info!("{marker}: despawn on tracking loss");
                commits.push((marker, Commit::Despawn));
            }

            let Some(pending) = record.pending else {
                continue;
            };
            if pending.deadline > now {
                continue;
            }
            record.pending = None;

            // Deadline outlived its marker: tracking was lost after arming,
            // so the stale timer fires into a no-op.
            if record.tracking == TrackingState::None {
                trace!("{marker}: stale settle deadline dropped");
                continue;
            }

            let position = pending.pose.position;
            if record.spawned {
                commits.push((
                    marker,
                    Commit::Reposition {
                        position,
                        scale: record.last_committed_scale,
                    },
                ));
            } else {
                record.spawned = true;
                info!(
                    "{marker}: settled, spawning at {position:?} (low confidence: {})",
                    pending.low_confidence
                );
                commits.push((
                    marker,
                    Commit::Spawn {
                        position,
                        rotation: facing_rotation(camera_position, position),
                    },
                ));
            }
        }

        commits
    }

    /// Records a gesture-committed scale so later repositions preserve it.
    pub fn note_scale(&mut self, marker: MarkerId, scale: Vector3<f32>) {
        if let Some(record) = self.markers.get_mut(&marker) {
            record.last_committed_scale = scale;
        }
    }

    /// Whether a model has been spawned for this marker.
    pub fn is_spawned(&self, marker: MarkerId) -> bool {
        self.markers.get(&marker).is_some_and(|r| r.spawned)
    }

    /// Current gate state for a marker; `Armed` for unseen markers.
    pub fn gate(&self, marker: MarkerId) -> SpawnGate {
        self.markers
            .get(&marker)
            .map_or(SpawnGate::Armed, |r| r.gate)
    }

    /// Drops all per-marker state.
    pub fn reset(&mut self) {
        self.markers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAMERA: Vector3<f32> = Vector3::new(0.0, 1.5, 0.0);
    const DELAY: Duration = Duration::from_secs(1);

    fn machine() -> SettleMachine {
        SettleMachine::new(DELAY, false)
    }

    fn tracking_event(marker: u32, state: TrackingState, x: f32) -> ImageEvent {
        ImageEvent {
            marker: MarkerId(marker),
            tracking: state,
            pose: Pose::at(Vector3::new(x, 0.0, 1.0)),
        }
    }

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn no_commit_before_settle_delay() {
        let mut machine = machine();
        machine.on_image_event(&tracking_event(1, TrackingState::Tracking, 0.0), secs(0));

        assert!(machine.poll(secs(0), CAMERA).is_empty());
        assert!(machine
            .poll(Duration::from_millis(999), CAMERA)
            .is_empty());

        let commits = machine.poll(secs(1), CAMERA);
        assert_eq!(commits.len(), 1);
        assert!(matches!(commits[0].1, Commit::Spawn { .. }));

        // The deadline fired once; nothing further is pending.
        assert!(machine.poll(secs(2), CAMERA).is_empty());
    }

    #[test]
    fn cooling_gate_ignores_repeat_tracking_reports() {
        let mut machine = machine();
        machine.on_image_event(&tracking_event(1, TrackingState::Tracking, 0.0), secs(0));

        // Re-report at a different pose while cooling: must not re-arm or
        // move the pending deadline.
        machine.on_image_event(&tracking_event(1, TrackingState::Tracking, 5.0), secs(0));

        let commits = machine.poll(secs(1), CAMERA);
        match commits[0].1 {
            Commit::Spawn { position, .. } => assert_eq!(position.x, 0.0),
            _ => panic!("expected Spawn"),
        }
    }

    #[test]
    fn loss_rearms_the_gate() {
        let mut machine = machine();
        machine.on_image_event(&tracking_event(1, TrackingState::Tracking, 0.0), secs(0));
        machine.poll(secs(1), CAMERA);
        assert_eq!(machine.gate(MarkerId(1)), SpawnGate::Cooling);

        machine.on_image_event(&tracking_event(1, TrackingState::None, 0.0), secs(2));
        assert_eq!(machine.gate(MarkerId(1)), SpawnGate::Armed);

        // Fresh detection after loss starts a fresh settle cycle.
        machine.on_image_event(&tracking_event(1, TrackingState::Tracking, 2.0), secs(3));
        assert!(machine.poll(secs(3), CAMERA).is_empty());

        let commits = machine.poll(secs(4), CAMERA);
        assert_eq!(commits.len(), 1);
        assert!(matches!(commits[0].1, Commit::Reposition { .. }));
    }

    #[test]
    fn stale_deadline_fires_into_noop_after_loss() {
        let mut machine = machine();
        machine.on_image_event(&tracking_event(1, TrackingState::Tracking, 0.0), secs(0));
        machine.on_image_event(&tracking_event(1, TrackingState::None, 0.0), secs(0));

        assert!(machine.poll(secs(2), CAMERA).is_empty());
        assert!(!machine.is_spawned(MarkerId(1)));
    }

    #[test]
    fn reposition_preserves_noted_scale() {
        let mut machine = machine();
        machine.on_image_event(&tracking_event(1, TrackingState::Tracking, 0.0), secs(0));
        machine.poll(secs(1), CAMERA);

        // User pinch-scaled the spawned model.
        machine.note_scale(MarkerId(1), Vector3::new(2.5, 2.5, 2.5));

        // Limited tracking keeps updating position with reduced confidence.
        machine.on_image_event(&tracking_event(1, TrackingState::Limited, 3.0), secs(5));
        let commits = machine.poll(secs(6), CAMERA);

        match commits[0].1 {
            Commit::Reposition { position, scale } => {
                assert_eq!(position.x, 3.0);
                assert_eq!(scale, Vector3::new(2.5, 2.5, 2.5));
            }
            _ => panic!("expected Reposition"),
        }
    }

    #[test]
    fn markers_settle_independently() {
        let mut machine = machine();
        machine.on_image_event(&tracking_event(1, TrackingState::Tracking, 1.0), secs(0));
        machine.on_image_event(&tracking_event(2, TrackingState::Tracking, 2.0), secs(0));

        // Marker 2 loses tracking before its deadline; marker 1 does not.
        machine.on_image_event(&tracking_event(2, TrackingState::None, 2.0), secs(0));

        let commits = machine.poll(secs(1), CAMERA);
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].0, MarkerId(1));
        assert!(machine.is_spawned(MarkerId(1)));
        assert!(!machine.is_spawned(MarkerId(2)));
        assert_eq!(machine.gate(MarkerId(2)), SpawnGate::Armed);
    }

    #[test]
    fn destroy_on_loss_emits_despawn_and_allows_respawn() {
        let mut machine = SettleMachine::new(DELAY, true);
        machine.on_image_event(&tracking_event(1, TrackingState::Tracking, 0.0), secs(0));
        machine.poll(secs(1), CAMERA);
        assert!(machine.is_spawned(MarkerId(1)));

        machine.on_image_event(&tracking_event(1, TrackingState::None, 0.0), secs(2));
        let commits = machine.poll(secs(2), CAMERA);
        assert_eq!(commits, vec![(MarkerId(1), Commit::Despawn)]);

        // Marker found again: a full spawn cycle runs anew.
        machine.on_image_event(&tracking_event(1, TrackingState::Tracking, 1.0), secs(3));
        let commits = machine.poll(secs(4), CAMERA);
        assert!(matches!(commits[0].1, Commit::Spawn { .. }));
    }

    #[test]
    fn spawn_rotation_faces_the_camera() {
        let mut machine = machine();
        machine.on_image_event(&tracking_event(1, TrackingState::Tracking, 0.0), secs(0));

        let commits = machine.poll(secs(1), CAMERA);
        match commits[0].1 {
            Commit::Spawn { position, rotation } => {
                assert_eq!(rotation, facing_rotation(CAMERA, position));
            }
            _ => panic!("expected Spawn"),
        }
    }
}
