//! Scripted walkthrough of both placement modes against the in-memory scene
//! host. No AR hardware involved: touches and tracker reports are fed from
//! code, with a little random jitter standing in for real image-tracking
//! noise. Run with `RUST_LOG=debug` to watch the session work.

use std::time::Duration;

use anyhow::Result;
use cgmath::{Vector2, Vector3};
use placard::prelude::*;
use rand::Rng;

const CAMERA: Vector3<f32> = Vector3::new(0.0, 1.6, 0.0);
const BUST: ModelKey = ModelKey(0);

fn main() -> Result<()> {
    env_logger::init();

    plane_walkthrough()?;
    marker_walkthrough()?;

    Ok(())
}

/// Tap to place, drag to move, release to lock.
fn plane_walkthrough() -> Result<()> {
    println!("--- plane mode ---");

    // Session settings the way an embedder would ship them.
    let config: SessionConfig = serde_json::from_str(
        r#"{
            "mode": "Plane",
            "model": 0,
            "rotate_sensitivity": 0.25,
            "min_finger_distance": 0.1,
            "min_scale": null,
            "settle_delay": { "secs": 1, "nanos": 0 },
            "destroy_on_loss": false
        }"#,
    )?;

    let mut scene = MemoryScene::new();
    scene.register_model(BUST);
    let mut session = Session::new(config, scene)?;

    // Tap on a detected plane point.
    let hit = PlacementHit::new(Vector3::new(0.4, 0.0, 1.2));
    session.frame(
        &[TouchSample::new(0, Vector2::new(540.0, 960.0), TouchPhase::Began)],
        Some(hit),
        CAMERA,
        Duration::ZERO,
    );
    report("placed", &session);

    // Drag the model across the surface, then lift the finger.
    let drag_hit = PlacementHit::new(Vector3::new(0.8, 0.0, 1.5));
    session.frame(
        &[TouchSample::new(0, Vector2::new(600.0, 940.0), TouchPhase::Moved)],
        Some(drag_hit),
        CAMERA,
        Duration::from_millis(300),
    );
    session.frame(
        &[TouchSample::new(0, Vector2::new(600.0, 940.0), TouchPhase::Ended)],
        Some(drag_hit),
        CAMERA,
        Duration::from_millis(400),
    );
    report("dragged and locked", &session);

    // Pinch out to 1.5x.
    session.frame(
        &[
            TouchSample::new(0, Vector2::new(400.0, 900.0), TouchPhase::Began),
            TouchSample::new(1, Vector2::new(600.0, 900.0), TouchPhase::Began),
        ],
        None,
        CAMERA,
        Duration::from_millis(800),
    );
    session.frame(
        &[
            TouchSample::new(0, Vector2::new(350.0, 900.0), TouchPhase::Moved),
            TouchSample::new(1, Vector2::new(650.0, 900.0), TouchPhase::Moved),
        ],
        None,
        CAMERA,
        Duration::from_millis(900),
    );
    report("pinched", &session);

    Ok(())
}

/// Marker detection with pose jitter: the settle delay soaks up the noise
/// before the spawn commits.
fn marker_walkthrough() -> Result<()> {
    println!("--- marker mode ---");

    let mut scene = MemoryScene::new();
    scene.register_model(BUST);
    let mut session = placard::marker_session(BUST, scene)?;

    let marker = MarkerId(1);
    let mut rng = rand::rng();
    let marker_center = Vector3::new(0.0, 0.0, 0.8);

    // The tracker reports a noisy pose every 100ms for the first half second.
    for i in 0..5 {
        let jitter = Vector3::new(
            rng.random_range(-0.05..0.05),
            0.0,
            rng.random_range(-0.05..0.05),
        );
        session.on_images_changed(
            &[ImageEvent {
                marker,
                tracking: TrackingState::Tracking,
                pose: Pose::at(marker_center + jitter),
            }],
            Duration::from_millis(i * 100),
        );
        session.frame(&[], None, CAMERA, Duration::from_millis(i * 100));
        assert!(!session.is_placed(), "must not spawn before the settle delay");
    }

    // One second after the first report the spawn commits.
    session.frame(&[], None, CAMERA, Duration::from_secs(1));
    report("settled and spawned", &session);

    // Spin the model with a one-finger drag.
    session.frame(
        &[TouchSample::new(0, Vector2::new(500.0, 900.0), TouchPhase::Began)],
        None,
        CAMERA,
        Duration::from_millis(1500),
    );
    session.frame(
        &[TouchSample::new(0, Vector2::new(620.0, 900.0), TouchPhase::Moved)],
        None,
        CAMERA,
        Duration::from_millis(1600),
    );
    report("rotated", &session);

    // Marker drops to limited tracking at a drifted pose; the next settle
    // repositions the model without touching its scale or yaw.
    session.on_images_changed(
        &[ImageEvent {
            marker,
            tracking: TrackingState::Limited,
            pose: Pose::at(Vector3::new(0.3, 0.0, 0.9)),
        }],
        Duration::from_secs(2),
    );
    session.frame(&[], None, CAMERA, Duration::from_secs(3));
    report("repositioned", &session);

    Ok(())
}

fn report<H: SceneHost>(stage: &str, session: &Session<H>) {
    match session.placed_transform() {
        Some(transform) => println!(
            "{stage}: position {:?}, scale {:?}",
            transform.position, transform.scale
        ),
        None => println!("{stage}: nothing placed"),
    }
}
