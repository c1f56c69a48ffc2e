use super::*;
use crate::raster::mask::Placement;
use crate::upload::sink::{InMemoryMaskSink, MaskSource};

fn opts() -> FogOfWarOpts {
    FogOfWarOpts {
        texture_width: 32,
        placement: Placement {
            size: Vec3::new(32.0, 0.0, 32.0),
            ..Default::default()
        },
        max_transitions: 256,
        ..Default::default()
    }
}

fn immediate() -> PaintOpts {
    PaintOpts {
        smoothness: 0.0,
        ..PaintOpts::immediate()
    }
}

#[test]
fn construction_uploads_an_opaque_mask_once() {
    let sink = InMemoryMaskSink::new();
    let fog = FogOfWar::new(opts(), sink.clone()).unwrap();
    assert_eq!(fog.dimensions(), Some((32, 32)));
    assert_eq!(sink.resizes(), vec![(32, 32)]);
    let up = sink.last_upload().unwrap();
    assert!(up.opacity.iter().all(|&v| v == 255));
    assert!(!fog.is_dirty());
    assert!(!fog.tick(0.1));
    assert_eq!(sink.upload_count(), 1);
    assert_eq!(sink.apply_count(), 1);
}

#[test]
fn disabled_engine_reads_opaque_and_ignores_writes() {
    let sink = InMemoryMaskSink::new();
    let fog = FogOfWar::new(
        FogOfWarOpts {
            enabled: false,
            ..opts()
        },
        sink.clone(),
    )
    .unwrap();
    fog.set_alpha(Footprint::circle(Vec3::default(), 4.0), 0.0, immediate())
        .unwrap();
    fog.set_alpha(Footprint::circle(Vec3::default(), 4.0), 0.0, PaintOpts::default())
        .unwrap();
    assert_eq!(fog.alpha_at(Vec3::default()), 1.0);
    assert!(fog.opacity_bytes().is_none());
    assert!(fog.snapshot().is_none());
    assert!(!fog.is_busy());
    assert_eq!(sink.upload_count(), 0);
    fog.tick(1.0);
    assert!(!sink.last_params().unwrap().enabled);
}

#[test]
fn busy_worker_defers_the_upload() {
    let sink = InMemoryMaskSink::new();
    let fog = FogOfWar::new(opts(), sink.clone()).unwrap();
    fog.set_alpha(Footprint::circle(Vec3::default(), 4.0), 0.0, immediate())
        .unwrap();
    assert!(fog.is_dirty());

    fog.shared.running.store(true, Ordering::Release);
    assert!(!fog.tick(0.1));
    assert!(fog.is_dirty());
    assert_eq!(sink.upload_count(), 1);

    fog.shared.running.store(false, Ordering::Release);
    assert!(fog.tick(0.2));
    assert!(!fog.is_dirty());
    assert_eq!(sink.last_upload().unwrap().opacity[16 * 32 + 16], 0);
}

#[test]
fn queued_jobs_do_not_hold_back_the_upload() {
    let sink = InMemoryMaskSink::new();
    let fog = FogOfWar::new(opts(), sink.clone()).unwrap();
    fog.set_alpha(Footprint::circle(Vec3::default(), 4.0), 0.0, immediate())
        .unwrap();

    fog.shared.pending.fetch_add(1, Ordering::AcqRel);
    assert!(fog.is_busy());
    assert!(fog.tick(0.1));
    assert!(!fog.is_dirty());
    fog.shared.pending.fetch_sub(1, Ordering::AcqRel);
}

#[test]
fn deferred_paints_reach_the_sink_while_ticking_every_frame() {
    let sink = InMemoryMaskSink::new();
    let fog = FogOfWar::new(opts(), sink.clone()).unwrap();
    let deferred = PaintOpts {
        smoothness: 0.0,
        ..PaintOpts::default()
    };
    let mut uploaded = false;
    for frame in 0..20 {
        fog.set_alpha(Footprint::circle(Vec3::default(), 4.0), 0.0, deferred)
            .unwrap();
        uploaded |= fog.tick(f64::from(frame) / 60.0);
        std::thread::sleep(std::time::Duration::from_millis(2));
    }
    fog.wait_idle();
    uploaded |= fog.tick(1.0);
    assert!(uploaded);
    assert_eq!(sink.last_upload().unwrap().opacity[16 * 32 + 16], 0);
    assert!(!fog.is_dirty());
}

#[test]
fn caller_time_anchors_fades_issued_before_the_first_tick() {
    let fog = FogOfWar::new(opts(), InMemoryMaskSink::new()).unwrap();
    let fade = PaintOpts {
        duration: 2.0,
        smoothness: 0.0,
        mode: UpdateMode::Immediate,
        ..PaintOpts::default()
    };
    fog.set_alpha_at(Footprint::circle(Vec3::default(), 0.0), 0.0, fade, 1000.0)
        .unwrap();
    fog.tick(1000.0);
    assert_eq!(fog.alpha_at(Vec3::default()), 1.0);
    fog.tick(1001.0);
    let mid = fog.alpha_at(Vec3::default());
    assert!(mid > 0.45 && mid < 0.55, "{mid}");
    fog.tick(1002.0);
    assert_eq!(fog.alpha_at(Vec3::default()), 0.0);
}

#[test]
fn deferred_paints_keep_their_issue_time() {
    let fog = FogOfWar::new(opts(), InMemoryMaskSink::new()).unwrap();
    fog.tick(500.0);
    let fade = PaintOpts {
        duration: 4.0,
        smoothness: 0.0,
        ..PaintOpts::default()
    };
    fog.set_alpha_at(Footprint::circle(Vec3::default(), 0.0), 0.0, fade, 510.0)
        .unwrap();
    fog.wait_idle();
    fog.tick(512.0);
    let mid = fog.alpha_at(Vec3::default());
    assert!(mid > 0.45 && mid < 0.55, "{mid}");
    assert!(
        fog.set_alpha_at(Footprint::circle(Vec3::default(), 0.0), 0.0, fade, f64::NAN)
            .is_err()
    );
}

#[test]
fn toggling_enabled_allocates_and_releases_the_raster() {
    let sink = InMemoryMaskSink::new();
    let fog = FogOfWar::new(opts(), sink.clone()).unwrap();
    let v0 = fog.settings_version();
    fog.set_enabled(false).unwrap();
    assert!(!fog.is_enabled());
    assert_eq!(fog.alpha_at(Vec3::default()), 1.0);
    fog.set_enabled(true).unwrap();
    assert_eq!(fog.dimensions(), Some((32, 32)));
    assert_eq!(fog.settings_version(), v0 + 2);
    // Re-enabling reallocates the texture.
    assert_eq!(sink.resizes(), vec![(32, 32), (32, 32)]);
}

#[test]
fn apply_opts_rebuilds_on_resize_and_keeps_contents_otherwise() {
    let sink = InMemoryMaskSink::new();
    let fog = FogOfWar::new(opts(), sink.clone()).unwrap();
    fog.set_alpha(Footprint::circle(Vec3::default(), 4.0), 0.0, immediate())
        .unwrap();

    let same_size = FogOfWarOpts {
        blur: true,
        ..opts()
    };
    fog.apply_opts(same_size).unwrap();
    assert_eq!(fog.alpha_at(Vec3::default()), 0.0);
    assert_eq!(fog.shader_params().source, MaskSource::Blurred);

    let bigger = FogOfWarOpts {
        texture_width: 64,
        ..opts()
    };
    fog.apply_opts(bigger).unwrap();
    assert_eq!(fog.dimensions(), Some((64, 64)));
    assert_eq!(fog.alpha_at(Vec3::default()), 1.0);
    assert_eq!(fog.settings_version(), 2);
    assert_eq!(sink.resizes().last(), Some(&(64, 64)));
}

#[test]
fn local_placement_follows_the_anchor() {
    let fog = FogOfWar::new(
        FogOfWarOpts {
            placement: Placement {
                size: Vec3::new(32.0, 0.0, 32.0),
                is_local: true,
                ..Default::default()
            },
            ..opts()
        },
        InMemoryMaskSink::new(),
    )
    .unwrap();
    fog.set_anchor(Vec3::xz(100.0, 0.0));
    fog.set_alpha(Footprint::circle(Vec3::xz(100.0, 0.0), 3.0), 0.0, immediate())
        .unwrap();
    assert_eq!(fog.alpha_at(Vec3::xz(100.0, 0.0)), 0.0);
    assert_eq!(fog.alpha_at(Vec3::default()), 1.0);
    assert_eq!(fog.shader_params().center.x, 100.0);
}

#[test]
fn invalid_paint_options_are_rejected() {
    let fog = FogOfWar::new(opts(), InMemoryMaskSink::new()).unwrap();
    let bad = PaintOpts {
        duration: f64::NAN,
        ..immediate()
    };
    assert!(matches!(
        fog.set_alpha(Footprint::circle(Vec3::default(), 1.0), 0.0, bad),
        Err(FogError::Validation(_))
    ));
    assert!(
        fog.set_alpha(Footprint::circle(Vec3::default(), 1.0), f32::NAN, immediate())
            .is_err()
    );
}
