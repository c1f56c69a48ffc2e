use super::*;
use crate::foundation::core::{Cell, Vec3};
use crate::upload::sink::InMemoryMaskSink;

fn raster(w: u32, h: u32) -> MaskRaster {
    MaskRaster::new(w, h, Placement::default()).unwrap()
}

fn sync_with(sink: &InMemoryMaskSink) -> UploadSync {
    UploadSync::new(Box::new(sink.clone()))
}

#[test]
fn clean_mask_is_not_uploaded_unless_forced() {
    let sink = InMemoryMaskSink::new();
    let mut sync = sync_with(&sink);
    let r = raster(8, 8);
    assert!(!sync.flush(&r, false, false));
    assert!(sync.flush(&r, false, true));
    assert_eq!(sink.upload_count(), 1);
    assert_eq!(sink.resizes(), vec![(8, 8)]);
}

#[test]
fn busy_defers_and_keeps_dirty() {
    let sink = InMemoryMaskSink::new();
    let mut sync = sync_with(&sink);
    let r = raster(8, 8);
    sync.mark_dirty();
    assert!(!sync.flush(&r, true, false));
    assert!(sync.is_dirty());
    assert_eq!(sync.stats().deferred, 1);
    assert!(sync.flush(&r, false, false));
    assert!(!sync.is_dirty());
}

#[test]
fn targets_are_reallocated_only_on_dimension_change() {
    let sink = InMemoryMaskSink::new();
    let mut sync = sync_with(&sink);
    let mut r = raster(8, 8);
    sync.flush(&r, false, true);
    sync.flush(&r, false, true);
    r.resize(16, 8).unwrap();
    sync.flush(&r, false, true);
    assert_eq!(sink.resizes(), vec![(8, 8), (16, 8)]);
    assert_eq!(sync.stats().allocations, 2);
    assert_eq!(sink.upload_count(), 3);
}

#[test]
fn sink_failure_keeps_mask_dirty_until_retry_succeeds() {
    let sink = InMemoryMaskSink::new();
    let mut sync = sync_with(&sink);
    let r = raster(8, 8);
    sink.set_failing(true);
    sync.mark_dirty();
    assert!(!sync.flush(&r, false, false));
    assert!(sync.is_dirty());
    assert_eq!(sync.stats().failures, 1);
    sink.set_failing(false);
    assert!(sync.flush(&r, false, false));
    assert_eq!(sink.upload_count(), 1);
}

#[test]
fn blur_uploads_both_buffers_and_leaves_cpu_mask_alone() {
    let sink = InMemoryMaskSink::new();
    let mut sync = sync_with(&sink);
    sync.set_blur(Some((2, 1.5))).unwrap();
    assert!(sync.blur_enabled());
    let mut r = raster(8, 8);
    r.set(Cell::new(4, 4), 0);
    let before = r.cells().to_vec();
    assert!(sync.flush(&r, false, false));
    assert_eq!(r.cells(), before.as_slice());

    let up = sink.last_upload().unwrap();
    assert_eq!(up.opacity, before);
    let blurred = up.blurred.unwrap();
    assert_eq!(blurred.len(), 64);
    assert!(blurred[4 * 8 + 4] > 0);
    assert!(blurred[4 * 8 + 3] < 255);
}

#[test]
fn shader_params_describe_the_lower_corner() {
    let placement = Placement {
        center: Vec3::xz(10.0, 20.0),
        size: Vec3::new(100.0, 0.0, 50.0),
        ..Default::default()
    };
    let p = shader_params(&placement, true, false);
    assert_eq!(p.source, MaskSource::Raw);
    assert!((p.center_adjusted[0] - (-40.0 / 100.0)).abs() < 1e-12);
    assert_eq!(p.center_adjusted[1], 1.0);
    assert!((p.center_adjusted[2] - (-5.0 / 50.0001)).abs() < 1e-12);
    assert_eq!(p.center_adjusted[3], 0.0);
}
