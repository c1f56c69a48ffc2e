use super::*;
use crate::foundation::core::Vec3;
use crate::raster::mask::Placement;

fn grid() -> RasterGrid {
    RasterGrid {
        width: 64,
        height: 64,
        placement: Placement {
            size: Vec3::new(64.0, 0.0, 64.0),
            ..Default::default()
        },
    }
}

fn collect(bounds: Bounds, smoothness: f32) -> Vec<(Cell, f32)> {
    let mut out = Vec::new();
    rasterize(&grid(), bounds, smoothness, None, &mut |c, k| out.push((c, k)));
    out
}

#[test]
fn window_spans_both_half_extents() {
    let b = Bounds::new(Vec3::xz(0.0, 0.0), Vec3::new(8.0, 0.0, 4.0)).unwrap();
    let cells = collect(b, 0.0);
    assert_eq!(cells.len(), 17 * 9);
    let min_x = cells.iter().map(|(c, _)| c.x).min().unwrap();
    let max_y = cells.iter().map(|(c, _)| c.y).max().unwrap();
    assert_eq!(min_x, 24);
    assert_eq!(max_y, 36);
}

#[test]
fn interior_is_fully_painted_when_sharp() {
    let b = Bounds::new(Vec3::xz(0.0, 0.0), Vec3::new(8.0, 0.0, 8.0)).unwrap();
    let cells = collect(b, 0.0);
    let center = cells.iter().find(|(c, _)| *c == Cell::new(32, 32)).unwrap();
    assert_eq!(center.1, 0.0);
    // The outermost ring sits exactly on the edge and keeps its alpha.
    let edge = cells.iter().find(|(c, _)| *c == Cell::new(40, 32)).unwrap();
    assert_eq!(edge.1, 1.0);
}

#[test]
fn stricter_axis_wins() {
    let b = Bounds::new(Vec3::xz(0.0, 0.0), Vec3::new(8.0, 0.0, 8.0)).unwrap();
    let cells = collect(b, 1.0);
    let keep = |x: u32, y: u32| {
        cells
            .iter()
            .find(|(c, _)| *c == Cell::new(x, y))
            .map(|(_, k)| *k)
            .unwrap()
    };
    // Near the X edge the X falloff dominates even on the centre row.
    assert!(keep(39, 32) > keep(34, 32));
    assert!((keep(39, 32) - keep(32, 39)).abs() < 1e-6);
    assert!(keep(39, 39) >= keep(39, 32));
}

#[test]
fn collapsed_axis_imposes_no_constraint() {
    let b = Bounds::new(Vec3::xz(0.0, 0.0), Vec3::new(4.0, 0.0, 0.0)).unwrap();
    let cells = collect(b, 0.0);
    assert_eq!(cells.len(), 9);
    assert!(cells.iter().all(|(c, _)| c.y == 32));
    let center = cells.iter().find(|(c, _)| c.x == 32).unwrap();
    assert_eq!(center.1, 0.0);
}

#[test]
fn outside_center_is_ignored() {
    let b = Bounds::new(Vec3::xz(40.0, 0.0), Vec3::new(20.0, 0.0, 20.0)).unwrap();
    let mut n = 0;
    assert!(!rasterize(&grid(), b, 0.0, None, &mut |_, _| n += 1));
    assert_eq!(n, 0);
}

#[test]
fn huge_extents_cover_the_grid_without_overflow() {
    let b = Bounds::new(Vec3::xz(0.0, 0.0), Vec3::new(1e15, 0.0, 1e18)).unwrap();
    assert_eq!(collect(b, 1.0).len(), 64 * 64);
}
