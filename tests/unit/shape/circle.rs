use super::*;
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

fn collect(center: Vec3, radius: f64, smoothness: f32) -> Vec<(Cell, f32)> {
    let mut out = Vec::new();
    rasterize(&grid(), center, radius, smoothness, &mut |c, k| out.push((c, k)));
    out
}

#[test]
fn sharp_disc_covers_cells_inside_radius() {
    let cells = collect(Vec3::xz(0.0, 0.0), 10.0, 0.0);
    for &(cell, keep) in &cells {
        let dx = i64::from(cell.x) - 32;
        let dy = i64::from(cell.y) - 32;
        let d_sq = dx * dx + dy * dy;
        assert!(d_sq <= 100);
        if d_sq < 100 {
            assert_eq!(keep, 0.0, "cell {cell:?} should be fully painted");
        } else {
            assert_eq!(keep, 1.0, "rim cell {cell:?} keeps its alpha");
        }
    }
    assert!(cells.iter().any(|(c, _)| *c == Cell::new(32, 32)));
    assert!(cells.iter().any(|(c, _)| *c == Cell::new(42, 32)));
    assert!(!cells.iter().any(|(c, _)| *c == Cell::new(43, 32)));
}

#[test]
fn smooth_disc_fades_toward_the_rim() {
    let cells = collect(Vec3::xz(0.0, 0.0), 10.0, 1.0);
    let keep_at = |x: u32| {
        cells
            .iter()
            .find(|(c, _)| *c == Cell::new(x, 32))
            .map(|(_, k)| *k)
            .unwrap()
    };
    assert!(keep_at(32) < 0.01);
    assert!(keep_at(37) > keep_at(32));
    assert!(keep_at(41) > keep_at(37));
}

#[test]
fn zero_radius_paints_only_the_anchor() {
    let cells = collect(Vec3::xz(0.0, 0.0), 0.0, 1.0);
    assert_eq!(cells, vec![(Cell::new(32, 32), 0.0)]);
}

#[test]
fn disc_is_clipped_at_raster_edges() {
    let cells = collect(Vec3::xz(-32.0, -32.0), 4.0, 0.0);
    assert!(!cells.is_empty());
    assert!(cells.iter().all(|(c, _)| c.x <= 4 && c.y <= 4));
}

#[test]
fn radius_uses_the_z_axis_scale() {
    let g = RasterGrid {
        width: 64,
        height: 64,
        placement: Placement {
            size: Vec3::new(128.0, 0.0, 64.0),
            ..Default::default()
        },
    };
    let mut xs = Vec::new();
    rasterize(&g, Vec3::xz(0.0, 0.0), 8.0, 0.0, &mut |c, _| {
        if c.y == 32 {
            xs.push(c.x)
        }
    });
    // 8 world units are 8 cells along Z and, by the shared scale, along X too.
    assert_eq!(xs.first().copied(), Some(24));
    assert_eq!(xs.last().copied(), Some(40));
}

#[test]
fn huge_radius_covers_the_grid_without_overflow() {
    let cells = collect(Vec3::xz(0.0, 0.0), 1e15, 1.0);
    assert_eq!(cells.len(), 64 * 64);
}
