use super::*;

fn req(x: u32, y: u32, target: u8) -> TransitionRequest {
    TransitionRequest {
        cell: Cell::new(x, y),
        initial_alpha: 255,
        target_alpha: target,
        start_delay: 0.0,
        duration: 1.0,
        restore_to_alpha: 255,
        restore_delay: 0.0,
        restore_duration: 0.0,
    }
}

#[test]
fn new_pool_is_empty() {
    let pool = TransitionPool::new(8);
    assert_eq!(pool.capacity(), 8);
    assert_eq!(pool.live(), 0);
    assert_eq!(pool.scan_range(), 0..0);
    assert_eq!(pool.iter_live().count(), 0);
}

#[test]
fn free_list_hands_out_lowest_index_first() {
    let mut pool = TransitionPool::new(4);
    assert_eq!(pool.schedule(req(0, 0, 0), 0.0), ScheduleOutcome::Started);
    assert_eq!(pool.stats().high_water, Some(0));
    assert_eq!(pool.schedule(req(1, 0, 0), 0.0), ScheduleOutcome::Started);
    assert_eq!(pool.stats().high_water, Some(1));
    assert_eq!(pool.scan_range(), 0..2);
}

#[test]
fn same_cell_with_equal_or_lower_target_coalesces() {
    let mut pool = TransitionPool::new(4);
    pool.schedule(req(2, 3, 10), 0.0);
    assert_eq!(pool.schedule(req(2, 3, 10), 0.5), ScheduleOutcome::Coalesced);
    assert_eq!(pool.schedule(req(2, 3, 50), 0.5), ScheduleOutcome::Coalesced);
    assert_eq!(pool.live(), 1);
    assert_eq!(pool.stats().coalesced, 2);
    // Start time is untouched by coalescing.
    assert_eq!(pool.get(Cell::new(2, 3)).unwrap().start_time, 0.0);
}

#[test]
fn lower_target_replaces_in_place() {
    let mut pool = TransitionPool::new(4);
    pool.schedule(req(2, 3, 100), 0.0);
    assert_eq!(pool.schedule(req(2, 3, 20), 0.5), ScheduleOutcome::Replaced);
    assert_eq!(pool.live(), 1);
    let t = pool.get(Cell::new(2, 3)).unwrap();
    assert_eq!(t.target_alpha, 20);
    assert_eq!(t.start_time, 0.5);
    assert_eq!(pool.stats().high_water, Some(0));
}

#[test]
fn different_restore_parameters_replace() {
    let mut pool = TransitionPool::new(4);
    pool.schedule(req(0, 0, 0), 0.0);
    let mut r = req(0, 0, 0);
    r.restore_delay = 3.0;
    assert_eq!(pool.schedule(r, 0.0), ScheduleOutcome::Replaced);
    assert_eq!(pool.get(Cell::new(0, 0)).unwrap().restore_delay, 3.0);
}

#[test]
fn exhaustion_drops_new_cells_silently() {
    let mut pool = TransitionPool::new(2);
    assert_eq!(pool.schedule(req(0, 0, 0), 0.0), ScheduleOutcome::Started);
    assert_eq!(pool.schedule(req(1, 0, 0), 0.0), ScheduleOutcome::Started);
    assert_eq!(pool.schedule(req(2, 0, 0), 0.0), ScheduleOutcome::Dropped);
    assert_eq!(pool.live(), 2);
    assert_eq!(pool.stats().dropped, 1);
    assert!(pool.get(Cell::new(2, 0)).is_none());
    // Cells that already own a slot can still be redirected.
    assert_eq!(pool.schedule(req(0, 0, 0), 0.0), ScheduleOutcome::Coalesced);
}

#[test]
fn release_returns_slot_to_free_list() {
    let mut pool = TransitionPool::new(1);
    pool.schedule(req(0, 0, 0), 0.0);
    pool.release(0);
    assert_eq!(pool.live(), 0);
    assert!(pool.get(Cell::new(0, 0)).is_none());
    assert_eq!(pool.schedule(req(5, 5, 0), 0.0), ScheduleOutcome::Started);
    // Releasing twice must not duplicate the free entry.
    pool.release(0);
    pool.release(0);
    assert_eq!(pool.schedule(req(1, 1, 0), 0.0), ScheduleOutcome::Started);
    assert_eq!(pool.schedule(req(2, 2, 0), 0.0), ScheduleOutcome::Dropped);
}

#[test]
fn reset_disables_everything() {
    let mut pool = TransitionPool::new(3);
    for x in 0..3 {
        pool.schedule(req(x, 0, 0), 0.0);
    }
    pool.reset();
    assert_eq!(pool.live(), 0);
    assert_eq!(pool.iter_live().count(), 0);
    assert_eq!(pool.stats().high_water, None);
    for x in 0..3 {
        assert_eq!(pool.schedule(req(x, 1, 0), 0.0), ScheduleOutcome::Started);
    }
}

#[test]
fn default_slot_is_disabled_at_the_origin_cell() {
    let t = Transition::default();
    assert!(!t.enabled);
    assert_eq!(t.cell, Cell::default());
    assert_eq!(Cell::default(), Cell::new(0, 0));
}
