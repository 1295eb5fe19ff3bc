use crate::*;

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use proptest::prelude::*;

use crate::fenwick::Fenwick;

#[derive(Clone, Copy, Debug)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u64(&mut self) -> u64 {
        // Deterministic, dependency-free PRNG for tests.
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0
    }

    fn gen_range_u64(&mut self, start: u64, end_exclusive: u64) -> u64 {
        debug_assert!(start < end_exclusive);
        let span = end_exclusive - start;
        start + (self.next_u64() % span)
    }

    fn gen_range_usize(&mut self, start: usize, end_exclusive: usize) -> usize {
        self.gen_range_u64(start as u64, end_exclusive as u64) as usize
    }

    fn gen_range_u32(&mut self, start: u32, end_exclusive: u32) -> u32 {
        self.gen_range_u64(start as u64, end_exclusive as u64) as u32
    }
}

fn viewport(main: u32) -> Rect {
    Rect { main, cross: 300 }
}

fn fixed_items(n: u32, extent: u32) -> Vec<Item<u32>> {
    (0..n)
        .map(|k| Item::new(k, extent).with_template("row").with_navigable(true))
        .collect()
}

fn measured_items(n: u32, guess: u32) -> Vec<Item<u32>> {
    (0..n)
        .map(|k| {
            Item::new(k, guess)
                .with_measure_extent(true)
                .with_navigable(true)
        })
        .collect()
}

/// Paints, answers measurement requests and settles until the list is quiet.
fn run_until_idle<K: ListKey, D: PartialEq>(
    list: &mut VirtualList<K, D>,
    mut measure: impl FnMut(&K) -> u32,
) -> ListFrame<K> {
    let mut frame = list.take_frame();
    for _ in 0..256 {
        for cell in frame.cells.iter().filter(|c| c.needs_measure) {
            if let Some(key) = &cell.item_key {
                list.on_item_layout(cell.id, key, measure(key));
            }
        }
        if !list.settle() {
            return frame;
        }
        frame = list.take_frame();
    }
    panic!("list did not settle");
}

fn assert_invariants<K: ListKey, D: PartialEq>(list: &VirtualList<K, D>) {
    let block = list.render_block();
    assert_eq!(block.item_count(), list.len(), "region counts: {block:?}");

    let padding = list.options().padding_start as u64 + list.options().padding_end as u64;
    assert_eq!(
        block.total_extent() as i64 + list.pending_adjustment(),
        (list.content_extent() - padding) as i64,
        "region extents: {block:?}"
    );

    assert_eq!(list.pool_stats().active, block.items_in_block);
    for index in block.range() {
        let key = &list.items()[index].key;
        let cell = list.cell_for(key).expect("in-block item without a cell");
        assert_eq!(cell.item_index(), Some(index));
        assert_eq!(Some(cell.offset()), list.item_offset(index));
        assert_eq!(Some(cell.extent()), list.item_extent(index));
    }
}

fn idle_fixed_list(n: u32, main: u32) -> VirtualList<u32> {
    let mut list = VirtualList::with_items(ListOptions::default(), fixed_items(n, 50));
    list.on_layout(viewport(main));
    run_until_idle(&mut list, |_| 50);
    list
}

#[test]
fn fixed_list_renders_viewport_then_overdraw() {
    let mut list = VirtualList::with_items(ListOptions::default(), fixed_items(1000, 50));
    list.on_layout(viewport(500));

    // No overdraw before the initial fill completes.
    assert_eq!(list.render_block().items_in_block, 10);
    assert!(list.needs_paint());
    assert!(!list.is_initial_fill_complete());

    let frame = run_until_idle(&mut list, |_| 50);
    assert!(list.is_initial_fill_complete());
    assert_eq!(list.margins().render, 512);

    let block = list.render_block();
    assert_eq!(block.items_above, 0);
    assert_eq!(block.items_in_block, 21);
    assert_eq!(block.items_below, 979);
    assert_eq!(frame.cells.len(), 21);
    assert!(frame.cells.iter().all(|c| c.is_visible));
    assert_eq!(frame.content_extent, 50_000);
    assert_invariants(&list);
}

#[test]
fn scrolling_far_recycles_culled_cells() {
    let mut list = idle_fixed_list(1000, 500);

    list.on_scroll(5000);
    let block = list.render_block();
    assert_eq!(block.range(), 89..121);
    assert_eq!(
        list.pool_stats(),
        PoolStats {
            active: 32,
            recycled: 0,
            created: 32,
            reused: 21,
        }
    );
    assert_invariants(&list);

    let frame = list.take_frame();
    let ids: Vec<CellId> = frame.cells.iter().map(|c| c.id).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted, "frame cells are ordered by id");
}

#[test]
fn cull_margin_keeps_cells_for_small_scrolls() {
    let mut list = idle_fixed_list(1000, 500);

    list.on_scroll(300);
    assert_eq!(list.render_block().range(), 0..27);
    list.on_scroll(0);
    // Nothing crossed the cull line, so nothing was released.
    assert_eq!(list.render_block().range(), 0..27);
    assert_eq!(list.pool_stats().recycled, 0);
    assert_eq!(list.pool_stats().created, 27);
    assert_invariants(&list);
}

#[test]
fn replaced_item_reuses_cell_of_removed_item() {
    let mut list = VirtualList::with_items(
        ListOptions::default(),
        alloc::vec![Item::new(1u32, 50).with_template("row")],
    );
    list.on_layout(viewport(500));
    list.take_frame();
    let x = list.cell_for(&1).map(|c| c.id()).expect("cell for X");

    list.set_items(alloc::vec![Item::new(2u32, 50).with_template("row")]);
    let y = list.cell_for(&2).map(|c| c.id()).expect("cell for Y");

    assert_eq!(x, y);
    assert_eq!(list.pool_stats().created, 1);
    assert_eq!(list.pool_stats().reused, 1);
    let frame = list.take_frame();
    assert!(frame.cell(y).is_some_and(|c| c.should_update));
}

#[test]
fn same_scroll_offset_twice_is_a_no_op() {
    let notified = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&notified);
    let options = ListOptions::<u32>::default().with_on_change(Some(
        move |_: &VirtualList<u32>| {
            counter.fetch_add(1, Ordering::SeqCst);
        },
    ));
    let mut list = VirtualList::with_items(options, fixed_items(1000, 50));
    list.on_layout(viewport(500));
    run_until_idle(&mut list, |_| 50);

    list.on_scroll(300);
    assert!(list.needs_paint());
    list.take_frame();

    let before = list.snapshot();
    let stats = list.pool_stats();
    let calls = notified.load(Ordering::SeqCst);

    list.on_scroll(300);
    assert!(!list.needs_paint());
    assert_eq!(list.snapshot(), before);
    assert_eq!(list.pool_stats(), stats);
    assert_eq!(notified.load(Ordering::SeqCst), calls);
}

fn labelled_items(n: u32) -> Vec<Item<u32, String>> {
    (0..n)
        .map(|k| Item::with_data(k, 50, alloc::format!("row {k}")).with_template("row"))
        .collect()
}

#[test]
fn unchanged_items_skip_render_when_enabled() {
    let options = ListOptions::default().with_skip_render_if_item_unchanged(true);
    let mut items = labelled_items(20);
    let mut list = VirtualList::with_items(options, items.clone());
    list.on_layout(viewport(200));
    run_until_idle(&mut list, |_| 50);
    assert_eq!(list.render_block().items_in_block, 20);

    list.set_items(items.clone());
    assert!(!list.needs_paint());
    assert!(list.frame().cells.iter().all(|c| !c.should_update));

    items[3].data = String::from("changed");
    list.set_items(items);
    assert!(list.needs_paint());
    let frame = list.take_frame();
    for cell in &frame.cells {
        assert_eq!(cell.should_update, cell.item_key == Some(3), "{cell:?}");
    }
}

#[test]
fn retained_items_always_render_without_skipping() {
    let items = labelled_items(20);
    let mut list = VirtualList::with_items(ListOptions::default(), items.clone());
    list.on_layout(viewport(200));
    run_until_idle(&mut list, |_| 50);

    list.set_items(items);
    let frame = list.take_frame();
    assert!(!frame.cells.is_empty());
    assert!(frame.cells.iter().all(|c| c.should_update));
}

#[test]
fn skip_unchanged_widens_overdraw() {
    let standard = OverdrawPolicy::STANDARD.margins(500);
    assert_eq!(standard, Margins { render: 512, cull: 1024 });

    let skip = OverdrawPolicy::SKIP_UNCHANGED.margins(500);
    assert_eq!(skip, Margins { render: 2500, cull: 3072 });

    let large = OverdrawPolicy::STANDARD.margins(10_000);
    assert_eq!(large, Margins { render: 4096, cull: 10_000 });

    let options = ListOptions::<u32>::default().with_skip_render_if_item_unchanged(true);
    assert_eq!(options.overdraw_policy(), OverdrawPolicy::SKIP_UNCHANGED);
}

#[test]
fn measurement_replaces_guess_after_settle() {
    let mut list = VirtualList::with_items(ListOptions::default(), measured_items(3, 50));
    list.on_layout(viewport(500));
    assert_eq!(list.pending_measurements(), 3);

    let first = list.frame();
    assert!(first.cells.iter().all(|c| c.needs_measure && !c.is_visible));

    run_until_idle(&mut list, |&k| if k == 0 { 80 } else { 50 });

    assert_eq!(list.cached_extent(&0), Some(80));
    assert_eq!(list.render_block().extent_in_block, 180);
    assert_eq!(list.item_offset(1), Some(80));
    assert_eq!(list.pending_measurements(), 0);
    assert!(list.frame().cells.iter().all(|c| c.is_visible));
    assert_invariants(&list);
}

#[test]
fn measured_cells_stay_hidden_until_initial_fill_completes() {
    let mut list = VirtualList::with_items(ListOptions::default(), measured_items(3, 50));
    list.on_layout(viewport(500));
    let frame = list.take_frame();
    for cell in &frame.cells {
        let key = cell.item_key.expect("bound cell");
        list.on_item_layout(cell.id, &key, 50);
    }
    assert!(list.frame().cells.iter().all(|c| !c.is_visible));

    assert!(list.settle());
    assert!(list.is_initial_fill_complete());
    assert!(list.take_frame().cells.iter().all(|c| c.is_visible));
}

#[test]
fn growth_pauses_at_measurement_cap() {
    let mut list = VirtualList::with_items(ListOptions::default(), measured_items(100, 50));
    list.on_layout(viewport(2000));
    assert_eq!(list.render_block().items_in_block, 16);
    assert_eq!(list.pending_measurements(), 16);

    let frame = list.take_frame();
    for cell in &frame.cells {
        let key = cell.item_key.expect("bound cell");
        list.on_item_layout(cell.id, &key, 50);
    }
    assert_eq!(list.render_block().items_in_block, 32);
    assert_eq!(list.pending_measurements(), 16);
    assert_invariants(&list);
}

#[test]
fn stale_measurements_are_ignored() {
    let mut items = measured_items(3, 50);
    items.push(Item::new(3, 50));
    let mut list = VirtualList::with_items(ListOptions::default(), items);
    list.on_layout(viewport(500));
    let frame = list.take_frame();

    list.on_item_layout(CellId(999), &0, 80);
    list.on_item_layout(frame.cells[0].id, &42, 80);
    assert_eq!(list.cached_extent(&0), None);
    assert_eq!(list.pending_measurements(), 3);

    let constant = list.cell_for(&3).map(|c| c.id()).expect("cell");
    list.on_item_layout(constant, &3, 120);
    assert_eq!(list.item_extent(3), Some(50));
    assert!(!list.needs_paint());
}

fn scrolled_measured_list(options: ListOptions<u32>) -> VirtualList<u32> {
    let mut list = VirtualList::with_items(options, measured_items(100, 50));
    list.on_layout(viewport(500));
    run_until_idle(&mut list, |_| 50);
    assert_eq!(list.render_block().range(), 0..21);

    list.on_scroll(2000);
    run_until_idle(&mut list, |_| 50);
    assert_eq!(list.render_block().range(), 19..61);
    list
}

#[test]
fn correction_above_viewport_is_deferred_then_flushed_at_start() {
    let mut list = scrolled_measured_list(ListOptions::default().with_correction_tolerance(1000));

    let cell = list.cell_for(&19).map(|c| c.id()).expect("cell");
    list.on_item_layout(cell, &19, 80);

    // Visible content did not move.
    assert_eq!(list.pending_adjustment(), -30);
    assert_eq!(list.item_offset(40), Some(2000));
    assert_invariants(&list);

    list.take_frame();
    list.settle();
    assert_eq!(list.pending_adjustment(), -30);

    list.on_scroll(0);
    assert_eq!(list.pending_adjustment(), 0);
    assert_eq!(list.scroll_offset(), 0);
    assert_eq!(list.item_offset(0), Some(0));
    assert_eq!(list.item_offset(20), Some(1030));
    assert_eq!(list.take_scroll_request(), None);
    assert_invariants(&list);
}

#[test]
fn correction_flush_moves_scroll_with_content() {
    let mut list = scrolled_measured_list(ListOptions::default());

    let cell = list.cell_for(&19).map(|c| c.id()).expect("cell");
    list.on_item_layout(cell, &19, 80);
    assert_eq!(list.pending_adjustment(), -30);

    list.take_frame();
    list.settle();
    assert_eq!(list.pending_adjustment(), 0);
    assert_eq!(list.scroll_offset(), 2030);
    assert_eq!(
        list.take_scroll_request(),
        Some(ScrollRequest {
            offset: 2030,
            animated: false,
        })
    );
    assert_eq!(list.item_offset(40), Some(2030));
    assert_invariants(&list);
}

#[test]
fn correction_waits_for_animations() {
    let mut list = scrolled_measured_list(ListOptions::default().with_animate_changes(true));

    let cell = list.cell_for(&19).map(|c| c.id()).expect("cell");
    list.on_item_layout(cell, &19, 80);

    let frame = list.take_frame();
    assert!(frame.cell(cell).is_some_and(|c| c.animate && c.offset == 920));
    assert_eq!(list.animations_in_flight(), 1);

    list.settle();
    assert_eq!(list.pending_adjustment(), -30);

    assert!(list.on_animation_complete(cell));
    assert!(!list.on_animation_complete(cell));
    list.settle();
    assert_eq!(list.pending_adjustment(), 0);
    assert_eq!(list.scroll_offset(), 2030);
    // The flush shifts cells together with the scroll offset; nothing animates.
    assert!(list.take_frame().cells.iter().all(|c| !c.animate));
}

#[test]
fn removed_items_release_cells_and_cached_extents() {
    let mut list = VirtualList::with_items(ListOptions::default(), measured_items(5, 50));
    list.on_layout(viewport(500));
    run_until_idle(&mut list, |_| 70);
    assert_eq!(list.extent_cache_len(), 5);

    let mut items = measured_items(5, 50);
    items.remove(2);
    list.set_items(items);
    assert_eq!(list.cached_extent(&2), None);
    assert!(list.cell_for(&2).is_none());
    assert_eq!(list.extent_cache_len(), 4);
    assert_eq!(list.item_offset(2), Some(140));
    assert_invariants(&list);
}

#[test]
fn reshaped_item_gets_a_fresh_cell() {
    let mut list = VirtualList::with_items(
        ListOptions::default(),
        alloc::vec![Item::new(1u32, 50).with_template("row")],
    );
    list.on_layout(viewport(500));
    run_until_idle(&mut list, |_| 50);
    let before = list.cell_for(&1).map(|c| c.id()).expect("cell");

    list.set_items(alloc::vec![Item::new(1u32, 50).with_template("header")]);
    let after = list.cell_for(&1).map(|c| c.id()).expect("cell");
    assert_ne!(before, after);
    assert_eq!(list.pool_stats().recycled, 0);
    assert_eq!(list.cell_for(&1).and_then(|c| c.template()), Some("header"));
}

#[test]
#[should_panic(expected = "duplicate item key")]
fn duplicate_keys_panic() {
    let mut list = VirtualList::<u32>::new(ListOptions::default());
    list.set_items(alloc::vec![Item::new(1, 50), Item::new(1, 50)]);
}

#[test]
fn cross_axis_resize_rerenders_every_cell() {
    let mut list = idle_fixed_list(20, 500);
    let block = list.render_block();

    list.on_layout(Rect {
        main: 500,
        cross: 400,
    });
    assert!(list.needs_paint());
    assert_eq!(list.render_block(), block);
    assert!(list.take_frame().cells.iter().all(|c| c.should_update));
}

#[test]
fn paddings_shift_painted_offsets() {
    let options = ListOptions::default().with_padding(10, 20);
    let mut list = VirtualList::with_items(options, fixed_items(10, 50));
    list.on_layout(viewport(500));
    run_until_idle(&mut list, |_| 50);

    assert_eq!(list.content_extent(), 530);
    assert_eq!(list.item_offset(0), Some(10));
    assert_eq!(list.cell_for(&0).map(|c| c.offset()), Some(10));
    assert_eq!(list.max_scroll_offset(), 30);
    assert_invariants(&list);
}

#[test]
fn horizontal_layout_maps_width_to_main_axis() {
    let options = ListOptions::new(Axis::Horizontal);
    let mut list = VirtualList::with_items(options, fixed_items(100, 50));
    list.on_layout_size(300, 40);
    assert_eq!(list.viewport(), Rect { main: 300, cross: 40 });
    assert_eq!(list.render_block().items_in_block, 6);
    assert_eq!(Axis::Horizontal.position(120), (120, 0));
}

#[test]
fn scroll_to_index_offset_aligns_items() {
    let list = idle_fixed_list(1000, 500);

    assert_eq!(list.scroll_to_index_offset(10, Align::Start), 500);
    assert_eq!(list.scroll_to_index_offset(10, Align::End), 50);
    assert_eq!(list.scroll_to_index_offset(10, Align::Center), 275);
    assert_eq!(list.scroll_to_index_offset(3, Align::Auto), 0);
    assert_eq!(list.scroll_to_index_offset(20, Align::Auto), 550);
    assert_eq!(list.scroll_to_index_offset(999, Align::Start), 49_500);
}

#[test]
fn scroll_to_index_moves_the_block_and_requests_a_scroll() {
    let mut list = idle_fixed_list(1000, 500);

    list.scroll_to_index(200, Align::Start, true);
    assert_eq!(list.scroll_offset(), 10_000);
    assert!(list.render_block().contains(200));
    assert_eq!(
        list.take_scroll_request(),
        Some(ScrollRequest {
            offset: 10_000,
            animated: true,
        })
    );
    // The host echoing the offset back changes nothing.
    list.take_frame();
    list.on_scroll(10_000);
    assert!(!list.needs_paint());
}

#[test]
fn focus_moves_to_rendered_neighbour() {
    let mut list = idle_fixed_list(20, 500);
    assert!(list.set_focused_key(Some(5)));

    let change = list.focus_adjacent(FocusDirection::Down, FocusSource::Keyboard);
    assert_eq!(change, FocusChange::Focused(6));
    assert_eq!(list.focused_key(), Some(&6));
    assert_eq!(list.scroll_offset(), 0);

    let change = list.focus_adjacent(FocusDirection::Up, FocusSource::Programmatic);
    assert_eq!(change, FocusChange::Focused(5));
}

#[test]
fn focus_scrolls_to_unrendered_neighbour_and_retries_on_settle() {
    let mut list = VirtualList::with_items(ListOptions::default(), fixed_items(20, 50));
    list.on_layout(viewport(300));
    assert_eq!(list.render_block().range(), 0..6);
    assert!(list.set_focused_key(Some(5)));

    let change = list.focus_adjacent(FocusDirection::Down, FocusSource::Keyboard);
    assert_eq!(change, FocusChange::Pending);
    assert_eq!(list.focused_key(), Some(&5));
    assert!(list.has_pending_focus());
    assert_eq!(list.scroll_offset(), 50);
    assert_eq!(
        list.take_scroll_request(),
        Some(ScrollRequest {
            offset: 50,
            animated: false,
        })
    );

    list.take_frame();
    list.settle();
    assert_eq!(list.focused_key(), Some(&6));
    assert!(!list.has_pending_focus());
}

#[test]
fn focus_skips_items_that_are_not_navigable() {
    let mut items = fixed_items(10, 50);
    items[6].is_navigable = false;
    let mut list = VirtualList::with_items(ListOptions::default(), items);
    list.on_layout(viewport(500));
    run_until_idle(&mut list, |_| 50);

    list.set_focused_key(Some(5));
    assert_eq!(
        list.focus_adjacent(FocusDirection::Down, FocusSource::Keyboard),
        FocusChange::Focused(7)
    );
}

#[test]
fn focus_starts_at_first_rendered_item() {
    let mut list = idle_fixed_list(1000, 500);
    list.on_scroll(5000);
    assert_eq!(
        list.focus_adjacent(FocusDirection::Down, FocusSource::Programmatic),
        FocusChange::Focused(89)
    );
}

#[test]
fn focus_stays_at_list_end() {
    let mut list = idle_fixed_list(10, 500);
    list.set_focused_key(Some(9));
    assert_eq!(
        list.focus_adjacent(FocusDirection::Down, FocusSource::Keyboard),
        FocusChange::Unchanged
    );
    assert_eq!(list.focused_key(), Some(&9));
}

#[test]
fn home_and_end_jump_to_list_edges() {
    let mut list = idle_fixed_list(1000, 500);

    assert_eq!(list.handle_key(NavKey::End), FocusChange::Pending);
    list.take_frame();
    list.settle();
    assert_eq!(list.focused_key(), Some(&999));
    assert_eq!(list.scroll_offset(), 49_500);

    assert_eq!(list.handle_key(NavKey::Home), FocusChange::Pending);
    list.take_frame();
    list.settle();
    assert_eq!(list.focused_key(), Some(&0));
    assert_eq!(list.scroll_offset(), 0);
}

#[test]
fn arrow_keys_follow_the_axis() {
    assert_eq!(
        FocusDirection::from_key(Axis::Vertical, NavKey::ArrowDown),
        Some(FocusDirection::Down)
    );
    assert_eq!(
        FocusDirection::from_key(Axis::Horizontal, NavKey::ArrowLeft),
        Some(FocusDirection::Up)
    );
    assert_eq!(FocusDirection::from_key(Axis::Vertical, NavKey::ArrowRight), None);
    assert_eq!(FocusDirection::from_key(Axis::Vertical, NavKey::Home), None);

    let options = ListOptions::new(Axis::Horizontal);
    let mut list = VirtualList::with_items(options, fixed_items(10, 50));
    list.on_layout(Rect {
        main: 500,
        cross: 40,
    });
    list.set_focused_key(Some(2));
    assert_eq!(list.handle_key(NavKey::ArrowDown), FocusChange::Unchanged);
    assert_eq!(list.handle_key(NavKey::ArrowRight), FocusChange::Focused(3));
}

#[test]
fn removing_focused_item_moves_focus_to_next_navigable() {
    let log: Arc<Mutex<Vec<Option<u32>>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    let options = ListOptions::<u32>::default().with_on_focus_change(Some(
        move |key: Option<&u32>| {
            sink.lock().expect("log").push(key.copied());
        },
    ));
    let mut list = VirtualList::with_items(options, fixed_items(10, 50));
    list.on_layout(viewport(500));
    list.set_focused_key(Some(5));

    let mut items = fixed_items(10, 50);
    items.remove(5);
    list.set_items(items);
    assert_eq!(list.focused_key(), Some(&6));

    // The last item falls back to its predecessor.
    list.set_focused_key(Some(9));
    let mut items = fixed_items(10, 50);
    items.remove(5);
    items.pop();
    list.set_items(items);
    assert_eq!(list.focused_key(), Some(&8));

    assert_eq!(
        *log.lock().expect("log"),
        alloc::vec![Some(5), Some(6), Some(9), Some(8)]
    );
}

#[test]
fn removing_focused_item_without_navigable_neighbours_clears_focus() {
    let items = alloc::vec![
        Item::new(0u32, 50),
        Item::new(1u32, 50).with_navigable(true),
    ];
    let mut list = VirtualList::with_items(ListOptions::default(), items);
    list.on_layout(viewport(500));
    list.set_focused_key(Some(1));
    list.set_selected_key(Some(1));

    list.set_items(alloc::vec![Item::new(0u32, 50)]);
    assert_eq!(list.focused_key(), None);
    assert_eq!(list.selected_key(), None);
}

#[test]
fn initial_selection_is_focused() {
    let options = ListOptions::default().with_initial_selected_key(Some(3u32));
    let list = VirtualList::with_items(options, fixed_items(10, 50));
    assert_eq!(list.selected_key(), Some(&3));
    assert_eq!(list.focused_key(), Some(&3));
}

#[test]
fn screen_reader_disables_recycling() {
    let mut list = idle_fixed_list(1000, 500);
    list.set_screen_reader_active(true);
    assert!(list.screen_reader_active());

    list.on_scroll(5000);
    let stats = list.pool_stats();
    assert_eq!(stats.recycled, 0);
    assert_eq!(stats.reused, 0);
    assert_eq!(stats.created, 53);

    list.set_screen_reader_active(false);
    list.on_scroll(0);
    assert!(list.pool_stats().recycled > 0);
}

#[test]
fn batch_update_notifies_once() {
    let notified = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&notified);
    let options = ListOptions::<u32>::default().with_on_change(Some(
        move |_: &VirtualList<u32>| {
            counter.fetch_add(1, Ordering::SeqCst);
        },
    ));
    let mut list = VirtualList::new(options);

    list.batch_update(|l| {
        l.set_items(fixed_items(100, 50));
        l.on_layout(viewport(500));
        l.on_scroll(100);
    });
    assert_eq!(notified.load(Ordering::SeqCst), 1);
}

#[test]
fn extent_cache_survives_export_and_import() {
    let mut list = VirtualList::with_items(ListOptions::default(), measured_items(10, 50));
    list.on_layout(viewport(500));
    run_until_idle(&mut list, |&k| 40 + k);
    let mut exported = list.export_extent_cache();
    exported.sort();
    assert_eq!(exported.len(), 10);
    assert_eq!(exported[4], (4, 44));

    let mut total = 0;
    list.for_each_cached_extent(|_, extent| total += extent);
    assert_eq!(total, exported.iter().map(|&(_, e)| e).sum::<u32>());

    let mut restored = VirtualList::with_items(ListOptions::default(), measured_items(10, 50));
    restored.import_extent_cache(exported);
    restored.on_layout(viewport(500));
    assert_eq!(restored.pending_measurements(), 0);
    assert_eq!(restored.item_offset(2), Some(81));
    assert_eq!(restored.render_block().items_in_block, 10);

    restored.reset_measurements();
    assert_eq!(restored.extent_cache_len(), 0);
    assert!(restored.pending_measurements() > 0);
}

#[test]
fn settle_before_first_layout_keeps_initial_fill_pending() {
    let mut list = VirtualList::with_items(ListOptions::default(), fixed_items(1000, 50));
    assert!(!list.settle());
    assert!(!list.is_initial_fill_complete());

    list.on_layout(viewport(500));
    // The first fill covers only the viewport.
    assert_eq!(list.render_block().items_in_block, 10);
    assert!(!list.is_initial_fill_complete());

    run_until_idle(&mut list, |_| 50);
    assert!(list.is_initial_fill_complete());
    assert_eq!(list.render_block().items_in_block, 21);
}

#[test]
fn settle_on_empty_list_keeps_initial_fill_pending() {
    let mut list = VirtualList::<u32>::new(ListOptions::default());
    list.on_layout(viewport(500));
    list.settle();
    assert!(!list.is_initial_fill_complete());

    list.set_items(fixed_items(100, 50));
    assert_eq!(list.render_block().items_in_block, 10);
    run_until_idle(&mut list, |_| 50);
    assert!(list.is_initial_fill_complete());
}

#[test]
fn main_axis_resize_recomputes_margins_and_flushes_corrections() {
    let mut list = scrolled_measured_list(ListOptions::default());
    assert_eq!(list.margins(), Margins { render: 512, cull: 1024 });

    let cell = list.cell_for(&19).map(|c| c.id()).expect("cell");
    list.on_item_layout(cell, &19, 80);
    assert_eq!(list.pending_adjustment(), -30);

    list.on_layout(viewport(2000));
    assert_eq!(
        list.margins(),
        Margins {
            render: 1000,
            cull: 2000,
        }
    );
    assert_eq!(list.pending_adjustment(), 0);
    assert_eq!(list.scroll_offset(), 2030);
    assert_eq!(
        list.take_scroll_request(),
        Some(ScrollRequest {
            offset: 2030,
            animated: false,
        })
    );
    assert!(list.needs_paint());
    assert_invariants(&list);
}

#[test]
fn frame_reports_recycled_and_visible_cells() {
    let mut list = idle_fixed_list(1000, 500);
    list.on_scroll(400);
    list.on_scroll(0);
    list.take_frame();

    // Removed rows leave their cells queued for reuse.
    list.set_items(fixed_items(20, 50));
    let frame = list.take_frame();
    let recycled = frame.cells.iter().filter(|c| c.is_recycled()).count();
    assert_eq!(recycled, list.pool_stats().recycled);
    assert!(recycled > 0);
    assert!(frame.cells.iter().filter(|c| c.is_recycled()).all(|c| !c.is_visible));
    assert_eq!(frame.visible_cells().count(), list.pool_stats().active);
    assert!(frame.visible_cells().all(|c| !c.is_recycled()));
}

#[test]
fn empty_list_and_zero_viewport_render_nothing() {
    let mut list = VirtualList::<u32>::new(ListOptions::default());
    list.on_layout(viewport(500));
    assert_eq!(list.render_block(), RenderBlock::default());
    assert_eq!(list.content_extent(), 0);

    list.set_items(fixed_items(10, 50));
    list.on_layout(viewport(0));
    assert!(list.render_block().is_empty());
    assert_eq!(list.pool_stats().active, 0);
    assert_invariants(&list);
}

#[test]
fn pool_prefers_exact_match_and_evicts_oldest() {
    fn req(key: &u32, index: usize) -> CellRequest<'_, u32> {
        CellRequest {
            key,
            template: Some("row"),
            index,
            is_extent_constant: true,
            extent: 50,
            offset: index as i64 * 50,
            visible: true,
            animate: false,
        }
    }

    let mut pool = CellPool::new(2);
    let a = pool.allocate(req(&1, 0));
    let b = pool.allocate(req(&2, 1));
    assert_ne!(a, b);
    assert!(pool.take_dirty());

    pool.recycle(&1);
    pool.recycle(&2);
    assert_eq!(pool.recycled_len(), 2);
    assert_eq!(pool.allocate(req(&2, 5)), b);

    pool.recycle(&2);
    pool.set_capacity(1);
    // `a` was the oldest entry.
    assert_eq!(pool.recycled_len(), 1);
    assert_eq!(pool.allocate(req(&7, 0)), b);
    let c = pool.allocate(req(&8, 1));
    assert_ne!(c, a);
    assert_eq!(pool.stats().created, 3);

    let plain = CellRequest {
        template: None,
        ..req(&9, 2)
    };
    pool.allocate(plain);
    assert!(pool.recycle(&9).is_some());
    assert_eq!(pool.recycled_len(), 0);

    let ids: Vec<CellId> = pool.sorted_cells().iter().map(|c| c.id()).collect();
    assert_eq!(ids, alloc::vec![b, c]);
}

#[test]
fn pool_updates_active_cells_in_place() {
    let mut pool = CellPool::new(4);
    let request = CellRequest {
        key: &1u32,
        template: Some("row"),
        index: 0,
        is_extent_constant: true,
        extent: 50,
        offset: 0,
        visible: true,
        animate: true,
    };
    let id = pool.allocate(request);
    pool.clear_render_flags();
    assert!(pool.is_dirty());
    pool.take_dirty();
    assert!(!pool.is_dirty());

    assert_eq!(pool.allocate(request), id);
    assert!(!pool.take_dirty());

    pool.allocate(CellRequest {
        offset: 30,
        ..request
    });
    assert!(pool.take_dirty());
    let cell = pool.active(&1).expect("active");
    assert_eq!(cell.offset(), 30);
    assert!(cell.animate());
    assert!(!cell.should_update());
}

#[test]
fn diff_classifies_keys() {
    let prev = alloc::vec![Item::new("a", 10), Item::new("b", 10), Item::new("c", 10)];
    let next = alloc::vec![
        Item::new("c", 10),
        Item::new("a", 10).with_measure_extent(true),
        Item::new("d", 10),
    ];
    let prev_dir = ItemDirectory::build(&prev).expect("unique");
    let next_dir = ItemDirectory::build(&next).expect("unique");

    let diff = ListDiff::compute(&prev, &prev_dir, &next, &next_dir, true);
    assert_eq!(diff.added, alloc::vec![2]);
    assert_eq!(diff.removed, alloc::vec![1]);
    assert_eq!(diff.changed, alloc::vec![1]);
    assert_eq!(diff.moved, alloc::vec![0, 1]);
    assert_eq!(diff.reshaped, alloc::vec![(0, 1)]);

    let all = ListDiff::compute(&prev, &prev_dir, &next, &next_dir, false);
    assert_eq!(all.changed, alloc::vec![0, 1]);

    let same = ListDiff::compute(&prev, &prev_dir, &prev, &prev_dir, true);
    assert!(same.is_empty());
}

#[test]
fn directory_reports_duplicate_indexes() {
    let items = alloc::vec![Item::new(1u32, 10), Item::new(2, 10), Item::new(1, 10)];
    let err = ItemDirectory::build(&items).expect_err("duplicate");
    assert_eq!(
        err,
        DuplicateKey {
            first_index: 0,
            index: 2,
        }
    );
}

#[test]
fn oracle_tracks_guesses_and_measurements() {
    let mut oracle = SizeOracle::new();
    let guessed = Item::new(1u32, 50).with_measure_extent(true);
    let constant = Item::new(2u32, 30);

    assert_eq!(oracle.extent_of(&constant), 30);
    assert!(oracle.is_known(&constant));
    assert_eq!(oracle.pending_len(), 0);

    assert_eq!(oracle.extent_of(&guessed), 50);
    assert!(oracle.is_pending(&1));
    assert!(!oracle.is_known(&guessed));

    assert_eq!(oracle.record_measurement(&guessed, 80), 30);
    assert_eq!(oracle.extent_of(&guessed), 80);
    assert_eq!(oracle.pending_len(), 0);
    assert_eq!(oracle.record_measurement(&guessed, 60), -20);

    oracle.forget(&1);
    assert_eq!(oracle.cached(&1), None);
    assert_eq!(oracle.peek_extent(&guessed), 50);
    assert_eq!(oracle.pending_len(), 0);
}

#[test]
fn reconciler_flush_policy() {
    let mut reconciler = CorrectionReconciler::new(10);
    assert!(!reconciler.should_flush(true));

    reconciler.accumulate(-5);
    assert!(!reconciler.should_flush(false));
    assert!(reconciler.should_flush(true));

    reconciler.accumulate(-10);
    assert!(reconciler.should_flush(false));

    reconciler.begin_animation(CellId(3));
    assert!(!reconciler.should_flush(true));
    assert!(reconciler.end_animation(CellId(3)));
    assert_eq!(reconciler.take(), -15);
    assert_eq!(reconciler.pending(), 0);
}

#[test]
fn render_block_moves_items_between_regions() {
    let mut block = RenderBlock::empty_at(2, 100, 5, 250);
    assert_eq!(block.range(), 2..2);
    block.grow_bottom(50);
    block.grow_top(50);
    assert_eq!(block.range(), 1..3);
    assert_eq!(block.extent_in_block, 100);
    block.cull_top(50);
    block.cull_bottom(50);
    assert!(block.is_empty());
    assert_eq!(block.item_count(), 5);
    assert_eq!(block.total_extent(), 250);
}

#[test]
fn fenwick_matches_naive_model() {
    let mut rng = Lcg::new(7);
    for _ in 0..50 {
        let n = rng.gen_range_usize(0, 64);
        let mut extents: Vec<u32> = (0..n).map(|_| rng.gen_range_u32(0, 100)).collect();
        let mut tree = Fenwick::from_extents(&extents);

        for _ in 0..20 {
            if n > 0 {
                let index = rng.gen_range_usize(0, n);
                let next = rng.gen_range_u32(0, 100);
                tree.add(index, next as i64 - extents[index] as i64);
                extents[index] = next;
            }

            let prefix = |count: usize| extents[..count].iter().map(|&e| e as u64).sum::<u64>();
            assert_eq!(tree.total(), prefix(n));
            for count in 0..=n {
                assert_eq!(tree.prefix_sum(count), prefix(count));
            }
            let target = rng.gen_range_u64(0, prefix(n) + 10);
            let expected = (0..=n).rev().find(|&k| prefix(k) <= target).unwrap_or(0);
            assert_eq!(tree.lower_bound(target), expected, "target {target}");
        }
    }
}

#[derive(Clone, Debug)]
enum Op {
    Resize(u32),
    Scroll(u64),
    Measure(u32),
    Mutate(u64),
    Paint,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u32..800).prop_map(Op::Resize),
        (0u64..12_000).prop_map(Op::Scroll),
        (1u32..200).prop_map(Op::Measure),
        any::<u64>().prop_map(Op::Mutate),
        Just(Op::Paint),
    ]
}

fn mixed_item(key: u32) -> Item<u32> {
    if key % 3 == 0 {
        Item::new(key, 40 + key % 50)
            .with_measure_extent(true)
            .with_navigable(true)
    } else {
        Item::new(key, 30 + key % 20).with_template("row")
    }
}

proptest! {
    #[test]
    fn random_operations_preserve_block_invariants(
        ops in proptest::collection::vec(op_strategy(), 1..60)
    ) {
        let mut next_key = 200u32;
        let mut list = VirtualList::with_items(
            ListOptions::default().with_animate_changes(true),
            (0..next_key).map(mixed_item).collect(),
        );
        list.on_layout(viewport(400));
        assert_invariants(&list);

        for op in ops {
            match op {
                Op::Resize(main) => list.on_layout(viewport(main)),
                Op::Scroll(offset) => list.on_scroll(offset),
                Op::Measure(extent) => {
                    let frame = list.frame();
                    for cell in frame.cells.iter().filter(|c| c.needs_measure) {
                        if let Some(key) = &cell.item_key {
                            list.on_item_layout(cell.id, key, extent);
                        }
                    }
                }
                Op::Mutate(seed) => {
                    let mut rng = Lcg::new(seed);
                    let mut items: Vec<Item<u32>> = list
                        .items()
                        .iter()
                        .filter(|_| rng.gen_range_u64(0, 5) != 0)
                        .cloned()
                        .collect();
                    for _ in 0..rng.gen_range_usize(0, 20) {
                        let at = rng.gen_range_usize(0, items.len() + 1);
                        items.insert(at, mixed_item(next_key));
                        next_key += 1;
                    }
                    list.set_items(items);
                }
                Op::Paint => {
                    let frame = list.take_frame();
                    for cell in frame.cells.iter().filter(|c| c.animate) {
                        list.on_animation_complete(cell.id);
                    }
                    list.settle();
                }
            }
            assert_invariants(&list);
        }
    }
}
