// Example: items with guessed extents, measured after each paint.
use virtual_list::{Item, ListOptions, Rect, VirtualList};

fn measured_extent(key: u32) -> u32 {
    // Stand-in for a real text layout.
    24 + (key % 7) * 12
}

fn main() {
    let items: Vec<Item<u32, String>> = (0..500)
        .map(|k| {
            Item::with_data(k, 40, format!("message #{k}"))
                .with_template("message")
                .with_measure_extent(true)
        })
        .collect();
    let mut list = VirtualList::with_items(ListOptions::default(), items);
    list.on_layout(Rect {
        main: 480,
        cross: 360,
    });

    let mut rounds = 0;
    while list.needs_paint() {
        rounds += 1;
        let frame = list.take_frame();
        for cell in frame.cells.iter().filter(|c| c.needs_measure) {
            if let Some(key) = cell.item_key {
                list.on_item_layout(cell.id, &key, measured_extent(key));
            }
        }
        list.settle();
    }
    println!(
        "settled after {rounds} paints: block={:?} cached={} content_extent={}",
        list.render_block().range(),
        list.extent_cache_len(),
        list.content_extent()
    );

    // Scroll down, then let an item above the viewport grow: the correction is applied
    // together with a scroll adjustment, so visible rows stay put.
    list.on_scroll(2_000);
    while list.needs_paint() {
        let frame = list.take_frame();
        for cell in frame.cells.iter().filter(|c| c.needs_measure) {
            if let Some(key) = cell.item_key {
                list.on_item_layout(cell.id, &key, measured_extent(key));
            }
        }
        list.settle();
    }
    let first = list.render_block().start();
    let key = list.items()[first].key;
    if let Some(cell) = list.cell_for(&key).map(|c| c.id()) {
        list.on_item_layout(cell, &key, 200);
        println!("pending_adjustment={}", list.pending_adjustment());
        list.take_frame();
        list.settle();
        println!(
            "after settle: pending_adjustment={} scroll_request={:?}",
            list.pending_adjustment(),
            list.take_scroll_request()
        );
    }
}
