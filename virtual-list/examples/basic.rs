// Example: minimal render/settle loop over a large list of fixed rows.
use virtual_list::{Align, Item, ListOptions, Rect, VirtualList};

fn main() {
    let items: Vec<Item<u32>> = (0..100_000)
        .map(|k| Item::new(k, 20).with_template("row"))
        .collect();
    let mut list = VirtualList::with_items(ListOptions::default(), items);
    list.on_layout(Rect {
        main: 600,
        cross: 320,
    });

    // Paint until the list settles (the initial fill adds overdraw on the second round).
    while list.needs_paint() {
        let frame = list.take_frame();
        println!(
            "paint: content_extent={} cells={}",
            frame.content_extent,
            frame.cells.len()
        );
        list.settle();
    }
    println!("block={:?}", list.render_block().range());

    let offset = list.scroll_to_index_offset(99_999, Align::End);
    list.on_scroll(offset);
    println!(
        "after scroll: offset={} block={:?} pool={:?}",
        list.scroll_offset(),
        list.render_block().range(),
        list.pool_stats()
    );
}
