// Example: keyboard navigation across rendered and unrendered items.
use virtual_list::{Item, ListOptions, NavKey, Rect, VirtualList};

fn main() {
    let items: Vec<Item<u32>> = (0..1_000)
        .map(|k| {
            Item::new(k, 32)
                .with_template("row")
                .with_navigable(k % 10 != 0) // section headers are skipped
        })
        .collect();
    let options = ListOptions::default()
        .with_keyboard_focus_margin(32)
        .with_on_focus_change(Some(|key: Option<&u32>| println!("focus -> {key:?}")));
    let mut list = VirtualList::with_items(options, items);
    list.on_layout(Rect {
        main: 320,
        cross: 240,
    });
    list.take_frame();
    list.settle();

    for key in [NavKey::ArrowDown, NavKey::ArrowDown, NavKey::End, NavKey::ArrowUp] {
        let change = list.handle_key(key);
        if let Some(request) = list.take_scroll_request() {
            println!("{key:?}: {change:?}, scroll to {}", request.offset);
        } else {
            println!("{key:?}: {change:?}");
        }
        list.take_frame();
        list.settle();
    }
}
