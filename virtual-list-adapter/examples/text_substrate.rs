// Example: a substrate that keeps cells as text rows and prints the visible ones.
use std::collections::BTreeMap;

use virtual_list::{Axis, CellId, Item, ListOptions, NavKey, Rect, VirtualList};
use virtual_list_adapter::{ListHost, Substrate};

#[derive(Default)]
struct TextRows {
    scroll: u64,
    viewport: u64,
    rows: BTreeMap<CellId, (i64, u32, bool, String)>,
}

impl TextRows {
    fn print(&self) {
        let mut visible: Vec<_> = self
            .rows
            .values()
            .filter(|(offset, extent, visible, _)| {
                *visible
                    && *offset + *extent as i64 > self.scroll as i64
                    && *offset < (self.scroll + self.viewport) as i64
            })
            .collect();
        visible.sort_by_key(|(offset, ..)| *offset);
        println!("-- scroll {} ({} mounted) --", self.scroll, self.rows.len());
        for (offset, _, _, text) in visible {
            println!("{offset:>6} {text}");
        }
    }
}

impl Substrate for TextRows {
    type Content = String;

    fn create_scroll_container(&mut self, axis: Axis) {
        println!("scroll container: {axis:?}");
    }

    fn set_content_extent(&mut self, _extent: u64) {}

    fn render_cell(
        &mut self,
        cell: CellId,
        offset: i64,
        extent: u32,
        visible: bool,
        content: Option<String>,
    ) {
        let row = self
            .rows
            .entry(cell)
            .or_insert_with(|| (offset, extent, visible, String::new()));
        row.0 = offset;
        row.1 = extent;
        row.2 = visible;
        if let Some(text) = content {
            row.3 = text;
        }
    }

    fn unmount_cell(&mut self, cell: CellId) {
        self.rows.remove(&cell);
    }

    fn request_measure(&mut self, _cell: CellId) {}

    fn scroll_to(&mut self, offset: u64, _animated: bool) {
        self.scroll = offset;
    }
}

fn main() {
    let items: Vec<Item<u32, String>> = (0..10_000)
        .map(|k| {
            Item::with_data(k, 20, format!("row {k}"))
                .with_template("row")
                .with_navigable(true)
        })
        .collect();
    let list = VirtualList::with_items(ListOptions::default(), items);
    let substrate = TextRows {
        viewport: 100,
        ..TextRows::default()
    };
    let mut host = ListHost::new(list, substrate, |item: &Item<u32, String>| {
        item.data.clone()
    });

    host.on_layout(Rect {
        main: 100,
        cross: 80,
    });
    host.pump(0);
    host.substrate().print();

    host.substrate_mut().scroll = 4_000;
    host.on_scroll(4_000);
    host.pump(16);
    host.substrate().print();

    // End focuses the last row; the host forwards the scroll request to the substrate.
    host.on_key(NavKey::End);
    host.pump(32);
    host.substrate().print();
    println!("focused: {:?}", host.list().focused_key());
}
