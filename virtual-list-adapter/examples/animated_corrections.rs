// Example: measured items with animated offset changes, driven by a frame clock.
use virtual_list::{Axis, CellId, Item, ListOptions, Rect, VirtualList};
use virtual_list_adapter::{Animator, Easing, ListHost, Substrate};

#[derive(Default)]
struct Log {
    measure: Vec<CellId>,
    moves: usize,
    scrolls: Vec<u64>,
}

impl Substrate for Log {
    type Content = ();

    fn create_scroll_container(&mut self, _axis: Axis) {}

    fn set_content_extent(&mut self, _extent: u64) {}

    fn render_cell(&mut self, _: CellId, _: i64, _: u32, _: bool, _: Option<()>) {
        self.moves += 1;
    }

    fn unmount_cell(&mut self, _cell: CellId) {}

    fn request_measure(&mut self, cell: CellId) {
        self.measure.push(cell);
    }

    fn scroll_to(&mut self, offset: u64, _animated: bool) {
        self.scrolls.push(offset);
    }
}

fn pump_measuring(host: &mut ListHost<u32, (), Log>, now_ms: u64, extent: u32) {
    loop {
        host.pump(now_ms);
        let requests = std::mem::take(&mut host.substrate_mut().measure);
        if requests.is_empty() {
            return;
        }
        for cell in requests {
            host.on_cell_measured(cell, extent);
        }
    }
}

fn main() {
    let items: Vec<Item<u32>> = (0..200)
        .map(|k| Item::new(k, 50).with_measure_extent(true))
        .collect();
    let options = ListOptions::default().with_animate_changes(true);
    let mut host = ListHost::new(VirtualList::with_items(options, items), Log::default(), |_| ())
        .with_animator(Animator::new(200, Easing::EaseInOutCubic));

    host.on_layout(Rect {
        main: 600,
        cross: 400,
    });
    pump_measuring(&mut host, 0, 50);
    host.on_scroll(3_000);
    pump_measuring(&mut host, 0, 50);

    // An item above the viewport grows; visible rows stay in place until it finished
    // animating, then the correction is flushed together with a scroll adjustment.
    let first = host.list().render_block().start();
    if let Some(cell) = host.list().cell_for(&(first as u32)).map(|c| c.id()) {
        host.on_cell_measured(cell, 120);
    }
    host.pump(1_000);
    println!("pending_adjustment={}", host.list().pending_adjustment());

    let mut now = 1_000;
    while host.animator().is_animating() {
        now += 16;
        host.tick(now);
    }
    println!(
        "t={now}ms pending_adjustment={} scrolls={:?} cell moves={}",
        host.list().pending_adjustment(),
        host.substrate().scrolls,
        host.substrate().moves
    );
}
