use virtual_list::{Axis, CellId};

/// The rendering side of a list: a scroll container and positioned cells.
///
/// Implement it over whatever view system hosts the list. Cells are identified by their
/// [`CellId`] only; the substrate never needs to know about items.
pub trait Substrate {
    /// Rendered content of one item (a view tree, a string, a widget handle...).
    type Content;

    /// Called once, when the host is created.
    fn create_scroll_container(&mut self, axis: Axis);

    fn set_content_extent(&mut self, extent: u64);

    /// Mounts or moves a cell. `content` is `Some` only when the cell must render again.
    fn render_cell(
        &mut self,
        cell: CellId,
        offset: i64,
        extent: u32,
        visible: bool,
        content: Option<Self::Content>,
    );

    fn unmount_cell(&mut self, cell: CellId);

    /// Asks for the laid-out extent of `cell`, to be reported through
    /// [`crate::ListHost::on_cell_measured`].
    fn request_measure(&mut self, cell: CellId);

    fn scroll_to(&mut self, offset: u64, animated: bool);
}
