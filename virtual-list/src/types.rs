/// Scroll axis of a list.
///
/// All bookkeeping is done along the *main* axis; the axis only decides how platform sizes and
/// positions map onto it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Axis {
    #[default]
    Vertical,
    Horizontal,
}

impl Axis {
    /// Extent along the scroll axis.
    pub fn main(self, width: u32, height: u32) -> u32 {
        match self {
            Self::Vertical => height,
            Self::Horizontal => width,
        }
    }

    /// Extent across the scroll axis.
    pub fn cross(self, width: u32, height: u32) -> u32 {
        match self {
            Self::Vertical => width,
            Self::Horizontal => height,
        }
    }

    pub fn rect(self, width: u32, height: u32) -> Rect {
        Rect {
            main: self.main(width, height),
            cross: self.cross(width, height),
        }
    }

    /// Maps a main-axis offset to an `(x, y)` position.
    pub fn position(self, offset: i64) -> (i64, i64) {
        match self {
            Self::Vertical => (0, offset),
            Self::Horizontal => (offset, 0),
        }
    }
}

/// Viewport geometry in axis terms.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub main: u32,
    pub cross: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Align {
    Start,
    Center,
    End,
    /// Leaves the offset alone when the item is already fully visible.
    Auto,
}

/// Stable identity of a cell (its "virtual key").
///
/// Ids come from a per-pool monotonic sequence and are never handed to a second cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellId(pub u64);

/// A scroll position the list wants the host to apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScrollRequest {
    pub offset: u64,
    pub animated: bool,
}
