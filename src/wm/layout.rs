//! Layout - Binary tree of splits arranging the panes of a window

use super::pane::PaneId;
use crate::core::key::Direction;

/// Smallest and largest split ratio reachable by resizing
pub const MIN_RATIO: f64 = 0.1;
pub const MAX_RATIO: f64 = 0.9;

/// A pane must be at least this long along the split axis to be split
/// (two one-cell children plus the border).
pub const MIN_SPLIT_EXTENT: u16 = 4;

// Absorbs float error so that ratios stepped by whole cells land exactly on
// those cells.
const RATIO_EPSILON: f64 = 1e-6;

/// Absolute cell rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub top: u16,
    pub left: u16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    pub const fn new(top: u16, left: u16, width: u16, height: u16) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    /// One past the last row
    pub fn bottom(&self) -> u16 {
        self.top.saturating_add(self.height)
    }

    /// One past the last column
    pub fn right(&self) -> u16 {
        self.left.saturating_add(self.width)
    }

    /// Center point as (x, y)
    pub fn center(&self) -> (f64, f64) {
        (
            self.left as f64 + self.width as f64 / 2.0,
            self.top as f64 + self.height as f64 / 2.0,
        )
    }
}

/// Direction of split
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SplitDirection {
    /// Panes stacked top/bottom, separated by a horizontal border row
    Horizontal,
    /// Panes side by side, separated by a vertical border column
    Vertical,
}

impl SplitDirection {
    /// Split axis that moves when resizing toward `dir`
    pub fn for_direction(dir: Direction) -> Self {
        match dir {
            Direction::Up | Direction::Down => SplitDirection::Horizontal,
            Direction::Left | Direction::Right => SplitDirection::Vertical,
        }
    }

    /// Length of `rect` along this split axis
    pub fn extent(self, rect: &Rect) -> u16 {
        match self {
            SplitDirection::Horizontal => rect.height,
            SplitDirection::Vertical => rect.width,
        }
    }
}

/// Layout preset types, cycled by next-layout
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LayoutPreset {
    /// All panes side by side
    EvenHorizontal,
    /// All panes stacked
    EvenVertical,
    /// Main pane on top, rest side by side below
    MainHorizontal,
    /// Main pane on left, rest stacked on the right
    MainVertical,
}

impl LayoutPreset {
    /// Get next layout type
    pub fn next(self) -> Self {
        match self {
            LayoutPreset::EvenHorizontal => LayoutPreset::EvenVertical,
            LayoutPreset::EvenVertical => LayoutPreset::MainHorizontal,
            LayoutPreset::MainHorizontal => LayoutPreset::MainVertical,
            LayoutPreset::MainVertical => LayoutPreset::EvenHorizontal,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LayoutPreset::EvenHorizontal => "even-horizontal",
            LayoutPreset::EvenVertical => "even-vertical",
            LayoutPreset::MainHorizontal => "main-horizontal",
            LayoutPreset::MainVertical => "main-vertical",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "even-horizontal" => Some(LayoutPreset::EvenHorizontal),
            "even-vertical" => Some(LayoutPreset::EvenVertical),
            "main-horizontal" => Some(LayoutPreset::MainHorizontal),
            "main-vertical" => Some(LayoutPreset::MainVertical),
            _ => None,
        }
    }
}

/// Sizes of the two children of a split of length `extent`; one cell in
/// between is the border.
pub fn split_extents(extent: u16, ratio: f64) -> (u16, u16) {
    if extent < 3 {
        let first = extent.min(1);
        return (first, extent.saturating_sub(first + 1));
    }
    let first = ((extent as f64 * ratio + RATIO_EPSILON).floor() as u16).clamp(1, extent - 2);
    (first, extent - 1 - first)
}

/// Layout node - binary tree structure
#[derive(Clone, Debug, PartialEq)]
pub enum Layout {
    /// A leaf node holding a pane
    Leaf { pane: PaneId, rect: Rect },
    /// A split containing two child layouts
    Split {
        direction: SplitDirection,
        /// Share of the extent given to `first` (0.1 - 0.9)
        ratio: f64,
        rect: Rect,
        first: Box<Layout>,
        second: Box<Layout>,
    },
}

impl Layout {
    /// Create a new layout with a single pane
    pub fn new(pane: PaneId) -> Self {
        Layout::Leaf {
            pane,
            rect: Rect::default(),
        }
    }

    /// Bounding box assigned by the last `compute`
    pub fn rect(&self) -> Rect {
        match self {
            Layout::Leaf { rect, .. } | Layout::Split { rect, .. } => *rect,
        }
    }

    pub fn is_leaf_of(&self, id: PaneId) -> bool {
        matches!(self, Layout::Leaf { pane, .. } if *pane == id)
    }

    /// Assign bounding boxes top-down, collecting leaf boxes in tree order
    pub fn compute(&mut self, area: Rect, out: &mut Vec<(PaneId, Rect)>) {
        match self {
            Layout::Leaf { pane, rect } => {
                *rect = area;
                out.push((*pane, area));
            }
            Layout::Split {
                direction,
                ratio,
                rect,
                first,
                second,
            } => {
                *rect = area;
                let (a, b) = split_extents(direction.extent(&area), *ratio);
                match direction {
                    SplitDirection::Horizontal => {
                        first.compute(Rect::new(area.top, area.left, area.width, a), out);
                        let top = area.top.saturating_add(a + 1);
                        second.compute(Rect::new(top, area.left, area.width, b), out);
                    }
                    SplitDirection::Vertical => {
                        first.compute(Rect::new(area.top, area.left, a, area.height), out);
                        let left = area.left.saturating_add(a + 1);
                        second.compute(Rect::new(area.top, left, b, area.height), out);
                    }
                }
            }
        }
    }

    /// The border cells of a split: the row or column right after `first`
    pub fn border_rect(&self) -> Option<Rect> {
        let Layout::Split {
            direction,
            rect,
            first,
            ..
        } = self
        else {
            return None;
        };
        let f = first.rect();
        Some(match direction {
            SplitDirection::Horizontal => Rect::new(f.bottom(), rect.left, rect.width, 1),
            SplitDirection::Vertical => Rect::new(rect.top, f.right(), 1, rect.height),
        })
    }

    /// Get all pane IDs in tree order
    pub fn pane_ids(&self) -> Vec<PaneId> {
        let mut ids = Vec::new();
        self.collect_ids(&mut ids);
        ids
    }

    fn collect_ids(&self, ids: &mut Vec<PaneId>) {
        match self {
            Layout::Leaf { pane, .. } => ids.push(*pane),
            Layout::Split { first, second, .. } => {
                first.collect_ids(ids);
                second.collect_ids(ids);
            }
        }
    }

    pub fn contains(&self, id: PaneId) -> bool {
        self.find_leaf(id).is_some()
    }

    pub fn find_leaf(&self, id: PaneId) -> Option<&Layout> {
        match self {
            Layout::Leaf { pane, .. } if *pane == id => Some(self),
            Layout::Leaf { .. } => None,
            Layout::Split { first, second, .. } => {
                first.find_leaf(id).or_else(|| second.find_leaf(id))
            }
        }
    }

    /// The split whose direct child is the leaf of `id`
    pub fn find_parent(&self, id: PaneId) -> Option<&Layout> {
        match self {
            Layout::Leaf { .. } => None,
            Layout::Split { first, second, .. } => {
                if first.is_leaf_of(id) || second.is_leaf_of(id) {
                    Some(self)
                } else {
                    first.find_parent(id).or_else(|| second.find_parent(id))
                }
            }
        }
    }

    /// Turn the leaf of `target` into a split of `target` and `new_pane`
    pub fn split(&mut self, target: PaneId, new_pane: PaneId, direction: SplitDirection) -> bool {
        match self {
            Layout::Leaf { pane, rect } => {
                if *pane != target {
                    return false;
                }
                let rect = *rect;
                *self = Layout::Split {
                    direction,
                    ratio: 0.5,
                    rect,
                    first: Box::new(Layout::Leaf { pane: target, rect }),
                    second: Box::new(Layout::new(new_pane)),
                };
                true
            }
            Layout::Split { first, second, .. } => {
                first.split(target, new_pane, direction) || second.split(target, new_pane, direction)
            }
        }
    }

    /// Remove the leaf of `id`, replacing its parent split with the sibling
    /// subtree. A lone root leaf is never removed.
    pub fn remove(&mut self, id: PaneId) -> bool {
        let Layout::Split { first, second, .. } = self else {
            return false;
        };
        let sibling = if first.is_leaf_of(id) {
            std::mem::replace(second.as_mut(), Layout::new(id))
        } else if second.is_leaf_of(id) {
            std::mem::replace(first.as_mut(), Layout::new(id))
        } else {
            return first.remove(id) || second.remove(id);
        };
        *self = sibling;
        true
    }

    /// Move the border of the nearest ancestor split on `dir`'s axis by
    /// `cells`. Left/Up shrink the first child, Right/Down grow it.
    pub fn resize_toward(&mut self, id: PaneId, dir: Direction, cells: u16) -> bool {
        let Layout::Split {
            direction,
            ratio,
            rect,
            first,
            second,
        } = self
        else {
            return false;
        };

        let child = if first.contains(id) {
            first
        } else if second.contains(id) {
            second
        } else {
            return false;
        };
        if child.resize_toward(id, dir, cells) {
            return true;
        }
        if *direction != SplitDirection::for_direction(dir) {
            return false;
        }

        let extent = direction.extent(rect);
        if extent == 0 {
            return false;
        }
        let delta = cells as f64 / extent as f64;
        let signed = match dir {
            Direction::Left | Direction::Up => -delta,
            Direction::Right | Direction::Down => delta,
        };
        *ratio = (*ratio + signed).clamp(MIN_RATIO, MAX_RATIO);
        true
    }

    /// Create layout from preset
    pub fn from_preset(preset: LayoutPreset, pane_ids: &[PaneId]) -> Option<Self> {
        match pane_ids {
            [] => None,
            [only] => Some(Layout::new(*only)),
            _ => Some(match preset {
                LayoutPreset::EvenHorizontal => Self::build_even(pane_ids, SplitDirection::Vertical),
                LayoutPreset::EvenVertical => Self::build_even(pane_ids, SplitDirection::Horizontal),
                LayoutPreset::MainHorizontal => Self::main_split(pane_ids, SplitDirection::Horizontal),
                LayoutPreset::MainVertical => Self::main_split(pane_ids, SplitDirection::Vertical),
            }),
        }
    }

    /// Build even layout recursively
    fn build_even(pane_ids: &[PaneId], direction: SplitDirection) -> Self {
        if pane_ids.len() == 1 {
            return Layout::new(pane_ids[0]);
        }

        // Split in half
        let mid = pane_ids.len() / 2;
        let ratio = mid as f64 / pane_ids.len() as f64;

        Layout::Split {
            direction,
            ratio,
            rect: Rect::default(),
            first: Box::new(Self::build_even(&pane_ids[..mid], direction)),
            second: Box::new(Self::build_even(&pane_ids[mid..], direction)),
        }
    }

    /// Main pane takes 60% along `direction`, the rest share the remainder
    /// along the other axis
    fn main_split(pane_ids: &[PaneId], direction: SplitDirection) -> Self {
        let rest_direction = match direction {
            SplitDirection::Horizontal => SplitDirection::Vertical,
            SplitDirection::Vertical => SplitDirection::Horizontal,
        };
        Layout::Split {
            direction,
            ratio: 0.6,
            rect: Rect::default(),
            first: Box::new(Layout::new(pane_ids[0])),
            second: Box::new(Self::build_even(&pane_ids[1..], rest_direction)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn computed(layout: &mut Layout, area: Rect) -> Vec<(PaneId, Rect)> {
        let mut out = Vec::new();
        layout.compute(area, &mut out);
        out
    }

    /// Children extents plus the border cell sum to the parent, recursively
    fn assert_extents_add_up(layout: &Layout) {
        if let Layout::Split {
            direction,
            rect,
            first,
            second,
            ..
        } = layout
        {
            let sum = direction.extent(&first.rect()) + direction.extent(&second.rect()) + 1;
            assert_eq!(sum, direction.extent(rect), "split at {:?}", rect);
            assert_extents_add_up(first);
            assert_extents_add_up(second);
        }
    }

    #[test]
    fn test_vertical_split_of_80_columns() {
        let mut layout = Layout::new(1);
        assert!(layout.split(1, 2, SplitDirection::Vertical));
        let boxes = computed(&mut layout, Rect::new(0, 0, 80, 23));
        assert_eq!(boxes[0], (1, Rect::new(0, 0, 40, 23)));
        assert_eq!(boxes[1], (2, Rect::new(0, 41, 39, 23)));
        assert_eq!(layout.border_rect(), Some(Rect::new(0, 40, 1, 23)));
    }

    #[test]
    fn test_horizontal_split_of_23_rows() {
        let mut layout = Layout::new(1);
        layout.split(1, 2, SplitDirection::Horizontal);
        let boxes = computed(&mut layout, Rect::new(0, 0, 80, 23));
        assert_eq!(boxes[0].1, Rect::new(0, 0, 80, 11));
        assert_eq!(boxes[1].1, Rect::new(12, 0, 80, 11));
        assert_eq!(layout.border_rect(), Some(Rect::new(11, 0, 80, 1)));
    }

    #[test]
    fn test_nested_extents_add_up() {
        let mut layout = Layout::new(1);
        layout.split(1, 2, SplitDirection::Vertical);
        layout.split(2, 3, SplitDirection::Horizontal);
        layout.split(3, 4, SplitDirection::Vertical);
        layout.split(1, 5, SplitDirection::Horizontal);
        for (w, h) in [(80, 23), (81, 24), (37, 9), (200, 51)] {
            computed(&mut layout, Rect::new(0, 0, w, h));
            assert_extents_add_up(&layout);
        }
        assert_eq!(layout.pane_ids(), vec![1, 5, 2, 3, 4]);
    }

    #[test]
    fn test_remove_splices_sibling() {
        let mut layout = Layout::new(1);
        layout.split(1, 2, SplitDirection::Vertical);
        layout.split(2, 3, SplitDirection::Horizontal);

        assert!(matches!(
            layout.find_parent(3),
            Some(Layout::Split { direction: SplitDirection::Horizontal, .. })
        ));
        assert!(layout.find_parent(1).is_some_and(|p| p.pane_ids() == vec![1, 2, 3]));
        assert!(layout.remove(2));
        assert_eq!(layout.pane_ids(), vec![1, 3]);
        assert!(matches!(&layout, Layout::Split { second, .. } if second.is_leaf_of(3)));

        assert!(layout.remove(1));
        assert_eq!(layout, Layout::Leaf { pane: 3, rect: layout.rect() });
        assert!(!layout.remove(3));
    }

    #[test]
    fn test_resize_walks_to_matching_axis() {
        let mut layout = Layout::new(1);
        layout.split(1, 2, SplitDirection::Vertical);
        layout.split(2, 3, SplitDirection::Horizontal);
        computed(&mut layout, Rect::new(0, 0, 80, 23));

        // Pane 3 sits under a horizontal split; Left must reach the root.
        for _ in 0..3 {
            assert!(layout.resize_toward(3, Direction::Left, 1));
            computed(&mut layout, Rect::new(0, 0, 80, 23));
        }
        assert_eq!(layout.border_rect().unwrap().left, 37);
    }

    #[test]
    fn test_ratio_is_clamped() {
        let mut layout = Layout::new(1);
        layout.split(1, 2, SplitDirection::Horizontal);
        computed(&mut layout, Rect::new(0, 0, 80, 20));
        for _ in 0..50 {
            layout.resize_toward(1, Direction::Down, 1);
        }
        let Layout::Split { ratio, .. } = &layout else { unreachable!() };
        assert!((*ratio - MAX_RATIO).abs() < 1e-9);

        // A split with no ancestor on the requested axis is left alone
        assert!(!layout.resize_toward(1, Direction::Left, 1));
    }

    #[test]
    fn test_split_extents_keep_both_children() {
        assert_eq!(split_extents(4, 0.9), (2, 1));
        assert_eq!(split_extents(4, 0.1), (1, 2));
        assert_eq!(split_extents(10, 0.6), (6, 3));
        assert_eq!(split_extents(2, 0.5), (1, 0));
    }

    #[test]
    fn test_presets_keep_pane_order() {
        let ids = [4, 7, 9];
        let mut preset = LayoutPreset::EvenHorizontal;
        for _ in 0..4 {
            let mut layout = Layout::from_preset(preset, &ids).unwrap();
            assert_eq!(layout.pane_ids(), ids.to_vec());
            computed(&mut layout, Rect::new(0, 0, 80, 23));
            assert_extents_add_up(&layout);
            preset = preset.next();
        }
        assert_eq!(preset, LayoutPreset::EvenHorizontal);

        let mut main = Layout::from_preset(LayoutPreset::MainHorizontal, &ids).unwrap();
        let boxes = computed(&mut main, Rect::new(0, 0, 80, 20));
        assert_eq!(boxes[0].1, Rect::new(0, 0, 80, 12));
        assert_eq!(boxes[1].1.top, 13);
        assert_eq!(boxes[2].1.top, 13);
        assert!(Layout::from_preset(LayoutPreset::MainVertical, &[]).is_none());
    }
}
