//! Window - A container for panes arranged by one layout tree

use std::collections::HashMap;

use tracing::debug;

use super::layout::{split_extents, Layout, LayoutPreset, Rect, SplitDirection, MIN_SPLIT_EXTENT};
use super::pane::{Pane, PaneId, PaneSpawner};
use crate::core::key::Direction;
use crate::error::{MuxError, Result};

/// Unique identifier for a window within its session
pub type WindowId = u64;

/// Reason for reflow (logged)
#[derive(Debug, Clone, Copy)]
enum ReflowReason {
    Split,
    Close,
    ZoomToggle,
    Resized,
    LayoutChanged,
}

/// A window containing one or more panes
pub struct Window {
    pub id: WindowId,
    pub name: String,
    layout: Layout,
    /// All panes in this window, keyed by id; tree order lives in `layout`
    panes: HashMap<PaneId, Pane>,
    active_pane: PaneId,
    last_active_pane: Option<PaneId>,
    zoomed: bool,
    /// Preset applied by the last relayout, if any
    preset: Option<LayoutPreset>,
    width: u16,
    height: u16,
}

impl Window {
    /// Create a window around a single pane filling `cols` x `rows`
    pub fn new(id: WindowId, name: impl Into<String>, pane: Pane, cols: u16, rows: u16) -> Self {
        let pane_id = pane.id;
        let mut panes = HashMap::new();
        panes.insert(pane_id, pane);

        let mut window = Self {
            id,
            name: name.into(),
            layout: Layout::new(pane_id),
            panes,
            active_pane: pane_id,
            last_active_pane: None,
            zoomed: false,
            preset: None,
            width: cols,
            height: rows,
        };
        window.reflow(ReflowReason::Resized);
        window
    }

    /// Apply the layout to every pane. While zoomed the active pane is
    /// stretched over the whole area; the tree itself is never touched.
    fn reflow(&mut self, reason: ReflowReason) {
        let mut boxes = Vec::with_capacity(self.panes.len());
        self.layout
            .compute(Rect::new(0, 0, self.width, self.height), &mut boxes);

        for (id, rect) in boxes {
            let rect = if self.zoomed && id == self.active_pane {
                self.area()
            } else {
                rect
            };
            if let Some(pane) = self.panes.get_mut(&id) {
                pane.apply_geometry(rect);
            }
        }
        debug!(window = self.id, ?reason, zoomed = self.zoomed, "reflow");
    }

    fn unzoom(&mut self) {
        if self.zoomed {
            self.zoomed = false;
            self.reflow(ReflowReason::ZoomToggle);
        }
    }

    /// Make `id` active, remembering the previous active pane
    fn focus(&mut self, id: PaneId) {
        if id != self.active_pane && self.panes.contains_key(&id) {
            self.last_active_pane = Some(self.active_pane);
            self.active_pane = id;
        }
    }

    /// Whole content area of this window
    pub fn area(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Pane ids in tree order, the canonical cycling order
    pub fn pane_ids(&self) -> Vec<PaneId> {
        self.layout.pane_ids()
    }

    /// Panes in tree order
    pub fn panes(&self) -> Vec<&Pane> {
        self.pane_ids()
            .iter()
            .filter_map(|id| self.panes.get(id))
            .collect()
    }

    pub fn pane_count(&self) -> usize {
        self.panes.len()
    }

    pub fn pane(&self, id: PaneId) -> Option<&Pane> {
        self.panes.get(&id)
    }

    pub fn active_pane_id(&self) -> PaneId {
        self.active_pane
    }

    pub fn last_active_pane_id(&self) -> Option<PaneId> {
        self.last_active_pane
    }

    pub fn active_pane(&self) -> Option<&Pane> {
        self.panes.get(&self.active_pane)
    }

    pub fn active_pane_mut(&mut self) -> Option<&mut Pane> {
        self.panes.get_mut(&self.active_pane)
    }

    /// Position of a pane in tree order
    pub fn pane_index(&self, id: PaneId) -> Option<usize> {
        self.pane_ids().iter().position(|&p| p == id)
    }

    pub fn is_zoomed(&self) -> bool {
        self.zoomed
    }

    /// Split the active pane, returning the new (now active) pane
    pub fn split_pane(&mut self, direction: SplitDirection, spawner: &mut PaneSpawner) -> Result<PaneId> {
        let rect = self
            .layout
            .find_leaf(self.active_pane)
            .map(Layout::rect)
            .unwrap_or_else(|| self.area());
        if direction.extent(&rect) < MIN_SPLIT_EXTENT {
            debug!(window = self.id, ?rect, ?direction, "pane too small to split");
            return Err(MuxError::PaneTooSmall);
        }
        self.unzoom();

        let (cols, rows) = match direction {
            SplitDirection::Horizontal => (rect.width, split_extents(rect.height, 0.5).1),
            SplitDirection::Vertical => (split_extents(rect.width, 0.5).1, rect.height),
        };
        let pane = spawner.spawn(cols, rows);
        let new_id = pane.id;

        if !self.layout.split(self.active_pane, new_id, direction) {
            return Err(MuxError::PaneOutOfRange(self.panes.len()));
        }
        self.panes.insert(new_id, pane);
        self.preset = None;
        self.focus(new_id);
        self.reflow(ReflowReason::Split);
        debug!(window = self.id, pane = new_id, ?direction, "split pane");
        Ok(new_id)
    }

    /// Detach a pane from the tree and the pane map
    fn take_pane(&mut self, id: PaneId) -> Option<Pane> {
        if self.panes.len() <= 1 || !self.panes.contains_key(&id) {
            return None;
        }
        self.unzoom();
        if let Some(Layout::Split { direction, .. }) = self.layout.find_parent(id) {
            debug!(window = self.id, pane = id, ?direction, "collapsing split");
        }
        if !self.layout.remove(id) {
            return None;
        }
        let pane = self.panes.remove(&id)?;

        if self.last_active_pane == Some(id) {
            self.last_active_pane = None;
        }
        if self.active_pane == id {
            if let Some(&first) = self.pane_ids().first() {
                self.active_pane = first;
            }
        }
        self.reflow(ReflowReason::Close);
        Some(pane)
    }

    /// Close a pane. Refused (false) for the window's only pane.
    pub fn close_pane(&mut self, id: PaneId) -> bool {
        let closed = self.take_pane(id).is_some();
        if closed {
            debug!(window = self.id, pane = id, "closed pane");
        }
        closed
    }

    /// Remove the active pane so the caller can host it in a new window
    pub fn break_pane(&mut self) -> Option<Pane> {
        let pane = self.take_pane(self.active_pane)?;
        debug!(window = self.id, pane = pane.id, "broke pane out");
        Some(pane)
    }

    /// Move to the nearest pane whose center lies on the `dir` side
    pub fn navigate_pane(&mut self, dir: Direction) -> bool {
        self.unzoom();
        let Some(active) = self.active_pane() else {
            return false;
        };
        let (ax, ay) = active.rect.center();

        let target = self
            .panes
            .values()
            .filter(|p| p.id != self.active_pane)
            .filter_map(|p| {
                let (cx, cy) = p.rect.center();
                let on_side = match dir {
                    Direction::Left => cx < ax,
                    Direction::Right => cx > ax,
                    Direction::Up => cy < ay,
                    Direction::Down => cy > ay,
                };
                on_side.then(|| (p.id, (cx - ax).abs() + (cy - ay).abs()))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
            .map(|(id, _)| id);

        match target {
            Some(id) => {
                self.focus(id);
                debug!(window = self.id, pane = id, ?dir, "navigated");
                true
            }
            None => false,
        }
    }

    /// Cyclic neighbor of the active pane in tree order
    fn neighbor(&self, forward: bool) -> Option<PaneId> {
        let ids = self.pane_ids();
        if ids.len() <= 1 {
            return None;
        }
        let current = ids.iter().position(|&id| id == self.active_pane).unwrap_or(0);
        let index = if forward {
            (current + 1) % ids.len()
        } else {
            (current + ids.len() - 1) % ids.len()
        };
        Some(ids[index])
    }

    pub fn next_pane(&mut self) -> bool {
        self.step_pane(true)
    }

    pub fn prev_pane(&mut self) -> bool {
        self.step_pane(false)
    }

    fn step_pane(&mut self, forward: bool) -> bool {
        let Some(id) = self.neighbor(forward) else {
            return false;
        };
        self.unzoom();
        self.focus(id);
        true
    }

    /// Toggle back to the previously active pane
    pub fn last_pane(&mut self) -> bool {
        match self.last_active_pane {
            Some(id) if self.panes.contains_key(&id) => {
                self.unzoom();
                self.focus(id);
                true
            }
            _ => false,
        }
    }

    /// Select a pane by its tree-order index
    pub fn select_pane(&mut self, index: usize) -> Result<()> {
        let id = *self
            .pane_ids()
            .get(index)
            .ok_or(MuxError::PaneOutOfRange(index))?;
        self.unzoom();
        self.focus(id);
        Ok(())
    }

    /// Move the nearest border on `dir`'s axis by `amount` cells
    pub fn resize_pane(&mut self, dir: Direction, amount: u16) -> bool {
        self.unzoom();
        if !self.layout.resize_toward(self.active_pane, dir, amount) {
            return false;
        }
        self.reflow(ReflowReason::LayoutChanged);
        true
    }

    /// Toggle zoom on the active pane; a lone pane cannot zoom
    pub fn toggle_zoom(&mut self) -> bool {
        if self.panes.len() <= 1 {
            return false;
        }
        self.zoomed = !self.zoomed;
        self.reflow(ReflowReason::ZoomToggle);
        debug!(window = self.id, zoomed = self.zoomed, "toggled zoom");
        true
    }

    pub fn swap_pane_next(&mut self) -> bool {
        self.swap_pane(true)
    }

    pub fn swap_pane_prev(&mut self) -> bool {
        self.swap_pane(false)
    }

    /// Exchange content sessions with the cyclic neighbor. Focus follows the
    /// content of the active pane.
    fn swap_pane(&mut self, forward: bool) -> bool {
        let Some(other_id) = self.neighbor(forward) else {
            return false;
        };
        self.unzoom();
        let Some(mut other) = self.panes.remove(&other_id) else {
            return false;
        };
        if let Some(active) = self.panes.get_mut(&self.active_pane) {
            active.swap_content(&mut other);
        }
        self.panes.insert(other_id, other);
        self.focus(other_id);
        debug!(window = self.id, with = other_id, forward, "swapped panes");
        true
    }

    /// Rebuild the tree with the next preset in the cycle
    pub fn cycle_layout(&mut self) -> bool {
        let preset = self
            .preset
            .map(LayoutPreset::next)
            .unwrap_or(LayoutPreset::EvenHorizontal);
        self.set_layout(preset)
    }

    /// Rebuild the tree from the current pane order using `preset`
    pub fn set_layout(&mut self, preset: LayoutPreset) -> bool {
        if self.panes.len() <= 1 {
            return false;
        }
        let Some(layout) = Layout::from_preset(preset, &self.pane_ids()) else {
            return false;
        };
        self.zoomed = false;
        self.layout = layout;
        self.preset = Some(preset);
        self.reflow(ReflowReason::LayoutChanged);
        debug!(window = self.id, layout = preset.name(), "applied layout");
        true
    }

    pub fn current_preset(&self) -> Option<LayoutPreset> {
        self.preset
    }

    /// Resize the window's content area
    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.width = cols;
        self.height = rows;
        self.reflow(ReflowReason::Resized);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::echo::EchoSession;
    use crate::core::key::Key;

    fn spawner() -> PaneSpawner {
        PaneSpawner::new(Box::new(|cols, rows| Box::new(EchoSession::new(cols, rows))))
    }

    fn window(spawner: &mut PaneSpawner) -> Window {
        let pane = spawner.spawn(80, 23);
        Window::new(0, "zsh", pane, 80, 23)
    }

    fn rects(window: &Window) -> Vec<(PaneId, Rect)> {
        window.panes().iter().map(|p| (p.id, p.rect)).collect()
    }

    fn assert_extents_add_up(layout: &Layout) {
        if let Layout::Split {
            direction,
            rect,
            first,
            second,
            ..
        } = layout
        {
            assert_eq!(
                direction.extent(&first.rect()) + direction.extent(&second.rect()) + 1,
                direction.extent(rect)
            );
            assert_extents_add_up(first);
            assert_extents_add_up(second);
        }
    }

    #[test]
    fn test_split_then_close_restores_box() {
        let mut spawner = spawner();
        let mut w = window(&mut spawner);
        let original = rects(&w);

        let new = w.split_pane(SplitDirection::Vertical, &mut spawner).unwrap();
        assert_eq!(w.active_pane_id(), new);
        assert_eq!(w.pane(new).unwrap().rect, Rect::new(0, 41, 39, 23));
        assert_eq!(w.pane(new).unwrap().content_size(), (39, 23));

        assert!(w.close_pane(new));
        assert_eq!(rects(&w), original);
        assert!(w.pane_ids().contains(&w.active_pane_id()));
        assert!(!w.close_pane(w.active_pane_id()));
    }

    #[test]
    fn test_split_rejects_small_pane() {
        let mut spawner = spawner();
        let pane = spawner.spawn(3, 10);
        let mut w = Window::new(0, "zsh", pane, 3, 10);
        assert_eq!(
            w.split_pane(SplitDirection::Vertical, &mut spawner),
            Err(MuxError::PaneTooSmall)
        );
        assert_eq!(w.pane_count(), 1);
        assert!(w.split_pane(SplitDirection::Horizontal, &mut spawner).is_ok());
    }

    #[test]
    fn test_mutations_keep_invariants() {
        let mut spawner = spawner();
        let mut w = window(&mut spawner);
        w.split_pane(SplitDirection::Vertical, &mut spawner).unwrap();
        w.split_pane(SplitDirection::Horizontal, &mut spawner).unwrap();
        w.prev_pane();
        w.split_pane(SplitDirection::Vertical, &mut spawner).unwrap();
        w.resize_pane(Direction::Down, 2);
        w.swap_pane_next();
        w.resize(101, 37);
        assert_extents_add_up(w.layout());
        assert!(w.pane_ids().contains(&w.active_pane_id()));

        w.close_pane(w.active_pane_id());
        assert_extents_add_up(w.layout());
        assert!(w.pane_ids().contains(&w.active_pane_id()));
        assert_eq!(w.pane_count(), 3);
    }

    #[test]
    fn test_zoom_twice_restores_geometry() {
        let mut spawner = spawner();
        let mut w = window(&mut spawner);
        w.split_pane(SplitDirection::Horizontal, &mut spawner).unwrap();
        w.split_pane(SplitDirection::Vertical, &mut spawner).unwrap();
        let before = rects(&w);

        assert!(w.toggle_zoom());
        assert_eq!(w.active_pane().unwrap().rect, w.area());
        assert!(w.toggle_zoom());
        assert_eq!(rects(&w), before);
    }

    #[test]
    fn test_structural_ops_unzoom() {
        let mut spawner = spawner();
        let mut w = window(&mut spawner);
        assert!(!w.toggle_zoom());
        w.split_pane(SplitDirection::Vertical, &mut spawner).unwrap();
        w.toggle_zoom();
        assert!(w.navigate_pane(Direction::Left));
        assert!(!w.is_zoomed());

        w.toggle_zoom();
        w.split_pane(SplitDirection::Horizontal, &mut spawner).unwrap();
        assert!(!w.is_zoomed());
    }

    #[test]
    fn test_navigate_by_centers() {
        let mut spawner = spawner();
        let mut w = window(&mut spawner);
        let left = w.active_pane_id();
        let top_right = w.split_pane(SplitDirection::Vertical, &mut spawner).unwrap();
        let bottom_right = w.split_pane(SplitDirection::Horizontal, &mut spawner).unwrap();

        assert!(w.navigate_pane(Direction::Up));
        assert_eq!(w.active_pane_id(), top_right);
        assert!(!w.navigate_pane(Direction::Right));
        assert!(!w.navigate_pane(Direction::Up));
        assert!(w.navigate_pane(Direction::Left));
        assert_eq!(w.active_pane_id(), left);
        assert_eq!(w.last_active_pane_id(), Some(top_right));

        assert!(w.last_pane());
        assert_eq!(w.active_pane_id(), top_right);
        assert!(w.navigate_pane(Direction::Down));
        assert_eq!(w.active_pane_id(), bottom_right);
    }

    #[test]
    fn test_next_prev_cycle_tree_order() {
        let mut spawner = spawner();
        let mut w = window(&mut spawner);
        let first = w.active_pane_id();
        let second = w.split_pane(SplitDirection::Vertical, &mut spawner).unwrap();
        assert!(w.next_pane());
        assert_eq!(w.active_pane_id(), first);
        assert!(w.prev_pane());
        assert_eq!(w.active_pane_id(), second);
        assert_eq!(w.pane_index(second), Some(1));
        assert_eq!(w.select_pane(5), Err(MuxError::PaneOutOfRange(5)));
        assert!(w.select_pane(0).is_ok());
        assert_eq!(w.active_pane_id(), first);
    }

    #[test]
    fn test_resize_left_moves_border() {
        let mut spawner = spawner();
        let mut w = window(&mut spawner);
        let right = w.split_pane(SplitDirection::Vertical, &mut spawner).unwrap();
        for _ in 0..3 {
            assert!(w.resize_pane(Direction::Left, 1));
        }
        assert_eq!(w.pane(right).unwrap().rect, Rect::new(0, 38, 42, 23));
        assert!(!w.resize_pane(Direction::Up, 1));
    }

    #[test]
    fn test_swap_moves_content_not_geometry() {
        let mut spawner = spawner();
        let mut w = window(&mut spawner);
        let left = w.active_pane_id();
        for c in "left".chars() {
            w.active_pane_mut().unwrap().feed_key(&Key::Char(c));
        }
        let right = w.split_pane(SplitDirection::Vertical, &mut spawner).unwrap();
        w.select_pane(0).unwrap();
        let before = rects(&w);

        assert!(w.swap_pane_next());
        assert_eq!(rects(&w), before);
        assert_eq!(w.active_pane_id(), right);
        let frame = w.pane(right).unwrap().render_frame();
        assert_eq!(frame.row_text(0).trim_end(), "$ left");
        assert_eq!(frame.cols, 39);
        assert_eq!(w.pane(left).unwrap().content_size(), (40, 23));
    }

    #[test]
    fn test_break_pane_returns_active() {
        let mut spawner = spawner();
        let mut w = window(&mut spawner);
        assert!(w.break_pane().is_none());
        let new = w.split_pane(SplitDirection::Horizontal, &mut spawner).unwrap();
        let pane = w.break_pane().unwrap();
        assert_eq!(pane.id, new);
        assert_eq!(w.pane_count(), 1);
        assert_eq!(w.active_pane().unwrap().rect, w.area());
    }

    #[test]
    fn test_cycle_layout_round_robin() {
        let mut spawner = spawner();
        let mut w = window(&mut spawner);
        assert!(!w.cycle_layout());
        w.split_pane(SplitDirection::Vertical, &mut spawner).unwrap();
        w.split_pane(SplitDirection::Horizontal, &mut spawner).unwrap();
        let order = w.pane_ids();

        let mut seen = Vec::new();
        for _ in 0..5 {
            assert!(w.cycle_layout());
            assert_eq!(w.pane_ids(), order);
            assert_extents_add_up(w.layout());
            seen.push(w.current_preset().unwrap());
        }
        assert_eq!(seen[0], LayoutPreset::EvenHorizontal);
        assert_eq!(seen[4], LayoutPreset::EvenHorizontal);

        w.set_layout(LayoutPreset::EvenVertical);
        let heights: Vec<u16> = w.panes().iter().map(|p| p.rect.height).collect();
        assert_eq!(heights.iter().sum::<u16>() + 2, 23);
    }
}
