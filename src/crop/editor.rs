//! Pointer-driven crop editor: a three-state interaction machine over a
//! single crop rectangle in canvas pixel coordinates.

use crate::config::{EditorOptions, HandleLayout};

/// A grab point on the crop rectangle. Resizing from a corner or edge keeps
/// the opposite corner or edge fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    Body,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Top,
    Bottom,
    Left,
    Right,
}

impl Handle {
    pub const CORNERS: [Handle; 4] = [
        Handle::TopLeft,
        Handle::TopRight,
        Handle::BottomLeft,
        Handle::BottomRight,
    ];

    pub const EDGES: [Handle; 4] = [Handle::Top, Handle::Bottom, Handle::Left, Handle::Right];

    /// Grab points active under a handle layout.
    pub fn for_layout(layout: HandleLayout) -> &'static [Handle] {
        match layout {
            HandleLayout::SingleCorner => &[Handle::BottomRight],
            HandleLayout::EightHandle => &[
                Handle::TopLeft,
                Handle::TopRight,
                Handle::BottomLeft,
                Handle::BottomRight,
                Handle::Top,
                Handle::Bottom,
                Handle::Left,
                Handle::Right,
            ],
        }
    }

    /// Marker position on the rectangle: corners at corners, edges at edge
    /// midpoints. `Body` has no marker.
    pub fn marker(&self, rect: &CropRect) -> Option<(f32, f32)> {
        let cx = rect.x + rect.width / 2.0;
        let cy = rect.y + rect.height / 2.0;
        match self {
            Handle::Body => None,
            Handle::TopLeft => Some((rect.x, rect.y)),
            Handle::TopRight => Some((rect.right(), rect.y)),
            Handle::BottomLeft => Some((rect.x, rect.bottom())),
            Handle::BottomRight => Some((rect.right(), rect.bottom())),
            Handle::Top => Some((cx, rect.y)),
            Handle::Bottom => Some((cx, rect.bottom())),
            Handle::Left => Some((rect.x, cy)),
            Handle::Right => Some((rect.right(), cy)),
        }
    }
}

/// The user-adjustable crop window, in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl CropRect {
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Interaction {
    Idle,
    Dragging { grab_x: f32, grab_y: f32 },
    Resizing { handle: Handle },
}

/// Crop interaction state machine. All mutations clamp the rectangle back
/// into the canvas and above the minimum size before returning, so the
/// invariants hold after every call.
#[derive(Debug, Clone)]
pub struct CropEditor {
    options: EditorOptions,
    canvas_w: f32,
    canvas_h: f32,
    rect: CropRect,
    interaction: Interaction,
}

impl CropEditor {
    pub fn new(options: EditorOptions, canvas_w: f32, canvas_h: f32) -> Self {
        let rect = Self::default_rect(&options, canvas_w, canvas_h);
        Self {
            options,
            canvas_w,
            canvas_h,
            rect,
            interaction: Interaction::Idle,
        }
    }

    /// Centered starting rectangle: 40% of the canvas width, capped at 150px.
    fn default_rect(options: &EditorOptions, canvas_w: f32, canvas_h: f32) -> CropRect {
        let size = (canvas_w * 0.4)
            .min(150.0)
            .max(options.min_crop_size)
            .min(canvas_w)
            .min(canvas_h);
        CropRect {
            x: (canvas_w - size) / 2.0,
            y: (canvas_h - size) / 2.0,
            width: size,
            height: size,
        }
    }

    pub fn rect(&self) -> CropRect {
        self.rect
    }

    pub fn canvas_size(&self) -> (f32, f32) {
        (self.canvas_w, self.canvas_h)
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    /// Handle currently driving the interaction; `None` when idle.
    pub fn active_handle(&self) -> Option<Handle> {
        match self.interaction {
            Interaction::Idle => None,
            Interaction::Dragging { .. } => Some(Handle::Body),
            Interaction::Resizing { handle } => Some(handle),
        }
    }

    /// Replace the rectangle with the centered default and drop any gesture.
    pub fn reset(&mut self) {
        self.rect = Self::default_rect(&self.options, self.canvas_w, self.canvas_h);
        self.interaction = Interaction::Idle;
    }

    /// Adopt an externally chosen rectangle, clamped to the invariants.
    pub fn set_rect(&mut self, rect: CropRect) {
        let min = self.options.min_crop_size;
        let mut width = rect.width.max(min).min(self.canvas_w);
        let mut height = rect.height.max(min).min(self.canvas_h);
        if self.options.layout == HandleLayout::SingleCorner {
            let size = width.min(height);
            width = size;
            height = size;
        }
        self.rect = CropRect {
            x: rect.x.max(0.0).min(self.canvas_w - width),
            y: rect.y.max(0.0).min(self.canvas_h - height),
            width,
            height,
        };
    }

    /// Grab points active under the configured layout.
    pub fn active_handles(&self) -> &'static [Handle] {
        Handle::for_layout(self.options.layout)
    }

    /// Resolve a pointer position to a grab point. Precedence is corners,
    /// then edges, then the rectangle body; the corner regions would
    /// otherwise be shadowed near the corners.
    pub fn hit_test(&self, px: f32, py: f32) -> Option<Handle> {
        let half = self.options.handle_size / 2.0;
        let handles = self.active_handles();

        for handle in handles
            .iter()
            .copied()
            .filter(|h| Handle::CORNERS.contains(h))
        {
            if let Some((cx, cy)) = handle.marker(&self.rect) {
                if (px - cx).abs() <= half && (py - cy).abs() <= half {
                    return Some(handle);
                }
            }
        }

        for handle in handles
            .iter()
            .copied()
            .filter(|h| Handle::EDGES.contains(h))
        {
            if self.edge_region_contains(handle, px, py, half) {
                return Some(handle);
            }
        }

        if self.rect.contains(px, py) {
            return Some(Handle::Body);
        }
        None
    }

    /// Edge hit region: the edge span minus the corner squares, with the
    /// same thickness as a corner region.
    fn edge_region_contains(&self, handle: Handle, px: f32, py: f32, half: f32) -> bool {
        let r = &self.rect;
        let along_x = px >= r.x + half && px <= r.right() - half;
        let along_y = py >= r.y + half && py <= r.bottom() - half;
        match handle {
            Handle::Top => along_x && (py - r.y).abs() <= half,
            Handle::Bottom => along_x && (py - r.bottom()).abs() <= half,
            Handle::Left => along_y && (px - r.x).abs() <= half,
            Handle::Right => along_y && (px - r.right()).abs() <= half,
            _ => false,
        }
    }

    /// Pointer pressed. Returns true when the editor state changed and the
    /// preview should repaint.
    pub fn pointer_down(&mut self, px: f32, py: f32) -> bool {
        match self.hit_test(px, py) {
            Some(Handle::Body) => {
                self.interaction = Interaction::Dragging {
                    grab_x: px - self.rect.x,
                    grab_y: py - self.rect.y,
                };
                true
            }
            Some(handle) => {
                self.interaction = Interaction::Resizing { handle };
                true
            }
            None => false,
        }
    }

    /// Pointer moved. No-op while idle.
    pub fn pointer_move(&mut self, px: f32, py: f32) -> bool {
        match self.interaction {
            Interaction::Idle => false,
            Interaction::Dragging { grab_x, grab_y } => {
                self.rect.x = (px - grab_x).max(0.0).min(self.canvas_w - self.rect.width);
                self.rect.y = (py - grab_y).max(0.0).min(self.canvas_h - self.rect.height);
                true
            }
            Interaction::Resizing { handle } => {
                self.apply_resize(handle, px, py);
                true
            }
        }
    }

    /// Pointer released or left the canvas.
    pub fn pointer_up(&mut self) -> bool {
        if self.interaction == Interaction::Idle {
            return false;
        }
        self.interaction = Interaction::Idle;
        true
    }

    fn apply_resize(&mut self, handle: Handle, px: f32, py: f32) {
        if self.options.layout == HandleLayout::SingleCorner {
            self.resize_square(px, py);
            return;
        }

        let min = self.options.min_crop_size;
        let r = self.rect;

        // Horizontal axis: the opposite vertical edge is the anchor.
        match handle {
            Handle::TopLeft | Handle::Left | Handle::BottomLeft => {
                let anchor = r.right();
                let width = (anchor - px).max(min).min(anchor);
                self.rect.x = anchor - width;
                self.rect.width = width;
            }
            Handle::TopRight | Handle::Right | Handle::BottomRight => {
                let anchor = r.x;
                let width = (px - anchor).max(min).min(self.canvas_w - anchor);
                self.rect.width = width;
            }
            _ => {}
        }

        // Vertical axis: the opposite horizontal edge is the anchor.
        match handle {
            Handle::TopLeft | Handle::Top | Handle::TopRight => {
                let anchor = r.bottom();
                let height = (anchor - py).max(min).min(anchor);
                self.rect.y = anchor - height;
                self.rect.height = height;
            }
            Handle::BottomLeft | Handle::Bottom | Handle::BottomRight => {
                let anchor = r.y;
                let height = (py - anchor).max(min).min(self.canvas_h - anchor);
                self.rect.height = height;
            }
            _ => {}
        }
    }

    /// Square layout resizes from the bottom-right only; the top-left corner
    /// is the anchor and the shorter pointer axis wins.
    fn resize_square(&mut self, px: f32, py: f32) {
        let r = self.rect;
        let candidate = (px - r.x).min(py - r.y);
        let limit = (self.canvas_w - r.x).min(self.canvas_h - r.y);
        let size = candidate.max(self.options.min_crop_size).min(limit);
        self.rect.width = size;
        self.rect.height = size;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor(layout: HandleLayout) -> CropEditor {
        let options = EditorOptions {
            layout,
            ..EditorOptions::default()
        };
        CropEditor::new(options, 400.0, 300.0)
    }

    #[test]
    fn default_rect_is_centered_square() {
        let ed = editor(HandleLayout::SingleCorner);
        let r = ed.rect();
        // min(150, 400*0.4) = 150, centered: x = 125, y = 75
        assert_eq!((r.x, r.y, r.width, r.height), (125.0, 75.0, 150.0, 150.0));
    }

    #[test]
    fn pointer_down_outside_rect_stays_idle() {
        let mut ed = editor(HandleLayout::SingleCorner);
        assert!(!ed.pointer_down(10.0, 10.0));
        assert_eq!(ed.active_handle(), None);
        assert!(!ed.pointer_move(50.0, 50.0));
    }

    #[test]
    fn body_press_starts_drag_and_release_ends_it() {
        let mut ed = editor(HandleLayout::SingleCorner);
        assert!(ed.pointer_down(200.0, 150.0));
        assert_eq!(ed.active_handle(), Some(Handle::Body));
        assert!(ed.pointer_up());
        assert_eq!(ed.active_handle(), None);
    }

    #[test]
    fn drag_preserves_grab_offset() {
        let mut ed = editor(HandleLayout::SingleCorner);
        ed.pointer_down(135.0, 85.0);
        ed.pointer_move(155.0, 105.0);
        let r = ed.rect();
        assert_eq!((r.x, r.y), (145.0, 95.0));
    }

    #[test]
    fn corner_beats_body_in_hit_test() {
        let ed = editor(HandleLayout::SingleCorner);
        // (270, 220) is inside the rect body and inside the bottom-right
        // corner region (corner at 275, 225).
        assert_eq!(ed.hit_test(270.0, 220.0), Some(Handle::BottomRight));
    }

    #[test]
    fn corner_beats_edge_in_hit_test() {
        let ed = editor(HandleLayout::EightHandle);
        let r = ed.rect();
        assert_eq!(ed.hit_test(r.x, r.y), Some(Handle::TopLeft));
        assert_eq!(
            ed.hit_test(r.x + r.width / 2.0, r.y),
            Some(Handle::Top),
            "edge midpoint must resolve to the edge handle"
        );
    }

    #[test]
    fn square_resize_clamps_to_canvas_and_keeps_anchor() {
        let mut ed = editor(HandleLayout::SingleCorner);
        ed.pointer_down(275.0, 225.0);
        // Drag the corner past the canvas: limit = min(400-125, 300-75) = 225.
        ed.pointer_move(500.0, 500.0);
        let r = ed.rect();
        assert_eq!((r.x, r.y), (125.0, 75.0));
        assert_eq!(r.width, 225.0);
        assert_eq!(r.height, 225.0);
    }

    #[test]
    fn square_resize_respects_minimum() {
        let mut ed = editor(HandleLayout::SingleCorner);
        ed.pointer_down(275.0, 225.0);
        ed.pointer_move(126.0, 76.0);
        let r = ed.rect();
        assert_eq!(r.width, 50.0);
        assert_eq!(r.height, 50.0);
    }

    #[test]
    fn top_left_resize_anchors_bottom_right() {
        let mut ed = editor(HandleLayout::EightHandle);
        let before = ed.rect();
        ed.pointer_down(before.x, before.y);
        ed.pointer_move(before.x - 30.0, before.y - 20.0);
        let r = ed.rect();
        assert_eq!(r.right(), before.right());
        assert_eq!(r.bottom(), before.bottom());
        assert_eq!(r.width, before.width + 30.0);
        assert_eq!(r.height, before.height + 20.0);
    }

    #[test]
    fn edge_resize_leaves_orthogonal_axis_untouched() {
        let mut ed = editor(HandleLayout::EightHandle);
        let before = ed.rect();
        ed.pointer_down(before.x + before.width / 2.0, before.y);
        ed.pointer_move(999.0, before.y - 25.0);
        let r = ed.rect();
        assert_eq!(r.x, before.x);
        assert_eq!(r.width, before.width);
        assert_eq!(r.bottom(), before.bottom());
        assert_eq!(r.height, before.height + 25.0);
    }

    #[test]
    fn set_rect_clamps_and_squares() {
        let mut ed = editor(HandleLayout::SingleCorner);
        ed.set_rect(CropRect {
            x: -50.0,
            y: 1000.0,
            width: 500.0,
            height: 80.0,
        });
        let r = ed.rect();
        assert_eq!((r.width, r.height), (80.0, 80.0));
        assert_eq!(r.x, 0.0);
        assert_eq!(r.y, 300.0 - 80.0);
    }
}
