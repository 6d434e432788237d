//! Viewport-driven world streaming.
//!
//! A client only materializes the tiles of its current viewport. When the
//! viewport moves or grows, only the newly exposed strips are requested:
//! the left, top, right and bottom strips are computed independently, so a
//! resize in two directions produces two requests.

use crate::grid::{GridPoint, GridRect};

/// The rectangle of tiles a client has currently materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    rect: GridRect,
}

impl Viewport {
    /// A viewport that has not been placed yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            rect: GridRect::EMPTY,
        }
    }

    /// Current rectangle.
    #[must_use]
    pub const fn rect(&self) -> GridRect {
        self.rect
    }

    /// Move the viewport.
    ///
    /// Returns `None` when `rect` equals the current rectangle. Otherwise the
    /// viewport is updated and the regions that must be loaded are returned
    /// (possibly none, when the viewport only shrank).
    pub fn set(&mut self, rect: GridRect) -> Option<Vec<GridRect>> {
        if rect == self.rect {
            return None;
        }
        let strips = exposed_strips(self.rect, rect);
        self.rect = rect;
        Some(strips)
    }
}

/// Regions of `new` not covered by `old`, as up to four edge strips.
///
/// When `old` is empty or disjoint from `new`, the whole of `new` is one
/// region.
#[must_use]
pub fn exposed_strips(old: GridRect, new: GridRect) -> Vec<GridRect> {
    if new.is_empty() {
        return Vec::new();
    }
    if old.is_empty() || !old.overlaps(&new) {
        return vec![new];
    }

    let mut strips = Vec::with_capacity(4);
    if new.min.x < old.min.x {
        strips.push(GridRect::new(new.min.x, new.min.y, old.min.x, new.max.y));
    }
    if new.min.y < old.min.y {
        strips.push(GridRect::new(new.min.x, new.min.y, new.max.x, old.min.y));
    }
    if new.max.x > old.max.x {
        strips.push(GridRect::new(old.max.x, new.min.y, new.max.x, new.max.y));
    }
    if new.max.y > old.max.y {
        strips.push(GridRect::new(new.min.x, old.max.y, new.max.x, new.max.y));
    }

    strips
        .into_iter()
        .map(|strip| strip.intersect(&new))
        .filter(|strip| !strip.is_empty())
        .collect()
}

/// Screen-to-world mapping for a client camera.
///
/// All functions are pure in the camera offset and tile pixel size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Camera {
    /// Horizontal offset in world pixels.
    pub offset_x: i32,
    /// Vertical offset in world pixels.
    pub offset_y: i32,
    /// Edge length of a tile in pixels.
    pub tile_size: i32,
}

impl Camera {
    /// Camera at the origin.
    #[must_use]
    pub const fn new(tile_size: u32) -> Self {
        Self {
            offset_x: 0,
            offset_y: 0,
            tile_size: tile_size as i32,
        }
    }

    /// Screen pixel to world pixel.
    #[must_use]
    pub const fn screen_to_world(&self, screen_x: i32, screen_y: i32) -> (i32, i32) {
        (screen_x + self.offset_x, screen_y + self.offset_y)
    }

    /// Screen pixel to tile coordinate (flooring, also left of the origin).
    #[must_use]
    pub fn screen_to_world_tiles(&self, screen_x: i32, screen_y: i32) -> GridPoint {
        let (wx, wy) = self.screen_to_world(screen_x, screen_y);
        GridPoint::new(wx.div_euclid(self.tile_size), wy.div_euclid(self.tile_size))
    }

    /// World pixel to screen pixel.
    #[must_use]
    pub const fn world_to_screen(&self, world_x: i32, world_y: i32) -> (i32, i32) {
        (world_x - self.offset_x, world_y - self.offset_y)
    }

    /// Tiles under a `width` x `height` pixel surface.
    ///
    /// The far edge is exclusive; a partially covered tile is included.
    #[must_use]
    pub fn viewport_for_screen(&self, width: u32, height: u32) -> GridRect {
        let min = self.screen_to_world_tiles(0, 0);
        let max = self.screen_to_world_tiles(width as i32 - 1, height as i32 - 1);
        GridRect::new(min.x, min.y, max.x + 1, max.y + 1)
    }

    /// Shift the camera by a pixel delta.
    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.offset_x += dx;
        self.offset_y += dy;
    }
}
