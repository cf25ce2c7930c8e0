//! Geometry primitives shared by collision detection and resolution
//!
//! Everything here is total: degenerate input (zero radius, zero-size rect)
//! yields a no-collision answer instead of an error.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle (top-left corner + size)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        Vec2::new(self.x + self.w, self.y + self.h)
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    /// True if the rect has positive area
    pub fn is_valid(&self) -> bool {
        self.w > 0.0 && self.h > 0.0 && self.x.is_finite() && self.y.is_finite()
    }

    /// Inclusive point containment
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x <= self.x + self.w && p.y >= self.y && p.y <= self.y + self.h
    }

    /// True if `inner` lies completely inside this rect
    pub fn contains_rect(&self, inner: &Rect) -> bool {
        self.contains(inner.min()) && self.contains(inner.max())
    }
}

/// Closest point on (or inside) a rect to `p`
#[inline]
pub fn closest_point_on_rect(p: Vec2, rect: &Rect) -> Vec2 {
    p.clamp(rect.min(), rect.max().max(rect.min()))
}

/// Circle vs axis-aligned rect overlap test
pub fn circle_intersects_rect(center: Vec2, radius: f32, rect: &Rect) -> bool {
    if radius <= 0.0 || !rect.is_valid() {
        return false;
    }
    let closest = closest_point_on_rect(center, rect);
    center.distance_squared(closest) < radius * radius
}

/// Circle vs circle overlap test
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let reach = ra + rb;
    reach > 0.0 && a.distance_squared(b) < reach * reach
}

/// Contact normal (pointing from the rect toward the circle) and penetration depth
///
/// Returns `None` when the circle does not overlap the rect. If the circle
/// center sits inside the rect the push goes through the nearest face.
pub fn circle_rect_contact(center: Vec2, radius: f32, rect: &Rect) -> Option<(Vec2, f32)> {
    if !circle_intersects_rect(center, radius, rect) {
        return None;
    }

    let closest = closest_point_on_rect(center, rect);
    let offset = center - closest;
    let dist = offset.length();

    if dist > f32::EPSILON {
        return Some((offset / dist, radius - dist));
    }

    // Center inside the rect: exit through the nearest face
    let left = center.x - rect.x;
    let right = rect.x + rect.w - center.x;
    let top = center.y - rect.y;
    let bottom = rect.y + rect.h - center.y;

    let mut best = (Vec2::NEG_X, left);
    for candidate in [(Vec2::X, right), (Vec2::NEG_Y, top), (Vec2::Y, bottom)] {
        if candidate.1 < best.1 {
            best = candidate;
        }
    }
    Some((best.0, best.1 + radius))
}
