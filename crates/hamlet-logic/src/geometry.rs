//! 2D geometry in village pixel space.

use serde::{Deserialize, Serialize};

/// Integer pixel coordinate, serialized as a two-element array.
pub type PixelPos = (i32, i32);

/// Continuous 2D position vector
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn from_pixel(pos: PixelPos) -> Self {
        Self::new(pos.0 as f32, pos.1 as f32)
    }

    /// Truncates toward zero, matching how slot keys are quantized.
    pub fn to_pixel(self) -> PixelPos {
        (self.x as i32, self.y as i32)
    }

    pub fn distance_squared(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn distance(&self, other: &Self) -> f32 {
        self.distance_squared(other).sqrt()
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 0.0 {
            Self {
                x: self.x / len,
                y: self.y / len,
            }
        } else {
            Self::ZERO
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn midpoint(&self, other: &Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, scalar: f32) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }
}

/// Axis-aligned rectangle, top-left origin
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn centered_on(center: Vec2, width: f32, height: f32) -> Self {
        Self::new(center.x - width / 2.0, center.y - height / 2.0, width, height)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn set_center(&mut self, center: Vec2) {
        self.x = center.x - self.width / 2.0;
        self.y = center.y - self.height / 2.0;
    }

    /// Half-open containment: left/top edges inside, right/bottom outside.
    pub fn contains(&self, point: &Vec2) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }
}

/// Squared distance between two pixel positions, exact in integer space.
pub fn pixel_distance_squared(a: PixelPos, b: PixelPos) -> i64 {
    let dx = (a.0 - b.0) as i64;
    let dy = (a.1 - b.1) as i64;
    dx * dx + dy * dy
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec2_operations() {
        let a = Vec2::new(1.0, 2.0);
        let b = Vec2::new(4.0, 6.0);

        let sum = a + b;
        assert_eq!(sum.x, 5.0);
        assert_eq!(sum.y, 8.0);

        assert_eq!(a.distance(&b), 5.0);
        assert_eq!((a * 2.0).y, 4.0);
        assert_eq!(a.midpoint(&b), Vec2::new(2.5, 4.0));
    }

    #[test]
    fn test_vec2_normalize() {
        let n = Vec2::new(3.0, 4.0).normalize();
        assert!((n.length() - 1.0).abs() < 0.001);
        assert_eq!(Vec2::ZERO.normalize(), Vec2::ZERO);
    }

    #[test]
    fn test_rect_contains_half_open() {
        let rect = Rect::new(0.0, 0.0, 32.0, 32.0);
        assert!(rect.contains(&Vec2::new(0.0, 0.0)));
        assert!(rect.contains(&Vec2::new(31.9, 31.9)));
        assert!(!rect.contains(&Vec2::new(32.0, 10.0)));
    }

    #[test]
    fn test_rect_recenter() {
        let mut rect = Rect::centered_on(Vec2::new(10.0, 10.0), 4.0, 4.0);
        assert_eq!(rect.x, 8.0);
        rect.set_center(Vec2::new(100.0, 50.0));
        assert_eq!(rect.center(), Vec2::new(100.0, 50.0));
    }

    #[test]
    fn test_pixel_distance() {
        assert_eq!(pixel_distance_squared((0, 0), (3, 4)), 25);
    }
}
