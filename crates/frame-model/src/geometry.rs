//! Image-space geometry.
//!
//! Points double as 2D vectors: velocities, ray directions and shift deltas
//! all use [`Point2D`].

use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// A 2D point (or vector) in image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const ZERO: Point2D = Point2D { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point2D) -> f64 {
        (*self - *other).length()
    }

    /// Squared distance, for comparisons that do not need the root.
    pub fn distance_sq(&self, other: &Point2D) -> f64 {
        let d = *self - *other;
        d.dot(&d)
    }

    /// Vector length.
    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn dot(&self, other: &Point2D) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Z component of the 3D cross product.
    pub fn cross(&self, other: &Point2D) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Unit vector in the same direction, or `None` for a zero vector.
    pub fn normalized(&self) -> Option<Point2D> {
        let len = self.length();
        if len <= f64::EPSILON {
            return None;
        }
        Some(Point2D::new(self.x / len, self.y / len))
    }

    /// Mean of a set of points, or `None` when empty.
    pub fn centroid<'a>(points: impl IntoIterator<Item = &'a Point2D>) -> Option<Point2D> {
        let mut sum = Point2D::ZERO;
        let mut count = 0usize;
        for p in points {
            sum += *p;
            count += 1;
        }
        if count == 0 {
            return None;
        }
        Some(sum * (1.0 / count as f64))
    }
}

impl Add for Point2D {
    type Output = Point2D;
    fn add(self, rhs: Point2D) -> Point2D {
        Point2D::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point2D {
    fn add_assign(&mut self, rhs: Point2D) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point2D {
    type Output = Point2D;
    fn sub(self, rhs: Point2D) -> Point2D {
        Point2D::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Point2D {
    fn sub_assign(&mut self, rhs: Point2D) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f64> for Point2D {
    type Output = Point2D;
    fn mul(self, rhs: f64) -> Point2D {
        Point2D::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Point2D {
    type Output = Point2D;
    fn neg(self) -> Point2D {
        Point2D::new(-self.x, -self.y)
    }
}

/// A ray: origin plus unit direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    pub origin: Point2D,
    pub direction: Point2D,
}

impl Ray {
    /// Build a ray, normalizing `direction`. Returns `None` for a zero direction.
    pub fn new(origin: Point2D, direction: Point2D) -> Option<Self> {
        Some(Self {
            origin,
            direction: direction.normalized()?,
        })
    }

    /// Point at parameter `t` along the ray.
    pub fn at(&self, t: f64) -> Point2D {
        self.origin + self.direction * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_point2d_distance() {
        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::new(3.0, 4.0);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-9);
        assert!((a.distance_sq(&b) - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_cross_sign() {
        let x = Point2D::new(1.0, 0.0);
        let y = Point2D::new(0.0, 1.0);
        assert_eq!(x.cross(&y), 1.0);
        assert_eq!(y.cross(&x), -1.0);
    }

    #[test]
    fn test_zero_vector_has_no_direction() {
        assert!(Point2D::ZERO.normalized().is_none());
        assert!(Ray::new(Point2D::new(1.0, 1.0), Point2D::ZERO).is_none());
    }

    #[test]
    fn test_centroid() {
        let pts = [Point2D::new(0.0, 0.0), Point2D::new(2.0, 4.0)];
        let c = Point2D::centroid(&pts).unwrap();
        assert!((c.x - 1.0).abs() < 1e-9);
        assert!((c.y - 2.0).abs() < 1e-9);
        assert!(Point2D::centroid(&[] as &[Point2D]).is_none());
    }

    #[test]
    fn test_ray_at() {
        let ray = Ray::new(Point2D::new(10.0, 10.0), Point2D::new(0.0, -5.0)).unwrap();
        let p = ray.at(3.0);
        assert!((p.x - 10.0).abs() < 1e-9);
        assert!((p.y - 7.0).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn normalized_vectors_have_unit_length(x in -1e4f64..1e4, y in -1e4f64..1e4) {
            prop_assume!(x.abs() > 1e-3 || y.abs() > 1e-3);
            let n = Point2D::new(x, y).normalized().unwrap();
            prop_assert!((n.length() - 1.0).abs() < 1e-9);
        }
    }
}
