//! Fixed-point math for world positions.
//!
//! Unit positions and paths use fixed-point arithmetic so that the
//! authoritative server and every replica integrate movement to the
//! same bits. Floating-point results can differ between CPUs.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

use crate::grid::GridPoint;

/// Fixed-point number type for all world-space math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Fractional 2D point in world units (one world unit is one tile).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(rename = "X", with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(rename = "Y", with = "fixed_serde")]
    pub y: Fixed,
}

/// Serde support for fixed-point numbers.
///
/// Values travel as their raw bit representation (i64) so that a
/// replica decodes exactly the position the server encoded.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bits.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bits.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Create a vector from whole-number coordinates.
    #[must_use]
    pub fn from_ints(x: i32, y: i32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(y))
    }

    /// World position of the origin corner of a tile.
    #[must_use]
    pub fn from_grid(point: GridPoint) -> Self {
        Self::from_ints(point.x, point.y)
    }

    /// Round each axis to the nearest whole tile (halves away from zero).
    ///
    /// Saturates at the edge of the coordinate range.
    #[must_use]
    pub fn round_to_grid(self) -> GridPoint {
        GridPoint::new(
            self.x.saturating_round().saturating_to_num(),
            self.y.saturating_round().saturating_to_num(),
        )
    }

    /// Squared distance (avoids sqrt for comparisons).
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Euclidean distance.
    #[must_use]
    pub fn distance(self, other: Self) -> Fixed {
        fixed_sqrt(self.distance_squared(other))
    }

    /// Dot product of two vectors.
    #[must_use]
    pub fn dot(self, other: Self) -> Fixed {
        self.x * other.x + self.y * other.y
    }

    /// Multiply both axes by a scalar.
    #[must_use]
    pub fn scale(self, factor: Fixed) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Normalize vector using fixed-point math.
    ///
    /// The zero vector normalizes to zero.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len = fixed_sqrt(self.dot(self));
        if len == Fixed::ZERO {
            return Self::ZERO;
        }

        Self::new(self.x / len, self.y / len)
    }
}

/// Computes the square root of a fixed-point number using binary search.
pub fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }

    let mut low = Fixed::ZERO;
    let mut high = value.max(Fixed::ONE);

    // 64 halvings exhaust the fractional precision for any in-range value.
    for _ in 0..64 {
        let mid = low + (high - low) / Fixed::from_num(2);
        if mid == low {
            break;
        }
        if mid.saturating_mul(mid) <= value {
            low = mid;
        } else {
            high = mid;
        }
    }

    if high.saturating_mul(high) == value {
        return high;
    }
    low
}

impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl std::fmt::Display for Vec2Fixed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec2_distance_squared() {
        let a = Vec2Fixed::from_ints(3, 0);
        let b = Vec2Fixed::from_ints(0, 4);
        // 3² + 4² = 25
        assert_eq!(a.distance_squared(b), Fixed::from_num(25));
        assert_eq!(a.distance(b), Fixed::from_num(5));
    }

    #[test]
    fn test_sqrt_of_perfect_squares_is_exact() {
        assert_eq!(fixed_sqrt(Fixed::ONE), Fixed::ONE);
        assert_eq!(fixed_sqrt(Fixed::from_num(16)), Fixed::from_num(4));
        assert_eq!(fixed_sqrt(Fixed::ZERO), Fixed::ZERO);
    }

    #[test]
    fn test_round_to_grid_halves_away_from_zero() {
        let p = Vec2Fixed::new(Fixed::from_num(1.5), Fixed::from_num(-1.5));
        assert_eq!(p.round_to_grid(), GridPoint::new(2, -2));

        let q = Vec2Fixed::new(Fixed::from_num(2.49), Fixed::from_num(-0.2));
        assert_eq!(q.round_to_grid(), GridPoint::new(2, 0));
    }

    #[test]
    fn test_round_to_grid_saturates_at_range_edge() {
        let far = Vec2Fixed::new(Fixed::MAX, Fixed::MIN);
        assert_eq!(far.round_to_grid(), GridPoint::new(i32::MAX, i32::MIN));
    }

    #[test]
    fn test_vec2_normalize() {
        let norm = Vec2Fixed::from_ints(3, 4).normalize();

        let len_sq = norm.dot(norm);
        let one = Fixed::ONE;
        let epsilon = one / Fixed::from_num(10000);
        assert!(
            (len_sq - one).abs() < epsilon,
            "normalized vector length² should be ~1, got {:?}",
            len_sq
        );

        let ratio_diff = (norm.x * Fixed::from_num(4)) - (norm.y * Fixed::from_num(3));
        assert!(ratio_diff.abs() < epsilon, "direction not preserved");
    }

    #[test]
    fn test_normalize_zero() {
        assert_eq!(Vec2Fixed::ZERO.normalize(), Vec2Fixed::ZERO);
    }

    #[test]
    fn test_fixed_serde_keeps_bits() {
        let p = Vec2Fixed::new(Fixed::from_num(0.1), Fixed::from_num(-7.25));
        let json = serde_json::to_string(&p).unwrap();
        let back: Vec2Fixed = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
        assert!(json.contains("\"X\""));
    }
}
