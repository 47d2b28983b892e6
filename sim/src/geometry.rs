//! Small 2D helpers shared by the movement, AI and weapon systems.
//!
//! Every direction vector in the crate is produced by [`normalize`], which
//! refuses to divide by a near-zero length. Coincident positions therefore
//! yield `None` (or a zero vector) instead of NaN.

use crate::components::Position;

/// Minimum length treated as a valid direction.
pub const MIN_DISTANCE: f32 = 1e-4;

/// Normalize `(dx, dy)`, returning `None` when the vector is shorter than
/// [`MIN_DISTANCE`].
#[inline]
pub fn normalize(dx: f32, dy: f32) -> Option<(f32, f32)> {
    let len = (dx * dx + dy * dy).sqrt();
    if len < MIN_DISTANCE || !len.is_finite() {
        None
    } else {
        Some((dx / len, dy / len))
    }
}

/// Unit direction from `from` to `to`, or the zero vector if they coincide.
#[inline]
pub fn direction(from: &Position, to: &Position) -> (f32, f32) {
    normalize(to.x - from.x, to.y - from.y).unwrap_or((0.0, 0.0))
}

/// Facing angle in degrees for a movement/aim vector, with 0 pointing "up".
#[inline]
pub fn heading_degrees(dx: f32, dy: f32) -> f32 {
    dy.atan2(dx).to_degrees() - 90.0
}

/// The point `distance` away from `anchor`, on the side of `toward`.
///
/// When the two points coincide the offset is taken straight up, so the
/// caller always receives a finite position.
pub fn offset_from(anchor: &Position, toward: &Position, distance: f32) -> Position {
    let (ux, uy) = normalize(toward.x - anchor.x, toward.y - anchor.y).unwrap_or((0.0, 1.0));
    Position::new(anchor.x + ux * distance, anchor.y + uy * distance)
}

/// Average of a set of points, `None` for an empty set.
pub fn centroid<'a, I>(points: I) -> Option<Position>
where
    I: IntoIterator<Item = &'a Position>,
{
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut count = 0usize;
    for p in points {
        sum_x += p.x;
        sum_y += p.y;
        count += 1;
    }
    if count == 0 {
        None
    } else {
        Some(Position::new(sum_x / count as f32, sum_y / count as f32))
    }
}
