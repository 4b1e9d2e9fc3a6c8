mod bounding_box;
mod ray;
mod transform;
mod triangle;
mod vec4;

pub use bounding_box::*;
pub use ray::*;
pub use transform::*;
pub use triangle::*;
pub use vec4::*;

/// Constraint a value to lie between two further values
///
/// # Arguments
/// * `x` - The value to constraint.
/// * `min_value` - The lower bound for the value constraint.
/// * `max_value` - The upper bound for the value constraint.
#[inline]
pub fn clamp<T>(x: T, min_value: T, max_value: T) -> T
where
    T: PartialOrd,
{
    if x < min_value {
        min_value
    } else if x > max_value {
        max_value
    } else {
        x
    }
}
