//! Additional math helpers layered on top of `glam`.

use glam::{Mat3, Vec3};

/// Outer product `a bᵀ`.
pub fn outer(a: Vec3, b: Vec3) -> Mat3 {
    Mat3::from_cols(a * b.x, a * b.y, a * b.z)
}

/// Diagonal entries of a 3x3 matrix.
pub fn diagonal(m: &Mat3) -> Vec3 {
    Vec3::new(m.x_axis.x, m.y_axis.y, m.z_axis.z)
}

/// Component-wise division that leaves components with a zero divisor untouched.
pub fn safe_div(v: Vec3, d: Vec3) -> Vec3 {
    let pick = |n: f32, q: f32| if q.abs() > f32::EPSILON { n / q } else { n };
    Vec3::new(pick(v.x, d.x), pick(v.y, d.y), pick(v.z, d.z))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outer_product_of_unit_axis_is_projector() {
        let p = outer(Vec3::X, Vec3::X);
        assert_eq!(p * Vec3::new(2.0, 3.0, 4.0), Vec3::new(2.0, 0.0, 0.0));
    }
}
