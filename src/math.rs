use std::fmt::Debug;
use std::ops::{Add, AddAssign, Index, IndexMut, Mul, Neg, Sub};

use nalgebra as na;
use serde::{Deserialize, Serialize};

use crate::error::MathError;

/// Pivots smaller than this are treated as zero during inversion.
const PIVOT_EPSILON: f32 = 1e-8;

/// Element type of the fixed-size vectors. Implemented for `i32` and `f32`.
pub trait Scalar:
    Copy
    + Default
    + PartialEq
    + Debug
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Neg<Output = Self>
{
}

impl Scalar for i32 {}
impl Scalar for f32 {}

/// Vector2 storing 2 scalars. The second pair of names is used for texture coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector2<T> {
    pub x: T,
    pub y: T,
}

/// Vector3 storing 3 scalars.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3<T> {
    pub x: T,
    pub y: T,
    pub z: T,
}

/// Vector4 storing 4 scalars, used for homogeneous coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector4<T> {
    pub x: T,
    pub y: T,
    pub z: T,
    pub w: T,
}

pub type Vec2f = Vector2<f32>;
pub type Vec3i = Vector3<i32>;
pub type Vec3f = Vector3<f32>;
pub type Vec4f = Vector4<f32>;

// Component-wise arithmetic shared by all three vector sizes.
macro_rules! impl_vector_ops {
    ($name:ident, $len:expr, $($field:ident),+) => {
        impl<T: Scalar> $name<T> {
            pub const fn new($($field: T),+) -> Self {
                return Self { $($field),+ };
            }

            /// Dot product of 2 vectors.
            pub fn dot(self, rhs: Self) -> T {
                let mut sum = T::default();
                $(sum = sum + self.$field * rhs.$field;)+
                return sum;
            }

        }

        impl $name<f32> {
            /// Euclidean norm.
            pub fn norm(self) -> f32 {
                return self.dot(self).sqrt();
            }

            /// Unit vector in the same direction.
            /// A zero vector is returned unchanged instead of turning into NaNs.
            pub fn normalize(self) -> Self {
                return self.try_normalize().unwrap_or(self);
            }

            /// Unit vector in the same direction, or an error for a zero-length vector.
            pub fn try_normalize(self) -> Result<Self, MathError> {
                return self.normalized_to(1.0);
            }

            /// Rescales the vector to `length`: `v * (length / |v|)`.
            pub fn normalized_to(self, length: f32) -> Result<Self, MathError> {
                let norm = self.norm();
                if norm == 0.0 || !norm.is_finite() {
                    return Err(MathError::ZeroLength);
                }
                return Ok(self * (length / norm));
            }

            pub fn is_finite(self) -> bool {
                return true $(&& self.$field.is_finite())+;
            }
        }

        impl<T: Scalar> Add for $name<T> {
            type Output = Self;

            fn add(self, rhs: Self) -> Self {
                return Self { $($field: self.$field + rhs.$field),+ };
            }
        }

        impl<T: Scalar> AddAssign for $name<T> {
            fn add_assign(&mut self, rhs: Self) {
                $(self.$field = self.$field + rhs.$field;)+
            }
        }

        impl<T: Scalar> Sub for $name<T> {
            type Output = Self;

            fn sub(self, rhs: Self) -> Self {
                return Self { $($field: self.$field - rhs.$field),+ };
            }
        }

        impl<T: Scalar> Neg for $name<T> {
            type Output = Self;

            fn neg(self) -> Self {
                return Self { $($field: -self.$field),+ };
            }
        }

        impl<T: Scalar> Mul<T> for $name<T> {
            type Output = Self;

            fn mul(self, rhs: T) -> Self {
                return Self { $($field: self.$field * rhs),+ };
            }
        }

        impl Mul<$name<f32>> for f32 {
            type Output = $name<f32>;

            fn mul(self, rhs: $name<f32>) -> $name<f32> {
                return rhs * self;
            }
        }

        impl<T> Index<usize> for $name<T> {
            type Output = T;

            fn index(&self, index: usize) -> &T {
                let fields = [$(&self.$field),+];
                match fields.get(index) {
                    Some(&value) => value,
                    None => panic!(
                        "{} index {} out of range (length {})",
                        stringify!($name), index, $len
                    ),
                }
            }
        }

        impl<T> IndexMut<usize> for $name<T> {
            fn index_mut(&mut self, index: usize) -> &mut T {
                let fields = [$(&mut self.$field),+];
                match fields.into_iter().nth(index) {
                    Some(value) => value,
                    None => panic!(
                        "{} index {} out of range (length {})",
                        stringify!($name), index, $len
                    ),
                }
            }
        }
    };
}

impl_vector_ops!(Vector2, 2, x, y);
impl_vector_ops!(Vector3, 3, x, y, z);
impl_vector_ops!(Vector4, 4, x, y, z, w);

impl<T: Scalar> Vector2<T> {
    /// Horizontal texture coordinate, alias of `x`.
    pub fn u(self) -> T {
        return self.x;
    }

    /// Vertical texture coordinate, alias of `y`.
    pub fn v(self) -> T {
        return self.y;
    }
}

impl<T: Scalar> Vector3<T> {
    /// Cross product of 2 Vector3's, right-hand rule.
    pub fn cross(self, rhs: Self) -> Self {
        return Self {
            x: self.y * rhs.z - self.z * rhs.y,
            y: self.z * rhs.x - self.x * rhs.z,
            z: self.x * rhs.y - self.y * rhs.x,
        };
    }
}

impl Vec3f {
    pub const ZERO: Vec3f = Vec3f::new(0.0, 0.0, 0.0);
    pub const UP: Vec3f = Vec3f::new(0.0, 1.0, 0.0);

    /// Homogeneous point (w = 1).
    pub fn to_point(self) -> Vec4f {
        return Vec4f::new(self.x, self.y, self.z, 1.0);
    }

    /// Homogeneous direction (w = 0).
    pub fn to_direction(self) -> Vec4f {
        return Vec4f::new(self.x, self.y, self.z, 0.0);
    }
}

impl Vec4f {
    /// Perspective divide. Returns `None` when `w` is zero or the result is not finite.
    pub fn to_cartesian(self) -> Option<Vec3f> {
        if self.w.abs() < f32::EPSILON {
            return None;
        }
        let v = Vec3f::new(self.x / self.w, self.y / self.w, self.z / self.w);
        if !v.is_finite() {
            return None;
        }
        return Some(v);
    }

    /// Drops `w` without dividing.
    pub fn xyz(self) -> Vec3f {
        return Vec3f::new(self.x, self.y, self.z);
    }
}

/// Row-major M x N matrix of f32.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix<const M: usize, const N: usize> {
    pub m: [[f32; N]; M],
}

pub type Mat3 = Matrix<3, 3>;
pub type Mat4 = Matrix<4, 4>;

impl<const M: usize, const N: usize> Matrix<M, N> {
    pub const fn from_rows(m: [[f32; N]; M]) -> Self {
        return Self { m };
    }

    pub const fn zeros() -> Self {
        return Self { m: [[0.0; N]; M] };
    }

    pub const fn rows(&self) -> usize {
        return M;
    }

    pub const fn cols(&self) -> usize {
        return N;
    }

    pub fn transpose(&self) -> Matrix<N, M> {
        let mut t = Matrix::<N, M>::zeros();
        for i in 0..M {
            for j in 0..N {
                t.m[j][i] = self.m[i][j];
            }
        }
        return t;
    }

    pub fn is_finite(&self) -> bool {
        return self.m.iter().flatten().all(|value| value.is_finite());
    }
}

impl<const N: usize> Matrix<N, N> {
    pub fn identity() -> Self {
        let mut e = Self::zeros();
        for i in 0..N {
            e.m[i][i] = 1.0;
        }
        return e;
    }

    /// Inverse via Gauss-Jordan elimination on the augmented matrix `[M | I]`.
    ///
    /// Rows are pivoted on the largest remaining entry of each column. A pivot
    /// below `PIVOT_EPSILON` (or a non-finite one) means the matrix is singular
    /// and is reported instead of producing NaNs.
    pub fn inverse(&self) -> Result<Self, MathError> {
        let mut left = self.m;
        let mut right = Self::identity().m;

        // Forward elimination.
        for column in 0..N {
            let mut pivot_row = column;
            for row in column + 1..N {
                if left[row][column].abs() > left[pivot_row][column].abs() {
                    pivot_row = row;
                }
            }
            let pivot = left[pivot_row][column];
            if !pivot.is_finite() || pivot.abs() < PIVOT_EPSILON {
                return Err(MathError::Singular { column });
            }
            left.swap(column, pivot_row);
            right.swap(column, pivot_row);

            for j in 0..N {
                left[column][j] /= pivot;
                right[column][j] /= pivot;
            }
            for row in column + 1..N {
                let coefficient = left[row][column];
                if coefficient == 0.0 {
                    continue;
                }
                for j in 0..N {
                    left[row][j] -= coefficient * left[column][j];
                    right[row][j] -= coefficient * right[column][j];
                }
            }
        }

        // Back substitution.
        for column in (0..N).rev() {
            for row in 0..column {
                let coefficient = left[row][column];
                if coefficient == 0.0 {
                    continue;
                }
                for j in 0..N {
                    left[row][j] -= coefficient * left[column][j];
                    right[row][j] -= coefficient * right[column][j];
                }
            }
        }

        let inverse = Self { m: right };
        if !inverse.is_finite() {
            return Err(MathError::Singular { column: N - 1 });
        }
        return Ok(inverse);
    }
}

impl<const M: usize, const N: usize> Index<usize> for Matrix<M, N> {
    type Output = [f32; N];

    fn index(&self, row: usize) -> &[f32; N] {
        return &self.m[row];
    }
}

impl<const M: usize, const N: usize> IndexMut<usize> for Matrix<M, N> {
    fn index_mut(&mut self, row: usize) -> &mut [f32; N] {
        return &mut self.m[row];
    }
}

// Inner dimensions are checked at compile time through the shared `N`.
impl<const M: usize, const N: usize, const O: usize> Mul<Matrix<N, O>> for Matrix<M, N> {
    type Output = Matrix<M, O>;

    fn mul(self, rhs: Matrix<N, O>) -> Matrix<M, O> {
        let mut product = Matrix::<M, O>::zeros();
        for i in 0..M {
            for j in 0..O {
                let mut sum = 0.0;
                for k in 0..N {
                    sum += self.m[i][k] * rhs.m[k][j];
                }
                product.m[i][j] = sum;
            }
        }
        return product;
    }
}

impl Mul<Vec4f> for Mat4 {
    type Output = Vec4f;

    fn mul(self, v: Vec4f) -> Vec4f {
        let row = |i: usize| {
            self.m[i][0] * v.x + self.m[i][1] * v.y + self.m[i][2] * v.z + self.m[i][3] * v.w
        };
        return Vec4f::new(row(0), row(1), row(2), row(3));
    }
}

impl Mul<Vec3f> for Mat3 {
    type Output = Vec3f;

    fn mul(self, v: Vec3f) -> Vec3f {
        let row = |i: usize| self.m[i][0] * v.x + self.m[i][1] * v.y + self.m[i][2] * v.z;
        return Vec3f::new(row(0), row(1), row(2));
    }
}

impl<const M: usize, const N: usize> From<na::SMatrix<f32, M, N>> for Matrix<M, N> {
    fn from(matrix: na::SMatrix<f32, M, N>) -> Self {
        let mut out = Self::zeros();
        for i in 0..M {
            for j in 0..N {
                out.m[i][j] = matrix[(i, j)];
            }
        }
        return out;
    }
}

impl<const M: usize, const N: usize> From<Matrix<M, N>> for na::SMatrix<f32, M, N> {
    fn from(matrix: Matrix<M, N>) -> Self {
        return na::SMatrix::<f32, M, N>::from_fn(|i, j| matrix.m[i][j]);
    }
}

impl From<na::Vector3<f32>> for Vec3f {
    fn from(v: na::Vector3<f32>) -> Self {
        return Vec3f::new(v.x, v.y, v.z);
    }
}

impl From<Vec3f> for na::Vector3<f32> {
    fn from(v: Vec3f) -> Self {
        return na::Vector3::new(v.x, v.y, v.z);
    }
}

impl From<na::Point3<f32>> for Vec3f {
    fn from(p: na::Point3<f32>) -> Self {
        return Vec3f::new(p.x, p.y, p.z);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, AbsDiffEq};

    impl<const M: usize, const N: usize> AbsDiffEq for Matrix<M, N> {
        type Epsilon = f32;

        fn default_epsilon() -> f32 {
            1e-5
        }

        fn abs_diff_eq(&self, other: &Self, epsilon: f32) -> bool {
            self.m
                .iter()
                .flatten()
                .zip(other.m.iter().flatten())
                .all(|(a, b)| (a - b).abs() <= epsilon)
        }
    }

    impl AbsDiffEq for Vec3f {
        type Epsilon = f32;

        fn default_epsilon() -> f32 {
            1e-5
        }

        fn abs_diff_eq(&self, other: &Self, epsilon: f32) -> bool {
            (self.x - other.x).abs() <= epsilon
                && (self.y - other.y).abs() <= epsilon
                && (self.z - other.z).abs() <= epsilon
        }
    }

    fn sample_matrix() -> Mat4 {
        Mat4::from_rows([
            [2.0, 0.5, -1.0, 3.0],
            [0.0, 1.5, 4.0, -2.0],
            [1.0, -3.0, 0.25, 0.5],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    #[test]
    fn normalize_gives_unit_length() {
        let vectors = [
            Vec3f::new(3.0, 4.0, 0.0),
            Vec3f::new(-0.001, 0.002, 0.0005),
            Vec3f::new(1e3, -2e3, 5e2),
        ];
        for v in vectors {
            assert_abs_diff_eq!(v.normalize().norm(), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn normalized_to_scales_to_requested_length() {
        let v = Vec3f::new(0.0, 2.0, 0.0).normalized_to(5.0).unwrap();
        assert_abs_diff_eq!(v, Vec3f::new(0.0, 5.0, 0.0));
    }

    #[test]
    fn zero_vector_does_not_normalize() {
        assert_eq!(Vec3f::ZERO.try_normalize(), Err(MathError::ZeroLength));
        assert_eq!(Vec3f::ZERO.normalize(), Vec3f::ZERO);
        assert_eq!(Vec2f::new(0.0, 0.0).try_normalize(), Err(MathError::ZeroLength));
    }

    #[test]
    fn cross_is_anti_commutative() {
        let pairs = [
            (Vec3f::new(1.0, 0.0, 0.0), Vec3f::new(0.0, 1.0, 0.0)),
            (Vec3f::new(0.3, -2.0, 5.0), Vec3f::new(-1.5, 0.7, 2.0)),
        ];
        for (a, b) in pairs {
            assert_abs_diff_eq!(a.cross(b), -b.cross(a));
        }
        assert_eq!(
            Vec3i::new(1, 0, 0).cross(Vec3i::new(0, 1, 0)),
            Vec3i::new(0, 0, 1)
        );
    }

    #[test]
    fn cross_is_perpendicular_to_inputs() {
        let a = Vec3f::new(0.3, -2.0, 5.0);
        let b = Vec3f::new(-1.5, 0.7, 2.0);
        let c = a.cross(b);
        assert_abs_diff_eq!(c.dot(a), 0.0, epsilon = 1e-4);
        assert_abs_diff_eq!(c.dot(b), 0.0, epsilon = 1e-4);
    }

    #[test]
    fn index_reads_components_in_order() {
        let mut v = Vector4::new(1, 2, 3, 4);
        assert_eq!([v[0], v[1], v[2], v[3]], [1, 2, 3, 4]);
        v[2] = 7;
        assert_eq!(v.z, 7);
    }

    #[test]
    #[should_panic]
    fn index_out_of_range_panics() {
        let v = Vec2f::new(1.0, 2.0);
        let _ = v[2];
    }

    #[test]
    fn identity_is_neutral() {
        let m = sample_matrix();
        assert_eq!(Mat4::identity() * m, m);
        assert_eq!(m * Mat4::identity(), m);
    }

    #[test]
    fn inverse_times_matrix_is_identity() {
        let m = sample_matrix();
        let inverse = m.inverse().unwrap();
        assert_abs_diff_eq!(inverse * m, Mat4::identity(), epsilon = 1e-4);
        assert_abs_diff_eq!(m * inverse, Mat4::identity(), epsilon = 1e-4);
    }

    #[test]
    fn inverse_needs_row_swaps() {
        // Zero in the first pivot position.
        let m = Mat3::from_rows([[0.0, 1.0, 2.0], [1.0, 0.0, 3.0], [4.0, -3.0, 8.0]]);
        let inverse = m.inverse().unwrap();
        assert_abs_diff_eq!(inverse * m, Mat3::identity(), epsilon = 1e-4);
    }

    #[test]
    fn inverse_matches_nalgebra() {
        let m = sample_matrix();
        let reference: Mat4 = na::Matrix4::<f32>::from(m).try_inverse().unwrap().into();
        assert_abs_diff_eq!(m.inverse().unwrap(), reference, epsilon = 1e-4);
    }

    #[test]
    fn singular_matrix_is_reported() {
        let m = Mat4::from_rows([
            [1.0, 2.0, 3.0, 4.0],
            [2.0, 4.0, 6.0, 8.0],
            [0.0, 1.0, 0.0, 1.0],
            [0.0, 0.0, 1.0, 0.0],
        ]);
        assert!(matches!(m.inverse(), Err(MathError::Singular { .. })));
        assert!(matches!(Mat4::zeros().inverse(), Err(MathError::Singular { column: 0 })));
    }

    #[test]
    fn transpose_swaps_dimensions() {
        let m = Matrix::<2, 3>::from_rows([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        let t = m.transpose();
        assert_eq!((t.rows(), t.cols()), (3, 2));
        assert_eq!(t.m, [[1.0, 4.0], [2.0, 5.0], [3.0, 6.0]]);
        assert_eq!(t.transpose(), m);
    }

    #[test]
    fn rectangular_product_has_outer_dimensions() {
        let a = Matrix::<2, 3>::from_rows([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        let b = Matrix::<3, 1>::from_rows([[1.0], [0.0], [-1.0]]);
        assert_eq!((a * b).m, [[-2.0], [-2.0]]);
    }

    #[test]
    fn matrix_vector_product() {
        let mut translate = Mat4::identity();
        translate[0][3] = 2.0;
        translate[1][3] = -1.0;
        let p = translate * Vec3f::new(1.0, 1.0, 1.0).to_point();
        assert_eq!(p.to_cartesian(), Some(Vec3f::new(3.0, 0.0, 1.0)));
        let d = translate * Vec3f::new(1.0, 1.0, 1.0).to_direction();
        assert_eq!(d.xyz(), Vec3f::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn perspective_divide_rejects_zero_w() {
        assert_eq!(Vec4f::new(1.0, 2.0, 3.0, 0.0).to_cartesian(), None);
        assert_eq!(
            Vec4f::new(2.0, 4.0, 6.0, 2.0).to_cartesian(),
            Some(Vec3f::new(1.0, 2.0, 3.0))
        );
    }
}
