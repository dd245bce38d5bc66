use core::ops::{Index, Mul};

use bytemuck::{Pod, Zeroable};

use super::{Vec3, Vec4};

/// Determinants at or below this magnitude are treated as singular.
pub const INVERT_EPSILON: f32 = 0.0001;

/// Row-major 2x2 matrix.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Mat2 {
    pub m: [[f32; 2]; 2],
}

impl Mat2 {
    pub const fn from_rows(m: [[f32; 2]; 2]) -> Self {
        Self { m }
    }

    pub fn transpose(self) -> Self {
        Self::from_rows(core::array::from_fn(|i| core::array::from_fn(|j| self.m[j][i])))
    }
}

/// Row-major 3x3 matrix.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Mat3 {
    pub m: [[f32; 3]; 3],
}

impl Mat3 {
    pub const fn from_rows(m: [[f32; 3]; 3]) -> Self {
        Self { m }
    }

    pub fn transpose(self) -> Self {
        Self::from_rows(core::array::from_fn(|i| core::array::from_fn(|j| self.m[j][i])))
    }
}

/// Row-major 4x4 matrix.
///
/// Vectors are rows and multiply on the left (`v * M`), so the translation lives in
/// row 3. The memory layout is 16 contiguous `f32`s, which a WGSL `mat4x4<f32>` reads
/// as the transpose; shaders therefore compute `m * v`.
///
/// `rotate`, `translate` and `scale` post-multiply: `m.translate(..)` is `m * T`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Mat4 {
    pub m: [[f32; 4]; 4],
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4::from_rows([
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]);

    pub const ZERO: Mat4 = Mat4::from_rows([[0.0; 4]; 4]);

    #[inline]
    pub const fn from_rows(m: [[f32; 4]; 4]) -> Self {
        Self { m }
    }

    #[inline]
    pub const fn identity() -> Self {
        Self::IDENTITY
    }

    pub fn from_translation(x: f32, y: f32, z: f32) -> Self {
        let mut r = Self::IDENTITY;
        r.m[3][0] = x;
        r.m[3][1] = y;
        r.m[3][2] = z;
        r
    }

    pub fn from_scale(x: f32, y: f32, z: f32) -> Self {
        let mut r = Self::IDENTITY;
        r.m[0][0] = x;
        r.m[1][1] = y;
        r.m[2][2] = z;
        r
    }

    /// Rotation of `rad` radians about `axis` (normalized here).
    ///
    /// A zero axis yields the identity.
    pub fn from_axis_angle(rad: f32, axis: Vec3) -> Self {
        if axis.length() == 0.0 {
            return Self::IDENTITY;
        }

        let (s, c) = rad.sin_cos();
        let k = 1.0 - c;
        let Vec3 { x, y, z } = axis.normalize();
        let (xk, yk, zk) = (x * k, y * k, z * k);

        let mut r = Self::IDENTITY;
        r.m[0][0] = x * xk + c;
        r.m[0][1] = y * xk + z * s;
        r.m[0][2] = z * xk - y * s;

        r.m[1][0] = x * yk - z * s;
        r.m[1][1] = y * yk + c;
        r.m[1][2] = z * yk + x * s;

        r.m[2][0] = x * zk + y * s;
        r.m[2][1] = y * zk - x * s;
        r.m[2][2] = z * zk + c;
        r
    }

    /// Row-major product `self * rhs`.
    pub fn multiply(&self, rhs: &Mat4) -> Mat4 {
        let a = &self.m;
        let b = &rhs.m;
        Mat4::from_rows(core::array::from_fn(|i| {
            core::array::from_fn(|j| {
                a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j] + a[i][3] * b[3][j]
            })
        }))
    }

    #[inline]
    pub fn rotate(self, rad: f32, axis: Vec3) -> Mat4 {
        self * Mat4::from_axis_angle(rad, axis)
    }

    #[inline]
    pub fn translate(self, x: f32, y: f32, z: f32) -> Mat4 {
        self * Mat4::from_translation(x, y, z)
    }

    #[inline]
    pub fn scale(self, x: f32, y: f32, z: f32) -> Mat4 {
        self * Mat4::from_scale(x, y, z)
    }

    pub fn transpose(self) -> Mat4 {
        Mat4::from_rows(core::array::from_fn(|i| core::array::from_fn(|j| self.m[j][i])))
    }

    /// OpenGL-style orthographic projection.
    pub fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
        let mut r = Self::ZERO;
        r.m[0][0] = 2.0 / (right - left);
        r.m[1][1] = 2.0 / (top - bottom);
        r.m[2][2] = -2.0 / (far - near);
        r.m[3][0] = -(right + left) / (right - left);
        r.m[3][1] = -(top + bottom) / (top - bottom);
        r.m[3][2] = -(far + near) / (far - near);
        r.m[3][3] = 1.0;
        r
    }

    /// OpenGL-style perspective frustum.
    pub fn frustum(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
        let mut r = Self::ZERO;
        r.m[0][0] = (2.0 * near) / (right - left);
        r.m[1][1] = (2.0 * near) / (top - bottom);
        r.m[2][0] = (right + left) / (right - left);
        r.m[2][1] = (top + bottom) / (top - bottom);
        r.m[2][2] = -(far + near) / (far - near);
        r.m[2][3] = -1.0;
        r.m[3][2] = (-2.0 * far * near) / (far - near);
        r
    }

    /// Symmetric frustum from a vertical field of view in degrees.
    pub fn perspective(fov_deg: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let half_height = near * (fov_deg.to_radians() * 0.5).tan();
        let half_width = half_height * aspect;
        Self::frustum(-half_width, half_width, -half_height, half_height, near, far)
    }

    /// Inverse by cofactor expansion over 2x2 sub-determinants.
    ///
    /// Returns `None` when `|det| <= INVERT_EPSILON`.
    pub fn inverse(&self) -> Option<Mat4> {
        let m = &self.m;

        let a0 = m[0][0] * m[1][1] - m[0][1] * m[1][0];
        let a1 = m[0][0] * m[1][2] - m[0][2] * m[1][0];
        let a2 = m[0][0] * m[1][3] - m[0][3] * m[1][0];
        let a3 = m[0][1] * m[1][2] - m[0][2] * m[1][1];
        let a4 = m[0][1] * m[1][3] - m[0][3] * m[1][1];
        let a5 = m[0][2] * m[1][3] - m[0][3] * m[1][2];
        let b0 = m[2][0] * m[3][1] - m[2][1] * m[3][0];
        let b1 = m[2][0] * m[3][2] - m[2][2] * m[3][0];
        let b2 = m[2][0] * m[3][3] - m[2][3] * m[3][0];
        let b3 = m[2][1] * m[3][2] - m[2][2] * m[3][1];
        let b4 = m[2][1] * m[3][3] - m[2][3] * m[3][1];
        let b5 = m[2][2] * m[3][3] - m[2][3] * m[3][2];

        let det = a0 * b5 - a1 * b4 + a2 * b3 + a3 * b2 - a4 * b1 + a5 * b0;
        if det.abs() <= INVERT_EPSILON {
            return None;
        }

        let mut out = [[0.0f32; 4]; 4];
        out[0][0] = m[1][1] * b5 - m[1][2] * b4 + m[1][3] * b3;
        out[1][0] = -m[1][0] * b5 + m[1][2] * b2 - m[1][3] * b1;
        out[2][0] = m[1][0] * b4 - m[1][1] * b2 + m[1][3] * b0;
        out[3][0] = -m[1][0] * b3 + m[1][1] * b1 - m[1][2] * b0;
        out[0][1] = -m[0][1] * b5 + m[0][2] * b4 - m[0][3] * b3;
        out[1][1] = m[0][0] * b5 - m[0][2] * b2 + m[0][3] * b1;
        out[2][1] = -m[0][0] * b4 + m[0][1] * b2 - m[0][3] * b0;
        out[3][1] = m[0][0] * b3 - m[0][1] * b1 + m[0][2] * b0;
        out[0][2] = m[3][1] * a5 - m[3][2] * a4 + m[3][3] * a3;
        out[1][2] = -m[3][0] * a5 + m[3][2] * a2 - m[3][3] * a1;
        out[2][2] = m[3][0] * a4 - m[3][1] * a2 + m[3][3] * a0;
        out[3][2] = -m[3][0] * a3 + m[3][1] * a1 - m[3][2] * a0;
        out[0][3] = -m[2][1] * a5 + m[2][2] * a4 - m[2][3] * a3;
        out[1][3] = m[2][0] * a5 - m[2][2] * a2 + m[2][3] * a1;
        out[2][3] = -m[2][0] * a4 + m[2][1] * a2 - m[2][3] * a0;
        out[3][3] = m[2][0] * a3 - m[2][1] * a1 + m[2][2] * a0;

        let inv_det = 1.0 / det;
        for row in &mut out {
            for v in row.iter_mut() {
                *v *= inv_det;
            }
        }

        Some(Mat4::from_rows(out))
    }

    /// Row vector times matrix: `v * self`.
    pub fn transform(&self, v: Vec4) -> Vec4 {
        let m = &self.m;
        Vec4::new(
            m[0][0] * v.x + m[1][0] * v.y + m[2][0] * v.z + m[3][0] * v.w,
            m[0][1] * v.x + m[1][1] * v.y + m[2][1] * v.z + m[3][1] * v.w,
            m[0][2] * v.x + m[1][2] * v.y + m[2][2] * v.z + m[3][2] * v.w,
            m[0][3] * v.x + m[1][3] * v.y + m[2][3] * v.z + m[3][3] * v.w,
        )
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Index<usize> for Mat4 {
    type Output = [f32; 4];
    #[inline]
    fn index(&self, row: usize) -> &[f32; 4] {
        &self.m[row]
    }
}

impl Mul for Mat4 {
    type Output = Mat4;
    #[inline]
    fn mul(self, rhs: Mat4) -> Mat4 {
        self.multiply(&rhs)
    }
}

impl Mul<Mat4> for Vec4 {
    type Output = Vec4;
    #[inline]
    fn mul(self, rhs: Mat4) -> Vec4 {
        rhs.transform(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn approx(a: Mat4, b: Mat4) -> bool {
        a.m.iter()
            .flatten()
            .zip(b.m.iter().flatten())
            .all(|(x, y)| (x - y).abs() < EPS)
    }

    fn approx_v(a: Vec4, b: Vec4) -> bool {
        (a.x - b.x).abs() < EPS
            && (a.y - b.y).abs() < EPS
            && (a.z - b.z).abs() < EPS
            && (a.w - b.w).abs() < EPS
    }

    fn sample() -> Mat4 {
        Mat4::from_rows([
            [2.0, 0.0, 1.0, 0.0],
            [1.0, 3.0, 0.0, 0.0],
            [0.0, 1.0, 4.0, 0.0],
            [5.0, -2.0, 1.0, 1.0],
        ])
    }

    // ── multiply ──────────────────────────────────────────────────────────

    #[test]
    fn identity_is_neutral() {
        assert_eq!(Mat4::IDENTITY * sample(), sample());
        assert_eq!(sample() * Mat4::IDENTITY, sample());
        assert_eq!(Mat4::default(), Mat4::identity());
    }

    #[test]
    fn multiply_is_row_major() {
        let a = Mat4::from_translation(1.0, 2.0, 3.0);
        let b = Mat4::from_scale(2.0, 2.0, 2.0);
        // Translate, then scale (row vectors apply left to right).
        let p = Vec4::new(0.0, 0.0, 0.0, 1.0) * (a * b);
        assert_eq!(p, Vec4::new(2.0, 4.0, 6.0, 1.0));
    }

    #[test]
    fn translate_post_multiplies() {
        let m = Mat4::from_scale(2.0, 2.0, 2.0).translate(1.0, 0.0, 0.0);
        let p = Vec4::new(1.0, 0.0, 0.0, 1.0) * m;
        assert_eq!(p, Vec4::new(3.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn scale_post_multiplies() {
        let m = Mat4::from_translation(1.0, 0.0, 0.0).scale(3.0, 1.0, 1.0);
        let p = Vec4::new(0.0, 0.0, 0.0, 1.0) * m;
        assert_eq!(p, Vec4::new(3.0, 0.0, 0.0, 1.0));
    }

    // ── rotate ────────────────────────────────────────────────────────────

    #[test]
    fn rotation_about_z_turns_x_into_y() {
        let m = Mat4::IDENTITY.rotate(core::f32::consts::FRAC_PI_2, Vec3::Z);
        let p = Vec4::new(1.0, 0.0, 0.0, 1.0) * m;
        assert!(approx_v(p, Vec4::new(0.0, 1.0, 0.0, 1.0)));
    }

    #[test]
    fn rotation_axis_is_normalized() {
        let a = Mat4::from_axis_angle(0.7, Vec3::new(0.0, 0.0, 5.0));
        let b = Mat4::from_axis_angle(0.7, Vec3::Z);
        assert!(approx(a, b));
    }

    #[test]
    fn rotation_is_orthonormal() {
        let r = Mat4::from_axis_angle(1.1, Vec3::new(1.0, 2.0, 3.0));
        assert!(approx(r * r.transpose(), Mat4::IDENTITY));
    }

    #[test]
    fn zero_axis_rotation_is_identity() {
        assert_eq!(Mat4::from_axis_angle(1.0, Vec3::zero()), Mat4::IDENTITY);
    }

    // ── transpose ─────────────────────────────────────────────────────────

    #[test]
    fn transpose_swaps_rows_and_columns() {
        let t = sample().transpose();
        assert_eq!(t.m[0], [2.0, 1.0, 0.0, 5.0]);
        assert_eq!(t.transpose(), sample());

        let m2 = Mat2::from_rows([[1.0, 2.0], [3.0, 4.0]]);
        assert_eq!(m2.transpose().m, [[1.0, 3.0], [2.0, 4.0]]);

        let m3 = Mat3::from_rows([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]);
        assert_eq!(m3.transpose().m[0], [1.0, 4.0, 7.0]);
    }

    // ── inverse ───────────────────────────────────────────────────────────

    #[test]
    fn inverse_round_trips_to_identity() {
        let m = sample();
        let inv = m.inverse().unwrap();
        assert!(approx(m * inv, Mat4::IDENTITY));
        assert!(approx(inv * m, Mat4::IDENTITY));
    }

    #[test]
    fn inverse_of_translation_negates_offset() {
        let inv = Mat4::from_translation(1.0, -2.0, 3.0).inverse().unwrap();
        assert!(approx(inv, Mat4::from_translation(-1.0, 2.0, -3.0)));
    }

    #[test]
    fn singular_matrix_has_no_inverse() {
        assert!(Mat4::ZERO.inverse().is_none());
        assert!(Mat4::from_scale(1.0, 1.0, 0.0).inverse().is_none());
        // det = 1e-6 is under the threshold.
        assert!(Mat4::from_scale(0.01, 0.01, 0.01).inverse().is_none());
    }

    // ── projections ───────────────────────────────────────────────────────

    #[test]
    fn orthographic_maps_box_to_clip_cube() {
        let m = Mat4::orthographic(0.0, 800.0, 600.0, 0.0, -1.0, 1.0);
        let tl = Vec4::new(0.0, 0.0, 0.0, 1.0) * m;
        let br = Vec4::new(800.0, 600.0, 0.0, 1.0) * m;
        assert!(approx_v(tl, Vec4::new(-1.0, 1.0, 0.0, 1.0)));
        assert!(approx_v(br, Vec4::new(1.0, -1.0, 0.0, 1.0)));
    }

    #[test]
    fn frustum_maps_near_and_far_planes() {
        let m = Mat4::frustum(-1.0, 1.0, -1.0, 1.0, 1.0, 10.0);
        let near = Vec4::new(0.0, 0.0, -1.0, 1.0) * m;
        let far = Vec4::new(0.0, 0.0, -10.0, 1.0) * m;
        assert!((near.z / near.w + 1.0).abs() < EPS);
        assert!((far.z / far.w - 1.0).abs() < EPS);
    }

    #[test]
    fn perspective_edges_hit_clip_bounds() {
        let m = Mat4::perspective(90.0, 2.0, 1.0, 100.0);
        // At distance 1 a 90 degree fov spans y in [-1, 1] and x in [-2, 2].
        let p = Vec4::new(2.0, 1.0, -1.0, 1.0) * m;
        assert!((p.x / p.w - 1.0).abs() < EPS);
        assert!((p.y / p.w - 1.0).abs() < EPS);
    }

    #[test]
    fn index_reads_rows() {
        assert_eq!(sample()[3], [5.0, -2.0, 1.0, 1.0]);
    }
}
