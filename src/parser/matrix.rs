//! Affine transformation matrices in PDF row-vector convention.

/// A PDF transformation matrix `[a b c d e f]`.
///
/// Points are row vectors: `[x y 1] × M`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    pub const fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub const fn translate(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// Build from six numbers, as found in `cm`, `Tm` and `/Matrix`.
    pub fn from_slice(values: &[f32]) -> Option<Self> {
        match *values {
            [a, b, c, d, e, f] => Some(Self::new(a, b, c, d, e, f)),
            _ => None,
        }
    }

    /// `self × other`: apply `self` first, then `other`.
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    pub fn transform(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x * self.a + y * self.c + self.e,
            x * self.b + y * self.d + self.f,
        )
    }

    /// Vertical scale factor, used for the effective font size.
    pub fn vertical_scale(&self) -> f32 {
        (self.c * self.c + self.d * self.d).sqrt()
    }

    /// Image of the unit square.
    pub fn unit_square(&self) -> [(f32, f32); 4] {
        [
            self.transform(0.0, 0.0),
            self.transform(1.0, 0.0),
            self.transform(0.0, 1.0),
            self.transform(1.0, 1.0),
        ]
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_then_scale() {
        let scale = Matrix::new(2.0, 0.0, 0.0, 3.0, 0.0, 0.0);
        let m = Matrix::translate(10.0, 5.0).multiply(&scale);
        // translate first, then scale
        assert_eq!(m.transform(1.0, 1.0), (22.0, 18.0));
    }

    #[test]
    fn test_image_placement() {
        let ctm = Matrix::new(100.0, 0.0, 0.0, 50.0, 72.0, 500.0);
        let corners = ctm.unit_square();
        assert_eq!(corners[0], (72.0, 500.0));
        assert_eq!(corners[3], (172.0, 550.0));
    }

    #[test]
    fn test_vertical_scale() {
        let m = Matrix::new(1.0, 0.0, 0.0, 2.0, 0.0, 0.0);
        assert_eq!(m.vertical_scale(), 2.0);
        assert!(Matrix::from_slice(&[1.0, 2.0]).is_none());
        assert_eq!(Matrix::default(), Matrix::IDENTITY);
    }
}
