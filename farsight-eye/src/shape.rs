//! Contour moments and Hu-invariant shape distance
//!
//! Moments are computed over the polygon a contour describes (Green's
//! theorem), not over pixels, so two contours of the same outline give the
//! same invariants wherever they sit in the frame.

use imageproc::point::Point;

/// Magnitude below which a Hu invariant is treated as zero
const HU_EPSILON: f64 = 1.0e-5;

/// Spatial moments of a closed polygon, up to third order
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Moments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
    pub m20: f64,
    pub m11: f64,
    pub m02: f64,
    pub m30: f64,
    pub m21: f64,
    pub m12: f64,
    pub m03: f64,
}

impl Moments {
    /// Moments of the polygon traced by `points`. Orientation does not matter;
    /// a degenerate polygon yields all zeros.
    pub fn of_contour(points: &[Point<i32>]) -> Moments {
        let Some(last) = points.last() else {
            return Moments::default();
        };

        let (mut a00, mut a10, mut a01, mut a20, mut a11) = (0.0, 0.0, 0.0, 0.0, 0.0);
        let (mut a02, mut a30, mut a21, mut a12, mut a03) = (0.0, 0.0, 0.0, 0.0, 0.0);

        let (mut xp, mut yp) = (last.x as f64, last.y as f64);
        for p in points {
            let (x, y) = (p.x as f64, p.y as f64);
            let (xp2, yp2, x2, y2) = (xp * xp, yp * yp, x * x, y * y);
            let dxy = xp * y - x * yp;
            let xs = xp + x;
            let ys = yp + y;

            a00 += dxy;
            a10 += dxy * xs;
            a01 += dxy * ys;
            a20 += dxy * (xp * xs + x2);
            a11 += dxy * (xp * (ys + yp) + x * (ys + y));
            a02 += dxy * (yp * ys + y2);
            a30 += dxy * xs * (xp2 + x2);
            a03 += dxy * ys * (yp2 + y2);
            a21 += dxy * (xp2 * (3.0 * yp + y) + 2.0 * x * xp * ys + x2 * (yp + 3.0 * y));
            a12 += dxy * (yp2 * (3.0 * xp + x) + 2.0 * y * yp * xs + y2 * (xp + 3.0 * x));

            xp = x;
            yp = y;
        }

        if a00.abs() <= f64::EPSILON {
            return Moments::default();
        }
        let sign = a00.signum();

        Moments {
            m00: sign * a00 / 2.0,
            m10: sign * a10 / 6.0,
            m01: sign * a01 / 6.0,
            m20: sign * a20 / 12.0,
            m11: sign * a11 / 24.0,
            m02: sign * a02 / 12.0,
            m30: sign * a30 / 20.0,
            m21: sign * a21 / 60.0,
            m12: sign * a12 / 60.0,
            m03: sign * a03 / 20.0,
        }
    }

    /// The seven Hu invariants (translation, scale and rotation invariant)
    pub fn hu(&self) -> HuMoments {
        if self.m00 == 0.0 {
            return HuMoments([0.0; 7]);
        }

        let cx = self.m10 / self.m00;
        let cy = self.m01 / self.m00;

        let mu20 = self.m20 - self.m10 * cx;
        let mu11 = self.m11 - self.m10 * cy;
        let mu02 = self.m02 - self.m01 * cy;
        let mu30 = self.m30 - cx * (3.0 * mu20 + cx * self.m10);
        let mu21 = self.m21 - cx * (2.0 * mu11 + cx * self.m01) - cy * mu20;
        let mu12 = self.m12 - cy * (2.0 * mu11 + cy * self.m10) - cx * mu02;
        let mu03 = self.m03 - cy * (3.0 * mu02 + cy * self.m01);

        let inv = 1.0 / self.m00;
        let s2 = inv * inv;
        let s3 = s2 * inv.abs().sqrt();

        let (n20, n11, n02) = (mu20 * s2, mu11 * s2, mu02 * s2);
        let (n30, n21, n12, n03) = (mu30 * s3, mu21 * s3, mu12 * s3, mu03 * s3);

        let mut t0 = n30 + n12;
        let mut t1 = n21 + n03;
        let q0 = t0 * t0;
        let q1 = t1 * t1;
        let n4 = 4.0 * n11;
        let s = n20 + n02;
        let d = n20 - n02;

        let mut hu = [0.0; 7];
        hu[0] = s;
        hu[1] = d * d + n4 * n11;
        hu[3] = q0 + q1;
        hu[5] = d * (q0 - q1) + n4 * t0 * t1;

        t0 *= q0 - 3.0 * q1;
        t1 *= 3.0 * q0 - q1;

        let r0 = n30 - 3.0 * n12;
        let r1 = 3.0 * n21 - n03;

        hu[2] = r0 * r0 + r1 * r1;
        hu[4] = r0 * t0 + r1 * t1;
        hu[6] = r1 * t0 - r0 * t1;

        HuMoments(hu)
    }
}

/// Hu's seven moment invariants of a shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HuMoments(pub [f64; 7]);

impl HuMoments {
    pub fn of_contour(points: &[Point<i32>]) -> HuMoments {
        Moments::of_contour(points).hu()
    }
}

/// Shape distance between two contours' invariants, `max |(mA - mB) / mA|`
/// over the log-scaled invariants `m = sign(h) * log10|h|`.
///
/// 0 for identical outlines, growing with dissimilarity. Invariants near zero
/// on either side are skipped; if only one shape has any usable invariant the
/// distance is `f64::MAX`.
pub fn match_shapes(a: &HuMoments, b: &HuMoments) -> f64 {
    let mut distance: f64 = 0.0;
    let mut any_a = false;
    let mut any_b = false;

    for (&ha, &hb) in a.0.iter().zip(b.0.iter()) {
        let (abs_a, abs_b) = (ha.abs(), hb.abs());
        any_a |= abs_a > HU_EPSILON;
        any_b |= abs_b > HU_EPSILON;
        if abs_a > HU_EPSILON && abs_b > HU_EPSILON {
            let la = ha.signum() * abs_a.log10();
            let lb = hb.signum() * abs_b.log10();
            distance = distance.max(((la - lb) / la).abs());
        }
    }

    if any_a != any_b {
        return f64::MAX;
    }
    distance
}
