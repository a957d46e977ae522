//! Interpolation helpers:
//! - lerp_f32 (exact at both endpoints)
//! - lerp_numbers / accumulate_numbers (component-wise over flat lists)
//! - bezier_ease_t (cubic-bezier timing curve inverted by binary search)

/// Linear interpolation of scalars.
///
/// Written as `a * (1 - t) + b * t` so that `t == 0` yields `a` and `t == 1`
/// yields `b` bit-for-bit.
#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

/// Component-wise lerp into `out`. Lists are expected to have equal length;
/// extra components on either side are ignored.
#[inline]
pub fn lerp_numbers(a: &[f32], b: &[f32], t: f32, out: &mut Vec<f32>) {
    out.clear();
    out.extend(a.iter().zip(b.iter()).map(|(x, y)| lerp_f32(*x, *y, t)));
}

/// Add `src` component-wise onto `acc`.
#[inline]
pub fn accumulate_numbers(acc: &mut [f32], src: &[f32]) {
    for (a, s) in acc.iter_mut().zip(src.iter()) {
        *a += *s;
    }
}

/// Cubic Bezier basis function
#[inline]
fn cubic_bezier(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let u = 1.0 - t;
    u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
}

/// Given control points (x1, y1, x2, y2) and an input t in [0,1],
/// compute the eased y by inverting the x bezier via binary search.
#[inline]
pub fn bezier_ease_t(t: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }
    // Bezier(0,0,1,1) is exactly linear
    if x1 == 0.0 && y1 == 0.0 && x2 == 1.0 && y2 == 1.0 {
        return t;
    }
    // Monotonic X in [0,1] assumed for x1/x2 in [0,1]
    let x1 = x1.clamp(0.0, 1.0);
    let x2 = x2.clamp(0.0, 1.0);
    let mut lo = 0.0f32;
    let mut hi = 1.0f32;
    let mut mid = t;
    for _ in 0..24 {
        let x = cubic_bezier(0.0, x1, x2, 1.0, mid);
        if (x - t).abs() < 1e-6 {
            break;
        }
        if x < t {
            lo = mid;
        } else {
            hi = mid;
        }
        mid = 0.5 * (lo + hi);
    }
    cubic_bezier(0.0, y1, y2, 1.0, mid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_endpoints_are_exact() {
        for (a, b) in [(0.1f32, 0.7f32), (-3.3, 12.9), (1e6, -1e-3)] {
            assert_eq!(lerp_f32(a, b, 0.0), a);
            assert_eq!(lerp_f32(a, b, 1.0), b);
        }
    }

    #[test]
    fn accumulate_adds_componentwise() {
        let mut acc = vec![1.0, 2.0];
        accumulate_numbers(&mut acc, &[0.5, -2.0]);
        assert_eq!(acc, vec![1.5, 0.0]);
    }

    #[test]
    fn bezier_linear_fast_path() {
        assert_eq!(bezier_ease_t(0.25, 0.0, 0.0, 1.0, 1.0), 0.25);
    }

    #[test]
    fn bezier_ease_is_monotonic_for_css_ease() {
        let mut last = 0.0;
        for i in 1..=20 {
            let y = bezier_ease_t(i as f32 / 20.0, 0.25, 0.1, 0.25, 1.0);
            assert!(y >= last, "non-monotonic at {i}: {y} < {last}");
            last = y;
        }
        assert_eq!(last, 1.0);
    }
}
