//! Bezier curve math for bounds extension and point-in-path tests.
//!
//! ## Ray casting
//!
//! ```text
//!        from ●───────────● to
//!                 ╲
//!      (x, y) ○────╳───────────────▶  ray toward +x
//!                   ╲
//! ```
//!
//! Containment casts a horizontal ray toward positive x and counts how many
//! times it crosses the outline. Straight segments are solved directly,
//! quadratic curves in closed form, and cubic curves by isolating one root
//! numerically and deflating the cubic to a quadratic for the other two.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Tuning for the cubic root finder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RootFinderConfig {
    /// Iteration cap for the bracketing solver.
    pub max_iterations: u32,
    /// Parameter-space convergence threshold.
    pub epsilon: f64,
    /// Largest residual accepted as a root; above it no roots are reported.
    pub residual_tolerance: f64,
    /// Intervals narrower than this are not subdivided while isolating a root.
    pub bisection_limit: f64,
}

impl Default for RootFinderConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            epsilon: 0.000_001,
            residual_tolerance: 0.000_01,
            bisection_limit: 0.05,
        }
    }
}

/// Evaluate a one-dimensional quadratic Bezier at `t`.
#[must_use]
pub fn quadratic_bezier(from: f64, cp: f64, to: f64, t: f64) -> f64 {
    let inverse_t = 1.0 - t;
    from * inverse_t * inverse_t + 2.0 * cp * inverse_t * t + to * t * t
}

/// The extreme value a quadratic Bezier reaches on one axis.
///
/// The parameter is clamped to the segment, so an extremum outside `[0, 1]`
/// yields the nearer endpoint.
#[must_use]
pub fn quadratic_bezier_extreme(from: f64, cp: f64, to: f64) -> f64 {
    let t = (from - cp) / (from - 2.0 * cp + to);
    if t < 0.0 {
        return from;
    }
    if t > 1.0 {
        return to;
    }
    quadratic_bezier(from, cp, to, t)
}

/// Evaluate a one-dimensional cubic Bezier at `t`.
#[must_use]
pub fn cubic_bezier(from: f64, cp: f64, cp2: f64, to: f64, t: f64) -> f64 {
    let t_sq = t * t;
    let inverse_t = 1.0 - t;
    let inverse_t_sq = inverse_t * inverse_t;
    from * inverse_t * inverse_t_sq
        + 3.0 * cp * t * inverse_t_sq
        + 3.0 * cp2 * inverse_t * t_sq
        + to * t * t_sq
}

/// Values of the interior extrema of a one-dimensional cubic Bezier.
///
/// Solves the derivative's quadratic; at most two values are returned.
#[must_use]
#[allow(clippy::float_cmp)] // Only the exact degenerate case needs perturbing
pub fn cubic_bezier_extremes(from: f64, cp: f64, cp2: f64, to: f64) -> Vec<f64> {
    let d1 = cp - from;
    let d2 = 2.0 * (cp2 - cp);
    let mut d3 = to - cp2;
    // Leading coefficient would be zero.
    if d1 + d3 == d2 {
        d3 *= 1.0001;
    }
    let f_head = 2.0 * d1 - d2;
    let part1 = d2 - 2.0 * d1;
    let f_center = (part1 * part1 - 4.0 * d1 * (d1 - d2 + d3)).sqrt();
    let f_tail = 2.0 * (d1 - d2 + d3);
    let t1 = (f_head + f_center) / f_tail;
    let t2 = (f_head - f_center) / f_tail;

    let mut result = Vec::with_capacity(2);
    if (0.0..=1.0).contains(&t1) {
        result.push(cubic_bezier(from, cp, cp2, to, t1));
    }
    if (0.0..=1.0).contains(&t2) {
        result.push(cubic_bezier(from, cp, cp2, to, t2));
    }
    result
}

/// Whether a ray cast from `(x, y)` toward +x crosses the segment.
///
/// See <http://www.ecse.rpi.edu/Homepages/wrf/Research/Short_Notes/pnpoly.html>.
#[must_use]
pub fn ray_intersects_line(x: f64, y: f64, from: Point, to: Point) -> bool {
    (to.y > y) != (from.y > y) && x < (from.x - to.x) * (y - to.y) / (from.y - to.y) + to.x
}

/// Whether the ray crosses the quadratic curve an odd number of times.
#[must_use]
pub fn ray_fully_crosses_curve(x: f64, y: f64, from: Point, cp: Point, to: Point) -> bool {
    let from_after = from.y > y;
    if (cp.y > y) == from_after && (to.y > y) == from_after {
        return false;
    }
    // Endpoints on opposite sides with the whole hull to the right: exactly
    // one crossing.
    if (to.y > y) != from_after && from.x >= x && cp.x >= x && to.x >= x {
        return true;
    }

    let a = from.y - 2.0 * cp.y + to.y;
    let b = 2.0 * (cp.y - from.y);
    let c = from.y - y;

    let mut crosses = false;
    for t in solve_quadratic(a, b, c).into_iter().flatten() {
        if (0.0..=1.0).contains(&t) && quadratic_bezier(from.x, cp.x, to.x, t) > x {
            crosses = !crosses;
        }
    }
    crosses
}

/// Whether the ray crosses the cubic curve an odd number of times.
#[must_use]
pub fn ray_fully_crosses_cubic_curve(
    x: f64,
    y: f64,
    from: Point,
    cp: Point,
    cp2: Point,
    to: Point,
    config: &RootFinderConfig,
) -> bool {
    let starts_after = from.y > y;
    if (cp.y > y) == starts_after && (cp2.y > y) == starts_after && (to.y > y) == starts_after {
        return false;
    }
    if from.x < x && cp.x < x && cp2.x < x && to.x < x {
        return false;
    }
    let mut crosses = false;
    for root_x in cubic_x_at_y(from, cp, cp2, to, y, config) {
        if root_x >= x {
            crosses = !crosses;
        }
    }
    crosses
}

/// The x coordinates at which a cubic curve reaches height `y`.
///
/// Finds one root numerically, then factors it out and solves the remaining
/// quadratic. Returns no roots if the numeric root does not converge within
/// the residual tolerance.
#[must_use]
pub fn cubic_x_at_y(
    from: Point,
    cp: Point,
    cp2: Point,
    to: Point,
    y: f64,
    config: &RootFinderConfig,
) -> Vec<f64> {
    let d_x = 3.0 * (cp.x - from.x);
    let d_y = 3.0 * (cp.y - from.y);
    let b_x = 3.0 * (cp2.x - cp.x) - d_x;
    let b_y = 3.0 * (cp2.y - cp.y) - d_y;
    let c3_x = to.x - from.x - d_x - b_x;
    let c3_y = to.y - from.y - d_y - b_y;

    let f = |t: f64| t * (d_y + t * (b_y + t * c3_y)) + from.y - y;
    let point_at = |t: f64| {
        let t = t.clamp(0.0, 1.0);
        from.x + t * (d_x + t * (b_x + t * c3_x))
    };

    // Looping curves may need subdividing before a sign change shows up.
    let (left, right) = isolate_root_interval(&f, config.bisection_limit);
    let t0 = find_root(left, right, &f, config);
    if f(t0).abs() > config.residual_tolerance {
        return Vec::new();
    }

    let mut result = Vec::with_capacity(3);
    if t0 <= 1.0 {
        result.push(point_at(t0));
    }

    // Synthetic division by (t - t0).
    let a = c3_y;
    let b = t0 * a + b_y;
    let c = t0 * b + d_y;
    for t in solve_quadratic(a, b, c).into_iter().flatten() {
        if (0.0..=1.0).contains(&t) {
            result.push(point_at(t));
        }
    }
    result
}

/// Real roots of `a·t² + b·t + c`, falling back to the linear root when the
/// leading coefficient vanishes.
#[allow(clippy::float_cmp)]
fn solve_quadratic(a: f64, b: f64, c: f64) -> [Option<f64>; 2] {
    if a == 0.0 {
        if b == 0.0 {
            return [None, None];
        }
        return [Some(-c / b), None];
    }
    let d = b * b - 4.0 * a * c;
    if d < 0.0 {
        return [None, None];
    }
    let d = d.sqrt();
    let inverse_2a = 1.0 / (a + a);
    [Some((d - b) * inverse_2a), Some((-b - d) * inverse_2a)]
}

/// Narrow `[0, 1]` to an interval whose endpoints bracket a sign change.
///
/// Walks subintervals depth first, left before right, and keeps the last
/// bracketing interval visited. Falls back to `[0, 1]`.
fn isolate_root_interval(f: &impl Fn(f64) -> f64, limit: f64) -> (f64, f64) {
    let mut found = (0.0, 1.0);
    let mut pending = vec![(0.0_f64, 1.0_f64)];
    while let Some((l, r)) = pending.pop() {
        if (r - l).abs() <= limit {
            continue;
        }
        if f(l) * f(r) <= 0.0 {
            found = (l, r);
            continue;
        }
        let middle = 0.5 * (l + r);
        pending.push((middle, r));
        pending.push((l, middle));
    }
    found
}

/// Bracketing root solver: interval halving combined with inverse quadratic
/// interpolation through the bracket endpoints and midpoint.
#[allow(clippy::float_cmp)] // An exact zero residual is a hit
fn find_root(
    mut x0: f64,
    mut x2: f64,
    f: &impl Fn(f64) -> f64,
    config: &RootFinderConfig,
) -> f64 {
    let mut xm_last = x0;
    let mut y0 = f(x0);
    if y0 == 0.0 {
        return x0;
    }
    let mut y2 = f(x2);
    if y2 == 0.0 {
        return x2;
    }
    if y2 * y0 > 0.0 {
        return x0;
    }

    let mut x1 = x0;
    for _ in 0..config.max_iterations {
        x1 = 0.5 * (x2 + x0);
        let y1 = f(x1);
        if y1 == 0.0 || (x1 - x0).abs() < config.epsilon {
            return x1;
        }
        if y1 * y0 > 0.0 {
            std::mem::swap(&mut x0, &mut x2);
            std::mem::swap(&mut y0, &mut y2);
        }

        let y10 = y1 - y0;
        let y21 = y2 - y1;
        let y20 = y2 - y0;
        if y2 * y20 < 2.0 * y1 * y10 {
            x2 = x1;
            y2 = y1;
        } else {
            let b = (x1 - x0) / y10;
            let c = (y10 - y21) / (y21 * y20);
            let xm = x0 - b * y0 * (1.0 - c * y1);
            let ym = f(xm);
            if ym == 0.0 || (xm - xm_last).abs() < config.epsilon {
                return xm;
            }
            xm_last = xm;
            if ym * y0 < 0.0 {
                x2 = xm;
                y2 = ym;
            } else {
                x0 = xm;
                y0 = ym;
                x2 = x1;
                y2 = y1;
            }
        }
    }
    x1
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    /// S-shaped cubic crossing y = 0 three times, once exactly at t = 0.5.
    fn s_curve() -> (Point, Point, Point, Point) {
        (
            Point::new(0.0, -100.0),
            Point::new(100.0, 300.0),
            Point::new(200.0, -300.0),
            Point::new(300.0, 100.0),
        )
    }

    #[test]
    fn test_quadratic_extreme_inside_segment() {
        // Peak of from=0, cp=100, to=0 is at t=0.5 with value 50.
        assert!(approx_eq(quadratic_bezier_extreme(0.0, 100.0, 0.0), 50.0));
    }

    #[test]
    fn test_quadratic_extreme_overshoot() {
        // Control point pulls the curve past its end: peak at t=2/3.
        let v = quadratic_bezier_extreme(0.0, 200.0, 100.0);
        assert!((v - 400.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_quadratic_extreme_clamps_to_endpoint() {
        // Extremum parameter is negative, so the start point is returned.
        assert!(approx_eq(quadratic_bezier_extreme(0.0, -10.0, -100.0), 0.0));
    }

    #[test]
    fn test_cubic_extremes_symmetric_bump() {
        // from=0, cp=cp2=100, to=0 peaks at t=0.5 with value 75; the
        // perturbation moves the reported peak by a hair.
        let extremes = cubic_bezier_extremes(0.0, 100.0, 100.0, 0.0);
        assert_eq!(extremes.len(), 1);
        assert!((extremes[0] - 75.0).abs() < 1e-3);
    }

    #[test]
    fn test_cubic_extremes_degenerate_leading_coefficient() {
        // d1 + d3 == d2: a straight, evenly parameterized line.
        let extremes = cubic_bezier_extremes(0.0, 10.0, 20.0, 30.0);
        assert!(extremes.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_ray_intersects_line() {
        let from = Point::new(100.0, 0.0);
        let to = Point::new(100.0, 100.0);
        assert!(ray_intersects_line(50.0, 50.0, from, to));
        assert!(!ray_intersects_line(150.0, 50.0, from, to));
        assert!(!ray_intersects_line(50.0, 150.0, from, to));
    }

    #[test]
    fn test_ray_crosses_quadratic_once() {
        // Endpoints straddle the ray.
        let crosses = ray_fully_crosses_curve(
            0.0,
            50.0,
            Point::new(10.0, 0.0),
            Point::new(60.0, 50.0),
            Point::new(10.0, 100.0),
        );
        assert!(crosses);
    }

    #[test]
    fn test_ray_crosses_quadratic_twice_is_even() {
        // Arch over the ray: two crossings, both to the right.
        let crosses = ray_fully_crosses_curve(
            -10.0,
            25.0,
            Point::new(0.0, 0.0),
            Point::new(50.0, 100.0),
            Point::new(100.0, 0.0),
        );
        assert!(!crosses);
    }

    #[test]
    fn test_ray_crosses_quadratic_between_crossings() {
        // Starting inside the arch leaves only the right crossing.
        let crosses = ray_fully_crosses_curve(
            50.0,
            25.0,
            Point::new(0.0, 0.0),
            Point::new(50.0, 100.0),
            Point::new(100.0, 0.0),
        );
        assert!(crosses);
    }

    #[test]
    fn test_cubic_x_at_y_three_roots() {
        let (p0, c1, c2, p1) = s_curve();
        let roots = cubic_x_at_y(p0, c1, c2, p1, 0.0, &RootFinderConfig::default());
        assert_eq!(roots.len(), 3);
        // The exact root at t = 0.5 lies at x = 150.
        assert!(roots.iter().any(|&x| approx_eq(x, 150.0)));
        assert!(roots.iter().all(|&x| (0.0..=300.0).contains(&x)));
    }

    #[test]
    fn test_cubic_x_at_y_out_of_range() {
        let (p0, c1, c2, p1) = s_curve();
        let roots = cubic_x_at_y(p0, c1, c2, p1, 1000.0, &RootFinderConfig::default());
        assert!(roots.is_empty());
    }

    #[test]
    fn test_ray_crosses_cubic_parity() {
        let (p0, c1, c2, p1) = s_curve();
        let config = RootFinderConfig::default();
        // Three crossings to the right of the far-left origin.
        assert!(ray_fully_crosses_cubic_curve(-10.0, 0.0, p0, c1, c2, p1, &config));
        // Entirely to the right of the curve.
        assert!(!ray_fully_crosses_cubic_curve(1000.0, 0.0, p0, c1, c2, p1, &config));
    }

    #[test]
    fn test_isolate_root_interval_prefers_whole_range() {
        let f = |t: f64| t - 0.25;
        assert_eq!(isolate_root_interval(&f, 0.05), (0.0, 1.0));
    }

    #[test]
    fn test_find_root_linear() {
        let f = |t: f64| 2.0 * t - 0.6;
        let root = find_root(0.0, 1.0, &f, &RootFinderConfig::default());
        assert!((root - 0.3).abs() < 1e-6);
    }
}
