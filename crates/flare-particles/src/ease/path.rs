//! Ease sampled from a cubic bezier path, in the style of a custom-ease editor

use super::svg;
use flare_core::{FlareError, Result};

/// Flatness threshold at precision 1.
const THRESHOLD: f64 = 1.0 / 200_000.0;

/// A flattened path vertex plus cached deltas to the next vertex.
#[derive(Debug, Clone, Copy)]
struct EasePoint {
    x: f64,
    y: f64,
    cx: f64,
    cy: f64,
    nx: f64,
    n: Option<usize>,
}

impl EasePoint {
    fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            cx: 0.0,
            cy: 0.0,
            nx: f64::INFINITY,
            n: None,
        }
    }
}

/// An ease built from SVG path data (`"M0,0 C..."`) or a bare list of
/// cubic bezier coordinates.
///
/// The path is flattened into line segments and indexed by a lookup table
/// keyed on progress. Paths without sharp direction changes are resampled
/// at equal x steps; otherwise every anchor is kept so that bounces are
/// never clipped.
#[derive(Debug, Clone)]
pub struct PathEase {
    points: Vec<EasePoint>,
    lookup: Vec<EasePoint>,
    fast: bool,
}

impl PathEase {
    pub fn new(data: &str) -> Result<Self> {
        let data = if data.trim().is_empty() { "0,0,1,1" } else { data };
        let mut values = if needs_parsing(data) {
            svg::string_to_raw_path(data)?
                .into_iter()
                .next()
                .ok_or_else(|| FlareError::EaseParse(format!("empty path: {data}")))?
        } else {
            svg::numbers(data)?
        };

        let mut l = values.len();
        if l == 4 {
            values.splice(0..0, [0.0, 0.0]);
            values.extend_from_slice(&[1.0, 1.0]);
            l = 8;
        } else if l < 8 || (l - 2) % 6 != 0 {
            return Err(FlareError::EaseParse(format!(
                "expected 4 or 2 + 6n coordinates, got {l}"
            )));
        }
        if values[0] != 0.0 || values[l - 2] != 1.0 {
            normalize(&mut values);
        }

        let mut points: Vec<EasePoint> = Vec::new();
        for i in (2..l).step_by(6) {
            let a1 = EasePoint::at(values[i - 2], values[i - 1]);
            let a2 = EasePoint::at(values[i + 4], values[i + 5]);
            points.push(a1);
            points.push(a2);
            let index = points.len() - 1;
            bezier_to_points(
                [
                    a1.x,
                    a1.y,
                    values[i],
                    values[i + 1],
                    values[i + 2],
                    values[i + 3],
                    a2.x,
                    a2.y,
                ],
                THRESHOLD,
                &mut points,
                index,
            );
        }

        let (fast, closest) = link_points(&mut points);
        let lookup = build_lookup(&points, fast, closest);
        Ok(Self {
            points,
            lookup,
            fast,
        })
    }

    /// Whether the equal-step lookup table is in use.
    pub fn is_fast(&self) -> bool {
        self.fast
    }

    pub fn sample(&self, progress: f32) -> f32 {
        let p = progress as f64;
        let l = self.lookup.len();
        let Some(last) = self.lookup.last() else {
            return progress;
        };
        let scaled = (p * l as f64).trunc();
        let mut point = if scaled >= 0.0 && (scaled as usize) < l {
            &self.lookup[scaled as usize]
        } else {
            last
        };
        if point.nx < p {
            if let Some(next) = point.n.and_then(|n| self.points.get(n)) {
                point = next;
            }
        }
        if point.cx == 0.0 {
            return point.y as f32;
        }
        (point.y + (p - point.x) / point.cx * point.cy) as f32
    }
}

/// Path data with drawing commands other than a lone moveto + curveto
/// must go through the full path parser.
fn needs_parsing(data: &str) -> bool {
    data.chars().any(|c| "cLlsSaAhHvVtTqQ".contains(c)) || (data.contains('M') && !data.contains('C'))
}

/// Translates and scales the coordinates so x runs from 0 to 1 and y
/// ends at 1, using the larger of the first and last y as the origin.
fn normalize(values: &mut [f64]) {
    let l = values.len();
    let origin_y = values[l - 1].max(values[1]);
    let tx = -values[0];
    let ty = -origin_y;
    let sx = 1.0 / (values[l - 2] + tx);
    let mut sy = if (values[l - 1] - values[1]).abs() < 0.01 * (values[l - 2] - values[0]) {
        find_minimum(values) + ty
    } else {
        values[l - 1] + ty
    };
    if sy != 0.0 && !sy.is_nan() {
        sy = 1.0 / sy;
    } else {
        // an ease returning to its start value scales proportionally
        sy = -sx;
    }
    for pair in values.chunks_exact_mut(2) {
        pair[0] = (pair[0] + tx) * sx;
        pair[1] = (pair[1] + ty) * sy;
    }
}

/// Smallest anchor y value.
fn find_minimum(values: &[f64]) -> f64 {
    values
        .iter()
        .skip(1)
        .step_by(6)
        .fold(1e20, |min, &v| if v < min { v } else { min })
}

/// Recursively subdivides a cubic bezier, inserting midpoints into
/// `points` before `index` until each piece is flat within `threshold`.
fn bezier_to_points(c: [f64; 8], threshold: f64, points: &mut Vec<EasePoint>, index: usize) {
    let [x1, y1, x2, y2, x3, y3, x4, y4] = c;
    let x12 = (x1 + x2) / 2.0;
    let y12 = (y1 + y2) / 2.0;
    let x23 = (x2 + x3) / 2.0;
    let y23 = (y2 + y3) / 2.0;
    let x34 = (x3 + x4) / 2.0;
    let y34 = (y3 + y4) / 2.0;
    let x123 = (x12 + x23) / 2.0;
    let y123 = (y12 + y23) / 2.0;
    let x234 = (x23 + x34) / 2.0;
    let y234 = (y23 + y34) / 2.0;
    let x1234 = (x123 + x234) / 2.0;
    let y1234 = (y123 + y234) / 2.0;
    let dx = x4 - x1;
    let dy = y4 - y1;
    let d2 = ((x2 - x4) * dy - (y2 - y4) * dx).abs();
    let d3 = ((x3 - x4) * dy - (y3 - y4) * dx).abs();

    points.insert(index, EasePoint::at(x1234, y1234));
    if (d2 + d3) * (d2 + d3) > threshold * (dx * dx + dy * dy) {
        let length = points.len();
        bezier_to_points(
            [x1, y1, x12, y12, x123, y123, x1234, y1234],
            threshold,
            points,
            index,
        );
        let inserted = points.len() - length;
        bezier_to_points(
            [x1234, y1234, x234, y234, x34, y34, x4, y4],
            threshold,
            points,
            index + 1 + inserted,
        );
    }
}

/// Drops vertices that go backwards or past x = 1, links each vertex to its
/// successor, and returns `(fast, closest)`: whether equal-step sampling is
/// safe and the smallest x gap between vertices.
fn link_points(points: &mut Vec<EasePoint>) -> (bool, f64) {
    let mut fast = true;
    let mut closest = 1.0_f64;
    let mut i = 0;
    while i < points.len() {
        let point = points[i];
        let prev_index = i.saturating_sub(1);
        let prev = points[prev_index];
        let keep = (point.x > prev.x || (prev.y != point.y && prev.x == point.x) || i == 0)
            && point.x <= 1.0;
        if !keep {
            points.remove(i);
            continue;
        }

        let l = points.len();
        {
            let prev = &mut points[prev_index];
            prev.cx = point.x - prev.x;
            prev.cy = point.y - prev.y;
            prev.n = Some(i);
            prev.nx = point.x;
        }
        if fast && i > 1 {
            let prev = points[prev_index];
            let before = points[i - 2];
            if (prev.cy / prev.cx - before.cy / before.cx).abs() > 2.0 {
                // sharp direction change: keep every anchor
                fast = false;
            }
        }
        let prev = &mut points[prev_index];
        if prev.cx < closest {
            if prev.cx == 0.0 {
                prev.cx = 0.001;
                if i == l - 1 {
                    prev.x -= 0.001;
                    closest = closest.min(0.001);
                    fast = false;
                }
            } else {
                closest = prev.cx;
            }
        }
        i += 1;
    }
    (fast, closest)
}

fn build_lookup(points: &[EasePoint], fast: bool, closest: f64) -> Vec<EasePoint> {
    let Some(last) = points.last().copied() else {
        return Vec::new();
    };
    let l = (1.0 / closest + 1.0).floor().max(1.0) as usize;
    let inc = 1.0 / l as f64;
    let mut j = 0;
    let mut point = points[0];
    let mut lookup = Vec::with_capacity(l);

    if fast {
        let mut a1 = 0.0;
        for i in 0..l {
            let p = i as f64 * inc;
            if point.nx < p && j + 1 < points.len() {
                j += 1;
                point = points[j];
            }
            a1 = point.y + (p - point.x) / point.cx * point.cy;
            lookup.push(EasePoint {
                x: p,
                y: a1,
                cx: inc,
                cy: 0.0,
                nx: 9.0,
                n: None,
            });
            if i > 0 {
                lookup[i - 1].cy = a1 - lookup[i - 1].y;
            }
        }
        let tail = &mut lookup[l - 1];
        tail.cy = last.y - a1;
        tail.cx = last.x - tail.x;
    } else {
        for i in 0..l {
            if point.nx < i as f64 * inc && j + 1 < points.len() {
                j += 1;
                point = points[j];
            }
            lookup.push(point);
        }
        if j < points.len() - 1 && points.len() >= 2 {
            lookup[l - 1] = points[points.len() - 2];
        }
    }
    lookup
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_from_four_numbers() {
        let ease = PathEase::new("0,0,1,1").unwrap();
        for p in [0.0, 0.1, 0.25, 0.5, 0.75, 0.9] {
            assert!((ease.sample(p) - p).abs() < 1e-3, "p = {p}");
        }
    }

    #[test]
    fn endpoints_are_hit() {
        let ease = PathEase::new("M0,0 C0.25,0.1 0.25,1 1,1").unwrap();
        assert!(ease.sample(0.0).abs() < 1e-4);
        assert!((ease.sample(1.0) - 1.0).abs() < 1e-3);
    }

    #[test]
    fn ease_out_curve_is_above_diagonal() {
        let ease = PathEase::new(
            "M0,0,C0,0.408,0.242,0.657,0.295,0.709,0.346,0.76,0.584,1,1,1",
        )
        .unwrap();
        let mut prev = ease.sample(0.0);
        for step in 1..=20 {
            let p = step as f32 / 20.0;
            let v = ease.sample(p);
            assert!(v >= prev - 1e-4, "monotonic at {p}");
            if p < 1.0 {
                assert!(v > p, "ease-out stays above diagonal at {p}");
            }
            prev = v;
        }
    }

    #[test]
    fn unnormalized_path_is_rescaled() {
        // same curve drawn y-down in a 0..100 box
        let ease = PathEase::new("M0,100 C25,90 25,0 100,0").unwrap();
        let reference = PathEase::new("M0,0 C0.25,0.1 0.25,1 1,1").unwrap();
        for p in [0.2, 0.5, 0.8] {
            assert!((ease.sample(p) - reference.sample(p)).abs() < 1e-3);
        }
    }

    #[test]
    fn rejects_bad_coordinate_count() {
        assert!(PathEase::new("0,0,1").is_err());
        assert!(PathEase::new("0,0,0.5,0.5,1").is_err());
    }
}
