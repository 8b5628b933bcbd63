//! Piecewise quadratic ease built from evenly spaced segments

use serde::{Deserialize, Serialize};

/// One segment of a piecewise ease: start value, end value, and the
/// quadratic control point between them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EaseSegment {
    pub s: f32,
    pub e: f32,
    pub cp: f32,
}

/// Segments are assumed to split [0, 1] into equal spans.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentEase {
    segments: Vec<EaseSegment>,
}

impl SegmentEase {
    pub fn new(segments: Vec<EaseSegment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[EaseSegment] {
        &self.segments
    }

    pub fn sample(&self, time: f32) -> f32 {
        let qty = self.segments.len();
        if qty == 0 {
            return time;
        }
        let i = ((qty as f32 * time) as usize).min(qty - 1);
        let t = (time - i as f32 / qty as f32) * qty as f32;
        let seg = &self.segments[i];
        seg.s + t * (2.0 * (1.0 - t) * (seg.cp - seg.s) + t * (seg.e - seg.s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear() -> SegmentEase {
        SegmentEase::new(vec![
            EaseSegment {
                s: 0.0,
                cp: 0.25,
                e: 0.5,
            },
            EaseSegment {
                s: 0.5,
                cp: 0.75,
                e: 1.0,
            },
        ])
    }

    #[test]
    fn linear_segments_are_identity() {
        let ease = linear();
        for t in [0.0, 0.1, 0.25, 0.5, 0.6, 0.99] {
            assert!((ease.sample(t) - t).abs() < 1e-5, "t = {t}");
        }
    }

    #[test]
    fn end_of_range_reaches_last_end() {
        assert!((linear().sample(1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn control_point_bends_curve() {
        let ease = SegmentEase::new(vec![EaseSegment {
            s: 0.0,
            cp: 1.0,
            e: 1.0,
        }]);
        // s + t * (2(1-t)(cp-s) + t(e-s)) at t = 0.5
        assert!((ease.sample(0.5) - 0.75).abs() < 1e-6);
    }
}
