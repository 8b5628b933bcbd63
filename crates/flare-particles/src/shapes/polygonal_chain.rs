use super::{parse_shape_config, SpawnShape};
use crate::particle::Particle;
use crate::rand::ParticleRng;
use flare_core::{Point, Result};
use serde::{Deserialize, Serialize};

/// Either several chains or a single flat list of points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChainData {
    Chains(Vec<Vec<Point>>),
    Points(Vec<Point>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub p1: Point,
    pub p2: Point,
    pub length: f32,
}

/// Connected line segments sampled uniformly by length.
#[derive(Debug, Clone)]
pub struct PolygonalChain {
    segments: Vec<Segment>,
    /// Running total of segment lengths
    counting_lengths: Vec<f32>,
    total_length: f32,
}

impl PolygonalChain {
    pub const TYPE: &'static str = "polygonalChain";

    pub fn new(data: &ChainData) -> Self {
        let chains: Vec<&[Point]> = match data {
            ChainData::Chains(chains) => chains.iter().map(|c| c.as_slice()).collect(),
            ChainData::Points(points) => vec![points.as_slice()],
        };
        let mut segments = Vec::new();
        for chain in chains {
            for pair in chain.windows(2) {
                segments.push(Segment {
                    p1: pair[0],
                    p2: pair[1],
                    length: (pair[1] - pair[0]).length(),
                });
            }
        }
        if segments.is_empty() {
            segments.push(Segment {
                p1: Point::ZERO,
                p2: Point::ZERO,
                length: 0.0,
            });
        }

        let mut total_length = 0.0;
        let counting_lengths = segments
            .iter()
            .map(|s| {
                total_length += s.length;
                total_length
            })
            .collect();
        Self {
            segments,
            counting_lengths,
            total_length,
        }
    }

    /// Missing or null data yields a single zero-length segment at the origin.
    pub fn from_config(data: &serde_json::Value) -> Result<Self> {
        if data.is_null() {
            return Ok(Self::new(&ChainData::Points(Vec::new())));
        }
        let data: ChainData = parse_shape_config(Self::TYPE, data)?;
        Ok(Self::new(&data))
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn total_length(&self) -> f32 {
        self.total_length
    }

    /// Segment containing distance `d` along the chain, and the distance
    /// into that segment.
    fn locate(&self, d: f32) -> (&Segment, f32) {
        if self.segments.len() == 1 {
            return (&self.segments[0], d);
        }
        let i = self
            .counting_lengths
            .iter()
            .position(|&len| d < len)
            .unwrap_or(self.segments.len() - 1);
        let before = if i == 0 { 0.0 } else { self.counting_lengths[i - 1] };
        (&self.segments[i], d - before)
    }
}

impl SpawnShape for PolygonalChain {
    fn get_rand_pos(&self, particle: &mut Particle, rng: &mut ParticleRng) {
        let (seg, into) = self.locate(rng.next_f32() * self.total_length);
        let lerp = into / if seg.length == 0.0 { 1.0 } else { seg.length };
        particle.x = seg.p1.x + lerp * (seg.p2.x - seg.p1.x);
        particle.y = seg.p1.y + lerp * (seg.p2.y - seg.p1.y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::ParticleArena;
    use serde_json::json;

    fn sample(chain: &PolygonalChain, n: usize, seed: u64) -> Vec<Point> {
        let mut arena = ParticleArena::new();
        arena.fill_pool(1, None);
        let id = arena.take(None);
        let p = arena.get_mut(id).unwrap();
        let mut rng = ParticleRng::new(seed);
        (0..n)
            .map(|_| {
                chain.get_rand_pos(p, &mut rng);
                p.position()
            })
            .collect()
    }

    #[test]
    fn single_segment_is_uniform() {
        let chain =
            PolygonalChain::from_config(&json!([{"x": 0, "y": 0}, {"x": 100, "y": 50}])).unwrap();
        let points = sample(&chain, 4000, 21);

        let mut buckets = [0usize; 4];
        for p in &points {
            // on the line y = x / 2
            assert!((p.y - p.x / 2.0).abs() < 1e-3);
            let t = p.x / 100.0;
            assert!((0.0..=1.0).contains(&t));
            buckets[((t * 4.0) as usize).min(3)] += 1;
        }
        for count in buckets {
            assert!((800..1200).contains(&count), "bucket {count}");
        }
    }

    #[test]
    fn chains_are_weighted_by_length() {
        let chain = PolygonalChain::from_config(&json!([
            [{"x": 0, "y": 0}, {"x": 30, "y": 0}],
            [{"x": 0, "y": 10}, {"x": 10, "y": 10}]
        ]))
        .unwrap();
        assert_eq!(chain.segments().len(), 2);
        assert_eq!(chain.total_length(), 40.0);

        let points = sample(&chain, 4000, 3);
        let on_first = points.iter().filter(|p| p.y == 0.0).count();
        assert!((2700..3300).contains(&on_first), "first chain {on_first}");
    }

    #[test]
    fn empty_data_sits_at_origin() {
        for data in [json!([]), serde_json::Value::Null] {
            let chain = PolygonalChain::from_config(&data).unwrap();
            assert_eq!(chain.total_length(), 0.0);
            for p in sample(&chain, 10, 1) {
                assert_eq!(p, Point::ZERO);
            }
        }
    }
}
