//! Time-keyed value lists and their interpolation
//!
//! A value list from config is turned into a chain of `PropertyNode`s once,
//! then wrapped in a `PropertyList` that picks its lookup strategy up front
//! so per-particle sampling never re-inspects the chain's shape.

use crate::ease::{Ease, EaseConfig};
use flare_core::{FlareError, Result, Rgb};
use serde::{Deserialize, Serialize};

/// One keyed value in a list config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueStep<T> {
    pub value: T,
    pub time: f32,
}

/// `{list: [{value, time}], isStepped?, ease?}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueList<T> {
    pub list: Vec<ValueStep<T>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_stepped: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ease: Option<EaseConfig>,
}

/// A value list, or the older `{start, end}` form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListConfig<T> {
    List(ValueList<T>),
    Basic { start: T, end: T },
}

impl<T> ListConfig<T> {
    /// A two-step list running from `start` at time 0 to `end` at time 1.
    pub fn linear(start: T, end: T) -> Self {
        ListConfig::List(ValueList {
            list: vec![
                ValueStep {
                    value: start,
                    time: 0.0,
                },
                ValueStep {
                    value: end,
                    time: 1.0,
                },
            ],
            is_stepped: false,
            ease: None,
        })
    }
}

/// Values that can be blended linearly.
pub trait Lerp: Copy {
    fn lerp(a: Self, b: Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        (b - a) * t + a
    }
}

impl Lerp for Rgb {
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        Rgb::lerp(a, b, t)
    }
}

/// Config-side value that converts into an interpolable node value.
pub trait NodeValue: PartialEq {
    type Output: Lerp;
    fn to_node_value(&self) -> Result<Self::Output>;
}

impl NodeValue for f32 {
    type Output = f32;
    fn to_node_value(&self) -> Result<f32> {
        Ok(*self)
    }
}

impl NodeValue for String {
    type Output = Rgb;
    fn to_node_value(&self) -> Result<Rgb> {
        Rgb::from_hex_str(self)
    }
}

/// One entry in an interpolation chain. The first node of a chain carries
/// the stepped flag and the list's ease.
#[derive(Debug, Clone)]
pub struct PropertyNode<V> {
    pub value: V,
    pub time: f32,
    pub is_stepped: bool,
    pub ease: Option<Ease>,
}

impl<V> PropertyNode<V> {
    pub fn new(value: V, time: f32) -> Self {
        Self {
            value,
            time,
            is_stepped: false,
            ease: None,
        }
    }

    /// Builds the chain for a list config. A two-entry list whose values
    /// match collapses to a single constant node.
    pub fn create_list<T>(data: &ListConfig<T>) -> Result<Vec<PropertyNode<V>>>
    where
        T: NodeValue<Output = V>,
    {
        match data {
            ListConfig::List(list) => {
                let first_step = list.list.first().ok_or_else(|| {
                    FlareError::ConfigParse("value list must not be empty".into())
                })?;
                let mut first = PropertyNode::new(first_step.value.to_node_value()?, first_step.time);
                first.is_stepped = list.is_stepped;
                first.ease = list.ease.as_ref().map(Ease::from_config).transpose()?;

                let mut nodes = vec![first];
                let steps = &list.list;
                if steps.len() > 2 || (steps.len() == 2 && steps[1].value != first_step.value) {
                    for step in &steps[1..] {
                        nodes.push(PropertyNode::new(step.value.to_node_value()?, step.time));
                    }
                }
                Ok(nodes)
            }
            ListConfig::Basic { start, end } => {
                let mut nodes = vec![PropertyNode::new(start.to_node_value()?, 0.0)];
                if end != start {
                    nodes.push(PropertyNode::new(end.to_node_value()?, 1.0));
                }
                Ok(nodes)
            }
        }
    }
}

/// Converts a color gradient into `num_steps` evenly spaced stepped nodes.
/// No node is emitted at time 1, since a particle is dead by then.
pub fn create_stepped_gradient(
    list: &[ValueStep<String>],
    num_steps: usize,
) -> Result<Vec<PropertyNode<Rgb>>> {
    let num_steps = if num_steps == 0 { 10 } else { num_steps };
    let first_step = list
        .first()
        .ok_or_else(|| FlareError::ConfigParse("gradient must not be empty".into()))?;

    let mut first = PropertyNode::new(first_step.value.to_node_value()?, first_step.time);
    first.is_stepped = true;
    let mut nodes = vec![first];
    if list.len() < 2 {
        return Ok(nodes);
    }

    let mut current = 0;
    let mut next = 1;
    for i in 1..num_steps {
        let time = i as f32 / num_steps as f32;
        while time > list[next].time && next + 1 < list.len() {
            current = next;
            next += 1;
        }
        let (cur, nxt) = (&list[current], &list[next]);
        let lerp = (time - cur.time) / (nxt.time - cur.time);
        let value = Rgb::lerp(cur.value.to_node_value()?, nxt.value.to_node_value()?, lerp);
        nodes.push(PropertyNode::new(value, time));
    }
    Ok(nodes)
}

/// Lookup strategy, chosen from the chain's shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    /// Single node; every lookup returns it
    Constant,
    /// First node value until the next node's time is reached
    Stepped,
    /// Two nodes spanning the whole lifetime
    Simple,
    /// Find the bracketing segment, then blend within it
    Complex,
}

/// An interpolation chain with its strategy resolved.
#[derive(Debug, Clone)]
pub struct PropertyList<V> {
    nodes: Vec<PropertyNode<V>>,
    mode: Interpolation,
    ease: Option<Ease>,
}

impl<V: Lerp> PropertyList<V> {
    /// `nodes` must not be empty.
    pub fn new(nodes: Vec<PropertyNode<V>>) -> Self {
        let mut list = Self {
            nodes: Vec::new(),
            mode: Interpolation::Constant,
            ease: None,
        };
        list.reset(nodes);
        list
    }

    pub fn from_config<T>(config: &ListConfig<T>) -> Result<Self>
    where
        T: NodeValue<Output = V>,
    {
        Ok(Self::new(PropertyNode::create_list(config)?))
    }

    pub fn reset(&mut self, nodes: Vec<PropertyNode<V>>) {
        self.ease = nodes.first().and_then(|n| n.ease.clone());
        self.mode = match nodes.as_slice() {
            [] | [_] => Interpolation::Constant,
            [first, ..] if first.is_stepped => Interpolation::Stepped,
            [_, second, ..] if second.time >= 1.0 => Interpolation::Simple,
            _ => Interpolation::Complex,
        };
        self.nodes = nodes;
    }

    pub fn mode(&self) -> Interpolation {
        self.mode
    }

    pub fn nodes(&self) -> &[PropertyNode<V>] {
        &self.nodes
    }

    /// Value of the first node, used to seed particles at spawn.
    pub fn first(&self) -> V {
        self.nodes[0].value
    }

    /// Resolves the value at `lerp`, which should lie in [0, 1].
    pub fn interpolate(&self, lerp: f32) -> V {
        let lerp = match &self.ease {
            Some(ease) => ease.apply(lerp),
            None => lerp,
        };
        let nodes = &self.nodes;
        match self.mode {
            Interpolation::Constant => nodes[0].value,
            Interpolation::Simple => V::lerp(nodes[0].value, nodes[1].value, lerp),
            Interpolation::Stepped => {
                let mut current = 0;
                while current + 1 < nodes.len() && lerp >= nodes[current + 1].time {
                    current += 1;
                }
                nodes[current].value
            }
            Interpolation::Complex => {
                let mut current = 0;
                while current + 2 < nodes.len() && lerp > nodes[current + 1].time {
                    current += 1;
                }
                let (cur, next) = (&nodes[current], &nodes[current + 1]);
                let t = (lerp - cur.time) / (next.time - cur.time);
                V::lerp(cur.value, next.value, t)
            }
        }
    }
}
