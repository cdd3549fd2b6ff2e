//! Keyframe animation clips and the mixer that plays them on a subtree.

use std::collections::HashMap;

use crate::data_structures::scene_graph::SceneNode;

#[derive(Clone, Debug, PartialEq)]
pub enum Keyframes {
    Translation(Vec<cgmath::Vector3<f32>>),
    Rotation(Vec<cgmath::Quaternion<f32>>),
    Scale(Vec<cgmath::Vector3<f32>>),
    Other,
}

/// One animated property of one node, addressed by node name.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationChannel {
    pub target: String,
    pub timestamps: Vec<f32>,
    pub keyframes: Keyframes,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Sample {
    Translation(cgmath::Vector3<f32>),
    Rotation(cgmath::Quaternion<f32>),
    Scale(cgmath::Vector3<f32>),
}

impl AnimationChannel {
    /// Position of `time` within the keyframes as `(lower index, upper index, blend)`.
    fn segment(&self, time: f32) -> Option<(usize, usize, f32)> {
        let last = self.timestamps.len().checked_sub(1)?;
        let upper = self.timestamps.partition_point(|&t| t <= time);
        if upper == 0 {
            return Some((0, 0, 0.0));
        }
        if upper > last {
            return Some((last, last, 0.0));
        }
        let lower = upper - 1;
        let span = self.timestamps[upper] - self.timestamps[lower];
        let blend = if span > 0.0 {
            (time - self.timestamps[lower]) / span
        } else {
            0.0
        };
        Some((lower, upper, blend))
    }

    fn sample(&self, time: f32) -> Option<Sample> {
        let (lower, upper, blend) = self.segment(time)?;
        let lerp = |values: &Vec<cgmath::Vector3<f32>>| {
            let a = *values.get(lower)?;
            let b = *values.get(upper).unwrap_or(&a);
            Some(a + (b - a) * blend)
        };
        match &self.keyframes {
            Keyframes::Translation(values) => lerp(values).map(Sample::Translation),
            Keyframes::Scale(values) => lerp(values).map(Sample::Scale),
            Keyframes::Rotation(values) => {
                let a = *values.get(lower)?;
                let b = *values.get(upper).unwrap_or(&a);
                Some(Sample::Rotation(a.slerp(b, blend)))
            }
            Keyframes::Other => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    pub channels: Vec<AnimationChannel>,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>, channels: Vec<AnimationChannel>) -> Self {
        Self {
            name: name.into(),
            channels,
        }
    }

    pub fn duration(&self) -> f32 {
        self.channels
            .iter()
            .filter_map(|channel| channel.timestamps.last())
            .fold(0.0, |max, &t| max.max(t))
    }
}

#[derive(Debug)]
struct ClipAction {
    clip: AnimationClip,
    time: f32,
    playing: bool,
}

/**
 * Plays a set of clips on one subtree, looping each clip over its duration.
 *
 * A mixer starts with every clip playing. `stop_all` freezes it in place,
 * `uncache_root` drops the clips so a disposed subtree keeps no animation
 * data alive.
 */
#[derive(Debug, Default)]
pub struct AnimationMixer {
    actions: Vec<ClipAction>,
}

impl AnimationMixer {
    pub fn new(clips: Vec<AnimationClip>) -> Self {
        let actions = clips
            .into_iter()
            .map(|clip| ClipAction {
                clip,
                time: 0.0,
                playing: true,
            })
            .collect();
        Self { actions }
    }

    pub fn is_playing(&self) -> bool {
        self.actions.iter().any(|action| action.playing)
    }

    pub fn clip_count(&self) -> usize {
        self.actions.len()
    }

    /// Current playback time of the clip called `name`.
    pub fn clip_time(&self, name: &str) -> Option<f32> {
        self.actions
            .iter()
            .find(|action| action.clip.name == name)
            .map(|action| action.time)
    }

    /// Advances every playing clip by `delta` and writes the sampled pose into `root`.
    pub fn update(&mut self, delta: f32, root: &mut dyn SceneNode) {
        let mut poses: HashMap<&str, Vec<Sample>> = HashMap::new();
        for action in self.actions.iter_mut().filter(|action| action.playing) {
            let duration = action.clip.duration();
            action.time = if duration > 0.0 {
                (action.time + delta) % duration
            } else {
                0.0
            };
            for channel in &action.clip.channels {
                if let Some(sample) = channel.sample(action.time) {
                    poses.entry(channel.target.as_str()).or_default().push(sample);
                }
            }
        }
        if poses.is_empty() {
            return;
        }
        root.traverse_mut(&mut |node| {
            let Some(samples) = poses.get(node.name()) else {
                return;
            };
            let transform = node.local_transform_mut();
            for sample in samples {
                match *sample {
                    Sample::Translation(position) => transform.position = position,
                    Sample::Rotation(rotation) => transform.rotation = rotation,
                    Sample::Scale(scale) => transform.scale = scale,
                }
            }
        });
    }

    pub fn stop_all(&mut self) {
        self.actions
            .iter_mut()
            .for_each(|action| action.playing = false);
    }

    pub fn uncache_root(&mut self) {
        self.actions.clear();
    }
}
