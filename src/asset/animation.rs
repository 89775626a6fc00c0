use glam::{Quat, Vec3};

use super::node::DecomposedTransform;

#[derive(Debug, Clone, PartialEq)]
pub struct TransformKeyframe {
    pub time: f32,
    pub value: DecomposedTransform,
}

/// Keyframe track bound to a node by name, so clips survive independent
/// instantiation of the tree.
#[derive(Debug, Clone)]
pub struct AnimationTrack {
    pub node_name: String,
    pub keyframes: Vec<TransformKeyframe>,
}

impl AnimationTrack {
    pub fn length(&self) -> f32 {
        self.keyframes
            .iter()
            .map(|keyframe| keyframe.time)
            .fold(0.0, f32::max)
    }

    /// True when every key holds the same transform within `epsilon`.
    pub fn is_static(&self, epsilon: f32) -> bool {
        match self.keyframes.split_first() {
            None => true,
            Some((first, rest)) => rest
                .iter()
                .all(|keyframe| keyframe.value.approx_eq(&first.value, epsilon)),
        }
    }

    /// Samples the track at `time`: clamped to the first/last key outside
    /// the keyed range, linearly interpolated inside (rotations nlerp
    /// along the shortest path). `None` for an empty track.
    pub fn sample(&self, time: f32) -> Option<DecomposedTransform> {
        let first = self.keyframes.first()?;
        if time <= first.time {
            return Some(first.value);
        }
        let last = self.keyframes.last()?;
        if time >= last.time {
            return Some(last.value);
        }
        let mut index = 0;
        while index + 1 < self.keyframes.len() {
            if self.keyframes[index + 1].time > time {
                break;
            }
            index += 1;
        }
        let current = &self.keyframes[index];
        let next = &self.keyframes[index + 1];
        let span = next.time - current.time;
        if span <= f32::EPSILON {
            return Some(current.value);
        }
        let progress = ((time - current.time) / span).clamp(0.0, 1.0);
        Some(interpolate(&current.value, &next.value, progress))
    }
}

fn interpolate(a: &DecomposedTransform, b: &DecomposedTransform, t: f32) -> DecomposedTransform {
    let rotation_b = if a.rotation.dot(b.rotation) < 0.0 {
        -b.rotation
    } else {
        b.rotation
    };
    DecomposedTransform {
        translation: Vec3::lerp(a.translation, b.translation, t),
        rotation: Quat::lerp(a.rotation, rotation_b, t).normalize(),
        scale: Vec3::lerp(a.scale, b.scale, t),
    }
}

/// Named sequence of keyframe tracks.
#[derive(Debug, Clone, Default)]
pub struct AnimationClip {
    pub name: String,
    pub tracks: Vec<AnimationTrack>,
    pub length: f32,
}

impl AnimationClip {
    pub fn track(&self, node_name: &str) -> Option<&AnimationTrack> {
        self.tracks.iter().find(|track| track.node_name == node_name)
    }

    pub fn recompute_length(&mut self) {
        self.length = self
            .tracks
            .iter()
            .map(AnimationTrack::length)
            .fold(0.0, f32::max);
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use crate::asset::node::DecomposedTransform;

    use super::{AnimationTrack, TransformKeyframe};

    fn key(time: f32, x: f32) -> TransformKeyframe {
        TransformKeyframe {
            time,
            value: DecomposedTransform::from_translation(Vec3::new(x, 0.0, 0.0)),
        }
    }

    #[test]
    fn sample_clamps_and_interpolates() {
        let track = AnimationTrack {
            node_name: "node".into(),
            keyframes: vec![key(1.0, 0.0), key(2.0, 4.0)],
        };
        assert_eq!(track.sample(0.0).unwrap().translation.x, 0.0);
        assert_eq!(track.sample(3.0).unwrap().translation.x, 4.0);
        let mid = track.sample(1.5).unwrap();
        assert!((mid.translation.x - 2.0).abs() < 1e-6);
    }

    #[test]
    fn empty_track_samples_none() {
        let track = AnimationTrack {
            node_name: "node".into(),
            keyframes: Vec::new(),
        };
        assert!(track.sample(0.5).is_none());
        assert!(track.is_static(1e-4));
    }

    #[test]
    fn static_detection() {
        let track = AnimationTrack {
            node_name: "node".into(),
            keyframes: vec![key(0.0, 1.0), key(1.0, 1.0), key(2.0, 1.0)],
        };
        assert!(track.is_static(1e-4));
        let moving = AnimationTrack {
            node_name: "node".into(),
            keyframes: vec![key(0.0, 1.0), key(1.0, 2.0)],
        };
        assert!(!moving.is_static(1e-4));
    }
}
