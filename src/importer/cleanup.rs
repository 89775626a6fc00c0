use std::collections::HashMap;

use glam::Mat4;
use log::warn;

use crate::asset::{animation::AnimationClip, node::{DecomposedTransform, ModelNodeTree}};

const STATIC_EPSILON: f32 = 1e-4;

/// Folds synthetic pivot-node tracks into their child's track and drops
/// them from the clip.
///
/// Some FBX exporters split one authored transform into a chain of
/// single-child helper nodes, each animated with a constant track. Once
/// the track is dropped the pivot node's own tree transform takes over
/// during playback, so the value folded onto the child's keys is
/// `node_transform⁻¹ * track_value`: sampling the cleaned clip then
/// produces `node_transform * folded_key = track_value * key`, the same
/// world transform as before for every surviving node at any time.
/// Exporters bake the same value into the node and its static channel,
/// making the correction identity in the common case. Chains fold
/// top-down, so a pivot whose child is itself a pivot collapses through.
///
/// Anything that does not match the pattern exactly is left alone with a
/// warning: a genuinely animated pivot, a pivot with zero or several
/// children, a pivot whose node transform is not invertible, or a child
/// that has no track to fold into.
pub(crate) fn clean_clip(
    clip: &mut AnimationClip,
    tree: &ModelNodeTree,
    dummy_nodes: &HashMap<String, usize>,
) {
    if dummy_nodes.is_empty() {
        return;
    }

    // Ascending tree index is top-down order in a pre-order arena.
    let mut pivots: Vec<(&String, usize)> = dummy_nodes
        .iter()
        .map(|(name, index)| (name, *index))
        .collect();
    pivots.sort_by_key(|(_, index)| *index);

    for (name, index) in pivots {
        let track_index = match clip.tracks.iter().position(|track| track.node_name == *name) {
            Some(track_index) => track_index,
            // Not animated in this clip, nothing to fold.
            None => continue,
        };

        let node = match tree.get(index) {
            Some(node) => node,
            None => continue,
        };
        let node_matrix = Mat4::from(node.transform);
        if node_matrix.determinant().abs() <= f32::EPSILON {
            warn!(
                "pivot node {:?} has a degenerate transform, leaving its track in place",
                name
            );
            continue;
        }
        let child_name = match node.children.as_slice() {
            [child] => match tree.get(*child) {
                Some(child) => child.name.clone(),
                None => continue,
            },
            children => {
                warn!(
                    "pivot node {:?} has {} children, leaving its track in place",
                    name,
                    children.len()
                );
                continue;
            }
        };

        if !clip.tracks[track_index].is_static(STATIC_EPSILON) {
            warn!("pivot node {:?} is animated, leaving its track in place", name);
            continue;
        }
        let static_value = match clip.tracks[track_index].keyframes.first() {
            Some(keyframe) => keyframe.value,
            None => {
                clip.tracks.remove(track_index);
                continue;
            }
        };

        let Some(child_track) = clip
            .tracks
            .iter_mut()
            .find(|track| track.node_name == child_name)
        else {
            warn!(
                "pivot node {:?} has no animated child {:?} to fold into",
                name, child_name
            );
            continue;
        };

        // node_transform⁻¹ * track_value; the node transform reasserts
        // itself once the track is gone and must not apply twice.
        let correction = node_matrix.inverse() * static_value.to_matrix();
        for keyframe in &mut child_track.keyframes {
            let folded = correction * keyframe.value.to_matrix();
            keyframe.value = DecomposedTransform::from_matrix(&folded);
        }
        clip.tracks.remove(track_index);
    }

    clip.recompute_length();
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use glam::{Mat4, Quat, Vec3};

    use crate::asset::{
        animation::{AnimationClip, AnimationTrack, TransformKeyframe},
        node::{DecomposedTransform, ModelNodeTree, NodeTransform},
    };
    use crate::importer::tree::DUMMY_NODE_MARKER;

    use super::clean_clip;

    fn pivot_name(base: &str) -> String {
        format!("{}_{}_Translation", base, DUMMY_NODE_MARKER)
    }

    fn constant_track(name: &str, value: DecomposedTransform, length: f32) -> AnimationTrack {
        AnimationTrack {
            node_name: name.to_string(),
            keyframes: vec![
                TransformKeyframe { time: 0.0, value },
                TransformKeyframe { time: length, value },
            ],
        }
    }

    fn moving_track(name: &str) -> AnimationTrack {
        AnimationTrack {
            node_name: name.to_string(),
            keyframes: (0..3)
                .map(|key| TransformKeyframe {
                    time: key as f32,
                    value: DecomposedTransform {
                        translation: Vec3::new(key as f32, 0.0, 0.0),
                        rotation: Quat::from_rotation_y(0.3 * key as f32),
                        scale: Vec3::ONE,
                    },
                })
                .collect(),
        }
    }

    #[test]
    fn static_pivot_folds_into_child() {
        let pivot = pivot_name("arm");
        let mut tree = ModelNodeTree::default();
        let root = tree.push("root".into(), None, NodeTransform::default());
        let pivot_index = tree.push(pivot.clone(), Some(root), NodeTransform::default());
        tree.push("arm".into(), Some(pivot_index), NodeTransform::default());

        let offset = DecomposedTransform::from_translation(Vec3::new(0.0, 5.0, 0.0));
        let mut clip = AnimationClip {
            name: "walk".into(),
            tracks: vec![constant_track(&pivot, offset, 2.0), moving_track("arm")],
            length: 2.0,
        };

        let dummy_nodes = HashMap::from([(pivot.clone(), pivot_index)]);
        clean_clip(&mut clip, &tree, &dummy_nodes);

        assert!(clip.track(&pivot).is_none());
        let arm = clip.track("arm").unwrap();
        // Composed transform at each key matches pivot * original key.
        let expected = offset.to_matrix() * Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0))
            * Mat4::from_quat(Quat::from_rotation_y(0.3));
        let folded = arm.keyframes[1].value;
        assert!(folded.approx_eq(&DecomposedTransform::from_matrix(&expected), 1e-4));
        assert!((clip.length - 2.0).abs() < 1e-6);
    }

    #[test]
    fn fold_cancels_the_pivot_node_transform() {
        let pivot = pivot_name("arm");
        let offset = DecomposedTransform::from_translation(Vec3::new(0.0, 5.0, 0.0));
        let mut tree = ModelNodeTree::default();
        let root = tree.push("root".into(), None, NodeTransform::default());
        // Exporters bake the same value into the node and its channel.
        let pivot_index = tree.push(
            pivot.clone(),
            Some(root),
            NodeTransform::Decomposed(offset),
        );
        tree.push("arm".into(), Some(pivot_index), NodeTransform::default());

        let mut clip = AnimationClip {
            name: "walk".into(),
            tracks: vec![constant_track(&pivot, offset, 2.0), moving_track("arm")],
            length: 2.0,
        };
        let before = clip.track("arm").unwrap().keyframes.clone();

        clean_clip(&mut clip, &tree, &HashMap::from([(pivot.clone(), pivot_index)]));

        assert!(clip.track(&pivot).is_none());
        // node⁻¹ * track is identity here, so the child keys survive
        // unchanged and the node transform supplies the offset at
        // playback time.
        let after = clip.track("arm").unwrap();
        for (folded, original) in after.keyframes.iter().zip(&before) {
            assert!(folded.value.approx_eq(&original.value, 1e-4));
        }
    }

    #[test]
    fn animated_pivot_is_left_alone() {
        let pivot = pivot_name("arm");
        let mut tree = ModelNodeTree::default();
        let root = tree.push("root".into(), None, NodeTransform::default());
        let pivot_index = tree.push(pivot.clone(), Some(root), NodeTransform::default());
        tree.push("arm".into(), Some(pivot_index), NodeTransform::default());

        let mut clip = AnimationClip {
            name: "walk".into(),
            tracks: vec![moving_track(&pivot), moving_track("arm")],
            length: 2.0,
        };
        let before = clip.track("arm").unwrap().keyframes.clone();

        clean_clip(&mut clip, &tree, &HashMap::from([(pivot.clone(), pivot_index)]));

        assert!(clip.track(&pivot).is_some());
        assert_eq!(clip.track("arm").unwrap().keyframes, before);
    }

    #[test]
    fn pivot_with_several_children_is_left_alone() {
        let pivot = pivot_name("hips");
        let mut tree = ModelNodeTree::default();
        let root = tree.push("root".into(), None, NodeTransform::default());
        let pivot_index = tree.push(pivot.clone(), Some(root), NodeTransform::default());
        tree.push("left".into(), Some(pivot_index), NodeTransform::default());
        tree.push("right".into(), Some(pivot_index), NodeTransform::default());

        let offset = DecomposedTransform::from_translation(Vec3::Y);
        let mut clip = AnimationClip {
            name: "walk".into(),
            tracks: vec![constant_track(&pivot, offset, 1.0), moving_track("left")],
            length: 1.0,
        };

        clean_clip(&mut clip, &tree, &HashMap::from([(pivot.clone(), pivot_index)]));

        assert!(clip.track(&pivot).is_some());
    }

    #[test]
    fn pivot_chain_folds_top_down() {
        let outer = pivot_name("outer");
        let inner = pivot_name("inner");
        let mut tree = ModelNodeTree::default();
        let root = tree.push("root".into(), None, NodeTransform::default());
        let outer_index = tree.push(outer.clone(), Some(root), NodeTransform::default());
        let inner_index = tree.push(inner.clone(), Some(outer_index), NodeTransform::default());
        tree.push("arm".into(), Some(inner_index), NodeTransform::default());

        let outer_offset = DecomposedTransform::from_translation(Vec3::X);
        let inner_offset = DecomposedTransform::from_translation(Vec3::Y);
        let mut clip = AnimationClip {
            name: "walk".into(),
            tracks: vec![
                constant_track(&outer, outer_offset, 1.0),
                constant_track(&inner, inner_offset, 1.0),
                constant_track("arm", DecomposedTransform::default(), 1.0),
            ],
            length: 1.0,
        };

        let dummy_nodes =
            HashMap::from([(outer.clone(), outer_index), (inner.clone(), inner_index)]);
        clean_clip(&mut clip, &tree, &dummy_nodes);

        assert_eq!(clip.tracks.len(), 1);
        let folded = clip.track("arm").unwrap().keyframes[0].value;
        assert!(folded.translation.abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), 1e-5));
    }
}
