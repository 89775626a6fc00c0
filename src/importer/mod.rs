//! The import pipeline: source graph in, [`Model`] out.

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    path::Path,
    sync::OnceLock,
};

use crate::asset::{
    animation::{AnimationClip, AnimationTrack, TransformKeyframe},
    loader::gltf::{GltfLoadError, GltfSourceAsset},
    model::Model,
    node::DecomposedTransform,
    source::SourceAsset,
};

pub mod cleanup;
pub mod mesh;
pub mod skeleton;
pub mod tree;

pub use mesh::MeshError;

/// Vertex normal handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalImportMode {
    /// Copy normals from the file; falls back to `Calculate` when the
    /// file has none.
    #[default]
    Import,
    Calculate,
    None,
}

/// Vertex tangent handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TangentImportMode {
    Import,
    #[default]
    Calculate,
    None,
}

/// Where downstream material resolution should look for existing
/// materials. Pass-through policy, not consumed by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaterialSearchMode {
    #[default]
    Local,
    RecursiveUp,
    Everywhere,
}

/// Pass-through mesh compression hint for downstream systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MeshCompression {
    #[default]
    Off,
    Low,
    Medium,
    High,
}

/// Pass-through animation compression hint for downstream systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimationCompression {
    Off,
    KeyframeReduction,
    KeyframeReductionAndCompression,
    #[default]
    Optimal,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportSettings {
    /// Applied to mesh positions, node translations and animation
    /// translation keys.
    pub file_scale: f32,
    pub import_normals: NormalImportMode,
    pub import_tangents: TangentImportMode,
    pub material_search: MaterialSearchMode,
    pub mesh_compression: MeshCompression,
    pub animation_compression: AnimationCompression,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            file_scale: 1.0,
            import_normals: NormalImportMode::default(),
            import_tangents: TangentImportMode::default(),
            material_search: MaterialSearchMode::default(),
            mesh_compression: MeshCompression::default(),
            animation_compression: AnimationCompression::default(),
        }
    }
}

#[derive(Debug)]
pub enum ImportError {
    /// The parser could not open or decode the file at all.
    Parse(GltfLoadError),
    UnsupportedFormat(String),
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::Parse(error) => Display::fmt(error, f),
            ImportError::UnsupportedFormat(extension) => {
                write!(f, "Unsupported model format: {:?}", extension)
            }
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ImportError::Parse(error) => Some(error),
            ImportError::UnsupportedFormat(_) => None,
        }
    }
}

impl From<GltfLoadError> for ImportError {
    fn from(value: GltfLoadError) -> Self {
        Self::Parse(value)
    }
}

/// Drives the pipeline: tree mirroring (with per-node mesh extraction),
/// skeleton discovery, animation import and cleanup.
///
/// Per-mesh and per-node problems are absorbed and logged; only a total
/// parse failure aborts [`ModelImporter::load_from_file`].
#[derive(Debug, Default)]
pub struct ModelImporter {
    settings: ImportSettings,
}

impl ModelImporter {
    pub fn new(settings: ImportSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ImportSettings {
        &self.settings
    }

    pub fn set_file_scale(&mut self, file_scale: f32) {
        self.settings.file_scale = file_scale;
    }

    pub fn set_import_normals(&mut self, mode: NormalImportMode) {
        self.settings.import_normals = mode;
    }

    pub fn set_import_tangents(&mut self, mode: TangentImportMode) {
        self.settings.import_tangents = mode;
    }

    /// Imports a model file. The file format is picked by extension;
    /// currently `gltf` and `glb` are routed to the gltf adapter.
    pub fn load_from_file(&self, path: &Path) -> Result<Model, ImportError> {
        let extension = path
            .extension()
            .and_then(|extension| extension.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        let source = match extension.as_str() {
            "gltf" | "glb" => GltfSourceAsset::open(path)?,
            other => return Err(ImportError::UnsupportedFormat(other.to_string())),
        };
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("model");
        Ok(self.import(&source, name))
    }

    /// Converts an already-parsed source graph. Infallible past parsing:
    /// broken meshes or references degrade the result instead of failing
    /// the import.
    pub fn import(&self, source: &dyn SourceAsset, name: &str) -> Model {
        let tree::TreeOutput {
            mut tree,
            meshes,
            material_index_per_mesh,
            dummy_nodes,
        } = tree::build_tree(source, &self.settings);

        let avatar = skeleton::build_avatar(&mut tree, &meshes);

        let mut animations = self.import_animations(source);
        for clip in &mut animations {
            cleanup::clean_clip(clip, &tree, &dummy_nodes);
        }

        Model {
            name: name.to_string(),
            meshes,
            materials: source.material_names().to_vec(),
            material_index_per_mesh,
            tree,
            avatar,
            animations,
            instance_plan: OnceLock::new(),
        }
    }

    fn import_animations(&self, source: &dyn SourceAsset) -> Vec<AnimationClip> {
        let scale = self.settings.file_scale;
        (0..source.animation_count())
            .filter_map(|id| {
                let animation = source.animation(id)?;
                let name = animation
                    .name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("animation_{}", id));
                let tracks = animation
                    .tracks()
                    .iter()
                    .map(|track| AnimationTrack {
                        node_name: track.node_name.clone(),
                        keyframes: track
                            .keyframes
                            .iter()
                            .map(|keyframe| TransformKeyframe {
                                time: keyframe.time,
                                value: DecomposedTransform {
                                    translation: keyframe.transform.translation * scale,
                                    ..keyframe.transform
                                },
                            })
                            .collect(),
                    })
                    .collect();
                let mut clip = AnimationClip {
                    name,
                    tracks,
                    length: 0.0,
                };
                clip.recompute_length();
                Some(clip)
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod fake;
