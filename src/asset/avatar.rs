use std::collections::HashMap;

/// Name to bone-node mapping built over the marked bone set of a tree.
///
/// The avatar is independent of mesh data so a compatible skeleton can be
/// retargeted across model instances. Duplicate names keep their first
/// pre-order occurrence; later duplicates are invisible to lookup.
#[derive(Debug, Clone, Default)]
pub struct Avatar {
    bones: Vec<String>,
    by_name: HashMap<String, usize>,
}

impl Avatar {
    /// Registers a bone. Returns `false` when the name was already taken,
    /// leaving the earlier binding in place.
    pub fn insert(&mut self, name: &str, node_index: usize) -> bool {
        if self.by_name.contains_key(name) {
            return false;
        }
        self.by_name.insert(name.to_string(), node_index);
        self.bones.push(name.to_string());
        true
    }

    pub fn node_index(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Bone names in registration (pre-order) order.
    pub fn bone_names(&self) -> &[String] {
        &self.bones
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }
}
