//! Named vegetation alternatives selectable by the Result rule.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One vegetation alternative of a layer: which model to place and how to
/// randomize each instance.
///
/// The Result rule's variation output is an index into the owning layer's
/// variation list; the fields here are carried for the caller's instancing
/// code and never read during evaluation.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct Variation {
    pub name: String,
    /// Path of the model resource to instance.
    pub model_path: String,
    /// Path of the skin resource to apply.
    pub skin_path: String,
    /// Rotation response to wind force, degrees per unit force.
    pub rotation_per_force: f32,
    /// Physics restitution of placed instances.
    pub restitution: f32,
    /// Random per-instance rotation range in degrees.
    pub min_random_rotation: f32,
    pub max_random_rotation: f32,
    /// Random per-instance scaling range.
    pub min_random_scaling: f32,
    pub max_random_scaling: f32,
}

impl Variation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model_path: String::new(),
            skin_path: String::new(),
            rotation_per_force: 0.0,
            restitution: 0.0,
            min_random_rotation: 0.0,
            max_random_rotation: 0.0,
            min_random_scaling: 1.0,
            max_random_scaling: 1.0,
        }
    }

    pub fn with_model(mut self, path: impl Into<String>) -> Self {
        self.model_path = path.into();
        self
    }

    pub fn with_skin(mut self, path: impl Into<String>) -> Self {
        self.skin_path = path.into();
        self
    }

    pub fn with_random_rotation(mut self, min: f32, max: f32) -> Self {
        self.min_random_rotation = min;
        self.max_random_rotation = max;
        self
    }

    pub fn with_random_scaling(mut self, min: f32, max: f32) -> Self {
        self.min_random_scaling = min;
        self.max_random_scaling = max;
        self
    }
}

impl Default for Variation {
    fn default() -> Self {
        Self::new("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_optional_fields() {
        let variation = Variation::new("birch")
            .with_model("models/birch.demodel")
            .with_skin("skins/birch.deskin")
            .with_random_rotation(0.0, 360.0)
            .with_random_scaling(0.8, 1.2);

        assert_eq!(variation.name, "birch");
        assert_eq!(variation.model_path, "models/birch.demodel");
        assert_eq!(variation.skin_path, "skins/birch.deskin");
        assert_eq!(variation.max_random_rotation, 360.0);
        assert_eq!(variation.min_random_scaling, 0.8);
    }
}
