use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::Handle;
use crate::settings::MaterialQuality;

/// How a geometry's vertices are fed to the vertex shader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GeometryType {
    #[default]
    Static,
    Skinned,
    Instanced,
    Billboard,
}

#[derive(Debug, Clone, Default)]
pub struct Geometry {
    pub name: String,
    /// Changes whenever the vertex layout changes.
    pub pipeline_state_hash: u32,
}

impl Geometry {
    pub fn new(name: impl Into<String>, pipeline_state_hash: u32) -> Self {
        Self {
            name: name.into(),
            pipeline_state_hash,
        }
    }
}

/// One named pass of a technique, e.g. `base`, `litbase`, `light`, `alpha`, `shadow`.
#[derive(Debug, Clone, Default)]
pub struct Pass {
    pub name: String,
    pub pipeline_state_hash: u32,
}

impl Pass {
    pub fn new(name: impl Into<String>, pipeline_state_hash: u32) -> Self {
        Self {
            name: name.into(),
            pipeline_state_hash,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Technique {
    pub name: String,
    passes: HashMap<String, Handle<Pass>>,
}

impl Technique {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passes: HashMap::new(),
        }
    }

    pub fn with_pass(mut self, name: impl Into<String>, pass: Handle<Pass>) -> Self {
        self.passes.insert(name.into(), pass);
        self
    }

    pub fn pass(&self, name: &str) -> Option<Handle<Pass>> {
        self.passes.get(name).copied()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TechniqueEntry {
    pub technique: Handle<Technique>,
    pub quality: MaterialQuality,
    pub lod_distance: f32,
}

#[derive(Debug, Clone, Default)]
pub struct Material {
    pub name: String,
    /// Sorted from the most to the least demanding entry.
    pub techniques: Vec<TechniqueEntry>,
    pub render_order: u8,
    pub pipeline_state_hash: u32,
}

impl Material {
    pub const DEFAULT_RENDER_ORDER: u8 = 128;

    pub fn new(name: impl Into<String>, pipeline_state_hash: u32) -> Self {
        Self {
            name: name.into(),
            techniques: Vec::new(),
            render_order: Self::DEFAULT_RENDER_ORDER,
            pipeline_state_hash,
        }
    }

    pub fn with_technique(
        mut self,
        technique: Handle<Technique>,
        quality: MaterialQuality,
        lod_distance: f32,
    ) -> Self {
        self.techniques.push(TechniqueEntry {
            technique,
            quality,
            lod_distance,
        });
        self
    }

    pub fn with_render_order(mut self, render_order: u8) -> Self {
        self.render_order = render_order;
        self
    }

    /// First entry usable at this quality and distance, otherwise the last
    /// (cheapest) entry.
    pub fn find_technique(
        &self,
        lod_distance: f32,
        quality: MaterialQuality,
    ) -> Option<&TechniqueEntry> {
        self.techniques
            .iter()
            .find(|entry| entry.quality <= quality && lod_distance >= entry.lod_distance)
            .or_else(|| self.techniques.last())
    }
}
