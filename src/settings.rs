use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineSettings {
    #[serde(default)]
    pub drawable: DrawableProcessorSettings,
    #[serde(default)]
    pub shadows: ShadowSettings,
    #[serde(default)]
    pub light_cache: LightCacheSettings,
    #[serde(default)]
    pub lighting: LightingSettings,
}

impl PipelineSettings {
    pub fn load() -> Self {
        Self::load_from_path("pipeline.json")
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::try_load_from_path(path) {
            Ok(settings) => {
                info!("Loaded pipeline settings from {:?}", path);
                settings
            }
            Err(PipelineError::SettingsIo(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "Pipeline settings file {:?} not found. Using default settings.",
                    path
                );
                PipelineSettings::default()
            }
            Err(err) => {
                warn!(
                    "Failed to load {:?} ({}). Falling back to default pipeline settings.",
                    path, err
                );
                PipelineSettings::default()
            }
        }
    }

    pub fn try_load_from_path<P: AsRef<std::path::Path>>(
        path: P,
    ) -> Result<Self, PipelineError> {
        let contents = std::fs::read_to_string(path)?;
        let settings = serde_json::from_str::<PipelineSettings>(&contents)?;
        Ok(settings.validate())
    }

    pub fn validate(mut self) -> Self {
        self.drawable = self.drawable.validate();
        self.shadows = self.shadows.validate();

        if self.light_cache.max_unused_frames == 0 {
            warn!("Light cache must keep processors for at least one frame. Using default value.");
            self.light_cache.max_unused_frames = LightCacheSettings::default_max_unused_frames();
        }

        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialQuality {
    Low,
    Medium,
    #[default]
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawableProcessorSettings {
    #[serde(default)]
    pub material_quality: MaterialQuality,
    #[serde(default = "DrawableProcessorSettings::default_max_vertex_lights")]
    pub max_vertex_lights: usize,
    #[serde(default = "DrawableProcessorSettings::default_max_pixel_lights")]
    pub max_pixel_lights: usize,
}

impl Default for DrawableProcessorSettings {
    fn default() -> Self {
        Self {
            material_quality: MaterialQuality::default(),
            max_vertex_lights: Self::default_max_vertex_lights(),
            max_pixel_lights: Self::default_max_pixel_lights(),
        }
    }
}

impl DrawableProcessorSettings {
    /// Vertex lights are packed into four shader slots.
    pub const MAX_VERTEX_LIGHTS: usize = 4;

    fn validate(mut self) -> Self {
        if self.max_vertex_lights > Self::MAX_VERTEX_LIGHTS {
            warn!(
                "At most {} vertex lights are supported. Clamping {}.",
                Self::MAX_VERTEX_LIGHTS,
                self.max_vertex_lights
            );
            self.max_vertex_lights = Self::MAX_VERTEX_LIGHTS;
        }
        self
    }

    const fn default_max_vertex_lights() -> usize {
        4
    }

    const fn default_max_pixel_lights() -> usize {
        4
    }
}

/// Texture-space conventions of the graphics backend the shadow matrices are cooked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClipSpace {
    /// Depth in [0, 1], texture V grows downwards.
    #[default]
    #[serde(rename = "direct3d")]
    Direct3D,
    /// Depth in [-1, 1], texture V grows upwards.
    #[serde(rename = "opengl")]
    OpenGl,
}

impl ClipSpace {
    pub fn is_opengl(self) -> bool {
        matches!(self, Self::OpenGl)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadowSettings {
    #[serde(default = "ShadowSettings::default_enable_shadows")]
    pub enable_shadows: bool,
    #[serde(default = "ShadowSettings::default_page_size")]
    pub page_size: u32,
    #[serde(default = "ShadowSettings::default_max_pages")]
    pub max_pages: usize,
    #[serde(default = "ShadowSettings::default_split_size")]
    pub split_size: u32,
    #[serde(default = "ShadowSettings::default_point_split_size")]
    pub point_split_size: u32,
    #[serde(default)]
    pub sub_pixel_offset: f32,
    #[serde(default)]
    pub clip_space: ClipSpace,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            enable_shadows: Self::default_enable_shadows(),
            page_size: Self::default_page_size(),
            max_pages: Self::default_max_pages(),
            split_size: Self::default_split_size(),
            point_split_size: Self::default_point_split_size(),
            sub_pixel_offset: 0.0,
            clip_space: ClipSpace::default(),
        }
    }
}

impl ShadowSettings {
    fn validate(mut self) -> Self {
        if self.split_size == 0 {
            warn!("Shadow split size must be greater than zero. Using default value.");
            self.split_size = Self::default_split_size();
        }

        if self.point_split_size == 0 {
            warn!("Point light shadow split size must be greater than zero. Using default value.");
            self.point_split_size = Self::default_point_split_size();
        }

        if self.max_pages == 0 {
            warn!("Shadow map page limit must be greater than zero. Using default value.");
            self.max_pages = Self::default_max_pages();
        }

        if !self.sub_pixel_offset.is_finite() {
            warn!("Shadow sub-pixel offset must be finite. Using 0.");
            self.sub_pixel_offset = 0.0;
        }

        self
    }

    const fn default_enable_shadows() -> bool {
        true
    }

    const fn default_page_size() -> u32 {
        2048
    }

    const fn default_max_pages() -> usize {
        8
    }

    const fn default_split_size() -> u32 {
        512
    }

    const fn default_point_split_size() -> u32 {
        256
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightCacheSettings {
    #[serde(default = "LightCacheSettings::default_max_unused_frames")]
    pub max_unused_frames: u64,
}

impl Default for LightCacheSettings {
    fn default() -> Self {
        Self {
            max_unused_frames: Self::default_max_unused_frames(),
        }
    }
}

impl LightCacheSettings {
    const fn default_max_unused_frames() -> u64 {
        600
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LightingSettings {
    #[serde(default)]
    pub deferred: bool,
}
