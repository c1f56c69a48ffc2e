use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::foundation::error::{FogError, FogResult};
use crate::paint::PaintOpts;
use crate::raster::mask::{MAX_DIMENSION, Placement, aligned_dimension};
use crate::transition::pool::DEFAULT_POOL_CAPACITY;
use crate::upload::blur::MAX_BLUR_RADIUS;

/// Engine settings, loadable from JSON. Missing fields take their defaults.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FogOfWarOpts {
    /// When false the engine holds no raster: reads return 1.0 and writes are ignored.
    pub enabled: bool,
    /// Requested raster width; rounded down to a multiple of 4.
    pub texture_width: u32,
    /// Requested raster height; 0 means "same as width".
    pub texture_height: u32,
    /// World rectangle covered by the mask.
    pub placement: Placement,
    /// Defaults used by callers that do not build their own [`PaintOpts`].
    pub paint: PaintOpts,
    /// Upload a blurred copy of the mask as the sampled source.
    pub blur: bool,
    /// Blur radius in texels.
    pub blur_radius: u32,
    /// Gaussian sigma of the blur.
    pub blur_sigma: f32,
    /// Transition pool capacity.
    pub max_transitions: usize,
}

impl Default for FogOfWarOpts {
    fn default() -> Self {
        Self {
            enabled: true,
            texture_width: 256,
            texture_height: 0,
            placement: Placement::default(),
            paint: PaintOpts::default(),
            blur: false,
            blur_radius: 4,
            blur_sigma: 2.0,
            max_transitions: DEFAULT_POOL_CAPACITY,
        }
    }
}

impl FogOfWarOpts {
    /// Parse options from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> FogResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| FogError::serde(format!("parse fog options JSON: {e}")))
    }

    /// Parse options from a JSON string.
    pub fn from_json_str(s: &str) -> FogResult<Self> {
        serde_json::from_str(s).map_err(|e| FogError::serde(format!("parse fog options JSON: {e}")))
    }

    /// Parse options from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> FogResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            FogError::validation(format!("open fog options JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Serialize to pretty JSON.
    pub fn to_json_string(&self) -> FogResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| FogError::serde(format!("serialize fog options: {e}")))
    }

    /// Effective raster width.
    pub fn width(&self) -> u32 {
        aligned_dimension(self.texture_width)
    }

    /// Effective raster height.
    pub fn height(&self) -> u32 {
        if self.texture_height == 0 {
            self.width()
        } else {
            aligned_dimension(self.texture_height)
        }
    }

    /// Blur kernel parameters when blur is enabled.
    pub(crate) fn blur_kernel(&self) -> Option<(u32, f32)> {
        self.blur.then_some((self.blur_radius, self.blur_sigma))
    }

    /// Check ranges and the world placement.
    pub fn validate(&self) -> FogResult<()> {
        if self.width() > MAX_DIMENSION || self.height() > MAX_DIMENSION {
            return Err(FogError::validation(format!(
                "texture dimensions must be <= {MAX_DIMENSION}"
            )));
        }
        if self.max_transitions == 0 {
            return Err(FogError::validation("max_transitions must be > 0"));
        }
        if self.max_transitions > u32::MAX as usize {
            return Err(FogError::validation("max_transitions must fit in u32"));
        }
        if self.blur {
            if self.blur_radius > MAX_BLUR_RADIUS {
                return Err(FogError::validation(format!(
                    "blur_radius must be <= {MAX_BLUR_RADIUS}"
                )));
            }
            if !self.blur_sigma.is_finite() || self.blur_sigma <= 0.0 {
                return Err(FogError::validation("blur_sigma must be > 0"));
            }
        }
        self.placement.validate()?;
        self.paint.validate()
    }
}

#[cfg(test)]
#[path = "../tests/unit/config/config.rs"]
mod tests;
