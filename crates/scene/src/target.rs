use serde::{Deserialize, Serialize};

/// Handle to an offscreen render target registered with a scene graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RenderTargetId(pub u32);

/// Pixel layout requested for a render target.
///
/// Backends are free to pad `Rgb` to four channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextureFormat {
    Rgb,
    Rgba,
}

/// Offscreen surface description. GPU resources are created lazily by the
/// backend the first time the target is drawn into or sampled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderTargetDesc {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

impl RenderTargetDesc {
    pub fn new(label: impl Into<String>, width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            label: label.into(),
            width: width.max(1),
            height: height.max(1),
            format,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sized_target_is_clamped() {
        let desc = RenderTargetDesc::new("empty", 0, 0, TextureFormat::Rgb);
        assert_eq!((desc.width, desc.height), (1, 1));
    }
}
