use mirrorlight_scene::{PerspectiveCamera, RenderTargetId, SceneError, SceneGraph};

/// Where a render pass draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTarget {
    /// The visible output surface.
    Screen,
    /// An offscreen target registered with the scene graph. It is cleared
    /// before drawing.
    Offscreen(RenderTargetId),
}

/// Errors surfaced by render backends.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("no compatible graphics adapter found")]
    NoAdapter,
    #[error("failed to create graphics device: {0}")]
    Device(String),
    #[error("failed to create output surface: {0}")]
    Surface(String),
    #[error("output surface unavailable: {0}")]
    SurfaceUnavailable(String),
    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Renderer-agnostic interface. All backends implement this trait.
pub trait RenderBackend {
    /// Resize the output surface. Offscreen targets keep their own size.
    fn set_size(&mut self, width: u32, height: u32);

    /// Current output surface size in pixels.
    fn size(&self) -> (u32, u32);

    /// Draw `scene` as seen from `camera` into `target`.
    fn render(
        &mut self,
        scene: &SceneGraph,
        camera: &PerspectiveCamera,
        target: RenderTarget,
    ) -> Result<(), RenderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_errors_convert() {
        let err: RenderError = SceneError::TargetNotFound(RenderTargetId(1)).into();
        assert!(err.to_string().contains("render target not found"));
    }

    #[test]
    fn targets_compare() {
        let offscreen = RenderTarget::Offscreen(RenderTargetId(0));
        assert_ne!(RenderTarget::Screen, offscreen);
    }
}
