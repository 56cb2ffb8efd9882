/// Output viewport size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

impl ViewportSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Per-axis maximum of the document and window client areas.
    pub fn from_client_areas(document: (u32, u32), window: (u32, u32)) -> Self {
        Self {
            width: document.0.max(window.0),
            height: document.1.max(window.1),
        }
    }

    /// Width over height; a zero height counts as one pixel.
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}
