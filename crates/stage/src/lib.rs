//! The lighting scene.
//!
//! A fixed scene (spinning box, torus knot and extruded text over a mirror
//! floor, lit by two shadow-casting spotlights) plus the frame loop that
//! drives it.
//!
//! # Invariants
//! - The scene graph holds exactly the nodes added at construction.
//! - The frame counter only increases, and only while the scene is running.
//! - Within a frame, animation updates finish before either render pass.
//! - The floor is hidden during the mirror pass and visible afterwards.

mod animation;
mod lighting_scene;
mod orbit;
mod settings;
mod viewport;

pub use animation::{Animator, Spin};
pub use lighting_scene::LightingScene;
pub use orbit::CameraOrbit;
pub use settings::{SettingsError, StageSettings};
pub use viewport::ViewportSize;
