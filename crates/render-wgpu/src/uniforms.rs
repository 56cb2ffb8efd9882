use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use mirrorlight_scene::{Fog, Material, PerspectiveCamera, SpotLight};

/// Spotlights the colour shader can light with.
pub const MAX_LIGHTS: usize = 2;

/// Shading model codes read by the colour shader.
pub const MODEL_BASIC: f32 = 0.0;
pub const MODEL_LAMBERT: f32 = 1.0;
pub const MODEL_PHONG: f32 = 2.0;

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct LightUniform {
    pub view_proj: [[f32; 4]; 4],
    /// xyz position, w cosine of the cone half-angle.
    pub position: [f32; 4],
    /// xyz direction, w shadow darkness.
    pub direction: [f32; 4],
    /// rgb colour times intensity, w 1.0 when the light casts shadows.
    pub color: [f32; 4],
}

impl LightUniform {
    pub fn new(light: &SpotLight, position: Vec3, casts_shadow: bool) -> Self {
        let direction = (light.target - position).normalize_or(Vec3::NEG_Y);
        let c = light.color;
        Self {
            view_proj: light.shadow_view_projection(position).to_cols_array_2d(),
            position: position.extend(light.angle.cos()).to_array(),
            direction: direction.extend(light.shadow.darkness).to_array(),
            color: [
                c.r * light.intensity,
                c.g * light.intensity,
                c.b * light.intensity,
                if casts_shadow { 1.0 } else { 0.0 },
            ],
        }
    }

    pub fn casts_shadow(&self) -> bool {
        self.color[3] > 0.5
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct FrameUniform {
    pub view_proj: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    pub camera_forward: [f32; 4],
    pub fog_color: [f32; 4],
    /// x density, y 1.0 when fog is on, z light count.
    pub fog: [f32; 4],
    pub lights: [LightUniform; MAX_LIGHTS],
}

impl FrameUniform {
    /// Lights beyond [`MAX_LIGHTS`] are dropped.
    pub fn new(camera: &PerspectiveCamera, fog: Option<Fog>, lights: &[LightUniform]) -> Self {
        let count = lights.len().min(MAX_LIGHTS);
        let mut slots = [LightUniform::default(); MAX_LIGHTS];
        slots[..count].copy_from_slice(&lights[..count]);

        let (fog_color, density, enabled) = match fog {
            Some(f) => (f.color.to_array(), f.density, 1.0),
            None => ([0.0; 4], 0.0, 0.0),
        };

        Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            camera_position: camera.position.extend(1.0).to_array(),
            camera_forward: camera.forward().extend(0.0).to_array(),
            fog_color,
            fog: [density, enabled, count as f32, 0.0],
            lights: slots,
        }
    }

    pub fn light_count(&self) -> usize {
        self.fog[2] as usize
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
    pub color: [f32; 4],
    /// rgb specular colour, w shininess.
    pub specular: [f32; 4],
    /// x shading model, y opacity, z 1.0 when receiving shadows, w 1.0 when mapped.
    pub params: [f32; 4],
}

impl ObjectUniform {
    pub fn new(model: Mat4, material: &Material, receive_shadow: bool, mapped: bool) -> Self {
        let (code, specular) = match material {
            Material::Basic { .. } => (MODEL_BASIC, [0.0; 4]),
            Material::Lambert { .. } => (MODEL_LAMBERT, [0.0; 4]),
            Material::Phong {
                specular, shininess, ..
            } => (MODEL_PHONG, [specular.r, specular.g, specular.b, *shininess]),
        };
        Self {
            model: model.to_cols_array_2d(),
            normal: model.inverse().transpose().to_cols_array_2d(),
            color: material.color().to_array(),
            specular,
            params: [
                code,
                material.opacity(),
                if receive_shadow { 1.0 } else { 0.0 },
                if mapped { 1.0 } else { 0.0 },
            ],
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct ShadowUniform {
    pub view_proj: [[f32; 4]; 4],
}

/// Round `size` up to a multiple of `alignment`.
pub fn align_to(size: u64, alignment: u64) -> u64 {
    size.div_ceil(alignment) * alignment
}

/// Lay `items` out `stride` bytes apart, for dynamic-offset uniform buffers.
pub fn pack_strided<T: Pod>(items: &[T], stride: u64) -> Vec<u8> {
    let stride = stride as usize;
    let size = std::mem::size_of::<T>();
    debug_assert!(stride >= size);
    let mut bytes = vec![0u8; items.len() * stride];
    for (slot, item) in bytes.chunks_exact_mut(stride).zip(items) {
        slot[..size].copy_from_slice(bytemuck::bytes_of(item));
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirrorlight_common::Color;
    use mirrorlight_scene::RenderTargetId;

    #[test]
    fn uniform_sizes_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<LightUniform>(), 112);
        assert_eq!(std::mem::size_of::<FrameUniform>(), 128 + 2 * 112);
        assert_eq!(std::mem::size_of::<ObjectUniform>(), 176);
        assert_eq!(std::mem::size_of::<ShadowUniform>(), 64);
    }

    #[test]
    fn light_points_at_its_target() {
        let light = SpotLight::new(0xcccccc, 1.0);
        let u = LightUniform::new(&light, Vec3::new(100.0, 100.0, -100.0), true);
        let dir = Vec3::from_slice(&u.direction[..3]);
        let expected = Vec3::new(-1.0, -1.0, 1.0).normalize();
        assert!(dir.abs_diff_eq(expected, 1e-5));
        assert!((u.position[3] - 0.5).abs() < 1e-6);
        assert_eq!(u.direction[3], 0.5);
        assert!(u.casts_shadow());
    }

    #[test]
    fn extra_lights_are_dropped() {
        let cam = PerspectiveCamera::new(40.0, 1.0, 1.0, 100.0);
        let light = LightUniform::new(&SpotLight::new(0xffffff, 1.0), Vec3::Y, false);
        let frame = FrameUniform::new(&cam, None, &[light; 3]);
        assert_eq!(frame.light_count(), MAX_LIGHTS);
        assert_eq!(frame.fog[1], 0.0);
    }

    #[test]
    fn fog_is_packed() {
        let cam = PerspectiveCamera::new(40.0, 1.0, 1.0, 100.0);
        let frame = FrameUniform::new(&cam, Some(Fog::exp2(Color::WHITE, 0.005)), &[]);
        assert_eq!(frame.fog[0], 0.005);
        assert_eq!(frame.fog[1], 1.0);
        assert_eq!(frame.fog_color, [1.0; 4]);
        assert_eq!(frame.light_count(), 0);
    }

    #[test]
    fn object_codes_follow_material() {
        let model = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let basic = ObjectUniform::new(model, &Material::basic_map(RenderTargetId(0)), false, true);
        assert_eq!(basic.params, [MODEL_BASIC, 1.0, 0.0, 1.0]);

        let glass = Material::Phong {
            color: Color::WHITE,
            specular: Color::from_hex(0x111111),
            shininess: 60.0,
            opacity: 0.4,
            transparent: true,
        };
        let phong = ObjectUniform::new(model, &glass, true, false);
        assert_eq!(phong.params, [MODEL_PHONG, 0.4, 1.0, 0.0]);
        assert_eq!(phong.specular[3], 60.0);

        // Non-uniform scale: the normal matrix undoes the stretch.
        assert!((phong.normal[0][0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn strided_packing_pads_each_slot() {
        let items = [ShadowUniform {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
        }; 2];
        let bytes = pack_strided(&items, 256);
        assert_eq!(bytes.len(), 512);
        assert_eq!(&bytes[256..320], bytemuck::bytes_of(&items[1]));
        assert!(bytes[64..256].iter().all(|b| *b == 0));
        assert_eq!(align_to(176, 256), 256);
        assert_eq!(align_to(512, 256), 512);
    }
}
