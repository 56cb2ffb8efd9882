/// WGSL shader for meshes: basic (optionally mapped), lambert and phong
/// shading with spotlight cones, PCF shadows and exp2 fog.
pub const SCENE_SHADER: &str = r#"
const MAX_LIGHTS: u32 = 2u;

struct Light {
    view_proj: mat4x4<f32>,
    // w: cosine of the cone half-angle
    position: vec4<f32>,
    // w: shadow darkness
    direction: vec4<f32>,
    // rgb premultiplied by intensity, w: casts shadows
    color: vec4<f32>,
};

struct Frame {
    view_proj: mat4x4<f32>,
    camera_position: vec4<f32>,
    camera_forward: vec4<f32>,
    fog_color: vec4<f32>,
    // x: density, y: enabled, z: light count
    fog: vec4<f32>,
    lights: array<Light, 2>,
};

struct Object {
    model: mat4x4<f32>,
    normal: mat4x4<f32>,
    color: vec4<f32>,
    // w: shininess
    specular: vec4<f32>,
    // x: shading model, y: opacity, z: receives shadows, w: mapped
    params: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> frame: Frame;
@group(0) @binding(1)
var shadow_maps: texture_depth_2d_array;
@group(0) @binding(2)
var shadow_sampler: sampler_comparison;

@group(1) @binding(0)
var<uniform> object: Object;

@group(2) @binding(0)
var map_texture: texture_2d<f32>;
@group(2) @binding(1)
var map_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    let world = object.model * vec4<f32>(vertex.position, 1.0);
    var out: VertexOutput;
    out.clip_position = frame.view_proj * world;
    out.world_position = world.xyz;
    out.world_normal = (object.normal * vec4<f32>(vertex.normal, 0.0)).xyz;
    out.uv = vertex.uv;
    return out;
}

fn shadow_factor(index: u32, world_position: vec3<f32>) -> f32 {
    let light = frame.lights[index];
    if light.color.w < 0.5 || object.params.z < 0.5 {
        return 1.0;
    }
    let clip = light.view_proj * vec4<f32>(world_position, 1.0);
    if clip.w <= 0.0 {
        return 1.0;
    }
    let ndc = clip.xyz / clip.w;
    let uv = vec2<f32>(ndc.x * 0.5 + 0.5, 0.5 - ndc.y * 0.5);
    if any(uv < vec2<f32>(0.0)) || any(uv > vec2<f32>(1.0)) || ndc.z > 1.0 {
        return 1.0;
    }
    let texel = 1.0 / f32(textureDimensions(shadow_maps).x);
    var lit = 0.0;
    for (var y = -1; y <= 1; y++) {
        for (var x = -1; x <= 1; x++) {
            let offset = vec2<f32>(f32(x), f32(y)) * texel;
            lit += textureSampleCompareLevel(shadow_maps, shadow_sampler, uv + offset, index, ndc.z - 0.0005);
        }
    }
    return mix(1.0 - light.direction.w, 1.0, lit / 9.0);
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    // Render targets are stored top row first.
    let mapped = textureSample(map_texture, map_sampler, vec2<f32>(in.uv.x, 1.0 - in.uv.y));
    let model = u32(object.params.x + 0.5);
    var color = object.color.rgb;

    if model == 0u {
        if object.params.w > 0.5 {
            color *= mapped.rgb;
        }
    } else {
        let normal = normalize(in.world_normal);
        let view_dir = normalize(frame.camera_position.xyz - in.world_position);
        var diffuse = vec3<f32>(0.0);
        var specular = vec3<f32>(0.0);
        let count = min(u32(frame.fog.z), MAX_LIGHTS);
        for (var i = 0u; i < count; i++) {
            let light = frame.lights[i];
            let to_light = normalize(light.position.xyz - in.world_position);
            if dot(-to_light, normalize(light.direction.xyz)) <= light.position.w {
                continue;
            }
            let radiance = light.color.rgb * shadow_factor(i, in.world_position);
            diffuse += radiance * max(dot(normal, to_light), 0.0);
            if model == 2u {
                let half_dir = normalize(to_light + view_dir);
                let highlight = pow(max(dot(normal, half_dir), 0.0), object.specular.w);
                specular += radiance * object.specular.rgb * highlight;
            }
        }
        color = color * diffuse + specular;
    }

    if frame.fog.y > 0.5 {
        let depth = dot(in.world_position - frame.camera_position.xyz, frame.camera_forward.xyz);
        let d = frame.fog.x * depth;
        color = mix(color, frame.fog_color.rgb, clamp(1.0 - exp(-d * d), 0.0, 1.0));
    }

    return vec4<f32>(color, object.params.y);
}
"#;

/// WGSL shader for the spotlight depth passes.
pub const SHADOW_SHADER: &str = r#"
struct ShadowPass {
    view_proj: mat4x4<f32>,
};

struct Object {
    model: mat4x4<f32>,
    normal: mat4x4<f32>,
    color: vec4<f32>,
    specular: vec4<f32>,
    params: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> light: ShadowPass;

@group(1) @binding(0)
var<uniform> object: Object;

@vertex
fn vs_shadow(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return light.view_proj * object.model * vec4<f32>(position, 1.0);
}
"#;
