/// Lit program: textured material, one directional light, the camera
/// spotlight and up to eight point lights.
pub(crate) const LIT_SHADER: &str = r#"
const MAX_POINT_LIGHTS: u32 = 8u;

struct DirLight {
    direction: vec4<f32>,
    ambient: vec4<f32>,
    diffuse: vec4<f32>,
    specular: vec4<f32>,
}

struct SpotLight {
    position: vec4<f32>,
    direction: vec4<f32>,
    ambient: vec4<f32>,
    diffuse: vec4<f32>,
    specular: vec4<f32>,
    attenuation: vec4<f32>,
    cutoff: vec4<f32>,
}

struct PointLight {
    position: vec4<f32>,
    color: vec4<f32>,
    ambient: vec4<f32>,
    diffuse: vec4<f32>,
    specular: vec4<f32>,
    attenuation: vec4<f32>,
}

struct FrameUniform {
    projection: mat4x4<f32>,
    view: mat4x4<f32>,
    view_pos: vec4<f32>,
    flags: vec4<u32>,
    gamma: vec4<f32>,
    dir_light: DirLight,
    spot_light: SpotLight,
    point_lights: array<PointLight, 8>,
}

struct ObjectUniform {
    model: mat4x4<f32>,
    normal: mat3x4<f32>,
    material: vec4<f32>,
}

@group(0) @binding(0)
var<uniform> frame: FrameUniform;

@group(1) @binding(0)
var<uniform> object: ObjectUniform;

@group(2) @binding(0)
var diffuse_map: texture_2d<f32>;
@group(2) @binding(1)
var specular_map: texture_2d<f32>;
@group(2) @binding(2)
var material_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world_position = object.model * vec4<f32>(input.position, 1.0);
    out.clip_position = frame.projection * frame.view * world_position;
    out.world_pos = world_position.xyz;
    let normal_matrix = mat3x3<f32>(
        object.normal[0].xyz,
        object.normal[1].xyz,
        object.normal[2].xyz
    );
    out.normal = normalize(normal_matrix * input.normal);
    out.uv = input.uv;
    return out;
}

struct Surface {
    normal: vec3<f32>,
    view_dir: vec3<f32>,
    albedo: vec3<f32>,
    specular: vec3<f32>,
    shininess: f32,
}

fn diffuse_term(normal: vec3<f32>, light_dir: vec3<f32>) -> f32 {
    let lambert = max(dot(normal, light_dir), 0.0);
    if (frame.flags.y != 0u) {
        return floor(lambert * 4.0) / 4.0;
    }
    return lambert;
}

fn specular_term(surface: Surface, light_dir: vec3<f32>) -> f32 {
    var amount: f32;
    if (frame.flags.x != 0u) {
        let halfway = normalize(light_dir + surface.view_dir);
        amount = pow(max(dot(surface.normal, halfway), 0.0), surface.shininess);
    } else {
        let reflect_dir = reflect(-light_dir, surface.normal);
        amount = pow(max(dot(surface.view_dir, reflect_dir), 0.0), surface.shininess);
    }
    if (frame.flags.y != 0u) {
        return step(0.5, amount);
    }
    return amount;
}

fn falloff(coefficients: vec4<f32>, dist: f32) -> f32 {
    return 1.0 / (coefficients.x + coefficients.y * dist + coefficients.z * dist * dist);
}

fn directional_contribution(light: DirLight, surface: Surface) -> vec3<f32> {
    let light_dir = normalize(-light.direction.xyz);
    let ambient = light.ambient.xyz * surface.albedo;
    let diffuse = light.diffuse.xyz * diffuse_term(surface.normal, light_dir) * surface.albedo;
    let specular = light.specular.xyz * specular_term(surface, light_dir) * surface.specular;
    return ambient + diffuse + specular;
}

fn point_contribution(light: PointLight, surface: Surface, world_pos: vec3<f32>) -> vec3<f32> {
    let to_light = light.position.xyz - world_pos;
    let light_dir = normalize(to_light);
    let distance_falloff = falloff(light.attenuation, length(to_light));
    let tint = light.color.xyz;
    let ambient = light.ambient.xyz * tint * surface.albedo;
    let diffuse = light.diffuse.xyz * tint * diffuse_term(surface.normal, light_dir) * surface.albedo;
    let specular = light.specular.xyz * tint * specular_term(surface, light_dir) * surface.specular;
    return (ambient + diffuse + specular) * distance_falloff;
}

fn spot_contribution(light: SpotLight, surface: Surface, world_pos: vec3<f32>) -> vec3<f32> {
    let to_light = light.position.xyz - world_pos;
    let light_dir = normalize(to_light);
    let distance_falloff = falloff(light.attenuation, length(to_light));
    let theta = dot(light_dir, normalize(-light.direction.xyz));
    let epsilon = light.cutoff.x - light.cutoff.y;
    let cone = clamp((theta - light.cutoff.y) / epsilon, 0.0, 1.0);
    let ambient = light.ambient.xyz * surface.albedo;
    let diffuse = light.diffuse.xyz * diffuse_term(surface.normal, light_dir) * surface.albedo;
    let specular = light.specular.xyz * specular_term(surface, light_dir) * surface.specular;
    return (ambient + (diffuse + specular) * cone) * distance_falloff;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let albedo = textureSample(diffuse_map, material_sampler, input.uv).rgb;
    let specular_mask = textureSample(specular_map, material_sampler, input.uv).rgb;

    var surface: Surface;
    surface.normal = normalize(input.normal);
    surface.view_dir = normalize(frame.view_pos.xyz - input.world_pos);
    surface.albedo = albedo;
    surface.specular = specular_mask;
    surface.shininess = max(object.material.x, 1.0);

    var color = directional_contribution(frame.dir_light, surface);
    let count = min(frame.flags.w, MAX_POINT_LIGHTS);
    for (var i = 0u; i < count; i = i + 1u) {
        color += point_contribution(frame.point_lights[i], surface, input.world_pos);
    }
    color += spot_contribution(frame.spot_light, surface, input.world_pos);

    if (frame.flags.z != 0u) {
        color = pow(color, vec3<f32>(1.0 / frame.gamma.x));
    }
    return vec4<f32>(color, 1.0);
}
"#;

/// Lamp program: flat white marker cubes.
pub(crate) const LAMP_SHADER: &str = r#"
struct FrameUniform {
    projection: mat4x4<f32>,
    view: mat4x4<f32>,
}

struct ObjectUniform {
    model: mat4x4<f32>,
    normal: mat3x4<f32>,
    material: vec4<f32>,
}

@group(0) @binding(0)
var<uniform> frame: FrameUniform;

@group(1) @binding(0)
var<uniform> object: ObjectUniform;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> @builtin(position) vec4<f32> {
    return frame.projection * frame.view * object.model * vec4<f32>(input.position, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0);
}
"#;
