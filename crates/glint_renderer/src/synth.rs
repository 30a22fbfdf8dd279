//! WGSL synthesis of the tracing program.
//!
//! The program is rebuilt from scratch whenever the object set, the material
//! kind or the environment changes. Its text is a fixed preamble followed by
//! every renderable's fragments, concatenated in scene order into the uniform
//! block, the shadow routine and the bounce loop.

use glint_core::{Environment, Light, MaterialKind, Renderable, Scene, UniformDecl};

use crate::UniformLayout;

/// Path segments traced per sample.
pub const BOUNCES: u32 = 5;
/// Offset applied along the normal before casting shadow rays.
pub const EPSILON: f32 = 1e-4;
/// Distance the program uses for "no hit".
pub const INFINITY: f32 = 10000.0;
/// Direct light contribution scale.
pub const LIGHT_VALUE: f32 = 0.5;

/// Light position used when the scene has no light.
const FALLBACK_LIGHT: &str = "vec3<f32>(0.4, 0.5, -0.6)";

/// Uniforms every program declares ahead of the per-object ones.
pub fn global_uniforms() -> Vec<UniformDecl> {
    vec![
        UniformDecl::vec3("eye"),
        UniformDecl::vec3("ray00"),
        UniformDecl::vec3("ray01"),
        UniformDecl::vec3("ray10"),
        UniformDecl::vec3("ray11"),
        UniformDecl::float("glossiness"),
        UniformDecl::float("time"),
        UniformDecl::float("texture_weight"),
        UniformDecl::vec3("resolution"),
    ]
}

/// A synthesized two-stage program and the layout of its uniform block.
///
/// Entry points are `vs_main` (full-screen strip of four vertices) and
/// `fs_main`. Binding 0 of group 0 is the uniform block, binding 1 the
/// previous accumulation target read with `textureLoad`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramSource {
    pub source: String,
    pub layout: UniformLayout,
}

impl ProgramSource {
    pub fn from_scene(scene: &Scene) -> Self {
        let renderables: Vec<&dyn Renderable> = scene.renderables().collect();
        synthesize(
            &renderables,
            scene.material().kind(),
            scene.environment(),
        )
    }
}

/// Build the tracing program for `renderables` in the given order.
pub fn synthesize(
    renderables: &[&dyn Renderable],
    material: MaterialKind,
    environment: Environment,
) -> ProgramSource {
    let layout = UniformLayout::new(
        global_uniforms()
            .into_iter()
            .chain(renderables.iter().flat_map(|r| r.uniforms())),
    );

    let concat = |emit: fn(&dyn Renderable) -> String| -> String {
        renderables.iter().map(|r| emit(*r)).collect()
    };

    let light = renderables
        .iter()
        .find_map(|r| r.light_position_expr())
        .unwrap_or_else(|| FALLBACK_LIGHT.to_string());

    let mut source = String::new();
    source.push_str(&constants());
    source.push_str(&layout.wgsl_struct());
    source.push_str(BINDINGS);
    source.push_str(VERTEX_STAGE);
    source.push_str(GEOMETRY);
    source.push_str(SAMPLING);

    // Shadow routine
    source.push_str("fn shadow(origin: vec3<f32>, ray: vec3<f32>) -> f32 {\n");
    source.push_str(&concat(|r| r.emit_shadow_test()));
    source.push_str("    return 1.0;\n}\n\n");

    source.push_str(&calculate_color(
        &concat(|r| r.emit_intersection_test()),
        &concat(|r| r.emit_nearest_hit_update()),
        &concat(|r| r.emit_normal_branch()),
        material,
        environment,
    ));
    source.push_str(&fragment_stage(&light));

    ProgramSource { source, layout }
}

fn constants() -> String {
    format!(
        "const BOUNCES: i32 = {BOUNCES};\n\
         const EPSILON: f32 = {EPSILON:?};\n\
         const INFINITY: f32 = {INFINITY:?};\n\
         const LIGHT_SIZE: f32 = {:?};\n\
         const LIGHT_VALUE: f32 = {LIGHT_VALUE:?};\n\
         const ROOM_MIN: vec3<f32> = vec3<f32>(-1.0, -1.0, -1.0);\n\
         const ROOM_MAX: vec3<f32> = vec3<f32>(1.0, 1.0, 1.0);\n\n",
        Light::SIZE
    )
}

const BINDINGS: &str = r#"
@group(0) @binding(0) var<uniform> u: Uniforms;
@group(0) @binding(1) var previous: texture_2d<f32>;

var<private> frag_coord: vec3<f32>;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) initial_ray: vec3<f32>,
}

"#;

const VERTEX_STAGE: &str = r#"@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> VertexOutput {
    let vertex = vec2<f32>(f32(index / 2u) * 2.0 - 1.0, f32(index % 2u) * 2.0 - 1.0);
    let percent = vertex * 0.5 + 0.5;
    var out: VertexOutput;
    out.initial_ray = mix(
        mix(u.ray00.xyz, u.ray01.xyz, percent.y),
        mix(u.ray10.xyz, u.ray11.xyz, percent.y),
        percent.x,
    );
    out.position = vec4<f32>(vertex, 0.0, 1.0);
    return out;
}

"#;

const GEOMETRY: &str = r#"// Near and far slab distances; no hit means x >= y.
fn intersect_cube(origin: vec3<f32>, ray: vec3<f32>, cube_min: vec3<f32>, cube_max: vec3<f32>) -> vec2<f32> {
    let t_min = (cube_min - origin) / ray;
    let t_max = (cube_max - origin) / ray;
    let t1 = min(t_min, t_max);
    let t2 = max(t_min, t_max);
    let t_near = max(max(t1.x, t1.y), t1.z);
    let t_far = min(min(t2.x, t2.y), t2.z);
    return vec2<f32>(t_near, t_far);
}

fn normal_for_cube(hit: vec3<f32>, cube_min: vec3<f32>, cube_max: vec3<f32>) -> vec3<f32> {
    if hit.x < cube_min.x + EPSILON {
        return vec3<f32>(-1.0, 0.0, 0.0);
    }
    if hit.x > cube_max.x - EPSILON {
        return vec3<f32>(1.0, 0.0, 0.0);
    }
    if hit.y < cube_min.y + EPSILON {
        return vec3<f32>(0.0, -1.0, 0.0);
    }
    if hit.y > cube_max.y - EPSILON {
        return vec3<f32>(0.0, 1.0, 0.0);
    }
    if hit.z < cube_min.z + EPSILON {
        return vec3<f32>(0.0, 0.0, -1.0);
    }
    return vec3<f32>(0.0, 0.0, 1.0);
}

fn intersect_sphere(origin: vec3<f32>, ray: vec3<f32>, center: vec3<f32>, radius: f32) -> f32 {
    let to_sphere = origin - center;
    let a = dot(ray, ray);
    let b = 2.0 * dot(to_sphere, ray);
    let c = dot(to_sphere, to_sphere) - radius * radius;
    let discriminant = b * b - 4.0 * a * c;
    if discriminant > 0.0 {
        let t = (-b - sqrt(discriminant)) / (2.0 * a);
        if t > 0.0 {
            return t;
        }
    }
    return INFINITY;
}

fn normal_for_sphere(hit: vec3<f32>, center: vec3<f32>, radius: f32) -> vec3<f32> {
    return (hit - center) / radius;
}

"#;

const SAMPLING: &str = r#"// Hash of the fragment position and a seed, in the unit interval.
fn random(scale: vec3<f32>, seed: f32) -> f32 {
    return fract(sin(dot(frag_coord + seed, scale)) * 43758.5453 + seed);
}

fn cosine_weighted_direction(seed: f32, normal: vec3<f32>) -> vec3<f32> {
    let r1 = random(vec3<f32>(12.9898, 78.233, 151.7182), seed);
    let r2 = random(vec3<f32>(63.7264, 10.873, 623.6736), seed);
    let r = sqrt(r1);
    let angle = 6.2831853 * r2;
    var sdir: vec3<f32>;
    if abs(normal.x) < 0.5 {
        sdir = cross(normal, vec3<f32>(1.0, 0.0, 0.0));
    } else {
        sdir = cross(normal, vec3<f32>(0.0, 1.0, 0.0));
    }
    let tdir = cross(normal, sdir);
    return r * cos(angle) * sdir + r * sin(angle) * tdir + sqrt(1.0 - r1) * normal;
}

fn uniformly_random_direction(seed: f32) -> vec3<f32> {
    let r1 = random(vec3<f32>(12.9898, 78.233, 151.7182), seed);
    let r2 = random(vec3<f32>(63.7264, 10.873, 623.6736), seed);
    let z = 1.0 - 2.0 * r1;
    let r = sqrt(1.0 - z * z);
    let angle = 6.2831853 * r2;
    return vec3<f32>(r * cos(angle), r * sin(angle), z);
}

fn uniformly_random_vector(seed: f32) -> vec3<f32> {
    return uniformly_random_direction(seed) * sqrt(random(vec3<f32>(36.7539, 50.3658, 306.2759), seed));
}

"#;

const DIFFUSE_BOUNCE: &str =
    "            ray = cosine_weighted_direction(u.time.x + f32(bounce), normal);\n";

const SPECULAR_REFLECTION: &str = "            let reflected_light = normalize(reflect(light - hit, normal));
            specular_highlight = max(0.0, dot(reflected_light, normalize(hit - origin)));
";

fn material_bounce(material: MaterialKind) -> String {
    match material {
        MaterialKind::Diffuse => DIFFUSE_BOUNCE.to_string(),
        MaterialKind::Mirror => format!(
            "            ray = reflect(ray, normal);\n{SPECULAR_REFLECTION}\
             \x20           specular_highlight = 2.0 * pow(specular_highlight, 20.0);\n"
        ),
        MaterialKind::Glossy => format!(
            "            ray = normalize(reflect(ray, normal)) + uniformly_random_vector(u.time.x + f32(bounce)) * u.glossiness.x;\n\
             {SPECULAR_REFLECTION}\
             \x20           specular_highlight = pow(specular_highlight, 3.0);\n"
        ),
    }
}

fn wall_palette(environment: Environment) -> String {
    let ([lr, lg, lb], [rr, rg, rb]) = environment.wall_colors();
    format!(
        "            if hit.x < -0.9999 {{ surface_color = vec3<f32>({lr:?}, {lg:?}, {lb:?}); }} \
         else if hit.x > 0.9999 {{ surface_color = vec3<f32>({rr:?}, {rg:?}, {rb:?}); }}\n"
    )
}

fn calculate_color(
    intersections: &str,
    nearest_hits: &str,
    normal_branches: &str,
    material: MaterialKind,
    environment: Environment,
) -> String {
    format!(
        r#"fn calculate_color(eye: vec3<f32>, initial_ray: vec3<f32>, light: vec3<f32>) -> vec3<f32> {{
    var origin = eye;
    var ray = initial_ray;
    var color_mask = vec3<f32>(1.0);
    var accumulated_color = vec3<f32>(0.0);
    for (var bounce = 0; bounce < BOUNCES; bounce++) {{
        let t_room = intersect_cube(origin, ray, ROOM_MIN, ROOM_MAX);
{intersections}
        var t = INFINITY;
        if t_room.x < t_room.y {{ t = t_room.y; }}
{nearest_hits}
        let hit = origin + ray * t;
        var surface_color = vec3<f32>(0.75);
        var specular_highlight = 0.0;
        var normal = vec3<f32>(0.0);
        if t == t_room.y {{
            normal = -normal_for_cube(hit, ROOM_MIN, ROOM_MAX);
{palette}{diffuse}        }} else if t == INFINITY {{
            break;
        }} else {{
            if false {{ }}{normal_branches}
{bounce}        }}

        let to_light = light - hit;
        let diffuse = max(0.0, dot(normalize(to_light), normal));
        let shadow_intensity = shadow(hit + normal * EPSILON, to_light);
        color_mask *= surface_color;
        accumulated_color += color_mask * (LIGHT_VALUE * diffuse * shadow_intensity);
        accumulated_color += color_mask * specular_highlight * shadow_intensity;
        origin = hit;
    }}
    return accumulated_color;
}}

"#,
        palette = wall_palette(environment),
        diffuse = DIFFUSE_BOUNCE,
        bounce = material_bounce(material),
    )
}

fn fragment_stage(light: &str) -> String {
    format!(
        r#"@fragment
fn fs_main(vertex_out: VertexOutput) -> @location(0) vec4<f32> {{
    frag_coord = vertex_out.position.xyz;
    let new_light = {light} + uniformly_random_vector(u.time.x - 53.0) * LIGHT_SIZE;
    let texel = vec2<i32>(min(vertex_out.position.xy, u.resolution.xy - 1.0));
    let previous_color = textureLoad(previous, texel, 0).rgb;
    let radiance = calculate_color(u.eye.xyz, vertex_out.initial_ray, new_light);
    return vec4<f32>(mix(radiance, previous_color, u.texture_weight.x), 1.0);
}}
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_core::Template;

    fn column_scene() -> Scene {
        let mut scene = Scene::new();
        scene.load_template(Template::SphereColumn);
        scene
    }

    #[test]
    fn test_program_has_both_stages() {
        let program = ProgramSource::from_scene(&column_scene());

        assert!(program.source.contains("fn vs_main("));
        assert!(program.source.contains("fn fs_main("));
        assert!(program.source.contains("const BOUNCES: i32 = 5;"));
        assert!(program.source.contains("const INFINITY: f32 = 10000.0;"));
        assert!(program.source.contains("const LIGHT_SIZE: f32 = 0.1;"));
    }

    #[test]
    fn test_layout_lists_globals_then_objects() {
        let scene = column_scene();
        let program = ProgramSource::from_scene(&scene);
        let names: Vec<&str> = program
            .layout
            .decls()
            .iter()
            .map(|d| d.name.as_str())
            .collect();

        assert_eq!(&names[..9], &[
            "eye", "ray00", "ray01", "ray10", "ray11", "glossiness", "time", "texture_weight",
            "resolution"
        ]);
        assert_eq!(names[9], "light_0");
        // Four spheres with two uniforms each
        assert_eq!(names.len(), 10 + 8);
        assert!(program.source.contains("    sphere_radius_4: vec4<f32>,\n"));
    }

    #[test]
    fn test_object_fragments_in_scene_order() {
        let scene = column_scene();
        let source = ProgramSource::from_scene(&scene).source;
        let ids: Vec<String> = scene.objects().iter().map(|o| o.id().to_string()).collect();

        let positions: Vec<usize> = ids
            .iter()
            .map(|id| source.find(&format!("let t_sphere_{id} = ")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));

        // Each object appears in the shadow routine and in the bounce loop
        for id in &ids {
            assert_eq!(source.matches(&format!("let t_sphere_{id} = ")).count(), 2);
            assert!(source.contains(&format!("else if t == t_sphere_{id} ")));
        }
    }

    #[test]
    fn test_uniform_names_unique_after_edits() {
        let mut scene = column_scene();
        let first = scene.objects()[0].id();
        scene.select(first);
        scene.delete_selection();
        scene.add_sphere();
        scene.add_cube();

        let program = ProgramSource::from_scene(&scene);
        let expected: usize = scene.renderables().map(|r| r.uniforms().len()).sum();
        assert_eq!(program.layout.len(), global_uniforms().len() + expected);
    }

    #[test]
    fn test_light_expression_used() {
        let program = ProgramSource::from_scene(&Scene::new());
        assert!(program
            .source
            .contains("let new_light = u.light_0.xyz + uniformly_random_vector"));

        let empty = synthesize(&[], MaterialKind::Diffuse, Environment::YellowBlue);
        assert!(empty.source.contains(FALLBACK_LIGHT));
        assert!(empty.source.contains("if false { }\n"));
    }

    #[test]
    fn test_material_selects_bounce() {
        let scene = column_scene();
        let renderables: Vec<&dyn Renderable> = scene.renderables().collect();

        let mirror = synthesize(&renderables, MaterialKind::Mirror, Environment::YellowBlue);
        assert!(mirror.source.contains("ray = reflect(ray, normal);"));
        assert!(mirror.source.contains("pow(specular_highlight, 20.0)"));

        let glossy = synthesize(&renderables, MaterialKind::Glossy, Environment::YellowBlue);
        assert!(glossy.source.contains("* u.glossiness.x;"));
        assert!(glossy.source.contains("pow(specular_highlight, 3.0)"));

        let diffuse = synthesize(&renderables, MaterialKind::Diffuse, Environment::YellowBlue);
        assert!(!diffuse.source.contains("specular_highlight = max"));
    }

    #[test]
    fn test_environment_palette() {
        let yellow_blue = synthesize(&[], MaterialKind::Diffuse, Environment::YellowBlue);
        assert!(yellow_blue.source.contains("vec3<f32>(0.1, 0.5, 1.0)"));
        assert!(yellow_blue.source.contains("vec3<f32>(1.0, 0.9, 0.1)"));

        let red_green = synthesize(&[], MaterialKind::Diffuse, Environment::RedGreen);
        assert!(red_green.source.contains("vec3<f32>(1.0, 0.3, 0.1)"));
        assert!(red_green.source.contains("vec3<f32>(0.3, 1.0, 0.1)"));
    }

    #[test]
    fn test_braces_balanced() {
        let mut scene = Scene::new();
        scene.load_template(Template::TableAndChair);
        scene.set_material_kind(MaterialKind::Glossy);
        let source = ProgramSource::from_scene(&scene).source;

        assert_eq!(source.matches('{').count(), source.matches('}').count());
        assert_eq!(source.matches('(').count(), source.matches(')').count());
    }
}
