//! WGSL source of the tracer.
//!
//! The uniform struct declarations are not written here: they are generated
//! from the host-side layout and prepended, so both sides always agree on
//! every offset. Shader bodies only refer to the bound variable `u`.

/// Vertex pass-through for the full-screen quad plus the Whitted-style tracer.
pub const TRACER_WGSL: &str = r#"
const MATERIAL_DEFAULT: i32 = 1;
const MATERIAL_LIGHT: i32 = 2;
const MATERIAL_GLASS: i32 = 3;

const BIG: f32 = 1000000.0;
const EPSILON: f32 = 0.001;
const MAX_DEPTH: i32 = 6;
const STACK_SIZE: i32 = 8;
const MIN_WEIGHT: f32 = 0.01;
const BACKGROUND: vec3<f32> = vec3<f32>(0.0, 0.0, 0.0);

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) ndc: vec2<f32>,
};

@vertex
fn vs_main(@location(0) position: vec2<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = vec4<f32>(position, 0.0, 1.0);
    out.ndc = position;
    return out;
}

struct Ray {
    origin: vec3<f32>,
    direction: vec3<f32>,
};

struct Hit {
    t: f32,
    point: vec3<f32>,
    normal: vec3<f32>,
    material: i32,
};

struct TracedRay {
    ray: Ray,
    weight: f32,
    depth: i32,
};

fn intersect_sphere(ray: Ray, center: vec3<f32>, radius: f32) -> f32 {
    let oc = ray.origin - center;
    let b = dot(oc, ray.direction);
    let c = dot(oc, oc) - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return BIG;
    }
    let s = sqrt(disc);
    var t = -b - s;
    if t < EPSILON {
        t = -b + s;
    }
    if t < EPSILON {
        return BIG;
    }
    return t;
}

fn intersect_triangle(ray: Ray, v1: vec3<f32>, v2: vec3<f32>, v3: vec3<f32>) -> f32 {
    let e1 = v2 - v1;
    let e2 = v3 - v1;
    let p = cross(ray.direction, e2);
    let det = dot(e1, p);
    if abs(det) < 0.000001 {
        return BIG;
    }
    let inv = 1.0 / det;
    let s = ray.origin - v1;
    let a = dot(s, p) * inv;
    if a < 0.0 || a > 1.0 {
        return BIG;
    }
    let q = cross(s, e1);
    let b = dot(ray.direction, q) * inv;
    if b < 0.0 || a + b > 1.0 {
        return BIG;
    }
    let t = dot(e2, q) * inv;
    if t < EPSILON {
        return BIG;
    }
    return t;
}

fn inside_edge(a: vec3<f32>, b: vec3<f32>, p: vec3<f32>, n: vec3<f32>) -> bool {
    return dot(cross(b - a, p - a), n) >= 0.0;
}

fn intersect_pentagon(ray: Ray, pg: Pentagon) -> f32 {
    let n = normalize(cross(pg.v2 - pg.v1, pg.v3 - pg.v1));
    let denom = dot(n, ray.direction);
    if abs(denom) < 0.000001 {
        return BIG;
    }
    let t = dot(pg.v1 - ray.origin, n) / denom;
    if t < EPSILON {
        return BIG;
    }
    let p = ray.origin + ray.direction * t;
    if inside_edge(pg.v1, pg.v2, p, n) && inside_edge(pg.v2, pg.v3, p, n)
        && inside_edge(pg.v3, pg.v4, p, n) && inside_edge(pg.v4, pg.v5, p, n)
        && inside_edge(pg.v5, pg.v1, p, n) {
        return t;
    }
    return BIG;
}

fn raytrace(ray: Ray) -> Hit {
    var hit: Hit;
    hit.t = BIG;
    hit.material = -1;

    for (var i = 0; i < u.triangles_used; i++) {
        let tri = u.triangles[i];
        let t = intersect_triangle(ray, tri.v1, tri.v2, tri.v3);
        if t < hit.t {
            hit.t = t;
            hit.normal = normalize(cross(tri.v2 - tri.v1, tri.v3 - tri.v1));
            hit.material = tri.MaterialId;
        }
    }

    for (var i = 0; i < u.spheres_used; i++) {
        let sph = u.spheres[i];
        let t = intersect_sphere(ray, sph.center, sph.radius);
        if t < hit.t {
            hit.t = t;
            hit.normal = normalize(ray.origin + ray.direction * t - sph.center);
            hit.material = sph.MaterialId;
        }
    }

    for (var i = 0; i < u.pentagons_used; i++) {
        let pg = u.pentagons[i];
        let t = intersect_pentagon(ray, pg);
        if t < hit.t {
            hit.t = t;
            hit.normal = normalize(cross(pg.v2 - pg.v1, pg.v3 - pg.v1));
            hit.material = pg.MaterialId;
        }
    }

    hit.point = ray.origin + ray.direction * hit.t;
    return hit;
}

fn in_shadow(point: vec3<f32>, normal: vec3<f32>) -> bool {
    let to_light = u.uLight.position - point;
    let dist = length(to_light);
    var shadow_ray: Ray;
    shadow_ray.direction = to_light / dist;
    shadow_ray.origin = point + normal * EPSILON;
    let blocker = raytrace(shadow_ray);
    return blocker.t < dist && u.materials[blocker.material].MaterialType != MATERIAL_LIGHT;
}

fn phong(hit: Hit, normal: vec3<f32>, direction: vec3<f32>) -> vec3<f32> {
    let mat = u.materials[hit.material];
    let k = mat.lightCoeffs;
    let l = normalize(u.uLight.position - hit.point);
    var visible = 1.0;
    if in_shadow(hit.point, normal) {
        visible = 0.0;
    }
    let diffuse = max(dot(l, normal), 0.0) * k.y * visible;
    let specular = pow(max(dot(reflect(-l, normal), -direction), 0.0), max(k.w, 1.0)) * k.z * visible;
    return mat.color * (k.x + diffuse) + vec3<f32>(specular);
}

fn trace(primary: Ray) -> vec3<f32> {
    var stack: array<TracedRay, 8>;
    var top = 0;
    stack[0] = TracedRay(primary, 1.0, 0);
    top = 1;

    var color = vec3<f32>(0.0);
    loop {
        if top == 0 {
            break;
        }
        top -= 1;
        let current = stack[top];
        let ray = current.ray;
        let hit = raytrace(ray);
        if hit.material < 0 {
            color += current.weight * BACKGROUND;
            continue;
        }

        let mat = u.materials[hit.material];
        let entering = dot(ray.direction, hit.normal) < 0.0;
        var normal = hit.normal;
        if !entering {
            normal = -normal;
        }
        let deeper = current.depth + 1 < MAX_DEPTH;

        if mat.MaterialType == MATERIAL_LIGHT {
            color += current.weight * mat.color;
        } else if mat.MaterialType == MATERIAL_GLASS {
            let local = 1.0 - mat.reflectionCoef - mat.refractionCoef;
            color += current.weight * max(local, 0.0) * phong(hit, normal, ray.direction);

            var eta = mat.refractionIndex;
            if entering {
                eta = 1.0 / mat.refractionIndex;
            }
            let reflected = reflect(ray.direction, normal);
            let refracted = refract(ray.direction, normal, eta);

            let w_refl = current.weight * mat.reflectionCoef;
            let w_refr = current.weight * mat.refractionCoef;
            var refr_dir = refracted;
            if dot(refracted, refracted) == 0.0 {
                // Total internal reflection: the transmitted share reflects too.
                refr_dir = reflected;
            }

            if deeper && w_refl > MIN_WEIGHT && top < STACK_SIZE {
                stack[top] = TracedRay(Ray(hit.point + reflected * EPSILON, reflected), w_refl, current.depth + 1);
                top += 1;
            }
            if deeper && w_refr > MIN_WEIGHT && top < STACK_SIZE {
                stack[top] = TracedRay(Ray(hit.point + refr_dir * EPSILON, refr_dir), w_refr, current.depth + 1);
                top += 1;
            }
        } else {
            let local = phong(hit, normal, ray.direction);
            color += current.weight * (1.0 - mat.reflectionCoef) * local;

            let w_refl = current.weight * mat.reflectionCoef;
            if deeper && w_refl > MIN_WEIGHT && top < STACK_SIZE {
                let reflected = reflect(ray.direction, normal);
                stack[top] = TracedRay(Ray(hit.point + reflected * EPSILON, reflected), w_refl, current.depth + 1);
                top += 1;
            }
        }
    }
    return color;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let cam = u.uCamera;
    var ray: Ray;
    ray.origin = cam.position;
    ray.direction = normalize(
        cam.view + cam.right * (in.ndc.x * cam.scale.x) + cam.up * (in.ndc.y * cam.scale.y)
    );
    let color = trace(ray);
    return vec4<f32>(clamp(color, vec3<f32>(0.0), vec3<f32>(1.0)), 1.0);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracer_declares_both_entry_points() {
        assert!(TRACER_WGSL.contains("fn vs_main("));
        assert!(TRACER_WGSL.contains("fn fs_main("));
    }

    #[test]
    fn tracer_does_not_redeclare_uniform_structs() {
        for name in ["Camera", "Light", "Triangle", "Sphere", "Pentagon", "Material"] {
            assert!(!TRACER_WGSL.contains(&format!("struct {name} ")));
        }
        assert!(!TRACER_WGSL.contains("var<uniform>"));
    }

    #[test]
    fn material_constants_match_host_wire_values() {
        use rtdemo_scene::MaterialType;
        for (ty, decl) in [
            (MaterialType::Default, "MATERIAL_DEFAULT: i32 = "),
            (MaterialType::Light, "MATERIAL_LIGHT: i32 = "),
            (MaterialType::Glass, "MATERIAL_GLASS: i32 = "),
        ] {
            assert!(TRACER_WGSL.contains(&format!("{decl}{};", ty.wire())));
        }
    }
}
