//! Integration tests for the bake pipeline on small synthetic scenes.

use std::sync::Arc;

use lightbake::bake::{estimate_shadow, march_shadow_ray, Sun};
use lightbake::prelude::*;
use lightbake::random;
use lightbake::sampling::{sample_cosine_weighted_hemisphere, sample_vogel_disk};
use lightbake::util::{Color4, Mat3};

fn context(scene: Scene) -> BvhContext {
    BvhContext::new(Arc::new(scene)).expect("Failed to build context")
}

fn point_at(position: Vec3) -> LightMapPoint {
    LightMapPoint::new(PointState::new(position, Mat3::IDENTITY), 0, 0)
}

fn variance(values: &[f32]) -> f32 {
    let mean = values.iter().sum::<f32>() / values.len() as f32;
    values.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / (values.len() - 1) as f32
}

#[test]
fn test_cosine_and_vogel_bounds() {
    for i in 0..4096u32 {
        let u1 = (i % 64) as f32 / 64.0;
        let u2 = (i / 64) as f32 / 64.0;
        let d = sample_cosine_weighted_hemisphere(u1, u2);
        assert!((0.0..=1.0).contains(&d.z));
        assert!((d.length() - 1.0).abs() <= 1e-4);
    }

    for count in 1..64 {
        for index in 0..count {
            let s = sample_vogel_disk(index, count, random::next() * 6.283);
            assert!(s.length() <= 1.0 + 1e-4);
        }
    }
}

#[test]
fn test_empty_scene_path_trace_is_environment() {
    let ctx = context(Scene::new());
    let params = BakeParams::default();

    for _ in 0..100 {
        let origin = Vec3::new(random::next(), random::next(), random::next()) * 100.0 - 50.0;
        let direction = lightbake::sampling::sample_direction_sphere(random::next(), random::next());
        let result = path_trace(&ctx, origin, direction, &params, false);
        assert_eq!(result.radiance, lightbake::bake::sample_sky(direction, &params));
        assert_eq!(result.surface, lightbake::bake::Surface::Miss);
    }
}

#[test]
fn test_variance_falls_with_sample_count() {
    let mut scene = Scene::new();
    let emitter = scene.add_material(Material {
        emissive: Color3::ONE,
        ..Material::diffuse("emitter", Color3::ZERO)
    });
    // Faces down, covers part of the point's hemisphere
    scene.add_mesh(Mesh::quad("panel", Vec3::new(5.0, 0.0, 1.0), Vec3::Y * 5.0, Vec3::X * 5.0).with_material(emitter));
    let ctx = context(scene);

    let runs = 64;
    let mut variances = Vec::new();
    for sample_count in [1, 4, 16, 64] {
        let params = BakeParams {
            light_sample_count: sample_count,
            environment_color_intensity: 0.0,
            ..Default::default()
        };

        let estimates: Vec<f32> = (0..runs)
            .map(|run| {
                random::reseed(0x5EED + run as u64);
                let mut points = vec![point_at(Vec3::ZERO)];
                bake(&ctx, &mut points, &params);
                points[0].colors()[0].x
            })
            .collect();

        variances.push(variance(&estimates));
    }

    for pair in variances.windows(2) {
        assert!(pair[1] < pair[0], "variance did not fall: {variances:?}");
    }
}

#[test]
fn test_backface_dominated_point_discarded() {
    let mut scene = Scene::new();
    // Faces up, so the point below only ever sees its back
    scene.add_mesh(Mesh::quad("slab", Vec3::new(0.0, 0.0, 1.0), Vec3::X * 1000.0, Vec3::Y * 1000.0));
    let ctx = context(scene);

    let params = BakeParams { light_sample_count: 16, ..Default::default() };
    let mut points = vec![point_at(Vec3::ZERO), point_at(Vec3::new(0.0, 0.0, 2.0))];
    let stats = bake(&ctx, &mut points, &params);

    assert_eq!(stats.discarded, 1);
    assert_eq!(stats.baked, 1);
    assert!(!points[0].valid());

    let survivors: Vec<_> = valid_points(&points).collect();
    assert_eq!(survivors.len(), 1);
    assert_eq!(survivors[0].position(), Vec3::new(0.0, 0.0, 2.0));
}

#[test]
fn test_no_directional_light_is_fully_lit() {
    let mut scene = Scene::new();
    scene.lights.push(Light::point(Vec3::new(0.0, 0.0, 5.0), Color3::ONE, 1.0, 10.0));
    scene.add_mesh(Mesh::quad("roof", Vec3::new(0.0, 0.0, 3.0), Vec3::Y * 10.0, Vec3::X * 10.0));
    let ctx = context(scene);

    let mut points = vec![point_at(Vec3::ZERO)];
    bake(&ctx, &mut points, &BakeParams { light_sample_count: 4, ..Default::default() });
    assert_eq!(points[0].shadow(), 1.0);
}

fn punch_stack(layers: usize) -> Scene {
    let mut scene = Scene::new();
    let half = Arc::new(Bitmap::new("half", 1, 1, Color4::new(1.0, 1.0, 1.0, 0.5)));
    let mut material = Material::diffuse("fence", Color3::ONE);
    material.textures.diffuse = Some(half);
    let material = scene.add_material(material);

    for i in 0..layers {
        scene.add_mesh(
            Mesh::quad(format!("layer{i}"), Vec3::new(0.0, 0.0, 1.0 + i as f32), Vec3::X * 5.0, Vec3::Y * 5.0)
                .with_material(material)
                .with_type(MeshType::Punch),
        );
    }
    scene.lights.push(Light::directional(Vec3::NEG_Z, Color3::ONE));
    scene
}

#[test]
fn test_shadow_march_stops_at_cap() {
    let ctx = context(punch_stack(9));
    let params = BakeParams::default();

    let (occlusion, hits) = march_shadow_ray(&ctx, Vec3::ZERO, Vec3::Z, &params);
    assert_eq!(hits, 8);
    assert_eq!(occlusion, 0.0);

    let params = BakeParams { shadow_march_limit: 3, ..Default::default() };
    let (_, hits) = march_shadow_ray(&ctx, Vec3::ZERO, Vec3::Z, &params);
    assert_eq!(hits, 3);

    // The full shadow pass stays bounded and in range
    let sun = Sun::find(ctx.scene()).expect("scene has a sun");
    let shadow = estimate_shadow(&ctx, &point_at(Vec3::ZERO), sun, &BakeParams {
        shadow_sample_count: 4,
        ..Default::default()
    });
    assert!((0.0..=1.0).contains(&shadow));
}

#[test]
fn test_rasterized_room_bake() {
    let mut scene = Scene::new();
    let grey = scene.add_material(Material::diffuse("grey", Color3::splat(0.6)));
    let floor = Mesh::quad("floor", Vec3::ZERO, Vec3::X * 2.0, Vec3::Y * 2.0).with_material(grey);
    scene.add_mesh(floor.clone());
    // Faces down over half of the floor
    scene.add_mesh(Mesh::quad("awning", Vec3::new(1.0, 0.0, 1.0), Vec3::Y * 2.0, Vec3::X).with_material(grey));
    scene.lights.push(Light::directional(Vec3::new(0.0, 0.0, -1.0), Color3::splat(2.0)));
    let ctx = context(scene);

    let mut points = LightMapPoint::rasterize(&floor, 8);
    assert_eq!(points.len(), 64);

    let params = BakeParams {
        light_sample_count: 4,
        light_bounce_count: 3,
        shadow_sample_count: 4,
        ao_sample_count: 8,
        ao_strength: 1.0,
        ..Default::default()
    };
    bake(&ctx, &mut points, &params);

    for point in valid_points(&points) {
        assert!((0.0..=1.0).contains(&point.shadow()));
        assert!(point.colors()[0].is_finite());
        assert!(point.colors()[0].min_element() >= 0.0);
    }

    // Texels under the awning are shadowed, the open side is lit
    let under = points.iter().find(|p| p.x == 6 && p.y == 4).expect("texel (6, 4)");
    let open = points.iter().find(|p| p.x == 1 && p.y == 4).expect("texel (1, 4)");
    assert!(under.shadow() < 0.5, "under {}", under.shadow());
    assert!(open.shadow() > 0.5, "open {}", open.shadow());
}

#[test]
fn test_bake_section_wraps_job() {
    let ctx = context(Scene::new());
    let mut points = vec![point_at(Vec3::ZERO)];

    let _guard = BakeSection::global().enter();
    let stats = bake(&ctx, &mut points, &BakeParams { light_sample_count: 2, ..Default::default() });
    assert_eq!(stats.baked, 1);
}
