#![cfg(feature = "integration-tests")]

mod common;

use sunflow::{camera::Camera, data_structures::drawable::Drawable, flow::Demo, geometry::Shape};

fn camera() -> Camera {
    Camera::new((0.0, 0.0, 5.0), (0.0, 0.0, 0.0))
}

#[test]
fn clear_fills_the_target() {
    let Some(gpu) = common::gpu() else { return };
    let mut demo = Demo::new(&gpu.device, common::FORMAT).unwrap();
    demo.renderer.set_clear_color(1.0, 1.0, 1.0, 1.0);
    let target = common::Offscreen::new(&gpu.device);
    let view = target.target();

    demo.renderer.clear(&gpu.device, &gpu.queue, view);

    let pixels = target.read(&gpu);
    assert!(pixels.pixels().all(|p| p.0 == [255, 255, 255, 255]));
}

#[test]
fn frame_draws_the_icosphere_in_the_middle() {
    let Some(gpu) = common::gpu() else { return };
    let mut demo = Demo::new(&gpu.device, common::FORMAT).unwrap();
    assert_eq!(demo.renderer.clear_color(), wgpu::Color::BLACK);
    demo.tick(&gpu.device);
    let target = common::Offscreen::new(&gpu.device);
    let (view, camera) = (target.target(), camera());

    demo.draw(&gpu.device, &gpu.queue, view, &camera).unwrap();

    let pixels = target.read(&gpu);
    let center = pixels.get_pixel(common::SIZE / 2, common::SIZE / 2).0;
    let corner = pixels.get_pixel(0, 0).0;
    if center[..3] == [0, 0, 0] {
        let path = std::env::temp_dir().join("sunflow-frame.png");
        let _ = pixels.save(&path);
        panic!("icosphere missing, frame saved to {}", path.display());
    }
    assert_eq!(corner[..3], [0, 0, 0]);
}

#[test]
fn tessellation_changes_apply_on_the_next_tick() {
    let Some(gpu) = common::gpu() else { return };
    let mut demo = Demo::new(&gpu.device, common::FORMAT).unwrap();
    let before = demo.scene.icosphere.element_count();

    demo.controls.adjust_tessellations(-2);
    assert_eq!(demo.scene.icosphere.element_count(), before);
    demo.tick(&gpu.device);
    assert_eq!(demo.time, 1);
    assert_eq!(demo.scene.loaded_tessellations(), 3);
    assert_eq!(demo.scene.icosphere.element_count(), 60 * 64);
}

#[test]
fn drawing_an_unloaded_drawable_fails() {
    let Some(gpu) = common::gpu() else { return };
    let demo = Demo::new(&gpu.device, common::FORMAT).unwrap();
    let target = common::Offscreen::new(&gpu.device);
    let unloaded = Drawable::new(Shape::Cube {
        center: cgmath::Vector3::new(0.0, 0.0, 0.0),
    });

    let result = demo.renderer.render(
        &gpu.device,
        &gpu.queue,
        target.target(),
        &camera(),
        0,
        demo.controls.mesh_color,
        &demo.programs.lambert,
        &[&unloaded],
        false,
    );
    assert!(result.is_err());
}
