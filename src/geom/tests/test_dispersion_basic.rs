//! Tests for the per-tick deformation pass.

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::control::{ControlConfig, ControlInput, ControlIntegrator, ControlState};
use crate::geom::{
    DispersionEngine, DispersionError, DispersionParams, DispersionStyle, FrameBuffers, LiveFrame,
    PetalSurface, generate, radial_power,
};

fn small_surface() -> PetalSurface {
    generate(8, 48, 8100.0, &mut StdRng::seed_from_u64(11)).unwrap()
}

/// Only radial expansion is left; every other displacement term is zero.
fn expansion_only(force: f64) -> DispersionParams {
    DispersionParams {
        expansion_force: force,
        noise_amplitude: 0.0,
        shred_drift: 0.0,
        vertical_whip: 0.0,
        ..DispersionParams::default()
    }
}

fn displacement(a: [f64; 3], b: [f64; 3]) -> f64 {
    ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)).sqrt()
}

#[test]
fn factor_zero_leaves_base_positions() {
    let surface = small_surface();
    for style in [DispersionStyle::Whip, DispersionStyle::SandFall] {
        let mut engine = DispersionEngine::new(DispersionParams {
            style,
            ..DispersionParams::default()
        })
        .unwrap();
        let mut frame = LiveFrame::new(surface.vertex_count());
        let diag = engine
            .step(&surface, &ControlState::at(0.0, 1234.0), &mut frame)
            .unwrap();

        assert_eq!(frame.positions(), surface.base_positions());
        assert_eq!(diag.max_displacement, 0.0);
        assert_eq!(frame.mesh_opacity, 1.0);
        assert_eq!(frame.point_opacity, 0.0);
    }
}

#[test]
fn outer_vertex_expands_by_radial_power() {
    let surface = generate(2, 4, 90.0, &mut StdRng::seed_from_u64(3)).unwrap();
    assert_eq!(surface.vertex_count(), 15);
    assert_eq!(surface.indices().len(), 48);

    let mut engine = DispersionEngine::new(expansion_only(0.5)).unwrap();
    let mut frame = LiveFrame::new(surface.vertex_count());
    engine
        .step(&surface, &ControlState::at(1.0, 1000.0), &mut frame)
        .unwrap();

    let idx = surface.vertex_index(2, 0).unwrap();
    let base = surface.base_positions()[idx];
    let live = frame.positions()[idx];
    let power = radial_power(base, 220.0);
    assert!(power > 0.0);
    assert!((live[0] - base[0] * (1.0 + 0.5 * power)).abs() < 1e-9);
    assert!((live[2] - base[2] * (1.0 + 0.5 * power)).abs() < 1e-9);
    assert!((live[1] - base[1]).abs() < 1e-9);
}

#[test]
fn displacement_grows_with_distance_from_axis() {
    let surface = small_surface();
    let mut engine = DispersionEngine::new(expansion_only(1.0)).unwrap();
    let mut frame = LiveFrame::new(surface.vertex_count());
    engine
        .step(&surface, &ControlState::at(0.7, 500.0), &mut frame)
        .unwrap();

    let mut samples: Vec<(f64, f64)> = surface
        .base_positions()
        .iter()
        .zip(frame.positions())
        .map(|(b, p)| ((b[0] * b[0] + b[2] * b[2]).sqrt(), displacement(*b, *p)))
        .collect();
    samples.sort_by(|a, b| a.0.total_cmp(&b.0));

    for pair in samples.windows(2) {
        if pair[1].0 > pair[0].0 {
            assert!(pair[1].1 + 1e-9 >= pair[0].1);
        }
    }
}

#[test]
fn noise_phase_freezes_while_factor_is_high() {
    let surface = small_surface();
    let params = DispersionParams {
        freeze_threshold: 0.9,
        ..DispersionParams::default()
    };
    let mut engine = DispersionEngine::new(params).unwrap();
    let mut frame = LiveFrame::new(surface.vertex_count());

    let first = engine
        .step(&surface, &ControlState::at(0.5, 100.0), &mut frame)
        .unwrap();
    assert!(!first.frozen);
    assert!((first.noise_phase - 100.0 * params.chaos_speed).abs() < 1e-12);

    let mut frozen_positions = None;
    for tick in 2..=10 {
        let elapsed = f64::from(tick) * 100.0;
        let diag = engine
            .step(&surface, &ControlState::at(0.95, elapsed), &mut frame)
            .unwrap();
        assert!(diag.frozen);
        assert_eq!(diag.noise_phase, first.noise_phase);
        match &frozen_positions {
            None => frozen_positions = Some(frame.positions().to_vec()),
            Some(held) => assert_eq!(held.as_slice(), frame.positions()),
        }
    }

    // Dropping below the threshold resumes from "now", not from the hold.
    let resumed = engine
        .step(&surface, &ControlState::at(0.5, 1100.0), &mut frame)
        .unwrap();
    assert!((resumed.noise_phase - 1100.0 * params.chaos_speed).abs() < 1e-12);
}

#[test]
fn opacities_stay_in_bounds_and_monotone() {
    let surface = small_surface();
    let params = DispersionParams::default();
    let mut engine = DispersionEngine::new(params).unwrap();
    let mut frame = LiveFrame::new(surface.vertex_count());

    let mut prev_mesh = f64::INFINITY;
    let mut prev_point = f64::NEG_INFINITY;
    for step in 0..=20 {
        let factor = f64::from(step) / 20.0;
        engine
            .step(&surface, &ControlState::at(factor, 0.0), &mut frame)
            .unwrap();
        assert!((params.min_mesh_opacity..=1.0).contains(&frame.mesh_opacity));
        assert!((0.0..=0.9).contains(&frame.point_opacity));
        assert!(frame.mesh_opacity <= prev_mesh);
        assert!(frame.point_opacity >= prev_point);
        prev_mesh = frame.mesh_opacity;
        prev_point = frame.point_opacity;
    }
}

#[test]
fn non_finite_control_never_reaches_positions() {
    let surface = small_surface();
    let mut engine = DispersionEngine::new(DispersionParams::default()).unwrap();
    let mut frame = LiveFrame::new(surface.vertex_count());

    let diag = engine
        .step(
            &surface,
            &ControlState::at(f64::INFINITY, f64::NAN),
            &mut frame,
        )
        .unwrap();
    assert!(diag.sanitized_inputs >= 2);
    assert!(frame.positions().iter().flatten().all(|c| c.is_finite()));
    assert_eq!(frame.positions(), surface.base_positions());
}

#[test]
fn frame_size_mismatch_is_reported() {
    let surface = small_surface();
    let mut engine = DispersionEngine::new(DispersionParams::default()).unwrap();
    let mut frame = LiveFrame::new(3);
    let err = engine
        .step(&surface, &ControlState::at(0.5, 10.0), &mut frame)
        .unwrap_err();
    assert!(matches!(
        err,
        DispersionError::FrameSizeMismatch { got: 3, .. }
    ));
    assert_eq!(frame.positions(), &[[0.0; 3]; 3]);
}

#[test]
fn sand_fall_releases_grains_over_time() {
    let surface = small_surface();
    let mut engine = DispersionEngine::new(DispersionParams {
        style: DispersionStyle::SandFall,
        ..DispersionParams::default()
    })
    .unwrap();
    let mut frame = LiveFrame::new(surface.vertex_count());

    let low = engine
        .step(&surface, &ControlState::at(0.2, 100.0), &mut frame)
        .unwrap();
    let high = engine
        .step(&surface, &ControlState::at(1.0, 100.0), &mut frame)
        .unwrap();
    assert!(high.max_displacement > low.max_displacement);
}

#[test]
fn sand_swirl_keeps_moving_while_noise_is_frozen() {
    let surface = small_surface();
    let mut engine = DispersionEngine::new(DispersionParams {
        style: DispersionStyle::SandFall,
        ..DispersionParams::default()
    })
    .unwrap();
    let mut frame = LiveFrame::new(surface.vertex_count());

    engine
        .step(&surface, &ControlState::at(0.5, 100.0), &mut frame)
        .unwrap();
    let first = engine
        .step(&surface, &ControlState::at(1.0, 5000.0), &mut frame)
        .unwrap();
    let at_5000 = frame.positions().to_vec();
    let second = engine
        .step(&surface, &ControlState::at(1.0, 6000.0), &mut frame)
        .unwrap();

    assert!(first.frozen && second.frozen);
    assert_eq!(first.noise_phase, second.noise_phase);
    assert_ne!(frame.positions(), at_5000.as_slice());
}

#[test]
fn double_buffer_publishes_complete_frames() {
    let surface = small_surface();
    let mut engine = DispersionEngine::new(DispersionParams::default()).unwrap();
    let mut buffers = FrameBuffers::new(surface.base_positions());

    engine
        .step(&surface, &ControlState::at(0.8, 300.0), buffers.back_mut())
        .unwrap();
    assert_eq!(buffers.front().positions(), surface.base_positions());
    buffers.swap();
    assert_ne!(buffers.front().positions(), surface.base_positions());
    assert!(buffers.front().mesh_opacity < 1.0);
}

#[test]
fn integrated_controller_drives_the_freeze() {
    let surface = small_surface();
    let mut control = ControlIntegrator::new(ControlConfig::default());
    let mut engine = DispersionEngine::new(DispersionParams::default()).unwrap();
    let mut frame = LiveFrame::new(surface.vertex_count());

    let mut now = 0.0;
    let mut last = None;
    for _ in 0..600 {
        now += 16.0;
        let state = *control.update(ControlInput::Hands { left: 0.0, right: 0.3 }, now);
        last = Some(engine.step(&surface, &state, &mut frame).unwrap());
    }
    let last = last.unwrap();
    assert!(last.frozen);
    assert!(last.noise_phase < now * engine.params().chaos_speed);
    assert!(last.noise_phase > 0.0);
}
