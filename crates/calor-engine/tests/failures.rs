//! Every failing run reports the right stage and returns no output.

use std::path::PathBuf;

use calor_backend::BackendError;
use calor_core::{CellFlags, HeatWorldInput, InputError};
use calor_engine::{ConfigError, HeatWorld, HostConfig, RunError, Stage};
use calor_test_utils::fixtures::hot_centre;
use calor_test_utils::providers::{no_kernels, NoDevices, NoPlatforms};

fn fails_at(err: &RunError, stage: Stage) {
    assert_eq!(err.stage(), stage, "{err}");
}

#[test]
fn short_state_is_an_input_error() {
    let mut input = hot_centre(3, 1.0, 0.5);
    input.state.pop();
    let world = HeatWorld::default();
    let err = world.execute(&world.cpu_provider(), &input).unwrap_err();
    fails_at(&err, Stage::Input);
    assert_eq!(
        err,
        RunError::Input(InputError::LengthMismatch {
            what: "state",
            expected: 9,
            actual: 8,
        })
    );
}

#[test]
fn nan_alpha_is_an_input_error() {
    let input = HeatWorldInput {
        n: 1,
        alpha: f32::NAN,
        properties: vec![CellFlags::FREE],
        state: vec![0.0],
    };
    let world = HeatWorld::default();
    let err = world.execute(&world.cpu_provider(), &input).unwrap_err();
    assert!(matches!(err, RunError::Input(InputError::NonFiniteAlpha { .. })));
}

#[test]
fn bad_config_is_an_input_error() {
    let world = HeatWorld::new(HostConfig {
        workers: Some(0),
        ..Default::default()
    });
    let err = world
        .execute(&calor_engine::cpu_provider(Some(1)), &hot_centre(3, 1.0, 0.5))
        .unwrap_err();
    fails_at(&err, Stage::Input);
    assert_eq!(err, RunError::Config(ConfigError::InvalidWorkerCount { value: 0 }));
}

#[test]
fn no_platforms() {
    let err = HeatWorld::default()
        .execute(&NoPlatforms, &hot_centre(3, 1.0, 0.5))
        .unwrap_err();
    fails_at(&err, Stage::Discovery);
    assert_eq!(err, RunError::Discovery(BackendError::NoPlatforms));
}

#[test]
fn no_devices() {
    let err = HeatWorld::default()
        .execute(&NoDevices, &hot_centre(3, 1.0, 0.5))
        .unwrap_err();
    assert_eq!(
        err,
        RunError::Discovery(BackendError::NoDevices {
            platform: "empty".into()
        })
    );
}

#[test]
fn device_index_out_of_range() {
    let world = HeatWorld::new(HostConfig {
        device: 7,
        ..Default::default()
    });
    let err = world
        .execute(&world.cpu_provider(), &hot_centre(3, 1.0, 0.5))
        .unwrap_err();
    fails_at(&err, Stage::Discovery);
    assert_eq!(
        err,
        RunError::Discovery(BackendError::DeviceOutOfRange { index: 7, count: 2 })
    );
}

#[test]
fn unbound_kernel_is_a_compile_error_with_a_log_per_device() {
    let err = HeatWorld::default()
        .execute(&no_kernels(), &hot_centre(3, 1.0, 0.5))
        .unwrap_err();
    fails_at(&err, Stage::Compilation);
    let RunError::Compile(inner) = &err else {
        panic!("expected compile error, got {err:?}");
    };
    let logs = inner.compile_logs();
    let devices: Vec<_> = logs.iter().map(|l| l.device.as_str()).collect();
    assert_eq!(devices, vec!["cpu", "cpu-serial"]);
    for log in logs {
        assert!(log.text().contains("heat_step"), "{log}");
        assert!(log.text().contains("none registered"), "{log}");
    }
}

#[test]
fn kernel_dir_without_program_fails_compilation() {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests");
    let world = HeatWorld::new(HostConfig {
        kernel_dir: Some(dir),
        ..Default::default()
    });
    let err = world
        .execute(&world.cpu_provider(), &hot_centre(3, 1.0, 0.5))
        .unwrap_err();
    fails_at(&err, Stage::Compilation);
    assert!(matches!(err, RunError::KernelSource { .. }));
}

#[test]
fn shipped_kernel_dir_runs() {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("kernels");
    let world = HeatWorld::new(HostConfig {
        kernel_dir: Some(dir),
        steps: Some(1),
        ..Default::default()
    });
    let out = world
        .execute(&world.cpu_provider(), &hot_centre(3, 100.0, 1.0))
        .unwrap();
    assert_eq!(out.state[1], 25.0);
}
