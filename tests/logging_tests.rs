use std::sync::{Mutex, Once};

use anyhow::Result;
use log::{Level, Metadata, Record};
use phantom_linear::{Device, LinearF32, LinearParams, MdArray};

// Captures the binding's log lines so their content can be checked.
struct TestLogger {
    logs: Mutex<Vec<String>>,
}

impl log::Log for TestLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Debug && metadata.target() == "phantom_linear::binding"
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            self.logs.lock().unwrap().push(format!("{}", record.args()));
        }
    }

    fn flush(&self) {}
}

static LOGGER: TestLogger = TestLogger {
    logs: Mutex::new(Vec::new()),
};
static INIT: Once = Once::new();

fn setup_test_logger() {
    INIT.call_once(|| {
        log::set_logger(&LOGGER)
            .map(|()| log::set_max_level(log::LevelFilter::Debug))
            .unwrap();
    });
    LOGGER.logs.lock().unwrap().clear();
}

#[test]
fn entry_points_log_operand_shapes() -> Result<()> {
    setup_test_logger();
    let binding = LinearF32::default();
    let src = MdArray::new(&[[1f32, 2., 3.], [4., 5., 6.]], &Device::CPU)?;
    let weights = MdArray::new(&[[1f32, 0., 0.], [0., 1., 0.]], &Device::CPU)?;
    let bias = MdArray::new(&[0.5f32, -0.5], &Device::CPU)?;
    let params = LinearParams::with_bias();

    let dst = binding.forward(&src, &weights, Some(&bias), &params)?;
    binding.backward_weights(&src, &dst, &params)?;
    binding.backward_data(&weights, &dst, &params)?;

    let logs = LOGGER.logs.lock().unwrap();
    assert_eq!(logs.len(), 3);
    assert!(logs[0].starts_with("linear_forward"));
    assert!(logs[0].contains("src=[[2, 3], F32, CPU]"));
    assert!(logs[0].contains("weights=[[2, 3], F32, CPU]"));
    assert!(logs[0].contains("bias=Some([[2], F32, CPU])"));
    assert!(logs[0].contains("with_bias=true"));
    assert!(logs[1].starts_with("linear_backward_weights"));
    assert!(logs[1].contains("diff_dst=[[2, 2], F32, CPU]"));
    assert!(logs[2].starts_with("linear_backward_data"));
    assert!(logs[2].contains("weights=[[2, 3], F32, CPU]"));
    Ok(())
}
