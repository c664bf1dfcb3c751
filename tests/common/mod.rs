#![allow(dead_code)]
//! Shared integration test utilities.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Once;

use chainbuf::{Buffer, Unit, UnitPool};
use proptest::prelude::ProptestConfig;

static INIT_LOGGING: Once = Once::new();

/// Initialize tracing output once per test binary; `RUST_LOG` filters.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Proptest config with a fixed case count.
#[must_use]
pub fn test_proptest_config(cases: u32) -> ProptestConfig {
    ProptestConfig::with_cases(cases)
}

/// A pool test double that counts traffic through the [`UnitPool`] seam.
///
/// `Rc<Cell<..>>` counters so the test keeps a handle after the pool is
/// cloned into a buffer.
#[derive(Debug, Clone, Default)]
pub struct CountingPool {
    pub taken: Rc<Cell<usize>>,
    pub given: Rc<Cell<usize>>,
}

impl CountingPool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl UnitPool for CountingPool {
    fn take(&self, min_capacity: usize) -> Unit {
        self.taken.set(self.taken.get() + 1);
        Unit::new(min_capacity)
    }

    fn give(&self, unit: Unit) {
        assert!(unit.capacity() > 0);
        self.given.set(self.given.get() + 1);
    }
}

/// Build a buffer of `unit_capacity`-byte units holding `bytes`.
#[must_use]
pub fn buffer_with(unit_capacity: usize, bytes: &[u8]) -> Buffer {
    let mut buf = Buffer::with_unit_capacity(unit_capacity);
    buf.write_slice(bytes);
    buf
}
