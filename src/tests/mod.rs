//! Tests against the in-process stub host.
//!
//! The stub exposes two platforms. Platform A (OpenCL 2.0) holds a CPU and a
//! GPU, platform B (OpenCL 1.1) a GPU and an accelerator. Wrapper counts and
//! the backend slot are process-wide, so every test holds the guard returned
//! by `setup` for its whole duration.

mod wrapper_refs;
mod device_filters;
mod event_lists;
mod profiling;
mod vector_add;
mod build_programs;
mod buffer_ops;
mod image_ops;

use std::sync::{Mutex, MutexGuard, Once, PoisonError};
use rand::{self, Rng};
use crate::driver::{self, StubDriver};
use crate::{Context, Filters};

lazy_static! {
    static ref TEST_LOCK: Mutex<()> = Mutex::new(());
}

static INSTALL: Once = Once::new();

/// Serializes tests and makes sure the stub host serves them.
pub fn setup() -> MutexGuard<'static, ()> {
    let guard = TEST_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    INSTALL.call_once(|| driver::install(StubDriver::shared()).unwrap());
    assert!(crate::memcheck(), "{} wrapper(s) leaked by a previous test", crate::wrapper_count());
    guard
}

/// A context on the GPU of platform A.
pub fn gpu_a_context() -> Context {
    let mut filters = Filters::new();
    filters.type_gpu().platform_name("platform a");
    Context::new_from_filters(&mut filters).unwrap()
}

/// A context on every device of platform B.
pub fn platform_b_context() -> Context {
    let mut filters = Filters::new();
    filters.platform_name("platform b").same_platform();
    Context::new_from_filters(&mut filters).unwrap()
}

/// A random region and an origin keeping it within `dims`.
pub fn gen_region_origin(dims: &[usize; 3]) -> ([usize; 3], [usize; 3]) {
    let mut rng = rand::weak_rng();

    let region = [
        rng.gen_range(1, dims[0] + 1),
        rng.gen_range(1, dims[1] + 1),
        rng.gen_range(1, dims[2] + 1),
    ];

    let origin = [
        rng.gen_range(0, (dims[0] - region[0]) + 1),
        rng.gen_range(0, (dims[1] - region[1]) + 1),
        rng.gen_range(0, (dims[2] - region[2]) + 1),
    ];

    (origin, region)
}

pub fn within_region(coords: [usize; 3], origin: [usize; 3], region: [usize; 3]) -> bool {
    (0..3).all(|i| coords[i] >= origin[i] && coords[i] < origin[i] + region[i])
}
