//! The generic reference-counted wrapper shared by every OpenCL class.
//!
//! A [`Wrapper`] owns one native retain of one OpenCL object. All wrappers
//! are registered in a process-wide table keyed by native handle, so
//! wrapping a handle that is already wrapped hands back the existing wrapper
//! instead of creating a second one. The native object is released when the
//! last clone of its wrapper is dropped.
//!
//! Every wrapper also carries an [`InfoCache`]: OpenCL info queries are
//! idempotent over the lifetime of an object, so each `(kind, param, aux)`
//! answer is fetched from the backend once and shared afterwards.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, Weak, PoisonError};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use crate::driver::{self, InfoAux};
use crate::enums::{ClassTag, InfoKind, InfoParam};
use crate::error::{Error, ErrorKind, Result, ApiResultExt};
use crate::ffi::{self, RawObject};
use crate::prm::{self, OclPrm};

type Registry = HashMap<RawObject, (u64, Weak<dyn Any + Send + Sync>)>;

lazy_static! {
    static ref REGISTRY: Mutex<Registry> = Mutex::new(HashMap::new());
}

static LIVE_WRAPPERS: AtomicUsize = AtomicUsize::new(0);
static NEXT_SERIAL: AtomicU64 = AtomicU64::new(1);

fn registry() -> MutexGuard<'static, Registry> {
    REGISTRY.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Returns `true` if no wrapper is alive.
///
/// Test suites check this once every wrapper they created has gone out of
/// scope.
pub fn memcheck() -> bool {
    LIVE_WRAPPERS.load(Ordering::SeqCst) == 0
}

/// The number of wrappers currently alive.
pub fn wrapper_count() -> usize {
    LIVE_WRAPPERS.load(Ordering::SeqCst)
}

//============================================================================
// Info cache
//============================================================================

/// Key of a cached info query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InfoKey {
    pub kind: InfoKind,
    pub param: u32,
    pub aux: InfoAux,
}

/// The raw answer to an info query.
#[derive(Clone, PartialEq, Eq)]
pub struct InfoEntry {
    bytes: Vec<u8>,
}

impl InfoEntry {
    pub fn new(bytes: Vec<u8>) -> InfoEntry {
        InfoEntry { bytes }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Interprets the value as a single scalar. The entry size must match the
    /// scalar size exactly.
    pub fn as_scalar<T: OclPrm>(&self) -> Result<T> {
        if self.bytes.len() != mem::size_of::<T>() {
            return Err(Error::lib(ErrorKind::InvalidData, format!("Info value has {} bytes, \
                expected {}.", self.bytes.len(), mem::size_of::<T>())));
        }
        prm::scalar_from_bytes(&self.bytes).ok_or_else(|| Error::lib(ErrorKind::InvalidData,
            "Unable to read info value."))
    }

    /// Interprets the value as an array of scalars.
    pub fn as_vec<T: OclPrm>(&self) -> Vec<T> {
        prm::from_bytes(&self.bytes)
    }

    /// Interprets the value as a string, stopping at the first NUL.
    pub fn as_string(&self) -> String {
        let end = self.bytes.iter().position(|&b| b == 0).unwrap_or(self.bytes.len());
        String::from_utf8_lossy(&self.bytes[..end]).into_owned()
    }

    /// Interprets the value as a list of object handles.
    pub fn as_objects(&self) -> Vec<RawObject> {
        self.as_vec::<usize>().into_iter().map(RawObject::from_addr).collect()
    }

    pub fn as_object(&self) -> Result<RawObject> {
        self.as_scalar::<usize>().map(RawObject::from_addr)
    }

    pub fn as_bool(&self) -> Result<bool> {
        self.as_scalar::<ffi::cl_bool>().map(|b| b != ffi::CL_FALSE)
    }
}

impl fmt::Debug for InfoEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("InfoEntry").field("size", &self.bytes.len()).finish()
    }
}

/// Per-wrapper cache of info query answers. Entries are never replaced.
#[derive(Default)]
pub struct InfoCache {
    entries: Mutex<Vec<(InfoKey, Arc<InfoEntry>)>>,
}

impl InfoCache {
    pub fn new() -> InfoCache {
        InfoCache { entries: Mutex::new(Vec::new()) }
    }

    fn lock(&self) -> MutexGuard<Vec<(InfoKey, Arc<InfoEntry>)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, key: &InfoKey) -> Option<Arc<InfoEntry>> {
        self.lock().iter().find(|&&(ref k, _)| k == key).map(|&(_, ref e)| e.clone())
    }

    /// Inserts an entry unless one exists already, returning the stored one.
    pub fn insert(&self, key: InfoKey, entry: InfoEntry) -> Arc<InfoEntry> {
        let mut entries = self.lock();
        if let Some(&(_, ref existing)) = entries.iter().find(|&&(ref k, _)| *k == key) {
            return existing.clone();
        }
        let entry = Arc::new(entry);
        entries.push((key, entry.clone()));
        entry
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn info_fn_name(kind: InfoKind) -> &'static str {
    match kind {
        InfoKind::Device => "clGetDeviceInfo",
        InfoKind::Platform => "clGetPlatformInfo",
        InfoKind::Context => "clGetContextInfo",
        InfoKind::Event => "clGetEventInfo",
        InfoKind::EventProfiling => "clGetEventProfilingInfo",
        InfoKind::Kernel => "clGetKernelInfo",
        InfoKind::KernelArg => "clGetKernelArgInfo",
        InfoKind::KernelWorkGroup => "clGetKernelWorkGroupInfo",
        InfoKind::KernelSubGroup => "clGetKernelSubGroupInfo",
        InfoKind::MemObj => "clGetMemObjectInfo",
        InfoKind::Image => "clGetImageInfo",
        InfoKind::Program => "clGetProgramInfo",
        InfoKind::ProgramBuild => "clGetProgramBuildInfo",
        InfoKind::Sampler => "clGetSamplerInfo",
        InfoKind::Queue => "clGetCommandQueueInfo",
        InfoKind::Pipe => "clGetPipeInfo",
    }
}

fn is_unavailable(status: ffi::cl_int) -> bool {
    status == ffi::CL_INVALID_VALUE || status == ffi::CL_PROFILING_INFO_NOT_AVAILABLE
        || status == ffi::CL_KERNEL_ARG_INFO_NOT_AVAILABLE
}

/// Runs an uncached info query against the current backend.
pub(crate) fn query_info(native: RawObject, key: &InfoKey) -> Result<InfoEntry> {
    let drv = driver::get();
    let unavailable = |status: ffi::cl_int| {
        if is_unavailable(status) {
            Error::lib(ErrorKind::InfoUnavailable, format!("{}: parameter {:#x} is not \
                available ({}).", info_fn_name(key.kind), key.param,
                crate::error::status_name(status)))
        } else {
            Error::api(status, info_fn_name(key.kind))
        }
    };

    trace!("Info cache miss: {:?} {:#x} on {:?}.", key.kind, key.param, native);
    let size = drv.get_info(key.kind, native, key.aux, key.param, None).map_err(&unavailable)?;
    if size == 0 {
        return Err(Error::lib(ErrorKind::InfoUnavailable, format!("{}: parameter {:#x} has no \
            value.", info_fn_name(key.kind), key.param)));
    }
    let mut bytes = vec![0u8; size];
    let written = drv.get_info(key.kind, native, key.aux, key.param, Some(&mut bytes))
        .map_err(&unavailable)?;
    bytes.truncate(written);
    Ok(InfoEntry::new(bytes))
}

/// Typed form of `query_info`, for handles which are not wrapped yet.
pub(crate) fn query_param<P: InfoParam>(native: RawObject, param: P) -> Result<InfoEntry> {
    query_info(native, &InfoKey { kind: P::KIND, param: param.as_raw(), aux: InfoAux::None })
}

//============================================================================
// Wrapper
//============================================================================

/// Releases the native retain when dropped. Declared as the last field of
/// `WrapperInner` so it runs after the class data and info cache are gone.
struct NativeGuard {
    native: RawObject,
    class: ClassTag,
}

impl Drop for NativeGuard {
    fn drop(&mut self) {
        if let Err(status) = driver::get().release(self.class, self.native) {
            warn!("Releasing {} {:?} failed: {}.", self.class, self.native,
                crate::error::status_name(status));
        }
        LIVE_WRAPPERS.fetch_sub(1, Ordering::SeqCst);
        debug!("Destroyed {} wrapper for {:?}.", self.class, self.native);
    }
}

/// The shared part of a wrapper.
pub struct WrapperInner<T> {
    serial: u64,
    data: T,
    info: InfoCache,
    guard: NativeGuard,
}

impl<T> Drop for WrapperInner<T> {
    fn drop(&mut self) {
        let mut reg = registry();
        let ours = match reg.get(&self.guard.native) {
            Some(&(serial, _)) => serial == self.serial,
            None => false,
        };
        if ours { reg.remove(&self.guard.native); }
    }
}

/// A reference-counted handle to one native OpenCL object plus class data.
///
/// Cloning increments the reference count. The native object is released
/// once the last clone is dropped.
pub struct Wrapper<T> {
    inner: Arc<WrapperInner<T>>,
}

impl<T> Clone for Wrapper<T> {
    fn clone(&self) -> Wrapper<T> {
        Wrapper { inner: self.inner.clone() }
    }
}

impl<T: Send + Sync + 'static> Wrapper<T> {
    /// Wraps a handle the caller owns one native retain of.
    ///
    /// If the handle is already wrapped the caller's retain is released and
    /// the existing wrapper is returned, in which case `data` is dropped.
    pub fn from_owned(class: ClassTag, native: RawObject, data: T) -> Result<Wrapper<T>> {
        Wrapper::from_owned_with(class, native, || data)
    }

    /// As `from_owned`, but only builds the class data when a new wrapper is
    /// created.
    pub fn from_owned_with<F>(class: ClassTag, native: RawObject, data: F) -> Result<Wrapper<T>>
            where F: FnOnce() -> T {
        if native.is_null() {
            return Err(Error::lib(ErrorKind::BadArguments,
                format!("Unable to wrap a null {} handle.", class)));
        }

        let mut reg = registry();
        let existing = reg.get(&native).and_then(|&(_, ref weak)| weak.upgrade());

        if let Some(any) = existing {
            drop(reg);
            // Give back the retain the caller handed over.
            if let Err(status) = driver::get().release(class, native) {
                warn!("Releasing duplicate {} retain on {:?} failed: {}.", class, native,
                    crate::error::status_name(status));
            }
            return any.downcast::<WrapperInner<T>>()
                .map(|inner| Wrapper { inner })
                .map_err(|_| Error::lib(ErrorKind::InvalidData, format!("Handle {:?} is \
                    already wrapped as a different class than {}.", native, class)));
        }

        let serial = NEXT_SERIAL.fetch_add(1, Ordering::SeqCst);
        LIVE_WRAPPERS.fetch_add(1, Ordering::SeqCst);
        let inner = Arc::new(WrapperInner {
            serial,
            data: data(),
            info: InfoCache::new(),
            guard: NativeGuard { native, class },
        });
        let any: Arc<dyn Any + Send + Sync> = inner.clone();
        reg.insert(native, (serial, Arc::downgrade(&any)));
        drop(reg);

        debug!("Created {} wrapper for {:?}.", class, native);
        Ok(Wrapper { inner })
    }

    /// Wraps a handle owned by someone else, taking a new native retain.
    pub fn new_wrap(class: ClassTag, native: RawObject, data: T) -> Result<Wrapper<T>> {
        Wrapper::new_wrap_with(class, native, || data)
    }

    pub fn new_wrap_with<F>(class: ClassTag, native: RawObject, data: F) -> Result<Wrapper<T>>
            where F: FnOnce() -> T {
        if native.is_null() {
            return Err(Error::lib(ErrorKind::BadArguments,
                format!("Unable to wrap a null {} handle.", class)));
        }
        driver::get().retain(class, native).or_api("clRetain")?;
        Wrapper::from_owned_with(class, native, data)
    }

    /// Returns the live wrapper of `native`, if any, without touching native
    /// reference counts.
    pub fn lookup(native: RawObject) -> Option<Wrapper<T>> {
        let any = registry().get(&native).and_then(|&(_, ref weak)| weak.upgrade())?;
        any.downcast::<WrapperInner<T>>().ok().map(|inner| Wrapper { inner })
    }
}

impl<T> Wrapper<T> {
    pub fn as_raw(&self) -> RawObject {
        self.inner.guard.native
    }

    pub fn class(&self) -> ClassTag {
        self.inner.guard.class
    }

    /// The number of live handles to this wrapper.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// A process-unique identifier of this wrapper instance.
    pub fn serial(&self) -> u64 {
        self.inner.serial
    }

    /// Returns `true` if both handles refer to the same wrapper.
    pub fn ptr_eq(&self, other: &Wrapper<T>) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn data(&self) -> &T {
        &self.inner.data
    }

    pub fn info_cache(&self) -> &InfoCache {
        &self.inner.info
    }

    /// Returns the cached answer to an info query, querying the backend on
    /// the first call.
    pub fn get_info(&self, kind: InfoKind, param: u32, aux: InfoAux) -> Result<Arc<InfoEntry>> {
        let key = InfoKey { kind, param, aux };
        if let Some(entry) = self.inner.info.get(&key) {
            return Ok(entry);
        }
        let entry = query_info(self.as_raw(), &key)?;
        Ok(self.inner.info.insert(key, entry))
    }

    pub fn get_info_size(&self, kind: InfoKind, param: u32, aux: InfoAux) -> Result<usize> {
        self.get_info(kind, param, aux).map(|e| e.size())
    }

    pub fn get_info_value<V: OclPrm>(&self, kind: InfoKind, param: u32, aux: InfoAux)
            -> Result<V> {
        self.get_info(kind, param, aux)?.as_scalar()
    }

    pub fn get_info_array<V: OclPrm>(&self, kind: InfoKind, param: u32, aux: InfoAux)
            -> Result<Vec<V>> {
        self.get_info(kind, param, aux).map(|e| e.as_vec())
    }

    /// Typed form of `get_info`.
    pub fn info<P: InfoParam>(&self, param: P) -> Result<Arc<InfoEntry>> {
        self.get_info(P::KIND, param.as_raw(), InfoAux::None)
    }

    /// Typed form of `get_info` for per-device or per-argument queries.
    pub fn info_aux<P: InfoParam>(&self, param: P, aux: InfoAux) -> Result<Arc<InfoEntry>> {
        self.get_info(P::KIND, param.as_raw(), aux)
    }
}

impl<T> Wrapper<T> {
    /// Runs an info query without consulting or filling the cache. Used for
    /// values which change over the lifetime of an object, such as an
    /// event's execution status or a program's build log.
    pub fn query_info(&self, kind: InfoKind, param: u32, aux: InfoAux) -> Result<InfoEntry> {
        query_info(self.as_raw(), &InfoKey { kind, param, aux })
    }

    /// Typed form of `query_info`.
    pub fn query<P: InfoParam>(&self, param: P, aux: InfoAux) -> Result<InfoEntry> {
        self.query_info(P::KIND, param.as_raw(), aux)
    }

    /// Creates a handle which does not keep the wrapper alive.
    pub fn downgrade(&self) -> WeakWrapper<T> {
        WeakWrapper { inner: Arc::downgrade(&self.inner) }
    }
}

/// A non-owning handle to a wrapper, used for child-to-parent links.
pub struct WeakWrapper<T> {
    inner: Weak<WrapperInner<T>>,
}

impl<T> WeakWrapper<T> {
    pub fn upgrade(&self) -> Option<Wrapper<T>> {
        self.inner.upgrade().map(|inner| Wrapper { inner })
    }
}

impl<T> Clone for WeakWrapper<T> {
    fn clone(&self) -> WeakWrapper<T> {
        WeakWrapper { inner: self.inner.clone() }
    }
}

impl<T> fmt::Debug for WeakWrapper<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "WeakWrapper(alive: {})", self.inner.strong_count() > 0)
    }
}

/// A value computed on first use and kept afterwards.
///
/// The initializer runs under the cell's lock and must not touch the same
/// cell.
pub(crate) struct Lazy<T> {
    value: Mutex<Option<T>>,
}

impl<T: Clone> Lazy<T> {
    pub fn new() -> Lazy<T> {
        Lazy { value: Mutex::new(None) }
    }

    pub fn with_value(value: T) -> Lazy<T> {
        Lazy { value: Mutex::new(Some(value)) }
    }

    pub fn get_or_try_init<F>(&self, init: F) -> Result<T> where F: FnOnce() -> Result<T> {
        let mut slot = self.value.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(ref value) = *slot {
            return Ok(value.clone());
        }
        let value = init()?;
        *slot = Some(value.clone());
        Ok(value)
    }
}

impl<T> fmt::Debug for Wrapper<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Wrapper")
            .field("class", &self.class())
            .field("native", &self.as_raw())
            .field("ref_count", &self.ref_count())
            .finish()
    }
}

impl<T> PartialEq for Wrapper<T> {
    fn eq(&self, other: &Wrapper<T>) -> bool {
        self.ptr_eq(other)
    }
}

impl<T> Eq for Wrapper<T> {}

/// Implements the boilerplate shared by the typed wrappers: `Deref` to the
/// generic wrapper, equality, `Debug` and access to the raw handle.
macro_rules! impl_wrapper {
    ($ty:ident, $data:ty) => {
        impl ::std::ops::Deref for $ty {
            type Target = crate::wrapper::Wrapper<$data>;

            fn deref(&self) -> &crate::wrapper::Wrapper<$data> {
                &self.0
            }
        }

        impl ::std::cmp::PartialEq for $ty {
            fn eq(&self, other: &$ty) -> bool {
                self.0.ptr_eq(&other.0)
            }
        }

        impl ::std::cmp::Eq for $ty {}

        impl ::std::fmt::Debug for $ty {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                write!(f, concat!(stringify!($ty), "({:?}, refs: {})"), self.0.as_raw(),
                    self.0.ref_count())
            }
        }

        impl AsRef<crate::wrapper::Wrapper<$data>> for $ty {
            fn as_ref(&self) -> &crate::wrapper::Wrapper<$data> {
                &self.0
            }
        }
    };
}
