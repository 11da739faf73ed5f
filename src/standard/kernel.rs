//! OpenCL kernels, kernel arguments and work size suggestions.

use std::fmt;
use std::mem;
use std::ptr;
use std::sync::Arc;
use crate::driver::{self, InfoAux};
use crate::enums::{ClassTag, CommandType, KernelArgInfo, KernelInfo, KernelWorkGroupInfo};
use crate::error::{Error, ErrorKind, Result, ApiResultExt};
use crate::ffi::{c_void, RawObject};
use crate::prm::{self, OclPrm};
use crate::standard::event::{self, Event, EventWaitList};
use crate::standard::memobj::MemObject;
use crate::standard::program::ProgramData;
use crate::standard::{Buffer, Context, Device, Image, Program, Queue, Sampler};
use crate::types::OpenclVersion;
use crate::wrapper::{InfoEntry, WeakWrapper, Wrapper};

/// The kind of a kernel argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelArgKind {
    Mem,
    Sampler,
    Local,
    Private,
    Skip,
}

/// A kernel argument.
#[derive(Clone)]
pub enum KernelArg<'a> {
    /// A buffer or image.
    Mem(&'a dyn MemObject),
    Sampler(&'a Sampler),
    /// `__local` memory of the given size in bytes.
    Local(usize),
    /// A value copied into the kernel's argument storage.
    Private(Vec<u8>),
    /// Leaves the argument at this index untouched.
    Skip,
}

impl<'a> KernelArg<'a> {
    /// Local memory for `count` elements of `T`.
    pub fn local<T: OclPrm>(count: usize) -> KernelArg<'a> {
        KernelArg::Local(count * mem::size_of::<T>())
    }

    pub fn private<T: OclPrm>(value: &T) -> KernelArg<'a> {
        KernelArg::Private(prm::as_bytes(::std::slice::from_ref(value)).to_vec())
    }

    /// A vector-typed value such as `float4`.
    pub fn private_slice<T: OclPrm>(values: &[T]) -> KernelArg<'a> {
        KernelArg::Private(prm::as_bytes(values).to_vec())
    }

    pub fn kind(&self) -> KernelArgKind {
        match *self {
            KernelArg::Mem(_) => KernelArgKind::Mem,
            KernelArg::Sampler(_) => KernelArgKind::Sampler,
            KernelArg::Local(_) => KernelArgKind::Local,
            KernelArg::Private(_) => KernelArgKind::Private,
            KernelArg::Skip => KernelArgKind::Skip,
        }
    }

    /// The size passed to `clSetKernelArg`.
    pub fn arg_size(&self) -> usize {
        match *self {
            KernelArg::Mem(_) | KernelArg::Sampler(_) => mem::size_of::<usize>(),
            KernelArg::Local(size) => size,
            KernelArg::Private(ref bytes) => bytes.len(),
            KernelArg::Skip => 0,
        }
    }

    /// The bytes passed to `clSetKernelArg`: the object handle for memory
    /// objects and samplers, the value for private arguments. `None` for
    /// local and skipped arguments.
    pub fn arg_value(&self) -> Option<Vec<u8>> {
        match *self {
            KernelArg::Mem(m) => Some(prm::as_bytes(&[m.as_mem_raw().addr()]).to_vec()),
            KernelArg::Sampler(s) => Some(prm::as_bytes(&[s.as_raw().addr()]).to_vec()),
            KernelArg::Private(ref bytes) => Some(bytes.clone()),
            KernelArg::Local(_) | KernelArg::Skip => None,
        }
    }
}

impl<'a> fmt::Debug for KernelArg<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            KernelArg::Mem(m) => write!(f, "Mem({:?})", m.as_mem_raw()),
            KernelArg::Sampler(s) => write!(f, "Sampler({:?})", s.as_raw()),
            KernelArg::Local(size) => write!(f, "Local({})", size),
            KernelArg::Private(ref bytes) => write!(f, "Private({} bytes)", bytes.len()),
            KernelArg::Skip => f.write_str("Skip"),
        }
    }
}

impl<'a> From<&'a Buffer> for KernelArg<'a> {
    fn from(buffer: &'a Buffer) -> KernelArg<'a> {
        KernelArg::Mem(buffer)
    }
}

impl<'a> From<&'a Image> for KernelArg<'a> {
    fn from(image: &'a Image) -> KernelArg<'a> {
        KernelArg::Mem(image)
    }
}

impl<'a> From<&'a Sampler> for KernelArg<'a> {
    fn from(sampler: &'a Sampler) -> KernelArg<'a> {
        KernelArg::Sampler(sampler)
    }
}

pub struct KernelData {
    program: WeakWrapper<ProgramData>,
    context: Context,
}

/// A kernel wrapper.
#[derive(Clone)]
pub struct Kernel(pub(crate) Wrapper<KernelData>);

impl_wrapper!(Kernel, KernelData);

impl Kernel {
    /// Creates a new kernel object. Most callers want `Program::get_kernel`,
    /// which reuses one kernel per name.
    pub fn new(program: &Program, name: &str) -> Result<Kernel> {
        let native = driver::get().create_kernel(program.as_raw(), name)
            .or_api("clCreateKernel")?;
        let data = KernelData {
            program: program.0.downgrade(),
            context: program.context().clone(),
        };
        Wrapper::from_owned(ClassTag::Kernel, native, data).map(Kernel)
    }

    /// Wraps an existing native kernel, taking a new native reference.
    pub fn from_raw(native: RawObject) -> Result<Kernel> {
        if let Some(existing) = Wrapper::lookup(native) {
            return Ok(Kernel(existing));
        }
        let program = Program::from_raw(crate::wrapper::query_param(native, KernelInfo::Program)?
            .as_object()?)?;
        let data = KernelData {
            program: program.0.downgrade(),
            context: program.context().clone(),
        };
        Wrapper::new_wrap(ClassTag::Kernel, native, data).map(Kernel)
    }

    /// The program this kernel belongs to.
    pub fn program(&self) -> Result<Program> {
        match self.data().program.upgrade() {
            Some(w) => Ok(Program(w)),
            None => Program::from_raw(self.info(KernelInfo::Program)?.as_object()?),
        }
    }

    pub fn context(&self) -> &Context {
        &self.data().context
    }

    pub fn function_name(&self) -> Result<String> {
        self.info(KernelInfo::FunctionName).map(|e| e.as_string())
    }

    pub fn num_args(&self) -> Result<u32> {
        self.info(KernelInfo::NumArgs)?.as_scalar()
    }

    /// Sets argument `index`.
    pub fn set_arg(&self, index: u32, arg: &KernelArg) -> Result<()> {
        let drv = driver::get();
        let res = match *arg {
            KernelArg::Skip => return Ok(()),
            KernelArg::Mem(m) => {
                let handle = m.as_mem_raw().addr();
                unsafe { drv.set_kernel_arg(self.as_raw(), index, mem::size_of::<usize>(),
                    &handle as *const usize as *const c_void) }
            },
            KernelArg::Sampler(s) => {
                let handle = s.as_raw().addr();
                unsafe { drv.set_kernel_arg(self.as_raw(), index, mem::size_of::<usize>(),
                    &handle as *const usize as *const c_void) }
            },
            KernelArg::Local(size) => unsafe {
                drv.set_kernel_arg(self.as_raw(), index, size, ptr::null())
            },
            KernelArg::Private(ref bytes) => unsafe {
                drv.set_kernel_arg(self.as_raw(), index, bytes.len(),
                    bytes.as_ptr() as *const c_void)
            },
        };
        res.or_api_info("clSetKernelArg", || format!("argument {} ({:?})", index, arg))
    }

    /// Sets arguments in order, starting at index zero.
    pub fn set_args<'a, I>(&self, args: I) -> Result<()>
            where I: IntoIterator<Item = KernelArg<'a>> {
        for (i, arg) in args.into_iter().enumerate() {
            self.set_arg(i as u32, &arg)?;
        }
        Ok(())
    }

    pub fn set_args_v(&self, args: &[KernelArg]) -> Result<()> {
        for (i, arg) in args.iter().enumerate() {
            self.set_arg(i as u32, arg)?;
        }
        Ok(())
    }

    /// Enqueues the kernel over a `dims`-dimensional range. Only the first
    /// `dims` entries of each size slice are used.
    pub fn enqueue_ndrange(&self, queue: &Queue, dims: usize, global_offset: Option<&[usize]>,
            global_size: &[usize], local_size: Option<&[usize]>,
            wait: Option<&mut EventWaitList>) -> Result<Event> {
        if dims == 0 || dims > 3 {
            return Err(Error::lib(ErrorKind::BadArguments,
                format!("Kernels run over 1 to 3 dimensions, not {}.", dims)));
        }
        let trim = |s: &[usize], what: &str| -> Result<Vec<usize>> {
            if s.len() < dims {
                return Err(Error::lib(ErrorKind::BadArguments,
                    format!("{} has {} dimension(s), expected {}.", what, s.len(), dims)));
            }
            Ok(s[..dims].to_vec())
        };
        let gws = trim(global_size, "Global work size")?;
        let offset = global_offset.map(|o| trim(o, "Global offset")).transpose()?;
        let lws = local_size.map(|l| trim(l, "Local work size")).transpose()?;

        let native = event::with_wait_list(wait, |w| {
            driver::get().enqueue_ndrange_kernel(queue.as_raw(), self.as_raw(), dims as u32,
                offset.as_ref().map(|v| &v[..]), &gws, lws.as_ref().map(|v| &v[..]), w)
                .or_api("clEnqueueNDRangeKernel")
        })?;
        trace!("Enqueued kernel {:?} over {:?} (local {:?}).", self.as_raw(), gws, lws);
        queue.produce_event(native, Some(CommandType::NdrangeKernel))
    }

    /// Sets the arguments and enqueues the kernel in one call.
    pub fn set_args_and_enqueue_ndrange<'a, I>(&self, queue: &Queue, dims: usize,
            global_offset: Option<&[usize]>, global_size: &[usize], local_size: Option<&[usize]>,
            wait: Option<&mut EventWaitList>, args: I) -> Result<Event>
            where I: IntoIterator<Item = KernelArg<'a>> {
        self.set_args(args)?;
        self.enqueue_ndrange(queue, dims, global_offset, global_size, local_size, wait)
    }

    /// Work-group information for `device`, which may be omitted when the
    /// kernel's context holds a single device.
    pub fn workgroup_info(&self, device: Option<&Device>, param: KernelWorkGroupInfo)
            -> Result<Arc<InfoEntry>> {
        let aux = match device {
            Some(d) => InfoAux::Object(d.as_raw()),
            None => InfoAux::None,
        };
        self.info_aux(param, aux)
    }

    pub fn work_group_size(&self, device: &Device) -> Result<usize> {
        self.workgroup_info(Some(device), KernelWorkGroupInfo::WorkGroupSize)?.as_scalar()
    }

    pub fn preferred_work_group_size_multiple(&self, device: &Device) -> Result<usize> {
        self.workgroup_info(Some(device), KernelWorkGroupInfo::PreferredWorkGroupSizeMultiple)?
            .as_scalar()
    }

    /// Argument information. Requires OpenCL 1.2 and a program built from
    /// source.
    pub fn arg_info(&self, index: u32, param: KernelArgInfo) -> Result<Arc<InfoEntry>> {
        self.context().require_version(OpenclVersion::V1_2, "Kernel argument info")?;
        self.info_aux(param, InfoAux::Index(index))
    }

    pub fn arg_name(&self, index: u32) -> Result<String> {
        self.arg_info(index, KernelArgInfo::Name).map(|e| e.as_string())
    }
}

/// Device and kernel limits which bound a local work size.
#[derive(Debug, Clone, PartialEq, Eq)]
struct WorkLimits {
    max_wg: usize,
    pref_multiple: usize,
    max_wi: Vec<usize>,
}

/// Suggests global and local work sizes for a problem of `real_ws` items.
///
/// The local size favors the preferred work-group size multiple along every
/// dimension, then is reduced from the last dimension down until it fits the
/// maximum work-group size. The global size is `real_ws` rounded up to a
/// multiple of the local size. `lws_max`, when given, caps the local size per
/// dimension (zero entries are ignored).
///
/// Fails with `UnsupportedVersion` when `real_ws` has more dimensions than
/// the device supports.
pub fn suggest_worksizes(kernel: Option<&Kernel>, device: &Device, real_ws: &[usize],
        lws_max: Option<&[usize]>) -> Result<(Vec<usize>, Vec<usize>)> {
    check_real_ws(real_ws)?;
    let limits = work_limits(kernel, device, real_ws.len(), lws_max)?;
    compute_worksizes(&limits, real_ws)
}

/// Suggests a local work size only, for launches where the global size is
/// fixed to `real_ws`.
///
/// Every component of the result divides the matching `real_ws` component.
/// Limits and errors are those of `suggest_worksizes`.
pub fn suggest_local_worksize(kernel: Option<&Kernel>, device: &Device, real_ws: &[usize],
        lws_max: Option<&[usize]>) -> Result<Vec<usize>> {
    check_real_ws(real_ws)?;
    let limits = work_limits(kernel, device, real_ws.len(), lws_max)?;
    compute_divisor_local(&limits, real_ws)
}

fn check_real_ws(real_ws: &[usize]) -> Result<()> {
    if real_ws.is_empty() || real_ws.contains(&0) {
        return Err(Error::lib(ErrorKind::BadArguments,
            format!("Invalid real work size {:?}.", real_ws)));
    }
    Ok(())
}

/// A preferred multiple the implementation does not report falls back to
/// the work-group size. Other failures are returned.
fn pref_multiple_or(pref: Result<usize>, wg: usize) -> Result<usize> {
    match pref {
        Ok(p) => Ok(p),
        Err(ref e) if e.is_kind(ErrorKind::InfoUnavailable) => Ok(wg),
        Err(e) => Err(e),
    }
}

fn work_limits(kernel: Option<&Kernel>, device: &Device, dims: usize,
        lws_max: Option<&[usize]>) -> Result<WorkLimits> {
    let dev_dims = device.max_work_item_dimensions()? as usize;
    if dims > dev_dims {
        return Err(Error::lib(ErrorKind::UnsupportedVersion, format!("Device only supports \
            a max. of {} dimensions, but {} were requested.", dev_dims, dims)));
    }

    let (max_wg, pref_multiple) = match kernel {
        Some(k) => {
            let wg = k.work_group_size(device)?;
            let pref = if k.context().opencl_version()? < OpenclVersion::V1_1 {
                wg
            } else {
                pref_multiple_or(k.preferred_work_group_size_multiple(device), wg)?
            };
            (wg, pref)
        },
        None => {
            let wg = device.max_work_group_size()?;
            (wg, wg)
        },
    };

    let dev_wi = device.max_work_item_sizes()?;
    if dev_wi.len() < dims {
        return Err(Error::lib(ErrorKind::InfoUnavailable, format!("Device reports {} max. \
            work-item sizes for {} dimensions.", dev_wi.len(), dims)));
    }
    let mut max_wi = Vec::with_capacity(dims);
    for (i, &dev_limit) in dev_wi.iter().take(dims).enumerate() {
        let mut limit = dev_limit;
        if let Some(hint) = lws_max.and_then(|h| h.get(i).cloned()).filter(|&h| h > 0) {
            if hint > limit {
                warn!("Local size hint {} for dimension {} exceeds the device limit {}; \
                    using the limit.", hint, i, limit);
            } else {
                limit = hint;
            }
        }
        max_wi.push(limit);
    }

    Ok(WorkLimits { max_wg, pref_multiple, max_wi })
}

fn fit_local(limits: &WorkLimits, real_ws: &[usize]) -> Result<Vec<usize>> {
    check_real_ws(real_ws)?;
    if limits.max_wi.len() < real_ws.len() {
        return Err(Error::lib(ErrorKind::UnsupportedVersion, format!("Work size {:?} has more \
            dimensions than the device limits {:?}.", real_ws, limits.max_wi)));
    }
    let max_wg = limits.max_wg.max(1);
    let pref = if limits.pref_multiple == 0 { max_wg } else { limits.pref_multiple };

    let mut local: Vec<usize> = real_ws.iter().zip(limits.max_wi.iter())
        .map(|(&real, &max_wi)| {
            let mut l = pref.min(max_wi).max(1);
            while l > real {
                l /= 2;
            }
            l.max(1)
        }).collect();

    for i in (0..local.len()).rev() {
        while local.iter().product::<usize>() > max_wg && local[i] > 1 {
            local[i] /= 2;
        }
    }
    Ok(local)
}

fn compute_worksizes(limits: &WorkLimits, real_ws: &[usize]) -> Result<(Vec<usize>, Vec<usize>)> {
    let local = fit_local(limits, real_ws)?;
    let global = real_ws.iter().zip(local.iter())
        .map(|(&real, &l)| {
            let groups = real / l + if real % l > 0 { 1 } else { 0 };
            groups.checked_mul(l).ok_or_else(|| Error::lib(ErrorKind::BadArguments,
                format!("Global work size for {} items overflows.", real)))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok((global, local))
}

fn compute_divisor_local(limits: &WorkLimits, real_ws: &[usize]) -> Result<Vec<usize>> {
    let mut local = fit_local(limits, real_ws)?;
    if local.iter().zip(real_ws.iter()).all(|(&l, &real)| real % l == 0) {
        return Ok(local);
    }

    let max_wg = limits.max_wg.max(1);
    let mut wg = 1usize;
    for i in 0..local.len() {
        let real = real_ws[i];
        if real % local[i] != 0 || local[i].saturating_mul(wg) > max_wg {
            let cap = limits.max_wi[i];
            local[i] = (2..=real)
                .take_while(|&j| j <= cap && j.saturating_mul(wg) <= max_wg)
                .filter(|&j| real % j == 0)
                .last()
                .unwrap_or(1);
        }
        wg *= local[i];
    }
    Ok(local)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(max_wg: usize, pref_multiple: usize, max_wi: &[usize]) -> WorkLimits {
        WorkLimits { max_wg, pref_multiple, max_wi: max_wi.to_vec() }
    }

    #[test]
    fn two_dimensional_suggestion() {
        let (gws, lws) = compute_worksizes(&limits(256, 32, &[256, 256, 256]), &[4096, 4096])
            .unwrap();
        assert_eq!(lws, vec![32, 8]);
        assert_eq!(gws, vec![4096, 4096]);
    }

    #[test]
    fn small_problem_shrinks_local_size() {
        let (gws, lws) = compute_worksizes(&limits(256, 32, &[256]), &[20]).unwrap();
        assert_eq!(lws, vec![16]);
        assert_eq!(gws, vec![32]);
    }

    #[test]
    fn global_is_rounded_up() {
        let (gws, lws) = compute_worksizes(&limits(512, 64, &[512, 512, 64]), &[1000, 3, 7])
            .unwrap();
        assert!(lws.iter().product::<usize>() <= 512);
        for (g, l) in gws.iter().zip(lws.iter()) {
            assert_eq!(g % l, 0);
        }
        assert!(gws[0] >= 1000 && gws[1] >= 3 && gws[2] >= 7);
    }

    #[test]
    fn zero_extent_is_rejected() {
        let err = compute_worksizes(&limits(256, 32, &[256]), &[0]).unwrap_err();
        assert!(err.is_kind(ErrorKind::BadArguments));
        assert!(compute_worksizes(&limits(256, 32, &[256]), &[]).is_err());
    }

    #[test]
    fn more_dimensions_than_limits() {
        let err = compute_worksizes(&limits(256, 32, &[256, 256, 256]), &[8, 8, 8, 8])
            .unwrap_err();
        assert!(err.is_kind(ErrorKind::UnsupportedVersion));
        assert!(compute_divisor_local(&limits(256, 32, &[256]), &[8, 8]).is_err());
    }

    #[test]
    fn huge_extent_does_not_overflow() {
        let (gws, lws) = compute_worksizes(&limits(256, 32, &[256]), &[usize::MAX - 40])
            .unwrap();
        assert_eq!(lws, vec![32]);
        assert_eq!(gws[0], usize::MAX - 31);

        let err = compute_worksizes(&limits(256, 32, &[256]), &[usize::MAX]).unwrap_err();
        assert!(err.is_kind(ErrorKind::BadArguments));
    }

    #[test]
    fn local_only_sizes_divide_the_extent() {
        // Already divisors.
        let lws = compute_divisor_local(&limits(256, 32, &[256, 256]), &[4096, 64]).unwrap();
        assert_eq!(lws, vec![32, 8]);

        let lws = compute_divisor_local(&limits(256, 32, &[256, 256]), &[1000, 30]).unwrap();
        assert_eq!(lws, vec![250, 1]);
        assert!(lws.iter().product::<usize>() <= 256);

        // A prime extent larger than the limits leaves a single item.
        let lws = compute_divisor_local(&limits(64, 64, &[64]), &[97]).unwrap();
        assert_eq!(lws, vec![1]);

        // A small extent can be its own divisor.
        let lws = compute_divisor_local(&limits(64, 64, &[64]), &[7]).unwrap();
        assert_eq!(lws, vec![7]);
    }

    #[test]
    fn preferred_multiple_fallback() {
        let unavailable = Err(Error::lib(ErrorKind::InfoUnavailable, "not reported"));
        assert_eq!(pref_multiple_or(unavailable, 128).unwrap(), 128);
        assert_eq!(pref_multiple_or(Ok(32), 128).unwrap(), 32);

        let failed = Err(Error::api(crate::ffi::CL_INVALID_DEVICE, "clGetKernelWorkGroupInfo"));
        let err = pref_multiple_or(failed, 128).unwrap_err();
        assert_eq!(err.api_status(), Some(crate::ffi::CL_INVALID_DEVICE));
    }
}
