//! The `cl-sys` backend: forwards every call to the system OpenCL library.

use std::ffi::CString;
use std::ptr;
use cl_sys as cl;
use crate::driver::{Driver, DriverResult, InfoAux, MappedPtr};
use crate::enums::{ClassTag, InfoKind, AddressingMode, FilterMode, MemObjectType};
use crate::ffi::{self, c_void, c_char, cl_int, cl_uint, cl_image_format, RawObject};
use crate::flags::{DeviceType, CommandQueueProperties, MemFlags, MapFlags, MemMigrationFlags};
use crate::types::{ImageFormat, ImageDescriptor};

/// Evaluates a returned status code.
#[inline(always)]
fn eval(errcode: cl_int) -> DriverResult<()> {
    if errcode == ffi::CL_SUCCESS { Ok(()) } else { Err(errcode) }
}

/// Evaluates the status code of a constructor and wraps the new handle.
#[inline(always)]
fn eval_new(errcode: cl_int, obj: *mut c_void) -> DriverResult<RawObject> {
    eval(errcode).map(|_| RawObject::from_ptr(obj))
}

/// Pointer and length of a wait list, `(0, null)` when empty.
fn wait_list(wait: &[RawObject]) -> (cl_uint, *const *mut c_void) {
    if wait.is_empty() {
        (0, ptr::null())
    } else {
        (wait.len() as cl_uint, wait.as_ptr() as *const *mut c_void)
    }
}

fn obj_list(objs: &[RawObject]) -> (cl_uint, *const *mut c_void) {
    wait_list(objs)
}

fn c_string(s: &str) -> DriverResult<CString> {
    CString::new(s).map_err(|_| ffi::CL_INVALID_VALUE)
}

fn opt_ptr(sizes: Option<&[usize]>) -> *const usize {
    sizes.map(|s| s.as_ptr()).unwrap_or(ptr::null())
}

/// Runs a `clGet*Info` style call, either querying the size or filling
/// `value`.
fn info_call<F>(value: Option<&mut [u8]>, f: F) -> DriverResult<usize>
        where F: FnOnce(usize, *mut c_void, *mut usize) -> cl_int {
    let mut size_ret = 0usize;
    let errcode = match value {
        Some(buf) => f(buf.len(), buf.as_mut_ptr() as *mut c_void, &mut size_ret),
        None => f(0, ptr::null_mut(), &mut size_ret),
    };
    eval(errcode).map(|_| size_ret)
}

/// A backend calling into the platform's OpenCL ICD loader.
#[derive(Debug, Default)]
pub struct NativeDriver {
    _priv: (),
}

impl NativeDriver {
    pub fn new() -> NativeDriver {
        NativeDriver { _priv: () }
    }
}

impl Driver for NativeDriver {
    fn name(&self) -> &'static str {
        "native"
    }

    fn get_info(&self, kind: InfoKind, obj: RawObject, aux: InfoAux, param: u32,
            value: Option<&mut [u8]>) -> DriverResult<usize> {
        let o = obj.as_ptr();
        let aux_obj = match aux {
            InfoAux::Object(a) => a.as_ptr(),
            _ => ptr::null_mut(),
        };
        let aux_idx = match aux {
            InfoAux::Index(i) => i,
            _ => 0,
        };

        info_call(value, |size, val, ret| unsafe {
            match kind {
                InfoKind::Platform => cl::clGetPlatformInfo(o as _, param, size, val, ret),
                InfoKind::Device => cl::clGetDeviceInfo(o as _, param, size, val, ret),
                InfoKind::Context => cl::clGetContextInfo(o as _, param, size, val, ret),
                InfoKind::Queue => cl::clGetCommandQueueInfo(o as _, param, size, val, ret),
                InfoKind::MemObj => cl::clGetMemObjectInfo(o as _, param, size, val, ret),
                InfoKind::Image => cl::clGetImageInfo(o as _, param, size, val, ret),
                InfoKind::Sampler => cl::clGetSamplerInfo(o as _, param, size, val, ret),
                InfoKind::Program => cl::clGetProgramInfo(o as _, param, size, val, ret),
                InfoKind::ProgramBuild =>
                    cl::clGetProgramBuildInfo(o as _, aux_obj as _, param, size, val, ret),
                InfoKind::Kernel => cl::clGetKernelInfo(o as _, param, size, val, ret),
                InfoKind::KernelArg =>
                    cl::clGetKernelArgInfo(o as _, aux_idx, param, size, val, ret),
                InfoKind::KernelWorkGroup =>
                    cl::clGetKernelWorkGroupInfo(o as _, aux_obj as _, param, size, val, ret),
                InfoKind::Event => cl::clGetEventInfo(o as _, param, size, val, ret),
                InfoKind::EventProfiling =>
                    cl::clGetEventProfilingInfo(o as _, param, size, val, ret),
                #[cfg(feature = "opencl_version_2_0")]
                InfoKind::Pipe => cl::clGetPipeInfo(o as _, param, size, val, ret),
                // Sub-group and pipe queries need OpenCL 2.x entry points.
                _ => ffi::CL_INVALID_OPERATION,
            }
        })
    }

    fn retain(&self, class: ClassTag, obj: RawObject) -> DriverResult<()> {
        let o = obj.as_ptr();
        eval(unsafe {
            match class {
                ClassTag::Platform | ClassTag::Device => ffi::CL_SUCCESS,
                ClassTag::Context => cl::clRetainContext(o as _),
                ClassTag::Queue => cl::clRetainCommandQueue(o as _),
                ClassTag::Buffer | ClassTag::Image => cl::clRetainMemObject(o as _),
                ClassTag::Sampler => cl::clRetainSampler(o as _),
                ClassTag::Program => cl::clRetainProgram(o as _),
                ClassTag::Kernel => cl::clRetainKernel(o as _),
                ClassTag::Event => cl::clRetainEvent(o as _),
            }
        })
    }

    fn release(&self, class: ClassTag, obj: RawObject) -> DriverResult<()> {
        let o = obj.as_ptr();
        eval(unsafe {
            match class {
                ClassTag::Platform | ClassTag::Device => ffi::CL_SUCCESS,
                ClassTag::Context => cl::clReleaseContext(o as _),
                ClassTag::Queue => cl::clReleaseCommandQueue(o as _),
                ClassTag::Buffer | ClassTag::Image => cl::clReleaseMemObject(o as _),
                ClassTag::Sampler => cl::clReleaseSampler(o as _),
                ClassTag::Program => cl::clReleaseProgram(o as _),
                ClassTag::Kernel => cl::clReleaseKernel(o as _),
                ClassTag::Event => cl::clReleaseEvent(o as _),
            }
        })
    }

    fn platform_ids(&self) -> DriverResult<Vec<RawObject>> {
        let mut num: cl_uint = 0;
        eval(unsafe { cl::clGetPlatformIDs(0, ptr::null_mut(), &mut num) })?;
        if num == 0 { return Ok(Vec::new()); }

        let mut ids = vec![RawObject::null(); num as usize];
        eval(unsafe { cl::clGetPlatformIDs(num, ids.as_mut_ptr() as *mut _, ptr::null_mut()) })?;
        Ok(ids)
    }

    fn device_ids(&self, platform: RawObject, device_type: DeviceType)
            -> DriverResult<Vec<RawObject>> {
        let mut num: cl_uint = 0;
        eval(unsafe {
            cl::clGetDeviceIDs(platform.as_ptr() as _, device_type.bits(), 0, ptr::null_mut(),
                &mut num)
        })?;
        if num == 0 { return Err(ffi::CL_DEVICE_NOT_FOUND); }

        let mut ids = vec![RawObject::null(); num as usize];
        eval(unsafe {
            cl::clGetDeviceIDs(platform.as_ptr() as _, device_type.bits(), num,
                ids.as_mut_ptr() as *mut _, ptr::null_mut())
        })?;
        Ok(ids)
    }

    fn create_context(&self, properties: &[isize], devices: &[RawObject])
            -> DriverResult<RawObject> {
        let props_ptr = if properties.is_empty() { ptr::null() } else { properties.as_ptr() };
        let (num, devs) = obj_list(devices);
        let mut errcode = ffi::CL_SUCCESS;
        let ctx = unsafe {
            cl::clCreateContext(props_ptr as *const _, num, devs as *const _, None,
                ptr::null_mut(), &mut errcode)
        };
        eval_new(errcode, ctx as *mut c_void)
    }

    fn create_command_queue(&self, context: RawObject, device: RawObject,
            properties: CommandQueueProperties) -> DriverResult<RawObject> {
        let mut errcode = ffi::CL_SUCCESS;
        let queue = unsafe {
            cl::clCreateCommandQueue(context.as_ptr() as _, device.as_ptr() as _,
                properties.bits(), &mut errcode)
        };
        eval_new(errcode, queue as *mut c_void)
    }

    unsafe fn create_buffer(&self, context: RawObject, flags: MemFlags, size: usize,
            host_ptr: *mut c_void) -> DriverResult<RawObject> {
        let mut errcode = ffi::CL_SUCCESS;
        let buf = cl::clCreateBuffer(context.as_ptr() as _, flags.bits(), size, host_ptr,
            &mut errcode);
        eval_new(errcode, buf as *mut c_void)
    }

    unsafe fn create_image(&self, context: RawObject, flags: MemFlags, format: &ImageFormat,
            desc: &ImageDescriptor, host_ptr: *mut c_void) -> DriverResult<RawObject> {
        let raw_format = format.to_raw();
        let raw_format = cl::cl_image_format {
            image_channel_order: raw_format.image_channel_order,
            image_channel_data_type: raw_format.image_channel_data_type,
        };
        let raw_desc = cl::cl_image_desc {
            image_type: desc.image_type as u32,
            image_width: desc.image_width,
            image_height: desc.image_height,
            image_depth: desc.image_depth,
            image_array_size: desc.image_array_size,
            image_row_pitch: desc.image_row_pitch,
            image_slice_pitch: desc.image_slice_pitch,
            num_mip_levels: desc.num_mip_levels,
            num_samples: desc.num_samples,
            buffer: ptr::null_mut(),
        };
        let mut errcode = ffi::CL_SUCCESS;
        let img = cl::clCreateImage(context.as_ptr() as _, flags.bits(), &raw_format, &raw_desc,
            host_ptr, &mut errcode);
        eval_new(errcode, img as *mut c_void)
    }

    fn create_sampler(&self, context: RawObject, normalized_coords: bool,
            addressing_mode: AddressingMode, filter_mode: FilterMode) -> DriverResult<RawObject> {
        let mut errcode = ffi::CL_SUCCESS;
        let sampler = unsafe {
            cl::clCreateSampler(context.as_ptr() as _, normalized_coords as cl_uint,
                addressing_mode as cl_uint, filter_mode as cl_uint, &mut errcode)
        };
        eval_new(errcode, sampler as *mut c_void)
    }

    #[cfg(feature = "opencl_version_2_0")]
    fn create_sampler_with_properties(&self, context: RawObject, properties: &[u64])
            -> DriverResult<RawObject> {
        let mut errcode = ffi::CL_SUCCESS;
        let sampler = unsafe {
            cl::clCreateSamplerWithProperties(context.as_ptr() as _, properties.as_ptr() as _,
                &mut errcode)
        };
        eval_new(errcode, sampler as *mut c_void)
    }

    #[cfg(not(feature = "opencl_version_2_0"))]
    fn create_sampler_with_properties(&self, _context: RawObject, _properties: &[u64])
            -> DriverResult<RawObject> {
        Err(ffi::CL_INVALID_OPERATION)
    }

    fn create_program_with_source(&self, context: RawObject, sources: &[&str])
            -> DriverResult<RawObject> {
        let ptrs: Vec<*const c_char> = sources.iter().map(|s| s.as_ptr() as *const c_char)
            .collect();
        let lens: Vec<usize> = sources.iter().map(|s| s.len()).collect();
        let mut errcode = ffi::CL_SUCCESS;
        let prog = unsafe {
            cl::clCreateProgramWithSource(context.as_ptr() as _, ptrs.len() as cl_uint,
                ptrs.as_ptr() as *const _, lens.as_ptr(), &mut errcode)
        };
        eval_new(errcode, prog as *mut c_void)
    }

    fn create_program_with_binary(&self, context: RawObject, devices: &[RawObject],
            binaries: &[&[u8]]) -> DriverResult<RawObject> {
        if devices.len() != binaries.len() { return Err(ffi::CL_INVALID_VALUE); }
        let (num, devs) = obj_list(devices);
        let ptrs: Vec<*const u8> = binaries.iter().map(|b| b.as_ptr()).collect();
        let lens: Vec<usize> = binaries.iter().map(|b| b.len()).collect();
        let mut status = vec![ffi::CL_SUCCESS; devices.len()];
        let mut errcode = ffi::CL_SUCCESS;
        let prog = unsafe {
            cl::clCreateProgramWithBinary(context.as_ptr() as _, num, devs as *const _,
                lens.as_ptr(), ptrs.as_ptr() as *mut _, status.as_mut_ptr(), &mut errcode)
        };
        eval_new(errcode, prog as *mut c_void)
    }

    fn create_program_with_built_in_kernels(&self, context: RawObject, devices: &[RawObject],
            kernel_names: &str) -> DriverResult<RawObject> {
        let (num, devs) = obj_list(devices);
        let names = c_string(kernel_names)?;
        let mut errcode = ffi::CL_SUCCESS;
        let prog = unsafe {
            cl::clCreateProgramWithBuiltInKernels(context.as_ptr() as _, num, devs as *const _,
                names.as_ptr(), &mut errcode)
        };
        eval_new(errcode, prog as *mut c_void)
    }

    fn build_program(&self, program: RawObject, devices: &[RawObject], options: &str)
            -> DriverResult<()> {
        let (num, devs) = obj_list(devices);
        let opts = c_string(options)?;
        eval(unsafe {
            cl::clBuildProgram(program.as_ptr() as _, num, devs as *const _, opts.as_ptr(), None,
                ptr::null_mut())
        })
    }

    fn compile_program(&self, program: RawObject, devices: &[RawObject], options: &str,
            headers: &[RawObject], header_names: &[&str]) -> DriverResult<()> {
        if headers.len() != header_names.len() { return Err(ffi::CL_INVALID_VALUE); }
        let (num, devs) = obj_list(devices);
        let (num_headers, hdrs) = obj_list(headers);
        let opts = c_string(options)?;
        let names = header_names.iter().map(|n| c_string(n))
            .collect::<DriverResult<Vec<CString>>>()?;
        let name_ptrs: Vec<*const c_char> = names.iter().map(|n| n.as_ptr()).collect();
        let name_ptr = if name_ptrs.is_empty() { ptr::null() } else { name_ptrs.as_ptr() };
        eval(unsafe {
            cl::clCompileProgram(program.as_ptr() as _, num, devs as *const _, opts.as_ptr(),
                num_headers, hdrs as *const _, name_ptr as *mut _, None, ptr::null_mut())
        })
    }

    fn link_program(&self, context: RawObject, devices: &[RawObject], options: &str,
            programs: &[RawObject]) -> DriverResult<RawObject> {
        let (num, devs) = obj_list(devices);
        let (num_progs, progs) = obj_list(programs);
        let opts = c_string(options)?;
        let mut errcode = ffi::CL_SUCCESS;
        let prog = unsafe {
            cl::clLinkProgram(context.as_ptr() as _, num, devs as *const _, opts.as_ptr(),
                num_progs, progs as *const _, None, ptr::null_mut(), &mut errcode)
        };
        eval_new(errcode, prog as *mut c_void)
    }

    fn program_binaries(&self, program: RawObject) -> DriverResult<Vec<Vec<u8>>> {
        let obj = program.as_ptr();
        let mut size_ret = 0usize;
        eval(unsafe {
            cl::clGetProgramInfo(obj as _, ffi::CL_PROGRAM_BINARY_SIZES, 0, ptr::null_mut(),
                &mut size_ret)
        })?;
        let mut sizes = vec![0usize; size_ret / ::std::mem::size_of::<usize>()];
        eval(unsafe {
            cl::clGetProgramInfo(obj as _, ffi::CL_PROGRAM_BINARY_SIZES, size_ret,
                sizes.as_mut_ptr() as *mut c_void, ptr::null_mut())
        })?;

        let mut bins: Vec<Vec<u8>> = sizes.iter().map(|&s| vec![0u8; s]).collect();
        let mut ptrs: Vec<*mut u8> = bins.iter_mut().map(|b| b.as_mut_ptr()).collect();
        eval(unsafe {
            cl::clGetProgramInfo(obj as _, ffi::CL_PROGRAM_BINARIES,
                ptrs.len() * ::std::mem::size_of::<*mut u8>(), ptrs.as_mut_ptr() as *mut c_void,
                ptr::null_mut())
        })?;
        Ok(bins)
    }

    fn create_kernel(&self, program: RawObject, name: &str) -> DriverResult<RawObject> {
        let name = c_string(name)?;
        let mut errcode = ffi::CL_SUCCESS;
        let kernel = unsafe {
            cl::clCreateKernel(program.as_ptr() as _, name.as_ptr(), &mut errcode)
        };
        eval_new(errcode, kernel as *mut c_void)
    }

    unsafe fn set_kernel_arg(&self, kernel: RawObject, index: u32, size: usize,
            value: *const c_void) -> DriverResult<()> {
        eval(cl::clSetKernelArg(kernel.as_ptr() as _, index, size, value))
    }

    fn enqueue_ndrange_kernel(&self, queue: RawObject, kernel: RawObject, work_dim: u32,
            global_offset: Option<&[usize]>, global_size: &[usize], local_size: Option<&[usize]>,
            wait: &[RawObject]) -> DriverResult<RawObject> {
        let (num, list) = wait_list(wait);
        let mut event = ptr::null_mut();
        eval(unsafe {
            cl::clEnqueueNDRangeKernel(queue.as_ptr() as _, kernel.as_ptr() as _, work_dim,
                opt_ptr(global_offset), global_size.as_ptr(), opt_ptr(local_size), num,
                list as *const _, &mut event)
        })?;
        Ok(RawObject::from_ptr(event as *mut c_void))
    }

    unsafe fn enqueue_read_buffer(&self, queue: RawObject, buffer: RawObject, blocking: bool,
            offset: usize, data: &mut [u8], wait: &[RawObject]) -> DriverResult<RawObject> {
        let (num, list) = wait_list(wait);
        let mut event = ptr::null_mut();
        eval(cl::clEnqueueReadBuffer(queue.as_ptr() as _, buffer.as_ptr() as _,
            blocking as cl_uint, offset, data.len(), data.as_mut_ptr() as *mut c_void, num,
            list as *const _, &mut event))?;
        Ok(RawObject::from_ptr(event as *mut c_void))
    }

    unsafe fn enqueue_write_buffer(&self, queue: RawObject, buffer: RawObject, blocking: bool,
            offset: usize, data: &[u8], wait: &[RawObject]) -> DriverResult<RawObject> {
        let (num, list) = wait_list(wait);
        let mut event = ptr::null_mut();
        eval(cl::clEnqueueWriteBuffer(queue.as_ptr() as _, buffer.as_ptr() as _,
            blocking as cl_uint, offset, data.len(), data.as_ptr() as *const c_void, num,
            list as *const _, &mut event))?;
        Ok(RawObject::from_ptr(event as *mut c_void))
    }

    fn enqueue_copy_buffer(&self, queue: RawObject, src: RawObject, dst: RawObject,
            src_offset: usize, dst_offset: usize, size: usize, wait: &[RawObject])
            -> DriverResult<RawObject> {
        let (num, list) = wait_list(wait);
        let mut event = ptr::null_mut();
        eval(unsafe {
            cl::clEnqueueCopyBuffer(queue.as_ptr() as _, src.as_ptr() as _, dst.as_ptr() as _,
                src_offset, dst_offset, size, num, list as *const _, &mut event)
        })?;
        Ok(RawObject::from_ptr(event as *mut c_void))
    }

    fn enqueue_fill_buffer(&self, queue: RawObject, buffer: RawObject, pattern: &[u8],
            offset: usize, size: usize, wait: &[RawObject]) -> DriverResult<RawObject> {
        let (num, list) = wait_list(wait);
        let mut event = ptr::null_mut();
        eval(unsafe {
            cl::clEnqueueFillBuffer(queue.as_ptr() as _, buffer.as_ptr() as _,
                pattern.as_ptr() as *const c_void, pattern.len(), offset, size, num,
                list as *const _, &mut event)
        })?;
        Ok(RawObject::from_ptr(event as *mut c_void))
    }

    unsafe fn enqueue_map_buffer(&self, queue: RawObject, buffer: RawObject, blocking: bool,
            flags: MapFlags, offset: usize, size: usize, wait: &[RawObject])
            -> DriverResult<(MappedPtr, RawObject)> {
        let (num, list) = wait_list(wait);
        let mut event = ptr::null_mut();
        let mut errcode = ffi::CL_SUCCESS;
        let mapped = cl::clEnqueueMapBuffer(queue.as_ptr() as _, buffer.as_ptr() as _,
            blocking as cl_uint, flags.bits(), offset, size, num, list as *const _, &mut event,
            &mut errcode);
        eval(errcode)?;
        Ok((MappedPtr { ptr: mapped, row_pitch: 0, slice_pitch: 0 },
            RawObject::from_ptr(event as *mut c_void)))
    }

    unsafe fn enqueue_read_image(&self, queue: RawObject, image: RawObject, blocking: bool,
            origin: [usize; 3], region: [usize; 3], row_pitch: usize, slice_pitch: usize,
            data: &mut [u8], wait: &[RawObject]) -> DriverResult<RawObject> {
        let (num, list) = wait_list(wait);
        let mut event = ptr::null_mut();
        eval(cl::clEnqueueReadImage(queue.as_ptr() as _, image.as_ptr() as _,
            blocking as cl_uint, origin.as_ptr(), region.as_ptr(), row_pitch, slice_pitch,
            data.as_mut_ptr() as *mut c_void, num, list as *const _, &mut event))?;
        Ok(RawObject::from_ptr(event as *mut c_void))
    }

    unsafe fn enqueue_write_image(&self, queue: RawObject, image: RawObject, blocking: bool,
            origin: [usize; 3], region: [usize; 3], row_pitch: usize, slice_pitch: usize,
            data: &[u8], wait: &[RawObject]) -> DriverResult<RawObject> {
        let (num, list) = wait_list(wait);
        let mut event = ptr::null_mut();
        eval(cl::clEnqueueWriteImage(queue.as_ptr() as _, image.as_ptr() as _,
            blocking as cl_uint, origin.as_ptr(), region.as_ptr(), row_pitch, slice_pitch,
            data.as_ptr() as *const c_void, num, list as *const _, &mut event))?;
        Ok(RawObject::from_ptr(event as *mut c_void))
    }

    fn enqueue_copy_image(&self, queue: RawObject, src: RawObject, dst: RawObject,
            src_origin: [usize; 3], dst_origin: [usize; 3], region: [usize; 3],
            wait: &[RawObject]) -> DriverResult<RawObject> {
        let (num, list) = wait_list(wait);
        let mut event = ptr::null_mut();
        eval(unsafe {
            cl::clEnqueueCopyImage(queue.as_ptr() as _, src.as_ptr() as _, dst.as_ptr() as _,
                src_origin.as_ptr(), dst_origin.as_ptr(), region.as_ptr(), num,
                list as *const _, &mut event)
        })?;
        Ok(RawObject::from_ptr(event as *mut c_void))
    }

    fn enqueue_fill_image(&self, queue: RawObject, image: RawObject, color: &[u8; 16],
            origin: [usize; 3], region: [usize; 3], wait: &[RawObject])
            -> DriverResult<RawObject> {
        let (num, list) = wait_list(wait);
        let mut event = ptr::null_mut();
        eval(unsafe {
            cl::clEnqueueFillImage(queue.as_ptr() as _, image.as_ptr() as _,
                color.as_ptr() as *const c_void, origin.as_ptr(), region.as_ptr(), num,
                list as *const _, &mut event)
        })?;
        Ok(RawObject::from_ptr(event as *mut c_void))
    }

    unsafe fn enqueue_map_image(&self, queue: RawObject, image: RawObject, blocking: bool,
            flags: MapFlags, origin: [usize; 3], region: [usize; 3], wait: &[RawObject])
            -> DriverResult<(MappedPtr, RawObject)> {
        let (num, list) = wait_list(wait);
        let mut event = ptr::null_mut();
        let mut errcode = ffi::CL_SUCCESS;
        let mut row_pitch = 0usize;
        let mut slice_pitch = 0usize;
        let mapped = cl::clEnqueueMapImage(queue.as_ptr() as _, image.as_ptr() as _,
            blocking as cl_uint, flags.bits(), origin.as_ptr(), region.as_ptr(), &mut row_pitch,
            &mut slice_pitch, num, list as *const _, &mut event, &mut errcode);
        eval(errcode)?;
        Ok((MappedPtr { ptr: mapped, row_pitch, slice_pitch },
            RawObject::from_ptr(event as *mut c_void)))
    }

    unsafe fn enqueue_unmap_mem_object(&self, queue: RawObject, mem: RawObject,
            mapped: *mut c_void, wait: &[RawObject]) -> DriverResult<RawObject> {
        let (num, list) = wait_list(wait);
        let mut event = ptr::null_mut();
        eval(cl::clEnqueueUnmapMemObject(queue.as_ptr() as _, mem.as_ptr() as _, mapped, num,
            list as *const _, &mut event))?;
        Ok(RawObject::from_ptr(event as *mut c_void))
    }

    fn enqueue_migrate_mem_objects(&self, queue: RawObject, mems: &[RawObject],
            flags: MemMigrationFlags, wait: &[RawObject]) -> DriverResult<RawObject> {
        let (num, list) = wait_list(wait);
        let (num_mems, mem_list) = obj_list(mems);
        let mut event = ptr::null_mut();
        eval(unsafe {
            cl::clEnqueueMigrateMemObjects(queue.as_ptr() as _, num_mems, mem_list as *const _,
                flags.bits(), num, list as *const _, &mut event)
        })?;
        Ok(RawObject::from_ptr(event as *mut c_void))
    }

    fn enqueue_marker(&self, queue: RawObject, wait: &[RawObject]) -> DriverResult<RawObject> {
        let (num, list) = wait_list(wait);
        let mut event = ptr::null_mut();
        eval(unsafe {
            cl::clEnqueueMarkerWithWaitList(queue.as_ptr() as _, num, list as *const _,
                &mut event)
        })?;
        Ok(RawObject::from_ptr(event as *mut c_void))
    }

    fn enqueue_barrier(&self, queue: RawObject, wait: &[RawObject]) -> DriverResult<RawObject> {
        let (num, list) = wait_list(wait);
        let mut event = ptr::null_mut();
        eval(unsafe {
            cl::clEnqueueBarrierWithWaitList(queue.as_ptr() as _, num, list as *const _,
                &mut event)
        })?;
        Ok(RawObject::from_ptr(event as *mut c_void))
    }

    fn finish(&self, queue: RawObject) -> DriverResult<()> {
        eval(unsafe { cl::clFinish(queue.as_ptr() as _) })
    }

    fn flush(&self, queue: RawObject) -> DriverResult<()> {
        eval(unsafe { cl::clFlush(queue.as_ptr() as _) })
    }

    fn wait_for_events(&self, events: &[RawObject]) -> DriverResult<()> {
        let (num, list) = wait_list(events);
        eval(unsafe { cl::clWaitForEvents(num, list as *const _) })
    }

    fn create_user_event(&self, context: RawObject) -> DriverResult<RawObject> {
        let mut errcode = ffi::CL_SUCCESS;
        let event = unsafe { cl::clCreateUserEvent(context.as_ptr() as _, &mut errcode) };
        eval_new(errcode, event as *mut c_void)
    }

    fn set_user_event_status(&self, event: RawObject, status: cl_int) -> DriverResult<()> {
        eval(unsafe { cl::clSetUserEventStatus(event.as_ptr() as _, status) })
    }

    fn supported_image_formats(&self, context: RawObject, flags: MemFlags,
            image_type: MemObjectType) -> DriverResult<Vec<cl_image_format>> {
        let mut num: cl_uint = 0;
        eval(unsafe {
            cl::clGetSupportedImageFormats(context.as_ptr() as _, flags.bits(),
                image_type as cl_uint, 0, ptr::null_mut(), &mut num)
        })?;
        let mut formats = vec![cl_image_format::default(); num as usize];
        if num > 0 {
            eval(unsafe {
                cl::clGetSupportedImageFormats(context.as_ptr() as _, flags.bits(),
                    image_type as cl_uint, num, formats.as_mut_ptr() as *mut _, ptr::null_mut())
            })?;
        }
        Ok(formats)
    }
}
