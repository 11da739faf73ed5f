//! An in-process OpenCL host used when no OpenCL library is linked.
//!
//! The stub exposes two platforms:
//!
//! | Platform | Version | Devices |
//! |---|---|---|
//! | `cf4ocl stub platform A` | OpenCL 2.0 | `Stub CPU A`, `Stub GPU A` |
//! | `cf4ocl stub platform B` | OpenCL 1.1 | `Stub GPU B`, `Stub Accelerator B` |
//!
//! Memory objects keep their contents in host memory and every command
//! executes synchronously when it is enqueued. Each command is nevertheless
//! stamped with `queued`, `submit`, `start` and `end` times taken from a
//! monotonic nanosecond clock: commands on an in-order queue start after the
//! previous command on that queue ends and after every event they wait on.
//! Blocking commands and `finish` move the host clock to the end of the
//! awaited work.
//!
//! Programs are "compiled" by scanning their source for `__kernel`
//! declarations. A `#error` directive fails the build with a log. Kernel
//! launches have no effect unless a host closure was registered for the
//! kernel name with [`StubDriver::register_kernel`].

use std::collections::HashMap;
use std::mem;
use std::slice;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, RwLock, PoisonError};
use std::sync::atomic::{AtomicUsize, Ordering};
use crate::driver::{Driver, DriverResult, InfoAux, MappedPtr};
use crate::enums::{ClassTag, InfoKind, AddressingMode, FilterMode, MemObjectType,
    ImageChannelOrder, ImageChannelDataType};
use crate::ffi::{self, c_void, cl_int, cl_image_format, RawObject};
use crate::flags::{DeviceType, CommandQueueProperties, MemFlags, MapFlags, MemMigrationFlags};
use crate::prm::{self, OclPrm};
use crate::types::{ImageFormat, ImageDescriptor, OpenclVersion};

/// A host closure standing in for a kernel body.
pub type KernelFn = dyn Fn(&mut KernelInvocation) + Send + Sync;

const HANDLE_BASE: usize = 0x00C4_0000;
const HANDLE_STRIDE: usize = 0x40;

const HOST_STEP: u64 = 10;
const SUBMIT_DELAY: u64 = 5;
const TRANSFER_COST: u64 = 500;
const KERNEL_COST: u64 = 1_000;

const QUEUED: usize = 0;
const SUBMIT: usize = 1;
const START: usize = 2;
const END: usize = 3;

const BINARY_MAGIC: &[u8] = b"CF4OCL-STUB-BINARY\n";

const SUPPORTED_FORMATS: &[(u32, u32)] = &[
    (ffi::CL_RGBA, ffi::CL_UNORM_INT8),
    (ffi::CL_RGBA, ffi::CL_UNSIGNED_INT8),
    (ffi::CL_RGBA, ffi::CL_SIGNED_INT32),
    (ffi::CL_RGBA, ffi::CL_UNSIGNED_INT32),
    (ffi::CL_RGBA, ffi::CL_FLOAT),
    (ffi::CL_BGRA, ffi::CL_UNORM_INT8),
    (ffi::CL_RG, ffi::CL_FLOAT),
    (ffi::CL_R, ffi::CL_UNORM_INT8),
    (ffi::CL_R, ffi::CL_UNSIGNED_INT8),
    (ffi::CL_R, ffi::CL_UNSIGNED_INT32),
    (ffi::CL_R, ffi::CL_FLOAT),
];

struct PlatformSpec {
    name: &'static str,
    vendor: &'static str,
    version: &'static str,
    profile: &'static str,
    extensions: &'static str,
    devices: Vec<RawObject>,
}

struct DeviceSpec {
    platform: RawObject,
    device_type: DeviceType,
    name: &'static str,
    vendor: &'static str,
    vendor_id: u32,
    version: &'static str,
    c_version: &'static str,
    driver_version: &'static str,
    extensions: &'static str,
    built_in_kernels: &'static str,
    compute_units: u32,
    clock_mhz: u32,
    max_wg: usize,
    max_wi: [usize; 3],
    pref_multiple: usize,
    global_mem: u64,
    local_mem: u64,
    max_alloc: u64,
    double_fp: bool,
}

struct ContextObj {
    platform: RawObject,
    devices: Vec<RawObject>,
    properties: Vec<isize>,
    version: OpenclVersion,
}

struct QueueObj {
    context: RawObject,
    device: RawObject,
    properties: CommandQueueProperties,
    busy_until: u64,
}

struct MemObj {
    context: RawObject,
    flags: MemFlags,
    host_ptr: usize,
    map_count: u32,
    data: Vec<u8>,
    image: Option<(ImageFormat, ImageDescriptor)>,
}

struct SamplerObj {
    context: RawObject,
    normalized: bool,
    addressing: AddressingMode,
    filter: FilterMode,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ProgramOrigin {
    Source,
    Binary,
    BuiltIn,
    Linked,
}

#[derive(Clone)]
struct BuildRecord {
    status: cl_int,
    options: String,
    log: String,
    binary_type: u32,
}

impl BuildRecord {
    fn none() -> BuildRecord {
        BuildRecord {
            status: ffi::CL_BUILD_NONE,
            options: String::new(),
            log: String::new(),
            binary_type: ffi::CL_PROGRAM_BINARY_TYPE_NONE,
        }
    }

    fn is_usable(&self) -> bool {
        self.status == ffi::CL_BUILD_SUCCESS
            && self.binary_type == ffi::CL_PROGRAM_BINARY_TYPE_EXECUTABLE
    }
}

struct ProgramObj {
    context: RawObject,
    devices: Vec<RawObject>,
    source: String,
    code: String,
    origin: ProgramOrigin,
    builds: Vec<BuildRecord>,
    kernels: Vec<KernelDecl>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ParamKind {
    Mem,
    Sampler,
    Local,
    Value,
}

#[derive(Clone, Debug)]
struct ParamDecl {
    name: String,
    type_name: String,
    kind: ParamKind,
    address: u32,
    access: u32,
    type_qualifier: u64,
    value_size: Option<usize>,
}

#[derive(Clone, Debug)]
struct KernelDecl {
    name: String,
    params: Vec<ParamDecl>,
}

#[derive(Clone, Debug)]
enum ArgValue {
    Mem(RawObject),
    Sampler(RawObject),
    Local(usize),
    Private(Vec<u8>),
}

struct KernelObj {
    context: RawObject,
    program: RawObject,
    decl: KernelDecl,
    args: Vec<Option<ArgValue>>,
}

struct EventObj {
    context: RawObject,
    queue: Option<RawObject>,
    command_type: u32,
    status: cl_int,
    times: [u64; 4],
    profiling: bool,
}

enum Body {
    Platform(PlatformSpec),
    Device(DeviceSpec),
    Context(ContextObj),
    Queue(QueueObj),
    Mem(MemObj),
    Sampler(SamplerObj),
    Program(ProgramObj),
    Kernel(KernelObj),
    Event(EventObj),
}

struct Object {
    refs: u32,
    parents: Vec<RawObject>,
    body: Body,
}

impl Object {
    /// Platforms and devices are never created or destroyed.
    fn is_static(&self) -> bool {
        match self.body {
            Body::Platform(_) | Body::Device(_) => true,
            _ => false,
        }
    }
}

struct State {
    next_handle: usize,
    clock: u64,
    platforms: Vec<RawObject>,
    objects: HashMap<RawObject, Object>,
}

macro_rules! body_accessors {
    ($( $get:ident, $get_mut:ident => $variant:ident($ty:ty), $err:expr; )*) => {
        impl State {
            $(
                fn $get(&self, obj: RawObject) -> DriverResult<&$ty> {
                    match self.objects.get(&obj) {
                        Some(&Object { body: Body::$variant(ref inner), .. }) => Ok(inner),
                        _ => Err($err),
                    }
                }

                #[allow(dead_code)]
                fn $get_mut(&mut self, obj: RawObject) -> DriverResult<&mut $ty> {
                    match self.objects.get_mut(&obj) {
                        Some(&mut Object { body: Body::$variant(ref mut inner), .. }) => Ok(inner),
                        _ => Err($err),
                    }
                }
            )*
        }
    };
}

body_accessors! {
    platform, platform_mut => Platform(PlatformSpec), ffi::CL_INVALID_PLATFORM;
    device, device_mut => Device(DeviceSpec), ffi::CL_INVALID_DEVICE;
    context, context_mut => Context(ContextObj), ffi::CL_INVALID_CONTEXT;
    queue, queue_mut => Queue(QueueObj), ffi::CL_INVALID_COMMAND_QUEUE;
    mem, mem_mut => Mem(MemObj), ffi::CL_INVALID_MEM_OBJECT;
    sampler, sampler_mut => Sampler(SamplerObj), ffi::CL_INVALID_SAMPLER;
    program, program_mut => Program(ProgramObj), ffi::CL_INVALID_PROGRAM;
    kernel, kernel_mut => Kernel(KernelObj), ffi::CL_INVALID_KERNEL;
    event, event_mut => Event(EventObj), ffi::CL_INVALID_EVENT;
}

impl State {
    fn new() -> State {
        let mut state = State {
            next_handle: HANDLE_BASE,
            clock: 1_000,
            platforms: Vec::new(),
            objects: HashMap::new(),
        };

        let pa = state.next_id();
        let cpu_a = state.next_id();
        let gpu_a = state.next_id();
        let pb = state.next_id();
        let gpu_b = state.next_id();
        let acc_b = state.next_id();

        state.insert_static(pa, Body::Platform(PlatformSpec {
            name: "cf4ocl stub platform A",
            vendor: "cf4ocl",
            version: "OpenCL 2.0 cf4ocl-stub",
            profile: "FULL_PROFILE",
            extensions: "cl_khr_icd cl_khr_fp64",
            devices: vec![cpu_a, gpu_a],
        }));
        state.insert_static(cpu_a, Body::Device(DeviceSpec {
            platform: pa,
            device_type: DeviceType::CPU | DeviceType::DEFAULT,
            name: "Stub CPU A",
            vendor: "Stub Processors Inc.",
            vendor_id: 0x1001,
            version: "OpenCL 2.0 stub",
            c_version: "OpenCL C 2.0 ",
            driver_version: "2.0.1",
            extensions: "cl_khr_fp64 cl_khr_byte_addressable_store",
            built_in_kernels: "",
            compute_units: 8,
            clock_mhz: 3_200,
            max_wg: 1024,
            max_wi: [1024, 1024, 1024],
            pref_multiple: 8,
            global_mem: 8 << 30,
            local_mem: 32 << 10,
            max_alloc: 2 << 30,
            double_fp: true,
        }));
        state.insert_static(gpu_a, Body::Device(DeviceSpec {
            platform: pa,
            device_type: DeviceType::GPU,
            name: "Stub GPU A",
            vendor: "Stub Graphics Corp.",
            vendor_id: 0x1002,
            version: "OpenCL 2.0 stub",
            c_version: "OpenCL C 2.0 ",
            driver_version: "2.0.1",
            extensions: "cl_khr_fp64 cl_khr_global_int32_base_atomics",
            built_in_kernels: "stub_copy;stub_fill",
            compute_units: 32,
            clock_mhz: 1_400,
            max_wg: 256,
            max_wi: [256, 256, 256],
            pref_multiple: 32,
            global_mem: 4 << 30,
            local_mem: 64 << 10,
            max_alloc: 1 << 30,
            double_fp: true,
        }));
        state.insert_static(pb, Body::Platform(PlatformSpec {
            name: "cf4ocl stub platform B",
            vendor: "cf4ocl",
            version: "OpenCL 1.1 cf4ocl-stub",
            profile: "FULL_PROFILE",
            extensions: "cl_khr_icd",
            devices: vec![gpu_b, acc_b],
        }));
        state.insert_static(gpu_b, Body::Device(DeviceSpec {
            platform: pb,
            device_type: DeviceType::GPU | DeviceType::DEFAULT,
            name: "Stub GPU B",
            vendor: "Legacy Graphics Ltd.",
            vendor_id: 0x1003,
            version: "OpenCL 1.1 stub",
            c_version: "OpenCL C 1.1 ",
            driver_version: "1.1.7",
            extensions: "cl_khr_global_int32_base_atomics",
            built_in_kernels: "",
            compute_units: 16,
            clock_mhz: 900,
            max_wg: 512,
            max_wi: [512, 512, 64],
            pref_multiple: 64,
            global_mem: 2 << 30,
            local_mem: 32 << 10,
            max_alloc: 512 << 20,
            double_fp: false,
        }));
        state.insert_static(acc_b, Body::Device(DeviceSpec {
            platform: pb,
            device_type: DeviceType::ACCELERATOR,
            name: "Stub Accelerator B",
            vendor: "Legacy Graphics Ltd.",
            vendor_id: 0x1003,
            version: "OpenCL 1.1 stub",
            c_version: "OpenCL C 1.1 ",
            driver_version: "1.1.7",
            extensions: "",
            built_in_kernels: "",
            compute_units: 4,
            clock_mhz: 600,
            max_wg: 128,
            max_wi: [128, 128, 128],
            pref_multiple: 16,
            global_mem: 1 << 30,
            local_mem: 16 << 10,
            max_alloc: 256 << 20,
            double_fp: false,
        }));

        state.platforms = vec![pa, pb];
        state
    }

    fn next_id(&mut self) -> RawObject {
        self.next_handle += HANDLE_STRIDE;
        RawObject::from_addr(self.next_handle)
    }

    fn insert_static(&mut self, handle: RawObject, body: Body) {
        self.objects.insert(handle, Object { refs: 1, parents: Vec::new(), body });
    }

    /// Adds an object holding one reference to each of its parents.
    fn alloc(&mut self, body: Body, parents: Vec<RawObject>) -> RawObject {
        for parent in parents.iter() {
            if let Some(obj) = self.objects.get_mut(parent) {
                if !obj.is_static() { obj.refs += 1; }
            }
        }
        let handle = self.next_id();
        self.objects.insert(handle, Object { refs: 1, parents, body });
        handle
    }

    fn retain(&mut self, obj: RawObject) {
        if let Some(o) = self.objects.get_mut(&obj) {
            if !o.is_static() { o.refs += 1; }
        }
    }

    fn release(&mut self, obj: RawObject) {
        let mut pending = vec![obj];
        while let Some(obj) = pending.pop() {
            let freed = match self.objects.get_mut(&obj) {
                Some(o) if !o.is_static() => {
                    o.refs = o.refs.saturating_sub(1);
                    o.refs == 0
                },
                _ => false,
            };
            if freed {
                if let Some(o) = self.objects.remove(&obj) {
                    pending.extend(o.parents);
                }
            }
        }
    }

    fn refs(&self, obj: RawObject) -> u32 {
        self.objects.get(&obj).map(|o| o.refs).unwrap_or(0)
    }

    fn check_class(&self, class: ClassTag, obj: RawObject) -> DriverResult<()> {
        let body = self.objects.get(&obj).map(|o| &o.body);
        let valid = match (class, body) {
            (ClassTag::Platform, Some(&Body::Platform(_))) => true,
            (ClassTag::Device, Some(&Body::Device(_))) => true,
            (ClassTag::Context, Some(&Body::Context(_))) => true,
            (ClassTag::Queue, Some(&Body::Queue(_))) => true,
            (ClassTag::Buffer, Some(&Body::Mem(ref m))) => m.image.is_none(),
            (ClassTag::Image, Some(&Body::Mem(ref m))) => m.image.is_some(),
            (ClassTag::Sampler, Some(&Body::Sampler(_))) => true,
            (ClassTag::Program, Some(&Body::Program(_))) => true,
            (ClassTag::Kernel, Some(&Body::Kernel(_))) => true,
            (ClassTag::Event, Some(&Body::Event(_))) => true,
            _ => false,
        };
        if valid { return Ok(()); }

        Err(match class {
            ClassTag::Platform => ffi::CL_INVALID_PLATFORM,
            ClassTag::Device => ffi::CL_INVALID_DEVICE,
            ClassTag::Context => ffi::CL_INVALID_CONTEXT,
            ClassTag::Queue => ffi::CL_INVALID_COMMAND_QUEUE,
            ClassTag::Buffer | ClassTag::Image => ffi::CL_INVALID_MEM_OBJECT,
            ClassTag::Sampler => ffi::CL_INVALID_SAMPLER,
            ClassTag::Program => ffi::CL_INVALID_PROGRAM,
            ClassTag::Kernel => ffi::CL_INVALID_KERNEL,
            ClassTag::Event => ffi::CL_INVALID_EVENT,
        })
    }

    fn buffer(&self, obj: RawObject) -> DriverResult<&MemObj> {
        match self.mem(obj)? {
            m if m.image.is_none() => Ok(m),
            _ => Err(ffi::CL_INVALID_MEM_OBJECT),
        }
    }

    fn image(&self, obj: RawObject) -> DriverResult<(&MemObj, ImageLayout)> {
        let m = self.mem(obj)?;
        match m.image {
            Some((ref format, ref desc)) => Ok((m, ImageLayout::new(format, desc))),
            None => Err(ffi::CL_INVALID_MEM_OBJECT),
        }
    }

    fn context_version(&self, context: RawObject) -> DriverResult<OpenclVersion> {
        self.context(context).map(|c| c.version)
    }

    fn require_version(&self, context: RawObject, min: OpenclVersion) -> DriverResult<()> {
        if self.context_version(context)? < min {
            Err(ffi::CL_INVALID_OPERATION)
        } else {
            Ok(())
        }
    }

    /// Validates a queue and its wait list, returning the queue's context.
    fn check_enqueue(&self, queue: RawObject, wait: &[RawObject]) -> DriverResult<RawObject> {
        let context = self.queue(queue)?.context;
        for &ev in wait {
            let event = self.event(ev).map_err(|_| ffi::CL_INVALID_EVENT_WAIT_LIST)?;
            if event.context != context { return Err(ffi::CL_INVALID_CONTEXT); }
            if event.status < 0 { return Err(ffi::CL_EXEC_STATUS_ERROR_FOR_EVENTS_IN_WAIT_LIST); }
        }
        Ok(context)
    }

    fn check_context(&self, context: RawObject, expected: RawObject) -> DriverResult<()> {
        if context == expected { Ok(()) } else { Err(ffi::CL_INVALID_CONTEXT) }
    }

    /// Stamps a new command on `queue` and returns its event.
    fn record(&mut self, queue: RawObject, command_type: u32, wait: &[RawObject], cost: u64,
            blocking: bool, barrier: bool) -> RawObject {
        let ready = wait.iter()
            .filter_map(|&ev| self.event(ev).ok())
            .map(|e| e.times[END])
            .max()
            .unwrap_or(0);

        self.clock += HOST_STEP;
        let queued = self.clock;
        let submit = queued + SUBMIT_DELAY;

        let (context, profiling, end) = match self.queue_mut(queue) {
            Ok(q) => {
                let mut start = submit.max(ready);
                let in_order = !q.properties
                    .contains(CommandQueueProperties::OUT_OF_ORDER_EXEC_MODE_ENABLE);
                if in_order || barrier { start = start.max(q.busy_until); }
                let end = start + cost;
                q.busy_until = q.busy_until.max(end);
                (q.context, q.properties.contains(CommandQueueProperties::PROFILING_ENABLE),
                    [queued, submit, start, end])
            },
            Err(_) => (RawObject::null(), false, [queued, submit, submit, submit + cost]),
        };

        if blocking { self.clock = self.clock.max(end[END]); }

        self.alloc(Body::Event(EventObj {
            context,
            queue: Some(queue),
            command_type,
            status: ffi::CL_COMPLETE,
            times: end,
            profiling,
        }), vec![queue])
    }

    fn resolve_devices(&self, owned: &[RawObject], requested: &[RawObject])
            -> DriverResult<Vec<RawObject>> {
        if requested.is_empty() { return Ok(owned.to_vec()); }
        for dev in requested {
            if !owned.contains(dev) { return Err(ffi::CL_INVALID_DEVICE); }
        }
        Ok(requested.to_vec())
    }

    fn program_binary(&self, program: &ProgramObj, idx: usize) -> Vec<u8> {
        let build = &program.builds[idx];
        let has_binary = match program.origin {
            ProgramOrigin::Binary => true,
            ProgramOrigin::BuiltIn => false,
            _ => build.status == ffi::CL_BUILD_SUCCESS
                && build.binary_type != ffi::CL_PROGRAM_BINARY_TYPE_NONE,
        };
        if !has_binary { return Vec::new(); }
        let mut bin = BINARY_MAGIC.to_vec();
        bin.extend_from_slice(program.code.as_bytes());
        bin
    }
}

/// Byte layout of an image in stub memory.
#[derive(Clone, Copy, Debug)]
struct ImageLayout {
    format: ImageFormat,
    pixel: usize,
    row_pitch: usize,
    slice_pitch: usize,
    extent: [usize; 3],
}

impl ImageLayout {
    fn new(format: &ImageFormat, desc: &ImageDescriptor) -> ImageLayout {
        let pixel = format.pixel_bytes();
        let extent = desc.region();
        let row_pitch = extent[0] * pixel;
        ImageLayout {
            format: *format,
            pixel,
            row_pitch,
            slice_pitch: row_pitch * extent[1],
            extent,
        }
    }

    fn size(&self) -> usize {
        self.slice_pitch * self.extent[2]
    }

    fn offset(&self, origin: [usize; 3]) -> usize {
        origin[0] * self.pixel + origin[1] * self.row_pitch + origin[2] * self.slice_pitch
    }

    fn check_region(&self, origin: [usize; 3], region: [usize; 3]) -> DriverResult<()> {
        for i in 0..3 {
            if region[i] == 0 || origin[i] + region[i] > self.extent[i] {
                return Err(ffi::CL_INVALID_VALUE);
            }
        }
        Ok(())
    }
}

/// Copies a box of `rows * slices` rows of `row_bytes` each between two
/// pitched allocations.
fn copy_rect(src: &[u8], src_base: usize, src_pitch: (usize, usize), dst: &mut [u8],
        dst_base: usize, dst_pitch: (usize, usize), row_bytes: usize, rows: usize, slices: usize)
        -> DriverResult<()> {
    if rows == 0 || slices == 0 || row_bytes == 0 { return Err(ffi::CL_INVALID_VALUE); }
    let src_last = src_base + (slices - 1) * src_pitch.1 + (rows - 1) * src_pitch.0 + row_bytes;
    let dst_last = dst_base + (slices - 1) * dst_pitch.1 + (rows - 1) * dst_pitch.0 + row_bytes;
    if src_last > src.len() || dst_last > dst.len() { return Err(ffi::CL_INVALID_VALUE); }

    for z in 0..slices {
        for y in 0..rows {
            let s = src_base + z * src_pitch.1 + y * src_pitch.0;
            let d = dst_base + z * dst_pitch.1 + y * dst_pitch.0;
            dst[d..d + row_bytes].copy_from_slice(&src[s..s + row_bytes]);
        }
    }
    Ok(())
}

/// Host pitches default to tightly packed rows and slices.
fn host_pitches(layout: &ImageLayout, region: [usize; 3], row_pitch: usize, slice_pitch: usize)
        -> DriverResult<(usize, usize)> {
    let min_row = region[0] * layout.pixel;
    let row = if row_pitch == 0 { min_row } else { row_pitch };
    let min_slice = row * region[1];
    let slice = if slice_pitch == 0 { min_slice } else { slice_pitch };
    if row < min_row || slice < min_slice { return Err(ffi::CL_INVALID_VALUE); }
    Ok((row, slice))
}

/// Converts a fill color into one pixel of the given format.
fn encode_pixel(format: &ImageFormat, color: &[u8; 16]) -> DriverResult<Vec<u8>> {
    let comps: Vec<u32> = (0..4)
        .map(|i| prm::scalar_from_bytes::<u32>(&color[i * 4..]).unwrap_or(0))
        .collect();
    let as_f32 = |c: u32| f32::from_bits(c);

    let order: &[usize] = match format.channel_order {
        ImageChannelOrder::R | ImageChannelOrder::Rx | ImageChannelOrder::Intensity
            | ImageChannelOrder::Luminance => &[0],
        ImageChannelOrder::A => &[3],
        ImageChannelOrder::Rg | ImageChannelOrder::Rgx => &[0, 1],
        ImageChannelOrder::Ra => &[0, 3],
        ImageChannelOrder::Rgb | ImageChannelOrder::Rgbx => &[0, 1, 2],
        ImageChannelOrder::Rgba => &[0, 1, 2, 3],
        ImageChannelOrder::Bgra => &[2, 1, 0, 3],
        ImageChannelOrder::Argb => &[3, 0, 1, 2],
    };

    let mut pixel = Vec::with_capacity(format.pixel_bytes());
    for &c in order {
        let raw = comps[c];
        match format.channel_data_type {
            ImageChannelDataType::Float => pixel.extend_from_slice(&raw.to_ne_bytes()),
            ImageChannelDataType::UnormInt8 =>
                pixel.push((as_f32(raw).max(0.0).min(1.0) * 255.0).round() as u8),
            ImageChannelDataType::UnormInt16 => pixel.extend_from_slice(
                &((as_f32(raw).max(0.0).min(1.0) * 65535.0).round() as u16).to_ne_bytes()),
            ImageChannelDataType::SnormInt8 =>
                pixel.push((as_f32(raw).max(-1.0).min(1.0) * 127.0).round() as i8 as u8),
            ImageChannelDataType::SnormInt16 => pixel.extend_from_slice(
                &((as_f32(raw).max(-1.0).min(1.0) * 32767.0).round() as i16).to_ne_bytes()),
            ImageChannelDataType::SignedInt8 | ImageChannelDataType::UnsignedInt8 =>
                pixel.push(raw as u8),
            ImageChannelDataType::SignedInt16 | ImageChannelDataType::UnsignedInt16 =>
                pixel.extend_from_slice(&(raw as u16).to_ne_bytes()),
            ImageChannelDataType::SignedInt32 | ImageChannelDataType::UnsignedInt32 =>
                pixel.extend_from_slice(&raw.to_ne_bytes()),
            _ => return Err(ffi::CL_IMAGE_FORMAT_NOT_SUPPORTED),
        }
    }
    Ok(pixel)
}

fn transfer_cost(bytes: usize) -> u64 {
    TRANSFER_COST + bytes as u64
}

fn val<T: OclPrm>(v: T) -> Vec<u8> {
    prm::as_bytes(&[v]).to_vec()
}

fn vals<T: OclPrm>(v: &[T]) -> Vec<u8> {
    prm::as_bytes(v).to_vec()
}

fn text(s: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(s.len() + 1);
    bytes.extend_from_slice(s.as_bytes());
    bytes.push(0);
    bytes
}

fn flag(b: bool) -> Vec<u8> {
    val(if b { ffi::CL_TRUE } else { ffi::CL_FALSE })
}

fn handle(obj: RawObject) -> Vec<u8> {
    val(obj.addr())
}

fn handles(objs: &[RawObject]) -> Vec<u8> {
    let addrs: Vec<usize> = objs.iter().map(|o| o.addr()).collect();
    vals(&addrs)
}

//============================================================================
// Kernel source scanning
//============================================================================

/// Removes comments, keeping line structure.
fn strip_comments(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut chars = src.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '/' {
            match chars.peek() {
                Some(&'/') => {
                    while let Some(&n) = chars.peek() {
                        if n == '\n' { break; }
                        chars.next();
                    }
                    continue;
                },
                Some(&'*') => {
                    chars.next();
                    let mut prev = ' ';
                    while let Some(n) = chars.next() {
                        if n == '\n' { out.push('\n'); }
                        if prev == '*' && n == '/' { break; }
                        prev = n;
                    }
                    out.push(' ');
                    continue;
                },
                _ => (),
            }
        }
        out.push(c);
    }
    out
}

fn tokenize(src: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    for c in src.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            word.push(c);
            continue;
        }
        if !word.is_empty() { tokens.push(mem::replace(&mut word, String::new())); }
        if !c.is_whitespace() { tokens.push(c.to_string()); }
    }
    if !word.is_empty() { tokens.push(word); }
    tokens
}

/// Size of a private scalar or vector kernel argument type, if known.
fn value_size(type_name: &str) -> Option<usize> {
    let base_end = type_name.find(|c: char| c.is_ascii_digit()).unwrap_or(type_name.len());
    let (base, width) = type_name.split_at(base_end);
    let scalar = match base {
        "char" | "uchar" | "bool" => 1,
        "short" | "ushort" | "half" => 2,
        "int" | "uint" | "float" => 4,
        "long" | "ulong" | "double" | "size_t" | "ptrdiff_t" | "intptr_t" | "uintptr_t" => 8,
        _ => return None,
    };
    let lanes = match width {
        "" => 1,
        "2" => 2,
        "3" | "4" => 4,
        "8" => 8,
        "16" => 16,
        _ => return None,
    };
    Some(scalar * lanes)
}

fn parse_param(tokens: &[String]) -> Option<ParamDecl> {
    let name = tokens.iter().rev()
        .find(|t| t.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))?;
    let name_idx = tokens.iter().rposition(|t| t == name)?;
    let type_tokens = &tokens[..name_idx];

    let mut address = ffi::CL_KERNEL_ARG_ADDRESS_PRIVATE;
    let mut access = ffi::CL_KERNEL_ARG_ACCESS_NONE;
    let mut type_qualifier = ffi::CL_KERNEL_ARG_TYPE_NONE;
    let mut pointer = false;
    let mut words = Vec::new();

    for tok in type_tokens {
        match tok.as_str() {
            "__global" | "global" => address = ffi::CL_KERNEL_ARG_ADDRESS_GLOBAL,
            "__local" | "local" => address = ffi::CL_KERNEL_ARG_ADDRESS_LOCAL,
            "__constant" | "constant" => address = ffi::CL_KERNEL_ARG_ADDRESS_CONSTANT,
            "__private" | "private" => address = ffi::CL_KERNEL_ARG_ADDRESS_PRIVATE,
            "__read_only" | "read_only" => access = ffi::CL_KERNEL_ARG_ACCESS_READ_ONLY,
            "__write_only" | "write_only" => access = ffi::CL_KERNEL_ARG_ACCESS_WRITE_ONLY,
            "__read_write" | "read_write" => access = ffi::CL_KERNEL_ARG_ACCESS_READ_WRITE,
            "const" => type_qualifier |= ffi::CL_KERNEL_ARG_TYPE_CONST,
            "restrict" | "__restrict" => type_qualifier |= ffi::CL_KERNEL_ARG_TYPE_RESTRICT,
            "volatile" => type_qualifier |= ffi::CL_KERNEL_ARG_TYPE_VOLATILE,
            "*" => pointer = true,
            "unsigned" => words.push("u".to_string()),
            other => words.push(other.to_string()),
        }
    }

    let mut type_name = String::new();
    for w in words.iter() {
        if type_name == "u" { type_name.push_str(w); } else {
            if !type_name.is_empty() { type_name.push(' '); }
            type_name.push_str(w);
        }
    }
    if type_name == "u" { type_name = "uint".to_string(); }
    if type_name.is_empty() { return None; }

    let is_image = type_name.starts_with("image") || type_name == "pipe";
    if is_image {
        address = ffi::CL_KERNEL_ARG_ADDRESS_GLOBAL;
        if access == ffi::CL_KERNEL_ARG_ACCESS_NONE {
            access = ffi::CL_KERNEL_ARG_ACCESS_READ_ONLY;
        }
    }
    let kind = if address == ffi::CL_KERNEL_ARG_ADDRESS_LOCAL {
        ParamKind::Local
    } else if pointer || is_image {
        if address == ffi::CL_KERNEL_ARG_ADDRESS_PRIVATE {
            address = ffi::CL_KERNEL_ARG_ADDRESS_GLOBAL;
        }
        ParamKind::Mem
    } else if type_name == "sampler_t" {
        ParamKind::Sampler
    } else {
        ParamKind::Value
    };

    let value_size = if kind == ParamKind::Value { value_size(&type_name) } else { None };
    if pointer { type_name.push('*'); }

    Some(ParamDecl {
        name: name.clone(),
        type_name,
        kind,
        address,
        access,
        type_qualifier,
        value_size,
    })
}

/// Compiles a program source: reports `#error` directives and missing
/// headers and collects kernel declarations.
fn scan_source(code: &str, header_names: &[&str]) -> Result<Vec<KernelDecl>, String> {
    let code = strip_comments(code);
    let mut body = String::with_capacity(code.len());

    for (line_idx, line) in code.lines().enumerate() {
        let trimmed = line.trim_start();
        if trimmed.starts_with('#') {
            let directive = trimmed[1..].trim_start();
            if directive.starts_with("error") {
                return Err(format!("<stub source>:{}: error: {}", line_idx + 1,
                    directive["error".len()..].trim()));
            }
            if directive.starts_with("include") {
                let target = directive["include".len()..].trim()
                    .trim_matches(|c| c == '"' || c == '<' || c == '>');
                if !header_names.contains(&target) {
                    return Err(format!("<stub source>:{}: fatal error: '{}' file not found",
                        line_idx + 1, target));
                }
            }
            body.push('\n');
            continue;
        }
        body.push_str(line);
        body.push('\n');
    }

    let tokens = tokenize(&body);
    let mut kernels: Vec<KernelDecl> = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        if tokens[i] != "__kernel" && tokens[i] != "kernel" {
            i += 1;
            continue;
        }
        i += 1;

        // Skip `__attribute__((...))` blocks and the return type.
        while i < tokens.len() && tokens[i] == "__attribute__" {
            i += 1;
            let mut depth = 0;
            while i < tokens.len() {
                match tokens[i].as_str() {
                    "(" => depth += 1,
                    ")" => { depth -= 1; if depth == 0 { i += 1; break; } },
                    _ => (),
                }
                i += 1;
            }
        }
        if i >= tokens.len() || tokens[i] != "void" {
            return Err("<stub source>: error: kernel must return void".to_string());
        }
        i += 1;

        let name = match tokens.get(i) {
            Some(n) if n.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') => n.clone(),
            _ => return Err("<stub source>: error: expected kernel name".to_string()),
        };
        i += 1;
        if tokens.get(i).map(String::as_str) != Some("(") {
            return Err(format!("<stub source>: error: expected '(' after kernel '{}'", name));
        }
        i += 1;

        let mut depth = 1;
        let mut params = Vec::new();
        let mut current: Vec<String> = Vec::new();
        while i < tokens.len() {
            let tok = &tokens[i];
            i += 1;
            match tok.as_str() {
                "(" | "[" => depth += 1,
                ")" | "]" => {
                    depth -= 1;
                    if depth == 0 { break; }
                },
                "," if depth == 1 => {
                    params.push(mem::replace(&mut current, Vec::new()));
                    continue;
                },
                _ => (),
            }
            current.push(tok.clone());
        }
        if depth != 0 {
            return Err(format!("<stub source>: error: unterminated parameter list in kernel \
                '{}'", name));
        }
        if !current.is_empty() { params.push(current); }

        let mut decls = Vec::new();
        for p in params.iter() {
            if p.len() == 1 && p[0] == "void" { continue; }
            match parse_param(p) {
                Some(decl) => decls.push(decl),
                None => return Err(format!("<stub source>: error: invalid parameter in kernel \
                    '{}'", name)),
            }
        }

        if kernels.iter().any(|k| k.name == name) {
            return Err(format!("<stub source>: error: redefinition of kernel '{}'", name));
        }
        kernels.push(KernelDecl { name, params: decls });
    }

    Ok(kernels)
}

fn built_in_decl(name: &str) -> Option<KernelDecl> {
    let src = match name {
        "stub_copy" => "__kernel void stub_copy(__global const uchar* src, __global uchar* dst) {}",
        "stub_fill" => "__kernel void stub_fill(__global uchar* dst, uchar value) {}",
        _ => return None,
    };
    scan_source(src, &[]).ok().and_then(|mut k| k.pop())
}

//============================================================================
// Kernel invocation
//============================================================================

/// The view of a kernel launch given to a registered host closure.
pub struct KernelInvocation<'a> {
    name: &'a str,
    work_dim: usize,
    global_offset: [usize; 3],
    global_size: [usize; 3],
    local_size: Option<[usize; 3]>,
    args: Vec<ArgValue>,
    objects: &'a mut HashMap<RawObject, Object>,
}

impl<'a> KernelInvocation<'a> {
    pub fn name(&self) -> &str {
        self.name
    }

    pub fn work_dim(&self) -> usize {
        self.work_dim
    }

    pub fn global_size(&self) -> &[usize] {
        &self.global_size[..self.work_dim]
    }

    pub fn global_offset(&self) -> &[usize] {
        &self.global_offset[..self.work_dim]
    }

    pub fn local_size(&self) -> Option<&[usize]> {
        let dim = self.work_dim;
        self.local_size.as_ref().map(|l| &l[..dim])
    }

    /// Total number of work-items.
    pub fn global_len(&self) -> usize {
        self.global_size().iter().product()
    }

    pub fn num_args(&self) -> usize {
        self.args.len()
    }

    /// Reads a private (by-value) argument.
    pub fn private<T: OclPrm>(&self, index: usize) -> Option<T> {
        match self.args.get(index) {
            Some(&ArgValue::Private(ref bytes)) => prm::scalar_from_bytes(bytes),
            _ => None,
        }
    }

    /// Size of a local memory argument.
    pub fn local_bytes(&self, index: usize) -> Option<usize> {
        match self.args.get(index) {
            Some(&ArgValue::Local(size)) => Some(size),
            _ => None,
        }
    }

    /// Returns a copy of the contents of a memory object argument.
    pub fn read_mem<T: OclPrm>(&self, index: usize) -> Option<Vec<T>> {
        let handle = match self.args.get(index) {
            Some(&ArgValue::Mem(h)) => h,
            _ => return None,
        };
        match self.objects.get(&handle) {
            Some(&Object { body: Body::Mem(ref m), .. }) => Some(prm::from_bytes(&m.data)),
            _ => None,
        }
    }

    /// Overwrites the start of a memory object argument. Data beyond the
    /// object size is dropped. Returns false if the argument is not a
    /// memory object.
    pub fn write_mem<T: OclPrm>(&mut self, index: usize, data: &[T]) -> bool {
        let handle = match self.args.get(index) {
            Some(&ArgValue::Mem(h)) => h,
            _ => return false,
        };
        match self.objects.get_mut(&handle) {
            Some(&mut Object { body: Body::Mem(ref mut m), .. }) => {
                let bytes = prm::as_bytes(data);
                let len = bytes.len().min(m.data.len());
                m.data[..len].copy_from_slice(&bytes[..len]);
                true
            },
            _ => false,
        }
    }
}

//============================================================================
// StubDriver
//============================================================================

lazy_static! {
    static ref SHARED: Arc<StubDriver> = Arc::new(StubDriver::new());
}

/// The in-process emulated OpenCL host.
pub struct StubDriver {
    state: Mutex<State>,
    completion: Condvar,
    kernel_fns: RwLock<HashMap<String, Arc<KernelFn>>>,
    info_calls: AtomicUsize,
}

impl StubDriver {
    /// Creates an independent stub host with the built-in kernels registered.
    pub fn new() -> StubDriver {
        let driver = StubDriver {
            state: Mutex::new(State::new()),
            completion: Condvar::new(),
            kernel_fns: RwLock::new(HashMap::new()),
            info_calls: AtomicUsize::new(0),
        };

        driver.register_kernel("stub_copy", |inv| {
            let len = inv.global_len();
            if let Some(src) = inv.read_mem::<u8>(0) {
                let end = len.min(src.len());
                inv.write_mem(1, &src[..end]);
            }
        });
        driver.register_kernel("stub_fill", |inv| {
            let len = inv.global_len();
            let value = inv.private::<u8>(1).unwrap_or(0);
            inv.write_mem(0, &vec![value; len]);
        });
        driver
    }

    /// The process-wide stub instance.
    pub fn global() -> Arc<StubDriver> {
        SHARED.clone()
    }

    /// The process-wide stub instance as a backend.
    pub fn shared() -> Arc<dyn Driver> {
        SHARED.clone()
    }

    fn lock(&self) -> MutexGuard<State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Gives launches of kernel `name` an effect. The closure runs while the
    /// stub is locked and must not call back into the backend.
    pub fn register_kernel<F>(&self, name: &str, func: F)
            where F: Fn(&mut KernelInvocation) + Send + Sync + 'static {
        self.kernel_fns.write().unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), Arc::new(func));
    }

    /// Overrides the profiling timestamps of an event.
    pub fn set_event_times(&self, event: RawObject, queued: u64, submit: u64, start: u64,
            end: u64) -> DriverResult<()> {
        let mut st = self.lock();
        let ev = st.event_mut(event)?;
        ev.times = [queued, submit, start, end];
        Ok(())
    }

    /// Number of `get_info` calls served so far.
    pub fn info_call_count(&self) -> usize {
        self.info_calls.load(Ordering::SeqCst)
    }

    /// Number of live dynamic objects (everything except platforms and
    /// devices).
    pub fn live_objects(&self) -> usize {
        self.lock().objects.values().filter(|o| !o.is_static()).count()
    }

    /// Native reference count of an object, zero once it is freed.
    pub fn native_ref_count(&self, obj: RawObject) -> u32 {
        self.lock().refs(obj)
    }

    fn info_bytes(&self, st: &State, kind: InfoKind, obj: RawObject, aux: InfoAux, param: u32)
            -> DriverResult<Vec<u8>> {
        match kind {
            InfoKind::Platform => {
                let p = st.platform(obj)?;
                Ok(match param {
                    ffi::CL_PLATFORM_PROFILE => text(p.profile),
                    ffi::CL_PLATFORM_VERSION => text(p.version),
                    ffi::CL_PLATFORM_NAME => text(p.name),
                    ffi::CL_PLATFORM_VENDOR => text(p.vendor),
                    ffi::CL_PLATFORM_EXTENSIONS => text(p.extensions),
                    _ => return Err(ffi::CL_INVALID_VALUE),
                })
            },
            InfoKind::Device => device_info(st.device(obj)?, param),
            InfoKind::Context => {
                let c = st.context(obj)?;
                Ok(match param {
                    ffi::CL_CONTEXT_REFERENCE_COUNT => val(st.refs(obj)),
                    ffi::CL_CONTEXT_DEVICES => handles(&c.devices),
                    ffi::CL_CONTEXT_PROPERTIES => vals(&c.properties),
                    ffi::CL_CONTEXT_NUM_DEVICES => val(c.devices.len() as u32),
                    _ => return Err(ffi::CL_INVALID_VALUE),
                })
            },
            InfoKind::Queue => {
                let q = st.queue(obj)?;
                Ok(match param {
                    ffi::CL_QUEUE_CONTEXT => handle(q.context),
                    ffi::CL_QUEUE_DEVICE => handle(q.device),
                    ffi::CL_QUEUE_REFERENCE_COUNT => val(st.refs(obj)),
                    ffi::CL_QUEUE_PROPERTIES => val(q.properties.bits()),
                    _ => return Err(ffi::CL_INVALID_VALUE),
                })
            },
            InfoKind::MemObj => {
                let m = st.mem(obj)?;
                let mem_type = match m.image {
                    Some((_, ref desc)) => desc.image_type as u32,
                    None => ffi::CL_MEM_OBJECT_BUFFER,
                };
                Ok(match param {
                    ffi::CL_MEM_TYPE => val(mem_type),
                    ffi::CL_MEM_FLAGS => val(m.flags.bits()),
                    ffi::CL_MEM_SIZE => val(m.data.len()),
                    ffi::CL_MEM_HOST_PTR => val(m.host_ptr),
                    ffi::CL_MEM_MAP_COUNT => val(m.map_count),
                    ffi::CL_MEM_REFERENCE_COUNT => val(st.refs(obj)),
                    ffi::CL_MEM_CONTEXT => handle(m.context),
                    ffi::CL_MEM_ASSOCIATED_MEMOBJECT => handle(RawObject::null()),
                    ffi::CL_MEM_OFFSET => val(0usize),
                    _ => return Err(ffi::CL_INVALID_VALUE),
                })
            },
            InfoKind::Image => {
                let (m, layout) = st.image(obj)?;
                let desc = match m.image {
                    Some((_, ref desc)) => *desc,
                    None => return Err(ffi::CL_INVALID_MEM_OBJECT),
                };
                let is_3d_like = match desc.image_type {
                    MemObjectType::Image3d | MemObjectType::Image2dArray
                        | MemObjectType::Image1dArray => true,
                    _ => false,
                };
                Ok(match param {
                    ffi::CL_IMAGE_FORMAT => {
                        let raw = layout.format.to_raw();
                        vals(&[raw.image_channel_order, raw.image_channel_data_type])
                    },
                    ffi::CL_IMAGE_ELEMENT_SIZE => val(layout.pixel),
                    ffi::CL_IMAGE_ROW_PITCH => val(layout.row_pitch),
                    ffi::CL_IMAGE_SLICE_PITCH =>
                        val(if is_3d_like { layout.slice_pitch } else { 0 }),
                    ffi::CL_IMAGE_WIDTH => val(desc.image_width),
                    ffi::CL_IMAGE_HEIGHT => val(match desc.image_type {
                        MemObjectType::Image2d | MemObjectType::Image2dArray
                            | MemObjectType::Image3d => desc.image_height,
                        _ => 0,
                    }),
                    ffi::CL_IMAGE_DEPTH => val(match desc.image_type {
                        MemObjectType::Image3d => desc.image_depth,
                        _ => 0,
                    }),
                    ffi::CL_IMAGE_ARRAY_SIZE => val(desc.image_array_size),
                    ffi::CL_IMAGE_BUFFER => handle(RawObject::null()),
                    ffi::CL_IMAGE_NUM_MIP_LEVELS => val(0u32),
                    ffi::CL_IMAGE_NUM_SAMPLES => val(0u32),
                    _ => return Err(ffi::CL_INVALID_VALUE),
                })
            },
            InfoKind::Pipe => {
                st.mem(obj)?;
                Err(ffi::CL_INVALID_MEM_OBJECT)
            },
            InfoKind::Sampler => {
                let s = st.sampler(obj)?;
                Ok(match param {
                    ffi::CL_SAMPLER_REFERENCE_COUNT => val(st.refs(obj)),
                    ffi::CL_SAMPLER_CONTEXT => handle(s.context),
                    ffi::CL_SAMPLER_NORMALIZED_COORDS => flag(s.normalized),
                    ffi::CL_SAMPLER_ADDRESSING_MODE => val(s.addressing as u32),
                    ffi::CL_SAMPLER_FILTER_MODE => val(s.filter as u32),
                    _ => return Err(ffi::CL_INVALID_VALUE),
                })
            },
            InfoKind::Program => {
                let p = st.program(obj)?;
                let executable = p.builds.iter().any(BuildRecord::is_usable);
                Ok(match param {
                    ffi::CL_PROGRAM_REFERENCE_COUNT => val(st.refs(obj)),
                    ffi::CL_PROGRAM_CONTEXT => handle(p.context),
                    ffi::CL_PROGRAM_NUM_DEVICES => val(p.devices.len() as u32),
                    ffi::CL_PROGRAM_DEVICES => handles(&p.devices),
                    ffi::CL_PROGRAM_SOURCE => text(&p.source),
                    ffi::CL_PROGRAM_BINARY_SIZES => {
                        let sizes: Vec<usize> = (0..p.devices.len())
                            .map(|i| st.program_binary(p, i).len())
                            .collect();
                        vals(&sizes)
                    },
                    ffi::CL_PROGRAM_NUM_KERNELS if executable => val(p.kernels.len()),
                    ffi::CL_PROGRAM_KERNEL_NAMES if executable => {
                        let names: Vec<&str> = p.kernels.iter().map(|k| k.name.as_str()).collect();
                        text(&names.join(";"))
                    },
                    ffi::CL_PROGRAM_NUM_KERNELS | ffi::CL_PROGRAM_KERNEL_NAMES =>
                        return Err(ffi::CL_INVALID_PROGRAM_EXECUTABLE),
                    _ => return Err(ffi::CL_INVALID_VALUE),
                })
            },
            InfoKind::ProgramBuild => {
                let p = st.program(obj)?;
                let dev = match aux {
                    InfoAux::Object(dev) => dev,
                    _ => return Err(ffi::CL_INVALID_DEVICE),
                };
                let idx = p.devices.iter().position(|&d| d == dev)
                    .ok_or(ffi::CL_INVALID_DEVICE)?;
                let build = &p.builds[idx];
                Ok(match param {
                    ffi::CL_PROGRAM_BUILD_STATUS => val(build.status),
                    ffi::CL_PROGRAM_BUILD_OPTIONS => text(&build.options),
                    ffi::CL_PROGRAM_BUILD_LOG => text(&build.log),
                    ffi::CL_PROGRAM_BINARY_TYPE => val(build.binary_type),
                    _ => return Err(ffi::CL_INVALID_VALUE),
                })
            },
            InfoKind::Kernel => {
                let k = st.kernel(obj)?;
                Ok(match param {
                    ffi::CL_KERNEL_FUNCTION_NAME => text(&k.decl.name),
                    ffi::CL_KERNEL_NUM_ARGS => val(k.decl.params.len() as u32),
                    ffi::CL_KERNEL_REFERENCE_COUNT => val(st.refs(obj)),
                    ffi::CL_KERNEL_CONTEXT => handle(k.context),
                    ffi::CL_KERNEL_PROGRAM => handle(k.program),
                    ffi::CL_KERNEL_ATTRIBUTES => text(""),
                    _ => return Err(ffi::CL_INVALID_VALUE),
                })
            },
            InfoKind::KernelArg => {
                let k = st.kernel(obj)?;
                let idx = match aux {
                    InfoAux::Index(i) => i as usize,
                    _ => return Err(ffi::CL_INVALID_ARG_INDEX),
                };
                let p = k.decl.params.get(idx).ok_or(ffi::CL_INVALID_ARG_INDEX)?;
                Ok(match param {
                    ffi::CL_KERNEL_ARG_ADDRESS_QUALIFIER => val(p.address),
                    ffi::CL_KERNEL_ARG_ACCESS_QUALIFIER => val(p.access),
                    ffi::CL_KERNEL_ARG_TYPE_NAME => text(&p.type_name),
                    ffi::CL_KERNEL_ARG_TYPE_QUALIFIER => val(p.type_qualifier),
                    ffi::CL_KERNEL_ARG_NAME => text(&p.name),
                    _ => return Err(ffi::CL_INVALID_VALUE),
                })
            },
            InfoKind::KernelWorkGroup => {
                let k = st.kernel(obj)?;
                let devices = &st.context(k.context)?.devices;
                let dev = match aux {
                    InfoAux::Object(dev) if devices.contains(&dev) => dev,
                    InfoAux::None if devices.len() == 1 => devices[0],
                    _ => return Err(ffi::CL_INVALID_DEVICE),
                };
                let spec = st.device(dev)?;
                let local_mem: usize = k.args.iter().map(|a| match *a {
                    Some(ArgValue::Local(size)) => size,
                    _ => 0,
                }).sum();
                Ok(match param {
                    ffi::CL_KERNEL_WORK_GROUP_SIZE => val(spec.max_wg),
                    ffi::CL_KERNEL_COMPILE_WORK_GROUP_SIZE => vals(&[0usize, 0, 0]),
                    ffi::CL_KERNEL_LOCAL_MEM_SIZE => val(local_mem as u64),
                    ffi::CL_KERNEL_PREFERRED_WORK_GROUP_SIZE_MULTIPLE => val(spec.pref_multiple),
                    ffi::CL_KERNEL_PRIVATE_MEM_SIZE => val(0u64),
                    _ => return Err(ffi::CL_INVALID_VALUE),
                })
            },
            InfoKind::KernelSubGroup => {
                st.kernel(obj)?;
                Err(ffi::CL_INVALID_VALUE)
            },
            InfoKind::Event => {
                let e = st.event(obj)?;
                Ok(match param {
                    ffi::CL_EVENT_COMMAND_QUEUE => handle(e.queue.unwrap_or_else(RawObject::null)),
                    ffi::CL_EVENT_COMMAND_TYPE => val(e.command_type),
                    ffi::CL_EVENT_REFERENCE_COUNT => val(st.refs(obj)),
                    ffi::CL_EVENT_COMMAND_EXECUTION_STATUS => val(e.status),
                    ffi::CL_EVENT_CONTEXT => handle(e.context),
                    _ => return Err(ffi::CL_INVALID_VALUE),
                })
            },
            InfoKind::EventProfiling => {
                let e = st.event(obj)?;
                if !e.profiling || e.status != ffi::CL_COMPLETE {
                    return Err(ffi::CL_PROFILING_INFO_NOT_AVAILABLE);
                }
                Ok(match param {
                    ffi::CL_PROFILING_COMMAND_QUEUED => val(e.times[QUEUED]),
                    ffi::CL_PROFILING_COMMAND_SUBMIT => val(e.times[SUBMIT]),
                    ffi::CL_PROFILING_COMMAND_START => val(e.times[START]),
                    ffi::CL_PROFILING_COMMAND_END | ffi::CL_PROFILING_COMMAND_COMPLETE =>
                        val(e.times[END]),
                    _ => return Err(ffi::CL_INVALID_VALUE),
                })
            },
        }
    }
}

impl Default for StubDriver {
    fn default() -> StubDriver {
        StubDriver::new()
    }
}

fn device_info(d: &DeviceSpec, param: u32) -> DriverResult<Vec<u8>> {
    Ok(match param {
        ffi::CL_DEVICE_TYPE => val(d.device_type.bits()),
        ffi::CL_DEVICE_VENDOR_ID => val(d.vendor_id),
        ffi::CL_DEVICE_MAX_COMPUTE_UNITS => val(d.compute_units),
        ffi::CL_DEVICE_MAX_WORK_ITEM_DIMENSIONS => val(3u32),
        ffi::CL_DEVICE_MAX_WORK_GROUP_SIZE => val(d.max_wg),
        ffi::CL_DEVICE_MAX_WORK_ITEM_SIZES => vals(&d.max_wi),
        ffi::CL_DEVICE_PREFERRED_VECTOR_WIDTH_CHAR => val(16u32),
        ffi::CL_DEVICE_PREFERRED_VECTOR_WIDTH_SHORT => val(8u32),
        ffi::CL_DEVICE_PREFERRED_VECTOR_WIDTH_INT => val(4u32),
        ffi::CL_DEVICE_PREFERRED_VECTOR_WIDTH_LONG => val(2u32),
        ffi::CL_DEVICE_PREFERRED_VECTOR_WIDTH_FLOAT => val(4u32),
        ffi::CL_DEVICE_PREFERRED_VECTOR_WIDTH_DOUBLE => val(if d.double_fp { 2u32 } else { 0 }),
        ffi::CL_DEVICE_MAX_CLOCK_FREQUENCY => val(d.clock_mhz),
        ffi::CL_DEVICE_ADDRESS_BITS => val(64u32),
        ffi::CL_DEVICE_MAX_READ_IMAGE_ARGS => val(128u32),
        ffi::CL_DEVICE_MAX_WRITE_IMAGE_ARGS => val(8u32),
        ffi::CL_DEVICE_MAX_MEM_ALLOC_SIZE => val(d.max_alloc),
        ffi::CL_DEVICE_IMAGE2D_MAX_WIDTH | ffi::CL_DEVICE_IMAGE2D_MAX_HEIGHT => val(8192usize),
        ffi::CL_DEVICE_IMAGE3D_MAX_WIDTH | ffi::CL_DEVICE_IMAGE3D_MAX_HEIGHT
            | ffi::CL_DEVICE_IMAGE3D_MAX_DEPTH => val(2048usize),
        ffi::CL_DEVICE_IMAGE_SUPPORT => flag(true),
        ffi::CL_DEVICE_MAX_PARAMETER_SIZE => val(1024usize),
        ffi::CL_DEVICE_MAX_SAMPLERS => val(16u32),
        ffi::CL_DEVICE_MEM_BASE_ADDR_ALIGN => val(1024u32),
        ffi::CL_DEVICE_MIN_DATA_TYPE_ALIGN_SIZE => val(128u32),
        ffi::CL_DEVICE_GLOBAL_MEM_CACHELINE_SIZE => val(64u32),
        ffi::CL_DEVICE_GLOBAL_MEM_CACHE_SIZE => val(256u64 << 10),
        ffi::CL_DEVICE_GLOBAL_MEM_SIZE => val(d.global_mem),
        ffi::CL_DEVICE_MAX_CONSTANT_BUFFER_SIZE => val(64u64 << 10),
        ffi::CL_DEVICE_MAX_CONSTANT_ARGS => val(8u32),
        ffi::CL_DEVICE_LOCAL_MEM_SIZE => val(d.local_mem),
        ffi::CL_DEVICE_ERROR_CORRECTION_SUPPORT => flag(false),
        ffi::CL_DEVICE_PROFILING_TIMER_RESOLUTION => val(1usize),
        ffi::CL_DEVICE_ENDIAN_LITTLE => flag(cfg!(target_endian = "little")),
        ffi::CL_DEVICE_AVAILABLE | ffi::CL_DEVICE_COMPILER_AVAILABLE
            | ffi::CL_DEVICE_LINKER_AVAILABLE => flag(true),
        ffi::CL_DEVICE_QUEUE_PROPERTIES => val((CommandQueueProperties::PROFILING_ENABLE
            | CommandQueueProperties::OUT_OF_ORDER_EXEC_MODE_ENABLE).bits()),
        ffi::CL_DEVICE_NAME => text(d.name),
        ffi::CL_DEVICE_VENDOR => text(d.vendor),
        ffi::CL_DRIVER_VERSION => text(d.driver_version),
        ffi::CL_DEVICE_PROFILE => text("FULL_PROFILE"),
        ffi::CL_DEVICE_VERSION => text(d.version),
        ffi::CL_DEVICE_EXTENSIONS => text(d.extensions),
        ffi::CL_DEVICE_PLATFORM => handle(d.platform),
        ffi::CL_DEVICE_DOUBLE_FP_CONFIG if d.double_fp => val(0x3Fu64),
        ffi::CL_DEVICE_HOST_UNIFIED_MEMORY => flag(d.device_type.contains(DeviceType::CPU)),
        ffi::CL_DEVICE_OPENCL_C_VERSION => text(d.c_version),
        ffi::CL_DEVICE_BUILT_IN_KERNELS => text(d.built_in_kernels),
        ffi::CL_DEVICE_IMAGE_MAX_BUFFER_SIZE => val(65536usize),
        ffi::CL_DEVICE_IMAGE_MAX_ARRAY_SIZE => val(2048usize),
        ffi::CL_DEVICE_PARENT_DEVICE => handle(RawObject::null()),
        ffi::CL_DEVICE_REFERENCE_COUNT => val(1u32),
        ffi::CL_DEVICE_PREFERRED_INTEROP_USER_SYNC => flag(true),
        ffi::CL_DEVICE_PRINTF_BUFFER_SIZE => val(1usize << 20),
        _ => return Err(ffi::CL_INVALID_VALUE),
    })
}

impl Driver for StubDriver {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn get_info(&self, kind: InfoKind, obj: RawObject, aux: InfoAux, param: u32,
            value: Option<&mut [u8]>) -> DriverResult<usize> {
        self.info_calls.fetch_add(1, Ordering::SeqCst);
        let st = self.lock();
        let bytes = self.info_bytes(&st, kind, obj, aux, param)?;
        match value {
            None => Ok(bytes.len()),
            Some(buf) => {
                if buf.len() < bytes.len() { return Err(ffi::CL_INVALID_VALUE); }
                buf[..bytes.len()].copy_from_slice(&bytes);
                Ok(bytes.len())
            },
        }
    }

    fn retain(&self, class: ClassTag, obj: RawObject) -> DriverResult<()> {
        let mut st = self.lock();
        st.check_class(class, obj)?;
        st.retain(obj);
        Ok(())
    }

    fn release(&self, class: ClassTag, obj: RawObject) -> DriverResult<()> {
        let mut st = self.lock();
        st.check_class(class, obj)?;
        st.release(obj);
        Ok(())
    }

    fn platform_ids(&self) -> DriverResult<Vec<RawObject>> {
        Ok(self.lock().platforms.clone())
    }

    fn device_ids(&self, platform: RawObject, device_type: DeviceType)
            -> DriverResult<Vec<RawObject>> {
        let st = self.lock();
        let p = st.platform(platform)?;
        if device_type.is_empty() { return Err(ffi::CL_INVALID_DEVICE_TYPE); }

        let devices: Vec<RawObject> = p.devices.iter().cloned()
            .filter(|&d| match st.device(d) {
                Ok(spec) => device_type == DeviceType::ALL
                    || spec.device_type.intersects(device_type),
                Err(_) => false,
            })
            .collect();

        if devices.is_empty() { Err(ffi::CL_DEVICE_NOT_FOUND) } else { Ok(devices) }
    }

    fn create_context(&self, properties: &[isize], devices: &[RawObject])
            -> DriverResult<RawObject> {
        let mut st = self.lock();
        if devices.is_empty() { return Err(ffi::CL_INVALID_VALUE); }

        let mut platform = None;
        for pair in properties.chunks(2) {
            match *pair {
                [0] | [0, _] => break,
                [ffi::CL_CONTEXT_PLATFORM, value] => {
                    let p = RawObject::from_addr(value as usize);
                    st.platform(p)?;
                    platform = Some(p);
                },
                _ => return Err(ffi::CL_INVALID_PROPERTY),
            }
        }

        let first_platform = st.device(devices[0])?.platform;
        let platform = platform.unwrap_or(first_platform);
        for &dev in devices {
            if st.device(dev)?.platform != platform { return Err(ffi::CL_INVALID_DEVICE); }
        }

        let version = OpenclVersion::from_info_str(st.platform(platform)?.version)
            .map_err(|_| ffi::CL_INVALID_PLATFORM)?;
        let mut stored_props = properties.to_vec();
        if stored_props.last() != Some(&0) { stored_props.push(0); }

        Ok(st.alloc(Body::Context(ContextObj {
            platform,
            devices: devices.to_vec(),
            properties: stored_props,
            version,
        }), Vec::new()))
    }

    fn create_command_queue(&self, context: RawObject, device: RawObject,
            properties: CommandQueueProperties) -> DriverResult<RawObject> {
        let mut st = self.lock();
        if !st.context(context)?.devices.contains(&device) { return Err(ffi::CL_INVALID_DEVICE); }
        Ok(st.alloc(Body::Queue(QueueObj {
            context,
            device,
            properties,
            busy_until: 0,
        }), vec![context]))
    }

    unsafe fn create_buffer(&self, context: RawObject, flags: MemFlags, size: usize,
            host_ptr: *mut c_void) -> DriverResult<RawObject> {
        let mut st = self.lock();
        st.context(context)?;
        if size == 0 { return Err(ffi::CL_INVALID_BUFFER_SIZE); }
        if flags.contains(MemFlags::READ_ONLY | MemFlags::WRITE_ONLY) {
            return Err(ffi::CL_INVALID_VALUE);
        }
        let wants_host = flags.intersects(MemFlags::USE_HOST_PTR | MemFlags::COPY_HOST_PTR);
        if wants_host == host_ptr.is_null() { return Err(ffi::CL_INVALID_HOST_PTR); }

        let data = if host_ptr.is_null() {
            vec![0u8; size]
        } else {
            slice::from_raw_parts(host_ptr as *const u8, size).to_vec()
        };
        let host_addr = if flags.contains(MemFlags::USE_HOST_PTR) { host_ptr as usize } else { 0 };

        Ok(st.alloc(Body::Mem(MemObj {
            context,
            flags,
            host_ptr: host_addr,
            map_count: 0,
            data,
            image: None,
        }), vec![context]))
    }

    unsafe fn create_image(&self, context: RawObject, flags: MemFlags, format: &ImageFormat,
            desc: &ImageDescriptor, host_ptr: *mut c_void) -> DriverResult<RawObject> {
        let mut st = self.lock();
        st.context(context)?;

        let raw = format.to_raw();
        if !SUPPORTED_FORMATS.contains(&(raw.image_channel_order, raw.image_channel_data_type)) {
            return Err(ffi::CL_IMAGE_FORMAT_NOT_SUPPORTED);
        }
        match desc.image_type {
            MemObjectType::Image1d | MemObjectType::Image2d | MemObjectType::Image3d => (),
            MemObjectType::Image1dArray | MemObjectType::Image2dArray => {
                if desc.image_array_size == 0 { return Err(ffi::CL_INVALID_IMAGE_SIZE); }
            },
            _ => return Err(ffi::CL_INVALID_IMAGE_DESCRIPTOR),
        }
        if desc.image_width == 0 { return Err(ffi::CL_INVALID_IMAGE_SIZE); }
        match desc.image_type {
            MemObjectType::Image2d | MemObjectType::Image2dArray if desc.image_height == 0 =>
                return Err(ffi::CL_INVALID_IMAGE_SIZE),
            MemObjectType::Image3d if desc.image_height == 0 || desc.image_depth == 0 =>
                return Err(ffi::CL_INVALID_IMAGE_SIZE),
            _ => (),
        }
        let wants_host = flags.intersects(MemFlags::USE_HOST_PTR | MemFlags::COPY_HOST_PTR);
        if wants_host == host_ptr.is_null() { return Err(ffi::CL_INVALID_HOST_PTR); }

        let layout = ImageLayout::new(format, desc);
        let mut data = vec![0u8; layout.size()];
        if !host_ptr.is_null() {
            let (row, slice) = host_pitches(&layout, layout.extent, desc.image_row_pitch,
                desc.image_slice_pitch).map_err(|_| ffi::CL_INVALID_IMAGE_DESCRIPTOR)?;
            let host_len = slice * layout.extent[2];
            let host = slice::from_raw_parts(host_ptr as *const u8, host_len);
            copy_rect(host, 0, (row, slice), &mut data, 0, (layout.row_pitch, layout.slice_pitch),
                layout.extent[0] * layout.pixel, layout.extent[1], layout.extent[2])?;
        }
        let host_addr = if flags.contains(MemFlags::USE_HOST_PTR) { host_ptr as usize } else { 0 };

        Ok(st.alloc(Body::Mem(MemObj {
            context,
            flags,
            host_ptr: host_addr,
            map_count: 0,
            data,
            image: Some((*format, *desc)),
        }), vec![context]))
    }

    fn create_sampler(&self, context: RawObject, normalized_coords: bool,
            addressing_mode: AddressingMode, filter_mode: FilterMode) -> DriverResult<RawObject> {
        let mut st = self.lock();
        st.context(context)?;
        Ok(st.alloc(Body::Sampler(SamplerObj {
            context,
            normalized: normalized_coords,
            addressing: addressing_mode,
            filter: filter_mode,
        }), vec![context]))
    }

    fn create_sampler_with_properties(&self, context: RawObject, properties: &[u64])
            -> DriverResult<RawObject> {
        use enum_primitive::FromPrimitive;

        let mut st = self.lock();
        st.require_version(context, OpenclVersion::V2_0)?;

        let mut sampler = SamplerObj {
            context,
            normalized: true,
            addressing: AddressingMode::Clamp,
            filter: FilterMode::Nearest,
        };
        for pair in properties.chunks(2) {
            let (key, value) = match *pair {
                [0] | [0, _] => break,
                [key, value] => (key, value),
                _ => return Err(ffi::CL_INVALID_VALUE),
            };
            match key as u32 {
                ffi::CL_SAMPLER_NORMALIZED_COORDS => sampler.normalized = value != 0,
                ffi::CL_SAMPLER_ADDRESSING_MODE => sampler.addressing =
                    AddressingMode::from_u64(value).ok_or(ffi::CL_INVALID_VALUE)?,
                ffi::CL_SAMPLER_FILTER_MODE => sampler.filter =
                    FilterMode::from_u64(value).ok_or(ffi::CL_INVALID_VALUE)?,
                ffi::CL_SAMPLER_MIP_FILTER_MODE | ffi::CL_SAMPLER_LOD_MIN
                    | ffi::CL_SAMPLER_LOD_MAX => (),
                _ => return Err(ffi::CL_INVALID_VALUE),
            }
        }
        Ok(st.alloc(Body::Sampler(sampler), vec![context]))
    }

    fn create_program_with_source(&self, context: RawObject, sources: &[&str])
            -> DriverResult<RawObject> {
        let mut st = self.lock();
        let devices = st.context(context)?.devices.clone();
        if sources.is_empty() || sources.iter().all(|s| s.is_empty()) {
            return Err(ffi::CL_INVALID_VALUE);
        }
        let source = sources.concat();
        let builds = vec![BuildRecord::none(); devices.len()];

        Ok(st.alloc(Body::Program(ProgramObj {
            context,
            devices,
            code: source.clone(),
            source,
            origin: ProgramOrigin::Source,
            builds,
            kernels: Vec::new(),
        }), vec![context]))
    }

    fn create_program_with_binary(&self, context: RawObject, devices: &[RawObject],
            binaries: &[&[u8]]) -> DriverResult<RawObject> {
        let mut st = self.lock();
        let ctx_devices = st.context(context)?.devices.clone();
        if devices.is_empty() || devices.len() != binaries.len() {
            return Err(ffi::CL_INVALID_VALUE);
        }
        for dev in devices {
            if !ctx_devices.contains(dev) { return Err(ffi::CL_INVALID_DEVICE); }
        }

        let mut code = None;
        for bin in binaries {
            if bin.is_empty() { return Err(ffi::CL_INVALID_VALUE); }
            if !bin.starts_with(BINARY_MAGIC) { return Err(ffi::CL_INVALID_BINARY); }
            let body = String::from_utf8(bin[BINARY_MAGIC.len()..].to_vec())
                .map_err(|_| ffi::CL_INVALID_BINARY)?;
            if code.is_none() { code = Some(body); }
        }
        let code = code.unwrap_or_default();

        let builds = vec![BuildRecord {
            binary_type: ffi::CL_PROGRAM_BINARY_TYPE_EXECUTABLE,
            .. BuildRecord::none()
        }; devices.len()];

        Ok(st.alloc(Body::Program(ProgramObj {
            context,
            devices: devices.to_vec(),
            source: String::new(),
            code,
            origin: ProgramOrigin::Binary,
            builds,
            kernels: Vec::new(),
        }), vec![context]))
    }

    fn create_program_with_built_in_kernels(&self, context: RawObject, devices: &[RawObject],
            kernel_names: &str) -> DriverResult<RawObject> {
        let mut st = self.lock();
        st.require_version(context, OpenclVersion::V1_2)?;
        let ctx_devices = st.context(context)?.devices.clone();
        if devices.is_empty() { return Err(ffi::CL_INVALID_VALUE); }

        let names: Vec<&str> = kernel_names.split(';').map(str::trim)
            .filter(|n| !n.is_empty()).collect();
        if names.is_empty() { return Err(ffi::CL_INVALID_VALUE); }

        for dev in devices {
            if !ctx_devices.contains(dev) { return Err(ffi::CL_INVALID_DEVICE); }
            let available = st.device(*dev)?.built_in_kernels;
            for name in names.iter() {
                if !available.split(';').any(|a| a == *name) { return Err(ffi::CL_INVALID_VALUE); }
            }
        }

        let mut kernels = Vec::with_capacity(names.len());
        for name in names.iter() {
            kernels.push(built_in_decl(name).ok_or(ffi::CL_INVALID_VALUE)?);
        }
        let builds = vec![BuildRecord {
            status: ffi::CL_BUILD_SUCCESS,
            binary_type: ffi::CL_PROGRAM_BINARY_TYPE_EXECUTABLE,
            .. BuildRecord::none()
        }; devices.len()];

        Ok(st.alloc(Body::Program(ProgramObj {
            context,
            devices: devices.to_vec(),
            source: String::new(),
            code: String::new(),
            origin: ProgramOrigin::BuiltIn,
            builds,
            kernels,
        }), vec![context]))
    }

    fn build_program(&self, program: RawObject, devices: &[RawObject], options: &str)
            -> DriverResult<()> {
        let mut st = self.lock();
        let (targets, origin, code) = {
            let p = st.program(program)?;
            (st.resolve_devices(&p.devices, devices)?, p.origin, p.code.clone())
        };
        if origin == ProgramOrigin::BuiltIn { return Ok(()); }

        let outcome = scan_source(&code, &[]);
        let p = st.program_mut(program)?;
        let idxs: Vec<usize> = targets.iter()
            .filter_map(|t| p.devices.iter().position(|d| d == t))
            .collect();

        match outcome {
            Ok(kernels) => {
                for &i in idxs.iter() {
                    p.builds[i] = BuildRecord {
                        status: ffi::CL_BUILD_SUCCESS,
                        options: options.to_string(),
                        log: String::new(),
                        binary_type: ffi::CL_PROGRAM_BINARY_TYPE_EXECUTABLE,
                    };
                }
                p.kernels = kernels;
                Ok(())
            },
            Err(log) => {
                for &i in idxs.iter() {
                    p.builds[i] = BuildRecord {
                        status: ffi::CL_BUILD_ERROR,
                        options: options.to_string(),
                        log: log.clone(),
                        binary_type: ffi::CL_PROGRAM_BINARY_TYPE_NONE,
                    };
                }
                Err(ffi::CL_BUILD_PROGRAM_FAILURE)
            },
        }
    }

    fn compile_program(&self, program: RawObject, devices: &[RawObject], options: &str,
            headers: &[RawObject], header_names: &[&str]) -> DriverResult<()> {
        let mut st = self.lock();
        if headers.len() != header_names.len() { return Err(ffi::CL_INVALID_VALUE); }
        let (targets, origin, code, context) = {
            let p = st.program(program)?;
            (st.resolve_devices(&p.devices, devices)?, p.origin, p.code.clone(), p.context)
        };
        st.require_version(context, OpenclVersion::V1_2)?;
        if origin != ProgramOrigin::Source { return Err(ffi::CL_INVALID_OPERATION); }

        let mut full_code = String::new();
        for &h in headers {
            full_code.push_str(&st.program(h)?.source);
            full_code.push('\n');
        }
        full_code.push_str(&code);

        let outcome = scan_source(&code, header_names);
        let p = st.program_mut(program)?;
        let idxs: Vec<usize> = targets.iter()
            .filter_map(|t| p.devices.iter().position(|d| d == t))
            .collect();

        match outcome {
            Ok(kernels) => {
                for &i in idxs.iter() {
                    p.builds[i] = BuildRecord {
                        status: ffi::CL_BUILD_SUCCESS,
                        options: options.to_string(),
                        log: String::new(),
                        binary_type: ffi::CL_PROGRAM_BINARY_TYPE_COMPILED_OBJECT,
                    };
                }
                p.kernels = kernels;
                p.code = full_code;
                Ok(())
            },
            Err(log) => {
                for &i in idxs.iter() {
                    p.builds[i] = BuildRecord {
                        status: ffi::CL_BUILD_ERROR,
                        options: options.to_string(),
                        log: log.clone(),
                        binary_type: ffi::CL_PROGRAM_BINARY_TYPE_NONE,
                    };
                }
                Err(ffi::CL_COMPILE_PROGRAM_FAILURE)
            },
        }
    }

    fn link_program(&self, context: RawObject, devices: &[RawObject], options: &str,
            programs: &[RawObject]) -> DriverResult<RawObject> {
        let mut st = self.lock();
        st.require_version(context, OpenclVersion::V1_2)?;
        let ctx_devices = st.context(context)?.devices.clone();
        let targets = st.resolve_devices(&ctx_devices, devices)?;
        if programs.is_empty() { return Err(ffi::CL_INVALID_VALUE); }

        let mut code = String::new();
        let mut kernels: Vec<KernelDecl> = Vec::new();
        for &prog in programs {
            let p = st.program(prog)?;
            if p.context != context { return Err(ffi::CL_INVALID_CONTEXT); }
            let linkable = p.builds.iter().all(|b| b.status == ffi::CL_BUILD_SUCCESS
                && (b.binary_type == ffi::CL_PROGRAM_BINARY_TYPE_COMPILED_OBJECT
                    || b.binary_type == ffi::CL_PROGRAM_BINARY_TYPE_LIBRARY));
            if !linkable { return Err(ffi::CL_INVALID_PROGRAM); }
            for k in p.kernels.iter() {
                if kernels.iter().any(|e| e.name == k.name) {
                    return Err(ffi::CL_LINK_PROGRAM_FAILURE);
                }
                kernels.push(k.clone());
            }
            code.push_str(&p.code);
            code.push('\n');
        }

        let binary_type = if options.split_whitespace().any(|o| o == "-create-library") {
            ffi::CL_PROGRAM_BINARY_TYPE_LIBRARY
        } else {
            ffi::CL_PROGRAM_BINARY_TYPE_EXECUTABLE
        };
        let builds = vec![BuildRecord {
            status: ffi::CL_BUILD_SUCCESS,
            options: options.to_string(),
            log: String::new(),
            binary_type,
        }; targets.len()];

        Ok(st.alloc(Body::Program(ProgramObj {
            context,
            devices: targets,
            source: String::new(),
            code,
            origin: ProgramOrigin::Linked,
            builds,
            kernels,
        }), vec![context]))
    }

    fn program_binaries(&self, program: RawObject) -> DriverResult<Vec<Vec<u8>>> {
        let st = self.lock();
        let p = st.program(program)?;
        Ok((0..p.devices.len()).map(|i| st.program_binary(p, i)).collect())
    }

    fn create_kernel(&self, program: RawObject, name: &str) -> DriverResult<RawObject> {
        let mut st = self.lock();
        let (context, decl) = {
            let p = st.program(program)?;
            if !p.builds.iter().any(BuildRecord::is_usable) {
                return Err(ffi::CL_INVALID_PROGRAM_EXECUTABLE);
            }
            let decl = p.kernels.iter().find(|k| k.name == name)
                .ok_or(ffi::CL_INVALID_KERNEL_NAME)?;
            (p.context, decl.clone())
        };
        let args = vec![None; decl.params.len()];
        Ok(st.alloc(Body::Kernel(KernelObj { context, program, decl, args }), vec![program]))
    }

    unsafe fn set_kernel_arg(&self, kernel: RawObject, index: u32, size: usize,
            value: *const c_void) -> DriverResult<()> {
        let mut st = self.lock();
        let (param, context) = {
            let k = st.kernel(kernel)?;
            (k.decl.params.get(index as usize).cloned().ok_or(ffi::CL_INVALID_ARG_INDEX)?,
                k.context)
        };

        let read_handle = || -> DriverResult<RawObject> {
            if size != mem::size_of::<usize>() { return Err(ffi::CL_INVALID_ARG_SIZE); }
            if value.is_null() { return Ok(RawObject::null()); }
            Ok(RawObject::from_addr(::std::ptr::read_unaligned(value as *const usize)))
        };

        let arg = match param.kind {
            ParamKind::Local => {
                if !value.is_null() { return Err(ffi::CL_INVALID_ARG_VALUE); }
                if size == 0 { return Err(ffi::CL_INVALID_ARG_SIZE); }
                ArgValue::Local(size)
            },
            ParamKind::Mem => {
                let h = read_handle()?;
                if !h.is_null() {
                    let m = st.mem(h)?;
                    st.check_context(m.context, context)?;
                }
                ArgValue::Mem(h)
            },
            ParamKind::Sampler => {
                let h = read_handle()?;
                let s = st.sampler(h)?;
                st.check_context(s.context, context)?;
                ArgValue::Sampler(h)
            },
            ParamKind::Value => {
                if value.is_null() { return Err(ffi::CL_INVALID_ARG_VALUE); }
                if let Some(expected) = param.value_size {
                    if size != expected { return Err(ffi::CL_INVALID_ARG_SIZE); }
                }
                ArgValue::Private(slice::from_raw_parts(value as *const u8, size).to_vec())
            },
        };

        st.kernel_mut(kernel)?.args[index as usize] = Some(arg);
        Ok(())
    }

    fn enqueue_ndrange_kernel(&self, queue: RawObject, kernel: RawObject, work_dim: u32,
            global_offset: Option<&[usize]>, global_size: &[usize], local_size: Option<&[usize]>,
            wait: &[RawObject]) -> DriverResult<RawObject> {
        let mut st = self.lock();
        let context = st.check_enqueue(queue, wait)?;
        let device = st.queue(queue)?.device;

        let (name, args) = {
            let k = st.kernel(kernel)?;
            st.check_context(k.context, context)?;
            let mut args = Vec::with_capacity(k.args.len());
            for a in k.args.iter() {
                match *a {
                    Some(ref v) => args.push(v.clone()),
                    None => return Err(ffi::CL_INVALID_KERNEL_ARGS),
                }
            }
            (k.decl.name.clone(), args)
        };

        if work_dim < 1 || work_dim > 3 { return Err(ffi::CL_INVALID_WORK_DIMENSION); }
        let dim = work_dim as usize;
        if global_size.len() < dim || global_size[..dim].iter().any(|&g| g == 0) {
            return Err(ffi::CL_INVALID_GLOBAL_WORK_SIZE);
        }

        let mut gsize = [1usize; 3];
        gsize[..dim].copy_from_slice(&global_size[..dim]);
        let mut goff = [0usize; 3];
        if let Some(off) = global_offset {
            if off.len() < dim { return Err(ffi::CL_INVALID_GLOBAL_OFFSET); }
            goff[..dim].copy_from_slice(&off[..dim]);
        }

        let spec = st.device(device)?;
        let lsize = match local_size {
            Some(local) => {
                if local.len() < dim { return Err(ffi::CL_INVALID_WORK_GROUP_SIZE); }
                let mut l = [1usize; 3];
                for i in 0..dim {
                    if local[i] == 0 || gsize[i] % local[i] != 0 {
                        return Err(ffi::CL_INVALID_WORK_GROUP_SIZE);
                    }
                    if local[i] > spec.max_wi[i] { return Err(ffi::CL_INVALID_WORK_ITEM_SIZE); }
                    l[i] = local[i];
                }
                if l.iter().product::<usize>() > spec.max_wg {
                    return Err(ffi::CL_INVALID_WORK_GROUP_SIZE);
                }
                Some(l)
            },
            None => None,
        };

        let func = self.kernel_fns.read().unwrap_or_else(PoisonError::into_inner)
            .get(&name).cloned();
        if let Some(func) = func {
            let mut inv = KernelInvocation {
                name: &name,
                work_dim: dim,
                global_offset: goff,
                global_size: gsize,
                local_size: lsize,
                args,
                objects: &mut st.objects,
            };
            func(&mut inv);
        }

        let items: usize = gsize.iter().product();
        Ok(st.record(queue, ffi::CL_COMMAND_NDRANGE_KERNEL, wait, KERNEL_COST + items as u64,
            false, false))
    }

    unsafe fn enqueue_read_buffer(&self, queue: RawObject, buffer: RawObject, blocking: bool,
            offset: usize, data: &mut [u8], wait: &[RawObject]) -> DriverResult<RawObject> {
        let mut st = self.lock();
        let context = st.check_enqueue(queue, wait)?;
        {
            let m = st.buffer(buffer)?;
            st.check_context(m.context, context)?;
            let end = offset.checked_add(data.len()).ok_or(ffi::CL_INVALID_VALUE)?;
            if data.is_empty() || end > m.data.len() { return Err(ffi::CL_INVALID_VALUE); }
            data.copy_from_slice(&m.data[offset..end]);
        }
        Ok(st.record(queue, ffi::CL_COMMAND_READ_BUFFER, wait, transfer_cost(data.len()),
            blocking, false))
    }

    unsafe fn enqueue_write_buffer(&self, queue: RawObject, buffer: RawObject, blocking: bool,
            offset: usize, data: &[u8], wait: &[RawObject]) -> DriverResult<RawObject> {
        let mut st = self.lock();
        let context = st.check_enqueue(queue, wait)?;
        {
            st.check_context(st.buffer(buffer)?.context, context)?;
            let m = st.mem_mut(buffer)?;
            let end = offset.checked_add(data.len()).ok_or(ffi::CL_INVALID_VALUE)?;
            if data.is_empty() || end > m.data.len() { return Err(ffi::CL_INVALID_VALUE); }
            m.data[offset..end].copy_from_slice(data);
        }
        Ok(st.record(queue, ffi::CL_COMMAND_WRITE_BUFFER, wait, transfer_cost(data.len()),
            blocking, false))
    }

    fn enqueue_copy_buffer(&self, queue: RawObject, src: RawObject, dst: RawObject,
            src_offset: usize, dst_offset: usize, size: usize, wait: &[RawObject])
            -> DriverResult<RawObject> {
        let mut st = self.lock();
        let context = st.check_enqueue(queue, wait)?;
        let chunk = {
            let s = st.buffer(src)?;
            let d = st.buffer(dst)?;
            st.check_context(s.context, context)?;
            st.check_context(d.context, context)?;
            if size == 0 || src_offset + size > s.data.len() || dst_offset + size > d.data.len() {
                return Err(ffi::CL_INVALID_VALUE);
            }
            if src == dst && src_offset < dst_offset + size && dst_offset < src_offset + size {
                return Err(ffi::CL_MEM_COPY_OVERLAP);
            }
            s.data[src_offset..src_offset + size].to_vec()
        };
        st.mem_mut(dst)?.data[dst_offset..dst_offset + size].copy_from_slice(&chunk);
        Ok(st.record(queue, ffi::CL_COMMAND_COPY_BUFFER, wait, transfer_cost(size), false, false))
    }

    fn enqueue_fill_buffer(&self, queue: RawObject, buffer: RawObject, pattern: &[u8],
            offset: usize, size: usize, wait: &[RawObject]) -> DriverResult<RawObject> {
        let mut st = self.lock();
        let context = st.check_enqueue(queue, wait)?;
        st.require_version(context, OpenclVersion::V1_2)?;
        {
            st.check_context(st.buffer(buffer)?.context, context)?;
            let plen = pattern.len();
            if plen == 0 || plen > 128 || !plen.is_power_of_two() || offset % plen != 0
                    || size % plen != 0 || size == 0 {
                return Err(ffi::CL_INVALID_VALUE);
            }
            let m = st.mem_mut(buffer)?;
            if offset + size > m.data.len() { return Err(ffi::CL_INVALID_VALUE); }
            for chunk in m.data[offset..offset + size].chunks_mut(plen) {
                chunk.copy_from_slice(pattern);
            }
        }
        Ok(st.record(queue, ffi::CL_COMMAND_FILL_BUFFER, wait, transfer_cost(size), false, false))
    }

    unsafe fn enqueue_map_buffer(&self, queue: RawObject, buffer: RawObject, blocking: bool,
            _flags: MapFlags, offset: usize, size: usize, wait: &[RawObject])
            -> DriverResult<(MappedPtr, RawObject)> {
        let mut st = self.lock();
        let context = st.check_enqueue(queue, wait)?;
        let ptr = {
            st.check_context(st.buffer(buffer)?.context, context)?;
            let m = st.mem_mut(buffer)?;
            if size == 0 || offset + size > m.data.len() { return Err(ffi::CL_INVALID_VALUE); }
            m.map_count += 1;
            m.data.as_mut_ptr().add(offset) as *mut c_void
        };
        let event = st.record(queue, ffi::CL_COMMAND_MAP_BUFFER, wait, transfer_cost(size),
            blocking, false);
        Ok((MappedPtr { ptr, row_pitch: 0, slice_pitch: 0 }, event))
    }

    unsafe fn enqueue_read_image(&self, queue: RawObject, image: RawObject, blocking: bool,
            origin: [usize; 3], region: [usize; 3], row_pitch: usize, slice_pitch: usize,
            data: &mut [u8], wait: &[RawObject]) -> DriverResult<RawObject> {
        let mut st = self.lock();
        let context = st.check_enqueue(queue, wait)?;
        let bytes = {
            let (m, layout) = st.image(image)?;
            st.check_context(m.context, context)?;
            layout.check_region(origin, region)?;
            let host = host_pitches(&layout, region, row_pitch, slice_pitch)?;
            copy_rect(&m.data, layout.offset(origin), (layout.row_pitch, layout.slice_pitch),
                data, 0, host, region[0] * layout.pixel, region[1], region[2])?;
            region.iter().product::<usize>() * layout.pixel
        };
        Ok(st.record(queue, ffi::CL_COMMAND_READ_IMAGE, wait, transfer_cost(bytes), blocking,
            false))
    }

    unsafe fn enqueue_write_image(&self, queue: RawObject, image: RawObject, blocking: bool,
            origin: [usize; 3], region: [usize; 3], row_pitch: usize, slice_pitch: usize,
            data: &[u8], wait: &[RawObject]) -> DriverResult<RawObject> {
        let mut st = self.lock();
        let context = st.check_enqueue(queue, wait)?;
        let layout = {
            let (m, layout) = st.image(image)?;
            st.check_context(m.context, context)?;
            layout.check_region(origin, region)?;
            layout
        };
        let host = host_pitches(&layout, region, row_pitch, slice_pitch)?;
        {
            let m = st.mem_mut(image)?;
            copy_rect(data, 0, host, &mut m.data, layout.offset(origin),
                (layout.row_pitch, layout.slice_pitch), region[0] * layout.pixel, region[1],
                region[2])?;
        }
        let bytes = region.iter().product::<usize>() * layout.pixel;
        Ok(st.record(queue, ffi::CL_COMMAND_WRITE_IMAGE, wait, transfer_cost(bytes), blocking,
            false))
    }

    fn enqueue_copy_image(&self, queue: RawObject, src: RawObject, dst: RawObject,
            src_origin: [usize; 3], dst_origin: [usize; 3], region: [usize; 3],
            wait: &[RawObject]) -> DriverResult<RawObject> {
        let mut st = self.lock();
        let context = st.check_enqueue(queue, wait)?;
        let (src_data, src_layout, dst_layout) = {
            let (s, sl) = st.image(src)?;
            let (d, dl) = st.image(dst)?;
            st.check_context(s.context, context)?;
            st.check_context(d.context, context)?;
            if sl.format != dl.format { return Err(ffi::CL_IMAGE_FORMAT_MISMATCH); }
            sl.check_region(src_origin, region)?;
            dl.check_region(dst_origin, region)?;
            (s.data.clone(), sl, dl)
        };
        {
            let d = st.mem_mut(dst)?;
            copy_rect(&src_data, src_layout.offset(src_origin),
                (src_layout.row_pitch, src_layout.slice_pitch), &mut d.data,
                dst_layout.offset(dst_origin), (dst_layout.row_pitch, dst_layout.slice_pitch),
                region[0] * src_layout.pixel, region[1], region[2])?;
        }
        let bytes = region.iter().product::<usize>() * src_layout.pixel;
        Ok(st.record(queue, ffi::CL_COMMAND_COPY_IMAGE, wait, transfer_cost(bytes), false, false))
    }

    fn enqueue_fill_image(&self, queue: RawObject, image: RawObject, color: &[u8; 16],
            origin: [usize; 3], region: [usize; 3], wait: &[RawObject])
            -> DriverResult<RawObject> {
        let mut st = self.lock();
        let context = st.check_enqueue(queue, wait)?;
        st.require_version(context, OpenclVersion::V1_2)?;
        let layout = {
            let (m, layout) = st.image(image)?;
            st.check_context(m.context, context)?;
            layout.check_region(origin, region)?;
            layout
        };
        let pixel = encode_pixel(&layout.format, color)?;
        {
            let m = st.mem_mut(image)?;
            for z in 0..region[2] {
                for y in 0..region[1] {
                    for x in 0..region[0] {
                        let at = layout.offset([origin[0] + x, origin[1] + y, origin[2] + z]);
                        m.data[at..at + layout.pixel].copy_from_slice(&pixel);
                    }
                }
            }
        }
        let bytes = region.iter().product::<usize>() * layout.pixel;
        Ok(st.record(queue, ffi::CL_COMMAND_FILL_IMAGE, wait, transfer_cost(bytes), false, false))
    }

    unsafe fn enqueue_map_image(&self, queue: RawObject, image: RawObject, blocking: bool,
            _flags: MapFlags, origin: [usize; 3], region: [usize; 3], wait: &[RawObject])
            -> DriverResult<(MappedPtr, RawObject)> {
        let mut st = self.lock();
        let context = st.check_enqueue(queue, wait)?;
        let layout = {
            let (m, layout) = st.image(image)?;
            st.check_context(m.context, context)?;
            layout.check_region(origin, region)?;
            layout
        };
        let ptr = {
            let m = st.mem_mut(image)?;
            m.map_count += 1;
            m.data.as_mut_ptr().add(layout.offset(origin)) as *mut c_void
        };
        let bytes = region.iter().product::<usize>() * layout.pixel;
        let event = st.record(queue, ffi::CL_COMMAND_MAP_IMAGE, wait, transfer_cost(bytes),
            blocking, false);
        Ok((MappedPtr { ptr, row_pitch: layout.row_pitch, slice_pitch: layout.slice_pitch },
            event))
    }

    unsafe fn enqueue_unmap_mem_object(&self, queue: RawObject, mem: RawObject,
            mapped: *mut c_void, wait: &[RawObject]) -> DriverResult<RawObject> {
        let mut st = self.lock();
        let context = st.check_enqueue(queue, wait)?;
        {
            st.check_context(st.mem(mem)?.context, context)?;
            let m = st.mem_mut(mem)?;
            let base = m.data.as_ptr() as usize;
            let addr = mapped as usize;
            if m.map_count == 0 || addr < base || addr >= base + m.data.len() {
                return Err(ffi::CL_INVALID_VALUE);
            }
            m.map_count -= 1;
        }
        Ok(st.record(queue, ffi::CL_COMMAND_UNMAP_MEM_OBJECT, wait, TRANSFER_COST, false, false))
    }

    fn enqueue_migrate_mem_objects(&self, queue: RawObject, mems: &[RawObject],
            _flags: MemMigrationFlags, wait: &[RawObject]) -> DriverResult<RawObject> {
        let mut st = self.lock();
        let context = st.check_enqueue(queue, wait)?;
        st.require_version(context, OpenclVersion::V1_2)?;
        if mems.is_empty() { return Err(ffi::CL_INVALID_VALUE); }
        let mut bytes = 0;
        for &m in mems {
            let mem = st.mem(m)?;
            st.check_context(mem.context, context)?;
            bytes += mem.data.len();
        }
        Ok(st.record(queue, ffi::CL_COMMAND_MIGRATE_MEM_OBJECTS, wait, transfer_cost(bytes),
            false, false))
    }

    fn enqueue_marker(&self, queue: RawObject, wait: &[RawObject]) -> DriverResult<RawObject> {
        let mut st = self.lock();
        let context = st.check_enqueue(queue, wait)?;
        st.require_version(context, OpenclVersion::V1_2)?;
        Ok(st.record(queue, ffi::CL_COMMAND_MARKER, wait, 0, false, true))
    }

    fn enqueue_barrier(&self, queue: RawObject, wait: &[RawObject]) -> DriverResult<RawObject> {
        let mut st = self.lock();
        let context = st.check_enqueue(queue, wait)?;
        st.require_version(context, OpenclVersion::V1_2)?;
        Ok(st.record(queue, ffi::CL_COMMAND_BARRIER, wait, 0, false, true))
    }

    fn finish(&self, queue: RawObject) -> DriverResult<()> {
        let mut st = self.lock();
        let busy = st.queue(queue)?.busy_until;
        st.clock = st.clock.max(busy);
        Ok(())
    }

    fn flush(&self, queue: RawObject) -> DriverResult<()> {
        self.lock().queue(queue).map(|_| ())
    }

    fn wait_for_events(&self, events: &[RawObject]) -> DriverResult<()> {
        if events.is_empty() { return Err(ffi::CL_INVALID_VALUE); }
        let mut st = self.lock();

        let context = st.event(events[0])?.context;
        for &ev in events {
            if st.event(ev)?.context != context { return Err(ffi::CL_INVALID_CONTEXT); }
        }

        loop {
            let mut pending = false;
            let mut latest = 0;
            for &ev in events {
                // Events released while waiting count as complete.
                if let Ok(e) = st.event(ev) {
                    if e.status < 0 {
                        return Err(ffi::CL_EXEC_STATUS_ERROR_FOR_EVENTS_IN_WAIT_LIST);
                    }
                    if e.status > 0 { pending = true; }
                    latest = latest.max(e.times[END]);
                }
            }
            if !pending {
                st.clock = st.clock.max(latest);
                return Ok(());
            }
            st = self.completion.wait(st).unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn create_user_event(&self, context: RawObject) -> DriverResult<RawObject> {
        let mut st = self.lock();
        st.require_version(context, OpenclVersion::V1_1)?;
        let now = st.clock;
        Ok(st.alloc(Body::Event(EventObj {
            context,
            queue: None,
            command_type: ffi::CL_COMMAND_USER,
            status: ffi::CL_SUBMITTED,
            times: [now; 4],
            profiling: false,
        }), vec![context]))
    }

    fn set_user_event_status(&self, event: RawObject, status: cl_int) -> DriverResult<()> {
        let mut st = self.lock();
        st.clock += HOST_STEP;
        let now = st.clock;
        {
            let e = st.event_mut(event)?;
            if e.command_type != ffi::CL_COMMAND_USER { return Err(ffi::CL_INVALID_EVENT); }
            if status > ffi::CL_COMPLETE { return Err(ffi::CL_INVALID_VALUE); }
            if e.status <= ffi::CL_COMPLETE { return Err(ffi::CL_INVALID_OPERATION); }
            e.status = status;
            e.times[START] = now;
            e.times[END] = now;
        }
        self.completion.notify_all();
        Ok(())
    }

    fn supported_image_formats(&self, context: RawObject, _flags: MemFlags,
            image_type: MemObjectType) -> DriverResult<Vec<cl_image_format>> {
        let st = self.lock();
        st.context(context)?;
        match image_type {
            MemObjectType::Buffer | MemObjectType::Pipe | MemObjectType::Image1dBuffer =>
                Err(ffi::CL_INVALID_VALUE),
            _ => Ok(SUPPORTED_FORMATS.iter().map(|&(order, data_type)| cl_image_format {
                image_channel_order: order,
                image_channel_data_type: data_type,
            }).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_kernel_declarations() {
        let src = r#"
            // A comment mentioning __kernel void fake(int x)
            #define D 4
            __kernel void sum(__global const uint* a, __global const uint* b,
                    __global uint* c, uint d) {
                int gid = get_global_id(0);
                c[gid] = a[gid] + b[gid] + d;
            }

            /* __kernel void commented(void) {} */
            kernel void scratch(__local float* tmp, float4 v, sampler_t s,
                    __read_only image2d_t img) {}

            __kernel void noargs(void) {}
        "#;
        let kernels = scan_source(src, &[]).unwrap();
        let names: Vec<&str> = kernels.iter().map(|k| k.name.as_str()).collect();
        assert_eq!(names, vec!["sum", "scratch", "noargs"]);

        let sum = &kernels[0];
        assert_eq!(sum.params.len(), 4);
        assert_eq!(sum.params[0].kind, ParamKind::Mem);
        assert_eq!(sum.params[0].type_name, "uint*");
        assert_eq!(sum.params[3].kind, ParamKind::Value);
        assert_eq!(sum.params[3].value_size, Some(4));
        assert_eq!(sum.params[3].name, "d");

        let scratch = &kernels[1];
        assert_eq!(scratch.params[0].kind, ParamKind::Local);
        assert_eq!(scratch.params[1].value_size, Some(16));
        assert_eq!(scratch.params[2].kind, ParamKind::Sampler);
        assert_eq!(scratch.params[3].kind, ParamKind::Mem);
        assert_eq!(scratch.params[3].access, ffi::CL_KERNEL_ARG_ACCESS_READ_ONLY);

        assert!(kernels[2].params.is_empty());
    }

    #[test]
    fn error_directive_fails_build() {
        let log = scan_source("__kernel void k(void) {}\n#error Bad things\n", &[]).unwrap_err();
        assert!(log.contains(":2:"));
        assert!(log.contains("Bad things"));
    }

    #[test]
    fn missing_header_fails_compile() {
        let src = "#include \"defs.h\"\n__kernel void k(void) {}";
        assert!(scan_source(src, &[]).is_err());
        assert!(scan_source(src, &["defs.h"]).is_ok());
    }

    #[test]
    fn rect_copy_bounds() {
        let src: Vec<u8> = (0..16).collect();
        let mut dst = vec![0u8; 4];
        copy_rect(&src, 5, (4, 16), &mut dst, 0, (2, 4), 2, 2, 1).unwrap();
        assert_eq!(dst, vec![5, 6, 9, 10]);
        assert!(copy_rect(&src, 15, (4, 16), &mut dst, 0, (2, 4), 2, 2, 1).is_err());
    }

    #[test]
    fn fill_color_encoding() {
        let mut color = [0u8; 16];
        for (i, c) in [1.0f32, 0.0, 0.5, 1.0].iter().enumerate() {
            color[i * 4..i * 4 + 4].copy_from_slice(&c.to_bits().to_ne_bytes());
        }
        let bgra = ImageFormat::new(ImageChannelOrder::Bgra, ImageChannelDataType::UnormInt8);
        assert_eq!(encode_pixel(&bgra, &color).unwrap(), vec![128, 0, 255, 255]);
    }

    #[test]
    fn event_timeline_is_ordered() {
        let stub = StubDriver::new();
        let platforms = stub.platform_ids().unwrap();
        let devices = stub.device_ids(platforms[0], DeviceType::ALL).unwrap();
        let ctx = stub.create_context(&[], &devices[..1]).unwrap();
        let queue = stub.create_command_queue(ctx, devices[0],
            CommandQueueProperties::PROFILING_ENABLE).unwrap();
        let buf = unsafe {
            stub.create_buffer(ctx, MemFlags::READ_WRITE, 64, ::std::ptr::null_mut())
        }.unwrap();

        let data = [7u8; 64];
        let ev1 = unsafe { stub.enqueue_write_buffer(queue, buf, false, 0, &data, &[]) }.unwrap();
        let mut out = [0u8; 64];
        let ev2 = unsafe { stub.enqueue_read_buffer(queue, buf, true, 0, &mut out, &[]) }.unwrap();
        assert_eq!(out[..], data[..]);

        let time = |ev, param| {
            let mut bytes = [0u8; 8];
            stub.get_info(InfoKind::EventProfiling, ev, InfoAux::None, param, Some(&mut bytes))
                .unwrap();
            u64::from_ne_bytes(bytes)
        };
        let (start, end) = (ffi::CL_PROFILING_COMMAND_START, ffi::CL_PROFILING_COMMAND_END);
        assert!(time(ev1, end) <= time(ev2, start));
        assert!(time(ev2, start) < time(ev2, end));

        for obj in [ev1, ev2, buf, queue, ctx].iter() {
            let class = if *obj == buf {
                ClassTag::Buffer
            } else if *obj == queue {
                ClassTag::Queue
            } else if *obj == ctx {
                ClassTag::Context
            } else {
                ClassTag::Event
            };
            stub.release(class, *obj).unwrap();
        }
        assert_eq!(stub.live_objects(), 0);
    }
}
