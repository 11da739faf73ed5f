//! OpenCL programs.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use enum_primitive::FromPrimitive;
use crate::driver::{self, InfoAux};
use crate::enums::{ClassTag, ProgramBuildInfo, ProgramBuildStatus, ProgramInfo};
use crate::error::{Error, ErrorKind, Result, ApiResultExt};
use crate::ffi::RawObject;
use crate::standard::device::{self, DevContainer, Device};
use crate::standard::event::{Event, EventWaitList};
use crate::standard::kernel::{Kernel, KernelArg};
use crate::standard::{Context, Queue};
use crate::types::OpenclVersion;
use crate::wrapper::{self, Lazy, Wrapper};

pub struct ProgramData {
    context: Context,
    devices: Lazy<Vec<Device>>,
    kernels: Mutex<HashMap<String, Kernel>>,
}

impl ProgramData {
    fn new(context: Context) -> ProgramData {
        ProgramData { context, devices: Lazy::new(), kernels: Mutex::new(HashMap::new()) }
    }
}

/// A program wrapper.
///
/// Kernels obtained with `get_kernel` are owned by the program and live as
/// long as it does.
#[derive(Clone)]
pub struct Program(pub(crate) Wrapper<ProgramData>);

impl_wrapper!(Program, ProgramData);

fn raw_devices(devices: &[&Device]) -> Vec<RawObject> {
    devices.iter().map(|d| d.as_raw()).collect()
}

impl Program {
    fn wrap_owned(context: &Context, native: RawObject) -> Result<Program> {
        let data = ProgramData::new(context.clone());
        Wrapper::from_owned(ClassTag::Program, native, data).map(Program)
    }

    /// Creates a program from one source string.
    pub fn new_from_source(context: &Context, source: &str) -> Result<Program> {
        Program::new_from_sources(context, &[source])
    }

    /// Creates a program from several source strings, concatenated in order.
    pub fn new_from_sources(context: &Context, sources: &[&str]) -> Result<Program> {
        let native = driver::get().create_program_with_source(context.as_raw(), sources)
            .or_api("clCreateProgramWithSource")?;
        Program::wrap_owned(context, native)
    }

    pub fn new_from_source_file<P: AsRef<Path>>(context: &Context, path: P) -> Result<Program> {
        Program::new_from_source_files(context, &[path])
    }

    /// Creates a program from the contents of several source files.
    pub fn new_from_source_files<P: AsRef<Path>>(context: &Context, paths: &[P])
            -> Result<Program> {
        let mut sources = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            let src = fs::read_to_string(path).map_err(|err| Error::io(ErrorKind::OpenFile,
                format!("Unable to read source file '{}'.", path.display()), err))?;
            sources.push(src);
        }
        let refs: Vec<&str> = sources.iter().map(|s| s.as_str()).collect();
        Program::new_from_sources(context, &refs)
    }

    /// Creates a program from one binary per device. An empty binary is an
    /// `InvalidData` error.
    pub fn new_from_binaries(context: &Context, binaries: &[(&Device, &[u8])])
            -> Result<Program> {
        if binaries.is_empty() {
            return Err(Error::lib(ErrorKind::BadArguments, "No program binaries given."));
        }
        for &(dev, bin) in binaries {
            if bin.is_empty() {
                return Err(Error::lib(ErrorKind::InvalidData,
                    format!("The binary for device '{}' is empty.", dev)));
            }
        }
        let devices: Vec<RawObject> = binaries.iter().map(|&(d, _)| d.as_raw()).collect();
        let bins: Vec<&[u8]> = binaries.iter().map(|&(_, b)| b).collect();
        let native = driver::get().create_program_with_binary(context.as_raw(), &devices, &bins)
            .or_api("clCreateProgramWithBinary")?;
        Program::wrap_owned(context, native)
    }

    pub fn new_from_binary_file<P: AsRef<Path>>(context: &Context, device: &Device, path: P)
            -> Result<Program> {
        Program::new_from_binary_files(context, &[(device, path)])
    }

    /// Creates a program from one binary file per device.
    pub fn new_from_binary_files<P: AsRef<Path>>(context: &Context, files: &[(&Device, P)])
            -> Result<Program> {
        let mut contents = Vec::with_capacity(files.len());
        for &(dev, ref path) in files {
            let path = path.as_ref();
            let bin = fs::read(path).map_err(|err| Error::io(ErrorKind::OpenFile,
                format!("Unable to read binary file '{}'.", path.display()), err))?;
            contents.push((dev, bin));
        }
        let refs: Vec<(&Device, &[u8])> = contents.iter().map(|&(d, ref b)| (d, &b[..]))
            .collect();
        Program::new_from_binaries(context, &refs)
    }

    /// Creates a program from `;`-separated built-in kernel names. Requires
    /// OpenCL 1.2.
    pub fn new_from_built_in_kernels(context: &Context, devices: &[&Device], names: &str)
            -> Result<Program> {
        context.require_version(OpenclVersion::V1_2, "Built-in kernels")?;
        let native = driver::get().create_program_with_built_in_kernels(context.as_raw(),
            &raw_devices(devices), names).or_api("clCreateProgramWithBuiltInKernels")?;
        Program::wrap_owned(context, native)
    }

    /// Wraps an existing native program, taking a new native reference.
    pub fn from_raw(native: RawObject) -> Result<Program> {
        if let Some(existing) = Wrapper::lookup(native) {
            return Ok(Program(existing));
        }
        let context = Context::from_raw(wrapper::query_param(native, ProgramInfo::Context)?
            .as_object()?)?;
        Wrapper::new_wrap(ClassTag::Program, native, ProgramData::new(context)).map(Program)
    }

    pub fn context(&self) -> &Context {
        &self.data().context
    }

    /// Builds the program for all of its devices.
    pub fn build(&self, options: &str) -> Result<()> {
        self.build_full(&[], options)
    }

    /// Builds the program for `devices`, or for all of its devices when the
    /// slice is empty. On failure `build_log` holds the compiler output.
    pub fn build_full(&self, devices: &[&Device], options: &str) -> Result<()> {
        let res = driver::get().build_program(self.as_raw(), &raw_devices(devices), options)
            .or_api("clBuildProgram");
        match res {
            Ok(()) => debug!("Built program {:?} with options '{}'.", self.as_raw(), options),
            Err(ref err) => debug!("Building program {:?} failed: {}", self.as_raw(), err),
        }
        res
    }

    /// Compiles the program without linking. `headers` pairs each embedded
    /// header program with the include name it is referred to by. Requires
    /// OpenCL 1.2.
    pub fn compile(&self, devices: &[&Device], options: &str, headers: &[(&Program, &str)])
            -> Result<()> {
        self.context().require_version(OpenclVersion::V1_2, "Program compilation")?;
        let header_progs: Vec<RawObject> = headers.iter().map(|&(p, _)| p.as_raw()).collect();
        let header_names: Vec<&str> = headers.iter().map(|&(_, n)| n).collect();
        driver::get().compile_program(self.as_raw(), &raw_devices(devices), options,
            &header_progs, &header_names).or_api("clCompileProgram")
    }

    /// Links compiled programs into a new program. Requires OpenCL 1.2.
    pub fn link(context: &Context, devices: &[&Device], options: &str, programs: &[&Program])
            -> Result<Program> {
        context.require_version(OpenclVersion::V1_2, "Program linking")?;
        let inputs: Vec<RawObject> = programs.iter().map(|p| p.as_raw()).collect();
        let native = driver::get().link_program(context.as_raw(), &raw_devices(devices),
            options, &inputs).or_api("clLinkProgram")?;
        Program::wrap_owned(context, native)
    }

    /// The build status on `device`. Not cached.
    pub fn build_status(&self, device: &Device) -> Result<ProgramBuildStatus> {
        let raw = self.query(ProgramBuildInfo::BuildStatus, InfoAux::Object(device.as_raw()))?
            .as_scalar::<i32>()?;
        ProgramBuildStatus::from_i32(raw).ok_or_else(|| Error::lib(ErrorKind::InvalidData,
            format!("Unknown build status {}.", raw)))
    }

    /// The build log of one device. Not cached.
    pub fn device_build_log(&self, device: &Device) -> Result<String> {
        match self.query(ProgramBuildInfo::BuildLog, InfoAux::Object(device.as_raw())) {
            Ok(entry) => Ok(entry.as_string()),
            Err(ref err) if err.is_kind(ErrorKind::InfoUnavailable) => Ok(String::new()),
            Err(err) => Err(err),
        }
    }

    /// The build logs of all devices, each non-empty one preceded by a
    /// header naming its device.
    pub fn build_log(&self) -> Result<String> {
        let mut out = String::new();
        for dev in self.devices()? {
            let log = self.device_build_log(&dev)?;
            if log.trim().is_empty() {
                continue;
            }
            out.push_str(&format!("*** Build log for device '{}' ***\n{}\n", dev.name()?, log));
        }
        Ok(out)
    }

    /// The concatenated program source. Empty for programs created from
    /// binaries or built-in kernels.
    pub fn source(&self) -> Result<String> {
        self.info(ProgramInfo::Source).map(|e| e.as_string())
    }

    /// Names of the kernels in the built program.
    pub fn kernel_names(&self) -> Result<Vec<String>> {
        let names = self.query(ProgramInfo::KernelNames, InfoAux::None)?.as_string();
        Ok(names.split(';').filter(|n| !n.is_empty()).map(str::to_string).collect())
    }

    /// Returns the kernel called `name`, creating it on first request.
    pub fn get_kernel(&self, name: &str) -> Result<Kernel> {
        let mut kernels = self.data().kernels.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(kernel) = kernels.get(name) {
            return Ok(kernel.clone());
        }
        let kernel = Kernel::new(self, name)?;
        kernels.insert(name.to_string(), kernel.clone());
        Ok(kernel)
    }

    /// Sets the arguments of kernel `name` and enqueues it.
    pub fn enqueue_kernel<'a, I>(&self, name: &str, queue: &Queue, dims: usize,
            global_offset: Option<&[usize]>, global_size: &[usize], local_size: Option<&[usize]>,
            wait: Option<&mut EventWaitList>, args: I) -> Result<Event>
            where I: IntoIterator<Item = KernelArg<'a>> {
        self.get_kernel(name)?.set_args_and_enqueue_ndrange(queue, dims, global_offset,
            global_size, local_size, wait, args)
    }

    /// The binary built for `device`.
    pub fn binary(&self, device: &Device) -> Result<Vec<u8>> {
        let devices = self.devices()?;
        let idx = devices.iter().position(|d| d == device).ok_or_else(|| Error::lib(
            ErrorKind::DeviceNotFound, format!("Device '{}' is not associated with this \
                program.", device)))?;
        let mut binaries = driver::get().program_binaries(self.as_raw())
            .or_api("clGetProgramInfo")?;
        if idx >= binaries.len() || binaries[idx].is_empty() {
            return Err(Error::lib(ErrorKind::InvalidData, format!("No binary is available for \
                device '{}'.", device)));
        }
        Ok(binaries.swap_remove(idx))
    }

    /// Writes the binary built for `device` to `path`.
    pub fn save_binary<P: AsRef<Path>>(&self, device: &Device, path: P) -> Result<()> {
        let path = path.as_ref();
        let bin = self.binary(device)?;
        let mut file = File::create(path).map_err(|err| Error::io(ErrorKind::OpenFile,
            format!("Unable to create binary file '{}'.", path.display()), err))?;
        file.write_all(&bin).map_err(|err| Error::io(ErrorKind::StreamWrite,
            format!("Unable to write binary file '{}'.", path.display()), err))?;
        debug!("Saved {} byte binary for '{}' to '{}'.", bin.len(), device, path.display());
        Ok(())
    }

    /// Saves one binary per device to `{prefix}{device name}_{index:02}{suffix}`.
    /// Characters of the device name other than ASCII letters, digits, `_`
    /// and `.` are replaced by `_`. Returns the written paths.
    pub fn save_all_binaries(&self, prefix: &str, suffix: &str) -> Result<Vec<String>> {
        let mut paths = Vec::new();
        for (i, dev) in self.devices()?.iter().enumerate() {
            let path = format!("{}{}_{:02}{}", prefix, file_name_part(&dev.name()?), i, suffix);
            self.save_binary(dev, &path)?;
            paths.push(path);
        }
        Ok(paths)
    }
}

fn file_name_part(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '.' { c } else { '_' })
        .collect()
}

impl DevContainer for Program {
    fn devices(&self) -> Result<Vec<Device>> {
        self.data().devices.get_or_try_init(|| {
            device::wrap_devices(&self.info(ProgramInfo::Devices)?.as_objects())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::file_name_part;

    #[test]
    fn binary_file_names() {
        assert_eq!(file_name_part("Stub GPU A"), "Stub_GPU_A");
        assert_eq!(file_name_part("gfx-90.6 (rev:1)"), "gfx_90.6__rev_1_");
    }
}
