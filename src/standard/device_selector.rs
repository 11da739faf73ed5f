//! Device selection through a chain of filters.
//!
//! Independent filters look at one device at a time. Dependent filters see
//! the whole list of devices which survived the previous filters and return
//! a new list.

use std::collections::HashSet;
use std::fmt;
use std::io::{self, BufRead, Write};
use crate::error::{Error, ErrorKind, Result};
use crate::ffi::{self, RawObject};
use crate::flags::DeviceType;
use crate::standard::device::{DevContainer, Device};
use crate::standard::Platform;

type IndepFn<'a> = Box<dyn Fn(&Device) -> Result<bool> + 'a>;
type DepFn<'a> = Box<dyn FnMut(Vec<Device>) -> Result<Vec<Device>> + 'a>;

/// Tags dependent filters so that context construction can tell whether
/// the selected devices are already restricted to one platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependentKind {
    SamePlatform,
    Other,
}

enum Filter<'a> {
    Independent(IndepFn<'a>),
    Dependent(DependentKind, DepFn<'a>),
}

/// An ordered chain of device filters.
///
/// ```ignore
/// let mut filters = Filters::new();
/// filters.type_gpu().platform_name("nvidia").same_platform();
/// let devices = filters.select()?;
/// ```
pub struct Filters<'a> {
    filters: Vec<Filter<'a>>,
}

impl<'a> Filters<'a> {
    pub fn new() -> Filters<'a> {
        Filters { filters: Vec::new() }
    }

    /// Appends a filter which keeps the devices for which `filter` returns
    /// `true`.
    pub fn add_independent<F>(&mut self, filter: F) -> &mut Filters<'a>
            where F: Fn(&Device) -> Result<bool> + 'a {
        self.filters.push(Filter::Independent(Box::new(filter)));
        self
    }

    /// Appends a filter which replaces the whole device list.
    pub fn add_dependent<F>(&mut self, kind: DependentKind, filter: F) -> &mut Filters<'a>
            where F: FnMut(Vec<Device>) -> Result<Vec<Device>> + 'a {
        self.filters.push(Filter::Dependent(kind, Box::new(filter)));
        self
    }

    /// Keeps devices whose type intersects `device_type`.
    pub fn device_type(&mut self, device_type: DeviceType) -> &mut Filters<'a> {
        self.add_independent(move |dev| dev.device_type().map(|t| t.intersects(device_type)))
    }

    pub fn type_cpu(&mut self) -> &mut Filters<'a> {
        self.device_type(DeviceType::CPU)
    }

    pub fn type_gpu(&mut self) -> &mut Filters<'a> {
        self.device_type(DeviceType::GPU)
    }

    pub fn type_accel(&mut self) -> &mut Filters<'a> {
        self.device_type(DeviceType::ACCELERATOR)
    }

    pub fn type_all(&mut self) -> &mut Filters<'a> {
        self.device_type(DeviceType::ALL)
    }

    /// Keeps the devices of `platform`.
    pub fn platform(&mut self, platform: &Platform) -> &mut Filters<'a> {
        let raw = platform.as_raw();
        self.add_independent(move |dev| dev.platform_raw().map(|p| p == raw))
    }

    /// Keeps devices whose platform name contains `substr`, ignoring case.
    pub fn platform_name(&mut self, substr: &str) -> &mut Filters<'a> {
        let needle = substr.to_lowercase();
        self.add_independent(move |dev| {
            Ok(dev.platform()?.name()?.to_lowercase().contains(&needle))
        })
    }

    /// Keeps devices whose name, vendor or platform name contains `substr`,
    /// ignoring case.
    pub fn substring(&mut self, substr: &str) -> &mut Filters<'a> {
        let needle = substr.to_lowercase();
        self.add_independent(move |dev| {
            if dev.name()?.to_lowercase().contains(&needle)
                    || dev.vendor()?.to_lowercase().contains(&needle) {
                return Ok(true);
            }
            Ok(dev.platform()?.name()?.to_lowercase().contains(&needle))
        })
    }

    /// Keeps the devices sharing the platform of the first surviving device.
    pub fn same_platform(&mut self) -> &mut Filters<'a> {
        self.add_dependent(DependentKind::SamePlatform, |devices| {
            let first = match devices.first() {
                Some(dev) => dev.platform_raw()?,
                None => return Ok(devices),
            };
            retain_platform(devices, first)
        })
    }

    /// Keeps the devices of the platform holding the most surviving devices.
    /// Ties go to the platform seen first.
    pub fn most_populated_platform(&mut self) -> &mut Filters<'a> {
        self.add_dependent(DependentKind::SamePlatform, |devices| {
            let mut counts: Vec<(RawObject, usize)> = Vec::new();
            for dev in &devices {
                let platform = dev.platform_raw()?;
                match counts.iter_mut().find(|(p, _)| *p == platform) {
                    Some(entry) => entry.1 += 1,
                    None => counts.push((platform, 1)),
                }
            }
            let mut best: Option<(RawObject, usize)> = None;
            for &(platform, count) in &counts {
                if best.map_or(true, |(_, c)| count > c) {
                    best = Some((platform, count));
                }
            }
            match best {
                Some((platform, _)) => retain_platform(devices, platform),
                None => Ok(devices),
            }
        })
    }

    /// Keeps the device at position `index` of the surviving list.
    pub fn index(&mut self, index: usize) -> &mut Filters<'a> {
        self.add_dependent(DependentKind::Other, move |mut devices| {
            if index >= devices.len() {
                return Err(Error::lib(ErrorKind::DeviceNotFound, format!("No device at index \
                    {} ({} device(s) available).", index, devices.len())));
            }
            Ok(vec![devices.swap_remove(index)])
        })
    }

    /// Lets the user pick one device from a menu on the standard streams.
    pub fn menu(&mut self, preselect: Option<usize>) -> &mut Filters<'a> {
        self.add_dependent(DependentKind::Other, move |devices| {
            let stdin = io::stdin();
            let stdout = io::stdout();
            let pick = menu_select(&devices, preselect, &mut stdin.lock(), &mut stdout.lock())?;
            Ok(vec![devices[pick].clone()])
        })
    }

    /// Lets the user pick one device from a menu written to `output`, reading
    /// the choice from `input`.
    pub fn menu_with<R, W>(&mut self, preselect: Option<usize>, mut input: R, mut output: W)
            -> &mut Filters<'a> where R: BufRead + 'a, W: Write + 'a {
        self.add_dependent(DependentKind::Other, move |devices| {
            let pick = menu_select(&devices, preselect, &mut input, &mut output)?;
            Ok(vec![devices[pick].clone()])
        })
    }

    /// Whether a filter restricting the devices to one platform is present.
    pub fn has_same_platform(&self) -> bool {
        self.filters.iter().any(|f| match *f {
            Filter::Dependent(DependentKind::SamePlatform, _) => true,
            _ => false,
        })
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Runs the filters, in insertion order, over every device on the host.
    ///
    /// The result may be empty.
    pub fn select(&mut self) -> Result<Vec<Device>> {
        let mut devices = all_devices()?;
        debug!("Selecting among {} device(s) with {} filter(s).", devices.len(),
            self.filters.len());

        for filter in self.filters.iter_mut() {
            devices = match *filter {
                Filter::Independent(ref keep) => {
                    let mut kept = Vec::with_capacity(devices.len());
                    for dev in devices {
                        if keep(&dev)? {
                            kept.push(dev);
                        }
                    }
                    kept
                },
                Filter::Dependent(_, ref mut replace) => replace(devices)?,
            };
            trace!("{} device(s) left after filter.", devices.len());
        }
        Ok(devices)
    }
}

impl<'a> Default for Filters<'a> {
    fn default() -> Filters<'a> {
        Filters::new()
    }
}

impl<'a> fmt::Debug for Filters<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Filters")
            .field("len", &self.filters.len())
            .field("has_same_platform", &self.has_same_platform())
            .finish()
    }
}

fn retain_platform(devices: Vec<Device>, platform: RawObject) -> Result<Vec<Device>> {
    let mut kept = Vec::with_capacity(devices.len());
    for dev in devices {
        if dev.platform_raw()? == platform {
            kept.push(dev);
        }
    }
    Ok(kept)
}

/// Every device of every platform, without duplicates.
fn all_devices() -> Result<Vec<Device>> {
    let mut seen = HashSet::new();
    let mut devices = Vec::new();
    for platform in Platform::list()? {
        let found = match platform.devices() {
            Ok(found) => found,
            Err(ref err) if err.api_status() == Some(ffi::CL_DEVICE_NOT_FOUND) => continue,
            Err(err) => return Err(err),
        };
        for dev in found {
            if seen.insert(dev.as_raw()) {
                devices.push(dev);
            }
        }
    }
    Ok(devices)
}

fn write_err(err: io::Error) -> Error {
    Error::io(ErrorKind::StreamWrite, "Unable to write the device menu.", err)
}

/// Prints the device list and reads the user's choice.
fn menu_select<R, W>(devices: &[Device], preselect: Option<usize>, input: &mut R,
        output: &mut W) -> Result<usize> where R: BufRead, W: Write {
    if devices.is_empty() {
        return Err(Error::lib(ErrorKind::DeviceNotFound, "No devices to choose from."));
    }

    match preselect {
        Some(idx) if idx < devices.len() => return Ok(idx),
        Some(idx) => writeln!(output, "\n   (!) No device at index {}!", idx).map_err(write_err)?,
        None => (),
    }

    let platforms = Platform::list()?;
    writeln!(output, "\nList of available OpenCL devices:").map_err(write_err)?;
    for (i, dev) in devices.iter().enumerate() {
        let platform = dev.platform_raw()?;
        let p = platforms.iter().position(|pf| pf.as_raw() == platform).unwrap_or(0);
        writeln!(output, "   {}. Platform #{} - {} ({})", i, p, dev.name()?, dev.vendor()?)
            .map_err(write_err)?;
    }

    let last = devices.len() - 1;
    loop {
        write!(output, "\n (?) Select device (0-{}) > ", last).map_err(write_err)?;
        output.flush().map_err(write_err)?;

        let mut line = String::new();
        let read = input.read_line(&mut line).map_err(|err| Error::io(ErrorKind::DeviceNotFound,
            "Unable to read the device choice.", err))?;
        if read == 0 {
            return Err(Error::lib(ErrorKind::DeviceNotFound,
                "No device was chosen before the end of input."));
        }
        match line.trim().parse::<usize>() {
            Ok(idx) if idx <= last => return Ok(idx),
            _ => writeln!(output, " (!) Invalid choice, please insert a value between 0 and {}.",
                last).map_err(write_err)?,
        }
    }
}
