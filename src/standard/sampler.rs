//! OpenCL samplers.

use enum_primitive::FromPrimitive;
use crate::driver;
use crate::enums::{AddressingMode, ClassTag, FilterMode, SamplerInfo};
use crate::error::{Error, ErrorKind, Result, ApiResultExt};
use crate::ffi::{self, RawObject};
use crate::standard::Context;
use crate::types::OpenclVersion;
use crate::wrapper::{self, Wrapper};

/// A sampler property, as passed to `Sampler::new_full`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SamplerProperty {
    NormalizedCoords(bool),
    AddressingMode(AddressingMode),
    FilterMode(FilterMode),
    MipFilterMode(FilterMode),
    LodMin(f32),
    LodMax(f32),
}

impl SamplerProperty {
    fn to_pair(&self) -> [ffi::cl_sampler_properties; 2] {
        let (key, value) = match *self {
            SamplerProperty::NormalizedCoords(b) => (ffi::CL_SAMPLER_NORMALIZED_COORDS, b as u64),
            SamplerProperty::AddressingMode(m) => (ffi::CL_SAMPLER_ADDRESSING_MODE, m as u64),
            SamplerProperty::FilterMode(m) => (ffi::CL_SAMPLER_FILTER_MODE, m as u64),
            SamplerProperty::MipFilterMode(m) => (ffi::CL_SAMPLER_MIP_FILTER_MODE, m as u64),
            SamplerProperty::LodMin(v) => (ffi::CL_SAMPLER_LOD_MIN, v.to_bits() as u64),
            SamplerProperty::LodMax(v) => (ffi::CL_SAMPLER_LOD_MAX, v.to_bits() as u64),
        };
        [key as ffi::cl_sampler_properties, value]
    }
}

pub struct SamplerData {
    context: Context,
}

/// A sampler wrapper.
#[derive(Clone)]
pub struct Sampler(pub(crate) Wrapper<SamplerData>);

impl_wrapper!(Sampler, SamplerData);

impl Sampler {
    pub fn new(context: &Context, normalized_coords: bool, addressing_mode: AddressingMode,
            filter_mode: FilterMode) -> Result<Sampler> {
        let native = driver::get().create_sampler(context.as_raw(), normalized_coords,
            addressing_mode, filter_mode).or_api("clCreateSampler")?;
        Wrapper::from_owned(ClassTag::Sampler, native, SamplerData { context: context.clone() })
            .map(Sampler)
    }

    /// Creates a sampler from a property list.
    ///
    /// On platforms older than OpenCL 2.0 only the normalized coordinates,
    /// addressing mode and filter mode properties can be honored; any other
    /// property fails with `UnsupportedVersion`. Unspecified properties take
    /// the OpenCL defaults (normalized coordinates, `Clamp`, `Nearest`).
    pub fn new_full(context: &Context, properties: &[SamplerProperty]) -> Result<Sampler> {
        if context.opencl_version()? >= OpenclVersion::V2_0 {
            let mut raw: Vec<ffi::cl_sampler_properties> = properties.iter()
                .flat_map(|p| p.to_pair().to_vec())
                .collect();
            raw.push(0);
            let native = driver::get().create_sampler_with_properties(context.as_raw(), &raw)
                .or_api("clCreateSamplerWithProperties")?;
            return Wrapper::from_owned(ClassTag::Sampler, native,
                SamplerData { context: context.clone() }).map(Sampler);
        }

        let (mut normalized, mut addressing, mut filter) = (true, AddressingMode::Clamp,
            FilterMode::Nearest);
        for prop in properties {
            match *prop {
                SamplerProperty::NormalizedCoords(b) => normalized = b,
                SamplerProperty::AddressingMode(m) => addressing = m,
                SamplerProperty::FilterMode(m) => filter = m,
                other => return Err(Error::lib(ErrorKind::UnsupportedVersion, format!("Sampler \
                    property {:?} requires OpenCL 2.0.", other))),
            }
        }
        debug!("Falling back to clCreateSampler for a pre-2.0 platform.");
        Sampler::new(context, normalized, addressing, filter)
    }

    /// Wraps an existing native sampler, taking a new native reference.
    pub fn from_raw(native: RawObject) -> Result<Sampler> {
        if let Some(existing) = Wrapper::lookup(native) {
            return Ok(Sampler(existing));
        }
        let context = Context::from_raw(wrapper::query_param(native, SamplerInfo::Context)?
            .as_object()?)?;
        Wrapper::new_wrap(ClassTag::Sampler, native, SamplerData { context }).map(Sampler)
    }

    pub fn context(&self) -> &Context {
        &self.data().context
    }

    pub fn normalized_coords(&self) -> Result<bool> {
        self.info(SamplerInfo::NormalizedCoords)?.as_bool()
    }

    pub fn addressing_mode(&self) -> Result<AddressingMode> {
        let raw = self.info(SamplerInfo::AddressingMode)?.as_scalar::<u32>()?;
        AddressingMode::from_u32(raw).ok_or_else(|| Error::lib(ErrorKind::InvalidData,
            format!("Unknown addressing mode {:#x}.", raw)))
    }

    pub fn filter_mode(&self) -> Result<FilterMode> {
        let raw = self.info(SamplerInfo::FilterMode)?.as_scalar::<u32>()?;
        FilterMode::from_u32(raw).ok_or_else(|| Error::lib(ErrorKind::InvalidData,
            format!("Unknown filter mode {:#x}.", raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_pairs() {
        let pair = SamplerProperty::FilterMode(FilterMode::Linear).to_pair();
        assert_eq!(pair, [ffi::CL_SAMPLER_FILTER_MODE as u64, ffi::CL_FILTER_LINEAR as u64]);
        let pair = SamplerProperty::LodMax(1.5).to_pair();
        assert_eq!(f32::from_bits(pair[1] as u32), 1.5);
    }
}
