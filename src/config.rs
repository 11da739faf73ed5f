//! Defaults read from the environment.
//!
//! `CF4OCL_DEFAULT_PLATFORM_IDX` and `CF4OCL_DEFAULT_DEVICE_TYPE` steer the
//! "any device" context constructor, much like `OCL_DEFAULT_PLATFORM_IDX` and
//! `OCL_DEFAULT_DEVICE_TYPE` do for `ocl`.

use std::env;
use crate::error::{Error, ErrorKind, Result};
use crate::flags::DeviceType;

/// Index of the platform preferred by `Context::new_any`.
pub const DEFAULT_PLATFORM_IDX_ENV: &str = "CF4OCL_DEFAULT_PLATFORM_IDX";

/// `|`-separated device type names restricting `Context::new_any`.
pub const DEFAULT_DEVICE_TYPE_ENV: &str = "CF4OCL_DEFAULT_DEVICE_TYPE";

/// Environment-provided device selection defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Defaults {
    pub platform_idx: Option<usize>,
    pub device_type: Option<DeviceType>,
}

impl Defaults {
    /// Reads both variables. Unset or empty variables leave the matching
    /// field `None`.
    pub fn from_env() -> Result<Defaults> {
        Ok(Defaults {
            platform_idx: read_var(DEFAULT_PLATFORM_IDX_ENV, parse_platform_idx)?,
            device_type: read_var(DEFAULT_DEVICE_TYPE_ENV, parse_device_type)?,
        })
    }
}

fn read_var<T, F>(name: &str, parse: F) -> Result<Option<T>>
        where F: FnOnce(&str) -> Result<T> {
    match env::var(name) {
        Ok(ref s) if s.trim().is_empty() => Ok(None),
        Ok(s) => parse(s.trim()).map(Some),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(Error::lib(ErrorKind::BadArguments,
            format!("{} is not valid unicode.", name))),
    }
}

pub fn parse_platform_idx(s: &str) -> Result<usize> {
    s.parse::<usize>().map_err(|err| Error::lib(ErrorKind::BadArguments,
        format!("Invalid {} value '{}': {}.", DEFAULT_PLATFORM_IDX_ENV, s, err)))
}

pub fn parse_device_type(s: &str) -> Result<DeviceType> {
    DeviceType::from_names(s).ok_or_else(|| Error::lib(ErrorKind::BadArguments,
        format!("Invalid {} value '{}'. Expected a '|'-separated list of CPU, GPU, \
            ACCELERATOR, CUSTOM, DEFAULT or ALL.", DEFAULT_DEVICE_TYPE_ENV, s)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_type_names() {
        assert_eq!(parse_device_type("gpu").unwrap(), DeviceType::GPU);
        assert_eq!(parse_device_type("CPU | Accelerator").unwrap(),
            DeviceType::CPU | DeviceType::ACCELERATOR);
        assert!(parse_device_type("fpga").unwrap_err().is_kind(ErrorKind::BadArguments));
    }

    #[test]
    fn platform_index() {
        assert_eq!(parse_platform_idx("1").unwrap(), 1);
        assert!(parse_platform_idx("-1").unwrap_err().is_kind(ErrorKind::BadArguments));
    }
}
