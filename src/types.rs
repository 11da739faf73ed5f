//! Small value types shared by several wrappers.

use std::fmt;
use crate::error::{Error, ErrorKind, Result};
use crate::enums::{ImageChannelOrder, ImageChannelDataType, MemObjectType};
use crate::ffi;
use enum_primitive::FromPrimitive;

/// Parsed OpenCL version in the layout `({major}, {minor})`.
///
/// ex.: 'OpenCL 1.2' -> `OpenclVersion::new(1, 2)`.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OpenclVersion {
    ver: [u16; 2],
}

impl OpenclVersion {
    pub const V1_0: OpenclVersion = OpenclVersion { ver: [1, 0] };
    pub const V1_1: OpenclVersion = OpenclVersion { ver: [1, 1] };
    pub const V1_2: OpenclVersion = OpenclVersion { ver: [1, 2] };
    pub const V2_0: OpenclVersion = OpenclVersion { ver: [2, 0] };

    pub fn new(major: u16, minor: u16) -> OpenclVersion {
        OpenclVersion { ver: [major, minor] }
    }

    pub fn major(&self) -> u16 {
        self.ver[0]
    }

    pub fn minor(&self) -> u16 {
        self.ver[1]
    }

    /// Integer form used in version comparisons, e.g. `120` for 1.2.
    pub fn as_number(&self) -> u32 {
        self.ver[0] as u32 * 100 + self.ver[1] as u32 * 10
    }

    /// Parses a version string such as `"OpenCL 1.2 CUDA 10.1.120"` or
    /// `"OpenCL C 1.2 "`.
    ///
    /// The word following "OpenCL" (or "OpenCL C") is split at '.' and the
    /// two halves parsed as the major and minor numbers.
    pub fn from_info_str(ver: &str) -> Result<OpenclVersion> {
        let mut words = ver.split_whitespace();

        while let Some(word) = words.next() {
            if !word.eq_ignore_ascii_case("opencl") { continue; }

            let mut next = words.next();
            if next == Some("C") { next = words.next(); }

            if let Some(num_word) = next {
                let mut nums = num_word.split('.');
                let major = nums.next().and_then(|n| n.parse::<u16>().ok());
                let minor = nums.next().and_then(|n| {
                    let digits: String = n.chars().take_while(|c| c.is_ascii_digit()).collect();
                    digits.parse::<u16>().ok()
                });
                if let (Some(major), Some(minor)) = (major, minor) {
                    return Ok(OpenclVersion::new(major, minor));
                }
            }
            break;
        }

        Err(Error::lib(ErrorKind::InvalidData,
            format!("Error parsing OpenCL version from the string: '{}'.", ver)))
    }
}

impl From<[u16; 2]> for OpenclVersion {
    fn from(ver: [u16; 2]) -> OpenclVersion {
        OpenclVersion { ver }
    }
}

impl fmt::Display for OpenclVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.ver[0], self.ver[1])
    }
}

/// An image format descriptor (`cl_image_format`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageFormat {
    pub channel_order: ImageChannelOrder,
    pub channel_data_type: ImageChannelDataType,
}

impl ImageFormat {
    pub fn new(channel_order: ImageChannelOrder, channel_data_type: ImageChannelDataType)
            -> ImageFormat {
        ImageFormat { channel_order, channel_data_type }
    }

    pub fn new_rgba() -> ImageFormat {
        ImageFormat::new(ImageChannelOrder::Rgba, ImageChannelDataType::UnormInt8)
    }

    /// Size of one pixel in bytes.
    pub fn pixel_bytes(&self) -> usize {
        if self.channel_data_type.is_packed() {
            self.channel_data_type.channel_size()
        } else {
            self.channel_order.channel_count() * self.channel_data_type.channel_size()
        }
    }

    pub fn to_raw(&self) -> ffi::cl_image_format {
        ffi::cl_image_format {
            image_channel_order: self.channel_order as u32,
            image_channel_data_type: self.channel_data_type as u32,
        }
    }

    pub fn from_raw(raw: &ffi::cl_image_format) -> Result<ImageFormat> {
        let order = ImageChannelOrder::from_u32(raw.image_channel_order);
        let data_type = ImageChannelDataType::from_u32(raw.image_channel_data_type);
        match (order, data_type) {
            (Some(o), Some(d)) => Ok(ImageFormat::new(o, d)),
            _ => Err(Error::lib(ErrorKind::InvalidData,
                format!("Unknown image format: {:?}.", raw))),
        }
    }
}

/// An image descriptor (`cl_image_desc`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageDescriptor {
    pub image_type: MemObjectType,
    pub image_width: usize,
    pub image_height: usize,
    pub image_depth: usize,
    pub image_array_size: usize,
    pub image_row_pitch: usize,
    pub image_slice_pitch: usize,
    pub num_mip_levels: u32,
    pub num_samples: u32,
}

impl ImageDescriptor {
    pub fn new(image_type: MemObjectType, width: usize, height: usize, depth: usize)
            -> ImageDescriptor {
        ImageDescriptor {
            image_type,
            image_width: width,
            image_height: height,
            image_depth: depth,
            image_array_size: 0,
            image_row_pitch: 0,
            image_slice_pitch: 0,
            num_mip_levels: 0,
            num_samples: 0,
        }
    }

    pub fn new_2d(width: usize, height: usize) -> ImageDescriptor {
        ImageDescriptor::new(MemObjectType::Image2d, width, height, 1)
    }

    /// Image extent as `[width, height, depth]`, with unused dimensions
    /// set to one.
    pub fn region(&self) -> [usize; 3] {
        match self.image_type {
            MemObjectType::Image1d | MemObjectType::Image1dBuffer =>
                [self.image_width, 1, 1],
            MemObjectType::Image1dArray => [self.image_width, self.image_array_size.max(1), 1],
            MemObjectType::Image2d => [self.image_width, self.image_height.max(1), 1],
            MemObjectType::Image2dArray =>
                [self.image_width, self.image_height.max(1), self.image_array_size.max(1)],
            _ => [self.image_width, self.image_height.max(1), self.image_depth.max(1)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_platform_version() {
        let ver = OpenclVersion::from_info_str("OpenCL 1.2 CUDA 10.1.120").unwrap();
        assert_eq!(ver, OpenclVersion::new(1, 2));
        assert_eq!(ver.as_number(), 120);
    }

    #[test]
    fn parse_c_version() {
        let ver = OpenclVersion::from_info_str("OpenCL C 2.0 ").unwrap();
        assert_eq!(ver, OpenclVersion::V2_0);
        assert!(ver > OpenclVersion::V1_2);
    }

    #[test]
    fn parse_garbage() {
        let err = OpenclVersion::from_info_str("Vulkan 1.1").unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InvalidData));
    }

    #[test]
    fn pixel_sizes() {
        assert_eq!(ImageFormat::new_rgba().pixel_bytes(), 4);
        let fmt = ImageFormat::new(ImageChannelOrder::Rg, ImageChannelDataType::Float);
        assert_eq!(fmt.pixel_bytes(), 8);
        let fmt = ImageFormat::new(ImageChannelOrder::Rgb, ImageChannelDataType::UnormShort565);
        assert_eq!(fmt.pixel_bytes(), 2);
    }
}
