//! OpenCL images.

use std::mem;
use std::ptr;
use crate::driver;
use crate::enums::{ClassTag, CommandType, ImageInfo, MemInfo};
use crate::error::{Error, ErrorKind, Result, ApiResultExt};
use crate::ffi::{c_void, RawObject};
use crate::flags::{MapFlags, MemFlags};
use crate::prm::{self, OclPrm};
use crate::standard::event::{self, Event, EventWaitList};
use crate::standard::memobj::{self, MappedRegion, MemObject};
use crate::standard::{Context, Queue};
use crate::types::{ImageDescriptor, ImageFormat, OpenclVersion};
use crate::wrapper::{self, Wrapper};

/// The color an image region is filled with. The variant must match the
/// image's channel data type: `Float` for normalized and float formats,
/// `Int` for signed and `Uint` for unsigned integer formats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImageFillColor {
    Float([f32; 4]),
    Int([i32; 4]),
    Uint([u32; 4]),
}

impl ImageFillColor {
    fn to_bytes(&self) -> [u8; 16] {
        let mut out = [0u8; 16];
        match *self {
            ImageFillColor::Float(ref c) => out.copy_from_slice(prm::as_bytes(c)),
            ImageFillColor::Int(ref c) => out.copy_from_slice(prm::as_bytes(c)),
            ImageFillColor::Uint(ref c) => out.copy_from_slice(prm::as_bytes(c)),
        }
        out
    }
}

pub struct ImageData {
    context: Context,
    format: ImageFormat,
}

/// An image wrapper.
#[derive(Clone)]
pub struct Image(pub(crate) Wrapper<ImageData>);

impl_wrapper!(Image, ImageData);

impl Image {
    /// Creates an image.
    ///
    /// When `host_data` is given it is copied into the image using the row
    /// and slice pitches of `desc` (zero meaning tightly packed).
    /// `USE_HOST_PTR` is rejected.
    pub fn new<T: OclPrm>(context: &Context, flags: MemFlags, format: ImageFormat,
            desc: &ImageDescriptor, host_data: Option<&[T]>) -> Result<Image> {
        if flags.contains(MemFlags::USE_HOST_PTR) {
            return Err(Error::lib(ErrorKind::BadArguments,
                "USE_HOST_PTR is not supported with borrowed host data."));
        }
        let mut flags = flags;
        let host_ptr = match host_data {
            Some(data) => {
                let needed = host_len(&format, desc);
                let bytes = data.len() * mem::size_of::<T>();
                if bytes < needed {
                    return Err(Error::lib(ErrorKind::BadArguments, format!("Host data holds {} \
                        bytes but the image needs {} bytes.", bytes, needed)));
                }
                flags |= MemFlags::COPY_HOST_PTR;
                data.as_ptr() as *mut c_void
            },
            None => ptr::null_mut(),
        };

        let native = unsafe {
            driver::get().create_image(context.as_raw(), flags, &format, desc, host_ptr)
                .or_api("clCreateImage")?
        };
        trace!("Created a {:?} image of {:?}.", desc.image_type, desc.region());
        let data = ImageData { context: context.clone(), format };
        Wrapper::from_owned(ClassTag::Image, native, data).map(Image)
    }

    /// Wraps an existing native image, taking a new native reference.
    pub fn from_raw(native: RawObject) -> Result<Image> {
        if let Some(existing) = Wrapper::lookup(native) {
            return Ok(Image(existing));
        }
        let context = Context::from_raw(wrapper::query_param(native, MemInfo::Context)?
            .as_object()?)?;
        let raw_format: Vec<u32> = wrapper::query_param(native, ImageInfo::Format)?.as_vec();
        let format = match raw_format[..] {
            [order, data_type] => ImageFormat::from_raw(&crate::ffi::cl_image_format {
                image_channel_order: order,
                image_channel_data_type: data_type,
            })?,
            _ => return Err(Error::lib(ErrorKind::InvalidData, "Malformed image format.")),
        };
        Wrapper::new_wrap(ClassTag::Image, native, ImageData { context, format }).map(Image)
    }

    pub fn context(&self) -> &Context {
        &self.data().context
    }

    pub fn format(&self) -> ImageFormat {
        self.data().format
    }

    pub fn width(&self) -> Result<usize> {
        self.info(ImageInfo::Width)?.as_scalar()
    }

    /// Height in pixels, zero for 1D images.
    pub fn height(&self) -> Result<usize> {
        self.info(ImageInfo::Height)?.as_scalar()
    }

    /// Depth in pixels, zero for anything but 3D images.
    pub fn depth(&self) -> Result<usize> {
        self.info(ImageInfo::Depth)?.as_scalar()
    }

    /// Size of one pixel in bytes.
    pub fn element_size(&self) -> Result<usize> {
        self.info(ImageInfo::ElementSize)?.as_scalar()
    }

    pub fn row_pitch(&self) -> Result<usize> {
        self.info(ImageInfo::RowPitch)?.as_scalar()
    }

    pub fn slice_pitch(&self) -> Result<usize> {
        self.info(ImageInfo::SlicePitch)?.as_scalar()
    }

    pub fn size(&self) -> Result<usize> {
        memobj::mem_size(&self.0)
    }

    pub fn flags(&self) -> Result<MemFlags> {
        memobj::mem_flags(&self.0)
    }

    /// Enqueues a read of `region` at `origin` into `data`, laid out with
    /// the given host pitches (zero meaning tightly packed).
    ///
    /// ## Safety
    ///
    /// With `blocking == false`, `data` must not be touched until the
    /// returned event completes.
    pub unsafe fn enqueue_read<T: OclPrm>(&self, queue: &Queue, blocking: bool,
            origin: [usize; 3], region: [usize; 3], row_pitch: usize, slice_pitch: usize,
            data: &mut [T], wait: Option<&mut EventWaitList>) -> Result<Event> {
        self.check_host_len(region, row_pitch, slice_pitch, data.len() * mem::size_of::<T>())?;
        let bytes = prm::as_bytes_mut(data);
        let native = event::with_wait_list(wait, |w| {
            driver::get().enqueue_read_image(queue.as_raw(), self.as_raw(), blocking, origin,
                region, row_pitch, slice_pitch, bytes, w).or_api("clEnqueueReadImage")
        })?;
        queue.produce_event(native, Some(CommandType::ReadImage))
    }

    /// Reads a region into tightly packed `data`, blocking until done.
    pub fn read<T: OclPrm>(&self, queue: &Queue, origin: [usize; 3], region: [usize; 3],
            data: &mut [T], wait: Option<&mut EventWaitList>) -> Result<Event> {
        unsafe { self.enqueue_read(queue, true, origin, region, 0, 0, data, wait) }
    }

    /// Enqueues a write of `data` to `region` at `origin`.
    ///
    /// ## Safety
    ///
    /// With `blocking == false`, `data` must stay valid and unchanged until
    /// the returned event completes.
    pub unsafe fn enqueue_write<T: OclPrm>(&self, queue: &Queue, blocking: bool,
            origin: [usize; 3], region: [usize; 3], row_pitch: usize, slice_pitch: usize,
            data: &[T], wait: Option<&mut EventWaitList>) -> Result<Event> {
        self.check_host_len(region, row_pitch, slice_pitch, data.len() * mem::size_of::<T>())?;
        let bytes = prm::as_bytes(data);
        let native = event::with_wait_list(wait, |w| {
            driver::get().enqueue_write_image(queue.as_raw(), self.as_raw(), blocking, origin,
                region, row_pitch, slice_pitch, bytes, w).or_api("clEnqueueWriteImage")
        })?;
        queue.produce_event(native, Some(CommandType::WriteImage))
    }

    /// Writes tightly packed `data` to a region, blocking until done.
    pub fn write<T: OclPrm>(&self, queue: &Queue, origin: [usize; 3], region: [usize; 3],
            data: &[T], wait: Option<&mut EventWaitList>) -> Result<Event> {
        unsafe { self.enqueue_write(queue, true, origin, region, 0, 0, data, wait) }
    }

    /// Copies a region of this image into `dst`. Both images must share a
    /// format.
    pub fn enqueue_copy(&self, queue: &Queue, dst: &Image, src_origin: [usize; 3],
            dst_origin: [usize; 3], region: [usize; 3], wait: Option<&mut EventWaitList>)
            -> Result<Event> {
        let native = event::with_wait_list(wait, |w| {
            driver::get().enqueue_copy_image(queue.as_raw(), self.as_raw(), dst.as_raw(),
                src_origin, dst_origin, region, w).or_api("clEnqueueCopyImage")
        })?;
        queue.produce_event(native, Some(CommandType::CopyImage))
    }

    /// Fills a region with a single color. Requires OpenCL 1.2.
    pub fn enqueue_fill(&self, queue: &Queue, color: ImageFillColor, origin: [usize; 3],
            region: [usize; 3], wait: Option<&mut EventWaitList>) -> Result<Event> {
        self.context().require_version(OpenclVersion::V1_2, "Image fill")?;
        let color = color.to_bytes();
        let native = event::with_wait_list(wait, |w| {
            driver::get().enqueue_fill_image(queue.as_raw(), self.as_raw(), &color, origin,
                region, w).or_api("clEnqueueFillImage")
        })?;
        queue.produce_event(native, Some(CommandType::FillImage))
    }

    /// Enqueues the mapping of a region into host memory.
    ///
    /// ## Safety
    ///
    /// With `blocking == false` the region must not be accessed until the
    /// returned event completes.
    pub unsafe fn enqueue_map(&self, queue: &Queue, blocking: bool, flags: MapFlags,
            origin: [usize; 3], region: [usize; 3], wait: Option<&mut EventWaitList>)
            -> Result<(MappedRegion, Event)> {
        let (mapped, native) = event::with_wait_list(wait, |w| {
            driver::get().enqueue_map_image(queue.as_raw(), self.as_raw(), blocking, flags,
                origin, region, w).or_api("clEnqueueMapImage")
        })?;
        let event = queue.produce_event(native, Some(CommandType::MapImage))?;
        let len = span(region, self.format().pixel_bytes(), mapped.row_pitch, mapped.slice_pitch);
        let region = MappedRegion::new(mapped.ptr, len, mapped.row_pitch, mapped.slice_pitch,
            Box::new(self.clone()));
        Ok((region, event))
    }

    /// Maps a region, blocking until it is accessible.
    pub fn map(&self, queue: &Queue, flags: MapFlags, origin: [usize; 3], region: [usize; 3],
            wait: Option<&mut EventWaitList>) -> Result<(MappedRegion, Event)> {
        unsafe { self.enqueue_map(queue, true, flags, origin, region, wait) }
    }

    fn check_host_len(&self, region: [usize; 3], row_pitch: usize, slice_pitch: usize,
            have: usize) -> Result<()> {
        let pixel = self.format().pixel_bytes();
        let row = if row_pitch == 0 { region[0] * pixel } else { row_pitch };
        let slice = if slice_pitch == 0 { row * region[1] } else { slice_pitch };
        let needed = span(region, pixel, row, slice);
        if have < needed {
            return Err(Error::lib(ErrorKind::BadArguments, format!("Host data holds {} bytes \
                but the image region needs {} bytes.", have, needed)));
        }
        Ok(())
    }
}

/// Bytes spanned by a region laid out with the given pitches.
fn span(region: [usize; 3], pixel: usize, row_pitch: usize, slice_pitch: usize) -> usize {
    if region.iter().any(|&r| r == 0) {
        return 0;
    }
    let row_pitch = if row_pitch == 0 { region[0] * pixel } else { row_pitch };
    let slice_pitch = if slice_pitch == 0 { row_pitch * region[1] } else { slice_pitch };
    (region[2] - 1) * slice_pitch + (region[1] - 1) * row_pitch + region[0] * pixel
}

fn host_len(format: &ImageFormat, desc: &ImageDescriptor) -> usize {
    span(desc.region(), format.pixel_bytes(), desc.image_row_pitch, desc.image_slice_pitch)
}

impl MemObject for Image {
    fn as_mem_raw(&self) -> RawObject {
        self.as_raw()
    }

    fn mem_context(&self) -> &Context {
        self.context()
    }

    fn mem_size(&self) -> Result<usize> {
        self.size()
    }

    fn mem_flags(&self) -> Result<MemFlags> {
        self.flags()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_span() {
        assert_eq!(span([4, 3, 1], 4, 0, 0), 48);
        assert_eq!(span([4, 3, 1], 4, 32, 0), 2 * 32 + 16);
        assert_eq!(span([2, 2, 2], 1, 4, 16), 16 + 4 + 2);
        assert_eq!(span([0, 3, 1], 4, 0, 0), 0);
    }

    #[test]
    fn fill_color_bytes() {
        let bytes = ImageFillColor::Uint([1, 2, 3, 4]).to_bytes();
        assert_eq!(&bytes[..4], prm::as_bytes(&[1u32]));
        assert_eq!(&bytes[12..], prm::as_bytes(&[4u32]));
    }
}
