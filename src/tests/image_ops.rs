use crate::enums::{AddressingMode, FilterMode, ImageChannelDataType, ImageChannelOrder,
    MemObjectType};
use crate::ffi;
use crate::{CommandQueueProperties, ErrorKind, Image, ImageDescriptor, ImageFillColor,
    ImageFormat, MapFlags, MemFlags, MemObject, Queue, Sampler, SamplerProperty};

const WIDTH: usize = 32;
const HEIGHT: usize = 16;
const DIMS: [usize; 3] = [WIDTH, HEIGHT, 1];
const FULL: [usize; 3] = [WIDTH, HEIGHT, 1];
const ORIGIN: [usize; 3] = [0, 0, 0];

fn pixel_at(data: &[u8], x: usize, y: usize) -> &[u8] {
    let at = (y * WIDTH + x) * 4;
    &data[at..at + 4]
}

#[test]
fn read_write_random_region() {
    let _guard = super::setup();
    let ctx = super::gpu_a_context();
    let queue = Queue::new(&ctx, None, CommandQueueProperties::empty()).unwrap();

    let background = vec![10u8; WIDTH * HEIGHT * 4];
    let img = Image::new(&ctx, MemFlags::READ_WRITE, ImageFormat::new_rgba(),
        &ImageDescriptor::new_2d(WIDTH, HEIGHT), Some(&background[..])).unwrap();
    assert_eq!(img.width().unwrap(), WIDTH);
    assert_eq!(img.height().unwrap(), HEIGHT);
    assert_eq!(img.depth().unwrap(), 0);
    assert_eq!(img.element_size().unwrap(), 4);
    assert_eq!(img.row_pitch().unwrap(), WIDTH * 4);
    assert_eq!(img.format(), ImageFormat::new_rgba());

    for _ in 0..8 {
        let (origin, region) = super::gen_region_origin(&DIMS);
        img.write(&queue, ORIGIN, FULL, &background, None).unwrap();

        let patch = vec![200u8; region[0] * region[1] * 4];
        img.write(&queue, origin, region, &patch, None).unwrap();

        let mut out = vec![0u8; WIDTH * HEIGHT * 4];
        img.read(&queue, ORIGIN, FULL, &mut out, None).unwrap();
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                let inside = super::within_region([x, y, 0], origin, region);
                let expected = if inside { 200 } else { 10 };
                assert_eq!(pixel_at(&out, x, y), &[expected; 4][..],
                    "pixel ({}, {}), origin: {:?}, region: {:?}", x, y, origin, region);
            }
        }
    }

    let mut small = vec![0u8; 4];
    let err = img.read(&queue, ORIGIN, [2, 1, 1], &mut small, None).unwrap_err();
    assert!(err.is_kind(ErrorKind::BadArguments));

    let mut out = vec![0u8; 4];
    let err = img.read(&queue, [WIDTH, 0, 0], [1, 1, 1], &mut out, None).unwrap_err();
    assert_eq!(err.api_status(), Some(ffi::CL_INVALID_VALUE));
}

#[test]
fn fill_and_copy() {
    let _guard = super::setup();
    let ctx = super::gpu_a_context();
    let queue = Queue::new(&ctx, None, CommandQueueProperties::empty()).unwrap();
    let desc = ImageDescriptor::new_2d(WIDTH, HEIGHT);
    let src = Image::new::<u8>(&ctx, MemFlags::READ_WRITE, ImageFormat::new_rgba(), &desc, None)
        .unwrap();
    let dst = Image::new::<u8>(&ctx, MemFlags::READ_WRITE, ImageFormat::new_rgba(), &desc, None)
        .unwrap();

    src.enqueue_fill(&queue, ImageFillColor::Float([1.0, 0.0, 0.5, 1.0]), ORIGIN, FULL, None)
        .unwrap();
    let copy = src.enqueue_copy(&queue, &dst, [4, 2, 0], [0, 0, 0], [8, 8, 1], None).unwrap();

    let mut out = vec![0u8; WIDTH * HEIGHT * 4];
    dst.read(&queue, ORIGIN, FULL, &mut out, Some(&mut copy.wait_list())).unwrap();
    assert_eq!(pixel_at(&out, 0, 0), &[255, 0, 128, 255]);
    assert_eq!(pixel_at(&out, 7, 7), &[255, 0, 128, 255]);
    assert_eq!(pixel_at(&out, 8, 0), &[0, 0, 0, 0]);
    assert_eq!(pixel_at(&out, 0, 8), &[0, 0, 0, 0]);

    let other = Image::new::<u8>(&ctx, MemFlags::READ_WRITE,
        ImageFormat::new(ImageChannelOrder::Rgba, ImageChannelDataType::UnsignedInt8), &desc,
        None).unwrap();
    let err = src.enqueue_copy(&queue, &other, ORIGIN, ORIGIN, [1, 1, 1], None).unwrap_err();
    assert_eq!(err.api_status(), Some(ffi::CL_IMAGE_FORMAT_MISMATCH));

    other.enqueue_fill(&queue, ImageFillColor::Uint([1, 2, 3, 4]), ORIGIN, [1, 1, 1], None)
        .unwrap();
    let mut px = vec![0u8; 4];
    other.read(&queue, ORIGIN, [1, 1, 1], &mut px, None).unwrap();
    assert_eq!(px, vec![1, 2, 3, 4]);
}

#[test]
fn map_region() {
    let _guard = super::setup();
    let ctx = super::gpu_a_context();
    let queue = Queue::new(&ctx, None, CommandQueueProperties::empty()).unwrap();
    let pixels: Vec<u8> = (0..WIDTH * HEIGHT).flat_map(|i| vec![(i % 251) as u8; 4]).collect();
    let img = Image::new(&ctx, MemFlags::READ_WRITE, ImageFormat::new_rgba(),
        &ImageDescriptor::new_2d(WIDTH, HEIGHT), Some(&pixels[..])).unwrap();

    let (mut region, _) = img.map(&queue, MapFlags::READ | MapFlags::WRITE, [1, 2, 0],
        [3, 2, 1], None).unwrap();
    assert_eq!(region.row_pitch(), WIDTH * 4);
    assert_eq!(region.len(), WIDTH * 4 + 3 * 4);
    {
        let view = region.as_slice_mut::<u8>().unwrap();
        assert_eq!(&view[..4], pixel_at(&pixels, 1, 2));
        for b in view[..4].iter_mut() {
            *b = 99;
        }
    }
    img.enqueue_unmap(&queue, region, None).unwrap();

    let mut px = vec![0u8; 4];
    img.read(&queue, [1, 2, 0], [1, 1, 1], &mut px, None).unwrap();
    assert_eq!(px, vec![99; 4]);
}

#[test]
fn creation_rules() {
    let _guard = super::setup();
    let ctx = super::gpu_a_context();
    let desc = ImageDescriptor::new_2d(WIDTH, HEIGHT);

    let formats = ctx.image_formats(MemFlags::READ_WRITE, MemObjectType::Image2d).unwrap();
    assert!(formats.contains(&ImageFormat::new_rgba()));

    let unsupported = ImageFormat::new(ImageChannelOrder::Rgba, ImageChannelDataType::UnormInt16);
    assert!(!formats.contains(&unsupported));
    let err = Image::new::<u8>(&ctx, MemFlags::READ_WRITE, unsupported, &desc, None)
        .unwrap_err();
    assert_eq!(err.api_status(), Some(ffi::CL_IMAGE_FORMAT_NOT_SUPPORTED));

    let host = vec![0u8; WIDTH * HEIGHT * 4];
    let err = Image::new(&ctx, MemFlags::USE_HOST_PTR, ImageFormat::new_rgba(), &desc,
        Some(&host[..])).unwrap_err();
    assert!(err.is_kind(ErrorKind::BadArguments));
    let err = Image::new(&ctx, MemFlags::READ_WRITE, ImageFormat::new_rgba(), &desc,
        Some(&host[..16])).unwrap_err();
    assert!(err.is_kind(ErrorKind::BadArguments));

    let err = ctx.image_formats(MemFlags::READ_WRITE, MemObjectType::Buffer).unwrap_err();
    assert_eq!(err.api_status(), Some(ffi::CL_INVALID_VALUE));
}

#[test]
fn image_fill_needs_opencl_1_2() {
    let _guard = super::setup();
    let ctx = super::platform_b_context();
    let queue = Queue::new(&ctx, None, CommandQueueProperties::empty()).unwrap();
    let img = Image::new::<u8>(&ctx, MemFlags::READ_WRITE, ImageFormat::new_rgba(),
        &ImageDescriptor::new_2d(4, 4), None).unwrap();

    let err = img.enqueue_fill(&queue, ImageFillColor::Float([0.0; 4]), ORIGIN, [4, 4, 1], None)
        .unwrap_err();
    assert!(err.is_kind(ErrorKind::UnsupportedVersion));
}

#[test]
fn samplers() {
    let _guard = super::setup();
    let ctx = super::gpu_a_context();

    let smplr = Sampler::new(&ctx, false, AddressingMode::ClampToEdge, FilterMode::Linear)
        .unwrap();
    assert!(!smplr.normalized_coords().unwrap());
    assert_eq!(smplr.addressing_mode().unwrap(), AddressingMode::ClampToEdge);
    assert_eq!(smplr.filter_mode().unwrap(), FilterMode::Linear);

    let smplr = Sampler::new_full(&ctx, &[
        SamplerProperty::AddressingMode(AddressingMode::Repeat),
        SamplerProperty::MipFilterMode(FilterMode::Linear),
        SamplerProperty::LodMax(4.0),
    ]).unwrap();
    assert!(smplr.normalized_coords().unwrap());
    assert_eq!(smplr.addressing_mode().unwrap(), AddressingMode::Repeat);
    assert_eq!(smplr.filter_mode().unwrap(), FilterMode::Nearest);

    // Pre-2.0 platforms only take the basic properties.
    let legacy = super::platform_b_context();
    let smplr = Sampler::new_full(&legacy, &[SamplerProperty::FilterMode(FilterMode::Linear)])
        .unwrap();
    assert_eq!(smplr.filter_mode().unwrap(), FilterMode::Linear);
    let err = Sampler::new_full(&legacy, &[SamplerProperty::LodMin(0.5)]).unwrap_err();
    assert!(err.is_kind(ErrorKind::UnsupportedVersion));
}
