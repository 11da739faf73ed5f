use crate::ffi;
use crate::{enqueue_migrate_objects, Buffer, CommandQueueProperties, Context, ErrorKind, MapFlags,
    MemFlags, MemMigrationFlags, MemObject, Queue};

const LEN: usize = 1024;

#[test]
fn copy_between_buffers() {
    let _guard = super::setup();
    let ctx = Context::new_from_device_index(0).unwrap();
    let queue = Queue::new(&ctx, None, CommandQueueProperties::empty()).unwrap();

    let src_vec: Vec<f32> = (0..LEN).map(|i| i as f32).collect();
    let src = Buffer::from_slice(&ctx, MemFlags::READ_WRITE, &src_vec).unwrap();
    let dst = Buffer::new::<f32>(&ctx, MemFlags::READ_WRITE, LEN * 4, None).unwrap();
    assert_eq!(src.size().unwrap(), LEN * 4);
    assert!(src.flags().unwrap().contains(MemFlags::COPY_HOST_PTR));

    let copy_range = (153, 900);
    let copy = src.enqueue_copy(&queue, &dst, copy_range.0 * 4, copy_range.0 * 4,
        (copy_range.1 - copy_range.0) * 4, None).unwrap();

    let mut dst_vec = vec![-1.0f32; LEN];
    dst.read(&queue, 0, &mut dst_vec, Some(&mut copy.wait_list())).unwrap();
    for i in 0..LEN {
        if i >= copy_range.0 && i < copy_range.1 {
            assert_eq!(dst_vec[i], i as f32);
        } else {
            assert!(dst_vec[i] == 0.0, "dst_vec: {}, idx: {}", dst_vec[i], i);
        }
    }

    let err = src.enqueue_copy(&queue, &src, 0, 8, 16, None).unwrap_err();
    assert_eq!(err.api_status(), Some(ffi::CL_MEM_COPY_OVERLAP));
}

#[test]
fn fill_with_pattern() {
    let _guard = super::setup();
    let ctx = Context::new_from_device_index(0).unwrap();
    let queue = Queue::new(&ctx, None, CommandQueueProperties::empty()).unwrap();
    let buf = Buffer::new::<u32>(&ctx, MemFlags::READ_WRITE, LEN * 4, None).unwrap();

    buf.enqueue_fill(&queue, &[0xABu32, 0xCD], 8, 64, None).unwrap();
    let mut out = vec![0u32; LEN];
    buf.read(&queue, 0, &mut out, None).unwrap();
    assert_eq!(&out[..2], &[0, 0]);
    for pair in out[2..18].chunks(2) {
        assert_eq!(pair, &[0xAB, 0xCD]);
    }
    assert!(out[18..].iter().all(|&v| v == 0));

    // Three bytes is not a power of two.
    let err = buf.enqueue_fill(&queue, &[1u8, 2, 3], 0, 12, None).unwrap_err();
    assert_eq!(err.api_status(), Some(ffi::CL_INVALID_VALUE));
}

#[test]
fn map_and_unmap() {
    let _guard = super::setup();
    let ctx = Context::new_from_device_index(0).unwrap();
    let queue = Queue::new(&ctx, None, CommandQueueProperties::empty()).unwrap();
    let buf = Buffer::from_slice(&ctx, MemFlags::READ_WRITE, &vec![5u32; LEN]).unwrap();

    let (mut region, _) = buf.map(&queue, MapFlags::READ | MapFlags::WRITE, 16, 64, None)
        .unwrap();
    assert_eq!(region.len(), 64);
    {
        let view = region.as_slice_mut::<u32>().unwrap();
        assert_eq!(view.len(), 16);
        assert!(view.iter().all(|&v| v == 5));
        for v in view.iter_mut() {
            *v = 11;
        }
    }
    buf.enqueue_unmap(&queue, region, None).unwrap();

    let mut out = vec![0u32; LEN];
    buf.read(&queue, 0, &mut out, None).unwrap();
    assert_eq!(&out[..4], &[5, 5, 5, 5]);
    assert!(out[4..20].iter().all(|&v| v == 11));
    assert_eq!(out[20], 5);

    // A region must go back to the object it came from.
    let other = Buffer::new::<u32>(&ctx, MemFlags::READ_WRITE, 64, None).unwrap();
    let (region, _) = buf.map(&queue, MapFlags::READ, 0, 64, None).unwrap();
    let err = other.enqueue_unmap(&queue, region, None).unwrap_err();
    assert!(err.is_kind(ErrorKind::BadArguments));
}

#[test]
fn creation_rules() {
    let _guard = super::setup();
    let ctx = Context::new_from_device_index(0).unwrap();
    let host = vec![0u8; 64];

    let err = Buffer::new(&ctx, MemFlags::USE_HOST_PTR, 64, Some(&host[..])).unwrap_err();
    assert!(err.is_kind(ErrorKind::BadArguments));

    let err = Buffer::new(&ctx, MemFlags::READ_WRITE, 128, Some(&host[..])).unwrap_err();
    assert!(err.is_kind(ErrorKind::BadArguments));

    let err = Buffer::new::<u8>(&ctx, MemFlags::COPY_HOST_PTR, 64, None).unwrap_err();
    assert!(err.is_kind(ErrorKind::BadArguments));

    let err = Buffer::new::<u8>(&ctx, MemFlags::READ_WRITE, 0, None).unwrap_err();
    assert_eq!(err.api_status(), Some(ffi::CL_INVALID_BUFFER_SIZE));
}

#[test]
fn fill_and_migrate_need_opencl_1_2() {
    let _guard = super::setup();
    let ctx = super::platform_b_context();
    let queue = Queue::new(&ctx, None, CommandQueueProperties::empty()).unwrap();
    let buf = Buffer::new::<u8>(&ctx, MemFlags::READ_WRITE, 64, None).unwrap();

    let err = buf.enqueue_fill(&queue, &[1u8], 0, 64, None).unwrap_err();
    assert!(err.is_kind(ErrorKind::UnsupportedVersion));
    let err = buf.enqueue_migrate(&queue, MemMigrationFlags::empty(), None).unwrap_err();
    assert!(err.is_kind(ErrorKind::UnsupportedVersion));
}

#[test]
fn migrate_objects() {
    let _guard = super::setup();
    let ctx = super::gpu_a_context();
    let queue = Queue::new(&ctx, None, CommandQueueProperties::empty()).unwrap();
    let a = Buffer::new::<u8>(&ctx, MemFlags::READ_WRITE, 64, None).unwrap();
    let b = Buffer::new::<u8>(&ctx, MemFlags::READ_WRITE, 64, None).unwrap();

    enqueue_migrate_objects(&queue, &[&a, &b], MemMigrationFlags::CONTENT_UNDEFINED, None)
        .unwrap();
    let err = enqueue_migrate_objects(&queue, &[], MemMigrationFlags::empty(), None)
        .unwrap_err();
    assert!(err.is_kind(ErrorKind::BadArguments));
}
