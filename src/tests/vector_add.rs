use crate::driver::StubDriver;
use crate::enums::KernelWorkGroupInfo;
use crate::ffi;
use crate::{memcheck, suggest_local_worksize, suggest_worksizes, Buffer, CommandQueueProperties,
    Context, DevContainer, ErrorKind, Filters, KernelArg, MemFlags, Program, Queue};

const VEC_ADD_SRC: &str = r#"
    __kernel void vec_add(__global const uint* a, __global const uint* b, __global uint* c,
            uint d) {
        uint gid = get_global_id(0);
        c[gid] = a[gid] + b[gid] + d;
    }
"#;

const LEN: usize = 16;

fn register_vec_add() {
    StubDriver::global().register_kernel("vec_add", |inv| {
        let (a, b, d) = match (inv.read_mem::<u32>(0), inv.read_mem::<u32>(1),
                inv.private::<u32>(3)) {
            (Some(a), Some(b), Some(d)) => (a, b, d),
            _ => return,
        };
        let n = inv.global_len().min(a.len()).min(b.len());
        let c: Vec<u32> = (0..n).map(|i| a[i] + b[i] + d).collect();
        inv.write_mem(2, &c);
    });
}

#[test]
fn vector_add() {
    let _guard = super::setup();
    register_vec_add();
    {
        let ctx = Context::new_from_device_index(0).unwrap();
        let dev = ctx.device(0).unwrap();
        let queue = Queue::new(&ctx, Some(&dev), CommandQueueProperties::empty()).unwrap();

        let a: Vec<u32> = (0..LEN as u32).collect();
        let b: Vec<u32> = (1..=LEN as u32).rev().collect();
        let d = 4u32;

        let a_buf = Buffer::from_slice(&ctx, MemFlags::READ_ONLY, &a).unwrap();
        let b_buf = Buffer::from_slice(&ctx, MemFlags::READ_ONLY, &b).unwrap();
        let c_buf = Buffer::new::<u32>(&ctx, MemFlags::WRITE_ONLY, LEN * 4, None).unwrap();

        let prg = Program::new_from_source(&ctx, VEC_ADD_SRC).unwrap();
        prg.build("").unwrap();
        assert_eq!(prg.kernel_names().unwrap(), vec!["vec_add"]);

        let kernel = prg.get_kernel("vec_add").unwrap();
        assert!(kernel.ptr_eq(&prg.get_kernel("vec_add").unwrap()));
        assert_eq!(kernel.num_args().unwrap(), 4);
        assert_eq!(kernel.function_name().unwrap(), "vec_add");
        assert_eq!(kernel.arg_name(3).unwrap(), "d");

        let lws = LEN.min(dev.max_work_group_size().unwrap());
        let ev = kernel.set_args_and_enqueue_ndrange(&queue, 1, None, &[LEN], Some(&[lws][..]),
            None, vec![KernelArg::from(&a_buf), KernelArg::from(&b_buf), KernelArg::from(&c_buf),
                KernelArg::private(&d)]).unwrap();
        ev.set_name("vec_add");

        let mut c = vec![0u32; LEN];
        c_buf.read(&queue, 0, &mut c, Some(&mut ev.wait_list())).unwrap();
        for i in 0..LEN {
            assert_eq!(c[i], a[i] + b[i] + d, "c[{}]", i);
        }
    }
    assert!(memcheck());
}

#[test]
fn kernel_launch_checks() {
    let _guard = super::setup();
    register_vec_add();
    let ctx = Context::new_from_device_index(0).unwrap();
    let queue = Queue::new(&ctx, None, CommandQueueProperties::empty()).unwrap();
    let buf = Buffer::new::<u32>(&ctx, MemFlags::READ_WRITE, LEN * 4, None).unwrap();
    let prg = Program::new_from_source(&ctx, VEC_ADD_SRC).unwrap();
    prg.build("").unwrap();
    let kernel = prg.get_kernel("vec_add").unwrap();

    // Unset arguments.
    let err = kernel.enqueue_ndrange(&queue, 1, None, &[LEN], None, None).unwrap_err();
    assert_eq!(err.api_status(), Some(ffi::CL_INVALID_KERNEL_ARGS));

    let err = kernel.set_arg(3, &KernelArg::private(&1u64)).unwrap_err();
    assert_eq!(err.api_status(), Some(ffi::CL_INVALID_ARG_SIZE));

    kernel.set_args_v(&[KernelArg::from(&buf), KernelArg::from(&buf), KernelArg::from(&buf),
        KernelArg::private(&0u32)]).unwrap();
    let err = kernel.enqueue_ndrange(&queue, 1, None, &[LEN], Some(&[3][..]), None)
        .unwrap_err();
    assert_eq!(err.api_status(), Some(ffi::CL_INVALID_WORK_GROUP_SIZE));

    let err = kernel.enqueue_ndrange(&queue, 4, None, &[LEN; 4], None, None).unwrap_err();
    assert!(err.is_kind(ErrorKind::BadArguments));

    prg.enqueue_kernel("vec_add", &queue, 1, None, &[LEN], None, None,
        vec![KernelArg::Skip, KernelArg::Skip, KernelArg::Skip, KernelArg::private(&1u32)])
        .unwrap();

    let err = prg.get_kernel("no_such_kernel").unwrap_err();
    assert_eq!(err.api_status(), Some(ffi::CL_INVALID_KERNEL_NAME));
}

#[test]
fn worksizes_for_a_kernel() {
    let _guard = super::setup();
    let ctx = super::gpu_a_context();
    let dev = ctx.device(0).unwrap();
    let prg = Program::new_from_source(&ctx, VEC_ADD_SRC).unwrap();
    prg.build("").unwrap();
    let kernel = prg.get_kernel("vec_add").unwrap();

    assert_eq!(kernel.work_group_size(&dev).unwrap(), 256);
    assert_eq!(kernel.preferred_work_group_size_multiple(&dev).unwrap(), 32);
    let wg = kernel.workgroup_info(None, KernelWorkGroupInfo::WorkGroupSize).unwrap();
    assert_eq!(wg.as_scalar::<usize>().unwrap(), 256);

    let (gws, lws) = suggest_worksizes(Some(&kernel), &dev, &[4096, 4096], None).unwrap();
    assert_eq!(lws, vec![32, 8]);
    assert_eq!(gws, vec![4096, 4096]);
    assert!(lws.iter().product::<usize>() <= 256);
    assert!(lws.iter().all(|l| l % 8 == 0));

    // The hint caps the local size.
    let (gws, lws) = suggest_worksizes(Some(&kernel), &dev, &[1000], Some(&[16][..])).unwrap();
    assert_eq!(lws, vec![16]);
    assert_eq!(gws, vec![1008]);
}

#[test]
fn worksizes_for_a_device() {
    let _guard = super::setup();
    let mut filters = Filters::new();
    filters.substring("gpu b");
    let dev = filters.select().unwrap().remove(0);

    let (gws, lws) = suggest_worksizes(None, &dev, &[100, 100, 100], None).unwrap();
    assert!(lws.iter().product::<usize>() <= 512);
    assert!(lws[2] <= 64);
    for i in 0..3 {
        assert_eq!(gws[i] % lws[i], 0);
        assert!(gws[i] >= 100);
    }

    let err = suggest_worksizes(None, &dev, &[16, 0], None).unwrap_err();
    assert!(err.is_kind(ErrorKind::BadArguments));

    // The device has three work-item dimensions.
    assert_eq!(dev.max_work_item_dimensions().unwrap(), 3);
    let err = suggest_worksizes(None, &dev, &[8, 8, 8, 8], None).unwrap_err();
    assert!(err.is_kind(ErrorKind::UnsupportedVersion));
    let err = suggest_local_worksize(None, &dev, &[8, 8, 8, 8], None).unwrap_err();
    assert!(err.is_kind(ErrorKind::UnsupportedVersion));
}

#[test]
fn local_worksize_for_fixed_global() {
    let _guard = super::setup();
    let ctx = super::gpu_a_context();
    let dev = ctx.device(0).unwrap();
    let prg = Program::new_from_source(&ctx, VEC_ADD_SRC).unwrap();
    prg.build("").unwrap();
    let kernel = prg.get_kernel("vec_add").unwrap();

    for real in &[[4096usize, 4096], [1000, 30], [97, 3]] {
        let lws = suggest_local_worksize(Some(&kernel), &dev, &real[..], None).unwrap();
        assert!(lws.iter().product::<usize>() <= 256, "lws: {:?}", lws);
        for i in 0..2 {
            assert_eq!(real[i] % lws[i], 0, "real: {:?}, lws: {:?}", real, lws);
        }
    }
}

#[test]
fn built_in_kernels() {
    let _guard = super::setup();
    let ctx = super::gpu_a_context();
    let dev = ctx.device(0).unwrap();
    let queue = Queue::new(&ctx, None, CommandQueueProperties::empty()).unwrap();

    let prg = Program::new_from_built_in_kernels(&ctx, &[&dev], "stub_copy;stub_fill").unwrap();
    assert_eq!(prg.kernel_names().unwrap(), vec!["stub_copy", "stub_fill"]);

    let src = Buffer::new::<u8>(&ctx, MemFlags::READ_WRITE, 32, None).unwrap();
    let dst = Buffer::new::<u8>(&ctx, MemFlags::READ_WRITE, 32, None).unwrap();
    prg.enqueue_kernel("stub_fill", &queue, 1, None, &[32], None, None,
        vec![KernelArg::from(&src), KernelArg::private(&9u8)]).unwrap();
    prg.enqueue_kernel("stub_copy", &queue, 1, None, &[32], None, None,
        vec![KernelArg::from(&src), KernelArg::from(&dst)]).unwrap();

    let mut out = vec![0u8; 32];
    dst.read(&queue, 0, &mut out, None).unwrap();
    assert_eq!(out, vec![9u8; 32]);

    let err = Program::new_from_built_in_kernels(&ctx, &[&dev], "no_such_kernel").unwrap_err();
    assert_eq!(err.api_status(), Some(ffi::CL_INVALID_VALUE));
}
