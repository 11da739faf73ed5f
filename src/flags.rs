//! Bitflags for various parameter types.

use crate::ffi;

bitflags! {
    /// `cl_device_type` bitfield.
    pub struct DeviceType: u64 {
        const DEFAULT = ffi::CL_DEVICE_TYPE_DEFAULT;
        const CPU = ffi::CL_DEVICE_TYPE_CPU;
        const GPU = ffi::CL_DEVICE_TYPE_GPU;
        const ACCELERATOR = ffi::CL_DEVICE_TYPE_ACCELERATOR;
        const CUSTOM = ffi::CL_DEVICE_TYPE_CUSTOM;
        const ALL = ffi::CL_DEVICE_TYPE_ALL;
    }
}

impl DeviceType {
    /// Parses a `|`-separated list of type names (`CPU`, `GPU`,
    /// `ACCELERATOR`, `CUSTOM`, `DEFAULT`, `ALL`), ignoring case.
    pub fn from_names(names: &str) -> Option<DeviceType> {
        let mut dt = DeviceType::empty();
        for name in names.split('|').map(str::trim).filter(|n| !n.is_empty()) {
            dt |= match name.to_uppercase().as_str() {
                "DEFAULT" => DeviceType::DEFAULT,
                "CPU" => DeviceType::CPU,
                "GPU" => DeviceType::GPU,
                "ACCELERATOR" | "ACCEL" => DeviceType::ACCELERATOR,
                "CUSTOM" => DeviceType::CUSTOM,
                "ALL" => DeviceType::ALL,
                _ => return None,
            };
        }
        if dt.is_empty() { None } else { Some(dt) }
    }
}

bitflags! {
    /// `cl_command_queue_properties` bitfield.
    pub struct CommandQueueProperties: u64 {
        const OUT_OF_ORDER_EXEC_MODE_ENABLE = ffi::CL_QUEUE_OUT_OF_ORDER_EXEC_MODE_ENABLE;
        const PROFILING_ENABLE = ffi::CL_QUEUE_PROFILING_ENABLE;
    }
}

bitflags! {
    /// `cl_mem_flags` bitfield.
    pub struct MemFlags: u64 {
        const READ_WRITE = ffi::CL_MEM_READ_WRITE;
        const WRITE_ONLY = ffi::CL_MEM_WRITE_ONLY;
        const READ_ONLY = ffi::CL_MEM_READ_ONLY;
        const USE_HOST_PTR = ffi::CL_MEM_USE_HOST_PTR;
        const ALLOC_HOST_PTR = ffi::CL_MEM_ALLOC_HOST_PTR;
        const COPY_HOST_PTR = ffi::CL_MEM_COPY_HOST_PTR;
        const HOST_WRITE_ONLY = ffi::CL_MEM_HOST_WRITE_ONLY;
        const HOST_READ_ONLY = ffi::CL_MEM_HOST_READ_ONLY;
        const HOST_NO_ACCESS = ffi::CL_MEM_HOST_NO_ACCESS;
    }
}

impl Default for MemFlags {
    fn default() -> MemFlags {
        MemFlags::READ_WRITE
    }
}

bitflags! {
    /// `cl_map_flags` bitfield.
    pub struct MapFlags: u64 {
        const READ = ffi::CL_MAP_READ;
        const WRITE = ffi::CL_MAP_WRITE;
        const WRITE_INVALIDATE_REGION = ffi::CL_MAP_WRITE_INVALIDATE_REGION;
    }
}

bitflags! {
    /// `cl_mem_migration_flags` bitfield.
    pub struct MemMigrationFlags: u64 {
        const HOST = ffi::CL_MIGRATE_MEM_OBJECT_HOST;
        const CONTENT_UNDEFINED = ffi::CL_MIGRATE_MEM_OBJECT_CONTENT_UNDEFINED;
    }
}
