//! Standard error type for cf4ocl.
//!
//! Every error belongs to one of two domains: the library domain, for
//! problems detected by this crate, and the native domain, for status codes
//! returned by the OpenCL implementation. Native codes are carried verbatim.

use std::error::Error as StdError;
use std::fmt;
use std::io;
use crate::ffi::{self, cl_int};

/// Domain string for errors raised by this library.
pub const ERROR_DOMAIN: &str = "cf4ocl-error";

/// Domain string for errors returned by the OpenCL implementation.
pub const OCL_ERROR_DOMAIN: &str = "cf4ocl-ocl-error";

/// cf4ocl result type.
pub type Result<T> = ::std::result::Result<T, Error>;

/// Where an error originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorDomain {
    Library,
    Native,
}

impl ErrorDomain {
    pub fn as_str(&self) -> &'static str {
        match *self {
            ErrorDomain::Library => ERROR_DOMAIN,
            ErrorDomain::Native => OCL_ERROR_DOMAIN,
        }
    }
}

impl fmt::Display for ErrorDomain {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Library error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorKind {
    Success = 0,
    /// Unable to open file.
    OpenFile = 1,
    /// Invalid function arguments.
    BadArguments = 2,
    /// Invalid data passed to a function.
    InvalidData = 3,
    /// Error writing to a stream.
    StreamWrite = 4,
    /// The requested OpenCL device was not found.
    DeviceNotFound = 5,
    /// The OpenCL version does not support the requested operation.
    UnsupportedVersion = 6,
    /// Object information is unavailable.
    InfoUnavailable = 7,
    Other = 15,
}

/// An error detected by the library itself.
pub struct LibraryError {
    kind: ErrorKind,
    msg: String,
    source: Option<io::Error>,
}

impl LibraryError {
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.msg
    }
}

impl fmt::Display for LibraryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.source {
            Some(ref io_err) => write!(f, "{} ({})", self.msg, io_err),
            None => f.write_str(&self.msg),
        }
    }
}

impl fmt::Debug for LibraryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("LibraryError")
            .field("kind", &self.kind)
            .field("msg", &self.msg)
            .field("source", &self.source)
            .finish()
    }
}

impl StdError for LibraryError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn StdError + 'static))
    }
}

/// An OpenCL API error.
pub struct ApiError {
    status: cl_int,
    fn_name: &'static str,
    fn_info: Option<String>,
}

impl ApiError {
    pub fn new<S: Into<String>>(status: cl_int, fn_name: &'static str, fn_info: Option<S>)
            -> ApiError {
        ApiError {
            status,
            fn_name,
            fn_info: fn_info.map(|s| s.into()),
        }
    }

    /// The raw status code returned by the API.
    pub fn status(&self) -> cl_int {
        self.status
    }

    pub fn fn_name(&self) -> &'static str {
        self.fn_name
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.fn_name)?;
        if let Some(ref info) = self.fn_info {
            write!(f, " ({})", info)?;
        }
        write!(f, ": OpenCL error {}: {}", self.status, status_name(self.status))
    }
}

impl fmt::Debug for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self, f)
    }
}

impl StdError for ApiError {}

/// An enum of the two error domains.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Library(LibraryError),
    #[error(transparent)]
    Api(ApiError),
}

impl Error {
    /// Creates a library-domain error.
    pub fn lib<S: Into<String>>(kind: ErrorKind, msg: S) -> Error {
        Error::Library(LibraryError { kind, msg: msg.into(), source: None })
    }

    /// Creates a library-domain error caused by an I/O failure.
    pub fn io<S: Into<String>>(kind: ErrorKind, msg: S, err: io::Error) -> Error {
        Error::Library(LibraryError { kind, msg: msg.into(), source: Some(err) })
    }

    /// Creates a native-domain error.
    pub fn api(status: cl_int, fn_name: &'static str) -> Error {
        Error::Api(ApiError::new::<String>(status, fn_name, None))
    }

    pub fn domain(&self) -> ErrorDomain {
        match *self {
            Error::Library(_) => ErrorDomain::Library,
            Error::Api(_) => ErrorDomain::Native,
        }
    }

    /// The library error code, or the OpenCL status code for native errors.
    pub fn code(&self) -> i32 {
        match *self {
            Error::Library(ref err) => err.kind as i32,
            Error::Api(ref err) => err.status,
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Returns the library error kind, if this is a library error.
    pub fn kind(&self) -> Option<ErrorKind> {
        match *self {
            Error::Library(ref err) => Some(err.kind),
            Error::Api(_) => None,
        }
    }

    /// Returns the OpenCL status code, if this is a native error.
    pub fn api_status(&self) -> Option<cl_int> {
        match *self {
            Error::Api(ref err) => Some(err.status),
            Error::Library(_) => None,
        }
    }

    pub fn is_kind(&self, kind: ErrorKind) -> bool {
        self.kind() == Some(kind)
    }
}

impl From<LibraryError> for Error {
    fn from(err: LibraryError) -> Self {
        Error::Library(err)
    }
}

impl From<ApiError> for Error {
    fn from(err: ApiError) -> Self {
        Error::Api(err)
    }
}

/// Converts raw backend results into native-domain errors.
pub(crate) trait ApiResultExt<T> {
    fn or_api(self, fn_name: &'static str) -> Result<T>;

    fn or_api_info<F: FnOnce() -> String>(self, fn_name: &'static str, info: F) -> Result<T>;
}

impl<T> ApiResultExt<T> for ::std::result::Result<T, cl_int> {
    #[inline]
    fn or_api(self, fn_name: &'static str) -> Result<T> {
        self.map_err(|status| Error::api(status, fn_name))
    }

    #[inline]
    fn or_api_info<F: FnOnce() -> String>(self, fn_name: &'static str, info: F) -> Result<T> {
        self.map_err(|status| Error::Api(ApiError::new(status, fn_name, Some(info()))))
    }
}

/// Returns the symbolic name of an OpenCL status code.
pub fn status_name(code: cl_int) -> &'static str {
    match code {
        ffi::CL_SUCCESS => "CL_SUCCESS",
        ffi::CL_DEVICE_NOT_FOUND => "CL_DEVICE_NOT_FOUND",
        ffi::CL_DEVICE_NOT_AVAILABLE => "CL_DEVICE_NOT_AVAILABLE",
        ffi::CL_COMPILER_NOT_AVAILABLE => "CL_COMPILER_NOT_AVAILABLE",
        ffi::CL_MEM_OBJECT_ALLOCATION_FAILURE => "CL_MEM_OBJECT_ALLOCATION_FAILURE",
        ffi::CL_OUT_OF_RESOURCES => "CL_OUT_OF_RESOURCES",
        ffi::CL_OUT_OF_HOST_MEMORY => "CL_OUT_OF_HOST_MEMORY",
        ffi::CL_PROFILING_INFO_NOT_AVAILABLE => "CL_PROFILING_INFO_NOT_AVAILABLE",
        ffi::CL_MEM_COPY_OVERLAP => "CL_MEM_COPY_OVERLAP",
        ffi::CL_IMAGE_FORMAT_MISMATCH => "CL_IMAGE_FORMAT_MISMATCH",
        ffi::CL_IMAGE_FORMAT_NOT_SUPPORTED => "CL_IMAGE_FORMAT_NOT_SUPPORTED",
        ffi::CL_BUILD_PROGRAM_FAILURE => "CL_BUILD_PROGRAM_FAILURE",
        ffi::CL_MAP_FAILURE => "CL_MAP_FAILURE",
        ffi::CL_MISALIGNED_SUB_BUFFER_OFFSET => "CL_MISALIGNED_SUB_BUFFER_OFFSET",
        ffi::CL_EXEC_STATUS_ERROR_FOR_EVENTS_IN_WAIT_LIST =>
            "CL_EXEC_STATUS_ERROR_FOR_EVENTS_IN_WAIT_LIST",
        ffi::CL_COMPILE_PROGRAM_FAILURE => "CL_COMPILE_PROGRAM_FAILURE",
        ffi::CL_LINKER_NOT_AVAILABLE => "CL_LINKER_NOT_AVAILABLE",
        ffi::CL_LINK_PROGRAM_FAILURE => "CL_LINK_PROGRAM_FAILURE",
        ffi::CL_DEVICE_PARTITION_FAILED => "CL_DEVICE_PARTITION_FAILED",
        ffi::CL_KERNEL_ARG_INFO_NOT_AVAILABLE => "CL_KERNEL_ARG_INFO_NOT_AVAILABLE",
        ffi::CL_INVALID_VALUE => "CL_INVALID_VALUE",
        ffi::CL_INVALID_DEVICE_TYPE => "CL_INVALID_DEVICE_TYPE",
        ffi::CL_INVALID_PLATFORM => "CL_INVALID_PLATFORM",
        ffi::CL_INVALID_DEVICE => "CL_INVALID_DEVICE",
        ffi::CL_INVALID_CONTEXT => "CL_INVALID_CONTEXT",
        ffi::CL_INVALID_QUEUE_PROPERTIES => "CL_INVALID_QUEUE_PROPERTIES",
        ffi::CL_INVALID_COMMAND_QUEUE => "CL_INVALID_COMMAND_QUEUE",
        ffi::CL_INVALID_HOST_PTR => "CL_INVALID_HOST_PTR",
        ffi::CL_INVALID_MEM_OBJECT => "CL_INVALID_MEM_OBJECT",
        ffi::CL_INVALID_IMAGE_FORMAT_DESCRIPTOR => "CL_INVALID_IMAGE_FORMAT_DESCRIPTOR",
        ffi::CL_INVALID_IMAGE_SIZE => "CL_INVALID_IMAGE_SIZE",
        ffi::CL_INVALID_SAMPLER => "CL_INVALID_SAMPLER",
        ffi::CL_INVALID_BINARY => "CL_INVALID_BINARY",
        ffi::CL_INVALID_BUILD_OPTIONS => "CL_INVALID_BUILD_OPTIONS",
        ffi::CL_INVALID_PROGRAM => "CL_INVALID_PROGRAM",
        ffi::CL_INVALID_PROGRAM_EXECUTABLE => "CL_INVALID_PROGRAM_EXECUTABLE",
        ffi::CL_INVALID_KERNEL_NAME => "CL_INVALID_KERNEL_NAME",
        ffi::CL_INVALID_KERNEL_DEFINITION => "CL_INVALID_KERNEL_DEFINITION",
        ffi::CL_INVALID_KERNEL => "CL_INVALID_KERNEL",
        ffi::CL_INVALID_ARG_INDEX => "CL_INVALID_ARG_INDEX",
        ffi::CL_INVALID_ARG_VALUE => "CL_INVALID_ARG_VALUE",
        ffi::CL_INVALID_ARG_SIZE => "CL_INVALID_ARG_SIZE",
        ffi::CL_INVALID_KERNEL_ARGS => "CL_INVALID_KERNEL_ARGS",
        ffi::CL_INVALID_WORK_DIMENSION => "CL_INVALID_WORK_DIMENSION",
        ffi::CL_INVALID_WORK_GROUP_SIZE => "CL_INVALID_WORK_GROUP_SIZE",
        ffi::CL_INVALID_WORK_ITEM_SIZE => "CL_INVALID_WORK_ITEM_SIZE",
        ffi::CL_INVALID_GLOBAL_OFFSET => "CL_INVALID_GLOBAL_OFFSET",
        ffi::CL_INVALID_EVENT_WAIT_LIST => "CL_INVALID_EVENT_WAIT_LIST",
        ffi::CL_INVALID_EVENT => "CL_INVALID_EVENT",
        ffi::CL_INVALID_OPERATION => "CL_INVALID_OPERATION",
        ffi::CL_INVALID_GL_OBJECT => "CL_INVALID_GL_OBJECT",
        ffi::CL_INVALID_BUFFER_SIZE => "CL_INVALID_BUFFER_SIZE",
        ffi::CL_INVALID_MIP_LEVEL => "CL_INVALID_MIP_LEVEL",
        ffi::CL_INVALID_GLOBAL_WORK_SIZE => "CL_INVALID_GLOBAL_WORK_SIZE",
        ffi::CL_INVALID_PROPERTY => "CL_INVALID_PROPERTY",
        ffi::CL_INVALID_IMAGE_DESCRIPTOR => "CL_INVALID_IMAGE_DESCRIPTOR",
        ffi::CL_INVALID_COMPILER_OPTIONS => "CL_INVALID_COMPILER_OPTIONS",
        ffi::CL_INVALID_LINKER_OPTIONS => "CL_INVALID_LINKER_OPTIONS",
        ffi::CL_INVALID_DEVICE_PARTITION_COUNT => "CL_INVALID_DEVICE_PARTITION_COUNT",
        ffi::CL_INVALID_PIPE_SIZE => "CL_INVALID_PIPE_SIZE",
        ffi::CL_INVALID_DEVICE_QUEUE => "CL_INVALID_DEVICE_QUEUE",
        ffi::CL_PLATFORM_NOT_FOUND_KHR => "CL_PLATFORM_NOT_FOUND_KHR",
        _ => "Unknown OpenCL error",
    }
}
