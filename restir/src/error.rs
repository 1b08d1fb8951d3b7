use std::io;
use std::path::PathBuf;

use ash::vk;
use thiserror::Error;

use crate::gpu::GpuError;
use crate::GBufferTarget;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("couldn't read `{path}`")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("shader `{path}` is empty")]
    EmptyShader { path: PathBuf },

    #[error(
        "shader `{path}` is {len} bytes long, which is not a multiple of four"
    )]
    MisalignedShader { path: PathBuf, len: usize },

    #[error(
        "none of the candidate formats is supported for {target:?} \
         (tried {candidates:?})"
    )]
    UnsupportedFormat {
        target: GBufferTarget,
        candidates: Vec<vk::Format>,
    },

    #[error("software tracing requires an acceleration structure")]
    MissingAccelerationStructure,

    #[error("frame extent must be non-zero")]
    ZeroExtent,

    #[error("frame resources are not allocated; the last resize failed")]
    NotAllocated,

    #[error(transparent)]
    Gpu(#[from] GpuError),
}
