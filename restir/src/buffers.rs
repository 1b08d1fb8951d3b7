mod bind_group;
mod double_buffered;
mod reservoir_buffers;
mod storage_buffer;
mod uniform_buffer;

pub use self::bind_group::*;
pub use self::double_buffered::*;
pub use self::reservoir_buffers::*;
pub use self::storage_buffer::*;
pub use self::uniform_buffer::*;
