/// Number of independent client groups sharing the one Back End.
pub const NUM_CLIENT_GROUPS: usize = 2;

/// Number of channels (buffer queues) per client group.
pub const NUM_CHANNELS: usize = 9;

/// Number of image output channels driven by the RGB pipe.
pub const NUM_OUTPUTS: usize = 2;

/// Maximum number of image planes addressed per buffer.
pub const MAX_PLANES: usize = 3;

/// Number of DMA addresses programmed per job.
pub const NUM_HW_ADDRESSES: usize = 14;

/// Maximum number of tiles a single job may describe.
pub const MAX_TILES: u32 = 64;

/// Number of buffers each channel queue can hold.
pub const QUEUE_DEPTH: usize = 32;

/// Number of 32-bit words in the opaque per-job parameter block.
pub const PARAM_WORDS: usize = 16;

/// Byte offset of the tile table inside a config buffer.
///
/// The config buffer holds the parameter block first, the tile table after it.
pub const TILES_OFFSET: u64 = (PARAM_WORDS * 4) as u64;

/// Bytes per tile table entry.
pub const TILE_BYTES: u32 = 160;

/// Size of a config buffer: parameter block plus a full tile table.
pub const CONFIG_BUFFER_SIZE: u32 = TILES_OFFSET as u32 + MAX_TILES * TILE_BYTES;

/// Largest image width or height a channel format may describe.
pub const MAX_IMAGE_DIM: u32 = 65536;

/// Smallest image width a channel format may describe: one minimum tile.
pub const MIN_IMAGE_WIDTH: u32 = 16;

/// Smallest image height a channel format may describe: one minimum tile.
pub const MIN_IMAGE_HEIGHT: u32 = 16;
