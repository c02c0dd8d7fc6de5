//! Negotiated buffer geometry per channel.
//!
//! Format negotiation itself belongs to the buffer-queue layer. This module
//! only holds the result ([`ChannelFormat`]) and the plane-parameter
//! arithmetic needed to produce a consistent one, because the scheduling
//! core depends on it twice: config validation compares declared output
//! strides against it, and address derivation uses its plane factors to
//! locate image planes that share one buffer.
//!
//! ## Plane factors
//!
//! Plane sizes are expressed in eighths of the first plane's size. Planar
//! YUV 4:2:0 is `[8, 2, 2]`, NV12 is `[8, 4, 0]`, packed formats are
//! `[8, 0, 0]`.

use crate::constants::{MAX_IMAGE_DIM, MAX_PLANES, MIN_IMAGE_HEIGHT, MIN_IMAGE_WIDTH};

/// Layout of one pixel format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelLayout {
    /// Bits per pixel of the first plane.
    pub bit_depth: u32,
    /// Bytes-per-line alignment.
    pub align: u32,
    /// Number of separately addressed memory planes.
    pub num_planes: u8,
    /// Fixed-point (/8) size factor of each image plane.
    pub plane_factors: [u8; MAX_PLANES],
}

impl PixelLayout {
    /// 8-bit planar 4:2:0, all three planes in one buffer.
    pub const YUV420: PixelLayout = PixelLayout {
        bit_depth: 8,
        align: 64,
        num_planes: 1,
        plane_factors: [8, 2, 2],
    };

    /// 8-bit planar 4:2:0, one buffer per plane.
    pub const YUV420M: PixelLayout = PixelLayout {
        bit_depth: 8,
        align: 64,
        num_planes: 3,
        plane_factors: [8, 2, 2],
    };

    /// 8-bit semi-planar 4:2:0 in one buffer.
    pub const NV12: PixelLayout = PixelLayout {
        bit_depth: 8,
        align: 32,
        num_planes: 1,
        plane_factors: [8, 4, 0],
    };

    /// Packed 24-bit RGB.
    pub const RGB888: PixelLayout = PixelLayout {
        bit_depth: 24,
        align: 32,
        num_planes: 1,
        plane_factors: [8, 0, 0],
    };

    /// 16-bit Bayer raw.
    pub const BAYER16: PixelLayout = PixelLayout {
        bit_depth: 16,
        align: 32,
        num_planes: 1,
        plane_factors: [8, 0, 0],
    };

    fn total_plane_factor(&self) -> u32 {
        self.plane_factors.iter().map(|&f| f as u32).sum()
    }
}

/// Geometry of one memory plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaneFormat {
    pub bytes_per_line: u32,
    pub size_image: u32,
}

/// The geometry a channel's buffers were negotiated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelFormat {
    pub width: u32,
    pub height: u32,
    pub layout: PixelLayout,
    pub planes: [PlaneFormat; MAX_PLANES],
}

impl ChannelFormat {
    /// Compute bytes-per-line and plane sizes for an image of the given size.
    ///
    /// Width and height are clamped to the range the engine can tile.
    /// Lines are padded to the layout's alignment. With a single memory
    /// plane the whole image (all image planes) is accounted to plane 0.
    /// Sizes that do not fit in 32 bits saturate.
    pub fn image(layout: PixelLayout, width: u32, height: u32) -> Self {
        let width = width.clamp(MIN_IMAGE_WIDTH, MAX_IMAGE_DIM);
        let height = height.clamp(MIN_IMAGE_HEIGHT, MAX_IMAGE_DIM);
        let mut planes = [PlaneFormat::default(); MAX_PLANES];
        let nplanes = (layout.num_planes as usize).min(MAX_PLANES);
        let total = layout.total_plane_factor();

        for (i, plane) in planes.iter_mut().enumerate().take(nplanes) {
            let bpl = align_up((width as u64 * layout.bit_depth as u64) >> 3, layout.align);
            let factor = if nplanes > 1 {
                layout.plane_factors[i] as u32
            } else {
                total
            };
            // The shift divides out the fixed-point factor scaling of 8.
            let size = bpl.saturating_mul(height as u64).saturating_mul(factor as u64) >> 3;
            *plane = PlaneFormat {
                bytes_per_line: saturate(bpl),
                size_image: saturate(size),
            };
        }

        ChannelFormat {
            width,
            height,
            layout,
            planes,
        }
    }

    /// A single-plane metadata buffer of `size` bytes.
    pub fn meta(size: u32) -> Self {
        let mut planes = [PlaneFormat::default(); MAX_PLANES];
        planes[0] = PlaneFormat {
            bytes_per_line: size,
            size_image: size,
        };
        ChannelFormat {
            width: 0,
            height: 0,
            layout: PixelLayout {
                bit_depth: 8,
                align: 1,
                num_planes: 1,
                plane_factors: [8, 0, 0],
            },
            planes,
        }
    }

    /// Number of separately addressed memory planes.
    pub fn num_planes(&self) -> usize {
        (self.layout.num_planes as usize).min(MAX_PLANES)
    }

    /// Size of the first image plane alone.
    ///
    /// Differs from `planes[0].size_image` when several image planes share
    /// one buffer.
    pub fn base_plane_size(&self) -> u64 {
        self.planes[0].bytes_per_line as u64 * self.height as u64
    }

    /// Byte offset of image plane `p` from the start of the buffer, for
    /// planes that are not separately addressed.
    ///
    /// Returns `None` when the layout has no such plane.
    pub fn derived_plane_offset(&self, p: usize) -> Option<u64> {
        if p >= MAX_PLANES || self.layout.plane_factors[p] == 0 {
            return None;
        }
        let preceding: u64 = self.layout.plane_factors[..p]
            .iter()
            .map(|&f| f as u64)
            .sum();
        Some((self.base_plane_size() * preceding) >> 3)
    }
}

impl Default for ChannelFormat {
    fn default() -> Self {
        ChannelFormat::image(PixelLayout::YUV420, 64, 16)
    }
}

fn align_up(value: u64, align: u32) -> u64 {
    if align <= 1 {
        value
    } else {
        value.div_ceil(align as u64).saturating_mul(align as u64)
    }
}

fn saturate(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
