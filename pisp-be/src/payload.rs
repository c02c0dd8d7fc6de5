//! Decoded contents of a config buffer.
//!
//! A config buffer describes one job: which blocks of the Bayer and RGB
//! pipes run, the geometry each enabled output expects to write, the tile
//! count, and an opaque parameter block copied verbatim into the engine's
//! config registers.
//!
//! [`validate_config`] runs when the buffer is submitted, so a config that
//! could never be run safely is rejected before the job assembler sees it.

use bitflags::bitflags;

use crate::channel::{ChannelId, ChannelMap};
use crate::constants::{NUM_OUTPUTS, PARAM_WORDS};
use crate::error::ConfigError;
use crate::format::ChannelFormat;

bitflags! {
    /// Block enables of the Bayer (raw sensor data) pipe.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct BayerEnables: u32 {
        const INPUT = 0x00_0001;
        const DECOMPRESS = 0x00_0002;
        const DPC = 0x00_0004;
        const GEQ = 0x00_0008;
        const TDN_INPUT = 0x00_0010;
        const TDN_DECOMPRESS = 0x00_0020;
        const TDN = 0x00_0040;
        const TDN_COMPRESS = 0x00_0080;
        const TDN_OUTPUT = 0x00_0100;
        const SDN = 0x00_0200;
        const BLC = 0x00_0400;
        const STITCH_INPUT = 0x00_0800;
        const STITCH_DECOMPRESS = 0x00_1000;
        const STITCH = 0x00_2000;
        const STITCH_COMPRESS = 0x00_4000;
        const STITCH_OUTPUT = 0x00_8000;
        const WBG = 0x01_0000;
        const CDN = 0x02_0000;
        const LSC = 0x04_0000;
        const TONEMAP = 0x08_0000;
        const CAC = 0x10_0000;
        const DEBIN = 0x20_0000;
        const DEMOSAIC = 0x40_0000;
    }
}

bitflags! {
    /// Block enables of the RGB (processed image) pipe.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct RgbEnables: u32 {
        const INPUT = 0x00_0001;
        const CCM = 0x00_0002;
        const SAT_CONTROL = 0x00_0004;
        const YCBCR = 0x00_0008;
        const FALSE_COLOUR = 0x00_0010;
        const SHARPEN = 0x00_0020;
        const RESAMPLE0 = 0x00_0080;
        const RESAMPLE1 = 0x00_0100;
        const DOWNSCALE0 = 0x00_0200;
        const DOWNSCALE1 = 0x00_0400;
        const CSC0 = 0x00_0800;
        const CSC1 = 0x00_1000;
        const OUTPUT0 = 0x00_2000;
        const OUTPUT1 = 0x00_4000;
        const HOG = 0x20_0000;
    }
}

impl RgbEnables {
    /// Enable bit of image output `n`.
    pub fn output(n: usize) -> RgbEnables {
        RgbEnables::from_bits_truncate(RgbEnables::OUTPUT0.bits() << n)
    }
}

bitflags! {
    /// Image format modifiers relevant to buffer sizing.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ImageFlags: u32 {
        const SAMPLING_422 = 0x0001_0000;
        const SAMPLING_420 = 0x0002_0000;
        const WALLPAPER_ROLL = 0x0040_0000;

        const _ = !0;
    }
}

/// Declared geometry of a single-plane output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaneGeometry {
    pub stride: u32,
    pub height: u32,
}

impl PlaneGeometry {
    pub fn size(&self) -> u64 {
        self.stride as u64 * self.height as u64
    }
}

/// Declared geometry of an image output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageGeometry {
    pub width: u32,
    pub height: u32,
    /// Stride of the first plane.
    pub stride: u32,
    /// Stride of the remaining planes.
    pub stride2: u32,
    pub flags: ImageFlags,
}

/// Per-job parameters carried by a config buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPayload {
    pub bayer_enables: BayerEnables,
    pub rgb_enables: RgbEnables,
    /// Start temporal denoise from scratch; TDN runs with no history input.
    pub tdn_reset: bool,
    pub tdn_output: PlaneGeometry,
    pub stitch_output: PlaneGeometry,
    pub hog_output: PlaneGeometry,
    pub outputs: [ImageGeometry; NUM_OUTPUTS],
    pub num_tiles: u32,
    /// Remaining block parameters, written to the engine unchanged.
    pub params: [u32; PARAM_WORDS],
}

impl Default for ConfigPayload {
    fn default() -> Self {
        ConfigPayload {
            bayer_enables: BayerEnables::empty(),
            rgb_enables: RgbEnables::empty(),
            tdn_reset: false,
            tdn_output: PlaneGeometry::default(),
            stitch_output: PlaneGeometry::default(),
            hog_output: PlaneGeometry::default(),
            outputs: [ImageGeometry::default(); NUM_OUTPUTS],
            num_tiles: 0,
            params: [0; PARAM_WORDS],
        }
    }
}

impl ConfigPayload {
    /// Whether exactly one of the two pipe inputs is enabled.
    pub fn has_single_input(&self) -> bool {
        self.bayer_enables.contains(BayerEnables::INPUT)
            != self.rgb_enables.contains(RgbEnables::INPUT)
    }
}

/// Check a config against the formats negotiated on its client group.
///
/// Every enabled output must fit in the buffers its channel was set up
/// with; a mismatch is reported, never corrected.
pub fn validate_config(
    config: &ConfigPayload,
    formats: &ChannelMap<ChannelFormat>,
) -> Result<(), ConfigError> {
    if !config.has_single_input() {
        return Err(ConfigError::InputEnables);
    }

    if config.bayer_enables.contains(BayerEnables::TDN_OUTPUT) {
        check_plane(
            ChannelId::TdnOutput,
            0,
            config.tdn_output.stride,
            config.tdn_output.size(),
            &formats[ChannelId::TdnOutput],
        )?;
    }

    if config.bayer_enables.contains(BayerEnables::STITCH_OUTPUT) {
        check_plane(
            ChannelId::StitchOutput,
            0,
            config.stitch_output.stride,
            config.stitch_output.size(),
            &formats[ChannelId::StitchOutput],
        )?;
    }

    for (j, output) in config.outputs.iter().enumerate() {
        let Some(channel) = ChannelId::output(j) else {
            continue;
        };
        if !config.rgb_enables.contains(RgbEnables::output(j)) {
            continue;
        }
        // TODO: wallpaper-roll outputs need a stripe-aware size check.
        if output.flags.contains(ImageFlags::WALLPAPER_ROLL) {
            continue;
        }

        let fmt = &formats[channel];
        for plane in 0..fmt.num_planes() {
            let stride = if plane == 0 {
                output.stride
            } else {
                output.stride2
            };
            let mut size = stride as u64 * output.height as u64;
            if output.flags.contains(ImageFlags::SAMPLING_420) {
                size >>= 1;
            }
            check_plane(channel, plane, stride, size, fmt)?;
        }
    }

    if config.rgb_enables.contains(RgbEnables::HOG) {
        check_plane(
            ChannelId::HogOutput,
            0,
            config.hog_output.stride,
            config.hog_output.size(),
            &formats[ChannelId::HogOutput],
        )?;
    }

    Ok(())
}

fn check_plane(
    channel: ChannelId,
    plane: usize,
    stride: u32,
    size: u64,
    fmt: &ChannelFormat,
) -> Result<(), ConfigError> {
    let negotiated = fmt.planes[plane];
    if stride > negotiated.bytes_per_line {
        log::error!("validate_config: bpl mismatch on {} plane {}", channel, plane);
        return Err(ConfigError::StrideTooLarge {
            channel,
            plane,
            declared: stride,
            negotiated: negotiated.bytes_per_line,
        });
    }
    if size > negotiated.size_image as u64 {
        log::error!("validate_config: size mismatch on {} plane {}", channel, plane);
        return Err(ConfigError::SizeTooLarge {
            channel,
            plane,
            declared: size,
            negotiated: negotiated.size_image,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::PixelLayout;

    fn formats() -> ChannelMap<ChannelFormat> {
        let mut f: ChannelMap<ChannelFormat> = ChannelMap::default();
        f[ChannelId::Output0] = ChannelFormat::image(PixelLayout::YUV420M, 640, 480);
        f[ChannelId::Output1] = ChannelFormat::image(PixelLayout::RGB888, 320, 240);
        f[ChannelId::TdnOutput] = ChannelFormat::image(PixelLayout::BAYER16, 640, 480);
        f[ChannelId::HogOutput] = ChannelFormat::meta(1 << 16);
        f
    }

    fn bayer_config() -> ConfigPayload {
        ConfigPayload {
            bayer_enables: BayerEnables::INPUT,
            rgb_enables: RgbEnables::OUTPUT0,
            outputs: [
                ImageGeometry {
                    width: 640,
                    height: 480,
                    stride: 640,
                    stride2: 320,
                    flags: ImageFlags::SAMPLING_420,
                },
                ImageGeometry::default(),
            ],
            num_tiles: 4,
            ..ConfigPayload::default()
        }
    }

    #[test]
    fn accepts_matching_config() {
        assert_eq!(validate_config(&bayer_config(), &formats()), Ok(()));
    }

    #[test]
    fn rejects_both_inputs() {
        let mut cfg = bayer_config();
        cfg.rgb_enables |= RgbEnables::INPUT;
        assert_eq!(
            validate_config(&cfg, &formats()),
            Err(ConfigError::InputEnables)
        );
    }

    #[test]
    fn rejects_no_input() {
        let mut cfg = bayer_config();
        cfg.bayer_enables = BayerEnables::empty();
        assert_eq!(
            validate_config(&cfg, &formats()),
            Err(ConfigError::InputEnables)
        );
    }

    #[test]
    fn rejects_output_stride_over_negotiated() {
        let mut cfg = bayer_config();
        cfg.outputs[0].stride = 704;
        assert_eq!(
            validate_config(&cfg, &formats()),
            Err(ConfigError::StrideTooLarge {
                channel: ChannelId::Output0,
                plane: 0,
                declared: 704,
                negotiated: 640,
            })
        );
    }

    #[test]
    fn second_plane_uses_stride2() {
        let mut cfg = bayer_config();
        cfg.outputs[0].stride2 = 700;
        let err = validate_config(&cfg, &formats()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::StrideTooLarge {
                channel: ChannelId::Output0,
                plane: 1,
                ..
            }
        ));
    }

    #[test]
    fn disabled_output_is_not_checked() {
        let mut cfg = bayer_config();
        cfg.outputs[1].stride = 100_000;
        assert_eq!(validate_config(&cfg, &formats()), Ok(()));
    }

    #[test]
    fn wallpaper_output_skips_geometry() {
        let mut cfg = bayer_config();
        cfg.outputs[0].stride = 100_000;
        cfg.outputs[0].flags |= ImageFlags::WALLPAPER_ROLL;
        assert_eq!(validate_config(&cfg, &formats()), Ok(()));
    }

    #[test]
    fn rejects_tdn_output_too_tall() {
        let mut cfg = bayer_config();
        cfg.bayer_enables |= BayerEnables::TDN_OUTPUT;
        cfg.tdn_output = PlaneGeometry {
            stride: 1280,
            height: 481,
        };
        assert!(matches!(
            validate_config(&cfg, &formats()),
            Err(ConfigError::SizeTooLarge {
                channel: ChannelId::TdnOutput,
                ..
            })
        ));
    }

    #[test]
    fn rejects_oversized_hog_output() {
        let mut cfg = bayer_config();
        cfg.rgb_enables |= RgbEnables::HOG;
        cfg.hog_output = PlaneGeometry {
            stride: 1 << 10,
            height: 1 << 7,
        };
        assert!(matches!(
            validate_config(&cfg, &formats()),
            Err(ConfigError::SizeTooLarge {
                channel: ChannelId::HogOutput,
                ..
            })
        ));
    }

    #[test]
    fn output_bit_helper() {
        assert_eq!(RgbEnables::output(0), RgbEnables::OUTPUT0);
        assert_eq!(RgbEnables::output(1), RgbEnables::OUTPUT1);
    }
}
