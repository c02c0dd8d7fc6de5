//! Turning a job into register values.
//!
//! DMA addresses and enable words are derived here rather than taken from
//! the config payload: the payload comes from a client-writable buffer, so
//! nothing in it reaches the device until it has been reconciled with the
//! buffers the job actually holds. Any block whose memory is missing is
//! switched off, since the engine can lock up if it is enabled without a
//! source or destination.

use crate::buffer::Buffer;
use crate::channel::{ChannelId, ChannelMap};
use crate::constants::{MAX_PLANES, MAX_TILES, NUM_HW_ADDRESSES, NUM_OUTPUTS, TILES_OFFSET};
use crate::format::ChannelFormat;
use crate::job::Job;
use crate::payload::{BayerEnables, RgbEnables};

use super::registers as reg;

/// Everything written to the engine's address and enable registers for one
/// job. Absent addresses are zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HwProgram {
    pub addrs: [u64; NUM_HW_ADDRESSES],
    pub bayer: BayerEnables,
    pub rgb: RgbEnables,
    /// DMA address of the tile table.
    pub tiles: u64,
    pub num_tiles: u32,
}

impl HwProgram {
    /// Derive addresses and sanitized enables for `job`.
    pub fn build(job: &Job, formats: &ChannelMap<ChannelFormat>) -> HwProgram {
        let config = job.config();
        let mut prog = HwProgram {
            addrs: [0; NUM_HW_ADDRESSES],
            bayer: config
                .map(|c| BayerEnables::from_bits_truncate(c.bayer_enables.bits()))
                .unwrap_or_default(),
            rgb: config
                .map(|c| RgbEnables::from_bits_truncate(c.rgb_enables.bits()))
                .unwrap_or_default(),
            tiles: job
                .buffer(ChannelId::Config)
                .and_then(|b| b.plane_addr(0))
                .map(|addr| addr + TILES_OFFSET)
                .unwrap_or(0),
            num_tiles: config.map(|c| c.num_tiles).unwrap_or(0),
        };
        let tdn_reset = config.map(|c| c.tdn_reset).unwrap_or(false);

        let main = reg::SLOT_MAIN_INPUT;
        let planes = plane_addrs(
            &mut prog.addrs[main..main + MAX_PLANES],
            job.buffer(ChannelId::MainInput),
            &formats[ChannelId::MainInput],
        );
        if planes == 0 {
            // The assembler never forms a job without an input.
            log::warn!("{}: job is missing its input", job.group);
            prog.bayer = BayerEnables::empty();
            prog.rgb = RgbEnables::empty();
            return prog;
        }

        // TDN and stitch are single-plane and only used with Bayer input.
        if prog.bayer.contains(BayerEnables::INPUT) {
            prog.fixup_bayer_side_channels(job, tdn_reset);
        } else {
            prog.bayer = BayerEnables::empty();
        }

        for n in 0..NUM_OUTPUTS {
            let Some(channel) = ChannelId::output(n) else {
                continue;
            };
            let slot = reg::SLOT_OUTPUT0 + MAX_PLANES * n;
            let planes = plane_addrs(
                &mut prog.addrs[slot..slot + MAX_PLANES],
                job.buffer(channel),
                &formats[channel],
            );
            if planes == 0 {
                prog.rgb.remove(RgbEnables::output(n));
            }
        }

        prog.addrs[reg::SLOT_HOG_OUTPUT] = addr(job.buffer(ChannelId::HogOutput));
        if prog.addrs[reg::SLOT_HOG_OUTPUT] == 0 {
            prog.rgb.remove(RgbEnables::HOG);
        }

        prog
    }

    fn fixup_bayer_side_channels(&mut self, job: &Job, tdn_reset: bool) {
        use BayerEnables as B;

        self.addrs[reg::SLOT_TDN_INPUT] = addr(job.buffer(ChannelId::TdnInput));
        if self.addrs[reg::SLOT_TDN_INPUT] == 0
            || !self.bayer.contains(B::TDN_INPUT)
            || !self.bayer.contains(B::TDN)
            || tdn_reset
        {
            self.bayer.remove(B::TDN_INPUT | B::TDN_DECOMPRESS);
            // A reset TDN runs without history.
            if !tdn_reset {
                self.bayer.remove(B::TDN);
            }
        }

        self.addrs[reg::SLOT_STITCH_INPUT] = addr(job.buffer(ChannelId::StitchInput));
        if self.addrs[reg::SLOT_STITCH_INPUT] == 0
            || !self.bayer.contains(B::STITCH_INPUT)
            || !self.bayer.contains(B::STITCH)
        {
            self.bayer
                .remove(B::STITCH_INPUT | B::STITCH_DECOMPRESS | B::STITCH);
        }

        self.addrs[reg::SLOT_TDN_OUTPUT] = addr(job.buffer(ChannelId::TdnOutput));
        if self.addrs[reg::SLOT_TDN_OUTPUT] == 0 {
            self.bayer.remove(B::TDN_COMPRESS | B::TDN_OUTPUT);
        }

        self.addrs[reg::SLOT_STITCH_OUTPUT] = addr(job.buffer(ChannelId::StitchOutput));
        if self.addrs[reg::SLOT_STITCH_OUTPUT] == 0 {
            self.bayer.remove(B::STITCH_COMPRESS | B::STITCH_OUTPUT);
        }
    }

    /// Whether the engine can run this program safely: a tile count in
    /// range and one pipe input still enabled.
    pub fn is_runnable(&self) -> bool {
        (1..=MAX_TILES).contains(&self.num_tiles)
            && (self.bayer.contains(BayerEnables::INPUT) || self.rgb.contains(RgbEnables::INPUT))
    }
}

fn addr(buffer: Option<&Buffer>) -> u64 {
    buffer.and_then(|b| b.plane_addr(0)).unwrap_or(0)
}

/// Fill up to three plane addresses for an image buffer.
///
/// Separately addressed planes come from the buffer; the remaining image
/// planes of a single-buffer layout are placed after the first plane.
/// Returns the number of memory planes, zero if the buffer is absent.
fn plane_addrs(out: &mut [u64], buffer: Option<&Buffer>, fmt: &ChannelFormat) -> usize {
    let Some(buffer) = buffer else {
        return 0;
    };
    let nplanes = fmt.num_planes().min(out.len());

    for (p, slot) in out.iter_mut().enumerate().take(nplanes) {
        *slot = buffer.plane_addr(p).unwrap_or(0);
    }
    for p in nplanes..out.len() {
        match fmt.derived_plane_offset(p) {
            Some(offset) => out[p] = out[0] + offset,
            None => break,
        }
    }

    nplanes
}
