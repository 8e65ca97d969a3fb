
use std::cmp::min;

use anyhow::{Result, bail};
use vapoursynth::{
    format::{ColorFamily, Format, SampleType},
    frame::{FrameRef, FrameRefMut},
    node::Node,
    plugins::Filter,
    prelude::Property,
    video_info::{Framerate, Resolution},
};

use crate::{
    combed::{comb_mask_plane, fold_chroma_mask, max_block_count},
    lut::{AVG_NEXT, AVG_PREV, BLEND, COPY_NEXT, COPY_PREV, KEEP, SPATIAL},
    params::{CombedMetric, OutputMode},
    util::{plane_view, plane_view_mut},
};

/// Synthesizes one plane from the verdict mask, drawing spatially
/// interpolated pixels from an externally supplied frame.
#[allow(clippy::too_many_arguments)]
pub fn edeint_plane(
    mask: &[u8],
    mask_pitch: usize,
    prv: &[u8],
    src: &[u8],
    nxt: &[u8],
    src_pitch: usize,
    efrm: &[u8],
    efrm_pitch: usize,
    dst: &mut [u8],
    dst_pitch: usize,
    width: usize,
    height: usize,
) {
    for y in 0..height {
        for x in 0..width {
            let i = y * src_pitch + x;
            dst[y * dst_pitch + x] = match mask[y * mask_pitch + x] {
                KEEP => src[i],
                COPY_PREV => prv[i],
                COPY_NEXT => nxt[i],
                AVG_NEXT => ((u16::from(src[i]) + u16::from(nxt[i]) + 1) >> 1) as u8,
                AVG_PREV => ((u16::from(src[i]) + u16::from(prv[i]) + 1) >> 1) as u8,
                BLEND => {
                    ((u16::from(prv[i]) + (u16::from(src[i]) << 1) + u16::from(nxt[i]) + 2) >> 2)
                        as u8
                }
                SPATIAL => efrm[y * efrm_pitch + x],
                _ => src[i],
            };
        }
    }
}

/// Synthesizes one plane from the verdict mask, interpolating spatial
/// pixels with the built-in 4-tap cubic (field-spaced taps, linear
/// fallback near the plane edges).
#[allow(clippy::too_many_arguments)]
pub fn cubic_deint_plane(
    mask: &[u8],
    mask_pitch: usize,
    prv: &[u8],
    src: &[u8],
    nxt: &[u8],
    src_pitch: usize,
    dst: &mut [u8],
    dst_pitch: usize,
    width: usize,
    height: usize,
) {
    for y in 0..height {
        for x in 0..width {
            let i = y * src_pitch + x;
            dst[y * dst_pitch + x] = match mask[y * mask_pitch + x] {
                KEEP => src[i],
                COPY_PREV => prv[i],
                COPY_NEXT => nxt[i],
                AVG_NEXT => ((u16::from(src[i]) + u16::from(nxt[i]) + 1) >> 1) as u8,
                AVG_PREV => ((u16::from(src[i]) + u16::from(prv[i]) + 1) >> 1) as u8,
                BLEND => {
                    ((u16::from(prv[i]) + (u16::from(src[i]) << 1) + u16::from(nxt[i]) + 2) >> 2)
                        as u8
                }
                SPATIAL => cubic_interpolate(src, src_pitch, x, y, height),
                _ => src[i],
            };
        }
    }
}

#[inline]
fn cubic_interpolate(src: &[u8], pitch: usize, x: usize, y: usize, height: usize) -> u8 {
    if y == 0 {
        src[pitch + x]
    } else if y == height - 1 {
        src[(y - 1) * pitch + x]
    } else if y < 3 || y > height - 4 {
        ((u16::from(src[(y + 1) * pitch + x]) + u16::from(src[(y - 1) * pitch + x]) + 1) >> 1)
            as u8
    } else {
        let temp = (19
            * (i32::from(src[(y - 1) * pitch + x]) + i32::from(src[(y + 1) * pitch + x]))
            - 3 * (i32::from(src[(y - 3) * pitch + x]) + i32::from(src[(y + 3) * pitch + x]))
            + 16)
            >> 5;
        temp.clamp(0, 255) as u8
    }
}

/// The synthesis stage: selects, per pixel, among temporal copies,
/// temporal averages, and spatial interpolation according to the verdict
/// mask, optionally skipping frames the combing detector considers
/// progressive.
pub struct TDeintMod<'core> {
    /// Source clip
    clip: Node<'core>,
    /// Verdict mask clip (from BuildMM)
    mask: Node<'core>,
    /// Alternative source for the temporal taps
    clip2: Option<Node<'core>>,
    /// Externally supplied spatial interpolator
    edeint: Option<Node<'core>>,
    mode: OutputMode,
    /// Deinterlace every frame instead of only combed ones
    full: bool,
    /// Combing detector per-pixel threshold
    cthresh: i32,
    /// Include chroma in the combing decision
    chroma: bool,
    /// Combed block count above which a frame counts as interlaced
    mi: i32,
    metric: CombedMetric,

    // Internal fields
    xhalf: usize,
    yhalf: usize,
    xshift: u32,
    yshift: u32,
    use_clip2: bool,
    format: Format<'core>,
    width: usize,
    height: usize,
}

impl<'core> TDeintMod<'core> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        clip: Node<'core>,
        mask: Node<'core>,
        mode: Option<i64>,
        clip2: Option<Node<'core>>,
        edeint: Option<Node<'core>>,
        full: Option<i64>,
        cthresh: Option<i64>,
        blockx: Option<i64>,
        blocky: Option<i64>,
        chroma: Option<i64>,
        mi: Option<i64>,
        metric: Option<i64>,
    ) -> Result<Self> {
        let mode = mode.map_or(Ok(OutputMode::SameRate), OutputMode::try_from)?;
        let full = full.is_none_or(|full| full > 0);
        let cthresh = cthresh.map_or(Ok(6), i32::try_from)?;
        let blockx = blockx.map_or(Ok(16), usize::try_from)?;
        let blocky = blocky.map_or(Ok(16), usize::try_from)?;
        let mut chroma = chroma.is_some_and(|chroma| chroma > 0);
        let mi = mi.map_or(Ok(64), i32::try_from)?;
        let metric = metric.map_or(Ok(CombedMetric::Difference), CombedMetric::try_from)?;

        if !(4..=2048).contains(&blockx) || !blockx.is_power_of_two() {
            bail!("TDeintMod: illegal blockx size");
        }
        if !(4..=2048).contains(&blocky) || !blocky.is_power_of_two() {
            bail!("TDeintMod: illegal blocky size");
        }

        let info = clip.info();
        let Property::Constant(resolution) = info.resolution else {
            bail!("TDeintMod: variable resolution input clips are not supported");
        };
        let Property::Constant(format) = info.format else {
            bail!("TDeintMod: variable format input clips are not supported");
        };
        if format.sample_type() != SampleType::Integer || format.bits_per_sample() != 8 {
            bail!("TDeintMod: input clip must be 8-bit integer format");
        }
        if ![ColorFamily::YUV, ColorFamily::Gray].contains(&format.color_family())
            || format.sub_sampling_w() > 1
            || format.sub_sampling_h() > 1
        {
            bail!("TDeintMod: input clip must be GRAY8, 420, 422, or 444");
        }
        if resolution.width & 1 > 0 || resolution.height & 1 > 0 {
            bail!("TDeintMod: width and height must be multiples of 2");
        }
        if format.color_family() == ColorFamily::Gray {
            chroma = false;
        }

        let rate_factor = match mode {
            OutputMode::SameRate => 1,
            OutputMode::DoubleRate => 2,
        };
        let mask_info = mask.info();
        match (mask_info.format, mask_info.resolution) {
            (Property::Constant(mask_format), Property::Constant(mask_resolution))
                if mask_format == format
                    && mask_resolution.width == resolution.width
                    && mask_resolution.height == resolution.height => {}
            _ => bail!("TDeintMod: mask clip must have the same dimensions and format as the main clip"),
        }
        if mask_info.num_frames != info.num_frames * rate_factor {
            bail!("TDeintMod: mask clip's number of frames doesn't match");
        }

        let use_clip2 = !full && mode == OutputMode::SameRate && clip2.is_some();
        if use_clip2 {
            let clip2_info = clip2.as_ref().map(Node::info).expect("clip2 was just checked");
            match (clip2_info.format, clip2_info.resolution) {
                (Property::Constant(clip2_format), Property::Constant(clip2_resolution))
                    if clip2_format == format
                        && clip2_resolution.width == resolution.width
                        && clip2_resolution.height == resolution.height => {}
                _ => bail!(
                    "TDeintMod: clip2 must have the same dimensions as main clip and be the same \
                     format"
                ),
            }
            if clip2_info.num_frames != info.num_frames {
                bail!("TDeintMod: clip2's number of frames doesn't match");
            }
        }

        if let Some(ref edeint) = edeint {
            let edeint_info = edeint.info();
            match (edeint_info.format, edeint_info.resolution) {
                (Property::Constant(edeint_format), Property::Constant(edeint_resolution))
                    if edeint_format == format
                        && edeint_resolution.width == resolution.width
                        && edeint_resolution.height == resolution.height => {}
                _ => bail!(
                    "TDeintMod: edeint clip must have the same dimensions as main clip and be \
                     the same format"
                ),
            }
            if edeint_info.num_frames != info.num_frames * rate_factor {
                bail!("TDeintMod: edeint clip's number of frames doesn't match");
            }
        }

        Ok(Self {
            clip,
            mask,
            clip2,
            edeint,
            mode,
            full,
            cthresh,
            chroma,
            mi,
            metric,
            xhalf: blockx / 2,
            yhalf: blocky / 2,
            xshift: blockx.trailing_zeros(),
            yshift: blocky.trailing_zeros(),
            use_clip2,
            format,
            width: resolution.width,
            height: resolution.height,
        })
    }

    fn is_combed(&self, src: &FrameRef) -> Result<bool> {
        let plane_count = if self.chroma { 3 } else { 1 };
        let mut cmk: Vec<Vec<u8>> = (0..plane_count)
            .map(|plane| vec![0; src.width(plane) * src.height(plane)])
            .collect();
        for (plane, mask) in cmk.iter_mut().enumerate() {
            comb_mask_plane(
                plane_view(src, plane)?,
                src.stride(plane),
                src.width(plane),
                src.height(plane),
                self.cthresh,
                self.metric,
                mask,
            );
        }
        if self.chroma {
            let (luma, uv) = cmk.split_at_mut(1);
            fold_chroma_mask(
                &mut luma[0],
                src.width(0),
                &uv[0],
                &uv[1],
                src.width(2),
                src.width(2),
                src.height(2),
                self.format.sub_sampling_w(),
                self.format.sub_sampling_h(),
            );
        }
        let max = max_block_count(
            &cmk[0],
            src.width(0),
            src.width(0),
            src.height(0),
            self.xhalf,
            self.yhalf,
            self.xshift,
            self.yshift,
        );
        Ok(max > self.mi)
    }
}

impl<'core> Filter<'core> for TDeintMod<'core> {
    fn video_info(
        &self,
        _api: vapoursynth::prelude::API,
        _core: vapoursynth::core::CoreRef<'core>,
    ) -> Vec<vapoursynth::video_info::VideoInfo<'core>> {
        let mut info = self.clip.info();
        if self.mode == OutputMode::DoubleRate {
            info.num_frames *= 2;
            if let Property::Constant(Framerate {
                numerator,
                denominator,
            }) = info.framerate
            {
                info.framerate = Property::Constant(Framerate {
                    numerator: numerator * 2,
                    denominator,
                });
            }
        }
        vec![info]
    }

    fn get_frame_initial(
        &self,
        _api: vapoursynth::prelude::API,
        _core: vapoursynth::core::CoreRef<'core>,
        context: vapoursynth::plugins::FrameContext,
        n: usize,
    ) -> std::result::Result<Option<vapoursynth::prelude::FrameRef<'core>>, anyhow::Error> {
        self.mask.request_frame_filter(context, n);
        if let Some(ref edeint) = self.edeint {
            edeint.request_frame_filter(context, n);
        }

        let n = match self.mode {
            OutputMode::SameRate => n,
            OutputMode::DoubleRate => n / 2,
        };
        let temporal = if self.use_clip2 {
            self.clip2.as_ref().expect("use_clip2 implies clip2")
        } else {
            &self.clip
        };
        if n > 0 {
            temporal.request_frame_filter(context, n - 1);
        }
        self.clip.request_frame_filter(context, n);
        if self.use_clip2 {
            temporal.request_frame_filter(context, n);
        }
        if n < self.clip.info().num_frames - 1 {
            temporal.request_frame_filter(context, n + 1);
        }
        Ok(None)
    }

    fn get_frame(
        &self,
        _api: vapoursynth::prelude::API,
        core: vapoursynth::core::CoreRef<'core>,
        context: vapoursynth::plugins::FrameContext,
        n: usize,
    ) -> std::result::Result<vapoursynth::prelude::FrameRef<'core>, anyhow::Error> {
        let n_out = n;
        let n = match self.mode {
            OutputMode::SameRate => n,
            OutputMode::DoubleRate => n / 2,
        };
        let num_frames = self.clip.info().num_frames;

        let mut src = self
            .clip
            .get_frame_filter(context, n)
            .expect("TDeintMod: called get_frame_filter before request_frame_filter");

        if self.mode == OutputMode::SameRate && !self.full && !self.is_combed(&src)? {
            return Ok(src);
        }

        let temporal = if self.use_clip2 {
            self.clip2.as_ref().expect("use_clip2 implies clip2")
        } else {
            &self.clip
        };
        let prv = temporal
            .get_frame_filter(context, n.saturating_sub(1))
            .expect("TDeintMod: called get_frame_filter before request_frame_filter");
        if self.use_clip2 {
            src = temporal
                .get_frame_filter(context, n)
                .expect("TDeintMod: called get_frame_filter before request_frame_filter");
        }
        let nxt = temporal
            .get_frame_filter(context, min(n + 1, num_frames - 1))
            .expect("TDeintMod: called get_frame_filter before request_frame_filter");
        let mask = self
            .mask
            .get_frame_filter(context, n_out)
            .expect("TDeintMod: called get_frame_filter before request_frame_filter");
        let efrm = match self.edeint {
            Some(ref edeint) => Some(
                edeint
                    .get_frame_filter(context, n_out)
                    .expect("TDeintMod: called get_frame_filter before request_frame_filter"),
            ),
            None => None,
        };

        // SAFETY: every plane is fully written below
        let mut dest = unsafe {
            let mut dest = FrameRefMut::new_uninitialized(
                core,
                Some(&src),
                self.format,
                Resolution {
                    width: self.width,
                    height: self.height,
                },
            );
            for plane in 0..self.format.plane_count() {
                plane_view_mut(&mut dest, plane)
                    .expect("TDeintMod: plane should exist but does not")
                    .fill(0);
            }
            dest
        };

        for plane in 0..self.format.plane_count() {
            let width = src.width(plane);
            let height = src.height(plane);
            let src_pitch = src.stride(plane);
            let mask_pitch = mask.stride(plane);
            let dst_pitch = dest.stride(plane);
            match efrm {
                Some(ref efrm) => edeint_plane(
                    plane_view(&mask, plane)?,
                    mask_pitch,
                    plane_view(&prv, plane)?,
                    plane_view(&src, plane)?,
                    plane_view(&nxt, plane)?,
                    src_pitch,
                    plane_view(efrm, plane)?,
                    efrm.stride(plane),
                    plane_view_mut(&mut dest, plane)?,
                    dst_pitch,
                    width,
                    height,
                ),
                None => cubic_deint_plane(
                    plane_view(&mask, plane)?,
                    mask_pitch,
                    plane_view(&prv, plane)?,
                    plane_view(&src, plane)?,
                    plane_view(&nxt, plane)?,
                    src_pitch,
                    plane_view_mut(&mut dest, plane)?,
                    dst_pitch,
                    width,
                    height,
                ),
            }
        }

        Ok(dest.into())
    }
}
