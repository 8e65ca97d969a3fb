
use std::cmp::min;

use anyhow::{Result, bail};
use vapoursynth::{
    format::{ColorFamily, Format, SampleType},
    frame::{FrameRef, FrameRefMut},
    node::Node,
    plugins::Filter,
    prelude::Property,
    video_info::Resolution,
};

use crate::{
    lut::{mirror_offsets, motion_lut},
    mask::{and_masks, combine_masks_plane, motion_mask_plane},
    params::ThreshType,
    thresh::{MaskPair, thresh_mask_plane},
    util::{plane_view, plane_view_mut},
};

/// Builds the per-parity binary motion mask (one invocation per field
/// stream). Three consecutive same-parity frames are compared pairwise
/// through per-pixel local contrast thresholds; a pixel ends up 255 when
/// no motion was detected across the window, 0 otherwise.
pub struct MotionMask<'core> {
    /// Single-parity field stream
    clip: Node<'core>,
    /// Local contrast neighborhood variant
    ttype: ThreshType,
    /// Constant override for the luma quarter thresholds (-1 = compute)
    mtq_l: i32,
    /// Constant override for the luma half thresholds (-1 = compute)
    mth_l: i32,
    /// Chroma counterparts of the two overrides
    mtq_c: i32,
    mth_c: i32,
    /// Neighbor count needed to bridge a hole in the combined mask
    cstr: i32,

    // Internal fields
    mlut: [u8; 256],
    /// Mirrored horizontal neighbor indices, per plane
    offsets: Vec<(Vec<usize>, Vec<usize>)>,
    format: Format<'core>,
    width: usize,
    height: usize,
}

impl<'core> MotionMask<'core> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        clip: Node<'core>,
        ttype: Option<i64>,
        mtql: Option<i64>,
        mthl: Option<i64>,
        mtqc: Option<i64>,
        mthc: Option<i64>,
        nt: Option<i64>,
        minthresh: Option<i64>,
        maxthresh: Option<i64>,
        cstr: Option<i64>,
    ) -> Result<Self> {
        let ttype = ttype.map_or(Ok(ThreshType::EightCompensated), ThreshType::try_from)?;
        let mtq_l = mtql.map_or(Ok(-1), i32::try_from)?;
        let mth_l = mthl.map_or(Ok(-1), i32::try_from)?;
        let mtq_c = mtqc.map_or(Ok(-1), i32::try_from)?;
        let mth_c = mthc.map_or(Ok(-1), i32::try_from)?;
        let nt = nt.map_or(Ok(2), i32::try_from)?;
        let minthresh = minthresh.map_or(Ok(4), i32::try_from)?;
        let maxthresh = maxthresh.map_or(Ok(75), i32::try_from)?;
        let cstr = cstr.map_or(Ok(4), i32::try_from)?;

        for (name, val) in [
            ("mtql", mtq_l),
            ("mthl", mth_l),
            ("mtqc", mtq_c),
            ("mthc", mth_c),
        ] {
            if !(-1..=255).contains(&val) {
                bail!("MotionMask: {name} must be between -1 and 255 inclusive");
            }
        }
        if !(0..=255).contains(&minthresh) {
            bail!("MotionMask: minthresh must be between 0 and 255 inclusive");
        }
        if !(0..=255).contains(&maxthresh) {
            bail!("MotionMask: maxthresh must be between 0 and 255 inclusive");
        }

        let info = clip.info();
        let Property::Constant(resolution) = info.resolution else {
            bail!("MotionMask: variable resolution input clips are not supported");
        };
        let Property::Constant(format) = info.format else {
            bail!("MotionMask: variable format input clips are not supported");
        };
        if format.sample_type() != SampleType::Integer || format.bits_per_sample() != 8 {
            bail!("MotionMask: input clip must be 8-bit integer format");
        }
        if ![ColorFamily::YUV, ColorFamily::Gray].contains(&format.color_family())
            || format.sub_sampling_w() > 1
            || format.sub_sampling_h() > 1
        {
            bail!("MotionMask: input clip must be GRAY8, 420, 422, or 444");
        }

        let offsets = (0..format.plane_count())
            .map(|plane| {
                let width = resolution.width >> if plane > 0 { format.sub_sampling_w() } else { 0 };
                mirror_offsets(width)
            })
            .collect();

        Ok(Self {
            clip,
            ttype,
            mtq_l,
            mth_l,
            mtq_c,
            mth_c,
            cstr,
            mlut: motion_lut(nt, minthresh, maxthresh),
            offsets,
            format,
            width: resolution.width,
            height: resolution.height,
        })
    }
}

/// Local contrast thresholds for one plane, with the constant overrides
/// applied. When both overrides are set the neighborhood math is skipped
/// entirely; a single override rewrites just its half after the kernel
/// has run. Both forms fill identical bytes for the halves involved.
#[allow(clippy::too_many_arguments)]
fn thresh_planes(
    src: &[u8],
    pitch: usize,
    width: usize,
    height: usize,
    ttype: ThreshType,
    hshift: i32,
    vshift: i32,
    offp: &[usize],
    offn: &[usize],
    mtq: i32,
    mth: i32,
) -> MaskPair {
    let mut dst = MaskPair::new(width * height);
    if mtq > -1 && mth > -1 {
        dst.q.fill(mtq as u8);
        dst.h.fill(mth as u8);
        return dst;
    }

    thresh_mask_plane(src, pitch, width, height, ttype, hshift, vshift, offp, offn, &mut dst);

    if mtq > -1 {
        dst.q.fill(mtq as u8);
    } else if mth > -1 {
        dst.h.fill(mth as u8);
    }
    dst
}

/// Combines one plane of three consecutive same-parity frames into the
/// binary motion plane: the two adjacent pairs and the outer pair are
/// compared through their thresholds, the outer mask is ANDed with both
/// pair masks on both halves, and the result collapses through the
/// neighborhood bridge.
#[allow(clippy::too_many_arguments)]
fn compose_motion_plane(
    planes: [&[u8]; 3],
    thresh: [&MaskPair; 3],
    pitch: usize,
    width: usize,
    height: usize,
    mlut: &[u8; 256],
    cstr: i32,
    offp: &[usize],
    offn: &[usize],
    dst: &mut [u8],
    dst_pitch: usize,
) {
    let len = width * height;
    let mut m01 = MaskPair::new(len);
    let mut m12 = MaskPair::new(len);
    let mut m02 = MaskPair::new(len);
    motion_mask_plane(
        planes[0], thresh[0], planes[1], thresh[1], pitch, width, height, mlut, &mut m01,
    );
    motion_mask_plane(
        planes[1], thresh[1], planes[2], thresh[2], pitch, width, height, mlut, &mut m12,
    );
    motion_mask_plane(
        planes[0], thresh[0], planes[2], thresh[2], pitch, width, height, mlut, &mut m02,
    );
    and_masks(&m01, &m12, &mut m02);
    combine_masks_plane(&m02, width, height, cstr, offp, offn, dst, dst_pitch);
}

impl<'core> Filter<'core> for MotionMask<'core> {
    fn video_info(
        &self,
        _api: vapoursynth::prelude::API,
        _core: vapoursynth::core::CoreRef<'core>,
    ) -> Vec<vapoursynth::video_info::VideoInfo<'core>> {
        vec![self.clip.info()]
    }

    fn get_frame_initial(
        &self,
        _api: vapoursynth::prelude::API,
        _core: vapoursynth::core::CoreRef<'core>,
        context: vapoursynth::plugins::FrameContext,
        n: usize,
    ) -> std::result::Result<Option<vapoursynth::prelude::FrameRef<'core>>, anyhow::Error> {
        let num_frames = self.clip.info().num_frames;
        for i in 0..3 {
            if n + i < num_frames {
                self.clip.request_frame_filter(context, n + i);
            }
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
        let num_frames = self.clip.info().num_frames;
        let src: Vec<FrameRef> = (0..3)
            .map(|i| {
                self.clip
                    .get_frame_filter(context, min(n + i, num_frames - 1))
                    .expect("MotionMask: called get_frame_filter before request_frame_filter")
            })
            .collect();

        // SAFETY: every plane is fully written below
        let mut dest = unsafe {
            let mut dest = FrameRefMut::new_uninitialized(
                core,
                None,
                self.format,
                Resolution {
                    width: self.width,
                    height: self.height,
                },
            );
            for plane in 0..self.format.plane_count() {
                plane_view_mut(&mut dest, plane)
                    .expect("MotionMask: plane should exist but does not")
                    .fill(0);
            }
            dest
        };

        for plane in 0..self.format.plane_count() {
            let width = src[0].width(plane);
            let height = src[0].height(plane);
            let pitch = src[0].stride(plane);
            let planes: Vec<&[u8]> = src
                .iter()
                .map(|frame| plane_view(frame, plane))
                .collect::<Result<_>>()?;

            let (mtq, mth) = if plane == 0 {
                (self.mtq_l, self.mth_l)
            } else {
                (self.mtq_c, self.mth_c)
            };
            let hshift = if plane > 0 {
                i32::from(self.format.sub_sampling_w())
            } else {
                0
            };
            let vshift = if plane > 0 {
                1 << self.format.sub_sampling_h()
            } else {
                1
            };
            let (offp, offn) = &self.offsets[plane];
            let thresh: Vec<MaskPair> = planes
                .iter()
                .map(|data| {
                    thresh_planes(
                        data, pitch, width, height, self.ttype, hshift, vshift, offp, offn, mtq,
                        mth,
                    )
                })
                .collect();

            let dst_pitch = dest.stride(plane);
            compose_motion_plane(
                [planes[0], planes[1], planes[2]],
                [&thresh[0], &thresh[1], &thresh[2]],
                pitch,
                width,
                height,
                &self.mlut,
                self.cstr,
                offp,
                offn,
                plane_view_mut(&mut dest, plane)?,
                dst_pitch,
            );
        }

        Ok(dest.into())
    }
}
