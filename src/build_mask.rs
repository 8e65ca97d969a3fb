
use anyhow::{Result, bail};
use smallvec::SmallVec;
use vapoursynth::{
    format::Format,
    frame::{FrameRef, FrameRefMut},
    node::Node,
    plugins::Filter,
    prelude::Property,
    video_info::{Framerate, Resolution},
};

use crate::{
    lut::{KEEP, SPATIAL, VERDICT_LUT16, pattern_lut, position_weights},
    params::{Field, MAX_LENGTH, MotionType, OutputMode},
    util::{plane_view, plane_view_mut},
};

/// Inline storage size for the window `SmallVec`s: the smallest array length
/// supported by `smallvec::Array` that is at least the deepest per-parity
/// window (`MAX_LENGTH - 2` frames at the maximum length).
const SMALLVEC_CAP: usize = 64;

/// Inclusive window bounds into the two mask streams, as produced by the
/// window geometry for one output field.
#[derive(Debug, PartialEq, Eq)]
struct Window {
    tstart: isize,
    tstop: isize,
    bstart: isize,
    bstop: isize,
}

/// Temporal window geometry around source index `n`: the stream of the
/// output parity spans `length` positions (minus the trailing two), the
/// opposite stream one fewer, shifted by the field order.
fn window_bounds(n: isize, fieldt: Field, order: Field, length: isize) -> Window {
    let half = (length - 1) / 2;
    let shorter = (length - 2) / 2;
    if fieldt == Field::Top {
        let bn = if order == Field::Top { n - 1 } else { n };
        Window {
            tstart: n - half,
            tstop: n + half - 2,
            bstart: bn - shorter,
            bstop: bn + 1 + shorter - 2,
        }
    } else {
        let tn = if order == Field::Bottom { n - 1 } else { n };
        Window {
            tstart: tn - shorter,
            tstop: tn + 1 + shorter - 2,
            bstart: n - half,
            bstop: n + half - 2,
        }
    }
}

/// Matches motion patterns over a sliding temporal window of the two
/// per-parity mask streams and emits one synthesis verdict byte per
/// pixel. Kept-parity lines are pre-filled with the identity verdict.
pub struct BuildMotionMask<'core> {
    /// Top-parity mask stream
    top: Node<'core>,
    /// Bottom-parity mask stream
    bottom: Node<'core>,
    order: Field,
    /// Parity reconstructed in same-rate mode
    field: Field,
    mode: OutputMode,
    /// Temporal window length
    length: usize,

    // Internal fields
    gvlut: [u8; MAX_LENGTH],
    vlut: &'static [u8; 64],
    format: Format<'core>,
    width: usize,
    /// Output frame height (twice the field height)
    height: usize,
}

impl<'core> BuildMotionMask<'core> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        mtop: Node<'core>,
        mbot: Node<'core>,
        order: i64,
        field: Option<i64>,
        mode: Option<i64>,
        length: Option<i64>,
        mtype: Option<i64>,
    ) -> Result<Self> {
        let order = Field::try_from(order)?;
        let field = field.map_or(Ok(order), Field::try_from)?;
        let mode = mode.map_or(Ok(OutputMode::SameRate), OutputMode::try_from)?;
        let length = length.map_or(Ok(10), usize::try_from)?;
        let mtype = mtype.map_or(Ok(MotionType::Pair), MotionType::try_from)?;

        if !(6..=MAX_LENGTH).contains(&length) {
            bail!("BuildMM: length must be between 6 and 60 inclusive");
        }

        let info = mtop.info();
        let Property::Constant(resolution) = info.resolution else {
            bail!("BuildMM: variable resolution input clips are not supported");
        };
        let Property::Constant(format) = info.format else {
            bail!("BuildMM: variable format input clips are not supported");
        };
        if format.bits_per_sample() != 8 {
            bail!("BuildMM: mask clips must be 8-bit");
        }
        let bot_info = mbot.info();
        match (bot_info.format, bot_info.resolution) {
            (Property::Constant(bot_format), Property::Constant(bot_resolution))
                if bot_format == format
                    && bot_resolution.width == resolution.width
                    && bot_resolution.height == resolution.height => {}
            _ => bail!("BuildMM: the two mask clips must share format and dimensions"),
        }
        if bot_info.num_frames != info.num_frames {
            bail!("BuildMM: the two mask clips must have the same number of frames");
        }

        Ok(Self {
            top: mtop,
            bottom: mbot,
            order,
            field,
            mode,
            length,
            gvlut: position_weights(length),
            vlut: pattern_lut(mtype),
            format,
            width: resolution.width,
            height: resolution.height * 2,
        })
    }

    /// Maps an output frame index to (source index, output field parity).
    fn output_field(&self, n: usize) -> (usize, Field) {
        match self.mode {
            OutputMode::SameRate => (n, self.field),
            OutputMode::DoubleRate => {
                let parity = if n & 1 == 1 {
                    self.order.opposite()
                } else {
                    self.order
                };
                (n / 2, parity)
            }
        }
    }

    fn window(&self, n: isize, fieldt: Field) -> Window {
        window_bounds(n, fieldt, self.order, self.length as isize)
    }
}

impl<'core> Filter<'core> for BuildMotionMask<'core> {
    fn video_info(
        &self,
        _api: vapoursynth::prelude::API,
        _core: vapoursynth::core::CoreRef<'core>,
    ) -> Vec<vapoursynth::video_info::VideoInfo<'core>> {
        let mut info = self.top.info();
        info.resolution = Property::Constant(Resolution {
            width: self.width,
            height: self.height,
        });
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
        let (n, fieldt) = self.output_field(n);
        let num_frames = self.top.info().num_frames as isize;
        let window = self.window(n as isize, fieldt);

        for i in window.tstart..=window.tstop {
            if i >= 0 && i < num_frames - 2 {
                self.top.request_frame_filter(context, i as usize);
            }
        }
        for i in window.bstart..=window.bstop {
            if i >= 0 && i < num_frames - 2 {
                self.bottom.request_frame_filter(context, i as usize);
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
        let (n, fieldt) = self.output_field(n);
        let num_frames = self.top.info().num_frames as isize;
        let window = self.window(n as isize, fieldt);

        // Out-of-range slots stay None and read as zero-filled frames
        // (always motion). The last two mask frames look past the end of
        // the field stream and count as out of range too.
        let fetch = |node: &Node<'core>, start: isize, stop: isize| {
            (start..=stop)
                .map(|i| {
                    if i < 0 || i >= num_frames - 2 {
                        None
                    } else {
                        Some(node.get_frame_filter(context, i as usize).expect(
                            "BuildMM: called get_frame_filter before request_frame_filter",
                        ))
                    }
                })
                .collect::<SmallVec<[Option<FrameRef<'core>>; SMALLVEC_CAP]>>()
        };
        let srct = fetch(&self.top, window.tstart, window.tstop);
        let srcb = fetch(&self.bottom, window.bstart, window.bstop);
        let (csrc, osrc) = match fieldt {
            Field::Top => (&srcb, &srct),
            Field::Bottom => (&srct, &srcb),
        };

        let base = self.order as usize * 8 + fieldt as usize * 4;
        let mut tmmlutf = [0u8; 64];
        for (entry, &category) in tmmlutf.iter_mut().zip(self.vlut.iter()) {
            *entry = VERDICT_LUT16[base + usize::from(category)];
        }

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
                    .expect("BuildMM: plane should exist but does not")
                    .fill(0);
            }
            dest
        };

        for plane in 0..self.format.plane_count() {
            let width = dest.width(plane);
            let height = dest.height(plane);
            let dst_pitch = dest.stride(plane);
            let zero = vec![0u8; width * (height / 2)];

            let mut cplanes: SmallVec<[(&[u8], usize); SMALLVEC_CAP]> = SmallVec::new();
            for frame in csrc {
                cplanes.push(match frame {
                    Some(frame) => (plane_view(frame, plane)?, frame.stride(plane)),
                    None => (zero.as_slice(), width),
                });
            }
            let mut oplanes: SmallVec<[(&[u8], usize); SMALLVEC_CAP]> = SmallVec::new();
            for frame in osrc {
                oplanes.push(match frame {
                    Some(frame) => (plane_view(frame, plane)?, frame.stride(plane)),
                    None => (zero.as_slice(), width),
                });
            }

            match_patterns_plane(
                &cplanes,
                &oplanes,
                self.length,
                fieldt,
                &self.gvlut,
                self.vlut,
                &tmmlutf,
                plane_view_mut(&mut dest, plane)?,
                dst_pitch,
                width,
                height,
            );
        }

        Ok(dest.into())
    }
}

/// Classifies every missing-line pixel of one plane.
///
/// `csrc` carries the window of the output field's own parity, `osrc`
/// the opposite parity; each slot is a (plane, pitch) view of one mask
/// frame at field height. The interleaved per-column vectors are packed
/// into a 6-bit state whose category (via the pattern validity table)
/// selects the verdict.
#[allow(clippy::too_many_arguments)]
fn match_patterns_plane(
    csrc: &[(&[u8], usize)],
    osrc: &[(&[u8], usize)],
    length: usize,
    fieldt: Field,
    gvlut: &[u8; MAX_LENGTH],
    vlut: &[u8; 64],
    tmmlutf: &[u8; 64],
    dst: &mut [u8],
    dst_pitch: usize,
    width: usize,
    height: usize,
) {
    let ccount = csrc.len();
    let ct = ccount / 2;
    let offo = if length & 1 == 1 { 0 } else { 1 };
    let offc = 1 - offo;
    let run = length - 4;

    let mut y = match fieldt {
        Field::Top => 0,
        Field::Bottom => 1,
    };
    while y < height {
        dst[y * dst_pitch..y * dst_pitch + width].fill(KEEP);
        y += 2;
    }

    let mut crow = 0;
    let (mut orow_above, mut orow_below) = match fieldt {
        Field::Top => (0, 1),
        Field::Bottom => (0, 0),
    };
    let below_stop = height.saturating_sub(3);
    let mut plut = [[0u8; 2 * MAX_LENGTH - 1]; 2];

    let mut y = fieldt as usize;
    while y < height {
        let drow = y * dst_pitch;
        for x in 0..width {
            let center = |slot: usize| {
                let (data, pitch) = csrc[slot];
                data[crow * pitch + x]
            };
            if center(ct - 2) == 0 && center(ct) == 0 && center(ct + 1) == 0 {
                dst[drow + x] = SPATIAL;
                continue;
            }

            for (j, &(data, pitch)) in csrc.iter().enumerate() {
                let v = data[crow * pitch + x];
                plut[0][j * 2 + offc] = v;
                plut[1][j * 2 + offc] = v;
            }
            for (j, &(data, pitch)) in osrc.iter().enumerate() {
                plut[0][j * 2 + offo] = data[orow_above * pitch + x];
                plut[1][j * 2 + offo] = data[orow_below * pitch + x];
            }

            let mut val = 0usize;
            for i in 0..length {
                if plut[0][i..i + run].iter().all(|&v| v != 0) {
                    val |= usize::from(gvlut[i]) << 3;
                }
                if plut[1][i..i + run].iter().all(|&v| v != 0) {
                    val |= usize::from(gvlut[i]);
                }
                if vlut[val] == 2 {
                    break;
                }
            }
            dst[drow + x] = tmmlutf[val];
        }
        crow += 1;
        if y != 0 {
            orow_above += 1;
        }
        if y != below_stop {
            orow_below += 1;
        }
        y += 2;
    }
}
