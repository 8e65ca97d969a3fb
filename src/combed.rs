
use crate::params::CombedMetric;

/// Per-pixel combing test for one plane, writing 0xFF into `cmk` for
/// combed pixels. `cmk` is tightly packed (pitch == width).
///
/// A negative `cthresh` marks every pixel, forcing the whole frame down
/// the motion path.
pub fn comb_mask_plane(
    src: &[u8],
    pitch: usize,
    width: usize,
    height: usize,
    cthresh: i32,
    metric: CombedMetric,
    cmk: &mut [u8],
) {
    if cthresh < 0 {
        cmk[..width * height].fill(255);
        return;
    }
    cmk[..width * height].fill(0);

    let s = |y: usize, x: usize| i32::from(src[y * pitch + x]);
    match metric {
        CombedMetric::Difference => {
            let cthresh6 = cthresh * 6;
            // Rows at the plane edges mirror their missing taps inward.
            for x in 0..width {
                let first = s(0, x) - s(1, x);
                if (first > cthresh || first < -cthresh)
                    && (s(2, x) + (s(0, x) << 2) + s(2, x) - 3 * (s(1, x) + s(1, x))).abs()
                        > cthresh6
                {
                    cmk[x] = 0xFF;
                }
            }
            for x in 0..width {
                let first = s(1, x) - s(0, x);
                let second = s(1, x) - s(2, x);
                if ((first > cthresh && second > cthresh)
                    || (first < -cthresh && second < -cthresh))
                    && (s(3, x) + (s(1, x) << 2) + s(3, x) - 3 * (s(0, x) + s(2, x))).abs()
                        > cthresh6
                {
                    cmk[width + x] = 0xFF;
                }
            }
            for y in 2..height - 2 {
                for x in 0..width {
                    let first = s(y, x) - s(y - 1, x);
                    let second = s(y, x) - s(y + 1, x);
                    if ((first > cthresh && second > cthresh)
                        || (first < -cthresh && second < -cthresh))
                        && (s(y - 2, x) + (s(y, x) << 2) + s(y + 2, x)
                            - 3 * (s(y - 1, x) + s(y + 1, x)))
                            .abs()
                            > cthresh6
                    {
                        cmk[y * width + x] = 0xFF;
                    }
                }
            }
            let y = height - 2;
            for x in 0..width {
                let first = s(y, x) - s(y - 1, x);
                let second = s(y, x) - s(y + 1, x);
                if ((first > cthresh && second > cthresh)
                    || (first < -cthresh && second < -cthresh))
                    && (s(y - 2, x) + (s(y, x) << 2) + s(y - 2, x)
                        - 3 * (s(y - 1, x) + s(y + 1, x)))
                        .abs()
                        > cthresh6
                {
                    cmk[y * width + x] = 0xFF;
                }
            }
            let y = height - 1;
            for x in 0..width {
                let first = s(y, x) - s(y - 1, x);
                if (first > cthresh || first < -cthresh)
                    && (s(y - 2, x) + (s(y, x) << 2) + s(y - 2, x)
                        - 3 * (s(y - 1, x) + s(y - 1, x)))
                        .abs()
                        > cthresh6
                {
                    cmk[y * width + x] = 0xFF;
                }
            }
        }
        CombedMetric::Product => {
            let cthreshsq = cthresh * cthresh;
            for x in 0..width {
                if (s(0, x) - s(1, x)) * (s(0, x) - s(1, x)) > cthreshsq {
                    cmk[x] = 0xFF;
                }
            }
            for y in 1..height - 1 {
                for x in 0..width {
                    if (s(y, x) - s(y - 1, x)) * (s(y, x) - s(y + 1, x)) > cthreshsq {
                        cmk[y * width + x] = 0xFF;
                    }
                }
            }
            let y = height - 1;
            for x in 0..width {
                if (s(y, x) - s(y - 1, x)) * (s(y, x) - s(y - 1, x)) > cthreshsq {
                    cmk[y * width + x] = 0xFF;
                }
            }
        }
    }
}

#[inline]
fn marked_with_neighbor(p: &[u8], pitch: usize, x: usize, y: usize) -> bool {
    p[y * pitch + x] == 0xFF
        && (p[y * pitch + x - 1] == 0xFF
            || p[y * pitch + x + 1] == 0xFF
            || p[(y - 1) * pitch + x - 1] == 0xFF
            || p[(y - 1) * pitch + x] == 0xFF
            || p[(y - 1) * pitch + x + 1] == 0xFF
            || p[(y + 1) * pitch + x - 1] == 0xFF
            || p[(y + 1) * pitch + x] == 0xFF
            || p[(y + 1) * pitch + x + 1] == 0xFF)
}

/// Folds combed chroma into the luma mask: a chroma pixel that is combed
/// together with one of its eight neighbors marks the band of luma rows
/// it covers, plus one extra row above it (odd chroma rows) or below it
/// (even chroma rows). All masks are tightly packed.
#[allow(clippy::too_many_arguments)]
pub fn fold_chroma_mask(
    luma: &mut [u8],
    luma_pitch: usize,
    u: &[u8],
    v: &[u8],
    chroma_pitch: usize,
    cwidth: usize,
    cheight: usize,
    sub_w: u8,
    sub_h: u8,
) {
    let band = 1usize << sub_h;
    let span = 1usize << sub_w;
    for y in 1..cheight - 1 {
        for x in 1..cwidth - 1 {
            if !marked_with_neighbor(u, chroma_pitch, x, y)
                && !marked_with_neighbor(v, chroma_pitch, x, y)
            {
                continue;
            }
            let yl = y << sub_h;
            let xl = x << sub_w;
            let extra = if y & 1 == 1 { yl - 1 } else { yl + band };
            for row in (yl..yl + band).chain(std::iter::once(extra)) {
                luma[row * luma_pitch + xl..row * luma_pitch + xl + span].fill(0xFF);
            }
        }
    }
}

/// Counts combed pixels (three vertically consecutive marks) into a grid
/// of four-way overlapping blocks and returns the largest block count.
#[allow(clippy::too_many_arguments)]
pub fn max_block_count(
    cmk: &[u8],
    pitch: usize,
    width: usize,
    height: usize,
    xhalf: usize,
    yhalf: usize,
    xshift: u32,
    yshift: u32,
) -> i32 {
    let x_blocks = ((width + xhalf) >> xshift) + 1;
    let x_blocks4 = x_blocks * 4;
    let y_blocks = ((height + yhalf) >> yshift) + 1;
    let mut counts = vec![0i32; x_blocks4 * y_blocks];

    let widtha = (width >> (xshift - 1)) << (xshift - 1);
    let mut heighta = (height >> (yshift - 1)) << (yshift - 1);
    if heighta == height {
        heighta = height - yhalf;
    }
    // Blocks taller than the plane collapse the three row walks onto one
    // clamped range: the head walk stops at the last countable row and
    // the tail walk starts no earlier, so each row is visited exactly
    // once. For block sizes that fit the plane both bounds reduce to
    // `yhalf` and `heighta` and the walks match the unclamped layout.
    let head_stop = yhalf.min(height - 1);
    let tail_start = heighta.max(head_stop);

    let marked = |y: usize, x: usize| {
        cmk[(y - 1) * pitch + x] == 0xFF
            && cmk[y * pitch + x] == 0xFF
            && cmk[(y + 1) * pitch + x] == 0xFF
    };
    let bump = |counts: &mut Vec<i32>, y: usize, x: usize, sum: i32| {
        let temp1 = (y >> yshift) * x_blocks4;
        let temp2 = ((y + yhalf) >> yshift) * x_blocks4;
        let box1 = (x >> xshift) << 2;
        let box2 = ((x + xhalf) >> xshift) << 2;
        counts[temp1 + box1] += sum;
        counts[temp1 + box2 + 1] += sum;
        counts[temp2 + box1 + 2] += sum;
        counts[temp2 + box2 + 3] += sum;
    };

    for y in 1..head_stop {
        for x in 0..width {
            if marked(y, x) {
                bump(&mut counts, y, x, 1);
            }
        }
    }
    let mut y = yhalf;
    while y < heighta {
        let mut x = 0;
        while x < widtha {
            let mut sum = 0;
            for u in 0..yhalf {
                for v in 0..xhalf {
                    if marked(y + u, x + v) {
                        sum += 1;
                    }
                }
            }
            if sum > 0 {
                bump(&mut counts, y, x, sum);
            }
            x += xhalf;
        }
        for x in widtha..width {
            let mut sum = 0;
            for u in 0..yhalf {
                if marked(y + u, x) {
                    sum += 1;
                }
            }
            if sum > 0 {
                bump(&mut counts, y, x, sum);
            }
        }
        y += yhalf;
    }
    for y in tail_start..height - 1 {
        for x in 0..width {
            if marked(y, x) {
                bump(&mut counts, y, x, 1);
            }
        }
    }

    counts.into_iter().max().unwrap_or(0)
}
