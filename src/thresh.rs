#[cfg(test)]
mod tests;

use crate::params::ThreshType;

/// The two per-pixel threshold planes produced by the local contrast
/// estimator: a "quarter" plane (contrast / 4) and a "half" plane
/// (contrast / 2). Both are tightly packed (pitch == width). The motion
/// mask stages reuse the same shape for their {0, 255} planes.
#[derive(Debug, Clone)]
pub struct MaskPair {
    pub q: Vec<u8>,
    pub h: Vec<u8>,
}

impl MaskPair {
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            q: vec![0; len],
            h: vec![0; len],
        }
    }
}

#[inline]
fn minmax(v: u8, lo: &mut i32, hi: &mut i32) {
    let v = i32::from(v);
    if v < *lo {
        *lo = v;
    }
    if v > *hi {
        *hi = v;
    }
}

/// Rows used for the vertical taps, mirrored inward at the plane edges.
#[inline]
fn mirror_rows(y: usize, height: usize) -> (usize, usize) {
    let above = if y == 0 { 1 } else { y - 1 };
    let below = if y == height - 1 { height - 2 } else { y + 1 };
    (above, below)
}

/// Fills `dst` with the per-pixel local contrast thresholds of one plane.
///
/// `hshift`/`vshift` compensate chroma subsampling on the compensated
/// variants: the horizontal differences are scaled down by `hshift`
/// (0 for luma) and the vertical ones by `vshift` (1 for luma, doubled
/// per level of vertical subsampling). `offp`/`offn` are the mirrored
/// horizontal neighbor indices.
#[allow(clippy::too_many_arguments)]
pub fn thresh_mask_plane(
    src: &[u8],
    src_pitch: usize,
    width: usize,
    height: usize,
    ttype: ThreshType,
    hshift: i32,
    vshift: i32,
    offp: &[usize],
    offn: &[usize],
    dst: &mut MaskPair,
) {
    match ttype {
        ThreshType::FourCompensated => {
            four_compensated(src, src_pitch, width, height, hshift, vshift, offp, offn, dst);
        }
        ThreshType::EightCompensated => {
            eight_compensated(src, src_pitch, width, height, hshift, vshift, offp, offn, dst);
        }
        ThreshType::Four => four_plain(src, src_pitch, width, height, offp, offn, dst),
        ThreshType::Eight => eight_plain(src, src_pitch, width, height, offp, offn, dst),
        ThreshType::FourRange => four_range(src, src_pitch, width, height, offp, offn, dst),
        ThreshType::EightRange => eight_range(src, src_pitch, width, height, offp, offn, dst),
    }
}

#[inline]
fn emit(dst: &mut MaskPair, i: usize, at: i32) {
    dst.q[i] = ((at + 2) >> 2) as u8;
    dst.h[i] = ((at + 1) >> 1) as u8;
}

#[allow(clippy::too_many_arguments)]
fn four_compensated(
    src: &[u8],
    src_pitch: usize,
    width: usize,
    height: usize,
    hshift: i32,
    vshift: i32,
    offp: &[usize],
    offn: &[usize],
    dst: &mut MaskPair,
) {
    let vbias = 1 << (vshift - 1);
    for y in 0..height {
        let (above, below) = mirror_rows(y, height);
        let srow = &src[y * src_pitch..];
        let prow = &src[above * src_pitch..];
        let nrow = &src[below * src_pitch..];
        for x in 0..width {
            let (mut min0, mut max0) = (256, -1);
            let (mut min1, mut max1) = (256, -1);
            minmax(prow[x], &mut min0, &mut max0);
            minmax(srow[offp[x]], &mut min1, &mut max1);
            minmax(srow[offn[x]], &mut min1, &mut max1);
            minmax(nrow[x], &mut min0, &mut max0);
            let c = i32::from(srow[x]);
            let atv = std::cmp::max(
                ((c - min0).abs() + vbias) >> vshift,
                ((c - max0).abs() + vbias) >> vshift,
            );
            let ath = std::cmp::max(
                ((c - min1).abs() + hshift) >> hshift,
                ((c - max1).abs() + hshift) >> hshift,
            );
            emit(dst, y * width + x, std::cmp::max(atv, ath));
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn eight_compensated(
    src: &[u8],
    src_pitch: usize,
    width: usize,
    height: usize,
    hshift: i32,
    vshift: i32,
    offp: &[usize],
    offn: &[usize],
    dst: &mut MaskPair,
) {
    let vbias = 1 << (vshift - 1);
    for y in 0..height {
        let (above, below) = mirror_rows(y, height);
        let srow = &src[y * src_pitch..];
        let prow = &src[above * src_pitch..];
        let nrow = &src[below * src_pitch..];
        for x in 0..width {
            let (mut min0, mut max0) = (256, -1);
            let (mut min1, mut max1) = (256, -1);
            minmax(prow[offp[x]], &mut min0, &mut max0);
            minmax(prow[x], &mut min0, &mut max0);
            minmax(prow[offn[x]], &mut min0, &mut max0);
            minmax(srow[offp[x]], &mut min1, &mut max1);
            minmax(srow[offn[x]], &mut min1, &mut max1);
            minmax(nrow[offp[x]], &mut min0, &mut max0);
            minmax(nrow[x], &mut min0, &mut max0);
            minmax(nrow[offn[x]], &mut min0, &mut max0);
            let c = i32::from(srow[x]);
            let atv = std::cmp::max(
                ((c - min0).abs() + vbias) >> vshift,
                ((c - max0).abs() + vbias) >> vshift,
            );
            let ath = std::cmp::max(
                ((c - min1).abs() + hshift) >> hshift,
                ((c - max1).abs() + hshift) >> hshift,
            );
            emit(dst, y * width + x, std::cmp::max(atv, ath));
        }
    }
}

fn four_plain(
    src: &[u8],
    src_pitch: usize,
    width: usize,
    height: usize,
    offp: &[usize],
    offn: &[usize],
    dst: &mut MaskPair,
) {
    for y in 0..height {
        let (above, below) = mirror_rows(y, height);
        let srow = &src[y * src_pitch..];
        let prow = &src[above * src_pitch..];
        let nrow = &src[below * src_pitch..];
        for x in 0..width {
            let (mut min0, mut max0) = (256, -1);
            minmax(prow[x], &mut min0, &mut max0);
            minmax(srow[offp[x]], &mut min0, &mut max0);
            minmax(srow[offn[x]], &mut min0, &mut max0);
            minmax(nrow[x], &mut min0, &mut max0);
            let c = i32::from(srow[x]);
            let at = std::cmp::max((c - min0).abs(), (c - max0).abs());
            emit(dst, y * width + x, at);
        }
    }
}

fn eight_plain(
    src: &[u8],
    src_pitch: usize,
    width: usize,
    height: usize,
    offp: &[usize],
    offn: &[usize],
    dst: &mut MaskPair,
) {
    for y in 0..height {
        let (above, below) = mirror_rows(y, height);
        let srow = &src[y * src_pitch..];
        let prow = &src[above * src_pitch..];
        let nrow = &src[below * src_pitch..];
        for x in 0..width {
            let (mut min0, mut max0) = (256, -1);
            minmax(prow[offp[x]], &mut min0, &mut max0);
            minmax(prow[x], &mut min0, &mut max0);
            minmax(prow[offn[x]], &mut min0, &mut max0);
            minmax(srow[offp[x]], &mut min0, &mut max0);
            minmax(srow[offn[x]], &mut min0, &mut max0);
            minmax(nrow[offp[x]], &mut min0, &mut max0);
            minmax(nrow[x], &mut min0, &mut max0);
            minmax(nrow[offn[x]], &mut min0, &mut max0);
            let c = i32::from(srow[x]);
            let at = std::cmp::max((c - min0).abs(), (c - max0).abs());
            emit(dst, y * width + x, at);
        }
    }
}

fn four_range(
    src: &[u8],
    src_pitch: usize,
    width: usize,
    height: usize,
    offp: &[usize],
    offn: &[usize],
    dst: &mut MaskPair,
) {
    for y in 0..height {
        let (above, below) = mirror_rows(y, height);
        let srow = &src[y * src_pitch..];
        let prow = &src[above * src_pitch..];
        let nrow = &src[below * src_pitch..];
        for x in 0..width {
            let (mut min0, mut max0) = (256, -1);
            minmax(prow[x], &mut min0, &mut max0);
            minmax(srow[offp[x]], &mut min0, &mut max0);
            minmax(srow[x], &mut min0, &mut max0);
            minmax(srow[offn[x]], &mut min0, &mut max0);
            minmax(nrow[x], &mut min0, &mut max0);
            emit(dst, y * width + x, max0 - min0);
        }
    }
}

fn eight_range(
    src: &[u8],
    src_pitch: usize,
    width: usize,
    height: usize,
    offp: &[usize],
    offn: &[usize],
    dst: &mut MaskPair,
) {
    for y in 0..height {
        let (above, below) = mirror_rows(y, height);
        let srow = &src[y * src_pitch..];
        let prow = &src[above * src_pitch..];
        let nrow = &src[below * src_pitch..];
        for x in 0..width {
            let (mut min0, mut max0) = (256, -1);
            minmax(prow[offp[x]], &mut min0, &mut max0);
            minmax(prow[x], &mut min0, &mut max0);
            minmax(prow[offn[x]], &mut min0, &mut max0);
            minmax(srow[offp[x]], &mut min0, &mut max0);
            minmax(srow[x], &mut min0, &mut max0);
            minmax(srow[offn[x]], &mut min0, &mut max0);
            minmax(nrow[offp[x]], &mut min0, &mut max0);
            minmax(nrow[x], &mut min0, &mut max0);
            minmax(nrow[offn[x]], &mut min0, &mut max0);
            emit(dst, y * width + x, max0 - min0);
        }
    }
}
