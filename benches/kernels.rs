use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro128StarStar;
use vapoursynth_zootdeint::{
    combed::{comb_mask_plane, max_block_count},
    lut::{mirror_offsets, motion_lut},
    mask::motion_mask_plane,
    params::{CombedMetric, ThreshType},
    thresh::{MaskPair, thresh_mask_plane},
};

const WIDTH: usize = 640;
const HEIGHT: usize = 240;

fn random_plane(rng: &mut Xoshiro128StarStar) -> Vec<u8> {
    let mut plane = vec![0u8; WIDTH * HEIGHT];
    for p in plane.iter_mut() {
        *p = rng.random();
    }
    plane
}

pub fn bench_thresh_mask(c: &mut Criterion) {
    for (name, ttype) in [
        ("thresh_mask 8-neighbor compensated", ThreshType::EightCompensated),
        ("thresh_mask 4-neighbor range", ThreshType::FourRange),
    ] {
        c.bench_function(name, |b| {
            let mut rng = Xoshiro128StarStar::from_seed(*b"deadbeeflolcakes");
            let src = random_plane(&mut rng);
            let (offp, offn) = mirror_offsets(WIDTH);
            let mut dst = MaskPair::new(WIDTH * HEIGHT);

            b.iter(|| {
                thresh_mask_plane(
                    black_box(&src),
                    WIDTH,
                    WIDTH,
                    HEIGHT,
                    ttype,
                    0,
                    1,
                    &offp,
                    &offn,
                    black_box(&mut dst),
                );
            })
        });
    }
}

pub fn bench_motion_mask(c: &mut Criterion) {
    c.bench_function("motion_mask", |b| {
        let mut rng = Xoshiro128StarStar::from_seed(*b"deadbeeflolcakes");
        let src1 = random_plane(&mut rng);
        let src2 = random_plane(&mut rng);
        let (offp, offn) = mirror_offsets(WIDTH);
        let mlut = motion_lut(2, 4, 75);
        let mut msk1 = MaskPair::new(WIDTH * HEIGHT);
        let mut msk2 = MaskPair::new(WIDTH * HEIGHT);
        thresh_mask_plane(
            &src1,
            WIDTH,
            WIDTH,
            HEIGHT,
            ThreshType::EightCompensated,
            0,
            1,
            &offp,
            &offn,
            &mut msk1,
        );
        thresh_mask_plane(
            &src2,
            WIDTH,
            WIDTH,
            HEIGHT,
            ThreshType::EightCompensated,
            0,
            1,
            &offp,
            &offn,
            &mut msk2,
        );
        let mut dst = MaskPair::new(WIDTH * HEIGHT);

        b.iter(|| {
            motion_mask_plane(
                black_box(&src1),
                &msk1,
                black_box(&src2),
                &msk2,
                WIDTH,
                WIDTH,
                HEIGHT,
                &mlut,
                black_box(&mut dst),
            );
        })
    });
}

pub fn bench_combing_detector(c: &mut Criterion) {
    c.bench_function("comb_mask + block count", |b| {
        let mut rng = Xoshiro128StarStar::from_seed(*b"deadbeeflolcakes");
        let src = random_plane(&mut rng);
        let mut cmk = vec![0u8; WIDTH * HEIGHT];

        b.iter(|| {
            comb_mask_plane(
                black_box(&src),
                WIDTH,
                WIDTH,
                HEIGHT,
                6,
                CombedMetric::Difference,
                black_box(&mut cmk),
            );
            max_block_count(black_box(&cmk), WIDTH, WIDTH, HEIGHT, 8, 8, 4, 4)
        })
    });
}

criterion_group!(
    benches,
    bench_thresh_mask,
    bench_motion_mask,
    bench_combing_detector
);
criterion_main!(benches);
