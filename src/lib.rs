use anyhow::Error;
use vapoursynth::{
    api::API,
    core::CoreRef,
    export_vapoursynth_plugin, make_filter_function,
    map::Map,
    node::Node,
    plugins::{Filter, FilterArgument, Metadata},
};

pub mod build_mask;
pub mod combed;
pub mod deint;
pub mod lut;
pub mod mask;
pub mod motion_mask;
pub mod params;
pub mod thresh;
pub mod util;

use crate::{build_mask::BuildMotionMask, deint::TDeintMod, motion_mask::MotionMask};

pub const PLUGIN_IDENTIFIER: &str = "com.soichiro.zootdeint";
pub const PLUGIN_NAME: &str = "ZooTDeint";

make_filter_function! {
    MotionMaskFunction, "MotionMask"

    fn create_motion_mask<'core>(
        _api: API,
        _core: CoreRef<'core>,
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
    ) -> Result<Option<Box<dyn Filter<'core> + 'core>>, Error> {
        Ok(Some(Box::new(MotionMask::new(
            clip, ttype, mtql, mthl, mtqc, mthc, nt, minthresh, maxthresh, cstr,
        )?)))
    }
}

make_filter_function! {
    BuildMMFunction, "BuildMM"

    fn create_build_mm<'core>(
        _api: API,
        _core: CoreRef<'core>,
        mtop: Node<'core>,
        mbot: Node<'core>,
        order: i64,
        field: Option<i64>,
        mode: Option<i64>,
        length: Option<i64>,
        mtype: Option<i64>,
    ) -> Result<Option<Box<dyn Filter<'core> + 'core>>, Error> {
        Ok(Some(Box::new(BuildMotionMask::new(
            mtop, mbot, order, field, mode, length, mtype,
        )?)))
    }
}

make_filter_function! {
    TDeintModFunction, "TDeintMod"

    fn create_tdeintmod<'core>(
        _api: API,
        _core: CoreRef<'core>,
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
    ) -> Result<Option<Box<dyn Filter<'core> + 'core>>, Error> {
        Ok(Some(Box::new(TDeintMod::new(
            clip, mask, mode, clip2, edeint, full, cthresh, blockx, blocky, chroma, mi, metric,
        )?)))
    }
}

export_vapoursynth_plugin! {
    Metadata {
        identifier: PLUGIN_IDENTIFIER,
        namespace: "zootd",
        name: PLUGIN_NAME,
        read_only: true,
    },
    [
        MotionMaskFunction::new(),
        BuildMMFunction::new(),
        TDeintModFunction::new(),
    ]
}
