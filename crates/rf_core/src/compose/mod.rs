//! Final composition graph: track selection, mixing, overlay ordering.
//!
//! This module provides:
//! - `CompositionInputs`: the tracks and gains available to the final
//!   compose (primary video and voice are mandatory by construction)
//! - `RenderOp` / `CompositionGraph`: the ordered encoder operations and
//!   output mapping
//! - `build_graph`: the pure, deterministic builder

mod builder;
mod graph;

pub use builder::build_graph;
pub use graph::{
    CompositionGraph, CompositionInputs, RenderOp, StreamRef, TrackSource, MIX_LABEL,
    MUSIC_GAIN_LABEL, VIDEO_OUT_LABEL, VOICE_GAIN_LABEL,
};
