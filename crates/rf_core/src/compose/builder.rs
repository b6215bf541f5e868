//! Composition graph builder.
//!
//! Builds the ordered operation list for the final compose from the
//! available tracks and mix parameters. The build is pure and
//! deterministic: identical inputs always yield an identical graph, so
//! encodes are reproducible and the graph can be asserted structurally
//! in tests.

use super::graph::{
    CompositionGraph, CompositionInputs, RenderOp, StreamRef, TrackSource, MIX_LABEL,
    MUSIC_GAIN_LABEL, VIDEO_OUT_LABEL, VOICE_GAIN_LABEL,
};

/// Mix dropout transition in seconds, matching the encoder's `amix`
/// behavior when one input ends before the other.
const DROPOUT_TRANSITION_SECS: u32 = 3;

/// Build the composition graph for an input set.
///
/// Operation order:
/// 1. Overlay (only when a background track is present): the primary
///    video is scaled to the target resolution and overlaid onto the
///    background at the origin. Its output becomes the video reference.
/// 2. One gain per audio track: voice always, music when present.
/// 3. Mix (only when both voice and music are present): combines exactly
///    the two gain outputs. Mixing a single track is never emitted; it
///    would waste an encoder pass.
pub fn build_graph(inputs: &CompositionInputs) -> CompositionGraph {
    let mut ops = Vec::new();

    let (width, height) = inputs.target();

    let video_out = if inputs.background().is_some() {
        ops.push(RenderOp::Overlay {
            base: TrackSource::Background,
            top: TrackSource::PrimaryVideo,
            scale_width: width,
            scale_height: height,
            label: VIDEO_OUT_LABEL.to_string(),
        });
        StreamRef::Labeled(VIDEO_OUT_LABEL.to_string())
    } else {
        StreamRef::Track(TrackSource::PrimaryVideo)
    };

    ops.push(RenderOp::Gain {
        input: TrackSource::Voice,
        volume: inputs.voice_gain(),
        label: VOICE_GAIN_LABEL.to_string(),
    });

    let audio_out = if inputs.music().is_some() {
        ops.push(RenderOp::Gain {
            input: TrackSource::Music,
            volume: inputs.music_gain(),
            label: MUSIC_GAIN_LABEL.to_string(),
        });
        ops.push(RenderOp::Mix {
            inputs: vec![VOICE_GAIN_LABEL.to_string(), MUSIC_GAIN_LABEL.to_string()],
            dropout_transition_secs: DROPOUT_TRANSITION_SECS,
            label: MIX_LABEL.to_string(),
        });
        StreamRef::Labeled(MIX_LABEL.to_string())
    } else {
        StreamRef::Labeled(VOICE_GAIN_LABEL.to_string())
    };

    CompositionGraph {
        ops,
        video_out,
        audio_out,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice_only_inputs() -> CompositionInputs {
        CompositionInputs::new("a.mp4", "v.wav")
    }

    fn full_inputs() -> CompositionInputs {
        CompositionInputs::new("a.mp4", "v.wav")
            .with_background("bg.mp4")
            .with_music("m.mp3")
    }

    #[test]
    fn voice_only_graph_has_single_gain() {
        let graph = build_graph(&voice_only_inputs());

        assert_eq!(graph.overlay_count(), 0);
        assert_eq!(graph.gain_count(), 1);
        assert_eq!(graph.mix_count(), 0);

        // Video passes through unchanged; audio maps to the voice gain.
        assert_eq!(graph.video_out, StreamRef::Track(TrackSource::PrimaryVideo));
        assert_eq!(graph.audio_out.label(), Some(VOICE_GAIN_LABEL));
    }

    #[test]
    fn background_and_music_add_overlay_and_mix() {
        let graph = build_graph(&full_inputs());

        assert_eq!(graph.overlay_count(), 1);
        assert_eq!(graph.gain_count(), 2);
        assert_eq!(graph.mix_count(), 1);

        assert_eq!(graph.video_out.label(), Some(VIDEO_OUT_LABEL));
        assert_eq!(graph.audio_out.label(), Some(MIX_LABEL));

        // Overlay scales the primary onto the background.
        match &graph.ops[0] {
            RenderOp::Overlay {
                base,
                top,
                scale_width,
                scale_height,
                ..
            } => {
                assert_eq!(*base, TrackSource::Background);
                assert_eq!(*top, TrackSource::PrimaryVideo);
                assert_eq!((*scale_width, *scale_height), (1280, 720));
            }
            other => panic!("expected overlay first, got {:?}", other),
        }

        // Mix combines exactly the two gain outputs.
        match graph.ops.last().unwrap() {
            RenderOp::Mix { inputs, .. } => {
                assert_eq!(inputs, &[VOICE_GAIN_LABEL, MUSIC_GAIN_LABEL]);
            }
            other => panic!("expected mix last, got {:?}", other),
        }
    }

    #[test]
    fn identical_inputs_yield_identical_graphs() {
        let a = build_graph(&full_inputs());
        let b = build_graph(&full_inputs());
        assert_eq!(a, b);

        let c = build_graph(&voice_only_inputs());
        let d = build_graph(&voice_only_inputs());
        assert_eq!(c, d);
    }

    #[test]
    fn gains_use_configured_volumes() {
        let inputs = CompositionInputs::new("a.mp4", "v.wav")
            .with_music("m.mp3")
            .with_voice_gain(0.8)
            .with_music_gain(0.2);
        let graph = build_graph(&inputs);

        let volumes: Vec<f64> = graph
            .ops
            .iter()
            .filter_map(|op| match op {
                RenderOp::Gain { volume, .. } => Some(*volume),
                _ => None,
            })
            .collect();
        assert_eq!(volumes, vec![0.8, 0.2]);
    }

    #[test]
    fn target_resolution_is_configurable() {
        let inputs = CompositionInputs::new("a.mp4", "v.wav")
            .with_background("bg.mp4")
            .with_target(1920, 1080);
        let graph = build_graph(&inputs);

        match &graph.ops[0] {
            RenderOp::Overlay {
                scale_width,
                scale_height,
                ..
            } => assert_eq!((*scale_width, *scale_height), (1920, 1080)),
            other => panic!("expected overlay, got {:?}", other),
        }
    }
}
