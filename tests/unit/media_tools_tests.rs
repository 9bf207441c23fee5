/*!
 * Tests for ffmpeg/ffprobe command construction and output handling
 */

use std::path::{Path, PathBuf};

use redub::app_config::MediaConfig;
use redub::errors::MediaToolError;
use redub::media_tools::{
    filter_ffmpeg_stderr, parse_duration_ms, partial_path, FfmpegTool, MediaTool, MixRequest, MuxRequest,
};
use redub::subtitle_processor::CueTimeline;
use redub::timing::{MixPlanBuilder, SpeedDecision};

#[test]
fn test_parseDuration_shouldFloorToMilliseconds() {
    assert_eq!(parse_duration_ms("2.600000\n").unwrap(), 2600);
    assert_eq!(parse_duration_ms("1.2345").unwrap(), 1234);
    assert_eq!(parse_duration_ms("0").unwrap(), 0);
}

#[test]
fn test_parseDuration_withGarbage_shouldFail() {
    assert!(matches!(parse_duration_ms("N/A"), Err(MediaToolError::InvalidProbeOutput(_))));
    assert!(matches!(parse_duration_ms(""), Err(MediaToolError::InvalidProbeOutput(_))));
    assert!(matches!(parse_duration_ms("-1.0"), Err(MediaToolError::InvalidProbeOutput(_))));
}

#[test]
fn test_partialPath_shouldKeepExtensionLast() {
    assert_eq!(
        partial_path(Path::new("/out/tmp_ep1/audio-tts.mp3")),
        PathBuf::from("/out/tmp_ep1/audio-tts.partial.mp3")
    );
    assert_eq!(partial_path(Path::new("/out/ep1")), PathBuf::from("/out/ep1.partial"));
}

#[test]
fn test_probeArgs_shouldPrintBareDuration() {
    let args = FfmpegTool::probe_args(Path::new("clip.wav"));

    assert_eq!(
        args.join(" "),
        "-v error -show_entries format=duration -of default=noprint_wrappers=1:nokey=1 clip.wav"
    );
}

#[test]
fn test_extractArgs_shouldSelectLanguageAndDropAudioVideo() {
    let args = FfmpegTool::extract_args(Path::new("ep1.mkv"), "eng", Path::new("ref.srt"));

    assert_eq!(args.join(" "), "-y -i ep1.mkv -map 0:m:language:eng -map -0:v -map -0:a ref.srt");
}

#[test]
fn test_mixArgs_shouldListClipsInSegmentOrder() {
    let cues = CueTimeline::from_ranges(&[(50, 2050), (2550, 4050)]);
    let decisions = vec![
        SpeedDecision { cue_index: 0, tempo_factor: 1.3 },
        SpeedDecision::unchanged(1),
    ];
    let plan = MixPlanBuilder::default().build(&cues, &decisions).unwrap();
    let clips = vec![PathBuf::from("a.wav"), PathBuf::from("b.wav")];
    let request = MixRequest {
        video: Path::new("ep1.mkv"),
        clips: &clips,
        plan: &plan,
        source_language: "eng",
        output: Path::new("audio-tts.mp3"),
    };

    let args = FfmpegTool::mix_args(&request, Path::new("audio-tts.partial.mp3"));

    assert_eq!(&args[..7], &["-y", "-i", "ep1.mkv", "-i", "a.wav", "-i", "b.wav"]);
    assert_eq!(args[7], "-filter_complex");
    assert_eq!(args[8], plan.render_filter_graph("0:m:language:eng"));
    assert_eq!(&args[9..], &["-map", "[mixout]", "audio-tts.partial.mp3"]);
}

#[test]
fn test_muxArgs_shouldTagStreamsAndCopyCodecs() {
    let request = MuxRequest {
        video: Path::new("ep1.mkv"),
        audio: Path::new("audio-tts.mp3"),
        subtitles: Path::new("subtitles_est.srt"),
        language: "est",
        output: Path::new("out/ep1.mkv"),
    };

    let args = FfmpegTool::mux_args(&request, Path::new("out/ep1.partial.mkv"));

    assert_eq!(
        args.join(" "),
        "-y -i ep1.mkv -i audio-tts.mp3 -f srt -i subtitles_est.srt -map 1 -map 2 -map 0 \
         -metadata:s:a:0 language=est -metadata:s:s:0 language=est -c copy out/ep1.partial.mkv"
    );
}

#[test]
fn test_filterStderr_shouldDropBannerNoise() {
    let stderr = "ffmpeg version 6.1 Copyright\n  built with gcc 13\n  configuration: --enable-gpl\n  libavutil 58\nInput #0, matroska, from 'ep1.mkv':\n  Stream #0:0: Video: h264\nStream map '0:m:language:eng' matches no streams.\n";

    assert_eq!(filter_ffmpeg_stderr(stderr), "Stream map '0:m:language:eng' matches no streams.");
    assert!(filter_ffmpeg_stderr("ffmpeg version 6.1\n").starts_with("unknown error"));
}

/// A missing binary is a spawn error, not a panic
#[tokio::test]
async fn test_probe_withMissingBinary_shouldReturnSpawnError() {
    let tool = FfmpegTool::new(&MediaConfig {
        ffprobe_path: "redub-no-such-ffprobe".to_string(),
        ..MediaConfig::default()
    });

    let result = tool.probe_duration_ms(Path::new("clip.wav")).await;

    assert!(matches!(result, Err(MediaToolError::Spawn { .. })));
}
