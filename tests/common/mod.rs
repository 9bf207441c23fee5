/*!
 * Common test utilities for the redub test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use redub::file_utils::MediaItem;
use redub::providers::mock::MockSynthesizer;
use redub::providers::SynthesizerRegistry;
use redub::subtitle_processor::{Cue, CueTimeline};


/// Route library logs through env_logger, once per test binary
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// SRT content for `(start_ms, end_ms, text)` triples
pub fn srt_content(cues: &[(u64, u64, &str)]) -> String {
    CueTimeline::new(
        cues.iter()
            .map(|(start, end, text)| Cue::new(*text, *start, *end))
            .collect(),
    )
    .to_string()
}

/// Creates a sample subtitle file for testing
pub fn create_test_subtitle(dir: &Path, filename: &str) -> Result<PathBuf> {
    let content = r#"1
00:00:01,000 --> 00:00:04,000
This is a test subtitle.

2
00:00:05,000 --> 00:00:09,000
It contains multiple entries.

3
00:00:10,000 --> 00:00:14,000
For testing purposes.
"#;
    create_test_file(dir, filename, content)
}

/// Translated cues used by the pipeline tests
pub const DUB_CUES: [(u64, u64, &str); 2] = [
    (0, 2000, "<i>Tere hommikust</i>"),
    (2500, 4000, "Kuidas läheb?"),
];

/// Original-language cues, 50ms later than `DUB_CUES`
pub const REFERENCE_CUES: [(u64, u64, &str); 2] = [
    (50, 2050, "Good morning"),
    (2550, 4050, "How are you?"),
];

/// Creates a video placeholder and its translated subtitles under `input_dir/relative_dir`
pub fn create_media_item(input_dir: &Path, relative_dir: &str, stem: &str, dub_srt: &str) -> Result<MediaItem> {
    let dir = input_dir.join(relative_dir);
    let video_path = create_test_file(&dir, &format!("{}.mkv", stem), "video")?;
    let subtitles_path = create_test_file(&dir, &format!("{}.srt", stem), dub_srt)?;
    Ok(MediaItem {
        video_path,
        subtitles_path,
    })
}

/// Registry holding a single mock voice, plus a handle to inspect it
pub fn registry_with(mock: MockSynthesizer) -> (SynthesizerRegistry, Arc<MockSynthesizer>) {
    let mock = Arc::new(mock);
    let mut registry = SynthesizerRegistry::new();
    registry.register(mock.clone());
    (registry, mock)
}

/// Reads every regular file below a directory, sorted by path
pub fn snapshot_files(dir: &Path) -> Result<Vec<(PathBuf, Vec<u8>)>> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(dir) {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push((entry.path().to_path_buf(), fs::read(entry.path())?));
        }
    }
    files.sort();
    Ok(files)
}
