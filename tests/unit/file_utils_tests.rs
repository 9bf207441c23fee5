/*!
 * Tests for file utility functions
 */

use anyhow::Result;
use std::fs;

use redub::file_utils::FileManager;
use crate::common;

fn extensions() -> Vec<String> {
    vec!["mkv".to_string(), "mp4".to_string()]
}

/// Test that file_exists returns true for existing files
#[test]
fn test_file_exists_withExistingFile_shouldReturnTrue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(temp_dir.path(), "test_file_exists.tmp", "test content")?;

    assert!(FileManager::file_exists(&test_file));
    assert!(!FileManager::file_exists(temp_dir.path()));
    Ok(())
}

/// Test that file_exists returns false for non-existent files
#[test]
fn test_file_exists_withNonExistentFile_shouldReturnFalse() {
    assert!(!FileManager::file_exists("non_existent_file.tmp"));
}

/// Test that find_files walks subfolders and sorts the result
#[test]
fn test_find_files_withNestedFiles_shouldReturnSortedMatches() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "b/two.srt", "")?;
    common::create_test_file(temp_dir.path(), "a/one.SRT", "")?;
    common::create_test_file(temp_dir.path(), "a/ignored.txt", "")?;

    let files = FileManager::find_files(temp_dir.path(), "srt")?;

    assert_eq!(files.len(), 2);
    assert!(files[0].ends_with("a/one.SRT"));
    assert!(files[1].ends_with("b/two.srt"));
    Ok(())
}

/// Test pairing prefers the first configured video extension
#[test]
fn test_find_media_pairs_withBothExtensions_shouldPreferFirstConfigured() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path();
    common::create_test_subtitle(dir, "movie.srt")?;
    common::create_test_file(dir, "movie.mp4", "mp4")?;
    common::create_test_file(dir, "movie.mkv", "mkv")?;

    let discovery = FileManager::find_media_pairs(dir, "srt", &extensions())?;

    assert_eq!(discovery.items.len(), 1);
    assert_eq!(discovery.items[0].video_path, dir.join("movie.mkv"));
    assert_eq!(discovery.items[0].subtitles_path, dir.join("movie.srt"));
    assert!(discovery.missing_pairings.is_empty());
    Ok(())
}

/// Test subtitles without a video are reported separately
#[test]
fn test_find_media_pairs_withOrphanSubtitles_shouldReportMissingPairing() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path();
    common::create_test_subtitle(dir, "show/ep1.srt")?;
    common::create_test_file(dir, "show/ep1.mp4", "mp4")?;
    common::create_test_subtitle(dir, "show/ep2.srt")?;

    let discovery = FileManager::find_media_pairs(dir, "srt", &extensions())?;

    assert_eq!(discovery.items.len(), 1);
    assert_eq!(discovery.items[0].video_path, dir.join("show/ep1.mp4"));
    assert_eq!(discovery.missing_pairings, vec![dir.join("show/ep2.srt")]);
    Ok(())
}

/// Test atomic writes create parents and replace content
#[test]
fn test_write_atomic_withExistingFile_shouldReplaceContent() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("nested/dir/clip.wav");

    FileManager::write_atomic(&path, b"first")?;
    FileManager::write_atomic(&path, b"second")?;

    assert_eq!(fs::read(&path)?, b"second");
    assert_eq!(fs::read_dir(path.parent().unwrap())?.count(), 1);
    Ok(())
}

/// Test log lines are appended with a timestamp
#[test]
fn test_append_to_log_file_calledTwice_shouldKeepBothLines() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let log_path = temp_dir.path().join("logs/redub.issues.log");

    FileManager::append_to_log_file(&log_path, "first run")?;
    FileManager::append_to_log_file(&log_path, "second run")?;

    let content = FileManager::read_to_string(&log_path)?;
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with('[') && lines[0].ends_with("first run"));
    assert!(lines[1].ends_with("second run"));
    Ok(())
}

#[test]
fn test_ensure_dir_withMissingParents_shouldCreateThem() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path().join("a/b/c");

    FileManager::ensure_dir(&dir)?;
    FileManager::ensure_dir(&dir)?;

    assert!(FileManager::dir_exists(&dir));
    Ok(())
}
