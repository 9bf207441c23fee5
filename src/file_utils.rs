use anyhow::{Context, Result};
use chrono::Local;
use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

// @module: File and directory utilities

// @struct: A translated subtitle file and the video it dubs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    // @field: Video file next to the subtitles
    pub video_path: PathBuf,
    // @field: Translated subtitles
    pub subtitles_path: PathBuf,
}

// @struct: Result of scanning an input folder
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MediaDiscovery {
    // @field: Pairs ready for processing, sorted by subtitle path
    pub items: Vec<MediaItem>,
    // @field: Subtitle files without a matching video
    pub missing_pairings: Vec<PathBuf>,
}

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    /// Find files with a specific extension in a directory, sorted by path
    pub fn find_files<P: AsRef<Path>>(dir: P, extension: &str) -> Result<Vec<PathBuf>> {
        let wanted = extension.trim_start_matches('.');
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() {
                if let Some(ext) = path.extension() {
                    if ext.to_string_lossy().eq_ignore_ascii_case(wanted) {
                        result.push(path.to_path_buf());
                    }
                }
            }
        }

        result.sort();
        Ok(result)
    }

    // @finds: Video next to a subtitle file with the same stem
    // @params: video_extensions are tried in order
    pub fn find_video_for(subtitles_path: &Path, video_extensions: &[String]) -> Option<PathBuf> {
        video_extensions
            .iter()
            .map(|ext| subtitles_path.with_extension(ext.trim_start_matches('.')))
            .find(|candidate| Self::file_exists(candidate))
    }

    /// Pair every subtitle file under `input_dir` with its video
    pub fn find_media_pairs<P: AsRef<Path>>(
        input_dir: P,
        subtitle_extension: &str,
        video_extensions: &[String],
    ) -> Result<MediaDiscovery> {
        let mut discovery = MediaDiscovery::default();

        for subtitles_path in Self::find_files(input_dir, subtitle_extension)? {
            match Self::find_video_for(&subtitles_path, video_extensions) {
                Some(video_path) => discovery.items.push(MediaItem {
                    video_path,
                    subtitles_path,
                }),
                None => discovery.missing_pairings.push(subtitles_path),
            }
        }

        Ok(discovery)
    }

    /// Write bytes to a file so that readers never see a partial file
    pub fn write_atomic<P: AsRef<Path>>(path: P, content: &[u8]) -> std::io::Result<()> {
        let path = path.as_ref();
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)?;

        let mut temp = NamedTempFile::new_in(parent)?;
        temp.write_all(content)?;
        temp.persist(path)?;

        Ok(())
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Append content to a log file with timestamp
    pub fn append_to_log_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file: {:?}", path.as_ref()))?;

        writeln!(file, "[{}] {}", timestamp, content)
            .with_context(|| format!("Failed to write to log file: {:?}", path.as_ref()))?;

        Ok(())
    }
}
