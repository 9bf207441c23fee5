use std::fmt;
use std::fs;
use std::path::Path;
use regex::Regex;
use once_cell::sync::Lazy;
use log::{warn, debug};
use crate::errors::SubtitleError;
use crate::file_utils::FileManager;

// @module: Cue timeline model and SRT reading/writing

// @const: SRT timestamp regex
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{2}):(\d{2}):(\d{2})[,.](\d{3})\s*-->\s*(\d{2}):(\d{2}):(\d{2})[,.](\d{3})")
        .expect("timestamp regex is valid")
});

// @struct: One timed subtitle line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    // @field: Spoken text
    pub text: String,

    // @field: Start time in ms
    pub start_ms: u64,

    // @field: End time in ms
    pub end_ms: u64,
}

impl Cue {
    /// Creates a cue without validation - used by tests and builders
    pub fn new(text: impl Into<String>, start_ms: u64, end_ms: u64) -> Self {
        Cue {
            text: text.into(),
            start_ms,
            end_ms,
        }
    }

    // @creates: Validated cue
    // @validates: Time range and non-empty text
    pub fn new_validated(text: &str, start_ms: u64, end_ms: u64) -> Result<Self, SubtitleError> {
        if end_ms <= start_ms {
            return Err(SubtitleError::InvalidCue(format!(
                "end time {} <= start time {}",
                end_ms, start_ms
            )));
        }

        let trimmed_text = text.trim();
        if trimmed_text.is_empty() {
            return Err(SubtitleError::InvalidCue(format!(
                "empty text at {}",
                format_srt_timestamp(start_ms)
            )));
        }

        Ok(Cue::new(trimmed_text, start_ms, end_ms))
    }

    /// Name of the time window covered by the cue, e.g. `00_00_02_500-00_00_04_000`
    pub fn window_name(&self) -> String {
        format!(
            "{}-{}",
            format_window_timestamp(self.start_ms),
            format_window_timestamp(self.end_ms)
        )
    }

    /// Move the cue by a signed offset; None when it would end before zero
    pub fn shifted(&self, offset_ms: i64) -> Option<Cue> {
        let end_ms = self.end_ms.saturating_add_signed(offset_ms);
        if end_ms == 0 {
            return None;
        }
        let start_ms = self.start_ms.saturating_add_signed(offset_ms);
        Some(Cue::new(self.text.clone(), start_ms, end_ms))
    }
}

/// Format milliseconds as an SRT timestamp (HH:MM:SS,mmm)
pub fn format_srt_timestamp(ms: u64) -> String {
    let (hours, minutes, seconds, millis) = split_timestamp(ms);
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

/// Format milliseconds as a file-name safe timestamp (HH_mm_ss_SSS)
pub fn format_window_timestamp(ms: u64) -> String {
    let (hours, minutes, seconds, millis) = split_timestamp(ms);
    format!("{:02}_{:02}_{:02}_{:03}", hours, minutes, seconds, millis)
}

fn split_timestamp(ms: u64) -> (u64, u64, u64, u64) {
    (
        ms / 3_600_000,
        (ms % 3_600_000) / 60_000,
        (ms % 60_000) / 1_000,
        ms % 1_000,
    )
}

/// Ordered sequence of cues for one media item, sorted by start time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CueTimeline {
    cues: Vec<Cue>,
}

impl CueTimeline {
    /// Build a timeline; cues are sorted by start time
    pub fn new(mut cues: Vec<Cue>) -> Self {
        cues.sort_by_key(|cue| cue.start_ms);
        CueTimeline { cues }
    }

    /// Build a timeline from start/end pairs with placeholder text
    pub fn from_ranges(ranges: &[(u64, u64)]) -> Self {
        Self::new(
            ranges
                .iter()
                .enumerate()
                .map(|(i, (start, end))| Cue::new(format!("cue {}", i + 1), *start, *end))
                .collect(),
        )
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Cue> {
        self.cues.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cue> {
        self.cues.iter()
    }

    /// Start time of the positional successor of a cue, None for the last cue
    pub fn next_start_ms(&self, index: usize) -> Option<u64> {
        self.cues.get(index + 1).map(|cue| cue.start_ms)
    }

    /// Timeline with every cue moved by the given offset.
    /// Cues pushed entirely before zero are dropped.
    pub fn shifted(&self, offset_ms: i64) -> CueTimeline {
        if offset_ms == 0 {
            return self.clone();
        }

        let cues: Vec<Cue> = self.cues.iter().filter_map(|cue| cue.shifted(offset_ms)).collect();
        let dropped = self.cues.len() - cues.len();
        if dropped > 0 {
            warn!("Dropped {} cue(s) that moved before the start of the video", dropped);
        }
        CueTimeline::new(cues)
    }

    /// Read and parse an SRT file
    pub fn read_srt<P: AsRef<Path>>(path: P) -> Result<Self, SubtitleError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| SubtitleError::Parse(format!("{}: {}", path.display(), e)))?;
        Self::parse_srt(&content)
            .map_err(|e| match e {
                SubtitleError::Empty(_) => SubtitleError::Empty(path.display().to_string()),
                other => other,
            })
    }

    /// Write the timeline as an SRT file, replacing any previous file atomically
    pub fn write_srt<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        FileManager::write_atomic(path, self.to_string().as_bytes())
    }

    /// Parse SRT format string into a timeline
    pub fn parse_srt(content: &str) -> Result<Self, SubtitleError> {
        let mut cues = Vec::new();

        // State variables for parsing
        let mut in_cue = false;
        let mut current_range: Option<(u64, u64)> = None;
        let mut current_text = String::new();

        let mut finish_cue = |range: Option<(u64, u64)>, text: &str| {
            if let Some((start_ms, end_ms)) = range {
                match Cue::new_validated(text, start_ms, end_ms) {
                    Ok(cue) => cues.push(cue),
                    Err(e) => warn!("Skipping subtitle entry: {}", e),
                }
            }
        };

        for (line_number, line) in content.lines().enumerate() {
            let trimmed = line.trim().trim_start_matches('\u{feff}');

            if trimmed.is_empty() {
                if current_range.is_some() {
                    if current_text.is_empty() {
                        warn!("Skipping empty subtitle entry ending at line {}", line_number);
                        current_range = None;
                    } else {
                        finish_cue(current_range.take(), &current_text);
                        current_text.clear();
                    }
                    in_cue = false;
                }
                continue;
            }

            // Sequence number opens a new entry
            if !in_cue && current_text.is_empty() && trimmed.parse::<usize>().is_ok() {
                in_cue = true;
                continue;
            }

            if current_range.is_none() {
                if let Some(caps) = TIMESTAMP_REGEX.captures(trimmed) {
                    current_range = Some((captured_ms(&caps, 1), captured_ms(&caps, 5)));
                    in_cue = true;
                    continue;
                }
                debug!("Unexpected text at line {} before timestamp: {}", line_number + 1, trimmed);
                continue;
            }

            if !current_text.is_empty() {
                current_text.push('\n');
            }
            current_text.push_str(trimmed);
        }

        // Add the last entry if there is one
        if current_range.is_some() && !current_text.is_empty() {
            finish_cue(current_range.take(), &current_text);
        }

        if cues.is_empty() {
            return Err(SubtitleError::Empty("SRT content".to_string()));
        }

        Ok(CueTimeline::new(cues))
    }
}

/// Parse captured timestamp groups to milliseconds
fn captured_ms(caps: &regex::Captures, start_idx: usize) -> u64 {
    let part = |offset: usize| -> u64 {
        caps.get(start_idx + offset)
            .map_or(0, |m| m.as_str().parse().unwrap_or(0))
    };
    ((part(0) * 60 + part(1)) * 60 + part(2)) * 1000 + part(3)
}

impl<'a> IntoIterator for &'a CueTimeline {
    type Item = &'a Cue;
    type IntoIter = std::slice::Iter<'a, Cue>;

    fn into_iter(self) -> Self::IntoIter {
        self.cues.iter()
    }
}

impl fmt::Display for CueTimeline {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, cue) in self.cues.iter().enumerate() {
            writeln!(f, "{}", i + 1)?;
            writeln!(
                f,
                "{} --> {}",
                format_srt_timestamp(cue.start_ms),
                format_srt_timestamp(cue.end_ms)
            )?;
            writeln!(f, "{}", cue.text)?;
            writeln!(f)?;
        }
        Ok(())
    }
}
