//! Playlist artifacts (TAG files).
//!
//! Format: line-oriented `KEY=value` text.
//! ```text
//! ; tagvault playlist
//! DATE=2024-01-01
//! TIME=18:00
//! TITLE=PROMO
//! CUT=\\A\share\audio\spot1.wav|30000|Spot one
//! ```
//! Content is always regenerated in full from the in-memory artifact; it is
//! never patched in place.

use std::time::Duration;

use chrono::{NaiveDate, NaiveTime, Timelike};
use thiserror::Error;

use super::topology::Target;

/// File extension used for playlist artifacts.
pub const TAG_EXTENSION: &str = "tag";

const HEADER: &str = "; tagvault playlist";
const FILE_DATE_FORMAT: &str = "%Y-%m-%d";
const FILE_TIME_FORMAT: &str = "%H%M";
const UNTITLED: &str = "UNTITLED";

/// Errors raised while building or parsing an artifact.
///
/// A parse failure concerns one file only; listings collect it and move on.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ArtifactError {
    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("missing required field {0}")]
    MissingField(&'static str),

    /// A value that cannot be written back as one `KEY=value` line.
    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// One cut in a playlist.
///
/// The audio source cannot contain `|` and neither field may span lines;
/// both are stored trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CutEntry {
    audio_source: String,
    duration: Duration,
    label: String,
}

impl CutEntry {
    pub fn new(
        audio_source: impl Into<String>,
        duration: Duration,
        label: impl Into<String>,
    ) -> Result<Self, ArtifactError> {
        let (audio_source, label): (String, String) = (audio_source.into(), label.into());
        let audio_source = single_line("audio source", &audio_source)?;
        if audio_source.is_empty() {
            return Err(ArtifactError::InvalidField {
                field: "audio source",
                reason: "cannot be empty".to_string(),
            });
        }
        if audio_source.contains('|') {
            return Err(ArtifactError::InvalidField {
                field: "audio source",
                reason: format!("{audio_source:?} contains '|'"),
            });
        }
        Ok(Self {
            audio_source,
            duration,
            label: single_line("cut label", &label)?,
        })
    }

    /// Path to the audio source, usually on the channel's primary target.
    pub fn audio_source(&self) -> &str {
        &self.audio_source
    }

    pub const fn duration(&self) -> Duration {
        self.duration
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// A scheduled commercial break: schedule key plus ordered cuts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistArtifact {
    scheduled_date: NaiveDate,
    scheduled_time: NaiveTime,
    title: String,
    cuts: Vec<CutEntry>,
}

impl PlaylistArtifact {
    /// Create an artifact. The time of day is truncated to the minute.
    ///
    /// The title is trimmed and must be non-empty and on one line.
    pub fn new(
        scheduled_date: NaiveDate,
        scheduled_time: NaiveTime,
        title: impl Into<String>,
    ) -> Result<Self, ArtifactError> {
        let title: String = title.into();
        Ok(Self {
            scheduled_date,
            scheduled_time: truncate_to_minute(scheduled_time),
            title: valid_title(&title)?,
            cuts: Vec::new(),
        })
    }

    #[must_use]
    pub fn with_cut(mut self, cut: CutEntry) -> Self {
        self.cuts.push(cut);
        self
    }

    pub const fn scheduled_date(&self) -> NaiveDate {
        self.scheduled_date
    }

    pub const fn scheduled_time(&self) -> NaiveTime {
        self.scheduled_time
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Replace the title under the same rules as [`Self::new`].
    pub fn set_title(&mut self, title: impl Into<String>) -> Result<(), ArtifactError> {
        let title: String = title.into();
        self.title = valid_title(&title)?;
        Ok(())
    }

    pub fn cuts(&self) -> &[CutEntry] {
        &self.cuts
    }

    /// Move the artifact to another schedule slot.
    pub fn reschedule(&mut self, date: NaiveDate, time: NaiveTime) {
        self.scheduled_date = date;
        self.scheduled_time = truncate_to_minute(time);
    }

    pub fn total_duration(&self) -> Duration {
        self.cuts.iter().map(|c| c.duration).sum()
    }

    /// Human-readable name, e.g. `2024-01-01 18:00 PROMO`.
    pub fn display_name(&self) -> String {
        format!(
            "{} {} {}",
            self.scheduled_date.format(FILE_DATE_FORMAT),
            self.scheduled_time.format("%H:%M"),
            self.title
        )
    }

    /// Deterministic file name, e.g. `2024-01-01_1800_PROMO.tag`.
    pub fn file_name(&self) -> String {
        format!(
            "{}_{}_{}.{}",
            self.scheduled_date.format(FILE_DATE_FORMAT),
            self.scheduled_time.format(FILE_TIME_FORMAT),
            sanitize_title(&self.title),
            TAG_EXTENSION
        )
    }

    /// Render the full textual content.
    pub fn to_content(&self) -> String {
        let mut out = String::new();
        out.push_str(HEADER);
        out.push('\n');
        out.push_str(&format!("DATE={}\n", self.scheduled_date.format(FILE_DATE_FORMAT)));
        out.push_str(&format!("TIME={}\n", self.scheduled_time.format("%H:%M")));
        out.push_str(&format!("TITLE={}\n", self.title));
        for cut in &self.cuts {
            out.push_str(&format!(
                "CUT={}|{}|{}\n",
                cut.audio_source,
                cut.duration.as_millis(),
                cut.label
            ));
        }
        out
    }

    /// Parse stored content.
    ///
    /// When `primary_target` is given, cut paths carrying a legacy drive
    /// letter prefix (`X:\...`) are rewritten onto that target.
    pub fn parse(content: &str, primary_target: Option<&Target>) -> Result<Self, ArtifactError> {
        let mut date = None;
        let mut time = None;
        let mut title = None;
        let mut cuts = Vec::new();

        for (index, raw) in content.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.trim_end_matches('\r').trim();
            if line.is_empty() || line.starts_with(';') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(ArtifactError::Parse {
                    line: line_no,
                    reason: format!("expected KEY=value, got {line:?}"),
                });
            };

            match key.trim().to_ascii_uppercase().as_str() {
                "DATE" => date = Some(parse_date(value.trim(), line_no)?),
                "TIME" => time = Some(parse_time(value.trim(), line_no)?),
                "TITLE" => title = Some(value.trim().to_string()),
                "CUT" => cuts.push(parse_cut(value, primary_target, line_no)?),
                // Unknown keys are carried by newer writers; ignore them.
                _ => {}
            }
        }

        let date = date.ok_or(ArtifactError::MissingField("DATE"))?;
        let time = time.ok_or(ArtifactError::MissingField("TIME"))?;
        let title = title
            .filter(|t| !t.is_empty())
            .ok_or(ArtifactError::MissingField("TITLE"))?;

        let mut artifact = Self::new(date, time, title)?;
        artifact.cuts = cuts;
        Ok(artifact)
    }
}

fn single_line(field: &'static str, value: &str) -> Result<String, ArtifactError> {
    if value.contains(['\n', '\r']) {
        return Err(ArtifactError::InvalidField {
            field,
            reason: format!("{value:?} spans more than one line"),
        });
    }
    Ok(value.trim().to_string())
}

fn valid_title(title: &str) -> Result<String, ArtifactError> {
    let title = single_line("title", title)?;
    if title.is_empty() {
        return Err(ArtifactError::MissingField("TITLE"));
    }
    Ok(title)
}

fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time)
}

fn parse_date(value: &str, line: usize) -> Result<NaiveDate, ArtifactError> {
    NaiveDate::parse_from_str(value, FILE_DATE_FORMAT).map_err(|e| ArtifactError::Parse {
        line,
        reason: format!("invalid date {value:?}: {e}"),
    })
}

fn parse_time(value: &str, line: usize) -> Result<NaiveTime, ArtifactError> {
    ["%H:%M", "%H:%M:%S", FILE_TIME_FORMAT]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(value, fmt).ok())
        .ok_or_else(|| ArtifactError::Parse {
            line,
            reason: format!("invalid time {value:?}"),
        })
}

fn parse_cut(
    value: &str,
    primary_target: Option<&Target>,
    line: usize,
) -> Result<CutEntry, ArtifactError> {
    let mut parts = value.splitn(3, '|');
    let source = parts.next().map(str::trim).unwrap_or_default();
    if source.is_empty() {
        return Err(ArtifactError::Parse {
            line,
            reason: "cut has no audio source".to_string(),
        });
    }
    let millis = parts
        .next()
        .map(str::trim)
        .ok_or_else(|| ArtifactError::Parse {
            line,
            reason: "cut has no duration".to_string(),
        })?
        .parse::<u64>()
        .map_err(|e| ArtifactError::Parse {
            line,
            reason: format!("invalid cut duration: {e}"),
        })?;
    let label = parts.next().map(str::trim).unwrap_or_default();
    let source = match primary_target {
        Some(target) => rewrite_legacy_drive(source, target),
        None => source.to_string(),
    };

    CutEntry::new(source, Duration::from_millis(millis), label).map_err(|e| ArtifactError::Parse {
        line,
        reason: e.to_string(),
    })
}

/// Replace a `X:\` or `X:/` prefix with the target root, using the target's
/// separator style for the remainder of the path.
pub fn rewrite_legacy_drive(path: &str, target: &Target) -> String {
    let bytes = path.as_bytes();
    let has_drive = bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && matches!(bytes[2], b'\\' | b'/');
    if !has_drive {
        return path.to_string();
    }

    let root = target.root().to_string_lossy();
    let sep = if root.contains('\\') && !root.contains('/') {
        '\\'
    } else {
        '/'
    };
    let rest: String = path[3..]
        .chars()
        .map(|c| if matches!(c, '\\' | '/') { sep } else { c })
        .collect();

    format!("{}{}{}", root.trim_end_matches(['\\', '/']), sep, rest)
}

fn sanitize_title(title: &str) -> String {
    let cleaned: String = title
        .trim()
        .chars()
        .map(|c| match c {
            '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_whitespace() || c.is_control() => '_',
            c => c,
        })
        .collect();
    if cleaned.is_empty() {
        UNTITLED.to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn promo() -> PlaylistArtifact {
        PlaylistArtifact::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            "PROMO",
        )
        .unwrap()
        .with_cut(CutEntry::new("/mnt/a/audio/one.wav", Duration::from_secs(30), "One").unwrap())
        .with_cut(
            CutEntry::new("/mnt/a/audio/two.wav", Duration::from_millis(15_500), "Two").unwrap(),
        )
    }

    #[test]
    fn test_derived_fields() {
        let artifact = promo();
        assert_eq!(artifact.file_name(), "2024-01-01_1800_PROMO.tag");
        assert_eq!(artifact.display_name(), "2024-01-01 18:00 PROMO");
        assert_eq!(artifact.total_duration(), Duration::from_millis(45_500));
    }

    #[test]
    fn test_parse_generated_content() {
        let artifact = promo();
        let parsed = PlaylistArtifact::parse(&artifact.to_content(), None).unwrap();
        assert_eq!(parsed, artifact);
    }

    #[test]
    fn test_parse_tolerates_crlf_comments_and_unknown_keys() {
        let content = concat!(
            "; header\r\nDATE=2024-02-29\r\n\r\nTIME=0930\r\n",
            "TITLE=Morning Drive\r\nVOICE=ignored\r\n",
            "CUT=/a/b.wav|1000|Label | with pipe\r\n",
        );
        let parsed = PlaylistArtifact::parse(content, None).unwrap();
        assert_eq!(parsed.file_name(), "2024-02-29_0930_Morning_Drive.tag");
        assert_eq!(parsed.cuts()[0].label(), "Label | with pipe");
    }

    #[test]
    fn test_parse_reports_line_of_bad_cut() {
        let content = "DATE=2024-01-01\nTIME=18:00\nTITLE=X\nCUT=/a.wav|abc|L\n";
        let err = PlaylistArtifact::parse(content, None).unwrap_err();
        assert!(matches!(err, ArtifactError::Parse { line: 4, .. }));
    }

    #[test]
    fn test_parse_requires_schedule_fields() {
        let err = PlaylistArtifact::parse("TITLE=X\nTIME=18:00\n", None).unwrap_err();
        assert_eq!(err, ArtifactError::MissingField("DATE"));
    }

    #[test]
    fn test_legacy_drive_rewritten_onto_unc_target() {
        let target = Target::new(r"\\A\share");
        assert_eq!(
            rewrite_legacy_drive(r"X:\audio\spot.wav", &target),
            r"\\A\share\audio\spot.wav"
        );
        assert_eq!(
            rewrite_legacy_drive("x:/audio/spot.wav", &target),
            r"\\A\share\audio\spot.wav"
        );
    }

    #[test]
    fn test_legacy_drive_rewritten_onto_posix_target() {
        let target = Target::new("/mnt/share-a/");
        assert_eq!(
            rewrite_legacy_drive(r"Q:\audio\spot.wav", &target),
            "/mnt/share-a/audio/spot.wav"
        );
        assert_eq!(rewrite_legacy_drive("/already/net.wav", &target), "/already/net.wav");
    }

    #[test]
    fn test_parse_applies_drive_rewrite() {
        let content = "DATE=2024-01-01\nTIME=18:00\nTITLE=X\nCUT=X:\\audio\\a.wav|100|A\n";
        let target = Target::new("/mnt/a");
        let parsed = PlaylistArtifact::parse(content, Some(&target)).unwrap();
        assert_eq!(parsed.cuts()[0].audio_source(), "/mnt/a/audio/a.wav");
    }

    #[test]
    fn test_title_sanitized_for_file_name() {
        let artifact = PlaylistArtifact::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveTime::from_hms_opt(6, 5, 42).unwrap(),
            "Car Sale: 50%?",
        )
        .unwrap();
        assert_eq!(artifact.file_name(), "2024-01-01_0605_Car_Sale__50%_.tag");
    }

    #[test]
    fn test_multiline_title_rejected() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let time = NaiveTime::from_hms_opt(18, 0, 0).unwrap();
        let err = PlaylistArtifact::new(date, time, "PROMO\nDATE=1999-12-31").unwrap_err();
        assert!(matches!(err, ArtifactError::InvalidField { field: "title", .. }));
        assert_eq!(
            PlaylistArtifact::new(date, time, "   ").unwrap_err(),
            ArtifactError::MissingField("TITLE")
        );

        let mut artifact = promo();
        assert!(artifact.set_title("SALE\r\nTIME=00:00").is_err());
        assert_eq!(artifact.title(), "PROMO");
        artifact.set_title("  Weekend Sale ").unwrap();
        assert_eq!(artifact.title(), "Weekend Sale");
    }

    #[test]
    fn test_cut_fields_that_break_the_line_format_rejected() {
        let err = CutEntry::new("/a|b.wav", Duration::from_secs(1), "A").unwrap_err();
        assert!(matches!(err, ArtifactError::InvalidField { field: "audio source", .. }));
        assert!(CutEntry::new("  ", Duration::from_secs(1), "A").is_err());
        let err = CutEntry::new("/a.wav", Duration::from_secs(1), "A\nCUT=/x.wav|1|X").unwrap_err();
        assert!(matches!(err, ArtifactError::InvalidField { field: "cut label", .. }));

        // Pipes in labels stay in the final field.
        let cut = CutEntry::new(" /a.wav ", Duration::from_secs(1), "Buy | Now").unwrap();
        assert_eq!(cut.audio_source(), "/a.wav");
        let artifact = promo().with_cut(cut);
        let parsed = PlaylistArtifact::parse(&artifact.to_content(), None).unwrap();
        assert_eq!(parsed, artifact);
    }
}
