//! Driver-neutral row values, the forward-only row cursor handed to read
//! mappers, and typed statement parameters.
//!
//! Statement parameters bind by position: slot `i` of
//! [`StatementParams::slots`] is placeholder `?{i+1}` in the SQL text. Both
//! the update and insert statement of a self-healing pair can therefore
//! share one parameter struct and reference slots in any order.

use std::fmt;
use std::iter;
use std::vec;

use chrono::{NaiveDate, NaiveTime};

/// Date format used for `scheduled_date` columns.
pub const DATE_COLUMN_FORMAT: &str = "%Y-%m-%d";
/// Time format used for `scheduled_time` columns.
pub const TIME_COLUMN_FORMAT: &str = "%H:%M";

/// A single column value as returned by (or bound to) a replica endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum DbValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl DbValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for DbValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Real(v) => write!(f, "{v}"),
            Self::Text(s) => write!(f, "'{s}'"),
            Self::Blob(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

impl From<&str> for DbValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for DbValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for DbValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for DbValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// One result row: named columns in select order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DbRow {
    columns: Vec<(String, DbValue)>,
}

impl DbRow {
    pub const fn new() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<DbValue>) -> Self {
        self.push(column, value);
        self
    }

    pub fn push(&mut self, column: impl Into<String>, value: impl Into<DbValue>) {
        self.columns.push((column.into(), value.into()));
    }

    /// Look up a column by name (case-insensitive, like SQL identifiers).
    pub fn get(&self, column: &str) -> Option<&DbValue> {
        self.columns
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .map(|(_, value)| value)
    }

    pub fn get_index(&self, index: usize) -> Option<&DbValue> {
        self.columns.get(index).map(|(_, value)| value)
    }

    pub fn text(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(DbValue::as_str)
    }

    pub fn integer(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(DbValue::as_i64)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// A forward-only, non-restartable sequence of rows whose first row is
/// already available.
///
/// Read mappers receive one of these and consume it. A cursor is never
/// empty: an empty result set never reaches a mapper.
#[derive(Debug)]
pub struct RowCursor {
    first: DbRow,
    rest: vec::IntoIter<DbRow>,
}

impl RowCursor {
    /// Position a cursor on the first row; `None` for an empty result.
    pub fn open(rows: Vec<DbRow>) -> Option<Self> {
        let mut rest = rows.into_iter();
        let first = rest.next()?;
        Some(Self { first, rest })
    }

    /// The row the cursor is positioned on.
    pub const fn first(&self) -> &DbRow {
        &self.first
    }

    /// Total rows in the sequence, including the first.
    pub fn len(&self) -> usize {
        self.rest.len() + 1
    }

    pub const fn is_empty(&self) -> bool {
        false
    }
}

impl IntoIterator for RowCursor {
    type Item = DbRow;
    type IntoIter = iter::Chain<iter::Once<DbRow>, vec::IntoIter<DbRow>>;

    fn into_iter(self) -> Self::IntoIter {
        iter::once(self.first).chain(self.rest)
    }
}

/// Strongly-typed parameters for one statement.
///
/// Implementors enumerate their named slots in bind order. Names exist for
/// logging and documentation; binding is positional.
pub trait StatementParams: Send + Sync {
    fn slots(&self) -> Vec<(&'static str, DbValue)>;

    /// Values in bind order.
    fn values(&self) -> Vec<DbValue> {
        self.slots().into_iter().map(|(_, value)| value).collect()
    }
}

/// Parameters for statements without placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoParams;

impl StatementParams for NoParams {
    fn slots(&self) -> Vec<(&'static str, DbValue)> {
        Vec::new()
    }
}

fn date_value(date: NaiveDate) -> DbValue {
    DbValue::Text(date.format(DATE_COLUMN_FORMAT).to_string())
}

fn time_value(time: NaiveTime) -> DbValue {
    DbValue::Text(time.format(TIME_COLUMN_FORMAT).to_string())
}

/// Schedule slot key: `?1` = date, `?2` = time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotKeyParams {
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
}

impl StatementParams for SlotKeyParams {
    fn slots(&self) -> Vec<(&'static str, DbValue)> {
        vec![
            ("scheduled_date", date_value(self.scheduled_date)),
            ("scheduled_time", time_value(self.scheduled_time)),
        ]
    }
}

/// Stored file path key: `?1` = path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathKeyParams {
    pub file_path: String,
}

impl StatementParams for PathKeyParams {
    fn slots(&self) -> Vec<(&'static str, DbValue)> {
        vec![("file_path", DbValue::Text(self.file_path.clone()))]
    }
}

/// All fields of a commercial schedule row.
///
/// Slots: `?1` channel, `?2` date, `?3` time, `?4` path, `?5` title,
/// `?6` duration in milliseconds, `?7` update timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommercialRowParams {
    pub channel: String,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    pub file_path: String,
    pub title: String,
    pub duration_ms: i64,
    pub updated_at: String,
}

impl StatementParams for CommercialRowParams {
    fn slots(&self) -> Vec<(&'static str, DbValue)> {
        vec![
            ("channel", DbValue::Text(self.channel.clone())),
            ("scheduled_date", date_value(self.scheduled_date)),
            ("scheduled_time", time_value(self.scheduled_time)),
            ("file_path", DbValue::Text(self.file_path.clone())),
            ("title", DbValue::Text(self.title.clone())),
            ("duration_ms", DbValue::Integer(self.duration_ms)),
            ("updated_at", DbValue::Text(self.updated_at.clone())),
        ]
    }
}

/// Rename: locate by previous path, rewrite to the new row fields.
///
/// Slots: `?1` previous path, then the [`CommercialRowParams`] slots shifted
/// by one (`?2` channel ... `?8` update timestamp).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameRowParams {
    pub previous_path: String,
    pub row: CommercialRowParams,
}

impl StatementParams for RenameRowParams {
    fn slots(&self) -> Vec<(&'static str, DbValue)> {
        let mut slots = vec![("previous_path", DbValue::Text(self.previous_path.clone()))];
        slots.extend(self.row.slots());
        slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_is_positioned_on_first_row() {
        let rows = vec![
            DbRow::new().with("name", "KAAA"),
            DbRow::new().with("name", "KBBB"),
        ];
        let cursor = RowCursor::open(rows).unwrap();
        assert_eq!(cursor.first().text("NAME"), Some("KAAA"));
        assert_eq!(cursor.len(), 2);

        let names: Vec<String> = cursor
            .into_iter()
            .filter_map(|r| r.text("name").map(str::to_string))
            .collect();
        assert_eq!(names, vec!["KAAA", "KBBB"]);
    }

    #[test]
    fn test_cursor_refuses_empty_result() {
        assert!(RowCursor::open(Vec::new()).is_none());
    }

    #[test]
    fn test_rename_params_prefix_previous_path() {
        let params = RenameRowParams {
            previous_path: "/a/old.tag".to_string(),
            row: CommercialRowParams {
                channel: "KXYZ".to_string(),
                scheduled_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                scheduled_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
                file_path: "/a/new.tag".to_string(),
                title: "PROMO".to_string(),
                duration_ms: 30_000,
                updated_at: "2024-01-01 00:00:00".to_string(),
            },
        };
        let slots = params.slots();
        assert_eq!(slots.len(), 8);
        assert_eq!(slots[0].0, "previous_path");
        assert_eq!(slots[2].1, DbValue::Text("2024-01-01".to_string()));
        assert_eq!(slots[3].1, DbValue::Text("18:00".to_string()));
        assert_eq!(slots[6].1, DbValue::Integer(30_000));
    }
}
