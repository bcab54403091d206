//! SQL for the commercial schedule, in `SQLite` dialect.
//!
//! Placeholder numbering follows the parameter structs in
//! `tagvault_core::domain::rows`; every placeholder a struct supplies is used.

use tagvault_core::ScheduleStatements;

/// Category value marking commercial rows in `playlist_events`.
pub const COMMERCIAL_CATEGORY: &str = "COMMERCIALS";

pub const LIST_CHANNELS: &str = "SELECT name FROM channels ORDER BY name COLLATE NOCASE";

/// `SlotKeyParams`: ?1 date, ?2 time.
pub const COUNT_SLOT: &str = "SELECT COUNT(*) AS taken FROM playlist_events \
     WHERE category = 'COMMERCIALS' AND scheduled_date = ?1 AND scheduled_time = ?2";

/// `CommercialRowParams`, matched on the slot (?2, ?3).
pub const UPDATE_BY_SLOT: &str = "UPDATE playlist_events \
     SET channel = ?1, file_path = ?4, title = ?5, duration_ms = ?6, updated_at = ?7 \
     WHERE category = 'COMMERCIALS' AND scheduled_date = ?2 AND scheduled_time = ?3";

/// `CommercialRowParams`.
pub const INSERT_COMMERCIAL: &str = "INSERT INTO playlist_events \
     (category, channel, scheduled_date, scheduled_time, file_path, title, duration_ms, updated_at) \
     VALUES ('COMMERCIALS', ?1, ?2, ?3, ?4, ?5, ?6, ?7)";

/// `RenameRowParams`: ?1 previous path, ?2.. new row.
pub const UPDATE_BY_PREVIOUS_PATH: &str = "UPDATE playlist_events \
     SET channel = ?2, scheduled_date = ?3, scheduled_time = ?4, file_path = ?5, \
         title = ?6, duration_ms = ?7, updated_at = ?8 \
     WHERE category = 'COMMERCIALS' AND file_path = ?1";

/// `PathKeyParams`.
pub const DELETE_BY_PATH: &str =
    "DELETE FROM playlist_events WHERE category = 'COMMERCIALS' AND file_path = ?1";

/// The full statement set for the schedule service.
pub fn schedule_statements() -> ScheduleStatements {
    ScheduleStatements {
        list_channels: LIST_CHANNELS.to_string(),
        count_slot: COUNT_SLOT.to_string(),
        update_by_slot: UPDATE_BY_SLOT.to_string(),
        insert_commercial: INSERT_COMMERCIAL.to_string(),
        update_by_previous_path: UPDATE_BY_PREVIOUS_PATH.to_string(),
        delete_by_path: DELETE_BY_PATH.to_string(),
    }
}
