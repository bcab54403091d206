//! Slot command handler.

use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Parse `YYYY-MM-DD` and `HH:MM`.
pub fn parse_slot(date: &str, time: &str) -> Result<(NaiveDate, NaiveTime), CliError> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|e| CliError::Arguments(format!("date {date:?}: {e}")))?;
    let time = NaiveTime::parse_from_str(time.trim(), "%H:%M")
        .map_err(|e| CliError::Arguments(format!("time {time:?}: {e}")))?;
    Ok((date, time))
}

pub async fn execute(ctx: &CliContext, date: &str, time: &str) -> Result<()> {
    let (date, time) = parse_slot(date, time)?;
    let taken = ctx.schedule().slot_taken(date, time, ctx.cancel()).await?;
    if taken {
        println!("{date} {} is taken", time.format("%H:%M"));
    } else {
        println!("{date} {} is free", time.format("%H:%M"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_slot() {
        let (date, time) = parse_slot("2024-03-09", " 18:30").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        assert_eq!(time, NaiveTime::from_hms_opt(18, 30, 0).unwrap());

        assert_eq!(parse_slot("09/03/2024", "18:30").unwrap_err().exit_code(), 2);
        assert_eq!(parse_slot("2024-03-09", "6pm").unwrap_err().exit_code(), 2);
    }
}
