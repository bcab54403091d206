//! Schedule statements executed through the replica endpoint.

use chrono::{NaiveDate, NaiveTime};
use tagvault_core::{
    CommercialRowParams, ConnectionProfile, DbValue, PathKeyParams, RenameRowParams,
    ReplicaEndpoint, SlotKeyParams, StatementParams,
};
use tagvault_db::statements::{
    COUNT_SLOT, DELETE_BY_PATH, INSERT_COMMERCIAL, LIST_CHANNELS, UPDATE_BY_PREVIOUS_PATH,
    UPDATE_BY_SLOT,
};
use tagvault_db::{SqliteReplicaEndpoint, initialize_replica};
use tempfile::TempDir;
use tokio_test::assert_ok;

async fn replica(dir: &TempDir) -> SqliteReplicaEndpoint {
    let path = dir.path().join("schedule.db");
    let profile = ConnectionProfile::new("studio", format!("sqlite://{}", path.display()));
    let pool = assert_ok!(initialize_replica(&profile).await);
    SqliteReplicaEndpoint::from_pool("studio", pool)
}

fn row(path: &str) -> CommercialRowParams {
    CommercialRowParams {
        channel: "KXYZ".to_string(),
        scheduled_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        scheduled_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
        file_path: path.to_string(),
        title: "PROMO".to_string(),
        duration_ms: 30_000,
        updated_at: "2024-01-01 00:00:00".to_string(),
    }
}

fn slot() -> SlotKeyParams {
    SlotKeyParams {
        scheduled_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        scheduled_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
    }
}

async fn slot_count(endpoint: &SqliteReplicaEndpoint) -> i64 {
    let rows = assert_ok!(endpoint.fetch(COUNT_SLOT, &slot().values()).await);
    rows[0].integer("taken").unwrap()
}

#[tokio::test]
async fn test_update_by_slot_matches_nothing_until_inserted() {
    let dir = TempDir::new().unwrap();
    let endpoint = replica(&dir).await;
    let params = row("/mnt/a/COMMERCIALS/2024-01-01_1800_PROMO.tag");

    assert_eq!(
        assert_ok!(endpoint.execute(UPDATE_BY_SLOT, &params.values()).await),
        0
    );
    assert_eq!(
        assert_ok!(endpoint.execute(INSERT_COMMERCIAL, &params.values()).await),
        1
    );
    assert_eq!(
        assert_ok!(endpoint.execute(UPDATE_BY_SLOT, &params.values()).await),
        1
    );
    assert_eq!(slot_count(&endpoint).await, 1);
}

#[tokio::test]
async fn test_rename_locates_row_by_previous_path() {
    let dir = TempDir::new().unwrap();
    let endpoint = replica(&dir).await;
    let old = row("/mnt/a/COMMERCIALS/old.tag");
    assert_ok!(endpoint.execute(INSERT_COMMERCIAL, &old.values()).await);

    let mut new = row("/mnt/a/COMMERCIALS/new.tag");
    new.scheduled_time = NaiveTime::from_hms_opt(19, 30, 0).unwrap();
    let rename = RenameRowParams {
        previous_path: old.file_path.clone(),
        row: new,
    };
    assert_eq!(
        assert_ok!(endpoint.execute(UPDATE_BY_PREVIOUS_PATH, &rename.values()).await),
        1
    );

    // The old slot is free again.
    assert_eq!(slot_count(&endpoint).await, 0);

    let key = PathKeyParams {
        file_path: "/mnt/a/COMMERCIALS/new.tag".to_string(),
    };
    assert_eq!(
        assert_ok!(endpoint.execute(DELETE_BY_PATH, &key.values()).await),
        1
    );
}

#[tokio::test]
async fn test_channel_listing_is_case_insensitively_ordered() {
    let dir = TempDir::new().unwrap();
    let endpoint = replica(&dir).await;
    for name in ["kzzz", "KAAA", "Kmmm"] {
        assert_ok!(
            endpoint
                .execute(
                    "INSERT INTO channels (name) VALUES (?1)",
                    &[DbValue::from(name)],
                )
                .await
        );
    }

    let rows = assert_ok!(endpoint.fetch(LIST_CHANNELS, &[]).await);
    let names: Vec<&str> = rows.iter().filter_map(|r| r.text("name")).collect();
    assert_eq!(names, vec!["KAAA", "Kmmm", "kzzz"]);
}
