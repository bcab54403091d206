//! End-to-end handler tests over file-backed SQLite replicas and temp targets.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{NaiveDate, NaiveTime};
use tagvault_cli::bootstrap::load_config;
use tagvault_cli::{CliContext, bootstrap, exit_code_for, handlers};
use tagvault_core::{ChannelTargets, CutEntry, PlaylistArtifact, TagVaultConfig};
use tagvault_db::TestReplicaSet;
use tempfile::TempDir;
use tokio_test::assert_ok;

fn artifact(title: &str, hour: u32) -> PlaylistArtifact {
    PlaylistArtifact::new(
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
        title,
    )
    .unwrap()
    .with_cut(CutEntry::new("/audio/spot-a.wav", Duration::from_secs(30), "Spot A").unwrap())
    .with_cut(CutEntry::new("/audio/spot-b.wav", Duration::from_secs(15), "Spot B").unwrap())
}

fn write_tag(dir: &Path, name: &str, artifact: &PlaylistArtifact) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, artifact.to_content()).unwrap();
    path
}

/// Write `config` to disk and load it back the way `main` does.
fn context_from_file(dir: &Path, config: &TagVaultConfig) -> CliContext {
    let path = dir.join("tagvault.json");
    std::fs::write(&path, serde_json::to_string_pretty(config).unwrap()).unwrap();
    let loaded = load_config(&path).unwrap();
    assert_eq!(&loaded, config);
    bootstrap(&loaded).unwrap()
}

#[tokio::test]
async fn test_save_then_delete_through_handlers() {
    let replicas = TestReplicaSet::new(2).await.unwrap();
    for index in 0..2 {
        replicas.seed_channel(index, "KXYZ").await.unwrap();
    }
    let targets = [TempDir::new().unwrap(), TempDir::new().unwrap()];
    let config = replicas.config(vec![ChannelTargets {
        name: "KXYZ".to_string(),
        targets: targets.iter().map(|t| t.path().to_path_buf()).collect(),
    }]);
    let work = TempDir::new().unwrap();
    let ctx = context_from_file(work.path(), &config);

    let promo = artifact("Morning Promo", 8);
    let local = write_tag(work.path(), "promo.tag", &promo);
    assert_ok!(handlers::save::execute(&ctx, "KXYZ", &local).await);

    let relative = ctx.schedule().relative_path(&promo);
    for target in &targets {
        let stored = std::fs::read_to_string(target.path().join(&relative)).unwrap();
        assert_eq!(stored, promo.to_content());
    }
    let stored_path = targets[0].path().join(&relative).display().to_string();
    for index in 0..2 {
        assert_eq!(replicas.rows_with_path(index, &stored_path).await.unwrap(), 1);
    }

    assert_ok!(handlers::list::execute(&ctx, "KXYZ").await);
    assert_ok!(handlers::slot::execute(&ctx, "2024-05-01", "08:00").await);

    assert_ok!(handlers::delete::execute(&ctx, "KXYZ", &local).await);
    for target in &targets {
        assert!(!target.path().join(&relative).exists());
    }
    for index in 0..2 {
        assert_eq!(replicas.rows_with_path(index, &stored_path).await.unwrap(), 0);
    }
}

#[tokio::test]
async fn test_rename_and_repair_through_handlers() {
    let replicas = TestReplicaSet::new(1).await.unwrap();
    replicas.seed_channel(0, "KXYZ").await.unwrap();
    let targets = [TempDir::new().unwrap(), TempDir::new().unwrap()];
    let config = replicas.config(vec![ChannelTargets {
        name: "KXYZ".to_string(),
        targets: targets.iter().map(|t| t.path().to_path_buf()).collect(),
    }]);
    let work = TempDir::new().unwrap();
    let ctx = context_from_file(work.path(), &config);

    let before = artifact("Drive Time", 17);
    let mut after = before.clone();
    after.set_title("Drive Time Extended").unwrap();
    let old_file = write_tag(work.path(), "before.tag", &before);
    let new_file = write_tag(work.path(), "after.tag", &after);

    assert_ok!(handlers::save::execute(&ctx, "KXYZ", &old_file).await);
    assert_ok!(handlers::rename::execute(&ctx, "KXYZ", &old_file, &new_file).await);

    let old_relative = ctx.schedule().relative_path(&before);
    let new_relative = ctx.schedule().relative_path(&after);
    for target in &targets {
        assert!(!target.path().join(&old_relative).exists());
        assert!(target.path().join(&new_relative).exists());
    }

    std::fs::remove_file(targets[1].path().join(&new_relative)).unwrap();
    assert_ok!(handlers::repair::execute(&ctx, "KXYZ", &new_file).await);
    let repaired = std::fs::read_to_string(targets[1].path().join(&new_relative)).unwrap();
    assert_eq!(repaired, after.to_content());
}

#[tokio::test]
async fn test_nothing_reachable_exits_unavailable() {
    let replicas = TestReplicaSet::new(0)
        .await
        .unwrap()
        .with_offline_profile("offline");
    let missing = TempDir::new().unwrap();
    let config = replicas.config(vec![ChannelTargets {
        name: "KXYZ".to_string(),
        targets: vec![missing.path().join("unmounted-a"), missing.path().join("unmounted-b")],
    }]);
    let work = TempDir::new().unwrap();
    let ctx = context_from_file(work.path(), &config);

    let local = write_tag(work.path(), "promo.tag", &artifact("Promo", 9));
    let err = handlers::save::execute(&ctx, "KXYZ", &local)
        .await
        .unwrap_err();
    assert_eq!(exit_code_for(&err), 75, "{err:#}");

    let err = handlers::list::execute(&ctx, "KXYZ").await.unwrap_err();
    assert_eq!(exit_code_for(&err), 75, "{err:#}");
}

#[tokio::test]
async fn test_bad_input_exits_with_usage_code() {
    let replicas = TestReplicaSet::new(1).await.unwrap();
    let target = TempDir::new().unwrap();
    let config = replicas.config(vec![ChannelTargets {
        name: "KXYZ".to_string(),
        targets: vec![target.path().to_path_buf()],
    }]);
    let work = TempDir::new().unwrap();
    let ctx = context_from_file(work.path(), &config);

    let local = write_tag(work.path(), "promo.tag", &artifact("Promo", 9));
    let err = handlers::save::execute(&ctx, "KNONE", &local)
        .await
        .unwrap_err();
    assert_eq!(exit_code_for(&err), 2, "{err:#}");

    let garbage = work.path().join("garbage.tag");
    std::fs::write(&garbage, "not a playlist").unwrap();
    let err = handlers::save::execute(&ctx, "KXYZ", &garbage)
        .await
        .unwrap_err();
    assert_eq!(exit_code_for(&err), 2, "{err:#}");

    let err = handlers::slot::execute(&ctx, "May 1st", "08:00")
        .await
        .unwrap_err();
    assert_eq!(exit_code_for(&err), 2);

    let err = handlers::save::execute(&ctx, "KXYZ", &work.path().join("absent.tag"))
        .await
        .unwrap_err();
    assert_eq!(exit_code_for(&err), 74);
}

#[tokio::test]
async fn test_init_schema_creates_missing_replica() {
    let replicas = TestReplicaSet::new(1)
        .await
        .unwrap()
        .with_offline_profile("fresh");
    let config = replicas.config(Vec::new());
    let work = TempDir::new().unwrap();
    let ctx = context_from_file(work.path(), &config);

    assert_ok!(handlers::init_schema::execute(&ctx).await);
    let created = replicas.root().join("fresh-unmounted/schedule.db");
    assert!(created.exists());
}
