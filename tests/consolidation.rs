mod common;

use common::{TestEnv, content, fixtures};
use fluxtidy::config::{self, FluxTidyConfig};
use fluxtidy::consolidation::{
    AgeAction, AggregateOptions, CleanAction, ColumnPartition, Consolidator, Granularity,
    ItemOutcome, MergeOptions, OperationError, PROVENANCE_TAG,
};
use fluxtidy::datamodel::{TidyDateTime, TidyDateTimeExt, Value};
use fluxtidy::storage::TimeSeriesStore;
use fluxtidy::test_utils::load_configuration_for_tests;
use serial_test::serial;
use std::collections::BTreeMap;

fn names(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

#[tokio::test]
async fn test_delete_backs_up_before_dropping() {
    let env = TestEnv::new(&fixtures::home_database());
    let outcome = env
        .consolidator
        .delete("temp_kitchen_old", true)
        .await
        .unwrap();

    assert_eq!(outcome, ItemOutcome::Deleted { backed_up: 3 });
    assert_eq!(env.store.point_count("temp_kitchen_old"), 0);
    let backup = env.backup_position("temp_kitchen_old").unwrap();
    let drop = env
        .journal
        .position("DROP MEASUREMENT \"temp_kitchen_old\"")
        .unwrap();
    assert!(backup < drop);

    let record = &env.sink.records_for("temp_kitchen_old")[0];
    assert_eq!(record.data_points, 3);
    assert_eq!(record.data.len(), 3);
}

#[tokio::test]
async fn test_delete_needs_confirmation() {
    let env = TestEnv::new(&fixtures::home_database());
    let result = env.consolidator.delete("cpu_load", false).await;
    assert_eq!(
        result,
        Err(OperationError::ConfirmationRequired {
            measurement: "cpu_load".to_string()
        })
    );
    assert!(env.journal.entries().is_empty());
    assert_eq!(env.store.point_count("cpu_load"), 40);
}

#[tokio::test]
async fn test_failed_backup_keeps_data() {
    let env = TestEnv::new(&fixtures::home_database());
    env.sink.set_failing(true);

    let result = env.consolidator.delete("cpu_load", true).await;
    assert!(matches!(result, Err(OperationError::BackupFailed { .. })));
    let result = env.consolidator.rename("cpu_load", "system_load").await;
    assert!(matches!(result, Err(OperationError::BackupFailed { .. })));

    assert_eq!(env.store.point_count("cpu_load"), 40);
    assert_eq!(env.store.point_count("system_load"), 0);
    assert!(env.journal.entries().is_empty());
}

#[tokio::test]
async fn test_rename_moves_every_point() {
    let env = TestEnv::new(&fixtures::home_database());
    let before = content(&env.store, "energy_meter", &[]);

    let outcome = env
        .consolidator
        .rename("energy_meter", "power_meter")
        .await
        .unwrap();
    assert_eq!(
        outcome,
        ItemOutcome::Renamed {
            target: "power_meter".to_string(),
            points: 120
        }
    );
    assert_eq!(env.store.point_count("energy_meter"), 0);
    assert_eq!(content(&env.store, "power_meter", &[]), before);

    let backup = env.backup_position("energy_meter").unwrap();
    let write = env.journal.position("WRITE \"power_meter\"").unwrap();
    let drop = env
        .journal
        .position("DROP MEASUREMENT \"energy_meter\"")
        .unwrap();
    assert!(backup < write && write < drop);
}

#[tokio::test]
async fn test_merge_is_associative() {
    let env = TestEnv::new(&fixtures::three_sources());
    let consolidator = &env.consolidator;

    consolidator
        .merge(&MergeOptions::new(names(&["alpha", "beta"]), "ab"))
        .await
        .unwrap();
    consolidator
        .merge(&MergeOptions::new(names(&["ab", "gamma"]), "ab_c"))
        .await
        .unwrap();

    consolidator
        .merge(&MergeOptions::new(names(&["beta", "gamma"]), "bc"))
        .await
        .unwrap();
    consolidator
        .merge(&MergeOptions::new(names(&["alpha", "bc"]), "a_bc"))
        .await
        .unwrap();

    let flat = consolidator
        .merge(&MergeOptions::new(names(&["alpha", "beta", "gamma"]), "abc"))
        .await
        .unwrap();
    assert_eq!(flat.total_points, 12);
    assert!(flat.is_complete());

    let ignored = [PROVENANCE_TAG];
    let left = content(&env.store, "ab_c", &ignored);
    assert_eq!(left.len(), 12);
    assert_eq!(left, content(&env.store, "a_bc", &ignored));
    assert_eq!(left, content(&env.store, "abc", &ignored));

    // Sources are never modified by a merge
    assert_eq!(env.store.point_count("alpha"), 4);
    assert!(
        env.journal
            .entries()
            .iter()
            .all(|entry| entry.starts_with("WRITE"))
    );
}

#[tokio::test]
async fn test_merge_records_provenance_and_mapping() {
    let env = TestEnv::new(&fixtures::three_sources());
    let mapping = BTreeMap::from([("tag_room".to_string(), "tag_zone".to_string())]);
    let outcome = env
        .consolidator
        .merge(&MergeOptions::new(names(&["alpha", "beta", "missing"]), "merged").with_tag_mapping(mapping))
        .await
        .unwrap();

    assert_eq!(outcome.total_points, 8);
    assert_eq!(outcome.skipped_empty, vec!["missing"]);
    let rows = env.store.rows("merged");
    assert!(rows.iter().all(|row| row.get("tag_room").is_none()));
    assert!(rows.iter().all(|row| row.get("tag_zone").is_some()));
    let from_beta = rows
        .iter()
        .filter(|row| row.get(PROVENANCE_TAG) == Some(&Value::from("beta")))
        .count();
    assert_eq!(from_beta, 4);
}

#[tokio::test]
async fn test_consolidate_by_pattern() {
    let env = TestEnv::new(&fixtures::home_database());
    let outcome = env
        .consolidator
        .consolidate_by_pattern("TEMP", "temperatures")
        .await
        .unwrap();
    assert_eq!(outcome.total_points, 15);
    assert_eq!(outcome.per_source.len(), 2);

    let result = env
        .consolidator
        .consolidate_by_pattern("pressure", "pressures")
        .await;
    assert_eq!(
        result,
        Err(OperationError::NoMatchingMeasurements {
            pattern: "pressure".to_string()
        })
    );
}

#[tokio::test]
async fn test_split_then_merge_restores_content() {
    let env = TestEnv::new(&fixtures::climate());
    let result = env
        .consolidator
        .split_by_tag("climate", "tag_room")
        .await
        .unwrap();

    assert!(result.all_succeeded());
    assert_eq!(
        result.succeeded(),
        vec!["climate_attic", "climate_garage", "climate_kitchen"]
    );
    for (_, item) in result.iter() {
        assert_eq!(item, &Ok(ItemOutcome::Written { points: 10 }));
    }
    let parts = env.store.rows("climate_kitchen");
    assert!(parts.iter().all(|row| row.get("tag_room").is_none()));
    assert!(
        parts
            .iter()
            .all(|row| row.get(PROVENANCE_TAG) == Some(&Value::from("climate")))
    );

    let outcome = env
        .consolidator
        .merge(&MergeOptions::new(
            names(&["climate_attic", "climate_garage", "climate_kitchen"]),
            "climate_merged",
        ))
        .await
        .unwrap();
    assert_eq!(outcome.total_points, 30);
    assert_eq!(
        content(&env.store, "climate_merged", &["tag_room", PROVENANCE_TAG]),
        content(&env.store, "climate", &["tag_room", PROVENANCE_TAG])
    );
    // The original is untouched
    assert_eq!(env.store.point_count("climate"), 30);
}

#[tokio::test]
async fn test_clean_low_data() {
    let env = TestEnv::new(&fixtures::home_database());

    let result = env
        .consolidator
        .clean_low_data(10, CleanAction::BackupOnly)
        .await
        .unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(
        result.get("temp_kitchen_old"),
        Some(&Ok(ItemOutcome::BackedUp { points: 3 }))
    );
    assert_eq!(env.store.point_count("temp_kitchen_old"), 3);

    env.journal.clear();
    let result = env
        .consolidator
        .clean_low_data(50, CleanAction::Delete)
        .await
        .unwrap();
    assert_eq!(
        result.succeeded(),
        vec!["cpu_load", "temp_kitchen", "temp_kitchen_old"]
    );
    assert_eq!(
        env.store.list_measurement_names().await.unwrap(),
        vec!["energy_meter"]
    );
    for name in ["cpu_load", "temp_kitchen", "temp_kitchen_old"] {
        let backup = env.backup_position(name).unwrap();
        let drop = env
            .journal
            .position(&format!("DROP MEASUREMENT \"{}\"", name))
            .unwrap();
        assert!(backup < drop, "{} dropped before its backup", name);
    }
}

#[tokio::test]
async fn test_clean_low_data_on_empty_store() {
    let env = TestEnv::empty();
    let result = env
        .consolidator
        .clean_low_data(10, CleanAction::Delete)
        .await
        .unwrap();
    assert!(result.is_empty());
    assert!(env.sink.records().is_empty());
}

#[tokio::test]
async fn test_aggregation_reducers() {
    let env = TestEnv::new(
        "\
http,tag_host=web requests_total=10i,peak_latency=120.0,min_free_memory=400.0,latency=100.0 1704067200000000000
http,tag_host=web requests_total=30i,peak_latency=180.0,min_free_memory=300.0,latency=200.0 1704069000000000000
http,tag_host=web requests_total=5i,peak_latency=90.0,min_free_memory=500.0,latency=80.0 1717200000000000000",
    );
    // 2024-02-01
    let cutoff = TidyDateTime::from_unix_seconds_i64(1_706_745_600);
    let outcome = env
        .consolidator
        .aggregate_old_data(&AggregateOptions::new("http", cutoff, Granularity::Hourly))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        ItemOutcome::Aggregated {
            target: "http_agg_hourly".to_string(),
            points: 1
        }
    );

    let rows = env.store.rows("http_agg_hourly");
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.get("requests_total"), Some(&Value::Float(40.0)));
    assert_eq!(row.get("peak_latency"), Some(&Value::Float(180.0)));
    assert_eq!(row.get("min_free_memory"), Some(&Value::Float(300.0)));
    assert_eq!(row.get("latency"), Some(&Value::Float(150.0)));
    assert_eq!(env.store.point_count("http"), 1);
}

#[tokio::test]
async fn test_age_based_aggregation_plans_granularity() {
    let env = TestEnv::empty();
    env.store.insert(&fixtures::dense_history("dense", 60_000));
    env.store.insert(&fixtures::dense_history("sparse", 5_000));
    // 2021-01-01, after all the history
    let cutoff = TidyDateTime::from_unix_seconds_i64(1_609_459_200);

    let result = env
        .consolidator
        .age_based_clean_before(&names(&["dense", "sparse"]), cutoff, AgeAction::Aggregate)
        .await;
    assert!(result.all_succeeded());
    assert!(matches!(
        result.get("dense"),
        Some(Ok(ItemOutcome::Aggregated { target, .. })) if target == "dense_agg_monthly"
    ));
    assert!(matches!(
        result.get("sparse"),
        Some(Ok(ItemOutcome::Aggregated { target, .. })) if target == "sparse_agg_daily"
    ));

    assert_eq!(env.store.point_count("dense"), 0);
    assert_eq!(env.sink.records_for("dense")[0].data_points, 60_000);
    let daily = env.store.rows("sparse_agg_daily");
    // 5000 minutes from midnight span four days
    assert_eq!(daily.len(), 4);
    assert_eq!(daily[0].get("reading"), Some(&Value::Float(719.5)));
}

#[tokio::test]
async fn test_age_based_delete_backs_up_everything() {
    let env = TestEnv::empty();
    env.store.insert(&fixtures::dense_history("history", 120));
    // One hour after the first point
    let cutoff = TidyDateTime::from_unix_seconds_i64(1_577_836_800 + 3_600);

    let result = env
        .consolidator
        .age_based_clean_before(&names(&["history"]), cutoff, AgeAction::Delete)
        .await;
    assert_eq!(
        result.get("history"),
        Some(&Ok(ItemOutcome::Deleted { backed_up: 120 }))
    );
    assert_eq!(env.store.point_count("history"), 60);
    let rows = env.store.rows("history");
    assert!(rows.iter().all(|row| row.time().unwrap() >= cutoff));

    let backup = env.backup_position("history").unwrap();
    let delete = env.journal.position("DELETE FROM \"history\"").unwrap();
    assert!(backup < delete);
}

#[tokio::test]
#[serial]
async fn test_partition_follows_configured_prefix() {
    let env = TestEnv::new(
        "\
legacy,t_site=north,region=eu value=1.0 1704067200000000000
legacy,t_site=south,region=eu value=2.0 1704067200000000000",
    );
    let config = temp_env::with_var("FLUXTIDY_TAG_PREFIX", Some("t_"), || {
        FluxTidyConfig::load().unwrap()
    });
    let consolidator = Consolidator::new(env.store.clone(), env.sink.clone())
        .with_partition(ColumnPartition::from(&config));
    assert!(consolidator.partition().is_tag("t_site"));
    assert!(!consolidator.partition().is_tag("region"));

    consolidator.rename("legacy", "sites").await.unwrap();
    // Both series survive because t_site is still a tag
    assert_eq!(env.store.point_count("sites"), 2);
    assert_eq!(
        env.store.list_tag_keys("sites").await.unwrap(),
        vec!["t_site"]
    );
    assert_eq!(
        env.store.list_field_keys("sites").await.unwrap(),
        vec!["region", "value"]
    );
}

#[tokio::test]
#[serial]
async fn test_shared_configuration() {
    load_configuration_for_tests().unwrap();
    let config = config::get().unwrap();
    let partition = ColumnPartition::from(config.as_ref());
    assert!(partition.is_tag(PROVENANCE_TAG));
    assert!(config.min_points > 0);
}
