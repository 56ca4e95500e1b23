//! # Integration Tests for Cadence
//!
//! This module contains integration tests that exercise the full pipeline
//! from a user perspective: CSV import, dataset loading, and end-to-end
//! recommendation sessions driven by a recorded heart-rate series.

use anyhow::Result;
use cadence::dataset::Dataset;
use cadence::model::LatentFactorModel;
use cadence::session::{IntensityAdvice, SessionDriver, TickOutcome};
use cadence::{config, db};
use std::path::PathBuf;
use tempfile::TempDir;

/// Test helper: build a full reference data directory, import it, and write
/// a matching model artifact. Returns the temp dir with db and model paths.
fn create_test_environment() -> Result<(TempDir, PathBuf, PathBuf)> {
    let temp_dir = TempDir::new()?;
    let data_dir = temp_dir.path().join("data");
    std::fs::create_dir(&data_dir)?;

    std::fs::write(
        data_dir.join("members.csv"),
        "user_id,age,gender,weight_kg,height_m,workout_type\n\
         alice,30,F,62,1.68,Cardio\n\
         bob,45,M,85,1.82,Strength\n",
    )?;
    std::fs::write(
        data_dir.join("tracks.csv"),
        "track_id,name,artist,energy,duration_ms,cluster\n\
         t0,Red Zone,Pulse Unit,0.90,60000,1\n\
         t1,Steady State,Pulse Unit,0.60,60000,1\n\
         t2,Cool Stream,Low Tide,0.30,60000,1\n\
         t3,Half Measure,Low Tide,0.50,60000,1\n\
         t4,Uphill,Pulse Unit,0.75,60000,1\n\
         t5,Wind Down,Low Tide,0.20,60000,1\n",
    )?;
    // Reference workout: slow start, sharp climb, plateau.
    std::fs::write(
        data_dir.join("heart_rates.csv"),
        "user_id,bpm\nalice,100\nalice,102\nalice,150\nalice,151\n",
    )?;
    std::fs::write(
        data_dir.join("listening_history.csv"),
        "user_id,track_id\nalice,t5\n",
    )?;

    let db_path = temp_dir.path().join("fitness.db");
    let mut conn = db::connect(&db_path)?;
    db::init_schema(&conn)?;
    db::import_data_dir(&mut conn, &data_dir)?;

    let model_path = temp_dir.path().join("model.json");
    let model = LatentFactorModel {
        factors: 1,
        user_ids: vec!["alice".to_string(), "bob".to_string()],
        track_ids: ["t0", "t1", "t2", "t3", "t4", "t5"]
            .iter()
            .map(ToString::to_string)
            .collect(),
        user_factors: vec![vec![1.0], vec![0.8]],
        item_factors: vec![
            vec![0.6],
            vec![0.5],
            vec![0.4],
            vec![0.3],
            vec![0.2],
            vec![0.1],
        ],
    };
    model.save(&model_path)?;

    Ok((temp_dir, db_path, model_path))
}

mod database_integration_tests {
    use super::*;

    #[test]
    fn import_round_trips_all_reference_tables() -> Result<()> {
        let (_temp_dir, db_path, _model_path) = create_test_environment()?;
        let conn = db::connect(&db_path)?;

        let members = db::load_members(&conn)?;
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].user_id, "alice");
        assert_eq!(members[0].age, 30.0);
        assert_eq!(members[0].workout_type.as_deref(), Some("Cardio"));

        let tracks = db::load_tracks(&conn)?;
        assert_eq!(tracks.len(), 6);

        let clusters = db::load_clusters(&conn)?;
        assert_eq!(clusters.len(), 6);

        assert_eq!(db::load_heart_rates(&conn, "alice")?, vec![100, 102, 150, 151]);
        assert!(db::load_heart_rates(&conn, "bob")?.is_empty());

        let history = db::load_history(&conn)?;
        assert_eq!(history["alice"], vec!["t5"]);
        Ok(())
    }

    #[test]
    fn dataset_load_builds_the_shared_view() -> Result<()> {
        let (_temp_dir, db_path, model_path) = create_test_environment()?;
        let dataset = Dataset::load(&db_path, &model_path)?;

        assert_eq!(dataset.catalog.len(), 6);
        assert_eq!(dataset.members.len(), 2);
        assert!(dataset.model.is_some());
        assert_eq!(dataset.heart_rates["alice"], vec![100, 102, 150, 151]);

        // Alice's history maps to item index 5 through the model.
        let interactions = dataset.interactions();
        assert!(interactions[&0].contains(&5));
        Ok(())
    }

    #[test]
    fn dataset_tolerates_a_missing_model_artifact() -> Result<()> {
        let (temp_dir, db_path, _model_path) = create_test_environment()?;
        let absent = temp_dir.path().join("nope.json");
        let dataset = Dataset::load(&db_path, &absent)?;
        assert!(dataset.model.is_none());
        Ok(())
    }

    #[test]
    fn synthetic_seeding_makes_a_member_session_ready() -> Result<()> {
        let (_temp_dir, db_path, _model_path) = create_test_environment()?;
        let mut conn = db::connect(&db_path)?;

        assert!(db::load_heart_rates(&conn, "bob")?.is_empty());
        let series = db::seed_synthetic_heart_rates(&mut conn, "bob", 30)?;
        assert_eq!(series.len(), 30);
        assert_eq!(db::load_heart_rates(&conn, "bob")?, series);
        Ok(())
    }
}

mod session_integration_tests {
    use super::*;

    #[test]
    fn full_session_follows_the_recorded_workout() -> Result<()> {
        let (_temp_dir, db_path, model_path) = create_test_environment()?;
        let dataset = Dataset::load(&db_path, &model_path)?;

        let mut driver = SessionDriver::new(&dataset, 0)?;
        driver.start(10)?;

        let mut ticks = Vec::new();
        while let TickOutcome::Song(tick) = driver.tick()? {
            ticks.push(tick);
        }

        // One-minute tracks over a four-reading series: warm-up plus three
        // measured ticks, then the data runs out.
        assert_eq!(ticks.len(), 4);
        assert_eq!(ticks[0].minute, 0);
        assert_eq!(ticks[0].target_energy, 0.6);
        assert_eq!(ticks[0].advice, IntensityAdvice::WarmUp);
        // t1 matches the warm-up target exactly, so it beats the
        // higher-affinity but off-energy t0.
        assert_eq!(ticks[0].track.track_id, "t1");

        for (i, tick) in ticks.iter().enumerate().skip(1) {
            assert_eq!(tick.minute, i);
            assert!(tick.bpm_current.is_some());
            assert!(tick.bpm_previous.is_some());
            assert!((0.0..=1.0).contains(&tick.target_energy));
            assert_ne!(tick.advice, IntensityAdvice::WarmUp);
        }
        assert_eq!(ticks[1].bpm_current, Some(102));
        assert_eq!(ticks[1].bpm_previous, Some(100));
        assert_eq!(ticks[3].bpm_current, Some(151));
        assert_eq!(ticks[3].bpm_previous, Some(150));

        // No track is served twice.
        let mut ids: Vec<&str> = ticks.iter().map(|t| t.track.track_id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), ticks.len());
        Ok(())
    }

    #[test]
    fn history_tracks_are_excluded_from_the_pool() -> Result<()> {
        let (_temp_dir, db_path, model_path) = create_test_environment()?;
        let dataset = Dataset::load(&db_path, &model_path)?;

        let mut driver = SessionDriver::new(&dataset, 0)?;
        driver.start(10)?;

        let ids = driver.candidate_ids().expect("pool generated");
        assert_eq!(ids.len(), 5);
        assert!(!ids.contains(&"t5".to_string()), "already-heard track in pool");
        Ok(())
    }

    #[test]
    fn session_without_model_fails_to_start() -> Result<()> {
        let (temp_dir, db_path, _model_path) = create_test_environment()?;
        let absent = temp_dir.path().join("nope.json");
        let dataset = Dataset::load(&db_path, &absent)?;
        assert!(SessionDriver::new(&dataset, 0).is_err());
        Ok(())
    }

    #[test]
    fn member_without_heart_rates_cannot_start() -> Result<()> {
        let (_temp_dir, db_path, model_path) = create_test_environment()?;
        let dataset = Dataset::load(&db_path, &model_path)?;
        // Bob has a profile and model row but no recorded series.
        assert!(SessionDriver::new(&dataset, 1).is_err());
        Ok(())
    }

    #[test]
    fn tuned_margin_changes_the_serving_order() -> Result<()> {
        let (_temp_dir, db_path, model_path) = create_test_environment()?;
        let dataset = Dataset::load(&db_path, &model_path)?;

        // A huge margin makes every candidate an immediate hit, so the
        // warm-up tick serves the highest-affinity track instead of the
        // closest-energy one.
        let mut driver = SessionDriver::new(&dataset, 0)?.with_margin(1.0);
        driver.start(10)?;
        match driver.tick()? {
            TickOutcome::Song(tick) => assert_eq!(tick.track.track_id, "t0"),
            TickOutcome::Ended => panic!("session ended prematurely"),
        }
        Ok(())
    }
}

mod cli_tests {
    use clap::CommandFactory;
    use clap::Parser;

    #[test]
    fn cli_definition_is_consistent() {
        cadence::cli::Args::command().debug_assert();
    }

    #[test]
    fn session_arguments_parse() {
        let args = cadence::cli::Args::try_parse_from([
            "cadence", "session", "--user", "3", "--ticks", "20", "--margin", "0.1", "--verbose",
        ])
        .expect("session command should parse");

        match args.command {
            cadence::cli::Command::Session {
                user,
                ticks,
                margin,
                verbose,
                ..
            } => {
                assert_eq!(user, 3);
                assert_eq!(ticks, 20);
                assert_eq!(margin, Some(0.1));
                assert!(verbose);
            }
            _ => panic!("parsed into the wrong command"),
        }
    }

    #[test]
    fn global_path_overrides_parse() {
        let args = cadence::cli::Args::try_parse_from([
            "cadence",
            "members",
            "--db-path",
            "/tmp/other.db",
        ])
        .expect("members command should parse");
        assert_eq!(
            args.db_path,
            Some(std::path::PathBuf::from("/tmp/other.db"))
        );
    }
}

mod configuration_tests {
    use super::*;

    #[test]
    fn database_path_generation() -> Result<()> {
        let db_path = config::get_db_path()?;
        assert!(db_path.is_absolute());
        assert!(db_path.to_string_lossy().ends_with("fitness.db"));
        Ok(())
    }

    #[test]
    fn data_directory_creation() -> Result<()> {
        let data_dir = config::get_data_dir()?;
        assert!(data_dir.exists());
        assert!(data_dir.is_dir());
        Ok(())
    }

    #[test]
    fn runtime_config_with_explicit_paths() {
        let config = config::RuntimeConfig::with_paths(
            PathBuf::from("/tmp/test.db"),
            PathBuf::from("/tmp/model.json"),
        );
        assert_eq!(config.db_path, PathBuf::from("/tmp/test.db"));
        assert_eq!(config.model_path, PathBuf::from("/tmp/model.json"));
    }
}
