//! # Cadence Performance Benchmarks
//!
//! Benchmarks for the critical per-tick paths: fuzzy inference, candidate
//! pool generation, and energy-matched serving.
//!
//! ## Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench
//!
//! # Run specific benchmark group
//! cargo bench fuzzy
//! cargo bench recommender
//! ```

use cadence::fuzzy::FuzzyController;
use cadence::model::LatentFactorModel;
use cadence::recommender::{
    CandidateList, ClusterRecommender, CollaborativeRecommender, HybridRecommender, Recommender,
    TrackCandidate,
};
use cadence::track::{Catalog, TrackInfo};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::collections::HashMap;
use std::hint::black_box;
use std::sync::Arc;

/// Synthetic model and catalog sized like a realistic deployment.
fn create_benchmark_fixtures(tracks: usize, factors: usize) -> (Arc<LatentFactorModel>, Arc<Catalog>) {
    let track_ids: Vec<String> = (0..tracks).map(|i| format!("track_{i:05}")).collect();

    let item_factors: Vec<Vec<f32>> = (0..tracks)
        .map(|i| {
            (0..factors)
                .map(|f| ((i * 31 + f * 17) % 100) as f32 / 100.0)
                .collect()
        })
        .collect();
    let user_factors: Vec<Vec<f32>> = (0..50)
        .map(|u| (0..factors).map(|f| ((u * 13 + f * 7) % 100) as f32 / 100.0).collect())
        .collect();

    let model = Arc::new(LatentFactorModel {
        factors,
        user_ids: (0..50).map(|u| format!("user_{u:03}")).collect(),
        track_ids: track_ids.clone(),
        user_factors,
        item_factors,
    });

    let catalog = Arc::new(Catalog::new(
        track_ids
            .iter()
            .enumerate()
            .map(|(i, id)| TrackInfo {
                track_id: id.clone(),
                name: format!("Track {i:05}"),
                artist: format!("Artist {}", i % 40),
                energy: (i % 100) as f64 / 100.0,
                duration_ms: 180_000 + (i as u64 % 120) * 1_000,
            })
            .collect(),
    ));

    (model, catalog)
}

fn benchmark_fuzzy_inference(c: &mut Criterion) {
    let mut group = c.benchmark_group("fuzzy_inference");

    let controller = FuzzyController::default();
    group.bench_function("single_inference", |b| {
        b.iter(|| controller.infer(black_box(150.0), black_box(5.0), black_box(30.0)))
    });

    // Finer centroid grids cost proportionally more.
    for resolution in [0.05, 0.01, 0.001] {
        let controller = FuzzyController::with_resolution(resolution);
        group.bench_with_input(
            BenchmarkId::new("centroid_resolution", resolution),
            &controller,
            |b, controller| {
                b.iter(|| controller.infer(black_box(132.0), black_box(-3.0), black_box(42.0)))
            },
        );
    }

    // A full simulated workout: one inference per minute.
    group.bench_function("forty_five_minute_session", |b| {
        b.iter(|| {
            let mut previous = 90.0f64;
            for minute in 0..45 {
                let bpm = 90.0 + f64::from(minute) * 1.5;
                black_box(controller.infer(bpm, bpm - previous, 30.0));
                previous = bpm;
            }
        })
    });

    group.finish();
}

fn benchmark_recommender(c: &mut Criterion) {
    let mut group = c.benchmark_group("recommender");

    for tracks in [1_000usize, 10_000] {
        let (model, catalog) = create_benchmark_fixtures(tracks, 32);
        let clusters: Arc<HashMap<String, u32>> = Arc::new(
            model
                .track_ids
                .iter()
                .enumerate()
                .map(|(i, id)| (id.clone(), (i % 8) as u32))
                .collect(),
        );
        let history: Arc<HashMap<String, Vec<String>>> = Arc::new(
            [(
                "user_000".to_string(),
                model.track_ids.iter().take(30).cloned().collect(),
            )]
            .into_iter()
            .collect(),
        );

        group.bench_with_input(
            BenchmarkId::new("collaborative_generate", tracks),
            &tracks,
            |b, _| {
                b.iter(|| {
                    let mut recommender = CollaborativeRecommender::new(
                        Some(Arc::clone(&model)),
                        Arc::clone(&catalog),
                        HashMap::new(),
                    );
                    recommender.generate(black_box(0), black_box(100)).unwrap();
                })
            },
        );

        group.bench_with_input(
            BenchmarkId::new("hybrid_generate", tracks),
            &tracks,
            |b, _| {
                b.iter(|| {
                    let collaborative = CollaborativeRecommender::new(
                        Some(Arc::clone(&model)),
                        Arc::clone(&catalog),
                        HashMap::new(),
                    );
                    let content = ClusterRecommender::new(Arc::clone(&clusters));
                    let mut hybrid =
                        HybridRecommender::new(collaborative, content, Arc::clone(&history));
                    hybrid.generate(black_box(0), black_box(100)).unwrap();
                })
            },
        );
    }

    // Serving cost over a full pool drain.
    group.bench_function("drain_100_candidates", |b| {
        let template: Vec<TrackCandidate> = (0..100)
            .map(|i| TrackCandidate {
                track_id: format!("t{i}"),
                energy: (i % 100) as f64 / 100.0,
                affinity: 1.0 - (i as f64 / 100.0),
                served: false,
            })
            .collect();
        b.iter(|| {
            let mut list = CandidateList::new(template.clone());
            for minute in 0..100 {
                let target = 0.4 + (minute % 5) as f64 * 0.1;
                black_box(list.select_for_energy(target, 0.05).unwrap());
            }
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_fuzzy_inference, benchmark_recommender);
criterion_main!(benches);
