//! # Moodtune Benchmarks
//!
//! Persistence paths that grow with history size.
//!
//! ```bash
//! cargo bench
//! cargo bench persistence
//! ```

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use moodtune::app::{AppState, Event};
use moodtune::db::SqliteStore;
use moodtune::mood::catalog;
use moodtune::persistence::Persistence;
use moodtune::song::{HistoryItem, Song};
use moodtune::store::{KeyValueStore, MemoryStore, HISTORY_KEY};
use std::hint::black_box;

/// `items` history entries of 10 songs each, with song 0 shared by all.
fn create_history(items: usize) -> Vec<HistoryItem> {
    let moods = catalog();
    (0..items)
        .map(|i| {
            let mut songs = vec![Song::new("Shared Song", "Shared Artist")];
            songs.extend((1..10).map(|j| Song::new(format!("Song {i}-{j}"), format!("Artist {j}"))));
            HistoryItem::new(moods[i % moods.len()].clone(), songs, 1_700_000_000_000 + i as i64)
        })
        .collect()
}

fn seeded_store(items: usize) -> MemoryStore {
    let mut store = MemoryStore::new();
    let json = serde_json::to_string(&create_history(items)).expect("Failed to serialize history");
    store.insert_raw(HISTORY_KEY, &json);
    store
}

fn benchmark_persistence(c: &mut Criterion) {
    let mut group = c.benchmark_group("persistence");

    for size in [10, 100, 500] {
        let store = seeded_store(size);

        group.bench_with_input(BenchmarkId::new("load_history", size), &store, |b, store| {
            b.iter_batched(
                || store.clone(),
                |store| black_box(Persistence::new(store).history().len()),
                BatchSize::SmallInput,
            )
        });

        group.bench_with_input(BenchmarkId::new("rating_fan_out", size), &store, |b, store| {
            let shared = Song::new("shared song", "SHARED ARTIST");
            b.iter_batched(
                || Persistence::new(store.clone()),
                |mut persistence| {
                    persistence
                        .set_rating(black_box(&shared), 4)
                        .expect("Rating in range");
                    persistence
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.bench_function("sqlite_set_get", |b| {
        let mut store = SqliteStore::open_in_memory().expect("Failed to open store");
        let json = serde_json::to_string(&create_history(50)).expect("Failed to serialize history");
        b.iter(|| {
            store.set(HISTORY_KEY, black_box(&json)).expect("Failed to write");
            black_box(store.get(HISTORY_KEY).expect("Failed to read"))
        })
    });

    group.finish();
}

fn benchmark_reducer(c: &mut Criterion) {
    let happy = catalog()[0].clone();
    let songs = create_history(1).remove(0).songs;

    c.bench_function("reducer_pick_to_results", |b| {
        b.iter(|| {
            let mut state = AppState::default();
            state.apply(Event::SelectMood(happy.clone()));
            let request = state.in_flight().expect("Request in flight");
            black_box(state.apply(Event::SongsLoaded {
                request,
                mood: happy.clone(),
                songs: songs.clone(),
            }))
        })
    });
}

criterion_group!(benches, benchmark_persistence, benchmark_reducer);
criterion_main!(benches);
