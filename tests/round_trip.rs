//! In-process round-trip integration test (spec §8): generate random
//! records, write them as several input objects, run the full shuffle
//! coordinator over an in-memory store with the deterministic sequential
//! task runner, and check the outputs against a ground-truth in-memory
//! sort of the same records.

use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use sort_core::RECORD_SIZE;
use sort_runtime::SequentialTaskRunner;
use sort_store::memory::InMemoryObjectStore;
use sort_store::ObjectStore;

use orasort::config::Config;
use orasort::coordinator;

fn random_records(rng: &mut SmallRng, n: usize) -> Vec<[u8; RECORD_SIZE]> {
    (0..n)
        .map(|_| {
            let mut r = [0u8; RECORD_SIZE];
            rng.fill(&mut r[..]);
            r
        })
        .collect()
}

async fn run_sort(records: &[[u8; RECORD_SIZE]], num_input_objects: usize) -> Vec<[u8; RECORD_SIZE]> {
    let store = Arc::new(InMemoryObjectStore::new());
    let chunks = sort_core::array_split(records.to_vec(), num_input_objects);
    for (i, chunk) in chunks.into_iter().enumerate() {
        let mut w = store.open_write(&format!("in/{i}"), false).unwrap();
        for record in &chunk {
            std::io::Write::write_all(&mut w, record).unwrap();
        }
        w.finish().unwrap();
    }

    let config = Config {
        input_prefix: "in".to_string(),
        output_prefix: "out".to_string(),
        bucket: String::new(),
        max_parallelism: 4,
        worker_image: "test".to_string(),
    };

    let runner = SequentialTaskRunner;
    let summary = coordinator::run(&config, store.clone(), &runner).await.unwrap();

    let mut outputs = Vec::new();
    for id in 0..summary.output_objects {
        let key = format!("out/{id}");
        let mut reader = store.open_read(&key).unwrap();
        let mut data = Vec::new();
        std::io::Read::read_to_end(&mut reader, &mut data).unwrap();
        for chunk in data.chunks_exact(RECORD_SIZE) {
            outputs.push(<[u8; RECORD_SIZE]>::try_from(chunk).unwrap());
        }
    }
    outputs
}

#[tokio::test]
async fn sorted_output_matches_ground_truth_for_small_input() {
    let mut rng = SmallRng::seed_from_u64(7);
    let records = random_records(&mut rng, 500);

    let outputs = run_sort(&records, 5).await;

    let mut expected = records.clone();
    expected.sort_by(|a, b| a[..10].cmp(&b[..10]));

    assert_eq!(outputs.len(), expected.len());
    let actual_keys: Vec<&[u8]> = outputs.iter().map(|r| &r[..10]).collect();
    let expected_keys: Vec<&[u8]> = expected.iter().map(|r| &r[..10]).collect();
    assert_eq!(actual_keys, expected_keys);
}

#[tokio::test]
async fn sorted_output_matches_ground_truth_across_many_partitions() {
    let mut rng = SmallRng::seed_from_u64(99);
    let records = random_records(&mut rng, 2_000);

    let outputs = run_sort(&records, 17).await;

    let mut expected = records.clone();
    expected.sort_by(|a, b| a[..10].cmp(&b[..10]));

    let actual_keys: Vec<&[u8]> = outputs.iter().map(|r| &r[..10]).collect();
    let expected_keys: Vec<&[u8]> = expected.iter().map(|r| &r[..10]).collect();
    assert_eq!(actual_keys, expected_keys);
}

#[tokio::test]
async fn multiset_of_records_is_preserved() {
    let mut rng = SmallRng::seed_from_u64(13);
    let records = random_records(&mut rng, 300);

    let outputs = run_sort(&records, 3).await;

    let mut sorted_in: Vec<[u8; RECORD_SIZE]> = records.clone();
    let mut sorted_out: Vec<[u8; RECORD_SIZE]> = outputs;
    sorted_in.sort();
    sorted_out.sort();
    assert_eq!(sorted_in, sorted_out);
}

#[tokio::test]
async fn zero_pass_small_input_still_sorts_correctly() {
    // Far smaller than buffer_size_to_categorize, so the planner returns
    // num_passes == 0 and the coordinator must still sort correctly.
    let mut rng = SmallRng::seed_from_u64(3);
    let records = random_records(&mut rng, 10);

    let outputs = run_sort(&records, 2).await;

    let mut expected = records.clone();
    expected.sort_by(|a, b| a[..10].cmp(&b[..10]));
    let actual_keys: Vec<&[u8]> = outputs.iter().map(|r| &r[..10]).collect();
    let expected_keys: Vec<&[u8]> = expected.iter().map(|r| &r[..10]).collect();
    assert_eq!(actual_keys, expected_keys);
}
