//! Graph metadata survives a write/read cycle through the filesystem and the
//! restored index answers queries exactly like the original.

#![cfg(feature = "hnsw")]

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use simcheck::hnsw::{HnswIndex, HnswParams, IndexState};
use simcheck::persistence::HnswMetadata;
use simcheck::progress::NoProgress;
use simcheck::{Embedding, IndexError};
use tempfile::TempDir;

fn dataset(n: usize, dim: usize) -> Vec<Embedding<String>> {
    let mut rng = StdRng::seed_from_u64(21);
    (0..n)
        .map(|i| {
            let v: Vec<f32> = (0..dim).map(|_| rng.random::<f32>() - 0.5).collect();
            Embedding::new(format!("doc-{i:03}"), v)
        })
        .collect()
}

fn built(data: &[Embedding<String>]) -> HnswIndex<String> {
    let mut index = HnswIndex::new(HnswParams {
        seed: Some(21),
        ..Default::default()
    })
    .unwrap();
    index.build_index(data.iter().cloned(), &mut NoProgress);
    index
}

#[test]
fn restored_index_matches_original() {
    let data = dataset(200, 24);
    let original = built(&data);

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hnsw.json");
    original
        .to_metadata()
        .write_json(BufWriter::new(File::create(&path).unwrap()))
        .unwrap();
    let metadata: HnswMetadata<String> =
        HnswMetadata::read_json(BufReader::new(File::open(&path).unwrap())).unwrap();

    let vectors: HashMap<&String, &Vec<f32>> = data.iter().map(|e| (&e.id, &e.vector)).collect();
    let restored = HnswIndex::restore(metadata, HnswParams::default(), |id| {
        vectors.get(id).map(|v| v.to_vec())
    })
    .unwrap();

    assert_eq!(restored.state(), IndexState::Built);
    assert_eq!(restored.len(), original.len());
    assert_eq!(restored.entry_point_id(), original.entry_point_id());
    assert_eq!(restored.level_max(), original.level_max());

    for e in data.iter().step_by(7) {
        let a: Vec<String> = original.search_knn(&e.vector, 10).unwrap().into_iter().map(|h| h.id).collect();
        let b: Vec<String> = restored.search_knn(&e.vector, 10).unwrap().into_iter().map(|h| h.id).collect();
        assert_eq!(a, b);
        assert_eq!(b[0], e.id);
    }
}

#[test]
fn metadata_is_plain_json_keyed_by_document_id() {
    let data = dataset(5, 4);
    let index = built(&data);

    let mut buf = Vec::new();
    index.to_metadata().write_json(&mut buf).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&buf).unwrap();

    assert_eq!(json["M"], 16);
    assert_eq!(json["efConstruction"], 200);
    assert!(json["entryPointId"].is_string());
    let per_node = json["perNode"].as_object().unwrap();
    assert_eq!(per_node.len(), 5);
    assert!(per_node.contains_key("doc-000"));
    assert!(per_node["doc-000"]["neighbors"][0].is_array());
}

#[test]
fn restore_without_vectors_fails() {
    let data = dataset(10, 4);
    let metadata = built(&data).to_metadata();
    let err = HnswIndex::restore(metadata, HnswParams::default(), |id: &String| {
        (id != "doc-004").then(|| vec![0.1; 4])
    })
    .unwrap_err();
    assert!(matches!(err, IndexError::UnknownId(_)), "{err}");
}

#[test]
fn truncated_file_is_a_serialization_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, br#"{"M": 16, "efConstruction": 200, "perNo"#).unwrap();
    let result: Result<HnswMetadata<String>, _> =
        HnswMetadata::read_json(File::open(&path).unwrap());
    assert!(matches!(result, Err(IndexError::Serialization(_))));
}
