//! Integration tests for job observers and stores.

use std::sync::Arc;
use std::thread;

use docshift::convert::{
    ConversionRequest, Engine, JobSnapshot, JobStatus, JobStore, MemoryJobStore, PROGRESS_PARSING,
};
use docshift::Format;
use uuid::Uuid;

fn updates_of(updates: &[JobSnapshot], id: Uuid) -> Vec<&JobSnapshot> {
    updates.iter().filter(|job| job.id == id).collect()
}

#[test]
fn test_progress_is_monotonic() {
    let (tx, rx) = crossbeam_channel::unbounded();
    let engine = Engine::new().with_observer(Arc::new(tx));

    let result = engine
        .convert(b"# Title\n\nbody", Format::Markdown, Format::Pdf)
        .unwrap();
    drop(engine);
    let updates: Vec<JobSnapshot> = rx.iter().collect();

    let progress: Vec<u8> = updates.iter().map(|job| job.progress).collect();
    assert_eq!(progress, vec![0, 0, PROGRESS_PARSING, 100]);
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));

    let statuses: Vec<JobStatus> = updates.iter().map(|job| job.status).collect();
    assert_eq!(
        statuses,
        vec![
            JobStatus::Pending,
            JobStatus::Processing,
            JobStatus::Processing,
            JobStatus::Completed
        ]
    );
    assert!(updates.iter().all(|job| job.id == result.job.id));
    assert_eq!(updates.last(), Some(&result.job));
}

#[test]
fn test_failed_job_never_reaches_100() {
    let (tx, rx) = crossbeam_channel::unbounded();
    let engine = Engine::new().with_observer(Arc::new(tx));

    assert!(engine
        .convert(&[0xFF], Format::Markdown, Format::Html)
        .is_err());
    drop(engine);

    let updates: Vec<JobSnapshot> = rx.iter().collect();
    let last = updates.last().unwrap();
    assert_eq!(last.status, JobStatus::Failed);
    assert!(last.error.as_deref().is_some_and(|e| !e.is_empty()));
    assert!(updates.iter().all(|job| job.progress < 100));
    assert!(updates.windows(2).all(|w| w[0].progress <= w[1].progress));
}

#[test]
fn test_store_tracks_final_state() {
    let store = Arc::new(MemoryJobStore::new());
    let engine = Engine::new().with_observer(store.clone());

    let ok = engine
        .convert(b"<p>fine</p>", Format::Html, Format::Markdown)
        .unwrap();
    assert_eq!(store.progress(&ok.job.id), Some(100));
    assert_eq!(store.get(&ok.job.id).unwrap().status, JobStatus::Completed);

    let err = engine
        .convert(&[0xFF], Format::Html, Format::Markdown)
        .unwrap_err();
    let failed_id = err.as_conversion().unwrap().job_id;
    let failed = store.get(&failed_id).unwrap();
    assert_eq!(failed.status, JobStatus::Failed);
    assert!(failed.progress < 100);

    assert_eq!(store.progress(&Uuid::new_v4()), None);
    assert_eq!(store.len(), 2);
    assert_eq!(store.all()[0].id, ok.job.id);
}

#[test]
fn test_oversized_input_publishes_nothing() {
    let store = Arc::new(MemoryJobStore::new());
    let options = docshift::ConvertOptions::new().with_max_input_bytes(4);
    let engine = Engine::with_options(options).with_observer(store.clone());

    assert!(engine
        .convert(b"way too long", Format::Markdown, Format::Html)
        .is_err());
    assert!(store.is_empty());
}

#[test]
fn test_batch_jobs_are_independent() {
    let store = Arc::new(MemoryJobStore::new());
    let engine = Engine::new().with_observer(store.clone());
    let requests: Vec<ConversionRequest> = (0..16)
        .map(|i| ConversionRequest::new(format!("# Doc {}", i), Format::Markdown, Format::Html))
        .collect();

    let results = engine.convert_batch(&requests);
    let ids: Vec<Uuid> = results.iter().map(|r| r.as_ref().unwrap().job.id).collect();

    assert_eq!(store.len(), 16);
    for (i, result) in results.iter().enumerate() {
        let result = result.as_ref().unwrap();
        assert_eq!(result.as_text(), Some(format!("<h1>Doc {}</h1>\n", i).as_str()));
        assert_eq!(store.progress(&result.job.id), Some(100));
    }
    let mut unique = ids.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), ids.len());
}

#[test]
fn test_concurrent_callers_share_one_engine() {
    let (tx, rx) = crossbeam_channel::unbounded();
    let engine = Arc::new(Engine::new().with_observer(Arc::new(tx)));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                engine
                    .convert(format!("item {}", i).as_bytes(), Format::Markdown, Format::Html)
                    .unwrap()
                    .job
                    .id
            })
        })
        .collect();
    let ids: Vec<Uuid> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    drop(engine);

    let updates: Vec<JobSnapshot> = rx.iter().collect();
    for id in ids {
        let own = updates_of(&updates, id);
        assert_eq!(own.len(), 4);
        assert!(own.windows(2).all(|w| w[0].progress <= w[1].progress));
        assert_eq!(own.last().unwrap().status, JobStatus::Completed);
    }
}
