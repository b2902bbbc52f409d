use nightwords_core::{SleepNight, SleepStore, StoreConfig, StoreError};
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(5);

fn closed_night(start: i64, end: i64, quality: i32) -> SleepNight {
    SleepNight {
        night_id: 0,
        start_time_milli: start,
        end_time_milli: end,
        sleep_quality: quality,
    }
}

#[test]
fn insert_assigns_increasing_ids_and_lists_newest_first() {
    let store = SleepStore::open_in_memory().unwrap();

    let first = store.insert(&closed_night(0, 10, 1)).wait().unwrap();
    let second = store.insert(&closed_night(20, 30, 2)).wait().unwrap();
    assert_eq!(first, 1);
    assert!(second > first);

    let nights = store.get_all_nights().wait().unwrap();
    let ids: Vec<i64> = nights.iter().map(|night| night.night_id).collect();
    assert_eq!(ids, vec![second, first]);
}

#[test]
fn open_night_is_latest_only_while_open() {
    let store = SleepStore::open_in_memory().unwrap();
    assert_eq!(store.get_open_night().wait().unwrap(), None);

    let id = store.insert(&SleepNight::starting_at(1_000)).wait().unwrap();
    let tonight = store.get_open_night().wait().unwrap().unwrap();
    assert_eq!(tonight.night_id, id);
    assert!(tonight.is_open());

    let mut closed = tonight.clone();
    closed.close_at(5_000);
    store.update(&closed).wait().unwrap();
    assert_eq!(store.get_open_night().wait().unwrap(), None);
    assert_eq!(store.get(id).wait().unwrap(), Some(closed));
}

#[test]
fn update_of_missing_night_is_not_found() {
    let store = SleepStore::open_in_memory().unwrap();
    let mut ghost = closed_night(0, 10, 3);
    ghost.night_id = 77;

    let err = store.update(&ghost).wait().unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(store.get(77).wait().unwrap(), None);
}

#[test]
fn clear_removes_everything_and_ids_are_not_reused() {
    let store = SleepStore::open_in_memory().unwrap();
    store.insert(&closed_night(0, 10, 1)).wait().unwrap();
    let last = store.insert(&closed_night(20, 30, 2)).wait().unwrap();

    assert_eq!(store.clear().wait().unwrap(), 2);
    assert!(store.get_all_nights().wait().unwrap().is_empty());

    let next = store.insert(&closed_night(40, 50, 3)).wait().unwrap();
    assert!(next > last);
}

#[test]
fn subscription_sees_snapshot_after_every_write() {
    let store = SleepStore::open_in_memory().unwrap();
    let updates = store.subscribe();
    let initial = updates.wait_next(WAIT).unwrap();
    assert!(initial.is_empty());

    let id = store.insert(&closed_night(0, 10, 1)).wait().unwrap();
    // The snapshot is published before the write's reply.
    let after_insert = updates.latest().unwrap();
    assert_eq!(after_insert.len(), 1);
    assert_eq!(after_insert[0].night_id, id);

    store.get(id).wait().unwrap();
    assert_eq!(updates.latest(), None);

    store.clear().wait().unwrap();
    assert!(updates.latest().unwrap().is_empty());
}

#[test]
fn overlapping_submissions_keep_call_order() {
    let store = SleepStore::open_in_memory().unwrap();

    let calls: Vec<_> = (0..50)
        .map(|i| store.insert(&closed_night(i * 100, i * 100 + 50, -1)))
        .collect();
    let ids: Vec<i64> = calls.into_iter().map(|call| call.wait().unwrap()).collect();
    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));

    let nights = store.get_all_nights().wait().unwrap();
    for (night, i) in nights.iter().zip((0..50).rev()) {
        assert_eq!(night.start_time_milli, i * 100);
    }
}

#[test]
fn concurrent_writers_all_land() {
    let store = SleepStore::open_in_memory().unwrap();
    let workers: Vec<_> = (0..4)
        .map(|worker| {
            let store = store.clone();
            std::thread::spawn(move || {
                for i in 0..25 {
                    let start = worker * 10_000 + i * 10;
                    store
                        .insert(&closed_night(start, start + 5, 2))
                        .wait_timeout(WAIT)
                        .unwrap();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(store.get_all_nights().wait().unwrap().len(), 100);
}

#[test]
fn file_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::file(dir.path().join("sleep_history.db"));

    {
        let store = SleepStore::open(&config).unwrap();
        store.insert(&closed_night(0, 10, 4)).wait().unwrap();
    }

    let store = SleepStore::open(&config).unwrap();
    let nights = store.get_all_nights().wait().unwrap();
    assert_eq!(nights.len(), 1);
    assert_eq!(nights[0].sleep_quality, 4);
}

#[test]
fn dropping_last_handle_drains_queue() {
    let store = SleepStore::open_in_memory().unwrap();
    let pending = store.insert(&closed_night(0, 10, 1));
    drop(store);

    match pending.wait() {
        Ok(id) => assert_eq!(id, 1),
        Err(StoreError::WorkerGone) => panic!("queued request was dropped"),
        Err(other) => panic!("unexpected error: {other}"),
    }
}
