//! Background threads that talk to the store so the render loop never blocks.
//!
//! Global searches get their own thread so a slow search never delays
//! loading or saving a record.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use kvdesk_core::browse::{BrowseRequest, BrowseResponse};
use kvdesk_core::{
    GlobalRequest, GlobalResponse, RecordRequest, RecordResponse, RecordStore, Result,
    StoreConfig,
};

/// Store work other than global search
#[derive(Debug)]
pub enum StoreJob {
    ListKeys,
    Record(RecordRequest),
    GetConfig,
    PutConfig(String),
    Browse(BrowseRequest),
}

#[derive(Debug)]
pub enum StoreEvent {
    Keys(Result<Vec<String>>),
    Record(RecordResponse),
    Config(Result<StoreConfig>),
    ConfigSaved(Result<StoreConfig>),
    Listing(BrowseResponse),
}

impl StoreJob {
    pub fn run(self, store: &dyn RecordStore) -> StoreEvent {
        match self {
            StoreJob::ListKeys => StoreEvent::Keys(store.list_keys()),
            StoreJob::Record(request) => StoreEvent::Record(request.perform(store)),
            StoreJob::GetConfig => StoreEvent::Config(store.get_config()),
            StoreJob::PutConfig(db_path) => StoreEvent::ConfigSaved(store.put_config(&db_path)),
            StoreJob::Browse(request) => StoreEvent::Listing(request.perform(store)),
        }
    }
}

/// Answer every global search request in order.
///
/// Requests are not coalesced: the engine keeps at most one in flight and
/// waits for the response to the id it issued.
pub fn spawn_search_worker(
    store: Arc<dyn RecordStore>,
    req_rx: Receiver<GlobalRequest>,
    resp_tx: Sender<GlobalResponse>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        while let Ok(request) = req_rx.recv() {
            log::debug!("Search worker: #{} {:?}", request.id, request.term);
            if resp_tx.send(request.perform(store.as_ref())).is_err() {
                break;
            }
        }
    })
}

/// Run store jobs one at a time, in the order they were queued.
pub fn spawn_store_worker(
    store: Arc<dyn RecordStore>,
    job_rx: Receiver<StoreJob>,
    event_tx: Sender<StoreEvent>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        while let Ok(job) = job_rx.recv() {
            log::debug!("Store worker: {job:?}");
            if event_tx.send(job.run(store.as_ref())).is_err() {
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use kvdesk_test_utils::{FakeStore, Op};

    use super::*;

    #[test]
    fn every_search_request_gets_its_response() {
        let store = Arc::new(FakeStore::with_records([("alpha", "1"), ("beta", "2")]));
        let (req_tx, req_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();
        let handle = spawn_search_worker(store.clone(), req_rx, resp_tx);

        for (id, term) in [(1, "al"), (2, "be")] {
            req_tx
                .send(GlobalRequest {
                    id,
                    term: term.to_string(),
                })
                .unwrap();
        }
        drop(req_tx);
        handle.join().unwrap();

        let ids: Vec<_> = resp_rx.iter().map(|resp| resp.id).collect();
        assert_eq!(ids, [1, 2]);
        assert_eq!(store.calls_of(Op::Search).len(), 2);
    }

    #[test]
    fn store_jobs_run_in_order() {
        let store = Arc::new(FakeStore::with_records([("k", "v")]));
        let (job_tx, job_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let handle = spawn_store_worker(store, job_rx, event_tx);

        job_tx.send(StoreJob::ListKeys).unwrap();
        job_tx.send(StoreJob::PutConfig("/tmp/kv.db".to_string())).unwrap();
        drop(job_tx);
        handle.join().unwrap();

        let events: Vec<_> = event_rx.iter().collect();
        assert!(matches!(&events[0], StoreEvent::Keys(Ok(keys)) if keys == &["k"]));
        assert!(matches!(
            &events[1],
            StoreEvent::ConfigSaved(Ok(config)) if config.db_path.as_deref() == Some("/tmp/kv.db")
        ));
    }
}
