//! Background fetch worker.
//!
//! The TUI event loop never blocks on the network: requests go to a worker
//! thread over a channel and completed outcomes are drained with
//! [`Fetcher::try_recv`] once per tick. Stale outcomes are filtered by the
//! controller's generation check, so the worker itself stays dumb.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use tracing::error;

use crate::api_client::BooksClient;
use crate::search::controller::{FetchOutcome, FetchRequest, FetchResult};

pub struct Fetcher {
    request_tx: Sender<FetchRequest>,
    outcome_rx: Receiver<FetchOutcome>,
    _worker: thread::JoinHandle<()>,
}

impl Fetcher {
    /// Spawn the worker thread. The thread exits when the `Fetcher` (and
    /// with it the request sender) is dropped.
    pub fn spawn(client: BooksClient) -> Self {
        let (request_tx, request_rx) = mpsc::channel::<FetchRequest>();
        let (outcome_tx, outcome_rx) = mpsc::channel::<FetchOutcome>();

        let worker = thread::spawn(move || {
            while let Ok(req) = request_rx.recv() {
                let result = match client.fetch_page(&req.params, req.start_index) {
                    Ok(list) => FetchResult::Page(list.items),
                    Err(e) => {
                        error!(target: "fetch", "page {} failed: {:#}", req.page, e);
                        FetchResult::Failed(e.to_string())
                    }
                };
                let outcome = FetchOutcome {
                    generation: req.generation,
                    page: req.page,
                    result,
                };
                if outcome_tx.send(outcome).is_err() {
                    break;
                }
            }
        });

        Self {
            request_tx,
            outcome_rx,
            _worker: worker,
        }
    }

    pub fn dispatch(&self, request: FetchRequest) {
        // Send only fails when the worker is gone, i.e. during shutdown.
        let _ = self.request_tx.send(request);
    }

    /// Non-blocking poll for a completed fetch.
    pub fn try_recv(&self) -> Option<FetchOutcome> {
        self.outcome_rx.try_recv().ok()
    }
}
