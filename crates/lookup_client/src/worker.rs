//! Background lookup thread.
//!
//! Requests go in over one mpsc channel, responses come back over another.
//! When several requests queue up while a lookup is in flight, only the newest
//! is run; the editor would discard answers to the older ones anyway.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::JoinHandle;
use std::time::Duration;

use formulatag_engine::{LookupRequest, LookupResponse, SuggestionSource};

pub struct LookupWorker {
    requests: Option<Sender<LookupRequest>>,
    responses: Receiver<LookupResponse>,
    handle: Option<JoinHandle<()>>,
}

impl LookupWorker {
    /// Spawn the lookup thread, which owns `source` for its lifetime.
    pub fn spawn<S>(source: S) -> std::io::Result<Self>
    where
        S: SuggestionSource + Send + 'static,
    {
        let (request_tx, request_rx) = mpsc::channel::<LookupRequest>();
        let (response_tx, response_rx) = mpsc::channel::<LookupResponse>();

        let handle = std::thread::Builder::new()
            .name("formulatag-lookup".to_string())
            .spawn(move || worker_main(source, request_rx, response_tx))?;

        Ok(Self {
            requests: Some(request_tx),
            responses: response_rx,
            handle: Some(handle),
        })
    }

    /// Queue a request. Returns false if the worker thread has gone away.
    pub fn submit(&self, request: LookupRequest) -> bool {
        match &self.requests {
            Some(tx) => tx.send(request).is_ok(),
            None => false,
        }
    }

    /// Next finished lookup, without blocking.
    pub fn try_recv(&self) -> Option<LookupResponse> {
        match self.responses.try_recv() {
            Ok(response) => Some(response),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Next finished lookup, waiting up to `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<LookupResponse> {
        match self.responses.recv_timeout(timeout) {
            Ok(response) => Some(response),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl Drop for LookupWorker {
    fn drop(&mut self) {
        // Closing the request channel ends the thread's receive loop
        self.requests.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("lookup worker panicked");
            }
        }
    }
}

// =============================================================================
// Thread entry point
// =============================================================================

fn worker_main<S: SuggestionSource>(
    source: S,
    requests: Receiver<LookupRequest>,
    responses: Sender<LookupResponse>,
) {
    log::debug!("lookup worker started");

    while let Ok(mut request) = requests.recv() {
        // Skip to the newest queued request
        while let Ok(newer) = requests.try_recv() {
            log::trace!("lookup #{} superseded by #{}", request.seq, newer.seq);
            request = newer;
        }

        let response = request.run(&source);
        if responses.send(response).is_err() {
            break;
        }
    }

    log::debug!("lookup worker stopped");
}
