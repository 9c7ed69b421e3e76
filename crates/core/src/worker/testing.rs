//! Scripted network and worker builders for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use url::Url;

use super::{CacheWorker, LocalHost, WorkerConfig};
use crate::cache::CacheDb;
use crate::http::{Fetch, Request, Response, ResponseType};
use crate::Error;

pub(crate) const ORIGIN: &str = "https://app.test";

pub(crate) fn url(path: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(path).unwrap()
}

#[derive(Clone)]
enum Route {
    Reply { status: u16, body: String, response_type: ResponseType },
    Opaque,
    Fail,
}

/// Network stub answering from a fixed route table and recording every request.
#[derive(Default)]
pub(crate) struct StubNetwork {
    routes: HashMap<String, Route>,
    calls: Mutex<Vec<Request>>,
}

impl StubNetwork {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reply(self, target: &str, status: u16, body: &str) -> Self {
        self.reply_typed(target, status, body, ResponseType::Basic)
    }

    pub(crate) fn reply_typed(mut self, target: &str, status: u16, body: &str, response_type: ResponseType) -> Self {
        let route = Route::Reply { status, body: body.to_string(), response_type };
        self.routes.insert(resolve(target).to_string(), route);
        self
    }

    /// Answer with an already-filtered opaque response.
    pub(crate) fn opaque(mut self, target: &str) -> Self {
        self.routes.insert(resolve(target).to_string(), Route::Opaque);
        self
    }

    pub(crate) fn fail(mut self, target: &str) -> Self {
        self.routes.insert(resolve(target).to_string(), Route::Fail);
        self
    }

    pub(crate) fn calls(&self) -> Vec<Request> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

fn resolve(target: &str) -> Url {
    Url::parse(target).unwrap_or_else(|_| url(target))
}

#[async_trait]
impl Fetch for StubNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        self.calls.lock().unwrap().push(request.clone());
        match self.routes.get(request.url.as_str()).cloned() {
            Some(Route::Opaque) => Ok(Response::opaque(request.url.as_str())),
            Some(Route::Reply { status, body, response_type }) => Ok(Response::new(status, body)
                .with_type(response_type)
                .with_url(request.url.as_str())),
            Some(Route::Fail) | None => Err(Error::Network(format!("{}: connection refused", request.url))),
        }
    }
}

pub(crate) fn config(version: &str, seeds: &[&str]) -> WorkerConfig {
    WorkerConfig {
        cache_name: version.to_string(),
        seed_resources: seeds.iter().map(|s| url(s)).collect(),
        offline_page: None,
    }
}

pub(crate) fn worker_on(
    db: CacheDb,
    network: StubNetwork,
    config: WorkerConfig,
) -> CacheWorker<StubNetwork, LocalHost> {
    CacheWorker::new(db, network, LocalHost::default(), config)
}

pub(crate) async fn worker(network: StubNetwork, config: WorkerConfig) -> CacheWorker<StubNetwork, LocalHost> {
    worker_on(CacheDb::open_in_memory().await.unwrap(), network, config)
}
