//! Scripted in-memory transports and a static resolver for integration tests.
//!
//! No sockets involved: the scripted transport fails a configurable number of
//! leading attempts per file and streams successful sends chunk by chunk, so
//! tests can assert call counts, ordering, and byte-level progress.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::Semaphore;

use ujm_core::job::UploadableFile;
use ujm_core::transport::{
    ChunkFn, HttpMethod, ResolverError, Transport, TransferError, TransportDescriptor,
    TransportResolver,
};

/// Resolver that maps every file to a fixed test destination.
pub struct StaticResolver;

#[async_trait]
impl TransportResolver for StaticResolver {
    async fn resolve(&self, file: &UploadableFile) -> Result<TransportDescriptor, ResolverError> {
        Ok(TransportDescriptor {
            url: format!("https://uploads.test/{}", file.name()),
            method: HttpMethod::Put,
            headers: HashMap::new(),
        })
    }
}

/// Transport with scripted outcomes: the first `fail_times` sends of a file
/// fail with HTTP 500, later sends succeed and stream the file through the
/// chunk callback in `chunk`-byte steps. Every send is counted per file and
/// recorded in submission order.
pub struct ScriptedTransport {
    chunk: u64,
    fail_times: HashMap<String, u32>,
    calls: Mutex<HashMap<String, u32>>,
    order: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new(chunk: u64, fail_times: &[(&str, u32)]) -> Self {
        Self {
            chunk: chunk.max(1),
            fail_times: fail_times
                .iter()
                .map(|(n, c)| (n.to_string(), *c))
                .collect(),
            calls: Mutex::new(HashMap::new()),
            order: Mutex::new(Vec::new()),
        }
    }

    /// Number of send() invocations seen for `name`.
    pub fn sends(&self, name: &str) -> u32 {
        self.calls.lock().unwrap().get(name).copied().unwrap_or(0)
    }

    /// File names in the order their sends started.
    pub fn order(&self) -> Vec<String> {
        self.order.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(
        &self,
        file: &UploadableFile,
        _descriptor: &TransportDescriptor,
        on_chunk: &ChunkFn<'_>,
    ) -> Result<(), TransferError> {
        let attempt = {
            let mut calls = self.calls.lock().unwrap();
            let n = calls.entry(file.name().to_string()).or_insert(0);
            *n += 1;
            *n
        };
        self.order.lock().unwrap().push(file.name().to_string());

        if let Some(fails) = self.fail_times.get(file.name()) {
            if attempt <= *fails {
                return Err(TransferError::Status {
                    file: file.name().to_string(),
                    status: 500,
                });
            }
        }

        let mut sent = 0u64;
        while sent < file.size() {
            sent = (sent + self.chunk).min(file.size());
            on_chunk(sent);
        }
        Ok(())
    }
}

/// Transport that parks every send until the test releases a permit; lets
/// tests observe the running set while jobs are held open mid-transfer.
pub struct GatedTransport {
    gate: Semaphore,
    started: AtomicUsize,
}

impl GatedTransport {
    pub fn new() -> Self {
        Self {
            gate: Semaphore::new(0),
            started: AtomicUsize::new(0),
        }
    }

    /// Number of sends that have begun.
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    /// Lets one parked send finish.
    pub fn release_one(&self) {
        self.gate.add_permits(1);
    }
}

#[async_trait]
impl Transport for GatedTransport {
    async fn send(
        &self,
        file: &UploadableFile,
        _descriptor: &TransportDescriptor,
        on_chunk: &ChunkFn<'_>,
    ) -> Result<(), TransferError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| TransferError::Network {
                file: file.name().to_string(),
                message: "gate closed".to_string(),
            })?;
        permit.forget();
        on_chunk(file.size());
        Ok(())
    }
}
