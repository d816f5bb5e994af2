use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::future::join_all;
use tracing::warn;

use crate::err::decode_error::ReError;

/// Components with a start/shutdown lifecycle: the capture adapter, the
/// sink workers. `Decoder` itself does not implement this — it has no I/O
/// of its own, it's driven synchronously by the capture thread.
#[async_trait::async_trait]
pub trait Server: Send {
    async fn start(&mut self);

    async fn shutdown(&mut self, graceful: bool) -> Result<(), ReError>;
}

/// Owns every `Server` in the process and shuts them all down together,
/// either explicitly or when dropped.
pub struct ShutdownHandle {
    shutdown: Arc<AtomicBool>,
    services: Vec<Box<dyn Server>>,
}

impl ShutdownHandle {
    #[inline]
    pub fn create() -> Self {
        Self {
            shutdown: Arc::new(AtomicBool::new(false)),
            services: vec![],
        }
    }

    #[inline]
    pub fn add_service(&mut self, server: Box<dyn Server>) {
        self.services.push(server);
    }

    pub async fn shutdown_services(&mut self, graceful: bool) -> Result<(), ReError> {
        let mut futures = vec![];
        for s in &mut self.services {
            futures.push(s.shutdown(graceful));
        }
        let results = join_all(futures).await;
        results.into_iter().find(|r| r.is_err()).unwrap_or(Ok(()))
    }
}

impl Drop for ShutdownHandle {
    fn drop(&mut self) {
        if let Ok(false) =
            self.shutdown
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::Acquire)
        {
            warn!("shutting down capture/sink services");
            let r = futures_executor::block_on(self.shutdown_services(true));
            warn!("services shut down: {:?}", r);
        }
    }
}
