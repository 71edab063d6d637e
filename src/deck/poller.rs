use super::{refresh, StatusClient, Surface};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

type Registry = Arc<Mutex<HashMap<String, Arc<dyn Surface>>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Keeps every visible surface up to date from one shared timer.
///
/// The timer task starts when the first surface appears and is aborted when the last one
/// disappears.
pub struct Poller {
    client: Arc<StatusClient>,
    interval: Duration,
    surfaces: Registry,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Poller {
    pub fn new(client: StatusClient, interval: Duration) -> Self {
        Poller {
            client: Arc::new(client),
            interval,
            surfaces: Arc::new(Mutex::new(HashMap::new())),
            task: Mutex::new(None),
        }
    }

    /// Register `surface` under `id` and render it right away.
    pub async fn appear(&self, id: impl Into<String>, surface: Arc<dyn Surface>) {
        let id = id.into();
        log::info!("Surface appeared: {}", id);

        {
            /* task before surfaces: the timer runs iff the registry is non-empty */
            let mut task = lock(&self.task);
            let mut surfaces = lock(&self.surfaces);
            surfaces.insert(id, Arc::clone(&surface));

            if task.is_none() {
                *task = Some(self.spawn());
            }
        }

        refresh(&self.client, surface.as_ref()).await;
    }

    pub fn disappear(&self, id: &str) {
        log::info!("Surface disappeared: {}", id);

        let mut task = lock(&self.task);
        let mut surfaces = lock(&self.surfaces);
        surfaces.remove(id);

        if surfaces.is_empty() {
            if let Some(handle) = task.take() {
                handle.abort();
                log::info!("Stopped EcoFlow power polling");
            }
        }
    }

    /// Refresh surface `id` immediately, outside the timer.
    pub async fn press(&self, id: &str) {
        let surface = lock(&self.surfaces).get(id).cloned();

        match surface {
            Some(surface) => refresh(&self.client, surface.as_ref()).await,
            None => log::warn!("Press on unknown surface: {}", id),
        }
    }

    pub fn active(&self) -> usize {
        lock(&self.surfaces).len()
    }

    pub fn is_polling(&self) -> bool {
        lock(&self.task).is_some()
    }

    fn spawn(&self) -> JoinHandle<()> {
        let client = Arc::clone(&self.client);
        let surfaces = Arc::clone(&self.surfaces);
        let interval = self.interval;

        log::info!(
            "Started EcoFlow power polling every {} seconds",
            interval.as_secs_f64()
        );

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            /* first tick completes immediately; `appear` already rendered */
            ticker.tick().await;

            loop {
                ticker.tick().await;

                let snapshot: Vec<Arc<dyn Surface>> = lock(&surfaces).values().cloned().collect();
                log::debug!("Polling power data for {} surfaces", snapshot.len());

                for surface in snapshot {
                    refresh(&client, surface.as_ref()).await;
                }
            }
        })
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        if let Some(handle) = lock(&self.task).take() {
            handle.abort();
        }
    }
}
