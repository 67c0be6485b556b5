use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;

use country_data::{CountryCollection, FallbackLoader, FileSource};
use globe_core::{OutlineSet, RebuildJob, RebuildTicket};
use tracing::{info, warn};

/// Dataset files tried when the settings do not list any.
pub const DEFAULT_DATASET_PATHS: &[&str] = &[
    "data/countries-110m.json",
    "data/countries.geojson",
];

pub struct RebuildResult {
    pub ticket: RebuildTicket,
    pub outlines: OutlineSet,
    dataset: Arc<CountryCollection>,
}

/// Runs outline rebuilds on worker threads.
///
/// The dataset is read from disk by the first rebuild and shared with later
/// ones, so a locale switch only re-projects.
pub struct DatasetWorker {
    paths: Vec<PathBuf>,
    dataset: Option<Arc<CountryCollection>>,
    tx: Sender<RebuildResult>,
    rx: Receiver<RebuildResult>,
}

impl DatasetWorker {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            paths,
            dataset: None,
            tx,
            rx,
        }
    }

    pub fn spawn(&self, job: RebuildJob) {
        let tx = self.tx.clone();
        let cached = self.dataset.clone();
        let paths = self.paths.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("outline-rebuild-{}", job.ticket.generation()))
            .spawn(move || {
                let dataset = cached.unwrap_or_else(|| Arc::new(load_dataset(&paths)));
                let outlines = job.run(&dataset);
                // The receiver is gone once the app has exited.
                let _ = tx.send(RebuildResult {
                    ticket: job.ticket,
                    outlines,
                    dataset,
                });
            });
        if let Err(err) = spawned {
            warn!("failed to start outline rebuild: {err}");
        }
    }

    /// Next finished rebuild, if any.
    pub fn try_recv(&mut self) -> Option<RebuildResult> {
        match self.rx.try_recv() {
            Ok(result) => {
                if self.dataset.is_none() {
                    self.dataset = Some(Arc::clone(&result.dataset));
                }
                Some(result)
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}

fn load_dataset(paths: &[PathBuf]) -> CountryCollection {
    let loader = paths
        .iter()
        .fold(FallbackLoader::new(), |loader, path| {
            loader.with_source(FileSource::new(path.clone()))
        });
    let collection = loader.load_or_empty();
    info!(features = collection.len(), "country dataset ready");
    collection
}

/// Command-line path first, then the configured paths, then the defaults.
pub fn dataset_paths(cli: Option<PathBuf>, configured: &[PathBuf]) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = cli.into_iter().collect();
    if configured.is_empty() {
        paths.extend(DEFAULT_DATASET_PATHS.iter().map(PathBuf::from));
    } else {
        paths.extend(configured.iter().cloned());
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_path_comes_first() {
        let paths = dataset_paths(Some("a.json".into()), &[]);
        assert_eq!(paths[0], PathBuf::from("a.json"));
        assert_eq!(paths.len(), 1 + DEFAULT_DATASET_PATHS.len());

        let configured = vec![PathBuf::from("b.json")];
        assert_eq!(dataset_paths(None, &configured), configured);
    }
}
