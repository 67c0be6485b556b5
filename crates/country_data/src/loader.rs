use std::{fs, path::PathBuf};

use tracing::{debug, warn};

use crate::{CountryCollection, DatasetError, DatasetResult};

/// Anything that can produce a country collection.
pub trait DatasetSource: Send + Sync {
    /// Human-friendly identifier for logging purposes.
    fn describe(&self) -> String;

    fn load(&self) -> DatasetResult<CountryCollection>;
}

/// GeoJSON or TopoJSON document on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DatasetSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> DatasetResult<CountryCollection> {
        let text = fs::read_to_string(&self.path).map_err(|source| DatasetError::Io {
            path: self.path.clone(),
            source,
        })?;
        CountryCollection::from_json_str(&text)
    }
}

/// Tries each source in order; the first success wins.
#[derive(Default)]
pub struct FallbackLoader {
    sources: Vec<Box<dyn DatasetSource>>,
}

impl FallbackLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: impl DatasetSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    pub fn push(&mut self, source: Box<dyn DatasetSource>) {
        self.sources.push(source);
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Load from the first source that works, or return an empty collection.
    ///
    /// Failures are logged and never surface to the caller: the globe simply
    /// renders without outlines.
    pub fn load_or_empty(&self) -> CountryCollection {
        for source in &self.sources {
            match source.load() {
                Ok(collection) => {
                    debug!(
                        source = %source.describe(),
                        features = collection.len(),
                        "country dataset loaded"
                    );
                    return collection;
                }
                Err(err) => warn!(source = %source.describe(), "country dataset unavailable: {err}"),
            }
        }
        warn!("no country dataset could be loaded; continuing without outlines");
        CountryCollection::empty()
    }
}

impl std::fmt::Debug for FallbackLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.sources.iter().map(|s| s.describe()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CountryFeature;

    struct Fixed(DatasetResult<usize>);

    impl DatasetSource for Fixed {
        fn describe(&self) -> String {
            "fixed".into()
        }

        fn load(&self) -> DatasetResult<CountryCollection> {
            match &self.0 {
                Ok(n) => Ok(CountryCollection {
                    features: vec![CountryFeature::default(); *n],
                }),
                Err(_) => Err(DatasetError::Format("boom".into())),
            }
        }
    }

    #[test]
    fn falls_back_to_second_source() {
        let loader = FallbackLoader::new()
            .with_source(Fixed(Err(DatasetError::Format(String::new()))))
            .with_source(Fixed(Ok(3)));
        assert_eq!(loader.load_or_empty().len(), 3);
    }

    #[test]
    fn primary_wins_when_available() {
        let loader = FallbackLoader::new()
            .with_source(Fixed(Ok(1)))
            .with_source(Fixed(Ok(5)));
        assert_eq!(loader.load_or_empty().len(), 1);
    }

    #[test]
    fn total_failure_is_an_empty_collection() {
        let loader = FallbackLoader::new()
            .with_source(FileSource::new("/definitely/missing/countries.topojson"))
            .with_source(Fixed(Err(DatasetError::Format(String::new()))));
        assert!(loader.load_or_empty().is_empty());
        assert!(FallbackLoader::new().load_or_empty().is_empty());
    }

    #[test]
    fn missing_file_reports_io_error() {
        let err = FileSource::new("/definitely/missing.json").load().unwrap_err();
        assert!(matches!(err, DatasetError::Io { .. }));
    }
}
