use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use shared::library::DuplicateReport;
use tracing::{info, warn};

use crate::config::ScanConfig;
use crate::error::{DedupError, Result};
use crate::report::{build_report, removal_plan};
use crate::worker::start_scan;
use crate::TrackProvider;

pub struct Providers {
    providers: HashMap<String, Arc<dyn TrackProvider>>,
    default_provider: Option<String>,
}

impl Providers {
    pub fn get(&self, id: Option<&str>) -> Result<&Arc<dyn TrackProvider>> {
        let key = id
            .or(self.default_provider.as_deref())
            .ok_or(DedupError::NotConfigured)?;
        self.providers
            .get(key)
            .ok_or_else(|| DedupError::UnknownProvider(key.to_string()))
    }

    pub fn list(&self) -> Vec<(&str, &str)> {
        self.providers
            .values()
            .map(|p| (p.id(), p.name()))
            .collect()
    }
}

pub struct ProvidersBuilder {
    providers: HashMap<String, Arc<dyn TrackProvider>>,
    default_provider: Option<String>,
}

impl ProvidersBuilder {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: None,
        }
    }

    pub fn add(mut self, provider: impl TrackProvider + 'static) -> Self {
        let id = provider.id().to_string();
        if self.default_provider.is_none() {
            self.default_provider = Some(id.clone());
        }
        self.providers.insert(id, Arc::new(provider));
        self
    }

    pub fn default_provider(mut self, id: &str) -> Self {
        self.default_provider = Some(id.to_string());
        self
    }

    pub fn build(self) -> Result<Providers> {
        if self.providers.is_empty() {
            return Err(DedupError::NotConfigured);
        }
        if let Some(id) = &self.default_provider {
            if !self.providers.contains_key(id) {
                return Err(DedupError::UnknownProvider(id.clone()));
            }
        }

        Ok(Providers {
            providers: self.providers,
            default_provider: self.default_provider,
        })
    }
}

impl Default for ProvidersBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Finds duplicates in provider collections and removes the ones a user picks.
pub struct DedupService {
    providers: Providers,
    config: ScanConfig,
}

impl DedupService {
    pub fn new(providers: Providers, config: ScanConfig) -> Self {
        Self { providers, config }
    }

    pub fn providers(&self) -> &Providers {
        &self.providers
    }

    /// Fetch a collection and scan it for duplicates on a background task.
    pub async fn find_duplicates(
        &self,
        provider: Option<&str>,
        collection_id: &str,
    ) -> Result<DuplicateReport> {
        let provider = self.providers.get(provider)?;
        let started_at = Utc::now();

        let tracks = provider.fetch_tracks(collection_id).await?;
        let total_tracks = tracks.len();
        info!(
            "Fetched {} tracks from {} collection {}",
            total_tracks,
            provider.name(),
            collection_id
        );

        let handle = start_scan(tracks, &self.config);
        let scan_id = handle.id();
        let groups = handle.result().await?;

        Ok(build_report(
            scan_id,
            provider.id(),
            collection_id,
            total_tracks,
            groups,
            started_at,
        ))
    }

    /// Remove the selected duplicates from the collection the report was made for.
    pub async fn remove_duplicates(
        &self,
        report: &DuplicateReport,
        selected: &[String],
    ) -> Result<usize> {
        let ids = removal_plan(&report.groups, selected)?;
        if ids.is_empty() {
            return Ok(0);
        }

        let provider = self.providers.get(Some(&report.provider))?;
        match provider.remove_tracks(&report.collection_id, &ids).await {
            Ok(removed) => {
                info!(
                    "Removed {} duplicates from {} collection {}",
                    removed,
                    provider.name(),
                    report.collection_id
                );
                Ok(removed)
            }
            Err(e) => {
                warn!("{} failed to remove duplicates: {}", provider.name(), e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use shared::library::TrackRecord;
    use tokio::sync::Mutex;

    struct FakeProvider {
        id: &'static str,
        tracks: Vec<TrackRecord>,
        removed: Arc<Mutex<Vec<String>>>,
    }

    impl FakeProvider {
        fn new(id: &'static str, tracks: Vec<TrackRecord>) -> Self {
            Self {
                id,
                tracks,
                removed: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl TrackProvider for FakeProvider {
        fn id(&self) -> &'static str {
            self.id
        }

        fn name(&self) -> &'static str {
            "Fake"
        }

        async fn fetch_tracks(&self, collection_id: &str) -> Result<Vec<TrackRecord>> {
            if collection_id == "missing" {
                return Err(DedupError::Provider("playlist not found".to_string()));
            }
            Ok(self.tracks.clone())
        }

        async fn remove_tracks(&self, _collection_id: &str, track_ids: &[String]) -> Result<usize> {
            self.removed.lock().await.extend_from_slice(track_ids);
            Ok(track_ids.len())
        }
    }

    fn playlist() -> Vec<TrackRecord> {
        vec![
            TrackRecord::new("1", "Imagine", "John Lennon"),
            TrackRecord::new("2", "imagine ", "John  Lennon"),
            TrackRecord::new("3", "Yesterday", "The Beatles"),
            TrackRecord::new("1", "Imagine", "John Lennon"),
        ]
    }

    #[test]
    fn builder_requires_a_provider() {
        assert!(matches!(
            ProvidersBuilder::new().build(),
            Err(DedupError::NotConfigured)
        ));
    }

    #[test]
    fn builder_rejects_unknown_default() {
        let result = ProvidersBuilder::new()
            .add(FakeProvider::new("spotify", Vec::new()))
            .default_provider("jiosaavn")
            .build();
        assert!(matches!(result, Err(DedupError::UnknownProvider(_))));
    }

    #[test]
    fn first_provider_is_default() {
        let providers = ProvidersBuilder::new()
            .add(FakeProvider::new("spotify", Vec::new()))
            .add(FakeProvider::new("jiosaavn", Vec::new()))
            .build()
            .unwrap();

        assert_eq!(providers.get(None).unwrap().id(), "spotify");
        assert_eq!(providers.get(Some("jiosaavn")).unwrap().id(), "jiosaavn");
        assert!(providers.get(Some("itunes")).is_err());
        assert_eq!(providers.list().len(), 2);
    }

    #[tokio::test]
    async fn finds_and_removes_duplicates() {
        let provider = FakeProvider::new("spotify", playlist());
        let removed = provider.removed.clone();
        let service = DedupService::new(
            ProvidersBuilder::new().add(provider).build().unwrap(),
            ScanConfig::default(),
        );

        let report = service.find_duplicates(None, "pl-1").await.unwrap();
        assert_eq!(report.provider, "spotify");
        assert_eq!(report.collection_id, "pl-1");
        assert_eq!(report.total_tracks, 4);
        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.total_duplicate_tracks, 2);

        let count = service
            .remove_duplicates(&report, &["2".to_string()])
            .await
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(*removed.lock().await, vec!["2".to_string()]);
    }

    #[tokio::test]
    async fn rejects_selection_outside_the_report() {
        let provider = FakeProvider::new("spotify", playlist());
        let removed = provider.removed.clone();
        let service = DedupService::new(
            ProvidersBuilder::new().add(provider).build().unwrap(),
            ScanConfig::default(),
        );

        let report = service.find_duplicates(Some("spotify"), "pl-1").await.unwrap();
        let result = service.remove_duplicates(&report, &["3".to_string()]).await;

        assert!(matches!(result, Err(DedupError::UnknownDuplicate(_))));
        assert!(removed.lock().await.is_empty());
    }

    #[tokio::test]
    async fn provider_errors_propagate() {
        let service = DedupService::new(
            ProvidersBuilder::new()
                .add(FakeProvider::new("spotify", playlist()))
                .build()
                .unwrap(),
            ScanConfig::default(),
        );

        let result = service.find_duplicates(None, "missing").await;
        assert!(matches!(result, Err(DedupError::Provider(_))));
    }

    #[tokio::test]
    async fn empty_selection_skips_provider() {
        let provider = FakeProvider::new("spotify", playlist());
        let removed = provider.removed.clone();
        let service = DedupService::new(
            ProvidersBuilder::new().add(provider).build().unwrap(),
            ScanConfig::default(),
        );

        let report = service.find_duplicates(None, "pl-1").await.unwrap();
        assert_eq!(service.remove_duplicates(&report, &[]).await.unwrap(), 0);
        assert!(removed.lock().await.is_empty());
    }
}
