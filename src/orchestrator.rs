//! Runs the fallback chain for one request and persists the outcome.

use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    mock,
    models::{GenerateRequest, GenerateResponse, GenerationRecord, NewGeneration, StoredGeneration, TaggedBlueprint},
    provider::Provider,
    store::{GenerationStore, StoreError},
};

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("failed to save generation: {0}")] Store(#[from] StoreError),
    #[error("failed to serialize generation: {0}")] Serialize(#[from] serde_json::Error),
}

pub struct Generator {
    providers: Vec<Arc<dyn Provider>>,
    store: Arc<dyn GenerationStore>,
}

impl Generator {
    /// `providers` is the fallback order; only configured providers belong in it.
    pub fn new(providers: Vec<Arc<dyn Provider>>, store: Arc<dyn GenerationStore>) -> Self {
        Self { providers, store }
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// First provider to succeed wins; the mock is used when none does.
    pub async fn blueprint(&self, request: &GenerateRequest) -> TaggedBlueprint {
        for provider in &self.providers {
            info!(provider = provider.name(), "🚀 Trying provider");
            match provider.attempt(request).await {
                Ok(blueprint) => {
                    info!(provider = provider.name(), "✅ Provider produced a valid blueprint");
                    return TaggedBlueprint { blueprint, is_mock: false, source: provider.name().to_string() };
                }
                Err(e) => warn!(provider = provider.name(), error = %e, "❌ Provider failed, falling back"),
            }
        }

        warn!("🔄 No provider succeeded, using mock blueprint");
        TaggedBlueprint { blueprint: mock::mock_blueprint(request), is_mock: true, source: mock::SOURCE.to_string() }
    }

    pub async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, GenerateError> {
        let tagged = self.blueprint(&request).await;

        let stored = self
            .store
            .create(NewGeneration {
                idea: request.idea,
                roles_input: request.roles.join(", "),
                monetization_type: request.monetization.to_string(),
                tenant_type: request.tenant_type.to_string(),
                tech_stack: serde_json::to_string(&request.tech_stack)?,
                ai_response: serde_json::to_string(&tagged)?,
            })
            .await?;

        info!(id = %stored.id, source = %tagged.source, "💾 Generation saved");
        Ok(GenerateResponse { id: stored.id, is_mock: tagged.is_mock, data: tagged })
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<GenerationRecord>, StoreError> {
        self.store.find_by_id(id).await?.map(decode).transpose()
    }

    pub async fn find_all(&self) -> Result<Vec<GenerationRecord>, StoreError> {
        self.store.find_all().await?.into_iter().map(decode).collect()
    }
}

fn decode(row: StoredGeneration) -> Result<GenerationRecord, StoreError> {
    let id = row.id.to_string();
    GenerationRecord::try_from(row).map_err(|e| StoreError::Corrupt { id, reason: e.to_string() })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{
        models::{ArchitectureBlueprint, Monetization, TenantType},
        provider::{parse_blueprint, tests::VALID_BLUEPRINT, ProviderError},
        schema::check_shape,
        store::MemoryStore,
    };
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider double that either returns `VALID_BLUEPRINT` or fails, and
    /// counts how often it was asked.
    pub(crate) struct FakeProvider {
        name: &'static str,
        succeed: bool,
        pub(crate) calls: AtomicUsize,
    }

    impl FakeProvider {
        pub(crate) fn new(name: &'static str, succeed: bool) -> Arc<Self> {
            Arc::new(Self { name, succeed, calls: AtomicUsize::new(0) })
        }
    }

    #[async_trait]
    impl Provider for FakeProvider {
        fn name(&self) -> &'static str { self.name }

        async fn attempt(&self, _request: &GenerateRequest) -> Result<ArchitectureBlueprint, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.succeed { parse_blueprint(VALID_BLUEPRINT) } else { parse_blueprint("not json at all") }
        }
    }

    struct FailingStore;

    #[async_trait]
    impl GenerationStore for FailingStore {
        async fn create(&self, _new: NewGeneration) -> Result<StoredGeneration, StoreError> {
            Err(StoreError::Task("disk full".into()))
        }
        async fn find_by_id(&self, _id: Uuid) -> Result<Option<StoredGeneration>, StoreError> { Ok(None) }
        async fn find_all(&self) -> Result<Vec<StoredGeneration>, StoreError> { Ok(vec![]) }
    }

    pub(crate) fn freemium_request() -> GenerateRequest {
        GenerateRequest {
            idea: "A 35+ character description of a tool".into(),
            roles: vec!["Admin".into(), "User".into()],
            monetization: Monetization::Freemium,
            tenant_type: TenantType::Single,
            tech_stack: vec![],
        }
    }

    pub(crate) fn chain(fakes: &[Arc<FakeProvider>]) -> Vec<Arc<dyn Provider>> {
        fakes.iter().map(|f| f.clone() as Arc<dyn Provider>).collect()
    }

    fn generator(providers: Vec<Arc<dyn Provider>>) -> Generator {
        Generator::new(providers, Arc::new(MemoryStore::default()))
    }

    #[tokio::test]
    async fn no_providers_means_mock() {
        let g = generator(vec![]);
        let a = g.generate(freemium_request()).await.unwrap();
        let b = g.generate(freemium_request()).await.unwrap();
        assert!(a.is_mock);
        assert_eq!(a.data.source, "mock");
        assert_ne!(a.id, b.id);
        assert_eq!(a.data, b.data);
        check_shape(&serde_json::to_value(&a.data.blueprint).unwrap()).unwrap();
    }

    #[tokio::test]
    async fn primary_success_skips_secondary() {
        let primary = FakeProvider::new("openai", true);
        let secondary = FakeProvider::new("gemini", true);
        let g = generator(chain(&[primary.clone(), secondary.clone()]));
        let res = g.generate(freemium_request()).await.unwrap();
        assert!(!res.is_mock);
        assert_eq!(res.data.source, "openai");
        assert_eq!(primary.calls.load(Ordering::SeqCst), 1);
        assert_eq!(secondary.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn primary_failure_tries_secondary_once() {
        let primary = FakeProvider::new("openai", false);
        let secondary = FakeProvider::new("gemini", true);
        let g = generator(chain(&[primary.clone(), secondary.clone()]));
        let res = g.generate(freemium_request()).await.unwrap();
        assert_eq!(res.data.source, "gemini");
        assert!(!res.data.is_mock);
        assert_eq!(secondary.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn both_failing_falls_back_to_mock() {
        let primary = FakeProvider::new("openai", false);
        let secondary = FakeProvider::new("gemini", false);
        let g = generator(chain(&[primary.clone(), secondary.clone()]));
        let res = g.generate(freemium_request()).await.unwrap();
        assert!(res.is_mock);
        assert_eq!(res.data.blueprint, mock::mock_blueprint(&freemium_request()));
        assert_eq!(primary.calls.load(Ordering::SeqCst), 1);
        assert_eq!(secondary.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn persistence_failure_is_reported() {
        let g = Generator::new(vec![], Arc::new(FailingStore));
        assert!(matches!(g.generate(freemium_request()).await, Err(GenerateError::Store(_))));
    }

    #[tokio::test]
    async fn saved_record_round_trips() {
        let g = generator(chain(&[FakeProvider::new("gemini", true)]));
        let mut req = freemium_request();
        req.tech_stack = vec!["Rust".into(), "Axum".into(), "SQLite".into()];
        let res = g.generate(req).await.unwrap();

        let record = g.find_by_id(res.id).await.unwrap().unwrap();
        assert_eq!(record.tech_stack, vec!["Rust".to_string(), "Axum".to_string(), "SQLite".to_string()]);
        assert_eq!(record.ai_response, res.data);
        assert_eq!(record.roles_input, "Admin, User");
        assert_eq!(record.monetization_type, "freemium");
        assert_eq!(record.tenant_type, "single");

        assert_eq!(g.find_by_id(Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn history_is_newest_first() {
        let g = generator(vec![]);
        let first = g.generate(freemium_request()).await.unwrap();
        let second = g.generate(freemium_request()).await.unwrap();
        let ids: Vec<_> = g.find_all().await.unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }
}
