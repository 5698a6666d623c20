use std::sync::{Mutex, PoisonError};

use tracing::info;

use super::{ContentType, Language, SearchRequest, SearchResultRow};
use crate::aggregate::lore::{LoreClient, LoreError};
use crate::aggregate::{ResultAggregator, plan};
use crate::index::{IndexEngine, IndexError, LanguageIndexRegistry};
use crate::router::{ExecutionPath, QueryRouter, RemoteError, RemoteSearchClient};

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("{0}")]
    Index(#[from] IndexError),

    #[error("{0}")]
    Remote(#[from] RemoteError),

    #[error("{0}")]
    Lore(#[from] LoreError),
}

/// Entry point for callers: answers search requests and reports whether a
/// language's indexes are available yet.
pub struct SearchService<E, L> {
    router: QueryRouter,
    registry: LanguageIndexRegistry<E>,
    aggregator: ResultAggregator<L>,
    remote: RemoteSearchClient,
    search_lang: Mutex<Language>,
}

impl<E: IndexEngine, L: LoreClient> SearchService<E, L> {
    pub fn new(
        router: QueryRouter,
        registry: LanguageIndexRegistry<E>,
        aggregator: ResultAggregator<L>,
        remote: RemoteSearchClient,
    ) -> Self {
        Self {
            router,
            registry,
            aggregator,
            remote,
            search_lang: Mutex::new(Language::default()),
        }
    }

    pub async fn search(
        &self,
        request: &SearchRequest,
    ) -> Result<Vec<SearchResultRow>, SearchError> {
        let language = request.language();
        info!(
            query = %request.query(),
            content_type = %request.content_type(),
            %language,
            "search"
        );

        if request.content_type() == ContentType::Lore {
            let rows = self.aggregator.search_lore(request.query(), language).await?;
            info!(rows = rows.len(), "lore search complete");
            return Ok(rows);
        }

        let rows = match self.router.route() {
            ExecutionPath::Local => {
                let mut indexes: Vec<ContentType> =
                    plan(request).into_iter().map(|sub| sub.index).collect();
                indexes.dedup();
                self.registry.ensure_ready(language, &indexes).await?;
                self.aggregator
                    .execute(self.registry.engine(language), request)?
            }
            ExecutionPath::RemoteDev => self.remote.search_dev(request).await?,
            ExecutionPath::RemoteProd => self.remote.search_prod(request).await?,
        };
        info!(rows = rows.len(), "search complete");
        Ok(rows)
    }

    /// Whether searches in `language` can be answered without waiting on an
    /// index build. Remote execution never waits.
    pub fn language_ready(&self, language: Language) -> bool {
        match self.router.route() {
            ExecutionPath::Local => self.registry.language_ready(language),
            ExecutionPath::RemoteDev | ExecutionPath::RemoteProd => true,
        }
    }

    pub fn is_ingesting(&self, language: Language) -> bool {
        self.router.route() == ExecutionPath::Local && self.registry.is_ingesting(language)
    }

    pub fn search_language(&self) -> Language {
        *self.search_lang.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Switches the default search language, falling back to English for
    /// unsupported codes, and builds its indexes if they are missing.
    pub async fn set_search_language(&self, code: &str) -> Result<Language, SearchError> {
        let language = Language::from_code_or_default(code);
        *self.search_lang.lock().unwrap_or_else(PoisonError::into_inner) = language;
        info!(%language, "search language set");

        if self.router.route() == ExecutionPath::Local
            && !self.registry.is_ready(language, ContentType::Item)
        {
            self.ingest(language).await?;
        }
        Ok(language)
    }

    /// Builds every searchable index of `language`.
    pub async fn ingest(&self, language: Language) -> Result<(), SearchError> {
        self.registry
            .ensure_ready(language, &ContentType::SEARCHABLE)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::extracts::ExtractStore;
    use crate::aggregate::lore::{LoreData, LoreHit};
    use crate::aggregate::tests::MockLore;
    use crate::filter::Filter;
    use crate::index::testing::{StubEngine, row};
    use crate::router::ExecutionContext;
    use crate::search::Region;
    use futures::future::join_all;
    use reqwest::Client;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const UNREACHABLE: &str = "http://127.0.0.1:1";

    fn service(
        context: ExecutionContext,
        prod_url: &str,
        lore: MockLore,
    ) -> SearchService<StubEngine, MockLore> {
        let registry = LanguageIndexRegistry::new(|_| {
            StubEngine::default()
                .with_delay(Duration::from_millis(5))
                .with_rows(ContentType::Item, vec![row(1, "Iron Ore"), row(2, "Iron Ingot")])
                .with_rows(ContentType::Npc, vec![row(3, "Cid")])
        });
        SearchService::new(
            QueryRouter::new(context, false),
            registry,
            ResultAggregator::new(lore, Region::Global, ExtractStore::default()),
            RemoteSearchClient::new(Client::new(), UNREACHABLE, prod_url),
        )
    }

    fn local() -> SearchService<StubEngine, MockLore> {
        service(ExecutionContext::Embedded, UNREACHABLE, MockLore::default())
    }

    #[tokio::test]
    async fn local_search_builds_needed_index_once() {
        let svc = local();
        assert!(!svc.language_ready(Language::En));

        let request = SearchRequest::new("iron", ContentType::Recipe, Language::En)
            .with_filters(vec![Filter::equals("level", 50)]);
        let results = join_all((0..4).map(|_| svc.search(&request))).await;

        for rows in results {
            let rows = rows.unwrap();
            assert_eq!(rows.len(), 2);
            assert!(rows.iter().all(|r| r.content_type() == ContentType::Recipe));
        }
        let engine = svc.registry.engine(Language::En);
        assert_eq!(engine.build_count(ContentType::Item), 1);
        assert_eq!(engine.total_builds(), 1);
        assert!(svc.registry.is_ready(Language::En, ContentType::Item));
    }

    #[tokio::test]
    async fn any_search_builds_whole_language() {
        let svc = local();
        let rows = svc
            .search(&SearchRequest::new("", ContentType::Any, Language::Fr))
            .await
            .unwrap();

        let tags: Vec<ContentType> = rows.iter().map(|r| r.content_type()).collect();
        assert_eq!(
            tags,
            vec![ContentType::Item, ContentType::Item, ContentType::Npc]
        );
        assert!(svc.language_ready(Language::Fr));
        assert!(!svc.language_ready(Language::En));
    }

    #[tokio::test]
    async fn set_search_language_falls_back_and_ingests() {
        let svc = local();
        assert_eq!(svc.search_language(), Language::En);

        let lang = svc.set_search_language("pt-BR").await.unwrap();
        assert_eq!(lang, Language::En);
        assert!(svc.language_ready(Language::En));

        let lang = svc.set_search_language("ja").await.unwrap();
        assert_eq!(lang, Language::Ja);
        assert_eq!(svc.search_language(), Language::Ja);
        assert!(svc.language_ready(Language::Ja));

        svc.set_search_language("ja").await.unwrap();
        assert_eq!(svc.registry.engine(Language::Ja).build_count(ContentType::Item), 1);
    }

    #[tokio::test]
    async fn remote_search_skips_local_indexes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("type", "Npc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"type": "Npc", "id": 3, "name": "Cid"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let svc = service(ExecutionContext::Remote, &server.uri(), MockLore::default());
        assert!(svc.language_ready(Language::En));

        let rows = svc
            .search(&SearchRequest::new("cid", ContentType::Npc, Language::En))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(svc.registry.engine(Language::En).total_builds(), 0);
        assert!(!svc.is_ingesting(Language::En));
    }

    #[tokio::test]
    async fn remote_application_errors_propagate() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad filter"))
            .mount(&server)
            .await;

        let svc = service(ExecutionContext::Remote, &server.uri(), MockLore::default());
        let err = svc
            .search(&SearchRequest::new("x", ContentType::Item, Language::En))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SearchError::Remote(RemoteError::Status { code: 400, .. })
        ));
    }

    #[tokio::test]
    async fn lore_bypasses_routing() {
        let lore = MockLore::with_hits(vec![LoreHit {
            source: "Quest".into(),
            source_id: 65,
            text: Some("A realm reborn".into()),
            data: LoreData::default(),
        }]);
        let svc = service(ExecutionContext::Remote, UNREACHABLE, lore);

        let rows = svc
            .search(&SearchRequest::new("realm", ContentType::Lore, Language::Ko))
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].content_type(), ContentType::Lore);
        assert_eq!(rows[0].display_name(), "A realm reborn");
        match &rows[0] {
            SearchResultRow::Lore(hit) => assert!(hit.data.show_button),
            other => panic!("unexpected row {other:?}"),
        }
    }
}
