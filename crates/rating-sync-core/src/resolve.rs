use rating_sync_models::{ItemIds, MediaType};
use rating_sync_sources::{CatalogMatch, CatalogResolver, TitleQuery};
use tracing::debug;

/// Title used in lookups when the source gave none
pub const UNKNOWN_TITLE: &str = "Unknown";

fn accept(found: Option<CatalogMatch>) -> Option<String> {
    found.map(|m| m.id).filter(|id| !id.is_empty())
}

/// Two-stage lookup of the catalog subject for one rated title.
///
/// TMDB id first; the title stage runs only when that yields nothing. A
/// stage that errors counts as "nothing" so the other can still answer.
pub async fn resolve_catalog_id(
    resolver: &dyn CatalogResolver,
    ids: &ItemIds,
    title: &str,
    year: Option<u32>,
) -> Option<String> {
    if let Some(tmdb_id) = ids.tmdb_id {
        match resolver.match_by_tmdb(tmdb_id, MediaType::Movie).await {
            Ok(found) => {
                if let Some(id) = accept(found) {
                    return Some(id);
                }
            }
            Err(e) => debug!("TMDB stage failed for {} ({}): {}", title, tmdb_id, e),
        }
    }

    let imdb_id = ids.imdb();
    if title.is_empty() && imdb_id.is_none() {
        return None;
    }

    let query = TitleQuery {
        name: if title.is_empty() { UNKNOWN_TITLE.to_string() } else { title.to_string() },
        year,
        media_type: MediaType::Movie,
        imdb_id: imdb_id.map(str::to_string),
    };
    match resolver.match_by_title(&query).await {
        Ok(found) => accept(found),
        Err(e) => {
            debug!("Title stage failed for {} ({:?}): {}", title, year, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rating_sync_sources::SourceError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct ScriptedResolver {
        by_tmdb: Option<Result<Option<&'static str>, ()>>,
        by_title: Option<Result<Option<&'static str>, ()>>,
        calls: Mutex<Vec<String>>,
    }

    fn answer(script: &Option<Result<Option<&'static str>, ()>>) -> Result<Option<CatalogMatch>, SourceError> {
        match script {
            Some(Ok(Some(id))) => Ok(Some(CatalogMatch { id: id.to_string(), title: None })),
            Some(Ok(None)) | None => Ok(None),
            Some(Err(())) => Err(SourceError::new("lookup failed")),
        }
    }

    #[async_trait]
    impl CatalogResolver for ScriptedResolver {
        async fn match_by_tmdb(&self, tmdb_id: u32, _media_type: MediaType) -> Result<Option<CatalogMatch>, SourceError> {
            self.calls.lock().unwrap().push(format!("tmdb:{}", tmdb_id));
            answer(&self.by_tmdb)
        }

        async fn match_by_title(&self, query: &TitleQuery) -> Result<Option<CatalogMatch>, SourceError> {
            self.calls.lock().unwrap().push(format!("title:{}:{:?}:{:?}", query.name, query.year, query.imdb_id));
            answer(&self.by_title)
        }
    }

    fn ids(tmdb: Option<u32>, imdb: Option<&str>) -> ItemIds {
        ItemIds {
            tmdb_id: tmdb,
            imdb_id: imdb.map(str::to_string),
            ..ItemIds::default()
        }
    }

    #[tokio::test]
    async fn test_tmdb_hit_skips_title_stage() {
        let resolver = ScriptedResolver {
            by_tmdb: Some(Ok(Some("555"))),
            by_title: Some(Ok(Some("999"))),
            ..Default::default()
        };
        let id = resolve_catalog_id(&resolver, &ids(Some(1), Some("tt1")), "X", Some(2020)).await;
        assert_eq!(id.as_deref(), Some("555"));
        assert_eq!(*resolver.calls.lock().unwrap(), vec!["tmdb:1"]);
    }

    #[tokio::test]
    async fn test_falls_back_to_title_after_miss_or_error() {
        for tmdb in [Ok(None), Err(())] {
            let resolver = ScriptedResolver {
                by_tmdb: Some(tmdb),
                by_title: Some(Ok(Some("777"))),
                ..Default::default()
            };
            let id = resolve_catalog_id(&resolver, &ids(Some(1), Some("tt1")), "X", Some(2020)).await;
            assert_eq!(id.as_deref(), Some("777"));
            assert_eq!(
                *resolver.calls.lock().unwrap(),
                vec!["tmdb:1".to_string(), "title:X:Some(2020):Some(\"tt1\")".to_string()]
            );
        }
    }

    #[tokio::test]
    async fn test_imdb_only_uses_placeholder_title() {
        let resolver = ScriptedResolver {
            by_title: Some(Ok(Some("42"))),
            ..Default::default()
        };
        let id = resolve_catalog_id(&resolver, &ids(None, Some("tt42")), "", None).await;
        assert_eq!(id.as_deref(), Some("42"));
        assert_eq!(*resolver.calls.lock().unwrap(), vec!["title:Unknown:None:Some(\"tt42\")"]);
    }

    #[tokio::test]
    async fn test_both_stages_empty_or_failing() {
        let resolver = ScriptedResolver {
            by_tmdb: Some(Err(())),
            by_title: Some(Err(())),
            ..Default::default()
        };
        assert_eq!(resolve_catalog_id(&resolver, &ids(Some(1), None), "X", None).await, None);

        let resolver = ScriptedResolver {
            by_tmdb: Some(Ok(Some(""))),
            ..Default::default()
        };
        assert_eq!(resolve_catalog_id(&resolver, &ids(Some(1), None), "", None).await, None);
        assert_eq!(*resolver.calls.lock().unwrap(), vec!["tmdb:1"]);
    }
}
