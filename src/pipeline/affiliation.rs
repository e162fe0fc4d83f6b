//! Affiliation resolution: ordered lookups, fill-missing merge, registry geocoding.

use indexmap::IndexMap;

use crate::models::{AffiliationProfile, Author, ResearcherProfile};
use crate::sources::AffiliationLookup;
use crate::utils::{CacheError, RorTable, SnapshotCache, StageOptions, StageProgress};

/// Cached affiliation profiles keyed by author id
pub type AffiliationCache = IndexMap<String, AffiliationProfile>;

/// Resolves organizational profiles from an ordered list of lookups
///
/// Earlier lookups take priority: later ones only fill fields that are still
/// empty. The registry identifier of the merged profile is then joined against
/// the reference table.
#[derive(Debug)]
pub struct AffiliationResolver {
    lookups: Vec<Box<dyn AffiliationLookup>>,
    ror_table: RorTable,
}

impl AffiliationResolver {
    pub fn new(lookups: Vec<Box<dyn AffiliationLookup>>, ror_table: RorTable) -> Self {
        Self { lookups, ror_table }
    }

    /// Resolve one author; lookup failures leave their fields empty
    pub async fn resolve(&self, author: &Author) -> AffiliationProfile {
        let mut profile = AffiliationProfile::default();

        for lookup in &self.lookups {
            if !lookup.applies(author, &profile) {
                continue;
            }
            match lookup.lookup(author).await {
                Ok(partial) => profile.fill_missing(partial),
                Err(e) => tracing::warn!("{} lookup failed for {}: {}", lookup.name(), author.id, e),
            }
        }

        let location = profile.ror.as_deref().and_then(|ror| self.ror_table.get(ror));
        profile.set_location(location);
        profile
    }

    /// Resolve every uncached author, then attach profiles to all of them
    ///
    /// Returns the number of newly resolved authors. The snapshot is written
    /// only when something was added and `update_cache` is set.
    pub async fn enrich(
        &self,
        profiles: &mut IndexMap<String, ResearcherProfile>,
        cache: &SnapshotCache,
        options: StageOptions,
        progress: &StageProgress,
    ) -> Result<usize, CacheError> {
        let mut resolved: AffiliationCache = cache.load_unless(options)?.unwrap_or_default();
        let mut added = 0;

        for profile in profiles.values() {
            if !resolved.contains_key(profile.id()) {
                let affiliation = self.resolve(&profile.author).await;
                tracing::debug!(
                    "Resolved {}: {}",
                    profile.author.name(),
                    affiliation.affiliation_line()
                );
                resolved.insert(profile.id().to_string(), affiliation);
                added += 1;
            }
            progress.inc();
        }
        progress.finish();

        for profile in profiles.values_mut() {
            if let Some(affiliation) = resolved.get(profile.id()) {
                profile.affiliation = affiliation.clone();
            }
        }

        if added > 0 && options.update_cache {
            cache.store(&resolved)?;
        }
        tracing::info!("Affiliations: {} new, {} cached", added, resolved.len());
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GeoLocation;
    use crate::sources::mock::{LookupRule, MockLookup};
    use crate::utils::AFFILIATIONS_CACHE;
    use std::sync::Arc;
    use tempfile::TempDir;

    const UMASS_ROR: &str = "https://ror.org/0072zz521";

    fn ror_table() -> RorTable {
        let mut table = RorTable::empty();
        table.insert(
            UMASS_ROR,
            GeoLocation {
                city: Some("Amherst".to_string()),
                region: Some("Massachusetts".to_string()),
                country: Some("United States".to_string()),
                lat: Some(42.37),
                lon: Some(-72.52),
            },
        );
        table
    }

    fn orcid_author() -> Author {
        Author::new("A1", Some("Jane".to_string()), Some("0000-0002-1825-0097".to_string()))
    }

    fn profiles(authors: Vec<Author>) -> IndexMap<String, ResearcherProfile> {
        authors
            .into_iter()
            .map(|a| (a.id.clone(), ResearcherProfile::new(a)))
            .collect()
    }

    fn primary() -> MockLookup {
        MockLookup::new("identity", LookupRule::WithOrcid)
    }

    fn fallback() -> MockLookup {
        MockLookup::new("bibliographic", LookupRule::WhenOrgOrRorMissing)
    }

    #[tokio::test]
    async fn test_first_source_wins() {
        let first = primary();
        first.set_profile(
            "A1",
            AffiliationProfile {
                title: Some("Professor".to_string()),
                org: Some("X".to_string()),
                ..Default::default()
            },
        );
        let second = fallback();
        second.set_profile(
            "A1",
            AffiliationProfile {
                org: Some("Y".to_string()),
                ror: Some(UMASS_ROR.to_string()),
                ..Default::default()
            },
        );

        let resolver = AffiliationResolver::new(vec![Box::new(first), Box::new(second)], ror_table());
        let profile = resolver.resolve(&orcid_author()).await;

        assert_eq!(profile.org.as_deref(), Some("X"));
        assert_eq!(profile.title.as_deref(), Some("Professor"));
        assert_eq!(profile.ror.as_deref(), Some(UMASS_ROR));
        assert_eq!(profile.city.as_deref(), Some("Amherst"));
        assert_eq!(profile.lon, Some(-72.52));
    }

    #[tokio::test]
    async fn test_fallback_skipped_when_complete() {
        let first = primary();
        first.set_profile(
            "A1",
            AffiliationProfile {
                org: Some("X".to_string()),
                ror: Some(UMASS_ROR.to_string()),
                ..Default::default()
            },
        );
        let second = Arc::new(fallback());

        let resolver = AffiliationResolver::new(
            vec![Box::new(first), Box::new(second.clone())],
            ror_table(),
        );
        resolver.resolve(&orcid_author()).await;
        assert!(second.calls().is_empty());
    }

    #[tokio::test]
    async fn test_no_orcid_uses_fallback_only() {
        let first = primary();
        first.set_profile(
            "A2",
            AffiliationProfile {
                org: Some("Never".to_string()),
                ..Default::default()
            },
        );
        let second = fallback();
        second.set_profile(
            "A2",
            AffiliationProfile {
                org: Some("Y".to_string()),
                ..Default::default()
            },
        );

        let resolver = AffiliationResolver::new(vec![Box::new(first), Box::new(second)], ror_table());
        let profile = resolver.resolve(&Author::new("A2", None, None)).await;

        assert_eq!(profile.org.as_deref(), Some("Y"));
        assert_eq!(profile.city, None);
    }

    #[tokio::test]
    async fn test_lookup_failure_degrades_to_empty_fields() {
        let first = primary();
        first.set_failure("A1");
        let second = fallback();
        second.set_profile(
            "A1",
            AffiliationProfile {
                ror: Some(UMASS_ROR.to_string()),
                ..Default::default()
            },
        );

        let resolver = AffiliationResolver::new(vec![Box::new(first), Box::new(second)], ror_table());
        let profile = resolver.resolve(&orcid_author()).await;

        assert_eq!(profile.title, None);
        assert_eq!(profile.org, None);
        assert_eq!(profile.country.as_deref(), Some("United States"));
    }

    #[tokio::test]
    async fn test_unknown_ror_clears_location() {
        let first = primary();
        first.set_profile(
            "A1",
            AffiliationProfile {
                org: Some("X".to_string()),
                ror: Some("https://ror.org/unknown".to_string()),
                city: Some("Stale".to_string()),
                ..Default::default()
            },
        );

        let resolver = AffiliationResolver::new(vec![Box::new(first)], ror_table());
        let profile = resolver.resolve(&orcid_author()).await;

        assert_eq!(profile.city, None);
        assert_eq!(profile.lat, None);
    }

    #[tokio::test]
    async fn test_enrich_skips_cached_authors() {
        let temp_dir = TempDir::new().unwrap();
        let cache = SnapshotCache::new(temp_dir.path(), AFFILIATIONS_CACHE);
        let cached = AffiliationCache::from([(
            "A1".to_string(),
            AffiliationProfile {
                org: Some("Cached U".to_string()),
                ..Default::default()
            },
        )]);
        cache.store(&cached).unwrap();

        let lookup = MockLookup::new("any", LookupRule::Always);
        lookup.set_profile(
            "A2",
            AffiliationProfile {
                org: Some("Fresh U".to_string()),
                ..Default::default()
            },
        );
        let lookup = Arc::new(lookup);

        let resolver = AffiliationResolver::new(vec![Box::new(lookup.clone())], RorTable::empty());
        let mut selected = profiles(vec![
            Author::new("A1", None, None),
            Author::new("A2", None, None),
        ]);

        let added = resolver
            .enrich(&mut selected, &cache, StageOptions::default(), &StageProgress::hidden())
            .await
            .unwrap();

        assert_eq!(added, 1);
        assert_eq!(lookup.calls(), vec!["A2"]);
        assert_eq!(selected["A1"].affiliation.org.as_deref(), Some("Cached U"));
        assert_eq!(selected["A2"].affiliation.org.as_deref(), Some("Fresh U"));

        let stored: AffiliationCache = cache.load().unwrap().unwrap();
        assert_eq!(stored.len(), 2);
    }

    #[tokio::test]
    async fn test_enrich_respects_update_cache() {
        let temp_dir = TempDir::new().unwrap();
        let cache = SnapshotCache::new(temp_dir.path(), AFFILIATIONS_CACHE);
        let resolver = AffiliationResolver::new(
            vec![Box::new(MockLookup::new("any", LookupRule::Always))],
            RorTable::empty(),
        );
        let mut selected = profiles(vec![Author::new("A1", None, None)]);

        let options = StageOptions {
            from_scratch: false,
            update_cache: false,
        };
        let added = resolver
            .enrich(&mut selected, &cache, options, &StageProgress::hidden())
            .await
            .unwrap();

        assert_eq!(added, 1);
        assert!(!cache.exists());
    }

    #[tokio::test]
    async fn test_enrich_unchanged_does_not_write() {
        let temp_dir = TempDir::new().unwrap();
        let cache = SnapshotCache::new(temp_dir.path(), AFFILIATIONS_CACHE);
        let resolver = AffiliationResolver::new(Vec::new(), RorTable::empty());
        let mut selected = IndexMap::new();

        let added = resolver
            .enrich(&mut selected, &cache, StageOptions::default(), &StageProgress::hidden())
            .await
            .unwrap();

        assert_eq!(added, 0);
        assert!(!cache.exists());
    }
}
