//! AI biography summaries built from a researcher's representative abstracts.

use indexmap::IndexMap;
use std::collections::HashSet;

use super::ranking::{most_cited_papers, most_recent_papers};
use crate::config::{LlmConfig, RankingConfig};
use crate::models::{AffiliationProfile, PaperStore, ResearcherProfile};
use crate::sources::TextGenerator;
use crate::utils::{CacheError, SnapshotCache, StageOptions, StageProgress};

/// Cached summaries keyed by author id; `None` records a failed request
pub type SummaryCache = IndexMap<String, Option<String>>;

const INSTRUCTIONS: &str = "You will be given a set of research paper abstracts from the most \
cited works of a single researcher. You will reply with accurate but short 3-4 sentence \
biography-style summary of the researcher's work based on this information. Do not make \
judgements on the value or impact of the work. Leave out details that could be considered \
controversial. ";

/// Sentence describing the affiliation, chosen by which parts are known
fn affiliation_clause(affiliation: &AffiliationProfile) -> Option<String> {
    let known = |field: &Option<String>| field.clone().filter(|s| !s.is_empty());

    match (
        known(&affiliation.title),
        known(&affiliation.unit),
        known(&affiliation.org),
    ) {
        (Some(title), Some(unit), Some(org)) => Some(format!(
            "Mention the researcher's affiliation is {}, {} at {}. ",
            title, unit, org
        )),
        (Some(title), None, Some(org)) => {
            Some(format!("Mention the researcher is a {} at {}. ", title, org))
        }
        (Some(title), _, None) => Some(format!("Mention the researcher is a {}. ", title)),
        _ => None,
    }
}

/// Requests one biography per researcher from a [`TextGenerator`]
#[derive(Debug)]
pub struct Summarizer<'a> {
    generator: &'a dyn TextGenerator,
    system_prompt: String,
    papers_per_ranking: usize,
    max_coauthors: usize,
    retry_failed: bool,
}

impl<'a> Summarizer<'a> {
    pub fn new(generator: &'a dyn TextGenerator, llm: &LlmConfig, ranking: &RankingConfig) -> Self {
        Self {
            generator,
            system_prompt: llm.system_prompt.clone(),
            papers_per_ranking: ranking.summary_papers,
            max_coauthors: ranking.summary_max_coauthors,
            retry_failed: ranking.retry_failed_summaries,
        }
    }

    /// User prompt: instructions, name, affiliation clause, then the abstracts
    ///
    /// Abstracts come from the most-cited then most-recent eligible papers. A
    /// paper that ranks in both lists is included once rather than twice.
    pub fn build_prompt(&self, profile: &ResearcherProfile, store: &PaperStore) -> String {
        let author = &profile.author;
        let max = Some(self.max_coauthors);
        let cited = most_cited_papers(author, store, self.papers_per_ranking, max);
        let recent = most_recent_papers(author, store, self.papers_per_ranking, max);

        let mut seen = HashSet::new();
        let abstracts: Vec<&str> = cited
            .into_iter()
            .chain(recent)
            .filter(|paper| seen.insert(paper.id.as_str()))
            .filter_map(|paper| paper.abstract_text.as_deref())
            .collect();

        let mut prompt = format!("{}The researcher's name is {}. ", INSTRUCTIONS, author.name());
        if let Some(clause) = affiliation_clause(&profile.affiliation) {
            prompt.push_str(&clause);
        }
        prompt.push_str("Here are the abstracts:\n\n");
        prompt.push_str(&abstracts.join("\n"));
        prompt
    }

    /// Summary for one researcher; backend failures yield `None`
    pub async fn summarize(&self, profile: &ResearcherProfile, store: &PaperStore) -> Option<String> {
        let prompt = self.build_prompt(profile, store);
        match self.generator.complete(&self.system_prompt, &prompt).await {
            Ok(summary) => Some(summary),
            Err(e) => {
                tracing::warn!("Summary failed for {}: {}", profile.author.name(), e);
                None
            }
        }
    }

    /// Summarize every uncached researcher, then attach summaries to all
    ///
    /// Returns the number of new cache entries (failures included as null).
    pub async fn enrich(
        &self,
        profiles: &mut IndexMap<String, ResearcherProfile>,
        store: &PaperStore,
        cache: &SnapshotCache,
        options: StageOptions,
        progress: &StageProgress,
    ) -> Result<usize, CacheError> {
        let mut summaries: SummaryCache = cache.load_unless(options)?.unwrap_or_default();
        let mut added = 0;

        for profile in profiles.values() {
            let needed = match summaries.get(profile.id()) {
                None => true,
                Some(None) => self.retry_failed,
                Some(Some(_)) => false,
            };
            if needed {
                let summary = self.summarize(profile, store).await;
                summaries.insert(profile.id().to_string(), summary);
                added += 1;
            }
            progress.inc();
        }
        progress.finish();

        for profile in profiles.values_mut() {
            profile.ai_summary = summaries.get(profile.id()).cloned().flatten();
        }

        if added > 0 && options.update_cache {
            cache.store(&summaries)?;
        }
        tracing::info!(
            "Summaries: {} new ({}), {} cached",
            added,
            self.generator.model(),
            summaries.len()
        );
        Ok(added)
    }
}
