//! Provider selection, fallback and merging.
//!
//! [`SearchAggregator::search`] never fails: provider errors are classified,
//! counted and turned into empty results so a flaky network can not break a
//! learn step.

use crate::degraded::{DegradedCounters, FailureClass};
use crate::provider::SearchProvider;
use crate::types::{ProviderSlot, SearchPreference, SearchResult};
use std::sync::Arc;

/// Hits plus the provider failures met while collecting them.
#[derive(Debug, Default)]
pub struct SearchOutcome {
    pub results: Vec<SearchResult>,
    /// One `"<provider>: <error>"` entry per failed provider call.
    pub provider_errors: Vec<String>,
}

impl SearchOutcome {
    /// Nothing found because every provider that was asked failed.
    pub fn all_failed(&self) -> bool {
        self.results.is_empty() && !self.provider_errors.is_empty()
    }
}

/// Primary/secondary provider pair.
pub struct SearchAggregator {
    primary: Arc<dyn SearchProvider>,
    secondary: Arc<dyn SearchProvider>,
    counters: Arc<DegradedCounters>,
}

impl SearchAggregator {
    pub fn new(
        primary: Arc<dyn SearchProvider>,
        secondary: Arc<dyn SearchProvider>,
        counters: Arc<DegradedCounters>,
    ) -> Self {
        Self {
            primary,
            secondary,
            counters,
        }
    }

    /// Search according to `preference`, returning at most `max_results` hits.
    pub async fn search(
        &self,
        query: &str,
        preference: SearchPreference,
        max_results: usize,
    ) -> Vec<SearchResult> {
        self.search_detailed(query, preference, max_results)
            .await
            .results
    }

    /// Like [`Self::search`], but also reports which provider calls failed.
    pub async fn search_detailed(
        &self,
        query: &str,
        preference: SearchPreference,
        max_results: usize,
    ) -> SearchOutcome {
        let mut outcome = SearchOutcome::default();
        if max_results == 0 || query.trim().is_empty() {
            return outcome;
        }

        let errors = &mut outcome.provider_errors;
        outcome.results = match preference {
            SearchPreference::PrimaryOnly => {
                self.query_slot(ProviderSlot::Primary, query, max_results, errors).await
            }
            SearchPreference::SecondaryOnly => {
                self.query_slot(ProviderSlot::Secondary, query, max_results, errors).await
            }
            SearchPreference::Auto => {
                let primary = self
                    .query_slot(ProviderSlot::Primary, query, max_results, errors)
                    .await;
                if primary.is_empty() {
                    tracing::debug!("primary empty, falling back to secondary");
                    self.query_slot(ProviderSlot::Secondary, query, max_results, errors).await
                } else {
                    primary
                }
            }
            SearchPreference::Merge => {
                let mut primary_errors = Vec::new();
                let mut secondary_errors = Vec::new();
                let (primary, secondary) = tokio::join!(
                    self.query_slot(ProviderSlot::Primary, query, max_results, &mut primary_errors),
                    self.query_slot(
                        ProviderSlot::Secondary,
                        query,
                        max_results,
                        &mut secondary_errors,
                    ),
                );
                errors.extend(primary_errors);
                errors.extend(secondary_errors);
                merge(primary, secondary, max_results)
            }
        };

        tracing::debug!(
            %preference,
            hits = outcome.results.len(),
            failed_providers = outcome.provider_errors.len(),
            "search finished"
        );
        outcome
    }

    async fn query_slot(
        &self,
        slot: ProviderSlot,
        query: &str,
        max_results: usize,
        errors: &mut Vec<String>,
    ) -> Vec<SearchResult> {
        let provider = match slot {
            ProviderSlot::Primary => &self.primary,
            ProviderSlot::Secondary => &self.secondary,
        };

        match provider.query(query, max_results).await {
            Ok(hits) => hits
                .into_iter()
                .take(max_results)
                .map(|h| SearchResult {
                    title: h.title,
                    url: h.url,
                    snippet: h.snippet,
                    source_provider: slot,
                })
                .collect(),
            Err(e) => {
                let detail = format!("{}: {e}", provider.name());
                self.counters
                    .record(FailureClass::TransientProvider, &format!("{slot:?} {detail}"));
                errors.push(detail);
                Vec::new()
            }
        }
    }
}

/// Primary hits first, then secondary, capped at `max_results` in total.
///
/// When both sides have enough hits the primary gets the larger half; a short
/// side leaves its unused share to the other.
fn merge(
    primary: Vec<SearchResult>,
    secondary: Vec<SearchResult>,
    max_results: usize,
) -> Vec<SearchResult> {
    let primary_share = max_results.div_ceil(2);
    let secondary_share = max_results - primary_share;

    let take_secondary = secondary
        .len()
        .min(secondary_share + primary_share.saturating_sub(primary.len()));
    let take_primary = primary.len().min(max_results - take_secondary);

    primary
        .into_iter()
        .take(take_primary)
        .chain(secondary.into_iter().take(take_secondary))
        .collect()
}
