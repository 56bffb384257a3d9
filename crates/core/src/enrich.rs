//! Detail enrichment of search results.
//!
//! Text search responses do not carry phone numbers or websites, so each result that lacks
//! them gets one detail lookup. Lookups run concurrently and are joined; a failed lookup
//! leaves that lab without contact details and never fails the batch.

use crate::{LabResult, LabSearchResult};
use futures::future::join_all;
use std::future::Future;

/// Contact fields returned by a detail lookup.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContactDetails {
    pub phone: Option<String>,
    pub website: Option<String>,
}

impl LabSearchResult {
    /// Fills in contact fields the result does not already have.
    pub fn merge_contact(&mut self, details: ContactDetails) {
        if self.phone.is_none() {
            self.phone = details.phone;
        }
        if self.website.is_none() {
            self.website = details.website;
        }
    }
}

/// Enriches every result that [`needs_enrichment`](LabSearchResult::needs_enrichment).
///
/// `lookup` receives the place id. Output order equals input order.
pub async fn enrich_all<F, Fut>(labs: Vec<LabSearchResult>, lookup: F) -> Vec<LabSearchResult>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = LabResult<ContactDetails>>,
{
    let tasks = labs.into_iter().map(|mut lab| {
        let pending = lab.needs_enrichment().then(|| lookup(lab.id.clone()));
        async move {
            if let Some(details) = pending {
                match details.await {
                    Ok(details) => lab.merge_contact(details),
                    Err(e) => {
                        tracing::warn!(lab_id = %lab.id, "detail lookup failed, keeping lab without contact details: {e}");
                    }
                }
            }
            lab
        }
    });

    join_all(tasks).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LabError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn labs(ids: &[&str]) -> Vec<LabSearchResult> {
        ids.iter()
            .map(|id| LabSearchResult::new(*id, format!("Lab {id}")))
            .collect()
    }

    fn details_for(id: &str) -> ContactDetails {
        ContactDetails {
            phone: Some(format!("phone-{id}")),
            website: Some(format!("https://{id}.example")),
        }
    }

    #[tokio::test]
    async fn merges_details_in_input_order() {
        let enriched = enrich_all(labs(&["a", "b", "c"]), |id| async move {
            Ok(details_for(&id))
        })
        .await;

        let ids: Vec<&str> = enriched.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(enriched[1].phone.as_deref(), Some("phone-b"));
        assert_eq!(enriched[2].website.as_deref(), Some("https://c.example"));
    }

    #[tokio::test]
    async fn failure_for_one_lab_keeps_it_and_leaves_others_untouched() {
        let enriched = enrich_all(labs(&["a", "x", "c"]), |id| async move {
            if id == "x" {
                Err(LabError::Upstream {
                    status: 503,
                    message: "unavailable".into(),
                })
            } else {
                Ok(details_for(&id))
            }
        })
        .await;

        assert_eq!(enriched.len(), 3);
        assert_eq!(enriched[1].id, "x");
        assert_eq!(enriched[1].name, "Lab x");
        assert_eq!(enriched[1].phone, None);
        assert_eq!(enriched[1].website, None);
        assert_eq!(enriched[0].phone.as_deref(), Some("phone-a"));
        assert_eq!(enriched[2].phone.as_deref(), Some("phone-c"));
    }

    #[tokio::test]
    async fn complete_results_are_not_looked_up() {
        let mut input = labs(&["a", "b"]);
        input[0].phone = Some("known".into());
        input[0].website = Some("https://known.example".into());

        let calls = AtomicUsize::new(0);
        let enriched = enrich_all(input, |id| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok(details_for(&id)) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(enriched[0].phone.as_deref(), Some("known"));
    }

    #[test]
    fn merge_does_not_overwrite_existing_fields() {
        let mut lab = LabSearchResult::new("a", "Lab a");
        lab.phone = Some("from-search".into());
        lab.merge_contact(details_for("a"));
        assert_eq!(lab.phone.as_deref(), Some("from-search"));
        assert_eq!(lab.website.as_deref(), Some("https://a.example"));
    }
}
