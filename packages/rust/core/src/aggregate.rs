//! Final result assembly: flatten items, count by type, sum up the run.

use std::collections::BTreeMap;
use std::time::Duration;

use knowledgeharvest_shared::{KnowledgeBase, KnowledgeItem, RunSummary};

use crate::run::{OutcomeStatus, SourceReport};

/// Assemble the tenant-scoped result from the run's surviving items and
/// per-source reports.
///
/// Pure function of its inputs; never fails. An all-failure run yields a
/// valid result with zero items and `sources_processed == 0`.
pub fn aggregate(
    team_id: &str,
    items: Vec<KnowledgeItem>,
    reports: &[SourceReport],
    processing_time: Duration,
) -> KnowledgeBase {
    let mut content_types: BTreeMap<_, usize> = BTreeMap::new();
    for item in &items {
        *content_types.entry(item.content_type).or_default() += 1;
    }

    let sources_processed = reports
        .iter()
        .filter(|r| r.status == OutcomeStatus::Success)
        .count();

    let summary = RunSummary {
        total_items: items.len(),
        content_types,
        sources_processed,
        processing_time,
    };

    KnowledgeBase {
        team_id: team_id.to_string(),
        items,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use knowledgeharvest_extract::{SourceId, SourceKind};
    use knowledgeharvest_shared::ContentType;

    fn item(title: &str, content_type: ContentType) -> KnowledgeItem {
        KnowledgeItem {
            title: title.into(),
            content: "body".into(),
            content_type,
            source_url: format!("https://example.com/{title}"),
            author: "Unknown".into(),
            team_id: "t".into(),
            fingerprint: KnowledgeItem::fingerprint_of(
                &format!("https://example.com/{title}"),
                title,
            ),
        }
    }

    fn report(id: usize, status: OutcomeStatus) -> SourceReport {
        SourceReport {
            source_id: SourceId(id),
            locator: format!("https://example.com/{id}"),
            kind: SourceKind::GenericSite,
            status,
            items_extracted: 0,
            records_dropped: 0,
            error: None,
            elapsed_ms: 1,
        }
    }

    #[test]
    fn counts_items_by_content_type() {
        let items = vec![
            item("a", ContentType::Blog),
            item("b", ContentType::Blog),
            item("c", ContentType::Guide),
        ];
        let reports = vec![
            report(0, OutcomeStatus::Success),
            report(1, OutcomeStatus::Failure),
        ];

        let kb = aggregate("aline123", items, &reports, Duration::from_secs(2));

        assert_eq!(kb.team_id, "aline123");
        assert_eq!(kb.summary.total_items, 3);
        assert_eq!(kb.summary.content_types[&ContentType::Blog], 2);
        assert_eq!(kb.summary.content_types[&ContentType::Guide], 1);
        assert_eq!(kb.summary.sources_processed, 1);
        assert_eq!(kb.summary.processing_time, Duration::from_secs(2));
    }

    #[test]
    fn all_failure_run_yields_valid_empty_result() {
        let reports = vec![
            report(0, OutcomeStatus::Failure),
            report(1, OutcomeStatus::Failure),
        ];

        let kb = aggregate("t", Vec::new(), &reports, Duration::from_millis(5));

        assert_eq!(kb.summary.total_items, 0);
        assert_eq!(kb.summary.sources_processed, 0);
        assert!(kb.summary.content_types.is_empty());
        assert!(kb.items.is_empty());
    }
}
