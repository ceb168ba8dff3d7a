//! Raw-record normalization into the canonical knowledge item schema.

use knowledgeharvest_extract::{RawRecord, SourceDescriptor, SourceKind};
use knowledgeharvest_shared::{ContentType, HarvestError, KnowledgeItem, Result};

/// Author recorded when a source does not carry one.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// Fixed mapping from inferred source kind to canonical content type.
pub fn content_type_for(kind: SourceKind) -> ContentType {
    match kind {
        SourceKind::BlogIndex => ContentType::Blog,
        SourceKind::GuideIndex => ContentType::Guide,
        SourceKind::Document => ContentType::Document,
        SourceKind::TopicIndex | SourceKind::GenericSite | SourceKind::Unknown => {
            ContentType::Other
        }
    }
}

/// Convert a raw record into a [`KnowledgeItem`].
///
/// Fails with a validation error when the title or body is empty after
/// trimming — such records are dropped and counted by the orchestrator,
/// never fatal to the run. Missing authors default to `"Unknown"`; the
/// content type comes from the source kind unless the record overrides it.
/// Idempotent: the same record always produces the same fingerprint.
pub fn normalize(
    team_id: &str,
    source: &SourceDescriptor,
    record: RawRecord,
) -> Result<KnowledgeItem> {
    let title = record.title.trim().to_string();
    if title.is_empty() {
        return Err(HarvestError::validation(format!(
            "record from {} has an empty title",
            record.locator
        )));
    }

    let content = record.body.trim().to_string();
    if content.is_empty() {
        return Err(HarvestError::validation(format!(
            "record {title:?} from {} has an empty body",
            record.locator
        )));
    }

    let content_type = record
        .content_type
        .unwrap_or_else(|| content_type_for(source.kind));

    let author = record
        .author
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());

    let fingerprint = KnowledgeItem::fingerprint_of(&record.locator, &title);

    Ok(KnowledgeItem {
        title,
        content,
        content_type,
        source_url: record.locator,
        author,
        team_id: team_id.to_string(),
        fingerprint,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use knowledgeharvest_extract::{SourceId, SourceInput};

    fn descriptor(kind: SourceKind) -> SourceDescriptor {
        SourceDescriptor {
            id: SourceId(0),
            kind,
            input: SourceInput::Remote("https://example.com/blog".into()),
        }
    }

    fn record(title: &str, body: &str) -> RawRecord {
        RawRecord::new(title, body, "https://example.com/blog/post")
    }

    #[test]
    fn fills_defaults_and_derives_content_type() {
        let item = normalize("aline123", &descriptor(SourceKind::BlogIndex), record("T", "B"))
            .expect("normalize");

        assert_eq!(item.content_type, ContentType::Blog);
        assert_eq!(item.author, "Unknown");
        assert_eq!(item.team_id, "aline123");
        assert_eq!(item.source_url, "https://example.com/blog/post");
    }

    #[test]
    fn record_override_beats_kind_mapping() {
        let mut rec = record("Chapter 1", "Body");
        rec.content_type = Some(ContentType::Book);

        let item = normalize("t", &descriptor(SourceKind::Document), rec).expect("normalize");
        assert_eq!(item.content_type, ContentType::Book);
    }

    #[test]
    fn kind_mapping_covers_all_kinds() {
        assert_eq!(content_type_for(SourceKind::BlogIndex), ContentType::Blog);
        assert_eq!(content_type_for(SourceKind::GuideIndex), ContentType::Guide);
        assert_eq!(content_type_for(SourceKind::Document), ContentType::Document);
        assert_eq!(content_type_for(SourceKind::TopicIndex), ContentType::Other);
        assert_eq!(content_type_for(SourceKind::GenericSite), ContentType::Other);
        assert_eq!(content_type_for(SourceKind::Unknown), ContentType::Other);
    }

    #[test]
    fn empty_title_is_rejected() {
        let err = normalize("t", &descriptor(SourceKind::BlogIndex), record("   ", "Body"))
            .unwrap_err();
        assert!(err.to_string().contains("empty title"));
    }

    #[test]
    fn empty_body_is_rejected() {
        let err = normalize("t", &descriptor(SourceKind::BlogIndex), record("Title", "  \n "))
            .unwrap_err();
        assert!(err.to_string().contains("empty body"));
    }

    #[test]
    fn blank_author_falls_back_to_unknown() {
        let mut rec = record("Title", "Body");
        rec.author = Some("   ".into());

        let item = normalize("t", &descriptor(SourceKind::BlogIndex), rec).expect("normalize");
        assert_eq!(item.author, "Unknown");
    }

    #[test]
    fn normalization_is_idempotent_on_fingerprints() {
        let a = normalize("t", &descriptor(SourceKind::BlogIndex), record("Title", "Body"))
            .expect("normalize");
        let b = normalize("t", &descriptor(SourceKind::BlogIndex), record("Title", "Body"))
            .expect("normalize");

        assert_eq!(a.fingerprint, b.fingerprint);
    }
}
