//! Generic (fallback) extractor: one record from a single arbitrary page.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use url::Url;

use knowledgeharvest_shared::FailureReason;

use crate::content::{FetchClient, parse_page};
use crate::extractor::{ExtractResult, Extractor, RawRecord};
use crate::source::SourceDescriptor;

/// Fallback strategy for `generic-site` and any unregistered kind.
pub struct GenericExtractor {
    client: FetchClient,
}

impl GenericExtractor {
    pub fn new(client: FetchClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Extractor for GenericExtractor {
    async fn extract(
        &self,
        source: &SourceDescriptor,
        _cancel: &CancellationToken,
    ) -> ExtractResult {
        let url = Url::parse(source.locator()).map_err(|e| {
            FailureReason::Unsupported(format!(
                "{}: not a fetchable address: {e}",
                source.locator()
            ))
        })?;

        let html = self.client.fetch_text(&url).await?;
        let page = parse_page(&html)?;

        let mut record = RawRecord::new(
            page.title.unwrap_or_else(|| "Untitled".into()),
            page.markdown,
            url.to_string(),
        );
        record.author = page.author;

        Ok(vec![record])
    }

    fn name(&self) -> &str {
        "generic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{SourceId, SourceInput, SourceKind};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn descriptor(url: &str) -> SourceDescriptor {
        SourceDescriptor {
            id: SourceId(0),
            kind: SourceKind::GenericSite,
            input: SourceInput::Remote(url.into()),
        }
    }

    #[tokio::test]
    async fn extracts_a_single_record() {
        let server = MockServer::start().await;

        let page = r#"<html><body><main>
            <h1>About Our Team</h1>
            <p>We build things.</p>
        </main></body></html>"#;

        Mock::given(method("GET"))
            .and(path("/about"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page))
            .mount(&server)
            .await;

        let extractor = GenericExtractor::new(FetchClient::new(0).unwrap());
        let records = extractor
            .extract(
                &descriptor(&format!("{}/about", server.uri())),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "About Our Team");
        assert!(records[0].body.contains("We build things."));
    }

    #[tokio::test]
    async fn http_error_becomes_network_failure() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let extractor = GenericExtractor::new(FetchClient::new(0).unwrap());
        let err = extractor
            .extract(
                &descriptor(&format!("{}/gone", server.uri())),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, FailureReason::Network(_)));
    }

    #[tokio::test]
    async fn unparseable_address_is_unsupported() {
        let extractor = GenericExtractor::new(FetchClient::new(0).unwrap());
        let err = extractor
            .extract(
                &SourceDescriptor {
                    id: SourceId(3),
                    kind: SourceKind::Unknown,
                    input: SourceInput::Remote("not a url at all".into()),
                },
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, FailureReason::Unsupported(_)));
    }
}
