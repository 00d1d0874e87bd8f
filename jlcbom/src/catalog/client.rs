//! Live JLCPCB catalog client
//!
//! Issues one blocking keyword search per group. Requests are made one at a
//! time; any transport or API failure is returned to the caller and aborts
//! the run.

use std::borrow::Cow;
use std::time::Duration;

use serde::Serialize;

use super::{parse_entries, CatalogEntry, CatalogError, CatalogQuery, CatalogSource};

/// JLCPCB SMT component search endpoint
pub const SEARCH_URL: &str = "https://jlcpcb.com/shoppingCart/smtGood/selectSmtComponentList";

const PAGE_SIZE: u32 = 40;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    keyword: &'a str,
    current_page: String,
    page_size: String,
}

pub struct LiveCatalog {
    client: reqwest::blocking::Client,
    url: String,
    page_size: u32,
}

impl LiveCatalog {
    pub fn new() -> Result<Self, CatalogError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            url: SEARCH_URL.to_string(),
            page_size: PAGE_SIZE,
        })
    }

    /// Point the client at a different search endpoint
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Search the catalog, first page only
    pub fn search(&self, keyword: &str) -> Result<Vec<CatalogEntry>, CatalogError> {
        let request = SearchRequest {
            keyword,
            current_page: "1".to_string(),
            page_size: self.page_size.to_string(),
        };

        tracing::debug!("Searching catalog for '{}'", keyword);

        let response = self.client.post(&self.url).json(&request).send()?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().unwrap_or_default();
            return Err(CatalogError::Api { status, message });
        }

        let body: serde_json::Value = response.json()?;
        let entries = parse_search_response(body)?;
        tracing::debug!("'{}': {} results", keyword, entries.len());
        Ok(entries)
    }
}

/// Extract the entry list from a search response (`data.list`)
pub fn parse_search_response(mut body: serde_json::Value) -> Result<Vec<CatalogEntry>, CatalogError> {
    let list = body
        .get_mut("data")
        .and_then(|d| d.get_mut("list"))
        .map(serde_json::Value::take);

    match list {
        Some(serde_json::Value::Array(values)) => Ok(parse_entries(values)),
        Some(serde_json::Value::Null) | None => Err(CatalogError::Unavailable(
            "search response has no data.list".to_string(),
        )),
        Some(other) => Err(CatalogError::Unavailable(format!(
            "search response data.list is not an array: {}",
            other
        ))),
    }
}

impl CatalogSource for LiveCatalog {
    fn name(&self) -> &str {
        "live"
    }

    fn candidates(&self, query: &CatalogQuery<'_>) -> Result<Cow<'_, [CatalogEntry]>, CatalogError> {
        let keyword = query.keyword();
        if keyword.is_empty() {
            return Ok(Cow::Owned(Vec::new()));
        }
        self.search(&keyword).map(Cow::Owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::NormalizedIdentity;
    use serde_json::json;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;

    /// Answer one HTTP request with `status_line` and `body`, returning the URL
    fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut content_length = 0;
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap();
                    }
                }
            }
            let mut request_body = vec![0; content_length];
            reader.read_exact(&mut request_body).unwrap();

            let response = format!(
                "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
        });
        format!("http://{}/search", addr)
    }

    #[test]
    fn test_parse_search_response() {
        let body = json!({
            "code": 200,
            "data": {
                "list": [
                    {"componentCode": "C25905", "describe": "RESISTOR 5.1K 0603", "componentLibraryType": "base",
                     "componentSpecificationEn": "0603", "componentModelEn": "0603WAF5101T5E", "stockCount": 1000},
                    {"componentCode": "C0"}
                ]
            }
        });
        let entries = parse_search_response(body).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].part_code, "C25905");
    }

    #[test]
    fn test_parse_search_response_without_list() {
        let err = parse_search_response(json!({"code": 500, "data": null})).unwrap_err();
        assert!(matches!(err, CatalogError::Unavailable(_)));

        let err = parse_search_response(json!({"data": {"list": "nope"}})).unwrap_err();
        assert!(matches!(err, CatalogError::Unavailable(_)));
    }

    #[test]
    fn test_search_request_body() {
        let request = SearchRequest {
            keyword: "C7593",
            current_page: "1".to_string(),
            page_size: PAGE_SIZE.to_string(),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"keyword": "C7593", "currentPage": "1", "pageSize": "40"})
        );
    }

    #[test]
    fn test_unreachable_endpoint() {
        let catalog = LiveCatalog::new().unwrap().with_url("http://127.0.0.1:9/search");
        let err = catalog.search("C1").unwrap_err();
        assert!(matches!(err, CatalogError::Request(_)));
    }

    #[test]
    fn test_error_status_is_api_error() {
        let url = serve_once("HTTP/1.1 503 Service Unavailable", "busy");
        let catalog = LiveCatalog::new().unwrap().with_url(url);

        match catalog.search("C1").unwrap_err() {
            CatalogError::Api { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "busy");
            }
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[test]
    fn test_search_over_http() {
        let url = serve_once(
            "HTTP/1.1 200 OK",
            r#"{"code":200,"data":{"list":[{"componentCode":"C7593","describe":"LDO 3.3V SOT-223","componentLibraryType":"base","stockCount":50}]}}"#,
        );
        let catalog = LiveCatalog::new().unwrap().with_url(url);

        let entries = catalog.search("C7593").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].part_code, "C7593");
    }

    #[test]
    fn test_empty_keyword_has_no_candidates() {
        // Nothing listens on this port; an empty keyword must not send a request
        let catalog = LiveCatalog::new().unwrap().with_url("http://127.0.0.1:9/search");
        let identity = NormalizedIdentity {
            value: String::new(),
            package: String::new(),
            part_number: None,
        };
        let query = CatalogQuery {
            identity: &identity,
            kind: None,
        };

        let candidates = catalog.candidates(&query).unwrap();
        assert!(candidates.is_empty());
    }
}
