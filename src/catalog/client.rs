//! Spotify Web API client for audiobook search and chapter listings

use crate::catalog::types::{
    AudiobookDetail, CatalogSearchResult, ChapterPage, SearchResponse, SimplifiedAudiobook,
};
use crate::error::{Error, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Page size requested from the chapters endpoint (the API maximum)
const CHAPTER_PAGE_SIZE: u32 = 50;

/// Read operations the pipeline needs from an audiobook catalog
pub trait Catalog {
    /// Search by title and author, returning the first of at most `limit` results
    fn search(
        &mut self,
        title: &str,
        author: &str,
        limit: u32,
    ) -> Result<Option<CatalogSearchResult>>;

    /// URL of the first chapters page for an audiobook
    fn chapters_url(&self, audiobook_id: &str) -> String;

    /// Fetch one page of chapters
    fn fetch_page(&mut self, url: &str) -> Result<ChapterPage>;

    /// Fetch top-level metadata for an audiobook
    fn audiobook(&mut self, audiobook_id: &str) -> Result<AudiobookDetail>;
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone)]
pub struct Endpoints {
    pub api_url: String,
    pub token_url: String,
    /// ISO 3166-1 alpha-2 market, needed by some accounts to see audiobooks
    pub market: Option<String>,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            market: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Blocking client over reqwest; owns a tokio runtime to drive requests
pub struct SpotifyClient {
    http: reqwest::Client,
    runtime: tokio::runtime::Runtime,
    credentials: Credentials,
    endpoints: Endpoints,
    token: String,
}

impl SpotifyClient {
    /// Create a client and perform the initial credential exchange
    pub fn connect(credentials: Credentials, endpoints: Endpoints) -> Result<Self> {
        let mut client = Self {
            http: reqwest::Client::new(),
            runtime: tokio::runtime::Runtime::new()?,
            credentials,
            endpoints,
            token: String::new(),
        };
        client.authenticate()?;
        Ok(client)
    }

    /// Exchange client credentials for a bearer token, replacing the cached one
    pub fn authenticate(&mut self) -> Result<()> {
        debug!(url = %self.endpoints.token_url, "requesting access token");

        let request = self
            .http
            .post(&self.endpoints.token_url)
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .form(&[("grant_type", "client_credentials")]);

        let (status, body) = self.runtime.block_on(async move {
            let response = request.send().await?;
            let status = response.status();
            Ok::<_, reqwest::Error>((status, response.text().await?))
        })?;

        if status != StatusCode::OK {
            return Err(Error::Auth {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = decode(&self.endpoints.token_url, &body)?;
        self.token = token.access_token;
        Ok(())
    }

    fn get(&self, url: &str) -> Result<(StatusCode, String)> {
        debug!(%url, "GET");
        let request = self.http.get(url).bearer_auth(&self.token);
        let result = self.runtime.block_on(async move {
            let response = request.send().await?;
            let status = response.status();
            Ok::<_, reqwest::Error>((status, response.text().await?))
        })?;
        Ok(result)
    }

    /// GET and decode, refreshing the token once on 401
    fn get_json<T: DeserializeOwned>(&mut self, url: &str) -> Result<T> {
        let (mut status, mut body) = self.get(url)?;

        if status == StatusCode::UNAUTHORIZED {
            info!("access token rejected, re-authenticating");
            self.authenticate()?;
            (status, body) = self.get(url)?;
        }

        if !status.is_success() {
            return Err(Error::Catalog {
                status: status.as_u16(),
                body,
            });
        }

        decode(url, &body)
    }

    fn with_market(&self, mut url: String) -> String {
        if let Some(market) = &self.endpoints.market {
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str("market=");
            url.push_str(&urlencoding::encode(market));
        }
        url
    }
}

impl Catalog for SpotifyClient {
    fn search(
        &mut self,
        title: &str,
        author: &str,
        limit: u32,
    ) -> Result<Option<CatalogSearchResult>> {
        let query = format!("{} {}", title, author);
        let url = self.with_market(format!(
            "{}/search?q={}&type=audiobook&limit={}",
            self.endpoints.api_url,
            urlencoding::encode(&query),
            limit
        ));

        let response: SearchResponse = self.get_json(&url)?;
        Ok(response.first_match())
    }

    fn chapters_url(&self, audiobook_id: &str) -> String {
        self.with_market(format!(
            "{}/audiobooks/{}/chapters?limit={}",
            self.endpoints.api_url,
            urlencoding::encode(audiobook_id),
            CHAPTER_PAGE_SIZE
        ))
    }

    fn fetch_page(&mut self, url: &str) -> Result<ChapterPage> {
        self.get_json(url)
    }

    fn audiobook(&mut self, audiobook_id: &str) -> Result<AudiobookDetail> {
        let url = self.with_market(format!(
            "{}/audiobooks/{}",
            self.endpoints.api_url,
            urlencoding::encode(audiobook_id)
        ));
        let book: SimplifiedAudiobook = self.get_json(&url)?;
        Ok(book.into())
    }
}

fn decode<T: DeserializeOwned>(url: &str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|source| Error::Decode {
        url: url.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::sync::{Arc, Mutex};
    use std::thread;

    #[derive(Debug, Clone)]
    struct Recorded {
        line: String,
        authorization: String,
        body: String,
    }

    /// Serve canned responses, one per connection, recording each request
    fn serve(responses: Vec<(u16, &'static str)>) -> (String, Arc<Mutex<Vec<Recorded>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);

        thread::spawn(move || {
            for (status, body) in responses {
                let (stream, _) = listener.accept().unwrap();
                let mut reader = BufReader::new(stream.try_clone().unwrap());

                let mut line = String::new();
                reader.read_line(&mut line).unwrap();

                let mut authorization = String::new();
                let mut content_length = 0usize;
                loop {
                    let mut header = String::new();
                    reader.read_line(&mut header).unwrap();
                    let header = header.trim_end();
                    if header.is_empty() {
                        break;
                    }
                    let (name, value) = header.split_once(':').unwrap();
                    let value = value.trim();
                    if name.eq_ignore_ascii_case("authorization") {
                        authorization = value.to_string();
                    } else if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.parse().unwrap();
                    }
                }

                let mut request_body = vec![0u8; content_length];
                reader.read_exact(&mut request_body).unwrap();

                log.lock().unwrap().push(Recorded {
                    line: line.trim_end().to_string(),
                    authorization,
                    body: String::from_utf8(request_body).unwrap(),
                });

                let mut stream = stream;
                write!(
                    stream,
                    "HTTP/1.1 {} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                )
                .unwrap();
                stream.flush().unwrap();
            }
        });

        (base, seen)
    }

    fn endpoints(base: &str) -> Endpoints {
        Endpoints {
            api_url: base.to_string(),
            token_url: format!("{}/api/token", base),
            market: None,
        }
    }

    fn credentials() -> Credentials {
        Credentials {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
        }
    }

    const TOKEN_1: &str = r#"{"access_token": "t1", "token_type": "Bearer", "expires_in": 3600}"#;
    const TOKEN_2: &str = r#"{"access_token": "t2", "token_type": "Bearer", "expires_in": 3600}"#;
    const SEARCH_HIT: &str = r#"{"audiobooks": {"items": [{
        "id": "book1", "name": "My Book",
        "authors": [{"name": "Jane Doe"}],
        "external_urls": {"spotify": "https://open.spotify.com/show/book1"}
    }]}}"#;

    #[test]
    fn test_connect_sends_client_credentials() {
        let (base, seen) = serve(vec![(200, TOKEN_1)]);
        SpotifyClient::connect(credentials(), endpoints(&base)).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].line.starts_with("POST /api/token "));
        // base64("id:secret")
        assert_eq!(seen[0].authorization, "Basic aWQ6c2VjcmV0");
        assert_eq!(seen[0].body, "grant_type=client_credentials");
    }

    #[test]
    fn test_connect_rejected_is_auth_error() {
        let (base, _seen) = serve(vec![(400, r#"{"error": "invalid_client"}"#)]);
        let err = SpotifyClient::connect(credentials(), endpoints(&base))
            .err()
            .unwrap();

        match err {
            Error::Auth { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("invalid_client"));
            }
            other => panic!("expected auth error, got {:?}", other),
        }
    }

    #[test]
    fn test_search_returns_first_match() {
        let (base, seen) = serve(vec![(200, TOKEN_1), (200, SEARCH_HIT)]);
        let mut client = SpotifyClient::connect(credentials(), endpoints(&base)).unwrap();

        let found = client.search("My Book", "Jane Doe", 1).unwrap().unwrap();
        assert_eq!(found.id, "book1");
        assert_eq!(found.author, "Jane Doe");

        let seen = seen.lock().unwrap();
        assert_eq!(
            seen[1].line,
            "GET /search?q=My%20Book%20Jane%20Doe&type=audiobook&limit=1 HTTP/1.1"
        );
        assert_eq!(seen[1].authorization, "Bearer t1");
    }

    #[test]
    fn test_search_no_results() {
        let (base, _seen) = serve(vec![(200, TOKEN_1), (200, r#"{"audiobooks": {"items": []}}"#)]);
        let mut client = SpotifyClient::connect(credentials(), endpoints(&base)).unwrap();
        assert!(client.search("Nothing", "Nobody", 1).unwrap().is_none());
    }

    #[test]
    fn test_expired_token_is_refreshed_once() {
        let (base, seen) = serve(vec![
            (200, TOKEN_1),
            (401, r#"{"error": {"status": 401, "message": "The access token expired"}}"#),
            (200, TOKEN_2),
            (200, SEARCH_HIT),
        ]);
        let mut client = SpotifyClient::connect(credentials(), endpoints(&base)).unwrap();

        let found = client.search("My Book", "Jane Doe", 1).unwrap();
        assert!(found.is_some());

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[1].authorization, "Bearer t1");
        assert!(seen[2].line.starts_with("POST /api/token "));
        assert_eq!(seen[3].authorization, "Bearer t2");
    }

    #[test]
    fn test_second_unauthorized_is_catalog_error() {
        let (base, _seen) = serve(vec![
            (200, TOKEN_1),
            (401, "expired"),
            (200, TOKEN_2),
            (401, "still expired"),
        ]);
        let mut client = SpotifyClient::connect(credentials(), endpoints(&base)).unwrap();

        match client.fetch_page(&format!("{}/audiobooks/x/chapters", base)) {
            Err(Error::Catalog { status, body }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "still expired");
            }
            other => panic!("expected catalog error, got {:?}", other),
        }
    }

    #[test]
    fn test_server_error_is_not_retried() {
        let (base, seen) = serve(vec![(200, TOKEN_1), (503, "unavailable")]);
        let mut client = SpotifyClient::connect(credentials(), endpoints(&base)).unwrap();

        let err = client.audiobook("book1").err().unwrap();
        assert!(matches!(err, Error::Catalog { status: 503, .. }));
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_malformed_body_is_decode_error() {
        let (base, _seen) = serve(vec![(200, TOKEN_1), (200, "not json")]);
        let mut client = SpotifyClient::connect(credentials(), endpoints(&base)).unwrap();

        let err = client.fetch_page(&format!("{}/next", base)).err().unwrap();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn test_market_is_appended() {
        let (base, _seen) = serve(vec![(200, TOKEN_1)]);
        let mut endpoints = endpoints(&base);
        endpoints.market = Some("US".to_string());
        let client = SpotifyClient::connect(credentials(), endpoints).unwrap();

        assert_eq!(
            client.chapters_url("book1"),
            format!("{}/audiobooks/book1/chapters?limit=50&market=US", base)
        );
    }
}
