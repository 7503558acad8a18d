use std::path::{Path, PathBuf};
use std::time::Duration;

use url::Url;

use crate::error::{Result, TreemapError};
use crate::model::RawNode;

/// One-shot retrieval of a JSON document. No retries: a failure is final
/// for that request.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, location: &str) -> Result<RawNode>;
}

pub fn parse_document(text: &str, source_name: &str) -> Result<RawNode> {
    serde_json::from_str(text).map_err(|e| TreemapError::fetch(source_name, e))
}

/// Reads documents from disk. Accepts plain paths (relative ones resolved
/// against `base_dir`) and `file://` URLs; other URL schemes are refused,
/// see [`AnyFetcher`] for network locations.
#[derive(Debug, Clone, Default)]
pub struct FileFetcher {
    base_dir: Option<PathBuf>,
}

impl FileFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    fn resolve(&self, location: &str) -> Result<PathBuf> {
        match Url::parse(location) {
            Ok(url) if url.scheme() == "file" => url
                .to_file_path()
                .map_err(|_| TreemapError::fetch(location, "not a local file URL")),
            // A single letter is a Windows drive, not a scheme.
            Ok(url) if url.scheme().len() > 1 => Err(TreemapError::fetch(
                location,
                format!("unsupported scheme `{}`", url.scheme()),
            )),
            _ => {
                let path = Path::new(location);
                Ok(match &self.base_dir {
                    Some(base) if path.is_relative() => base.join(path),
                    _ => path.to_path_buf(),
                })
            }
        }
    }
}

impl Fetcher for FileFetcher {
    fn fetch(&self, location: &str) -> Result<RawNode> {
        let path = self.resolve(location)?;
        tracing::debug!("reading {}", path.display());
        let text = std::fs::read_to_string(&path).map_err(|e| TreemapError::fetch(location, e))?;
        parse_document(&text, location)
    }
}

pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking GET of an `http`/`https` document. Any transport error or
/// non-2xx status is a `Fetch` error.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    timeout: Duration,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, location: &str) -> Result<RawNode> {
        tracing::debug!("GET {location}");
        let response = ureq::get(location)
            .timeout(self.timeout)
            .call()
            .map_err(|e| TreemapError::fetch(location, e))?;
        let text = response
            .into_string()
            .map_err(|e| TreemapError::fetch(location, e))?;
        parse_document(&text, location)
    }
}

fn is_remote(location: &str) -> bool {
    Url::parse(location).map_or(false, |url| matches!(url.scheme(), "http" | "https"))
}

/// Picks a fetcher by scheme: `http`/`https` go over the network,
/// everything else is read from disk.
#[derive(Debug, Clone, Default)]
pub struct AnyFetcher {
    file: FileFetcher,
    http: HttpFetcher,
}

impl AnyFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            file: FileFetcher::new(),
            http: HttpFetcher::with_timeout(timeout),
        }
    }
}

impl Fetcher for AnyFetcher {
    fn fetch(&self, location: &str) -> Result<RawNode> {
        if is_remote(location) {
            self.http.fetch(location)
        } else {
            self.file.fetch(location)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;

    use super::*;

    const TINY: &str = r#"{"name":"R","children":[{"name":"a","category":"x","value":1}]}"#;

    /// Answers one HTTP request on a local port with `status` and `body`.
    fn serve_once(status: &str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let status = status.to_string();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            while reader.read_line(&mut line).unwrap() > 0 && line != "\r\n" {
                line.clear();
            }
            write!(
                stream,
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
            .unwrap();
        });
        format!("http://{addr}/tree_map/movie-data.json")
    }

    #[test]
    fn reads_relative_paths_and_file_urls() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("tiny.json"), TINY).unwrap();

        let fetcher = FileFetcher::with_base_dir(tmp.path());
        let raw = fetcher.fetch("tiny.json").unwrap();
        assert_eq!(raw.name, "R");

        let url = Url::from_file_path(tmp.path().join("tiny.json")).unwrap();
        let raw = FileFetcher::new().fetch(url.as_str()).unwrap();
        assert_eq!(raw.children.unwrap().len(), 1);
    }

    #[test]
    fn failures_are_fetch_errors() {
        let fetcher = FileFetcher::new();
        assert!(matches!(
            fetcher.fetch("https://example.com/data.json"),
            Err(TreemapError::Fetch { .. })
        ));
        assert!(matches!(
            fetcher.fetch("/definitely/not/here.json"),
            Err(TreemapError::Fetch { .. })
        ));
        assert!(matches!(
            parse_document("{\"name\": 3}", "inline"),
            Err(TreemapError::Fetch { source_name, .. }) if source_name == "inline"
        ));
    }

    #[test]
    fn http_documents_are_fetched_once() {
        let url = serve_once("200 OK", TINY);
        let raw = HttpFetcher::with_timeout(Duration::from_secs(5)).fetch(&url).unwrap();
        assert_eq!(raw.name, "R");
    }

    #[test]
    fn http_errors_are_fetch_errors() {
        let url = serve_once("404 Not Found", "{}");
        assert!(matches!(
            HttpFetcher::new().fetch(&url),
            Err(TreemapError::Fetch { source_name, .. }) if source_name == url
        ));

        let url = serve_once("200 OK", "<html>moved</html>");
        assert!(matches!(HttpFetcher::new().fetch(&url), Err(TreemapError::Fetch { .. })));
    }

    #[test]
    fn any_fetcher_routes_by_scheme() {
        let fetcher = AnyFetcher::with_timeout(Duration::from_secs(5));
        let url = serve_once("200 OK", TINY);
        assert_eq!(fetcher.fetch(&url).unwrap().name, "R");

        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("tiny.json");
        std::fs::write(&path, TINY).unwrap();
        assert_eq!(fetcher.fetch(&path.display().to_string()).unwrap().name, "R");

        assert!(is_remote("https://cdn.example.com/data.json"));
        assert!(!is_remote("file:///tmp/data.json"));
        assert!(!is_remote("data/movie-data.json"));
    }
}
