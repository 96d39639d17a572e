//! File-backed threat lists indexed in memory.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use urlinfo_core::{clamp_confidence, LoaderStatus, NormalizedUrl, ThreatInfo, ThreatType};

use crate::{SourceError, SourceLoader, SourceResult};

/// Keys under which a JSON object may hold its entry array
const JSON_LIST_KEYS: [&str; 4] = ["urls", "malware_urls", "entries", "data"];

/// On-disk layout of a threat list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    /// One URL or hostname per line, `#` starts a comment
    #[default]
    List,
    /// Header row with `hostname`, `port`, `path`, `threat_type`, `confidence`
    Csv,
    /// Array of entries, or an object wrapping one
    Json,
}

impl FileFormat {
    /// Infer the format from a file extension
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("csv") => Self::Csv,
            Some("json") => Self::Json,
            _ => Self::List,
        }
    }
}

/// One listed host (optionally narrowed to a port and path)
#[derive(Debug, Clone, PartialEq)]
pub struct FileEntry {
    /// Lowercased hostname
    pub host: String,
    /// Port restriction; `None` matches any port
    pub port: Option<u16>,
    /// Listed path; preferred when several entries share a host
    pub path: Option<String>,
    /// Reported threat category
    pub threat_type: ThreatType,
    /// Reported confidence
    pub confidence: f64,
}

impl FileEntry {
    /// Parse a URL or bare `host[:port][/path]` into an entry.
    ///
    /// Returns `None` if the host is not a valid hostname.
    #[must_use]
    pub fn parse(spec: &str) -> Option<Self> {
        let spec = spec.trim();
        let url = if spec.contains("://") {
            NormalizedUrl::parse(spec)
        } else {
            NormalizedUrl::parse(&format!("http://{spec}"))
        }
        .ok()?;

        Some(Self {
            host: url.host().to_string(),
            port: url.explicit_port(),
            path: (url.path() != "/").then(|| url.path().to_string()),
            threat_type: ThreatType::Malware,
            confidence: 1.0,
        })
    }

    /// Set the reported threat category and confidence
    #[must_use]
    pub fn with_threat(mut self, threat_type: ThreatType, confidence: f64) -> Self {
        self.threat_type = threat_type;
        self.confidence = clamp_confidence(confidence, 1.0);
        self
    }

    fn matches_port(&self, port: u16) -> bool {
        self.port.map_or(true, |p| p == port)
    }
}

/// In-memory index built once from a threat list
#[derive(Debug, Default)]
struct FileIndex {
    by_host: HashMap<String, Vec<FileEntry>>,
    items: usize,
    skipped: usize,
    missing: bool,
}

impl FileIndex {
    fn from_entries(entries: impl IntoIterator<Item = FileEntry>) -> Self {
        let mut index = Self::default();
        for entry in entries {
            index.insert(entry);
        }
        index
    }

    fn insert(&mut self, entry: FileEntry) {
        let bucket = self.by_host.entry(entry.host.clone()).or_default();
        if !bucket.contains(&entry) {
            bucket.push(entry);
            self.items += 1;
        }
    }

    fn lookup(&self, url: &NormalizedUrl) -> Option<&FileEntry> {
        let port = url.port();
        let mut first = None;

        for entry in self.by_host.get(url.host())?.iter().filter(|e| e.matches_port(port)) {
            if entry.path.as_deref() == Some(url.path()) {
                return Some(entry);
            }
            first.get_or_insert(entry);
        }

        first
    }
}

/// Threat source backed by a static list file.
///
/// The file is read and indexed once by [`SourceLoader::initialize`]; queries
/// are pure in-memory lookups.
#[derive(Debug)]
pub struct FileLoader {
    id: String,
    path: Option<PathBuf>,
    format: FileFormat,
    index: OnceLock<FileIndex>,
}

impl FileLoader {
    /// Create a loader for `path`, inferring the format from its extension
    #[must_use]
    pub fn new(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            id: id.into(),
            format: FileFormat::from_path(&path),
            path: Some(path),
            index: OnceLock::new(),
        }
    }

    /// Override the inferred format
    #[must_use]
    pub fn with_format(mut self, format: FileFormat) -> Self {
        self.format = format;
        self
    }

    /// Create a ready loader from in-memory entries
    #[must_use]
    pub fn from_entries(id: impl Into<String>, entries: impl IntoIterator<Item = FileEntry>) -> Self {
        let index = OnceLock::new();
        let _ = index.set(FileIndex::from_entries(entries));
        Self {
            id: id.into(),
            path: None,
            format: FileFormat::default(),
            index,
        }
    }

    /// Path of the backing file, if any
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of indexed entries (0 before initialization)
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.get().map_or(0, |index| index.items)
    }

    /// Returns true if nothing is indexed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SourceLoader for FileLoader {
    fn id(&self) -> &str {
        &self.id
    }

    async fn initialize(&self) -> SourceResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if self.index.get().is_some() {
            return Ok(());
        }

        let index = match tokio::fs::read_to_string(path).await {
            Ok(content) => parse_index(&content, self.format)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(source = %self.id, path = %path.display(), "threat list not found");
                FileIndex {
                    missing: true,
                    ..FileIndex::default()
                }
            }
            Err(e) => return Err(e.into()),
        };

        info!(
            source = %self.id,
            path = %path.display(),
            items = index.items,
            skipped = index.skipped,
            "loaded threat list"
        );

        // A concurrent initialize may have won; both built the same index.
        let _ = self.index.set(index);
        Ok(())
    }

    async fn query(&self, url: &NormalizedUrl, _deadline: Instant) -> SourceResult<Option<ThreatInfo>> {
        let index = self.index.get().ok_or(SourceError::NotReady)?;

        let info = index
            .lookup(url)
            .map(|entry| ThreatInfo::malicious(self.id.as_str(), entry.threat_type, entry.confidence));

        debug!(source = %self.id, url = %url, matched = info.is_some(), "file lookup");
        Ok(info)
    }

    fn status(&self) -> LoaderStatus {
        let Some(index) = self.index.get() else {
            return LoaderStatus::unavailable("threat list not loaded");
        };

        let status = LoaderStatus::ready().with_items(index.items);
        if index.missing {
            let path = self.path.as_deref().map(Path::display);
            status.with_detail(format!(
                "file not found: {}",
                path.map(|p| p.to_string()).unwrap_or_default()
            ))
        } else if index.skipped > 0 {
            status.with_detail(format!("skipped {} unparseable entries", index.skipped))
        } else {
            status
        }
    }
}

fn parse_index(content: &str, format: FileFormat) -> SourceResult<FileIndex> {
    match format {
        FileFormat::List => Ok(parse_list(content)),
        FileFormat::Csv => Ok(parse_csv(content)),
        FileFormat::Json => parse_json(content),
    }
}

fn parse_list(content: &str) -> FileIndex {
    let mut index = FileIndex::default();

    for (number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match FileEntry::parse(line) {
            Some(entry) => index.insert(entry),
            None => {
                warn!(line = number + 1, entry = line, "skipping unparseable list entry");
                index.skipped += 1;
            }
        }
    }

    index
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CsvRow {
    #[serde(alias = "host", alias = "domain")]
    hostname: Option<String>,
    url: Option<String>,
    port: Option<String>,
    path: Option<String>,
    #[serde(alias = "type")]
    threat_type: Option<String>,
    #[serde(alias = "confidence_score")]
    confidence: Option<String>,
}

fn parse_csv(content: &str) -> FileIndex {
    let mut index = FileIndex::default();
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .comment(Some(b'#'))
        .from_reader(content.as_bytes());

    for (number, row) in reader.deserialize::<CsvRow>().enumerate() {
        let entry = row.ok().and_then(|row| {
            let target = row.hostname.or(row.url)?;
            build_entry(
                &target,
                row.port.as_deref(),
                row.path.as_deref(),
                row.threat_type.as_deref(),
                row.confidence.as_deref().and_then(|c| c.parse().ok()),
            )
        });
        match entry {
            Some(entry) => index.insert(entry),
            None => {
                warn!(row = number + 1, "skipping unparseable CSV row");
                index.skipped += 1;
            }
        }
    }

    index
}

fn parse_json(content: &str) -> SourceResult<FileIndex> {
    let document: serde_json::Value = serde_json::from_str(content)?;

    let items = match &document {
        serde_json::Value::Array(items) => items.as_slice(),
        serde_json::Value::Object(map) => JSON_LIST_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(serde_json::Value::as_array))
            .map_or(&[][..], Vec::as_slice),
        _ => {
            return Err(SourceError::Parse(
                "expected a JSON array or object of entries".into(),
            ))
        }
    };

    let mut index = FileIndex::default();
    for (number, item) in items.iter().enumerate() {
        match json_entry(item) {
            Some(entry) => index.insert(entry),
            None => {
                warn!(item = number, "skipping unparseable JSON entry");
                index.skipped += 1;
            }
        }
    }

    Ok(index)
}

fn json_entry(item: &serde_json::Value) -> Option<FileEntry> {
    if let Some(spec) = item.as_str() {
        return FileEntry::parse(spec);
    }

    let object = item.as_object()?;
    let text = |key: &str| object.get(key).and_then(serde_json::Value::as_str);
    let target = text("hostname").or_else(|| text("host")).or_else(|| text("url"))?;
    let port = object.get("port").map(|p| match p {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    });
    let confidence = object
        .get("confidence_score")
        .or_else(|| object.get("confidence"))
        .and_then(serde_json::Value::as_f64);

    build_entry(
        target,
        port.as_deref(),
        text("path"),
        text("threat_type").or_else(|| text("type")),
        confidence,
    )
}

fn build_entry(
    target: &str,
    port: Option<&str>,
    path: Option<&str>,
    threat_type: Option<&str>,
    confidence: Option<f64>,
) -> Option<FileEntry> {
    let mut entry = FileEntry::parse(target)?;

    if let Some(port) = port.and_then(|p| p.trim().parse().ok()) {
        entry.port = Some(port);
    }
    if let Some(path) = path.map(str::trim).filter(|p| !p.is_empty() && *p != "/") {
        entry.path = Some(path.to_string());
    }

    let threat_type = threat_type
        .map(ThreatType::from_label)
        .filter(|t| *t != ThreatType::None)
        .unwrap_or_default();

    Some(entry.with_threat(threat_type, confidence.unwrap_or(1.0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    fn url(raw: &str) -> NormalizedUrl {
        NormalizedUrl::parse(raw).unwrap()
    }

    fn deadline() -> Instant {
        Instant::now() + Duration::from_secs(1)
    }

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(FileFormat::from_path(Path::new("a/b.CSV")), FileFormat::Csv);
        assert_eq!(FileFormat::from_path(Path::new("feed.json")), FileFormat::Json);
        assert_eq!(FileFormat::from_path(Path::new("hosts.txt")), FileFormat::List);
        assert_eq!(FileFormat::from_path(Path::new("hosts")), FileFormat::List);
    }

    #[test]
    fn test_entry_parse() {
        let entry = FileEntry::parse("Evil.NET").unwrap();
        assert_eq!(entry.host, "evil.net");
        assert_eq!(entry.port, None);
        assert_eq!(entry.path, None);

        let entry = FileEntry::parse("https://bad.org:8443/login").unwrap();
        assert_eq!(entry.port, Some(8443));
        assert_eq!(entry.path.as_deref(), Some("/login"));

        assert!(FileEntry::parse("not a host").is_none());
    }

    #[tokio::test]
    async fn test_list_file() {
        let file = write_temp(
            ".txt",
            "# known bad\nevil.net\n\nhttp://phish.example.com/login\nnot a host\n",
        );
        let loader = FileLoader::new("file-list", file.path());
        assert!(!loader.status().ready);

        loader.initialize().await.unwrap();
        let status = loader.status();
        assert!(status.ready);
        assert_eq!(status.items_loaded, Some(2));
        assert_eq!(status.detail.as_deref(), Some("skipped 1 unparseable entries"));

        let hit = loader.query(&url("http://evil.net/trojan"), deadline()).await.unwrap().unwrap();
        assert!(hit.is_malicious);
        assert_eq!(hit.source_id, "file-list");
        assert_eq!(hit.threat_type, Some(ThreatType::Malware));

        let miss = loader.query(&url("http://github.com/"), deadline()).await.unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn test_csv_file() {
        let file = write_temp(
            ".csv",
            "hostname,port,path,threat_type,confidence\n\
             phish.example.com,443,/login,phishing,0.95\n\
             spam.example.com,,,spam,0.4\n\
             ,80,/,malware,1.0\n",
        );
        let loader = FileLoader::new("file-csv", file.path());
        loader.initialize().await.unwrap();
        assert_eq!(loader.len(), 2);

        let hit = loader
            .query(&url("https://phish.example.com/login"), deadline())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hit.threat_type, Some(ThreatType::Phishing));
        assert!((hit.confidence_score - 0.95).abs() < f64::EPSILON);

        // Port-restricted entry does not match another port.
        let miss = loader
            .query(&url("http://phish.example.com/login"), deadline())
            .await
            .unwrap();
        assert!(miss.is_none());

        let hit = loader
            .query(&url("http://spam.example.com:8080/x"), deadline())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hit.threat_type, Some(ThreatType::Spam));
    }

    #[tokio::test]
    async fn test_json_wrapped_file() {
        let file = write_temp(
            ".json",
            r#"{"malware_urls": [
                {"hostname": "evil.net", "threat_type": "trojan", "confidence_score": 0.9},
                {"hostname": "evil.net", "path": "/dropper", "threat_type": "malware", "confidence": 0.6},
                "http://spam.example.com/",
                42
            ]}"#,
        );
        let loader = FileLoader::new("file-json", file.path());
        loader.initialize().await.unwrap();
        assert_eq!(loader.len(), 3);
        assert_eq!(loader.status().detail.as_deref(), Some("skipped 1 unparseable entries"));

        // Exact path match is preferred over the host-wide entry.
        let hit = loader.query(&url("http://evil.net/dropper"), deadline()).await.unwrap().unwrap();
        assert_eq!(hit.threat_type, Some(ThreatType::Malware));

        let hit = loader.query(&url("http://evil.net/other"), deadline()).await.unwrap().unwrap();
        assert_eq!(hit.threat_type, Some(ThreatType::Trojan));
    }

    #[tokio::test]
    async fn test_invalid_json_fails_initialization() {
        let file = write_temp(".json", "{not json");
        let loader = FileLoader::new("file-json", file.path());
        assert!(matches!(loader.initialize().await, Err(SourceError::Json(_))));
        assert!(!loader.status().ready);
    }

    #[tokio::test]
    async fn test_missing_file_is_ready_and_empty() {
        let dir = tempfile::tempdir().unwrap();
        let loader = FileLoader::new("file-missing", dir.path().join("absent.csv"));
        loader.initialize().await.unwrap();

        let status = loader.status();
        assert!(status.ready);
        assert_eq!(status.items_loaded, Some(0));
        assert!(status.detail.unwrap().starts_with("file not found"));
    }

    #[tokio::test]
    async fn test_query_before_initialize() {
        let loader = FileLoader::new("file-late", "/nonexistent/list.txt");
        let err = loader.query(&url("http://evil.net/"), deadline()).await.unwrap_err();
        assert!(matches!(err, SourceError::NotReady));
    }

    #[tokio::test]
    async fn test_from_entries_is_ready() {
        let loader = FileLoader::from_entries(
            "inline",
            [
                FileEntry::parse("evil.net").unwrap(),
                FileEntry::parse("evil.net").unwrap(),
            ],
        );
        assert_eq!(loader.len(), 1);
        assert!(loader.status().ready);
        assert!(loader.query(&url("https://evil.net/"), deadline()).await.unwrap().is_some());
    }
}
