//! Preview substitution: answering requests from fixtures instead of the
//! network.
//!
//! A request's asset name is its URL without the `scheme://` prefix, e.g.
//! `api.example.com/movie/42?language=en`. Lookup falls back progressively:
//! the last query item is dropped first (the `?` goes with the last one),
//! then the last path segment, until a fixture matches or nothing is left.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use tracing::{debug, warn};

use crate::error::LocalError;
use crate::types::TransportRequest;

/// How an endpoint treats dispatches.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PreviewMode {
    /// Fixtures inside a preview environment, the network otherwise.
    #[default]
    Automatic,
    /// Always answer from fixtures.
    Success,
    /// Never complete. Only cancellation ends the dispatch.
    Loading,
    /// Always fail, with [`LocalError::Preview`] when no error is given.
    Failure(Option<LocalError>),
    /// Always use the network.
    Disabled,
}

/// What a single dispatch does, decided once when it starts.
#[derive(Debug, Clone, PartialEq)]
pub enum PreviewDecision {
    Live,
    Fixture,
    Loading,
    Fail(LocalError),
}

impl PreviewMode {
    pub fn decide(&self, preview_environment: bool) -> PreviewDecision {
        match self {
            PreviewMode::Automatic if preview_environment => PreviewDecision::Fixture,
            PreviewMode::Automatic => PreviewDecision::Live,
            PreviewMode::Success => PreviewDecision::Fixture,
            PreviewMode::Loading => PreviewDecision::Loading,
            PreviewMode::Failure(error) => {
                PreviewDecision::Fail(error.clone().unwrap_or(LocalError::Preview))
            }
            PreviewMode::Disabled => PreviewDecision::Live,
        }
    }
}

/// Fixture identifier for a URL: everything after `scheme://`.
pub fn asset_name(url: &str) -> &str {
    match url.split_once("://") {
        Some((_, rest)) => rest,
        None => url,
    }
}

/// One fallback step, or `None` once the name is used up.
pub fn reduce(name: &str) -> Option<String> {
    if let Some((base, query)) = name.split_once('?') {
        return Some(match query.rsplit_once('&') {
            Some((kept, _)) => format!("{}?{}", base, kept),
            None => base.to_string(),
        });
    }
    name.rsplit_once('/').map(|(parent, _)| parent.to_string())
}

/// The names tried for one lookup, most specific first.
pub fn fallback_names(name: &str) -> FallbackNames {
    FallbackNames {
        next: (!name.is_empty()).then(|| name.to_string()),
    }
}

/// Iterator returned by [`fallback_names`].
#[derive(Debug, Clone)]
pub struct FallbackNames {
    next: Option<String>,
}

impl Iterator for FallbackNames {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let current = self.next.take()?;
        self.next = reduce(&current).filter(|name| !name.is_empty());
        Some(current)
    }
}

/// Source of fixture bytes.
pub trait FixtureStore: Send + Sync {
    fn lookup(&self, name: &str) -> Option<Bytes>;
}

/// Fixtures held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryFixtures {
    fixtures: HashMap<String, Bytes>,
}

impl MemoryFixtures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fixture(mut self, name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        self.insert(name, bytes);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: impl Into<Bytes>) {
        self.fixtures.insert(name.into(), bytes.into());
    }
}

impl FixtureStore for MemoryFixtures {
    fn lookup(&self, name: &str) -> Option<Bytes> {
        self.fixtures.get(name).cloned()
    }
}

/// Fixtures stored as files under a root directory.
///
/// `api.example.com/movie/42` is looked up as that relative path, then with
/// each configured extension appended (`.json`, then image formats).
#[derive(Debug, Clone)]
pub struct DirectoryFixtures {
    root: PathBuf,
    extensions: Vec<String>,
}

impl DirectoryFixtures {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: ["json", "png", "jpg"].map(String::from).to_vec(),
        }
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn candidates(&self, name: &str) -> Option<Vec<PathBuf>> {
        let relative = Path::new(name);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return None;
        }

        let mut paths = vec![self.root.join(relative)];
        for extension in &self.extensions {
            paths.push(self.root.join(format!("{}.{}", name, extension)));
        }
        Some(paths)
    }
}

impl FixtureStore for DirectoryFixtures {
    fn lookup(&self, name: &str) -> Option<Bytes> {
        let Some(candidates) = self.candidates(name) else {
            warn!(name, "rejected fixture name outside the fixture root");
            return None;
        };
        candidates
            .into_iter()
            .filter(|path| path.is_file())
            .find_map(|path| match std::fs::read(&path) {
                Ok(bytes) => Some(Bytes::from(bytes)),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "unreadable fixture");
                    None
                }
            })
    }
}

/// Answers a request from a fixture store.
pub struct PreviewResolver<'a> {
    store: &'a dyn FixtureStore,
}

impl<'a> PreviewResolver<'a> {
    pub fn new(store: &'a dyn FixtureStore) -> Self {
        Self { store }
    }

    /// Find the fixture for `request`, falling back progressively.
    pub fn resolve(&self, request: &TransportRequest) -> Result<Bytes, LocalError> {
        self.resolve_name(asset_name(&request.url))
    }

    pub fn resolve_name(&self, name: &str) -> Result<Bytes, LocalError> {
        for candidate in fallback_names(name) {
            debug!(candidate = %candidate, "fixture lookup");
            if let Some(bytes) = self.store.lookup(&candidate) {
                debug!(name, matched = %candidate, "fixture found");
                return Ok(bytes);
            }
        }
        warn!(name, "preview asset missing");
        Err(LocalError::PreviewAssetMissing {
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records every name it is asked for.
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryFixtures,
        asked: Mutex<Vec<String>>,
    }

    impl FixtureStore for CountingStore {
        fn lookup(&self, name: &str) -> Option<Bytes> {
            self.asked.lock().unwrap().push(name.to_string());
            self.inner.lookup(name)
        }
    }

    #[test]
    fn asset_name_strips_scheme() {
        assert_eq!(
            asset_name("https://api.example.com/movie/42?language=en"),
            "api.example.com/movie/42?language=en"
        );
        assert_eq!(asset_name("api.example.com/x"), "api.example.com/x");
    }

    #[test]
    fn query_items_go_before_path_segments() {
        let names: Vec<_> = fallback_names("api.example.com/search/movie?q=dune&page=2").collect();
        assert_eq!(
            names,
            vec![
                "api.example.com/search/movie?q=dune&page=2",
                "api.example.com/search/movie?q=dune",
                "api.example.com/search/movie",
                "api.example.com/search",
                "api.example.com",
            ]
        );
    }

    #[test]
    fn fallback_is_bounded_by_segments_and_items() {
        let cases = [
            ("api.example.com", 0, 0),
            ("api.example.com/a", 1, 0),
            ("api.example.com/a/b/c?x=1", 3, 1),
            ("api.example.com/a/b?x=1&y=2&z=3", 2, 3),
            ("api.example.com/a/?", 2, 1),
        ];
        for (name, segments, items) in cases {
            let store = CountingStore::default();
            let result = PreviewResolver::new(&store).resolve_name(name);

            assert_eq!(
                result,
                Err(LocalError::PreviewAssetMissing {
                    name: name.to_string()
                })
            );
            assert!(store.asked.lock().unwrap().len() <= segments + items + 1);
        }
    }

    #[test]
    fn empty_name_looks_nothing_up() {
        let store = CountingStore::default();
        assert!(PreviewResolver::new(&store).resolve_name("").is_err());
        assert!(store.asked.lock().unwrap().is_empty());
    }

    #[test]
    fn movie_details_fall_back_to_movie() {
        let store = CountingStore {
            inner: MemoryFixtures::new().with_fixture("api.example.com/movie/42", "{\"id\":42}"),
            ..Default::default()
        };
        let request = TransportRequest {
            method: crate::Method::GET,
            url: "https://api.example.com/movie/42/details".to_string(),
            headers: Vec::new(),
            body: None,
            boundary: None,
        };

        let bytes = PreviewResolver::new(&store).resolve(&request).unwrap();
        assert_eq!(&bytes[..], b"{\"id\":42}");
        assert_eq!(
            *store.asked.lock().unwrap(),
            vec![
                "api.example.com/movie/42/details".to_string(),
                "api.example.com/movie/42".to_string(),
            ]
        );
    }

    #[test]
    fn decide_covers_every_mode() {
        assert_eq!(PreviewMode::Automatic.decide(true), PreviewDecision::Fixture);
        assert_eq!(PreviewMode::Automatic.decide(false), PreviewDecision::Live);
        assert_eq!(PreviewMode::Success.decide(false), PreviewDecision::Fixture);
        assert_eq!(PreviewMode::Loading.decide(false), PreviewDecision::Loading);
        assert_eq!(PreviewMode::Disabled.decide(true), PreviewDecision::Live);
        assert_eq!(
            PreviewMode::Failure(None).decide(false),
            PreviewDecision::Fail(LocalError::Preview)
        );
        let custom = LocalError::Unknown {
            message: "offline".to_string(),
        };
        assert_eq!(
            PreviewMode::Failure(Some(custom.clone())).decide(true),
            PreviewDecision::Fail(custom)
        );
    }

    #[test]
    fn directory_fixtures_try_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let movie_dir = dir.path().join("api.example.com/movie");
        std::fs::create_dir_all(&movie_dir).unwrap();
        std::fs::write(movie_dir.join("42.json"), b"{\"id\":42}").unwrap();
        std::fs::write(dir.path().join("api.example.com/config"), b"exact").unwrap();

        let fixtures = DirectoryFixtures::new(dir.path());
        assert_eq!(
            fixtures.lookup("api.example.com/movie/42").as_deref(),
            Some(&b"{\"id\":42}"[..])
        );
        assert_eq!(
            fixtures.lookup("api.example.com/config").as_deref(),
            Some(&b"exact"[..])
        );
        // a directory is not a fixture
        assert_eq!(fixtures.lookup("api.example.com/movie"), None);
        assert_eq!(fixtures.lookup("api.example.com/missing"), None);
    }

    #[test]
    fn directory_fixtures_reject_escapes() {
        let dir = tempfile::tempdir().unwrap();
        let inner = dir.path().join("root");
        std::fs::create_dir_all(&inner).unwrap();
        std::fs::write(dir.path().join("secret.json"), b"nope").unwrap();

        let fixtures = DirectoryFixtures::new(&inner).with_extensions(["json"]);
        assert_eq!(fixtures.lookup("../secret"), None);
        assert_eq!(fixtures.lookup("/etc/passwd"), None);
        assert_eq!(fixtures.root(), inner.as_path());
    }

    #[test]
    fn directory_named_like_fixture_falls_through_to_extension() {
        let dir = tempfile::tempdir().unwrap();
        let show = dir.path().join("api.example.com/tv/1");
        std::fs::create_dir_all(&show).unwrap();
        std::fs::write(dir.path().join("api.example.com/tv/1.json"), b"{}").unwrap();

        let fixtures = DirectoryFixtures::new(dir.path());
        assert_eq!(
            fixtures.lookup("api.example.com/tv/1").as_deref(),
            Some(&b"{}"[..])
        );
    }

    // /proc/self/mem is a regular file whose first page is unmapped, so
    // reading it from the start fails with EIO.
    #[cfg(target_os = "linux")]
    #[tracing_test::traced_test]
    #[test]
    fn unreadable_fixture_is_logged_and_skipped() {
        let fixtures = DirectoryFixtures::new("/proc/self").with_extensions(["json"]);
        assert_eq!(fixtures.lookup("mem"), None);
        assert!(logs_contain("unreadable fixture"));
        assert!(logs_contain("/proc/self/mem"));
    }
}
