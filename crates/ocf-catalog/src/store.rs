//! # Content Snapshot and Store
//!
//! A [`ContentSnapshot`] is everything resolution needs, loaded in full and
//! never mutated: catalogs, profiles, the registry, and one lazily-filled
//! baseline slot per profile. Readers share it through an `Arc`.
//!
//! [`ContentStore`] holds the current snapshot behind an `ArcSwap`. Loading
//! it is a lock-free atomic read. Publishing new content builds a fresh
//! snapshot off to the side and swaps the pointer; the old snapshot and its
//! cache are dropped once the last in-flight reader releases it.

use std::path::Path;
use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;
use ocf_core::{semantic_digest, ContentDigest, ProfileId};
use serde::Serialize;

use crate::catalog::{Catalog, CatalogSource};
use crate::error::{CatalogError, CatalogResult, ProfileResolutionError};
use crate::parser::{content_files, find_content_file, load_content_typed};
use crate::profile::Profile;
use crate::registry::Registry;
use crate::resolve::{resolve, ResolveOptions, ResolvedBaseline};

type BaselineSlot = OnceLock<Result<Arc<ResolvedBaseline>, ProfileResolutionError>>;

/// Whether a baseline lookup was served from the snapshot cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Miss => "miss",
        }
    }
}

#[derive(Serialize)]
struct DigestView<'a> {
    catalogs: &'a [Catalog],
    profiles: &'a [Profile],
    registry: &'a Registry,
}

/// Immutable content plus its baseline cache.
#[derive(Debug)]
pub struct ContentSnapshot {
    catalogs: Vec<Catalog>,
    profiles: Vec<Profile>,
    registry: Registry,
    options: ResolveOptions,
    digest: ContentDigest,
    baselines: Vec<BaselineSlot>,
}

impl ContentSnapshot {
    /// Build a snapshot, rejecting duplicate catalog or profile identities.
    pub fn new(
        catalogs: Vec<Catalog>,
        profiles: Vec<Profile>,
        registry: Registry,
        options: ResolveOptions,
    ) -> CatalogResult<Self> {
        for (i, c) in catalogs.iter().enumerate() {
            if catalogs[..i].iter().any(|o| o.reference() == c.reference()) {
                return Err(CatalogError::DuplicateCatalog(c.reference().clone()));
            }
        }
        for (i, p) in profiles.iter().enumerate() {
            if profiles[..i].iter().any(|o| o.id() == p.id()) {
                return Err(CatalogError::DuplicateProfile(p.id()));
            }
        }
        let digest = semantic_digest(&DigestView {
            catalogs: &catalogs,
            profiles: &profiles,
            registry: &registry,
        })?;
        let baselines = profiles.iter().map(|_| OnceLock::new()).collect();
        Ok(Self {
            catalogs,
            profiles,
            registry,
            options,
            digest,
            baselines,
        })
    }

    /// Load `catalogs/`, `profiles/` and `registry.{yaml,yml,json}` from a
    /// content directory.
    pub fn load_dir(dir: &Path, options: ResolveOptions) -> CatalogResult<Self> {
        let mut catalogs = Vec::new();
        for path in content_files(&dir.join("catalogs"))? {
            let source: CatalogSource = load_content_typed(&path)?;
            catalogs.push(Catalog::from_source(source)?);
        }
        let mut profiles = Vec::new();
        for path in content_files(&dir.join("profiles"))? {
            profiles.push(load_content_typed::<Profile>(&path)?);
        }
        let registry_path = find_content_file(dir, "registry").ok_or_else(|| CatalogError::FileNotFound {
            path: dir.join("registry.yaml"),
        })?;
        let registry: Registry = load_content_typed(&registry_path)?;

        tracing::info!(
            dir = %dir.display(),
            catalogs = catalogs.len(),
            profiles = profiles.len(),
            registry_version = %registry.version,
            "content loaded"
        );
        Self::new(catalogs, profiles, registry, options)
    }

    pub fn catalogs(&self) -> &[Catalog] {
        &self.catalogs
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    /// Semantic digest over all catalogs, profiles and the registry.
    pub fn content_digest(&self) -> &ContentDigest {
        &self.digest
    }

    /// Find a profile by `name@version`, or by bare name when exactly one
    /// version of that name is loaded.
    pub fn find_profile(&self, requested: &str) -> Result<usize, ProfileResolutionError> {
        let unknown = |reason: &str| ProfileResolutionError::UnknownProfile {
            profile: requested.to_string(),
            reason: reason.to_string(),
        };
        if let Ok(id) = requested.parse::<ProfileId>() {
            return self
                .profiles
                .iter()
                .position(|p| p.id() == id)
                .ok_or_else(|| unknown("no profile with that name and version is loaded"));
        }
        let mut matches = self
            .profiles
            .iter()
            .enumerate()
            .filter(|(_, p)| p.name == requested.trim());
        match (matches.next(), matches.next()) {
            (Some((i, _)), None) => Ok(i),
            (None, _) => Err(unknown("no profile with that name is loaded")),
            (Some(_), Some(_)) => Err(unknown("several versions are loaded; use name@version")),
        }
    }

    /// Resolve a baseline, computing it at most once per snapshot.
    ///
    /// Failures are cached too: the inputs are immutable, so retrying
    /// cannot succeed until new content is swapped in.
    pub fn baseline(
        &self,
        requested: &str,
    ) -> (Result<Arc<ResolvedBaseline>, ProfileResolutionError>, CacheStatus) {
        let index = match self.find_profile(requested) {
            Ok(i) => i,
            Err(e) => return (Err(e), CacheStatus::Miss),
        };
        let slot = &self.baselines[index];
        let status = if slot.get().is_some() {
            CacheStatus::Hit
        } else {
            CacheStatus::Miss
        };
        let result = slot
            .get_or_init(|| {
                resolve(&self.profiles[index], &self.catalogs, &self.registry, &self.options).map(Arc::new)
            })
            .clone();
        metrics::counter!("ocf_baseline_cache_total", "result" => status.as_str()).increment(1);
        (result, status)
    }
}

/// The process-wide handle to the current content snapshot.
pub struct ContentStore {
    current: ArcSwap<ContentSnapshot>,
}

impl ContentStore {
    pub fn new(snapshot: ContentSnapshot) -> Self {
        Self {
            current: ArcSwap::from_pointee(snapshot),
        }
    }

    /// Build a store from a content directory.
    pub fn open(dir: &Path, options: ResolveOptions) -> CatalogResult<Self> {
        Ok(Self::new(ContentSnapshot::load_dir(dir, options)?))
    }

    /// The snapshot in effect right now. Holders keep it alive across swaps.
    pub fn snapshot(&self) -> Arc<ContentSnapshot> {
        self.current.load_full()
    }

    /// Atomically publish new content; returns the snapshot it replaced.
    pub fn replace(&self, next: ContentSnapshot) -> Arc<ContentSnapshot> {
        let next = Arc::new(next);
        let previous = self.current.swap(Arc::clone(&next));
        tracing::warn!(
            previous = %previous.content_digest(),
            current = %next.content_digest(),
            "content snapshot replaced"
        );
        previous
    }

    /// Reload from disk and swap. The current snapshot stays in place if
    /// loading fails.
    pub fn reload(&self, dir: &Path) -> CatalogResult<Arc<ContentSnapshot>> {
        let options = *self.current.load().options();
        let next = ContentSnapshot::load_dir(dir, options)?;
        Ok(self.replace(next))
    }
}

impl std::fmt::Debug for ContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentStore")
            .field("content_digest", &self.current.load().content_digest().to_string())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocf_core::ControlId;

    fn write(dir: &Path, rel: &str, body: &str) {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    fn content_dir(ac_title: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "catalogs/nist.yaml",
            &format!(
                "name: nist\nversion: rev5\ncontrols:\n  - {{id: AC-1, title: '{ac_title}'}}\n  - {{id: AU-2, title: Logging}}\n"
            ),
        );
        write(
            dir.path(),
            "profiles/low.yaml",
            "name: low\nversion: '1'\noperations:\n  - {op: import, catalog: nist@rev5, include: [ac-1]}\n",
        );
        write(
            dir.path(),
            "profiles/broken.json",
            r#"{"name":"broken","version":"1","operations":[{"op":"import","catalog":"ghost@1"}]}"#,
        );
        write(dir.path(), "registry.yaml", "version: r1\nentries: []\n");
        dir
    }

    #[test]
    fn load_dir_reads_everything() {
        let dir = content_dir("Policy");
        let snap = ContentSnapshot::load_dir(dir.path(), ResolveOptions::default()).unwrap();
        assert_eq!(snap.catalogs().len(), 1);
        assert_eq!(snap.profiles().len(), 2);
        assert_eq!(snap.registry().version, "r1");
    }

    #[test]
    fn missing_registry_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ContentSnapshot::load_dir(dir.path(), ResolveOptions::default()).unwrap_err();
        assert!(matches!(err, CatalogError::FileNotFound { .. }));
    }

    #[test]
    fn baseline_is_cached_per_snapshot() {
        let dir = content_dir("Policy");
        let snap = ContentSnapshot::load_dir(dir.path(), ResolveOptions::default()).unwrap();
        let (first, s1) = snap.baseline("low");
        let (second, s2) = snap.baseline("low@1");
        assert_eq!(s1, CacheStatus::Miss);
        assert_eq!(s2, CacheStatus::Hit);
        assert!(Arc::ptr_eq(&first.unwrap(), &second.unwrap()));
    }

    #[test]
    fn resolution_failures_are_cached() {
        let dir = content_dir("Policy");
        let snap = ContentSnapshot::load_dir(dir.path(), ResolveOptions::default()).unwrap();
        let (a, _) = snap.baseline("broken");
        let (b, status) = snap.baseline("broken");
        assert!(matches!(a, Err(ProfileResolutionError::MissingCatalog { .. })));
        assert_eq!(a.unwrap_err(), b.unwrap_err());
        assert_eq!(status, CacheStatus::Hit);
    }

    #[test]
    fn unknown_and_ambiguous_profiles() {
        let dir = content_dir("Policy");
        let snap = ContentSnapshot::load_dir(dir.path(), ResolveOptions::default()).unwrap();
        assert!(matches!(
            snap.baseline("moderate").0,
            Err(ProfileResolutionError::UnknownProfile { .. })
        ));
        assert!(snap.find_profile("low@2").is_err());

        let mut profiles = snap.profiles().to_vec();
        let mut v2 = profiles[1].clone();
        v2.version = "2".to_string();
        profiles.push(v2);
        let snap2 = ContentSnapshot::new(
            snap.catalogs().to_vec(),
            profiles,
            snap.registry().clone(),
            ResolveOptions::default(),
        )
        .unwrap();
        let err = snap2.find_profile("low").unwrap_err();
        assert!(err.to_string().contains("name@version"));
        assert!(snap2.find_profile("low@2").is_ok());
    }

    #[test]
    fn duplicate_profile_rejected() {
        let dir = content_dir("Policy");
        let snap = ContentSnapshot::load_dir(dir.path(), ResolveOptions::default()).unwrap();
        let mut profiles = snap.profiles().to_vec();
        profiles.push(profiles[0].clone());
        let err = ContentSnapshot::new(
            snap.catalogs().to_vec(),
            profiles,
            snap.registry().clone(),
            ResolveOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateProfile(_)));
    }

    #[test]
    fn swap_keeps_in_flight_readers_on_old_snapshot() {
        let old_dir = content_dir("Policy");
        let new_dir = content_dir("Policy v2");
        let store = ContentStore::open(old_dir.path(), ResolveOptions::default()).unwrap();

        let held = store.snapshot();
        let (old_baseline, _) = held.baseline("low");

        let previous = store.reload(new_dir.path()).unwrap();
        assert!(Arc::ptr_eq(&previous, &held));
        assert_ne!(store.snapshot().content_digest(), held.content_digest());

        let ac1 = ControlId::new("ac-1").unwrap();
        let (new_baseline, status) = store.snapshot().baseline("low");
        assert_eq!(status, CacheStatus::Miss);
        assert_eq!(old_baseline.unwrap().controls[&ac1].control.title, "Policy");
        assert_eq!(new_baseline.unwrap().controls[&ac1].control.title, "Policy v2");
    }

    #[test]
    fn failed_reload_keeps_current() {
        let dir = content_dir("Policy");
        let store = ContentStore::open(dir.path(), ResolveOptions::default()).unwrap();
        let before = store.snapshot();
        let empty = tempfile::tempdir().unwrap();
        assert!(store.reload(empty.path()).is_err());
        assert!(Arc::ptr_eq(&before, &store.snapshot()));
    }
}
