//! Filesystem cache store
//!
//! Layout under the root directory:
//!
//! ```text
//! <variant>/<city-slug>/<segment-slug>/
//!     entry.json          manifest: key, counts, stored metric kinds
//!     graph.bin           bincode graph snapshot
//!     <metric-kind>.json  one pretty-printed file per metric artifact
//! ```
//!
//! An entry is written into a staging directory beside its final location
//! and renamed into place, so a failed write never leaves a half-written
//! entry. Replacing an existing entry takes two renames; in between, the key
//! reads as not found.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::to_string_pretty;

use crate::error::Result;
use crate::graph::EventGraph;
use crate::metrics::{MetricArtifact, MetricKind};
use crate::storage::{CacheKey, CacheLookup, CacheStore};

const MANIFEST_FILE: &str = "entry.json";
const GRAPH_FILE: &str = "graph.bin";

/// Contents of `entry.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryManifest {
    pub key: CacheKey,
    /// Set when the slice had no records; no other files are present
    pub no_data: bool,
    pub node_count: usize,
    pub edge_count: usize,
    pub metrics: Vec<MetricKind>,
}

impl EntryManifest {
    fn empty(key: &CacheKey) -> Self {
        Self {
            key: key.clone(),
            no_data: true,
            node_count: 0,
            edge_count: 0,
            metrics: Vec::new(),
        }
    }
}

/// Cache store backed by a directory tree
#[derive(Debug, Clone)]
pub struct FsCacheStore {
    root: PathBuf,
}

impl FsCacheStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        log::debug!("Cache store at {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Manifest of a published entry
    pub fn manifest(&self, key: &CacheKey) -> Result<Option<EntryManifest>> {
        read_json_if_exists(&self.entry_dir(key).join(MANIFEST_FILE))
    }

    fn entry_dir(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.relative_path())
    }

    /// Stage an entry with `write`, then swap it in for the current one
    fn publish(&self, key: &CacheKey, write: impl FnOnce(&Path) -> Result<()>) -> Result<()> {
        let parent = self.root.join(key.variant.as_str()).join(key.city.slug());
        let target = parent.join(key.segment.slug());
        fs::create_dir_all(&parent)?;

        let staging = tempfile::Builder::new()
            .prefix(".staging-")
            .tempdir_in(&parent)?;
        write(staging.path())?;

        if target.exists() {
            // Removed with the temp dir once the new entry is in place
            let retired = tempfile::Builder::new()
                .prefix(".retired-")
                .tempdir_in(&parent)?;
            let previous = retired.path().join("entry");

            fs::rename(&target, &previous)?;
            if let Err(err) = fs::rename(staging.path(), &target) {
                fs::rename(&previous, &target)?;
                return Err(err.into());
            }
        } else {
            fs::rename(staging.path(), &target)?;
        }

        log::debug!("Published {}", key);
        Ok(())
    }
}

impl CacheStore for FsCacheStore {
    fn put(&self, key: &CacheKey, graph: &EventGraph, metrics: &[MetricArtifact]) -> Result<()> {
        self.publish(key, |dir| {
            let mut writer = BufWriter::new(File::create(dir.join(GRAPH_FILE))?);
            bincode::serialize_into(&mut writer, graph)?;
            writer.flush()?;

            for artifact in metrics {
                write_json(&dir.join(format!("{}.json", artifact.kind())), artifact)?;
            }

            let manifest = EntryManifest {
                key: key.clone(),
                no_data: false,
                node_count: graph.node_count(),
                edge_count: graph.edge_count(),
                metrics: metrics.iter().map(MetricArtifact::kind).collect(),
            };
            write_json(&dir.join(MANIFEST_FILE), &manifest)
        })
    }

    fn put_empty(&self, key: &CacheKey) -> Result<()> {
        self.publish(key, |dir| {
            write_json(&dir.join(MANIFEST_FILE), &EntryManifest::empty(key))
        })
    }

    fn get(&self, key: &CacheKey) -> Result<CacheLookup<EventGraph>> {
        let manifest = match self.manifest(key)? {
            Some(manifest) => manifest,
            None => return Ok(CacheLookup::NotFound),
        };
        if manifest.no_data {
            return Ok(CacheLookup::NoData);
        }

        let file = match open_if_exists(&self.entry_dir(key).join(GRAPH_FILE))? {
            Some(file) => file,
            None => return Ok(CacheLookup::NotFound),
        };
        let graph = bincode::deserialize_from(BufReader::new(file))?;
        Ok(CacheLookup::Found(graph))
    }

    fn get_metrics(&self, key: &CacheKey, kind: MetricKind) -> Result<CacheLookup<MetricArtifact>> {
        let manifest = match self.manifest(key)? {
            Some(manifest) => manifest,
            None => return Ok(CacheLookup::NotFound),
        };
        if manifest.no_data {
            return Ok(CacheLookup::NoData);
        }
        if !manifest.metrics.contains(&kind) {
            return Ok(CacheLookup::NotFound);
        }

        let path = self.entry_dir(key).join(format!("{}.json", kind));
        Ok(match read_json_if_exists(&path)? {
            Some(artifact) => CacheLookup::Found(artifact),
            None => CacheLookup::NotFound,
        })
    }

    fn keys(&self) -> Result<Vec<CacheKey>> {
        let mut keys = Vec::new();

        for variant_dir in visible_subdirs(&self.root)? {
            for city_dir in visible_subdirs(&variant_dir)? {
                for entry_dir in visible_subdirs(&city_dir)? {
                    let manifest: Option<EntryManifest> =
                        read_json_if_exists(&entry_dir.join(MANIFEST_FILE))?;
                    if let Some(manifest) = manifest {
                        keys.push(manifest.key);
                    }
                }
            }
        }

        keys.sort_by_cached_key(|key| key.to_string());
        Ok(keys)
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(to_string_pretty(value)?.as_bytes())?;
    Ok(())
}

fn open_if_exists(path: &Path) -> Result<Option<File>> {
    match File::open(path) {
        Ok(file) => Ok(Some(file)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn read_json_if_exists<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match open_if_exists(path)? {
        Some(file) => Ok(Some(serde_json::from_reader(BufReader::new(file))?)),
        None => Ok(None),
    }
}

/// Subdirectories, skipping staging and retired entries
fn visible_subdirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if !hidden && entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    Ok(dirs)
}
