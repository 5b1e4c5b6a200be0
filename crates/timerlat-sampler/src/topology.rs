//! Active core enumeration.
//!
//! A pool starts one sampler per active core. The set of cores must not
//! change while a pool is starting, so every topology hands out a
//! [`TopologySnapshot`] that holds a shared hotplug guard until dropped.
//! Code that changes the core set takes the exclusive side of that guard.

use crate::error::TopologyError;
use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use std::fs;
use std::path::{Path, PathBuf};

#[cfg(target_os = "linux")]
use crate::linux as platform;

#[cfg(not(target_os = "linux"))]
use crate::fallback as platform;

/// Kernel list of online cores
pub const SYSFS_ONLINE_PATH: &str = "/sys/devices/system/cpu/online";

/// Cores a cpu list may name: `0..MAX_CPUS`, the size of a `cpu_set_t`.
pub const MAX_CPUS: u32 = 1024;

/// Source of the active core list.
pub trait CpuTopology: Send + Sync {
    /// Take a consistent view of the active cores.
    ///
    /// The core set cannot change until the returned snapshot is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error when the core list cannot be read or is empty.
    fn snapshot(&self) -> Result<TopologySnapshot<'_>, TopologyError>;

    /// Hold the core set steady without enumerating it.
    ///
    /// Unlike [`snapshot`](Self::snapshot) this cannot fail, so teardown
    /// can always take it.
    fn hotplug_guard(&self) -> RwLockReadGuard<'_, ()>;
}

/// Active cores, in ascending order, with the hotplug guard held.
#[derive(Debug)]
pub struct TopologySnapshot<'a> {
    cpus: Vec<u32>,
    _hotplug: RwLockReadGuard<'a, ()>,
}

impl<'a> TopologySnapshot<'a> {
    fn new(cpus: Vec<u32>, hotplug: RwLockReadGuard<'a, ()>) -> Result<Self, TopologyError> {
        if cpus.is_empty() {
            return Err(TopologyError::Empty);
        }
        Ok(Self {
            cpus,
            _hotplug: hotplug,
        })
    }

    /// Active cores in ascending order
    pub fn cpus(&self) -> &[u32] {
        &self.cpus
    }

    /// Number of active cores
    pub fn len(&self) -> usize {
        self.cpus.len()
    }

    /// Always false; an empty topology is an error
    pub fn is_empty(&self) -> bool {
        self.cpus.is_empty()
    }
}

/// Cores that are online and in this process's affinity mask.
///
/// The hotplug guard only orders snapshots against each other inside this
/// process. The kernel can still take a core offline or bring one online
/// during a start or a run: cores that appear later get no sampler, and a
/// sampler whose core goes away keeps running wherever the kernel moves it.
#[derive(Debug)]
pub struct SystemTopology {
    online_path: PathBuf,
    hotplug: RwLock<()>,
}

impl SystemTopology {
    /// Read the kernel's online list from sysfs.
    pub fn new() -> Self {
        Self::with_online_path(SYSFS_ONLINE_PATH)
    }

    /// Read the online list from another file.
    pub fn with_online_path(path: impl Into<PathBuf>) -> Self {
        Self {
            online_path: path.into(),
            hotplug: RwLock::new(()),
        }
    }

    fn online_cpus(&self) -> Result<Option<Vec<u32>>, TopologyError> {
        match fs::read_to_string(&self.online_path) {
            Ok(contents) => parse_cpu_list(&contents).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(TopologyError::Read {
                path: self.online_path.clone(),
                source,
            }),
        }
    }

    /// Path of the online list this topology reads
    pub fn online_path(&self) -> &Path {
        &self.online_path
    }
}

impl Default for SystemTopology {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuTopology for SystemTopology {
    fn snapshot(&self) -> Result<TopologySnapshot<'_>, TopologyError> {
        let guard = self.hotplug.read();

        let allowed = platform::allowed_cpus().map_err(|source| TopologyError::Read {
            path: PathBuf::from("sched_getaffinity"),
            source,
        })?;

        // Without a sysfs list, every allowed core is taken as online
        let cpus = match self.online_cpus()? {
            Some(online) => online
                .into_iter()
                .filter(|cpu| allowed.contains(cpu))
                .collect(),
            None => allowed,
        };

        tracing::trace!(count = cpus.len(), "Enumerated active cpus");
        TopologySnapshot::new(cpus, guard)
    }

    fn hotplug_guard(&self) -> RwLockReadGuard<'_, ()> {
        self.hotplug.read()
    }
}

/// Fixed core list, changeable at runtime. Used to drive pools in tests
/// and to restrict sampling to chosen cores.
#[derive(Debug)]
pub struct StaticTopology {
    cpus: Mutex<Vec<u32>>,
    hotplug: RwLock<()>,
}

impl StaticTopology {
    /// Topology with the given active cores.
    pub fn new(cpus: impl IntoIterator<Item = u32>) -> Self {
        Self {
            cpus: Mutex::new(normalize(cpus.into_iter().collect())),
            hotplug: RwLock::new(()),
        }
    }

    /// Replace the active core list. Waits for any in-progress start.
    pub fn set_online(&self, cpus: impl IntoIterator<Item = u32>) {
        let _hotplug = self.hotplug.write();
        *self.cpus.lock() = normalize(cpus.into_iter().collect());
    }
}

impl CpuTopology for StaticTopology {
    fn snapshot(&self) -> Result<TopologySnapshot<'_>, TopologyError> {
        let guard = self.hotplug.read();
        let cpus = self.cpus.lock().clone();
        TopologySnapshot::new(cpus, guard)
    }

    fn hotplug_guard(&self) -> RwLockReadGuard<'_, ()> {
        self.hotplug.read()
    }
}

fn normalize(mut cpus: Vec<u32>) -> Vec<u32> {
    cpus.sort_unstable();
    cpus.dedup();
    cpus
}

/// Parse a kernel cpu list such as `0-3,5,7-8`.
///
/// Whitespace around the list and around each entry is ignored. The result
/// is sorted and free of duplicates.
///
/// # Errors
///
/// Returns [`TopologyError::Parse`] for empty entries, non-numeric values,
/// descending ranges, or cores at or above [`MAX_CPUS`].
pub fn parse_cpu_list(list: &str) -> Result<Vec<u32>, TopologyError> {
    let trimmed = list.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let invalid = || TopologyError::Parse(trimmed.to_string());
    let mut cpus = Vec::new();

    for entry in trimmed.split(',') {
        let entry = entry.trim();
        match entry.split_once('-') {
            Some((start, end)) => {
                let start: u32 = start.trim().parse().map_err(|_| invalid())?;
                let end: u32 = end.trim().parse().map_err(|_| invalid())?;
                if start > end || end >= MAX_CPUS {
                    return Err(invalid());
                }
                cpus.extend(start..=end);
            }
            None => {
                let cpu: u32 = entry.parse().map_err(|_| invalid())?;
                if cpu >= MAX_CPUS {
                    return Err(invalid());
                }
                cpus.push(cpu);
            }
        }
    }

    Ok(normalize(cpus))
}
