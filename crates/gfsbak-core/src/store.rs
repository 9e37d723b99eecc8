use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{GfsbakError, Result};
use crate::tier::Tier;

/// Separator between a timestamp label and its disambiguation suffix.
/// `2024-03-05` sorts before `2024-03-05&1`, which sorts before
/// `2024-03-06`, so plain lexicographic name ordering stays chronological.
pub const SUFFIX_SEPARATOR: char = '&';

/// The two parallel per-instance namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    /// Raw backup payload directories.
    Payloads,
    /// Chain-metadata (checkpoint) directories, mirrored 1:1 with payloads.
    Checkpoints,
}

impl Namespace {
    fn dir_name(self) -> &'static str {
        match self {
            Namespace::Payloads => "backups",
            Namespace::Checkpoints => "checkpoints",
        }
    }
}

/// Filesystem-shaped persistent state for one node's backup tree.
///
/// All path construction and listing lives here; scheduling logic never
/// touches paths directly, so an alternate backend could be substituted
/// without changing it.
///
/// Layout: `<root>/<node>/backups/<tier>/<name>/` for payloads and
/// `<root>/<node>/checkpoints/<tier>/<name>/` for chain metadata, where
/// `<name>` is `<label>` or `<label>&N`.
pub struct BackupStore {
    node_root: PathBuf,
}

impl BackupStore {
    pub fn new(storage_root: impl AsRef<Path>, node: &str) -> Self {
        Self {
            node_root: storage_root.as_ref().join(node),
        }
    }

    /// Root of this node's backup tree (`<storage_root>/<node>`).
    pub fn node_root(&self) -> &Path {
        &self.node_root
    }

    /// The per-node audit log lives at the root of the backup tree.
    pub fn audit_log_path(&self) -> PathBuf {
        self.node_root.join("audit.log")
    }

    pub fn tier_dir(&self, ns: Namespace, tier: Tier) -> PathBuf {
        self.node_root.join(ns.dir_name()).join(tier.as_str())
    }

    pub fn instance_dir(&self, ns: Namespace, tier: Tier, name: &str) -> PathBuf {
        self.tier_dir(ns, tier).join(name)
    }

    /// Map a payload directory to its checkpoint counterpart.
    /// Fails when the path is not a payload directory of this store.
    pub fn checkpoint_for_payload(&self, payload: &Path) -> Result<PathBuf> {
        let (tier, name) = self.parse_payload_path(payload)?;
        Ok(self.instance_dir(Namespace::Checkpoints, tier, &name))
    }

    /// Parse `<node_root>/backups/<tier>/<name>` back into its parts.
    pub fn parse_payload_path(&self, payload: &Path) -> Result<(Tier, String)> {
        let rel = payload
            .strip_prefix(self.node_root.join(Namespace::Payloads.dir_name()))
            .map_err(|_| {
                GfsbakError::ChainUnresolvable(format!(
                    "'{}' is not a backup payload path of this node",
                    payload.display()
                ))
            })?;
        let mut parts = rel.components();
        let tier = parts
            .next()
            .and_then(|c| c.as_os_str().to_str())
            .ok_or_else(|| {
                GfsbakError::ChainUnresolvable(format!(
                    "payload path '{}' is missing a tier component",
                    payload.display()
                ))
            })?
            .parse::<Tier>()
            .map_err(|e| GfsbakError::ChainUnresolvable(e.to_string()))?;
        let name = parts
            .next()
            .and_then(|c| c.as_os_str().to_str())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                GfsbakError::ChainUnresolvable(format!(
                    "payload path '{}' is missing an instance name",
                    payload.display()
                ))
            })?;
        if parts.next().is_some() {
            return Err(GfsbakError::ChainUnresolvable(format!(
                "payload path '{}' has trailing components",
                payload.display()
            )));
        }
        Ok((tier, name.to_string()))
    }

    /// List instance names for a tier in one namespace, sorted ascending.
    /// A missing tier directory is the normal empty case, not an error.
    pub fn list(&self, ns: Namespace, tier: Tier) -> Result<Vec<String>> {
        let dir = self.tier_dir(ns, tier);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Most recent instance name for a tier in one namespace.
    pub fn latest(&self, ns: Namespace, tier: Tier) -> Result<Option<String>> {
        Ok(self.list(ns, tier)?.into_iter().next_back())
    }

    /// Allocate a collision-free instance name for `label`.
    ///
    /// The bare label is preferred; when it is already taken the suffix
    /// counts up from 1, past the highest suffix present in either
    /// namespace, so repeated invocations within one timestamp window
    /// never overwrite an earlier instance.
    pub fn allocate_name(&self, tier: Tier, label: &str) -> Result<String> {
        let mut highest: Option<u32> = None;
        for ns in [Namespace::Payloads, Namespace::Checkpoints] {
            for name in self.list(ns, tier)? {
                match suffix_of(&name, label) {
                    Some(seq) => highest = Some(highest.unwrap_or(0).max(seq)),
                    None => continue,
                }
            }
        }
        Ok(match highest {
            None => label.to_string(),
            Some(seq) => format!("{label}{SUFFIX_SEPARATOR}{}", seq + 1),
        })
    }

    /// Create the payload directory for an instance, and the checkpoint
    /// directory alongside it when requested.
    pub fn create_instance_dirs(
        &self,
        tier: Tier,
        name: &str,
        with_checkpoint: bool,
    ) -> Result<()> {
        fs::create_dir_all(self.instance_dir(Namespace::Payloads, tier, name))?;
        if with_checkpoint {
            fs::create_dir_all(self.instance_dir(Namespace::Checkpoints, tier, name))?;
        }
        Ok(())
    }

    /// Delete one instance from both namespaces. Best-effort: an entry
    /// that is already absent is not an error.
    pub fn remove_instance(&self, tier: Tier, name: &str) -> Result<()> {
        for ns in [Namespace::Payloads, Namespace::Checkpoints] {
            let dir = self.instance_dir(ns, tier, name);
            match fs::remove_dir_all(&dir) {
                Ok(()) => debug!(path = %dir.display(), "removed instance directory"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

/// If `name` is `label` or `label&N`, return its suffix number
/// (0 for the bare label). Anything else returns None.
fn suffix_of(name: &str, label: &str) -> Option<u32> {
    if name == label {
        return Some(0);
    }
    let rest = name.strip_prefix(label)?;
    let seq = rest.strip_prefix(SUFFIX_SEPARATOR)?;
    seq.parse().ok()
}
