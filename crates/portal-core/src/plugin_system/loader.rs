use std::collections::HashSet;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tokio::fs;

use crate::event::{EventBus, SystemEvent};
use crate::kernel::constants::MANIFEST_FILE_NAME;
use crate::plugin_system::catalog::PluginCatalog;
use crate::plugin_system::dependency::{DependencyCheckers, DependencySpec};
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::manifest::{DescriptorValidator, PluginDescriptor, is_valid_identifier};
use crate::plugin_system::registry::SharedPluginRegistry;
use crate::plugin_system::traits::Plugin;
use crate::storage::Store;

/// A plugin directory that was not admitted, and why.
#[derive(Debug)]
pub struct Rejection {
    pub path: PathBuf,
    /// Manifest identifier when the manifest got far enough to have one,
    /// otherwise the directory name.
    pub identifier: Option<String>,
    pub error: PluginSystemError,
}

/// Outcome of one [`PluginLoader::load_all`] pass.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Admitted identifiers, in admission order.
    pub admitted: Vec<String>,
    pub rejected: Vec<Rejection>,
}

impl LoadReport {
    pub fn is_admitted(&self, identifier: &str) -> bool {
        self.admitted.iter().any(|id| id == identifier)
    }

    pub fn rejection(&self, identifier: &str) -> Option<&Rejection> {
        self.rejected
            .iter()
            .find(|r| r.identifier.as_deref() == Some(identifier))
    }

    pub fn duplicate_count(&self) -> usize {
        self.rejected
            .iter()
            .filter(|r| matches!(r.error, PluginSystemError::DuplicateIdentifier(_)))
            .count()
    }
}

/// Valid manifest whose dependencies were parsed but not yet all met.
struct Candidate {
    path: PathBuf,
    descriptor: PluginDescriptor,
    dependencies: Vec<DependencySpec>,
}

/// Scans a plugins directory and admits every valid plugin in it.
///
/// Each subdirectory is a candidate holding a `plugin.json`. A bad candidate
/// is logged and recorded in the [`LoadReport`]; it never aborts the scan.
pub struct PluginLoader {
    store: Arc<dyn Store>,
    bus: EventBus,
    catalog: PluginCatalog,
    registry: SharedPluginRegistry,
    checkers: DependencyCheckers,
}

impl PluginLoader {
    pub fn new(
        store: Arc<dyn Store>,
        bus: EventBus,
        catalog: PluginCatalog,
        registry: SharedPluginRegistry,
        checkers: DependencyCheckers,
    ) -> Self {
        Self {
            store,
            bus,
            catalog,
            registry,
            checkers,
        }
    }

    pub fn registry(&self) -> &SharedPluginRegistry {
        &self.registry
    }

    pub fn catalog(&self) -> &PluginCatalog {
        &self.catalog
    }

    /// Scan `plugins_dir` and admit what passes validation and dependency checks.
    ///
    /// Only an unreadable `plugins_dir` is an error. Entries are processed in
    /// file name order, so the first of two manifests claiming the same
    /// identifier wins on every filesystem. Candidates waiting on another
    /// plugin are retried until a pass admits nothing new. A later manifest
    /// for an identifier whose first manifest is still waiting is held back,
    /// and only tried once the earlier one is given up on.
    pub async fn load_all(&self, plugins_dir: &Path) -> Result<LoadReport, PluginSystemError> {
        let entries = self.list_candidates(plugins_dir).await?;
        log::info!(
            "[PluginLoader] Scanning {} ({} candidate entries)",
            plugins_dir.display(),
            entries.len()
        );

        let mut report = LoadReport::default();
        let mut admitted: HashSet<String> = self.registry.read().await.loaded_set();
        let mut pending: Vec<Candidate> = Vec::new();

        for (name, path) in entries {
            if !is_valid_identifier(&name) {
                self.reject(&mut report, path, Some(name.clone()), PluginSystemError::InvalidIdentifier(name));
                continue;
            }

            let descriptor = match read_descriptor(&path).await {
                Ok(descriptor) => descriptor,
                Err(error) => {
                    self.reject(&mut report, path, Some(name), error);
                    continue;
                }
            };
            let id = descriptor.identifier.clone();
            if id != name {
                log::debug!("[PluginLoader] Directory '{}' holds plugin '{}'", name, id);
            }

            let unknown = descriptor.unknown_flags();
            if !unknown.is_empty() {
                log::debug!("[PluginLoader] '{}' declares unknown flags: {}", id, unknown.join(", "));
            }

            if admitted.contains(&id) {
                self.reject_duplicate(&mut report, path, id);
                continue;
            }

            let dependencies = match parse_dependencies(&descriptor) {
                Ok(deps) => deps,
                Err(error) => {
                    self.reject(&mut report, path, Some(id), error);
                    continue;
                }
            };

            match self.store.registry_entry(&id).await {
                Ok(Some(entry)) if !entry.enabled || entry.deleted => {
                    self.reject(&mut report, path, Some(id.clone()), PluginSystemError::Disabled(id));
                    continue;
                }
                Ok(_) => {}
                Err(e) => {
                    self.reject(&mut report, path, Some(id), e.into());
                    continue;
                }
            }

            let candidate = Candidate {
                path,
                descriptor,
                dependencies,
            };
            let held_back = pending.iter().any(|c| c.descriptor.identifier == id);
            let unmet = self.checkers.unmet(&candidate.dependencies, &admitted);
            if !unmet.external.is_empty() {
                let error = PluginSystemError::DependencyUnmet {
                    plugin_id: id.clone(),
                    dependencies: unmet.all(),
                };
                self.reject(&mut report, candidate.path, Some(id), error);
            } else if held_back {
                log::debug!(
                    "[PluginLoader] Holding '{}' at {} behind an earlier manifest",
                    id,
                    candidate.path.display()
                );
                pending.push(candidate);
            } else if !unmet.internal.is_empty() {
                log::debug!("[PluginLoader] Deferring '{}' until its plugin dependencies load", id);
                pending.push(candidate);
            } else {
                self.admit_candidate(candidate, &mut admitted, &mut report).await;
            }
        }

        loop {
            self.admit_ready(&mut pending, &mut admitted, &mut report).await;

            // Stalled: give up on one manifest that holds back another, then retry
            let Some(index) = self.next_to_give_up(&pending, &admitted) else {
                break;
            };
            let candidate = pending.remove(index);
            self.reject_unmet(&mut report, candidate, &admitted);
        }

        for candidate in pending {
            self.reject_unmet(&mut report, candidate, &admitted);
        }

        log::info!(
            "[PluginLoader] Loaded {} plugin(s), rejected {}",
            report.admitted.len(),
            report.rejected.len()
        );
        Ok(report)
    }

    /// Admit deferred candidates until a pass makes no progress. Only the
    /// first waiting manifest of each identifier is considered.
    async fn admit_ready(&self, pending: &mut Vec<Candidate>, admitted: &mut HashSet<String>, report: &mut LoadReport) {
        loop {
            let mut progressed = false;
            let mut waiting: HashSet<String> = HashSet::new();
            for candidate in std::mem::take(pending) {
                let id = candidate.descriptor.identifier.clone();
                if admitted.contains(&id) {
                    self.reject_duplicate(report, candidate.path, id);
                } else if waiting.contains(&id) {
                    pending.push(candidate);
                } else if self.checkers.unmet(&candidate.dependencies, admitted).is_empty() {
                    self.admit_candidate(candidate, admitted, report).await;
                    progressed = true;
                } else {
                    waiting.insert(id);
                    pending.push(candidate);
                }
            }
            if !progressed {
                break;
            }
        }
    }

    /// Index of a stalled candidate holding back a later manifest with the
    /// same identifier. Candidates that only wait on identifiers nobody is
    /// still trying to load go first.
    fn next_to_give_up(&self, pending: &[Candidate], admitted: &HashSet<String>) -> Option<usize> {
        let waiting_ids: HashSet<&str> = pending.iter().map(|c| c.descriptor.identifier.as_str()).collect();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut holding_back = Vec::new();
        for (index, candidate) in pending.iter().enumerate() {
            let id = candidate.descriptor.identifier.as_str();
            if seen.insert(id) && pending[index + 1..].iter().any(|later| later.descriptor.identifier == id) {
                holding_back.push(index);
            }
        }

        let waits_on_pending = |candidate: &Candidate| {
            self.checkers
                .unmet(&candidate.dependencies, admitted)
                .internal
                .iter()
                .any(|spec| waiting_ids.contains(spec.target()))
        };
        holding_back
            .iter()
            .copied()
            .find(|&index| !waits_on_pending(&pending[index]))
            .or_else(|| holding_back.first().copied())
    }

    async fn list_candidates(&self, plugins_dir: &Path) -> Result<Vec<(String, PathBuf)>, PluginSystemError> {
        let unreadable = |source| PluginSystemError::PluginsDirUnreadable {
            path: plugins_dir.to_path_buf(),
            source,
        };
        let mut read_dir = fs::read_dir(plugins_dir).await.map_err(unreadable)?;

        let mut entries = Vec::new();
        while let Some(entry) = read_dir.next_entry().await.map_err(unreadable)? {
            let name = entry.file_name().to_string_lossy().into_owned();
            // `.`, `..`, VCS directories and placeholder files
            if name.starts_with('.') {
                continue;
            }
            let path = entry.path();
            match fs::metadata(&path).await {
                Ok(meta) if meta.is_dir() => entries.push((name, path)),
                Ok(_) => log::debug!("[PluginLoader] Ignoring non-directory {}", path.display()),
                Err(e) => log::warn!("[PluginLoader] Cannot stat {}: {}", path.display(), e),
            }
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }

    async fn admit_candidate(&self, candidate: Candidate, admitted: &mut HashSet<String>, report: &mut LoadReport) {
        let id = candidate.descriptor.identifier.clone();
        match self.admit(candidate.descriptor).await {
            Ok(()) => {
                admitted.insert(id.clone());
                report.admitted.push(id.clone());
                self.bus.emit_event(&SystemEvent::PluginLoaded { plugin_id: id });
            }
            Err(error) => self.reject(report, candidate.path, Some(id), error),
        }
    }

    /// Register hooks, record the plugin in memory, then upsert its registry
    /// row. A failure at any step undoes the earlier ones, so a rejected
    /// plugin leaves no listeners and no new row behind.
    async fn admit(&self, descriptor: PluginDescriptor) -> Result<(), PluginSystemError> {
        let id = descriptor.identifier.clone();

        let instance: Option<Arc<dyn Plugin>> = self.catalog.instantiate(&id).map(Arc::from);
        if let Some(plugin) = &instance {
            if plugin.identifier() != id {
                return Err(PluginSystemError::RegistrationError {
                    plugin_id: id,
                    message: format!("catalog entry builds plugin '{}'", plugin.identifier()),
                });
            }
        }

        let checkpoint = self.bus.checkpoint();
        if let Some(plugin) = &instance {
            let registered = match catch_unwind(AssertUnwindSafe(|| plugin.register_events(&self.bus))) {
                Ok(result) => result,
                Err(_) => Err(PluginSystemError::RegistrationError {
                    plugin_id: id.clone(),
                    message: "panicked while registering event listeners".to_string(),
                }),
            };
            if let Err(e) = registered {
                self.bus.remove_listeners_since(checkpoint);
                return Err(e);
            }
        } else {
            log::debug!("[PluginLoader] '{}' has no compiled-in implementation", id);
        }

        let factory = if descriptor.is_provider() {
            self.catalog.get(&id)
        } else {
            None
        };
        let kind = descriptor.kind;
        let can_deploy = descriptor.can_deploy;
        if let Err(e) = self.registry.write().await.admit(descriptor, instance, factory) {
            self.bus.remove_listeners_since(checkpoint);
            return Err(e);
        }

        let entry = match self.store.upsert_registry_entry(&id, kind).await {
            Ok(entry) => entry,
            Err(e) => {
                self.registry.write().await.remove(&id);
                self.bus.remove_listeners_since(checkpoint);
                return Err(e.into());
            }
        };

        log::info!(
            "[PluginLoader] Admitted plugin '{}' (type={}, can_deploy={}, registry id {})",
            id,
            kind,
            can_deploy,
            entry.id
        );
        Ok(())
    }

    fn reject_duplicate(&self, report: &mut LoadReport, path: PathBuf, id: String) {
        log::warn!("[PluginLoader] Skipping duplicate plugin '{}' at {}", id, path.display());
        report.rejected.push(Rejection {
            path,
            identifier: Some(id.clone()),
            error: PluginSystemError::DuplicateIdentifier(id),
        });
    }

    fn reject_unmet(&self, report: &mut LoadReport, candidate: Candidate, admitted: &HashSet<String>) {
        let id = candidate.descriptor.identifier.clone();
        let error = PluginSystemError::DependencyUnmet {
            plugin_id: id.clone(),
            dependencies: self.checkers.unmet(&candidate.dependencies, admitted).all(),
        };
        self.reject(report, candidate.path, Some(id), error);
    }

    fn reject(&self, report: &mut LoadReport, path: PathBuf, identifier: Option<String>, error: PluginSystemError) {
        log::warn!(
            "[PluginLoader] Rejected plugin '{}' at {}: {}",
            identifier.as_deref().unwrap_or("<unknown>"),
            path.display(),
            error
        );
        report.rejected.push(Rejection {
            path,
            identifier,
            error,
        });
    }
}

async fn read_descriptor(dir: &Path) -> Result<PluginDescriptor, PluginSystemError> {
    let path = dir.join(MANIFEST_FILE_NAME);
    let contents = fs::read_to_string(&path)
        .await
        .map_err(|e| PluginSystemError::ManifestError {
            path: path.clone(),
            message: "cannot read manifest".to_string(),
            source: Some(Box::new(e)),
        })?;
    if contents.trim().is_empty() {
        return Err(PluginSystemError::EmptyManifest(path));
    }

    let value: Value = serde_json::from_str(&contents).map_err(|e| PluginSystemError::ManifestError {
        path: path.clone(),
        message: "manifest is not valid JSON".to_string(),
        source: Some(Box::new(e)),
    })?;
    let is_empty = match &value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    };
    if is_empty {
        return Err(PluginSystemError::EmptyManifest(path));
    }

    DescriptorValidator::parse(value).map_err(|issue| PluginSystemError::InvalidDescriptor { path, issue })
}

fn parse_dependencies(descriptor: &PluginDescriptor) -> Result<Vec<DependencySpec>, PluginSystemError> {
    descriptor
        .dependencies
        .iter()
        .map(|dep| {
            DependencySpec::parse(dep).map_err(|source| PluginSystemError::InvalidDependency {
                plugin_id: descriptor.identifier.clone(),
                source,
            })
        })
        .collect()
}
