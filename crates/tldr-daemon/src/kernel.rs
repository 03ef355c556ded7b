//! The daemon itself (C9): owns every per-project index structure built in
//! `tldr-core`/`tldr-index`, accepts connections on the deterministic
//! socket/port from `paths`, and serializes command dispatch behind a single
//! set of locks so concurrent connections never race the same index.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde_json::{json, Value};

use tldr_core::features::cache::FactsCache;
use tldr_core::features::cross_file::resolve_calls;
use tldr_core::features::partition::PartitionedIndex;
use tldr_core::features::parsing::{create_full_registry, LanguageRegistry};
use tldr_core::features::query_cache::{FileRevisions, QueryCache};
use tldr_core::features::slicing::{slice, SliceDirection};
use tldr_core::features::workspace::{WorkspaceConfig, WorkspaceFilter};
use tldr_core::shared::models::error::{CoreError, ErrorKind};
use tldr_core::shared::models::{DFGInfo, FileFacts, Language, PDGInfo, ResolvedEdge};
use tldr_index::StackedDb;

use crate::dirty::DirtyTracker;
use crate::paths::ProjectPaths;
use crate::state::{DaemonState, StateMachine};

const DEFAULT_DIRTY_THRESHOLD: usize = 20;
const DEFAULT_CONTEXT_DEPTH: usize = 2;

pub struct Daemon {
    project_root: PathBuf,
    paths: ProjectPaths,
    state: StateMachine,
    registry: LanguageRegistry,
    facts: RwLock<HashMap<String, FileFacts>>,
    facts_cache: FactsCache,
    revisions: FileRevisions,
    response_cache: QueryCache<Value>,
    partitioned: Mutex<PartitionedIndex>,
    workspace_filter: WorkspaceFilter,
    stacked_db: Mutex<StackedDb>,
    dirty: DirtyTracker,
    started_at: Instant,
    shutdown_requested: AtomicBool,
}

impl Daemon {
    pub fn new(project_root: impl Into<PathBuf>, workspace_config: WorkspaceConfig, semantic_enabled: bool) -> Result<Self, CoreError> {
        let project_root = project_root.into();
        let paths = ProjectPaths::new(project_root.clone());
        let workspace_filter = WorkspaceFilter::new(&workspace_config)?;
        let facts_cache = FactsCache::load(None, Some(paths.call_graph_cache_file())).unwrap_or_else(|_| FactsCache::with_persist_path(paths.call_graph_cache_file()));

        Ok(Self {
            state: StateMachine::new(paths.status_file()),
            registry: create_full_registry(),
            facts: RwLock::new(HashMap::new()),
            facts_cache,
            revisions: FileRevisions::new(),
            response_cache: QueryCache::new(),
            partitioned: Mutex::new(PartitionedIndex::new()),
            workspace_filter,
            stacked_db: Mutex::new(StackedDb::new()),
            dirty: DirtyTracker::new(DEFAULT_DIRTY_THRESHOLD, semantic_enabled),
            started_at: Instant::now(),
            shutdown_requested: AtomicBool::new(false),
            project_root,
            paths,
        })
    }

    pub fn paths(&self) -> &ProjectPaths {
        &self.paths
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn workspace_filter(&self) -> &WorkspaceFilter {
        &self.workspace_filter
    }

    /// Bumps a file's revision and dirty count the same way the `notify`
    /// command does, for callers (the OS file watcher) that don't go
    /// through the JSON dispatch surface. Returns whether this notification
    /// crossed the reindex threshold.
    pub fn notify_path(&self, path: &str) -> bool {
        self.revisions.notify_file_changed(path);
        self.facts_cache.invalidate(path);
        self.dirty.notify(path)
    }

    pub fn state(&self) -> &StateMachine {
        &self.state
    }

    pub fn mark_ready(&self) -> std::io::Result<()> {
        self.state.transition(DaemonState::Ready)
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown_requested.load(Ordering::SeqCst)
    }

    /// Marks the daemon for shutdown without going through the `shutdown`
    /// command's JSON response — used by the idle-timeout watchdog.
    pub fn request_shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::SeqCst);
        let _ = self.state.transition(DaemonState::ShuttingDown);
    }

    /// Persists the facts cache and flips the status file to `stopped`.
    /// Called once the accept loop has returned, never concurrently with a
    /// live request.
    pub fn persist_and_stop(&self) -> std::io::Result<()> {
        if let Err(e) = self.facts_cache.save(None) {
            tracing::warn!(error = %e, "failed to persist facts cache on shutdown");
        }
        self.state.transition(DaemonState::Stopped)
    }

    // -- indexing --------------------------------------------------------

    fn read_and_index(&self, path: &str) -> Result<FileFacts, CoreError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CoreError::new(ErrorKind::Io, e.to_string()).with_file(path))?;
        let hash = FactsCache::hash_source(&content);
        if let Some(cached) = self.facts_cache.get(path, &hash) {
            self.facts.write().insert(path.to_string(), cached.clone());
            return Ok(cached);
        }
        let Some(plugin) = self.registry.get_by_path(path) else {
            return Err(CoreError::not_found(format!("no language plugin registered for {path}")));
        };
        let mut facts = plugin.extract_facts(&content, path);
        facts.content_hash = hash.clone();
        self.facts_cache.put(path, hash, facts.clone());
        self.facts.write().insert(path.to_string(), facts.clone());
        Ok(facts)
    }

    fn resolved_edges(&self) -> Vec<ResolvedEdge> {
        self.stacked_db.lock().get_all_edges()
    }

    fn index_and_resolve(&self, path: &str) -> Result<(FileFacts, Vec<ResolvedEdge>), CoreError> {
        let facts = self.read_and_index(path)?;
        let table_files: Vec<FileFacts> = self.facts.read().values().cloned().collect();
        let table = tldr_core::features::cross_file::SymbolTable::build(&table_files);
        let edges = resolve_calls(&facts, &table);
        {
            let mut db = self.stacked_db.lock();
            let mut partitioned = self.partitioned.lock();
            for edge in &edges {
                db.add_edge(edge.clone());
                partitioned.route(edge.clone());
            }
        }
        Ok((facts, edges))
    }

    // -- dispatch ----------------------------------------------------------

    pub fn dispatch(&self, request: &Value) -> Value {
        let Some(cmd) = request.get("cmd").and_then(Value::as_str) else {
            return json!({"status": "error", "message": "missing \"cmd\" field"});
        };
        let result = match cmd {
            "ping" => Ok(json!({"status": "ok"})),
            "status" => Ok(self.cmd_status()),
            "shutdown" => Ok(self.cmd_shutdown()),
            "notify" => self.cmd_notify(request),
            "extract" => self.cmd_extract(request),
            "imports" => self.cmd_imports(request),
            "structure" => self.cmd_structure(request),
            "calls" => self.cmd_calls(request),
            "importers" => self.cmd_importers(request),
            "cfg" => self.cmd_cfg(request),
            "dfg" => self.cmd_dfg(request),
            "slice" => self.cmd_slice(request),
            "context" => self.cmd_context(request),
            "impact" | "change_impact" => self.cmd_impact(request),
            "dead" => self.cmd_dead(request),
            "arch" => self.cmd_arch(request),
            "search" => self.cmd_search(request),
            "tree" => self.cmd_tree(request),
            "warm" => self.cmd_warm(request),
            "semantic" => Ok(self.cmd_semantic(request)),
            "diagnostics" => Ok(self.cmd_diagnostics(request)),
            other => return json!({"status": "error", "message": format!("Unknown command: {other}")}),
        };
        match result {
            Ok(value) => value,
            Err(err) => json!({"status": "error", "message": err.to_string()}),
        }
    }

    fn cmd_status(&self) -> Value {
        json!({
            "status": "ok",
            "uptime": self.started_at.elapsed().as_secs(),
            "files": self.facts.read().len(),
            "project": self.project_root.display().to_string(),
            "salsa_stats": {
                "hits": self.response_cache.hit_count(),
                "misses": self.response_cache.miss_count(),
            },
            "dedup_stats": {
                "hits": self.facts_cache.hit_count(),
                "misses": self.facts_cache.miss_count(),
            },
            "dirty_count": self.dirty.dirty_count(),
            "dirty_threshold": self.dirty.threshold(),
            "reindex_in_flight": self.dirty.is_reindex_in_flight(),
        })
    }

    fn cmd_shutdown(&self) -> Value {
        self.request_shutdown();
        json!({"status": "shutting_down"})
    }

    fn cmd_notify(&self, request: &Value) -> Result<Value, CoreError> {
        let file = require_str(request, "file")?;
        let triggered = self.notify_path(file);
        Ok(json!({
            "status": "ok",
            "dirty_count": self.dirty.dirty_count(),
            "threshold": self.dirty.threshold(),
            "reindex_triggered": triggered,
        }))
    }

    /// Memoizes a query against the file revisions it read (C8): a `notify`
    /// bump for any dependency path is the only thing that can invalidate it.
    fn cached(&self, op: &str, args: Vec<(&str, Value)>, deps: &[&str], compute: impl FnOnce() -> Value) -> Value {
        let key = tldr_core::features::query_cache::canonical_key(op, args);
        self.response_cache.get_or_compute(key, deps, &self.revisions, compute)
    }

    fn cached_for_file(&self, op: &str, file: &str, compute: impl FnOnce() -> Value) -> Value {
        self.cached(op, vec![("file", json!(file))], &[file], compute)
    }

    /// Every project-wide query (no single file fully determines its
    /// result) is memoized against the revision of *every* currently known
    /// file, so a `notify` on any indexed file invalidates it — the
    /// project-wide analogue of `cached_for_file`'s single-path dependency.
    fn cached_project_wide(&self, op: &str, args: Vec<(&str, Value)>, compute: impl FnOnce() -> Value) -> Value {
        let known: Vec<String> = self.facts.read().keys().cloned().collect();
        let deps: Vec<&str> = known.iter().map(String::as_str).collect();
        self.cached(op, args, &deps, compute)
    }

    fn cmd_extract(&self, request: &Value) -> Result<Value, CoreError> {
        let file = require_str(request, "file")?;
        let response = self.cached_for_file("extract", file, || match self.read_and_index(file) {
            Ok(facts) => json!({"status": "ok", "result": facts}),
            Err(e) => json!({"status": "error", "message": e.to_string()}),
        });
        Ok(response)
    }

    fn cmd_imports(&self, request: &Value) -> Result<Value, CoreError> {
        let file = require_str(request, "file")?;
        let response = self.cached_for_file("imports", file, || match self.read_and_index(file) {
            Ok(facts) => json!({"status": "ok", "imports": facts.imports}),
            Err(e) => json!({"status": "error", "message": e.to_string()}),
        });
        Ok(response)
    }

    fn cmd_structure(&self, request: &Value) -> Result<Value, CoreError> {
        let max_results = request.get("max_results").and_then(Value::as_u64).unwrap_or(u64::MAX) as usize;
        let language = request.get("language").and_then(Value::as_str).map(str::to_string);
        let response = self.cached_project_wide(
            "structure",
            vec![("max_results", json!(max_results)), ("language", json!(language))],
            || {
                let mut entries = Vec::new();
                for facts in self.facts.read().values() {
                    if let Some(lang) = &language {
                        if facts.language.name() != lang {
                            continue;
                        }
                    }
                    for func in &facts.functions {
                        entries.push(json!({"file": facts.path, "function": func.name}));
                    }
                    for class in &facts.classes {
                        entries.push(json!({"file": facts.path, "class": class.name}));
                    }
                }
                entries.truncate(max_results);
                json!({"status": "ok", "result": entries})
            },
        );
        Ok(response)
    }

    fn cmd_calls(&self, request: &Value) -> Result<Value, CoreError> {
        let language = request.get("language").and_then(Value::as_str);
        let mut edges = self.resolved_edges();
        if let Some(lang) = language {
            let facts = self.facts.read();
            edges.retain(|e| facts.get(&e.src_file).map(|f| f.language.name() == lang).unwrap_or(false));
        }
        Ok(json!({"status": "ok", "result": {"edges": edges, "count": edges.len()}}))
    }

    fn cmd_importers(&self, request: &Value) -> Result<Value, CoreError> {
        let module = require_str(request, "module")?;
        let response = self.cached_project_wide("importers", vec![("module", json!(module))], || {
            let edges = self.resolved_edges();
            let mut importers: Vec<&str> = edges
                .iter()
                .filter(|e| e.dst_file == module)
                .map(|e| e.src_file.as_str())
                .collect();
            importers.sort_unstable();
            importers.dedup();
            json!({"status": "ok", "module": module, "importers": importers})
        });
        Ok(response)
    }

    fn cmd_cfg(&self, request: &Value) -> Result<Value, CoreError> {
        let file = require_str(request, "file")?;
        let function = require_str(request, "function")?;
        let response = self.cached(
            "cfg",
            vec![("file", json!(file)), ("function", json!(function))],
            &[file],
            || match self.find_pdg(file, function) {
                Ok((_, pdg)) => json!({"status": "ok", "result": pdg.cfg}),
                Err(e) => json!({"status": "error", "message": e.to_string()}),
            },
        );
        Ok(response)
    }

    fn cmd_dfg(&self, request: &Value) -> Result<Value, CoreError> {
        let file = require_str(request, "file")?;
        let function = require_str(request, "function")?;
        let response = self.cached(
            "dfg",
            vec![("file", json!(file)), ("function", json!(function))],
            &[file],
            || match self.find_pdg(file, function) {
                Ok((_, pdg)) => json!({"status": "ok", "result": pdg.dfg}),
                // Unlike cfg, a missing function never errors here: bulk
                // indexers call dfg over every declared function and can't
                // stop to handle a not-found exception for each miss.
                Err(e) if e.kind == ErrorKind::NotFound => {
                    json!({"status": "ok", "result": DFGInfo::empty(function)})
                }
                Err(e) => json!({"status": "error", "message": e.to_string()}),
            },
        );
        Ok(response)
    }

    fn cmd_slice(&self, request: &Value) -> Result<Value, CoreError> {
        let file = require_str(request, "file")?;
        let function = require_str(request, "function")?;
        let line = request
            .get("line")
            .and_then(Value::as_u64)
            .ok_or_else(|| CoreError::invalid_request("missing or non-numeric field \"line\""))?;
        let direction_arg = request.get("direction").and_then(Value::as_str).unwrap_or("backward");
        let variable_arg = request.get("variable").and_then(Value::as_str);
        let response = self.cached(
            "slice",
            vec![
                ("file", json!(file)),
                ("function", json!(function)),
                ("line", json!(line)),
                ("direction", json!(direction_arg)),
                ("variable", json!(variable_arg)),
            ],
            &[file],
            || {
                let (_, pdg) = match self.find_pdg(file, function) {
                    Ok(pair) => pair,
                    Err(e) => return json!({"status": "error", "message": e.to_string()}),
                };
                let Some(seed_block) = block_containing_line(&pdg.cfg, line) else {
                    return json!({"status": "error", "message": format!("no statement at line {line}")});
                };
                let direction = match direction_arg {
                    "forward" => SliceDirection::Forward,
                    _ => SliceDirection::Backward,
                };
                let result = slice(&pdg, &seed_block, direction, variable_arg);
                let lines = lines_of_blocks(&pdg.cfg, &result.blocks);
                json!({"status": "ok", "lines": lines, "count": lines.len()})
            },
        );
        Ok(response)
    }

    fn find_pdg(&self, file: &str, function: &str) -> Result<(FileFacts, PDGInfo), CoreError> {
        let content = std::fs::read_to_string(file)
            .map_err(|e| CoreError::new(ErrorKind::Io, e.to_string()).with_file(file))?;
        let facts = self.read_and_index(file)?;
        let Some(plugin) = self.registry.get_by_path(file) else {
            return Err(CoreError::not_found(format!("no language plugin registered for {file}")));
        };
        let pdgs = plugin.build_pdgs(&content);
        let pdg = pdgs
            .into_iter()
            .find(|p| p.cfg.function_name == function)
            .ok_or_else(|| CoreError::not_found(format!("no function {function:?} found in {file}")))?;
        Ok((facts, pdg))
    }

    /// Finds the file owning a function named `func`, preferring `file_hint`
    /// when it genuinely defines that function (the protocol identifies
    /// `context`/`impact` targets by bare function name, disambiguated by an
    /// optional file).
    fn resolve_function_file(&self, func: &str, file_hint: Option<&str>) -> Option<String> {
        let facts = self.facts.read();
        if let Some(hint) = file_hint {
            if facts.get(hint).map(|f| f.all_functions().iter().any(|fun| fun.name == func)).unwrap_or(false) {
                return Some(hint.to_string());
            }
        }
        facts.values().find(|f| f.all_functions().iter().any(|fun| fun.name == func)).map(|f| f.path.clone())
    }

    fn cmd_context(&self, request: &Value) -> Result<Value, CoreError> {
        let entry = require_str(request, "entry")?;
        let depth = request.get("depth").and_then(Value::as_u64).unwrap_or(DEFAULT_CONTEXT_DEPTH as u64) as usize;
        let file_hint = request.get("file").and_then(Value::as_str);
        let response = self.cached_project_wide(
            "context",
            vec![("entry", json!(entry)), ("depth", json!(depth)), ("file", json!(file_hint))],
            || {
                let Some(file) = self.resolve_function_file(entry, file_hint) else {
                    return json!({"status": "error", "message": format!("function {entry:?} not found")});
                };
                let edges = self.resolved_edges();
                let reached = bfs_callees(&edges, &file, entry, depth);
                json!({"status": "ok", "result": reached})
            },
        );
        Ok(response)
    }

    fn cmd_impact(&self, request: &Value) -> Result<Value, CoreError> {
        let func = require_str(request, "func")?;
        let target_file = request.get("target_file").and_then(Value::as_str);
        let max_depth = request.get("max_depth").and_then(Value::as_u64).unwrap_or(usize::MAX as u64) as usize;
        let Some(file) = self.resolve_function_file(func, target_file) else {
            return Ok(json!({"status": "error", "message": format!("function {func:?} not found")}));
        };
        let edges = self.resolved_edges();
        let callers = bfs_callers(&edges, &file, func, max_depth);
        Ok(json!({"status": "ok", "callers": callers}))
    }

    fn cmd_dead(&self, request: &Value) -> Result<Value, CoreError> {
        let entry_points: Vec<String> = request
            .get("entry_points")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_else(|| DEFAULT_ENTRY_POINT_NAMES.iter().map(|s| s.to_string()).collect());
        let language = request.get("language").and_then(Value::as_str).map(str::to_string);
        let response = self.cached_project_wide(
            "dead_code",
            vec![("entry_points", json!(entry_points)), ("language", json!(language))],
            || {
                let edges = self.resolved_edges();
                let called: std::collections::HashSet<(String, String)> =
                    edges.iter().map(|e| (e.dst_file.clone(), e.dst_func.clone())).collect();
                let mut dead = Vec::new();
                for facts in self.facts.read().values() {
                    if let Some(lang) = &language {
                        if facts.language.name() != lang {
                            continue;
                        }
                    }
                    for func in facts.all_functions() {
                        if entry_points.iter().any(|e| e == &func.name) {
                            continue;
                        }
                        if !called.contains(&(facts.path.clone(), func.name.clone())) {
                            dead.push(json!({"file": facts.path, "function": func.name}));
                        }
                    }
                }
                json!({"status": "ok", "result": {"dead_code": dead, "count": dead.len()}})
            },
        );
        Ok(response)
    }

    fn cmd_arch(&self, request: &Value) -> Result<Value, CoreError> {
        let language = request.get("language").and_then(Value::as_str).map(str::to_string);
        let response = self.cached_project_wide("architecture", vec![("language", json!(language))], || {
            let files: Vec<Value> = self
                .facts
                .read()
                .values()
                .filter(|f| language.as_deref().map(|l| f.language.name() == l).unwrap_or(true))
                .map(|f| json!({"path": f.path, "functions": f.functions.len(), "classes": f.classes.len()}))
                .collect();
            json!({"status": "ok", "result": {"files": files}})
        });
        Ok(response)
    }

    fn cmd_search(&self, request: &Value) -> Result<Value, CoreError> {
        let pattern = require_str(request, "pattern")?;
        let max_results = request.get("max_results").and_then(Value::as_u64).unwrap_or(u64::MAX) as usize;
        let response = self.cached_project_wide(
            "search",
            vec![("pattern", json!(pattern)), ("max_results", json!(max_results))],
            || {
                let mut results = Vec::new();
                for facts in self.facts.read().values() {
                    for func in facts.all_functions() {
                        if func.name.contains(pattern) {
                            results.push(json!({"file": facts.path, "function": func.name, "line": func.start_line}));
                        }
                    }
                }
                results.truncate(max_results);
                json!({"status": "ok", "results": results})
            },
        );
        Ok(response)
    }

    fn cmd_tree(&self, request: &Value) -> Result<Value, CoreError> {
        let extensions: Option<Vec<String>> = request
            .get("extensions")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(Value::as_str).map(str::to_string).collect());
        let exclude_hidden = request.get("exclude_hidden").and_then(Value::as_bool).unwrap_or(true);
        let response = self.cached_project_wide(
            "tree",
            vec![("extensions", json!(extensions)), ("exclude_hidden", json!(exclude_hidden))],
            || {
                let mut files: Vec<String> = self
                    .facts
                    .read()
                    .keys()
                    .filter(|f| {
                        if exclude_hidden && f.split('/').any(|seg| seg.starts_with('.')) {
                            return false;
                        }
                        match &extensions {
                            Some(exts) => exts.iter().any(|ext| f.ends_with(ext)),
                            None => true,
                        }
                    })
                    .cloned()
                    .collect();
                files.sort_unstable();
                json!({"status": "ok", "result": files})
            },
        );
        Ok(response)
    }

    fn cmd_warm(&self, request: &Value) -> Result<Value, CoreError> {
        let root = request
            .get("root")
            .and_then(Value::as_str)
            .map(PathBuf::from)
            .unwrap_or_else(|| self.project_root.clone());
        let mut indexed = 0usize;
        let mut edges = 0usize;
        for entry in walk_files(&root) {
            let rel = entry
                .strip_prefix(&self.project_root)
                .unwrap_or(&entry)
                .to_string_lossy()
                .to_string();
            if !self.workspace_filter.is_included(&rel) {
                continue;
            }
            if Language::from_file_path(&entry.to_string_lossy()).is_none() {
                continue;
            }
            if let Ok((_, new_edges)) = self.index_and_resolve(&entry.to_string_lossy()) {
                indexed += 1;
                edges += new_edges.len();
            }
        }
        Ok(json!({"status": "ok", "files": indexed, "edges": edges}))
    }

    /// Semantic-embedding indexing is an external collaborator (see
    /// SPEC_FULL.md §1); this daemon reports the command honestly rather
    /// than silently no-opping it.
    fn cmd_semantic(&self, _request: &Value) -> Value {
        json!({"status": "ok", "available": false, "message": "semantic indexing not configured"})
    }

    /// Linting/type-checking is an external collaborator; same honesty
    /// policy as `cmd_semantic`.
    fn cmd_diagnostics(&self, _request: &Value) -> Value {
        json!({"status": "ok", "errors": [], "summary": "no linter configured"})
    }

    pub fn query_at_time(&self, t: DateTime<Utc>) -> Vec<ResolvedEdge> {
        self.stacked_db.lock().query_at_time(t)
    }
}

const DEFAULT_ENTRY_POINT_NAMES: &[&str] = &["main", "__init__", "new"];

/// Parses the leading `{line}:` prefix `generic_cfg_builder` stamps onto
/// every `CFGBlock::statement_ids` entry, then returns the first block whose
/// statements include `line`.
fn block_containing_line(cfg: &tldr_core::shared::models::CFGInfo, line: u64) -> Option<String> {
    cfg.blocks
        .iter()
        .find(|b| b.statement_ids.iter().any(|s| statement_line(s) == Some(line)))
        .map(|b| b.id.clone())
}

/// Collects the sorted, deduplicated set of source lines covered by `blocks`.
fn lines_of_blocks(cfg: &tldr_core::shared::models::CFGInfo, blocks: &std::collections::HashSet<String>) -> Vec<u64> {
    let mut lines: Vec<u64> = cfg
        .blocks
        .iter()
        .filter(|b| blocks.contains(&b.id))
        .flat_map(|b| b.statement_ids.iter().filter_map(|s| statement_line(s)))
        .collect();
    lines.sort_unstable();
    lines.dedup();
    lines
}

fn statement_line(statement_id: &str) -> Option<u64> {
    statement_id.split(':').next().and_then(|n| n.parse().ok())
}

/// Feeds OS-level file-change events from `features::file_watcher` into the
/// same dirty-tracking path the `notify` command uses, so a project watched
/// on disk stays current without a client ever sending an explicit `notify`.
pub struct DaemonFileEventHandler {
    daemon: std::sync::Arc<Daemon>,
}

impl DaemonFileEventHandler {
    pub fn new(daemon: std::sync::Arc<Daemon>) -> Self {
        Self { daemon }
    }
}

impl tldr_core::features::file_watcher::FileEventHandler for DaemonFileEventHandler {
    fn handle_event(&mut self, event: tldr_core::features::file_watcher::FileChangeEvent) -> Result<(), String> {
        let path = event.path();
        let rel = path
            .strip_prefix(self.daemon.project_root())
            .unwrap_or(path)
            .to_string_lossy()
            .to_string();
        if !self.daemon.workspace_filter().is_included(&rel) {
            return Ok(());
        }
        self.daemon.notify_path(&path.to_string_lossy());
        Ok(())
    }

    fn handle_error(&mut self, error: String) {
        tracing::warn!(error = %error, "file watcher error");
    }
}

fn require_str<'a>(request: &'a Value, field: &str) -> Result<&'a str, CoreError> {
    request
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| CoreError::invalid_request(format!("missing or non-string field {field:?}")))
}

fn bfs_callees(edges: &[ResolvedEdge], start_file: &str, start_func: &str, depth: usize) -> Vec<Value> {
    use std::collections::{HashSet, VecDeque};
    let mut visited: HashSet<(String, String)> = HashSet::new();
    let start = (start_file.to_string(), start_func.to_string());
    visited.insert(start.clone());
    let mut queue: VecDeque<((String, String), usize)> = VecDeque::new();
    queue.push_back((start, 0));
    let mut out = Vec::new();
    while let Some((node, level)) = queue.pop_front() {
        if level >= depth {
            continue;
        }
        for edge in edges.iter().filter(|e| (e.src_file.as_str(), e.src_func.as_str()) == (node.0.as_str(), node.1.as_str())) {
            let callee = (edge.dst_file.clone(), edge.dst_func.clone());
            if visited.insert(callee.clone()) {
                out.push(json!({"file": callee.0, "function": callee.1, "depth": level + 1}));
                queue.push_back((callee, level + 1));
            }
        }
    }
    out
}

fn bfs_callers(edges: &[ResolvedEdge], start_file: &str, start_func: &str, depth: usize) -> Vec<Value> {
    use std::collections::{HashSet, VecDeque};
    let mut visited: HashSet<(String, String)> = HashSet::new();
    let start = (start_file.to_string(), start_func.to_string());
    visited.insert(start.clone());
    let mut queue: VecDeque<((String, String), usize)> = VecDeque::new();
    queue.push_back((start, 0));
    let mut out = Vec::new();
    while let Some((node, level)) = queue.pop_front() {
        if level >= depth {
            continue;
        }
        for edge in edges.iter().filter(|e| (e.dst_file.as_str(), e.dst_func.as_str()) == (node.0.as_str(), node.1.as_str())) {
            let caller = (edge.src_file.clone(), edge.src_func.clone());
            if visited.insert(caller.clone()) {
                out.push(json!({"file": caller.0, "function": caller.1, "depth": level + 1}));
                queue.push_back((caller, level + 1));
            }
        }
    }
    out
}

fn walk_files(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else { continue };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else {
                out.push(path);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn daemon_over(dir: &std::path::Path) -> Daemon {
        Daemon::new(dir.to_path_buf(), WorkspaceConfig::default(), false).unwrap()
    }

    #[test]
    fn test_ping_replies_ok() {
        let dir = tempfile::tempdir().unwrap();
        let daemon = daemon_over(dir.path());
        let response = daemon.dispatch(&json!({"cmd": "ping"}));
        assert_eq!(response["status"], "ok");
    }

    #[test]
    fn test_unknown_command_is_an_error_not_a_panic() {
        let dir = tempfile::tempdir().unwrap();
        let daemon = daemon_over(dir.path());
        let response = daemon.dispatch(&json!({"cmd": "not-a-real-command"}));
        assert_eq!(response["status"], "error");
    }

    #[test]
    fn test_extract_then_structure_reports_the_defined_function() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("mod.py");
        std::fs::write(&file_path, "def greet(name):\n    return name\n").unwrap();
        let daemon = daemon_over(dir.path());
        let path_str = file_path.to_string_lossy().to_string();

        let extracted = daemon.dispatch(&json!({"cmd": "extract", "file": path_str}));
        assert_eq!(extracted["status"], "ok");

        let structure = daemon.dispatch(&json!({"cmd": "structure"}));
        assert_eq!(structure["status"], "ok");
        let found = structure["result"]
            .as_array()
            .unwrap()
            .iter()
            .any(|entry| entry["function"] == "greet");
        assert!(found);
    }

    #[test]
    fn test_extract_is_cached_until_notify_invalidates_it() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("mod.py");
        std::fs::write(&file_path, "def a():\n    return 1\n").unwrap();
        let daemon = daemon_over(dir.path());
        let path_str = file_path.to_string_lossy().to_string();

        daemon.dispatch(&json!({"cmd": "extract", "file": path_str}));
        assert_eq!(daemon.response_cache.miss_count(), 1);
        daemon.dispatch(&json!({"cmd": "extract", "file": path_str}));
        assert_eq!(daemon.response_cache.hit_count(), 1);

        daemon.dispatch(&json!({"cmd": "notify", "file": path_str}));
        daemon.dispatch(&json!({"cmd": "extract", "file": path_str}));
        assert_eq!(daemon.response_cache.miss_count(), 2);
    }

    #[test]
    fn test_extract_missing_file_is_an_error_response() {
        let dir = tempfile::tempdir().unwrap();
        let daemon = daemon_over(dir.path());
        let response = daemon.dispatch(&json!({"cmd": "extract", "file": "does-not-exist.py"}));
        assert_eq!(response["status"], "error");
    }

    #[test]
    fn test_cfg_and_slice_over_a_branching_function() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("mod.py");
        std::fs::write(&file_path, "def f(x):\n    if x:\n        return 1\n    return 0\n").unwrap();
        let daemon = daemon_over(dir.path());
        let path_str = file_path.to_string_lossy().to_string();

        let cfg = daemon.dispatch(&json!({"cmd": "cfg", "file": path_str, "function": "f"}));
        assert_eq!(cfg["status"], "ok");
        assert!(cfg["result"]["entry_block_id"].is_string());

        let slice_response = daemon.dispatch(&json!({
            "cmd": "slice", "file": path_str, "function": "f", "line": 1, "direction": "forward"
        }));
        assert_eq!(slice_response["status"], "ok");
        assert!(slice_response["count"].as_u64().unwrap() >= 1);
    }

    #[test]
    fn test_dfg_on_missing_function_is_empty_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("mod.py");
        std::fs::write(&file_path, "def f():\n    return 1\n").unwrap();
        let daemon = daemon_over(dir.path());
        let path_str = file_path.to_string_lossy().to_string();

        let cfg = daemon.dispatch(&json!({"cmd": "cfg", "file": path_str, "function": "missing"}));
        assert_eq!(cfg["status"], "error");

        let dfg = daemon.dispatch(&json!({"cmd": "dfg", "file": path_str, "function": "missing"}));
        assert_eq!(dfg["status"], "ok");
        assert_eq!(dfg["result"]["function_name"], "missing");
        assert_eq!(dfg["result"]["var_refs"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_warm_indexes_every_python_file_under_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.py"), "def a():\n    return 1\n").unwrap();
        std::fs::write(dir.path().join("b.py"), "def b():\n    return a()\n").unwrap();
        let daemon = daemon_over(dir.path());

        let response = daemon.dispatch(&json!({"cmd": "warm"}));
        assert_eq!(response["status"], "ok");
        assert_eq!(response["files"], 2);

        let dead = daemon.dispatch(&json!({"cmd": "dead"}));
        assert_eq!(dead["status"], "ok");
    }
}
