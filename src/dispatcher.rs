//! The dispatcher: `Router` ties together the registry, compiled lookup,
//! version overlay, context pool, and freeze controller into the single
//! `serve` entry point.

use crate::builder::Registrar;
use crate::compiled::CompiledLookup;
use crate::context::{Context, ContextPool, RequestInfo};
use crate::freeze::FreezeController;
use crate::handler::{Handler, HandlerChain};
use crate::observability::DynObservability;
use crate::radix::RadixNode;
use crate::registry::TreeRegistry;
use crate::version::{http_date, VersionRegistry, VersioningOptions};
use http::{HeaderMap, HeaderValue, Method};
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::SystemTime;

/// The response a dispatched request produced, read off the context after
/// the handler chain returns.
pub struct Response {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

fn default_not_found(ctx: &mut Context) {
    ctx.status = 404;
    ctx.response_body = b"404 Not Found".to_vec();
}

/// Top-level router. Owns the mutable-phase pending buffer (via
/// [`FreezeController`]) and, once frozen, the compiled radix forest and
/// lookup tables that serve every request for the router's lifetime.
pub struct Router {
    freeze: FreezeController,
    registry: TreeRegistry,
    compiled: OnceLock<CompiledLookup>,
    versions: Mutex<Option<VersionRegistry>>,
    pool: ContextPool,
    not_found: Arc<dyn Handler>,
    observability: Option<Arc<dyn DynObservability>>,
}

impl Default for Router {
    fn default() -> Self {
        Self {
            freeze: FreezeController::new(),
            registry: TreeRegistry::new(),
            compiled: OnceLock::new(),
            versions: Mutex::new(None),
            pool: ContextPool::new(),
            not_found: Arc::new(default_not_found),
            observability: None,
        }
    }
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// The fluent registration surface for the top-level router.
    pub fn registrar(&self) -> Registrar<'_> {
        Registrar::new(&self.freeze)
    }

    /// Override the not-found handler invoked when routing fails entirely.
    pub fn set_not_found(&mut self, handler: Arc<dyn Handler>) {
        self.not_found = handler;
    }

    /// Wire in an external observability sink. `on_request_start`/
    /// `on_request_end` bracket every dispatch, including not-found misses.
    pub fn set_observability(&mut self, observability: Arc<dyn DynObservability>) {
        self.observability = Some(observability);
    }

    /// Enable version overlay routing. Must be called before the first
    /// request (or explicit [`Router::freeze`]) is served.
    pub fn configure_versioning(
        &self,
        options: VersioningOptions,
    ) -> Result<(), crate::error::VersioningConfigError> {
        let registry = VersionRegistry::new(options)?;
        *self.versions.lock().unwrap_or_else(|e| e.into_inner()) = Some(registry);
        Ok(())
    }

    /// Register routes under a specific API version. The version's tree is
    /// created lazily on first use.
    pub fn version_registrar(&self, version: &str) -> Option<Registrar<'_>> {
        let mut guard = self.versions.lock().unwrap_or_else(|e| e.into_inner());
        let registry = guard.as_mut()?;
        registry.tree_or_insert(version);
        drop(guard);
        Some(Registrar::for_version(&self.freeze, version))
    }

    /// Attach deprecation/sunset metadata to a configured API version. A
    /// no-op if versioning was never configured.
    pub fn set_version_lifecycle(
        &self,
        version: &str,
        lifecycle: crate::version::VersionLifecycle,
    ) {
        let mut guard = self.versions.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(registry) = guard.as_mut() {
            registry.set_lifecycle(version, lifecycle);
        }
    }

    /// Explicitly trigger the one-way mutable -> frozen transition. A no-op
    /// if the router already froze (implicitly, on the first request, or
    /// via an earlier call to this method).
    pub fn freeze(&self) {
        self.ensure_frozen();
    }

    fn ensure_frozen(&self) {
        self.freeze.freeze_once(|pending| {
            let mut trees: HashMap<Method, RadixNode> = HashMap::new();
            let mut compiled_entries = Vec::new();
            let mut version_trees: HashMap<String, HashMap<Method, RadixNode>> = HashMap::new();

            for route in pending {
                let chain = Arc::new(HandlerChain::new(route.handlers));
                let param_names = route.pattern.capture_names().map(String::from).collect();
                let terminal = crate::radix::Terminal {
                    handlers: chain.clone(),
                    pattern: route.pattern.source().to_string(),
                    constraints: route.constraints.clone(),
                    param_names,
                };

                if let Some(version) = &route.version {
                    let forest = version_trees.entry(version.clone()).or_default();
                    let root = forest.entry(route.method.clone()).or_insert_with(|| RadixNode::new(""));
                    if let Err(e) = root.insert(route.pattern.segments(), route.method.clone(), terminal) {
                        tracing::warn!(error = %e, "dropping conflicting versioned route at freeze time");
                    }
                    continue;
                }

                let root = trees.entry(route.method.clone()).or_insert_with(|| RadixNode::new(""));
                if let Err(e) = root.insert(route.pattern.segments(), route.method.clone(), terminal) {
                    tracing::warn!(error = %e, "dropping conflicting route at freeze time");
                    continue;
                }

                compiled_entries.push((
                    route.method.clone(),
                    route.pattern.clone(),
                    crate::compiled::CompiledRoute {
                        handlers: chain,
                        pattern: route.pattern.source().to_string(),
                        constraints: route.constraints,
                    },
                ));
            }

            self.registry.update(|forest| {
                for (method, node) in trees.drain() {
                    forest.insert(method, Arc::new(node));
                }
            });

            let _ = self.compiled.set(CompiledLookup::build(compiled_entries));

            let mut guard = self.versions.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(versions) = guard.as_mut() {
                for (version, mut per_method) in version_trees {
                    let tree_registry = versions.tree_or_insert(&version);
                    tree_registry.update(|forest| {
                        for (method, node) in per_method.drain() {
                            forest.insert(method, Arc::new(node));
                        }
                    });
                }
            }
        });
    }

    /// The `ServeHTTP` entry point. Runs the full routing precedence ladder
    /// and invokes the matched handler chain, or the not-found handler on a
    /// total miss.
    pub fn serve(&self, request: RequestInfo) -> Response {
        self.ensure_frozen();

        let span = tracing::info_span!("dispatch", method = %request.method, path = %request.path);
        let _enter = span.enter();

        let obs_state = self
            .observability
            .as_ref()
            .and_then(|o| o.on_request_start(&request));

        let method = request.method.clone();
        let path = request.path.clone();
        let segments: Vec<&str> = if path == "/" {
            vec![""]
        } else {
            path.trim_start_matches('/').split('/').collect()
        };

        let response = if let Some(outcome) = self.try_main_tree(&method, &path, &segments) {
            self.invoke(outcome.0, outcome.1, outcome.2, None, request, obs_state.as_ref())
        } else if let Some(response) =
            self.try_version_overlay(&request, &method, &path, obs_state.as_ref())
        {
            response
        } else {
            self.invoke(
                Arc::new(HandlerChain::new(vec![self.not_found.clone()])),
                "_not_found".to_string(),
                Vec::new(),
                None,
                request,
                obs_state.as_ref(),
            )
        };

        if let (Some(observability), Some(state)) = (&self.observability, obs_state) {
            observability.on_request_end(state, &path, response.status, response.body.len());
        }

        response
    }

    /// Compiled static hash -> compiled dynamic list (bloom-gated) ->
    /// radix traversal, in that order. The compiled layer is consulted
    /// first because it is the fast path; a miss there always falls
    /// through to the tree, since constraint-bearing routes resolve
    /// definitively only in the radix tree.
    fn try_main_tree(
        &self,
        method: &Method,
        path: &str,
        segments: &[&str],
    ) -> Option<(Arc<HandlerChain>, String, Vec<(String, String)>)> {
        if let Some(compiled) = self.compiled.get() {
            if let Some(route) = compiled.lookup_static(method, path) {
                return Some((route.handlers.clone(), route.pattern.clone(), Vec::new()));
            }

            let prefix = segments.first().copied().unwrap_or("");
            if let Some((route, params)) = compiled.lookup_dynamic(method, prefix, segments) {
                return Some((route.handlers.clone(), route.pattern.clone(), params));
            }
        }

        let start = std::time::Instant::now();
        let forest = self.registry.snapshot();
        let result = forest.get(method).and_then(|root| root.lookup(segments, method)).map(
            |m| {
                (
                    m.terminal.handlers.clone(),
                    m.terminal.pattern.clone(),
                    m.params,
                )
            },
        );
        let elapsed = start.elapsed();
        if elapsed.as_millis() >= 1 {
            tracing::warn!(path, elapsed_ms = elapsed.as_millis() as u64, "slow route match");
        }
        result
    }

    /// Version detection runs only once the main tree has missed. Path
    /// detection strips the version segment before the version-tree
    /// lookup; a miss in the chosen version's tree falls back to the
    /// default version's tree for the same method.
    fn try_version_overlay(
        &self,
        request: &RequestInfo,
        method: &Method,
        _path: &str,
        obs_state: Option<&Box<dyn Any + Send>>,
    ) -> Option<Response> {
        let guard = self.versions.lock().unwrap_or_else(|e| e.into_inner());
        let versions = guard.as_ref()?;

        let (version, stripped_path) = versions.detect(request, method);
        let lookup_path = stripped_path.as_deref().unwrap_or(request.path.as_str());
        let segments: Vec<&str> = if lookup_path == "/" {
            vec![""]
        } else {
            lookup_path.trim_start_matches('/').split('/').collect()
        };

        if let Some(lifecycle) = versions.lifecycle(&version) {
            if versions.enforce_sunset() && lifecycle.is_sunset(SystemTime::now()) {
                return Some(Response {
                    status: 410,
                    headers: HeaderMap::new(),
                    body: format!("API version {version} has been removed").into_bytes(),
                });
            }
        }

        let tree = versions
            .tree(&version)
            .or_else(|| versions.tree(versions.default_version()))?;

        let matched = tree
            .snapshot()
            .get(method)
            .and_then(|root| root.lookup(&segments, method))
            .map(|m| (m.terminal.handlers.clone(), m.terminal.pattern.clone(), m.params))?;

        let mut response = self.invoke(
            matched.0,
            matched.1,
            matched.2,
            Some(version.clone()),
            request.clone(),
            obs_state,
        );

        if versions.emit_headers() {
            if let Some(lifecycle) = versions.lifecycle(&version) {
                if lifecycle.deprecated {
                    response
                        .headers
                        .insert("Deprecation", HeaderValue::from_static("true"));
                }
                if let Some(sunset) = lifecycle.sunset {
                    if let Ok(v) = HeaderValue::from_str(&http_date(sunset)) {
                        response.headers.insert("Sunset", v);
                    }
                }
                if let Some(url) = &lifecycle.migration_docs_url {
                    if let Ok(v) = HeaderValue::from_str(&format!("<{url}>; rel=\"deprecation\"")) {
                        response.headers.insert("Link", v);
                    }
                }
            }
        }

        Some(response)
    }

    fn invoke(
        &self,
        chain: Arc<HandlerChain>,
        pattern: String,
        params: Vec<(String, String)>,
        version: Option<String>,
        request: RequestInfo,
        obs_state: Option<&Box<dyn Any + Send>>,
    ) -> Response {
        let logger = self
            .observability
            .as_ref()
            .map(|o| o.build_request_logger(&request, &pattern));
        let _enter = logger.as_ref().map(|span| span.enter());

        let mut ctx = self.pool.acquire(chain, pattern, request);
        tracing::debug!(request_id = %ctx.request_id(), route = ctx.route_pattern().unwrap_or(""), "dispatching");
        for (name, value) in params {
            ctx.push_param(name, value);
        }
        if let Some(version) = version {
            ctx.set_version(version);
        }
        if ctx.status == 0 {
            ctx.status = 200;
        }
        ctx.next();

        let mut response = Response {
            status: ctx.status,
            headers: std::mem::take(&mut ctx.response_headers),
            body: std::mem::take(&mut ctx.response_body),
        };
        self.pool.release(ctx);

        if let (Some(observability), Some(state)) = (&self.observability, obs_state) {
            observability.wrap_response_writer(state.as_ref(), &mut response.headers);
        }

        response
    }
}
