//! Per-request [`Context`] and its pool.
//!
//! Parameters live in a fixed-size inline array (`SmallVec<[_; N]>`, `N = 8`
//! as in the donor's `ParamVec`) with lazy overflow into a `Vec` once a
//! request captures more than `N` parameters — the common case never
//! allocates.

use crate::handler::HandlerChain;
use crate::ids::RequestId;
use crossbeam_queue::SegQueue;
use http::{HeaderMap, Method};
use smallvec::SmallVec;
use std::sync::Arc;

pub const MAX_INLINE_PARAMS: usize = 8;

/// Method, path, headers, and raw query string for a single request, as
/// seen by the routing core. The transport layer constructs this; the core
/// never parses a request body or owns a socket.
#[derive(Debug, Clone)]
pub struct RequestInfo {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub raw_query: String,
    pub cookie_header: Option<String>,
}

type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// A per-request object leased from a [`ContextPool`], carrying captured
/// parameters, the handler-chain cursor, and accumulated errors.
///
/// Between requests a context is fully reset: all param slots cleared, the
/// overflow map dropped, and the cursor returned to `-1`. A context is owned
/// by exactly one in-flight request at a time.
pub struct Context {
    params: ParamVec,
    overflow: Option<Vec<(Arc<str>, String)>>,
    cursor: isize,
    chain: Option<Arc<HandlerChain>>,
    route_pattern: Option<String>,
    version: Option<String>,
    errors: Vec<String>,
    request_id: RequestId,
    pub request: Option<RequestInfo>,
    pub status: u16,
    pub response_headers: HeaderMap,
    pub response_body: Vec<u8>,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            params: SmallVec::new(),
            overflow: None,
            cursor: -1,
            chain: None,
            route_pattern: None,
            version: None,
            errors: Vec::new(),
            request_id: RequestId::next(),
            request: None,
            status: 0,
            response_headers: HeaderMap::new(),
            response_body: Vec::new(),
        }
    }
}

impl Context {
    /// Record a captured parameter, spilling into the overflow vector once
    /// the inline array is exhausted.
    pub fn push_param(&mut self, name: impl Into<Arc<str>>, value: impl Into<String>) {
        if self.params.len() < MAX_INLINE_PARAMS {
            self.params.push((name.into(), value.into()));
        } else {
            self.overflow
                .get_or_insert_with(Vec::new)
                .push((name.into(), value.into()));
        }
    }

    /// Scan the inline array first (a handful of string compares beats
    /// hashing at this size), then the overflow vector.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
            .or_else(|| {
                self.overflow
                    .as_ref()
                    .and_then(|o| o.iter().find(|(k, _)| k.as_ref() == name))
                    .map(|(_, v)| v.as_str())
            })
    }

    pub fn all_params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params
            .iter()
            .map(|(k, v)| (k.as_ref(), v.as_str()))
            .chain(
                self.overflow
                    .iter()
                    .flatten()
                    .map(|(k, v)| (k.as_ref(), v.as_str())),
            )
    }

    pub fn route_pattern(&self) -> Option<&str> {
        self.route_pattern.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// The correlation id for this in-flight request. Minted fresh each
    /// time a context is leased from the pool, so a recycled context never
    /// reuses a prior request's id.
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    pub fn set_version(&mut self, version: impl Into<String>) {
        self.version = Some(version.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Advance the cursor and invoke the next handler in the chain, if any.
    /// Handlers call this to continue the chain; not calling it
    /// short-circuits. Re-entrant calls within a single handler are the
    /// standard idiom for wrap-style middleware.
    pub fn next(&mut self) {
        let Some(chain) = self.chain.clone() else {
            return;
        };
        self.cursor += 1;
        let idx = self.cursor;
        if idx < 0 {
            return;
        }
        if let Some(handler) = chain.get(idx as usize) {
            handler.call(self);
        }
    }

    fn prepare(&mut self, chain: Arc<HandlerChain>, pattern: String, request: RequestInfo) {
        self.chain = Some(chain);
        self.route_pattern = Some(pattern);
        self.request = Some(request);
        self.cursor = -1;
        self.request_id = RequestId::next();
    }

    fn reset(&mut self) {
        self.params.clear();
        self.overflow = None;
        self.cursor = -1;
        self.chain = None;
        self.route_pattern = None;
        self.version = None;
        self.errors.clear();
        self.request = None;
        self.status = 0;
        self.response_headers.clear();
        self.response_body.clear();
    }
}

/// A lock-free free-list of [`Context`] objects backed by
/// `crossbeam_queue::SegQueue`.
#[derive(Default)]
pub struct ContextPool {
    free: SegQueue<Box<Context>>,
}

impl ContextPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pop a context from the free list, or allocate a fresh one.
    pub fn acquire(
        &self,
        chain: Arc<HandlerChain>,
        pattern: String,
        request: RequestInfo,
    ) -> Box<Context> {
        let mut ctx = self.free.pop().unwrap_or_default();
        ctx.prepare(chain, pattern, request);
        ctx
    }

    /// Fully reset `ctx` and return it to the free list. The returned
    /// context holds no references to the request, response, handlers, or
    /// captured values.
    pub fn release(&self, mut ctx: Box<Context>) {
        ctx.reset();
        self.free.push(ctx);
    }
}
