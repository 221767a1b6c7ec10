//! Handler chain: a flat, ordered sequence of handlers advanced by an
//! explicit cursor rather than nested calls.
//!
//! This is a deliberate departure from the donor's before/after
//! `Middleware` trait: handlers here are a flat ordered sequence and a
//! handler advances the chain itself by calling [`Context::next`], rather
//! than wrapping a nested call. The flattened model matches the
//! fixed-capacity inline parameter storage in [`crate::context`] — no
//! per-middleware stack frame is needed to thread control through the
//! chain.

use crate::context::Context;
use std::sync::Arc;

/// A single link in the handler chain. Implementors that wish to continue
/// the chain call `ctx.next()`; returning without calling it short-circuits
/// — the standard way to write a terminal route handler or a middleware
/// that rejects a request outright.
pub trait Handler: Send + Sync {
    fn call(&self, ctx: &mut Context);
}

impl<F> Handler for F
where
    F: Fn(&mut Context) + Send + Sync,
{
    fn call(&self, ctx: &mut Context) {
        self(ctx)
    }
}

/// An ordered, immutable sequence of handlers assembled from global
/// middleware, group middleware, and a route's terminal handlers, in that
/// order. Built once at freeze time and shared across every request that
/// matches the owning route.
#[derive(Default, Clone)]
pub struct HandlerChain {
    handlers: Vec<Arc<dyn Handler>>,
}

impl HandlerChain {
    pub fn new(handlers: Vec<Arc<dyn Handler>>) -> Self {
        Self { handlers }
    }

    pub fn get(&self, index: usize) -> Option<&dyn Handler> {
        self.handlers.get(index).map(|h| h.as_ref())
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RequestInfo;
    use http::{HeaderMap, Method};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn req() -> RequestInfo {
        RequestInfo {
            method: Method::GET,
            path: "/".into(),
            headers: HeaderMap::new(),
            raw_query: String::new(),
            cookie_header: None,
        }
    }

    #[test]
    fn chain_runs_handlers_in_order_when_each_calls_next() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let o1 = order.clone();
        let o2 = order.clone();
        let chain = HandlerChain::new(vec![
            Arc::new(move |ctx: &mut Context| {
                o1.lock().unwrap().push(1);
                ctx.next();
            }),
            Arc::new(move |_ctx: &mut Context| {
                o2.lock().unwrap().push(2);
            }),
        ]);

        let mut ctx = Context::default();
        ctx.push_param("unused", "unused");
        let chain = Arc::new(chain);
        // Simulate what the dispatcher does: prepare via the pool API shape.
        let pool = crate::context::ContextPool::new();
        let mut ctx = pool.acquire(chain, "/x".into(), req());
        ctx.next();
        drop(ctx);
        assert_eq!(*order.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn short_circuit_stops_the_chain() {
        let hit = Arc::new(AtomicUsize::new(0));
        let hit2 = hit.clone();
        let chain = Arc::new(HandlerChain::new(vec![
            Arc::new(move |_ctx: &mut Context| {
                // deliberately does not call next()
                hit2.fetch_add(1, Ordering::SeqCst);
            }),
            Arc::new(|_ctx: &mut Context| {
                panic!("second handler must not run");
            }),
        ]));

        let pool = crate::context::ContextPool::new();
        let mut ctx = pool.acquire(chain, "/x".into(), req());
        ctx.next();
        assert_eq!(hit.load(Ordering::SeqCst), 1);
    }
}
