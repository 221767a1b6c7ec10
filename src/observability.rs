//! Observability interface, consumed from outside the routing core.
//!
//! The core never ships a metrics exporter or log sink itself; it only
//! defines the three-method contract a caller wires in. A `state` of
//! `None` means "excluded from observability" — the dispatcher then skips
//! wrapping the response writer entirely.

use crate::context::RequestInfo;
use http::HeaderMap;
use std::any::Any;

/// Marker implemented by response-writer wrappers so double-wrapping can be
/// detected defensively.
pub trait ObservabilityWrapped {
    fn is_observability_wrapped(&self) -> bool {
        true
    }
}

/// The observability contract. `State` is opaque to the router — it is
/// threaded from `on_request_start` through to `on_request_end` unchanged.
pub trait Observability: Send + Sync {
    type State: Send;

    /// Called before routing begins. Returns an optional state token;
    /// `None` excludes this request from further observability calls.
    fn on_request_start(&self, req: &RequestInfo) -> Option<Self::State>;

    /// Called once a route pattern and request-scoped logger are known,
    /// immediately before the handler chain runs.
    fn build_request_logger(&self, req: &RequestInfo, route_pattern: &str) -> tracing::Span {
        tracing::info_span!("request", method = %req.method, path = %req.path, route = route_pattern)
    }

    /// Called after the handler chain runs, with the response headers still
    /// mutable, so a sink can attach request-scoped instrumentation (a trace
    /// id header, a cache-status marker) before the response goes out. Only
    /// called when `on_request_start` produced a state; a request excluded
    /// from observability skips wrapping the response writer entirely.
    fn wrap_response_writer(&self, _state: &Self::State, _headers: &mut HeaderMap) {}

    /// Called after the handler chain returns (or short-circuits), with the
    /// final status code and response body size.
    fn on_request_end(&self, state: Self::State, route_pattern: &str, status: u16, size: usize);
}

/// Type-erased variant used where the dispatcher needs to hold an
/// `Observability` implementor behind a trait object. `State` is boxed as
/// `Box<dyn Any + Send>`.
pub trait DynObservability: Send + Sync {
    fn on_request_start(&self, req: &RequestInfo) -> Option<Box<dyn Any + Send>>;
    fn build_request_logger(&self, req: &RequestInfo, route_pattern: &str) -> tracing::Span;
    fn wrap_response_writer(&self, state: &(dyn Any + Send), headers: &mut HeaderMap);
    fn on_request_end(&self, state: Box<dyn Any + Send>, route_pattern: &str, status: u16, size: usize);
}

impl<T> DynObservability for T
where
    T: Observability,
    T::State: 'static,
{
    fn on_request_start(&self, req: &RequestInfo) -> Option<Box<dyn Any + Send>> {
        Observability::on_request_start(self, req).map(|s| Box::new(s) as Box<dyn Any + Send>)
    }

    fn build_request_logger(&self, req: &RequestInfo, route_pattern: &str) -> tracing::Span {
        Observability::build_request_logger(self, req, route_pattern)
    }

    fn wrap_response_writer(&self, state: &(dyn Any + Send), headers: &mut HeaderMap) {
        if let Some(state) = state.downcast_ref::<T::State>() {
            Observability::wrap_response_writer(self, state, headers);
        }
    }

    fn on_request_end(&self, state: Box<dyn Any + Send>, route_pattern: &str, status: u16, size: usize) {
        if let Ok(state) = state.downcast::<T::State>() {
            Observability::on_request_end(self, *state, route_pattern, status, size);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderMap, Method};

    struct NoopObservability;

    impl Observability for NoopObservability {
        type State = u64;

        fn on_request_start(&self, _req: &RequestInfo) -> Option<Self::State> {
            Some(1)
        }

        fn on_request_end(&self, state: Self::State, _route_pattern: &str, _status: u16, _size: usize) {
            assert_eq!(state, 1);
        }
    }

    #[test]
    fn dyn_observability_round_trips_boxed_state() {
        let obs: Box<dyn DynObservability> = Box::new(NoopObservability);
        let req = RequestInfo {
            method: Method::GET,
            path: "/x".into(),
            headers: HeaderMap::new(),
            raw_query: String::new(),
            cookie_header: None,
        };
        let state = obs.on_request_start(&req).unwrap();
        obs.on_request_end(state, "/x", 200, 0);
    }

    #[test]
    fn excluded_request_produces_no_state() {
        struct Excluding;
        impl Observability for Excluding {
            type State = ();
            fn on_request_start(&self, _req: &RequestInfo) -> Option<Self::State> {
                None
            }
            fn on_request_end(&self, _s: Self::State, _p: &str, _st: u16, _sz: usize) {}
        }
        let obs: Box<dyn DynObservability> = Box::new(Excluding);
        let req = RequestInfo {
            method: Method::GET,
            path: "/x".into(),
            headers: HeaderMap::new(),
            raw_query: String::new(),
            cookie_header: None,
        };
        assert!(obs.on_request_start(&req).is_none());
    }
}
