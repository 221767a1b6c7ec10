//! Fluent route-registration façade: `GET`/`POST`/.../`Where`/`Group`/`Use`/`Version`.

use crate::constraint::Constraint;
use crate::freeze::{FreezeController, PendingRoute};
use crate::handler::Handler;
use crate::pattern::Pattern;
use http::Method;
use std::sync::Arc;

/// Handle returned from a registration call, supporting the fluent
/// constraint family. Constraints mutate the pending record in place; they
/// take effect when the route is compiled at freeze.
pub struct RouteHandle<'a> {
    controller: &'a FreezeController,
    index: usize,
}

impl<'a> RouteHandle<'a> {
    fn constrain(self, constraint: Constraint) -> Self {
        self.controller.edit_pending(self.index, |route| {
            route.constraints.push(constraint);
        });
        self
    }

    pub fn where_regex(self, param: &str, regex: &str) -> Self {
        match Constraint::new(param, regex) {
            Ok(c) => self.constrain(c),
            Err(_) => self,
        }
    }

    pub fn where_number(self, param: &str) -> Self {
        let c = Constraint::numeric(param);
        self.constrain(c)
    }

    pub fn where_alpha(self, param: &str) -> Self {
        let c = Constraint::alpha(param);
        self.constrain(c)
    }

    pub fn where_alphanumeric(self, param: &str) -> Self {
        let c = Constraint::alphanumeric(param);
        self.constrain(c)
    }

    pub fn where_uuid(self, param: &str) -> Self {
        let c = Constraint::uuid(param);
        self.constrain(c)
    }
}

/// Shared registration surface for the top-level router, a `Group`, and a
/// `Version` scope. Each holds a reference to the same pending-route
/// buffer and a path prefix / middleware stack to prepend.
pub struct Registrar<'a> {
    controller: &'a FreezeController,
    prefix: String,
    middleware: Vec<Arc<dyn Handler>>,
    version: Option<String>,
}

impl<'a> Registrar<'a> {
    pub fn new(controller: &'a FreezeController) -> Self {
        Self {
            controller,
            prefix: String::new(),
            middleware: Vec::new(),
            version: None,
        }
    }

    /// A registrar whose routes are compiled into `version`'s tree instead
    /// of the main tree.
    pub fn for_version(controller: &'a FreezeController, version: &str) -> Self {
        Self {
            controller,
            prefix: String::new(),
            middleware: Vec::new(),
            version: Some(version.to_string()),
        }
    }

    /// Prepend `middleware` to every route's handler chain registered
    /// through this registrar from this point on.
    pub fn use_middleware(&mut self, middleware: Arc<dyn Handler>) -> &mut Self {
        self.middleware.push(middleware);
        self
    }

    /// A sub-registrar sharing the same pending-route buffer, with `prefix`
    /// appended and `middleware` added to the chain.
    pub fn group(&self, prefix: &str, middleware: Vec<Arc<dyn Handler>>) -> Registrar<'a> {
        let mut combined = self.middleware.clone();
        combined.extend(middleware);
        Registrar {
            controller: self.controller,
            prefix: format!("{}{}", self.prefix, prefix),
            middleware: combined,
            version: self.version.clone(),
        }
    }

    pub fn handle(
        &self,
        method: Method,
        path: &str,
        handlers: Vec<Arc<dyn Handler>>,
    ) -> Result<RouteHandle<'a>, crate::error::FreezeError> {
        let full_path = format!("{}{}", self.prefix, path);
        let pattern = Pattern::parse(&full_path)?;
        let mut chain = self.middleware.clone();
        chain.extend(handlers);
        let index = self.controller.buffer(PendingRoute {
            method,
            pattern,
            handlers: chain,
            version: self.version.clone(),
            constraints: crate::constraint::ConstraintSet::new(),
        })?;
        Ok(RouteHandle {
            controller: self.controller,
            index,
        })
    }

    pub fn get(&self, path: &str, handlers: Vec<Arc<dyn Handler>>) -> Result<RouteHandle<'a>, crate::error::FreezeError> {
        self.handle(Method::GET, path, handlers)
    }

    pub fn post(&self, path: &str, handlers: Vec<Arc<dyn Handler>>) -> Result<RouteHandle<'a>, crate::error::FreezeError> {
        self.handle(Method::POST, path, handlers)
    }

    pub fn put(&self, path: &str, handlers: Vec<Arc<dyn Handler>>) -> Result<RouteHandle<'a>, crate::error::FreezeError> {
        self.handle(Method::PUT, path, handlers)
    }

    pub fn delete(&self, path: &str, handlers: Vec<Arc<dyn Handler>>) -> Result<RouteHandle<'a>, crate::error::FreezeError> {
        self.handle(Method::DELETE, path, handlers)
    }

    pub fn patch(&self, path: &str, handlers: Vec<Arc<dyn Handler>>) -> Result<RouteHandle<'a>, crate::error::FreezeError> {
        self.handle(Method::PATCH, path, handlers)
    }

    pub fn head(&self, path: &str, handlers: Vec<Arc<dyn Handler>>) -> Result<RouteHandle<'a>, crate::error::FreezeError> {
        self.handle(Method::HEAD, path, handlers)
    }

    pub fn options(&self, path: &str, handlers: Vec<Arc<dyn Handler>>) -> Result<RouteHandle<'a>, crate::error::FreezeError> {
        self.handle(Method::OPTIONS, path, handlers)
    }

    pub fn trace(&self, path: &str, handlers: Vec<Arc<dyn Handler>>) -> Result<RouteHandle<'a>, crate::error::FreezeError> {
        self.handle(Method::TRACE, path, handlers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_returns_a_constrainable_handle() {
        let controller = FreezeController::new();
        let registrar = Registrar::new(&controller);
        registrar
            .get("/users/:id", Vec::new())
            .unwrap()
            .where_number("id");
        controller.freeze_once(|pending| {
            assert_eq!(pending.len(), 1);
            assert!(!pending[0].constraints.is_empty());
        });
    }

    #[test]
    fn group_prefixes_paths_and_shares_the_pending_buffer() {
        let controller = FreezeController::new();
        let registrar = Registrar::new(&controller);
        let api = registrar.group("/api", Vec::new());
        api.get("/users", Vec::new()).unwrap();

        controller.freeze_once(|pending| {
            assert_eq!(pending[0].pattern.source(), "/api/users");
        });
    }

    #[test]
    fn registering_after_freeze_fails() {
        let controller = FreezeController::new();
        controller.freeze_once(|_| {});
        let registrar = Registrar::new(&controller);
        assert!(registrar.get("/late", Vec::new()).is_err());
    }
}
