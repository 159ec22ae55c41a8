//! Constraint registry: token to constraint factory.
//!
//! # Responsibilities
//! - Map case-insensitive tokens (`int`, `range`, ...) to factories
//! - Build constraint instances from inline arguments
//!
//! # Design Decisions
//! - Factories are closures, not reflection; the registered type's name is captured
//!   at registration for diagnostics
//! - Re-registering a token overwrites the previous factory
//! - Backed by `DashMap` so a late registration racing a lookup sees either entry whole

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;

use crate::error::{Result, RoutingError};
use crate::routing::constraints::default_constraints;
use crate::routing::matcher::RouteConstraint;

/// Arguments written inline after a constraint token, e.g. `1,100` in `range(1,100)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConstraintArgs<'a> {
    raw: Option<&'a str>,
}

impl<'a> ConstraintArgs<'a> {
    pub fn none() -> Self {
        Self { raw: None }
    }

    pub fn new(raw: &'a str) -> Self {
        Self { raw: Some(raw) }
    }

    /// Raw argument text between the parentheses.
    pub fn raw(&self) -> Option<&'a str> {
        self.raw
    }

    /// Comma-separated positional arguments, trimmed.
    pub fn positional(&self) -> Vec<&'a str> {
        match self.raw {
            Some(raw) => raw.split(',').map(str::trim).collect(),
            None => Vec::new(),
        }
    }

    pub fn expect_none(&self) -> std::result::Result<(), String> {
        match self.raw {
            None => Ok(()),
            Some(raw) => Err(format!("takes no arguments, got '{}'", raw)),
        }
    }

    /// Exactly `N` positional arguments.
    pub fn exactly<const N: usize>(&self) -> std::result::Result<[&'a str; N], String> {
        let args = self.positional();
        let count = args.len();
        args.try_into()
            .map_err(|_| format!("expected {} argument(s), got {}", N, count))
    }
}

/// A constraint type that can be built from inline arguments.
pub trait ConstructConstraint: RouteConstraint + Sized + 'static {
    fn construct(args: &ConstraintArgs<'_>) -> std::result::Result<Self, String>;
}

type BuildFn =
    dyn Fn(&ConstraintArgs<'_>) -> std::result::Result<Arc<dyn RouteConstraint>, String> + Send + Sync;

/// Builds constraint instances for one registered token.
#[derive(Clone)]
pub struct ConstraintFactory {
    type_name: Arc<str>,
    build: Arc<BuildFn>,
}

impl ConstraintFactory {
    /// Factory for a type implementing [`ConstructConstraint`].
    pub fn of<C: ConstructConstraint>() -> Self {
        Self::new(std::any::type_name::<C>(), |args: &ConstraintArgs<'_>| {
            C::construct(args).map(|c| Arc::new(c) as Arc<dyn RouteConstraint>)
        })
    }

    /// Factory from a closure. `type_name` identifies what the closure produces.
    pub fn new<F>(type_name: impl Into<Arc<str>>, build: F) -> Self
    where
        F: Fn(&ConstraintArgs<'_>) -> std::result::Result<Arc<dyn RouteConstraint>, String>
            + Send
            + Sync
            + 'static,
    {
        Self {
            type_name: type_name.into(),
            build: Arc::new(build),
        }
    }

    /// Fully qualified name of the produced type.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Unqualified name of the produced type, e.g. `RangeRouteConstraint`.
    pub fn name(&self) -> &str {
        short_type_name(&self.type_name)
    }

    /// Build an instance. `token` is only used for error reporting.
    pub fn create(&self, token: &str, args: &ConstraintArgs<'_>) -> Result<Arc<dyn RouteConstraint>> {
        (self.build)(args).map_err(|reason| RoutingError::ConstraintConstruction {
            token: token.to_string(),
            type_name: self.name().to_string(),
            reason,
        })
    }
}

impl fmt::Debug for ConstraintFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstraintFactory")
            .field("type_name", &self.type_name)
            .finish()
    }
}

fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Registry of constraint tokens.
#[derive(Debug, Default)]
pub struct ConstraintMap {
    entries: DashMap<String, ConstraintFactory>,
}

impl ConstraintMap {
    /// An empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// A map holding the built-in tokens.
    pub fn with_defaults() -> Self {
        let map = Self::new();
        for (token, factory) in default_constraints() {
            map.add_factory(token, factory);
        }
        map
    }

    /// Register `C` under `token`, returning the factory it replaced.
    pub fn add<C: ConstructConstraint>(&self, token: impl AsRef<str>) -> Option<ConstraintFactory> {
        self.add_factory(token, ConstraintFactory::of::<C>())
    }

    /// Register a factory under `token`, returning the factory it replaced.
    pub fn add_factory(
        &self,
        token: impl AsRef<str>,
        factory: ConstraintFactory,
    ) -> Option<ConstraintFactory> {
        let key = token.as_ref().to_lowercase();
        tracing::debug!(token = %key, constraint = factory.name(), "Registering route constraint");
        let previous = self.entries.insert(key, factory);
        if let Some(previous) = &previous {
            tracing::debug!(
                token = %token.as_ref(),
                replaced = previous.name(),
                "Route constraint token overwritten"
            );
        }
        previous
    }

    /// Look up the factory for `token`.
    pub fn resolve(&self, token: &str) -> Result<ConstraintFactory> {
        self.get(token).ok_or_else(|| RoutingError::UnknownConstraint {
            token: token.to_string(),
        })
    }

    pub fn get(&self, token: &str) -> Option<ConstraintFactory> {
        self.entries
            .get(&token.to_lowercase())
            .map(|entry| entry.value().clone())
    }

    pub fn remove(&self, token: &str) -> Option<ConstraintFactory> {
        self.entries.remove(&token.to_lowercase()).map(|(_, f)| f)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.entries.contains_key(&token.to_lowercase())
    }

    /// Registered tokens, sorted.
    pub fn tokens(&self) -> Vec<String> {
        let mut tokens: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        tokens.sort();
        tokens
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
