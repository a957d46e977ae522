//! Scopes: lifecycle and responsive context for everything created inside them.
//!
//! A scope records every timeline and child scope created while it is the
//! active context (its revertibles) plus the builders that created them, so
//! it can tear everything down at once and rebuild when a media query flips.
//!
//! The active context is explicit: callbacks receive a [`Ctx`] bound to the
//! scope they run in, and nested `execute` calls get their own `Ctx` that is
//! dropped when the inner call returns.

use std::rc::Rc;

use hashbrown::HashMap;

use crate::config::{Defaults, DefaultsParams};
use crate::engine::Engine;
use crate::error::AnimError;
use crate::ids::{ScopeId, TimelineId};
use crate::media::{MediaEnvironment, MediaQuery};
use crate::outputs::CoreEvent;
use crate::position::Position;
use crate::properties::Properties;
use crate::targets::{resolve_targets, TargetHandle, Targets};
use crate::timeline::{TimelineMut, TimelineParams};

/// Returned by a constructor; run on the next refresh or revert.
pub type Teardown = Box<dyn FnOnce(&mut Ctx<'_>) -> Result<(), AnimError>>;

/// Box a teardown closure.
pub fn teardown(f: impl FnOnce(&mut Ctx<'_>) -> Result<(), AnimError> + 'static) -> Teardown {
    Box::new(f)
}

/// Stored builder, re-run on every refresh.
pub type Constructor = Box<dyn FnMut(&mut Ctx<'_>) -> Result<Option<Teardown>, AnimError>>;

/// Named scope method.
pub type Method = Rc<dyn Fn(&mut Ctx<'_>, &[serde_json::Value]) -> Result<(), AnimError>>;

/// Something a scope tears down on refresh/revert.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Revertible {
    Timeline(TimelineId),
    Scope(ScopeId),
}

/// Scope construction options.
#[derive(Clone, Debug, Default)]
pub struct ScopeParams {
    /// Root that selectors resolve under; the first resolved handle is used.
    pub root: Option<Targets>,
    pub defaults: DefaultsParams,
    /// Named media queries, in declaration order.
    pub media_queries: Vec<(String, String)>,
}

impl ScopeParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(mut self, root: impl Into<Targets>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn defaults(mut self, defaults: DefaultsParams) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn media_query(mut self, name: &str, query: &str) -> Self {
        self.media_queries.push((name.to_string(), query.to_string()));
        self
    }
}

pub struct Scope {
    pub id: ScopeId,
    pub parent: Option<ScopeId>,
    root: Option<TargetHandle>,
    defaults: Defaults,
    media: Vec<(String, MediaQuery)>,
    listening: bool,
    /// Set while one of this scope's constructors is running.
    building: bool,
    matches: HashMap<String, bool>,
    constructors: Vec<Constructor>,
    teardowns: Vec<Teardown>,
    revertibles: Vec<Revertible>,
    methods: HashMap<String, Method>,
}

impl Scope {
    pub fn root(&self) -> Option<&TargetHandle> {
        self.root.as_ref()
    }

    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    /// Match state of `name` as of the last execute/refresh.
    pub fn matches(&self, name: &str) -> bool {
        self.matches.get(name).copied().unwrap_or(false)
    }

    pub fn revertibles(&self) -> &[Revertible] {
        &self.revertibles
    }

    pub fn constructor_count(&self) -> usize {
        self.constructors.len()
    }

    pub(crate) fn forget(&mut self, revertible: Revertible) {
        self.revertibles.retain(|r| *r != revertible);
    }

    fn snapshot(&mut self, env: &MediaEnvironment) {
        for (name, query) in &self.media {
            self.matches.insert(name.clone(), query.matches(env));
        }
    }

    fn media_changed(&self, env: &MediaEnvironment) -> bool {
        self.media
            .iter()
            .any(|(name, q)| self.matches.get(name).copied() != Some(q.matches(env)))
    }
}

/// Execution context handed to scope callbacks.
pub struct Ctx<'e> {
    engine: &'e mut Engine,
    scope: ScopeId,
    root: Option<TargetHandle>,
    defaults: Defaults,
}

impl<'e> Ctx<'e> {
    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    pub fn root(&self) -> Option<&TargetHandle> {
        self.root.as_ref()
    }

    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    pub fn engine(&self) -> &Engine {
        &*self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut *self.engine
    }

    /// Match state of a named media query of this scope.
    pub fn matches(&self, name: &str) -> bool {
        self.engine
            .scopes
            .get(&self.scope)
            .is_some_and(|s| s.matches(name))
    }

    /// Child scope; it inherits this context's defaults and is reverted with it.
    pub fn create_scope(&mut self, params: ScopeParams) -> Result<ScopeId, AnimError> {
        let defaults = self.defaults;
        self.engine
            .create_scope_inner(params, Some(self.scope), self.root.clone(), &defaults)
    }

    /// Timeline owned by this scope.
    pub fn timeline(&mut self, params: TimelineParams) -> TimelineMut<'_> {
        let id = self.engine.create_timeline(
            &params,
            Some(self.scope),
            self.root.clone(),
            &self.defaults,
        );
        self.engine.track(Some(self.scope), Revertible::Timeline(id));
        TimelineMut {
            engine: &mut *self.engine,
            id,
        }
    }

    /// One-entry timeline owned by this scope.
    pub fn animate(
        &mut self,
        targets: impl Into<Targets>,
        props: Properties,
    ) -> Result<TimelineId, AnimError> {
        let mut tl = self.timeline(TimelineParams::default());
        tl.add(targets, props, Position::At(0.0))?;
        Ok(tl.id())
    }

    /// Register a constructor on this scope and run it now.
    ///
    /// From inside another constructor of the same scope the nested one only
    /// runs; its parent rebuilds it on every refresh.
    pub fn add(
        &mut self,
        constructor: impl FnMut(&mut Ctx<'_>) -> Result<Option<Teardown>, AnimError> + 'static,
    ) -> Result<(), AnimError> {
        self.engine.add_constructor(self.scope, constructor)
    }

    fn keep_teardown(&mut self, teardown: Teardown) {
        if let Some(s) = self.engine.scopes.get_mut(&self.scope) {
            s.teardowns.push(teardown);
        }
    }

    /// Run `f` with `scope` as the active context, restoring this one after.
    pub fn execute<R>(
        &mut self,
        scope: ScopeId,
        f: impl FnOnce(&mut Ctx<'_>) -> R,
    ) -> Result<R, AnimError> {
        self.engine.execute(scope, f)
    }
}

impl Engine {
    /// New scope. Inside a running `execute` it becomes a child of the active
    /// scope; otherwise it is top-level. Media queries are validated before
    /// anything is created.
    pub fn create_scope(&mut self, params: ScopeParams) -> Result<ScopeId, AnimError> {
        let (parent, root, defaults) = self.creation_context();
        self.create_scope_inner(params, parent, root, &defaults)
    }

    /// Owner, root and defaults for resources created right now.
    pub(crate) fn creation_context(&self) -> (Option<ScopeId>, Option<TargetHandle>, Defaults) {
        match self.active_scope().and_then(|id| self.scopes.get(&id)) {
            Some(s) => (Some(s.id), s.root.clone(), s.defaults),
            None => (None, None, self.cfg.defaults),
        }
    }

    pub(crate) fn track(&mut self, owner: Option<ScopeId>, revertible: Revertible) {
        if let Some(scope) = owner.and_then(|id| self.scopes.get_mut(&id)) {
            scope.revertibles.push(revertible);
        }
    }

    pub(crate) fn create_scope_inner(
        &mut self,
        params: ScopeParams,
        parent: Option<ScopeId>,
        parent_root: Option<TargetHandle>,
        inherited: &Defaults,
    ) -> Result<ScopeId, AnimError> {
        let media = params
            .media_queries
            .iter()
            .map(|(name, q)| Ok((name.clone(), q.parse::<MediaQuery>()?)))
            .collect::<Result<Vec<_>, AnimError>>()?;
        let root = match &params.root {
            Some(targets) => {
                let handles =
                    resolve_targets(self.resolver.as_mut(), parent_root.as_ref(), targets);
                if handles.is_empty() {
                    log::warn!("scope root {targets:?} matched nothing");
                }
                handles.into_iter().next()
            }
            None => parent_root,
        };
        let id = self.ids.alloc_scope();
        let mut scope = Scope {
            id,
            parent,
            root,
            defaults: params.defaults.merge_over(inherited),
            listening: !media.is_empty(),
            building: false,
            media,
            matches: HashMap::new(),
            constructors: Vec::new(),
            teardowns: Vec::new(),
            revertibles: Vec::new(),
            methods: HashMap::new(),
        };
        scope.snapshot(&self.media);
        self.scopes.insert(id, scope);
        self.track(parent, Revertible::Scope(id));
        log::debug!("{id} created (parent {parent:?})");
        Ok(id)
    }

    /// Run `f` with `scope` as the active context.
    ///
    /// Match states are re-snapshotted on entry. Calls nest: the enclosing
    /// scope is active again once `f` returns.
    pub fn execute<R>(
        &mut self,
        scope: ScopeId,
        f: impl FnOnce(&mut Ctx<'_>) -> R,
    ) -> Result<R, AnimError> {
        let env = self.media;
        let s = self
            .scopes
            .get_mut(&scope)
            .ok_or(AnimError::UnknownScope(scope))?;
        s.snapshot(&env);
        let root = s.root.clone();
        let defaults = s.defaults;
        self.active.push(scope);
        let out = {
            let mut ctx = Ctx {
                engine: &mut *self,
                scope,
                root,
                defaults,
            };
            f(&mut ctx)
        };
        self.active.pop();
        Ok(out)
    }

    /// Scope of the innermost running `execute`, if any.
    pub fn active_scope(&self) -> Option<ScopeId> {
        self.active.last().copied()
    }

    /// Store `constructor` on `scope`, run it inside the scope and keep the
    /// teardown it returns. Errors from the constructor propagate; the
    /// constructor stays registered.
    ///
    /// Constructors added while another constructor of `scope` is running
    /// are run but not stored.
    pub fn add_constructor(
        &mut self,
        scope: ScopeId,
        constructor: impl FnMut(&mut Ctx<'_>) -> Result<Option<Teardown>, AnimError> + 'static,
    ) -> Result<(), AnimError> {
        let mut constructor: Constructor = Box::new(constructor);
        let s = self
            .scopes
            .get_mut(&scope)
            .ok_or(AnimError::UnknownScope(scope))?;
        let nested = std::mem::replace(&mut s.building, true);
        let result = self.execute(scope, |ctx| constructor(ctx)).and_then(|r| r);
        let Some(s) = self.scopes.get_mut(&scope) else {
            return result.map(|_| ());
        };
        s.building = nested;
        if !nested {
            s.constructors.push(constructor);
        }
        if let Some(teardown) = result? {
            s.teardowns.push(teardown);
        }
        Ok(())
    }

    /// Register a named method on `scope`.
    pub fn add_method(
        &mut self,
        scope: ScopeId,
        name: &str,
        handler: impl Fn(&mut Ctx<'_>, &[serde_json::Value]) -> Result<(), AnimError> + 'static,
    ) -> Result<(), AnimError> {
        let s = self
            .scopes
            .get_mut(&scope)
            .ok_or(AnimError::UnknownScope(scope))?;
        s.methods.insert(name.to_string(), Rc::new(handler));
        Ok(())
    }

    /// Invoke a named method inside its scope.
    pub fn call_method(
        &mut self,
        scope: ScopeId,
        name: &str,
        args: &[serde_json::Value],
    ) -> Result<(), AnimError> {
        let handler = self
            .scopes
            .get(&scope)
            .ok_or(AnimError::UnknownScope(scope))?
            .methods
            .get(name)
            .cloned()
            .ok_or_else(|| AnimError::UnknownMethod(name.to_string()))?;
        self.execute(scope, |ctx| handler(ctx, args))?
    }

    /// Tear down everything `scope` created and re-run its constructors.
    ///
    /// Unknown (already reverted) scopes are a no-op. Callback errors
    /// propagate; constructors are kept either way.
    pub fn refresh(&mut self, scope: ScopeId) -> Result<(), AnimError> {
        if !self.scopes.contains_key(&scope) {
            return Ok(());
        }
        self.teardown(scope)?;
        let Some(s) = self.scopes.get_mut(&scope) else {
            return Ok(());
        };
        let mut constructors = std::mem::take(&mut s.constructors);
        let nested = std::mem::replace(&mut s.building, true);
        // each teardown is kept as soon as it is produced
        let result = self
            .execute(scope, |ctx| -> Result<(), AnimError> {
                for constructor in constructors.iter_mut() {
                    if let Some(teardown) = constructor(ctx)? {
                        ctx.keep_teardown(teardown);
                    }
                }
                Ok(())
            })
            .and_then(|r| r);
        if let Some(s) = self.scopes.get_mut(&scope) {
            s.building = nested;
            s.constructors = constructors;
        }
        result?;
        self.queue_event(CoreEvent::ScopeRefreshed { scope });
        log::debug!("{scope} refreshed");
        Ok(())
    }

    /// Permanently tear down `scope`: revertibles, teardowns, listeners,
    /// constructors and methods. Unknown scopes are a no-op.
    pub fn revert(&mut self, scope: ScopeId) -> Result<(), AnimError> {
        if !self.scopes.contains_key(&scope) {
            return Ok(());
        }
        self.teardown(scope)?;
        let Some(mut s) = self.scopes.remove(&scope) else {
            return Ok(());
        };
        s.listening = false;
        s.media.clear();
        s.matches.clear();
        s.constructors.clear();
        s.methods.clear();
        if let Some(parent) = s.parent.and_then(|p| self.scopes.get_mut(&p)) {
            parent.forget(Revertible::Scope(scope));
        }
        self.queue_event(CoreEvent::ScopeReverted { scope });
        self.registry.release_if_idle(self.scopes.len());
        log::debug!("{scope} reverted");
        Ok(())
    }

    /// Revert revertibles then teardowns, newest first, and clear both lists.
    ///
    /// On error whatever was not torn down yet stays registered on the scope.
    fn teardown(&mut self, scope: ScopeId) -> Result<(), AnimError> {
        let Some(s) = self.scopes.get_mut(&scope) else {
            return Ok(());
        };
        let mut revertibles = std::mem::take(&mut s.revertibles);
        let mut teardowns = std::mem::take(&mut s.teardowns);
        while let Some(r) = revertibles.pop() {
            let done = match r {
                Revertible::Timeline(id) => {
                    self.destroy_timeline(id);
                    Ok(())
                }
                Revertible::Scope(id) => self.revert(id),
            };
            if let Err(e) = done {
                revertibles.push(r);
                self.restore(scope, revertibles, teardowns);
                return Err(e);
            }
        }
        if teardowns.is_empty() {
            return Ok(());
        }
        let result = self
            .execute(scope, |ctx| -> Result<(), AnimError> {
                while let Some(teardown) = teardowns.pop() {
                    teardown(ctx)?;
                }
                Ok(())
            })
            .and_then(|r| r);
        if result.is_err() {
            self.restore(scope, Vec::new(), teardowns);
        }
        result
    }

    /// Put back items a failed teardown did not reach, ahead of newer ones.
    fn restore(
        &mut self,
        scope: ScopeId,
        mut revertibles: Vec<Revertible>,
        mut teardowns: Vec<Teardown>,
    ) {
        if let Some(s) = self.scopes.get_mut(&scope) {
            revertibles.append(&mut s.revertibles);
            s.revertibles = revertibles;
            teardowns.append(&mut s.teardowns);
            s.teardowns = teardowns;
        }
    }

    /// Replace the media environment and refresh each scope whose media
    /// query matches changed, once per scope.
    pub fn set_media(&mut self, env: MediaEnvironment) -> Result<(), AnimError> {
        self.media = env;
        let mut flipped: Vec<ScopeId> = self
            .scopes
            .values()
            .filter(|s| s.listening && s.media_changed(&env))
            .map(|s| s.id)
            .collect();
        flipped.sort();
        for id in flipped {
            // a parent's refresh may already have replaced this scope
            if self.scopes.contains_key(&id) {
                log::debug!("{id} media changed");
                self.refresh(id)?;
            }
        }
        Ok(())
    }

    pub fn media(&self) -> &MediaEnvironment {
        &self.media
    }

    pub fn scope(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(&id)
    }

    /// Live revertibles registered on `scope`.
    pub fn revertible_count(&self, scope: ScopeId) -> usize {
        self.scopes.get(&scope).map_or(0, |s| {
            s.revertibles
                .iter()
                .filter(|r| match r {
                    Revertible::Timeline(t) => self.timelines.contains_key(t),
                    Revertible::Scope(c) => self.scopes.contains_key(c),
                })
                .count()
        })
    }

    /// Media queries currently observed across all scopes.
    pub fn media_listener_count(&self) -> usize {
        self.scopes
            .values()
            .filter(|s| s.listening)
            .map(|s| s.media.len())
            .sum()
    }
}
