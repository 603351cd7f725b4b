//! Change sets: ordered, named mutation closures over one document.
//!
//! Contract:
//! - Registration only records intent; nothing runs until `apply`.
//! - `apply` runs every action exactly once, in registration order, against
//!   one working copy. Later actions observe earlier effects.
//! - Partial scopes forward registration to the root log, so actions from
//!   every scope share one global order.
//! - Partial selectors are evaluated when their action runs, never cached.
//! - The first failing action aborts the remaining ones.

mod element;
mod error;

pub use error::ChangeError;

use crate::types::ActionId;
use derive_more::Deref;
use std::{
    fmt,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{Arc, Mutex, PoisonError},
};

type MutateFn<D> = dyn Fn(&mut D) -> Result<(), ChangeError> + Send + Sync;
type SelectFn<P, S> = dyn for<'a> Fn(&'a mut P) -> Option<&'a mut S> + Send + Sync;

///
/// ActionInfo
///
/// Receipt for one registered change action.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ActionInfo {
    pub id: ActionId,
    pub path: String,
}

///
/// ChangeAction
///
/// One registered mutation. Immutable once registered.
///

struct ChangeAction<D: 'static> {
    id: ActionId,
    path: String,
    mutate: Arc<MutateFn<D>>,
}

impl<D: 'static> ChangeAction<D> {
    // Panics inside a mutator are treated as failures of that action.
    fn run(&self, document: &mut D) -> Result<(), ChangeError> {
        match catch_unwind(AssertUnwindSafe(|| (self.mutate)(document))) {
            Ok(result) => result,
            Err(payload) => Err(ChangeError::from_panic(payload.as_ref())),
        }
    }
}

impl<D: 'static> Clone for ChangeAction<D> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            path: self.path.clone(),
            mutate: Arc::clone(&self.mutate),
        }
    }
}

impl<D: 'static> fmt::Debug for ChangeAction<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeAction")
            .field("id", &self.id)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

///
/// Registrar
///
/// Registration sink behind a scope: the root log, or a selector-wrapping
/// forwarder to a parent sink.
///

trait Registrar<D>: Send + Sync {
    fn register(&self, path: String, mutate: Box<MutateFn<D>>) -> ActionInfo;
}

///
/// ActionLog
///

struct ActionLog<D: 'static> {
    actions: Mutex<Vec<ChangeAction<D>>>,
}

impl<D: 'static> ActionLog<D> {
    const fn new() -> Self {
        Self {
            actions: Mutex::new(Vec::new()),
        }
    }

    // Copy out the action list so mutators run without holding the lock.
    fn snapshot(&self) -> Vec<ChangeAction<D>> {
        self.actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn len(&self) -> usize {
        self.actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl<D: 'static> Registrar<D> for ActionLog<D> {
    fn register(&self, path: String, mutate: Box<MutateFn<D>>) -> ActionInfo {
        let action = ChangeAction {
            id: ActionId::generate(),
            path,
            mutate: Arc::from(mutate),
        };
        let info = ActionInfo {
            id: action.id,
            path: action.path.clone(),
        };

        self.actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(action);

        info
    }
}

///
/// Scoped
///
/// Wraps sub-document mutators so they resolve their target through the
/// selector at the moment they run.
///

struct Scoped<P: 'static, S: 'static> {
    parent: Arc<dyn Registrar<P>>,
    scope: String,
    selector: Arc<SelectFn<P, S>>,
}

impl<P: 'static, S: 'static> Registrar<S> for Scoped<P, S> {
    fn register(&self, path: String, mutate: Box<MutateFn<S>>) -> ActionInfo {
        let selector = Arc::clone(&self.selector);
        let scope = self.scope.clone();

        self.parent.register(
            path,
            Box::new(move |parent: &mut P| {
                let Some(target) = selector(parent) else {
                    return Err(ChangeError::SelectorMissed {
                        scope: scope.clone(),
                    });
                };

                mutate(target)
            }),
        )
    }
}

///
/// ChangeScope
///
/// Registration surface over one (sub-)document.
/// The root scope belongs to a [`ChangeSet`]; every other scope is a partial
/// produced by [`ChangeScope::partial`].
///

pub struct ChangeScope<D: 'static> {
    path: String,
    registrar: Arc<dyn Registrar<D>>,
}

/// A scope obtained from [`ChangeScope::partial`].
pub type PartialChangeSet<D> = ChangeScope<D>;

impl<D: 'static> ChangeScope<D> {
    /// Dotted path prefix of this scope; empty at the root.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Register an infallible mutation.
    pub fn add<F>(&self, label: impl AsRef<str>, mutate: F) -> ActionInfo
    where
        F: Fn(&mut D) + Send + Sync + 'static,
    {
        self.try_add(label, move |document| {
            mutate(document);
            Ok(())
        })
    }

    /// Register a mutation that may reject the edit.
    pub fn try_add<F>(&self, label: impl AsRef<str>, mutate: F) -> ActionInfo
    where
        F: Fn(&mut D) -> Result<(), ChangeError> + Send + Sync + 'static,
    {
        self.registrar
            .register(self.child_path(label.as_ref()), Box::new(mutate))
    }

    /// Scope further changes to the sub-value `selector` yields at apply time.
    pub fn partial<S, F>(&self, label: impl AsRef<str>, selector: F) -> ChangeScope<S>
    where
        S: 'static,
        F: for<'a> Fn(&'a mut D) -> Option<&'a mut S> + Send + Sync + 'static,
    {
        let path = self.child_path(label.as_ref());
        let registrar = Scoped {
            parent: Arc::clone(&self.registrar),
            scope: path.clone(),
            selector: Arc::new(selector),
        };

        ChangeScope {
            path,
            registrar: Arc::new(registrar),
        }
    }

    fn child_path(&self, label: &str) -> String {
        if self.path.is_empty() {
            label.to_string()
        } else {
            format!("{}.{label}", self.path)
        }
    }
}

impl<D: 'static> Clone for ChangeScope<D> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            registrar: Arc::clone(&self.registrar),
        }
    }
}

impl<D: 'static> fmt::Debug for ChangeScope<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeScope")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

///
/// ChangeSet
///
/// Root of a change tree. Owns the ordered action log and is the only place
/// actions are executed from.
///

#[derive(Deref)]
pub struct ChangeSet<D: 'static> {
    #[deref]
    scope: ChangeScope<D>,
    log: Arc<ActionLog<D>>,
}

impl<D: 'static> ChangeSet<D> {
    #[must_use]
    pub fn new() -> Self {
        let log = Arc::new(ActionLog::new());
        let registrar: Arc<dyn Registrar<D>> = log.clone();

        Self {
            scope: ChangeScope {
                path: String::new(),
                registrar,
            },
            log,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.log.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered action paths, in execution order.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.log
            .snapshot()
            .into_iter()
            .map(|action| action.path)
            .collect()
    }

    /// Run every action against `document`, in registration order.
    ///
    /// The document must already be a private copy; on failure it is dropped
    /// together with whatever the earlier actions did to it.
    pub fn apply(&self, mut document: D) -> Result<D, ChangeError> {
        for action in self.log.snapshot() {
            action
                .run(&mut document)
                .map_err(|err| err.at(action.path.as_str()))?;
        }

        Ok(document)
    }

    /// Deep-copy `original`, then apply.
    pub fn apply_to_copy(&self, original: &D) -> Result<D, ChangeError>
    where
        D: Clone,
    {
        self.apply(original.clone())
    }
}

impl<D: 'static> Default for ChangeSet<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: 'static> fmt::Debug for ChangeSet<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeSet")
            .field("actions", &self.len())
            .finish_non_exhaustive()
    }
}
