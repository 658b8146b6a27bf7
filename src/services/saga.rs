//! Ordered forward steps with compensations, for workflows that span
//! several documents and so cannot be committed atomically.

use std::future::Future;

use futures::future::BoxFuture;
use tracing::{error, warn};

use crate::error::Result;

pub type Compensation<'a> = BoxFuture<'a, Result<()>>;

/// Runs forward steps in order. A step that succeeds leaves behind its
/// compensation; a step that fails unwinds every compensation left so far,
/// newest first, then returns the step's own error. Compensation failures
/// are logged and never replace that error.
pub struct Saga<'a> {
    name: &'static str,
    completed: Vec<(&'static str, Compensation<'a>)>,
}

impl<'a> Saga<'a> {
    pub fn new(name: &'static str) -> Self {
        Saga {
            name,
            completed: Vec::new(),
        }
    }

    /// `compensate` receives the step's output and returns the (not yet
    /// started) action that undoes it.
    pub async fn step<T, F, C>(&mut self, label: &'static str, forward: F, compensate: C) -> Result<T>
    where
        F: Future<Output = Result<T>>,
        C: FnOnce(&T) -> Compensation<'a>,
    {
        match forward.await {
            Ok(output) => {
                self.completed.push((label, compensate(&output)));
                Ok(output)
            }
            Err(err) => {
                self.unwind(label, &err).await;
                Err(err)
            }
        }
    }

    /// A step with nothing to undo, normally the last one.
    pub async fn final_step<T, F>(&mut self, label: &'static str, forward: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match forward.await {
            Ok(output) => Ok(output),
            Err(err) => {
                self.unwind(label, &err).await;
                Err(err)
            }
        }
    }

    /// Labels of the steps that would be undone, in undo order.
    pub fn pending(&self) -> Vec<&'static str> {
        self.completed.iter().rev().map(|(label, _)| *label).collect()
    }

    async fn unwind(&mut self, failed: &'static str, cause: &crate::error::MarketError) {
        while let Some((label, compensation)) = self.completed.pop() {
            warn!(saga = self.name, failed, undo = label, %cause, "compensating");
            if let Err(err) = compensation.await {
                error!(
                    saga = self.name,
                    undo = label,
                    error = %err,
                    "compensation failed; documents may be left inconsistent"
                );
            }
        }
    }
}
