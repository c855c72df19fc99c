//! Incremental one-way constraint solver.
//!
//! The solver owns an arena of scalar variables and a set of constraints.
//! Each constraint declares which variables it reads (independent) and which
//! it writes (dependent). Changing a variable marks every constraint reading
//! it as dirty; dirty constraints are re-solved lazily the next time a value
//! is read through [`Solver::value`], or eagerly through [`Solver::solve`].
//!
//! # Example
//!
//! ```
//! # use lintmap::solver::{Constraint, Resolution, Solver, SolverError, VariableId};
//! #[derive(Debug)]
//! struct Double {
//!     vars: [VariableId; 2],
//! }
//!
//! impl Constraint for Double {
//!     fn independent(&self) -> &[VariableId] {
//!         &self.vars[..1]
//!     }
//!     fn dependent(&self) -> &[VariableId] {
//!         &self.vars[1..]
//!     }
//!     fn solve(&self, resolution: &mut Resolution<'_>) -> Result<(), SolverError> {
//!         let input = resolution.get(self.vars[0])?;
//!         resolution.set(self.vars[1], input * 2.0)
//!     }
//! }
//!
//! let mut solver = Solver::new();
//! let input = solver.add_variable(1.0);
//! let output = solver.add_variable(0.0);
//! solver.add_constraint(Box::new(Double { vars: [input, output] })).unwrap();
//!
//! solver.set_value(input, 21.0).unwrap();
//! assert_eq!(solver.value(output).unwrap(), 42.0);
//! ```

pub mod boundary;

use std::fmt;

use indexmap::{IndexMap, IndexSet};
use log::{debug, trace};
use thiserror::Error;

pub use boundary::{BoundaryConstraint, BoxVariables, PointVariables};

/// Handle to a solver variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableId(usize);

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Handle to a constraint registered with a [`Solver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintId(usize);

impl fmt::Display for ConstraintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolverError {
    #[error("Unknown variable {0}")]
    UnknownVariable(VariableId),

    #[error("Unknown constraint {0}")]
    UnknownConstraint(ConstraintId),

    #[error("Variable {0} is not a dependent of the constraint being solved")]
    ReadOnlyVariable(VariableId),

    #[error("Variable {0} is still referenced by a constraint")]
    VariableInUse(VariableId),

    #[error("Constraints did not settle after {0} rounds")]
    Unstable(usize),
}

/// A one-way relation between variables.
pub trait Constraint: fmt::Debug {
    /// Variables read by [`solve`](Self::solve).
    fn independent(&self) -> &[VariableId];

    /// Variables written by [`solve`](Self::solve).
    fn dependent(&self) -> &[VariableId];

    /// Recomputes the dependent variables.
    ///
    /// Leaving a dependent untouched is allowed and keeps its previous value.
    fn solve(&self, resolution: &mut Resolution<'_>) -> Result<(), SolverError>;
}

/// Access to variable values while a single constraint is being solved.
pub struct Resolution<'a> {
    slots: &'a mut [Option<f64>],
    writable: &'a [VariableId],
    changed: Vec<VariableId>,
}

impl Resolution<'_> {
    pub fn get(&self, id: VariableId) -> Result<f64, SolverError> {
        self.slots
            .get(id.0)
            .copied()
            .flatten()
            .ok_or(SolverError::UnknownVariable(id))
    }

    /// Writes a dependent variable of the constraint being solved.
    pub fn set(&mut self, id: VariableId, value: f64) -> Result<(), SolverError> {
        if !self.writable.contains(&id) {
            return Err(SolverError::ReadOnlyVariable(id));
        }
        let slot = self
            .slots
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(SolverError::UnknownVariable(id))?;
        if *slot != value {
            *slot = value;
            self.changed.push(id);
        }
        Ok(())
    }
}

/// Owner of variables and constraints.
#[derive(Debug, Default)]
pub struct Solver {
    slots: Vec<Option<f64>>,
    free: Vec<VariableId>,
    constraints: IndexMap<ConstraintId, Box<dyn Constraint>>,
    dirty: IndexSet<ConstraintId>,
    next_constraint: usize,
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a variable with an initial value.
    pub fn add_variable(&mut self, value: f64) -> VariableId {
        match self.free.pop() {
            Some(id) => {
                self.slots[id.0] = Some(value);
                id
            }
            None => {
                self.slots.push(Some(value));
                VariableId(self.slots.len() - 1)
            }
        }
    }

    /// Releases a variable no constraint refers to any more.
    pub fn remove_variable(&mut self, id: VariableId) -> Result<(), SolverError> {
        self.check_variable(id)?;
        let in_use = self.constraints.values().any(|constraint| {
            constraint.independent().contains(&id) || constraint.dependent().contains(&id)
        });
        if in_use {
            return Err(SolverError::VariableInUse(id));
        }
        self.slots[id.0] = None;
        self.free.push(id);
        Ok(())
    }

    fn check_variable(&self, id: VariableId) -> Result<(), SolverError> {
        match self.slots.get(id.0) {
            Some(Some(_)) => Ok(()),
            _ => Err(SolverError::UnknownVariable(id)),
        }
    }

    /// Number of live variables.
    pub fn variable_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Registers a constraint; it is solved on the next resolution.
    pub fn add_constraint(
        &mut self,
        constraint: Box<dyn Constraint>,
    ) -> Result<ConstraintId, SolverError> {
        for &id in constraint
            .independent()
            .iter()
            .chain(constraint.dependent())
        {
            self.check_variable(id)?;
        }

        let id = ConstraintId(self.next_constraint);
        self.next_constraint += 1;
        self.constraints.insert(id, constraint);
        self.dirty.insert(id);
        trace!(constraint:% = id; "Constraint added");
        Ok(id)
    }

    pub fn remove_constraint(&mut self, id: ConstraintId) -> Result<Box<dyn Constraint>, SolverError> {
        self.dirty.shift_remove(&id);
        self.constraints
            .shift_remove(&id)
            .ok_or(SolverError::UnknownConstraint(id))
    }

    /// Sets a variable and marks every constraint reading it as dirty.
    pub fn set_value(&mut self, id: VariableId, value: f64) -> Result<(), SolverError> {
        let slot = self
            .slots
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(SolverError::UnknownVariable(id))?;
        if *slot == value {
            return Ok(());
        }
        *slot = value;
        self.mark_readers_dirty(id, None);
        Ok(())
    }

    /// Returns a variable's value after resolving pending constraints.
    pub fn value(&mut self, id: VariableId) -> Result<f64, SolverError> {
        self.solve()?;
        self.peek(id)
    }

    /// Returns a variable's current value without resolving.
    pub fn peek(&self, id: VariableId) -> Result<f64, SolverError> {
        self.slots
            .get(id.0)
            .copied()
            .flatten()
            .ok_or(SolverError::UnknownVariable(id))
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    fn mark_readers_dirty(&mut self, id: VariableId, except: Option<ConstraintId>) {
        for (&constraint_id, constraint) in &self.constraints {
            if Some(constraint_id) != except && constraint.independent().contains(&id) {
                self.dirty.insert(constraint_id);
            }
        }
    }

    /// Solves every dirty constraint, following changes through chains of
    /// constraints until nothing is dirty.
    ///
    /// # Errors
    ///
    /// Fails if a constraint errors, or with [`SolverError::Unstable`] when
    /// constraints keep invalidating each other.
    pub fn solve(&mut self) -> Result<(), SolverError> {
        if self.dirty.is_empty() {
            return Ok(());
        }

        let limit = (self.constraints.len() + 1).pow(2);
        let mut rounds = 0;
        while let Some(id) = self.dirty.shift_remove_index(0) {
            rounds += 1;
            if rounds > limit {
                return Err(SolverError::Unstable(rounds));
            }

            let Some(constraint) = self.constraints.get(&id) else {
                continue;
            };
            let mut resolution = Resolution {
                slots: &mut self.slots,
                writable: constraint.dependent(),
                changed: Vec::new(),
            };
            constraint.solve(&mut resolution)?;

            let changed = resolution.changed;
            for variable in changed {
                self.mark_readers_dirty(variable, Some(id));
            }
        }

        debug!(rounds; "Constraints resolved");
        Ok(())
    }
}
