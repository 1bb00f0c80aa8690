//! Kleene iteration with widening, written once for every domain.
//!
//! The ascending phase computes `x ⊔ step(x)` and widens it against `x`
//! until `step(x) ⊆ x`. The optional descending phase then narrows the
//! post-fixpoint with `step(x) ⊓ x` to recover precision lost to widening.

use ppl_rs_membrane::{PplError, Result};

use crate::property::{Narrowable, Property, Widenable};
use crate::widening::WideningToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixpointOptions {
    /// Ascending steps before giving up with `Logic`.
    pub max_iterations: usize,
    /// Widening tokens, spent on steps that would lose precision.
    pub tokens: Option<u32>,
    /// Descending steps; zero skips the phase.
    pub narrowing_steps: usize,
}

impl Default for FixpointOptions {
    fn default() -> Self {
        Self {
            max_iterations: 64,
            tokens: None,
            narrowing_steps: 0,
        }
    }
}

#[derive(Debug)]
pub struct Fixpoint<T> {
    pub value: T,
    /// Applications of `step`, in both phases.
    pub iterations: usize,
}

/// A post-fixpoint of `step` above `initial`.
pub fn ascending_fixpoint<T, F>(initial: T, mut step: F, options: &FixpointOptions) -> Result<Fixpoint<T>>
where
    T: Widenable,
    F: FnMut(&T) -> Result<T>,
{
    let mut x = initial;
    let mut tokens = options.tokens.map(WideningToken::new);
    for iteration in 1..=options.max_iterations {
        let mut next = step(&x)?;
        next.upper_bound_assign(&x)?;
        if x.contains(&next)? {
            return Ok(Fixpoint {
                value: x,
                iterations: iteration,
            });
        }
        next.widening_assign(&x, tokens.as_mut())?;
        x = next;
    }
    Err(PplError::Logic(format!(
        "no post-fixpoint within {} iterations",
        options.max_iterations
    )))
}

/// [`ascending_fixpoint`] followed by up to `narrowing_steps` narrowing
/// steps, stopping early once a step changes nothing.
pub fn fixpoint<T, F>(initial: T, mut step: F, options: &FixpointOptions) -> Result<Fixpoint<T>>
where
    T: Widenable + Narrowable,
    F: FnMut(&T) -> Result<T>,
{
    let Fixpoint {
        value: mut x,
        mut iterations,
    } = ascending_fixpoint(initial, &mut step, options)?;
    for _ in 0..options.narrowing_steps {
        let mut next = step(&x)?;
        iterations += 1;
        next.intersection_assign(&x)?;
        let before = x.try_clone()?;
        x.narrowing_assign(&next)?;
        if x.equals(&before)? {
            break;
        }
    }
    Ok(Fixpoint {
        value: x,
        iterations,
    })
}

/// Whether `x` is a post-fixpoint of `step`.
pub fn is_post_fixpoint<T, F>(x: &T, mut step: F) -> Result<bool>
where
    T: Property,
    F: FnMut(&T) -> Result<T>,
{
    x.contains(&step(x)?)
}
