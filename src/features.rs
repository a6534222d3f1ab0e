//! Feature maps from states (and actions) to dense vectors.
//!
//! Linear value functions and linear rewards are built on these; vectors are
//! `ndarray` arrays so the learners can use its BLAS-style operations.

use ndarray::Array1;

use crate::{Error, Result, types::Action};

/// Fixed-length feature vector of a state.
pub trait StateFeatures<S> {
    fn dimension(&self) -> usize;

    fn features(&self, state: &S) -> Result<Array1<f64>>;
}

/// Fixed-length feature vector of a state-action pair.
pub trait StateActionFeatures<S, A> {
    fn dimension(&self) -> usize;

    fn features(&self, state: &S, action: &A) -> Result<Array1<f64>>;
}

/// State features computed by a closure.
///
/// Every vector the closure returns is checked against the declared
/// dimension.
pub struct FnStateFeatures<F> {
    dimension: usize,
    f: F,
}

impl<F> FnStateFeatures<F> {
    pub fn new(dimension: usize, f: F) -> Self {
        Self { dimension, f }
    }
}

impl<S, F> StateFeatures<S> for FnStateFeatures<F>
where
    F: Fn(&S) -> Result<Array1<f64>>,
{
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn features(&self, state: &S) -> Result<Array1<f64>> {
        let phi = (self.f)(state)?;
        check_dimension(self.dimension, phi.len())?;
        Ok(phi)
    }
}

/// One-hot indicator over `size` slots chosen by an index function.
pub struct IndicatorFeatures<F> {
    size: usize,
    index: F,
}

impl<F> IndicatorFeatures<F> {
    pub fn new(size: usize, index: F) -> Self {
        Self { size, index }
    }
}

impl<S, F> StateFeatures<S> for IndicatorFeatures<F>
where
    F: Fn(&S) -> Result<usize>,
{
    fn dimension(&self) -> usize {
        self.size
    }

    fn features(&self, state: &S) -> Result<Array1<f64>> {
        let i = (self.index)(state)?;
        if i >= self.size {
            return Err(Error::FeatureDimension {
                expected: self.size,
                got: i + 1,
            });
        }
        let mut phi = Array1::zeros(self.size);
        phi[i] = 1.0;
        Ok(phi)
    }
}

/// State features replicated into one block per action.
///
/// The vector for `(s, a)` is zero except for the block belonging to `a`,
/// which holds `φ(s)`.
pub struct ActionBlockFeatures<F, A> {
    state_features: F,
    actions: Vec<A>,
}

impl<F, A: Action> ActionBlockFeatures<F, A> {
    pub fn new(state_features: F, actions: Vec<A>) -> Self {
        Self {
            state_features,
            actions,
        }
    }
}

impl<S, A: Action, F: StateFeatures<S>> StateActionFeatures<S, A> for ActionBlockFeatures<F, A> {
    fn dimension(&self) -> usize {
        self.state_features.dimension() * self.actions.len()
    }

    fn features(&self, state: &S, action: &A) -> Result<Array1<f64>> {
        let block = self.state_features.dimension();
        let slot = self
            .actions
            .iter()
            .position(|a| a == action)
            .ok_or_else(|| Error::Model {
                message: format!("action {action:?} has no feature block"),
            })?;
        let phi = self.state_features.features(state)?;
        let mut out = Array1::zeros(self.dimension());
        out.slice_mut(ndarray::s![slot * block..(slot + 1) * block]).assign(&phi);
        Ok(out)
    }
}

pub(crate) fn check_dimension(expected: usize, got: usize) -> Result<()> {
    if expected == got {
        Ok(())
    } else {
        Err(Error::FeatureDimension { expected, got })
    }
}
