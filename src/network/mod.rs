//! Phenotypes: genotypes expressed as numeric functions. Gene graphs may hold cycles, so outputs
//! are found by relaxing every node towards a fixed point instead of a single ordered pass.

pub mod relax;

pub use relax::{Phenotype, Relaxation};

use crate::{error::Result, genotype::Genotype};

pub mod activate {
    use core::f64::consts::E;

    pub fn identity(x: f64) -> f64 {
        x
    }

    pub fn steep_sigmoid(x: f64) -> f64 {
        1. / (1. + E.powf(-4.9 * x))
    }

    pub fn relu(x: f64) -> f64 {
        if x < 0. {
            0.
        } else {
            x
        }
    }

    pub fn leaky_relu(x: f64) -> f64 {
        if x < 0. {
            0.01 * x
        } else {
            x
        }
    }
}

pub mod loss {
    pub fn decay_quadratic(want: f64, x: f64) -> f64 {
        1. - (want - x).abs().powf(2.)
    }

    pub fn decay_linear(want: f64, have: f64) -> f64 {
        if have.is_nan() {
            f64::MIN
        } else {
            want - (want - have).abs()
        }
    }
}

/// What a fitness function sees of the engine: a genotype and some input values in, output values
/// out. Inputs bind to input nodes and outputs are read from output nodes, both ascending by id.
pub trait Evaluator {
    fn evaluate(&self, genotype: &Genotype, inputs: &[f64]) -> Result<Vec<f64>>;
}

#[cfg(test)]
mod test {
    use super::{activate::*, loss::*};
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_activations() {
        assert_eq!(identity(-3.5), -3.5);
        assert_abs_diff_eq!(steep_sigmoid(0.), 0.5);
        assert!(steep_sigmoid(2.) > 0.99);
        assert_eq!(relu(-1.), 0.);
        assert_eq!(relu(2.), 2.);
        assert_abs_diff_eq!(leaky_relu(-1.), -0.01);
    }

    #[test]
    fn test_loss() {
        assert_eq!(decay_quadratic(1., 1.), 1.);
        assert_abs_diff_eq!(decay_quadratic(1., 0.5), 0.75);
        assert_eq!(decay_linear(1., f64::NAN), f64::MIN);
        assert_abs_diff_eq!(decay_linear(1., 0.25), 0.25);
    }
}
