use failure::bail;
use ndarray::prelude::*;
use ndarray::{array, concatenate};

use crate::errors::*;
use crate::utterance::Probability;

/// Probability estimate of a single dialogue act item being present
#[derive(Debug, Clone)]
pub struct BinaryLogisticRegression {
    /// vector with shape (f + 1)
    /// -------------------------
    ///
    /// - f = number of features
    /// - the intercept is stored first
    weights: Array1<f32>,
}

impl BinaryLogisticRegression {
    pub fn nb_features(&self) -> usize {
        // without intercept
        self.weights.dim() - 1
    }

    pub fn intercept(&self) -> f32 {
        self.weights[0]
    }

    pub fn coefficients(&self) -> ArrayView1<f32> {
        self.weights.slice(s![1..])
    }
}

impl BinaryLogisticRegression {
    pub fn new(intercept: f32, weights: Array1<f32>) -> Result<Self> {
        let weights_with_intercept =
            concatenate(Axis(0), &[array![intercept].view(), weights.view()])?;
        Ok(Self {
            weights: weights_with_intercept,
        })
    }

    pub fn run(&self, features: &ArrayView1<f32>) -> Result<Probability> {
        if features.dim() != self.nb_features() {
            bail!(
                "Expected {} features but found {}",
                self.nb_features(),
                features.dim()
            );
        }
        let score = self.intercept() + features.dot(&self.coefficients());
        Ok(sigmoid(score))
    }
}

pub fn sigmoid(x: f32) -> f32 {
    if x >= 0. {
        1. / (1. + (-x).exp())
    } else {
        let e = x.exp();
        e / (1. + e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::epsilon_eq;

    #[test]
    fn binary_logistic_regression_works() {
        // Given
        let intercept = 0.98;
        let weights = array![2.5, 1.2, 1.5, -0.9];

        let features = array![0.4, -2.3, 1.9, 1.3];
        let regression = BinaryLogisticRegression::new(intercept, weights).unwrap();

        // When
        let prediction = regression.run(&features.view()).unwrap();

        // Then
        assert!(epsilon_eq(0.7109495, prediction, 1e-06));
        assert_eq!(4, regression.nb_features());
        assert_eq!(0.98, regression.intercept());
    }

    #[test]
    fn binary_logistic_regression_without_features_uses_intercept() {
        // Given
        let regression = BinaryLogisticRegression::new(-0.5, Array1::<f32>::zeros(0)).unwrap();

        // When
        let prediction = regression.run(&Array1::<f32>::zeros(0).view()).unwrap();

        // Then
        assert!(epsilon_eq(0.37754067, prediction, 1e-06));
    }

    #[test]
    fn binary_logistic_regression_fails_on_wrong_dimension() {
        // Given
        let regression = BinaryLogisticRegression::new(0.1, array![1.0, 2.0]).unwrap();

        // Then
        assert!(regression.run(&array![1.0].view()).is_err());
    }

    #[test]
    fn sigmoid_is_stable_for_large_inputs() {
        assert_eq!(1.0, sigmoid(100.));
        assert!(sigmoid(-100.) > 0.);
        assert!(epsilon_eq(0.5, sigmoid(0.), 1e-07));
    }
}
