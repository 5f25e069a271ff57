use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, warn};
use ndarray::prelude::*;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use super::classifier_bank::ItemClassifier;
use super::registry::ClassifierData;
use crate::configurations::TrainingConfig;
use crate::dialogue_act::DialogueActItem;
use crate::errors::*;

const ARMIJO_SUFFICIENT_DECREASE: f64 = 1e-4;
const MIN_STEP_SIZE: f64 = 1e-20;

/// Outcome of a training run, keys are sorted
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingReport {
    pub trained_keys: Vec<DialogueActItem>,
    pub skipped_keys: Vec<DialogueActItem>,
    pub cancelled_keys: Vec<DialogueActItem>,
}

/// Parameters of a fitted L2 regularized logistic regression
#[derive(Debug, Clone)]
pub struct LogisticRegressionFit {
    pub intercept: f64,
    pub coefficients: Array1<f64>,
    pub iterations: usize,
    pub converged: bool,
}

enum FitOutcome {
    Trained(ItemClassifier),
    Skipped,
    Cancelled,
}

pub fn check_inverse_regularisation(inverse_regularisation: f64) -> Result<()> {
    if !(inverse_regularisation.is_finite() && inverse_regularisation > 0.0) {
        return Err(SluError::Configuration(format!(
            "inverse regularisation must be finite and strictly positive, found {}",
            inverse_regularisation
        ))
        .into());
    }
    Ok(())
}

/// Fails with `InsufficientData` when the key has no usable positive or no negative
pub fn check_trainable(key: &DialogueActItem, data: &ClassifierData) -> Result<()> {
    if data.nb_usable_positives() == 0 {
        return Err(SluError::InsufficientData {
            dai: key.to_string(),
            reason: "no positive example has a feature in the vocabulary".to_string(),
        }.into());
    }
    if data.nb_negatives() == 0 {
        return Err(SluError::InsufficientData {
            dai: key.to_string(),
            reason: "no negative example".to_string(),
        }.into());
    }
    Ok(())
}

/// Fits every key on a dedicated thread pool
///
/// `cancel` is checked before each fit: keys not fitted yet are reported as
/// cancelled while the fits already done are kept.
pub fn train_classifiers(
    classifiers_data: &BTreeMap<DialogueActItem, ClassifierData>,
    inverse_regularisation: f64,
    config: &TrainingConfig,
    cancel: &AtomicBool,
) -> Result<(BTreeMap<DialogueActItem, ItemClassifier>, TrainingReport)> {
    check_inverse_regularisation(inverse_regularisation)?;

    let mut pool_builder = ThreadPoolBuilder::new();
    if let Some(num_threads) = config.num_threads {
        pool_builder = pool_builder.num_threads(num_threads);
    }
    let pool = pool_builder.build()?;
    info!(
        "Training {} classifiers on {} threads ...",
        classifiers_data.len(),
        pool.current_num_threads()
    );

    let outcomes: Vec<Result<FitOutcome>> = pool.install(|| {
        classifiers_data
            .par_iter()
            .map(|(key, data)| -> Result<FitOutcome> {
                if cancel.load(Ordering::SeqCst) {
                    return Ok(FitOutcome::Cancelled);
                }
                if let Err(error) = check_trainable(key, data) {
                    warn!("Skipping classifier: {}", error);
                    return Ok(FitOutcome::Skipped);
                }
                let fit = fit_logistic_regression(
                    data.features.view(),
                    data.labels.view(),
                    inverse_regularisation,
                    config,
                );
                debug!(
                    "Fitted '{}' in {} iterations (converged: {})",
                    key, fit.iterations, fit.converged
                );
                let classifier = ItemClassifier::new(
                    data.vocabulary.clone(),
                    fit.intercept as f32,
                    fit.coefficients.mapv(|coeff| coeff as f32),
                )?;
                Ok(FitOutcome::Trained(classifier))
            })
            .collect()
    });

    let mut classifiers = BTreeMap::new();
    let mut report = TrainingReport::default();
    for (key, outcome) in classifiers_data.keys().zip(outcomes.into_iter()) {
        match outcome? {
            FitOutcome::Trained(classifier) => {
                classifiers.insert(key.clone(), classifier);
                report.trained_keys.push(key.clone());
            }
            FitOutcome::Skipped => report.skipped_keys.push(key.clone()),
            FitOutcome::Cancelled => report.cancelled_keys.push(key.clone()),
        }
    }
    info!(
        "{} classifiers trained, {} skipped, {} cancelled",
        report.trained_keys.len(),
        report.skipped_keys.len(),
        report.cancelled_keys.len()
    );
    Ok((classifiers, report))
}

/// Minimizes `0.5 * |w|^2 + C * sum_i [softplus(z_i) - y_i * z_i]` with `z = X.w + b`
///
/// Full batch gradient descent from zero with a backtracking line search, the
/// intercept `b` is not regularized.
pub fn fit_logistic_regression(
    features: ArrayView2<f64>,
    labels: ArrayView1<f64>,
    inverse_regularisation: f64,
    config: &TrainingConfig,
) -> LogisticRegressionFit {
    let mut coefficients = Array1::<f64>::zeros(features.ncols());
    let mut intercept = 0.0;
    let mut step_size = 1.0;
    let mut loss = objective(
        &features,
        &labels,
        &coefficients,
        intercept,
        inverse_regularisation,
    );

    for iteration in 0..config.max_iterations {
        let (coefficients_gradient, intercept_gradient) = gradient(
            &features,
            &labels,
            &coefficients,
            intercept,
            inverse_regularisation,
        );
        let gradient_max_norm = coefficients_gradient
            .iter()
            .fold(intercept_gradient.abs(), |acc, value| acc.max(value.abs()));
        if gradient_max_norm < config.tolerance {
            return LogisticRegressionFit {
                intercept,
                coefficients,
                iterations: iteration,
                converged: true,
            };
        }
        let gradient_squared_norm =
            coefficients_gradient.dot(&coefficients_gradient) + intercept_gradient.powi(2);

        loop {
            let candidate_coefficients = &coefficients - &(&coefficients_gradient * step_size);
            let candidate_intercept = intercept - step_size * intercept_gradient;
            let candidate_loss = objective(
                &features,
                &labels,
                &candidate_coefficients,
                candidate_intercept,
                inverse_regularisation,
            );
            if candidate_loss
                <= loss - ARMIJO_SUFFICIENT_DECREASE * step_size * gradient_squared_norm
            {
                coefficients = candidate_coefficients;
                intercept = candidate_intercept;
                loss = candidate_loss;
                break;
            }
            step_size /= 2.0;
            if step_size < MIN_STEP_SIZE {
                // no descent left at machine precision
                return LogisticRegressionFit {
                    intercept,
                    coefficients,
                    iterations: iteration + 1,
                    converged: false,
                };
            }
        }
        step_size = (step_size * 2.0).min(1.0);
    }

    LogisticRegressionFit {
        intercept,
        coefficients,
        iterations: config.max_iterations,
        converged: false,
    }
}

fn objective(
    features: &ArrayView2<f64>,
    labels: &ArrayView1<f64>,
    coefficients: &Array1<f64>,
    intercept: f64,
    inverse_regularisation: f64,
) -> f64 {
    let scores = features.dot(coefficients) + intercept;
    let data_loss: f64 = scores
        .iter()
        .zip(labels.iter())
        .map(|(score, label)| softplus(*score) - label * score)
        .sum();
    0.5 * coefficients.dot(coefficients) + inverse_regularisation * data_loss
}

fn gradient(
    features: &ArrayView2<f64>,
    labels: &ArrayView1<f64>,
    coefficients: &Array1<f64>,
    intercept: f64,
    inverse_regularisation: f64,
) -> (Array1<f64>, f64) {
    let scores = features.dot(coefficients) + intercept;
    let residuals: Array1<f64> = scores
        .iter()
        .zip(labels.iter())
        .map(|(score, label)| sigmoid(*score) - label)
        .collect();
    let coefficients_gradient =
        coefficients + &(features.t().dot(&residuals) * inverse_regularisation);
    let intercept_gradient = inverse_regularisation * residuals.sum();
    (coefficients_gradient, intercept_gradient)
}

fn softplus(x: f64) -> f64 {
    if x > 0.0 {
        x + (-x).exp().ln_1p()
    } else {
        x.exp().ln_1p()
    }
}

fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

#[cfg(test)]
mod tests {
    use maplit::btreemap;

    use super::*;
    use crate::dai_classifier::featurizer::FeatureVector;

    fn item(repr: &str) -> DialogueActItem {
        repr.parse().unwrap()
    }

    fn separable_data() -> ClassifierData {
        ClassifierData {
            vocabulary: vec!["ngram:hello".to_string(), "ngram:bye".to_string()],
            features: array![[1.0, 0.0], [2.0, 0.0], [0.0, 1.0], [0.0, 2.0]],
            labels: array![1.0, 1.0, 0.0, 0.0],
        }
    }

    #[test]
    fn fit_logistic_regression_separates_classes() {
        // Given
        let data = separable_data();

        // When
        let fit = fit_logistic_regression(
            data.features.view(),
            data.labels.view(),
            10.0,
            &TrainingConfig::default(),
        );

        // Then
        assert!(fit.coefficients[0] > 0.0);
        assert!(fit.coefficients[1] < 0.0);
        let positive_score = fit.intercept + fit.coefficients[0];
        let negative_score = fit.intercept + fit.coefficients[1];
        assert!(sigmoid(positive_score) > 0.5);
        assert!(sigmoid(negative_score) < 0.5);
    }

    #[test]
    fn fit_logistic_regression_converges_on_small_problem() {
        // Given
        let features = array![[1.0], [0.0], [1.0], [0.0]];
        let labels = array![1.0, 0.0, 0.0, 1.0];
        let config = TrainingConfig {
            max_iterations: 10_000,
            tolerance: 1e-8,
            num_threads: Some(1),
        };

        // When
        let fit = fit_logistic_regression(features.view(), labels.view(), 1.0, &config);

        // Then
        // balanced labels for each feature value: the optimum is at zero
        assert!(fit.converged);
        assert!(fit.coefficients[0].abs() < 1e-6);
        assert!(fit.intercept.abs() < 1e-6);
    }

    #[test]
    fn stronger_regularisation_shrinks_coefficients() {
        // Given
        let data = separable_data();
        let config = TrainingConfig::default();

        // When
        let weak = fit_logistic_regression(data.features.view(), data.labels.view(), 10.0, &config);
        let strong = fit_logistic_regression(data.features.view(), data.labels.view(), 0.1, &config);

        // Then
        assert!(strong.coefficients[0].abs() < weak.coefficients[0].abs());
    }

    #[test]
    fn fit_logistic_regression_is_deterministic() {
        // Given
        let data = separable_data();
        let config = TrainingConfig::default();

        // When
        let fit_a = fit_logistic_regression(data.features.view(), data.labels.view(), 1.0, &config);
        let fit_b = fit_logistic_regression(data.features.view(), data.labels.view(), 1.0, &config);

        // Then
        assert_eq!(fit_a.coefficients, fit_b.coefficients);
        assert_eq!(fit_a.intercept, fit_b.intercept);
    }

    #[test]
    fn check_trainable_rejects_degenerate_data() {
        // Given
        let no_negatives = ClassifierData {
            vocabulary: vec!["ngram:hello".to_string()],
            features: array![[1.0], [1.0]],
            labels: array![1.0, 1.0],
        };
        let no_usable_positive = ClassifierData {
            vocabulary: vec!["ngram:bye".to_string()],
            features: array![[0.0], [1.0]],
            labels: array![1.0, 0.0],
        };

        // Then
        for data in &[no_negatives, no_usable_positive] {
            let error = check_trainable(&item("hello()"), data).unwrap_err();
            match error.downcast_ref::<SluError>() {
                Some(SluError::InsufficientData { dai, .. }) => assert_eq!("hello()", dai),
                other => panic!("unexpected error {:?}", other),
            }
        }
        assert!(check_trainable(&item("hello()"), &separable_data()).is_ok());
    }

    #[test]
    fn train_classifiers_reports_skipped_keys() {
        // Given
        let classifiers_data = btreemap! {
            item("hello()") => separable_data(),
            item("bye()") => ClassifierData {
                vocabulary: vec![],
                features: Array2::zeros((2, 0)),
                labels: array![1.0, 0.0],
            },
        };

        // When
        let (classifiers, report) = train_classifiers(
            &classifiers_data,
            10.0,
            &TrainingConfig::default(),
            &AtomicBool::new(false),
        )
        .unwrap();

        // Then
        assert_eq!(vec![item("hello()")], report.trained_keys);
        assert_eq!(vec![item("bye()")], report.skipped_keys);
        assert!(report.cancelled_keys.is_empty());
        let hello = &classifiers[&item("hello()")];
        let mut features = FeatureVector::new();
        features.increment("ngram:hello".to_string());
        assert!(hello.predict(&features).unwrap() > 0.5);
    }

    #[test]
    fn train_classifiers_stops_when_cancelled() {
        // Given
        let classifiers_data = btreemap! {
            item("hello()") => separable_data(),
            item("bye()") => separable_data(),
        };

        // When
        let (classifiers, report) = train_classifiers(
            &classifiers_data,
            10.0,
            &TrainingConfig::default(),
            &AtomicBool::new(true),
        )
        .unwrap();

        // Then
        assert!(classifiers.is_empty());
        assert!(report.trained_keys.is_empty());
        assert_eq!(vec![item("bye()"), item("hello()")], report.cancelled_keys);
    }

    #[test]
    fn train_classifiers_rejects_invalid_inverse_regularisation() {
        for inverse_regularisation in &[0.0, -1.0, std::f64::NAN, std::f64::INFINITY] {
            let result = train_classifiers(
                &BTreeMap::new(),
                *inverse_regularisation,
                &TrainingConfig::default(),
                &AtomicBool::new(false),
            );
            match result.unwrap_err().downcast_ref::<SluError>() {
                Some(SluError::Configuration(_)) => (),
                other => panic!("unexpected error {:?}", other),
            }
        }
    }
}
