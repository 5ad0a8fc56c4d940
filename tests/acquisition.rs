use nextpoint::Error;
use nextpoint::acquisition::{
    AcquisitionFunction, ExpectedImprovement, MaxVariance, Strategy, UpperConfidenceBound,
    norm_cdf, norm_pdf,
};
use nextpoint::surrogate::Prediction;

fn all_functions() -> Vec<Box<dyn AcquisitionFunction>> {
    vec![
        Box::new(ExpectedImprovement::new(1.0)),
        Box::new(ExpectedImprovement::new(-3.0).xi(0.5)),
        Box::new(UpperConfidenceBound::default()),
        Box::new(MaxVariance),
    ]
}

#[test]
fn scores_are_monotone_in_sigma() {
    let sigmas: Vec<f64> = (0..=60).map(|i| f64::from(i) * 0.05).collect();
    for f in all_functions() {
        for mu in [-4.0, -1.0, 0.0, 0.99, 1.0, 1.5, 4.0] {
            let scores: Vec<f64> = sigmas.iter().map(|&s| f.score(mu, s)).collect();
            for pair in scores.windows(2) {
                assert!(
                    pair[1] >= pair[0] - 1e-12,
                    "score decreased from {} to {} at mu = {mu}",
                    pair[0],
                    pair[1]
                );
            }
        }
    }
}

#[test]
fn ei_vanishes_without_improvement_or_uncertainty() {
    let ei = ExpectedImprovement::new(2.0);
    for mu in [2.01, 2.0, 1.5, -10.0] {
        let mut prev = f64::INFINITY;
        for sigma in [1e-1, 1e-2, 1e-4, 1e-8, 0.0] {
            let score = ei.score(mu, sigma);
            assert!(score <= prev + 1e-15);
            prev = score;
        }
        assert!(prev < 1e-11, "EI at sigma = 0 and mu = {mu} is {prev}");
    }
}

#[test]
fn ei_scenario_is_positive() {
    let ei = ExpectedImprovement::new(2.0);
    assert!((ei.xi - 0.01).abs() < f64::EPSILON);
    let score = ei.score(2.5, 0.1);
    assert!(score.is_finite());
    assert!(score > 0.48 && score < 0.5, "score {score}");
}

#[test]
fn ei_is_finite_at_zero_sigma() {
    let ei = ExpectedImprovement::new(2.0);
    for mu in [-1e6, 1.0, 2.01, 2.5, 1e6] {
        let score = ei.score(mu, 0.0);
        assert!(score.is_finite(), "EI({mu}, 0) = {score}");
        assert!(score >= 0.0);
    }
}

#[test]
fn ucb_and_max_variance_formulas() {
    let ucb = UpperConfidenceBound { kappa: 2.0 };
    assert!((ucb.score(1.0, 0.25) - 1.5).abs() < 1e-12);
    assert!((UpperConfidenceBound::default().kappa - 1.6).abs() < f64::EPSILON);
    assert!((MaxVariance.score(100.0, 0.3) - 0.3).abs() < f64::EPSILON);
}

#[test]
fn score_all_preserves_order() {
    let prediction = Prediction {
        mean: vec![0.0, 1.0, 2.0],
        std: vec![0.5, 0.5, 0.5],
    };
    let scores = UpperConfidenceBound::default().score_all(&prediction);
    assert_eq!(scores.len(), 3);
    assert!(scores[0] < scores[1] && scores[1] < scores[2]);
}

#[test]
fn strategy_binds_best_value() {
    let strategy: Strategy = "ei".parse().unwrap();
    let bound = strategy.acquisition(2.0);
    let direct = ExpectedImprovement::new(2.0);
    assert!((bound.score(2.5, 0.1) - direct.score(2.5, 0.1)).abs() < f64::EPSILON);

    let max_var: Strategy = "max_variance".parse().unwrap();
    assert_eq!(max_var, Strategy::MaxVariance);
    assert!((max_var.acquisition(0.0).score(5.0, 0.2) - 0.2).abs() < f64::EPSILON);
}

#[test]
fn unknown_strategy_is_an_error() {
    let err = "probability_of_improvement".parse::<Strategy>().unwrap_err();
    assert!(matches!(err, Error::UnknownStrategy(_)));
    assert!(err.to_string().contains("probability_of_improvement"));
}

#[test]
fn normal_helpers_are_consistent() {
    assert!((norm_pdf(0.0) - 0.398_942_280_401_432_7).abs() < 1e-15);
    let h = 1e-4;
    for x in [-2.0, -0.5, 0.0, 1.3] {
        let derivative = (norm_cdf(x + h) - norm_cdf(x - h)) / (2.0 * h);
        assert!((derivative - norm_pdf(x)).abs() < 1e-5);
    }
}
