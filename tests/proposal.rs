
use nextpoint::prelude::*;
use nextpoint::sampler::{chebyshev_distance, filter_interior, filter_novel};
use nextpoint::surrogate::Prediction;
use test_functions::branin_unit;

fn sample_history() -> History {
    History::from_parts(
        vec![
            vec![0.2, 0.3],
            vec![0.7, 0.8],
            vec![0.4, 0.6],
            vec![0.9, 0.1],
            vec![0.1, 0.9],
        ],
        vec![1.0, 2.0, 1.4, 0.2, 0.5],
    )
    .unwrap()
}

#[test]
fn proposals_respect_every_constraint() {
    let bounds = Bounds::unit(2).unwrap();
    let history = sample_history();
    let proposer = Proposer::builder(bounds.clone())
        .n_candidates(256)
        .batch_size(3)
        .seed(4)
        .build()
        .unwrap();

    let proposal = proposer.propose(&history, 0.5).unwrap();
    assert!(!proposal.is_empty() && proposal.len() <= 3);
    assert!((proposal.trust_region.lower()[0] - 0.45).abs() < 1e-12);
    assert!((proposal.trust_region.upper()[1] - 1.0).abs() < 1e-12);

    let inputs = proposal.inputs();
    let interior = filter_interior(&inputs, &bounds, 1e-3);
    for (point, inside) in proposal.points.iter().zip(interior) {
        assert!(bounds.contains(&point.input));
        assert!(proposal.trust_region.contains(&point.input));
        assert!(inside, "{:?} is within the edge margin", point.input);
        assert!(filter_novel(&point.input, history.inputs(), 0.02));
        assert!(point.std > 0.0 && point.mean.is_finite());
    }
    for pair in proposal.points.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[test]
fn batch_members_are_mutually_separated() {
    let proposer = Proposer::builder(Bounds::unit(2).unwrap())
        .strategy(Strategy::UpperConfidenceBound { kappa: 1.6 })
        .n_candidates(400)
        .batch_size(5)
        .min_separation(Some(0.1))
        .build()
        .unwrap();
    let proposal = proposer.propose(&sample_history(), 1.0).unwrap();
    assert_eq!(proposal.len(), 5);
    for (i, a) in proposal.points.iter().enumerate() {
        for b in &proposal.points[i + 1..] {
            assert!(chebyshev_distance(&a.input, &b.input) >= 0.1);
        }
    }
}

#[test]
fn equal_seeds_give_equal_proposals() {
    let history = sample_history();
    let build = |seed| {
        Proposer::builder(Bounds::unit(2).unwrap())
            .n_candidates(128)
            .batch_size(2)
            .seed(seed)
            .build()
            .unwrap()
    };
    let a = build(8).propose(&history, 0.8).unwrap();
    let b = build(8).propose(&history, 0.8).unwrap();
    let c = build(9).propose(&history, 0.8).unwrap();
    assert_eq!(a, b);
    assert_ne!(a.inputs(), c.inputs());
}

#[test]
fn separation_larger_than_box_is_degenerate() {
    let proposer = Proposer::builder(Bounds::unit(2).unwrap())
        .n_candidates(64)
        .min_separation(Some(0.5))
        .build()
        .unwrap();
    match proposer.propose(&sample_history(), 0.05) {
        Err(Error::DegenerateCandidateSet {
            generated,
            after_edge,
            after_novelty,
        }) => {
            assert_eq!(generated, 64);
            assert_eq!(after_edge, 64);
            assert_eq!(after_novelty, 0);
        }
        other => panic!("expected DegenerateCandidateSet, got {other:?}"),
    }
}

#[test]
fn boundary_anchor_needs_edge_margin_disabled() {
    let history =
        History::from_parts(vec![vec![1.0, 1.0], vec![0.3, 0.4]], vec![5.0, 1.0]).unwrap();
    let strict = Proposer::builder(Bounds::unit(2).unwrap())
        .n_candidates(32)
        .min_separation(None)
        .build()
        .unwrap();
    assert!(matches!(
        strict.propose(&history, 0.0),
        Err(Error::DegenerateCandidateSet { after_edge: 0, .. })
    ));

    let relaxed = Proposer::builder(Bounds::unit(2).unwrap())
        .n_candidates(32)
        .edge_margin(None)
        .min_separation(None)
        .build()
        .unwrap();
    let proposal = relaxed.propose(&history, 0.0).unwrap();
    assert_eq!(proposal.best().unwrap().input, vec![1.0, 1.0]);
}

#[test]
fn invalid_requests_are_reported() {
    let proposer = Proposer::builder(Bounds::unit(2).unwrap())
        .n_candidates(16)
        .build()
        .unwrap();
    assert!(matches!(
        proposer.propose(&sample_history(), -0.5),
        Err(Error::InvalidLength(_))
    ));

    let outside =
        History::from_parts(vec![vec![1.5, 0.5], vec![0.3, 0.4]], vec![3.0, 1.0]).unwrap();
    assert!(matches!(
        proposer.propose(&outside, 0.5),
        Err(Error::AnchorOutOfBounds { dim: 0, .. })
    ));

    let single = History::from_parts(vec![vec![0.5, 0.5]], vec![1.0]).unwrap();
    assert!(matches!(
        proposer.propose(&single, 0.5),
        Err(Error::InsufficientData {
            required: 2,
            got: 1
        })
    ));
}

/// Mean of the outcomes everywhere; uncertainty is the distance to the data.
struct DistanceSurrogate;

struct DistanceModel {
    inputs: Vec<Vec<f64>>,
    mean: f64,
}

impl Surrogate for DistanceSurrogate {
    type Model = DistanceModel;

    fn fit(&self, inputs: &[Vec<f64>], outputs: &[f64]) -> Result<DistanceModel> {
        if inputs.is_empty() {
            return Err(Error::InsufficientData {
                required: 1,
                got: 0,
            });
        }
        #[allow(clippy::cast_precision_loss)]
        let mean = outputs.iter().sum::<f64>() / outputs.len() as f64;
        Ok(DistanceModel {
            inputs: inputs.to_vec(),
            mean,
        })
    }
}

impl Predictor for DistanceModel {
    fn predict(&self, queries: &[Vec<f64>]) -> Prediction {
        let std = queries
            .iter()
            .map(|q| {
                self.inputs
                    .iter()
                    .map(|x| chebyshev_distance(q, x))
                    .fold(f64::INFINITY, f64::min)
            })
            .collect();
        Prediction {
            mean: vec![self.mean; queries.len()],
            std,
        }
    }
}

#[test]
fn custom_surrogate_plugs_in() {
    let history = History::from_parts(vec![vec![0.5, 0.5]], vec![1.0]).unwrap();
    let proposer = Proposer::builder(Bounds::unit(2).unwrap())
        .surrogate(DistanceSurrogate)
        .strategy(Strategy::MaxVariance)
        .n_candidates(200)
        .batch_size(3)
        .build()
        .unwrap();

    let proposal = proposer.propose(&history, 1.0).unwrap();
    assert_eq!(proposal.len(), 3);
    let best = proposal.best().unwrap();
    assert!((best.score - best.std).abs() < f64::EPSILON);
    // Far from the only observation, near a corner of the box.
    assert!(best.std > 0.4, "best std {}", best.std);
}

#[test]
fn sequential_loop_improves_on_initial_design() {
    let bounds = Bounds::unit(2).unwrap();
    let n_initial = 8;
    let mut history = History::new();
    for x in LatinHypercube::new()
        .generate(bounds.lower(), bounds.upper(), n_initial, 21)
        .unwrap()
    {
        let y = -branin_unit(&x);
        history.push(x, y).unwrap();
    }
    let initial_best = history.best().unwrap().value;

    let schedule = LengthSchedule::for_dims(2, 1);
    let provider = MemoryHistory::with_history(history);
    for step in 0..12 {
        let snapshot = provider.snapshot();
        let state = schedule
            .replay(&snapshot, n_initial, 1, 1e-3)
            .unwrap();
        let proposer = Proposer::builder(bounds.clone())
            .n_candidates(256)
            .seed(step)
            .build()
            .unwrap();
        let proposal = proposer.propose_from(&provider, state.length()).unwrap();
        let x = proposal.best().unwrap().input.clone();
        let y = -branin_unit(&x);
        provider.append(vec![Observation::new(x, y)]).unwrap();
    }

    let final_best = provider.snapshot().best().unwrap().value;
    assert_eq!(provider.len(), n_initial + 12);
    assert!(
        final_best > initial_best,
        "no improvement: initial {initial_best}, final {final_best}"
    );
}
