mod common;

use common::{assert_close, rim_of, ScriptedOperator, StageScript};
use rand::rngs::StdRng;
use rand::SeedableRng;
use seekscan_core::{Point2D, SeekError};
use seekscan_geom::fit_circle;
use seekscan_plan::{synthetic_circle, HoleSampler, SampleDecision};

fn answers_for(decisions: &[&str]) -> Vec<String> {
    let mut answers = Vec::new();
    for decision in decisions {
        answers.extend(["", "", "", ""].iter().map(|s| s.to_string()));
        answers.push(decision.to_string());
    }
    answers
}

fn operator(decisions: &[&str]) -> ScriptedOperator {
    let answers = answers_for(decisions);
    let refs: Vec<&str> = answers.iter().map(String::as_str).collect();
    ScriptedOperator::new(&refs)
}

#[test]
fn decisions_parse_leniently() {
    assert_eq!(SampleDecision::parse(""), SampleDecision::Continue);
    assert_eq!(SampleDecision::parse("yes"), SampleDecision::Continue);
    assert_eq!(SampleDecision::parse("No"), SampleDecision::Stop);
    assert_eq!(SampleDecision::parse(" redo "), SampleDecision::Redo);
}

#[test]
fn sampler_yields_until_operator_says_no() {
    let a = Point2D::new(100.0, 200.0);
    let b = Point2D::new(-300.0, 50.0);
    let mut positions = rim_of(a, 40.0).to_vec();
    positions.extend(rim_of(b, 45.0));
    let microscope = StageScript::new(&positions);
    let mut operator = operator(&["y", "no"]);

    let fits: Vec<_> = HoleSampler::new(&microscope, &mut operator, 1)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(fits.len(), 2);
    assert_close(fits[0].center, a);
    assert_close(fits[1].center, b);
    assert!((fits[1].radius - 45.0).abs() < 1e-6);
    assert!(operator.answers.is_empty());
    assert!(operator.prompts[1].contains("1 >>"));
}

#[test]
fn redo_discards_the_hole() {
    let discarded = Point2D::new(0.0, 500.0);
    let kept = Point2D::new(700.0, 0.0);
    let mut positions = rim_of(discarded, 30.0).to_vec();
    positions.extend(rim_of(kept, 30.0));
    let microscope = StageScript::new(&positions);
    let mut operator = operator(&["redo", "n"]);

    let fits: Vec<_> = HoleSampler::new(&microscope, &mut operator, 1)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(fits.len(), 1);
    assert_close(fits[0].center, kept);
}

#[test]
fn origin_stage_falls_back_to_synthetic_circle() {
    let microscope = StageScript::new(&[]);
    let mut operator = ScriptedOperator::new(&["n"; 64]);
    let fits: Vec<_> = HoleSampler::new(&microscope, &mut operator, 7)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(fits.len(), 1);
    assert!((fits[0].radius - 1.0).abs() < 1e-6);
}

#[test]
fn running_out_of_answers_ends_with_the_error() {
    let microscope = StageScript::new(&rim_of(Point2D::ORIGIN, 10.0));
    let mut operator = ScriptedOperator::new(&["", ""]);
    let mut sampler = HoleSampler::new(&microscope, &mut operator, 1);
    assert!(matches!(sampler.next(), Some(Err(SeekError::Abort(_)))));
    assert!(sampler.next().is_none());
}

#[test]
fn synthetic_rim_lies_on_a_unit_circle() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..20 {
        let rim = synthetic_circle(&mut rng);
        if let Ok(fit) = fit_circle(rim) {
            assert!((fit.radius - 1.0).abs() < 1e-6);
        }
    }
}
