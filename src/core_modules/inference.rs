// THEORY:
// The `inference` module is a single-purpose Mamdani engine: two inputs, one
// output per call, triangular terms, min for AND, max for aggregation and the
// centroid for defuzzification. It is stateless once built, so evaluating the
// same inputs twice always gives the same speed.
//
// A control tick fuzzifies its inputs once and then evaluates each wheel against
// the same `FuzzifiedInputs`:
//
// 1.  **Fuzzify**: each crisp input becomes five membership degrees.
// 2.  **Fire**: every rule fires with the minimum of its two antecedent degrees.
// 3.  **Clip**: for the requested wheel, each output label is clipped at the
//     strongest firing among the rules that name it.
// 4.  **Defuzzify**: the clipped terms are max-aggregated at each sample of the
//     output universe and the weighted centroid of that curve is the speed.

use crate::core_modules::membership::{
    Degrees, FuzzyModel, FuzzyVariable, InputLabel, LABEL_COUNT, Label, OutputLabel,
};
use crate::core_modules::rule_base::{OutputChannel, RuleBase};
use crate::error::FuzzyError;

/// Input membership degrees for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzifiedInputs {
    pub error: Degrees<InputLabel>,
    pub delta_error: Degrees<InputLabel>,
}

/// Firing strength of every rule, indexed `[error][delta_error]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FiringStrengths([[f64; LABEL_COUNT]; LABEL_COUNT]);

impl FiringStrengths {
    pub fn of(&self, error: InputLabel, delta_error: InputLabel) -> f64 {
        self.0[error.index()][delta_error.index()]
    }

    pub fn strongest(&self) -> f64 {
        self.0.iter().flatten().copied().fold(0.0, f64::max)
    }
}

/// A crisp output value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Defuzzified {
    pub value: f64,
    /// The aggregated curve had no area and `value` is the universe midpoint.
    pub underflow: bool,
}

/// Mamdani inference over the steering model.
#[derive(Debug, Clone)]
pub struct InferenceEngine {
    model: FuzzyModel,
    rules: RuleBase,
}

impl InferenceEngine {
    pub fn new(model: FuzzyModel, rules: RuleBase) -> Self {
        Self { model, rules }
    }

    /// The canonical variables and the tuned rule table.
    pub fn standard() -> Result<Self, FuzzyError> {
        Ok(Self::new(FuzzyModel::standard()?, RuleBase::standard()))
    }

    pub fn model(&self) -> &FuzzyModel {
        &self.model
    }

    pub fn rules(&self) -> &RuleBase {
        &self.rules
    }

    pub fn fuzzify(&self, error: f64, delta_error: f64) -> FuzzifiedInputs {
        FuzzifiedInputs {
            error: self.model.error.fuzzify(error),
            delta_error: self.model.delta_error.fuzzify(delta_error),
        }
    }

    pub fn firing_strengths(&self, inputs: &FuzzifiedInputs) -> FiringStrengths {
        let mut strengths = [[0.0_f64; LABEL_COUNT]; LABEL_COUNT];
        for rule in self.rules.rules() {
            strengths[rule.error.index()][rule.delta_error.index()] =
                inputs.error.of(rule.error).min(inputs.delta_error.of(rule.delta_error));
        }
        FiringStrengths(strengths)
    }

    /// Clip height of each output label for one wheel, indexed by `OutputLabel`.
    pub fn clip_heights(&self, strengths: &FiringStrengths, channel: OutputChannel) -> [f64; LABEL_COUNT] {
        let mut heights = [0.0_f64; LABEL_COUNT];
        for rule in self.rules.rules() {
            let strength = strengths.of(rule.error, rule.delta_error);
            if strength <= 0.0 {
                continue;
            }
            let slot = &mut heights[rule.consequent.label_for(channel).index()];
            *slot = slot.max(strength);
        }
        heights
    }

    pub fn evaluate(&self, inputs: &FuzzifiedInputs, channel: OutputChannel) -> Defuzzified {
        let strengths = self.firing_strengths(inputs);
        let heights = self.clip_heights(&strengths, channel);
        centroid(self.output_variable(channel), &heights)
    }

    /// One crisp wheel speed from crisp inputs.
    pub fn infer(&self, error: f64, delta_error: f64, channel: OutputChannel) -> f64 {
        self.evaluate(&self.fuzzify(error, delta_error), channel).value
    }

    pub fn output_variable(&self, channel: OutputChannel) -> &FuzzyVariable<OutputLabel> {
        match channel {
            OutputChannel::Left => &self.model.left_speed,
            OutputChannel::Right => &self.model.right_speed,
        }
    }
}

/// Aggregated membership of the clipped terms at `x`.
pub fn aggregate_at(variable: &FuzzyVariable<OutputLabel>, heights: &[f64; LABEL_COUNT], x: f64) -> f64 {
    OutputLabel::ALL
        .into_iter()
        .filter(|label| heights[label.index()] > 0.0)
        .map(|label| variable.term(label).membership(x).min(heights[label.index()]))
        .fold(0.0, f64::max)
}

/// Centroid of the clip-then-max curve sampled over the variable's universe.
pub fn centroid(variable: &FuzzyVariable<OutputLabel>, heights: &[f64; LABEL_COUNT]) -> Defuzzified {
    let mut weighted = 0.0_f64;
    let mut total = 0.0_f64;
    for x in variable.universe().samples() {
        let mu = aggregate_at(variable, heights, x);
        weighted += x * mu;
        total += mu;
    }
    if total <= 0.0 {
        return Defuzzified {
            value: variable.universe().midpoint(),
            underflow: true,
        };
    }
    Defuzzified {
        value: weighted / total,
        underflow: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::membership::INPUT_UNIVERSE;

    fn engine() -> InferenceEngine {
        InferenceEngine::standard().unwrap()
    }

    #[test]
    fn centered_line_drives_straight_at_medium() {
        let engine = engine();
        let inputs = engine.fuzzify(0.0, 0.0);
        let strengths = engine.firing_strengths(&inputs);
        assert_eq!(strengths.of(InputLabel::Mid, InputLabel::Mid), 1.0);
        let fired = InputLabel::ALL
            .into_iter()
            .flat_map(|e| InputLabel::ALL.into_iter().map(move |d| (e, d)))
            .filter(|(e, d)| strengths.of(*e, *d) > 0.0)
            .count();
        assert_eq!(fired, 1);

        let left = engine.evaluate(&inputs, OutputChannel::Left);
        let right = engine.evaluate(&inputs, OutputChannel::Right);
        assert!(!left.underflow && !right.underflow);
        assert!((left.value - 3.14).abs() < 0.01, "left {}", left.value);
        assert!((right.value - 3.14).abs() < 0.01, "right {}", right.value);
    }

    #[test]
    fn far_right_and_drifting_turns_hard_left() {
        let engine = engine();
        let left = engine.infer(210.0, 210.0, OutputChannel::Left);
        let right = engine.infer(210.0, 210.0, OutputChannel::Right);
        // Only `very_slow` / `very_fast` are active, so each speed is the
        // centroid of a single shoulder triangle.
        assert!((left - 0.49).abs() < 0.02, "left {left}");
        assert!((right - 5.74).abs() < 0.02, "right {right}");
        assert!(left < 1.57 && right > 4.71);
    }

    #[test]
    fn far_left_and_drifting_mirrors_the_far_right_case() {
        let engine = engine();
        let left = engine.infer(-210.0, -210.0, OutputChannel::Left);
        let right = engine.infer(-210.0, -210.0, OutputChannel::Right);
        assert!((left - 5.74).abs() < 0.02, "left {left}");
        assert!((right - 0.49).abs() < 0.02, "right {right}");
    }

    #[test]
    fn same_inputs_give_same_outputs() {
        let engine = engine();
        for (e, d) in [(37.0, -12.0), (-150.0, 80.0), (200.0, -5.0)] {
            for channel in [OutputChannel::Left, OutputChannel::Right] {
                assert_eq!(engine.infer(e, d, channel), engine.infer(e, d, channel));
            }
        }
    }

    #[test]
    fn every_input_pair_fires_some_rule_and_stays_in_range() {
        let engine = engine();
        let coarse: Vec<f64> = INPUT_UNIVERSE.samples().step_by(15).chain([210.0]).collect();
        for &e in &coarse {
            for &d in &coarse {
                let inputs = engine.fuzzify(e, d);
                assert!(engine.firing_strengths(&inputs).strongest() > 0.0, "({e}, {d})");
                for channel in [OutputChannel::Left, OutputChannel::Right] {
                    let out = engine.evaluate(&inputs, channel);
                    assert!(!out.underflow, "({e}, {d}) {channel:?}");
                    assert!((0.0..=6.28).contains(&out.value), "({e}, {d}) -> {}", out.value);
                }
            }
        }
    }

    #[test]
    fn clipping_uses_the_strongest_rule_per_label() {
        let engine = engine();
        // error 52.5 is half mid and half positive; delta 0 is fully mid.
        let inputs = engine.fuzzify(52.5, 0.0);
        let strengths = engine.firing_strengths(&inputs);
        assert!((strengths.of(InputLabel::Mid, InputLabel::Mid) - 0.5).abs() < 1e-12);
        assert!((strengths.of(InputLabel::Positive, InputLabel::Mid) - 0.5).abs() < 1e-12);
        let heights = engine.clip_heights(&strengths, OutputChannel::Left);
        assert!((heights[OutputLabel::Medium.index()] - 0.5).abs() < 1e-12);
        assert_eq!(heights[OutputLabel::Fast.index()], 0.0);
    }

    #[test]
    fn empty_aggregate_falls_back_to_the_midpoint() {
        let engine = engine();
        let out = centroid(engine.output_variable(OutputChannel::Left), &[0.0; LABEL_COUNT]);
        assert!(out.underflow);
        assert!((out.value - 3.14).abs() < 1e-12);
    }

    #[test]
    fn saturated_inputs_match_the_universe_edge() {
        let engine = engine();
        for channel in [OutputChannel::Left, OutputChannel::Right] {
            assert_eq!(engine.infer(-600.0, 900.0, channel), engine.infer(-210.0, 210.0, channel));
        }
    }

    #[test]
    fn clip_height_is_the_strongest_rule_concluding_each_label() {
        let engine = engine();
        for (e, d) in [(-140.0, 35.0), (17.0, -88.0), (120.0, 60.0)] {
            let strengths = engine.firing_strengths(&engine.fuzzify(e, d));
            for channel in [OutputChannel::Left, OutputChannel::Right] {
                let heights = engine.clip_heights(&strengths, channel);
                for label in OutputLabel::ALL {
                    let expected = engine
                        .rules()
                        .rules()
                        .filter(|rule| rule.consequent.label_for(channel) == label)
                        .map(|rule| strengths.of(rule.error, rule.delta_error))
                        .fold(0.0, f64::max);
                    assert_eq!(heights[label.index()], expected, "{label:?} at ({e}, {d})");
                }
            }
        }
    }
}
