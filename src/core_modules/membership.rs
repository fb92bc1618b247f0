// THEORY:
// The `membership` module is the Fuzzy Variable Model. A fuzzy variable is a
// bounded, discretized universe plus one triangular membership function per
// linguistic label. Labels are small enums rather than strings: every variable
// has exactly five of them, so the terms sit in a fixed-size array indexed by the
// label and a missing term is a compile error rather than a runtime lookup miss.
//
// All four variables of the controller are built here with their canonical
// breakpoints. Construction validates the breakpoints once; afterwards a
// variable is immutable and can be shared freely.

use crate::error::FuzzyError;
use serde::Serialize;
use std::marker::PhantomData;

/// Number of labels on every variable.
pub const LABEL_COUNT: usize = 5;

/// A linguistic label of a fuzzy variable.
pub trait Label: Copy + Eq + std::fmt::Debug + 'static {
    const ALL: [Self; LABEL_COUNT];

    fn index(self) -> usize;

    fn name(self) -> &'static str;
}

/// Labels of the two inputs, `Error` and `Delta Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputLabel {
    HighlyNegative,
    Negative,
    Mid,
    Positive,
    HighlyPositive,
}

impl Label for InputLabel {
    const ALL: [Self; LABEL_COUNT] = [
        Self::HighlyNegative,
        Self::Negative,
        Self::Mid,
        Self::Positive,
        Self::HighlyPositive,
    ];

    fn index(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        match self {
            Self::HighlyNegative => "highly_negative",
            Self::Negative => "negative",
            Self::Mid => "mid",
            Self::Positive => "positive",
            Self::HighlyPositive => "highly_positive",
        }
    }
}

/// Labels of the two outputs, `Left Motor Speed` and `Right Motor Speed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputLabel {
    VerySlow,
    Slow,
    Medium,
    Fast,
    VeryFast,
}

impl Label for OutputLabel {
    const ALL: [Self; LABEL_COUNT] = [
        Self::VerySlow,
        Self::Slow,
        Self::Medium,
        Self::Fast,
        Self::VeryFast,
    ];

    fn index(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        match self {
            Self::VerySlow => "very_slow",
            Self::Slow => "slow",
            Self::Medium => "medium",
            Self::Fast => "fast",
            Self::VeryFast => "very_fast",
        }
    }
}

/// A triangular membership function with breakpoints `left <= peak <= right`.
///
/// A degenerate side (`left == peak` or `peak == right`) is a shoulder: the value
/// stays 1 beyond the peak on that side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub left: f64,
    pub peak: f64,
    pub right: f64,
}

impl Triangle {
    pub const fn new(left: f64, peak: f64, right: f64) -> Self {
        Self { left, peak, right }
    }

    pub fn membership(&self, x: f64) -> f64 {
        if x == self.peak {
            return 1.0;
        }
        if x < self.peak {
            if self.left == self.peak {
                return 1.0;
            }
            if x <= self.left {
                return 0.0;
            }
            (x - self.left) / (self.peak - self.left)
        } else {
            if self.right == self.peak {
                return 1.0;
            }
            if x >= self.right {
                return 0.0;
            }
            (self.right - x) / (self.right - self.peak)
        }
    }

    fn validate(&self, variable: &'static str, label: &'static str, universe: &Universe) -> Result<(), FuzzyError> {
        let Triangle { left, peak, right } = *self;
        if !(left.is_finite() && peak.is_finite() && right.is_finite()) {
            return Err(FuzzyError::NonFiniteBreakpoints {
                variable,
                label,
                left,
                peak,
                right,
            });
        }
        if !(left <= peak && peak <= right) {
            return Err(FuzzyError::UnorderedBreakpoints {
                variable,
                label,
                left,
                peak,
                right,
            });
        }
        if left < universe.min || right > universe.max {
            return Err(FuzzyError::OutsideUniverse {
                variable,
                label,
                min: universe.min,
                max: universe.max,
            });
        }
        Ok(())
    }
}

/// A closed numeric range sampled at a fixed step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Universe {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Universe {
    pub const fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }

    /// Number of sample points: `min, min + step, ...` while not past `max`.
    pub fn len(&self) -> usize {
        if !self.is_valid() {
            return 0;
        }
        // Small slack so a max that is an exact multiple survives rounding.
        ((self.max - self.min) / self.step + 1e-9).floor() as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn samples(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.len()).map(move |i| self.min + i as f64 * self.step)
    }

    /// Holds values outside the universe at its edges.
    pub fn saturate(&self, x: f64) -> f64 {
        x.clamp(self.min, self.max)
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.step.is_finite() && self.step > 0.0 && self.min <= self.max
    }
}

/// Membership degrees of one crisp value in each label of a variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Degrees<L: Label> {
    values: [f64; LABEL_COUNT],
    _label: PhantomData<L>,
}

impl<L: Label> Degrees<L> {
    pub fn of(&self, label: L) -> f64 {
        self.values[label.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (L, f64)> + '_ {
        L::ALL.into_iter().map(move |label| (label, self.of(label)))
    }
}

/// A named universe with one triangular term per label.
#[derive(Debug, Clone)]
pub struct FuzzyVariable<L: Label> {
    name: &'static str,
    universe: Universe,
    terms: [Triangle; LABEL_COUNT],
    _label: PhantomData<L>,
}

impl<L: Label> FuzzyVariable<L> {
    /// `terms` is indexed by `Label::index`.
    pub fn new(name: &'static str, universe: Universe, terms: [Triangle; LABEL_COUNT]) -> Result<Self, FuzzyError> {
        if universe.is_empty() {
            return Err(FuzzyError::EmptyUniverse {
                variable: name,
                min: universe.min,
                max: universe.max,
                step: universe.step,
            });
        }
        for label in L::ALL {
            terms[label.index()].validate(name, label.name(), &universe)?;
        }
        Ok(Self {
            name,
            universe,
            terms,
            _label: PhantomData,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    pub fn term(&self, label: L) -> &Triangle {
        &self.terms[label.index()]
    }

    /// Degree of `x` in every label, after saturating `x` to the universe.
    pub fn fuzzify(&self, x: f64) -> Degrees<L> {
        let x = self.universe.saturate(x);
        let mut values = [0.0_f64; LABEL_COUNT];
        for label in L::ALL {
            values[label.index()] = self.terms[label.index()].membership(x);
        }
        Degrees {
            values,
            _label: PhantomData,
        }
    }
}

pub const INPUT_UNIVERSE: Universe = Universe::new(-210.0, 210.0, 1.0);
pub const OUTPUT_UNIVERSE: Universe = Universe::new(0.0, 6.28, 0.1);

const INPUT_TERMS: [Triangle; LABEL_COUNT] = [
    Triangle::new(-210.0, -210.0, -105.0),
    Triangle::new(-210.0, -105.0, 0.0),
    Triangle::new(-105.0, 0.0, 105.0),
    Triangle::new(0.0, 105.0, 210.0),
    Triangle::new(105.0, 210.0, 210.0),
];

const OUTPUT_TERMS: [Triangle; LABEL_COUNT] = [
    Triangle::new(0.0, 0.0, 1.57),
    Triangle::new(0.79, 1.57, 3.14),
    Triangle::new(1.57, 3.14, 4.71),
    Triangle::new(3.14, 4.71, 6.28),
    Triangle::new(4.71, 6.28, 6.28),
];

/// The four variables of the steering controller.
#[derive(Debug, Clone)]
pub struct FuzzyModel {
    pub error: FuzzyVariable<InputLabel>,
    pub delta_error: FuzzyVariable<InputLabel>,
    pub left_speed: FuzzyVariable<OutputLabel>,
    pub right_speed: FuzzyVariable<OutputLabel>,
}

impl FuzzyModel {
    pub fn standard() -> Result<Self, FuzzyError> {
        Ok(Self {
            error: FuzzyVariable::new("Error", INPUT_UNIVERSE, INPUT_TERMS)?,
            delta_error: FuzzyVariable::new("Delta Error", INPUT_UNIVERSE, INPUT_TERMS)?,
            left_speed: FuzzyVariable::new("Left Motor Speed", OUTPUT_UNIVERSE, OUTPUT_TERMS)?,
            right_speed: FuzzyVariable::new("Right Motor Speed", OUTPUT_UNIVERSE, OUTPUT_TERMS)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn peak_is_one_and_feet_are_zero() {
        for t in INPUT_TERMS.iter().chain(OUTPUT_TERMS.iter()) {
            assert!((t.membership(t.peak) - 1.0).abs() < EPS);
            let left_expected = if t.left == t.peak { 1.0 } else { 0.0 };
            let right_expected = if t.right == t.peak { 1.0 } else { 0.0 };
            assert_eq!(t.membership(t.left), left_expected, "{t:?}");
            assert_eq!(t.membership(t.right), right_expected, "{t:?}");
        }
    }

    #[test]
    fn sides_are_linear() {
        let t = Triangle::new(0.0, 10.0, 30.0);
        assert!((t.membership(5.0) - 0.5).abs() < EPS);
        assert!((t.membership(20.0) - 0.5).abs() < EPS);
        assert_eq!(t.membership(-1.0), 0.0);
        assert_eq!(t.membership(31.0), 0.0);
    }

    #[test]
    fn shoulders_hold_one_beyond_the_peak() {
        let low = Triangle::new(-210.0, -210.0, -105.0);
        assert_eq!(low.membership(-500.0), 1.0);
        let high = Triangle::new(105.0, 210.0, 210.0);
        assert_eq!(high.membership(500.0), 1.0);
    }

    #[test]
    fn adjacent_labels_cross_at_one_half() {
        let model = FuzzyModel::standard().unwrap();
        let degrees = model.error.fuzzify(52.5);
        assert!((degrees.of(InputLabel::Mid) - 0.5).abs() < EPS);
        assert!((degrees.of(InputLabel::Positive) - 0.5).abs() < EPS);
        assert_eq!(degrees.of(InputLabel::HighlyPositive), 0.0);
    }

    #[test]
    fn zero_is_fully_mid() {
        let model = FuzzyModel::standard().unwrap();
        let degrees = model.delta_error.fuzzify(0.0);
        for (label, degree) in degrees.iter() {
            let expected = if label == InputLabel::Mid { 1.0 } else { 0.0 };
            assert_eq!(degree, expected, "{label:?}");
        }
    }

    #[test]
    fn out_of_range_inputs_saturate() {
        let model = FuzzyModel::standard().unwrap();
        let degrees = model.error.fuzzify(-900.0);
        assert_eq!(degrees.of(InputLabel::HighlyNegative), 1.0);
        assert_eq!(degrees.of(InputLabel::Negative), 0.0);
    }

    #[test]
    fn every_input_has_some_membership() {
        let model = FuzzyModel::standard().unwrap();
        for x in INPUT_UNIVERSE.samples() {
            let total: f64 = model.error.fuzzify(x).iter().map(|(_, d)| d).sum();
            assert!(total > 0.0, "no label covers {x}");
        }
    }

    #[test]
    fn universes_sample_like_a_half_open_range() {
        assert_eq!(INPUT_UNIVERSE.len(), 421);
        assert_eq!(OUTPUT_UNIVERSE.len(), 63);
        let last = OUTPUT_UNIVERSE.samples().last().unwrap();
        assert!((last - 6.2).abs() < 1e-9);
    }

    #[test]
    fn unordered_breakpoints_are_rejected() {
        let mut terms = OUTPUT_TERMS;
        terms[2] = Triangle::new(3.0, 2.0, 4.0);
        let err = FuzzyVariable::<OutputLabel>::new("Speed", OUTPUT_UNIVERSE, terms).unwrap_err();
        assert!(matches!(err, FuzzyError::UnorderedBreakpoints { label: "medium", .. }));
    }

    #[test]
    fn terms_outside_the_universe_are_rejected() {
        let mut terms = INPUT_TERMS;
        terms[4] = Triangle::new(105.0, 210.0, 300.0);
        let err = FuzzyVariable::<InputLabel>::new("Error", INPUT_UNIVERSE, terms).unwrap_err();
        assert!(matches!(err, FuzzyError::OutsideUniverse { label: "highly_positive", .. }));
    }

    #[test]
    fn empty_universe_is_rejected() {
        let universe = Universe::new(1.0, 0.0, 0.1);
        let err = FuzzyVariable::<OutputLabel>::new("Speed", universe, OUTPUT_TERMS).unwrap_err();
        assert!(matches!(err, FuzzyError::EmptyUniverse { .. }));
    }
}
