// THEORY:
// The `rule_base` module is the control law. It is a complete 5x5 table: one rule
// per pairing of an `Error` label with a `Delta Error` label, each naming the label
// for the left wheel and the label for the right wheel. Storing it as a
// two-dimensional array indexed by the input labels makes full coverage a
// property of the type: there is no way to forget a combination.
//
// The table is tuned steering behaviour, not derived from a formula. Edit it
// cell by cell.

use crate::core_modules::membership::{InputLabel, LABEL_COUNT, Label, OutputLabel};
use serde::Serialize;
use OutputLabel::{Fast, Medium, Slow, VeryFast, VerySlow};

/// Which wheel an inference targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputChannel {
    Left,
    Right,
}

/// The right-hand side of a rule: one label per output variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Consequent {
    pub left: OutputLabel,
    pub right: OutputLabel,
}

impl Consequent {
    pub fn label_for(&self, channel: OutputChannel) -> OutputLabel {
        match channel {
            OutputChannel::Left => self.left,
            OutputChannel::Right => self.right,
        }
    }
}

/// `IF Error is error AND Delta Error is delta_error THEN consequent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub error: InputLabel,
    pub delta_error: InputLabel,
    pub consequent: Consequent,
}

const fn then(left: OutputLabel, right: OutputLabel) -> Consequent {
    Consequent { left, right }
}

/// Rows are `Error` labels, columns are `Delta Error` labels, both ordered
/// highly_negative, negative, mid, positive, highly_positive.
const STEERING_TABLE: [[Consequent; LABEL_COUNT]; LABEL_COUNT] = [
    // Error: highly_negative
    [
        then(VeryFast, VerySlow),
        then(Fast, Slow),
        then(Medium, Slow),
        then(Medium, Medium),
        then(Slow, Fast),
    ],
    // Error: negative
    [
        then(Fast, VerySlow),
        then(Medium, Slow),
        then(Medium, Medium),
        then(Slow, Medium),
        then(Slow, Fast),
    ],
    // Error: mid
    [
        then(Medium, Fast),
        then(Medium, Medium),
        then(Medium, Medium),
        then(Medium, Medium),
        then(Medium, Fast),
    ],
    // Error: positive
    [
        then(Slow, Medium),
        then(Slow, Medium),
        then(Medium, Medium),
        then(Slow, Fast),
        then(VerySlow, VeryFast),
    ],
    // Error: highly_positive
    [
        then(Slow, Fast),
        then(Slow, Medium),
        then(Medium, Medium),
        then(Slow, Fast),
        then(VerySlow, VeryFast),
    ],
];

/// The full rule table of the steering controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleBase {
    table: [[Consequent; LABEL_COUNT]; LABEL_COUNT],
}

impl Default for RuleBase {
    fn default() -> Self {
        Self::standard()
    }
}

impl RuleBase {
    pub fn standard() -> Self {
        Self {
            table: STEERING_TABLE,
        }
    }

    pub fn consequent(&self, error: InputLabel, delta_error: InputLabel) -> Consequent {
        self.table[error.index()][delta_error.index()]
    }

    /// All 25 rules, error-major.
    pub fn rules(&self) -> impl Iterator<Item = Rule> + '_ {
        InputLabel::ALL.into_iter().flat_map(move |error| {
            InputLabel::ALL.into_iter().map(move |delta_error| Rule {
                error,
                delta_error,
                consequent: self.consequent(error, delta_error),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use InputLabel::*;

    #[test]
    fn table_has_one_rule_per_input_pair() {
        let rules: Vec<Rule> = RuleBase::standard().rules().collect();
        assert_eq!(rules.len(), 25);
        for error in InputLabel::ALL {
            for delta_error in InputLabel::ALL {
                let count = rules
                    .iter()
                    .filter(|r| r.error == error && r.delta_error == delta_error)
                    .count();
                assert_eq!(count, 1, "{error:?} x {delta_error:?}");
            }
        }
    }

    #[test]
    fn centered_and_steady_runs_both_wheels_at_medium() {
        let c = RuleBase::standard().consequent(Mid, Mid);
        assert_eq!(c, then(Medium, Medium));
    }

    #[test]
    fn extreme_corners_turn_hard() {
        let rules = RuleBase::standard();
        assert_eq!(rules.consequent(HighlyNegative, HighlyNegative), then(VeryFast, VerySlow));
        assert_eq!(rules.consequent(HighlyPositive, HighlyPositive), then(VerySlow, VeryFast));
        assert_eq!(rules.consequent(Positive, HighlyPositive), then(VerySlow, VeryFast));
        assert_eq!(rules.consequent(Negative, HighlyNegative), then(Fast, VerySlow));
    }

    #[test]
    fn off_diagonal_cells_match_the_tuned_table() {
        let rules = RuleBase::standard();
        assert_eq!(rules.consequent(HighlyNegative, HighlyPositive), then(Slow, Fast));
        assert_eq!(rules.consequent(Mid, HighlyNegative), then(Medium, Fast));
        assert_eq!(rules.consequent(Positive, HighlyNegative), then(Slow, Medium));
        assert_eq!(rules.consequent(HighlyPositive, HighlyNegative), then(Slow, Fast));
        assert_eq!(rules.consequent(HighlyPositive, Mid), then(Medium, Medium));
    }

    #[test]
    fn channel_picks_its_side_of_the_consequent() {
        let c = then(Slow, VeryFast);
        assert_eq!(c.label_for(OutputChannel::Left), Slow);
        assert_eq!(c.label_for(OutputChannel::Right), VeryFast);
    }
}
