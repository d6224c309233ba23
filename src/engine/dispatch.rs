// src/engine/dispatch.rs

//! Translates an intent classification into at most one session action.
//! Holds no state and performs no I/O.

use std::fmt;

use crate::{
    engine::SessionAction,
    models::intent::{HelpEntry, Intent, IntentClassification, IntentContext},
};

/// What the engine should do with a free-text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Perform(SessionAction),
    Help,
    Reprompt(Reprompt),
}

/// Why a message did not turn into an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reprompt {
    InvalidQuestionNumber { total: usize },
    Unrecognized,
}

impl fmt::Display for Reprompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reprompt::InvalidQuestionNumber { total } => {
                write!(f, "Invalid question number. Choose between 1 and {}.", total)
            }
            Reprompt::Unrecognized => write!(
                f,
                "I'm not sure what you want to do. Type 'help' to see available actions."
            ),
        }
    }
}

pub fn resolve(
    classification: &IntentClassification,
    message: &str,
    context: &IntentContext,
) -> Directive {
    match classification.intent {
        Intent::AnswerQuestion => Directive::Perform(SessionAction::Answer {
            text: message.to_string(),
            target: None,
        }),
        // Revising is navigating to the question; the next answer then edits it.
        Intent::NavigateToQuestion | Intent::ReviseAnswer => {
            match classification.parameters.question_number {
                Some(number) if number >= 1 && (number as u64) <= context.total_questions as u64 => {
                    Directive::Perform(SessionAction::Navigate { target: number - 1 })
                }
                _ => Directive::Reprompt(Reprompt::InvalidQuestionNumber {
                    total: context.total_questions,
                }),
            }
        }
        Intent::SkipQuestion => Directive::Perform(SessionAction::Skip),
        Intent::SubmitSurvey => Directive::Perform(SessionAction::Submit),
        Intent::ShowHelp => Directive::Help,
        Intent::Unknown => Directive::Reprompt(Reprompt::Unrecognized),
    }
}

pub fn help_entries() -> Vec<HelpEntry> {
    [
        ("Answer Question", "Simply type your answer to the current question"),
        ("Navigate to Question", "Type 'go to question X' or 'question X'"),
        ("Revise Answer", "Type 'revise question X' or 'edit question X'"),
        ("Skip Question", "Type 'skip' or 'next question'"),
        ("Submit Survey", "Type 'submit' or 'finish survey'"),
        ("Show Help", "Type 'help' or 'show commands'"),
    ]
    .into_iter()
    .map(|(action, usage)| HelpEntry {
        action: action.to_string(),
        usage: usage.to_string(),
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(total: usize) -> IntentContext {
        IntentContext {
            current_question_index: 0,
            total_questions: total,
            is_completed: false,
        }
    }

    #[test]
    fn test_answer_carries_message() {
        let c = IntentClassification::new(Intent::AnswerQuestion, 0.9, None);
        assert_eq!(
            resolve(&c, "Great tool", &context(3)),
            Directive::Perform(SessionAction::Answer {
                text: "Great tool".to_string(),
                target: None
            })
        );
    }

    #[test]
    fn test_navigation_converts_to_zero_based() {
        let nav = IntentClassification::new(Intent::NavigateToQuestion, 0.9, Some(3));
        assert_eq!(
            resolve(&nav, "go to question 3", &context(3)),
            Directive::Perform(SessionAction::Navigate { target: 2 })
        );

        let revise = IntentClassification::new(Intent::ReviseAnswer, 0.9, Some(1));
        assert_eq!(
            resolve(&revise, "revise question 1", &context(3)),
            Directive::Perform(SessionAction::Navigate { target: 0 })
        );
    }

    #[test]
    fn test_out_of_range_number_reprompts() {
        for number in [Some(0), Some(4), Some(-2), None] {
            let nav = IntentClassification::new(Intent::NavigateToQuestion, 0.9, number);
            assert_eq!(
                resolve(&nav, "go", &context(3)),
                Directive::Reprompt(Reprompt::InvalidQuestionNumber { total: 3 })
            );
        }
    }

    #[test]
    fn test_simple_intents() {
        let skip = IntentClassification::new(Intent::SkipQuestion, 0.9, None);
        assert_eq!(resolve(&skip, "skip", &context(3)), Directive::Perform(SessionAction::Skip));

        let submit = IntentClassification::new(Intent::SubmitSurvey, 0.9, None);
        assert_eq!(
            resolve(&submit, "submit", &context(3)),
            Directive::Perform(SessionAction::Submit)
        );

        let help = IntentClassification::new(Intent::ShowHelp, 0.9, None);
        assert_eq!(resolve(&help, "help", &context(3)), Directive::Help);

        assert_eq!(
            resolve(&IntentClassification::unknown(), "???", &context(3)),
            Directive::Reprompt(Reprompt::Unrecognized)
        );
    }

    #[test]
    fn test_reprompt_messages() {
        assert_eq!(
            Reprompt::InvalidQuestionNumber { total: 5 }.to_string(),
            "Invalid question number. Choose between 1 and 5."
        );
        assert_eq!(help_entries().len(), 6);
    }
}
