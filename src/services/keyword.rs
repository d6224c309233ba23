// src/services/keyword.rs

use async_trait::async_trait;
use regex::Regex;

use crate::{
    models::intent::{Intent, IntentClassification, IntentContext},
    services::{IntentClassifier, Outcome},
};

/// Offline intent classifier built on command phrases.
///
/// Recognises the commands listed in the help panel ("skip", "submit",
/// "go to question 3", "revise question 2", "help"). Any other non-empty
/// message is taken as an answer to the current question.
pub struct KeywordClassifier {
    help: Regex,
    skip: Regex,
    submit: Regex,
    revise: Regex,
    navigate: Regex,
}

impl KeywordClassifier {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            help: Regex::new(r"^(help|\?|show (me )?(the )?commands|what can i (do|say))[.!?]*$")?,
            skip: Regex::new(r"^(skip( (this|it|question))?|next( question)?|pass)[.!]*$")?,
            submit: Regex::new(r"^(submit|finish|done|i'?m done)( (the )?survey)?[.!]*$")?,
            revise: Regex::new(r"^(revise|edit|change|redo)( my answer (to|for))?( question)? #?(\d+)[.!]*$")?,
            navigate: Regex::new(r"^((go|jump|take me) (back )?to |show )?question #?(\d+)[.!]*$")?,
        })
    }

    /// Pure classification, no I/O.
    pub fn classify(&self, message: &str) -> IntentClassification {
        let text = message.trim().to_lowercase();

        if text.is_empty() {
            return IntentClassification::unknown();
        }
        if self.help.is_match(&text) {
            return IntentClassification::new(Intent::ShowHelp, 0.9, None);
        }
        if self.skip.is_match(&text) {
            return IntentClassification::new(Intent::SkipQuestion, 0.9, None);
        }
        if self.submit.is_match(&text) {
            return IntentClassification::new(Intent::SubmitSurvey, 0.9, None);
        }
        if let Some(caps) = self.revise.captures(&text) {
            let number = caps.get(5).and_then(|m| m.as_str().parse::<i64>().ok());
            return IntentClassification::new(Intent::ReviseAnswer, 0.85, number);
        }
        if let Some(caps) = self.navigate.captures(&text) {
            let number = caps.get(4).and_then(|m| m.as_str().parse::<i64>().ok());
            return IntentClassification::new(Intent::NavigateToQuestion, 0.85, number);
        }

        IntentClassification::new(Intent::AnswerQuestion, 0.6, None)
    }
}

#[async_trait]
impl IntentClassifier for KeywordClassifier {
    async fn classify_intent(
        &self,
        message: &str,
        _context: &IntentContext,
    ) -> Outcome<IntentClassification> {
        Outcome::Available(self.classify(message))
    }
}
