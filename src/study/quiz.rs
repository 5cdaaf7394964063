//! Quiz runner — one pass through a quiz payload, one scored attempt per
//! question.
//!
//! Transitions: `select_option` reveals the current question, `advance`
//! moves on (or finishes after the last question), `restart` starts over.
//! Calls that are not valid in the current state are ignored and return
//! `false`.

use serde::Serialize;
use tracing::debug;

use super::model::QuizQuestion;

/// Progress through the current quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct QuizRunState {
    pub index: usize,
    pub score: usize,
    pub selected_option: Option<usize>,
    pub revealed: bool,
    pub finished: bool,
}

/// How one option should be shown once the answer is revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionMark {
    /// Not revealed yet, or neither correct nor picked.
    Neutral,
    Correct,
    /// Picked by the user but wrong.
    Incorrect,
}

#[derive(Debug, Clone, Default)]
pub struct QuizRunner {
    questions: Vec<QuizQuestion>,
    state: QuizRunState,
}

impl QuizRunner {
    pub fn new(questions: Vec<QuizQuestion>) -> Self {
        Self {
            questions,
            state: QuizRunState::default(),
        }
    }

    /// Swap in a new payload. The run starts over.
    pub fn replace_questions(&mut self, questions: Vec<QuizQuestion>) {
        self.questions = questions;
        self.state = QuizRunState::default();
    }

    pub fn state(&self) -> QuizRunState {
        self.state
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// An empty quiz has nothing to show and accepts no transitions.
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn current(&self) -> Option<&QuizQuestion> {
        if self.state.finished {
            return None;
        }
        self.questions.get(self.state.index)
    }

    pub fn is_last_question(&self) -> bool {
        self.state.index + 1 == self.questions.len()
    }

    /// Answer the current question. Ignored once the answer is revealed.
    pub fn select_option(&mut self, option: usize) -> bool {
        if self.state.revealed || self.state.finished {
            return false;
        }
        let Some(question) = self.questions.get(self.state.index) else {
            return false;
        };
        if option >= question.options.len() {
            return false;
        }

        let correct = option == question.correct_index;
        self.state.selected_option = Some(option);
        self.state.revealed = true;
        if correct {
            self.state.score += 1;
        }

        debug!(
            index = self.state.index,
            option,
            correct,
            score = self.state.score,
            "Quiz option selected"
        );
        true
    }

    /// Move past a revealed question.
    pub fn advance(&mut self) -> bool {
        if !self.state.revealed || self.state.finished {
            return false;
        }
        if self.state.index + 1 < self.questions.len() {
            self.state.index += 1;
            self.state.selected_option = None;
            self.state.revealed = false;
        } else {
            self.state.finished = true;
            debug!(
                score = self.state.score,
                total = self.questions.len(),
                "Quiz finished"
            );
        }
        true
    }

    /// Back to the first question with a zero score.
    pub fn restart(&mut self) {
        self.state = QuizRunState::default();
    }

    /// Questions answered so far, including a revealed current one.
    pub fn answered(&self) -> usize {
        self.state.index + usize::from(self.state.revealed)
    }

    /// Fraction of answered questions that were correct, 0 before any answer.
    pub fn accuracy(&self) -> f64 {
        match self.answered() {
            0 => 0.0,
            answered => self.state.score as f64 / answered as f64,
        }
    }

    /// Position of the current question as a fraction of the quiz, for the
    /// progress bar.
    pub fn progress(&self) -> f64 {
        if self.questions.is_empty() {
            return 0.0;
        }
        (self.state.index + 1) as f64 / self.questions.len() as f64
    }

    /// Final score as a whole percentage, once the quiz is finished.
    pub fn mastery_percent(&self) -> Option<u32> {
        if !self.state.finished || self.questions.is_empty() {
            return None;
        }
        let ratio = self.state.score as f64 / self.questions.len() as f64;
        Some((ratio * 100.0).round() as u32)
    }

    /// How option `option` of the current question should be marked.
    pub fn option_mark(&self, option: usize) -> OptionMark {
        let Some(question) = self.current() else {
            return OptionMark::Neutral;
        };
        if !self.state.revealed {
            return OptionMark::Neutral;
        }
        if option == question.correct_index {
            OptionMark::Correct
        } else if Some(option) == self.state.selected_option {
            OptionMark::Incorrect
        } else {
            OptionMark::Neutral
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(correct_index: usize) -> QuizQuestion {
        QuizQuestion {
            question: format!("Q (answer {correct_index})"),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_index,
        }
    }

    fn runner(answers: &[usize]) -> QuizRunner {
        QuizRunner::new(answers.iter().copied().map(question).collect())
    }

    fn assert_invariant(r: &QuizRunner) {
        let s = r.state();
        assert!(s.score <= r.answered());
        assert!(r.answered() <= r.len());
    }

    #[test]
    fn initial_state() {
        let r = runner(&[0, 1]);
        assert_eq!(r.state(), QuizRunState::default());
        assert_eq!(r.accuracy(), 0.0);
        assert_eq!(r.mastery_percent(), None);
    }

    #[test]
    fn n_cycles_finish_for_every_size() {
        for n in 1..=8 {
            let answers: Vec<usize> = (0..n).map(|i| i % 4).collect();
            let mut r = runner(&answers);
            for i in 0..n {
                assert!(r.select_option((i * 3) % 4));
                assert_invariant(&r);
                assert!(r.advance());
                assert_invariant(&r);
            }
            assert!(r.state().finished);
            assert!(r.state().score <= n);
        }
    }

    #[test]
    fn second_selection_is_ignored() {
        let mut r = runner(&[2]);
        assert!(r.select_option(2));
        assert_eq!(r.state().score, 1);
        assert!(!r.select_option(2));
        assert!(!r.select_option(0));
        assert_eq!(r.state().score, 1);
        assert_eq!(r.state().selected_option, Some(2));
    }

    #[test]
    fn advance_requires_reveal() {
        let mut r = runner(&[0, 0]);
        assert!(!r.advance());
        assert_eq!(r.state().index, 0);
    }

    #[test]
    fn out_of_range_option_is_ignored() {
        let mut r = runner(&[0]);
        assert!(!r.select_option(4));
        assert!(!r.state().revealed);
    }

    #[test]
    fn three_question_scenario() {
        let mut r = runner(&[1, 2, 3]);
        r.select_option(1);
        r.advance();
        r.select_option(0);
        assert!((r.accuracy() - 0.5).abs() < f64::EPSILON);
        r.advance();
        assert!(r.is_last_question());
        r.select_option(3);
        r.advance();

        let s = r.state();
        assert_eq!(s.score, 2);
        assert!(s.finished);
        assert_eq!(r.mastery_percent(), Some(67));
        assert!(r.current().is_none());
    }

    #[test]
    fn restart_resets_everything() {
        let mut r = runner(&[0]);
        r.select_option(0);
        r.advance();
        assert!(r.state().finished);
        r.restart();
        assert_eq!(r.state(), QuizRunState::default());
        assert!(r.current().is_some());
    }

    #[test]
    fn replacing_payload_resets_run() {
        let mut r = runner(&[0, 1]);
        r.select_option(0);
        r.advance();
        r.replace_questions(vec![question(3)]);
        assert_eq!(r.state(), QuizRunState::default());
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn empty_quiz_accepts_no_transitions() {
        let mut r = QuizRunner::new(vec![]);
        assert!(r.is_empty());
        assert!(!r.select_option(0));
        assert!(!r.advance());
        assert!(r.current().is_none());
        assert_eq!(r.progress(), 0.0);
        assert_eq!(r.state(), QuizRunState::default());
    }

    #[test]
    fn option_marks_after_reveal() {
        let mut r = runner(&[1]);
        assert_eq!(r.option_mark(1), OptionMark::Neutral);
        r.select_option(3);
        assert_eq!(r.option_mark(1), OptionMark::Correct);
        assert_eq!(r.option_mark(3), OptionMark::Incorrect);
        assert_eq!(r.option_mark(0), OptionMark::Neutral);
    }
}
