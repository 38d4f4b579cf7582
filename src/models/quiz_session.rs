//! Quiz session: card ordering and linear progress through one run of cards.
//! A session owns its prepared sequence and cursor; the play screen owns the session.

use super::Card;
use rand::Rng;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum QuizMode {
    #[default]
    Random,
    Ordered,
}

impl QuizMode {
    pub fn label(&self) -> &'static str {
        match self {
            QuizMode::Random => "Random",
            QuizMode::Ordered => "In order",
        }
    }
}

impl fmt::Display for QuizMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuizMode::Random => write!(f, "random"),
            QuizMode::Ordered => write!(f, "ordered"),
        }
    }
}

impl FromStr for QuizMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "random" => Ok(QuizMode::Random),
            "ordered" => Ok(QuizMode::Ordered),
            other => Err(format!("unknown quiz mode '{}'", other)),
        }
    }
}

/// Returns a uniformly random permutation of `items` (Fisher–Yates), leaving `items` untouched.
pub fn shuffle<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut out = items.to_vec();
    for i in (1..out.len()).rev() {
        let j = rng.gen_range(0..=i);
        out.swap(i, j);
    }
    out
}

/// Orders cards for a run. `Ordered` keeps the order the store returned them in.
pub fn prepare_sequence<R: Rng + ?Sized>(cards: &[Card], mode: QuizMode, rng: &mut R) -> Vec<Card> {
    match mode {
        QuizMode::Ordered => cards.to_vec(),
        QuizMode::Random => shuffle(cards, rng),
    }
}

/// Outcome of one submitted answer, to be stored as an attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verdict {
    pub card_id: String,
    pub is_correct: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QuizState {
    AwaitingAnswer,
    ShowingResult(Verdict),
    Exhausted,
}

pub struct QuizSession {
    all_cards: Vec<Card>,
    sequence: Vec<Card>,
    mode: QuizMode,
    cursor: usize,
    state: QuizState,
}

impl QuizSession {
    pub fn new(cards: Vec<Card>, mode: QuizMode) -> Self {
        Self::with_rng(cards, mode, &mut rand::thread_rng())
    }

    pub fn with_rng<R: Rng + ?Sized>(cards: Vec<Card>, mode: QuizMode, rng: &mut R) -> Self {
        let sequence = prepare_sequence(&cards, mode, rng);
        let state = initial_state(&sequence);
        Self {
            all_cards: cards,
            sequence,
            mode,
            cursor: 0,
            state,
        }
    }

    pub fn mode(&self) -> QuizMode {
        self.mode
    }

    pub fn state(&self) -> &QuizState {
        &self.state
    }

    pub fn current_card(&self) -> Option<&Card> {
        match self.state {
            QuizState::Exhausted => None,
            _ => self.sequence.get(self.cursor),
        }
    }

    /// Last verdict, available until the session advances.
    pub fn verdict(&self) -> Option<&Verdict> {
        match &self.state {
            QuizState::ShowingResult(verdict) => Some(verdict),
            _ => None,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == QuizState::Exhausted
    }

    /// One-based position of the current card.
    pub fn position(&self) -> usize {
        (self.cursor + 1).min(self.sequence.len())
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Blank answers are not checked.
    pub fn can_submit(&self, answer: &str) -> bool {
        self.state == QuizState::AwaitingAnswer && !answer.trim().is_empty()
    }

    /// Checks `answer` against the current card.
    ///
    /// Returns `None` when no answer is expected (result already shown or session exhausted).
    pub fn submit_answer(&mut self, answer: &str) -> Option<Verdict> {
        if self.state != QuizState::AwaitingAnswer {
            return None;
        }
        let card = self.sequence.get(self.cursor)?;

        let verdict = Verdict {
            card_id: card.id.clone(),
            is_correct: card.accepts(answer),
        };
        self.state = QuizState::ShowingResult(verdict.clone());
        Some(verdict)
    }

    pub fn advance(&mut self) {
        if self.state == QuizState::Exhausted {
            return;
        }

        self.cursor += 1;
        self.state = if self.cursor >= self.sequence.len() {
            QuizState::Exhausted
        } else {
            QuizState::AwaitingAnswer
        };
    }

    /// Switching mode throws away progress and re-prepares the full card set.
    pub fn set_mode(&mut self, mode: QuizMode) {
        self.set_mode_with_rng(mode, &mut rand::thread_rng());
    }

    pub fn set_mode_with_rng<R: Rng + ?Sized>(&mut self, mode: QuizMode, rng: &mut R) {
        self.mode = mode;
        self.sequence = prepare_sequence(&self.all_cards, mode, rng);
        self.cursor = 0;
        self.state = initial_state(&self.sequence);
    }
}

fn initial_state(sequence: &[Card]) -> QuizState {
    if sequence.is_empty() {
        QuizState::Exhausted
    } else {
        QuizState::AwaitingAnswer
    }
}
