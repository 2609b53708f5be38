// Benny Toon, the calculator mascot

use crate::solve::{ResultKind, SolveResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mood {
    Idle,
    Thinking,
    Happy,
    Excited,
    Puzzled,
}

impl Mood {
    /// Mood for the current state of the calculator.
    pub fn for_state(processing: bool, active: Option<&SolveResult>) -> Self {
        if processing {
            return Mood::Thinking;
        }
        match active {
            None => Mood::Idle,
            Some(result) if result.kind() == ResultKind::Chat => Mood::Puzzled,
            Some(result) if result.plot_points().is_some() => Mood::Excited,
            Some(_) => Mood::Happy,
        }
    }

    /// Face as four lines of text. `frame` animates the thinking hand.
    pub fn face(&self, frame: usize) -> [&'static str; 4] {
        let mouth = match self {
            Mood::Idle => "( \u{2022} \u{203F} \u{2022} )",
            Mood::Happy => "( ^ \u{203F} ^ )",
            Mood::Excited => "( \u{2605} \u{25BD} \u{2605} )",
            Mood::Puzzled => "( \u{2022} _ \u{2022} )",
            Mood::Thinking => {
                if (frame / 20) % 2 == 0 {
                    "( \u{2022} ~ \u{2022} )/"
                } else {
                    "( \u{2022} ~ \u{2022} )\\"
                }
            }
        };
        ["  .-----.  ", "  |     |  ", mouth, "   \u{25B6}\u{25C0}   "]
    }

    pub fn caption(&self) -> &'static str {
        match self {
            Mood::Idle => "Start typing...",
            Mood::Thinking => "Benny is thinking...",
            Mood::Happy => "Got it!",
            Mood::Excited => "Graph available!",
            Mood::Puzzled => "Hmm...",
        }
    }
}
