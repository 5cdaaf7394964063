//! Flashcard carousel — cyclic navigation over a deck with a position-based
//! color palette.

use std::fmt;

use super::model::Flashcard;

/// Card color schemes, cycled by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Palette {
    Blue,
    Violet,
    Emerald,
    Amber,
}

impl Palette {
    pub const ALL: [Palette; 4] = [Self::Blue, Self::Violet, Self::Emerald, Self::Amber];

    /// Scheme for the card at `index`.
    pub fn for_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }

    /// ANSI foreground color used by the terminal host.
    pub fn ansi_code(&self) -> u8 {
        match self {
            Self::Blue => 34,
            Self::Violet => 35,
            Self::Emerald => 32,
            Self::Amber => 33,
        }
    }
}

impl fmt::Display for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blue => write!(f, "blue"),
            Self::Violet => write!(f, "violet"),
            Self::Emerald => write!(f, "emerald"),
            Self::Amber => write!(f, "amber"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FlashcardCarousel {
    cards: Vec<Flashcard>,
    index: usize,
}

impl FlashcardCarousel {
    pub fn new(cards: Vec<Flashcard>) -> Self {
        Self { cards, index: 0 }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> Option<&Flashcard> {
        self.cards.get(self.index)
    }

    pub fn next(&mut self) {
        if !self.cards.is_empty() {
            self.index = (self.index + 1) % self.cards.len();
        }
    }

    pub fn prev(&mut self) {
        if !self.cards.is_empty() {
            self.index = (self.index + self.cards.len() - 1) % self.cards.len();
        }
    }

    pub fn palette(&self) -> Palette {
        Palette::for_index(self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deck(n: usize) -> FlashcardCarousel {
        FlashcardCarousel::new(
            (0..n)
                .map(|i| Flashcard {
                    title: format!("Card {i}"),
                    description: format!("Body {i}"),
                })
                .collect(),
        )
    }

    #[test]
    fn next_n_times_returns_to_start() {
        for n in 1..=9 {
            for start in 0..n {
                let mut c = deck(n);
                for _ in 0..start {
                    c.next();
                }
                assert_eq!(c.index(), start);
                for _ in 0..n {
                    c.next();
                }
                assert_eq!(c.index(), start, "n={n} start={start}");
            }
        }
    }

    #[test]
    fn prev_wraps_to_last() {
        let mut c = deck(3);
        c.prev();
        assert_eq!(c.index(), 2);
        assert_eq!(c.current().unwrap().title, "Card 2");
        c.next();
        assert_eq!(c.index(), 0);
    }

    #[test]
    fn empty_deck_is_inert() {
        let mut c = deck(0);
        c.next();
        c.prev();
        assert_eq!(c.index(), 0);
        assert!(c.current().is_none());
    }

    #[test]
    fn palette_follows_position_only() {
        let mut a = deck(6);
        let mut b = deck(6);
        let mut seq_a = vec![];
        let mut seq_b = vec![];
        for _ in 0..6 {
            seq_a.push(a.palette());
            seq_b.push(b.palette());
            a.next();
            b.next();
        }
        assert_eq!(seq_a, seq_b);
        assert_eq!(
            seq_a,
            [
                Palette::Blue,
                Palette::Violet,
                Palette::Emerald,
                Palette::Amber,
                Palette::Blue,
                Palette::Violet
            ]
        );
    }
}
