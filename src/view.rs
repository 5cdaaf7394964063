//! Host view state. Owned by the host and passed to whatever needs it,
//! instead of living in globals.

use serde::{Deserialize, Serialize};

use crate::study::model::ArtifactKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    /// Study tab currently shown.
    pub active_tab: ArtifactKind,
    pub theme: Theme,
    pub sidebar_collapsed: bool,
    /// Whether the study view is open at all.
    pub study_open: bool,
}

impl ViewState {
    /// Switch study tab. Returns `true` when the tab actually changed.
    pub fn select_tab(&mut self, tab: ArtifactKind) -> bool {
        let changed = self.active_tab != tab;
        self.active_tab = tab;
        changed
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.theme
    }

    pub fn toggle_sidebar(&mut self) -> bool {
        self.sidebar_collapsed = !self.sidebar_collapsed;
        self.sidebar_collapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_flashcards_dark() {
        let view = ViewState::default();
        assert_eq!(view.active_tab, ArtifactKind::Flashcards);
        assert_eq!(view.theme, Theme::Dark);
        assert!(!view.study_open);
    }

    #[test]
    fn select_tab_reports_change() {
        let mut view = ViewState::default();
        assert!(view.select_tab(ArtifactKind::Quiz));
        assert!(!view.select_tab(ArtifactKind::Quiz));
    }

    #[test]
    fn toggles() {
        let mut view = ViewState::default();
        assert_eq!(view.toggle_theme(), Theme::Light);
        assert_eq!(view.toggle_theme(), Theme::Dark);
        assert!(view.toggle_sidebar());
    }
}
