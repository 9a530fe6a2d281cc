//! Home page sections the guide can walk through

/// One section of the home page
#[derive(Debug, Clone, Copy)]
pub struct Slide {
    /// Element id the host scrolls to
    pub id: &'static str,
    /// Spoken when the section is shown
    pub summary: &'static str,
}

pub const HOME_SLIDES: &[Slide] = &[
    Slide {
        id: "hero-section",
        summary: "Hero slide \u{2013} high-level overview of Bingo AI Agents and how they help decode game behavior.",
    },
    Slide {
        id: "how-it-works",
        summary: "How it works \u{2013} explains how AI agents watch, react, and report on monetization and journeys.",
    },
    Slide {
        id: "results-section",
        summary: "Results slide \u{2013} highlights outcomes like better monetization, lower churn, and faster insights.",
    },
];

/// Look up a slide, clamping the index into the deck
pub fn clamped(index: usize) -> (usize, &'static Slide) {
    let index = index.min(HOME_SLIDES.len() - 1);
    (index, &HOME_SLIDES[index])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamped() {
        assert_eq!(clamped(0).1.id, "hero-section");
        let (index, slide) = clamped(99);
        assert_eq!(index, 2);
        assert_eq!(slide.id, "results-section");
    }
}
