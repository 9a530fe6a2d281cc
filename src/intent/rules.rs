//! Ordered keyword tables
//!
//! Rules within a table are not mutually exclusive; the first rule whose
//! pattern matches wins, so the declared order is part of the behaviour.
//! Bump `RULES_VERSION` whenever a table is reordered or a rule changes.

/// Version of the rule tables below
pub const RULES_VERSION: u32 = 1;

/// Substring pattern over lowercased text
#[derive(Debug, Clone, Copy)]
pub enum Pattern {
    /// At least one keyword is present
    Any(&'static [&'static str]),
    /// Every sub-pattern matches
    All(&'static [Pattern]),
    /// The keyword is present and the excluded word is not
    Without(&'static str, &'static str),
}

impl Pattern {
    pub fn matches(&self, lower: &str) -> bool {
        match self {
            Pattern::Any(keywords) => keywords.iter().any(|keyword| lower.contains(keyword)),
            Pattern::All(patterns) => patterns.iter().all(|pattern| pattern.matches(lower)),
            Pattern::Without(keyword, excluded) => {
                lower.contains(keyword) && !lower.contains(excluded)
            }
        }
    }
}

/// A fixed reply selected by a pattern
#[derive(Debug, Clone, Copy)]
pub struct AnswerRule {
    pub name: &'static str,
    pub pattern: Pattern,
    pub answer: &'static str,
}

/// Return the first rule in `table` that matches
pub fn first_match<'a>(table: &'a [AnswerRule], lower: &str) -> Option<&'a AnswerRule> {
    table.iter().find(|rule| rule.pattern.matches(lower))
}

// Control words, checked in this order before any table

pub const SILENCE: Pattern = Pattern::Any(&["stop", "pause", "quiet", "silence"]);
pub const CLEAR_MEMORY: Pattern = Pattern::Any(&["clear", "reset", "new conversation"]);
pub const NEXT_SLIDE: Pattern = Pattern::Any(&["next"]);
pub const PREVIOUS_SLIDE: Pattern = Pattern::Any(&["previous", "back"]);
pub const FIRST_SLIDE: Pattern = Pattern::Any(&["home", "start"]);

/// Topics that route to the FAQ fallback when nothing more specific matched
pub const BROAD_TOPICS: Pattern = Pattern::Any(&[
    "agent",
    "monetization",
    "journey",
    "competitor",
    "why",
    "help us",
    "main idea",
]);

pub const PAUSED_REPLY: &str =
    "Paused. Ask me anything else or say \"guide me\" to navigate the website!";

pub const CLEARED_REPLY: &str = "Conversation cleared. What would you like to know?";

/// How to move around the site
pub const NAVIGATION_HELP: &[AnswerRule] = &[
    AnswerRule {
        name: "guide_me",
        pattern: Pattern::Any(&["guide me", "show me around", "how do i navigate"]),
        answer: "The website has four main tabs in the header: HOME shows the overview, AI AGENTS lets you explore 5 different player segments, GAMES shows 6 competitor games with live dashboards, and CASE STUDY has examples. Click any tab to explore, or ask me about specific features!",
    },
    AnswerRule {
        name: "go_to_agents",
        pattern: Pattern::All(&[
            Pattern::Any(&["go to"]),
            Pattern::Any(&["agent", "segments"]),
        ]),
        answer: "Click the AI agents tab in the top header. You will see 5 agent cards representing different player types like Veteran Spender and New Whale. Click any agent to see their complete journey through the game!",
    },
    AnswerRule {
        name: "go_to_games",
        pattern: Pattern::All(&[Pattern::Any(&["go to"]), Pattern::Any(&["game"])]),
        answer: "Click the Games tab in the header to see 6 competitor games we have decoded. Click any game tile like Coin Master to see its live analytics dashboard with DAU, playtime, and active users chart!",
    },
    AnswerRule {
        name: "show_insights",
        pattern: Pattern::All(&[
            Pattern::Any(&["show"]),
            Pattern::Any(&["insight", "monetize"]),
        ]),
        answer: "To see insights, first click AI agents tab, then select any agent card. After the loading and lobby screens, click View final insights. You will see two tabs: INSIGHTS shows gate progression and strategies, MONETIZE shows analytics charts and price points!",
    },
    AnswerRule {
        name: "how_to_navigate",
        pattern: Pattern::All(&[
            Pattern::Any(&["how"]),
            Pattern::Any(&["work", "navigate", "use"]),
        ]),
        answer: "Start on HOME to see what AI agents do. Click AI AGENTS to explore 5 player segments and their journeys. Click GAMES to see 6 competitor games and their live dashboards. Each agent has detailed insights with tabs for regular insights and monetization data!",
    },
];

/// Product questions
pub const FAQ: &[AnswerRule] = &[
    AnswerRule {
        name: "platform_overview",
        pattern: Pattern::Any(&["what does this platform", "what is this"]),
        answer: "This platform uses AI player agents to play competitor games, decode their strategies, and show you how each game treats different player segments. It reveals monetization patterns, retention mechanics, event strategies, and FTUE design that would take months to discover manually.",
    },
    AnswerRule {
        name: "agent_definition",
        pattern: Pattern::All(&[Pattern::Any(&["what are ai"]), Pattern::Any(&["agent"])]),
        answer: "AI player agents are behavioral models trained on real cohort data that act like human players. They explore games and respond to offers and events naturally. Whales behave like whales, casuals like casuals, feature-lovers like feature players.",
    },
    AnswerRule {
        name: "agent_training",
        pattern: Pattern::Any(&["how do agents learn", "how are they trained"]),
        answer: "Agents are trained from real user data: session habits, spending patterns, churn signals, event participation, time spent, risk appetite, loss tolerance, purchase frequency, and more. Each agent literally plays like a real person from that segment.",
    },
    AnswerRule {
        name: "custom_segments",
        pattern: Pattern::All(&[Pattern::Any(&["custom"]), Pattern::Any(&["segment"])]),
        answer: "Yes, any behavioral cohort or LTV segment can be modeled. You can create agents for any player type you want to analyze.",
    },
    AnswerRule {
        name: "detection",
        pattern: Pattern::All(&[Pattern::Any(&["what can"]), Pattern::Any(&["detect"])]),
        answer: "The AI detects FOMO triggers, monetization funnels, FTUE paths, retention hooks, event cycles, gating moments, win-rate manipulation, offer sequencing, resource scarcity timing, and more. Everything competitors do to drive engagement and revenue.",
    },
    AnswerRule {
        name: "multi_game",
        pattern: Pattern::All(&[Pattern::Any(&["compare"]), Pattern::Any(&["games"])]),
        answer: "Yes, it has already reverse-engineered six competitor games end-to-end and can compare their strategies side by side.",
    },
    AnswerRule {
        name: "integration",
        pattern: Pattern::Any(&["sdk", "integration", "code"]),
        answer: "No SDK or engineering work needed. Zero code changes. Just point AI agents at the game and they start playing and collecting insights.",
    },
    AnswerRule {
        name: "monetization",
        pattern: Pattern::Any(&["monetization", "arpdau"]),
        answer: "It reveals pricing strategies, offer sequencing, resource scarcity timing, and high-value tactics used by competitors. By transferring proven monetization loops, studios typically see ARPDAU gains of 20 to 30 percent.",
    },
    AnswerRule {
        name: "pm_replacement",
        pattern: Pattern::All(&[Pattern::Any(&["replace"]), Pattern::Any(&["pm", "analyst"])]),
        answer: "No, it does not replace PMs or analysts. It gives them insights ten times faster while cutting their workload by 60 percent, so they can focus on strategy instead of manual testing.",
    },
    AnswerRule {
        name: "ftue",
        pattern: Pattern::Any(&["ftue", "onboarding"]),
        answer: "Yes, agents identify friction points, early resource shortages, win-rate pacing, tutorial issues, and player drop-off moments in the first-time user experience.",
    },
    AnswerRule {
        name: "events",
        pattern: Pattern::Without("event", "prevent"),
        answer: "Yes, agents participate in and decode event engagement, rewards, pressure loops, personalization triggers, and event monetization funnels.",
    },
    AnswerRule {
        name: "data_exports",
        pattern: Pattern::Any(&["what data", "what do we get"]),
        answer: "You get player-agent logs, session journeys, event triggers, offer sequences, reward pacing, churn indicators, and PM logic maps. Real-time dashboards, Excel exports, GIFs, storyboards, and session replays.",
    },
    AnswerRule {
        name: "speed",
        pattern: Pattern::Any(&["how quickly", "how fast"]),
        answer: "Results appear within hours, not weeks. The AI is ten times faster than humans with 20 to 30 times more data coverage.",
    },
    AnswerRule {
        name: "cost",
        pattern: Pattern::Any(&["cost", "save"]),
        answer: "This platform saves 30 to 60 percent of analytics and PM research time, giving you insights ten times faster with far more coverage.",
    },
    AnswerRule {
        name: "value_proposition",
        pattern: Pattern::Any(&["why", "useful"]),
        answer: "Because product managers spend weeks manually playing and reverse-engineering competitors. Our AI does it in hours. You get faster insights, better events, optimized monetization, and massive cost reduction.",
    },
    AnswerRule {
        name: "summary",
        pattern: Pattern::Any(&["main idea", "summary"]),
        answer: "AI agents that decode competitors, mimic your players, and deliver actionable game insights ten times faster. It is a competitive intelligence and game design acceleration system purpose built for gaming studios.",
    },
];

/// Reply when a broad topic matched but no specific FAQ entry did
pub const FAQ_FALLBACK: &str = "Ask me about AI agents, monetization, player journeys, competitors, or why we built this. You can also say \u{201c}next slide\u{201d} or \u{201c}go home\u{201d} and I will walk you through the story.";
