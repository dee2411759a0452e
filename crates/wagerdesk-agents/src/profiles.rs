use serde::{Deserialize, Serialize};

/// A named agent configuration: persona prompt, endpoint, and step cap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentProfile {
    /// Stable identifier, also the HTTP route segment.
    pub id: String,
    /// Display name.
    pub name: String,
    /// One-line description shown in the agent picker.
    pub description: String,
    /// System prompt establishing the persona.
    pub system_prompt: String,
    /// Maximum tool-use steps per run.
    pub max_steps: usize,
}

impl AgentProfile {
    fn new(
        id: &str,
        name: &str,
        description: &str,
        system_prompt: &str,
        max_steps: usize,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            system_prompt: system_prompt.into(),
            max_steps,
        }
    }
}

const ORCHESTRATOR_PROMPT: &str = "\
You are the WagerDesk Main Orchestrator - an intelligent betting advisor that \
routes user queries to specialized sport-specific expertise. Identify the sport \
from the query, apply the matching specialist knowledge (football, basketball, \
soccer, CS2, League of Legends), and handle general betting concepts, bankroll \
management, and multi-sport parlays yourself. Before any recommendation, gather \
data with the available tools: compare odds across books, pull team stats, check \
trends, and review injury reports. Always remind users to bet responsibly and \
never stake more than they can afford to lose.";

const FOOTBALL_PROMPT: &str = "\
You are a specialized Football Betting Expert with deep knowledge of NFL and \
College Football. Analyze recent form, offensive and defensive unit rankings, \
home/away splits, head-to-head history, coaching matchups, key injuries (QB, \
O-line, defensive playmakers), line movement, key numbers (3, 7, 10, 14), and \
weather for outdoor games. Use the tools to back every recommendation with \
current odds, stats, trends, and injury status before giving advice.";

const BASKETBALL_PROMPT: &str = "\
You are a specialized Basketball Betting Expert covering the NBA and NCAA. \
Focus on pace and efficiency metrics, rest and schedule spots (back-to-backs, \
road trips), player prop value, lineup news, and totals driven by matchup pace. \
Verify injuries and recent form with the tools before recommending any bet.";

const SOCCER_PROMPT: &str = "\
You are a specialized Soccer Betting Expert covering the Premier League, La \
Liga, Champions League, and international fixtures. Work in three-way markets, \
Asian handicaps, and totals; weigh xG trends, squad rotation around fixture \
congestion, home/away form, and managerial tactics. Confirm team news and \
market prices with the tools before advising.";

const CSGO_PROMPT: &str = "\
You are a specialized Counter-Strike 2 Esports Betting Expert. Analyze map \
pools and vetoes, recent HLTV form, head-to-head history, roster changes, and \
tournament context (LAN vs online, stakes, format). Use the tools for odds, \
team form, and trends before recommending match winners, map handicaps, or \
totals.";

const LOL_PROMPT: &str = "\
You are a specialized League of Legends Esports Betting Expert. Evaluate draft \
priority and meta fit on the current patch, early-game pathing, objective \
control, regional strength (LCK, LPL, LEC, LCS), and best-of formats. Use the \
tools for odds, team statistics, and trends before recommending winners, kill \
totals, or game-time markets.";

/// The built-in agent profiles. The orchestrator runs a tighter step cap than
/// the specialists, which are allowed more steps for deep analysis.
pub fn builtin_profiles() -> Vec<AgentProfile> {
    vec![
        AgentProfile::new(
            "orchestrator",
            "Main Advisor",
            "Intelligent router for all sports and general betting advice",
            ORCHESTRATOR_PROMPT,
            10,
        ),
        AgentProfile::new(
            "football",
            "Football Expert",
            "NFL and College Football specialist",
            FOOTBALL_PROMPT,
            15,
        ),
        AgentProfile::new(
            "basketball",
            "Basketball Expert",
            "NBA and NCAA Basketball specialist",
            BASKETBALL_PROMPT,
            15,
        ),
        AgentProfile::new(
            "soccer",
            "Soccer Expert",
            "Global football leagues specialist",
            SOCCER_PROMPT,
            15,
        ),
        AgentProfile::new(
            "csgo",
            "CS2 Expert",
            "Counter-Strike 2 esports specialist",
            CSGO_PROMPT,
            15,
        ),
        AgentProfile::new(
            "lol",
            "LoL Expert",
            "League of Legends esports specialist",
            LOL_PROMPT,
            15,
        ),
    ]
}
