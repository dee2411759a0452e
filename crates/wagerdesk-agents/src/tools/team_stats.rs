use crate::tool::{optional_str, require_str, unix_timestamp};
use crate::{Tool, ToolDescriptor, ToolError};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

const STATS_TYPES: &[&str] = &[
    "recent_form",
    "season_stats",
    "head_to_head",
    "home_away_splits",
    "advanced_metrics",
    "injury_report",
];

/// Retrieves team or player statistics for betting analysis.
pub struct GetTeamStats;

#[async_trait]
impl Tool for GetTeamStats {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            "getTeamStats",
            "Retrieving Team Stats",
            "Retrieve comprehensive team or player statistics including recent \
             performance, head-to-head records, home/away splits, and advanced metrics.",
        )
        .with_parameters(json!({
            "type": "object",
            "properties": {
                "sport": {
                    "type": "string",
                    "description": "The sport (e.g. 'NFL', 'NBA', 'Soccer', 'CS2', 'LoL')"
                },
                "team": {
                    "type": "string",
                    "description": "Team or player name to get statistics for"
                },
                "statsType": {
                    "type": "string",
                    "enum": STATS_TYPES,
                    "description": "Type of statistics to retrieve"
                },
                "opponent": {
                    "type": "string",
                    "description": "Opponent team name (required for head_to_head)"
                },
                "timeframe": {
                    "type": "string",
                    "description": "Specific timeframe (e.g. 'last_10_games', '2024_season')"
                }
            },
            "required": ["sport", "team", "statsType"]
        }))
    }

    async fn execute(&self, args: Value) -> Result<Value, ToolError> {
        let sport = require_str(&args, "sport")?;
        let team = require_str(&args, "team")?;
        let stats_type = require_str(&args, "statsType")?;
        if !STATS_TYPES.contains(&stats_type.as_str()) {
            return Err(ToolError::InvalidArguments(format!(
                "unknown statsType: {stats_type}"
            )));
        }
        let opponent = optional_str(&args, "opponent");
        let timeframe = optional_str(&args, "timeframe").unwrap_or_else(|| "current_season".into());
        debug!(team = %team, stats_type = %stats_type, "retrieving team stats");

        Ok(json!({
            "sport": sport,
            "team": team,
            "opponent": opponent,
            "statsType": stats_type,
            "timeframe": timeframe,
            "lastUpdated": unix_timestamp(),
            "data": mock_stats(&stats_type, opponent.as_deref()),
        }))
    }
}

fn mock_stats(stats_type: &str, opponent: Option<&str>) -> Value {
    match stats_type {
        "recent_form" => json!({
            "record": "4-1",
            "lastFiveGames": [
                { "result": "W", "opponent": "Team A", "score": "110-105" },
                { "result": "W", "opponent": "Team B", "score": "98-92" },
                { "result": "L", "opponent": "Team C", "score": "88-95" },
                { "result": "W", "opponent": "Team D", "score": "115-108" },
                { "result": "W", "opponent": "Team E", "score": "102-97" }
            ],
            "pointsPerGame": 102.6,
            "pointsAllowed": 99.4,
            "atsRecord": "3-2",
            "overUnderRecord": "2-3",
            "trend": "Hot - winning 4 of last 5"
        }),
        "season_stats" => json!({
            "wins": 28,
            "losses": 15,
            "winPercentage": 0.651,
            "pointsPerGame": 112.3,
            "pointsAllowed": 108.7,
            "offensiveRating": 115.2,
            "defensiveRating": 110.5,
            "pace": 99.8,
            "atsRecord": "25-18",
            "overUnderRecord": "22-21",
            "homeRecord": "16-6",
            "awayRecord": "12-9"
        }),
        "head_to_head" => json!({
            "opponent": opponent.unwrap_or("Opponent"),
            "allTimeRecord": "15-10",
            "recentRecord": "3-2",
            "averagePointDifferential": "+4.2",
            "atsRecordVsOpponent": "3-2"
        }),
        "home_away_splits" => json!({
            "home": { "record": "16-6", "pointsPerGame": 115.8, "pointsAllowed": 106.2, "atsRecord": "14-8" },
            "away": { "record": "12-9", "pointsPerGame": 108.5, "pointsAllowed": 111.4, "atsRecord": "11-10" },
            "note": "Significantly better at home (+7.3 PPG)"
        }),
        "advanced_metrics" => json!({
            "offensiveEfficiency": 115.2,
            "defensiveEfficiency": 110.5,
            "netRating": "+4.7",
            "pace": 99.8,
            "strengthOfSchedule": "12th hardest"
        }),
        // injury_report redirects to the dedicated tool's summary shape
        _ => json!({
            "note": "Use the getInjuryReport tool for the full report",
            "playersListed": 3
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn head_to_head_includes_opponent() {
        let out = GetTeamStats
            .execute(json!({
                "sport": "NBA",
                "team": "Lakers",
                "statsType": "head_to_head",
                "opponent": "Warriors"
            }))
            .await
            .unwrap();
        assert_eq!(out["data"]["opponent"], "Warriors");
        assert_eq!(out["timeframe"], "current_season");
    }

    #[tokio::test]
    async fn unknown_stats_type_is_rejected() {
        let err = GetTeamStats
            .execute(json!({"sport": "NBA", "team": "Lakers", "statsType": "vibes"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
