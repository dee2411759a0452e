use crate::tool::{optional_str, require_str, unix_timestamp};
use crate::{Tool, ToolDescriptor, ToolError};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

/// Compares betting odds across major sportsbooks for a specific bet.
pub struct CompareOdds;

#[async_trait]
impl Tool for CompareOdds {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            "compareOdds",
            "Comparing Odds",
            "Compare betting odds across multiple sportsbooks (DraftKings, FanDuel, \
             BetMGM, etc.) to find the best value for a specific bet.",
        )
        .with_parameters(json!({
            "type": "object",
            "properties": {
                "sport": {
                    "type": "string",
                    "description": "The sport for the bet (e.g. 'NFL', 'NBA', 'Soccer', 'CS2', 'LoL')"
                },
                "betType": {
                    "type": "string",
                    "description": "Type of bet (e.g. 'moneyline', 'spread', 'total', 'player_prop')"
                },
                "event": {
                    "type": "string",
                    "description": "The specific game or match (e.g. 'Chiefs vs. Bills')"
                },
                "selection": {
                    "type": "string",
                    "description": "Specific selection if needed (e.g. 'Chiefs -3', 'Over 215.5')"
                }
            },
            "required": ["sport", "betType", "event"]
        }))
    }

    async fn execute(&self, args: Value) -> Result<Value, ToolError> {
        let sport = require_str(&args, "sport")?;
        let bet_type = require_str(&args, "betType")?;
        let event = require_str(&args, "event")?;
        let selection = optional_str(&args, "selection");
        debug!(event = %event, bet_type = %bet_type, "comparing odds");

        let line = selection.clone().unwrap_or_else(|| "N/A".to_string());
        let odds_data = json!({
            "event": event,
            "betType": bet_type,
            "sport": sport,
            "selection": selection,
            "lastUpdated": unix_timestamp(),
            "sportsbooks": [
                { "name": "DraftKings", "odds": "-110", "line": line, "link": "https://sportsbook.draftkings.com" },
                { "name": "FanDuel", "odds": "-108", "line": line, "link": "https://sportsbook.fanduel.com" },
                { "name": "BetMGM", "odds": "-112", "line": line, "link": "https://sports.betmgm.com" },
                { "name": "Caesars", "odds": "-110", "line": line, "link": "https://www.caesars.com/sportsbook" }
            ],
            "bestOdds": {
                "sportsbook": "FanDuel",
                "odds": "-108",
                "note": "Best value for this bet"
            },
            "analysis": "FanDuel offers the best odds at -108, which provides better value \
                         compared to other sportsbooks. Line shopping can increase your \
                         long-term profitability."
        });

        Ok(json!({
            "oddsData": odds_data,
            "summary": "Compared odds across 4 major sportsbooks. FanDuel has the best odds at -108.",
            "recommendation": "Always shop for the best odds - even small differences add up \
                               over time. The difference between -108 and -112 is significant \
                               over many bets."
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn returns_sportsbook_table_and_best_odds() {
        let out = CompareOdds
            .execute(json!({
                "sport": "NFL",
                "betType": "spread",
                "event": "Chiefs vs. Bills",
                "selection": "Chiefs -3"
            }))
            .await
            .unwrap();

        assert_eq!(out["oddsData"]["sportsbooks"].as_array().unwrap().len(), 4);
        assert_eq!(out["oddsData"]["bestOdds"]["sportsbook"], "FanDuel");
        assert_eq!(out["oddsData"]["sportsbooks"][0]["line"], "Chiefs -3");
        assert!(out["summary"].as_str().unwrap().contains("FanDuel"));
    }

    #[tokio::test]
    async fn missing_event_is_rejected() {
        let err = CompareOdds
            .execute(json!({"sport": "NBA", "betType": "total"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
