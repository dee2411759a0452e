use crate::tool::{optional_str, require_str, unix_timestamp};
use crate::{Tool, ToolDescriptor, ToolError};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

/// Retrieves the current injury report and player availability for a team.
pub struct GetInjuryReport;

#[async_trait]
impl Tool for GetInjuryReport {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            "getInjuryReport",
            "Checking Injury Report",
            "Get the latest injury report and player availability status for a team \
             or game. Essential for betting decisions as injuries significantly \
             impact outcomes.",
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
                    "description": "Team name to get injury report for"
                },
                "event": {
                    "type": "string",
                    "description": "Specific upcoming game/match for game-specific status"
                }
            },
            "required": ["sport", "team"]
        }))
    }

    async fn execute(&self, args: Value) -> Result<Value, ToolError> {
        let sport = require_str(&args, "sport")?;
        let team = require_str(&args, "team")?;
        let event = optional_str(&args, "event");
        debug!(team = %team, "retrieving injury report");

        let injuries = json!([
            {
                "player": "Star Quarterback",
                "position": "QB",
                "injury": "Shoulder injury",
                "status": "Questionable",
                "practiceStatus": "Limited Wednesday, full Thursday",
                "impact": "High"
            },
            {
                "player": "Starting Receiver",
                "position": "WR",
                "injury": "Hamstring",
                "status": "Doubtful",
                "practiceStatus": "Did not practice",
                "impact": "Medium"
            },
            {
                "player": "Backup Lineman",
                "position": "OL",
                "injury": "Ankle",
                "status": "Out",
                "practiceStatus": "Did not practice",
                "impact": "Low"
            }
        ]);

        Ok(json!({
            "sport": sport,
            "team": team,
            "event": event,
            "lastUpdated": unix_timestamp(),
            "injuryReport": { "injuries": injuries },
            "impactAnalysis": "One high-impact player questionable; monitor final status \
                               before the line moves.",
            "bettingImplications": "If the QB sits, expect the spread to move 3-6 points; \
                                    totals typically drop as backups slow the offense."
        }))
    }
}
