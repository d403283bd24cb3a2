//! Match results pushed from the watch.
//!
//! The watch sends a small JSON dictionary when a match ends:
//!
//! ```json
//! { "idPartido": "…", "golesLocal": 2, "golesVisitante": 1, "workoutID": "…" }
//! ```
//!
//! The keys are fixed by the watch app. `workoutID` is optional. Anything else
//! missing or malformed rejects the whole payload, and no stored match is touched.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{HeatmapError, Result};

/// Validated result update for one match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResultUpdate {
    pub match_id: Uuid,
    pub home_goals: u32,
    pub away_goals: u32,
    pub workout_id: Option<Uuid>,
}

#[derive(Deserialize)]
struct RawPayload {
    #[serde(rename = "idPartido")]
    match_id: Option<serde_json::Value>,
    #[serde(rename = "golesLocal")]
    home_goals: Option<serde_json::Value>,
    #[serde(rename = "golesVisitante")]
    away_goals: Option<serde_json::Value>,
    #[serde(rename = "workoutID")]
    workout_id: Option<serde_json::Value>,
}

fn malformed(reason: String) -> HeatmapError {
    warn!("[PitchHeatmap] rejected sync payload: {}", reason);
    HeatmapError::MalformedPayload(reason)
}

fn require_uuid(field: &str, value: Option<serde_json::Value>) -> Result<Uuid> {
    let value = value.ok_or_else(|| malformed(format!("missing {}", field)))?;
    value
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| malformed(format!("{} is not a UUID: {}", field, value)))
}

fn require_goals(field: &str, value: Option<serde_json::Value>) -> Result<u32> {
    let value = value.ok_or_else(|| malformed(format!("missing {}", field)))?;
    value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| malformed(format!("{} is not a goal count: {}", field, value)))
}

/// Parse and validate a watch payload.
pub fn parse_match_result(json: &str) -> Result<MatchResultUpdate> {
    let raw: RawPayload =
        serde_json::from_str(json).map_err(|e| malformed(format!("not a JSON object: {}", e)))?;

    let match_id = require_uuid("idPartido", raw.match_id)?;
    let home_goals = require_goals("golesLocal", raw.home_goals)?;
    let away_goals = require_goals("golesVisitante", raw.away_goals)?;
    let workout_id = match raw.workout_id {
        None | Some(serde_json::Value::Null) => None,
        value => Some(require_uuid("workoutID", value)?),
    };

    info!(
        "[PitchHeatmap] match {} result {}-{} (workout linked: {})",
        match_id,
        home_goals,
        away_goals,
        workout_id.is_some()
    );

    Ok(MatchResultUpdate {
        match_id,
        home_goals,
        away_goals,
        workout_id,
    })
}

/// Locally stored match, as far as sync is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: Uuid,
    pub home_goals: u32,
    pub away_goals: u32,
    pub is_finished: bool,
    pub workout_id: Option<Uuid>,
}

/// Apply an update to the matching record.
///
/// A payload without `workoutID` keeps any workout already linked.
pub fn apply_match_result(records: &mut [MatchRecord], update: &MatchResultUpdate) -> Result<()> {
    let record = records
        .iter_mut()
        .find(|r| r.id == update.match_id)
        .ok_or_else(|| {
            warn!("[PitchHeatmap] sync for unknown match {}", update.match_id);
            HeatmapError::MatchNotFound(update.match_id.to_string())
        })?;

    record.home_goals = update.home_goals;
    record.away_goals = update.away_goals;
    record.is_finished = true;
    if let Some(workout_id) = update.workout_id {
        record.workout_id = Some(workout_id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MATCH: &str = "6f1c2b0e-7a43-4c8e-9d3b-2f5a1e8c4d10";
    const WORKOUT: &str = "0b9d7a52-1e6f-4c3a-8b2d-5e4f3a2c1d0e";

    fn record() -> MatchRecord {
        MatchRecord {
            id: Uuid::parse_str(MATCH).unwrap(),
            home_goals: 0,
            away_goals: 0,
            is_finished: false,
            workout_id: None,
        }
    }

    #[test]
    fn test_full_payload() {
        let json = format!(
            r#"{{"idPartido":"{}","golesLocal":2,"golesVisitante":1,"workoutID":"{}"}}"#,
            MATCH, WORKOUT
        );
        let update = parse_match_result(&json).unwrap();
        assert_eq!(update.home_goals, 2);
        assert_eq!(update.away_goals, 1);
        assert_eq!(update.workout_id, Some(Uuid::parse_str(WORKOUT).unwrap()));

        let mut records = vec![record()];
        apply_match_result(&mut records, &update).unwrap();
        assert!(records[0].is_finished);
        assert_eq!((records[0].home_goals, records[0].away_goals), (2, 1));
        assert!(records[0].workout_id.is_some());
    }

    #[test]
    fn test_workout_id_optional() {
        let json = format!(r#"{{"idPartido":"{}","golesLocal":0,"golesVisitante":3}}"#, MATCH);
        let update = parse_match_result(&json).unwrap();
        assert_eq!(update.workout_id, None);

        let workout = Uuid::parse_str(WORKOUT).unwrap();
        let mut records = vec![MatchRecord { workout_id: Some(workout), ..record() }];
        apply_match_result(&mut records, &update).unwrap();
        assert_eq!(records[0].workout_id, Some(workout));
    }

    #[test]
    fn test_rejects_missing_or_bad_fields() {
        let cases = [
            r#"{"golesLocal":1,"golesVisitante":1}"#.to_string(),
            format!(r#"{{"idPartido":"{}","golesVisitante":1}}"#, MATCH),
            format!(r#"{{"idPartido":"{}","golesLocal":-1,"golesVisitante":1}}"#, MATCH),
            format!(r#"{{"idPartido":"{}","golesLocal":"2","golesVisitante":1}}"#, MATCH),
            r#"{"idPartido":"not-a-uuid","golesLocal":1,"golesVisitante":1}"#.to_string(),
            format!(r#"{{"idPartido":"{}","golesLocal":1,"golesVisitante":1,"workoutID":7}}"#, MATCH),
            "[1, 2]".to_string(),
            "".to_string(),
        ];
        for json in cases {
            assert!(
                matches!(parse_match_result(&json), Err(HeatmapError::MalformedPayload(_))),
                "accepted {}",
                json
            );
        }
    }

    #[test]
    fn test_unknown_match_leaves_records_untouched() {
        let update = MatchResultUpdate {
            match_id: Uuid::parse_str(WORKOUT).unwrap(),
            home_goals: 4,
            away_goals: 4,
            workout_id: None,
        };
        let mut records = vec![record()];
        let err = apply_match_result(&mut records, &update).unwrap_err();
        assert!(matches!(err, HeatmapError::MatchNotFound(_)));
        assert_eq!(records[0], record());
    }
}
