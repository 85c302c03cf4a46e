//! Typed upstream payload shapes.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::upstream::error::PayloadError;

/// Body of the games endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GamesPayload {
    /// Games offered to users, addressed by positive selectors.
    pub gamechoices: Vec<String>,
    /// Games reachable only through negative selectors.
    #[serde(default)]
    pub hiddengames: Vec<String>,
}

/// Body of the prediction endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PredictionPayload {
    pub prediction: String,
}

/// Parse a raw JSON value into an expected shape.
pub fn parse_shape<T: DeserializeOwned>(value: &Value, expected: &'static str) -> Result<T, PayloadError> {
    T::deserialize(value).map_err(|source| PayloadError::ShapeMismatch { expected, source })
}

impl GamesPayload {
    pub fn from_value(value: &Value) -> Result<Self, PayloadError> {
        parse_shape(value, "games list")
    }
}

impl PredictionPayload {
    pub fn from_value(value: &Value) -> Result<Self, PayloadError> {
        parse_shape(value, "prediction")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_games_payload() {
        let games = GamesPayload::from_value(&json!({
            "gamechoices": ["Chess", "Go"],
            "hiddengames": ["Tic-Tac-Toe"]
        }))
        .unwrap();
        assert_eq!(games.gamechoices.len(), 2);
        assert_eq!(games.hiddengames, vec!["Tic-Tac-Toe".to_string()]);
    }

    #[test]
    fn test_hidden_games_optional() {
        let games = GamesPayload::from_value(&json!({ "gamechoices": ["Chess"] })).unwrap();
        assert!(games.hiddengames.is_empty());
    }

    #[test]
    fn test_shape_mismatch() {
        let err = GamesPayload::from_value(&json!({ "message": "Error retrieving games" })).unwrap_err();
        assert!(matches!(err, PayloadError::ShapeMismatch { expected: "games list", .. }));

        let err = GamesPayload::from_value(&json!({ "gamechoices": "Chess" })).unwrap_err();
        assert!(matches!(err, PayloadError::ShapeMismatch { .. }));

        let err = PredictionPayload::from_value(&json!({ "prediction": 42 })).unwrap_err();
        assert!(matches!(err, PayloadError::ShapeMismatch { expected: "prediction", .. }));
    }
}
