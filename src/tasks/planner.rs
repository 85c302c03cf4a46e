//! Builds the per-request task set from configuration.

use serde_json::{json, Value};

use crate::config::schema::{TaskConfig, TaskKind};
use crate::context::RequestContext;
use crate::dispatch::TaskDescriptor;
use crate::games::{find_game_index, select_game};
use crate::upstream::{GamesPayload, PredictionPayload};

/// Field value reported when `play` does not address a game.
pub const INVALID_SELECTION: &str = "Invalid game selection";

/// Message reported when a required parameter is blank and none is configured.
pub const DEFAULT_MISSING_PARAMETER_MESSAGE: &str = "parameter not set";

/// Plan one descriptor per configured task, binding request properties into
/// the game transforms.
pub fn plan_tasks(tasks: &[TaskConfig], ctx: &RequestContext) -> Vec<TaskDescriptor> {
    tasks.iter().map(|task| plan_task(task, ctx)).collect()
}

fn plan_task(task: &TaskConfig, ctx: &RequestContext) -> TaskDescriptor {
    let mut descriptor = TaskDescriptor::new(&task.field, &task.connection, &task.profile);

    if let Some(path) = &task.path {
        descriptor = descriptor.with_path(path);
    }

    if let Some(parameter) = &task.requires_parameter {
        let message = task
            .missing_parameter_message
            .as_deref()
            .unwrap_or(DEFAULT_MISSING_PARAMETER_MESSAGE);
        descriptor = descriptor.requiring_parameter(parameter, json!({ "message": message }));
    }

    match task.kind {
        TaskKind::Passthrough => descriptor,
        TaskKind::GameList => descriptor.with_transform(|body| {
            GamesPayload::from_value(body)?;
            Ok(body.clone())
        }),
        TaskKind::Prediction => {
            descriptor.with_transform(|body| Ok(Value::String(PredictionPayload::from_value(body)?.prediction)))
        }
        TaskKind::Game => {
            let selection = parse_selection(ctx.property("play"));
            descriptor.with_transform(move |body| {
                let games = GamesPayload::from_value(body)?;
                let picked = selection.and_then(|s| select_game(s, &games.gamechoices, &games.hiddengames));
                Ok(Value::String(picked.unwrap_or(INVALID_SELECTION).to_string()))
            })
        }
        TaskKind::GameIndex => {
            let name = ctx.property("game").map(str::to_string);
            descriptor.with_transform(move |body| {
                let games = GamesPayload::from_value(body)?;
                Ok(match &name {
                    Some(name) => json!(find_game_index(name, &games.gamechoices, &games.hiddengames)),
                    None => Value::Null,
                })
            })
        }
    }
}

/// `None` when `play` is present but not an integer.
///
/// An absent `play` selects at random.
fn parse_selection(play: Option<&str>) -> Option<i64> {
    match play {
        None => Some(0),
        Some(raw) => raw.trim().parse().ok(),
    }
}
