use serde_json::{Value, json};
use tracing::warn;

use crate::asset::{Catalog, SaveOutcome};
use crate::predict::Prediction;

pub(crate) fn prediction_json(prediction: &Prediction, match_url: impl Fn(&str) -> String) -> Value {
    let urls: Vec<String> = prediction.matches.iter().map(|m| match_url(m.as_str())).collect();
    json!({
        "tags": prediction.tags,
        "matches": prediction.matches,
        "match_urls": urls,
        "debug": prediction.debug,
    })
}

pub(crate) fn save_outcome_json(outcome: &SaveOutcome, sink: &str) -> Value {
    let (image, label) = outcome.paths();
    json!({
        "sink": sink,
        "status": if outcome.needs_manual_move() { "downloaded" } else { "written" },
        "manual_move_required": outcome.needs_manual_move(),
        "image": image.display().to_string(),
        "label": label.display().to_string(),
        "message": outcome.message(),
    })
}

pub(crate) fn catalog_json(catalog: &Catalog) -> Value {
    match serde_json::to_value(catalog) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "could not render catalog as JSON");
            json!({ "error": e.to_string() })
        }
    }
}
