mod format;
mod json;
mod table;

pub(crate) use json::{catalog_json, prediction_json, save_outcome_json};
pub(crate) use table::{print_catalog, print_prediction};
