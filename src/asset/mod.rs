//! Labelled asset pairs: composition, persistence and listing

mod catalog;
mod compose;
mod sink;

pub(crate) use catalog::{Catalog, scan};
pub(crate) use compose::{ImageSource, compose};
pub(crate) use sink::{HostEnv, SaveOutcome, Sink, select_sink};

use tracing::{info, warn};

use crate::error::AppError;
use crate::state::RequestState;

/// Validate the inputs, then hand the pair to `sink`.
///
/// Validation failures leave `state` untouched. Once the pair is built the
/// request is in flight until the sink returns, whatever the result.
pub(crate) fn save_pair(
    state: &mut RequestState,
    sink: &dyn Sink,
    base_name: &str,
    image: Option<ImageSource>,
    json_text: &str,
) -> Result<SaveOutcome, AppError> {
    state.ensure_ready()?;
    let pair = compose(base_name, image, json_text)?;

    state.run(|| {
        info!(
            sink = sink.name(),
            base = pair.base_name(),
            ext = pair.image_extension(),
            label = %pair.label_filename(),
            "saving asset pair"
        );
        sink.save(&pair).map_err(|e| {
            warn!(sink = sink.name(), error = %e, "save failed");
            AppError::from(e)
        })
    })
}
