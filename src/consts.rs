/// Extension used for the saved image when the source file name has none
pub(crate) const DEFAULT_IMAGE_EXT: &str = ".jpg";

/// Label content persisted when the JSON text is blank
pub(crate) const EMPTY_LABEL: &str = "{}";

/// Subdirectory of the clothes folder holding one `<base>.json` per image
pub(crate) const LABELS_DIR: &str = "labels";

/// Image extensions probed when pairing a label with its image, in priority order
pub(crate) const IMAGE_EXTS: [&str; 4] = [".webp", ".png", ".jpg", ".jpeg"];

/// Prediction backend used when nothing else is configured
pub(crate) const DEFAULT_PREDICT_URL: &str = "http://127.0.0.1:8000";

/// Table holding registered member accounts
pub(crate) const MEMBERS_TABLE: &str = "Members";
