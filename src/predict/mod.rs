//! Prediction backend: upload a photo, get tags and similar items back

mod client;
mod multipart;
mod types;

pub(crate) use client::PredictClient;
pub(crate) use types::Prediction;
