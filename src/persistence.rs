//! JSON persistence for trained models.
//!
//! Files are written as pretty-printed JSON at `<path>.model`.

use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind};

use serde::{de::DeserializeOwned, Serialize};
use tracing::info;

use crate::error::{Error, Result};

pub const MODEL_SUFFIX: &str = ".model";

fn model_path(path: &str) -> String {
    format!("{path}{MODEL_SUFFIX}")
}

/// Serializes `model` to `<path>.model`.
pub fn save_model<T: Serialize>(model: &T, path: &str) -> Result<()> {
    let target = model_path(path);
    let file = File::create(&target)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, model)?;
    info!(path = %target, "saved model");
    Ok(())
}

/// Deserializes a model previously written by `save_model`.
///
/// Returns `Error::ModelNotFound` when `<path>.model` does not exist.
pub fn load_model<T: DeserializeOwned>(path: &str) -> Result<T> {
    let target = model_path(path);
    let file = match File::open(&target) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(Error::ModelNotFound(target)),
        Err(e) => return Err(e.into()),
    };
    let reader = BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}
