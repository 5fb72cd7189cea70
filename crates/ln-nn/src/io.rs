// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of Limnet — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Snapshot persistence for trained layers, so downstream inspection
//! tooling can consume parameters without re-running training.

use crate::module::Layer;
use crate::{PureResult, Tensor, TensorError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

#[derive(Clone, Debug, Serialize, Deserialize)]
struct StoredTensor {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl StoredTensor {
    fn from_tensor(tensor: &Tensor) -> StoredTensor {
        StoredTensor {
            rows: tensor.shape().0,
            cols: tensor.shape().1,
            data: tensor.data().to_vec(),
        }
    }

    fn into_tensor(self) -> PureResult<Tensor> {
        Tensor::from_vec(self.rows, self.cols, self.data)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct LayerSnapshot {
    parameters: HashMap<String, StoredTensor>,
}

fn to_snapshot<L: Layer + ?Sized>(layer: &L) -> PureResult<LayerSnapshot> {
    let state = layer.state_dict()?;
    let mut parameters = HashMap::new();
    for (name, tensor) in state {
        parameters.insert(name, StoredTensor::from_tensor(&tensor));
    }
    Ok(LayerSnapshot { parameters })
}

fn from_snapshot(snapshot: LayerSnapshot) -> PureResult<HashMap<String, Tensor>> {
    let mut state = HashMap::new();
    for (name, tensor) in snapshot.parameters.into_iter() {
        state.insert(name, tensor.into_tensor()?);
    }
    Ok(state)
}

fn io_error(err: std::io::Error) -> TensorError {
    TensorError::Io {
        message: err.to_string(),
    }
}

fn serde_error(err: impl ToString) -> TensorError {
    TensorError::Serialization {
        message: err.to_string(),
    }
}

/// Writes the layer's state dict to a pretty-printed JSON file.
pub fn save_json<L: Layer + ?Sized, P: AsRef<Path>>(layer: &L, path: P) -> PureResult<()> {
    let snapshot = to_snapshot(layer)?;
    let file = File::create(path.as_ref()).map_err(io_error)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &snapshot).map_err(serde_error)?;
    Ok(())
}

/// Restores a layer's parameters from a JSON snapshot.
pub fn load_json<L: Layer + ?Sized, P: AsRef<Path>>(layer: &mut L, path: P) -> PureResult<()> {
    let file = File::open(path.as_ref()).map_err(io_error)?;
    let reader = BufReader::new(file);
    let snapshot: LayerSnapshot = serde_json::from_reader(reader).map_err(serde_error)?;
    let state = from_snapshot(snapshot)?;
    layer.load_state_dict(&state)
}

/// Writes the layer's state dict to a compact bincode file.
pub fn save_bincode<L: Layer + ?Sized, P: AsRef<Path>>(layer: &L, path: P) -> PureResult<()> {
    let snapshot = to_snapshot(layer)?;
    let file = File::create(path.as_ref()).map_err(io_error)?;
    let writer = BufWriter::new(file);
    bincode::serialize_into(writer, &snapshot).map_err(serde_error)?;
    Ok(())
}

/// Restores a layer's parameters from a bincode snapshot.
pub fn load_bincode<L: Layer + ?Sized, P: AsRef<Path>>(layer: &mut L, path: P) -> PureResult<()> {
    let file = File::open(path.as_ref()).map_err(io_error)?;
    let reader = BufReader::new(file);
    let snapshot: LayerSnapshot = bincode::deserialize_from(reader).map_err(serde_error)?;
    let state = from_snapshot(snapshot)?;
    layer.load_state_dict(&state)
}
