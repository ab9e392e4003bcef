// Copyright 2026 Flink Operator Contributors.
// This file is part of flink-operator.

// flink-operator is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// flink-operator is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with flink-operator.  If not, see <http://www.gnu.org/licenses/>.

// Shared low-level error taxonomy for the operator crates.
//
// Mirrors `substrate-archive-common::error::Error`: a single thiserror enum
// collecting every external-library failure the core can surface, plus the
// blanket `From` impls that let actor/channel code use `?` without manual
// wrapping.

use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
	#[error("io error: {0}")]
	Io(#[from] io::Error),
	#[error("json error: {0}")]
	Json(#[from] serde_json::Error),
	#[error("yaml error: {0}")]
	Yaml(#[from] serde_yaml::Error),
	#[error("http request error: {0}")]
	Http(#[from] reqwest::Error),
	#[error("kubernetes api error: {0}")]
	Kube(#[from] kube::Error),
	#[error("sending on disconnected channel")]
	Channel,
	#[error("trying to send to a disconnected actor")]
	Disconnected,
	#[error("{0}")]
	General(String),
}

impl From<&str> for Error {
	fn from(e: &str) -> Error {
		Error::General(e.to_string())
	}
}

impl From<String> for Error {
	fn from(e: String) -> Error {
		Error::General(e)
	}
}

impl From<xtra::Disconnected> for Error {
	fn from(_: xtra::Disconnected) -> Error {
		Error::Disconnected
	}
}

impl<T> From<flume::SendError<T>> for Error {
	fn from(_: flume::SendError<T>) -> Error {
		Error::Channel
	}
}
