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

//! Domain error taxonomy (spec §7), layered on top of
//! `flink_operator_common::Error` the same way `substrate-archive::error::Error`
//! wraps `substrate_archive_common::Error`.

use thiserror::Error;

use flink_operator_common::types::Fcid;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
	#[error(transparent)]
	Common(#[from] flink_operator_common::Error),

	#[error("failed to revise cluster definition: {0}")]
	ReviseFlinkClusterDefErr(String),

	#[error("failed to emit Flink raw configuration: {0}")]
	DryToFlinkRawConfigErr(String),

	#[error("failed to generate pod template: {0}")]
	GenPodTemplateErr(String),

	#[error("failed to encode pod template as yaml: {0}")]
	EncodePodTemplateYamlErr(String),

	#[error("failed to decode pod template yaml: {0}")]
	DecodePodTemplateYamlErr(String),

	#[error("io error on {path}: {cause}")]
	IOErr { path: String, cause: String },

	#[error("failed to submit session cluster {fcid}: {cause}")]
	SubmitFlinkSessionClusterErr { fcid: Fcid, cause: String },

	#[error("failed to submit application cluster {fcid}: {cause}")]
	SubmitFlinkApplicationClusterErr { fcid: Fcid, cause: String },

	#[error("session clusters do not support a non-S3 job jar path: {0}")]
	NotSupportJobJarPath(String),

	#[error("unable to resolve s3 resource: {0}")]
	UnableToResolveS3Resource(String),

	#[error("flink rest api request failed: {0}")]
	RequestFlinkRestApiErr(String),

	#[error("kubernetes api request failed: {0}")]
	RequestK8sApiErr(String),

	#[error("cluster not found: {0}")]
	ClusterNotFound(Fcid),

	#[error("no flink rest service endpoint visible for cluster {0}")]
	EndpointNotFound(Fcid),

	#[error("actor interop error: {0}")]
	ActorInteropErr(String),

	#[error("timed out waiting for completion")]
	TimeoutErr,
}

impl From<xtra::Disconnected> for Error {
	fn from(_: xtra::Disconnected) -> Error {
		Error::ActorInteropErr("actor disconnected".to_string())
	}
}
