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

//! Cluster definition and global config types (spec §3, §4.1 AMBIENT
//! configuration). `PotaConf` is a plain `Deserialize` tree the caller builds
//! however it likes (env, file, flags are all external collaborators per
//! spec §1) and hands to [`crate::config::resolver::to_flink_raw_config`].

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use flink_operator_common::types::{Fcid, RestExportType};

use super::raw::{CpuConf, JmHaConf, MemConf, ParConf, RestartStgConf, SavepointRestoreConf, StateBackendConf, WebUIConf};

#[derive(Clone, Debug, PartialEq)]
pub struct FlinkClusterDefCommon {
	pub fcid: Fcid,
	pub image: String,
	pub flink_ver: String,
	pub mode: String,
	pub k8s_account: Option<String>,
	pub rest_export_type: RestExportType,
	pub cpu: CpuConf,
	pub mem: MemConf,
	pub par: ParConf,
	pub webui: WebUIConf,
	pub restart_stg: RestartStgConf,
	pub state_backend: Option<StateBackendConf>,
	pub jm_ha: Option<JmHaConf>,
	pub s3: Option<crate::config::raw::S3AccessConf>,
	pub injected_deps: HashSet<String>,
	pub built_in_plugins: HashSet<String>,
	pub ext_raw_configs: BTreeMap<String, String>,
	pub override_pod_template: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ApplicationExtra {
	pub job_jar: String,
	pub job_name: String,
	pub app_main: Option<String>,
	pub app_args: Vec<String>,
	pub restore: Option<SavepointRestoreConf>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FlinkClusterDef {
	Session(FlinkClusterDefCommon),
	Application(FlinkClusterDefCommon, ApplicationExtra),
}

impl FlinkClusterDef {
	pub fn common(&self) -> &FlinkClusterDefCommon {
		match self {
			FlinkClusterDef::Session(c) => c,
			FlinkClusterDef::Application(c, _) => c,
		}
	}

	pub fn common_mut(&mut self) -> &mut FlinkClusterDefCommon {
		match self {
			FlinkClusterDef::Session(c) => c,
			FlinkClusterDef::Application(c, _) => c,
		}
	}

	pub fn fcid(&self) -> &Fcid {
		&self.common().fcid
	}
}

/// Global configuration supplied to the resolver and pod-template generator.
/// Defined here purely as a typed target for an external loader to
/// populate — the core never reads a config file itself (spec §1).
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PotaConf {
	#[serde(default)]
	pub flink: FlinkGlobalConf,
	#[serde(default)]
	pub s3: Option<S3GlobalConf>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct FlinkGlobalConf {
	#[serde(default)]
	pub k8s_account: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct S3GlobalConf {
	pub endpoint: String,
	pub access_key: String,
	pub secret_key: String,
	#[serde(default)]
	pub path_style_access: Option<bool>,
	#[serde(default)]
	pub ssl_enabled: Option<bool>,
	#[serde(default)]
	pub bucket: Option<String>,
}

impl S3GlobalConf {
	pub fn to_access_conf(&self) -> crate::config::raw::S3AccessConf {
		crate::config::raw::S3AccessConf {
			endpoint: self.endpoint.clone(),
			access_key: self.access_key.clone(),
			secret_key: self.secret_key.clone(),
			path_style_access: self.path_style_access,
			ssl_enabled: self.ssl_enabled,
		}
	}

	/// Normalizes bucket placement for path-style vs virtual-hosted addressing
	/// (spec §4.2). Path-style keeps the bucket as the first path segment;
	/// virtual-hosted addressing has already moved it into the host, so the
	/// pure path passed to `mc cp` omits it.
	pub fn revise_path(&self, pure_path: &str) -> String {
		match &self.bucket {
			Some(bucket) if self.path_style_access != Some(true) => {
				let prefix = format!("{}/", bucket);
				if let Some(rest) = pure_path.strip_prefix(&prefix) {
					rest.to_string()
				} else {
					pure_path.to_string()
				}
			}
			_ => pure_path.to_string(),
		}
	}
}
