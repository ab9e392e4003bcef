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

//! Submission Engine (SPEC_FULL.md SUPPLEMENT). Named as a coupled subsystem
//! in spec.md §1 rather than excluded functionality; grounded in spec.md §6's
//! REST contract and the teacher's `SystemConfig`/`System` lifecycle wrapper
//! (`substrate-archive/src/actors.rs`).
//!
//! Resolving an S3 job jar to bytes is delegated to an external object-store
//! collaborator (spec.md §6 lists object storage as "consumed", not
//! implemented here) the same way §1 already treats config-file parsing and
//! log shipping as external; callers pass already-fetched bytes in.

use std::path::{Path, PathBuf};

use flink_operator_backend::{FlinkRestClient, RunJarRequest};
use flink_operator_common::types::Fcid;
use flink_operator_common::util::is_s3_path;

use crate::config::{revise, to_flink_raw_config, Configuration, FlinkClusterDef, PotaConf};
use crate::error::{Error, Result};
use crate::podtemplate;

/// Owns `<localTmpDir>/<namespace>@<clusterId>/` (spec.md §6 persisted state
/// layout). Modeled on the teacher's `substrate_archive_default_dir`/
/// `create_dir` helpers.
pub struct Workspace {
	dir: PathBuf,
}

impl Workspace {
	pub fn new(local_tmp_dir: &Path, fcid: &Fcid) -> Self {
		Self { dir: local_tmp_dir.join(fcid.workspace_dir_name()) }
	}

	pub fn ensure(&self) -> Result<()> {
		std::fs::create_dir_all(self.log_conf_dir()).map_err(|e| Error::IOErr { path: self.dir.display().to_string(), cause: e.to_string() })
	}

	pub fn pod_template_path(&self) -> PathBuf {
		self.dir.join("flink-podtemplate.yaml")
	}

	pub fn log_conf_dir(&self) -> PathBuf {
		self.dir.join("log-conf")
	}
}

/// The contract handed to an external Flink launcher: the resolved
/// configuration plus the path of the pod template it references.
pub struct LaunchPlan {
	pub configuration: Configuration,
	pub pod_template_path: PathBuf,
}

/// `submitApplicationCluster`: revise + emit + generate pod template into the
/// cluster's workspace. Does not itself invoke a launcher process.
pub fn submit_application_cluster(def: &FlinkClusterDef, pota: &PotaConf, local_tmp_dir: &Path) -> Result<LaunchPlan> {
	let fcid = def.fcid().clone();
	let workspace = Workspace::new(local_tmp_dir, &fcid);
	workspace.ensure()?;

	let revised = revise(def).map_err(|e| Error::ReviseFlinkClusterDefErr(e.to_string()))?;
	let configuration = to_flink_raw_config(&revised, pota).map_err(|e| Error::DryToFlinkRawConfigErr(e.to_string()))?;

	let pod = podtemplate::resolve(&revised, pota)?;
	let pod_template_path = workspace.pod_template_path();
	podtemplate::dump(&pod, &pod_template_path)?;

	Ok(LaunchPlan { configuration, pod_template_path })
}

/// `submitSessionJob`: `POST /jars/upload` then `POST /jars/<jarId>/run`,
/// then best-effort `DELETE /jars/<jarId>`. Rejects a non-S3 `job_jar_path`:
/// a session cluster has no init-container to stage a local jar, so the
/// bytes must have come from object storage.
pub async fn submit_session_job(
	fcid: &Fcid,
	rest_base_url: &str,
	job_jar_path: &str,
	jar_bytes: Vec<u8>,
	run_request: RunJarRequest,
) -> Result<String> {
	if !is_s3_path(job_jar_path) {
		return Err(Error::NotSupportJobJarPath(job_jar_path.to_string()));
	}
	let file_name = flink_operator_common::util::basename(job_jar_path).to_string();
	let client = FlinkRestClient::new(rest_base_url);
	let launch = async {
		let jar_id = client.upload_jar(jar_bytes, &file_name).await?;
		let result = client.run_jar(&jar_id, &run_request).await;
		let _ = client.delete_jar(&jar_id).await;
		result
	};
	launch.await.map_err(|e: flink_operator_common::Error| Error::SubmitFlinkSessionClusterErr { fcid: fcid.clone(), cause: e.to_string() })
}

/// `cancelSessionJob` / `cancelApplicationJob` (spec.md §9 open question):
/// `PATCH /jobs/<id>?mode=stop` with an optional savepoint target, returning
/// the trigger id.
pub async fn cancel_job(rest_base_url: &str, job_id: &str, savepoint_target_dir: Option<&str>) -> Result<Option<String>> {
	let client = FlinkRestClient::new(rest_base_url);
	Ok(client.stop_job_with_savepoint(job_id, savepoint_target_dir).await?)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn workspace_dir_layout_matches_namespace_at_cluster_id() {
		let fcid = Fcid::new("c1", "ns1");
		let ws = Workspace::new(Path::new("/tmp/pota"), &fcid);
		assert_eq!(ws.pod_template_path(), Path::new("/tmp/pota/ns1@c1/flink-podtemplate.yaml"));
		assert_eq!(ws.log_conf_dir(), Path::new("/tmp/pota/ns1@c1/log-conf"));
	}

	#[test]
	fn submit_session_job_rejects_a_non_s3_job_jar() {
		smol::block_on(async {
			let fcid = Fcid::new("c1", "ns1");
			let request = RunJarRequest {
				entry_class: None,
				program_args: None,
				parallelism: None,
				savepoint_path: None,
				restore_mode: None,
				allow_non_restored_state: None,
			};
			let err = submit_session_job(&fcid, "http://localhost:8081", "/local/app.jar", vec![], request).await.unwrap_err();
			assert!(matches!(err, Error::NotSupportJobJarPath(_)));
		});
	}
}
