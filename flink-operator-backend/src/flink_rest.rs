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

//! Thin client over the Flink REST API (spec §6).
//!
//! Every call returns a `flink_operator_common::Result`; callers decide how
//! to react to a failure (trackers log and retry next tick, the facade and
//! submission engine propagate).

use std::collections::BTreeMap;

use flink_operator_common::Error;
use serde::Deserialize;

pub struct FlinkRestClient {
	http: reqwest::Client,
	base_url: String,
}

#[derive(Debug, Deserialize)]
struct RawMetric {
	id: String,
	value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JobsResponse {
	jobs: Vec<JobIdEntry>,
}

#[derive(Debug, Deserialize)]
struct JobIdEntry {
	id: String,
}

#[derive(Debug, Deserialize)]
pub struct JobOverviewResponse {
	pub jobs: Vec<JobOverviewEntry>,
}

#[derive(Debug, Deserialize)]
pub struct JobOverviewEntry {
	pub jid: String,
	pub name: String,
	pub state: String,
}

#[derive(Debug, Deserialize)]
struct TaskManagersResponse {
	taskmanagers: Vec<TaskManagerEntry>,
}

#[derive(Debug, Deserialize)]
struct TaskManagerEntry {
	id: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
	filename: String,
}

#[derive(Debug, Deserialize)]
struct RunResponse {
	jobid: String,
}

#[derive(Debug, Deserialize)]
struct PatchResponse {
	#[serde(rename = "trigger-id")]
	trigger_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SavepointStatusResponse {
	pub status: SavepointStatusId,
	pub operation: Option<SavepointOperation>,
}

#[derive(Debug, Deserialize)]
pub struct SavepointStatusId {
	pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct SavepointOperation {
	pub location: Option<String>,
	#[serde(rename = "failure-cause")]
	pub failure_cause: Option<FailureCause>,
}

#[derive(Debug, Deserialize)]
pub struct FailureCause {
	#[serde(rename = "stack-trace")]
	pub stack_trace: Option<String>,
}

impl FlinkRestClient {
	pub fn new(base_url: impl Into<String>) -> Self {
		Self { http: reqwest::Client::new(), base_url: base_url.into() }
	}

	fn url(&self, path: &str) -> String {
		format!("{}{}", self.base_url.trim_end_matches('/'), path)
	}

	pub async fn jobmanager_metrics(&self, keys: &[&str]) -> Result<BTreeMap<String, String>, Error> {
		let path = format!("/jobmanager/metrics?get={}", keys.join(","));
		let raw: Vec<RawMetric> = self.http.get(self.url(&path)).send().await?.json().await?;
		Ok(raw_metrics_to_map(raw))
	}

	pub async fn taskmanager_ids(&self) -> Result<Vec<String>, Error> {
		let resp: TaskManagersResponse = self.http.get(self.url("/taskmanagers")).send().await?.json().await?;
		Ok(resp.taskmanagers.into_iter().map(|t| t.id).collect())
	}

	pub async fn taskmanager_metrics(&self, id: &str, keys: &[&str]) -> Result<BTreeMap<String, String>, Error> {
		let path = format!("/taskmanagers/{}/metrics?get={}", id, keys.join(","));
		let raw: Vec<RawMetric> = self.http.get(self.url(&path)).send().await?.json().await?;
		Ok(raw_metrics_to_map(raw))
	}

	pub async fn job_ids(&self) -> Result<Vec<String>, Error> {
		let resp: JobsResponse = self.http.get(self.url("/jobs")).send().await?.json().await?;
		Ok(resp.jobs.into_iter().map(|j| j.id).collect())
	}

	pub async fn jobs_overview(&self) -> Result<JobOverviewResponse, Error> {
		Ok(self.http.get(self.url("/jobs/overview")).send().await?.json().await?)
	}

	/// `POST /jars/upload`. Returns the `jarId`: the basename of the returned filename.
	pub async fn upload_jar(&self, jar_bytes: Vec<u8>, file_name: &str) -> Result<String, Error> {
		let part = reqwest::multipart::Part::bytes(jar_bytes)
			.file_name(file_name.to_string())
			.mime_str("application/java-archive")
			.map_err(reqwest::Error::from)?;
		let form = reqwest::multipart::Form::new().part("jarfile", part);
		let resp: UploadResponse =
			self.http.post(self.url("/jars/upload")).multipart(form).send().await?.json().await?;
		Ok(flink_operator_common::util::basename(&resp.filename).to_string())
	}

	pub async fn run_jar(&self, jar_id: &str, body: &RunJarRequest) -> Result<String, Error> {
		let path = format!("/jars/{}/run", jar_id);
		let resp: RunResponse = self.http.post(self.url(&path)).json(body).send().await?.json().await?;
		Ok(resp.jobid)
	}

	/// Best-effort cleanup; callers should ignore the returned error.
	pub async fn delete_jar(&self, jar_id: &str) -> Result<(), Error> {
		let path = format!("/jars/{}", jar_id);
		self.http.delete(self.url(&path)).send().await?;
		Ok(())
	}

	pub async fn savepoint_status(&self, job_id: &str, trigger_id: &str) -> Result<SavepointStatusResponse, Error> {
		let path = format!("/jobs/{}/savepoints/{}", job_id, trigger_id);
		Ok(self.http.get(self.url(&path)).send().await?.json().await?)
	}

	/// `PATCH /jobs/<id>?mode=stop` with an optional savepoint target (spec §9 open question).
	pub async fn stop_job_with_savepoint(&self, job_id: &str, target_dir: Option<&str>) -> Result<Option<String>, Error> {
		let mut path = format!("/jobs/{}?mode=stop", job_id);
		if let Some(dir) = target_dir {
			path.push_str(&format!("&targetDirectory={}", dir));
		}
		let resp: PatchResponse = self.http.patch(self.url(&path)).send().await?.json().await?;
		Ok(resp.trigger_id)
	}
}

fn raw_metrics_to_map(raw: Vec<RawMetric>) -> BTreeMap<String, String> {
	raw.into_iter().filter_map(|m| { let RawMetric { id, value } = m; value.map(|v| (id, v)) }).collect()
}

#[derive(Debug, Default, serde::Serialize)]
pub struct RunJarRequest {
	#[serde(rename = "entry-class", skip_serializing_if = "Option::is_none")]
	pub entry_class: Option<String>,
	#[serde(rename = "programArgs", skip_serializing_if = "Option::is_none")]
	pub program_args: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub parallelism: Option<u32>,
	#[serde(rename = "savepointPath", skip_serializing_if = "Option::is_none")]
	pub savepoint_path: Option<String>,
	#[serde(rename = "restoreMode", skip_serializing_if = "Option::is_none")]
	pub restore_mode: Option<String>,
	#[serde(rename = "allowNonRestoredState", skip_serializing_if = "Option::is_none")]
	pub allow_non_restored_state: Option<bool>,
}
