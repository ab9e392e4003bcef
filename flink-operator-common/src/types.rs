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

//! Identifiers and observation snapshots shared across the operator crates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Primary identifier of a Flink cluster: unique within one Kubernetes cluster.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fcid {
	pub cluster_id: String,
	pub namespace: String,
}

impl Fcid {
	pub fn new(cluster_id: impl Into<String>, namespace: impl Into<String>) -> Self {
		Self { cluster_id: cluster_id.into(), namespace: namespace.into() }
	}

	/// Marshal to the opaque shard-entity key `"jmMt@<clusterId>@<namespace>"`.
	pub fn marshal(&self) -> String {
		format!("jmMt@{}@{}", self.cluster_id, self.namespace)
	}

	/// Inverse of [`Fcid::marshal`]. Returns `None` if `s` is not a valid marshaled key.
	pub fn unmarshal(s: &str) -> Option<Fcid> {
		let rest = s.strip_prefix("jmMt@")?;
		let mut parts = rest.splitn(2, '@');
		let cluster_id = parts.next()?;
		let namespace = parts.next()?;
		if cluster_id.is_empty() || namespace.is_empty() {
			return None;
		}
		Some(Fcid::new(cluster_id, namespace))
	}

	/// Local workspace directory for this cluster (spec §6 persisted state layout).
	pub fn workspace_dir_name(&self) -> String {
		format!("{}@{}", self.namespace, self.cluster_id)
	}
}

impl fmt::Display for Fcid {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}", self.namespace, self.cluster_id)
	}
}

/// Identifies a single Flink job within a cluster.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fjid {
	pub fcid: Fcid,
	pub job_id: String,
}

impl Fjid {
	pub fn new(fcid: Fcid, job_id: impl Into<String>) -> Self {
		Self { fcid, job_id: job_id.into() }
	}
}

/// Exposed Kubernetes Service type for the Flink REST endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestExportType {
	ClusterIP,
	NodePort,
	LoadBalancer,
	HeadlessClusterIP,
}

impl fmt::Display for RestExportType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			RestExportType::ClusterIP => "ClusterIP",
			RestExportType::NodePort => "NodePort",
			RestExportType::LoadBalancer => "LoadBalancer",
			RestExportType::HeadlessClusterIP => "ClusterIP",
		};
		write!(f, "{}", s)
	}
}

/// A resolved Flink REST service endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestSvcEndpoint {
	pub cluster_ip: String,
	pub cluster_port: u16,
	pub pod_ip: Option<String>,
	pub dns: Option<String>,
}

impl RestSvcEndpoint {
	/// The base URL trackers and the facade issue REST calls against.
	pub fn base_url(&self) -> String {
		format!("http://{}:{}", self.cluster_ip, self.cluster_port)
	}
}

fn now_millis() -> i64 {
	chrono::Utc::now().timestamp_millis()
}

/// Wraps a value with the epoch-millis write timestamp every snapshot carries.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Timestamped<T> {
	pub ts: i64,
	pub value: T,
}

impl<T> Timestamped<T> {
	pub fn now(value: T) -> Self {
		Self { ts: now_millis(), value }
	}
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct JmMetrics {
	pub raw: std::collections::BTreeMap<String, String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TmMetrics {
	pub taskmanager_id: String,
	pub raw: std::collections::BTreeMap<String, String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct JobOverview {
	pub jid: String,
	pub name: String,
	pub state: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct JobMetrics {
	pub jid: String,
	pub raw: std::collections::BTreeMap<String, String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DeploymentSnap {
	pub name: String,
	pub ready_replicas: i32,
	pub replicas: i32,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ServiceSnap {
	pub name: String,
	pub cluster_ip: Option<String>,
	pub component: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PodSnap {
	pub name: String,
	pub phase: Option<String>,
	pub pod_ip: Option<String>,
}

/// Terminal/in-progress state of an asynchronous savepoint trigger (spec §4.6, §6).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SavepointStatus {
	InProgress,
	Completed { location: Option<String> },
	Failed { cause: Option<String> },
}

impl SavepointStatus {
	pub fn is_terminal(&self) -> bool {
		!matches!(self, SavepointStatus::InProgress)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn marshal_round_trips() {
		let fcid = Fcid::new("c1", "ns1");
		let marshaled = fcid.marshal();
		assert_eq!(marshaled, "jmMt@c1@ns1");
		assert_eq!(Fcid::unmarshal(&marshaled), Some(fcid));
	}

	#[test]
	fn unmarshal_rejects_malformed() {
		assert_eq!(Fcid::unmarshal("nope"), None);
		assert_eq!(Fcid::unmarshal("jmMt@only-one"), None);
		assert_eq!(Fcid::unmarshal("jmMt@@ns1"), None);
	}

	#[test]
	fn workspace_dir_name_is_namespace_at_cluster() {
		let fcid = Fcid::new("c1", "ns1");
		assert_eq!(fcid.workspace_dir_name(), "ns1@c1");
	}
}
