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

//! Thin client over the Kubernetes API verbs the core invokes (spec §6).

use flink_operator_common::{
	types::{DeploymentSnap, PodSnap, RestSvcEndpoint, ServiceSnap},
	Error,
};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Pod, Service};
use kube::{api::Api, api::DeleteParams, api::ListParams, Client};

pub struct K8sClient {
	client: Client,
}

impl K8sClient {
	pub fn new(client: Client) -> Self {
		Self { client }
	}

	/// `apps/v1 Deployments.delete(name, namespace)` — returns `Ok(true)` if the
	/// deployment existed and was deleted, `Ok(false)` if it was already absent
	/// (callers map absence to `ClusterNotFound`), and `Err` for any other failure.
	pub async fn delete_deployment(&self, name: &str, namespace: &str) -> Result<bool, Error> {
		let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
		match api.delete(name, &DeleteParams::default()).await {
			Ok(_) => Ok(true),
			Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(false),
			Err(e) => Err(Error::Kube(e)),
		}
	}

	/// Lists Services in `namespace` whose name ends with `-rest`, and resolves
	/// the one with `component=jobmanager` into a [`RestSvcEndpoint`] (spec §4.6).
	pub async fn find_rest_endpoint(&self, cluster_id: &str, namespace: &str) -> Result<Option<RestSvcEndpoint>, Error> {
		let api: Api<Service> = Api::namespaced(self.client.clone(), namespace);
		let lp = ListParams::default();
		let list = api.list(&lp).await.map_err(Error::Kube)?;
		for svc in list.items {
			let name = match &svc.metadata.name {
				Some(n) if n.ends_with("-rest") && n.starts_with(cluster_id) => n.clone(),
				_ => continue,
			};
			let is_jobmanager = svc
				.metadata
				.labels
				.get("component")
				.map(|c| c == "jobmanager")
				.unwrap_or(false);
			if !is_jobmanager {
				continue;
			}
			let spec = match &svc.spec {
				Some(s) => s,
				None => continue,
			};
			let cluster_ip = match &spec.cluster_ip {
				Some(ip) if !ip.is_empty() && ip != "None" => ip.clone(),
				_ => continue,
			};
			let rest_port = spec
				.ports
				.iter()
				.find(|p| p.name.as_deref() == Some("rest"))
				.map(|p| p.port as u16);
			let port = match rest_port {
				Some(p) => p,
				None => continue,
			};
			return Ok(Some(RestSvcEndpoint {
				cluster_ip,
				cluster_port: port,
				pod_ip: None,
				dns: Some(format!("{}.{}", name, namespace)),
			}));
		}
		Ok(None)
	}

	pub async fn list_services_snap(&self, namespace: &str) -> Result<Vec<ServiceSnap>, Error> {
		let api: Api<Service> = Api::namespaced(self.client.clone(), namespace);
		let list = api.list(&ListParams::default()).await.map_err(Error::Kube)?;
		Ok(list
			.items
			.into_iter()
			.map(|svc| ServiceSnap {
				name: svc.metadata.name.unwrap_or_default(),
				cluster_ip: svc.spec.as_ref().and_then(|s| s.cluster_ip.clone()),
				component: svc.metadata.labels.get("component").cloned(),
			})
			.collect())
	}

	pub async fn list_pods_snap(&self, namespace: &str, label_selector: &str) -> Result<Vec<PodSnap>, Error> {
		let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
		let lp = ListParams::default().labels(label_selector);
		let list = api.list(&lp).await.map_err(Error::Kube)?;
		Ok(list
			.items
			.into_iter()
			.map(|pod| PodSnap {
				name: pod.metadata.name.unwrap_or_default(),
				phase: pod.status.as_ref().and_then(|s| s.phase.clone()),
				pod_ip: pod.status.as_ref().and_then(|s| s.pod_ip.clone()),
			})
			.collect())
	}

	pub async fn get_deployment_snap(&self, name: &str, namespace: &str) -> Result<Option<DeploymentSnap>, Error> {
		let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
		match api.get(name).await {
			Ok(d) => Ok(Some(DeploymentSnap {
				name: d.metadata.name.unwrap_or_default(),
				ready_replicas: d.status.as_ref().and_then(|s| s.ready_replicas).unwrap_or(0),
				replicas: d.status.as_ref().and_then(|s| s.replicas).unwrap_or(0),
			})),
			Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(None),
			Err(e) => Err(Error::Kube(e)),
		}
	}
}
