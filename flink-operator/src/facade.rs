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

//! Observer Facade (spec §4.6): the single entry point read-side callers use
//! to track clusters and query their state. Owns the three per-kind shard
//! registries (spec §4.4) and the replicated caches (spec §4.3) that back
//! `retrieve_rest_endpoint`/`list_job_ids`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use xtra::prelude::*;

use flink_operator_backend::{FlinkRestClient, K8sClient};
use flink_operator_common::types::{Fcid, Fjid, JmMetrics, JobOverview, RestSvcEndpoint, SavepointStatus, TmMetrics, Timestamped};

use crate::actors::{pollers, EndpointResolver, JmMetricTracker, JobsTracker, Start, TmMetricsTracker};
use crate::error::{Error, Result};
use crate::sharding::{ShardRegistry, Stop as ShardStop};
use crate::store::{Consistency, Get, Put, RemoveBySelectKey, ReplicatedKvStore};

/// Resolves endpoints by delegating back through the facade's own cache and
/// Kubernetes fallback; handed to every spawned tracker so polling tasks
/// never talk to Kubernetes directly.
struct FacadeEndpointResolver(Arc<Facade>);

impl EndpointResolver for FacadeEndpointResolver {
	fn resolve(&self, fcid: Fcid) -> crate::actors::BoxFuture<flink_operator_common::Result<RestSvcEndpoint>> {
		let facade = self.0.clone();
		Box::pin(async move { facade.retrieve_rest_endpoint(&fcid, false).await.map_err(|e| flink_operator_common::Error::General(e.to_string())) })
	}
}

pub struct Facade {
	k8s: K8sClient,
	poll_interval: Duration,
	spt_trigger_poll_interval: Duration,
	endpoints: Address<ReplicatedKvStore<Fcid, RestSvcEndpoint>>,
	jobs_cache: Address<ReplicatedKvStore<Fcid, Timestamped<Vec<JobOverview>>>>,
	jm_metrics_store: Address<ReplicatedKvStore<Fcid, Timestamped<JmMetrics>>>,
	tm_metrics_store: Address<ReplicatedKvStore<Fcid, Timestamped<Vec<TmMetrics>>>>,
	jm_shards: Mutex<ShardRegistry<JmMetricTracker>>,
	tm_shards: Mutex<ShardRegistry<TmMetricsTracker>>,
	jobs_shards: Mutex<ShardRegistry<JobsTracker>>,
}

impl Facade {
	pub fn new(k8s: K8sClient, node_id: impl Into<String>, poll_interval: Duration, spt_trigger_poll_interval: Duration) -> Arc<Self> {
		let node_id = node_id.into();
		Arc::new(Self {
			k8s,
			endpoints: ReplicatedKvStore::new(node_id.clone()).spawn(),
			jobs_cache: ReplicatedKvStore::new(node_id.clone()).spawn(),
			jm_metrics_store: ReplicatedKvStore::new(node_id.clone()).spawn(),
			tm_metrics_store: ReplicatedKvStore::new(node_id).spawn(),
			poll_interval,
			spt_trigger_poll_interval,
			jm_shards: Mutex::new(ShardRegistry::new()),
			tm_shards: Mutex::new(ShardRegistry::new()),
			jobs_shards: Mutex::new(ShardRegistry::new()),
		})
	}

	/// Idempotent: forwards `Start` to every tracker entity hosting `fcid`.
	pub async fn track_cluster(self: &Arc<Self>, fcid: &Fcid) -> Result<()> {
		let resolver: Arc<dyn EndpointResolver> = Arc::new(FacadeEndpointResolver(self.clone()));

		let jm_addr = {
			let mut shards = self.jm_shards.lock();
			let store = self.jm_metrics_store.clone();
			let resolver = resolver.clone();
			let poll_interval = self.poll_interval;
			shards.route_or_spawn(fcid, move |fcid| {
				JmMetricTracker::new(fcid, poll_interval, resolver, Arc::new(pollers::JmMetricsPoller { keys: vec![] }), store)
			})
		};
		let tm_addr = {
			let mut shards = self.tm_shards.lock();
			let store = self.tm_metrics_store.clone();
			let resolver = resolver.clone();
			let poll_interval = self.poll_interval;
			shards.route_or_spawn(fcid, move |fcid| {
				TmMetricsTracker::new(fcid, poll_interval, resolver, Arc::new(pollers::TmMetricsPoller { keys: vec![] }), store)
			})
		};
		let jobs_addr = {
			let mut shards = self.jobs_shards.lock();
			let store = self.jobs_cache.clone();
			let poll_interval = self.poll_interval;
			shards.route_or_spawn(fcid, move |fcid| JobsTracker::new(fcid, poll_interval, resolver, Arc::new(pollers::JobsPoller), store))
		};

		futures::future::try_join3(jm_addr.send(Start), tm_addr.send(Start), jobs_addr.send(Start)).await?;
		Ok(())
	}

	/// Idempotent: stops every tracker entity for `fcid` and purges its cache entries.
	pub async fn untrack_cluster(self: &Arc<Self>, fcid: &Fcid) -> Result<()> {
		let jm_addr = self.jm_shards.lock().remove(fcid);
		let tm_addr = self.tm_shards.lock().remove(fcid);
		let jobs_addr = self.jobs_shards.lock().remove(fcid);
		if let Some(addr) = jm_addr {
			let _ = addr.send(ShardStop).await;
		}
		if let Some(addr) = tm_addr {
			let _ = addr.send(ShardStop).await;
		}
		if let Some(addr) = jobs_addr {
			let _ = addr.send(ShardStop).await;
		}

		let target = fcid.clone();
		self.endpoints.send(RemoveBySelectKey(Box::new(move |k: &Fcid| k == &target))).await?;
		let target = fcid.clone();
		self.jobs_cache.send(RemoveBySelectKey(Box::new(move |k: &Fcid| k == &target))).await?;
		Ok(())
	}

	/// `killCluster`: deletes the cluster's Deployment. Absence surfaces as
	/// `ClusterNotFound` (spec §7 propagation policy), any other failure as
	/// `RequestK8sApiErr`.
	pub async fn kill_cluster(&self, fcid: &Fcid) -> Result<()> {
		match self.k8s.delete_deployment(&fcid.cluster_id, &fcid.namespace).await {
			Ok(true) => Ok(()),
			Ok(false) => Err(Error::ClusterNotFound(fcid.clone())),
			Err(e) => Err(Error::RequestK8sApiErr(e.to_string())),
		}
	}

	pub async fn retrieve_rest_endpoint(&self, fcid: &Fcid, directly: bool) -> Result<RestSvcEndpoint> {
		if !directly {
			if let Some(ep) = self.endpoints.send(Get(fcid.clone(), Consistency::Local, std::marker::PhantomData)).await? {
				return Ok(ep);
			}
		}
		let ep = self
			.k8s
			.find_rest_endpoint(&fcid.cluster_id, &fcid.namespace)
			.await?
			.ok_or_else(|| Error::EndpointNotFound(fcid.clone()))?;
		self.endpoints.send(Put(fcid.clone(), ep.clone())).await?;
		Ok(ep)
	}

	pub async fn list_job_ids(self: &Arc<Self>, fcid: &Fcid) -> Result<Vec<String>> {
		if let Some(snap) = self.jobs_cache.send(Get(fcid.clone(), Consistency::Local, std::marker::PhantomData)).await? {
			return Ok(snap.value.into_iter().map(|j| j.jid).collect());
		}
		let endpoint = self.retrieve_rest_endpoint(fcid, false).await?;
		let client = FlinkRestClient::new(endpoint.base_url());
		Ok(client.job_ids().await?)
	}

	pub async fn watch_savepoint_trigger(self: &Arc<Self>, fjid: &Fjid, trigger_id: &str, timeout: Duration) -> Result<SavepointStatus> {
		let endpoint = self.retrieve_rest_endpoint(&fjid.fcid, false).await?;
		let client = FlinkRestClient::new(endpoint.base_url());
		let deadline = Instant::now() + timeout;

		loop {
			let resp = client.savepoint_status(&fjid.job_id, trigger_id).await?;
			let status = match resp.status.id.as_str() {
				"IN_PROGRESS" => SavepointStatus::InProgress,
				"COMPLETED" => SavepointStatus::Completed { location: resp.operation.as_ref().and_then(|o| o.location.clone()) },
				_ => SavepointStatus::Failed {
					cause: resp.operation.as_ref().and_then(|o| o.failure_cause.as_ref()).and_then(|c| c.stack_trace.clone()),
				},
			};
			if status.is_terminal() {
				return Ok(status);
			}
			if Instant::now() >= deadline {
				return Err(Error::TimeoutErr);
			}
			smol::Timer::new(self.spt_trigger_poll_interval).await;
		}
	}
}
