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

//! Tracker Entity (spec §4.5). Grounded in the teacher's `BlocksIndexer`
//! (`substrate-archive/src/actors/workers/blocks.rs`): `ctx.notify_interval`
//! drives the poll loop, a stop message halts it, and REST/K8s errors are
//! logged and retried next tick rather than propagated.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use xtra::prelude::*;

use flink_operator_common::types::{Fcid, RestSvcEndpoint, Timestamped};
use flink_operator_common::Result as CommonResult;

use crate::sharding::Stop as ShardStop;
use crate::store::{Put, ReplicatedKvStore};

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Resolves the Flink REST endpoint for a cluster; the facade supplies the
/// cache-then-Kubernetes-fallback implementation (spec §4.6).
pub trait EndpointResolver: Send + Sync + 'static {
	fn resolve(&self, fcid: Fcid) -> BoxFuture<CommonResult<RestSvcEndpoint>>;
}

/// Issues the kind-specific REST call and converts the response to a
/// snapshot. One implementation per tracker kind.
pub trait SnapshotPoller<S>: Send + Sync + 'static {
	fn poll(&self, base_url: String) -> BoxFuture<CommonResult<S>>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TrackerState {
	Idle,
	Running,
}

struct Tick;
impl Message for Tick {
	type Result = ();
}

struct Refresh<S>(S);
impl<S: Send + 'static> Message for Refresh<S> {
	type Result = ();
}

pub struct Start;
impl Message for Start {
	type Result = ();
}

pub struct GetSnapshot<S>(pub std::marker::PhantomData<S>);

impl<S> Default for GetSnapshot<S> {
	fn default() -> Self {
		GetSnapshot(std::marker::PhantomData)
	}
}

/// One tracker per `Fcid` per observed resource kind. `S` is the snapshot
/// type (`JmMetrics`, `Vec<TmMetrics>`, `Vec<JobOverview>`).
pub struct Tracker<S: Send + 'static> {
	fcid: Fcid,
	state: TrackerState,
	poll_interval: Duration,
	resolver: Arc<dyn EndpointResolver>,
	poller: Arc<dyn SnapshotPoller<S>>,
	store: Address<ReplicatedKvStore<Fcid, Timestamped<S>>>,
	last: Option<Timestamped<S>>,
}

impl<S> Tracker<S>
where
	S: Clone + Send + 'static,
{
	pub fn new(
		fcid: Fcid,
		poll_interval: Duration,
		resolver: Arc<dyn EndpointResolver>,
		poller: Arc<dyn SnapshotPoller<S>>,
		store: Address<ReplicatedKvStore<Fcid, Timestamped<S>>>,
	) -> Self {
		Self { fcid, state: TrackerState::Idle, poll_interval, resolver, poller, store, last: None }
	}
}

impl<S: Send + 'static> Actor for Tracker<S> {}

impl<S: Send + 'static> Message for GetSnapshot<S> {
	type Result = Option<Timestamped<S>>;
}

#[async_trait::async_trait]
impl<S> Handler<Start> for Tracker<S>
where
	S: Clone + Send + 'static,
{
	async fn handle(&mut self, _: Start, ctx: &mut Context<Self>) {
		if self.state == TrackerState::Running {
			return;
		}
		self.state = TrackerState::Running;
		ctx.notify_interval(self.poll_interval, || Tick);
	}
}

#[async_trait::async_trait]
impl<S> Handler<ShardStop> for Tracker<S>
where
	S: Clone + Send + 'static,
{
	async fn handle(&mut self, _: ShardStop, ctx: &mut Context<Self>) {
		ctx.stop();
	}
}

#[async_trait::async_trait]
impl<S> Handler<GetSnapshot<S>> for Tracker<S>
where
	S: Clone + Send + 'static,
{
	async fn handle(&mut self, _: GetSnapshot<S>, _ctx: &mut Context<Self>) -> Option<Timestamped<S>> {
		match self.state {
			TrackerState::Idle => None,
			TrackerState::Running => self.last.clone(),
		}
	}
}

#[async_trait::async_trait]
impl<S> Handler<Tick> for Tracker<S>
where
	S: Clone + Send + 'static,
{
	async fn handle(&mut self, _: Tick, ctx: &mut Context<Self>) {
		let endpoint = match self.resolver.resolve(self.fcid.clone()).await {
			Ok(ep) => ep,
			Err(e) => {
				log::warn!("endpoint resolution failed for {}: {}", self.fcid, e);
				return;
			}
		};
		let snapshot = match self.poller.poll(endpoint.base_url()).await {
			Ok(s) => s,
			Err(e) => {
				log::warn!("poll failed for {}: {}", self.fcid, e);
				return;
			}
		};
		if let Some(addr) = ctx.address() {
			if addr.do_send(Refresh(snapshot)).is_err() {
				log::error!("tracker {} could not deliver its own refresh: actor disconnected", self.fcid);
			}
		}
	}
}

#[async_trait::async_trait]
impl<S> Handler<Refresh<S>> for Tracker<S>
where
	S: Clone + Send + 'static,
{
	async fn handle(&mut self, msg: Refresh<S>, _ctx: &mut Context<Self>) {
		let stamped = Timestamped::now(msg.0);
		self.last = Some(stamped.clone());
		if self.store.send(Put(self.fcid.clone(), stamped)).await.is_err() {
			log::error!("tracker {} could not publish snapshot: store disconnected", self.fcid);
		}
	}
}

pub mod pollers {
	use super::BoxFuture;
	use flink_operator_backend::FlinkRestClient;
	use flink_operator_common::types::{JmMetrics, JobOverview, TmMetrics};
	use flink_operator_common::Result as CommonResult;

	use super::SnapshotPoller;

	pub struct JmMetricsPoller {
		pub keys: Vec<String>,
	}
	impl SnapshotPoller<JmMetrics> for JmMetricsPoller {
		fn poll(&self, base_url: String) -> BoxFuture<CommonResult<JmMetrics>> {
			let keys = self.keys.clone();
			Box::pin(async move {
				let client = FlinkRestClient::new(base_url);
				let refs: Vec<&str> = keys.iter().map(String::as_str).collect();
				let raw = client.jobmanager_metrics(&refs).await?;
				Ok(JmMetrics { raw })
			})
		}
	}

	pub struct TmMetricsPoller {
		pub keys: Vec<String>,
	}
	impl SnapshotPoller<Vec<TmMetrics>> for TmMetricsPoller {
		fn poll(&self, base_url: String) -> BoxFuture<CommonResult<Vec<TmMetrics>>> {
			let keys = self.keys.clone();
			Box::pin(async move {
				let client = FlinkRestClient::new(base_url);
				let ids = client.taskmanager_ids().await?;
				let refs: Vec<&str> = keys.iter().map(String::as_str).collect();
				let mut snapshots = Vec::with_capacity(ids.len());
				for id in ids {
					let raw = client.taskmanager_metrics(&id, &refs).await?;
					snapshots.push(TmMetrics { taskmanager_id: id, raw });
				}
				Ok(snapshots)
			})
		}
	}

	pub struct JobsPoller;
	impl SnapshotPoller<Vec<JobOverview>> for JobsPoller {
		fn poll(&self, base_url: String) -> BoxFuture<CommonResult<Vec<JobOverview>>> {
			Box::pin(async move {
				let client = FlinkRestClient::new(base_url);
				let overview = client.jobs_overview().await?;
				Ok(overview
					.jobs
					.into_iter()
					.map(|j| JobOverview { jid: j.jid, name: j.name, state: j.state })
					.collect())
			})
		}
	}
}

pub type JmMetricTracker = Tracker<flink_operator_common::types::JmMetrics>;
pub type TmMetricsTracker = Tracker<Vec<flink_operator_common::types::TmMetrics>>;
pub type JobsTracker = Tracker<Vec<flink_operator_common::types::JobOverview>>;

#[cfg(test)]
mod tests {
	use super::*;
	use flink_operator_common::types::JmMetrics;
	use std::sync::atomic::{AtomicUsize, Ordering};

	struct AlwaysEndpoint(RestSvcEndpoint);
	impl EndpointResolver for AlwaysEndpoint {
		fn resolve(&self, _fcid: Fcid) -> BoxFuture<CommonResult<RestSvcEndpoint>> {
			let ep = self.0.clone();
			Box::pin(async move { Ok(ep) })
		}
	}

	struct CountingPoller(Arc<AtomicUsize>);
	impl SnapshotPoller<JmMetrics> for CountingPoller {
		fn poll(&self, _base_url: String) -> BoxFuture<CommonResult<JmMetrics>> {
			let counter = self.0.clone();
			Box::pin(async move {
				counter.fetch_add(1, Ordering::SeqCst);
				Ok(JmMetrics::default())
			})
		}
	}

	#[test]
	fn idle_tracker_replies_none_to_get_snapshot() {
		smol::block_on(async {
			let store = ReplicatedKvStore::<Fcid, Timestamped<JmMetrics>>::new("node-a").spawn();
			let resolver = Arc::new(AlwaysEndpoint(RestSvcEndpoint { cluster_ip: "10.0.0.1".to_string(), cluster_port: 8081, pod_ip: None, dns: None }));
			let poller = Arc::new(CountingPoller(Arc::new(AtomicUsize::new(0))));
			let tracker = Tracker::new(Fcid::new("c1", "ns1"), Duration::from_secs(5), resolver, poller, store);
			let addr = tracker.spawn();
			assert_eq!(addr.send(GetSnapshot::<JmMetrics>::default()).await.unwrap(), None);
		});
	}

	#[test]
	fn start_is_idempotent() {
		smol::block_on(async {
			let store = ReplicatedKvStore::<Fcid, Timestamped<JmMetrics>>::new("node-a").spawn();
			let resolver = Arc::new(AlwaysEndpoint(RestSvcEndpoint { cluster_ip: "10.0.0.1".to_string(), cluster_port: 8081, pod_ip: None, dns: None }));
			let poller = Arc::new(CountingPoller(Arc::new(AtomicUsize::new(0))));
			let tracker = Tracker::new(Fcid::new("c1", "ns1"), Duration::from_secs(30), resolver, poller, store);
			let addr = tracker.spawn();
			addr.send(Start).await.unwrap();
			addr.send(Start).await.unwrap();
			addr.send(ShardStop).await.unwrap();
		});
	}

	/// S5: stopping a running tracker that just computed a snapshot still
	/// terminates it, and a freshly spawned replacement starts `Idle` again.
	#[test]
	fn stop_races_refresh_and_fresh_entity_starts_idle() {
		smol::block_on(async {
			let store = ReplicatedKvStore::<Fcid, Timestamped<JmMetrics>>::new("node-a").spawn();
			let resolver = Arc::new(AlwaysEndpoint(RestSvcEndpoint { cluster_ip: "10.0.0.1".to_string(), cluster_port: 8081, pod_ip: None, dns: None }));
			let poller = Arc::new(CountingPoller(Arc::new(AtomicUsize::new(0))));
			let fcid = Fcid::new("c1", "ns1");
			let tracker = Tracker::new(fcid.clone(), Duration::from_millis(10), resolver.clone(), poller.clone(), store.clone());
			let addr = tracker.spawn();

			addr.send(Start).await.unwrap();
			smol::Timer::new(Duration::from_millis(50)).await;
			addr.send(ShardStop).await.unwrap();
			smol::Timer::new(Duration::from_millis(20)).await;
			assert!(addr.send(GetSnapshot::<JmMetrics>::default()).await.is_err());

			let fresh = Tracker::new(fcid, Duration::from_secs(30), resolver, poller, store).spawn();
			assert_eq!(fresh.send(GetSnapshot::<JmMetrics>::default()).await.unwrap(), None);
		});
	}

	/// Invariant 6: across successive `Refresh` events the cached snapshot's
	/// timestamp never moves backward.
	#[test]
	fn refresh_timestamps_are_non_decreasing() {
		smol::block_on(async {
			let store = ReplicatedKvStore::<Fcid, Timestamped<JmMetrics>>::new("node-a").spawn();
			let resolver = Arc::new(AlwaysEndpoint(RestSvcEndpoint { cluster_ip: "10.0.0.1".to_string(), cluster_port: 8081, pod_ip: None, dns: None }));
			let poller = Arc::new(CountingPoller(Arc::new(AtomicUsize::new(0))));
			let fcid = Fcid::new("c1", "ns1");
			let tracker = Tracker::new(fcid.clone(), Duration::from_millis(10), resolver, poller, store.clone());
			let addr = tracker.spawn();

			addr.send(Start).await.unwrap();
			smol::Timer::new(Duration::from_millis(30)).await;
			let first = addr.send(GetSnapshot::<JmMetrics>::default()).await.unwrap();
			smol::Timer::new(Duration::from_millis(30)).await;
			let second = addr.send(GetSnapshot::<JmMetrics>::default()).await.unwrap();

			if let (Some(f), Some(s)) = (first, second) {
				assert!(s.ts >= f.ts);
			}
		});
	}
}
