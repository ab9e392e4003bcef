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

//! Replicated KV Store (spec §4.3): a generic last-writer-wins map. The
//! in-process build degenerates to one actor-owned `HashMap` guarded by
//! message-passing (spec §9) — multi-node gossip is an external collaborator
//! not implemented here. Modeled on the teacher's `ActorPool` message-passing
//! idiom (`archive/src/actors/actor_pool.rs`): state lives behind an actor,
//! callers only ever see it through `Address::send`.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use xtra::prelude::*;

/// Read/write consistency level carried on every request (spec §4.3). The
/// single-process build has exactly one replica, so every level behaves
/// identically; the type exists so callers written against a multi-node
/// deployment compile unchanged against this build.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Consistency {
	Local,
	Majority,
	All,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Tag {
	counter: u64,
	node_id: String,
}

struct Versioned<V> {
	tag: Tag,
	value: V,
}

/// The store actor. `K`/`V` are the entity key / value types a single
/// deployment chooses (e.g. `Fcid` / `Timestamped<JmMetrics>`).
pub struct ReplicatedKvStore<K, V> {
	node_id: String,
	counter: u64,
	entries: HashMap<K, Versioned<V>>,
}

impl<K, V> ReplicatedKvStore<K, V>
where
	K: Eq + Hash + Clone + Send + 'static,
	V: Clone + Send + 'static,
{
	pub fn new(node_id: impl Into<String>) -> Self {
		Self { node_id: node_id.into(), counter: 0, entries: HashMap::new() }
	}

	fn next_tag(&mut self) -> Tag {
		self.counter += 1;
		Tag { node_id: self.node_id.clone(), counter: self.counter }
	}

	/// Inserts `value` tagged with a freshly minted write tag, unless an
	/// existing entry carries a tag that already dominates it (LWW).
	fn put_tagged(&mut self, key: K, value: V) {
		let tag = self.next_tag();
		match self.entries.get(&key) {
			Some(existing) if existing.tag > tag => {}
			_ => {
				self.entries.insert(key, Versioned { tag, value });
			}
		}
	}
}

impl<K: Send + 'static, V: Send + 'static> Actor for ReplicatedKvStore<K, V> {}

pub struct Get<K, V>(pub K, pub Consistency, pub std::marker::PhantomData<V>);
impl<K: Send + 'static, V: Send + 'static> Message for Get<K, V> {
	type Result = Option<V>;
}
#[async_trait::async_trait]
impl<K, V> Handler<Get<K, V>> for ReplicatedKvStore<K, V>
where
	K: Eq + Hash + Clone + Send + 'static,
	V: Clone + Send + 'static,
{
	async fn handle(&mut self, msg: Get<K, V>, _: &mut Context<Self>) -> Option<V> {
		self.entries.get(&msg.0).map(|v| v.value.clone())
	}
}

pub struct Contains<K>(pub K);
impl<K: Send + 'static> Message for Contains<K> {
	type Result = bool;
}
#[async_trait::async_trait]
impl<K, V> Handler<Contains<K>> for ReplicatedKvStore<K, V>
where
	K: Eq + Hash + Clone + Send + 'static,
	V: Clone + Send + 'static,
{
	async fn handle(&mut self, msg: Contains<K>, _: &mut Context<Self>) -> bool {
		self.entries.contains_key(&msg.0)
	}
}

pub struct ListKeys<K>(pub std::marker::PhantomData<K>);
impl<K: Send + 'static> Message for ListKeys<K> {
	type Result = HashSet<K>;
}
#[async_trait::async_trait]
impl<K, V> Handler<ListKeys<K>> for ReplicatedKvStore<K, V>
where
	K: Eq + Hash + Clone + Send + 'static,
	V: Clone + Send + 'static,
{
	async fn handle(&mut self, _: ListKeys<K>, _: &mut Context<Self>) -> HashSet<K> {
		self.entries.keys().cloned().collect()
	}
}

pub struct ListAll<K, V>(pub std::marker::PhantomData<(K, V)>);
impl<K: Send + 'static, V: Send + 'static> Message for ListAll<K, V> {
	type Result = HashMap<K, V>;
}
#[async_trait::async_trait]
impl<K, V> Handler<ListAll<K, V>> for ReplicatedKvStore<K, V>
where
	K: Eq + Hash + Clone + Send + 'static,
	V: Clone + Send + 'static,
{
	async fn handle(&mut self, _: ListAll<K, V>, _: &mut Context<Self>) -> HashMap<K, V> {
		self.entries.iter().map(|(k, v)| (k.clone(), v.value.clone())).collect()
	}
}

pub struct Size;
impl Message for Size {
	type Result = usize;
}
#[async_trait::async_trait]
impl<K, V> Handler<Size> for ReplicatedKvStore<K, V>
where
	K: Eq + Hash + Clone + Send + 'static,
	V: Clone + Send + 'static,
{
	async fn handle(&mut self, _: Size, _: &mut Context<Self>) -> usize {
		self.entries.len()
	}
}

pub struct Put<K, V>(pub K, pub V);
impl<K: Send + 'static, V: Send + 'static> Message for Put<K, V> {
	type Result = ();
}
#[async_trait::async_trait]
impl<K, V> Handler<Put<K, V>> for ReplicatedKvStore<K, V>
where
	K: Eq + Hash + Clone + Send + 'static,
	V: Clone + Send + 'static,
{
	async fn handle(&mut self, msg: Put<K, V>, _: &mut Context<Self>) {
		self.put_tagged(msg.0, msg.1);
	}
}

pub struct PutAll<K, V>(pub Vec<(K, V)>);
impl<K: Send + 'static, V: Send + 'static> Message for PutAll<K, V> {
	type Result = ();
}
#[async_trait::async_trait]
impl<K, V> Handler<PutAll<K, V>> for ReplicatedKvStore<K, V>
where
	K: Eq + Hash + Clone + Send + 'static,
	V: Clone + Send + 'static,
{
	async fn handle(&mut self, msg: PutAll<K, V>, _: &mut Context<Self>) {
		for (k, v) in msg.0 {
			self.put_tagged(k, v);
		}
	}
}

pub struct Remove<K>(pub K);
impl<K: Send + 'static> Message for Remove<K> {
	type Result = ();
}
#[async_trait::async_trait]
impl<K, V> Handler<Remove<K>> for ReplicatedKvStore<K, V>
where
	K: Eq + Hash + Clone + Send + 'static,
	V: Clone + Send + 'static,
{
	async fn handle(&mut self, msg: Remove<K>, _: &mut Context<Self>) {
		self.entries.remove(&msg.0);
	}
}

pub struct RemoveAll<K>(pub HashSet<K>);
impl<K: Send + 'static> Message for RemoveAll<K> {
	type Result = ();
}
#[async_trait::async_trait]
impl<K, V> Handler<RemoveAll<K>> for ReplicatedKvStore<K, V>
where
	K: Eq + Hash + Clone + Send + 'static,
	V: Clone + Send + 'static,
{
	async fn handle(&mut self, msg: RemoveAll<K>, _: &mut Context<Self>) {
		for k in msg.0 {
			self.entries.remove(&k);
		}
	}
}

/// Boxed predicate so `RemoveBySelectKey` stays a concrete, `Message`-able type.
pub struct RemoveBySelectKey<K>(pub Box<dyn Fn(&K) -> bool + Send>);
impl<K: Send + 'static> Message for RemoveBySelectKey<K> {
	type Result = ();
}
#[async_trait::async_trait]
impl<K, V> Handler<RemoveBySelectKey<K>> for ReplicatedKvStore<K, V>
where
	K: Eq + Hash + Clone + Send + 'static,
	V: Clone + Send + 'static,
{
	async fn handle(&mut self, msg: RemoveBySelectKey<K>, _: &mut Context<Self>) {
		self.entries.retain(|k, _| !(msg.0)(k));
	}
}

/// No-op if `key` is absent.
pub struct Update<K, V>(pub K, pub Box<dyn FnOnce(V) -> V + Send>);
impl<K: Send + 'static, V: Send + 'static> Message for Update<K, V> {
	type Result = ();
}
#[async_trait::async_trait]
impl<K, V> Handler<Update<K, V>> for ReplicatedKvStore<K, V>
where
	K: Eq + Hash + Clone + Send + 'static,
	V: Clone + Send + 'static,
{
	async fn handle(&mut self, msg: Update<K, V>, _: &mut Context<Self>) {
		if let Some(existing) = self.entries.remove(&msg.0) {
			let tag = self.next_tag();
			self.entries.insert(msg.0, Versioned { tag, value: (msg.1)(existing.value) });
		}
	}
}

/// Inserts `v_put` if absent, otherwise applies `f` to the current value.
pub struct Upsert<K, V>(pub K, pub V, pub Box<dyn FnOnce(V) -> V + Send>);
impl<K: Send + 'static, V: Send + 'static> Message for Upsert<K, V> {
	type Result = ();
}
#[async_trait::async_trait]
impl<K, V> Handler<Upsert<K, V>> for ReplicatedKvStore<K, V>
where
	K: Eq + Hash + Clone + Send + 'static,
	V: Clone + Send + 'static,
{
	async fn handle(&mut self, msg: Upsert<K, V>, _: &mut Context<Self>) {
		match self.entries.remove(&msg.0) {
			None => self.put_tagged(msg.0, msg.1),
			Some(existing) => {
				let tag = self.next_tag();
				self.entries.insert(msg.0, Versioned { tag, value: (msg.2)(existing.value) });
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use smol::block_on;

	#[test]
	fn put_then_get_round_trips() {
		block_on(async {
			let addr = ReplicatedKvStore::<String, i32>::new("node-a").spawn();
			addr.send(Put("k1".to_string(), 42)).await.unwrap();
			assert_eq!(addr.send(Get("k1".to_string(), Consistency::Local, std::marker::PhantomData)).await.unwrap(), Some(42));
			assert_eq!(addr.send(Get("missing".to_string(), Consistency::Local, std::marker::PhantomData)).await.unwrap(), None);
		});
	}

	#[test]
	fn remove_by_select_key_purges_matching_entries() {
		block_on(async {
			let addr = ReplicatedKvStore::<String, i32>::new("node-a").spawn();
			addr.send(Put("ns1/c1".to_string(), 1)).await.unwrap();
			addr.send(Put("ns1/c2".to_string(), 2)).await.unwrap();
			addr.send(Put("ns2/c1".to_string(), 3)).await.unwrap();
			addr.send(RemoveBySelectKey(Box::new(|k: &String| k.starts_with("ns1/")))).await.unwrap();
			let remaining = addr.send(ListKeys(std::marker::PhantomData)).await.unwrap();
			assert_eq!(remaining, HashSet::from(["ns2/c1".to_string()]));
		});
	}

	#[test]
	fn update_is_noop_when_key_absent() {
		block_on(async {
			let addr = ReplicatedKvStore::<String, i32>::new("node-a").spawn();
			addr.send(Update("missing".to_string(), Box::new(|v: i32| v + 1))).await.unwrap();
			assert_eq!(addr.send(Size).await.unwrap(), 0);
		});
	}

	#[test]
	fn upsert_inserts_then_updates() {
		block_on(async {
			let addr = ReplicatedKvStore::<String, i32>::new("node-a").spawn();
			addr.send(Upsert("k1".to_string(), 1, Box::new(|v: i32| v + 100))).await.unwrap();
			assert_eq!(addr.send(Get("k1".to_string(), Consistency::Local, std::marker::PhantomData)).await.unwrap(), Some(1));
			addr.send(Upsert("k1".to_string(), 1, Box::new(|v: i32| v + 100))).await.unwrap();
			assert_eq!(addr.send(Get("k1".to_string(), Consistency::Local, std::marker::PhantomData)).await.unwrap(), Some(101));
		});
	}
}
