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

//! Sharding Proxy (spec §4.4). Grounded directly in the teacher's
//! `ActorPool` (`archive/src/actors/actor_pool.rs`): a registry keyed by the
//! marshaled entity key, addresses handed out lazily, a `Stop` message
//! draining the registry entry. Passivation is disabled — entities remain
//! live until explicitly stopped.

use std::collections::HashMap;

use xtra::prelude::*;

use flink_operator_common::types::Fcid;

/// Marks the node role entities in this shard registry are bound to. Real
/// cluster membership/node-role binding is an external collaborator; this
/// in-process build always acts as if it owns every shard it is asked to
/// host, so the marker carries no runtime behavior.
pub struct FlinkOperator;

pub struct Stop;
impl Message for Stop {
	type Result = ();
}

/// Registry of lazily-spawned entity addresses keyed by the marshaled `Fcid`.
pub struct ShardRegistry<A: Actor> {
	entities: HashMap<String, Address<A>>,
}

impl<A> ShardRegistry<A>
where
	A: Actor + Handler<Stop>,
{
	pub fn new() -> Self {
		Self { entities: HashMap::new() }
	}

	/// Routes to the entity already hosting `fcid`'s shard, spawning one via
	/// `factory` if none exists yet.
	pub fn route_or_spawn(&mut self, fcid: &Fcid, factory: impl FnOnce(Fcid) -> A) -> Address<A> {
		let key = fcid.marshal();
		if let Some(addr) = self.entities.get(&key) {
			if addr.is_connected() {
				return addr.clone();
			}
		}
		let addr = factory(fcid.clone()).spawn();
		self.entities.insert(key, addr.clone());
		addr
	}

	pub fn get(&self, fcid: &Fcid) -> Option<Address<A>> {
		self.entities.get(&fcid.marshal()).cloned()
	}

	/// Releases the shard slot and hands back its address, synchronously, so
	/// the caller can await `Stop` delivery after releasing whatever lock
	/// guards this registry — this type has no internal lock to guard it
	/// itself, but sharing it behind a `Mutex` (as the facade does) means an
	/// `async fn stop` here would hold that mutex across the `Stop` send.
	pub fn remove(&mut self, fcid: &Fcid) -> Option<Address<A>> {
		self.entities.remove(&fcid.marshal())
	}

	/// Sends the entity its designated `Stop` and releases the shard slot.
	pub async fn stop(&mut self, fcid: &Fcid) {
		if let Some(addr) = self.remove(fcid) {
			let _ = addr.send(Stop).await;
		}
	}
}

impl<A: Actor + Handler<Stop>> Default for ShardRegistry<A> {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	struct Echo(u32);
	impl Actor for Echo {}
	#[async_trait::async_trait]
	impl Handler<Stop> for Echo {
		async fn handle(&mut self, _: Stop, ctx: &mut Context<Self>) {
			ctx.stop();
		}
	}

	#[test]
	fn route_or_spawn_reuses_existing_shard() {
		smol::block_on(async {
			let mut registry: ShardRegistry<Echo> = ShardRegistry::new();
			let fcid = Fcid::new("c1", "ns1");
			let mut spawned = 0;
			registry.route_or_spawn(&fcid, |_| {
				spawned += 1;
				Echo(1)
			});
			registry.route_or_spawn(&fcid, |_| {
				spawned += 1;
				Echo(2)
			});
			assert_eq!(spawned, 1);
		});
	}

	#[test]
	fn stop_releases_the_shard_slot() {
		smol::block_on(async {
			let mut registry: ShardRegistry<Echo> = ShardRegistry::new();
			let fcid = Fcid::new("c1", "ns1");
			registry.route_or_spawn(&fcid, |_| Echo(1));
			registry.stop(&fcid).await;
			assert!(registry.get(&fcid).is_none());
		});
	}
}
