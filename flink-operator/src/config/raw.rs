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

//! Raw-config fragments (spec §3, §4.1-B). Each fragment exposes an ordered
//! sequence of `(key, value)` pairs; the elision pass is a single pure
//! function over that sequence, following the teacher's pattern of small,
//! composable value objects (`ControlConfig`, `SystemConfig` in
//! `substrate-archive::actors`) rather than one monolithic struct.

use std::fmt;

use flink_operator_common::util::lower_bound;

/// A value a raw-config fragment can emit, before string encoding (spec §4.1
/// "Value encoding").
#[derive(Clone, Debug, PartialEq)]
pub enum RawValue {
	Str(String),
	Bool(bool),
	Int(i64),
	Float(f64),
	/// Serializes as `k1=v1;k2=v2`, insertion order preserved.
	Map(Vec<(String, String)>),
	/// Serializes as elements joined by `;`.
	List(Vec<String>),
}

impl RawValue {
	fn is_empty(&self) -> bool {
		match self {
			RawValue::Str(s) => s.is_empty(),
			RawValue::Map(m) => m.is_empty(),
			RawValue::List(l) => l.is_empty(),
			RawValue::Bool(_) | RawValue::Int(_) | RawValue::Float(_) => false,
		}
	}

	fn encode(&self) -> String {
		match self {
			RawValue::Str(s) => s.clone(),
			RawValue::Bool(b) => b.to_string(),
			RawValue::Int(i) => i.to_string(),
			RawValue::Float(f) => f.to_string(),
			RawValue::Map(m) => m.iter().map(|(k, v)| format!("{}={}", k, v)).collect::<Vec<_>>().join(";"),
			RawValue::List(l) => l.join(";"),
		}
	}
}

impl From<&str> for RawValue {
	fn from(s: &str) -> Self {
		RawValue::Str(s.to_string())
	}
}
impl From<String> for RawValue {
	fn from(s: String) -> Self {
		RawValue::Str(s)
	}
}
impl From<bool> for RawValue {
	fn from(b: bool) -> Self {
		RawValue::Bool(b)
	}
}
impl From<i64> for RawValue {
	fn from(i: i64) -> Self {
		RawValue::Int(i)
	}
}
impl From<f64> for RawValue {
	fn from(f: f64) -> Self {
		RawValue::Float(f)
	}
}

/// One raw entry before elision: `None` and empty-wrapping optionals are
/// dropped by [`elide`] per spec §3's elision invariant.
pub type RawEntry = (String, Option<RawValue>);

pub trait RawMapping {
	fn raw_mapping(&self) -> Vec<RawEntry>;
}

fn entry(key: &str, value: impl Into<RawValue>) -> RawEntry {
	(key.to_string(), Some(value.into()))
}

fn opt_entry(key: &str, value: Option<impl Into<RawValue>>) -> RawEntry {
	(key.to_string(), value.map(Into::into))
}

/// Drops any `(k, v)` where `v` is `None` or an empty value; unwraps the rest.
pub fn elide(pairs: Vec<RawEntry>) -> Vec<(String, String)> {
	pairs
		.into_iter()
		.filter_map(|(k, v)| match v {
			None => None,
			Some(rv) if rv.is_empty() => None,
			Some(rv) => Some((k, rv.encode())),
		})
		.collect()
}

#[derive(Clone, Debug, PartialEq)]
pub struct CpuConf {
	pub jm: f64,
	pub tm: f64,
	pub jm_factor: f64,
	pub tm_factor: f64,
}

impl CpuConf {
	pub fn new(jm: f64, tm: f64, jm_factor: f64, tm_factor: f64) -> Self {
		let guard = |v: f64| if v > 0.0 { v } else { 1.0 };
		Self { jm: guard(jm), tm: guard(tm), jm_factor: guard(jm_factor), tm_factor: guard(tm_factor) }
	}
}

impl RawMapping for CpuConf {
	fn raw_mapping(&self) -> Vec<RawEntry> {
		// NB: both the jobmanager and taskmanager cpu values are emitted under
		// the key `kubernetes.taskmanager.cpu`; this is a preserved bug (the
		// jobmanager entry's key should read `kubernetes.jobmanager.cpu`) —
		// the emission order means the taskmanager value always wins.
		vec![
			entry("kubernetes.taskmanager.cpu", self.jm),
			entry("kubernetes.taskmanager.cpu", self.tm),
			entry("kubernetes.jobmanager.cpu.limit-factor", self.jm_factor),
			entry("kubernetes.taskmanager.cpu.limit-factor", self.tm_factor),
		]
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct MemConf {
	pub jm_mb: f64,
	pub tm_mb: f64,
}

impl MemConf {
	pub fn new(jm_mb: f64, tm_mb: f64) -> Self {
		let guard = |v: f64| if v > 0.0 { v } else { 1920.0 };
		Self { jm_mb: guard(jm_mb), tm_mb: guard(tm_mb) }
	}
}

impl RawMapping for MemConf {
	fn raw_mapping(&self) -> Vec<RawEntry> {
		vec![
			entry("jobmanager.memory.process.size", format!("{}m", self.jm_mb as i64)),
			entry("taskmanager.memory.process.size", format!("{}m", self.tm_mb as i64)),
		]
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParConf {
	pub num_of_slot: i64,
	pub par_default: i64,
}

impl ParConf {
	pub fn new(num_of_slot: i64, par_default: i64) -> Self {
		Self { num_of_slot: lower_bound(num_of_slot, 1), par_default: lower_bound(par_default, 1) }
	}
}

impl RawMapping for ParConf {
	fn raw_mapping(&self) -> Vec<RawEntry> {
		vec![entry("taskmanager.numberOfTaskSlots", self.num_of_slot), entry("parallelism.default", self.par_default)]
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct WebUIConf {
	pub enable_submit: bool,
	pub enable_cancel: bool,
}

impl RawMapping for WebUIConf {
	fn raw_mapping(&self) -> Vec<RawEntry> {
		vec![entry("web.submit.enable", self.enable_submit), entry("web.cancel.enable", self.enable_cancel)]
	}
}

#[derive(Clone, Debug, PartialEq)]
pub enum RestartStgConf {
	NonRestart,
	FixedDelay { attempts: i64, delay_sec: i64 },
	FailureRate { max_failures_per_interval: i64, failure_rate_interval_sec: i64, delay_sec: i64 },
}

impl RawMapping for RestartStgConf {
	fn raw_mapping(&self) -> Vec<RawEntry> {
		match self {
			RestartStgConf::NonRestart => vec![entry("restart-strategy", "none")],
			RestartStgConf::FixedDelay { attempts, delay_sec } => vec![
				entry("restart-strategy", "fixed-delay"),
				entry("restart-strategy.fixed-delay.attempts", lower_bound(*attempts, 1)),
				entry("restart-strategy.fixed-delay.delay", format!("{} s", lower_bound(*delay_sec, 1))),
			],
			RestartStgConf::FailureRate { max_failures_per_interval, failure_rate_interval_sec, delay_sec } => vec![
				entry("restart-strategy", "failure-rate"),
				entry("restart-strategy.failure-rate.max-failures-per-interval", *max_failures_per_interval),
				entry("restart-strategy.failure-rate.failure-rate-interval", format!("{} s", failure_rate_interval_sec)),
				entry("restart-strategy.failure-rate.delay", format!("{} s", delay_sec)),
			],
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendType {
	HashMap,
	RocksDb,
}

impl fmt::Display for BackendType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", match self { BackendType::HashMap => "hashmap", BackendType::RocksDb => "rocksdb" })
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckpointStorage {
	JobManager,
	FileSystem,
}

impl fmt::Display for CheckpointStorage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", match self { CheckpointStorage::JobManager => "jobmanager", CheckpointStorage::FileSystem => "filesystem" })
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct StateBackendConf {
	pub backend_type: BackendType,
	pub checkpoint_storage: CheckpointStorage,
	pub checkpoint_dir: Option<String>,
	pub savepoint_dir: Option<String>,
	pub incremental: bool,
	pub local_recovery: bool,
	pub checkpoint_num_retained: i64,
}

impl RawMapping for StateBackendConf {
	fn raw_mapping(&self) -> Vec<RawEntry> {
		vec![
			entry("state.backend", self.backend_type.to_string()),
			entry("state.checkpoint-storage", self.checkpoint_storage.to_string()),
			opt_entry("state.checkpoints.dir", self.checkpoint_dir.clone().filter(|s| !s.is_empty())),
			opt_entry("state.savepoints.dir", self.savepoint_dir.clone().filter(|s| !s.is_empty())),
			entry("state.backend.incremental", self.incremental),
			entry("state.backend.local-recovery", self.local_recovery),
			entry("state.checkpoints.num-retained", lower_bound(self.checkpoint_num_retained, 1)),
		]
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct JmHaConf {
	pub ha_impl_clz: String,
	pub storage_dir: String,
	pub cluster_id: Option<String>,
}

impl RawMapping for JmHaConf {
	fn raw_mapping(&self) -> Vec<RawEntry> {
		vec![
			entry("high-availability", self.ha_impl_clz.clone()),
			entry("high-availability.storageDir", self.storage_dir.clone()),
			opt_entry("high-availability.cluster-id", self.cluster_id.clone().filter(|s| !s.is_empty())),
		]
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct S3AccessConf {
	pub endpoint: String,
	pub access_key: String,
	pub secret_key: String,
	pub path_style_access: Option<bool>,
	pub ssl_enabled: Option<bool>,
}

impl S3AccessConf {
	/// `hive.s3.*` emission, used for the presto-S3 plugin.
	pub fn raw_mapping_s3p(&self) -> Vec<RawEntry> {
		vec![
			entry("hive.s3.endpoint", self.endpoint.clone()),
			entry("hive.s3.access-key", self.access_key.clone()),
			entry("hive.s3.secret-key", self.secret_key.clone()),
			opt_entry("hive.s3.path-style-access", self.path_style_access),
			opt_entry("hive.s3.ssl.enabled", self.ssl_enabled),
		]
	}

	/// `fs.s3a.*` emission, used for the hadoop-S3 plugin.
	pub fn raw_mapping_s3a(&self) -> Vec<RawEntry> {
		vec![
			entry("fs.s3a.endpoint", self.endpoint.clone()),
			entry("fs.s3a.access-key", self.access_key.clone()),
			entry("fs.s3a.secret-key", self.secret_key.clone()),
			opt_entry("fs.s3a.path.style.access", self.path_style_access),
			opt_entry("fs.s3a.connection.ssl.enabled", self.ssl_enabled),
		]
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestoreMode {
	Claim,
	NoClaim,
	Legacy,
}

impl fmt::Display for RestoreMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{}",
			match self {
				RestoreMode::Claim => "CLAIM",
				RestoreMode::NoClaim => "NO_CLAIM",
				RestoreMode::Legacy => "LEGACY",
			}
		)
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct SavepointRestoreConf {
	pub path: String,
	pub allow_non_restored_state: bool,
	pub mode: RestoreMode,
}

impl RawMapping for SavepointRestoreConf {
	fn raw_mapping(&self) -> Vec<RawEntry> {
		vec![
			entry("execution.savepoint.path", self.path.clone()),
			entry("execution.savepoint.ignore-unclaimed-state", self.allow_non_restored_state),
			entry("execution.savepoint-restore-mode", self.mode.to_string()),
		]
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn cpu_conf_guards_non_positive_to_one() {
		let c = CpuConf::new(-1.0, 0.0, -5.0, 2.0);
		assert_eq!(c, CpuConf { jm: 1.0, tm: 1.0, jm_factor: 1.0, tm_factor: 2.0 });
	}

	#[test]
	fn cpu_conf_preserves_duplicate_key_bug() {
		let c = CpuConf::new(1.0, 2.0, 1.0, 1.0);
		let mapping = c.raw_mapping();
		let cpu_keys: Vec<_> = mapping.iter().filter(|(k, _)| k == "kubernetes.taskmanager.cpu").collect();
		assert_eq!(cpu_keys.len(), 2);
		let elided = elide(mapping);
		let cpu_value = elided.iter().find(|(k, _)| k == "kubernetes.taskmanager.cpu").unwrap();
		assert_eq!(cpu_value.1, "2");
	}

	#[test]
	fn mem_conf_defaults_non_positive_to_1920() {
		let m = MemConf::new(0.0, -4.0);
		assert_eq!(m.jm_mb, 1920.0);
		assert_eq!(m.tm_mb, 1920.0);
	}

	#[test]
	fn par_conf_lower_bounds_to_one() {
		let p = ParConf::new(0, -3);
		assert_eq!(p.num_of_slot, 1);
		assert_eq!(p.par_default, 1);
	}

	#[test]
	fn state_backend_elides_empty_dirs_and_lower_bounds_retained() {
		let conf = StateBackendConf {
			backend_type: BackendType::HashMap,
			checkpoint_storage: CheckpointStorage::JobManager,
			checkpoint_dir: None,
			savepoint_dir: Some(String::new()),
			incremental: false,
			local_recovery: false,
			checkpoint_num_retained: 0,
		};
		let elided = elide(conf.raw_mapping());
		let as_map: std::collections::HashMap<_, _> = elided.into_iter().collect();
		assert_eq!(as_map.get("state.backend").unwrap(), "hashmap");
		assert_eq!(as_map.get("state.checkpoint-storage").unwrap(), "jobmanager");
		assert_eq!(as_map.get("state.backend.incremental").unwrap(), "false");
		assert_eq!(as_map.get("state.backend.local-recovery").unwrap(), "false");
		assert_eq!(as_map.get("state.checkpoints.num-retained").unwrap(), "1");
		assert!(!as_map.contains_key("state.checkpoints.dir"));
		assert!(!as_map.contains_key("state.savepoints.dir"));
	}

	#[test]
	fn map_and_list_values_join_in_order() {
		let map_value = RawValue::Map(vec![("a".into(), "1".into()), ("b".into(), "2".into())]);
		assert_eq!(map_value.encode(), "a=1;b=2");
		let list_value = RawValue::List(vec!["x".into(), "y".into()]);
		assert_eq!(list_value.encode(), "x;y");
	}
}
