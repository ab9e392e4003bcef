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

//! Cluster Definition Resolver (spec §4.1). `revise` and `to_flink_raw_config`
//! are both pure: given the same inputs they always produce the same output,
//! and neither performs I/O.

use std::collections::{BTreeMap, HashSet};

use flink_operator_common::util::{is_s3_path, non_blank, revise_to_s3p_schema};

use super::def::{FlinkClusterDef, PotaConf};
use super::raw::{elide, RawMapping};
use crate::error::{Error, Result};

const RESERVED_KEYS: &[&str] = &[
	"execution.target",
	"kubernetes.cluster-id",
	"kubernetes.namespace",
	"kubernetes.container.image",
	"kubernetes.service-account",
	"kubernetes.jobmanager.service-account",
	"kubernetes.pod-template-file",
	"kubernetes.pod-template-file.taskmanager",
	"kubernetes.pod-template-file.jobmanager",
	"$internal.deployment.config-dir",
	"pipeline.jars",
	"$internal.application.main",
	"$internal.application.program-args",
];

/// Versioned Flink built-in plugin JAR names (spec §4.1 step 2/4, glossary
/// "Built-in plugin").
pub struct PluginRegistry;

impl PluginRegistry {
	/// Resolves a user-supplied plugin name to its versioned JAR filename, or
	/// `None` if the name isn't a registry entry (the literal is kept as-is).
	pub fn resolve(name: &str, flink_ver: &str) -> Option<String> {
		match name {
			"presto-s3" | "flink-s3-fs-presto" => Some(Self::presto_s3_jar(flink_ver)),
			"hadoop-s3" | "flink-s3-fs-hadoop" => Some(Self::hadoop_s3_jar(flink_ver)),
			_ => None,
		}
	}

	pub fn presto_s3_jar(flink_ver: &str) -> String {
		format!("flink-s3-fs-presto-{}.jar", flink_ver)
	}

	pub fn hadoop_s3_jar(flink_ver: &str) -> String {
		format!("flink-s3-fs-hadoop-{}.jar", flink_ver)
	}
}

/// `revise(def) -> def'` — validates and normalizes a cluster definition.
/// Idempotent: `revise(revise(def)) == revise(def)`.
pub fn revise(def: &FlinkClusterDef) -> Result<FlinkClusterDef> {
	let mut def = def.clone();

	reject_reserved_keys(&mut def);
	normalize_built_in_plugins(&mut def);
	rewrite_s3_paths(&mut def);
	ensure_s3_plugins(&mut def);
	// ensure Hadoop plugins: reserved, currently identity.

	Ok(def)
}

fn reject_reserved_keys(def: &mut FlinkClusterDef) {
	let common = def.common_mut();
	let filtered: BTreeMap<String, String> = std::mem::take(&mut common.ext_raw_configs)
		.into_iter()
		.filter_map(|(k, v)| {
			let key = non_blank(&k)?;
			let value = non_blank(&v)?;
			if RESERVED_KEYS.contains(&key.as_str()) {
				return None;
			}
			Some((key, value))
		})
		.collect();
	common.ext_raw_configs = filtered;
}

fn normalize_built_in_plugins(def: &mut FlinkClusterDef) {
	let flink_ver = def.common().flink_ver.clone();
	let common = def.common_mut();
	let normalized: HashSet<String> = std::mem::take(&mut common.built_in_plugins)
		.into_iter()
		.filter_map(|name| non_blank(&name))
		.map(|name| PluginRegistry::resolve(&name, &flink_ver).unwrap_or(name))
		.collect();
	common.built_in_plugins = normalized;
}

fn rewrite_s3_paths(def: &mut FlinkClusterDef) {
	let common = def.common_mut();
	if let Some(sb) = common.state_backend.as_mut() {
		if let Some(dir) = sb.checkpoint_dir.as_mut() {
			*dir = revise_to_s3p_schema(dir);
		}
		if let Some(dir) = sb.savepoint_dir.as_mut() {
			*dir = revise_to_s3p_schema(dir);
		}
	}
	if let Some(ha) = common.jm_ha.as_mut() {
		ha.storage_dir = revise_to_s3p_schema(&ha.storage_dir);
	}
	common.injected_deps = common.injected_deps.drain().map(|d| revise_to_s3p_schema(&d)).collect();

	if let FlinkClusterDef::Application(_, extra) = def {
		extra.job_jar = revise_to_s3p_schema(&extra.job_jar);
	}
}

/// `isS3Required` (spec §4.1 step 4).
fn is_s3_required(def: &FlinkClusterDef) -> bool {
	let common = def.common();
	let state_backend_s3 = common
		.state_backend
		.as_ref()
		.map(|sb| sb.checkpoint_dir.as_deref().map(is_s3_path).unwrap_or(false) || sb.savepoint_dir.as_deref().map(is_s3_path).unwrap_or(false))
		.unwrap_or(false);
	let ha_s3 = common.jm_ha.as_ref().map(|ha| is_s3_path(&ha.storage_dir)).unwrap_or(false);
	let deps_s3 = common.injected_deps.iter().any(|d| is_s3_path(d));
	let jar_s3 = match def {
		FlinkClusterDef::Application(_, extra) => is_s3_path(&extra.job_jar),
		FlinkClusterDef::Session(_) => false,
	};
	state_backend_s3 || ha_s3 || deps_s3 || jar_s3
}

fn ensure_s3_plugins(def: &mut FlinkClusterDef) {
	let required = is_s3_required(def);
	let flink_ver = def.common().flink_ver.clone();
	let has_s3 = def.common().s3.is_some();
	let common = def.common_mut();
	if required {
		let presto_jar = PluginRegistry::presto_s3_jar(&flink_ver);
		if !common.built_in_plugins.contains(&presto_jar) {
			common.built_in_plugins.insert(presto_jar);
		}
	}
	if has_s3 {
		let hadoop_jar = PluginRegistry::hadoop_s3_jar(&flink_ver);
		if !common.built_in_plugins.contains(&hadoop_jar) {
			common.built_in_plugins.insert(hadoop_jar);
		}
	}
}

/// An ordered key/value map with last-write-wins semantics on `set`,
/// preserving first-seen insertion order for display and testing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Configuration {
	entries: Vec<(String, String)>,
}

impl Configuration {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn set(&mut self, key: &str, value: impl Into<String>) {
		let value = value.into();
		if let Some(existing) = self.entries.iter_mut().find(|(k, _)| k == key) {
			existing.1 = value;
		} else {
			self.entries.push((key.to_string(), value));
		}
	}

	fn extend_elided(&mut self, pairs: Vec<(String, String)>) {
		for (k, v) in pairs {
			self.set(&k, v);
		}
	}

	pub fn get(&self, key: &str) -> Option<&str> {
		self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
	}

	pub fn as_pairs(&self) -> &[(String, String)] {
		&self.entries
	}
}

/// `toFlinkRawConfig(def', potaConf) -> Configuration` (spec §4.1 "Emission").
pub fn to_flink_raw_config(def: &FlinkClusterDef, pota: &PotaConf) -> Result<Configuration> {
	let common = def.common();
	let mut conf = Configuration::new();

	conf.set("execution.target", common.mode.clone());
	conf.set("kubernetes.cluster-id", common.fcid.cluster_id.clone());
	conf.set("kubernetes.namespace", common.fcid.namespace.clone());
	conf.set("kubernetes.container.image", common.image.clone());
	let k8s_account = common.k8s_account.clone().or_else(|| pota.flink.k8s_account.clone());
	if let Some(account) = k8s_account {
		conf.set("kubernetes.jobmanager.service-account", account);
	}
	conf.set("kubernetes.rest-service.exposed.type", common.rest_export_type.to_string());
	conf.set("blob.server.port", "6124");
	conf.set("taskmanager.rpc.port", "6122");

	conf.extend_elided(elide(common.cpu.raw_mapping()));
	conf.extend_elided(elide(common.mem.raw_mapping()));
	conf.extend_elided(elide(common.par.raw_mapping()));
	conf.extend_elided(elide(common.webui.raw_mapping()));
	conf.extend_elided(elide(common.restart_stg.raw_mapping()));
	if let Some(sb) = &common.state_backend {
		conf.extend_elided(elide(sb.raw_mapping()));
	}
	if let Some(ha) = &common.jm_ha {
		conf.extend_elided(elide(ha.raw_mapping()));
	}

	let required = is_s3_required(def);
	if required {
		let s3_global = pota.s3.as_ref().ok_or_else(|| {
			Error::DryToFlinkRawConfigErr("s3 paths are used but no global s3 access configuration was supplied".to_string())
		})?;
		conf.extend_elided(elide(s3_global.to_access_conf().raw_mapping_s3p()));
	}
	if let Some(s3) = &common.s3 {
		conf.extend_elided(elide(s3.raw_mapping_s3a()));
	}

	if !common.built_in_plugins.is_empty() {
		let mut names: Vec<&String> = common.built_in_plugins.iter().collect();
		names.sort();
		let joined = names.into_iter().cloned().collect::<Vec<_>>().join(";");
		conf.set("containerized.master.env.ENABLE_BUILT_IN_PLUGINS", joined.clone());
		conf.set("containerized.taskmanager.env.ENABLE_BUILT_IN_PLUGINS", joined);
	}

	if let FlinkClusterDef::Application(_, extra) = def {
		let jars_value = if is_s3_path(&extra.job_jar) {
			let basename = flink_operator_common::util::basename(&extra.job_jar);
			format!("local:///opt/flink/lib/{}", basename)
		} else {
			extra.job_jar.clone()
		};
		conf.set("pipeline.jars", jars_value);
		conf.set("pipeline.name", extra.job_name.clone());
		if let Some(app_main) = &extra.app_main {
			conf.set("$internal.application.main", app_main.clone());
		}
		if !extra.app_args.is_empty() {
			conf.set("$internal.application.program-args", extra.app_args.join(" "));
		}
		if let Some(restore) = &extra.restore {
			conf.extend_elided(elide(restore.raw_mapping()));
		}
	}

	for (k, v) in &common.ext_raw_configs {
		conf.set(k, v.clone());
	}

	Ok(conf)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::def::{ApplicationExtra, FlinkClusterDefCommon, FlinkGlobalConf, S3GlobalConf};
	use crate::config::raw::{CpuConf, JmHaConf, MemConf, ParConf, RestartStgConf, WebUIConf};
	use flink_operator_common::types::{Fcid, RestExportType};

	fn base_common() -> FlinkClusterDefCommon {
		FlinkClusterDefCommon {
			fcid: Fcid::new("c1", "ns1"),
			image: "flink:1.17".to_string(),
			flink_ver: "1.17".to_string(),
			mode: "kubernetes-application".to_string(),
			k8s_account: None,
			rest_export_type: RestExportType::ClusterIP,
			cpu: CpuConf::new(1.0, 1.0, 1.0, 1.0),
			mem: MemConf::new(1024.0, 1024.0),
			par: ParConf::new(1, 1),
			webui: WebUIConf { enable_submit: true, enable_cancel: true },
			restart_stg: RestartStgConf::NonRestart,
			state_backend: None,
			jm_ha: None,
			s3: None,
			injected_deps: Default::default(),
			built_in_plugins: Default::default(),
			ext_raw_configs: Default::default(),
			override_pod_template: None,
		}
	}

	fn pota_with_s3() -> PotaConf {
		PotaConf {
			flink: FlinkGlobalConf { k8s_account: Some("flink-opr".to_string()) },
			s3: Some(S3GlobalConf {
				endpoint: "http://minio:9000".to_string(),
				access_key: "ak".to_string(),
				secret_key: "sk".to_string(),
				path_style_access: Some(true),
				ssl_enabled: Some(false),
				bucket: Some("b".to_string()),
			}),
		}
	}

	#[test]
	fn s1_application_with_s3_job_jar() {
		let mut common = base_common();
		common.jm_ha = Some(JmHaConf {
			ha_impl_clz: "org.apache.flink.kubernetes.highavailability.KubernetesHaServicesFactory".to_string(),
			storage_dir: "s3://b/ha".to_string(),
			cluster_id: None,
		});
		let def = FlinkClusterDef::Application(
			common,
			ApplicationExtra {
				job_jar: "s3://b/app.jar".to_string(),
				job_name: "my-job".to_string(),
				app_main: Some("M".to_string()),
				app_args: vec!["-x".to_string()],
				restore: None,
			},
		);
		let revised = revise(&def).unwrap();
		let conf = to_flink_raw_config(&revised, &pota_with_s3()).unwrap();

		assert_eq!(conf.get("pipeline.jars"), Some("local:///opt/flink/lib/app.jar"));
		assert_eq!(conf.get("$internal.application.main"), Some("M"));
		assert_eq!(conf.get("kubernetes.cluster-id"), Some("c1"));
		assert_eq!(conf.get("blob.server.port"), Some("6124"));
		assert_eq!(conf.get("high-availability.storageDir"), Some("s3p://b/ha"));
		let plugins = conf.get("containerized.master.env.ENABLE_BUILT_IN_PLUGINS").unwrap();
		assert!(plugins.contains("flink-s3-fs-presto-1.17.jar"));
	}

	#[test]
	fn s3_user_cannot_override_reserved_key() {
		let mut common = base_common();
		common.ext_raw_configs.insert("execution.target".to_string(), "hacked".to_string());
		common.ext_raw_configs.insert("parallelism.max".to_string(), "64".to_string());
		let def = FlinkClusterDef::Session(common);
		let revised = revise(&def).unwrap();
		let conf = to_flink_raw_config(&revised, &pota_with_s3()).unwrap();
		assert_eq!(conf.get("execution.target"), Some("kubernetes-application"));
		assert_eq!(conf.get("parallelism.max"), Some("64"));
	}

	#[test]
	fn revise_is_idempotent() {
		let mut common = base_common();
		common.built_in_plugins.insert("presto-s3".to_string());
		common.injected_deps.insert("s3a://b/lib.jar".to_string());
		let def = FlinkClusterDef::Session(common);
		let once = revise(&def).unwrap();
		let twice = revise(&once).unwrap();
		assert_eq!(once, twice);
	}

	#[test]
	fn reserved_keys_never_survive_filtering() {
		let mut common = base_common();
		for key in RESERVED_KEYS {
			common.ext_raw_configs.insert(key.to_string(), "x".to_string());
		}
		let def = FlinkClusterDef::Session(common);
		let revised = revise(&def).unwrap();
		assert!(revised.common().ext_raw_configs.is_empty());
	}
}
