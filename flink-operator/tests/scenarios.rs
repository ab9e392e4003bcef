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

//! End-to-end scenario: resolving and submitting an application cluster
//! (the S1 fixture) through the full config → pod template → submission
//! path, rather than exercising each stage in isolation.

use std::collections::BTreeMap;

use flink_operator::config::{ApplicationExtra, FlinkClusterDef, FlinkClusterDefCommon, FlinkGlobalConf, PotaConf, S3GlobalConf};
use flink_operator::config::raw::{CpuConf, JmHaConf, MemConf, ParConf, RestartStgConf, WebUIConf};
use flink_operator::submission;
use flink_operator_common::types::{Fcid, RestExportType};

fn s1_def() -> FlinkClusterDef {
	let common = FlinkClusterDefCommon {
		fcid: Fcid::new("c1", "ns1"),
		image: "flink:1.17".to_string(),
		flink_ver: "1.17".to_string(),
		mode: "kubernetes-application".to_string(),
		k8s_account: None,
		rest_export_type: RestExportType::ClusterIP,
		cpu: CpuConf::new(1.0, 2.0, 1.0, 1.0),
		mem: MemConf::new(1024.0, 2048.0),
		par: ParConf::new(2, 2),
		webui: WebUIConf { enable_submit: true, enable_cancel: true },
		restart_stg: RestartStgConf::NonRestart,
		state_backend: None,
		jm_ha: Some(JmHaConf {
			ha_impl_clz: "org.apache.flink.kubernetes.highavailability.KubernetesHaServicesFactory".to_string(),
			storage_dir: "s3://b/ha".to_string(),
			cluster_id: None,
		}),
		s3: None,
		injected_deps: std::iter::once("s3a://b/libs/connector.jar".to_string()).collect(),
		built_in_plugins: Default::default(),
		ext_raw_configs: BTreeMap::new(),
		override_pod_template: None,
	};
	FlinkClusterDef::Application(
		common,
		ApplicationExtra {
			job_jar: "s3://b/app.jar".to_string(),
			job_name: "my-job".to_string(),
			app_main: Some("M".to_string()),
			app_args: vec!["-x".to_string()],
			restore: None,
		},
	)
}

fn s1_pota() -> PotaConf {
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
fn submit_application_cluster_writes_a_pod_template_and_resolved_config() {
	let def = s1_def();
	let pota = s1_pota();
	let local_tmp_dir = std::env::temp_dir().join(format!("flink-operator-scenarios-{}", std::process::id()));

	let plan = submission::submit_application_cluster(&def, &pota, &local_tmp_dir).expect("submission should succeed");

	assert_eq!(plan.configuration.get("pipeline.jars"), Some("local:///opt/flink/lib/app.jar"));
	assert_eq!(plan.configuration.get("$internal.application.main"), Some("M"));
	assert_eq!(plan.configuration.get("high-availability.storageDir"), Some("s3p://b/ha"));
	assert_eq!(plan.configuration.get("kubernetes.cluster-id"), Some("c1"));

	let yaml = std::fs::read_to_string(&plan.pod_template_path).expect("pod template should have been written");
	assert!(yaml.contains("flink-main-container"));
	assert!(yaml.contains("userlib-loader"));
	assert!(yaml.contains("connector.jar"));

	std::fs::remove_dir_all(&local_tmp_dir).ok();
}

#[test]
fn a_user_supplied_reserved_key_never_survives_into_the_launch_plan() {
	let (mut common, extra) = match s1_def() {
		FlinkClusterDef::Application(c, e) => (c, e),
		_ => unreachable!(),
	};
	common.ext_raw_configs.insert("execution.target".to_string(), "hacked".to_string());
	let def = FlinkClusterDef::Application(common, extra);
	let pota = s1_pota();
	let local_tmp_dir = std::env::temp_dir().join(format!("flink-operator-scenarios-reserved-{}", std::process::id()));

	let plan = submission::submit_application_cluster(&def, &pota, &local_tmp_dir).expect("submission should succeed");
	assert_eq!(plan.configuration.get("execution.target"), Some("kubernetes-application"));

	std::fs::remove_dir_all(&local_tmp_dir).ok();
}
