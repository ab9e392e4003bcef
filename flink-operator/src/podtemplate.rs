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

//! Pod Template Generator (spec §4.2): synthesizes or decodes the Kubernetes
//! Pod template handed to the Flink launcher, and serializes it to disk.

use std::path::Path;

use k8s_openapi::api::core::v1::{
	Container, EmptyDirVolumeSource, HostPathVolumeSource, Pod, PodSpec, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use flink_operator_common::util::{basename, pure_path};

use crate::config::{FlinkClusterDef, PotaConf};
use crate::error::{Error, Result};

const MINIO_CLIENT_IMAGE: &str = "minio/mc:latest";
const HOST_VOLUME: &str = "flink-volume-hostpath";
const LIBS_VOLUME: &str = "flink-libs";
const LOGS_VOLUME: &str = "flink-logs";

/// `resolve(def, potaConf) -> PodSpec`.
pub fn resolve(def: &FlinkClusterDef, pota: &PotaConf) -> Result<Pod> {
	let common = def.common();
	if let Some(raw) = &common.override_pod_template {
		return serde_yaml::from_str(raw).map_err(|e| Error::DecodePodTemplateYamlErr(e.to_string()));
	}

	let s3_libs: Vec<&String> = common.injected_deps.iter().filter(|dep| flink_operator_common::util::is_s3_path(dep)).collect();

	let volumes = vec![
		Volume {
			name: HOST_VOLUME.to_string(),
			host_path: Some(HostPathVolumeSource { path: "/tmp".to_string(), type_: Some("Directory".to_string()) }),
			..Default::default()
		},
		Volume { name: LIBS_VOLUME.to_string(), empty_dir: Some(EmptyDirVolumeSource::default()), ..Default::default() },
		Volume { name: LOGS_VOLUME.to_string(), empty_dir: Some(EmptyDirVolumeSource::default()), ..Default::default() },
	];

	let init_containers = if s3_libs.is_empty() {
		vec![]
	} else {
		let s3 = pota.s3.as_ref().ok_or_else(|| Error::GenPodTemplateErr("user libraries are on S3 but no global s3 config was supplied".to_string()))?;
		let mut commands = vec![format!(
			"mc alias set minio {} {} {}",
			s3.endpoint, s3.access_key, s3.secret_key
		)];
		for lib in &s3_libs {
			let revised = s3.revise_path(&pure_path(lib));
			let name = basename(lib);
			commands.push(format!("mc cp minio/{} /opt/flink/lib/{}", revised, name));
		}
		vec![Container {
			name: "userlib-loader".to_string(),
			image: Some(MINIO_CLIENT_IMAGE.to_string()),
			command: vec!["sh".to_string(), "-c".to_string(), commands.join(" && ")],
			volume_mounts: vec![VolumeMount { name: LIBS_VOLUME.to_string(), mount_path: "/opt/flink/lib".to_string(), ..Default::default() }],
			..Default::default()
		}]
	};

	let mut main_mounts = vec![
		VolumeMount { name: HOST_VOLUME.to_string(), mount_path: "/opt/flink/volume".to_string(), ..Default::default() },
		VolumeMount { name: LOGS_VOLUME.to_string(), mount_path: "/opt/flink/log".to_string(), ..Default::default() },
	];
	for lib in &s3_libs {
		let name = basename(lib);
		main_mounts.push(VolumeMount {
			name: LIBS_VOLUME.to_string(),
			mount_path: format!("/opt/flink/lib/{}", name),
			sub_path: Some(name.to_string()),
			..Default::default()
		});
	}

	let pod = Pod {
		metadata: ObjectMeta { name: Some("pod-template".to_string()), ..Default::default() },
		spec: Some(PodSpec {
			containers: vec![Container { name: "flink-main-container".to_string(), volume_mounts: main_mounts, ..Default::default() }],
			init_containers,
			volumes,
			..Default::default()
		}),
		..Default::default()
	};

	Ok(pod)
}

/// `dump(pod, path) -> ()` — serializes as YAML (serde_yaml already drops
/// nulls via the `Default::default()` skip-nothing fields being `None`) and
/// writes atomically by removing any existing file first.
pub fn dump(pod: &Pod, path: &Path) -> Result<()> {
	let yaml = serde_yaml::to_string(pod).map_err(|e| Error::EncodePodTemplateYamlErr(e.to_string()))?;
	if path.exists() {
		std::fs::remove_file(path).map_err(|e| Error::IOErr { path: path.display().to_string(), cause: e.to_string() })?;
	}
	std::fs::write(path, yaml).map_err(|e| Error::IOErr { path: path.display().to_string(), cause: e.to_string() })
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::def::{FlinkClusterDefCommon, FlinkGlobalConf, S3GlobalConf};
	use crate::config::raw::{CpuConf, MemConf, ParConf, RestartStgConf, WebUIConf};
	use flink_operator_common::types::{Fcid, RestExportType};

	fn common_with_s3_lib() -> FlinkClusterDefCommon {
		let mut c = FlinkClusterDefCommon {
			fcid: Fcid::new("c1", "ns1"),
			image: "flink:1.17".to_string(),
			flink_ver: "1.17".to_string(),
			mode: "kubernetes-session".to_string(),
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
		};
		c.injected_deps.insert("s3a://bucket/libs/connector.jar".to_string());
		c
	}

	fn pota() -> PotaConf {
		PotaConf {
			flink: FlinkGlobalConf { k8s_account: None },
			s3: Some(S3GlobalConf {
				endpoint: "http://minio:9000".to_string(),
				access_key: "ak".to_string(),
				secret_key: "sk".to_string(),
				path_style_access: Some(true),
				ssl_enabled: Some(false),
				bucket: Some("bucket".to_string()),
			}),
		}
	}

	#[test]
	fn synthesizes_init_container_only_when_s3_libs_present() {
		let def = FlinkClusterDef::Session(common_with_s3_lib());
		let pod = resolve(&def, &pota()).unwrap();
		let spec = pod.spec.unwrap();
		assert!(spec.init_containers.is_some());
		let init = &spec.init_containers.unwrap()[0];
		let cmd = init.command.as_ref().unwrap().last().unwrap();
		assert!(cmd.contains("mc cp minio/"));
		assert!(cmd.contains("connector.jar"));
	}

	#[test]
	fn omits_init_container_when_no_s3_libs() {
		let mut common = common_with_s3_lib();
		common.injected_deps.clear();
		let def = FlinkClusterDef::Session(common);
		let pod = resolve(&def, &pota()).unwrap();
		assert!(pod.spec.unwrap().init_containers.is_none());
	}

	#[test]
	fn override_pod_template_is_decoded_verbatim() {
		let mut common = common_with_s3_lib();
		common.override_pod_template = Some("apiVersion: v1\nkind: Pod\nmetadata:\n  name: custom\n".to_string());
		let def = FlinkClusterDef::Session(common);
		let pod = resolve(&def, &pota()).unwrap();
		assert_eq!(pod.metadata.name.as_deref(), Some("custom"));
	}
}
