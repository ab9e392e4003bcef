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

//! Clients for the two external systems the operator core polls: the Flink
//! REST API and the Kubernetes API (spec §6). Neither client retries or
//! caches — that policy lives with the callers in `flink-operator`.

mod flink_rest;
mod k8s;

pub use flink_rest::{FlinkRestClient, JobOverviewEntry, JobOverviewResponse, RunJarRequest, SavepointStatusResponse};
pub use k8s::K8sClient;
