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

//! Cluster definition and raw-config emission (spec §3, §4.1).

pub mod def;
pub mod raw;
pub mod resolver;

pub use def::{ApplicationExtra, FlinkClusterDef, FlinkClusterDefCommon, FlinkGlobalConf, PotaConf, S3GlobalConf};
pub use resolver::{revise, to_flink_raw_config, Configuration, PluginRegistry};
