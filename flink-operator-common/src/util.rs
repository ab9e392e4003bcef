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

//! Path-scheme rules and numeric/string guards (spec §6, §A, §B).

const S3_SCHEMES: [&str; 4] = ["s3", "s3a", "s3n", "s3p"];

/// `isS3Path(p)` — true when the scheme prefix of `p` is one of the S3 family.
pub fn is_s3_path(path: &str) -> bool {
	scheme_of(path).map(|s| S3_SCHEMES.contains(&s.as_str())).unwrap_or(false)
}

fn scheme_of(path: &str) -> Option<String> {
	let idx = path.find("://")?;
	Some(path[..idx].to_ascii_lowercase())
}

/// `purePath(p)` — strips `<scheme>://` and any leading `/`.
pub fn pure_path(path: &str) -> String {
	let without_scheme = match path.find("://") {
		Some(idx) => &path[idx + 3..],
		None => path,
	};
	without_scheme.trim_start_matches('/').to_string()
}

/// `reviseToS3pSchema(p)` — forces the scheme to `s3p`, leaving non-S3 paths untouched.
pub fn revise_to_s3p_schema(path: &str) -> String {
	if !is_s3_path(path) {
		return path.to_string();
	}
	format!("s3p://{}", pure_path(path))
}

/// Basename after the last `/`.
pub fn basename(path: &str) -> &str {
	path.rsplit('/').next().unwrap_or(path)
}

/// Numeric guard: returns `value` if it is `> 0`, else `default`.
pub fn guard_positive_or(value: f64, default: f64) -> f64 {
	if value > 0.0 {
		value
	} else {
		default
	}
}

/// Numeric guard: lower-bounds an integer value to `min`.
pub fn lower_bound(value: i64, min: i64) -> i64 {
	if value < min {
		min
	} else {
		value
	}
}

/// Trims a string and returns `None` if the result is empty.
pub fn non_blank(s: &str) -> Option<String> {
	let trimmed = s.trim();
	if trimmed.is_empty() {
		None
	} else {
		Some(trimmed.to_string())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn detects_s3_family_schemes() {
		for scheme in &["s3", "s3a", "s3n", "s3p"] {
			assert!(is_s3_path(&format!("{}://bucket/key", scheme)));
		}
		assert!(!is_s3_path("file:///tmp/x"));
		assert!(!is_s3_path("/tmp/x"));
	}

	#[test]
	fn pure_path_strips_scheme_and_leading_slash() {
		assert_eq!(pure_path("s3://bucket/key"), "bucket/key");
		assert_eq!(pure_path("/bucket/key"), "bucket/key");
		assert_eq!(pure_path("bucket/key"), "bucket/key");
	}

	#[test]
	fn revise_to_s3p_schema_only_touches_s3_paths() {
		assert_eq!(revise_to_s3p_schema("s3a://b/k"), "s3p://b/k");
		assert_eq!(revise_to_s3p_schema("s3p://b/k"), "s3p://b/k");
		assert_eq!(revise_to_s3p_schema("file:///tmp/x"), "file:///tmp/x");
	}

	#[test]
	fn basename_takes_tail_after_last_slash() {
		assert_eq!(basename("s3://b/libs/app.jar"), "app.jar");
		assert_eq!(basename("app.jar"), "app.jar");
	}

	#[test]
	fn guards_apply_minimums() {
		assert_eq!(guard_positive_or(-1.0, 1.0), 1.0);
		assert_eq!(guard_positive_or(2.0, 1.0), 2.0);
		assert_eq!(lower_bound(0, 1), 1);
		assert_eq!(lower_bound(5, 1), 5);
	}
}
