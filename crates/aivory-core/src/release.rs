// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Aivory, Inc.

//! Release-record resolution: explicit init fields, then `AIVORY_*` env
//! vars, then a fixed list of CI/PaaS platform variables.
//!
//! Computed once at `init` and cached; attached to every outbound capture
//! and to the `register` payload.

/// A 7-40 character hex string is treated as a commit SHA.
fn looks_like_commit(s: &str) -> bool {
    let len = s.len();
    (7..=40).contains(&len) && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Resolved release metadata, attached to outbound captures.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ReleaseRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
}

impl ReleaseRecord {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.version.is_none()
            && self.commit.is_none()
            && self.branch.is_none()
            && self.repository.is_none()
    }
}

/// Explicit fields supplied to `init(options)`, taking priority over env.
#[derive(Debug, Clone, Default)]
pub struct ReleaseOverrides {
    pub version: Option<String>,
    pub commit: Option<String>,
    pub branch: Option<String>,
    pub repository: Option<String>,
}

/// Platform-specific fallback variables, tried in order, first plausible
/// value per field wins. Mirrors Heroku, Vercel, CircleCI, GitHub Actions,
/// and GitLab CI conventions.
const COMMIT_VARS: &[&str] = &[
    "HEROKU_SLUG_COMMIT",
    "VERCEL_GIT_COMMIT_SHA",
    "CIRCLE_SHA1",
    "GITHUB_SHA",
    "CI_COMMIT_SHA",
];
const BRANCH_VARS: &[&str] =
    &["VERCEL_GIT_COMMIT_REF", "CIRCLE_BRANCH", "GITHUB_REF_NAME", "CI_COMMIT_BRANCH"];
const REPOSITORY_VARS: &[&str] = &[
    "VERCEL_GIT_REPO_SLUG",
    "VERCEL_GIT_REPO_OWNER",
    "CIRCLE_PROJECT_REPONAME",
    "GITHUB_REPOSITORY",
    "CI_PROJECT_PATH",
];
const VERSION_VARS: &[&str] = &["APP_VERSION", "npm_package_version"];

fn first_env(vars: &[&str], get_env: &impl Fn(&str) -> Option<String>) -> Option<String> {
    vars.iter().find_map(|v| get_env(v).filter(|s| !s.is_empty()))
}

/// Resolve the release record using the explicit-override → `AIVORY_*` env →
/// platform-var cascade described in §4.A.
pub fn resolve(overrides: &ReleaseOverrides) -> ReleaseRecord {
    resolve_with(overrides, |name| std::env::var(name).ok())
}

/// Testable core of [`resolve`], parameterized over the environment lookup.
pub fn resolve_with(
    overrides: &ReleaseOverrides,
    get_env: impl Fn(&str) -> Option<String>,
) -> ReleaseRecord {
    let mut name = None;
    let mut version = overrides.version.clone();
    let mut commit = overrides.commit.clone();
    let mut branch = overrides.branch.clone();
    let mut repository = overrides.repository.clone();

    // `AIVORY_RELEASE` of shape `name@version` takes priority next, and a
    // bare hex string is treated as a commit rather than a name.
    if let Some(release) = get_env("AIVORY_RELEASE") {
        if let Some((n, v)) = release.split_once('@') {
            name = Some(n.to_owned());
            version = version.or_else(|| Some(v.to_owned()));
        } else if looks_like_commit(&release) {
            commit = commit.or_else(|| Some(release.clone()));
        } else {
            name = Some(release);
        }
    }

    version = version.or_else(|| get_env("AIVORY_VERSION"));
    commit = commit.or_else(|| get_env("AIVORY_COMMIT"));
    branch = branch.or_else(|| get_env("AIVORY_BRANCH"));
    repository = repository.or_else(|| get_env("AIVORY_REPOSITORY"));

    // Platform fallbacks, lowest priority.
    commit = commit.or_else(|| first_env(COMMIT_VARS, &get_env));
    branch = branch.or_else(|| first_env(BRANCH_VARS, &get_env));
    repository = repository.or_else(|| first_env(REPOSITORY_VARS, &get_env));
    version = version.or_else(|| first_env(VERSION_VARS, &get_env));

    ReleaseRecord { name, version, commit, branch, repository }
}

#[cfg(test)]
#[path = "release_tests.rs"]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests;
