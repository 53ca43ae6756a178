//! Clone URL of the template repository.
//!
//! The tag list comes from the REST API, but releases are checked out over
//! Git, so the Git host has to be derived from the API host (or configured).

/// HTTPS clone URL `{host}/{owner}/{name}.git` for `repo`.
pub fn derive_git_remote_url(api_url: &str, git_base_url: Option<&str>, repo: &str) -> String {
    let repo = repo.trim().trim_matches('/');
    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    format!("{}/{}.git", git_host(api_url, git_base_url), repo)
}

/// Git host for an API host.
///
/// A non-blank `git_base_url` wins. Otherwise `api.github.com` maps to
/// `github.com`, an Enterprise `https://<host>/api/v3` maps to
/// `https://<host>`, and any other URL is used as-is.
pub fn git_host(api_url: &str, git_base_url: Option<&str>) -> String {
    let explicit = git_base_url.map(str::trim).filter(|s| !s.is_empty());
    if let Some(base) = explicit {
        return base.trim_end_matches('/').to_string();
    }

    let api = api_url.trim().trim_end_matches('/');
    if api.eq_ignore_ascii_case("https://api.github.com") {
        "https://github.com".to_string()
    } else {
        api.strip_suffix("/api/v3").unwrap_or(api).to_string()
    }
}
