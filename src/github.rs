use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use reqwest::{
    header::{ACCEPT, AUTHORIZATION},
    Client, Method, RequestBuilder, Response, StatusCode, Url,
};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::{
    config::EditorConfig,
    error::{DocFsError, Result},
    transport::GitHubApi,
    tree::sort_nodes,
    types::{
        EntryType, MergeMethod, NewPullRequest, PullRequest, Repository, SyncOutcome, TreeNode,
    },
};

const GITHUB_V3: &str = "application/vnd.github.v3+json";

/// GitHub REST v3 client
///
/// Talks to:
/// - the API host (`api_base_url`) for refs, contents, forks and pulls
/// - the raw content host (`raw_base_url`) for unauthenticated file reads
#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    config: Arc<EditorConfig>,
}

#[derive(Deserialize)]
struct ApiOwner {
    login: String,
}

#[derive(Deserialize)]
struct ApiParent {
    full_name: String,
}

#[derive(Deserialize, Default)]
struct ApiPermissions {
    #[serde(default)]
    admin: bool,
    #[serde(default)]
    maintain: bool,
    #[serde(default)]
    push: bool,
}

#[derive(Deserialize)]
struct ApiRepository {
    name: String,
    owner: ApiOwner,
    #[serde(default)]
    fork: bool,
    parent: Option<ApiParent>,
    permissions: Option<ApiPermissions>,
}

#[derive(Deserialize)]
struct ApiObject {
    sha: String,
}

#[derive(Deserialize)]
struct ApiRef {
    object: ApiObject,
}

#[derive(Deserialize)]
struct ApiContentEntry {
    name: String,
    path: String,
    sha: String,
    #[serde(rename = "type")]
    entry_type: String,
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiUser {
    login: String,
}

#[derive(Deserialize)]
struct ApiMergeResult {
    #[serde(default)]
    merged: bool,
}

#[derive(Deserialize)]
struct ApiSyncResult {
    message: Option<String>,
}

impl GitHubClient {
    pub fn new(config: Arc<EditorConfig>) -> Self {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, config }
    }

    /// Build an API URL from path segments, percent-encoding each one
    ///
    /// Repository paths are split on `/` so nested files keep their
    /// directory separators.
    fn api_url(&self, segments: &[&str]) -> Result<Url> {
        build_url(&self.config.api_base_url, segments)
    }

    fn contents_url(&self, repo: &Repository, path: &str, branch: Option<&str>) -> Result<Url> {
        let mut segments = vec!["repos", repo.owner.as_str(), repo.repo.as_str(), "contents"];
        segments.extend(split_path(path));
        let mut url = self.api_url(&segments)?;
        if let Some(branch) = branch {
            url.query_pairs_mut().append_pair("ref", branch);
        }
        Ok(url)
    }

    /// Build the raw content URL for a file on a branch
    pub fn raw_url(&self, repo: &Repository, branch: &str, path: &str) -> Result<Url> {
        let mut segments = vec![repo.owner.as_str(), repo.repo.as_str(), branch];
        segments.extend(split_path(path));
        build_url(&self.config.raw_base_url, &segments)
    }

    fn request(&self, method: Method, url: Url, token: Option<&str>) -> RequestBuilder {
        let builder = self.client.request(method, url).header(ACCEPT, GITHUB_V3);
        match token {
            Some(token) => builder.header(AUTHORIZATION, format!("token {token}")),
            None => builder,
        }
    }

    async fn get_repository(
        &self,
        repo: &Repository,
        token: &str,
    ) -> Result<Option<ApiRepository>> {
        let url = self.api_url(&["repos", repo.owner.as_str(), repo.repo.as_str()])?;
        let response = self.request(Method::GET, url, Some(token)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = ensure_success(response, "reading repository").await?;
        Ok(Some(response.json().await?))
    }
}

fn build_url(base: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base).map_err(|e| DocFsError::InvalidConfig {
        message: format!("invalid base URL {base}: {e}"),
    })?;
    url.path_segments_mut()
        .map_err(|_| DocFsError::InvalidConfig {
            message: format!("base URL cannot carry a path: {base}"),
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

/// Check if a status is GitHub's way of saying "slow down"
fn is_rate_limited(response: &Response) -> bool {
    let status = response.status();
    status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN
            && response
                .headers()
                .get("x-ratelimit-remaining")
                .and_then(|v| v.to_str().ok())
                == Some("0"))
}

/// Map a non-2xx response to a transport error carrying status and body
async fn ensure_success(response: Response, context: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if is_rate_limited(&response) {
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "GitHub API rate limit exceeded".to_string());
        return Err(DocFsError::RateLimited { message });
    }
    Err(DocFsError::Http {
        context: context.to_string(),
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or_default().to_string(),
        body: response.text().await.unwrap_or_default(),
    })
}

fn decode_content(encoded: &str) -> Result<String> {
    let compact: String = encoded.split_whitespace().collect();
    let bytes = STANDARD.decode(compact)?;
    Ok(String::from_utf8(bytes)?)
}

#[async_trait]
impl GitHubApi for GitHubClient {
    async fn get_ref_sha(&self, repo: &Repository, branch: &str, token: &str) -> Result<String> {
        let mut segments = vec!["repos", repo.owner.as_str(), repo.repo.as_str(), "git", "ref", "heads"];
        segments.extend(split_path(branch));
        let url = self.api_url(&segments)?;

        let response = self.request(Method::GET, url, Some(token)).send().await?;
        let response = ensure_success(response, "reading base branch").await?;
        let reference: ApiRef = response.json().await?;
        Ok(reference.object.sha)
    }

    async fn create_branch(
        &self,
        repo: &Repository,
        branch: &str,
        from_sha: &str,
        token: &str,
    ) -> Result<()> {
        let url = self.api_url(&["repos", repo.owner.as_str(), repo.repo.as_str(), "git", "refs"])?;
        let body = json!({ "ref": format!("refs/heads/{branch}"), "sha": from_sha });

        let response = self
            .request(Method::POST, url, Some(token))
            .json(&body)
            .send()
            .await?;
        ensure_success(response, "creating work branch").await?;
        Ok(())
    }

    async fn get_file_sha(
        &self,
        repo: &Repository,
        path: &str,
        branch: &str,
        token: Option<&str>,
    ) -> Result<Option<String>> {
        let url = self.contents_url(repo, path, Some(branch))?;
        let response = self.request(Method::GET, url, token).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = ensure_success(response, "reading file metadata").await?;
        let entry: ApiContentEntry = response.json().await?;
        Ok(Some(entry.sha).filter(|sha| !sha.is_empty()))
    }

    async fn get_file_content(
        &self,
        repo: &Repository,
        path: &str,
        branch: &str,
        token: Option<&str>,
    ) -> Result<String> {
        let url = self.contents_url(repo, path, Some(branch))?;
        let response = self.request(Method::GET, url, token).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(DocFsError::NotFound {
                path: path.to_string(),
            });
        }
        let response = ensure_success(response, "reading file").await?;
        let entry: ApiContentEntry = response.json().await?;

        match (entry.entry_type.as_str(), entry.content) {
            ("file", Some(content)) => decode_content(&content),
            _ => Err(DocFsError::InvalidResponse {
                message: format!("{path} is not a file with inline content"),
            }),
        }
    }

    async fn fetch_raw(
        &self,
        repo: &Repository,
        branch: &str,
        path: &str,
        token: Option<&str>,
    ) -> Result<Bytes> {
        let url = self.raw_url(repo, branch, path)?;
        let mut builder = self.client.get(url);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("token {token}"));
        }

        let response = builder.send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(DocFsError::NotFound {
                path: path.to_string(),
            });
        }
        let response = ensure_success(response, "downloading raw file").await?;
        Ok(response.bytes().await?)
    }

    async fn put_file_base64(
        &self,
        repo: &Repository,
        path: &str,
        base64_content: &str,
        message: &str,
        branch: &str,
        sha: Option<&str>,
        token: &str,
    ) -> Result<()> {
        let url = self.contents_url(repo, path, None)?;
        let mut body = json!({
            "message": message,
            "content": base64_content,
            "branch": branch,
        });
        if let Some(sha) = sha {
            body["sha"] = json!(sha);
        }

        let response = self
            .request(Method::PUT, url, Some(token))
            .json(&body)
            .send()
            .await?;
        ensure_success(response, "saving file").await?;
        Ok(())
    }

    async fn delete_file(
        &self,
        repo: &Repository,
        path: &str,
        sha: &str,
        message: &str,
        branch: &str,
        token: &str,
    ) -> Result<()> {
        let url = self.contents_url(repo, path, None)?;
        let body = json!({ "message": message, "sha": sha, "branch": branch });

        let response = self
            .request(Method::DELETE, url, Some(token))
            .json(&body)
            .send()
            .await?;
        ensure_success(response, "deleting file").await?;
        Ok(())
    }

    async fn create_pull_request(
        &self,
        repo: &Repository,
        request: &NewPullRequest,
        token: &str,
    ) -> Result<PullRequest> {
        let url = self.api_url(&["repos", repo.owner.as_str(), repo.repo.as_str(), "pulls"])?;
        let response = self
            .request(Method::POST, url, Some(token))
            .json(request)
            .send()
            .await?;
        let response = ensure_success(response, "opening pull request").await?;
        Ok(response.json().await?)
    }

    async fn merge_pull_request(
        &self,
        repo: &Repository,
        number: u64,
        method: MergeMethod,
        token: &str,
    ) -> Result<bool> {
        let number = number.to_string();
        let url = self.api_url(&["repos", repo.owner.as_str(), repo.repo.as_str(), "pulls", number.as_str(), "merge"])?;
        let response = self
            .request(Method::PUT, url, Some(token))
            .json(&json!({ "merge_method": method }))
            .send()
            .await?;

        if !response.status().is_success() {
            debug!("merge of #{number} refused with {}", response.status());
            return Ok(false);
        }
        let result: ApiMergeResult = response.json().await?;
        Ok(result.merged)
    }

    async fn list_directory(
        &self,
        repo: &Repository,
        path: &str,
        branch: &str,
        token: Option<&str>,
    ) -> Result<Vec<TreeNode>> {
        let url = self.contents_url(repo, path, Some(branch))?;
        let response = self.request(Method::GET, url, token).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(DocFsError::NotFound {
                path: path.to_string(),
            });
        }
        let response = ensure_success(response, "listing directory").await?;
        let entries: Vec<ApiContentEntry> =
            response.json().await.map_err(|_| DocFsError::InvalidResponse {
                message: format!("{path} is not a directory"),
            })?;

        let mut nodes: Vec<TreeNode> = entries
            .into_iter()
            .filter_map(|e| {
                let entry_type = match e.entry_type.as_str() {
                    "file" => EntryType::File,
                    "dir" => EntryType::Dir,
                    // Symlinks and submodules are not editable
                    _ => return None,
                };
                Some(TreeNode {
                    entry_type,
                    name: e.name,
                    path: e.path,
                    sha: Some(e.sha),
                    children: (entry_type == EntryType::Dir).then(Vec::new),
                    loaded: false,
                })
            })
            .collect();
        sort_nodes(&mut nodes);
        Ok(nodes)
    }

    async fn check_write_permission(&self, repo: &Repository, token: &str) -> Result<bool> {
        let Some(info) = self.get_repository(repo, token).await? else {
            return Ok(false);
        };
        let permissions = info.permissions.unwrap_or_default();
        Ok(permissions.push || permissions.admin || permissions.maintain)
    }

    async fn repository_exists(&self, repo: &Repository, token: &str) -> Result<bool> {
        Ok(self.get_repository(repo, token).await?.is_some())
    }

    async fn get_current_user(&self, token: &str) -> Result<String> {
        let url = self.api_url(&["user"])?;
        let response = self.request(Method::GET, url, Some(token)).send().await?;
        let response = ensure_success(response, "reading current user").await?;
        let user: ApiUser = response.json().await?;
        Ok(user.login)
    }

    async fn find_existing_fork(
        &self,
        original: &Repository,
        token: &str,
    ) -> Result<Option<Repository>> {
        let login = self.get_current_user(token).await?;
        let candidate = Repository::new(login, &original.repo);

        let Some(info) = self.get_repository(&candidate, token).await? else {
            debug!("no fork found at {candidate}");
            return Ok(None);
        };
        let parent_matches = info
            .parent
            .as_ref()
            .is_some_and(|parent| parent.full_name == original.full_name());
        if info.fork && parent_matches {
            Ok(Some(Repository::new(info.owner.login, info.name)))
        } else {
            debug!("{candidate} exists but is not a fork of {original}");
            Ok(None)
        }
    }

    async fn create_fork(&self, original: &Repository, token: &str) -> Result<Repository> {
        let url = self.api_url(&["repos", original.owner.as_str(), original.repo.as_str(), "forks"])?;
        let response = self.request(Method::POST, url, Some(token)).send().await?;
        let response = ensure_success(response, "creating fork").await?;
        let info: ApiRepository = response.json().await?;
        Ok(Repository::new(info.owner.login, info.name))
    }

    async fn sync_fork_with_upstream(
        &self,
        fork: &Repository,
        branch: &str,
        token: &str,
    ) -> Result<SyncOutcome> {
        let url = self.api_url(&["repos", fork.owner.as_str(), fork.repo.as_str(), "merge-upstream"])?;
        let response = self
            .request(Method::POST, url, Some(token))
            .json(&json!({ "branch": branch }))
            .send()
            .await?;

        if response.status() == StatusCode::CONFLICT {
            let message = response.text().await.unwrap_or_default();
            return Ok(SyncOutcome {
                synced: false,
                message: Some(message).filter(|m| !m.is_empty()),
            });
        }
        let response = ensure_success(response, "syncing fork").await?;
        let message = response
            .json::<ApiSyncResult>()
            .await
            .ok()
            .and_then(|result| result.message);
        Ok(SyncOutcome {
            synced: true,
            message,
        })
    }

    async fn delete_branch(&self, repo: &Repository, branch: &str, token: &str) -> Result<bool> {
        let mut segments = vec!["repos", repo.owner.as_str(), repo.repo.as_str(), "git", "refs", "heads"];
        segments.extend(split_path(branch));
        let url = self.api_url(&segments)?;

        let response = self.request(Method::DELETE, url, Some(token)).send().await?;
        match response.status() {
            // Already gone counts as deleted
            status if status.is_success() || status == StatusCode::NOT_FOUND => Ok(true),
            StatusCode::UNPROCESSABLE_ENTITY => Ok(false),
            _ => {
                ensure_success(response, "deleting work branch").await?;
                Ok(false)
            }
        }
    }
}
