use crate::errors::{ProvisionError, Result};
use crate::github::types::{
    BranchRef, CollaboratorInvitation, CommitInfo, CreateRefPayload, GeneratedRepo, GitRef,
    InvitationPayload, RepoDescriptor, RepoId,
};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
const API_VERSION: &str = "2022-11-28";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The GitHub REST calls the provisioning pipeline needs.
///
/// Every method is one blocking request. A non-2xx answer comes back as
/// [`ProvisionError::Status`].
pub trait GitHubApi {
    fn generate_repo(&self, template: &RepoId, repo: &RepoDescriptor) -> Result<GeneratedRepo>;
    fn add_collaborator(&self, repo: &RepoId, invitation: &CollaboratorInvitation) -> Result<()>;
    fn get_branch_ref(&self, repo: &RepoId, branch: &str) -> Result<BranchRef>;
    fn get_commit(&self, repo: &RepoId, sha: &str) -> Result<CommitInfo>;
    fn create_branch_ref(&self, repo: &RepoId, branch: &str, sha: &str) -> Result<BranchRef>;
}

pub struct HttpGitHubApi {
    agent: ureq::Agent,
    base_url: Url,
    token: String,
}

impl HttpGitHubApi {
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ProvisionError::Config(format!("invalid api_url '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ProvisionError::Config(format!(
                "api_url '{}' cannot carry a path",
                base_url
            )));
        }

        let agent = ureq::AgentBuilder::new()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build();

        Ok(Self {
            agent,
            base_url,
            token: token.to_string(),
        })
    }

    /// Appends `segments` to the base URL, percent-encoding each one.
    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ProvisionError::Config(format!("api_url '{}' cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn repo_endpoint<'a>(&self, repo: &'a RepoId, rest: impl IntoIterator<Item = &'a str>) -> Result<Url> {
        let segments = ["repos", repo.owner.as_str(), repo.name.as_str()];
        self.endpoint(segments.into_iter().chain(rest))
    }

    fn request(&self, method: &str, url: &Url) -> ureq::Request {
        self.agent
            .request(method, url.as_str())
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("Accept", "application/vnd.github+json")
            .set("X-GitHub-Api-Version", API_VERSION)
    }

    fn send(
        &self,
        operation: &'static str,
        request: ureq::Request,
        body: Option<serde_json::Value>,
    ) -> Result<ureq::Response> {
        log::debug!("{} {} ({})", request.method(), request.url(), operation);

        let result = match body {
            Some(body) => request.send_json(body),
            None => request.call(),
        };

        match result {
            Ok(response) => Ok(response),
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                Err(ProvisionError::Status {
                    operation,
                    status,
                    body,
                })
            }
            Err(e) => Err(ProvisionError::Transport(e.to_string())),
        }
    }

    fn decode<T: DeserializeOwned>(response: ureq::Response) -> Result<T> {
        Ok(serde_json::from_reader(response.into_reader())?)
    }
}

impl GitHubApi for HttpGitHubApi {
    fn generate_repo(&self, template: &RepoId, repo: &RepoDescriptor) -> Result<GeneratedRepo> {
        let url = self.repo_endpoint(template, ["generate"])?;
        let body = serde_json::to_value(repo)?;
        let response = self.send("generate repository", self.request("POST", &url), Some(body))?;
        Self::decode(response)
    }

    fn add_collaborator(&self, repo: &RepoId, invitation: &CollaboratorInvitation) -> Result<()> {
        let url = self.repo_endpoint(repo, ["collaborators", invitation.username.as_str()])?;
        let body = serde_json::to_value(InvitationPayload {
            permission: invitation.permission,
        })?;
        // 201 carries the invitation, 204 means the user already had access.
        self.send("invite collaborator", self.request("PUT", &url), Some(body))?;
        Ok(())
    }

    fn get_branch_ref(&self, repo: &RepoId, branch: &str) -> Result<BranchRef> {
        // Slashes in a branch name stay path separators, as GitHub expects.
        let segments = ["git", "ref", "heads"].into_iter().chain(branch.split('/'));
        let url = self.repo_endpoint(repo, segments)?;
        let response = self.send("read branch ref", self.request("GET", &url), None)?;
        Self::decode::<GitRef>(response).map(BranchRef::from)
    }

    fn get_commit(&self, repo: &RepoId, sha: &str) -> Result<CommitInfo> {
        let url = self.repo_endpoint(repo, ["git", "commits", sha])?;
        let response = self.send("read commit", self.request("GET", &url), None)?;
        Self::decode(response)
    }

    fn create_branch_ref(&self, repo: &RepoId, branch: &str, sha: &str) -> Result<BranchRef> {
        let url = self.repo_endpoint(repo, ["git", "refs"])?;
        let body = serde_json::to_value(CreateRefPayload {
            reference: format!("refs/heads/{}", branch),
            sha,
        })?;
        let response = self.send("create branch ref", self.request("POST", &url), Some(body))?;
        Self::decode::<GitRef>(response).map(BranchRef::from)
    }
}

#[cfg(test)]
pub use mock::{MockGitHubApi, BASE_SHA};


#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::Permission;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread;

    const SHA: &str = "8c14734b80ff0ffb93caefc85553c7c5b05cca1e";

    /// What the local server saw of the single request it answered.
    struct Received {
        request_line: String,
        headers: Vec<(String, String)>,
        body: String,
    }

    impl Received {
        fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str())
        }

        fn json(&self) -> serde_json::Value {
            serde_json::from_str(&self.body).unwrap()
        }
    }

    /// Answer exactly one HTTP request with `status` and `body`.
    fn serve_once(status: u16, body: &'static str) -> (String, thread::JoinHandle<Received>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();

            let mut headers = Vec::new();
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                let line = line.trim_end();
                if line.is_empty() {
                    break;
                }
                if let Some((key, value)) = line.split_once(':') {
                    headers.push((key.trim().to_ascii_lowercase(), value.trim().to_string()));
                }
            }

            let length = headers
                .iter()
                .find(|(key, _)| key == "content-length")
                .map(|(_, value)| value.parse::<usize>().unwrap())
                .unwrap_or(0);
            let mut request_body = vec![0; length];
            reader.read_exact(&mut request_body).unwrap();

            let reason = match status {
                200 => "OK",
                201 => "Created",
                204 => "No Content",
                404 => "Not Found",
                _ => "Unprocessable Entity",
            };
            write!(
                stream,
                "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                reason,
                body.len(),
                body
            )
            .unwrap();
            stream.flush().unwrap();

            Received {
                request_line: request_line.trim_end().to_string(),
                headers,
                body: String::from_utf8(request_body).unwrap(),
            }
        });

        (base_url, handle)
    }

    fn repo() -> RepoId {
        RepoId::new("organizer", "seed")
    }

    #[test]
    fn test_get_branch_ref_request() {
        let (base_url, server) = serve_once(
            200,
            r#"{"ref":"refs/heads/main","object":{"sha":"8c14734b80ff0ffb93caefc85553c7c5b05cca1e","type":"commit"}}"#,
        );
        let api = HttpGitHubApi::new(&base_url, "tok").unwrap();

        let branch = api.get_branch_ref(&repo(), "main").unwrap();
        let received = server.join().unwrap();

        assert_eq!(branch.name, "main");
        assert_eq!(branch.sha, SHA);
        assert_eq!(
            received.request_line,
            "GET /repos/organizer/seed/git/ref/heads/main HTTP/1.1"
        );
        assert_eq!(received.header("authorization"), Some("Bearer tok"));
        assert_eq!(received.header("accept"), Some("application/vnd.github+json"));
        assert_eq!(received.header("x-github-api-version"), Some("2022-11-28"));
        assert!(received
            .header("user-agent")
            .unwrap()
            .starts_with("ghprovision/"));
    }

    #[test]
    fn test_branch_name_is_percent_encoded() {
        let (base_url, server) = serve_once(
            200,
            r#"{"ref":"refs/heads/fix#1","object":{"sha":"8c14734b80ff0ffb93caefc85553c7c5b05cca1e"}}"#,
        );
        let api = HttpGitHubApi::new(&base_url, "tok").unwrap();

        let branch = api.get_branch_ref(&repo(), "fix#1").unwrap();
        let received = server.join().unwrap();

        assert_eq!(branch.name, "fix#1");
        assert_eq!(
            received.request_line,
            "GET /repos/organizer/seed/git/ref/heads/fix%231 HTTP/1.1"
        );
    }

    #[test]
    fn test_branch_name_keeps_slashes() {
        let (base_url, server) = serve_once(
            200,
            r#"{"ref":"refs/heads/release/50%?","object":{"sha":"8c14734b80ff0ffb93caefc85553c7c5b05cca1e"}}"#,
        );
        let api = HttpGitHubApi::new(&base_url, "tok").unwrap();

        api.get_branch_ref(&repo(), "release/50%?").unwrap();
        let received = server.join().unwrap();

        assert_eq!(
            received.request_line,
            "GET /repos/organizer/seed/git/ref/heads/release/50%25%3F HTTP/1.1"
        );
    }

    #[test]
    fn test_generate_repo_request() {
        let (base_url, server) = serve_once(
            201,
            r#"{"full_name":"organizer/seed","html_url":"https://github.com/organizer/seed","default_branch":"main"}"#,
        );
        let api = HttpGitHubApi::new(&base_url, "tok").unwrap();
        let descriptor = RepoDescriptor::new("organizer", "seed", true);

        let generated = api
            .generate_repo(&RepoId::new("hackthesix", "starter"), &descriptor)
            .unwrap();
        let received = server.join().unwrap();

        assert_eq!(generated.html_url, "https://github.com/organizer/seed");
        assert_eq!(generated.default_branch, Some("main".to_string()));
        assert_eq!(
            received.request_line,
            "POST /repos/hackthesix/starter/generate HTTP/1.1"
        );
        assert_eq!(
            received.json(),
            serde_json::json!({
                "owner": "organizer",
                "name": "seed",
                "private": true,
                "include_all_branches": false
            })
        );
    }

    #[test]
    fn test_add_collaborator_request_accepts_no_content() {
        let (base_url, server) = serve_once(204, "");
        let api = HttpGitHubApi::new(&base_url, "tok").unwrap();
        let invitation = CollaboratorInvitation {
            username: "alice".to_string(),
            permission: Permission::Push,
        };

        api.add_collaborator(&repo(), &invitation).unwrap();
        let received = server.join().unwrap();

        assert_eq!(
            received.request_line,
            "PUT /repos/organizer/seed/collaborators/alice HTTP/1.1"
        );
        assert_eq!(received.json(), serde_json::json!({ "permission": "push" }));
    }

    #[test]
    fn test_get_commit_request() {
        let (base_url, server) = serve_once(
            200,
            r#"{"sha":"8c14734b80ff0ffb93caefc85553c7c5b05cca1e","message":"Initial commit"}"#,
        );
        let api = HttpGitHubApi::new(&base_url, "tok").unwrap();

        let commit = api.get_commit(&repo(), SHA).unwrap();
        let received = server.join().unwrap();

        assert_eq!(commit.sha, SHA);
        assert_eq!(
            received.request_line,
            format!("GET /repos/organizer/seed/git/commits/{} HTTP/1.1", SHA)
        );
    }

    #[test]
    fn test_create_branch_ref_request() {
        let (base_url, server) = serve_once(
            201,
            r#"{"ref":"refs/heads/branch-alice","object":{"sha":"8c14734b80ff0ffb93caefc85553c7c5b05cca1e"}}"#,
        );
        let api = HttpGitHubApi::new(&base_url, "tok").unwrap();

        let branch = api.create_branch_ref(&repo(), "branch-alice", SHA).unwrap();
        let received = server.join().unwrap();

        assert_eq!(branch.name, "branch-alice");
        assert_eq!(received.request_line, "POST /repos/organizer/seed/git/refs HTTP/1.1");
        assert_eq!(
            received.json(),
            serde_json::json!({ "ref": "refs/heads/branch-alice", "sha": SHA })
        );
    }

    #[test]
    fn test_not_found_becomes_retryable_status() {
        let (base_url, server) = serve_once(404, r#"{"message":"Not Found"}"#);
        let api = HttpGitHubApi::new(&base_url, "tok").unwrap();

        let result = api.get_branch_ref(&repo(), "main");
        server.join().unwrap();

        let e = result.unwrap_err();
        assert!(e.is_not_ready());
        match e {
            ProvisionError::Status {
                operation,
                status,
                body,
            } => {
                assert_eq!(operation, "read branch ref");
                assert_eq!(status, 404);
                assert!(body.contains("Not Found"));
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[test]
    fn test_undecodable_body_is_json_error() {
        let (base_url, server) = serve_once(200, "not json");
        let api = HttpGitHubApi::new(&base_url, "tok").unwrap();

        let result = api.get_commit(&repo(), SHA);
        server.join().unwrap();

        let e = result.unwrap_err();
        assert!(!e.is_not_ready());
        assert!(matches!(e, ProvisionError::Json(_)));
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let api = HttpGitHubApi::new("https://ghe.example.com/api/v3/", "t").unwrap();

        let url = api.repo_endpoint(&repo(), ["git", "refs"]).unwrap();

        assert_eq!(
            url.as_str(),
            "https://ghe.example.com/api/v3/repos/organizer/seed/git/refs"
        );
    }

    #[test]
    fn test_default_endpoint() {
        let api = HttpGitHubApi::new(DEFAULT_API_URL, "t").unwrap();

        let url = api.repo_endpoint(&RepoId::new("acme", "seed"), ["generate"]).unwrap();

        assert_eq!(url.as_str(), "https://api.github.com/repos/acme/seed/generate");
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        assert!(matches!(
            HttpGitHubApi::new("not a url", "t"),
            Err(ProvisionError::Config(_))
        ));
        assert!(matches!(
            HttpGitHubApi::new("mailto:someone@example.com", "t"),
            Err(ProvisionError::Config(_))
        ));
    }
}
