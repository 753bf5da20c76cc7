use url::Url;

/// A GitHub account as returned by user search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubUser {
    pub id: u64,
    pub user_name: String,
    pub avatar_url: Url,
}
