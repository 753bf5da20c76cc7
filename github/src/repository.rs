//! The `/search/users` endpoint and the repository that calls it.

use std::sync::Arc;

use api_client_core::{
    decode_json, ApiClient, ApiClientBuilder, BoxError, ConfigError, ConnectError, Endpoint, Headers, HttpMethod,
    Parameters, ReqwestTransport, RequestConfiguration, TracingErrorHandler, TracingLogger, Transport,
    TransportConfig,
};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::user::GithubUser;

pub const GITHUB_API_HOST: &str = "https://api.github.com";
const SEARCH_USERS_PATH: &str = "/search/users";
const ACCEPT_GITHUB_V3: &str = "application/vnd.github.v3+json";

#[derive(Debug, Deserialize)]
pub struct SearchUsersResponse {
    pub items: Vec<UserDto>,
}

#[derive(Debug, Deserialize)]
pub struct UserDto {
    pub id: u64,
    #[serde(rename = "login")]
    pub user_name: String,
    pub avatar_url: Url,
}

impl From<UserDto> for GithubUser {
    fn from(dto: UserDto) -> Self {
        Self {
            id: dto.id,
            user_name: dto.user_name,
            avatar_url: dto.avatar_url,
        }
    }
}

/// `GET {host}/search/users?q={word}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchUsers {
    host: String,
    word: String,
}

impl SearchUsers {
    pub fn new(word: impl Into<String>) -> Self {
        Self::with_host(GITHUB_API_HOST, word)
    }

    pub fn with_host(host: impl Into<String>, word: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            word: word.into(),
        }
    }
}

impl RequestConfiguration for SearchUsers {
    type Response = SearchUsersResponse;

    fn method(&self) -> HttpMethod {
        HttpMethod::Get
    }

    fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.as_str(), SEARCH_USERS_PATH)
    }

    fn headers(&self) -> Headers {
        Headers::from([("Accept".to_string(), ACCEPT_GITHUB_V3.to_string())])
    }

    fn parameters(&self) -> Parameters {
        Parameters::from([("q".to_string(), self.word.as_str().into())])
    }

    fn decode(&self, body: &[u8]) -> Result<SearchUsersResponse, BoxError> {
        decode_json(body)
    }
}

/// Looks up GitHub users by search word.
#[derive(Clone)]
pub struct GithubUsersRepository<T = ReqwestTransport> {
    client: ApiClient<T>,
    host: String,
}

impl GithubUsersRepository<ReqwestTransport> {
    /// Repository against api.github.com. Failed calls are reported
    /// through `tracing`.
    pub fn new(config: &TransportConfig) -> Result<Self, ConfigError> {
        let client = ApiClientBuilder::new()
            .logger(Arc::new(TracingLogger))
            .error_handler(Arc::new(TracingErrorHandler))
            .build(ReqwestTransport::new(config)?);
        Ok(Self::with_client(client, GITHUB_API_HOST))
    }
}

impl<T: Transport> GithubUsersRepository<T> {
    pub fn with_client(client: ApiClient<T>, host: impl Into<String>) -> Self {
        Self {
            client,
            host: host.into(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Users matching `word`, in the order the API ranked them.
    pub async fn fetch(&self, word: &str) -> Result<Vec<GithubUser>, ConnectError> {
        let response = self
            .client
            .connect(&SearchUsers::with_host(self.host.as_str(), word))
            .await?;
        debug!(word, count = response.items.len(), "fetched users");
        Ok(response.items.into_iter().map(GithubUser::from).collect())
    }
}
