//! GitHub user search on top of `api_client_core`.
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use api_client_core::TransportConfig;
//! use github_users::GithubUsersRepository;
//!
//! let repository = GithubUsersRepository::new(&TransportConfig::load()?)?;
//! for user in repository.fetch("taktem").await? {
//!     println!("{} {}", user.id, user.user_name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod repository;
pub mod user;

pub use repository::{GithubUsersRepository, SearchUsers, GITHUB_API_HOST};
pub use user::GithubUser;
