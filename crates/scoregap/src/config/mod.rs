pub mod loader;
pub mod schema;

pub use loader::{
    load_config, load_config_from_str, resolve_credentials, validate_config, Credentials,
};
pub use schema::{
    dated_file_name, ApiConfig, Config, CountryConfig, CredentialsConfig, LeaderboardConfig,
    MissingScoreConfig, SearchConfig,
};
