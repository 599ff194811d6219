//! Prints an access token signed with the configured JWT secret, for use with
//! `sse-test-client` or curl against a local server.
//!
//! ```text
//! cargo run --bin mint_token -- <user_id> [--role PM --role Employee]
//! ```

use clap::Parser;
use domain::jwt::generate_token;
use dotenvy::dotenv;
use log::error;
use service::{config::Config, logging::Logger};

#[derive(Debug, Parser)]
#[command(about = "Print an access token signed with the server's JWT secret")]
struct Cli {
    /// User id placed in the token's `user_id` and `sub` claims
    user_id: String,

    /// Role label to include; repeat for several roles
    #[arg(long = "role")]
    roles: Vec<String>,

    #[command(flatten)]
    config: Config,
}

fn main() {
    // Same .env the server reads, so JWT_SECRET only needs to live there
    dotenv().ok();
    let cli = Cli::parse();
    Logger::init_logger(&cli.config);

    match generate_token(&cli.config, &cli.user_id, cli.roles) {
        Ok(token) => println!("{token}"),
        Err(e) => {
            error!("Failed to mint token for user {}: {e}", cli.user_id);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::jwt::{JwtVerifier, TokenVerifier};

    #[test]
    fn parses_user_roles_and_secret() {
        let cli = Cli::try_parse_from([
            "mint_token",
            "u1",
            "--role",
            "PM",
            "--role",
            "Employee",
            "--jwt-secret",
            "dev-secret",
        ])
        .unwrap();

        assert_eq!(cli.user_id, "u1");
        assert_eq!(cli.roles, vec!["PM".to_string(), "Employee".to_string()]);

        let token = generate_token(&cli.config, &cli.user_id, cli.roles.clone()).unwrap();
        let identity = JwtVerifier::from_secret(b"dev-secret").verify(&token).unwrap();
        assert_eq!(identity.user_id, "u1");
        assert_eq!(identity.roles, cli.roles);
    }

    #[test]
    fn user_id_is_required() {
        assert!(Cli::try_parse_from(["mint_token", "--jwt-secret", "dev-secret"]).is_err());
    }
}
