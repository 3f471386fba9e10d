//! Challenge token generation

use rand::distr::Alphanumeric;
use rand::Rng;

const TOKEN_LEN: usize = 32;

/// Generate a fresh, single-use challenge token.
///
/// The `blogdex-` prefix makes the token recognizable when it shows up in
/// a TXT record or a hosted file.
pub fn generate_challenge_token() -> String {
    let token: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect();
    format!("blogdex-{token}")
}
