use rand::{Rng, distributions::Alphanumeric};

/// Length of email-verification tokens.
pub const VERIFICATION_TOKEN_LENGTH: usize = 64;

/// Length of OAuth `state` values.
pub const OAUTH_STATE_LENGTH: usize = 32;

/// Generates a random alphanumeric string of the specified length.
///
/// The generated string contains uppercase letters (A-Z), lowercase letters (a-z),
/// and digits (0-9). `thread_rng` is a CSPRNG, so the output is suitable for
/// opaque tokens such as email-verification links and OAuth state values.
pub fn generate_random_string(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_requested_length() {
        let token = generate_random_string(VERIFICATION_TOKEN_LENGTH);
        assert_eq!(token.len(), VERIFICATION_TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn tokens_do_not_repeat() {
        assert_ne!(generate_random_string(32), generate_random_string(32));
    }
}
