//! Document id generation.

use rand::Rng as _;
use rand::distr::Alphanumeric;

/// Length of generated document ids, matching hosted document stores.
pub const AUTO_ID_LEN: usize = 20;

/// Generate a random alphanumeric document id.
#[must_use]
pub fn auto_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(AUTO_ID_LEN)
        .map(char::from)
        .collect()
}
