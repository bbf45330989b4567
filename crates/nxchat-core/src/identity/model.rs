//! Visitor identity model and id generation.

use rand::Rng;
use serde::{Deserialize, Serialize};

const ID_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const RANDOM_PART_LEN: usize = 9;

/// Identity of the visitor for one page load.
///
/// `visitor_id` is stable across loads for as long as durable storage is kept;
/// `session_id` is unique to this load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorIdentity {
    pub visitor_id: String,
    pub session_id: String,
}

fn random_part() -> String {
    let mut rng = rand::thread_rng();
    (0..RANDOM_PART_LEN)
        .map(|_| ID_CHARSET[rng.gen_range(0..ID_CHARSET.len())] as char)
        .collect()
}

/// Generates `visitor_<random>_<unix millis>`.
pub fn generate_visitor_id() -> String {
    format!(
        "visitor_{}_{}",
        random_part(),
        chrono::Utc::now().timestamp_millis()
    )
}

/// Generates `session_<unix millis>_<random>`.
pub fn generate_session_id() -> String {
    format!(
        "session_{}_{}",
        chrono::Utc::now().timestamp_millis(),
        random_part()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visitor_id_format() {
        let id = generate_visitor_id();
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "visitor");
        assert_eq!(parts[1].len(), RANDOM_PART_LEN);
        assert!(parts[1].bytes().all(|b| ID_CHARSET.contains(&b)));
        assert!(parts[2].parse::<i64>().is_ok());
    }

    #[test]
    fn test_session_ids_are_unique() {
        let a = generate_session_id();
        let b = generate_session_id();
        assert!(a.starts_with("session_"));
        assert_ne!(a, b);
    }
}
