//! Identifier minting.

use uuid::Uuid;

/// Mint a new `system_id`.
///
/// UUIDv7 keeps identifiers globally unique while sorting roughly by the
/// time they were minted, which keeps spreadsheet audits readable.
pub fn new_system_id() -> String {
    Uuid::now_v7().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_new_system_id_is_uuid_v7() {
        let id = new_system_id();
        let parsed = Uuid::parse_str(&id).unwrap();
        assert_eq!(parsed.get_version_num(), 7);
    }

    #[test]
    fn test_new_system_id_unique() {
        let ids: HashSet<String> = (0..1000).map(|_| new_system_id()).collect();
        assert_eq!(ids.len(), 1000);
    }
}
