use uuid::Uuid;

/// Fresh primary key for any row in the store.
///
/// UUIDv7 embeds the creation time, so ids sort in insertion order and are
/// easy to correlate in logs.
pub fn new_id() -> String {
    Uuid::now_v7().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_sortable() {
        let a = new_id();
        let b = new_id();
        assert_ne!(a, b);
        assert!(a < b);
    }
}
