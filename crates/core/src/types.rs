/// Primary keys are UUID v7: unique, and their canonical string form sorts
/// by creation time.
pub type RecordId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Generate a fresh, time-ordered record ID.
pub fn new_record_id() -> RecordId {
    uuid::Uuid::now_v7()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_sort_by_creation() {
        let first = new_record_id();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = new_record_id();

        assert_ne!(first, second);
        assert!(first.to_string() < second.to_string());
        assert_eq!(first.get_version_num(), 7);
    }
}
