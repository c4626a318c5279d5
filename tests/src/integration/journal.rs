//! # Journal Integration
//!
//! Append-order and idempotency behavior of the signing-history
//! journal under repeated and out-of-order status delivery.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use shared_types::{EngagementMeta, SignedDocument, SigningStatus};
    use signing_history::{InMemoryHistoryStore, SigningHistoryJournal, UpsertRequest};

    fn journal() -> SigningHistoryJournal {
        SigningHistoryJournal::new(Arc::new(InMemoryHistoryStore::new()), b"test-key".to_vec())
    }

    fn request(resource_id: &str, status: SigningStatus) -> UpsertRequest {
        UpsertRequest {
            resource_id: resource_id.to_owned(),
            user: "u-1".into(),
            device: "d-1".into(),
            status,
            documents: vec![SignedDocument {
                file_name: "contract.pdf".to_owned(),
                hash: "deadbeef".to_owned(),
            }],
            meta: EngagementMeta::default(),
        }
    }

    #[tokio::test]
    async fn test_n_upserts_yield_history_of_length_n_in_call_order() {
        let journal = journal();
        let statuses = [
            SigningStatus::Processing,
            SigningStatus::Done,
            SigningStatus::Refuse,
        ];

        for status in statuses {
            journal.upsert_item(request("res-1", status)).await.unwrap();
        }

        let entry = journal.get_item_by_id("res-1").await.unwrap();
        assert_eq!(entry.status_history.len(), statuses.len());
        let recorded: Vec<_> = entry.status_history.iter().map(|c| c.status).collect();
        assert_eq!(recorded, statuses);
        assert_eq!(entry.current_status(), Some(SigningStatus::Refuse));
    }

    #[tokio::test]
    async fn test_out_of_order_delivery_is_kept_in_arrival_order() {
        // A terminal status arriving before Processing stays first in
        // the history; current status reflects arrival, not origin.
        let journal = journal();
        journal
            .upsert_item(request("res-1", SigningStatus::Done))
            .await
            .unwrap();
        journal
            .upsert_item(request("res-1", SigningStatus::Processing))
            .await
            .unwrap();

        let entry = journal.get_item_by_id("res-1").await.unwrap();
        assert_eq!(entry.status_history[0].status, SigningStatus::Done);
        assert_eq!(entry.current_status(), Some(SigningStatus::Processing));
    }

    #[tokio::test]
    async fn test_listing_filters_on_current_status() {
        let journal = journal();
        journal
            .upsert_item(request("res-1", SigningStatus::Processing))
            .await
            .unwrap();
        journal
            .upsert_item(request("res-1", SigningStatus::Done))
            .await
            .unwrap();
        journal
            .upsert_item(request("res-2", SigningStatus::Processing))
            .await
            .unwrap();

        let processing = journal
            .get_items_by_status(&"u-1".into(), SigningStatus::Processing)
            .await
            .unwrap();
        assert_eq!(processing.len(), 1);
        assert_eq!(processing[0].resource_id, "res-2");

        let done = journal
            .get_items_by_status(&"u-1".into(), SigningStatus::Done)
            .await
            .unwrap();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].resource_id, "res-1");
    }

    #[tokio::test]
    async fn test_entries_from_one_device_share_a_session() {
        let journal = journal();
        journal
            .upsert_item(request("res-1", SigningStatus::Processing))
            .await
            .unwrap();
        journal
            .upsert_item(request("res-2", SigningStatus::Processing))
            .await
            .unwrap();

        let first = journal.get_item_by_id("res-1").await.unwrap();
        let second = journal.get_item_by_id("res-2").await.unwrap();
        assert_eq!(first.session_id, second.session_id);
        assert!(!first.session_id.is_empty());
    }
}
