//! Rate-limited batch publisher with partial-failure handling.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::sleep;

use crate::{
    domain::{ChannelTarget, UserId},
    draft::{DraftStore, PostItem},
    errors::ValidationError,
    limiter::{PostQuota, QuotaDecision},
    Error, Result,
};

/// Port for emitting one post to the broadcast destination.
#[async_trait]
pub trait BroadcastPort: Send + Sync {
    async fn send_post(&self, channel: &ChannelTarget, item: &PostItem) -> Result<()>;
}

/// Aggregate outcome of one batch publish.
#[derive(Debug)]
pub struct PublishResult {
    pub succeeded: usize,
    pub total: usize,
    /// `(item index, cause)` for every failed emission, in order.
    pub per_item_errors: Vec<(usize, Error)>,
}

impl PublishResult {
    pub fn is_full_success(&self) -> bool {
        self.succeeded == self.total
    }
}

/// Publish the owner's draft to the channel, item by item.
///
/// The quota is checked once up front (`QuotaExceeded` preserves the draft
/// for a later retry) and consumed per successfully published item. Item
/// failures are recorded and never abort the rest of the batch. Whatever the
/// outcome, the batch is attempted exactly once: the draft is discarded
/// afterwards, even on zero successes.
pub async fn publish_draft(
    store: &DraftStore,
    quota: &Mutex<PostQuota>,
    broadcaster: &dyn BroadcastPort,
    channel: &ChannelTarget,
    delay: Duration,
    owner: UserId,
) -> Result<PublishResult> {
    let draft = store.snapshot(owner).await?;
    if draft.items().is_empty() {
        return Err(ValidationError::EmptyDraft.into());
    }

    {
        let mut q = quota.lock().await;
        if let QuotaDecision::Denied { limit } = q.check(owner) {
            return Err(Error::QuotaExceeded { limit });
        }
    }

    let total = draft.items().len();
    let mut result = PublishResult {
        succeeded: 0,
        total,
        per_item_errors: Vec::new(),
    };

    for (idx, item) in draft.items().iter().enumerate() {
        match broadcaster.send_post(channel, item).await {
            Ok(()) => {
                result.succeeded += 1;
                quota.lock().await.record(owner);
                if idx + 1 < total && !delay.is_zero() {
                    sleep(delay).await;
                }
            }
            Err(cause) => {
                result.per_item_errors.push((idx, cause));
            }
        }
    }

    store.discard(owner).await;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FileId;
    use crate::draft::DraftMode;
    use std::collections::HashSet;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct FakeBroadcast {
        fail_indices: HashSet<usize>,
        sent: StdMutex<Vec<PostItem>>,
        attempts: StdMutex<usize>,
    }

    impl FakeBroadcast {
        fn failing(indices: &[usize]) -> Self {
            Self {
                fail_indices: indices.iter().copied().collect(),
                ..Self::default()
            }
        }

        fn sent(&self) -> Vec<PostItem> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BroadcastPort for FakeBroadcast {
        async fn send_post(&self, _channel: &ChannelTarget, item: &PostItem) -> Result<()> {
            let idx = {
                let mut attempts = self.attempts.lock().unwrap();
                let idx = *attempts;
                *attempts += 1;
                idx
            };
            if self.fail_indices.contains(&idx) {
                return Err(Error::Transport(format!("channel rejected item {idx}")));
            }
            self.sent.lock().unwrap().push(item.clone());
            Ok(())
        }
    }

    fn channel() -> ChannelTarget {
        ChannelTarget::Username("@test".to_string())
    }

    async fn seeded_store(owner: UserId, captions: &[&str]) -> DraftStore {
        let store = DraftStore::new();
        store.start(owner, DraftMode::Multiple).await;
        for (i, caption) in captions.iter().enumerate() {
            store
                .with(owner, |d| {
                    d.receive_media(FileId(format!("file-{i}")), caption).map(|_| ())
                })
                .await
                .unwrap()
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn full_success_publishes_in_order_and_discards_draft() {
        let owner = UserId(1);
        let store = seeded_store(owner, &["first", "second"]).await;
        // Button on item 0 only.
        store
            .with(owner, |d| {
                d.prev();
                d.begin_link_entry();
                d.add_buttons("Buy - https://x.com");
                d.finish_link_entry();
            })
            .await
            .unwrap();

        let quota = Mutex::new(PostQuota::new(50, Duration::from_secs(60)));
        let fake = FakeBroadcast::default();

        let res = publish_draft(&store, &quota, &fake, &channel(), Duration::ZERO, owner)
            .await
            .unwrap();

        assert_eq!(res.succeeded, 2);
        assert_eq!(res.total, 2);
        assert!(res.per_item_errors.is_empty());
        assert!(res.is_full_success());

        let sent = fake.sent();
        assert_eq!(sent[0].caption, "first");
        assert_eq!(sent[0].buttons.len(), 1);
        assert_eq!(sent[1].caption, "second");
        assert!(sent[1].buttons.is_empty());

        assert!(!store.contains(owner).await);
        assert_eq!(quota.lock().await.used(owner), 2);
    }

    #[tokio::test]
    async fn item_failure_is_recorded_and_batch_continues() {
        let owner = UserId(1);
        let store = seeded_store(owner, &["a", "b", "c"]).await;
        let quota = Mutex::new(PostQuota::new(50, Duration::from_secs(60)));
        let fake = FakeBroadcast::failing(&[1]);

        let res = publish_draft(&store, &quota, &fake, &channel(), Duration::ZERO, owner)
            .await
            .unwrap();

        assert_eq!(res.succeeded, 2);
        assert_eq!(res.total, 3);
        assert_eq!(res.per_item_errors.len(), 1);
        assert_eq!(res.per_item_errors[0].0, 1);
        assert_eq!(res.succeeded + res.per_item_errors.len(), res.total);

        // Only successful items consume quota; the draft is gone either way.
        assert_eq!(quota.lock().await.used(owner), 2);
        assert!(!store.contains(owner).await);
    }

    #[tokio::test]
    async fn zero_successes_still_discards_the_draft() {
        let owner = UserId(1);
        let store = seeded_store(owner, &["a", "b"]).await;
        let quota = Mutex::new(PostQuota::new(50, Duration::from_secs(60)));
        let fake = FakeBroadcast::failing(&[0, 1]);

        let res = publish_draft(&store, &quota, &fake, &channel(), Duration::ZERO, owner)
            .await
            .unwrap();

        assert_eq!(res.succeeded, 0);
        assert_eq!(res.per_item_errors.len(), 2);
        assert!(!store.contains(owner).await);
        assert_eq!(quota.lock().await.used(owner), 0);
    }

    #[tokio::test]
    async fn quota_denial_preserves_the_draft_and_sends_nothing() {
        let owner = UserId(1);
        let store = seeded_store(owner, &["a"]).await;
        let quota = Mutex::new(PostQuota::new(1, Duration::from_secs(60)));
        quota.lock().await.record(owner);

        let fake = FakeBroadcast::default();
        let err = publish_draft(&store, &quota, &fake, &channel(), Duration::ZERO, owner)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::QuotaExceeded { limit: 1 }));
        assert!(fake.sent().is_empty());
        assert!(store.contains(owner).await);
    }

    #[tokio::test]
    async fn empty_draft_is_rejected_before_the_quota() {
        let owner = UserId(1);
        let store = DraftStore::new();
        store.start(owner, DraftMode::Single).await;
        let quota = Mutex::new(PostQuota::new(50, Duration::from_secs(60)));
        let fake = FakeBroadcast::default();

        let err = publish_draft(&store, &quota, &fake, &channel(), Duration::ZERO, owner)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::EmptyDraft)
        ));
        // Rejection is not an attempt; the draft stays.
        assert!(store.contains(owner).await);
    }

    #[tokio::test]
    async fn missing_draft_reports_session_expired() {
        let store = DraftStore::new();
        let quota = Mutex::new(PostQuota::new(50, Duration::from_secs(60)));
        let fake = FakeBroadcast::default();

        let err = publish_draft(&store, &quota, &fake, &channel(), Duration::ZERO, UserId(9))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SessionExpired));
    }
}
