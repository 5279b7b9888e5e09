use std::sync::Arc;

use anyhow::Result;
use futures::future::join_all;

use crate::matcher::find_by_field;
use crate::model::Label;
use crate::services::LabelService;

/// Already-loaded label collection plus the creation endpoint. Title
/// uniqueness (case-insensitive) is enforced here by the resolution path,
/// not by the server.
pub struct LabelStore {
    labels: Vec<Label>,
    service: Arc<dyn LabelService>,
}

impl LabelStore {
    pub fn new(service: Arc<dyn LabelService>) -> Self {
        Self {
            labels: Vec::new(),
            service,
        }
    }

    pub fn set_labels(&mut self, labels: Vec<Label>) {
        self.labels = labels;
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn find_label_by_exact_title(&self, title: &str) -> Option<&Label> {
        find_by_field(&self.labels, |l| l.title.as_str(), title)
    }

    /// Create a label remotely and add the server-side record to the
    /// collection.
    pub async fn create_label(&mut self, label: Label) -> Result<Label> {
        let created = self.service.create(label).await?;
        self.labels.push(created.clone());
        Ok(created)
    }

    /// Create a batch of labels concurrently. The whole batch is awaited
    /// before any of the results enter the collection.
    pub(crate) async fn create_all(&mut self, titles: Vec<String>) -> Result<Vec<Label>> {
        let creations = titles.into_iter().map(|title| {
            let service = Arc::clone(&self.service);
            async move { service.create(Label::new(title)).await }
        });

        let created: Vec<Label> = join_all(creations)
            .await
            .into_iter()
            .collect::<Result<_>>()?;
        self.labels.extend(created.iter().cloned());
        Ok(created)
    }
}

impl std::fmt::Debug for LabelStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabelStore")
            .field("labels", &self.labels)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicI64, Ordering};

    #[derive(Default)]
    struct FakeLabelService {
        next_id: AtomicI64,
    }

    #[async_trait]
    impl LabelService for FakeLabelService {
        async fn create(&self, label: Label) -> Result<Label> {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(Label { id, ..label })
        }
    }

    #[tokio::test]
    async fn created_labels_enter_the_collection() {
        let mut store = LabelStore::new(Arc::new(FakeLabelService::default()));
        let created = store.create_label(Label::new("bug")).await.unwrap();
        assert_eq!(created.id, 1);
        assert_eq!(store.labels().len(), 1);
        assert_eq!(
            store.find_label_by_exact_title("BUG").map(|l| l.id),
            Some(1)
        );
    }

    #[tokio::test]
    async fn batch_creation_keeps_input_order() {
        let mut store = LabelStore::new(Arc::new(FakeLabelService::default()));
        let created = store
            .create_all(vec!["a".into(), "b".into(), "c".into()])
            .await
            .unwrap();
        let titles: Vec<&str> = created.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
        assert_eq!(store.labels().len(), 3);
    }
}
