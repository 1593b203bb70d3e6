use tracing::info;

use crate::models::knowledge::{KnowledgeBase, ProductInfo, ProductKey, ProductPatch};

/// Product catalogue shared by every operator. Lives in memory only; a restart
/// brings back the default catalogue.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBaseStore {
    knowledge_base: KnowledgeBase,
}

impl KnowledgeBaseStore {
    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.knowledge_base
    }

    /// Merges the present fields of `patch` into one product.
    pub fn update_product(&mut self, key: ProductKey, patch: ProductPatch) -> &ProductInfo {
        let product = self.knowledge_base.product_mut(key);
        product.apply(patch);
        info!("Updated knowledge base entry {}", key.key());
        product
    }

    pub fn reset(&mut self) -> &KnowledgeBase {
        self.knowledge_base = KnowledgeBase::default();
        &self.knowledge_base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_touches_only_one_product() {
        let mut store = KnowledgeBaseStore::default();
        let updated = store.update_product(
            ProductKey::Reksadana,
            ProductPatch {
                minimum_investment: Some("Rp 50,000".into()),
                ..Default::default()
            },
        );
        assert_eq!(updated.minimum_investment, "Rp 50,000");
        assert_eq!(updated.name, "Reksa Dana");

        let kb = store.knowledge_base();
        assert_eq!(kb.dana_plus, KnowledgeBase::default().dana_plus);
        assert_eq!(kb.emas, KnowledgeBase::default().emas);
    }

    #[test]
    fn test_reset_restores_catalogue() {
        let mut store = KnowledgeBaseStore::default();
        store.update_product(
            ProductKey::Emas,
            ProductPatch {
                description: Some(String::new()),
                ..Default::default()
            },
        );
        assert_eq!(store.knowledge_base().emas.description, "");
        assert_eq!(store.reset(), &KnowledgeBase::default());
    }
}
