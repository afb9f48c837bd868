//! Loading products into the vector index.

use crate::errors::{RagflowError, Result};
use crate::ports::{Embedder, VectorIndex};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// A product to index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Product id, also used as the document id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Free-text description; this is what gets embedded.
    pub description: String,
    /// Category keyword.
    pub category: String,
    /// Price.
    pub price: f64,
}

/// Reads a JSON array of products from a file.
pub fn load_products(path: impl AsRef<Path>) -> Result<Vec<Product>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// k-NN index mapping for products.
#[must_use]
pub fn product_index_mapping(dimension: usize) -> Value {
    json!({
        "settings": { "index": { "knn": true } },
        "mappings": {
            "properties": {
                "product_id": { "type": "keyword" },
                "name": { "type": "text" },
                "description": { "type": "text" },
                "category": { "type": "keyword" },
                "price": { "type": "float" },
                "vector": {
                    "type": "knn_vector",
                    "dimension": dimension,
                    "method": {
                        "name": "hnsw",
                        "space_type": "l2",
                        "engine": "nmslib"
                    }
                }
            }
        }
    })
}

/// Embeds product descriptions and writes them to a [`VectorIndex`].
pub struct ProductIndexer {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn Embedder>,
    dimension: usize,
}

impl std::fmt::Debug for ProductIndexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductIndexer")
            .field("dimension", &self.dimension)
            .finish_non_exhaustive()
    }
}

impl ProductIndexer {
    /// Creates an indexer for embeddings of `dimension` values.
    pub fn new(index: Arc<dyn VectorIndex>, embedder: Arc<dyn Embedder>, dimension: usize) -> Self {
        Self {
            index,
            embedder,
            dimension,
        }
    }

    /// Creates the index unless it already exists. Returns true if created.
    pub async fn ensure_index(&self) -> Result<bool> {
        if self.index.index_exists().await? {
            return Ok(false);
        }
        self.index
            .create_index(&product_index_mapping(self.dimension))
            .await?;
        Ok(true)
    }

    /// Embeds and stores one product.
    pub async fn index_product(&self, product: &Product) -> Result<()> {
        let vector = self.embedder.embed(&product.description).await?;
        if vector.len() != self.dimension {
            return Err(RagflowError::Decode(format!(
                "embedding for product '{}' has {} dimensions, index expects {}",
                product.id,
                vector.len(),
                self.dimension
            )));
        }

        let document = json!({
            "product_id": product.id,
            "name": product.name,
            "description": product.description,
            "category": product.category,
            "price": product.price,
            "vector": vector,
        });
        self.index.index_document(&product.id, &document).await
    }

    /// Ensures the index exists, then indexes every product in order.
    ///
    /// Stops at the first failure. Returns the number of products indexed.
    pub async fn index_all(&self, products: &[Product]) -> Result<usize> {
        if self.ensure_index().await? {
            info!("created product index");
        }
        for product in products {
            self.index_product(product).await?;
            info!(product = %product.name, "indexed product");
        }
        Ok(products.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::MockEmbedder;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct MemoryIndex {
        exists: bool,
        mapping: Mutex<Option<Value>>,
        documents: Mutex<Vec<(String, Value)>>,
    }

    #[async_trait]
    impl VectorIndex for MemoryIndex {
        async fn index_exists(&self) -> Result<bool> {
            Ok(self.exists || self.mapping.lock().is_some())
        }

        async fn create_index(&self, mapping: &Value) -> Result<()> {
            *self.mapping.lock() = Some(mapping.clone());
            Ok(())
        }

        async fn index_document(&self, id: &str, document: &Value) -> Result<()> {
            self.documents.lock().push((id.to_string(), document.clone()));
            Ok(())
        }
    }

    fn product(id: &str) -> Product {
        Product {
            id: id.to_string(),
            name: "Wireless Headphones".to_string(),
            description: "Premium noise-cancelling wireless headphones with 30-hour battery life".to_string(),
            category: "Electronics".to_string(),
            price: 199.99,
        }
    }

    fn embedder(dimension: usize) -> Arc<MockEmbedder> {
        let mut embedder = MockEmbedder::new();
        embedder
            .expect_embed()
            .returning(move |_| Ok(vec![0.0; dimension]));
        Arc::new(embedder)
    }

    #[test]
    fn test_mapping_dimension() {
        let mapping = product_index_mapping(1536);
        assert_eq!(mapping["mappings"]["properties"]["vector"]["dimension"], json!(1536));
        assert_eq!(mapping["mappings"]["properties"]["category"]["type"], json!("keyword"));
    }

    #[tokio::test]
    async fn test_index_all_creates_index_and_documents() {
        let index = Arc::new(MemoryIndex::default());
        let indexer = ProductIndexer::new(index.clone(), embedder(4), 4);

        let count = indexer.index_all(&[product("1"), product("2")]).await.unwrap();

        assert_eq!(count, 2);
        assert!(index.mapping.lock().is_some());
        let documents = index.documents.lock();
        assert_eq!(documents[0].0, "1");
        assert_eq!(documents[1].1["product_id"], json!("2"));
        assert_eq!(documents[1].1["vector"].as_array().map(Vec::len), Some(4));
    }

    #[tokio::test]
    async fn test_existing_index_is_kept() {
        let index = Arc::new(MemoryIndex {
            exists: true,
            ..MemoryIndex::default()
        });
        let indexer = ProductIndexer::new(index.clone(), embedder(4), 4);

        assert!(!indexer.ensure_index().await.unwrap());
        assert!(index.mapping.lock().is_none());
    }

    #[test]
    fn test_load_products_errors() {
        let missing = load_products("/nonexistent/ragflow/products.json").unwrap_err();
        assert!(matches!(missing, RagflowError::Io(_)));

        let path = std::env::temp_dir().join(format!("ragflow-products-{}.json", std::process::id()));
        std::fs::write(&path, r#"[{"id": "1", "name": "Wireless Headphones", "description": "Noise-cancelling", "category": "Electronics", "price": 199.99}]"#).unwrap();
        let products = load_products(&path).unwrap();
        std::fs::write(&path, "{not json").unwrap();
        let malformed = load_products(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(products[0].name, "Wireless Headphones");
        assert!(matches!(malformed, RagflowError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_dimension_mismatch_aborts() {
        let index = Arc::new(MemoryIndex::default());
        let indexer = ProductIndexer::new(index.clone(), embedder(3), 4);

        let err = indexer.index_all(&[product("1")]).await.unwrap_err();

        assert!(matches!(err, RagflowError::Decode(_)));
        assert!(index.documents.lock().is_empty());
    }
}
