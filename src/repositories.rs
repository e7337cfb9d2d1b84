use crate::models::{Book, CatalogError, CreateBookRequest};
use async_trait::async_trait;

#[async_trait]
pub trait BookRepository: Send + Sync + 'static {
    async fn create_book(&self, req: &CreateBookRequest) -> Result<Book, CatalogError>;

    async fn find_all_books(&self) -> Result<Vec<Book>, CatalogError>;

    async fn update_book(&self, book: &Book) -> Result<(), CatalogError>;

    async fn delete_book(&self, isbn: &str) -> Result<(), CatalogError>;
}
