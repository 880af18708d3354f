use echosavvy_domain::id::ProductId;

use crate::domain::repository::ProductRepository;
use crate::domain::types::Product;
use crate::error::ShopServiceError;

pub struct ListProductsUseCase<P>
where
    P: ProductRepository,
{
    pub products: P,
}

impl<P> ListProductsUseCase<P>
where
    P: ProductRepository,
{
    pub async fn execute(&self) -> Result<Vec<Product>, ShopServiceError> {
        self.products.list().await
    }
}

pub struct GetProductUseCase<P>
where
    P: ProductRepository,
{
    pub products: P,
}

impl<P> GetProductUseCase<P>
where
    P: ProductRepository,
{
    pub async fn execute(&self, id: ProductId) -> Result<Product, ShopServiceError> {
        self.products
            .find_by_id(id)
            .await?
            .ok_or(ShopServiceError::ProductNotFound)
    }
}
