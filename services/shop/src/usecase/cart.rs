use echosavvy_domain::id::{ProductId, UserId};

use crate::domain::repository::{CartRepository, ProductRepository};
use crate::domain::types::{CartItem, validate_quantity};
use crate::error::ShopServiceError;

// ── List cart ─────────────────────────────────────────────────────────────────

pub struct ListCartUseCase<C>
where
    C: CartRepository,
{
    pub cart: C,
}

impl<C> ListCartUseCase<C>
where
    C: CartRepository,
{
    pub async fn execute(&self, user_id: UserId) -> Result<Vec<CartItem>, ShopServiceError> {
        self.cart.list_by_user(user_id).await
    }
}

// ── Add to cart ───────────────────────────────────────────────────────────────

pub struct AddToCartUseCase<P, C>
where
    P: ProductRepository,
    C: CartRepository,
{
    pub products: P,
    pub cart: C,
}

impl<P, C> AddToCartUseCase<P, C>
where
    P: ProductRepository,
    C: CartRepository,
{
    /// Name, price and image come from the catalog, never from the client. The
    /// accumulated line quantity stays within `MAX_QUANTITY`.
    pub async fn execute(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<CartItem, ShopServiceError> {
        let quantity = validate_quantity(quantity)?;
        let product = self
            .products
            .find_by_id(product_id)
            .await?
            .ok_or(ShopServiceError::ProductNotFound)?;
        if let Some(line) = self.cart.find(user_id, product_id).await? {
            validate_quantity(i64::from(line.quantity) + i64::from(quantity))?;
        }
        self.cart.add(user_id, &product, quantity).await
    }
}

// ── Update quantity ───────────────────────────────────────────────────────────

pub struct UpdateCartItemUseCase<P, C>
where
    P: ProductRepository,
    C: CartRepository,
{
    pub products: P,
    pub cart: C,
}

impl<P, C> UpdateCartItemUseCase<P, C>
where
    P: ProductRepository,
    C: CartRepository,
{
    pub async fn execute(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<CartItem, ShopServiceError> {
        let quantity = validate_quantity(quantity)?;
        if self.cart.find(user_id, product_id).await?.is_none() {
            return Err(ShopServiceError::CartItemNotFound);
        }
        let product = self
            .products
            .find_by_id(product_id)
            .await?
            .ok_or(ShopServiceError::ProductNotFound)?;

        self.cart.set_quantity(user_id, &product, quantity).await?;
        self.cart
            .find(user_id, product_id)
            .await?
            .ok_or(ShopServiceError::CartItemNotFound)
    }
}

// ── Remove ────────────────────────────────────────────────────────────────────

pub struct RemoveCartItemUseCase<C>
where
    C: CartRepository,
{
    pub cart: C,
}

impl<C> RemoveCartItemUseCase<C>
where
    C: CartRepository,
{
    pub async fn execute(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<(), ShopServiceError> {
        if !self.cart.remove(user_id, product_id).await? {
            return Err(ShopServiceError::CartItemNotFound);
        }
        Ok(())
    }
}

// ── Clear ─────────────────────────────────────────────────────────────────────

pub struct ClearCartUseCase<C>
where
    C: CartRepository,
{
    pub cart: C,
}

impl<C> ClearCartUseCase<C>
where
    C: CartRepository,
{
    pub async fn execute(&self, user_id: UserId) -> Result<(), ShopServiceError> {
        let removed = self.cart.clear(user_id).await?;
        tracing::debug!(user_id = %user_id, removed, "cart cleared");
        Ok(())
    }
}

// ── Merge guest cart ──────────────────────────────────────────────────────────

pub struct MergeLine {
    pub product_id: ProductId,
    pub quantity: i64,
}

pub struct MergeCartUseCase<P, C>
where
    P: ProductRepository,
    C: CartRepository,
{
    pub products: P,
    pub cart: C,
}

impl<P, C> MergeCartUseCase<P, C>
where
    P: ProductRepository,
    C: CartRepository,
{
    /// Fold a guest cart into the server cart. Nothing is written unless every
    /// line is valid and every merged line stays within `MAX_QUANTITY`.
    pub async fn execute(
        &self,
        user_id: UserId,
        lines: Vec<MergeLine>,
    ) -> Result<Vec<CartItem>, ShopServiceError> {
        let mut merged: Vec<(ProductId, i64)> = Vec::with_capacity(lines.len());
        for line in lines {
            validate_quantity(line.quantity)?;
            match merged.iter_mut().find(|(id, _)| *id == line.product_id) {
                Some((_, quantity)) => *quantity += line.quantity,
                None => merged.push((line.product_id, line.quantity)),
            }
        }
        let merged = merged
            .into_iter()
            .map(|(id, quantity)| validate_quantity(quantity).map(|q| (id, q)))
            .collect::<Result<Vec<_>, _>>()?;

        let ids: Vec<ProductId> = merged.iter().map(|(id, _)| *id).collect();
        let products = if ids.is_empty() {
            Vec::new()
        } else {
            self.products.find_by_ids(&ids).await?
        };

        let mut resolved = Vec::with_capacity(merged.len());
        for (id, quantity) in merged {
            let product = products
                .iter()
                .find(|p| p.id == id)
                .ok_or(ShopServiceError::ProductNotFound)?;
            resolved.push((product, quantity));
        }

        if !resolved.is_empty() {
            let existing = self.cart.list_by_user(user_id).await?;
            for (product, quantity) in &resolved {
                if let Some(line) = existing.iter().find(|line| line.product_id == product.id) {
                    validate_quantity(i64::from(line.quantity) + i64::from(*quantity))?;
                }
            }
        }

        for (product, quantity) in resolved {
            self.cart.add(user_id, product, quantity).await?;
        }
        tracing::debug!(user_id = %user_id, lines = ids.len(), "guest cart merged");

        self.cart.list_by_user(user_id).await
    }
}
