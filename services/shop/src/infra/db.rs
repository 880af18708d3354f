use std::sync::Arc;

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Func, OnConflict};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, SqlErr,
};

use echosavvy_domain::credential::CredentialId;
use echosavvy_domain::id::{ProductId, UserId};
use echosavvy_shop_schema::{cart, products, users};

use crate::domain::repository::{CartRepository, ProductRepository, UserRepository};
use crate::domain::types::{CartItem, MAX_QUANTITY, NewUser, Product, User, line_total};
use crate::error::ShopServiceError;

// ── User repository ───────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: Arc<DatabaseConnection>,
}

impl UserRepository for DbUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, ShopServiceError> {
        let model = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(self.db.as_ref())
            .await
            .context("find user by username")?;
        Ok(model.map(user_from_model))
    }

    async fn create(&self, user: &NewUser) -> Result<UserId, ShopServiceError> {
        let model = users::ActiveModel {
            username: Set(user.username.clone()),
            phone: Set(user.phone.clone()),
            credential_id: Set(user.credential_id.as_str().to_owned()),
            public_key: Set(user.public_key.clone()),
            challenge: Set(None),
            challenge_expires_at: Set(None),
            token: Set(None),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        match users::Entity::insert(model).exec(self.db.as_ref()).await {
            Ok(result) => Ok(UserId(result.last_insert_id)),
            Err(e) if is_unique_violation(&e) => Err(ShopServiceError::UsernameTaken),
            Err(e) => Err(anyhow::Error::new(e).context("insert user").into()),
        }
    }

    async fn set_challenge(
        &self,
        id: UserId,
        challenge: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), ShopServiceError> {
        users::Entity::update_many()
            .col_expr(users::Column::Challenge, Expr::value(challenge.to_owned()))
            .col_expr(users::Column::ChallengeExpiresAt, Expr::value(expires_at))
            .filter(users::Column::Id.eq(id.0))
            .exec(self.db.as_ref())
            .await
            .context("set login challenge")?;
        Ok(())
    }

    async fn consume_challenge(
        &self,
        id: UserId,
        challenge: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, ShopServiceError> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::Challenge, Expr::value(Option::<String>::None))
            .col_expr(
                users::Column::ChallengeExpiresAt,
                Expr::value(Option::<DateTime<Utc>>::None),
            )
            .filter(users::Column::Id.eq(id.0))
            .filter(users::Column::Challenge.eq(challenge))
            .filter(users::Column::ChallengeExpiresAt.gt(now))
            .exec(self.db.as_ref())
            .await
            .context("consume login challenge")?;
        Ok(result.rows_affected == 1)
    }

    async fn set_token(&self, id: UserId, token: &str) -> Result<(), ShopServiceError> {
        users::Entity::update_many()
            .col_expr(users::Column::Token, Expr::value(token.to_owned()))
            .filter(users::Column::Id.eq(id.0))
            .exec(self.db.as_ref())
            .await
            .context("store session token")?;
        Ok(())
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

fn user_from_model(model: users::Model) -> User {
    User {
        id: UserId(model.id),
        username: model.username,
        phone: model.phone,
        credential_id: CredentialId::from_canonical(model.credential_id),
        public_key: model.public_key,
        challenge: model.challenge,
        challenge_expires_at: model.challenge_expires_at,
        created_at: model.created_at,
    }
}

// ── Product repository ────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbProductRepository {
    pub db: Arc<DatabaseConnection>,
}

impl ProductRepository for DbProductRepository {
    async fn list(&self) -> Result<Vec<Product>, ShopServiceError> {
        let models = products::Entity::find()
            .order_by_asc(products::Column::Id)
            .all(self.db.as_ref())
            .await
            .context("list products")?;
        Ok(models.into_iter().map(product_from_model).collect())
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, ShopServiceError> {
        let model = products::Entity::find_by_id(id.0)
            .one(self.db.as_ref())
            .await
            .context("find product")?;
        Ok(model.map(product_from_model))
    }

    async fn find_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, ShopServiceError> {
        let models = products::Entity::find()
            .filter(products::Column::Id.is_in(ids.iter().map(|id| id.0)))
            .order_by_asc(products::Column::Id)
            .all(self.db.as_ref())
            .await
            .context("find products by ids")?;
        Ok(models.into_iter().map(product_from_model).collect())
    }
}

fn product_from_model(model: products::Model) -> Product {
    Product {
        id: ProductId(model.id),
        name: model.name,
        category: model.category,
        price: model.price,
        description: model.description,
        image_url: model.image_url,
    }
}

// ── Cart repository ───────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbCartRepository {
    pub db: Arc<DatabaseConnection>,
}

impl CartRepository for DbCartRepository {
    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<CartItem>, ShopServiceError> {
        let models = cart::Entity::find()
            .filter(cart::Column::UserId.eq(user_id.0))
            .order_by_asc(cart::Column::Id)
            .all(self.db.as_ref())
            .await
            .context("list cart")?;
        Ok(models.into_iter().map(cart_item_from_model).collect())
    }

    async fn find(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<CartItem>, ShopServiceError> {
        let model = cart::Entity::find()
            .filter(cart::Column::UserId.eq(user_id.0))
            .filter(cart::Column::ProductId.eq(product_id.0))
            .one(self.db.as_ref())
            .await
            .context("find cart line")?;
        Ok(model.map(cart_item_from_model))
    }

    async fn add(
        &self,
        user_id: UserId,
        product: &Product,
        quantity: i32,
    ) -> Result<CartItem, ShopServiceError> {
        let now = Utc::now();
        let line = cart::ActiveModel {
            user_id: Set(user_id.0),
            product_id: Set(product.id.0),
            product_name: Set(product.name.clone()),
            price: Set(product.price),
            quantity: Set(quantity),
            image_url: Set(product.image_url.clone()),
            total_amount: Set(line_total(product.price, quantity)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        // MySQL applies ON DUPLICATE KEY assignments left to right, so the total
        // must be computed while `quantity` still holds the old value. LEAST keeps
        // racing adds within the cap the use case checks.
        let capped_quantity = || {
            Func::least([
                Expr::col(cart::Column::Quantity).add(quantity),
                Expr::value(MAX_QUANTITY as i32),
            ])
        };
        let on_conflict = OnConflict::columns([cart::Column::UserId, cart::Column::ProductId])
            .value(
                cart::Column::TotalAmount,
                Expr::expr(capped_quantity()).mul(product.price),
            )
            .value(cart::Column::Quantity, capped_quantity())
            .update_columns([
                cart::Column::ProductName,
                cart::Column::Price,
                cart::Column::ImageUrl,
                cart::Column::UpdatedAt,
            ])
            .to_owned();

        cart::Entity::insert(line)
            .on_conflict(on_conflict)
            .exec_without_returning(self.db.as_ref())
            .await
            .context("upsert cart line")?;

        self.find(user_id, product.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("cart line missing after upsert").into())
    }

    async fn set_quantity(
        &self,
        user_id: UserId,
        product: &Product,
        quantity: i32,
    ) -> Result<(), ShopServiceError> {
        cart::Entity::update_many()
            .col_expr(cart::Column::Quantity, Expr::value(quantity))
            .col_expr(cart::Column::Price, Expr::value(product.price))
            .col_expr(
                cart::Column::TotalAmount,
                Expr::value(line_total(product.price, quantity)),
            )
            .col_expr(cart::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(cart::Column::UserId.eq(user_id.0))
            .filter(cart::Column::ProductId.eq(product.id.0))
            .exec(self.db.as_ref())
            .await
            .context("update cart quantity")?;
        Ok(())
    }

    async fn remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, ShopServiceError> {
        let result = cart::Entity::delete_many()
            .filter(cart::Column::UserId.eq(user_id.0))
            .filter(cart::Column::ProductId.eq(product_id.0))
            .exec(self.db.as_ref())
            .await
            .context("remove cart line")?;
        Ok(result.rows_affected > 0)
    }

    async fn clear(&self, user_id: UserId) -> Result<u64, ShopServiceError> {
        let result = cart::Entity::delete_many()
            .filter(cart::Column::UserId.eq(user_id.0))
            .exec(self.db.as_ref())
            .await
            .context("clear cart")?;
        Ok(result.rows_affected)
    }
}

fn cart_item_from_model(model: cart::Model) -> CartItem {
    CartItem {
        id: model.id,
        user_id: UserId(model.user_id),
        product_id: ProductId(model.product_id),
        product_name: model.product_name,
        price: model.price,
        quantity: model.quantity,
        image_url: model.image_url,
        total_amount: model.total_amount,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}
