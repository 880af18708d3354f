use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use echosavvy_domain::id::{ProductId, UserId};
use echosavvy_shop::domain::repository::{CartRepository, ProductRepository, UserRepository};
use echosavvy_shop::domain::types::{
    CartItem, MAX_QUANTITY, NewUser, Product, User, line_total,
};
use echosavvy_shop::domain::webauthn::RelyingParty;
use echosavvy_shop::error::ShopServiceError;
use echosavvy_testing::authenticator::{TEST_ORIGIN, TEST_RP_ID};

pub fn test_relying_party() -> Arc<RelyingParty> {
    Arc::new(RelyingParty::new(TEST_RP_ID, &[TEST_ORIGIN]).unwrap())
}

pub fn test_product(id: i32, name: &str, rupees: i64) -> Product {
    Product {
        id: ProductId(id),
        name: name.to_owned(),
        category: "Accessories".to_owned(),
        price: Decimal::new(rupees * 100, 2),
        description: format!("{name} for testing"),
        image_url: format!("/image/{id}.png"),
    }
}

/// A slice of the seeded catalog.
pub fn test_catalog() -> Vec<Product> {
    vec![
        test_product(22, "Smartphone", 12000),
        test_product(36, "Keyboard", 4500),
        test_product(38, "Smart Bulb", 250),
    ]
}

// ── MockUserRepo ─────────────────────────────────────────────────────────────

pub struct MockUserRepo {
    pub users: Arc<Mutex<Vec<User>>>,
    pub tokens: Arc<Mutex<Vec<(UserId, String)>>>,
}

impl MockUserRepo {
    pub fn new(users: Vec<User>) -> Self {
        Self {
            users: Arc::new(Mutex::new(users)),
            tokens: Arc::new(Mutex::new(vec![])),
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }

    /// A second repo over the same state, for chaining use cases.
    pub fn share(&self) -> Self {
        Self {
            users: Arc::clone(&self.users),
            tokens: Arc::clone(&self.tokens),
        }
    }

    /// Returns a shared handle to the user list for post-execution inspection.
    pub fn users_handle(&self) -> Arc<Mutex<Vec<User>>> {
        Arc::clone(&self.users)
    }

    pub fn tokens_handle(&self) -> Arc<Mutex<Vec<(UserId, String)>>> {
        Arc::clone(&self.tokens)
    }
}

impl UserRepository for MockUserRepo {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, ShopServiceError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create(&self, user: &NewUser) -> Result<UserId, ShopServiceError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.username == user.username) {
            return Err(ShopServiceError::UsernameTaken);
        }
        let id = UserId(users.len() as i32 + 1);
        users.push(User {
            id,
            username: user.username.clone(),
            phone: user.phone.clone(),
            credential_id: user.credential_id.clone(),
            public_key: user.public_key.clone(),
            challenge: None,
            challenge_expires_at: None,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn set_challenge(
        &self,
        id: UserId,
        challenge: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), ShopServiceError> {
        let mut users = self.users.lock().unwrap();
        if let Some(u) = users.iter_mut().find(|u| u.id == id) {
            u.challenge = Some(challenge.to_owned());
            u.challenge_expires_at = Some(expires_at);
        }
        Ok(())
    }

    async fn consume_challenge(
        &self,
        id: UserId,
        challenge: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, ShopServiceError> {
        let mut users = self.users.lock().unwrap();
        let Some(u) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(false);
        };
        if u.live_challenge(now) != Some(challenge) {
            return Ok(false);
        }
        u.challenge = None;
        u.challenge_expires_at = None;
        Ok(true)
    }

    async fn set_token(&self, id: UserId, token: &str) -> Result<(), ShopServiceError> {
        self.tokens.lock().unwrap().push((id, token.to_owned()));
        Ok(())
    }
}

// ── MockProductRepo ──────────────────────────────────────────────────────────

pub struct MockProductRepo {
    pub products: Vec<Product>,
}

impl MockProductRepo {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }
}

impl ProductRepository for MockProductRepo {
    async fn list(&self) -> Result<Vec<Product>, ShopServiceError> {
        let mut products = self.products.clone();
        products.sort_by_key(|p| p.id);
        Ok(products)
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, ShopServiceError> {
        Ok(self.products.iter().find(|p| p.id == id).cloned())
    }

    async fn find_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, ShopServiceError> {
        Ok(self
            .products
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }
}

// ── MockCartRepo ─────────────────────────────────────────────────────────────

pub struct MockCartRepo {
    pub items: Arc<Mutex<Vec<CartItem>>>,
}

impl MockCartRepo {
    pub fn new(items: Vec<CartItem>) -> Self {
        Self {
            items: Arc::new(Mutex::new(items)),
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }

    /// Returns a shared handle to the cart lines for post-execution inspection.
    pub fn items_handle(&self) -> Arc<Mutex<Vec<CartItem>>> {
        Arc::clone(&self.items)
    }
}

pub fn test_cart_item(id: i32, user_id: UserId, product: &Product, quantity: i32) -> CartItem {
    let now = Utc::now();
    CartItem {
        id,
        user_id,
        product_id: product.id,
        product_name: product.name.clone(),
        price: product.price,
        quantity,
        image_url: product.image_url.clone(),
        total_amount: line_total(product.price, quantity),
        created_at: now,
        updated_at: now,
    }
}

impl CartRepository for MockCartRepo {
    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<CartItem>, ShopServiceError> {
        Ok(self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<CartItem>, ShopServiceError> {
        Ok(self
            .items
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.user_id == user_id && i.product_id == product_id)
            .cloned())
    }

    async fn add(
        &self,
        user_id: UserId,
        product: &Product,
        quantity: i32,
    ) -> Result<CartItem, ShopServiceError> {
        let mut items = self.items.lock().unwrap();
        if let Some(item) = items
            .iter_mut()
            .find(|i| i.user_id == user_id && i.product_id == product.id)
        {
            item.quantity = (item.quantity + quantity).min(MAX_QUANTITY as i32);
            item.price = product.price;
            item.total_amount = line_total(product.price, item.quantity);
            item.updated_at = Utc::now();
            return Ok(item.clone());
        }
        let id = items.iter().map(|i| i.id).max().unwrap_or(0) + 1;
        let item = test_cart_item(id, user_id, product, quantity);
        items.push(item.clone());
        Ok(item)
    }

    async fn set_quantity(
        &self,
        user_id: UserId,
        product: &Product,
        quantity: i32,
    ) -> Result<(), ShopServiceError> {
        let mut items = self.items.lock().unwrap();
        if let Some(item) = items
            .iter_mut()
            .find(|i| i.user_id == user_id && i.product_id == product.id)
        {
            item.quantity = quantity;
            item.price = product.price;
            item.total_amount = line_total(product.price, quantity);
        }
        Ok(())
    }

    async fn remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, ShopServiceError> {
        let mut items = self.items.lock().unwrap();
        let before = items.len();
        items.retain(|i| !(i.user_id == user_id && i.product_id == product_id));
        Ok(items.len() < before)
    }

    async fn clear(&self, user_id: UserId) -> Result<u64, ShopServiceError> {
        let mut items = self.items.lock().unwrap();
        let before = items.len();
        items.retain(|i| i.user_id != user_id);
        Ok((before - items.len()) as u64)
    }
}
