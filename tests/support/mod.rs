#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, Bytes},
    http::{Method, Request, StatusCode, header},
    response::Response,
};
use http_body_util::BodyExt;
use serde_json::Value;
use time::{Duration, OffsetDateTime, macros::datetime};
use tokio::sync::Mutex;
use tower::ServiceExt;
use uuid::Uuid;

use florista::application::admin::AdminCatalogService;
use florista::application::auth::AuthService;
use florista::application::catalog::CatalogService;
use florista::application::quote::QuoteService;
use florista::application::repos::{
    BouquetFilter, BouquetParams, CatalogRepo, CatalogWriteRepo, CategoryParams,
    CreateSessionParams, FlowerParams, ProfilesRepo, RepoError, SessionsRepo, TagParams,
};
use florista::cache::{CacheClient, CacheConfig, CacheTrigger, KvStore, MemoryKvStore};
use florista::domain::entities::{
    BouquetFlowerRecord, BouquetMediaRecord, BouquetRecord, CategoryRecord, FlowerRecord,
    ProfileRecord, SessionRecord, TagRecord,
};
use florista::domain::types::UserRole;
use florista::infra::http::{ApiState, build_router};

#[derive(Default)]
struct CatalogData {
    clock: i64,
    categories: Vec<CategoryRecord>,
    flowers: Vec<FlowerRecord>,
    tags: Vec<TagRecord>,
    bouquets: Vec<BouquetRecord>,
    bouquet_flowers: Vec<(Uuid, Uuid, i32)>,
    media: Vec<BouquetMediaRecord>,
    bouquet_tags: Vec<(Uuid, Uuid)>,
    profiles: Vec<ProfileRecord>,
    sessions: Vec<SessionRecord>,
}

impl CatalogData {
    /// Strictly increasing timestamps so "newest first" is deterministic.
    fn tick(&mut self) -> OffsetDateTime {
        self.clock += 1;
        datetime!(2024-05-01 09:00:00.250 UTC) + Duration::seconds(self.clock)
    }

    fn flower_lines(&mut self, bouquet_id: Uuid, params: &BouquetParams) {
        if let Some(flowers) = params.flowers.as_ref() {
            self.bouquet_flowers.retain(|(owner, _, _)| *owner != bouquet_id);
            for line in flowers {
                self.bouquet_flowers
                    .push((bouquet_id, line.flower_id, line.quantity));
            }
        }
        if let Some(media) = params.media.as_ref() {
            self.media.retain(|item| item.bouquet_id != bouquet_id);
            for (position, item) in media.iter().enumerate() {
                self.media.push(BouquetMediaRecord {
                    id: Uuid::new_v4(),
                    bouquet_id,
                    url: item.url.clone(),
                    kind: item.kind,
                    is_thumbnail: item.is_thumbnail,
                    position: position as i32,
                });
            }
        }
    }
}

/// In-memory catalog counting every backing-store read.
#[derive(Default)]
pub struct InMemoryCatalog {
    data: Mutex<CatalogData>,
    reads: AtomicUsize,
    fail_reads: AtomicBool,
}

impl InMemoryCatalog {
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn reset_reads(&self) {
        self.reads.store(0, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub async fn add_profile(&self, role: UserRole) -> Uuid {
        let id = Uuid::new_v4();
        self.data.lock().await.profiles.push(ProfileRecord {
            id,
            email: format!("{id}@florista.test"),
            role,
        });
        id
    }

    pub async fn expire_sessions(&self) {
        let mut data = self.data.lock().await;
        for session in &mut data.sessions {
            session.expires_at = OffsetDateTime::now_utc() - Duration::minutes(1);
        }
    }

    fn read(&self) -> Result<(), RepoError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(RepoError::Persistence("connection reset".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogRepo for InMemoryCatalog {
    async fn list_bouquets(&self, filter: &BouquetFilter) -> Result<Vec<BouquetRecord>, RepoError> {
        self.read()?;
        let data = self.data.lock().await;
        let mut bouquets: Vec<BouquetRecord> = data
            .bouquets
            .iter()
            .filter(|b| !filter.featured || b.featured)
            .filter(|b| filter.category_id.is_none() || b.category_id == filter.category_id)
            .cloned()
            .collect();
        bouquets.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        if let Some(limit) = filter.limit {
            bouquets.truncate(limit as usize);
        }
        Ok(bouquets)
    }

    async fn find_bouquet(&self, id: Uuid) -> Result<Option<BouquetRecord>, RepoError> {
        self.read()?;
        let data = self.data.lock().await;
        Ok(data.bouquets.iter().find(|b| b.id == id).cloned())
    }

    async fn list_bouquet_flowers(
        &self,
        bouquet_ids: &[Uuid],
    ) -> Result<Vec<BouquetFlowerRecord>, RepoError> {
        self.read()?;
        let data = self.data.lock().await;
        Ok(data
            .bouquet_flowers
            .iter()
            .filter(|(bouquet_id, _, _)| bouquet_ids.contains(bouquet_id))
            .filter_map(|(bouquet_id, flower_id, quantity)| {
                let flower = data.flowers.iter().find(|f| f.id == *flower_id)?;
                Some(BouquetFlowerRecord {
                    bouquet_id: *bouquet_id,
                    flower_id: *flower_id,
                    name: flower.name.clone(),
                    color: flower.color.clone(),
                    quantity: *quantity,
                })
            })
            .collect())
    }

    async fn list_bouquet_media(
        &self,
        bouquet_ids: &[Uuid],
    ) -> Result<Vec<BouquetMediaRecord>, RepoError> {
        self.read()?;
        let data = self.data.lock().await;
        let mut media: Vec<BouquetMediaRecord> = data
            .media
            .iter()
            .filter(|item| bouquet_ids.contains(&item.bouquet_id))
            .cloned()
            .collect();
        media.sort_by_key(|item| (item.bouquet_id, item.position));
        Ok(media)
    }

    async fn list_bouquet_tags(&self, bouquet_id: Uuid) -> Result<Vec<TagRecord>, RepoError> {
        self.read()?;
        let data = self.data.lock().await;
        let mut tags: Vec<TagRecord> = data
            .bouquet_tags
            .iter()
            .filter(|(owner, _)| *owner == bouquet_id)
            .filter_map(|(_, tag_id)| data.tags.iter().find(|t| t.id == *tag_id).cloned())
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RepoError> {
        self.read()?;
        Ok(self.data.lock().await.categories.clone())
    }

    async fn find_category(&self, id: Uuid) -> Result<Option<CategoryRecord>, RepoError> {
        self.read()?;
        let data = self.data.lock().await;
        Ok(data.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn list_flowers(&self) -> Result<Vec<FlowerRecord>, RepoError> {
        self.read()?;
        Ok(self.data.lock().await.flowers.clone())
    }

    async fn find_flower(&self, id: Uuid) -> Result<Option<FlowerRecord>, RepoError> {
        self.read()?;
        let data = self.data.lock().await;
        Ok(data.flowers.iter().find(|f| f.id == id).cloned())
    }

    async fn list_tags(&self) -> Result<Vec<TagRecord>, RepoError> {
        self.read()?;
        Ok(self.data.lock().await.tags.clone())
    }
}

#[async_trait]
impl CatalogWriteRepo for InMemoryCatalog {
    async fn create_bouquet(&self, params: BouquetParams) -> Result<BouquetRecord, RepoError> {
        let mut data = self.data.lock().await;
        let now = data.tick();
        let record = BouquetRecord {
            id: Uuid::new_v4(),
            name: params.name.clone(),
            description: params.description.clone(),
            price_cents: params.price_cents,
            category_id: params.category_id,
            featured: params.featured,
            in_stock: params.in_stock,
            created_at: now,
            updated_at: now,
        };
        data.bouquets.push(record.clone());
        data.flower_lines(record.id, &params);
        Ok(record)
    }

    async fn update_bouquet(
        &self,
        id: Uuid,
        params: BouquetParams,
    ) -> Result<BouquetRecord, RepoError> {
        let mut data = self.data.lock().await;
        let now = data.tick();
        let bouquet = data
            .bouquets
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(RepoError::NotFound)?;
        bouquet.name = params.name.clone();
        bouquet.description = params.description.clone();
        bouquet.price_cents = params.price_cents;
        bouquet.category_id = params.category_id;
        bouquet.featured = params.featured;
        bouquet.in_stock = params.in_stock;
        bouquet.updated_at = now;
        let record = bouquet.clone();
        data.flower_lines(id, &params);
        Ok(record)
    }

    async fn delete_bouquet(&self, id: Uuid) -> Result<(), RepoError> {
        let mut data = self.data.lock().await;
        let before = data.bouquets.len();
        data.bouquets.retain(|b| b.id != id);
        if data.bouquets.len() == before {
            return Err(RepoError::NotFound);
        }
        data.bouquet_flowers.retain(|(owner, _, _)| *owner != id);
        data.media.retain(|item| item.bouquet_id != id);
        data.bouquet_tags.retain(|(owner, _)| *owner != id);
        Ok(())
    }

    async fn replace_bouquet_tags(&self, id: Uuid, tag_ids: &[Uuid]) -> Result<(), RepoError> {
        let mut data = self.data.lock().await;
        if !data.bouquets.iter().any(|b| b.id == id) {
            return Err(RepoError::NotFound);
        }
        if let Some(missing) = tag_ids.iter().find(|t| !data.tags.iter().any(|tag| tag.id == **t)) {
            return Err(RepoError::InvalidInput {
                message: format!("tag {missing} does not exist"),
            });
        }
        data.bouquet_tags.retain(|(owner, _)| *owner != id);
        for tag_id in tag_ids {
            data.bouquet_tags.push((id, *tag_id));
        }
        Ok(())
    }

    async fn create_category(&self, params: CategoryParams) -> Result<CategoryRecord, RepoError> {
        let mut data = self.data.lock().await;
        let now = data.tick();
        let record = CategoryRecord {
            id: Uuid::new_v4(),
            name: params.name,
            description: params.description,
            created_at: now,
            updated_at: now,
        };
        data.categories.push(record.clone());
        Ok(record)
    }

    async fn update_category(
        &self,
        id: Uuid,
        params: CategoryParams,
    ) -> Result<CategoryRecord, RepoError> {
        let mut data = self.data.lock().await;
        let now = data.tick();
        let category = data
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(RepoError::NotFound)?;
        category.name = params.name;
        category.description = params.description;
        category.updated_at = now;
        Ok(category.clone())
    }

    async fn delete_category(&self, id: Uuid) -> Result<(), RepoError> {
        let mut data = self.data.lock().await;
        let before = data.categories.len();
        data.categories.retain(|c| c.id != id);
        if data.categories.len() == before {
            return Err(RepoError::NotFound);
        }
        for bouquet in &mut data.bouquets {
            if bouquet.category_id == Some(id) {
                bouquet.category_id = None;
            }
        }
        Ok(())
    }

    async fn create_flower(&self, params: FlowerParams) -> Result<FlowerRecord, RepoError> {
        let mut data = self.data.lock().await;
        let now = data.tick();
        let record = FlowerRecord {
            id: Uuid::new_v4(),
            name: params.name,
            description: params.description,
            color: params.color,
            price_cents: params.price_cents,
            in_stock: params.in_stock,
            created_at: now,
            updated_at: now,
        };
        data.flowers.push(record.clone());
        Ok(record)
    }

    async fn update_flower(
        &self,
        id: Uuid,
        params: FlowerParams,
    ) -> Result<FlowerRecord, RepoError> {
        let mut data = self.data.lock().await;
        let now = data.tick();
        let flower = data
            .flowers
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or(RepoError::NotFound)?;
        flower.name = params.name;
        flower.description = params.description;
        flower.color = params.color;
        flower.price_cents = params.price_cents;
        flower.in_stock = params.in_stock;
        flower.updated_at = now;
        Ok(flower.clone())
    }

    async fn delete_flower(&self, id: Uuid) -> Result<(), RepoError> {
        let mut data = self.data.lock().await;
        let before = data.flowers.len();
        data.flowers.retain(|f| f.id != id);
        if data.flowers.len() == before {
            return Err(RepoError::NotFound);
        }
        data.bouquet_flowers.retain(|(_, flower_id, _)| *flower_id != id);
        Ok(())
    }

    async fn create_tag(&self, params: TagParams) -> Result<TagRecord, RepoError> {
        let mut data = self.data.lock().await;
        if data
            .tags
            .iter()
            .any(|tag| tag.name.eq_ignore_ascii_case(&params.name))
        {
            return Err(RepoError::Duplicate {
                constraint: "tags_name_key".to_string(),
            });
        }
        let now = data.tick();
        let record = TagRecord {
            id: Uuid::new_v4(),
            name: params.name,
            created_at: now,
        };
        data.tags.push(record.clone());
        Ok(record)
    }

    async fn update_tag(&self, id: Uuid, params: TagParams) -> Result<TagRecord, RepoError> {
        let mut data = self.data.lock().await;
        let tag = data
            .tags
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(RepoError::NotFound)?;
        tag.name = params.name;
        Ok(tag.clone())
    }

    async fn delete_tag(&self, id: Uuid) -> Result<(), RepoError> {
        let mut data = self.data.lock().await;
        let before = data.tags.len();
        data.tags.retain(|t| t.id != id);
        if data.tags.len() == before {
            return Err(RepoError::NotFound);
        }
        data.bouquet_tags.retain(|(_, tag_id)| *tag_id != id);
        Ok(())
    }
}

#[async_trait]
impl SessionsRepo for InMemoryCatalog {
    async fn create_session(
        &self,
        params: CreateSessionParams,
    ) -> Result<SessionRecord, RepoError> {
        let record = SessionRecord {
            id: Uuid::new_v4(),
            prefix: params.prefix,
            user_id: params.user_id,
            token_hash: params.token_hash,
            expires_at: params.expires_at,
            created_at: OffsetDateTime::now_utc(),
        };
        self.data.lock().await.sessions.push(record.clone());
        Ok(record)
    }

    async fn find_session_by_prefix(
        &self,
        prefix: &str,
    ) -> Result<Option<SessionRecord>, RepoError> {
        let data = self.data.lock().await;
        Ok(data.sessions.iter().find(|s| s.prefix == prefix).cloned())
    }
}

#[async_trait]
impl ProfilesRepo for InMemoryCatalog {
    async fn find_profile(&self, id: Uuid) -> Result<Option<ProfileRecord>, RepoError> {
        let data = self.data.lock().await;
        Ok(data.profiles.iter().find(|p| p.id == id).cloned())
    }
}

/// Router wired to in-memory storage and a caller-chosen key-value backend.
pub struct TestApp {
    pub router: Router,
    pub catalog: Arc<InMemoryCatalog>,
    pub store: Arc<dyn KvStore>,
    pub auth: AuthService,
}

impl TestApp {
    pub fn new() -> (Self, Arc<MemoryKvStore>) {
        let memory = Arc::new(MemoryKvStore::new());
        let app = Self::with_store(memory.clone(), CacheConfig::default());
        (app, memory)
    }

    pub fn with_store(store: Arc<dyn KvStore>, config: CacheConfig) -> Self {
        let catalog = Arc::new(InMemoryCatalog::default());
        let cache = Arc::new(CacheClient::new(store.clone(), config));

        let catalog_service = CatalogService::new(catalog.clone(), cache.clone());
        let trigger = CacheTrigger::new(cache);
        let auth = AuthService::new(catalog.clone(), catalog.clone(), Duration::hours(1));

        let state = ApiState {
            quote: QuoteService::new(catalog_service.clone()),
            catalog: catalog_service,
            admin: AdminCatalogService::new(catalog.clone(), trigger.clone()),
            auth: auth.clone(),
            cache: trigger,
            db: None,
        };

        Self {
            router: build_router(state),
            catalog,
            store,
            auth,
        }
    }

    pub async fn admin_token(&self) -> String {
        self.token_for(UserRole::Admin).await
    }

    pub async fn token_for(&self, role: UserRole) -> String {
        let user_id = self.catalog.add_profile(role).await;
        self.auth
            .issue_session(user_id)
            .await
            .expect("session issued")
            .token
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Bytes) {
        self.send(Method::GET, uri, None, None).await
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Bytes) {
        let response = self.respond(method, uri, token, body).await;
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body collects")
            .to_bytes();
        (status, bytes)
    }

    /// Full response, extensions included.
    pub async fn respond(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request builds");

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    pub async fn cached_keys(&self) -> Vec<String> {
        self.store.keys("*").await.expect("memory store lists keys")
    }
}

pub fn json(bytes: &Bytes) -> Value {
    serde_json::from_slice(bytes).expect("valid json body")
}

/// Rows written straight to the fake, bypassing the admin surface.
pub struct Seeded {
    pub category: CategoryRecord,
    pub rose: FlowerRecord,
    pub bouquet: BouquetRecord,
    pub featured: BouquetRecord,
}

pub async fn seed(catalog: &InMemoryCatalog) -> Seeded {
    use florista::application::repos::{BouquetFlowerParams, BouquetMediaParams};
    use florista::domain::types::MediaKind;

    let category = catalog
        .create_category(CategoryParams {
            name: "Weddings".to_string(),
            description: None,
        })
        .await
        .expect("category");
    let rose = catalog
        .create_flower(FlowerParams {
            name: "Rose".to_string(),
            description: None,
            color: Some("red".to_string()),
            price_cents: 350,
            in_stock: true,
        })
        .await
        .expect("flower");
    let bouquet = catalog
        .create_bouquet(BouquetParams {
            name: "Classic Dozen".to_string(),
            description: Some("Twelve red roses".to_string()),
            price_cents: 4_900,
            category_id: Some(category.id),
            featured: false,
            in_stock: true,
            flowers: Some(vec![BouquetFlowerParams {
                flower_id: rose.id,
                quantity: 12,
            }]),
            media: Some(vec![
                BouquetMediaParams {
                    url: "https://cdn.florista.test/dozen.mp4".to_string(),
                    kind: MediaKind::Video,
                    is_thumbnail: false,
                },
                BouquetMediaParams {
                    url: "https://cdn.florista.test/dozen.jpg".to_string(),
                    kind: MediaKind::Image,
                    is_thumbnail: true,
                },
            ]),
        })
        .await
        .expect("bouquet");
    let featured = catalog
        .create_bouquet(BouquetParams {
            name: "Sunrise".to_string(),
            description: None,
            price_cents: 3_200,
            category_id: None,
            featured: true,
            in_stock: true,
            flowers: None,
            media: None,
        })
        .await
        .expect("featured bouquet");
    catalog.reset_reads();

    Seeded {
        category,
        rose,
        bouquet,
        featured,
    }
}
