use std::marker::PhantomData;

use akr_shared::protocol::Endpoint;
use akr_shared::{AppResult, Record, RecordId, Resource, sort_newest_first};

use super::{Repository, label_not_found};
use crate::api::AkrApi;
use crate::web::{FetchClient, HttpClient};

/// REST 实现：`/api/{collection}/` 与 `/api/{collection}/{id}/`
pub struct RestRepository<R, C = FetchClient> {
    api: AkrApi<C>,
    _marker: PhantomData<fn() -> R>,
}

impl<R: Resource, C: HttpClient> RestRepository<R, C> {
    pub fn new(api: AkrApi<C>) -> Self {
        Self {
            api,
            _marker: PhantomData,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl<R: Resource, C: HttpClient> Repository<R> for RestRepository<R, C> {
    async fn list(&self) -> AppResult<Vec<Record<R>>> {
        let mut records: Vec<Record<R>> = self.api.fetch(&Endpoint::list::<R>(), None).await?;
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn get(&self, id: &RecordId) -> AppResult<Record<R>> {
        self.api
            .fetch(&Endpoint::get::<R>(id), None)
            .await
            .map_err(|e| label_not_found::<R>(e, id))
    }

    async fn create(&self, draft: &R) -> AppResult<Record<R>> {
        let body = serde_json::to_string(draft)?;
        let record: Record<R> = self.api.fetch(&Endpoint::create::<R>(), Some(body)).await?;
        log::info!("[Repository] Created {} {}", R::LABEL, record.id);
        Ok(record)
    }

    async fn update(&self, id: &RecordId, patch: &R::Patch) -> AppResult<Record<R>> {
        let body = serde_json::to_string(patch)?;
        self.api
            .fetch(&Endpoint::update::<R>(id), Some(body))
            .await
            .map_err(|e| label_not_found::<R>(e, id))
    }

    async fn delete(&self, id: &RecordId) -> AppResult<()> {
        self.api
            .send(&Endpoint::delete::<R>(id), None)
            .await
            .map_err(|e| label_not_found::<R>(e, id))?;
        log::info!("[Repository] Deleted {} {}", R::LABEL, id);
        Ok(())
    }
}
