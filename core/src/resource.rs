//! Generic resource gateway.
//!
//! # Design
//! Every managed entity speaks the same list/create/update/delete dialect
//! against a REST collection. A `Resource` describes one collection (its
//! paths, payload types and small payload adaptations); `Gateway<R>` turns
//! that description into requests. As with `ApiClient`, each operation is a
//! pure `build_*`/`parse_*` pair plus an async method that runs both.
//!
//! Gateways never retry or recover: every error reaches the caller as is.

use std::fmt::Debug;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::client::{encode, ApiClient, Query};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::EntityId;

/// Description of one REST collection.
pub trait Resource: Send + Sync + 'static {
    /// Record returned by the server.
    type Entity: Clone + Debug + PartialEq + DeserializeOwned + Send + Sync + 'static;
    /// Payload submitted by create and update.
    type Draft: Clone + Debug + Serialize + Send + Sync + 'static;
    /// List narrowing; `Default` means "everything".
    type Filter: Default + Send + Sync;

    /// Human-readable name used in logs and errors.
    const NAME: &'static str;
    /// Collection path, with leading and trailing `/`.
    const COLLECTION_PATH: &'static str;
    const CREATE_PATH: &'static str = Self::COLLECTION_PATH;
    const UPDATE_METHOD: HttpMethod = HttpMethod::Put;

    fn id(entity: &Self::Entity) -> EntityId;

    /// Form draft for editing an existing record.
    fn draft_from(entity: &Self::Entity) -> Self::Draft;

    /// Adapt a draft right before it is sent.
    fn prepare(draft: Self::Draft) -> Self::Draft {
        draft
    }

    fn query(_filter: &Self::Filter) -> Query {
        Query::new()
    }

    fn item_path(id: EntityId) -> String {
        format!("{}{id}/", Self::COLLECTION_PATH)
    }
}

/// List bodies come either bare or wrapped in a paginated envelope.
#[derive(Deserialize)]
#[serde(untagged)]
enum ListBody<E> {
    Plain(Vec<E>),
    Paged { results: Vec<E> },
}

/// REST gateway for one resource type.
pub struct Gateway<R: Resource> {
    client: ApiClient,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> Clone for Gateway<R> {
    fn clone(&self) -> Self {
        Self::new(self.client.clone())
    }
}

impl<R: Resource> Debug for Gateway<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("resource", &R::NAME)
            .field("client", &self.client)
            .finish()
    }
}

impl<R: Resource> Gateway<R> {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            _resource: PhantomData,
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn build_list(&self, filter: &R::Filter) -> HttpRequest {
        self.client
            .build_request(HttpMethod::Get, R::COLLECTION_PATH, &R::query(filter), None)
    }

    pub fn build_create(&self, draft: R::Draft) -> Result<HttpRequest, ApiError> {
        let body = encode(&R::prepare(draft))?;
        Ok(self
            .client
            .build_request(HttpMethod::Post, R::CREATE_PATH, &[], Some(body)))
    }

    pub fn build_update(&self, id: EntityId, draft: R::Draft) -> Result<HttpRequest, ApiError> {
        let body = encode(&R::prepare(draft))?;
        Ok(self
            .client
            .build_request(R::UPDATE_METHOD, &R::item_path(id), &[], Some(body)))
    }

    pub fn build_delete(&self, id: EntityId) -> HttpRequest {
        self.client
            .build_request(HttpMethod::Delete, &R::item_path(id), &[], None)
    }

    pub fn parse_list(&self, response: HttpResponse) -> Result<Vec<R::Entity>, ApiError> {
        match self.client.parse_response::<ListBody<R::Entity>>(response)? {
            ListBody::Plain(items) | ListBody::Paged { results: items } => Ok(items),
        }
    }

    pub fn parse_entity(&self, response: HttpResponse) -> Result<R::Entity, ApiError> {
        self.client.parse_response(response)
    }

    /// A successful delete echoes back the id it was asked to remove.
    pub fn parse_delete(&self, response: HttpResponse, id: EntityId) -> Result<EntityId, ApiError> {
        self.client.parse_empty(response)?;
        Ok(id)
    }

    pub async fn list(&self, filter: &R::Filter) -> Result<Vec<R::Entity>, ApiError> {
        let response = self.client.dispatch(self.build_list(filter)).await?;
        self.parse_list(response)
    }

    pub async fn create(&self, draft: R::Draft) -> Result<R::Entity, ApiError> {
        let request = self.build_create(draft)?;
        let response = self.client.dispatch(request).await?;
        self.parse_entity(response)
    }

    pub async fn update(&self, id: EntityId, draft: R::Draft) -> Result<R::Entity, ApiError> {
        let request = self.build_update(id, draft)?;
        let response = self.client.dispatch(request).await?;
        self.parse_entity(response)
    }

    pub async fn delete(&self, id: EntityId) -> Result<EntityId, ApiError> {
        self.client
            .send_empty(HttpMethod::Delete, &R::item_path(id), &[], None)
            .await?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{Holidays, LeavePolicies, LeaveTypes, WorkShifts};
    use crate::testing::{response, scripted_client};
    use crate::types::{HolidayFilter, LeaveColor, LeaveTypeDraft};

    #[test]
    fn item_paths_keep_trailing_slash() {
        assert_eq!(Holidays::item_path(4), "/public-holidays/4/");
        assert_eq!(LeavePolicies::item_path(12), "/leave-policy/12/");
        assert_eq!(WorkShifts::item_path(1), "/work-time-view/1/");
    }

    #[test]
    fn work_shift_create_uses_policy_path() {
        let (client, _) = scripted_client();
        let gateway = Gateway::<WorkShifts>::new(client);
        let draft = WorkShifts::draft_from(&crate::types::WorkShift {
            id: 1,
            shift_type: "Morning".to_string(),
            start_time: chrono::NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: chrono::NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            status: crate::types::Status::Active,
        });
        let req = gateway.build_create(draft).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "http://hr.test/work-time-policies/");
    }

    #[test]
    fn list_filter_becomes_query() {
        let (client, _) = scripted_client();
        let gateway = Gateway::<Holidays>::new(client);
        assert_eq!(
            gateway.build_list(&HolidayFilter::default()).path,
            "http://hr.test/public-holidays/"
        );
        assert_eq!(
            gateway.build_list(&HolidayFilter::month(2025, 3)).path,
            "http://hr.test/public-holidays/?year=2025&month=3"
        );
    }

    #[test]
    fn parse_list_accepts_paginated_envelope() {
        let (client, _) = scripted_client();
        let gateway = Gateway::<LeaveTypes>::new(client);
        let plain = gateway
            .parse_list(response(200, r#"[{"id":1,"name":"Annual","color":"green"}]"#))
            .unwrap();
        let paged = gateway
            .parse_list(response(
                200,
                r#"{"count":1,"results":[{"id":1,"name":"Annual","color":"green"}]}"#,
            ))
            .unwrap();
        assert_eq!(plain, paged);
        assert_eq!(plain[0].color, LeaveColor::Green);
    }

    #[test]
    fn parse_list_rejects_wrong_shape() {
        let (client, _) = scripted_client();
        let gateway = Gateway::<LeaveTypes>::new(client);
        let err = gateway
            .parse_list(response(200, r#"{"detail":"ok"}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::DeserializationError(_)));
    }

    #[tokio::test]
    async fn delete_returns_requested_id() {
        let (client, transport) = scripted_client();
        transport.push_response(204, "");
        let gateway = Gateway::<LeavePolicies>::new(client);
        assert_eq!(gateway.delete(12).await.unwrap(), 12);
        let req = &transport.requests()[0];
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.path, "http://hr.test/leave-policy/12/");
    }

    #[tokio::test]
    async fn errors_propagate_unchanged() {
        let (client, transport) = scripted_client();
        transport.push_response(400, r#"{"name":["required"]}"#);
        let gateway = Gateway::<LeaveTypes>::new(client);
        let err = gateway
            .create(LeaveTypeDraft {
                name: String::new(),
                color: LeaveColor::Red,
            })
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ApiError::HttpError {
                status: 400,
                body: r#"{"name":["required"]}"#.to_string(),
            }
        );
        assert_eq!(transport.requests().len(), 1);
    }
}
