//! PostgREST table access

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use super::{SupabaseClient, check};
use crate::model::RecordId;
use crate::storage::RemoteTable;
use crate::{Error, Result};

fn table_path(table: &str) -> String {
    format!("rest/v1/{table}")
}

fn id_filter(id: &RecordId) -> String {
    format!("eq.{id}")
}

#[async_trait]
impl RemoteTable for SupabaseClient {
    async fn select_all(&self, table: &str, order_by: &str) -> Result<Vec<Value>> {
        let order = format!("{order_by}.desc");
        let response = self
            .public_request(Method::GET, &table_path(table))
            .query(&[("select", "*"), ("order", order.as_str())])
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn select_first(&self, table: &str) -> Result<Option<Value>> {
        let response = self
            .public_request(Method::GET, &table_path(table))
            .query(&[("select", "*"), ("limit", "1")])
            .send()
            .await?;
        let rows: Vec<Value> = check(response).await?.json().await?;
        Ok(rows.into_iter().next())
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value> {
        let response = self
            .request(Method::POST, &table_path(table))
            .header("Prefer", "return=representation")
            .json(&[row])
            .send()
            .await?;
        let rows: Vec<Value> = check(response).await?.json().await?;
        rows.into_iter().next().ok_or_else(|| Error::Remote {
            status: 406,
            message: format!("insert into {table} returned no row"),
        })
    }

    async fn update(&self, table: &str, id: &RecordId, row: Value) -> Result<Value> {
        let filter = id_filter(id);
        let response = self
            .request(Method::PATCH, &table_path(table))
            .query(&[("id", filter.as_str())])
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await?;
        let rows: Vec<Value> = check(response).await?.json().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(format!("{table} row {id}")))
    }

    async fn delete(&self, table: &str, id: &RecordId) -> Result<()> {
        let filter = id_filter(id);
        let response = self
            .request(Method::DELETE, &table_path(table))
            .query(&[("id", filter.as_str())])
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}
