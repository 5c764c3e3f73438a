//! Helpers shared by the DynamoDB repositories: client spans, error mapping
//! and attribute-map accessors.

use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Error as DynamoDbError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::error;

use crate::models::{RepositoryError, RepositoryResult};

pub type Item = HashMap<String, AttributeValue>;

/// Create a DynamoDB client span with X-Ray attributes
pub fn dynamodb_span(operation: &str, table_name: &str, region: &str) -> tracing::Span {
    tracing::info_span!(
        "DynamoDB",
        "aws.service" = "DynamoDB",
        "aws.operation" = operation,
        "aws.region" = %region,
        "aws.dynamodb.table_name" = %table_name,
        "aws.request_id" = tracing::field::Empty,
        "aws.remote.service" = "AWS::DynamoDB",
        "aws.remote.operation" = operation,
        "aws.remote.resource.type" = "AWS::DynamoDB::Table",
        "aws.remote.resource.identifier" = %table_name,
        "otel.kind" = "client",
        "otel.name" = format!("DynamoDB.{}", operation),
        "rpc.system" = "aws-api",
        "rpc.service" = "AmazonDynamoDBv2",
        "rpc.method" = operation,
        "http.status_code" = tracing::field::Empty,
        "db.system" = "dynamodb",
        "db.name" = %table_name,
        "db.operation" = operation,
    )
}

/// Convert a DynamoDB error to RepositoryError
pub fn map_dynamodb_error(table_name: &str, error: DynamoDbError) -> RepositoryError {
    error!(table = %table_name, "DynamoDB error: {:?}", error);

    match &error {
        DynamoDbError::ResourceNotFoundException(_) => RepositoryError::TableNotFound {
            table_name: table_name.to_string(),
        },
        DynamoDbError::ConditionalCheckFailedException(_) => RepositoryError::NotFound,
        DynamoDbError::ProvisionedThroughputExceededException(_)
        | DynamoDbError::RequestLimitExceeded(_) => RepositoryError::RateLimitExceeded,
        _ => RepositoryError::AwsSdk {
            message: error.to_string(),
        },
    }
}

fn invalid(field: &str) -> RepositoryError {
    RepositoryError::InvalidQuery {
        message: format!("Missing or invalid {}", field),
    }
}

pub fn put_opt_s(item: &mut Item, field: &str, value: &Option<String>) {
    if let Some(value) = value {
        item.insert(field.to_string(), AttributeValue::S(value.clone()));
    }
}

pub fn get_s(item: &Item, field: &str) -> RepositoryResult<String> {
    item.get(field)
        .and_then(|v| v.as_s().ok())
        .cloned()
        .ok_or_else(|| invalid(field))
}

pub fn get_opt_s(item: &Item, field: &str) -> Option<String> {
    item.get(field).and_then(|v| v.as_s().ok()).cloned()
}

pub fn get_parsed<T: FromStr>(item: &Item, field: &str) -> RepositoryResult<T> {
    item.get(field)
        .and_then(|v| v.as_s().ok())
        .and_then(|s| T::from_str(s).ok())
        .ok_or_else(|| invalid(field))
}

pub fn get_bool(item: &Item, field: &str, default: bool) -> bool {
    item.get(field)
        .and_then(|v| v.as_bool().ok())
        .copied()
        .unwrap_or(default)
}

pub fn get_opt_i32(item: &Item, field: &str) -> Option<i32> {
    item.get(field)
        .and_then(|v| v.as_n().ok())
        .and_then(|s| s.parse().ok())
}

pub fn get_decimal(item: &Item, field: &str) -> RepositoryResult<Decimal> {
    item.get(field)
        .and_then(|v| v.as_n().ok())
        .and_then(|s| Decimal::from_str(s).ok())
        .ok_or_else(|| invalid(field))
}

pub fn get_datetime(item: &Item, field: &str) -> Option<DateTime<Utc>> {
    item.get(field)
        .and_then(|v| v.as_s().ok())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_accessors() {
        let mut item = Item::new();
        item.insert("name".to_string(), AttributeValue::S("Thali".to_string()));
        item.insert("order".to_string(), AttributeValue::N("3".to_string()));
        item.insert("amount".to_string(), AttributeValue::N("120.50".to_string()));
        item.insert("visible".to_string(), AttributeValue::Bool(false));
        put_opt_s(&mut item, "missing", &None);

        assert_eq!(get_s(&item, "name").unwrap(), "Thali");
        assert!(get_s(&item, "missing").is_err());
        assert_eq!(get_opt_i32(&item, "order"), Some(3));
        assert_eq!(get_decimal(&item, "amount").unwrap().to_string(), "120.50");
        assert!(!get_bool(&item, "visible", true));
        assert!(get_bool(&item, "absent", true));
        assert_eq!(get_datetime(&item, "name"), None);
    }
}
