//! Upload notification parsing
//!
//! Uploads reach the pipelines through a fan-out topic, so every invocation
//! receives an [`SnsEvent`] whose `Message` is itself a JSON-encoded
//! [`S3Event`]:
//!
//! ```text
//! { "Records": [ { "Sns": { "Message": "<storage-event json>", ... } } ] }
//! storage-event = { "Records": [ { "s3": { "bucket": {"name"}, "object": {"key"} } } ] }
//! ```
//!
//! Only the first record of each level is considered; one invocation handles
//! exactly one object.

use aws_lambda_events::event::s3::S3Event;
use aws_lambda_events::event::sns::SnsEvent;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::models::UploadNotification;

/// Envelope parsing errors. All of them are terminal for the invocation.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("Envelope does not match the expected notification shape: {0}")]
    InvalidEnvelope(#[source] serde_json::Error),

    #[error("Envelope contains no records")]
    NoRecords,

    #[error("Notification message is not a valid storage event: {0}")]
    InvalidMessage(#[source] serde_json::Error),

    #[error("Storage event contains no records")]
    NoStorageRecords,

    #[error("Storage event is missing {0}")]
    MissingField(&'static str),

    #[error("Object key is not valid percent-encoded UTF-8: {0}")]
    InvalidKey(String),

    #[error("Object key has no file name: {0}")]
    NoFileName(String),
}

/// Decode the envelope into the bucket/key of the uploaded object.
pub fn parse_notification(event: &Value) -> Result<UploadNotification, EventError> {
    let envelope = SnsEvent::deserialize(event).map_err(EventError::InvalidEnvelope)?;
    let record = envelope
        .records
        .into_iter()
        .next()
        .ok_or(EventError::NoRecords)?;

    let message: Value =
        serde_json::from_str(&record.sns.message).map_err(EventError::InvalidMessage)?;

    // Bucket test notifications (`s3:TestEvent`) carry no records at all
    let has_records = message
        .get("Records")
        .and_then(Value::as_array)
        .is_some_and(|records| !records.is_empty());
    if !has_records {
        return Err(EventError::NoStorageRecords);
    }

    let storage_event = S3Event::deserialize(&message).map_err(EventError::InvalidMessage)?;
    let entity = storage_event
        .records
        .into_iter()
        .next()
        .ok_or(EventError::NoStorageRecords)?
        .s3;

    let bucket = entity
        .bucket
        .name
        .filter(|name| !name.is_empty())
        .ok_or(EventError::MissingField("bucket name"))?;
    let raw_key = entity
        .object
        .key
        .filter(|key| !key.is_empty())
        .ok_or(EventError::MissingField("object key"))?;

    Ok(UploadNotification {
        bucket,
        key: decode_object_key(&raw_key)?,
    })
}

/// Storage events form-encode keys: spaces arrive as `+`, everything else
/// reserved as `%XX`.
pub fn decode_object_key(raw: &str) -> Result<String, EventError> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|key| key.into_owned())
        .map_err(|_| EventError::InvalidKey(raw.to_string()))
}

/// Build the envelope a topic delivers for an upload of `key` into `bucket`.
///
/// Key segments are percent-encoded the way storage events encode them.
pub fn build_notification(bucket: &str, key: &str) -> Value {
    let encoded_key = key
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");

    topic_envelope(&storage_event(bucket, &encoded_key).to_string())
}

/// Single-record storage event for `raw_key`, which is used verbatim.
pub fn storage_event(bucket: &str, raw_key: &str) -> Value {
    json!({
        "Records": [{
            "eventVersion": "2.1",
            "eventSource": "aws:s3",
            "awsRegion": "us-east-1",
            "eventTime": "2024-05-01T12:00:00.000Z",
            "eventName": "ObjectCreated:Put",
            "userIdentity": { "principalId": "AWS:AIDAEXAMPLE" },
            "requestParameters": { "sourceIPAddress": "203.0.113.10" },
            "responseElements": {
                "x-amz-request-id": "C3D13FE58DE4C810",
                "x-amz-id-2": "FMyUVURIY8/IgAtTv8xRjskZQpcIZ9KG4V5Wp6S7S/JRWeUWerMUE5JgHvANOjpD"
            },
            "s3": {
                "s3SchemaVersion": "1.0",
                "configurationId": "upload-fanout",
                "bucket": {
                    "name": bucket,
                    "ownerIdentity": { "principalId": "A3NL1KOZZKExample" },
                    "arn": format!("arn:aws:s3:::{}", bucket)
                },
                "object": {
                    "key": raw_key,
                    "size": 1024,
                    "eTag": "d41d8cd98f00b204e9800998ecf8427e",
                    "sequencer": "0055AED6DCD90281E5"
                }
            }
        }]
    })
}

/// Topic delivery wrapping an arbitrary `message` string.
pub fn topic_envelope(message: &str) -> Value {
    json!({
        "Records": [{
            "EventSource": "aws:sns",
            "EventVersion": "1.0",
            "EventSubscriptionArn": "arn:aws:sns:us-east-1:123456789012:uploads:2bcfbf39-05c3-41de-beaa-fcfcc21c8f55",
            "Sns": {
                "Type": "Notification",
                "MessageId": "95df01b4-ee98-5cb9-9903-4c221d41eb5e",
                "TopicArn": "arn:aws:sns:us-east-1:123456789012:uploads",
                "Subject": "Amazon S3 Notification",
                "Message": message,
                "Timestamp": "2024-05-01T12:00:00.100Z",
                "SignatureVersion": "1",
                "Signature": "EXAMPLE",
                "SigningCertUrl": "https://sns.us-east-1.amazonaws.com/SimpleNotificationService.pem",
                "UnsubscribeUrl": "https://sns.us-east-1.amazonaws.com/?Action=Unsubscribe",
                "MessageAttributes": {}
            }
        }]
    })
}
