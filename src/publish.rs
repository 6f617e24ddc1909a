//! Uploads the generated lookup document to S3.

use anyhow::{Context, Result};
use aws_sdk_s3::primitives::ByteStream;
use chrono::Utc;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::Write;
use tracing::info;

pub const DEFAULT_KEY: &str = "dict_indicadores.json";

/// Payload ready for `PutObject`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub body: Vec<u8>,
    pub content_encoding: Option<&'static str>,
}

/// Prepares `json` for upload, gzip-compressing it when `gzip` is set.
pub fn prepare(json: &[u8], gzip: bool) -> Result<Upload> {
    if !gzip {
        return Ok(Upload {
            body: json.to_vec(),
            content_encoding: None,
        });
    }

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(json)?;
    Ok(Upload {
        body: encoder.finish()?,
        content_encoding: Some("gzip"),
    })
}

/// Uploads the JSON document with `application/json` content type.
#[tracing::instrument(skip(client, json), fields(bytes = json.len()))]
pub async fn write_json_to_s3(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    json: &[u8],
    gzip: bool,
) -> Result<()> {
    let upload = prepare(json, gzip)?;
    let size = upload.body.len();

    let mut req = client
        .put_object()
        .bucket(bucket)
        .key(key)
        .content_type("application/json")
        .metadata("generated-at", Utc::now().to_rfc3339())
        .body(ByteStream::from(upload.body));
    if let Some(encoding) = upload.content_encoding {
        req = req.content_encoding(encoding);
    }

    req.send()
        .await
        .with_context(|| format!("uploading s3://{bucket}/{key}"))?;

    info!(bucket, key, size, "Lookup uploaded to S3");
    Ok(())
}
