//! Remote image dimensions / 远程图片尺寸探测
//!
//! Reads only as much of the body as the format header needs.

use anyhow::{anyhow, Result};
use bytes::Bytes;
use futures::StreamExt;
use image::{ImageError, ImageReader};
use std::io::Cursor;

use crate::storage::ImageSize;

/// Upper bound on bytes read before giving up / 最多读取字节数
pub const MAX_PROBE_BYTES: usize = 256 * 1024;

/// Bytes the format sniffer looks at / 格式识别需要的字节数
const SNIFF_BYTES: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    Size(ImageSize),
    NeedMore,
    Unsupported,
}

/// Try to read dimensions from a (possibly truncated) prefix / 从前缀读取尺寸
pub fn parse_image_size(data: &[u8]) -> Probe {
    let reader = match ImageReader::new(Cursor::new(data)).with_guessed_format() {
        Ok(reader) => reader,
        Err(_) => return Probe::NeedMore,
    };
    if reader.format().is_none() {
        return if data.len() < SNIFF_BYTES {
            Probe::NeedMore
        } else {
            Probe::Unsupported
        };
    }

    match reader.into_dimensions() {
        Ok((width, height)) => Probe::Size(ImageSize { width, height }),
        Err(ImageError::Unsupported(_)) => Probe::Unsupported,
        // 截断的头部表现为 EOF 或解码错误，继续读
        Err(_) => Probe::NeedMore,
    }
}

/// Fetch just enough of `url` to read the image header / 探测远程图片尺寸
pub async fn probe_image_size(http: &reqwest::Client, url: &str) -> Result<Option<ImageSize>> {
    let response = http.get(url).send().await?;
    if !response.status().is_success() {
        return Err(anyhow!("Image probe failed: HTTP {}", response.status()));
    }

    let mut stream = response.bytes_stream();
    let mut buffer: Vec<u8> = Vec::with_capacity(8 * 1024);
    while let Some(chunk) = stream.next().await {
        let chunk: Bytes = chunk?;
        buffer.extend_from_slice(&chunk);
        match parse_image_size(&buffer) {
            Probe::Size(dimensions) => return Ok(Some(dimensions)),
            Probe::Unsupported => return Ok(None),
            Probe::NeedMore if buffer.len() >= MAX_PROBE_BYTES => {
                tracing::debug!("Image probe gave up after {} bytes: {}", buffer.len(), url);
                return Ok(None);
            }
            Probe::NeedMore => {}
        }
    }

    Ok(None)
}
