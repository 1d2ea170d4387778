// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the fab authors

//! Framed JSON codec (spec.md §4.4, expanded per SPEC_FULL.md to a 4-byte
//! big-endian length prefix + JSON payload — the same convention the
//! teacher documents for its own daemon protocol).

use crate::error::{ProtoError, MAX_MESSAGE_LEN};
use crate::request::Request;
use crate::response::Response;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, ProtoError> {
    Ok(serde_json::to_vec(value)?)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtoError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Read one length-prefixed message. Returns `Ok(None)` on a clean EOF
/// before any bytes of the next message arrive.
pub async fn read_message<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Option<Vec<u8>>, ProtoError> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(err) => return Err(err.into()),
    }
    let len = u32::from_be_bytes(len_buf);
    if len > MAX_MESSAGE_LEN {
        return Err(ProtoError::MessageTooLarge { len });
    }
    let mut body = vec![0u8; len as usize];
    reader.read_exact(&mut body).await?;
    Ok(Some(body))
}

pub async fn write_message<W: AsyncWrite + Unpin>(writer: &mut W, body: &[u8]) -> Result<(), ProtoError> {
    let len = u32::try_from(body.len()).map_err(|_| ProtoError::MessageTooLarge { len: u32::MAX })?;
    if len > MAX_MESSAGE_LEN {
        return Err(ProtoError::MessageTooLarge { len });
    }
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(body).await?;
    writer.flush().await?;
    Ok(())
}

pub async fn read_request<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Request, ProtoError> {
    let body = read_message(reader).await?.ok_or(ProtoError::ConnectionClosed)?;
    decode(&body)
}

pub async fn write_response<W: AsyncWrite + Unpin>(writer: &mut W, response: &Response) -> Result<(), ProtoError> {
    let body = encode(response)?;
    write_message(writer, &body).await
}

pub async fn write_request<W: AsyncWrite + Unpin>(writer: &mut W, request: &Request) -> Result<(), ProtoError> {
    let body = encode(request)?;
    write_message(writer, &body).await
}

pub async fn read_response<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Response, ProtoError> {
    let body = read_message(reader).await?.ok_or(ProtoError::ConnectionClosed)?;
    decode(&body)
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
