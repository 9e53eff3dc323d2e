//! Inbound download requests and their validation.

use super::{DownloadUrl, UserId};
use crate::error::{Error, Result};

use serde::{Deserialize, Serialize};

/// A download request as delivered by the messaging layer.
///
/// Values are raw and unchecked; [`DownloadRequest::validate`] turns the
/// request into a [`DownloadCommand`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest {
    pub url: String,
    pub user_id: i64,
    pub chat_id: i64,
    pub message_id: i32,
}

/// A validated [`DownloadRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadCommand {
    pub url: DownloadUrl,
    pub user: UserId,
    pub chat_id: i64,
    pub message_id: i32,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>, user_id: i64, chat_id: i64, message_id: i32) -> Self {
        Self {
            url: url.into(),
            user_id,
            chat_id,
            message_id,
        }
    }

    /// Checks every field; the first failing rule determines the error.
    pub fn validate(&self) -> Result<DownloadCommand> {
        if self.url.trim().is_empty() {
            return Err(Error::Validation("file URL is missing".into()));
        }
        let url = DownloadUrl::parse(&self.url)?;

        let user =
            UserId::new(self.user_id).map_err(|_| Error::Validation("user id is missing".into()))?;

        if self.chat_id == 0 {
            return Err(Error::Validation("chat id is missing".into()));
        }

        if self.message_id <= 0 {
            return Err(Error::Validation("message id is missing".into()));
        }

        Ok(DownloadCommand {
            url,
            user,
            chat_id: self.chat_id,
            message_id: self.message_id,
        })
    }
}
