//! Two-phase AJAX protocol for resolving a streaming mirror
//!
//! Resolving a mirror takes two form POSTs to `admin-ajax.php`, both sent
//! with the episode page as referer:
//!
//! 1. the nonce request, carrying only the nonce action token;
//! 2. the mirror request, carrying the decoded key, the nonce from step 1
//!    and the video action token.
//!
//! [`MirrorResolution`] enforces that order at the type level: a mirror
//! form can only be built from a resolution that has accepted a nonce.

use serde_json::Value;

use crate::models::{MirrorPayload, NoiceRequest, VideoRequest};
use crate::parser::ExtractError;

/// Form body of one AJAX request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AjaxForm {
    Nonce {
        action: String,
    },
    Mirror {
        id: u64,
        i: u32,
        q: String,
        nonce: String,
        action: String,
    },
}

impl AjaxForm {
    pub fn nonce(request: &NoiceRequest) -> Self {
        AjaxForm::Nonce {
            action: request.action.clone(),
        }
    }

    pub fn mirror(request: &VideoRequest, nonce: impl Into<String>) -> Self {
        AjaxForm::Mirror {
            id: request.id,
            i: request.i,
            q: request.q.clone(),
            nonce: nonce.into(),
            action: request.action.clone(),
        }
    }

    /// Field name/value pairs in wire order
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            AjaxForm::Nonce { action } => vec![("action", action.clone())],
            AjaxForm::Mirror {
                id,
                i,
                q,
                nonce,
                action,
            } => vec![
                ("id", id.to_string()),
                ("i", i.to_string()),
                ("q", q.clone()),
                ("nonce", nonce.clone()),
                ("action", action.clone()),
            ],
        }
    }

    /// `application/x-www-form-urlencoded` body
    pub fn encode(&self) -> String {
        self.pairs()
            .iter()
            .map(|(name, value)| format!("{}={}", name, urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// The `data` field of an AJAX JSON response
///
/// A response without it is reported as [`ExtractError::UnexpectedResponse`].
pub fn response_data(body: &str) -> Result<Value, ExtractError> {
    let mut json: Value = serde_json::from_str(body)
        .map_err(|e| ExtractError::UnexpectedResponse(format!("invalid JSON: {}", e)))?;

    match json.get_mut("data") {
        Some(data) => Ok(data.take()),
        None => Err(ExtractError::UnexpectedResponse(
            "response has no data field".to_string(),
        )),
    }
}

/// Resolution waiting for its nonce
#[derive(Debug, Clone)]
pub struct AwaitingNonce {
    referer: String,
    payload: MirrorPayload,
}

/// Resolution holding a nonce, ready for the mirror request
#[derive(Debug, Clone)]
pub struct AwaitingMirror {
    referer: String,
    payload: MirrorPayload,
    nonce: String,
}

/// Start point of a mirror resolution
pub struct MirrorResolution;

impl MirrorResolution {
    /// Begin resolving `payload` on behalf of the episode at `referer`
    pub fn start(referer: impl Into<String>, payload: MirrorPayload) -> AwaitingNonce {
        AwaitingNonce {
            referer: referer.into(),
            payload,
        }
    }
}

impl AwaitingNonce {
    pub fn referer(&self) -> &str {
        &self.referer
    }

    pub fn nonce_form(&self) -> AjaxForm {
        AjaxForm::nonce(&self.payload.noice)
    }

    /// Take the nonce from the `data` of the nonce response
    ///
    /// The nonce is passed on verbatim; anything other than a non-empty
    /// string is rejected.
    pub fn accept_nonce(self, data: Value) -> Result<AwaitingMirror, ExtractError> {
        let nonce = match data {
            Value::String(nonce) if !nonce.is_empty() => nonce,
            Value::String(_) => {
                return Err(ExtractError::UnexpectedResponse("nonce is empty".to_string()))
            }
            other => {
                return Err(ExtractError::UnexpectedResponse(format!(
                    "nonce is not a string: {}",
                    other
                )))
            }
        };

        Ok(AwaitingMirror {
            referer: self.referer,
            payload: self.payload,
            nonce,
        })
    }
}

impl AwaitingMirror {
    pub fn referer(&self) -> &str {
        &self.referer
    }

    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    pub fn mirror_form(&self) -> AjaxForm {
        AjaxForm::mirror(&self.payload.video, self.nonce.clone())
    }
}
