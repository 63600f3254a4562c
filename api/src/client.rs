use bytes::Bytes;
use reqwest::{Response, Url};
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::{Level, event, instrument};

use crate::NetworkError;

const MAX_ERROR_BODY: usize = 512;

#[derive(Clone)]
pub struct Client {
    client: reqwest::Client,
}

impl Client {
    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Client {
            client: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }

    #[instrument(level = "trace", skip(self), fields(url = %url))]
    pub async fn get<T>(&self, url: Url) -> Result<T, NetworkError>
    where
        T: DeserializeOwned,
    {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| transport(&url, source))?;
        let text = ensure_success(&url, response)
            .await?
            .text()
            .await
            .map_err(|source| transport(&url, source))?;
        event!(Level::TRACE, response = text);

        decode(&url, &text)
    }

    #[instrument(level = "trace", skip(self, request), fields(url = %url, json_request = %serde_json::to_string(request).unwrap_or_default()))]
    pub async fn post<S, T>(&self, url: Url, request: &S) -> Result<T, NetworkError>
    where
        S: Serialize + Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(url.clone())
            .json(request)
            .send()
            .await
            .map_err(|source| transport(&url, source))?;
        let text = ensure_success(&url, response)
            .await?
            .text()
            .await
            .map_err(|source| transport(&url, source))?;
        event!(Level::TRACE, response = text);

        decode(&url, &text)
    }

    #[instrument(level = "trace", skip(self), fields(url = %url))]
    pub async fn get_bytes(&self, url: Url) -> Result<Bytes, NetworkError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| transport(&url, source))?;
        let bytes = ensure_success(&url, response)
            .await?
            .bytes()
            .await
            .map_err(|source| transport(&url, source))?;
        event!(Level::TRACE, size = bytes.len());

        Ok(bytes)
    }

    #[instrument(level = "trace", skip(self), fields(url = %url))]
    pub async fn head(&self, url: Url) -> Result<(), NetworkError> {
        let response = self
            .client
            .head(url.clone())
            .send()
            .await
            .map_err(|source| transport(&url, source))?;
        ensure_success(&url, response).await?;
        Ok(())
    }
}

fn transport(url: &Url, source: reqwest::Error) -> NetworkError {
    NetworkError::Transport {
        url: url.to_string(),
        source,
    }
}

fn decode<T: DeserializeOwned>(url: &Url, text: &str) -> Result<T, NetworkError> {
    serde_json::from_str::<T>(text).map_err(|source| NetworkError::Decode {
        url: url.to_string(),
        source,
    })
}

async fn ensure_success(url: &Url, response: Response) -> Result<Response, NetworkError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let cut = (0..=MAX_ERROR_BODY)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        body.truncate(cut);
    }
    event!(Level::DEBUG, status = status.as_u16(), body = body, "request failed");

    Err(NetworkError::Status {
        url: url.to_string(),
        status: status.as_u16(),
        body,
    })
}
