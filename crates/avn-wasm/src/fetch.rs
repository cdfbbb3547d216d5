//! Browser-side [`MediaResolver`] backed by `window.fetch`.

use avn_core::media::{GatewayTable, MediaError, MediaResolver};
use avn_core::model::SourceRef;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{RequestInit, Response};

pub struct FetchResolver {
    gateways: GatewayTable,
}

impl FetchResolver {
    pub fn new(gateways: GatewayTable) -> Self {
        Self { gateways }
    }
}

impl MediaResolver for FetchResolver {
    fn resolve_url(&self, source: &SourceRef) -> Result<String, MediaError> {
        self.gateways.resolve(source)
    }

    async fn probe(&self, url: &str) -> Result<(), MediaError> {
        fetch(url, "HEAD").await.map(|_| ())
    }

    async fn fetch_text(&self, url: &str) -> Result<String, MediaError> {
        let response = fetch(url, "GET").await?;
        let body = response.text().map_err(|e| unreachable(url, &e))?;
        let text = JsFuture::from(body).await.map_err(|e| unreachable(url, &e))?;
        text.as_string().ok_or_else(|| MediaError::Unreachable {
            url: url.to_string(),
            reason: "body is not text".into(),
        })
    }
}

async fn fetch(url: &str, method: &str) -> Result<Response, MediaError> {
    let window = web_sys::window().ok_or_else(|| MediaError::Unreachable {
        url: url.to_string(),
        reason: "no window".into(),
    })?;
    let init = RequestInit::new();
    init.set_method(method);
    let value = JsFuture::from(window.fetch_with_str_and_init(url, &init))
        .await
        .map_err(|e| unreachable(url, &e))?;
    let response: Response = value.dyn_into().map_err(|e| unreachable(url, &e))?;
    if !response.ok() {
        return Err(MediaError::Status {
            url: url.to_string(),
            status: response.status(),
        });
    }
    Ok(response)
}

fn unreachable(url: &str, err: &JsValue) -> MediaError {
    MediaError::Unreachable {
        url: url.to_string(),
        reason: format!("{err:?}"),
    }
}
