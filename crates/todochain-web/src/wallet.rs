//! Bindings for the provider object wallets inject as `window.ethereum`.

use std::future::Future;
use std::time::Duration;

use gloo::timers::future::TimeoutFuture;
use js_sys::{Array, Function, Reflect};
use serde::Serialize;
use serde_json::{Value, json};
use todochain_core::detector::InjectedWallet;
use todochain_core::provider::{ACCOUNTS_CHANGED, CHAIN_CHANGED};
use todochain_core::{Eip1193, ProviderError, Timer, WalletEvent};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(extends = js_sys::Object)]
    #[derive(Debug, Clone, PartialEq)]
    pub type EthereumProvider;

    #[wasm_bindgen(method, catch, js_name = request)]
    async fn request_raw(this: &EthereumProvider, args: &JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, getter, js_name = isMetaMask)]
    fn is_meta_mask(this: &EthereumProvider) -> Option<bool>;

    #[wasm_bindgen(method, getter, js_name = providers)]
    fn provider_list(this: &EthereumProvider) -> Option<Array>;

    #[wasm_bindgen(method, catch)]
    fn on(this: &EthereumProvider, event: &str, listener: &Function) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = removeListener)]
    fn remove_listener(
        this: &EthereumProvider,
        event: &str,
        listener: &Function,
    ) -> Result<(), JsValue>;
}

/// Whatever is currently injected as `window.ethereum`.
pub fn injected() -> Option<EthereumProvider> {
    let window = web_sys::window()?;
    let value = Reflect::get(&window, &JsValue::from_str("ethereum")).ok()?;
    if value.is_undefined() || value.is_null() {
        return None;
    }
    Some(value.unchecked_into())
}

impl InjectedWallet for EthereumProvider {
    fn is_expected_wallet(&self) -> bool {
        self.is_meta_mask().unwrap_or(false)
    }

    fn providers(&self) -> Vec<Self> {
        self.provider_list()
            .map(|list| {
                list.iter()
                    .filter(JsValue::is_object)
                    .map(|value| value.unchecked_into::<EthereumProvider>())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Eip1193 for EthereumProvider {
    fn request(
        &self,
        method: &str,
        params: Value,
    ) -> impl Future<Output = Result<Value, ProviderError>> {
        send(self.clone(), method.to_string(), params)
    }
}

async fn send(
    provider: EthereumProvider,
    method: String,
    params: Value,
) -> Result<Value, ProviderError> {
    let args = json!({ "method": method, "params": params })
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| ProviderError::malformed(&method, e))?;

    let result = provider
        .request_raw(&args)
        .await
        .map_err(|err| provider_error(&method, &err))?;

    if result.is_undefined() {
        return Ok(Value::Null);
    }
    serde_wasm_bindgen::from_value(result).map_err(|e| ProviderError::malformed(&method, e))
}

/// Wallets reject with `{ code, message, data }`; anything else counts as an
/// internal error.
fn provider_error(method: &str, err: &JsValue) -> ProviderError {
    let field = |name: &str| {
        Reflect::get(err, &JsValue::from_str(name))
            .ok()
            .filter(|v| !v.is_undefined() && !v.is_null())
    };

    let code = field("code")
        .and_then(|c| c.as_f64())
        .map(|c| c as i64)
        .unwrap_or(ProviderError::INTERNAL);
    let message = field("message")
        .and_then(|m| m.as_string())
        .or_else(|| err.as_string())
        .unwrap_or_else(|| format!("{method} failed"));
    let data = field("data").and_then(|d| serde_wasm_bindgen::from_value(d).ok());

    tracing::debug!(method, code, %message, "wallet request rejected");
    ProviderError {
        code,
        message,
        data,
    }
}

/// `accountsChanged`/`chainChanged` subscriptions, removed again on drop.
pub struct WalletListeners {
    provider: EthereumProvider,
    accounts: Closure<dyn FnMut(JsValue)>,
    chain: Closure<dyn FnMut(JsValue)>,
}

impl WalletListeners {
    pub fn attach<F>(provider: &EthereumProvider, on_event: F) -> Self
    where
        F: Fn(WalletEvent) + Clone + 'static,
    {
        let accounts = listener(ACCOUNTS_CHANGED, on_event.clone());
        let chain = listener(CHAIN_CHANGED, on_event);

        for (event, listener) in [(ACCOUNTS_CHANGED, &accounts), (CHAIN_CHANGED, &chain)] {
            if let Err(err) = provider.on(event, listener.as_ref().unchecked_ref()) {
                tracing::error!(event, error = ?err, "failed to subscribe to wallet event");
            }
        }

        Self {
            provider: provider.clone(),
            accounts,
            chain,
        }
    }
}

/// Malformed payloads are dropped; an unparseable `accountsChanged` must not
/// look like a revocation.
fn listener<F>(event: &'static str, on_event: F) -> Closure<dyn FnMut(JsValue)>
where
    F: Fn(WalletEvent) + 'static,
{
    Closure::<dyn FnMut(JsValue)>::new(move |value: JsValue| {
        let parsed = serde_wasm_bindgen::from_value::<Value>(value)
            .map_err(|e| ProviderError::malformed(event, e))
            .and_then(|payload| WalletEvent::from_payload(event, payload));
        match parsed {
            Ok(wallet_event) => on_event(wallet_event),
            Err(err) => tracing::warn!(event, error = %err, "ignoring wallet event"),
        }
    })
}

impl Drop for WalletListeners {
    fn drop(&mut self) {
        for (event, listener) in [
            (ACCOUNTS_CHANGED, &self.accounts),
            (CHAIN_CHANGED, &self.chain),
        ] {
            if let Err(err) = self
                .provider
                .remove_listener(event, listener.as_ref().unchecked_ref())
            {
                tracing::error!(event, error = ?err, "failed to remove wallet listener");
            }
        }
    }
}

/// `setTimeout`-backed sleep.
pub struct GlooTimer;

impl Timer for GlooTimer {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> {
        TimeoutFuture::new(u32::try_from(duration.as_millis()).unwrap_or(u32::MAX))
    }
}
