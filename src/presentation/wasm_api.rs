use leptos::*;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::application::ChartConfig;
use crate::domain::errors::ChartError;
use crate::domain::logging::LogComponent;
use crate::log_info;
use crate::presentation::app::App;

/// Mount the sentiment chart into the element with `element_id`.
///
/// `config_json` is an optional JSON object with any subset of the chart
/// config fields; unparseable input falls back to the defaults.
#[wasm_bindgen(js_name = mountSentimentChart)]
pub fn mount_sentiment_chart(element_id: &str, config_json: Option<String>) -> Result<(), JsValue> {
    let config = ChartConfig::from_json(config_json.as_deref());
    let parent = gloo::utils::document()
        .get_element_by_id(element_id)
        .ok_or_else(|| ChartError::Host(format!("element #{} not found", element_id)))
        .and_then(|element| {
            element
                .dyn_into::<web_sys::HtmlElement>()
                .map_err(|_| ChartError::Host(format!("#{} is not an HTML element", element_id)))
        })
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    log_info!(LogComponent::Presentation("wasm_api"), "mounting chart for {} into #{}", config.ticker, element_id);
    mount_to(parent, move || view! { <App config=config /> });
    Ok(())
}
