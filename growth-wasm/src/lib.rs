//! Bridge WASM <-> JavaScript trung lập framework.

use growth_core::{Gender, GrowthConfig, Metric, VitalsEntry};
use growth_percentile::{build_growth_curves, classify_value, evaluate_vitals};
use serde::Deserialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[derive(Deserialize)]
struct JsGrowthConfig {
    #[serde(default)]
    curve_months: Option<u32>,
}

impl From<JsGrowthConfig> for GrowthConfig {
    fn from(cfg: JsGrowthConfig) -> Self {
        let mut base = GrowthConfig::default();
        if let Some(months) = cfg.curve_months {
            base.curve_months = months;
        }
        base
    }
}

/// Dựng bộ đường cong tham chiếu nền cho một giới tính.
#[wasm_bindgen]
pub fn build_curves(gender: JsValue, config: Option<JsValue>) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let gender: Gender = from_value(gender)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được giới tính: {err}")))?;

    let cfg = match config {
        Some(js_cfg) => {
            let cfg: JsGrowthConfig = from_value(js_cfg)
                .map_err(|err| JsValue::from_str(&format!("Không đọc được config: {err}")))?;
            GrowthConfig::from(cfg)
        }
        None => GrowthConfig::default(),
    };

    let curves = build_growth_curves(gender, &cfg);

    to_value(&curves)
        .map_err(|err| JsValue::from_str(&format!("Không serialize được đường cong: {err}")))
}

/// Phân loại một số đo vào nhãn bách phân vị tại đúng độ tuổi.
///
/// Trả về 3/15/50/85/97 hoặc `null` khi không tính được.
#[wasm_bindgen]
pub fn classify(
    value: f64,
    age_in_days: u32,
    metric: JsValue,
    gender: JsValue,
) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let metric: Metric = from_value(metric)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được chỉ số: {err}")))?;
    let gender: Gender = from_value(gender)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được giới tính: {err}")))?;

    let percentile = classify_value(value, age_in_days, metric, gender);

    to_value(&percentile)
        .map_err(|err| JsValue::from_str(&format!("Không serialize được kết quả: {err}")))
}

/// Chuyển một lần nhập sinh hiệu thành bản ghi đo đã phân loại.
#[wasm_bindgen]
pub fn evaluate_entry(entry: JsValue) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let entry: VitalsEntry = from_value(entry)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được sinh hiệu: {err}")))?;

    let record = evaluate_vitals(&entry);

    to_value(&record)
        .map_err(|err| JsValue::from_str(&format!("Không serialize được bản ghi: {err}")))
}
