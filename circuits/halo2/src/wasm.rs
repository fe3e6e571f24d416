//! WASM bindings for the identity attestation circuits
//!
//! Lets a browser build public inputs locally, so the secret key never
//! leaves the client. Proof generation itself stays on the API server.
//!
//! ## Usage in JavaScript
//! ```javascript
//! import init, { compute_public_inputs, get_circuit_info } from 'zk-identity-circuits';
//!
//! await init();
//! const inputs = JSON.parse(compute_public_inputs("full-personhood", JSON.stringify({
//!   age: 25, country_risk: 1, unique_id_salt: "0x...", secret_key: "0x..."
//! })));
//! console.log(get_circuit_info());
//! ```

use serde::Deserialize;
use wasm_bindgen::prelude::*;

use crate::signals::{fp_from_hex, fp_to_hex};
use crate::{CircuitVariant, WitnessBuilder};

/// Initialize WASM module with panic hook for better error messages
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

#[derive(Deserialize)]
struct RawAttributes {
    age: Option<u64>,
    country_risk: Option<u64>,
    biometric_hash: Option<String>,
    device_hash: Option<String>,
    unique_id_salt: String,
    secret_key: String,
}

fn to_js<E: std::fmt::Display>(e: E) -> JsError {
    JsError::new(&e.to_string())
}

/// Compute `{ nullifier_hash, commitment_hash, valid }` for a variant
///
/// # Arguments
/// * `variant` - Variant id, e.g. `"full-personhood"`
/// * `attributes` - JSON object with the raw attributes (hex field elements)
#[wasm_bindgen]
pub fn compute_public_inputs(variant: &str, attributes: &str) -> Result<String, JsError> {
    let variant: CircuitVariant = variant.parse().map_err(to_js)?;
    let raw: RawAttributes = serde_json::from_str(attributes).map_err(to_js)?;

    let mut builder = WitnessBuilder::new()
        .unique_id_salt(fp_from_hex(&raw.unique_id_salt, "unique_id_salt").map_err(to_js)?)
        .secret_key(fp_from_hex(&raw.secret_key, "secret_key").map_err(to_js)?);

    if let Some(age) = raw.age {
        builder = builder.age(age);
    }
    if let Some(risk) = raw.country_risk {
        builder = builder.country_risk(risk);
    }
    if let Some(hash) = raw.biometric_hash {
        builder = builder.biometric_hash(fp_from_hex(&hash, "biometric_hash").map_err(to_js)?);
    }
    if let Some(hash) = raw.device_hash {
        builder = builder.device_hash(fp_from_hex(&hash, "device_hash").map_err(to_js)?);
    }

    let request = builder.build(variant).map_err(to_js)?;
    let inputs = request.public_inputs();

    let out = serde_json::json!({
        "variant": variant,
        "nullifier_hash": fp_to_hex(&inputs.nullifier_hash),
        "commitment_hash": fp_to_hex(&inputs.commitment_hash),
        "valid": request.expected_signals().is_valid(),
    });
    Ok(out.to_string())
}

/// Get circuit parameters (for debugging/info)
#[wasm_bindgen]
pub fn get_circuit_info() -> JsValue {
    use serde_json::json;

    let circuits: serde_json::Map<String, serde_json::Value> = CircuitVariant::ALL
        .iter()
        .map(|v| {
            (
                v.as_str().to_string(),
                json!({
                    "assurance": v.assurance(),
                    "checks": v.checks(),
                    "private_inputs": v.private_inputs(),
                    "public_signals": ["valid", "unique_nullifier"],
                    "public_inputs": ["nullifier_hash", "commitment_hash"],
                }),
            )
        })
        .collect();

    let info = json!({
        "name": "ZK Identity Attestation Circuits",
        "version": env!("CARGO_PKG_VERSION"),
        "circuits": circuits,
        "curve": "Pasta (Pallas/Vesta)",
        "proof_system": "Halo2 (PSE fork)"
    });

    JsValue::from_str(&info.to_string())
}
