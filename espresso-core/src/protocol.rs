//! Broker-Protokoll (ThingsBoard Device MQTT API)
//!
//! Topics, Dekodierung eingehender RPC-Aufrufe und Kodierung der
//! ausgehenden Telemetrie/Attribute/Antworten. Keine I/O.

use core::fmt::Write;

use heapless::String;
use serde::Deserialize;

use crate::error::ProtocolError;
use crate::types::{METHOD_NAME_LEN, Reading, RpcRequest, RpcValue, Value};

/// Telemetrie-Topic (Zeitreihen)
pub const TOPIC_TELEMETRY: &str = "v1/devices/me/telemetry";

/// Attribut-Topic (Client-Attribute)
pub const TOPIC_ATTRIBUTES: &str = "v1/devices/me/attributes";

/// Filter für alle Server-seitigen RPC-Aufrufe
pub const TOPIC_RPC_REQUEST_FILTER: &str = "v1/devices/me/rpc/request/+";

/// Präfix eines RPC-Aufrufs, gefolgt von der Request-ID
pub const TOPIC_RPC_REQUEST_PREFIX: &str = "v1/devices/me/rpc/request/";

/// Präfix einer RPC-Antwort, gefolgt von der Request-ID
pub const TOPIC_RPC_RESPONSE_PREFIX: &str = "v1/devices/me/rpc/response/";

/// Maximale Länge eines Topics
pub const TOPIC_CAPACITY: usize = 64;

/// Maximale Länge einer ausgehenden JSON-Payload
pub const PAYLOAD_CAPACITY: usize = 128;

pub type Topic = String<TOPIC_CAPACITY>;
pub type Payload = String<PAYLOAD_CAPACITY>;

#[derive(Deserialize)]
struct MethodField<'a> {
    #[serde(borrow)]
    method: &'a str,
}

#[derive(Deserialize)]
struct BoolParams {
    params: bool,
}

#[derive(Deserialize)]
struct IntParams {
    params: i64,
}

/// Dekodiert einen RPC-Aufruf aus Topic und Payload
///
/// Payload-Format: `{"method": "setValue", "params": true}`. Nicht
/// unterstützte `params` (Objekte, Strings, fehlend) ergeben [`RpcValue::None`].
pub fn parse_rpc_request(topic: &str, payload: &[u8]) -> Result<RpcRequest, ProtocolError> {
    let id = topic
        .strip_prefix(TOPIC_RPC_REQUEST_PREFIX)
        .ok_or(ProtocolError::UnexpectedTopic)?
        .parse::<u32>()
        .map_err(|_| ProtocolError::InvalidRequestId)?;

    let (body, _) = serde_json_core::from_slice::<MethodField>(payload)
        .map_err(|_| ProtocolError::MalformedPayload)?;

    let mut method = String::<METHOD_NAME_LEN>::new();
    method
        .push_str(body.method)
        .map_err(|_| ProtocolError::MethodTooLong)?;

    Ok(RpcRequest {
        id,
        method,
        params: parse_params(payload),
    })
}

fn parse_params(payload: &[u8]) -> RpcValue {
    if let Ok((body, _)) = serde_json_core::from_slice::<BoolParams>(payload) {
        return RpcValue::Bool(body.params);
    }
    if let Ok((body, _)) = serde_json_core::from_slice::<IntParams>(payload) {
        return RpcValue::Int(body.params);
    }
    RpcValue::None
}

/// Antwort-Topic zu einer Request-ID
pub fn response_topic(id: u32) -> Result<Topic, ProtocolError> {
    let mut topic = Topic::new();
    write!(topic, "{}{}", TOPIC_RPC_RESPONSE_PREFIX, id).map_err(|_| ProtocolError::PayloadTooLarge)?;
    Ok(topic)
}

/// Kodiert eine RPC-Antwort als nackten JSON-Wert (`true`, `false`, `42`)
pub fn encode_response(value: RpcValue) -> Result<Payload, ProtocolError> {
    let mut payload = Payload::new();
    let result = match value {
        RpcValue::None => payload.push_str("null").map_err(|_| core::fmt::Error),
        RpcValue::Bool(b) => write!(payload, "{}", b),
        RpcValue::Int(n) => write!(payload, "{}", n),
    };
    result.map_err(|_| ProtocolError::PayloadTooLarge)?;
    Ok(payload)
}

/// Kodiert Messwerte als flaches JSON-Objekt: `{"temperature":21,"led":true}`
///
/// Die Schlüssel sind feste Bezeichner ohne Sonderzeichen und werden daher
/// nicht escaped.
pub fn encode_readings<'a, I>(readings: I) -> Result<Payload, ProtocolError>
where
    I: IntoIterator<Item = &'a Reading>,
{
    let mut payload = Payload::new();
    let mut first = true;

    payload.push('{').map_err(|_| ProtocolError::PayloadTooLarge)?;
    for reading in readings {
        if !first {
            payload.push(',').map_err(|_| ProtocolError::PayloadTooLarge)?;
        }
        first = false;

        let result = match reading.value {
            Value::Bool(b) => write!(payload, "\"{}\":{}", reading.key, b),
            Value::Int(n) => write!(payload, "\"{}\":{}", reading.key, n),
        };
        result.map_err(|_| ProtocolError::PayloadTooLarge)?;
    }
    payload.push('}').map_err(|_| ProtocolError::PayloadTooLarge)?;

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_set_value_bool() {
        let req = parse_rpc_request(
            "v1/devices/me/rpc/request/7",
            br#"{"method":"setValue","params":true}"#,
        )
        .unwrap();
        assert_eq!(req.id, 7);
        assert_eq!(req.method.as_str(), "setValue");
        assert_eq!(req.params, RpcValue::Bool(true));
    }

    #[test]
    fn test_parse_int_params() {
        let req = parse_rpc_request(
            "v1/devices/me/rpc/request/12",
            br#"{"method":"setValue","params":1}"#,
        )
        .unwrap();
        assert_eq!(req.params, RpcValue::Int(1));
    }

    #[test]
    fn test_parse_missing_params() {
        let req =
            parse_rpc_request("v1/devices/me/rpc/request/3", br#"{"method":"getValue"}"#).unwrap();
        assert_eq!(req.method.as_str(), "getValue");
        assert_eq!(req.params, RpcValue::None);
    }

    #[test]
    fn test_parse_rejects_foreign_topic() {
        let err = parse_rpc_request(TOPIC_ATTRIBUTES, br#"{"method":"x"}"#).unwrap_err();
        assert_eq!(err, ProtocolError::UnexpectedTopic);
    }

    #[test]
    fn test_parse_rejects_bad_id() {
        let err = parse_rpc_request("v1/devices/me/rpc/request/abc", br#"{"method":"x"}"#)
            .unwrap_err();
        assert_eq!(err, ProtocolError::InvalidRequestId);
    }

    #[test]
    fn test_parse_rejects_garbage_payload() {
        let err = parse_rpc_request("v1/devices/me/rpc/request/1", b"not json").unwrap_err();
        assert_eq!(err, ProtocolError::MalformedPayload);
    }

    #[test]
    fn test_response_topic() {
        assert_eq!(
            response_topic(42).unwrap().as_str(),
            "v1/devices/me/rpc/response/42"
        );
    }

    #[test]
    fn test_encode_response() {
        assert_eq!(encode_response(RpcValue::Bool(true)).unwrap().as_str(), "true");
        assert_eq!(encode_response(RpcValue::Int(-5)).unwrap().as_str(), "-5");
        assert_eq!(encode_response(RpcValue::None).unwrap().as_str(), "null");
    }

    #[test]
    fn test_encode_readings() {
        let readings = [
            Reading::telemetry("temperature", Value::Int(21)),
            Reading::telemetry("value", Value::Bool(false)),
        ];
        let payload = encode_readings(readings.iter()).unwrap();
        assert_eq!(payload.as_str(), r#"{"temperature":21,"value":false}"#);
    }

    #[test]
    fn test_encode_readings_empty() {
        let readings: [Reading; 0] = [];
        let payload = encode_readings(readings.iter()).unwrap();
        assert_eq!(payload.as_str(), "{}");
    }
}
