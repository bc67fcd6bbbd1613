//! Minimal TR-064 support: the single `GetDeviceLog` action.

use super::FetchError;
use crate::domain::LogSnapshot;
use quick_xml::escape::unescape;
use regex::Regex;
use std::sync::OnceLock;

/// Default TR-064 port on the LAN side.
pub const DEFAULT_PORT: u16 = 49000;
pub const CONTROL_PATH: &str = "/upnp/control/deviceinfo";
pub const SERVICE_TYPE: &str = "urn:dslforum-org:service:DeviceInfo:1";
pub const ACTION: &str = "GetDeviceLog";

static DEVICE_LOG_PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
static FAULT_PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
static CDATA_PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();

fn compiled(
    cell: &'static OnceLock<Result<Regex, regex::Error>>,
    pattern: &str,
) -> Result<&'static Regex, FetchError> {
    cell.get_or_init(|| Regex::new(pattern))
        .as_ref()
        .map_err(|e| FetchError::MalformedResponse(format!("pattern compilation failed: {e}")))
}

/// Value of the `SOAPACTION` header, quotes included.
pub fn soap_action() -> String {
    format!("\"{SERVICE_TYPE}#{ACTION}\"")
}

pub fn request_envelope() -> String {
    format!(
        concat!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>",
            "<s:Envelope xmlns:s=\"http://schemas.xmlsoap.org/soap/envelope/\" ",
            "s:encodingStyle=\"http://schemas.xmlsoap.org/soap/encoding/\">",
            "<s:Body><u:{action} xmlns:u=\"{service}\"></u:{action}></s:Body>",
            "</s:Envelope>"
        ),
        action = ACTION,
        service = SERVICE_TYPE,
    )
}

/// Extracts `NewDeviceLog` from a `GetDeviceLogResponse` body.
pub fn parse_device_log(body: &str) -> Result<LogSnapshot, FetchError> {
    let fault = compiled(
        &FAULT_PATTERN,
        r"(?s)<(?:\w+:)?Fault>.*?<errorDescription>(.*?)</errorDescription>",
    )?;
    if let Some(captures) = fault.captures(body) {
        let description = captures.get(1).map_or("unknown fault", |m| m.as_str());
        return Err(FetchError::MalformedResponse(format!(
            "SOAP fault: {description}"
        )));
    }

    let pattern = compiled(
        &DEVICE_LOG_PATTERN,
        r"(?s)<NewDeviceLog(?:\s*/>|>(.*?)</NewDeviceLog>)",
    )?;
    let captures = pattern.captures(body).ok_or_else(|| {
        FetchError::MalformedResponse("response has no NewDeviceLog element".to_string())
    })?;

    let raw = captures.get(1).map_or("", |m| m.as_str());
    Ok(LogSnapshot::from_text(&decode_text(raw)?))
}

/// Element text with entity and character references resolved and CDATA
/// sections taken verbatim.
fn decode_text(raw: &str) -> Result<String, FetchError> {
    let cdata = compiled(&CDATA_PATTERN, r"(?s)<!\[CDATA\[(.*?)\]\]>")?;

    let mut text = String::with_capacity(raw.len());
    let mut rest = 0;
    for captures in cdata.captures_iter(raw) {
        let (Some(section), Some(content)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        text.push_str(&unescape_text(&raw[rest..section.start()])?);
        text.push_str(content.as_str());
        rest = section.end();
    }
    text.push_str(&unescape_text(&raw[rest..])?);

    Ok(text)
}

fn unescape_text(text: &str) -> Result<String, FetchError> {
    unescape(text)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| FetchError::MalformedResponse(format!("invalid NewDeviceLog text: {e}")))
}
