use std::time::Duration;

use reqwest::Method;
use serde_json::Value;
use tracing::{debug, info, trace, warn};

use crate::codec::{
    decode_humidity, decode_temperature, encode_temperature, format_mac, swing_axis_enabled,
    POWER_OFF, POWER_ON, SWING_AXIS_OFF, SWING_AXIS_ON,
};
use crate::codes;
use crate::diff::diff_state;
use crate::logger::{MessageLogMode, MessageLogger};
use crate::protocol::*;
use crate::tree::{build_write_request, find_str, find_value};
use crate::types::*;
use crate::{Error, Result};

/// Poll period hosts are expected to use between refreshes.
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(60);

/// Reported when a settable mode omits its setpoint.
const TARGET_TEMPERATURE_FALLBACK: f64 = 22.0;

const DEFAULT_MIN_TEMP: f64 = 10.0;
const DEFAULT_MAX_TEMP: f64 = 30.0;

type EventCallback = Box<dyn Fn(&Event) + Send + Sync>;
type SnapshotCallback = Box<dyn Fn(&DeviceState) + Send + Sync>;

pub struct DaikinClientBuilder {
    ip: String,
    protocol: String,
    min_temp: f64,
    max_temp: f64,
    event_callbacks: Vec<EventCallback>,
    snapshot_callbacks: Vec<SnapshotCallback>,
    log_mode: Option<MessageLogMode>,
    log_path: Option<String>,
}

impl DaikinClientBuilder {
    pub fn new(ip: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            protocol: "http".to_string(),
            min_temp: DEFAULT_MIN_TEMP,
            max_temp: DEFAULT_MAX_TEMP,
            event_callbacks: Vec::new(),
            snapshot_callbacks: Vec::new(),
            log_mode: None,
            log_path: None,
        }
    }

    pub fn protocol(mut self, proto: &str) -> Self {
        self.protocol = proto.to_string();
        self
    }

    /// Bounds accepted by `set_temperature`.
    pub fn temperature_range(mut self, min: f64, max: f64) -> Self {
        self.min_temp = min;
        self.max_temp = max;
        self
    }

    pub fn on_event(mut self, f: impl Fn(&Event) + Send + Sync + 'static) -> Self {
        self.event_callbacks.push(Box::new(f));
        self
    }

    pub fn on_snapshot(mut self, f: impl Fn(&DeviceState) + Send + Sync + 'static) -> Self {
        self.snapshot_callbacks.push(Box::new(f));
        self
    }

    pub fn message_log(mut self, mode: MessageLogMode, path: impl Into<String>) -> Self {
        self.log_mode = Some(mode);
        self.log_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<DaikinClient> {
        debug_assert!(codes::tables_consistent(), "code tables are not inverse");

        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .build()?;

        let logger = match (self.log_mode, self.log_path) {
            (Some(mode), Some(path)) => Some(MessageLogger::new(mode, &path)?),
            _ => None,
        };

        Ok(DaikinClient {
            http,
            url: format!("{}://{}{}", self.protocol, self.ip, MULTIREQ_PATH),
            state: DeviceState::default(),
            current: false,
            min_temp: self.min_temp,
            max_temp: self.max_temp,
            event_callbacks: self.event_callbacks,
            snapshot_callbacks: self.snapshot_callbacks,
            logger,
        })
    }
}

/// One air conditioner. Every operation takes `&mut self`, so a single
/// instance never runs two exchanges with the unit at once.
pub struct DaikinClient {
    http: reqwest::Client,
    url: String,
    state: DeviceState,
    current: bool,
    min_temp: f64,
    max_temp: f64,
    event_callbacks: Vec<EventCallback>,
    snapshot_callbacks: Vec<SnapshotCallback>,
    logger: Option<MessageLogger>,
}

impl DaikinClient {
    pub fn builder(ip: impl Into<String>) -> DaikinClientBuilder {
        DaikinClientBuilder::new(ip)
    }

    /// Reads the adapter MAC. Kept across refreshes.
    pub async fn identify(&mut self) -> Result<String> {
        let response = self.read(&identity_read_request()).await?;
        let raw = find_str(&response, IDENTITY_ENDPOINT, &["adp_i", "mac"])?;
        let mac = format_mac(raw);
        debug!(mac = %mac, "identified unit");
        self.state.mac = Some(mac.clone());
        Ok(mac)
    }

    /// Reads status, outdoor and power endpoints and replaces the snapshot.
    /// On failure the previous snapshot stays in place and is marked stale.
    pub async fn refresh(&mut self) -> Result<()> {
        self.current = false;
        let response = self.read(&status_read_request()).await?;
        let next = parse_state(&response, &self.state)?;

        let events = diff_state(&self.state, &next);
        self.state = next;
        self.current = true;

        for event in &events {
            for cb in &self.event_callbacks {
                cb(event);
            }
        }
        for cb in &self.snapshot_callbacks {
            cb(&self.state);
        }
        if !events.is_empty() {
            debug!(count = events.len(), "state changed on refresh");
        }
        Ok(())
    }

    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    /// True only while the last refresh succeeded and no command has been
    /// issued since.
    pub fn is_current(&self) -> bool {
        self.current
    }

    pub fn hvac_mode(&self) -> HvacMode {
        self.state.hvac_mode
    }

    pub fn fan_mode(&self) -> FanMode {
        self.state.fan_mode
    }

    pub fn swing_mode(&self) -> SwingMode {
        self.state.swing_mode
    }

    pub fn current_temperature(&self) -> Option<Temperature> {
        self.state.current_temperature
    }

    pub fn target_temperature(&self) -> Option<Temperature> {
        self.state.target_temperature
    }

    pub fn outside_temperature(&self) -> Option<Temperature> {
        self.state.outside_temperature
    }

    pub fn humidity(&self) -> Option<u32> {
        self.state.humidity
    }

    pub fn runtime_today(&self) -> Option<f64> {
        self.state.runtime_today
    }

    pub fn energy_today(&self) -> Option<f64> {
        self.state.energy_today
    }

    pub fn mac(&self) -> Option<&str> {
        self.state.mac.as_deref()
    }

    pub fn min_temp(&self) -> f64 {
        self.min_temp
    }

    pub fn max_temp(&self) -> f64 {
        self.max_temp
    }

    // -- Commands --

    pub async fn turn_on(&mut self) -> Result<()> {
        info!("turning unit on");
        self.write("turn_on", &[power_attribute(true)]).await?;
        self.refresh().await
    }

    pub async fn turn_off(&mut self) -> Result<()> {
        info!("turning unit off");
        self.write("turn_off", &[power_attribute(false)]).await?;
        self.refresh().await
    }

    /// `Off` cuts power; any other mode powers the unit on first.
    pub async fn set_hvac_mode(&mut self, mode: HvacMode) -> Result<()> {
        info!(mode = mode.as_str(), "set hvac mode");
        let Some(code) = codes::mode_code(mode) else {
            return self.turn_off().await;
        };
        self.write("turn_on", &[power_attribute(true)]).await?;
        let attr = Attribute::control(SETTINGS_GROUP, MODE_ATTR, code);
        self.write("set_hvac_mode", &[attr]).await?;
        self.refresh().await
    }

    /// Modes without a fan speed attribute (dry) always run on auto; the
    /// request is answered locally.
    pub async fn set_fan_mode(&mut self, mode: FanMode) -> Result<()> {
        let Some(attr_name) = codes::fan_speed_attr(self.state.hvac_mode) else {
            debug!(
                mode = self.state.hvac_mode.as_str(),
                "fan speed fixed to auto in this mode"
            );
            self.state.fan_mode = FanMode::Auto;
            return Ok(());
        };
        info!(fan = mode.label(), "set fan mode");
        let attr = Attribute::control(SETTINGS_GROUP, attr_name, codes::fan_code(mode));
        self.write("set_fan_mode", &[attr]).await?;
        self.refresh().await
    }

    /// Ignored while the unit is off.
    pub async fn set_swing_mode(&mut self, mode: SwingMode) -> Result<()> {
        let Some((vertical_attr, horizontal_attr)) = codes::swing_attrs(self.state.hvac_mode)
        else {
            debug!("unit is off, ignoring swing change");
            return Ok(());
        };
        info!(swing = mode.as_str(), "set swing mode");
        let axis = |on: bool| if on { SWING_AXIS_ON } else { SWING_AXIS_OFF };
        let (vertical, horizontal) = mode.axes();
        let attrs = [
            Attribute::control(SETTINGS_GROUP, horizontal_attr, axis(horizontal)),
            Attribute::control(SETTINGS_GROUP, vertical_attr, axis(vertical)),
        ];
        self.write("set_swing_mode", &attrs).await?;
        self.refresh().await
    }

    /// Setpoint for the current mode, rounded to 0.5 degrees.
    pub async fn set_temperature(&mut self, temp: Temperature) -> Result<()> {
        let celsius = temp.to_half_degrees();
        if !(self.min_temp..=self.max_temp).contains(&celsius) {
            return Err(Error::TemperatureOutOfRange {
                value: celsius,
                min: self.min_temp,
                max: self.max_temp,
            });
        }
        let mode = self.state.hvac_mode;
        let attr_name = codes::target_temp_attr(mode).ok_or(Error::Unsupported {
            action: "set_temperature",
            mode,
        })?;
        info!(celsius, "set target temperature");
        let attr = Attribute::control(SETTINGS_GROUP, attr_name, encode_temperature(celsius));
        self.write("set_temperature", &[attr]).await?;
        self.refresh().await
    }

    // -- Helpers --

    async fn read(&mut self, request: &MultiRequest) -> Result<MultiResponse> {
        debug!(url = %self.url, reads = request.requests.len(), "reading from unit");
        if let Some(ref mut logger) = self.logger {
            logger.log_request("POST", MULTIREQ_PATH, &serde_json::to_value(request)?);
        }
        self.exchange(Method::POST, request).await
    }

    /// Sends one coalesced write and requires every record to be acknowledged.
    async fn write(&mut self, action: &str, attributes: &[Attribute]) -> Result<()> {
        self.current = false;
        let request = build_write_request(attributes);
        debug!(action, attributes = attributes.len(), "writing to unit");
        if let Some(ref mut logger) = self.logger {
            logger.log_command(action, &serde_json::to_value(&request)?);
        }
        let response = self.exchange(Method::PUT, &request).await?;
        let endpoint = attributes
            .first()
            .map(Attribute::destination)
            .unwrap_or(CONTROL_ENDPOINT);
        response.check_write_ack(endpoint)
    }

    async fn exchange(&mut self, method: Method, request: &MultiRequest) -> Result<MultiResponse> {
        trace!(?request, "dsiot request");
        let text = self
            .http
            .request(method.clone(), &self.url)
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        trace!(body = %text, "dsiot response");

        let json: Value = serde_json::from_str(&text)?;
        if let Some(ref mut logger) = self.logger {
            logger.log_response(method.as_str(), &json);
        }
        Ok(serde_json::from_value(json)?)
    }
}

fn power_attribute(on: bool) -> Attribute {
    Attribute::control(POWER_GROUP, POWER_ATTR, if on { POWER_ON } else { POWER_OFF })
}

fn invalid(keys: &[&str], value: impl ToString) -> Error {
    Error::InvalidValue {
        key: keys.join("/"),
        value: value.to_string(),
    }
}

fn read_temperature(
    response: &MultiResponse,
    endpoint: &str,
    keys: &[&str],
    divisor: f64,
) -> Result<Temperature> {
    let raw = find_str(response, endpoint, keys)?;
    decode_temperature(raw, divisor)
        .map(Temperature::from_celsius)
        .ok_or_else(|| invalid(keys, raw))
}

fn as_number(value: &Value, keys: &[&str]) -> Result<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
        .ok_or_else(|| invalid(keys, value))
}

/// Builds a complete snapshot from one refresh response. Any missing or
/// undecodable field fails the whole snapshot, except a missing setpoint.
pub(crate) fn parse_state(response: &MultiResponse, previous: &DeviceState) -> Result<DeviceState> {
    let power = find_str(response, STATUS_ENDPOINT, &status_keys(POWER_GROUP, POWER_ATTR))?;
    let hvac_mode = if power == POWER_OFF {
        HvacMode::Off
    } else {
        let code = find_str(response, STATUS_ENDPOINT, &status_keys(SETTINGS_GROUP, MODE_ATTR))?;
        codes::mode_from_code(code)?
    };

    let outside_temperature = read_temperature(
        response,
        OUTDOOR_ENDPOINT,
        &status_keys(OUTDOOR_GROUP, OUTDOOR_TEMP_ATTR),
        2.0,
    )?;

    let target_temperature = match codes::target_temp_attr(hvac_mode) {
        None => None,
        Some(attr) => {
            let keys = status_keys(SETTINGS_GROUP, attr);
            match read_temperature(response, STATUS_ENDPOINT, &keys, 2.0) {
                Ok(temp) => Some(temp),
                Err(Error::KeyNotFound { key, .. }) => {
                    warn!(%key, "no target temperature reported, using fallback");
                    Some(Temperature::from_celsius(TARGET_TEMPERATURE_FALLBACK))
                }
                Err(e) => return Err(e),
            }
        }
    };

    // The indoor sensor reports whole degrees, hence divisor 1.
    let current_temperature = read_temperature(
        response,
        STATUS_ENDPOINT,
        &status_keys(SENSOR_GROUP, INDOOR_TEMP_ATTR),
        1.0,
    )?;

    let fan_mode = match codes::fan_speed_attr(hvac_mode) {
        Some(attr) => {
            let code = find_str(response, STATUS_ENDPOINT, &status_keys(SETTINGS_GROUP, attr))?;
            codes::fan_from_code(code)?
        }
        None => FanMode::Auto,
    };

    let humidity_keys = status_keys(SENSOR_GROUP, HUMIDITY_ATTR);
    let raw_humidity = find_str(response, STATUS_ENDPOINT, &humidity_keys)?;
    let humidity = decode_humidity(raw_humidity).ok_or_else(|| invalid(&humidity_keys, raw_humidity))?;

    let swing_mode = match codes::swing_attrs(hvac_mode) {
        Some((vertical_attr, horizontal_attr)) => {
            let vertical = find_str(response, STATUS_ENDPOINT, &status_keys(SETTINGS_GROUP, vertical_attr))?;
            let horizontal =
                find_str(response, STATUS_ENDPOINT, &status_keys(SETTINGS_GROUP, horizontal_attr))?;
            SwingMode::from_axes(swing_axis_enabled(vertical), swing_axis_enabled(horizontal))
        }
        None => previous.swing_mode,
    };

    let energy_keys = ["week_power", "datas"];
    let series = find_value(response, WEEK_POWER_ENDPOINT, &energy_keys)?;
    let today = series
        .as_array()
        .and_then(|days| days.last())
        .ok_or_else(|| invalid(&energy_keys, series))?;
    let energy_today = as_number(today, &energy_keys)?;

    let runtime_keys = ["week_power", "today_runtime"];
    let runtime_today = as_number(
        find_value(response, WEEK_POWER_ENDPOINT, &runtime_keys)?,
        &runtime_keys,
    )?;

    Ok(DeviceState {
        hvac_mode,
        fan_mode,
        swing_mode,
        current_temperature: Some(current_temperature),
        target_temperature,
        outside_temperature: Some(outside_temperature),
        humidity: Some(humidity),
        runtime_today: Some(runtime_today),
        energy_today: Some(energy_today),
        mac: previous.mac.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn leaves(pairs: &[(&str, &str)]) -> Vec<Value> {
        pairs.iter().map(|(pn, pv)| json!({"pn": pn, "pv": pv})).collect()
    }

    fn response(power: &str, settings: &[(&str, &str)]) -> MultiResponse {
        let body = json!({"responses": [
            {"fr": STATUS_ENDPOINT, "rsc": 2000, "pc": {"pn": "dgc_status", "pch": [
                {"pn": "e_1002", "pch": [
                    {"pn": "e_A002", "pch": leaves(&[("p_01", power)])},
                    {"pn": "e_3001", "pch": leaves(settings)},
                    {"pn": "e_A00B", "pch": leaves(&[("p_01", "18"), ("p_02", "32")])}
                ]}
            ]}},
            {"fr": OUTDOOR_ENDPOINT, "rsc": 2000, "pc": {"pn": "dgc_status", "pch": [
                {"pn": "e_1003", "pch": [{"pn": "e_A00D", "pch": leaves(&[("p_01", "F6")])}]}
            ]}},
            {"fr": WEEK_POWER_ENDPOINT, "rsc": 2000, "pc": {"pn": "week_power", "pch": [
                {"pn": "today_runtime", "pv": 95},
                {"pn": "datas", "pv": [400, 300, 200]}
            ]}}
        ]});
        serde_json::from_value(body).unwrap()
    }

    const COOL: &[(&str, &str)] = &[
        ("p_01", "0200"),
        ("p_02", "30"),
        ("p_09", "0500"),
        ("p_05", "0F0000"),
        ("p_06", "000000"),
    ];

    #[test]
    fn cooling_snapshot() {
        let state = parse_state(&response("01", COOL), &DeviceState::default()).unwrap();
        assert_eq!(state.hvac_mode, HvacMode::Cool);
        assert_eq!(state.target_temperature, Some(Temperature::from_celsius(24.0)));
        assert_eq!(state.current_temperature, Some(Temperature::from_celsius(24.0)));
        assert_eq!(state.outside_temperature, Some(Temperature::from_celsius(-5.0)));
        assert_eq!(state.fan_mode, FanMode::Level3);
        assert_eq!(state.swing_mode, SwingMode::Vertical);
        assert_eq!(state.humidity, Some(50));
        assert_eq!(state.energy_today, Some(200.0));
        assert_eq!(state.runtime_today, Some(95.0));
    }

    #[test]
    fn power_off_ignores_mode_fields() {
        let previous = DeviceState {
            swing_mode: SwingMode::Both,
            mac: Some("a1:b2:c3:d4:e5:f6".into()),
            ..Default::default()
        };
        let state = parse_state(&response("00", COOL), &previous).unwrap();
        assert_eq!(state.hvac_mode, HvacMode::Off);
        assert_eq!(state.target_temperature, None);
        assert_eq!(state.fan_mode, FanMode::Auto);
        assert_eq!(state.swing_mode, SwingMode::Both);
        assert_eq!(state.mac.as_deref(), Some("a1:b2:c3:d4:e5:f6"));
    }

    #[test]
    fn power_off_with_unknown_mode_code() {
        let state = parse_state(&response("00", &[("p_01", "0900")]), &DeviceState::default()).unwrap();
        assert_eq!(state.hvac_mode, HvacMode::Off);
    }

    #[test]
    fn dry_mode_has_auto_fan_and_no_setpoint() {
        let dry = [("p_01", "0500"), ("p_22", "000000"), ("p_23", "000000")];
        let state = parse_state(&response("01", &dry), &DeviceState::default()).unwrap();
        assert_eq!(state.hvac_mode, HvacMode::Dry);
        assert_eq!(state.fan_mode, FanMode::Auto);
        assert_eq!(state.target_temperature, None);
        assert_eq!(state.swing_mode, SwingMode::Off);
    }

    #[test]
    fn missing_setpoint_falls_back() {
        let heat = [
            ("p_01", "0100"),
            ("p_0A", "0A00"),
            ("p_07", "0F0000"),
            ("p_08", "0F0000"),
        ];
        let state = parse_state(&response("01", &heat), &DeviceState::default()).unwrap();
        assert_eq!(state.hvac_mode, HvacMode::Heat);
        assert_eq!(state.target_temperature, Some(Temperature::from_celsius(22.0)));
        assert_eq!(state.swing_mode, SwingMode::Both);
    }

    #[test]
    fn missing_fan_speed_fails_snapshot() {
        let cool = [("p_01", "0200"), ("p_02", "30"), ("p_05", "0F0000"), ("p_06", "000000")];
        let err = parse_state(&response("01", &cool), &DeviceState::default()).unwrap_err();
        assert!(matches!(err, Error::KeyNotFound { ref key, .. } if key == "p_09"));
    }

    #[test]
    fn unknown_mode_code_fails_snapshot() {
        let err = parse_state(&response("01", &[("p_01", "0900")]), &DeviceState::default())
            .unwrap_err();
        assert!(matches!(err, Error::UnknownCode { .. }));
    }

    #[test]
    fn malformed_setpoint_is_not_a_fallback() {
        let cool = [
            ("p_01", "0200"),
            ("p_02", "zz"),
            ("p_09", "0500"),
            ("p_05", "000000"),
            ("p_06", "000000"),
        ];
        let err = parse_state(&response("01", &cool), &DeviceState::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidValue { .. }));
    }

    #[test]
    fn power_attribute_values() {
        assert_eq!(power_attribute(true).value(), "01");
        assert_eq!(power_attribute(false).value(), "00");
        assert_eq!(power_attribute(true).path(), ["e_1002", "e_A002"]);
    }
}
