use serde_json::Value;

use crate::types::*;

/// Array elements are matched by identity: `pn` for tree nodes, `fr` for
/// response records. Other arrays (e.g. energy series) compare as scalars.
fn element_id(value: &Value) -> Option<&str> {
    value
        .get("pn")
        .or_else(|| value.get("fr"))
        .and_then(|v| v.as_str())
}

fn keyed(items: &[Value]) -> Option<Vec<(&str, &Value)>> {
    items
        .iter()
        .map(|item| element_id(item).map(|id| (id, item)))
        .collect()
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}/{key}")
    }
}

pub(crate) fn diff_json(
    previous: &Value,
    current: &Value,
    path_prefix: &str,
    changes: &mut Vec<(String, Value, Value)>,
) {
    match (previous, current) {
        (Value::Object(prev_map), Value::Object(curr_map)) => {
            for (key, curr_val) in curr_map {
                // Node names are already part of the path.
                if key == "pn" || key == "fr" {
                    continue;
                }
                let path = match key.as_str() {
                    "pch" | "responses" => path_prefix.to_string(),
                    "pc" => match element_id(curr_val) {
                        Some(root) => join(path_prefix, root),
                        None => path_prefix.to_string(),
                    },
                    _ => join(path_prefix, key),
                };
                let prev_val = prev_map.get(key).unwrap_or(&Value::Null);
                diff_json(prev_val, curr_val, &path, changes);
            }
        }
        (Value::Null, Value::Object(_)) => {
            diff_json(&Value::Object(serde_json::Map::new()), current, path_prefix, changes);
        }
        (prev, Value::Array(curr_items)) => {
            let prev_items: &[Value] = match prev {
                Value::Array(items) => items,
                _ => &[],
            };
            match (keyed(prev_items), keyed(curr_items)) {
                (Some(prev_keyed), Some(curr_keyed)) if !curr_keyed.is_empty() => {
                    for (id, curr_item) in curr_keyed {
                        let path = join(path_prefix, id);
                        let prev_item = prev_keyed
                            .iter()
                            .find(|(prev_id, _)| *prev_id == id)
                            .map(|(_, v)| *v)
                            .unwrap_or(&Value::Null);
                        diff_json(prev_item, curr_item, &path, changes);
                    }
                }
                _ if prev != current => {
                    changes.push((path_prefix.to_string(), prev.clone(), current.clone()));
                }
                _ => {}
            }
        }
        (prev, curr) if prev != curr => {
            changes.push((path_prefix.to_string(), prev.clone(), curr.clone()));
        }
        _ => {}
    }
}

/// Events for every field that differs between two snapshots. Fields that
/// become unknown produce no event, except the setpoint which legitimately
/// becomes `None` in modes without one.
pub(crate) fn diff_state(previous: &DeviceState, current: &DeviceState) -> Vec<Event> {
    let mut events = Vec::new();

    if previous.hvac_mode != current.hvac_mode {
        events.push(Event::ModeChanged {
            mode: current.hvac_mode,
        });
    }
    if previous.fan_mode != current.fan_mode {
        events.push(Event::FanModeChanged {
            mode: current.fan_mode,
        });
    }
    if previous.swing_mode != current.swing_mode {
        events.push(Event::SwingModeChanged {
            mode: current.swing_mode,
        });
    }
    if previous.target_temperature != current.target_temperature {
        events.push(Event::TargetTemperatureChanged {
            temp: current.target_temperature,
        });
    }
    if let Some(temp) = current.current_temperature
        && previous.current_temperature != Some(temp)
    {
        events.push(Event::IndoorTemperatureChanged { temp });
    }
    if let Some(temp) = current.outside_temperature
        && previous.outside_temperature != Some(temp)
    {
        events.push(Event::OutdoorTemperatureChanged { temp });
    }
    if let Some(humidity) = current.humidity
        && previous.humidity != Some(humidity)
    {
        events.push(Event::HumidityChanged { humidity });
    }
    if let Some(energy) = current.energy_today
        && previous.energy_today != Some(energy)
    {
        events.push(Event::EnergyChanged { energy });
    }
    if let Some(runtime) = current.runtime_today
        && previous.runtime_today != Some(runtime)
    {
        events.push(Event::RuntimeChanged { runtime });
    }

    events
}
