use std::fmt;

/// Temperature in Celsius. The unit reports setpoints in 0.5 degree steps
/// and the indoor sensor in whole degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Temperature(f64);

impl Temperature {
    pub fn from_celsius(c: f64) -> Self {
        Self(c)
    }

    pub fn celsius(&self) -> f64 {
        self.0
    }

    pub fn fahrenheit(&self) -> f64 {
        self.0 * (9.0 / 5.0) + 32.0
    }

    /// Round to the unit's setpoint precision (0.5 increments).
    pub fn to_half_degrees(&self) -> f64 {
        (self.0 * 2.0).round() / 2.0
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}\u{00b0}C", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HvacMode {
    #[default]
    Off,
    Heat,
    Cool,
    Auto,
    Dry,
    FanOnly,
}

impl HvacMode {
    pub const ALL: [HvacMode; 6] = [
        HvacMode::Off,
        HvacMode::Heat,
        HvacMode::Cool,
        HvacMode::Auto,
        HvacMode::Dry,
        HvacMode::FanOnly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HvacMode::Off => "off",
            HvacMode::Heat => "heat",
            HvacMode::Cool => "cool",
            HvacMode::Auto => "auto",
            HvacMode::Dry => "dry",
            HvacMode::FanOnly => "fan_only",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FanMode {
    #[default]
    Quiet,
    Auto,
    Level1,
    Level2,
    Level3,
    Level4,
    Level5,
}

impl FanMode {
    pub const ALL: [FanMode; 7] = [
        FanMode::Quiet,
        FanMode::Auto,
        FanMode::Level1,
        FanMode::Level2,
        FanMode::Level3,
        FanMode::Level4,
        FanMode::Level5,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FanMode::Quiet => "Quiet",
            FanMode::Auto => "Auto",
            FanMode::Level1 => "Level 1",
            FanMode::Level2 => "Level 2",
            FanMode::Level3 => "Level 3",
            FanMode::Level4 => "Level 4",
            FanMode::Level5 => "Level 5",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.label() == s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SwingMode {
    #[default]
    Off,
    Vertical,
    Horizontal,
    Both,
}

impl SwingMode {
    pub const ALL: [SwingMode; 4] = [
        SwingMode::Off,
        SwingMode::Both,
        SwingMode::Vertical,
        SwingMode::Horizontal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SwingMode::Off => "off",
            SwingMode::Vertical => "vertical",
            SwingMode::Horizontal => "horizontal",
            SwingMode::Both => "both",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == s)
    }

    pub fn from_axes(vertical: bool, horizontal: bool) -> Self {
        match (vertical, horizontal) {
            (true, true) => SwingMode::Both,
            (true, false) => SwingMode::Vertical,
            (false, true) => SwingMode::Horizontal,
            (false, false) => SwingMode::Off,
        }
    }

    /// (vertical, horizontal)
    pub fn axes(&self) -> (bool, bool) {
        match self {
            SwingMode::Off => (false, false),
            SwingMode::Vertical => (true, false),
            SwingMode::Horizontal => (false, true),
            SwingMode::Both => (true, true),
        }
    }
}

/// Snapshot of everything a refresh reads from the unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceState {
    pub hvac_mode: HvacMode,
    pub fan_mode: FanMode,
    pub swing_mode: SwingMode,
    pub current_temperature: Option<Temperature>,
    /// `None` in modes without a settable setpoint.
    pub target_temperature: Option<Temperature>,
    pub outside_temperature: Option<Temperature>,
    pub humidity: Option<u32>,
    pub runtime_today: Option<f64>,
    pub energy_today: Option<f64>,
    pub mac: Option<String>,
}

impl DeviceState {
    pub fn is_on(&self) -> bool {
        self.hvac_mode != HvacMode::Off
    }
}

/// Events emitted after a refresh when state changes.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    ModeChanged { mode: HvacMode },
    FanModeChanged { mode: FanMode },
    SwingModeChanged { mode: SwingMode },
    TargetTemperatureChanged { temp: Option<Temperature> },
    IndoorTemperatureChanged { temp: Temperature },
    OutdoorTemperatureChanged { temp: Temperature },
    HumidityChanged { humidity: u32 },
    EnergyChanged { energy: f64 },
    RuntimeChanged { runtime: f64 },
}
