use crate::{
    EmptyResponse, Error, ScpiDeserialize, ScpiSerialize, impl_scpi_request, impl_scpi_serialize,
    read_all,
    reading::{NumericResponse, Reading},
    scpi_enum,
};

// 1. INPut
// Command format :INP {1|0}
// Description Turn the load input on or off. No reply.
// Example :INP 1

scpi_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum State {
        On => "1",
        Off => "0",
    }
}

impl State {
    /// Token the device uses for this state in an `:INP?` reply.
    pub fn reply_token(&self) -> &'static str {
        match self {
            State::On => "ON",
            State::Off => "OFF",
        }
    }
}

impl From<bool> for State {
    fn from(value: bool) -> Self {
        match value {
            true => State::On,
            false => State::Off,
        }
    }
}

impl From<State> for bool {
    fn from(value: State) -> Self {
        match value {
            State::On => true,
            State::Off => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetInputRequest {
    pub state: State,
}
impl_scpi_serialize!(SetInputRequest, [":INP ", state]);
impl_scpi_request!(SetInputRequest, EmptyResponse);

// Command format :INP?
// Description Query the load input state.
// Typical Return ON

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetInputRequest;
impl_scpi_serialize!(GetInputRequest, [":INP?"]);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputStateResponse {
    pub reply: String,
}

impl InputStateResponse {
    /// Containment, not equality: `STATE: ON` confirms [`State::On`].
    pub fn confirms(&self, state: State) -> bool {
        self.reply.contains(state.reply_token())
    }

    pub fn state(&self) -> crate::Result<State> {
        // "ON" is not a substring of "OFF", but check OFF first regardless
        if self.confirms(State::Off) {
            Ok(State::Off)
        } else if self.confirms(State::On) {
            Ok(State::On)
        } else {
            Err(Error::ResponseDecoding(format!(
                "Unexpected input state: `{}`",
                self.reply.trim_end()
            )))
        }
    }
}

impl ScpiDeserialize for InputStateResponse {
    fn deserialize(input: &mut &str) -> Result<Self, Error> {
        Ok(InputStateResponse {
            reply: read_all(input).to_string(),
        })
    }
}

impl_scpi_request!(GetInputRequest, InputStateResponse);

// 2. Parameter families
// Command format :{VOLT|CURR|POW|RES}[:{UPP|LOW}] <value><unit>
// Description Set the CV/CI/CP/CR set-point or its upper limit. Lower limits
// are read-only. Out of range values are clamped or ignored, never rejected.
// Example :VOLT:UPP 150.0V
// Command format :{VOLT|CURR|POW|RES}[:{UPP|LOW}]?
// Description Query the set-point or a limit.
// Typical Return 150.00V

scpi_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum Quantity {
        Voltage => "VOLT",
        Current => "CURR",
        Power => "POW",
        Resistance => "RES",
    }
}

impl Quantity {
    pub const ALL: [Quantity; 4] = [
        Quantity::Voltage,
        Quantity::Current,
        Quantity::Power,
        Quantity::Resistance,
    ];

    /// Suffix appended to written values.
    pub fn unit(&self) -> &'static str {
        match self {
            Quantity::Voltage => "V",
            Quantity::Current => "A",
            Quantity::Power => "W",
            Quantity::Resistance => "OHM",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Quantity::Voltage => "voltage",
            Quantity::Current => "current",
            Quantity::Power => "power",
            Quantity::Resistance => "resistance",
        }
    }

    /// Operating mode whose set-point this quantity is.
    pub fn mode(&self) -> &'static str {
        match self {
            Quantity::Voltage => "CV",
            Quantity::Current => "CI",
            Quantity::Power => "CP",
            Quantity::Resistance => "CR",
        }
    }
}

scpi_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum Setting {
        Value => "",
        UpperLimit => ":UPP",
        LowerLimit => ":LOW",
    }
}

impl Setting {
    /// Human readable name, e.g. `upper voltage limit` or `CV voltage`.
    pub fn describe(&self, quantity: Quantity) -> String {
        match self {
            Setting::Value => format!("{} {}", quantity.mode(), quantity.name()),
            Setting::UpperLimit => format!("upper {} limit", quantity.name()),
            Setting::LowerLimit => format!("lower {} limit", quantity.name()),
        }
    }
}

/// The settings that have a write form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WritableSetting {
    Value,
    UpperLimit,
}

impl From<WritableSetting> for Setting {
    fn from(value: WritableSetting) -> Self {
        match value {
            WritableSetting::Value => Setting::Value,
            WritableSetting::UpperLimit => Setting::UpperLimit,
        }
    }
}

impl ScpiSerialize for WritableSetting {
    fn serialize(&self, out: &mut String) {
        Setting::from(*self).serialize(out);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetParameterRequest {
    pub quantity: Quantity,
    pub setting: WritableSetting,
    pub value: Reading,
}
impl ScpiSerialize for SetParameterRequest {
    fn serialize(&self, out: &mut String) {
        out.push(':');
        self.quantity.serialize(out);
        self.setting.serialize(out);
        out.push(' ');
        self.value.serialize(out);
        out.push_str(self.quantity.unit());
    }
}
impl_scpi_request!(SetParameterRequest, EmptyResponse);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetParameterRequest {
    pub quantity: Quantity,
    pub setting: Setting,
}
impl_scpi_serialize!(GetParameterRequest, [":", quantity, setting, "?"]);
impl_scpi_request!(GetParameterRequest, NumericResponse);

// 3. MEASure
// Command format :MEAS:{VOLT|CURR|POW|RES}?
// Description Query the live measured value at the input terminals.
// Typical Return 12.034V

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasureRequest {
    pub quantity: Quantity,
}
impl_scpi_serialize!(MeasureRequest, [":MEAS:", quantity, "?"]);
impl_scpi_request!(MeasureRequest, NumericResponse);

// 4. Raw text, for commands this crate does not model.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawCommand<'a>(pub &'a str);
impl ScpiSerialize for RawCommand<'_> {
    fn serialize(&self, out: &mut String) {
        out.push_str(self.0);
    }
}
impl_scpi_request!(RawCommand<'_>, EmptyResponse);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawQuery<'a>(pub &'a str);
impl ScpiSerialize for RawQuery<'_> {
    fn serialize(&self, out: &mut String) {
        out.push_str(self.0);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextResponse(pub String);
impl ScpiDeserialize for TextResponse {
    fn deserialize(input: &mut &str) -> Result<Self, Error> {
        Ok(TextResponse(read_all(input).to_string()))
    }
}
impl_scpi_request!(RawQuery<'_>, TextResponse);
