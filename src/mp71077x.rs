use crate::{
    EmptyResponse, Error, Result, ScpiDeserialize, ScpiRequest, VerificationFailure,
    commands::{
        GetInputRequest, GetParameterRequest, MeasureRequest, Quantity, RawCommand, RawQuery,
        SetInputRequest, SetParameterRequest, Setting, State, WritableSetting,
    },
    config::SessionConfig,
    diagnostics::{DiagnosticSink, TracingSink},
    quantity_control::QuantityControl,
    reading::{Reading, VALID_DIGITS, digit_count},
    transport::Transport,
};

const DEVICE: &str = "MP71077x";

/// Driver for an MP71077x / Korad KEL20x0 electronic load.
///
/// Commands are only accepted between [`Mp71077x::open`] and
/// [`Mp71077x::close`]. Every operation borrows the driver mutably, so at
/// most one command is in flight at a time.
pub struct Mp71077x {
    config: SessionConfig,
    transport: Option<Transport>,
    sink: Box<dyn DiagnosticSink>,
}

impl Mp71077x {
    pub fn new(config: SessionConfig) -> Self {
        Self::with_sink(config, TracingSink)
    }

    pub fn with_sink(config: SessionConfig, sink: impl DiagnosticSink + 'static) -> Self {
        Mp71077x {
            config,
            transport: None,
            sink: Box::new(sink),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    /// Binds the local socket. Does nothing if already open.
    pub async fn open(&mut self) -> Result<()> {
        if self.transport.is_some() {
            return Ok(());
        }

        let transport =
            Transport::open(self.config.local, self.config.remote, self.config.timeout).await?;
        self.transport = Some(transport);
        self.print_message("Socket opened");
        Ok(())
    }

    /// Releases the socket. Does nothing if already closed.
    pub fn close(&mut self) {
        if let Some(transport) = self.transport.take() {
            transport.close();
            self.print_message("Socket closed");
        }
    }

    fn transport(&self) -> Result<&Transport> {
        self.transport.as_ref().ok_or(Error::NotOpen)
    }

    fn print_message(&self, message: &str) {
        if self.config.verbose {
            self.sink.emit(DEVICE, self.config.remote, message);
        }
    }

    async fn send_raw<Request>(&mut self, request: Request) -> Result<()>
    where
        Request: ScpiRequest,
    {
        let mut out = String::with_capacity(64);
        request.serialize(&mut out);
        self.transport()?.send(&out).await
    }

    async fn send<Request>(&mut self, request: Request) -> Result<()>
    where
        Request: ScpiRequest<Response = EmptyResponse>,
    {
        self.send_raw(request).await
    }

    async fn execute<Request, Response>(&mut self, request: Request) -> Result<Response>
    where
        Request: ScpiRequest<Response = Response>,
        Response: ScpiDeserialize,
    {
        let mut out = String::with_capacity(64);
        request.serialize(&mut out);
        let reply = self.transport()?.send_and_receive(&out).await?;

        let mut data = std::str::from_utf8(&reply)
            .map_err(|e| Error::ResponseDecoding(format!("Reply is not valid UTF-8: {e}")))?;
        Response::deserialize(&mut data)
    }

    /// Sends an arbitrary command without waiting for a reply.
    pub async fn send_command(&mut self, command: &str) -> Result<()> {
        self.send(RawCommand(command)).await
    }

    /// Sends an arbitrary command and returns the reply text.
    pub async fn query(&mut self, command: &str) -> Result<String> {
        self.execute(RawQuery(command)).await.map(|e| e.0)
    }

    /// Applies the device precision rule, noting when digits are dropped.
    pub fn round(&self, value: f64) -> Reading {
        if self.config.verbose && digit_count(value) > VALID_DIGITS {
            self.print_message(&format!(
                "Entered value will be rounded to {VALID_DIGITS} valid digits"
            ));
        }
        Reading::rounded(value)
    }

    pub async fn turn_input_on(&mut self, verify: bool) -> Result<()> {
        self.set_input(State::On, verify).await
    }

    pub async fn turn_input_off(&mut self, verify: bool) -> Result<()> {
        self.set_input(State::Off, verify).await
    }

    /// Switches the input. With `verify`, the `:INP?` reply must contain
    /// `ON` / `OFF` respectively.
    pub async fn set_input(&mut self, state: State, verify: bool) -> Result<()> {
        let token = state.reply_token();
        self.send(SetInputRequest { state }).await?;

        if !verify {
            self.print_message(&format!("Load turn {token} command has been sent"));
            return Ok(());
        }

        let response = self.execute(GetInputRequest).await?;
        if !response.confirms(state) {
            return Err(Error::Verification(VerificationFailure::Input {
                expected: state,
                reply: response.reply,
            }));
        }
        self.print_message(&format!("Load input has been turned {token}"));
        Ok(())
    }

    /// The device is authoritative for the input state; nothing is cached.
    pub async fn get_input_state(&mut self) -> Result<State> {
        self.print_message("Asking for input state");
        self.execute(GetInputRequest).await?.state()
    }

    pub async fn get(&mut self, quantity: Quantity, setting: Setting) -> Result<f64> {
        self.print_message(&format!("Asking for {}", setting.describe(quantity)));
        let response = self
            .execute(GetParameterRequest { quantity, setting })
            .await?;
        Ok(response.0)
    }

    /// Rounds and writes `value`; NaN and infinities are refused before
    /// anything is sent. With `verify`, re-queries and requires the
    /// reply to equal the rounded value exactly.
    pub async fn set(
        &mut self,
        quantity: Quantity,
        setting: WritableSetting,
        value: f64,
        verify: bool,
    ) -> Result<()> {
        if !value.is_finite() {
            return Err(Error::InvalidValue(value));
        }
        let value = self.round(value);
        let description = Setting::from(setting).describe(quantity);
        self.print_message(&format!(
            "Setting {description} to {}{}",
            value.value(),
            quantity.unit()
        ));
        self.send(SetParameterRequest {
            quantity,
            setting,
            value,
        })
        .await?;

        if !verify {
            return Ok(());
        }

        let confirmed = self.get(quantity, setting.into()).await?;
        if confirmed != value.value() {
            return Err(Error::Verification(VerificationFailure::Numeric {
                quantity,
                setting: setting.into(),
                requested: value.value(),
                confirmed,
            }));
        }
        self.print_message(&format!("Confirmed {description}"));
        Ok(())
    }

    /// Returns `(lower, upper)`, queried in that order.
    pub async fn get_limits(&mut self, quantity: Quantity) -> Result<(f64, f64)> {
        self.print_message(&format!("Asking for both {} limits", quantity.name()));
        let lower = self.get(quantity, Setting::LowerLimit).await?;
        let upper = self.get(quantity, Setting::UpperLimit).await?;
        Ok((lower, upper))
    }

    /// Live value at the input terminals, as opposed to the set-point.
    pub async fn measure(&mut self, quantity: Quantity) -> Result<f64> {
        self.print_message(&format!("Measuring {}", quantity.name()));
        let response = self.execute(MeasureRequest { quantity }).await?;
        Ok(response.0)
    }

    pub fn quantity(&mut self, quantity: Quantity) -> QuantityControl<'_> {
        QuantityControl::new(self, quantity)
    }

    pub fn voltage(&mut self) -> QuantityControl<'_> {
        self.quantity(Quantity::Voltage)
    }

    pub fn current(&mut self) -> QuantityControl<'_> {
        self.quantity(Quantity::Current)
    }

    pub fn power(&mut self) -> QuantityControl<'_> {
        self.quantity(Quantity::Power)
    }

    pub fn resistance(&mut self) -> QuantityControl<'_> {
        self.quantity(Quantity::Resistance)
    }
}

impl Drop for Mp71077x {
    fn drop(&mut self) {
        self.close();
    }
}
