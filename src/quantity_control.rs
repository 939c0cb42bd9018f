use crate::{
    Result,
    commands::{Quantity, Setting, WritableSetting},
    mp71077x::Mp71077x,
};

/// One parameter family (voltage, current, power or resistance) of a load.
pub struct QuantityControl<'a> {
    quantity: Quantity,
    load: &'a mut Mp71077x,
}

impl<'a> QuantityControl<'a> {
    pub fn new(load: &'a mut Mp71077x, quantity: Quantity) -> Self {
        QuantityControl { load, quantity }
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    pub async fn get_upper_limit(&mut self) -> Result<f64> {
        self.load.get(self.quantity, Setting::UpperLimit).await
    }

    pub async fn set_upper_limit(&mut self, limit: f64, verify: bool) -> Result<()> {
        self.load
            .set(self.quantity, WritableSetting::UpperLimit, limit, verify)
            .await
    }

    /// Read-only on the device.
    pub async fn get_lower_limit(&mut self) -> Result<f64> {
        self.load.get(self.quantity, Setting::LowerLimit).await
    }

    pub async fn get_limits(&mut self) -> Result<(f64, f64)> {
        self.load.get_limits(self.quantity).await
    }

    /// The CV/CI/CP/CR set-point.
    pub async fn get_value(&mut self) -> Result<f64> {
        self.load.get(self.quantity, Setting::Value).await
    }

    pub async fn set_value(&mut self, value: f64, verify: bool) -> Result<()> {
        self.load
            .set(self.quantity, WritableSetting::Value, value, verify)
            .await
    }

    pub async fn measure(&mut self) -> Result<f64> {
        self.load.measure(self.quantity).await
    }
}
