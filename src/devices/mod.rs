pub mod traits;
pub mod reading;
pub mod registry;
pub mod growatt;
pub mod p1_port;

pub use traits::{Connection, InputDevice};
pub use reading::{unix_millis_now, Field, Reading};
pub use registry::{DeviceRegistry, InputRegistry, OutputRegistry};
pub use growatt::GrowattInverter;
pub use p1_port::P1Port;

use crate::config::Config;

/// Input devices shipped with the reader, built from their config sections.
pub fn builtin_inputs(config: &Config) -> InputRegistry {
    let mut registry = InputRegistry::new("input");

    let inverter = config.input.growatt_inverter.clone();
    registry.register(growatt::DEVICE_NAME, move || {
        Ok(Box::new(GrowattInverter::new(inverter.clone())) as Box<dyn InputDevice>)
    });

    let p1 = config.input.p1_port.clone();
    registry.register(p1_port::DEVICE_NAME, move || {
        Ok(Box::new(P1Port::new(p1.clone())) as Box<dyn InputDevice>)
    });

    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_inputs_registered() {
        let registry = builtin_inputs(&Config::default());
        assert_eq!(registry.names(), vec!["growatt-inverter", "p1-port"]);
        assert_eq!(registry.get("p1-port").unwrap().name(), "p1-port");
        assert!(registry.get("sma-inverter").is_err());
    }
}
