//! Physical units understood in RCL arguments

/// The class of gadget a unit belongs to; selects the side effect of an
/// on-command argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitClass {
    Volume,
    Temperature,
    Time,
    Power,
}

impl UnitClass {
    /// The gadget name an update must carry to be measured in this class
    pub fn name(&self) -> &'static str {
        match self {
            UnitClass::Volume => "volume",
            UnitClass::Temperature => "temperature",
            UnitClass::Time => "time",
            UnitClass::Power => "power",
        }
    }
}

/// Look up the class of `unit`, `None` if the unit is unknown
pub fn unit_class(unit: &str) -> Option<UnitClass> {
    let class = match unit {
        "liters" | "liter" | "gallons" | "gallon" => UnitClass::Volume,
        "c" | "f" | "C" | "F" | "celcius" | "celsius" | "fahrenheit" => UnitClass::Temperature,
        "seconds" | "second" | "minutes" | "minute" | "hours" | "hour" => UnitClass::Time,
        "%" => UnitClass::Power,
        _ => return None,
    };
    Some(class)
}

/// Seconds per time unit, `None` for non-time units
pub fn time_unit_seconds(unit: &str) -> Option<f64> {
    match unit {
        "seconds" | "second" => Some(1.0),
        "minutes" | "minute" => Some(60.0),
        "hours" | "hour" => Some(3600.0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_classes() {
        assert_eq!(unit_class("gallons"), Some(UnitClass::Volume));
        assert_eq!(unit_class("F"), Some(UnitClass::Temperature));
        assert_eq!(unit_class("minute"), Some(UnitClass::Time));
        assert_eq!(unit_class("%"), Some(UnitClass::Power));
        assert_eq!(unit_class("furlongs"), None);
        assert_eq!(UnitClass::Volume.name(), "volume");
    }

    #[test]
    fn test_time_conversion() {
        assert_eq!(time_unit_seconds("second"), Some(1.0));
        assert_eq!(time_unit_seconds("minutes"), Some(60.0));
        assert_eq!(time_unit_seconds("hour"), Some(3600.0));
        assert_eq!(time_unit_seconds("liters"), None);
    }
}
