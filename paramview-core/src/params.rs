//! Named, typed, range-bounded parameters that drive geometry generation.

use crate::error::ParamError;

/// Current value of a parameter together with its declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Number {
        value: f32,
        default: f32,
        min: f32,
        max: f32,
        step: f32,
    },
    Bool {
        value: bool,
        default: bool,
    },
    /// Free text when `choices` is empty, otherwise one of `choices`.
    Text {
        value: String,
        default: String,
        choices: Vec<String>,
    },
}

impl ParamValue {
    fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Number { .. } => "number",
            ParamValue::Bool { .. } => "boolean",
            ParamValue::Text { .. } => "text",
        }
    }

    fn is_default(&self) -> bool {
        match self {
            ParamValue::Number { value, default, .. } => value == default,
            ParamValue::Bool { value, default } => value == default,
            ParamValue::Text { value, default, .. } => value == default,
        }
    }

    fn restore_default(&mut self) {
        match self {
            ParamValue::Number { value, default, .. } => *value = *default,
            ParamValue::Bool { value, default } => *value = *default,
            ParamValue::Text { value, default, .. } => value.clone_from(default),
        }
    }
}

/// An edit destined for one field.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamInput {
    Number(f32),
    Bool(bool),
    Text(String),
}

impl From<f32> for ParamInput {
    fn from(v: f32) -> Self {
        ParamInput::Number(v)
    }
}

impl From<bool> for ParamInput {
    fn from(v: bool) -> Self {
        ParamInput::Bool(v)
    }
}

impl From<&str> for ParamInput {
    fn from(v: &str) -> Self {
        ParamInput::Text(v.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub value: ParamValue,
}

/// Ordered parameter set; insertion order is display order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterRecord {
    fields: Vec<Field>,
}

impl ParameterRecord {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, name: &str, value: ParamValue) -> Self {
        self.fields.push(Field {
            name: name.to_string(),
            value,
        });
        self
    }

    pub fn number(self, name: &str, default: f32, min: f32, max: f32, step: f32) -> Self {
        self.push(
            name,
            ParamValue::Number {
                value: default,
                default,
                min,
                max,
                step,
            },
        )
    }

    /// Whole-number field, stepped by one.
    pub fn count(self, name: &str, default: u32, min: u32, max: u32) -> Self {
        self.number(name, default as f32, min as f32, max as f32, 1.0)
    }

    pub fn boolean(self, name: &str, default: bool) -> Self {
        self.push(
            name,
            ParamValue::Bool {
                value: default,
                default,
            },
        )
    }

    pub fn text(self, name: &str, default: &str) -> Self {
        self.push(
            name,
            ParamValue::Text {
                value: default.to_string(),
                default: default.to_string(),
                choices: Vec::new(),
            },
        )
    }

    pub fn choice(self, name: &str, default: &str, choices: &[&str]) -> Self {
        self.push(
            name,
            ParamValue::Text {
                value: default.to_string(),
                default: default.to_string(),
                choices: choices.iter().map(|c| c.to_string()).collect(),
            },
        )
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Check every declaration: defaults present and inside their ranges.
    pub fn validate(&self) -> Result<(), ParamError> {
        for field in &self.fields {
            let bad = |reason: &str| ParamError::BadDeclaration {
                name: field.name.clone(),
                reason: reason.to_string(),
            };
            match &field.value {
                ParamValue::Number {
                    value,
                    default,
                    min,
                    max,
                    step,
                } => {
                    if !(min <= max) {
                        return Err(bad("min exceeds max"));
                    }
                    if !(*step > 0.0) {
                        return Err(bad("step must be positive"));
                    }
                    if !(*min..=*max).contains(default) {
                        return Err(bad("default outside range"));
                    }
                    if !(*min..=*max).contains(value) {
                        return Err(bad("value outside range"));
                    }
                }
                ParamValue::Bool { .. } => {}
                ParamValue::Text {
                    value,
                    default,
                    choices,
                } => {
                    if !choices.is_empty() && !choices.contains(default) {
                        return Err(bad("default is not one of the choices"));
                    }
                    if !choices.is_empty() && !choices.contains(value) {
                        return Err(bad("value is not one of the choices"));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&ParamValue, ParamError> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| &f.value)
            .ok_or_else(|| ParamError::Unknown(name.to_string()))
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut ParamValue, ParamError> {
        self.fields
            .iter_mut()
            .find(|f| f.name == name)
            .map(|f| &mut f.value)
            .ok_or_else(|| ParamError::Unknown(name.to_string()))
    }

    /// Numeric value, re-checked against its declared range.
    pub fn get_number(&self, name: &str) -> Result<f32, ParamError> {
        match self.get(name)? {
            ParamValue::Number {
                value, min, max, ..
            } => {
                if (*min..=*max).contains(value) {
                    Ok(*value)
                } else {
                    Err(ParamError::OutOfRange {
                        name: name.to_string(),
                        value: *value,
                        min: *min,
                        max: *max,
                    })
                }
            }
            _ => Err(wrong_type(name, "number")),
        }
    }

    /// Numeric value rounded to a whole count.
    pub fn get_count(&self, name: &str) -> Result<u32, ParamError> {
        Ok(self.get_number(name)?.round().max(0.0) as u32)
    }

    pub fn get_bool(&self, name: &str) -> Result<bool, ParamError> {
        match self.get(name)? {
            ParamValue::Bool { value, .. } => Ok(*value),
            _ => Err(wrong_type(name, "boolean")),
        }
    }

    pub fn get_text(&self, name: &str) -> Result<&str, ParamError> {
        match self.get(name)? {
            ParamValue::Text { value, .. } => Ok(value.as_str()),
            _ => Err(wrong_type(name, "text")),
        }
    }

    /// Write a value in place. Returns whether the stored value changed.
    ///
    /// A rejected edit leaves the record untouched.
    pub fn set(&mut self, name: &str, input: ParamInput) -> Result<bool, ParamError> {
        let slot = self.get_mut(name)?;
        match (slot, input) {
            (
                ParamValue::Number {
                    value, min, max, ..
                },
                ParamInput::Number(v),
            ) => {
                if !(*min..=*max).contains(&v) {
                    return Err(ParamError::OutOfRange {
                        name: name.to_string(),
                        value: v,
                        min: *min,
                        max: *max,
                    });
                }
                let changed = *value != v;
                *value = v;
                Ok(changed)
            }
            (ParamValue::Bool { value, .. }, ParamInput::Bool(v)) => {
                let changed = *value != v;
                *value = v;
                Ok(changed)
            }
            (ParamValue::Text { value, choices, .. }, ParamInput::Text(v)) => {
                if !choices.is_empty() && !choices.contains(&v) {
                    return Err(ParamError::NotAChoice {
                        name: name.to_string(),
                        value: v,
                    });
                }
                let changed = *value != v;
                *value = v;
                Ok(changed)
            }
            (slot, _) => Err(wrong_type(name, slot.type_name())),
        }
    }

    /// Parse `raw` according to the field's declared type, then [`set`](Self::set) it.
    pub fn set_from_str(&mut self, name: &str, raw: &str) -> Result<bool, ParamError> {
        let input = match self.get(name)? {
            ParamValue::Number { .. } => {
                let v = raw.trim().parse::<f32>().map_err(|_| ParamError::WrongType {
                    name: name.to_string(),
                    expected: "number",
                })?;
                ParamInput::Number(v)
            }
            ParamValue::Bool { .. } => match raw.trim() {
                "true" | "1" | "on" | "yes" => ParamInput::Bool(true),
                "false" | "0" | "off" | "no" => ParamInput::Bool(false),
                _ => {
                    return Err(ParamError::WrongType {
                        name: name.to_string(),
                        expected: "boolean",
                    })
                }
            },
            ParamValue::Text { .. } => ParamInput::Text(raw.to_string()),
        };
        self.set(name, input)
    }

    /// Nudge one field: numbers move by `direction * step` clamped to range,
    /// booleans toggle, choices cycle. Free text is left alone.
    pub fn step(&mut self, name: &str, direction: i32) -> Result<bool, ParamError> {
        let slot = self.get_mut(name)?;
        match slot {
            ParamValue::Number {
                value,
                min,
                max,
                step,
                ..
            } => {
                let next = (*value + direction as f32 * *step).clamp(*min, *max);
                let changed = next != *value;
                *value = next;
                Ok(changed)
            }
            ParamValue::Bool { value, .. } => {
                if direction == 0 {
                    return Ok(false);
                }
                *value = !*value;
                Ok(true)
            }
            ParamValue::Text { value, choices, .. } => {
                if choices.is_empty() || direction == 0 {
                    return Ok(false);
                }
                let len = choices.len() as i32;
                let current = choices.iter().position(|c| c == value).unwrap_or(0) as i32;
                let next = (current + direction).rem_euclid(len) as usize;
                let changed = choices[next] != *value;
                value.clone_from(&choices[next]);
                Ok(changed)
            }
        }
    }

    /// Restore every field to its default. Returns whether anything changed.
    pub fn reset(&mut self) -> bool {
        let mut changed = false;
        for field in &mut self.fields {
            if !field.value.is_default() {
                field.value.restore_default();
                changed = true;
            }
        }
        changed
    }

    pub fn is_default(&self) -> bool {
        self.fields.iter().all(|f| f.value.is_default())
    }
}

fn wrong_type(name: &str, expected: &'static str) -> ParamError {
    ParamError::WrongType {
        name: name.to_string(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ParameterRecord {
        ParameterRecord::new()
            .number("width", 1.0, 0.1, 10.0, 0.1)
            .count("segments", 4, 1, 10)
            .boolean("openEnded", false)
            .choice("surface", "klein", &["klein", "mobius", "plane"])
            .text("label", "HI")
    }

    #[test]
    fn test_declaration_order_is_display_order() {
        let record = sample();
        let names: Vec<_> = record.names().collect();
        assert_eq!(names, ["width", "segments", "openEnded", "surface", "label"]);
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_bad_declarations_rejected() {
        let record = ParameterRecord::new().number("w", 20.0, 0.0, 10.0, 1.0);
        assert!(matches!(record.validate(), Err(ParamError::BadDeclaration { .. })));

        let record = ParameterRecord::new().number("w", 1.0, 0.0, 10.0, 0.0);
        assert!(record.validate().is_err());

        let record = ParameterRecord::new().choice("s", "cube", &["klein"]);
        assert!(record.validate().is_err());
    }

    #[test]
    fn test_set_reports_change() {
        let mut record = sample();
        assert_eq!(record.set("width", ParamInput::Number(5.0)), Ok(true));
        assert_eq!(record.set("width", ParamInput::Number(5.0)), Ok(false));
        assert_eq!(record.get_number("width"), Ok(5.0));
    }

    #[test]
    fn test_rejected_set_leaves_value() {
        let mut record = sample();
        assert!(matches!(
            record.set("width", ParamInput::Number(50.0)),
            Err(ParamError::OutOfRange { .. })
        ));
        assert!(matches!(
            record.set("width", f32::NAN.into()),
            Err(ParamError::OutOfRange { .. })
        ));
        assert!(matches!(
            record.set("width", true.into()),
            Err(ParamError::WrongType { .. })
        ));
        assert!(matches!(
            record.set("surface", "torus".into()),
            Err(ParamError::NotAChoice { .. })
        ));
        assert!(matches!(
            record.set("depth", ParamInput::Number(1.0)),
            Err(ParamError::Unknown(_))
        ));
        assert_eq!(record, sample());
    }

    #[test]
    fn test_set_from_str() {
        let mut record = sample();
        assert_eq!(record.set_from_str("segments", "7"), Ok(true));
        assert_eq!(record.get_count("segments"), Ok(7));
        assert_eq!(record.set_from_str("openEnded", "on"), Ok(true));
        assert_eq!(record.get_bool("openEnded"), Ok(true));
        assert_eq!(record.set_from_str("label", "YO"), Ok(true));
        assert_eq!(record.get_text("label"), Ok("YO"));
        assert!(record.set_from_str("width", "wide").is_err());
    }

    #[test]
    fn test_step_clamps_toggles_and_cycles() {
        let mut record = sample();
        for _ in 0..20 {
            record.step("segments", 1).unwrap();
        }
        assert_eq!(record.get_count("segments"), Ok(10));
        assert_eq!(record.step("segments", 1), Ok(false));

        assert_eq!(record.step("openEnded", 1), Ok(true));
        assert_eq!(record.get_bool("openEnded"), Ok(true));

        record.step("surface", -1).unwrap();
        assert_eq!(record.get_text("surface"), Ok("plane"));
        assert_eq!(record.step("label", 1), Ok(false));
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut record = sample();
        assert!(!record.reset());
        record.set("width", ParamInput::Number(5.0)).unwrap();
        record.set("surface", "mobius".into()).unwrap();
        assert!(!record.is_default());
        assert!(record.reset());
        assert_eq!(record, sample());
    }
}
