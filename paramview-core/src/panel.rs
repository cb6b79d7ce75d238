//! Live control panel over a [`ParameterRecord`].
//!
//! The panel edits its record in place and hands the whole record to the
//! caller's `on_change` callback, once per accepted edit. A reset is a
//! single edit no matter how many fields it touches.

use serde::Serialize;

use crate::error::ParamError;
use crate::params::{ParamInput, ParamValue, ParameterRecord};

/// How a field is presented
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ControlKind {
    Slider {
        min: f32,
        max: f32,
        step: f32,
        value: f32,
    },
    Toggle {
        value: bool,
    },
    Choice {
        options: Vec<String>,
        value: String,
    },
    Text {
        value: String,
    },
}

/// One control per record field, in display order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Control {
    pub name: String,
    #[serde(flatten)]
    pub kind: ControlKind,
}

impl Control {
    /// Short value rendering for text hosts.
    pub fn display_value(&self) -> String {
        match &self.kind {
            ControlKind::Slider { value, step, .. } => {
                if step.fract() == 0.0 {
                    format!("{value:.0}")
                } else {
                    format!("{value:.2}")
                }
            }
            ControlKind::Toggle { value } => value.to_string(),
            ControlKind::Choice { value, .. } | ControlKind::Text { value } => value.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParameterPanel {
    record: ParameterRecord,
    selected: usize,
}

impl ParameterPanel {
    /// Wrap a record after checking its declarations.
    pub fn new(record: ParameterRecord) -> Result<Self, ParamError> {
        record.validate()?;
        Ok(Self {
            record,
            selected: 0,
        })
    }

    pub fn record(&self) -> &ParameterRecord {
        &self.record
    }

    pub fn controls(&self) -> Vec<Control> {
        self.record
            .fields()
            .iter()
            .map(|field| Control {
                name: field.name.clone(),
                kind: match &field.value {
                    ParamValue::Number {
                        value,
                        min,
                        max,
                        step,
                        ..
                    } => ControlKind::Slider {
                        min: *min,
                        max: *max,
                        step: *step,
                        value: *value,
                    },
                    ParamValue::Bool { value, .. } => ControlKind::Toggle { value: *value },
                    ParamValue::Text { value, choices, .. } if !choices.is_empty() => {
                        ControlKind::Choice {
                            options: choices.clone(),
                            value: value.clone(),
                        }
                    }
                    ParamValue::Text { value, .. } => ControlKind::Text {
                        value: value.clone(),
                    },
                },
            })
            .collect()
    }

    /// Apply one edit; `on_change` runs only when the value actually changed.
    pub fn set<R>(
        &mut self,
        name: &str,
        input: ParamInput,
        on_change: impl FnOnce(&ParameterRecord) -> R,
    ) -> Result<Option<R>, ParamError> {
        let changed = self.record.set(name, input)?;
        Ok(self.notify(changed, on_change))
    }

    pub fn set_from_str<R>(
        &mut self,
        name: &str,
        raw: &str,
        on_change: impl FnOnce(&ParameterRecord) -> R,
    ) -> Result<Option<R>, ParamError> {
        let changed = self.record.set_from_str(name, raw)?;
        Ok(self.notify(changed, on_change))
    }

    /// Nudge a field by its step (see [`ParameterRecord::step`]).
    pub fn step<R>(
        &mut self,
        name: &str,
        direction: i32,
        on_change: impl FnOnce(&ParameterRecord) -> R,
    ) -> Result<Option<R>, ParamError> {
        let changed = self.record.step(name, direction)?;
        Ok(self.notify(changed, on_change))
    }

    /// Restore every default, then call `on_change` exactly once.
    pub fn reset<R>(&mut self, on_change: impl FnOnce(&ParameterRecord) -> R) -> R {
        self.record.reset();
        on_change(&self.record)
    }

    /// Put back a record taken from [`record`](Self::record) earlier.
    pub(crate) fn restore(&mut self, record: ParameterRecord) {
        self.record = record;
    }

    fn notify<R>(&self, changed: bool, on_change: impl FnOnce(&ParameterRecord) -> R) -> Option<R> {
        changed.then(|| on_change(&self.record))
    }

    pub fn selected(&self) -> Option<&str> {
        self.record.fields().get(self.selected).map(|f| f.name.as_str())
    }

    pub fn select_next(&mut self) {
        if !self.record.is_empty() {
            self.selected = (self.selected + 1) % self.record.len();
        }
    }

    pub fn select_prev(&mut self) {
        if !self.record.is_empty() {
            self.selected = (self.selected + self.record.len() - 1) % self.record.len();
        }
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel() -> ParameterPanel {
        ParameterPanel::new(
            ParameterRecord::new()
                .number("width", 1.0, 0.1, 10.0, 0.1)
                .number("height", 1.0, 0.1, 10.0, 0.1)
                .number("depth", 1.0, 0.1, 10.0, 0.1)
                .boolean("wire", true)
                .choice("surface", "klein", &["klein", "plane"]),
        )
        .unwrap()
    }

    #[test]
    fn test_controls_follow_declaration() {
        let controls = panel().controls();
        assert_eq!(controls.len(), 5);
        assert_eq!(controls[0].name, "width");
        assert!(matches!(controls[0].kind, ControlKind::Slider { max, .. } if max == 10.0));
        assert_eq!(controls[3].kind, ControlKind::Toggle { value: true });
        assert!(matches!(&controls[4].kind, ControlKind::Choice { options, .. } if options.len() == 2));
    }

    #[test]
    fn test_change_invokes_callback_once() {
        let mut panel = panel();
        let mut calls = 0;
        panel
            .set("width", ParamInput::Number(5.0), |record| {
                calls += 1;
                assert_eq!(record.get_number("width"), Ok(5.0));
            })
            .unwrap();
        assert_eq!(calls, 1);

        let result = panel.set("width", ParamInput::Number(5.0), |_| calls += 1);
        assert_eq!(result, Ok(None));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_rejected_edit_skips_callback() {
        let mut panel = panel();
        let mut calls = 0;
        assert!(panel
            .set("width", ParamInput::Number(99.0), |_| calls += 1)
            .is_err());
        assert_eq!(calls, 0);
        assert_eq!(panel.record().get_number("width"), Ok(1.0));
    }

    #[test]
    fn test_reset_regenerates_once_for_many_fields() {
        let mut panel = panel();
        for name in ["width", "height", "depth"] {
            panel.set(name, ParamInput::Number(3.0), |_| ()).unwrap();
        }
        panel.set("wire", ParamInput::Bool(false), |_| ()).unwrap();

        let mut calls = 0;
        panel.reset(|record| {
            calls += 1;
            assert!(record.is_default());
        });
        assert_eq!(calls, 1);
        assert_eq!(panel.controls()[0].display_value(), "1.00");
        assert_eq!(panel.controls()[3].display_value(), "true");
    }

    #[test]
    fn test_selection_wraps() {
        let mut panel = panel();
        assert_eq!(panel.selected(), Some("width"));
        panel.select_prev();
        assert_eq!(panel.selected(), Some("surface"));
        panel.select_next();
        panel.select_next();
        assert_eq!(panel.selected(), Some("height"));
    }

    #[test]
    fn test_controls_serialize_with_kind_tag() {
        let json = serde_json::to_value(&panel().controls()[0]).unwrap();
        assert_eq!(json["name"], "width");
        assert_eq!(json["kind"], "slider");
        assert_eq!(json["value"], 1.0);
    }
}
