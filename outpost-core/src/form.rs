//! Labeled-rows form layout
//!
//! Lays out a small data form: one row per registered data topic with the
//! label on the left and the unit on the right, a shared value cell in
//! between, and a status line on the fourth text line. Column positions
//! are measured once at build time from the registered labels, so every
//! value lands in the same cell regardless of which field updates.
//!
//! The status line deduplicates writes: re-posting the text already shown
//! is a no-op, which keeps the once-a-second clock from hammering the
//! display bus with identical frames.

use heapless::String;

use crate::config::FormStyle;
use crate::display::DisplayPort;
use crate::topics::DataTopic;

/// Gap between the widest label and the value cell
pub const LABEL_GUTTER: u8 = 3;

/// Probe string that sizes the value cell
pub const VALUE_PROBE: &str = "4000";

/// Padding after the value probe width
pub const VALUE_PAD: u8 = 2;

/// Text line index of the status line
pub const STATUS_LINE: u8 = 3;

/// Longest status text remembered for deduplication
pub const MAX_STATUS_LEN: usize = 24;

/// Measured form geometry plus the last status text shown
#[derive(Debug)]
pub struct FormLayout {
    style: FormStyle,
    value_start: u8,
    value_end: u8,
    status_row: u8,
    last_status: String<MAX_STATUS_LEN>,
}

impl FormLayout {
    /// Render labels and units, measuring the value cell as we go
    ///
    /// [`FormStyle::StatusOnly`] skips the rows entirely; only the status
    /// line is live. Rows past the status line are not policed, so keep
    /// the field count within the display height.
    pub fn build(display: &mut dyn DisplayPort, fields: &[DataTopic], style: FormStyle) -> Self {
        display.clear_all();
        let status_row = STATUS_LINE * display.font_rows();

        let (value_start, value_end) = match style {
            FormStyle::StatusOnly => (0, 0),
            FormStyle::LabeledRows => {
                let mut widest = 0u8;
                for (i, field) in fields.iter().enumerate() {
                    display.set_cursor(0, i as u8 * display.font_rows());
                    display.print(field.label());
                    widest = widest.max(display.str_width(field.label()));
                }

                let value_start = widest + LABEL_GUTTER;
                let value_end = value_start + display.str_width(VALUE_PROBE) + VALUE_PAD;

                for (i, field) in fields.iter().enumerate() {
                    display.set_cursor(value_end + 1, i as u8 * display.font_rows());
                    display.print(field.unit());
                }

                (value_start, value_end)
            }
        };

        Self {
            style,
            value_start,
            value_end,
            status_row,
            last_status: String::new(),
        }
    }

    /// Rewrite the value cell on a field's row
    pub fn set_value(&self, display: &mut dyn DisplayPort, field_index: usize, text: &str) {
        if matches!(self.style, FormStyle::StatusOnly) {
            return;
        }
        let row = field_index as u8 * display.font_rows();
        // clear_region leaves the cursor at the cell's top-left corner
        display.clear_region(self.value_start, self.value_end, row, row);
        display.print(text);
    }

    /// Replace the status line, skipping the write when unchanged
    ///
    /// Returns whether anything was actually rendered. Only the first
    /// [`MAX_STATUS_LEN`] characters participate in the comparison, so
    /// texts that differ past that point count as unchanged.
    pub fn set_status(&mut self, display: &mut dyn DisplayPort, text: &str) -> bool {
        let mut next: String<MAX_STATUS_LEN> = String::new();
        for ch in text.chars() {
            if next.push(ch).is_err() {
                break;
            }
        }
        if self.last_status == next {
            return false;
        }

        display.set_cursor(0, self.status_row);
        display.clear_to_eol();
        display.print(text);

        self.last_status = next;
        true
    }

    /// First column of the value cell
    pub fn value_start(&self) -> u8 {
        self.value_start
    }

    /// Last column of the value cell
    pub fn value_end(&self) -> u8 {
        self.value_end
    }

    /// Row carrying the status line
    pub fn status_row(&self) -> u8 {
        self.status_row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::DeviceId;
    use crate::topics::TopicRegistry;

    #[derive(Debug, PartialEq)]
    enum Op {
        ClearAll,
        ClearRegion(u8, u8, u8, u8),
        SetCursor(u8, u8),
        Print(String<32>),
        ClearToEol,
    }

    struct TestPort {
        ops: Vec<Op>,
    }

    impl TestPort {
        fn new() -> Self {
            Self { ops: Vec::new() }
        }

        fn printed(&self) -> Vec<&str> {
            self.ops
                .iter()
                .filter_map(|op| match op {
                    Op::Print(s) => Some(s.as_str()),
                    _ => None,
                })
                .collect()
        }
    }

    impl DisplayPort for TestPort {
        fn clear_all(&mut self) {
            self.ops.push(Op::ClearAll);
        }

        fn clear_region(&mut self, c0: u8, c1: u8, r0: u8, r1: u8) {
            self.ops.push(Op::ClearRegion(c0, c1, r0, r1));
        }

        fn set_cursor(&mut self, col: u8, row: u8) {
            self.ops.push(Op::SetCursor(col, row));
        }

        fn print(&mut self, text: &str) {
            let mut s = String::new();
            for ch in text.chars() {
                let _ = s.push(ch);
            }
            self.ops.push(Op::Print(s));
        }

        fn clear_to_eol(&mut self) {
            self.ops.push(Op::ClearToEol);
        }

        fn str_width(&self, text: &str) -> u8 {
            text.len() as u8
        }

        fn display_width(&self) -> u8 {
            128
        }

        fn display_height(&self) -> u8 {
            64
        }

        fn font_rows(&self) -> u8 {
            2
        }

        fn font_width(&self) -> u8 {
            8
        }
    }

    fn two_field_registry() -> TopicRegistry {
        let id = DeviceId::parse("A1B2C3D4E5F6").unwrap();
        let mut registry = TopicRegistry::new("kw_sensors", id).unwrap();
        registry
            .register_data("Temp", "C", "temp", "outdoor")
            .unwrap();
        registry.register_data("Hum", "%", "hum", "outdoor").unwrap();
        registry
    }

    #[test]
    fn value_cell_sized_from_widest_label() {
        let registry = two_field_registry();
        let mut port = TestPort::new();

        let form = FormLayout::build(&mut port, registry.data_entries(), FormStyle::LabeledRows);

        // "Temp" is widest at 4; gutter 3; probe "4000" is 4 wide; pad 2
        assert_eq!(form.value_start(), 7);
        assert_eq!(form.value_end(), 13);
        assert_eq!(form.status_row(), 6);
    }

    #[test]
    fn labels_and_units_land_on_field_rows() {
        let registry = two_field_registry();
        let mut port = TestPort::new();

        FormLayout::build(&mut port, registry.data_entries(), FormStyle::LabeledRows);

        assert_eq!(port.ops[0], Op::ClearAll);
        assert!(port.ops.contains(&Op::SetCursor(0, 0)));
        assert!(port.ops.contains(&Op::SetCursor(0, 2)));
        // units start one column past the value cell
        assert!(port.ops.contains(&Op::SetCursor(14, 0)));
        assert!(port.ops.contains(&Op::SetCursor(14, 2)));
        assert_eq!(port.printed(), vec!["Temp", "Hum", "C", "%"]);
    }

    #[test]
    fn set_value_clears_only_the_value_cell() {
        let registry = two_field_registry();
        let mut port = TestPort::new();
        let form = FormLayout::build(&mut port, registry.data_entries(), FormStyle::LabeledRows);

        port.ops.clear();
        form.set_value(&mut port, 1, "21.5");

        assert_eq!(
            port.ops,
            vec![
                Op::ClearRegion(7, 13, 2, 2),
                Op::Print({
                    let mut s = String::new();
                    s.push_str("21.5").unwrap();
                    s
                }),
            ]
        );
    }

    #[test]
    fn status_line_writes_are_deduplicated() {
        let registry = two_field_registry();
        let mut port = TestPort::new();
        let mut form =
            FormLayout::build(&mut port, registry.data_entries(), FormStyle::LabeledRows);

        port.ops.clear();
        assert!(form.set_status(&mut port, "Time not set"));
        assert_eq!(port.ops[0], Op::SetCursor(0, 6));
        assert_eq!(port.ops[1], Op::ClearToEol);

        port.ops.clear();
        assert!(!form.set_status(&mut port, "Time not set"));
        assert!(port.ops.is_empty());

        assert!(form.set_status(&mut port, "12:00:01"));
    }

    #[test]
    fn long_status_text_still_deduplicates() {
        let registry = two_field_registry();
        let mut port = TestPort::new();
        let mut form =
            FormLayout::build(&mut port, registry.data_entries(), FormStyle::LabeledRows);

        let long = "a status message well past the dedupe capacity";
        assert!(long.len() > MAX_STATUS_LEN);

        assert!(form.set_status(&mut port, long));
        port.ops.clear();

        // Re-posting the same text is a no-op even though only a prefix
        // of it was remembered
        assert!(!form.set_status(&mut port, long));
        assert!(port.ops.is_empty());

        assert!(form.set_status(&mut port, "12:00:00"));
    }

    #[test]
    fn status_only_form_skips_rows() {
        let registry = two_field_registry();
        let mut port = TestPort::new();
        let form = FormLayout::build(&mut port, registry.data_entries(), FormStyle::StatusOnly);

        assert_eq!(port.ops, vec![Op::ClearAll]);

        form.set_value(&mut port, 0, "400");
        assert_eq!(port.ops, vec![Op::ClearAll]);
        assert_eq!(form.status_row(), 6);
    }
}
