//! Character-grid display port
//!
//! The node renders through a deliberately narrow cursor-and-print surface:
//! labels, units, sensor values, and one status line. Horizontal positions
//! are in whatever unit the adapter's [`str_width`](DisplayPort::str_width)
//! reports (pixels for an OLED, cells for a character LCD); vertical
//! positions are in row units, with one text line spanning
//! [`font_rows`](DisplayPort::font_rows) of them. The layout math in
//! [`form`](crate::form) works the same either way.

/// Rendering target for the node's form and status line
///
/// Geometry queries must be stable for the lifetime of the port; the form
/// layout is computed once and never re-measured.
pub trait DisplayPort {
    /// Clear the whole display and home the cursor
    fn clear_all(&mut self);

    /// Clear an inclusive region and leave the cursor at its top-left corner
    fn clear_region(&mut self, col_start: u8, col_end: u8, row_start: u8, row_end: u8);

    /// Move the cursor
    fn set_cursor(&mut self, col: u8, row: u8);

    /// Print text at the cursor, advancing it
    fn print(&mut self, text: &str);

    /// Clear from the cursor to the end of the line
    fn clear_to_eol(&mut self);

    /// Rendered width of `text` in column units
    fn str_width(&self, text: &str) -> u8;

    /// Display width in column units
    fn display_width(&self) -> u8;

    /// Display height in row units, 8 pixels per row on OLED panels
    fn display_height(&self) -> u8;

    /// Rows one text line occupies; must be nonzero
    fn font_rows(&self) -> u8;

    /// Width of one character cell in column units; must be nonzero
    fn font_width(&self) -> u8;

    /// Text lines that fit on the display
    fn rows(&self) -> u8 {
        self.display_height() / (self.font_rows().max(1) * 8)
    }

    /// Character cells that fit on one line
    fn columns(&self) -> u8 {
        self.display_width() / self.font_width().max(1)
    }
}

/// Port for headless nodes; discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDisplay;

impl DisplayPort for NullDisplay {
    fn clear_all(&mut self) {}

    fn clear_region(&mut self, _col_start: u8, _col_end: u8, _row_start: u8, _row_end: u8) {}

    fn set_cursor(&mut self, _col: u8, _row: u8) {}

    fn print(&mut self, _text: &str) {}

    fn clear_to_eol(&mut self) {}

    fn str_width(&self, _text: &str) -> u8 {
        0
    }

    fn display_width(&self) -> u8 {
        0
    }

    fn display_height(&self) -> u8 {
        0
    }

    fn font_rows(&self) -> u8 {
        1
    }

    fn font_width(&self) -> u8 {
        1
    }
}
