//! PDF Content Stream Generation
//!
//! Raster pages only need the graphics state and XObject operators:
//!
//! - q/Q: Save/restore graphics state
//! - cm: Concatenate transformation matrix
//! - Do: Paint an XObject

use std::io::Write;

/// Content stream builder
#[derive(Debug, Default)]
pub struct ContentStream {
    data: Vec<u8>,
}

impl ContentStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // =========================================================================
    // Graphics State Operators
    // =========================================================================

    /// Save the current graphics state (q)
    pub fn save_state(&mut self) -> &mut Self {
        self.write_line("q");
        self
    }

    /// Restore the graphics state (Q)
    pub fn restore_state(&mut self) -> &mut Self {
        self.write_line("Q");
        self
    }

    /// Set the transformation matrix (cm)
    pub fn transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> &mut Self {
        self.write_fmt(format_args!(
            "{} {} {} {} {} {} cm\n",
            Self::fmt_num(a),
            Self::fmt_num(b),
            Self::fmt_num(c),
            Self::fmt_num(d),
            Self::fmt_num(e),
            Self::fmt_num(f)
        ));
        self
    }

    // =========================================================================
    // XObject Operators
    // =========================================================================

    /// Paint an XObject (Do)
    pub fn draw_xobject(&mut self, name: &str) -> &mut Self {
        self.write_fmt(format_args!("/{} Do\n", name));
        self
    }

    /// Paint an image XObject into a rectangle.
    ///
    /// `x` and `y` are the lower-left corner in PDF user space. Images are
    /// defined on the unit square, so the matrix scales to the target size.
    pub fn draw_image(&mut self, name: &str, x: f64, y: f64, width: f64, height: f64) -> &mut Self {
        self.save_state()
            .transform(width, 0.0, 0.0, height, x, y)
            .draw_xobject(name)
            .restore_state()
    }

    // =========================================================================
    // Helper Methods
    // =========================================================================

    fn write_line(&mut self, s: &str) {
        self.data.extend_from_slice(s.as_bytes());
        self.data.push(b'\n');
    }

    fn write_fmt(&mut self, args: std::fmt::Arguments<'_>) {
        // Writing into a Vec cannot fail
        let _ = self.data.write_fmt(args);
    }

    /// Format a number for PDF output
    fn fmt_num(n: f64) -> String {
        if n.fract() == 0.0 {
            format!("{:.0}", n)
        } else {
            let s = format!("{:.4}", n);
            s.trim_end_matches('0').trim_end_matches('.').to_string()
        }
    }
}
