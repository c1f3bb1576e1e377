//! Fixed-layout text report

use crate::analysis::{Section, Track};
use std::io::{self, Write};

/// Printed when no input file is given
pub const USAGE: &str = "
Usage:
    sectionize <input_filename>

Example:
    sectionize audio/Gondoliers11.mp3
    sectionize audio/Gondoliers39.mp3

";

/// Printed instead of the section count for a track without sections
pub const NO_SECTIONS_BANNER: &str = "********No Sections Detected********";

/// Line width and fill character of the report, fixed at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLayout {
    width: usize,
    fill: char,
    spacer: String,
    border: String,
}

impl ReportLayout {
    /// Layout `width` columns wide framed with `fill`
    pub fn new(width: usize, fill: char) -> Self {
        let width = width.max(2);
        let fill_str = fill.to_string();
        ReportLayout {
            width,
            fill,
            spacer: format!("{}{}{}", fill, " ".repeat(width - 2), fill),
            border: fill_str.repeat(width),
        }
    }

    /// Report width in columns
    pub fn width(&self) -> usize {
        self.width
    }

    /// Framed empty line
    pub fn spacer(&self) -> &str {
        &self.spacer
    }

    /// Solid line of fill characters
    pub fn border(&self) -> &str {
        &self.border
    }

    /// Center `text` in the report width
    pub fn center(&self, text: &str) -> String {
        center(text, self.width, self.fill)
    }
}

impl Default for ReportLayout {
    fn default() -> Self {
        Self::new(60, '*')
    }
}

/// Pad `text` on both sides to `width` characters
///
/// When the padding is odd the extra character goes left only if `width` is
/// odd as well. Text at least `width` long is returned unchanged.
pub fn center(text: &str, width: usize, fill: char) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }

    let margin = width - len;
    let left = margin / 2 + (margin & width & 1);
    let right = margin - left;

    let mut out = String::with_capacity(width);
    out.extend(std::iter::repeat_n(fill, left));
    out.push_str(text);
    out.extend(std::iter::repeat_n(fill, right));
    out
}

/// Heading, duration and section count of `track`
pub fn write_track_details<W: Write>(
    out: &mut W,
    layout: &ReportLayout,
    input_name: &str,
    track: &Track,
) -> io::Result<()> {
    let heading = format!("  Some details about {}  ", input_name);
    writeln!(out, "{} {}", layout.center(&heading), layout.spacer())?;
    writeln!(out, "Track Duration: {:14.4}", track.duration)?;

    if track.has_sections() {
        writeln!(out, "* Counted {:6} sections", track.sections.len())?;
        writeln!(
            out,
            "{} \n \n {} {}",
            layout.spacer(),
            layout.spacer(),
            layout.border()
        )?;
    } else {
        writeln!(out, "{}", NO_SECTIONS_BANNER)?;
        writeln!(out, "{}", layout.spacer())?;
        let rule: String = std::iter::repeat_n(layout.fill, NO_SECTIONS_BANNER.len()).collect();
        writeln!(out, "{}", rule)?;
    }

    writeln!(out, "{}", layout.spacer())
}

/// One line per section with its timing and musical attributes
pub fn write_section_table<W: Write>(
    out: &mut W,
    layout: &ReportLayout,
    sections: &[Section],
) -> io::Result<()> {
    writeln!(
        out,
        "{} {:>3} {:>9} {:>9} {:>7} {:>6}  {:<9} {:>5}",
        layout.fill, "#", "start", "duration", "dB", "BPM", "key", "beats"
    )?;

    for (index, section) in sections.iter().enumerate() {
        let key = section
            .key
            .as_ref()
            .map(|k| k.to_string())
            .unwrap_or_else(|| "-".to_string());
        writeln!(
            out,
            "{} {:>3} {:>9.3} {:>9.3} {:>7.2} {:>6.1}  {:<9} {:>5}",
            layout.fill,
            index + 1,
            section.start,
            section.duration,
            section.loudness,
            section.tempo,
            key,
            section.time_signature
        )?;
    }

    writeln!(out, "{}", layout.spacer())
}

/// Closing frame written after the sections are exported
pub fn write_footer<W: Write>(out: &mut W, layout: &ReportLayout) -> io::Result<()> {
    writeln!(out, "{} \n {}", layout.spacer(), layout.border())
}
