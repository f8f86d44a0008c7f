use anstream::{AutoStream, ColorChoice};
use anstyle::{AnsiColor, Reset, Style};
use anstyle_query::{clicolor, clicolor_force, no_color, term_supports_color};
use anyhow::Result;
use std::io::{self, Write};

/// Styles available for rendering messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageStyle {
    Info,
    Warning,
    Error,
    Output,
    Response,
    Tool,
    User,
}

impl MessageStyle {
    pub fn style(self) -> Style {
        let fg = |color: AnsiColor| Style::new().fg_color(Some(color.into()));
        match self {
            Self::Info => fg(AnsiColor::Cyan),
            Self::Warning => fg(AnsiColor::Yellow),
            Self::Error => fg(AnsiColor::Red).bold(),
            Self::Output => Style::new().dimmed(),
            Self::Response => Style::new(),
            Self::Tool => fg(AnsiColor::Magenta),
            Self::User => fg(AnsiColor::Green).bold(),
        }
    }

    fn indent(self) -> &'static str {
        match self {
            Self::Response | Self::Tool | Self::Output => "  ",
            _ => "",
        }
    }
}

/// Line-oriented styled writer. Escape sequences are stripped when color is
/// disabled, including those embedded in pre-rendered text.
pub struct AnsiRenderer {
    writer: AutoStream<Box<dyn Write + Send>>,
    color: bool,
}

/// Whether the environment asks for colored output
pub fn color_enabled(no_color_flag: bool) -> bool {
    !no_color_flag
        && (clicolor_force() || (!no_color() && clicolor().unwrap_or_else(term_supports_color)))
}

impl AnsiRenderer {
    /// Create a new renderer for stdout
    pub fn stdout(no_color_flag: bool) -> Self {
        Self::with_writer(Box::new(io::stdout()), color_enabled(no_color_flag))
    }

    pub fn with_writer(writer: Box<dyn Write + Send>, color: bool) -> Self {
        let choice = if color {
            ColorChoice::AlwaysAnsi
        } else {
            ColorChoice::Never
        };
        Self {
            writer: AutoStream::new(writer, choice),
            color,
        }
    }

    pub fn color(&self) -> bool {
        self.color
    }

    /// Write text in the given style, one output line per input line
    pub fn line(&mut self, style: MessageStyle, text: &str) -> Result<()> {
        let indent = style.indent();
        let ansi = style.style();
        if text.is_empty() {
            writeln!(self.writer)?;
        }
        for line in text.lines() {
            if line.is_empty() {
                writeln!(self.writer)?;
            } else {
                writeln!(self.writer, "{indent}{ansi}{line}{Reset}")?;
            }
        }
        self.writer.flush()?;
        Ok(())
    }

    /// Write a line with an explicit style
    pub fn line_with_style(&mut self, style: Style, text: &str) -> Result<()> {
        writeln!(self.writer, "{style}{text}{Reset}")?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write pre-rendered text (markdown, highlighted code) as-is
    pub fn raw(&mut self, text: &str) -> Result<()> {
        write!(self.writer, "{text}")?;
        if !text.ends_with('\n') {
            writeln!(self.writer)?;
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn blank(&mut self) -> Result<()> {
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Capture {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    #[test]
    fn plain_output_strips_escapes() -> Result<()> {
        let capture = Capture::default();
        let mut renderer = AnsiRenderer::with_writer(Box::new(capture.clone()), false);
        renderer.line(MessageStyle::Error, "boom")?;
        renderer.raw("\u{1b}[31mred\u{1b}[0m")?;
        assert_eq!(capture.text(), "boom\nred\n");
        Ok(())
    }

    #[test]
    fn indented_styles_prefix_every_line() -> Result<()> {
        let capture = Capture::default();
        let mut renderer = AnsiRenderer::with_writer(Box::new(capture.clone()), false);
        renderer.line(MessageStyle::Response, "a\n\nb")?;
        assert_eq!(capture.text(), "  a\n\n  b\n");
        Ok(())
    }

    #[test]
    fn colored_output_keeps_escapes() -> Result<()> {
        let capture = Capture::default();
        let mut renderer = AnsiRenderer::with_writer(Box::new(capture.clone()), true);
        renderer.line(MessageStyle::Info, "hi")?;
        assert!(capture.text().contains("\u{1b}["));
        Ok(())
    }
}
