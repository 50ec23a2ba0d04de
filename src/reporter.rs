use std::io::{self, Write};

use console::Style;

use crate::finding::{truncate_message, Finding};

const MESSAGE_WIDTH: usize = 150;

struct Palette {
    description: Style,
    separator: Style,
    path: Style,
    label: Style,
}

impl Palette {
    fn new(enabled: bool) -> Self {
        Self {
            description: Style::new().bold().bright().cyan().force_styling(enabled),
            separator: Style::new().bold().force_styling(enabled),
            path: Style::new().yellow().force_styling(enabled),
            label: Style::new().bright().blue().force_styling(enabled),
        }
    }
}

/// Renders findings as human-readable blocks as they are recorded.
pub struct FindingReporter {
    palette: Palette,
}

impl FindingReporter {
    pub fn new(use_color: bool) -> Self {
        Self { palette: Palette::new(use_color) }
    }

    pub fn write_finding<W: Write>(&self, writer: &mut W, finding: &Finding) -> io::Result<()> {
        let p = &self.palette;
        let field = |name: &str| p.label.apply_to(format!("{name:<12}")).to_string();

        writeln!(writer, " {}", p.description.apply_to(finding.description()))?;
        let tier =
            if finding.content_signature_description.is_some() { "content" } else { "path" };
        writeln!(writer, "  {} {}", field("Tier"), tier)?;
        writeln!(writer, "  {} {}", field("Path"), p.path.apply_to(&finding.file_path))?;
        writeln!(
            writer,
            "  {} {}/{}",
            field("Repo"),
            finding.repository_owner,
            finding.repository_name
        )?;
        writeln!(writer, "  {} {}", field("Action"), finding.action)?;
        writeln!(
            writer,
            "  {} {}",
            field("Message"),
            truncate_message(&finding.commit_message, MESSAGE_WIDTH)
        )?;
        writeln!(writer, "  {} {}", field("Author"), finding.commit_author)?;
        if let Some(comment) = finding.comment().filter(|c| !c.is_empty()) {
            writeln!(writer, "  {} {}", field("Comment"), comment)?;
        }
        writeln!(writer, "  {} {}", field("File URL"), finding.file_url)?;
        writeln!(writer, "  {} {}", field("Commit URL"), finding.commit_url)?;
        writeln!(writer, " {}", p.separator.apply_to("------"))?;
        Ok(())
    }

    /// Print to stdout; a closed pipe is ignored.
    pub fn print_finding(&self, finding: &Finding) {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        if let Err(e) = self.write_finding(&mut lock, finding) {
            if e.kind() != io::ErrorKind::BrokenPipe {
                tracing::error!("Failed to write finding: {e}");
            }
        }
    }
}
